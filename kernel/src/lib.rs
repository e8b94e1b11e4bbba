/*
 * dsched - Kernel Thread Scheduler
 *
 * Single-core, tick-driven thread scheduler with priority donation and
 * boot-time selectable dispatch policies. The crate is no_std + alloc so it
 * links into the kernel image; under `cargo test` it builds against std and
 * runs on the simulated platform.
 *
 * Modules:
 * - scheduler: thread registry, ready queue, donation engine, policies,
 *   scheduler core and the global SchedulerManager
 * - arch: the Platform trait and its simulated and x86_64 implementations
 */

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod scheduler;

#[cfg(test)]
mod tests;
