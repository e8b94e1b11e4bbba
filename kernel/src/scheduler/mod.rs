/*
 * Tick-Driven Priority Scheduler
 *
 * This module implements a single-core, preemptive thread scheduler with
 * priority donation and a dispatch policy chosen once at boot.
 *
 * THREAD LIFECYCLE:
 * ================
 *
 *   create --> Blocked --unblock--> Ready --dispatch--> Running
 *                 ^                   ^                    |
 *                 |                   +---yield/preempt----+
 *                 +---------------block--------------------+
 *                                                          |
 *                               (reclaimed) <-- Dying <--exit
 *
 * - Ready: queued in the ready queue, ordered by the policy's rank
 * - Running: exactly one thread at any time (idle if nothing is Ready)
 * - Blocked: waiting for an event; the idle thread parks here too
 * - Dying: exited; reclaimed once the next thread runs
 *
 * PREEMPTION:
 * ===========
 *
 * Every timer tick is charged to the running thread. Once a thread used up
 * its time slice a preemption is requested; it is taken on the interrupt
 * return path, never inside the tick handler itself.
 *
 * PRIORITY DONATION:
 * ==================
 *
 * A thread waiting on a resource lends its effective priority to the holder,
 * transitively along the chain of holders, so that a low-priority holder
 * cannot be starved by medium-priority threads while a high-priority thread
 * waits for it. Releasing the resource withdraws the donation.
 *
 * Layout:
 * - sched_core: mechanism (state machine, dispatch, statistics)
 * - traits / policies: which Ready thread runs next
 * - registry / thread: control blocks
 * - ready_queue: ordered Ready threads
 * - donation: priority inheritance across resource holders
 * - scheduler_manager: global instance for the rest of the kernel
 */

pub mod config;
pub mod context;
pub mod donation;
pub mod error;
pub mod events;
pub mod policies;
pub mod ready_queue;
pub mod registry;
pub mod sched_core;
pub mod scheduler_manager;
pub mod stats;
pub mod thread;
pub mod traits;
pub mod types;

pub use config::SchedConfig;
pub use error::{Exhausted, SchedError};
pub use events::SchedEvent;
pub use policies::PolicyKind;
pub use sched_core::SchedulerCore;
pub use scheduler_manager::SchedulerManager;
pub use stats::{GlobalStats, ThreadReport};
pub use thread::{Thread, ThreadEntry, ThreadId, ThreadKind, ThreadState, ThreadStats};
pub use traits::{DispatchPolicy, SchedView};
pub use types::{Priority, Rank, ResourceId, TickCategory, TimeSliceTicks};

/// Lowest thread priority
pub const PRI_MIN: Priority = Priority::MIN;
/// Default thread priority
pub const PRI_DEFAULT: Priority = Priority::DEFAULT;
/// Highest thread priority
pub const PRI_MAX: Priority = Priority::MAX;

/// Default limit on live threads, bootstrap and idle included
pub const MAX_THREADS: usize = 64;

pub const NICE_MIN: i8 = -20;
pub const NICE_DEFAULT: i8 = 0;
pub const NICE_MAX: i8 = 20;
