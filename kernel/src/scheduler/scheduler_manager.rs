/*
 * Scheduler Manager
 *
 * This module provides the SchedulerManager ZST which offers a clean API for
 * controlling the global scheduler instance and performing scheduling
 * operations from anywhere in the kernel.
 *
 * The SchedulerCore lives in a spin::Mutex<Option<_>>. The lock is always
 * taken with interrupts disabled so the timer interrupt can never spin on a
 * lock held by the thread it interrupted.
 */

use alloc::boxed::Box;

use super::{Priority, SchedConfig, SchedError, SchedulerCore, ThreadEntry, ThreadId};
use crate::arch::{self, Platform};

static SCHEDULER: spin::Mutex<Option<SchedulerCore>> = spin::Mutex::new(None);

/// Scheduling control and system state
///
/// SchedulerManager is a Zero-Sized Type (ZST) that groups the operations on
/// the global scheduler under one namespace.
///
/// # Examples
///
/// ```ignore
/// SchedulerManager::init(SchedConfig::from_cmdline(cmdline), platform)?;
/// SchedulerManager::start()?;
/// SchedulerManager::spawn("worker", Priority::DEFAULT, worker_main, 0)?;
/// ```
pub struct SchedulerManager;

impl SchedulerManager {
    /// Install the global scheduler
    pub fn init(config: SchedConfig, platform: Box<dyn Platform>) -> Result<(), SchedError> {
        arch::without_interrupts(|| {
            let mut slot = SCHEDULER.lock();
            if slot.is_some() {
                return Err(SchedError::AlreadyInitialized);
            }
            *slot = Some(SchedulerCore::new(config, platform));
            Ok(())
        })
    }

    /// Remove the global scheduler, handing it back to the caller
    pub fn shutdown() -> Option<SchedulerCore> {
        let core = arch::without_interrupts(|| SCHEDULER.lock().take());
        if core.is_some() {
            log::info!("Scheduler shut down");
        }
        core
    }

    pub fn is_initialized() -> bool {
        arch::without_interrupts(|| SCHEDULER.lock().is_some())
    }

    /// Run `f` on the global scheduler
    pub fn with<R>(f: impl FnOnce(&mut SchedulerCore) -> R) -> Result<R, SchedError> {
        arch::without_interrupts(|| {
            let mut slot = SCHEDULER.lock();
            let core = slot.as_mut().ok_or(SchedError::NotInitialized)?;
            Ok(f(core))
        })
    }

    /// Enable preemptive scheduling
    pub fn start() -> Result<(), SchedError> {
        Self::with(|core| core.start())
    }

    /// Create a thread
    pub fn spawn(
        name: &str,
        priority: Priority,
        entry: ThreadEntry,
        arg: usize,
    ) -> Result<ThreadId, SchedError> {
        Self::with(|core| core.create(name, priority, entry, arg))?
    }

    /// Voluntarily yield the CPU to the next ready thread
    pub fn yield_now() -> Result<(), SchedError> {
        Self::with(|core| core.yield_now())
    }

    /// Terminate the calling thread
    pub fn exit() -> Result<(), SchedError> {
        Self::with(|core| core.exit())
    }

    pub fn current_id() -> Result<ThreadId, SchedError> {
        Self::with(|core| core.current())
    }

    pub fn get_priority() -> Result<Priority, SchedError> {
        Self::with(|core| core.get_priority())
    }

    pub fn set_priority(priority: Priority) -> Result<(), SchedError> {
        Self::with(|core| core.set_priority(priority))
    }

    /// Timer interrupt entry
    pub fn timer_tick() -> Result<(), SchedError> {
        Self::with(|core| core.tick())
    }

    /// Interrupt return path; takes a pending preemption
    pub fn interrupt_return() -> Result<(), SchedError> {
        Self::with(|core| core.on_interrupt_return())
    }

    /// Drop the scheduler lock held across a context switch
    ///
    /// A thread that starts running for the first time did not take the
    /// lock its predecessor holds; its start-up trampoline calls this after
    /// `SchedulerCore::finish_switch`.
    ///
    /// # Safety
    /// Must only be called by a freshly switched-to thread while the lock is
    /// held on behalf of the thread that switched to it.
    pub unsafe fn release_lock_after_switch() {
        // SAFETY: guaranteed by the caller
        unsafe { SCHEDULER.force_unlock() }
    }
}
