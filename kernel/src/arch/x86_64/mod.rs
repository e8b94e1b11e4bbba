/*
 * x86_64 Bare-Metal Platform
 *
 * Platform implementation used by the kernel image. Interrupt control goes
 * through the x86_64 crate; stack allocation and the register-level switch
 * live in the kernel's assembly layer and are handed in as ThreadHooks when
 * the platform is built.
 *
 * Submodules:
 * - interrupts: interrupt level and interrupt-context tracking
 */

pub mod interrupts;

use crate::arch::{InterruptLevel, Platform};
use crate::scheduler::{SchedError, ThreadEntry, ThreadId};

/// Entry points into the kernel's context-switch layer
#[derive(Clone, Copy)]
pub struct ThreadHooks {
    /// Allocate a stack for `tid` and build a frame that starts `entry(arg)`
    pub prepare: fn(ThreadId, ThreadEntry, usize) -> Result<(), SchedError>,
    /// Free the stack of a reclaimed thread
    pub release: fn(ThreadId),
    /// Save the registers of `prev` and load those of `next`
    ///
    /// # Safety
    /// Both threads must have been prepared and `next` must not be running.
    pub switch: unsafe fn(ThreadId, ThreadId),
}

pub struct BareMetal {
    hooks: ThreadHooks,
}

impl BareMetal {
    pub fn new(hooks: ThreadHooks) -> Self {
        Self { hooks }
    }
}

impl Platform for BareMetal {
    fn interrupt_level(&self) -> InterruptLevel {
        interrupts::level()
    }

    fn disable_interrupts(&mut self) -> InterruptLevel {
        let old = interrupts::level();
        interrupts::set_level(InterruptLevel::Off);
        old
    }

    fn set_interrupt_level(&mut self, level: InterruptLevel) {
        interrupts::set_level(level);
    }

    fn in_interrupt_context(&self) -> bool {
        interrupts::in_interrupt()
    }

    fn yield_on_return(&mut self) {
        interrupts::request_yield();
    }

    fn prepare_thread(
        &mut self,
        tid: ThreadId,
        entry: ThreadEntry,
        arg: usize,
    ) -> Result<(), SchedError> {
        (self.hooks.prepare)(tid, entry, arg)
    }

    fn release_thread(&mut self, tid: ThreadId) {
        (self.hooks.release)(tid)
    }

    fn switch_threads(&mut self, prev: ThreadId, next: ThreadId) {
        // SAFETY: the scheduler only switches to prepared, non-running threads
        unsafe { (self.hooks.switch)(prev, next) }
    }
}
