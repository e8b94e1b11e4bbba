/*
 * Architecture Abstraction Layer
 *
 * The scheduler core never touches the CPU directly. Everything it needs
 * from the machine goes through the Platform trait:
 *
 * - the interrupt level (on/off) and whether we are in interrupt context
 * - a hook asking the interrupt return path to yield
 * - preparing and releasing a thread's initial execution context
 * - the context-switch primitive itself
 *
 * Implementations:
 * - sim::SimPlatform: hosted, records switches instead of performing them
 * - x86_64::BareMetal: the kernel image (target_os = "none" only)
 */

pub mod sim;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod x86_64;

use crate::scheduler::{SchedError, ThreadEntry, ThreadId};

/// Interrupt enable state of the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptLevel {
    On,
    Off,
}

/// Machine services consumed by the SchedulerCore
pub trait Platform: Send {
    fn interrupt_level(&self) -> InterruptLevel;

    /// Disable interrupts, returning the previous level
    fn disable_interrupts(&mut self) -> InterruptLevel;

    fn set_interrupt_level(&mut self, level: InterruptLevel);

    /// Whether the caller runs inside an interrupt handler
    fn in_interrupt_context(&self) -> bool;

    /// Ask the interrupt return path to yield the CPU
    fn yield_on_return(&mut self);

    /// Set up the stack and initial frame of a new thread so that its first
    /// switch lands in `entry(arg)`
    fn prepare_thread(
        &mut self,
        tid: ThreadId,
        entry: ThreadEntry,
        arg: usize,
    ) -> Result<(), SchedError>;

    /// Free whatever `prepare_thread` allocated
    fn release_thread(&mut self, tid: ThreadId);

    /// Suspend `prev` and resume `next`
    ///
    /// Returns only once `prev` is scheduled again.
    fn switch_threads(&mut self, prev: ThreadId, next: ThreadId);
}

/// Body of the idle thread
pub fn idle_loop(_arg: usize) {
    loop {
        #[cfg(all(target_arch = "x86_64", target_os = "none"))]
        ::x86_64::instructions::interrupts::enable_and_hlt();

        #[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
        core::hint::spin_loop();
    }
}

/// Run `f` with hardware interrupts disabled
///
/// Used to guard the global scheduler lock against the timer interrupt. On
/// hosted builds there is no interrupt to hold off.
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    #[cfg(all(target_arch = "x86_64", target_os = "none"))]
    {
        ::x86_64::instructions::interrupts::without_interrupts(f)
    }

    #[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
    {
        f()
    }
}
