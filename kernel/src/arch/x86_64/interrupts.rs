/*
 * Interrupt Context Tracking
 *
 * The CPU itself does not tell us whether we are running inside an
 * interrupt handler, so the kernel's interrupt entry stubs bracket every
 * handler with enter_interrupt()/leave_interrupt(). The scheduler uses the
 * flag to reject blocking from interrupt context, and sets the
 * yield-on-return request that leave_interrupt() hands back to the stub.
 */

use core::sync::atomic::{AtomicBool, Ordering};

use x86_64::instructions::interrupts;

use crate::arch::InterruptLevel;

static IN_INTERRUPT: AtomicBool = AtomicBool::new(false);
static YIELD_ON_RETURN: AtomicBool = AtomicBool::new(false);

/// Called by the interrupt entry stub before the handler runs
pub fn enter_interrupt() {
    IN_INTERRUPT.store(true, Ordering::SeqCst);
}

/// Called by the interrupt entry stub after the handler ran
///
/// Returns whether the handler asked for a yield on the way out; the stub
/// then calls the scheduler's interrupt-return hook.
pub fn leave_interrupt() -> bool {
    IN_INTERRUPT.store(false, Ordering::SeqCst);
    YIELD_ON_RETURN.swap(false, Ordering::SeqCst)
}

pub fn in_interrupt() -> bool {
    IN_INTERRUPT.load(Ordering::SeqCst)
}

pub fn request_yield() {
    YIELD_ON_RETURN.store(true, Ordering::SeqCst);
}

pub fn level() -> InterruptLevel {
    if interrupts::are_enabled() {
        InterruptLevel::On
    } else {
        InterruptLevel::Off
    }
}

pub fn set_level(level: InterruptLevel) {
    match level {
        InterruptLevel::On => interrupts::enable(),
        InterruptLevel::Off => interrupts::disable(),
    }
}
