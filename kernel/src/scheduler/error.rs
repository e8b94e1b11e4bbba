/*
 * Scheduler Errors
 *
 * Only recoverable conditions are reported through SchedError. Misuse of the
 * scheduler (bad priorities, wrong thread states, scheduling with interrupts
 * enabled, blocking from interrupt context) is a bug in the caller and
 * panics instead, since carrying on would corrupt the ready queue or the
 * donation chains.
 */

use core::fmt;

use super::ThreadId;

/// What ran out while creating a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    /// Every control-block slot of the thread registry is in use
    ThreadSlot { live: usize, capacity: usize },

    /// The platform could not set up the initial context (stack) of a thread
    ThreadContext { tid: ThreadId },
}

/// Recoverable scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Thread creation ran out of a resource
    AllocationError { resource: Exhausted },

    /// The global scheduler has not been initialized yet
    NotInitialized,

    /// The global scheduler was already initialized
    AlreadyInitialized,
}

impl SchedError {
    /// Whether the error reports resource exhaustion during thread creation
    pub fn is_allocation(&self) -> bool {
        matches!(self, SchedError::AllocationError { .. })
    }
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::AllocationError {
                resource: Exhausted::ThreadSlot { live, capacity },
            } => write!(f, "No thread slot available ({}/{} in use)", live, capacity),
            SchedError::AllocationError {
                resource: Exhausted::ThreadContext { tid },
            } => write!(f, "Could not allocate initial context for {}", tid),
            SchedError::NotInitialized => write!(f, "Scheduler not initialized"),
            SchedError::AlreadyInitialized => write!(f, "Scheduler already initialized"),
        }
    }
}
