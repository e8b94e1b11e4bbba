/*
 * Scheduler Event Definitions
 *
 * This module defines the events that the scheduler mechanism reports to
 * dispatch policies. Order-only policies ignore them; policies that keep
 * their own per-thread accounting (feedback queues, dynamic lotteries)
 * react to them.
 */

use super::{ThreadId, types::Priority};

/// Events that the scheduler core reports to the active policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedEvent {
    /// A new thread was created and is about to become Ready
    ThreadCreated { tid: ThreadId, priority: Priority },

    /// A blocked thread became Ready
    ThreadReady { tid: ThreadId },

    /// A running thread blocked itself
    ThreadBlocked { tid: ThreadId },

    /// A thread exited and will not run again
    ThreadExited { tid: ThreadId },

    /// Timer interrupt; `current` was running when it fired
    Tick { current: ThreadId },

    /// A thread's base priority was changed
    PriorityChanged {
        tid: ThreadId,
        old_priority: Priority,
        new_priority: Priority,
    },

    /// A thread's nice value was changed
    NiceChanged { tid: ThreadId, nice: i8 },

    /// A dispatch completed and `next` is running
    Switched { prev: ThreadId, next: ThreadId },
}
