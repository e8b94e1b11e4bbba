/*
 * Prioritized Dispatch Policy
 *
 * Runs the Ready thread with the strictly highest effective priority;
 * threads of equal priority run in the order they became Ready. This is the
 * policy the donation engine is designed against: a lock holder that
 * inherits a waiter's priority is reordered in the queue immediately.
 */

use super::super::{
    thread::Thread,
    traits::DispatchPolicy,
    types::Rank,
};
use super::PolicyKind;

/// Priority-ordered scheduling policy
pub struct PriorityPolicy;

impl PriorityPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl DispatchPolicy for PriorityPolicy {
    fn name(&self) -> &'static str {
        "prioritized"
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Prioritized
    }

    fn rank(&self, thread: &Thread) -> Rank {
        Rank::by_priority(thread.effective_priority)
    }

    fn respects_priority(&self) -> bool {
        true
    }
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self::new()
    }
}
