/*
 * Fair-Share Dispatch Policy (simplified CFS)
 *
 * Ranks each thread by the CPU time it has consumed so far, scaled by a
 * weight derived from its nice value: the least-served thread runs next.
 * A Ready thread's running time cannot change while it sits in the queue,
 * so the rank computed at insertion stays valid until it is dispatched.
 */

use super::super::{
    thread::Thread,
    traits::DispatchPolicy,
    types::Rank,
};
use super::PolicyKind;
use crate::scheduler::{NICE_MAX, NICE_MIN};

/// Fair-share scheduling policy
pub struct FairSharePolicy;

impl FairSharePolicy {
    pub fn new() -> Self {
        Self
    }

    /// Multiplier applied to consumed ticks; 1 at NICE_MIN, growing by one
    /// per nice step
    pub fn weight(nice: i8) -> i64 {
        let nice = nice.clamp(NICE_MIN, NICE_MAX);
        (nice as i64) - (NICE_MIN as i64) + 1
    }
}

impl DispatchPolicy for FairSharePolicy {
    fn name(&self) -> &'static str {
        "sCFS"
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::FairShare
    }

    fn rank(&self, thread: &Thread) -> Rank {
        let used = i64::try_from(thread.stats.running_ticks).unwrap_or(i64::MAX);
        Rank(used.saturating_mul(Self::weight(thread.nice)))
    }
}

impl Default for FairSharePolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{ThreadId, types::Priority};

    #[test]
    fn test_least_served_ranks_first() {
        let policy = FairSharePolicy::new();
        let mut busy = Thread::new(ThreadId(1), "busy", Priority(50), None, 0, 0);
        busy.stats.running_ticks = 12;
        let fresh = Thread::new(ThreadId(2), "fresh", Priority(1), None, 0, 0);
        assert!(policy.rank(&fresh) < policy.rank(&busy));
    }

    #[test]
    fn test_nice_scales_usage() {
        let policy = FairSharePolicy::new();
        let mut polite = Thread::new(ThreadId(1), "polite", Priority(1), None, 0, 0);
        polite.nice = 10;
        polite.stats.running_ticks = 4;
        let mut greedy = Thread::new(ThreadId(2), "greedy", Priority(1), None, 0, 0);
        greedy.nice = -10;
        greedy.stats.running_ticks = 4;
        assert!(policy.rank(&greedy) < policy.rank(&polite));
        assert_eq!(FairSharePolicy::weight(NICE_MIN), 1);
    }
}
