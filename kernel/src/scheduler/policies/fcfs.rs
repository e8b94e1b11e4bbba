/*
 * First-Come, First-Served Dispatch Policy
 *
 * Every thread gets the same rank, so the ready queue degenerates into a
 * FIFO: the thread that became Ready first runs first, whatever its
 * priority. This is the fallback for unrecognized boot selections.
 */

use super::super::{
    thread::Thread,
    traits::DispatchPolicy,
    types::Rank,
};
use super::PolicyKind;

/// FCFS scheduling policy
pub struct FcfsPolicy;

impl FcfsPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl DispatchPolicy for FcfsPolicy {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Fcfs
    }

    fn rank(&self, _thread: &Thread) -> Rank {
        Rank::FIFO
    }
}

impl Default for FcfsPolicy {
    fn default() -> Self {
        Self::new()
    }
}
