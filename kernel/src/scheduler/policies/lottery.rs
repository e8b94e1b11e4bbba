/*
 * Lottery Dispatch Policy
 *
 * Every Ready thread holds `effective priority + 1` tickets; a draw from a
 * seeded xorshift64* generator picks the winner. Donations therefore buy a
 * lock holder more tickets, not a guaranteed slot. The generator is
 * deterministic for a given seed, which keeps boots reproducible.
 */

use super::super::{
    ThreadId,
    ready_queue::ReadyQueue,
    thread::Thread,
    traits::{DispatchPolicy, SchedView},
    types::{Priority, Rank},
};
use super::PolicyKind;

const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Lottery scheduling policy
pub struct LotteryPolicy {
    state: u64,
}

impl LotteryPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    /// Tickets held by a thread of the given effective priority
    pub fn tickets(priority: Priority) -> u64 {
        priority.0.max(0) as u64 + 1
    }

    fn next_random(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

impl DispatchPolicy for LotteryPolicy {
    fn name(&self) -> &'static str {
        "lottery"
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Lottery
    }

    fn rank(&self, _thread: &Thread) -> Rank {
        Rank::FIFO
    }

    fn pick_next(&mut self, ready: &mut ReadyQueue, _view: &dyn SchedView) -> Option<ThreadId> {
        let total: u64 = ready.entries().map(|(_, prio)| Self::tickets(prio)).sum();
        if total == 0 {
            return None;
        }

        let mut draw = self.next_random() % total;
        let winner = ready.entries().find_map(|(tid, prio)| {
            let tickets = Self::tickets(prio);
            if draw < tickets {
                Some(tid)
            } else {
                draw -= tickets;
                None
            }
        })?;

        ready.remove(winner);
        Some(winner)
    }
}
