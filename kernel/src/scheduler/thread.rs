/*
 * Thread Control Block
 *
 * This module defines the Thread structure and related types
 * for the scheduler: identity, lifecycle state, base and effective
 * priority, donation bookkeeping and per-thread statistics.
 */

use alloc::vec::Vec;
use core::fmt;

use super::types::{Priority, ResourceId};

/// Longest thread name kept for diagnostics, in bytes
pub const MAX_NAME_LEN: usize = 15;

/// Fixed-capacity thread name
pub type ThreadName = heapless::String<16>;

/// Thread entry point; receives the argument given at creation
pub type ThreadEntry = fn(usize);

/// Thread identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub usize);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({})", self.0)
    }
}

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    Ready,
    Blocked,
    Dying,
}

/// What a thread executes, used to charge timer ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadKind {
    #[default]
    Kernel,
    User,
}

/// Per-thread statistics
///
/// Counts are numbers of entries into a state, durations are in timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadStats {
    pub blocked_count: u32,
    pub blocked_ticks: u64,
    pub running_count: u32,
    pub running_ticks: u64,
    pub ready_ticks: u64,
    /// Time slices used up completely
    pub quantum_exhausted: u32,
    /// Times the thread gave up the CPU while still runnable
    pub expropriated: u32,
}

/// Thread control block
///
/// Control blocks live in the registry arena and refer to each other only by
/// ThreadId, never by pointer.
pub struct Thread {
    pub id: ThreadId,
    pub name: ThreadName,
    pub status: ThreadState,
    pub kind: ThreadKind,

    pub base_priority: Priority,
    pub effective_priority: Priority,
    pub nice: i8,

    /// Resource this thread waits for (only meaningful while it waits)
    pub waiting_on: Option<ResourceId>,
    /// Donors, ordered by their effective priority, highest first
    pub donations: Vec<ThreadId>,
    /// Holder whose donation list currently contains this thread
    pub donee: Option<ThreadId>,

    /// None for the bootstrap thread, which was already running
    pub entry: Option<ThreadEntry>,
    pub arg: usize,

    pub stats: ThreadStats,
    /// Tick at which the thread entered its current state
    pub state_since: u64,
}

impl Thread {
    /// Build a fresh control block in the Blocked state
    pub fn new(
        id: ThreadId,
        name: &str,
        priority: Priority,
        entry: Option<ThreadEntry>,
        arg: usize,
        now: u64,
    ) -> Self {
        Self {
            id,
            name: truncate_name(name),
            status: ThreadState::Blocked,
            kind: ThreadKind::Kernel,
            base_priority: priority,
            effective_priority: priority,
            nice: 0,
            waiting_on: None,
            donations: Vec::new(),
            donee: None,
            entry,
            arg,
            stats: ThreadStats::default(),
            state_since: now,
        }
    }

    /// Move to `to`, charging the time spent in the old state
    pub fn transition(&mut self, to: ThreadState, now: u64) {
        let elapsed = now.saturating_sub(self.state_since);
        charge(&mut self.stats, self.status, elapsed);
        self.status = to;
        self.state_since = now;
    }

    /// Statistics including the time spent so far in the current state
    pub fn stats_at(&self, now: u64) -> ThreadStats {
        let mut stats = self.stats;
        charge(&mut stats, self.status, now.saturating_sub(self.state_since));
        stats
    }
}

fn charge(stats: &mut ThreadStats, state: ThreadState, ticks: u64) {
    match state {
        ThreadState::Running => stats.running_ticks += ticks,
        ThreadState::Ready => stats.ready_ticks += ticks,
        ThreadState::Blocked => stats.blocked_ticks += ticks,
        ThreadState::Dying => {}
    }
}

/// Copy at most MAX_NAME_LEN bytes of `name`, cutting at a char boundary
pub fn truncate_name(name: &str) -> ThreadName {
    let mut out = ThreadName::new();
    for c in name.chars() {
        if out.len() + c.len_utf8() > MAX_NAME_LEN {
            break;
        }
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name.as_str())
            .field("status", &self.status)
            .field("base_priority", &self.base_priority)
            .field("effective_priority", &self.effective_priority)
            .field("waiting_on", &self.waiting_on)
            .field("donations", &self.donations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_truncated() {
        let t = Thread::new(ThreadId(1), "a-very-long-thread-name", Priority(5), None, 0, 0);
        assert_eq!(t.name.as_str(), "a-very-long-thr");
        assert_eq!(t.name.len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_name_truncation_respects_char_boundaries() {
        // 7 two-byte chars fill 14 bytes; the 8th would overflow 15
        let name = truncate_name("ééééééééé");
        assert_eq!(name.as_str(), "ééééééé");
    }

    #[test]
    fn test_transition_charges_elapsed_ticks() {
        let mut t = Thread::new(ThreadId(2), "worker", Priority::DEFAULT, None, 0, 10);
        t.transition(ThreadState::Ready, 12);
        t.transition(ThreadState::Running, 20);
        t.transition(ThreadState::Blocked, 25);
        assert_eq!(t.stats.blocked_ticks, 2);
        assert_eq!(t.stats.ready_ticks, 8);
        assert_eq!(t.stats.running_ticks, 5);

        let live = t.stats_at(30);
        assert_eq!(live.blocked_ticks, 7);
        assert_eq!(t.stats.blocked_ticks, 2);
    }
}
