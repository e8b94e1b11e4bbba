/*
 * Ready Queue
 *
 * Ordered collection of the threads that are Ready. Ordering comes from the
 * Rank the active dispatch policy assigns at insertion time; threads with
 * the same rank are kept in insertion order (stable FIFO within a band).
 *
 * Two indexes are kept in sync:
 * - order: (rank, insertion sequence) -> thread, walked front to back
 * - index: thread -> its entry, for O(log n) removal and reordering
 *
 * The queue never holds the running thread or the idle thread.
 */

use alloc::collections::BTreeMap;

use super::{
    ThreadId,
    types::{Priority, Rank},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReadyEntry {
    rank: Rank,
    seq: u64,
    priority: Priority,
}

#[derive(Debug, Default)]
pub struct ReadyQueue {
    order: BTreeMap<(Rank, u64), ThreadId>,
    index: BTreeMap<ThreadId, ReadyEntry>,
    next_seq: u64,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `tid` behind every thread of equal or better rank
    pub fn insert(&mut self, tid: ThreadId, rank: Rank, priority: Priority) {
        assert!(!self.index.contains_key(&tid), "{} is already in the ready queue", tid);

        let seq = self.next_seq;
        self.next_seq += 1;

        self.order.insert((rank, seq), tid);
        self.index.insert(tid, ReadyEntry { rank, seq, priority });
    }

    /// Remove `tid`, returning whether it was queued
    pub fn remove(&mut self, tid: ThreadId) -> bool {
        match self.index.remove(&tid) {
            Some(entry) => {
                self.order.remove(&(entry.rank, entry.seq));
                true
            }
            None => false,
        }
    }

    /// Take the front thread
    pub fn pop_highest(&mut self) -> Option<ThreadId> {
        let (_, tid) = self.order.pop_first()?;
        self.index.remove(&tid);
        Some(tid)
    }

    /// Re-sort `tid` after its rank or priority changed
    ///
    /// Unchanged entries keep their place so that equal-rank threads are not
    /// pushed behind one another for nothing.
    pub fn reorder(&mut self, tid: ThreadId, rank: Rank, priority: Priority) {
        match self.index.get_mut(&tid) {
            Some(entry) if entry.rank == rank => entry.priority = priority,
            Some(_) => {
                self.remove(tid);
                self.insert(tid, rank, priority);
            }
            None => {}
        }
    }

    pub fn contains(&self, tid: ThreadId) -> bool {
        self.index.contains_key(&tid)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Highest effective priority among the queued threads
    pub fn max_priority(&self) -> Option<Priority> {
        self.index.values().map(|entry| entry.priority).max()
    }

    /// Effective priority recorded for a queued thread
    pub fn priority_of(&self, tid: ThreadId) -> Option<Priority> {
        self.index.get(&tid).map(|entry| entry.priority)
    }

    /// Queued threads in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.order.values().copied()
    }

    /// Queued threads with their priorities, in dispatch order
    pub fn entries(&self) -> impl Iterator<Item = (ThreadId, Priority)> + '_ {
        self.order
            .values()
            .filter_map(|tid| self.index.get(tid).map(|entry| (*tid, entry.priority)))
    }
}
