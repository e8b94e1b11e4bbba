/*
 * Thread Registry
 *
 * Owns every thread control block. Blocks are stored in an arena keyed by
 * ThreadId; a separate creation-ordered list holds the threads that are
 * still visible to diagnostics (a thread leaves it when it exits, while its
 * control block stays alive until the next thread is running).
 */

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::{
    Exhausted, Priority, SchedError,
    thread::{Thread, ThreadEntry, ThreadId, ThreadState},
};

pub struct ThreadRegistry {
    threads: BTreeMap<ThreadId, Thread>,
    visible: Vec<ThreadId>,
    next_id: ThreadId,
    capacity: usize,
}

impl ThreadRegistry {
    /// Create an empty registry with room for `capacity` control blocks
    pub fn new(capacity: usize) -> Self {
        Self {
            threads: BTreeMap::new(),
            visible: Vec::new(),
            next_id: ThreadId(1),
            capacity,
        }
    }

    /// Allocate a Blocked control block and register it
    ///
    /// Ids are handed out monotonically and never reused.
    pub fn allocate(
        &mut self,
        name: &str,
        priority: Priority,
        entry: Option<ThreadEntry>,
        arg: usize,
        now: u64,
    ) -> Result<ThreadId, SchedError> {
        if self.threads.len() >= self.capacity {
            return Err(SchedError::AllocationError {
                resource: Exhausted::ThreadSlot {
                    live: self.threads.len(),
                    capacity: self.capacity,
                },
            });
        }

        let id = self.next_id;
        self.next_id.0 += 1;

        self.threads
            .insert(id, Thread::new(id, name, priority, entry, arg, now));
        self.visible.push(id);
        Ok(id)
    }

    /// Drop a block that never ran (creation was rolled back)
    pub(crate) fn discard(&mut self, tid: ThreadId) {
        if let Some(thread) = self.threads.remove(&tid) {
            assert!(
                thread.status == ThreadState::Blocked,
                "discarding {} in state {:?}",
                tid,
                thread.status
            );
        }
        self.visible.retain(|&id| id != tid);
    }

    /// Reclaim the control block of a dying thread
    ///
    /// `current` is the thread executing right now; a thread can never
    /// reclaim itself.
    pub fn destroy(&mut self, tid: ThreadId, current: ThreadId) -> Thread {
        assert_ne!(tid, current, "{} tried to reclaim its own control block", tid);
        let status = self.expect(tid).status;
        assert_eq!(status, ThreadState::Dying, "destroying {} in state {:?}", tid, status);

        self.visible.retain(|&id| id != tid);
        match self.threads.remove(&tid) {
            Some(thread) => thread,
            None => panic!("{} vanished while being destroyed", tid),
        }
    }

    /// Remove a thread from the diagnostic list without reclaiming it
    pub fn unlist(&mut self, tid: ThreadId) {
        self.visible.retain(|&id| id != tid);
    }

    pub fn get(&self, tid: ThreadId) -> Option<&Thread> {
        self.threads.get(&tid)
    }

    pub fn get_mut(&mut self, tid: ThreadId) -> Option<&mut Thread> {
        self.threads.get_mut(&tid)
    }

    /// Look a thread up, treating an unknown id as a fatal caller bug
    pub fn expect(&self, tid: ThreadId) -> &Thread {
        match self.threads.get(&tid) {
            Some(thread) => thread,
            None => panic!("{} is not a live thread", tid),
        }
    }

    pub fn expect_mut(&mut self, tid: ThreadId) -> &mut Thread {
        match self.threads.get_mut(&tid) {
            Some(thread) => thread,
            None => panic!("{} is not a live thread", tid),
        }
    }

    /// Visit every visible thread in creation order
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Thread),
    {
        for tid in &self.visible {
            if let Some(thread) = self.threads.get(tid) {
                visitor(thread);
            }
        }
    }

    /// Every live control block, ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }
}
