/*
 * Scheduler Context - SchedView Implementation
 *
 * SchedContext is the bridge between dispatch policies and the scheduler's
 * thread registry. It borrows the registry immutably so a policy can be
 * handed `&mut ReadyQueue` and a view of the threads at the same time.
 */

use super::{
    ThreadId,
    registry::ThreadRegistry,
    thread::Thread,
    traits::SchedView,
};

/// Scheduling context for policy access
pub struct SchedContext<'a> {
    registry: &'a ThreadRegistry,
    current: ThreadId,
    now: u64,
}

impl<'a> SchedContext<'a> {
    pub fn new(registry: &'a ThreadRegistry, current: ThreadId, now: u64) -> Self {
        Self {
            registry,
            current,
            now,
        }
    }
}

impl SchedView for SchedContext<'_> {
    fn thread(&self, tid: ThreadId) -> Option<&Thread> {
        self.registry.get(tid)
    }

    fn current_thread(&self) -> ThreadId {
        self.current
    }

    fn now_ticks(&self) -> u64 {
        self.now
    }
}
