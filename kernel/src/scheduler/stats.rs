/*
 * Scheduler Statistics
 *
 * Global counters maintained by the SchedulerCore and a per-thread snapshot
 * used for diagnostics. Durations are measured in timer ticks.
 */

use super::{
    ThreadId,
    thread::{ThreadName, ThreadState, ThreadStats},
    types::{Priority, TickCategory},
};

/// System-wide scheduler counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalStats {
    pub ticks: u64,
    pub idle_ticks: u64,
    pub kernel_ticks: u64,
    pub user_ticks: u64,
    /// Dispatches that actually changed the running thread
    pub context_switches: u64,
    pub threads_created: u64,
    pub threads_exited: u64,
    /// Sum of the ready-queue waiting time of every exited thread
    pub ready_wait_total: u64,
}

impl GlobalStats {
    /// Charge one timer tick
    pub fn record_tick(&mut self, category: TickCategory) {
        self.ticks += 1;
        match category {
            TickCategory::Idle => self.idle_ticks += 1,
            TickCategory::Kernel => self.kernel_ticks += 1,
            TickCategory::User => self.user_ticks += 1,
        }
    }

    /// Average ready-queue wait per created thread, in ticks
    pub fn mean_ready_wait(&self) -> u64 {
        if self.threads_created == 0 {
            0
        } else {
            self.ready_wait_total / self.threads_created
        }
    }
}

/// Snapshot of one thread for diagnostics
#[derive(Debug, Clone)]
pub struct ThreadReport {
    pub id: ThreadId,
    pub name: ThreadName,
    pub state: ThreadState,
    pub base_priority: Priority,
    pub effective_priority: Priority,
    pub stats: ThreadStats,
}
