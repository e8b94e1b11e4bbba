/*
 * Scheduler Trait Definitions
 *
 * This module defines the traits that separate scheduling policy from mechanism:
 *
 * - DispatchPolicy: the "pick next thread" strategy, chosen once at boot
 * - SchedView: the read-only window policies get onto scheduler state
 *
 * Policies never mutate thread control blocks. They rank threads for the
 * ready queue, choose among the queued ones, and may observe events.
 */

use super::{
    ThreadId,
    events::SchedEvent,
    policies::PolicyKind,
    ready_queue::ReadyQueue,
    thread::Thread,
    types::Rank,
};

/// Scheduling policy trait
///
/// The SchedulerCore holds a `Box<dyn DispatchPolicy>` for its whole
/// lifetime. When the ready queue is empty the core runs the idle thread
/// without consulting the policy.
pub trait DispatchPolicy: Send {
    /// Get the policy name for debugging
    fn name(&self) -> &'static str;

    /// Menu entry this policy implements
    fn kind(&self) -> PolicyKind;

    /// Ordering key used when `thread` is inserted into the ready queue
    ///
    /// Called with the thread's current effective priority and statistics,
    /// and again whenever its effective priority changes while it is Ready.
    fn rank(&self, thread: &Thread) -> Rank;

    /// Choose and dequeue the next thread to run
    ///
    /// Only called with a non-empty queue. The default takes the front of
    /// the queue, which is what every rank-only policy wants.
    fn pick_next(&mut self, ready: &mut ReadyQueue, _view: &dyn SchedView) -> Option<ThreadId> {
        ready.pop_highest()
    }

    /// Whether the policy always runs a highest-priority Ready thread
    fn respects_priority(&self) -> bool {
        false
    }

    /// React to a scheduling event
    fn on_event(&mut self, _view: &dyn SchedView, _event: SchedEvent) {}
}

/// Read-only scheduler state exposed to policies
pub trait SchedView {
    /// Look up a live thread
    fn thread(&self, tid: ThreadId) -> Option<&Thread>;

    /// Thread that was running when the policy was consulted
    fn current_thread(&self) -> ThreadId;

    /// Timer ticks since boot
    fn now_ticks(&self) -> u64;
}
