/*
 * Test Suite for the Scheduler
 *
 * Whole-scheduler tests driven on the simulated platform. Every call made on
 * the SchedulerCore runs "as the current thread"; after a call that switched
 * threads, the test continues as the thread that was switched to.
 *
 * - scenarios: dispatch order, donation, idle and preemption walkthroughs
 * - properties: random operation sequences checked against the invariants
 */

mod scenarios;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::arch::sim::{SimHandle, SimPlatform};
use crate::scheduler::{
    PolicyKind, Priority, ResourceId, SchedConfig, SchedulerCore, ThreadId, ThreadState,
};

/// Thread body for tests; the simulated platform never runs it
pub(crate) fn body(_: usize) {}

/// Boot a scheduler on a fresh simulated platform
pub(crate) fn boot(policy: PolicyKind) -> (SchedulerCore, SimHandle) {
    let (platform, handle) = SimPlatform::new();
    let config = SchedConfig::default()
        .with_policy(policy)
        .with_lottery_seed(0x5EED);
    (SchedulerCore::new(config, Box::new(platform)), handle)
}

/// Block the current thread the way a synchronization primitive does
pub(crate) fn block_current(core: &mut SchedulerCore) {
    core.without_interrupts(|core| core.block());
}

/// Copy of the scheduling-relevant fields of one thread
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub id: ThreadId,
    pub status: ThreadState,
    pub base: Priority,
    pub effective: Priority,
    pub donations: Vec<ThreadId>,
    pub donee: Option<ThreadId>,
    pub waiting_on: Option<ResourceId>,
}

pub(crate) fn snapshot(core: &mut SchedulerCore) -> Vec<Snapshot> {
    core.without_interrupts(|core| {
        let mut out = Vec::new();
        core.for_each(|t| {
            out.push(Snapshot {
                id: t.id,
                status: t.status,
                base: t.base_priority,
                effective: t.effective_priority,
                donations: t.donations.clone(),
                donee: t.donee,
                waiting_on: t.waiting_on,
            })
        });
        out
    })
}

/// Check every structural invariant of the scheduler, returning the first
/// violation found
pub(crate) fn check_invariants(core: &mut SchedulerCore) -> Result<(), alloc::string::String> {
    use alloc::format;

    let threads = snapshot(core);
    let find = |tid: ThreadId| threads.iter().find(|t| t.id == tid);
    let ready = core.ready_queue();

    let running: Vec<ThreadId> = threads
        .iter()
        .filter(|t| t.status == ThreadState::Running)
        .map(|t| t.id)
        .collect();
    if running != [core.current()] {
        return Err(format!("running {:?}, current {}", running, core.current()));
    }

    let ready_count = threads.iter().filter(|t| t.status == ThreadState::Ready).count();
    if ready_count != ready.len() {
        return Err(format!("{} ready threads but {} queued", ready_count, ready.len()));
    }
    for t in &threads {
        if (t.status == ThreadState::Ready) != ready.contains(t.id) {
            return Err(format!("{} is {:?}, queued: {}", t.id, t.status, ready.contains(t.id)));
        }
    }
    if ready.contains(core.idle_thread()) {
        return Err("idle thread is queued".into());
    }

    if core.policy().respects_priority() {
        let entries: Vec<_> = ready.entries().collect();
        for pair in entries.windows(2) {
            if pair[0].1 < pair[1].1 {
                return Err(format!("queue out of order: {:?}", entries));
            }
        }
        for (tid, prio) in &entries {
            if find(*tid).map(|t| t.effective) != Some(*prio) {
                return Err(format!("{} queued with stale priority {}", tid, prio));
            }
        }
    }

    for t in &threads {
        let donated = t
            .donations
            .iter()
            .filter_map(|d| find(*d))
            .map(|d| d.effective)
            .max();
        let expected = donated.map_or(t.base, |p| p.max(t.base));
        if t.effective != expected {
            return Err(format!(
                "{} effective {} but base {} and donations {:?}",
                t.id, t.effective, t.base, t.donations
            ));
        }
        if let Some(donee) = t.donee {
            if !find(donee).is_some_and(|h| h.donations.contains(&t.id)) {
                return Err(format!("{} lists {} as donee without an edge", t.id, donee));
            }
        }
    }

    Ok(())
}
