/*
 * Scheduler Scenarios
 *
 * Step-by-step walkthroughs of dispatch order, priority donation, the idle
 * thread and preemption, checking the structural invariants along the way.
 */

use alloc::vec::Vec;

use super::{block_current, body, boot, check_invariants};
use crate::scheduler::{PolicyKind, Priority, ResourceId, SchedulerCore, ThreadId, ThreadState};

const R: ResourceId = ResourceId(0x100);
const R2: ResourceId = ResourceId(0x200);

fn assert_consistent(core: &mut SchedulerCore) {
    if let Err(violation) = check_invariants(core) {
        panic!("invariant violated: {}", violation);
    }
}

fn status(core: &SchedulerCore, tid: ThreadId) -> ThreadState {
    core.thread(tid).unwrap().status
}

fn effective(core: &SchedulerCore, tid: ThreadId) -> Priority {
    core.thread(tid).unwrap().effective_priority
}

/// Exit threads one after the other until only idle is left to run
fn drain(core: &mut SchedulerCore) -> Vec<ThreadId> {
    let mut order = Vec::new();
    while core.current() != core.idle_thread() {
        order.push(core.current());
        core.exit();
        assert_consistent(core);
    }
    order
}

#[test]
fn test_highest_priority_runs_first() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();
    let t10 = core.create("t10", Priority(10), body, 0).unwrap();
    let t20 = core.create("t20", Priority(20), body, 0).unwrap();
    let t5 = core.create("t5", Priority(5), body, 0).unwrap();
    assert_eq!(core.current(), main);
    assert_consistent(&mut core);

    block_current(&mut core);
    assert_eq!(core.current(), t20);
    assert_consistent(&mut core);

    assert_eq!(drain(&mut core), alloc::vec![t20, t10, t5]);
}

#[test]
fn test_round_trip_descending_priority() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let prios = [3, 7, 12, 7, 1, 25];
    let tids: Vec<ThreadId> = prios
        .iter()
        .map(|&p| core.create("w", Priority(p), body, 0).unwrap())
        .collect();

    block_current(&mut core);
    let order = drain(&mut core);

    // Equal priorities keep creation order
    let expected = alloc::vec![tids[5], tids[2], tids[1], tids[3], tids[0], tids[4]];
    assert_eq!(order, expected);
}

#[test]
fn test_fcfs_ignores_priority() {
    let (mut core, _handle) = boot(PolicyKind::Fcfs);
    let a = core.create("a", Priority(5), body, 0).unwrap();
    let b = core.create("b", Priority(20), body, 0).unwrap();
    let c = core.create("c", Priority(10), body, 0).unwrap();

    block_current(&mut core);
    assert_eq!(drain(&mut core), alloc::vec![a, b, c]);
}

#[test]
fn test_donation_prevents_inversion() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();

    let low = core.create("low", Priority(10), body, 0).unwrap();
    block_current(&mut core);
    assert_eq!(core.current(), low);

    core.resource_acquired(R);
    core.unblock(main);
    core.yield_to_max();
    assert_eq!(core.current(), main);

    let medium = core.create("medium", Priority(30), body, 0).unwrap();
    let high = core.create("high", Priority(50), body, 0).unwrap();
    assert_eq!(core.current(), high);

    core.wait_on(R);
    assert_eq!(effective(&core, low), Priority(50));
    assert_eq!(core.thread(low).unwrap().base_priority, Priority(10));
    assert_consistent(&mut core);

    block_current(&mut core);
    assert_eq!(core.current(), low);
    assert_eq!(core.get_priority(), Priority(50));
    assert_consistent(&mut core);

    core.resource_released(R);
    assert_eq!(effective(&core, low), Priority(10));
    assert_eq!(core.current(), main);
    assert_eq!(core.thread(medium).unwrap().stats.running_count, 0);
    assert_consistent(&mut core);

    core.unblock(high);
    core.yield_to_max();
    assert_eq!(core.current(), high);
    core.resource_acquired(R);
    assert_eq!(core.holder(R), Some(high));
    assert_eq!(core.thread(high).unwrap().waiting_on, None);
    assert_consistent(&mut core);
}

#[test]
fn test_nested_donation_chain() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();

    let a = core.create("a", Priority(10), body, 0).unwrap();
    block_current(&mut core);
    assert_eq!(core.current(), a);
    core.resource_acquired(R);
    core.unblock(main);
    core.yield_to_max();
    assert_eq!(core.current(), main);

    let b = core.create("b", Priority(20), body, 0).unwrap();
    block_current(&mut core);
    assert_eq!(core.current(), b);
    core.resource_acquired(R2);
    core.wait_on(R);
    assert_eq!(effective(&core, a), Priority(20));
    block_current(&mut core);
    assert_eq!(core.current(), a);

    core.unblock(main);
    core.yield_to_max();
    assert_eq!(core.current(), main);

    let c = core.create("c", Priority(40), body, 0).unwrap();
    assert_eq!(core.current(), c);
    core.wait_on(R2);
    assert_eq!(effective(&core, b), Priority(40));
    assert_eq!(effective(&core, a), Priority(40));
    assert_consistent(&mut core);

    block_current(&mut core);
    assert_eq!(core.current(), a);

    // Releasing R drops b's donation and with it c's, which came through b
    core.resource_released(R);
    assert_eq!(effective(&core, a), Priority(10));
    assert_eq!(effective(&core, b), Priority(40));
    assert_eq!(core.current(), main);
    assert_consistent(&mut core);
}

#[test]
fn test_waiter_exiting_early_withdraws_donation() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();
    core.resource_acquired(R);

    let waiter = core.create("waiter", Priority(50), body, 0).unwrap();
    assert_eq!(core.current(), waiter);
    core.wait_on(R);
    block_current(&mut core);
    assert_eq!(core.current(), main);
    assert_eq!(core.get_priority(), Priority(50));

    // Woken without the resource, e.g. by a timeout, and exits at once
    core.unblock(waiter);
    core.yield_now();
    assert_eq!(core.current(), waiter);
    core.exit();

    assert_eq!(core.current(), main);
    assert_eq!(core.get_priority(), Priority::DEFAULT);
    assert!(core.current_thread().donations.is_empty());
    assert_eq!(core.holder(R), Some(main));
    assert_consistent(&mut core);
}

#[test]
fn test_giving_up_wait_withdraws_donation() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();
    core.resource_acquired(R);

    let waiter = core.create("waiter", Priority(50), body, 0).unwrap();
    core.wait_on(R);
    block_current(&mut core);
    assert_eq!(effective(&core, main), Priority(50));

    core.unblock(waiter);
    core.yield_now();
    assert_eq!(core.current(), waiter);
    core.stop_waiting(R);

    assert_eq!(core.current(), waiter);
    assert_eq!(core.thread(waiter).unwrap().waiting_on, None);
    assert_eq!(core.thread(waiter).unwrap().donee, None);
    assert_eq!(effective(&core, main), Priority::DEFAULT);
    assert_eq!(status(&core, main), ThreadState::Ready);
    assert_consistent(&mut core);
}

#[test]
fn test_giving_up_wait_unwinds_chain() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();

    let a = core.create("a", Priority(10), body, 0).unwrap();
    block_current(&mut core);
    core.resource_acquired(R);
    core.unblock(main);
    core.yield_to_max();

    let b = core.create("b", Priority(20), body, 0).unwrap();
    block_current(&mut core);
    assert_eq!(core.current(), b);
    core.resource_acquired(R2);
    core.wait_on(R);
    block_current(&mut core);
    assert_eq!(core.current(), a);
    core.unblock(main);
    core.yield_to_max();
    assert_eq!(core.current(), main);

    let c = core.create("c", Priority(40), body, 0).unwrap();
    core.wait_on(R2);
    block_current(&mut core);
    assert_eq!(effective(&core, a), Priority(40));

    // c is woken early, gets the CPU on a tie with a, and gives up
    core.unblock(c);
    core.yield_now();
    assert_eq!(core.current(), c);
    core.stop_waiting(R2);

    assert_eq!(effective(&core, b), Priority(20));
    assert_eq!(effective(&core, a), Priority(20));
    assert_eq!(core.thread(b).unwrap().waiting_on, Some(R));
    assert_eq!(core.current(), c);
    assert_consistent(&mut core);
}

#[test]
#[should_panic(expected = "without waiting on it")]
fn test_stop_waiting_requires_a_wait() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    core.stop_waiting(R);
}

#[test]
fn test_priority_change_keeps_donation() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();
    core.resource_acquired(R);

    let high = core.create("high", Priority(50), body, 0).unwrap();
    core.wait_on(R);
    block_current(&mut core);
    assert_eq!(core.current(), main);
    assert_eq!(core.get_priority(), Priority(50));

    core.set_priority(Priority(5));
    assert_eq!(core.current(), main);
    assert_eq!(core.get_priority(), Priority(50));

    core.resource_released(R);
    assert_eq!(core.get_priority(), Priority(5));
    assert_eq!(status(&core, high), ThreadState::Blocked);
    assert_consistent(&mut core);
}

#[test]
fn test_idle_runs_when_nothing_is_ready() {
    let (mut core, handle) = boot(PolicyKind::Prioritized);
    let main = core.current();
    let idle = core.idle_thread();

    block_current(&mut core);
    assert_eq!(core.current(), idle);
    assert_eq!(status(&core, idle), ThreadState::Running);
    assert!(!core.ready_queue().contains(idle));
    assert_consistent(&mut core);

    for _ in 0..4 {
        handle.fire_timer(&mut core);
    }
    assert_eq!(core.current(), idle);
    assert_eq!(status(&core, idle), ThreadState::Running);
    assert_eq!(core.stats().idle_ticks, 4);
    assert_eq!(handle.switches(), alloc::vec![(main, idle)]);

    core.unblock(main);
    core.yield_now();
    assert_eq!(core.current(), main);
    assert_eq!(status(&core, idle), ThreadState::Blocked);
    assert!(!core.ready_queue().contains(idle));
    assert_consistent(&mut core);
}

#[test]
fn test_lowering_priority_yields_immediately() {
    let (mut core, _handle) = boot(PolicyKind::Prioritized);
    let main = core.current();
    let t20 = core.create("t20", Priority(20), body, 0).unwrap();
    assert_eq!(core.current(), main);

    core.set_priority(Priority(10));
    assert_eq!(core.current(), t20);
    assert_eq!(status(&core, main), ThreadState::Ready);
    assert_eq!(core.thread(main).unwrap().base_priority, Priority(10));
    assert_consistent(&mut core);
}

#[test]
fn test_fair_share_prefers_least_served() {
    let (mut core, handle) = boot(PolicyKind::FairShare);
    let w1 = core.create("w1", Priority::DEFAULT, body, 0).unwrap();
    let w2 = core.create("w2", Priority::DEFAULT, body, 0).unwrap();

    block_current(&mut core);
    assert_eq!(core.current(), w1);

    // w1 uses up a full slice and is preempted
    for _ in 0..4 {
        handle.fire_timer(&mut core);
    }
    assert_eq!(core.current(), w2);

    // w2 has used less CPU than w1, so it runs again after yielding
    handle.fire_timer(&mut core);
    handle.fire_timer(&mut core);
    core.yield_now();
    assert_eq!(core.current(), w2);
    assert_consistent(&mut core);
}

#[test]
fn test_lottery_runs_everyone() {
    let (mut core, handle) = boot(PolicyKind::Lottery);
    core.start();
    let workers: Vec<ThreadId> = [10, 15, 20, 25]
        .iter()
        .map(|&p| core.create("w", Priority(p), body, 0).unwrap())
        .collect();
    block_current(&mut core);

    for _ in 0..400 {
        handle.fire_timer(&mut core);
        assert_consistent(&mut core);
    }
    for tid in workers {
        assert!(core.thread(tid).unwrap().stats.running_count > 0, "{} never ran", tid);
    }
}

#[test]
fn test_bootstrap_exit_reports_summary() {
    let (mut core, handle) = boot(PolicyKind::Prioritized);
    let main = core.current();
    let worker = core.create("worker", Priority(10), body, 0).unwrap();

    for _ in 0..3 {
        handle.fire_timer(&mut core);
    }
    core.exit();
    assert_eq!(core.current(), worker);
    assert!(core.thread(main).is_none());
    // The bootstrap thread was never prepared by the platform
    assert!(handle.released().is_empty());

    core.exit();
    let stats = core.stats();
    assert_eq!(stats.threads_exited, 2);
    assert_eq!(stats.ready_wait_total, 3);
    assert_eq!(stats.mean_ready_wait(), 1);
    assert_eq!(handle.released(), alloc::vec![worker]);
}
