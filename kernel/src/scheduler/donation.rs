/*
 * Priority Donation Engine
 *
 * Keeps every thread's effective priority equal to the best of its base
 * priority and the effective priorities of the threads donating to it:
 *
 *   effective(T) = max(base(T), max { effective(D) | D in donations(T) })
 *
 * A thread that waits on a resource donates to the holder; if the holder in
 * turn waits on another resource, the donation travels along the chain. The
 * walk is an explicit loop that remembers every thread it has visited, so a
 * wait-for cycle (which callers must never build) is logged and cut short
 * instead of spinning forever.
 *
 * A waiter that stops waiting without getting the resource (woken early,
 * or exiting) withdraws its donation; the holder and everything further
 * down the chain are re-derived from the donations that remain.
 *
 * The engine owns the resource -> holder map. Thread-side bookkeeping
 * (waiting_on, donations, donee) lives in the control blocks and is reached
 * through a DonationScope borrowed from the SchedulerCore.
 */

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use super::{
    ThreadId,
    ready_queue::ReadyQueue,
    registry::ThreadRegistry,
    thread::ThreadState,
    traits::DispatchPolicy,
    types::{Priority, ResourceId},
};

/// Mutable scheduler state a donation step may touch
pub struct DonationScope<'a> {
    pub registry: &'a mut ThreadRegistry,
    pub ready: &'a mut ReadyQueue,
    pub policy: &'a dyn DispatchPolicy,
}

#[derive(Debug, Default)]
pub struct DonationEngine {
    holders: BTreeMap<ResourceId, ThreadId>,
}

impl DonationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thread currently holding `resource`
    pub fn holder(&self, resource: ResourceId) -> Option<ThreadId> {
        self.holders.get(&resource).copied()
    }

    /// Resources held by `tid`
    pub fn held_by(&self, tid: ThreadId) -> Vec<ResourceId> {
        self.holders
            .iter()
            .filter(|&(_, holder)| *holder == tid)
            .map(|(resource, _)| *resource)
            .collect()
    }

    /// Re-derive the effective priority of `tid` from its base priority and
    /// its donors, re-sorting it in the ready queue if it is queued
    pub fn recompute(scope: &mut DonationScope<'_>, tid: ThreadId) -> Priority {
        let thread = scope.registry.expect(tid);
        let donated = thread
            .donations
            .iter()
            .filter_map(|donor| scope.registry.get(*donor))
            .map(|donor| donor.effective_priority)
            .max();
        let effective = match donated {
            Some(best) => best.max(thread.base_priority),
            None => thread.base_priority,
        };

        let thread = scope.registry.expect_mut(tid);
        thread.effective_priority = effective;
        if thread.status == ThreadState::Ready {
            let rank = scope.policy.rank(thread);
            scope.ready.reorder(tid, rank, effective);
        }
        effective
    }

    /// Withdraw the donation `tid` made, if any
    ///
    /// Only the edge is removed; the former donee keeps its effective
    /// priority until it is recomputed.
    pub fn recall(scope: &mut DonationScope<'_>, tid: ThreadId) -> Option<ThreadId> {
        let donee = scope.registry.expect_mut(tid).donee.take()?;
        let holder = scope.registry.get_mut(donee)?;
        holder.donations.retain(|&donor| donor != tid);
        Some(donee)
    }

    /// Withdraw the donation `tid` made and re-derive the priorities it
    /// was propping up, from the former donee down its wait-for chain
    pub fn withdraw(&self, scope: &mut DonationScope<'_>, tid: ThreadId) {
        if let Some(donee) = Self::recall(scope, tid) {
            log::debug!("{} withdraws its donation to {}", tid, donee);
            self.donate(scope, donee);
        }
    }

    /// Propagate the priority of `tid` along its wait-for chain
    pub fn donate(&self, scope: &mut DonationScope<'_>, tid: ThreadId) {
        let mut visited = BTreeSet::new();
        let mut subject = tid;

        loop {
            if !visited.insert(subject) {
                log::error!(
                    "Donation chain starting at {} loops back to {}, giving up",
                    tid,
                    subject
                );
                break;
            }

            let effective = Self::recompute(scope, subject);

            let Some(resource) = scope.registry.expect(subject).waiting_on else {
                break;
            };
            let Some(holder) = self.holder(resource) else {
                break;
            };
            assert_ne!(holder, subject, "{} waits on {} which it holds", subject, resource);

            Self::recall(scope, subject);
            Self::insert_donation(scope.registry, holder, subject, effective);
            scope.registry.expect_mut(subject).donee = Some(holder);

            log::debug!(
                "{} donates priority {} to {} via {}",
                subject,
                effective,
                holder,
                resource
            );
            subject = holder;
        }
    }

    /// `tid` now holds `resource`
    ///
    /// Threads still waiting on the resource donate to the new holder.
    pub fn acquire(&mut self, scope: &mut DonationScope<'_>, resource: ResourceId, tid: ThreadId) {
        if let Some(holder) = self.holder(resource) {
            panic!("{} acquired {} which is held by {}", tid, resource, holder);
        }
        self.holders.insert(resource, tid);
        scope.registry.expect_mut(tid).waiting_on = None;
        self.withdraw(scope, tid);

        let waiters: Vec<ThreadId> = scope
            .registry
            .iter()
            .filter(|t| t.id != tid && t.waiting_on == Some(resource))
            .map(|t| t.id)
            .collect();
        for waiter in waiters {
            self.donate(scope, waiter);
        }
    }

    /// `releaser` gives up `resource`; returns its new effective priority
    pub fn release(
        &mut self,
        scope: &mut DonationScope<'_>,
        resource: ResourceId,
        releaser: ThreadId,
    ) -> Priority {
        match self.holder(resource) {
            Some(holder) if holder == releaser => {}
            other => panic!("{} released {} held by {:?}", releaser, resource, other),
        }
        self.holders.remove(&resource);

        let donors: Vec<ThreadId> = scope
            .registry
            .expect(releaser)
            .donations
            .iter()
            .copied()
            .filter(|donor| {
                scope
                    .registry
                    .get(*donor)
                    .is_some_and(|t| t.waiting_on == Some(resource))
            })
            .collect();
        for donor in donors {
            Self::recall(scope, donor);
        }

        Self::recompute(scope, releaser)
    }

    /// Insert `donor` behind every donor of equal or higher priority
    fn insert_donation(
        registry: &mut ThreadRegistry,
        holder: ThreadId,
        donor: ThreadId,
        priority: Priority,
    ) {
        let donations = &registry.expect(holder).donations;
        let position = donations
            .iter()
            .position(|other| {
                registry
                    .get(*other)
                    .is_none_or(|t| t.effective_priority < priority)
            })
            .unwrap_or(donations.len());
        registry.expect_mut(holder).donations.insert(position, donor);
    }
}
