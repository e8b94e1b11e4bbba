/*
 * Scheduler Core - Mechanism Layer
 *
 * This module implements SchedulerCore, the mechanism layer that:
 * 1. Holds the dispatch policy chosen at boot (Box<dyn DispatchPolicy>)
 * 2. Owns the thread registry, the ready queue and the donation engine
 * 3. Drives the thread state machine:
 *
 *      Blocked --unblock--> Ready --dispatch--> Running
 *      Running --yield/preempt--> Ready
 *      Running --block--> Blocked
 *      Running --exit--> Dying --reclaim--> (gone)
 *
 * 4. Reports every transition to the policy as a SchedEvent
 * 5. Performs context switches through the Platform
 *
 * A switch is recorded as "in flight" before the platform primitive is
 * invoked and completed by finish_switch() in the context of the thread
 * that was switched to. A brand-new thread has no pending schedule() call
 * to return into, so its start-up trampoline calls finish_switch() itself.
 *
 * All ready-queue and donation mutations happen with interrupts disabled.
 */

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem;

use super::{
    NICE_MAX, NICE_MIN, SchedConfig, SchedError, ThreadId,
    context::SchedContext,
    donation::{DonationEngine, DonationScope},
    events::SchedEvent,
    ready_queue::ReadyQueue,
    registry::ThreadRegistry,
    stats::{GlobalStats, ThreadReport},
    thread::{Thread, ThreadEntry, ThreadKind, ThreadState, ThreadStats},
    traits::DispatchPolicy,
    types::{Priority, ResourceId, TickCategory},
};
use crate::arch::{self, InterruptLevel, Platform};

/// Switch recorded by schedule() and completed by finish_switch()
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSwitch {
    prev: ThreadId,
    next: ThreadId,
}

/// Scheduler Core - The Mechanism Layer
///
/// Exactly one instance exists per CPU. Every method runs "as the current
/// thread": after a call that switched threads returns, the caller is the
/// thread that was switched to.
pub struct SchedulerCore {
    config: SchedConfig,
    policy: Box<dyn DispatchPolicy>,
    platform: Box<dyn Platform>,

    registry: ThreadRegistry,
    ready: ReadyQueue,
    donation: DonationEngine,

    current: ThreadId,
    bootstrap: ThreadId,
    idle: ThreadId,

    in_flight: Option<PendingSwitch>,
    /// Ticks the current thread has run since it was dispatched
    slice_ticks: u32,
    /// A preemption was requested and will be taken at interrupt return
    preempt_pending: bool,

    stats: GlobalStats,
}

impl SchedulerCore {
    /// Create the scheduler
    ///
    /// The code calling this becomes the bootstrap thread ("main", default
    /// priority, Running). The idle thread is created parked, at the lowest
    /// priority. Interrupts stay disabled until `start()`.
    pub fn new(config: SchedConfig, mut platform: Box<dyn Platform>) -> Self {
        assert!(
            config.max_threads >= 2,
            "Thread limit {} leaves no room for the bootstrap and idle threads",
            config.max_threads
        );

        let policy = config.policy.build(config.lottery_seed);
        log::info!("Initializing scheduler with {} policy", policy.name());
        log::info!(
            "Time slice: {} ticks, thread limit: {}",
            config.time_slice.get(),
            config.max_threads
        );

        let mut registry = ThreadRegistry::new(config.max_threads);

        let bootstrap = match registry.allocate("main", Priority::DEFAULT, None, 0, 0) {
            Ok(tid) => tid,
            Err(err) => panic!("Cannot create bootstrap thread: {}", err),
        };
        let main = registry.expect_mut(bootstrap);
        main.transition(ThreadState::Running, 0);
        main.stats.running_count = 1;

        let idle = match registry.allocate("idle", Priority::MIN, Some(arch::idle_loop), 0, 0) {
            Ok(tid) => tid,
            Err(err) => panic!("Cannot create idle thread: {}", err),
        };
        if let Err(err) = platform.prepare_thread(idle, arch::idle_loop, 0) {
            panic!("Cannot create idle thread: {}", err);
        }

        let stats = GlobalStats {
            threads_created: 1,
            ..GlobalStats::default()
        };

        log::info!("Bootstrap thread is {}, idle thread is {}", bootstrap, idle);

        Self {
            config,
            policy,
            platform,
            registry,
            ready: ReadyQueue::new(),
            donation: DonationEngine::new(),
            current: bootstrap,
            bootstrap,
            idle,
            in_flight: None,
            slice_ticks: 0,
            preempt_pending: false,
            stats,
        }
    }

    /// Enable interrupts and with them preemptive scheduling
    pub fn start(&mut self) {
        log::info!("Scheduler started, preemptive multitasking active");
        self.platform.set_interrupt_level(InterruptLevel::On);
    }

    /// Run `f` with interrupts disabled, restoring the previous level after
    pub fn without_interrupts<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let old = self.platform.disable_interrupts();
        let result = f(self);
        self.platform.set_interrupt_level(old);
        result
    }

    // ========================================================================
    // THREAD LIFECYCLE
    // ========================================================================

    /// Create a thread running `entry(arg)`
    ///
    /// The new thread is made Ready immediately; if it outranks the caller
    /// it runs before this returns.
    pub fn create(
        &mut self,
        name: &str,
        priority: Priority,
        entry: ThreadEntry,
        arg: usize,
    ) -> Result<ThreadId, SchedError> {
        assert!(
            priority.is_valid(),
            "Priority {} out of range [{}, {}]",
            priority,
            Priority::MIN,
            Priority::MAX
        );

        let tid = self.without_interrupts(|core| {
            let now = core.now();
            let tid = core.registry.allocate(name, priority, Some(entry), arg, now)?;
            if let Err(err) = core.platform.prepare_thread(tid, entry, arg) {
                core.registry.discard(tid);
                return Err(err);
            }
            core.stats.threads_created += 1;
            Ok(tid)
        });

        let tid = match tid {
            Ok(tid) => tid,
            Err(err) => {
                log::warn!("Failed to create thread '{}': {}", name, err);
                return Err(err);
            }
        };

        log::info!(
            "Created {} '{}' with priority {}",
            tid,
            self.registry.expect(tid).name.as_str(),
            priority
        );
        self.emit(SchedEvent::ThreadCreated { tid, priority });

        self.unblock(tid);
        self.yield_to_max();
        Ok(tid)
    }

    /// Mark `tid` as running a user program; its ticks count as user time
    pub fn attach_user_program(&mut self, tid: ThreadId) {
        self.registry.expect_mut(tid).kind = ThreadKind::User;
    }

    /// Put the current thread to sleep until someone unblocks it
    ///
    /// Must be called with interrupts disabled, from thread context.
    pub fn block(&mut self) {
        assert!(
            !self.platform.in_interrupt_context(),
            "Cannot block from interrupt context"
        );
        assert_eq!(
            self.platform.interrupt_level(),
            InterruptLevel::Off,
            "block() requires interrupts to be disabled"
        );

        let tid = self.current;
        let now = self.now();
        let thread = self.registry.expect_mut(tid);
        thread.stats.blocked_count += 1;
        thread.transition(ThreadState::Blocked, now);
        log::debug!("{} blocked", tid);

        self.emit(SchedEvent::ThreadBlocked { tid });
        self.schedule();
    }

    /// Make a Blocked thread Ready
    ///
    /// Never preempts the caller, so a caller that disabled interrupts can
    /// unblock a thread and update other state atomically.
    pub fn unblock(&mut self, tid: ThreadId) {
        assert_ne!(tid, self.idle, "The idle thread is never unblocked");

        self.without_interrupts(|core| {
            let now = core.now();
            let thread = core.registry.expect_mut(tid);
            assert_eq!(
                thread.status,
                ThreadState::Blocked,
                "Unblocking {} which is not blocked",
                tid
            );
            thread.transition(ThreadState::Ready, now);
            let rank = core.policy.rank(thread);
            let priority = thread.effective_priority;
            core.ready.insert(tid, rank, priority);
        });

        self.emit(SchedEvent::ThreadReady { tid });
    }

    /// Give up the CPU; the current thread stays runnable
    pub fn yield_now(&mut self) {
        assert!(
            !self.platform.in_interrupt_context(),
            "Cannot yield from interrupt context"
        );

        let old = self.platform.disable_interrupts();

        let tid = self.current;
        let now = self.now();
        let is_idle = tid == self.idle;
        let thread = self.registry.expect_mut(tid);
        thread.stats.expropriated += 1;

        if is_idle {
            // Idle is never queued; it is picked only when nothing is Ready
            thread.transition(ThreadState::Blocked, now);
        } else {
            thread.transition(ThreadState::Ready, now);
            let rank = self.policy.rank(thread);
            let priority = thread.effective_priority;
            self.ready.insert(tid, rank, priority);
        }

        self.schedule();
        self.platform.set_interrupt_level(old);
    }

    /// Yield if a Ready thread has a higher effective priority than ours
    pub fn yield_to_max(&mut self) {
        let best = self.without_interrupts(|core| core.ready.max_priority());
        let own = self.registry.expect(self.current).effective_priority;

        if best.is_some_and(|best| best > own) {
            self.yield_now();
        }
    }

    /// Terminate the current thread
    ///
    /// The control block stays alive until the next thread is running. On
    /// hardware this never returns; on a simulated platform it returns in
    /// the context of the thread that was switched to.
    pub fn exit(&mut self) {
        assert!(
            !self.platform.in_interrupt_context(),
            "Cannot exit from interrupt context"
        );
        let tid = self.current;
        assert_ne!(tid, self.idle, "Cannot exit idle thread");

        let old = self.platform.disable_interrupts();

        for resource in self.donation.held_by(tid) {
            log::warn!("{} exited while holding {}", tid, resource);
            let (engine, mut scope) = self.donation_parts();
            engine.release(&mut scope, resource, tid);
        }
        let (engine, mut scope) = self.donation_parts();
        engine.withdraw(&mut scope, tid);

        let now = self.now();
        let thread = self.registry.expect_mut(tid);
        thread.transition(ThreadState::Dying, now);
        thread.waiting_on = None;
        let stats = thread.stats;
        log_thread_finished(thread.name.as_str(), &stats);

        self.stats.ready_wait_total += stats.ready_ticks;
        self.stats.threads_exited += 1;

        if tid == self.bootstrap {
            log::info!("===========================================");
            log::info!("Context switches: {}", self.stats.context_switches);
            log::info!("Executed threads: {}", self.stats.threads_created);
            log::info!("Average ready waiting: {} ticks", self.stats.mean_ready_wait());
            log::info!("===========================================");
        }

        self.registry.unlist(tid);
        self.emit(SchedEvent::ThreadExited { tid });
        self.schedule();
        self.platform.set_interrupt_level(old);
    }

    // ========================================================================
    // TIMER AND PREEMPTION
    // ========================================================================

    /// Timer interrupt handler; runs in interrupt context and never switches
    pub fn tick(&mut self) {
        let tid = self.current;
        let category = if tid == self.idle {
            TickCategory::Idle
        } else if self.registry.expect(tid).kind == ThreadKind::User {
            TickCategory::User
        } else {
            TickCategory::Kernel
        };
        self.stats.record_tick(category);
        self.emit(SchedEvent::Tick { current: tid });

        self.slice_ticks += 1;
        if self.slice_ticks >= self.config.time_slice.get() && !self.preempt_pending {
            self.registry.expect_mut(tid).stats.quantum_exhausted += 1;
            self.preempt_pending = true;
            self.platform.yield_on_return();
        }
    }

    /// Interrupt return path; takes a pending preemption
    pub fn on_interrupt_return(&mut self) {
        if mem::take(&mut self.preempt_pending) {
            log::debug!("Preempting {}", self.current);
            self.yield_now();
        }
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Choose the next thread: the policy's pick, or idle if nothing is Ready
    fn next_thread_to_run(&mut self) -> ThreadId {
        if self.ready.is_empty() {
            return self.idle;
        }

        let view = SchedContext::new(&self.registry, self.current, self.stats.ticks);
        match self.policy.pick_next(&mut self.ready, &view) {
            Some(tid) => {
                let status = self.registry.expect(tid).status;
                assert_eq!(
                    status,
                    ThreadState::Ready,
                    "Policy picked {} which is not ready",
                    tid
                );
                tid
            }
            None => self.idle,
        }
    }

    /// Switch away from the current thread, which must no longer be Running
    fn schedule(&mut self) {
        assert_eq!(
            self.platform.interrupt_level(),
            InterruptLevel::Off,
            "Scheduling with interrupts enabled"
        );
        let cur = self.current;
        let status = self.registry.expect(cur).status;
        assert_ne!(
            status,
            ThreadState::Running,
            "schedule() called while {} is still running",
            cur
        );

        let next = self.next_thread_to_run();
        self.in_flight = Some(PendingSwitch { prev: cur, next });

        if cur != next {
            self.stats.context_switches += 1;
            self.platform.switch_threads(cur, next);
        }
        self.finish_switch();
    }

    /// Complete the switch recorded by schedule()
    ///
    /// Runs in the context of the thread switched to. Reclaims the previous
    /// thread if it was dying.
    pub fn finish_switch(&mut self) {
        let Some(PendingSwitch { prev, next }) = self.in_flight.take() else {
            panic!("finish_switch() without a switch in flight");
        };
        assert_eq!(
            self.platform.interrupt_level(),
            InterruptLevel::Off,
            "Finishing a switch with interrupts enabled"
        );

        let now = self.now();
        let thread = self.registry.expect_mut(next);
        thread.stats.running_count += 1;
        thread.transition(ThreadState::Running, now);

        self.current = next;
        self.slice_ticks = 0;
        self.preempt_pending = false;

        let prev_dying = self
            .registry
            .get(prev)
            .is_some_and(|t| t.status == ThreadState::Dying);
        if prev != next && prev_dying {
            let dead = self.registry.destroy(prev, next);
            if dead.entry.is_some() {
                self.platform.release_thread(prev);
            }
            log::debug!("Reclaimed {}", prev);
        }

        self.emit(SchedEvent::Switched { prev, next });
    }

    // ========================================================================
    // PRIORITIES
    // ========================================================================

    /// Effective priority of the current thread
    pub fn get_priority(&self) -> Priority {
        self.registry.expect(self.current).effective_priority
    }

    /// Change the base priority of the current thread
    ///
    /// Yields at once if a Ready thread now outranks it.
    pub fn set_priority(&mut self, priority: Priority) {
        assert!(
            priority.is_valid(),
            "Priority {} out of range [{}, {}]",
            priority,
            Priority::MIN,
            Priority::MAX
        );

        let tid = self.current;
        let old_priority = self.without_interrupts(|core| {
            let thread = core.registry.expect_mut(tid);
            let old = thread.base_priority;
            thread.base_priority = priority;
            let (engine, mut scope) = core.donation_parts();
            engine.donate(&mut scope, tid);
            old
        });
        log::debug!("{} priority {} -> {}", tid, old_priority, priority);

        self.emit(SchedEvent::PriorityChanged {
            tid,
            old_priority,
            new_priority: priority,
        });
        self.yield_to_max();
    }

    pub fn get_nice(&self) -> i8 {
        self.registry.expect(self.current).nice
    }

    /// Change the nice value of the current thread
    pub fn set_nice(&mut self, nice: i8) {
        assert!(
            (NICE_MIN..=NICE_MAX).contains(&nice),
            "Nice value {} out of range [{}, {}]",
            nice,
            NICE_MIN,
            NICE_MAX
        );
        let tid = self.current;
        self.registry.expect_mut(tid).nice = nice;
        self.emit(SchedEvent::NiceChanged { tid, nice });
    }

    // ========================================================================
    // SYNCHRONIZATION HOOKS
    // ========================================================================

    /// The current thread is about to wait for `resource`
    pub fn wait_on(&mut self, resource: ResourceId) {
        let tid = self.current;
        self.without_interrupts(|core| {
            core.registry.expect_mut(tid).waiting_on = Some(resource);
            let (engine, mut scope) = core.donation_parts();
            engine.donate(&mut scope, tid);
        });
    }

    /// The current thread no longer waits for `resource` and does not hold it
    ///
    /// Used when a wait ends without the resource, e.g. on a timeout. The
    /// donation made by the wait is withdrawn, which may leave the holder
    /// below a Ready thread.
    pub fn stop_waiting(&mut self, resource: ResourceId) {
        let tid = self.current;
        self.without_interrupts(|core| {
            let thread = core.registry.expect_mut(tid);
            assert_eq!(
                thread.waiting_on,
                Some(resource),
                "{} stopped waiting on {} without waiting on it",
                tid,
                resource
            );
            thread.waiting_on = None;
            let (engine, mut scope) = core.donation_parts();
            engine.withdraw(&mut scope, tid);
        });
        self.yield_to_max();
    }

    /// The current thread now holds `resource`
    pub fn resource_acquired(&mut self, resource: ResourceId) {
        let tid = self.current;
        self.without_interrupts(|core| {
            let (engine, mut scope) = core.donation_parts();
            engine.acquire(&mut scope, resource, tid);
        });
    }

    /// The current thread gave up `resource`
    ///
    /// Donations received through the resource are withdrawn, which may
    /// let a Ready thread outrank us.
    pub fn resource_released(&mut self, resource: ResourceId) {
        let tid = self.current;
        self.without_interrupts(|core| {
            let (engine, mut scope) = core.donation_parts();
            engine.release(&mut scope, resource, tid);
        });
        self.yield_to_max();
    }

    /// Thread holding `resource`, if any
    pub fn holder(&self, resource: ResourceId) -> Option<ThreadId> {
        self.donation.holder(resource)
    }

    // ========================================================================
    // ACCESSORS AND DIAGNOSTICS
    // ========================================================================

    pub fn current(&self) -> ThreadId {
        self.current
    }

    pub fn current_thread(&self) -> &Thread {
        self.registry.expect(self.current)
    }

    pub fn thread(&self, tid: ThreadId) -> Option<&Thread> {
        self.registry.get(tid)
    }

    pub fn idle_thread(&self) -> ThreadId {
        self.idle
    }

    pub fn policy(&self) -> &dyn DispatchPolicy {
        self.policy.as_ref()
    }

    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready
    }

    pub fn stats(&self) -> GlobalStats {
        self.stats
    }

    /// Visit every visible thread in creation order
    ///
    /// Must be called with interrupts disabled.
    pub fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&Thread),
    {
        assert_eq!(
            self.platform.interrupt_level(),
            InterruptLevel::Off,
            "for_each() requires interrupts to be disabled"
        );
        self.registry.for_each(visitor);
    }

    /// Snapshot of every visible thread
    pub fn thread_reports(&mut self) -> Vec<ThreadReport> {
        self.without_interrupts(|core| {
            let now = core.now();
            let mut reports = Vec::new();
            core.for_each(|t| {
                reports.push(ThreadReport {
                    id: t.id,
                    name: t.name.clone(),
                    state: t.status,
                    base_priority: t.base_priority,
                    effective_priority: t.effective_priority,
                    stats: t.stats_at(now),
                })
            });
            reports
        })
    }

    /// Log the global statistics and a line per visible thread
    pub fn print_stats(&mut self) {
        let stats = self.stats;
        log::info!(
            "Thread: {} idle ticks, {} kernel ticks, {} user ticks",
            stats.idle_ticks,
            stats.kernel_ticks,
            stats.user_ticks
        );
        log::info!(
            "Context switches: {}, threads created: {}, mean ready wait: {} ticks",
            stats.context_switches,
            stats.threads_created,
            stats.mean_ready_wait()
        );
        for report in self.thread_reports() {
            log::info!(
                "  {} '{}' {:?} prio {}/{} ran {}x ({} ticks) blocked {}x ({} ticks) ready {} ticks",
                report.id,
                report.name.as_str(),
                report.state,
                report.base_priority,
                report.effective_priority,
                report.stats.running_count,
                report.stats.running_ticks,
                report.stats.blocked_count,
                report.stats.blocked_ticks,
                report.stats.ready_ticks
            );
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn now(&self) -> u64 {
        self.stats.ticks
    }

    fn emit(&mut self, event: SchedEvent) {
        let view = SchedContext::new(&self.registry, self.current, self.stats.ticks);
        self.policy.on_event(&view, event);
    }

    fn donation_parts(&mut self) -> (&mut DonationEngine, DonationScope<'_>) {
        (
            &mut self.donation,
            DonationScope {
                registry: &mut self.registry,
                ready: &mut self.ready,
                policy: &*self.policy,
            },
        )
    }
}

fn log_thread_finished(name: &str, stats: &ThreadStats) {
    log::info!("-------------------------------------------");
    log::info!("{} finished:", name);
    log::info!("Times blocked: {} ({} ticks)", stats.blocked_count, stats.blocked_ticks);
    log::info!("Times running: {} ({} ticks)", stats.running_count, stats.running_ticks);
    log::info!("Time ready: {} ticks", stats.ready_ticks);
    log::info!("Quantums exhausted: {}", stats.quantum_exhausted);
    log::info!("Times expropriated: {}", stats.expropriated);
    log::info!("-------------------------------------------");
}
