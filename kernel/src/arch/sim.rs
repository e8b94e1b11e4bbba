/*
 * Simulated Platform
 *
 * Hosted implementation of the Platform trait. It keeps a software model of
 * the interrupt level and the interrupt-context flag, and records every
 * context switch instead of performing it: after `switch_threads(prev, next)`
 * returns, the caller simply continues as `next`.
 *
 * The state is shared with a SimHandle so the owner of the SchedulerCore can
 * inspect it and drive timer interrupts.
 */

use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use super::{InterruptLevel, Platform};
use crate::scheduler::{Exhausted, SchedError, SchedulerCore, ThreadEntry, ThreadId};

#[derive(Debug)]
pub struct SimState {
    pub interrupts: InterruptLevel,
    pub in_interrupt: bool,
    pub yield_requests: u64,
    pub switches: Vec<(ThreadId, ThreadId)>,
    pub prepared: Vec<ThreadId>,
    pub released: Vec<ThreadId>,
    /// Make the next `prepare_thread` calls fail
    pub fail_prepare: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            // Boot runs with interrupts off until the scheduler is started
            interrupts: InterruptLevel::Off,
            in_interrupt: false,
            yield_requests: 0,
            switches: Vec::new(),
            prepared: Vec::new(),
            released: Vec::new(),
            fail_prepare: false,
        }
    }
}

pub struct SimPlatform {
    state: Arc<Mutex<SimState>>,
}

/// Observer and driver for a SimPlatform owned by a SchedulerCore
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimPlatform {
    pub fn new() -> (Self, SimHandle) {
        let state = Arc::new(Mutex::new(SimState::default()));
        (
            Self {
                state: state.clone(),
            },
            SimHandle { state },
        )
    }
}

impl Platform for SimPlatform {
    fn interrupt_level(&self) -> InterruptLevel {
        self.state.lock().interrupts
    }

    fn disable_interrupts(&mut self) -> InterruptLevel {
        let mut state = self.state.lock();
        let old = state.interrupts;
        state.interrupts = InterruptLevel::Off;
        old
    }

    fn set_interrupt_level(&mut self, level: InterruptLevel) {
        self.state.lock().interrupts = level;
    }

    fn in_interrupt_context(&self) -> bool {
        self.state.lock().in_interrupt
    }

    fn yield_on_return(&mut self) {
        self.state.lock().yield_requests += 1;
    }

    fn prepare_thread(
        &mut self,
        tid: ThreadId,
        _entry: ThreadEntry,
        _arg: usize,
    ) -> Result<(), SchedError> {
        let mut state = self.state.lock();
        if state.fail_prepare {
            return Err(SchedError::AllocationError {
                resource: Exhausted::ThreadContext { tid },
            });
        }
        state.prepared.push(tid);
        Ok(())
    }

    fn release_thread(&mut self, tid: ThreadId) {
        self.state.lock().released.push(tid);
    }

    fn switch_threads(&mut self, prev: ThreadId, next: ThreadId) {
        self.state.lock().switches.push((prev, next));
    }
}

impl SimHandle {
    /// Every switch performed so far, oldest first
    pub fn switches(&self) -> Vec<(ThreadId, ThreadId)> {
        self.state.lock().switches.clone()
    }

    pub fn last_switch(&self) -> Option<(ThreadId, ThreadId)> {
        self.state.lock().switches.last().copied()
    }

    pub fn prepared(&self) -> Vec<ThreadId> {
        self.state.lock().prepared.clone()
    }

    pub fn released(&self) -> Vec<ThreadId> {
        self.state.lock().released.clone()
    }

    pub fn yield_requests(&self) -> u64 {
        self.state.lock().yield_requests
    }

    pub fn interrupt_level(&self) -> InterruptLevel {
        self.state.lock().interrupts
    }

    pub fn set_fail_prepare(&self, fail: bool) {
        self.state.lock().fail_prepare = fail;
    }

    pub fn set_interrupt_context(&self, in_interrupt: bool) {
        self.state.lock().in_interrupt = in_interrupt;
    }

    /// Deliver one timer interrupt to `core`
    ///
    /// Runs the tick handler in interrupt context with interrupts off, then
    /// takes the interrupt return path, where a pending preemption happens.
    pub fn fire_timer(&self, core: &mut SchedulerCore) {
        let level = {
            let mut state = self.state.lock();
            let level = state.interrupts;
            state.interrupts = InterruptLevel::Off;
            state.in_interrupt = true;
            level
        };

        core.tick();

        self.state.lock().in_interrupt = false;
        core.on_interrupt_return();
        self.state.lock().interrupts = level;
    }
}
