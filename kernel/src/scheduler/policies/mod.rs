/*
 * Scheduling Policies Module
 *
 * This module contains the dispatch policy implementations. Each policy
 * implements the DispatchPolicy trait and is plugged into the SchedulerCore
 * once, at boot time.
 *
 * Available policies:
 * - Fcfs: first come, first served; insertion order is dispatch order
 * - Prioritized: highest effective priority first, FIFO among equals
 * - FairShare: least weighted CPU time first ("sCFS")
 * - Lottery: random draw weighted by effective priority
 */

use alloc::boxed::Box;
use core::fmt;

use super::traits::DispatchPolicy;

pub mod fair_share;
pub mod fcfs;
pub mod lottery;
pub mod prioritized;

pub use fair_share::FairSharePolicy;
pub use fcfs::FcfsPolicy;
pub use lottery::LotteryPolicy;
pub use prioritized::PriorityPolicy;

/// Menu of dispatch policies selectable at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Fcfs,
    Prioritized,
    FairShare,
    Lottery,
}

impl PolicyKind {
    /// Look up a policy by its boot-time name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        const NAMES: &[(&str, PolicyKind)] = &[
            ("fcfs", PolicyKind::Fcfs),
            ("fifo", PolicyKind::Fcfs),
            ("prioritized", PolicyKind::Prioritized),
            ("priority", PolicyKind::Prioritized),
            ("scfs", PolicyKind::FairShare),
            ("cfs", PolicyKind::FairShare),
            ("lottery", PolicyKind::Lottery),
        ];

        NAMES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }

    /// Policies from the historical menu that were never implemented,
    /// mapped to the closest one that is
    fn stand_in(name: &str) -> Option<Self> {
        const STAND_INS: &[(&str, PolicyKind)] = &[
            ("mlfqs", PolicyKind::FairShare),
            ("dyn-lottery", PolicyKind::Lottery),
            ("dq", PolicyKind::Fcfs),
            ("nq", PolicyKind::Fcfs),
        ];

        STAND_INS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }

    /// Resolve a boot-time selection, falling back to FCFS
    pub fn from_name(name: &str) -> Self {
        if let Some(kind) = Self::parse(name) {
            return kind;
        }
        if let Some(kind) = Self::stand_in(name) {
            log::info!("Scheduler '{}' is not available, using {} instead", name, kind);
            return kind;
        }
        log::warn!("Unknown scheduler '{}', falling back to FCFS", name);
        PolicyKind::Fcfs
    }

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Fcfs => "FCFS",
            PolicyKind::Prioritized => "prioritized",
            PolicyKind::FairShare => "sCFS",
            PolicyKind::Lottery => "lottery",
        }
    }

    /// Instantiate the policy
    pub fn build(self, seed: u64) -> Box<dyn DispatchPolicy> {
        match self {
            PolicyKind::Fcfs => Box::new(FcfsPolicy::new()),
            PolicyKind::Prioritized => Box::new(PriorityPolicy::new()),
            PolicyKind::FairShare => Box::new(FairSharePolicy::new()),
            PolicyKind::Lottery => Box::new(LotteryPolicy::new(seed)),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
