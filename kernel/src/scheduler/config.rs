/*
 * Scheduler Configuration
 *
 * Boot-time settings for the SchedulerCore. The policy is fixed for the
 * lifetime of the scheduler; there is no way to swap it once running.
 *
 * Kernel command line options:
 *   -o NAME   dispatch policy (fcfs, prioritized, scfs, lottery, ...)
 *   -ts N     time slice in ticks
 *   -mt N     maximum number of live threads
 */

use super::{MAX_THREADS, policies::PolicyKind, types::TimeSliceTicks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    pub policy: PolicyKind,
    pub time_slice: TimeSliceTicks,
    /// Live control blocks allowed at once, idle and bootstrap included
    pub max_threads: usize,
    pub lottery_seed: u64,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Prioritized,
            time_slice: TimeSliceTicks::DEFAULT,
            max_threads: MAX_THREADS,
            lottery_seed: 0,
        }
    }
}

impl SchedConfig {
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_time_slice(mut self, ticks: u32) -> Self {
        self.time_slice = TimeSliceTicks(ticks);
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_lottery_seed(mut self, seed: u64) -> Self {
        self.lottery_seed = seed;
        self
    }

    /// Build a configuration from a kernel command line
    ///
    /// Options that cannot be parsed keep their default.
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::default();
        let mut tokens = cmdline.split_whitespace();

        while let Some(token) = tokens.next() {
            match token {
                "-o" => match tokens.next() {
                    Some(name) => config.policy = PolicyKind::from_name(name),
                    None => log::warn!("-o given without a scheduler name"),
                },
                "-ts" => match tokens.next().map(str::parse::<u32>) {
                    Some(Ok(ticks)) if ticks > 0 => config.time_slice = TimeSliceTicks(ticks),
                    _ => log::warn!("Invalid time slice, keeping {}", config.time_slice.get()),
                },
                "-mt" => match tokens.next().map(str::parse::<usize>) {
                    Some(Ok(max)) if max >= 2 => config.max_threads = max,
                    _ => log::warn!("Invalid thread limit, keeping {}", config.max_threads),
                },
                other => log::debug!("Ignoring command line token '{}'", other),
            }
        }

        config
    }
}
