/*
 * Scheduler Type Definitions
 *
 * This module defines the core types used throughout the scheduler subsystem.
 * These types are designed to be lightweight, Copy-able, and suitable for
 * use in both policy and mechanism layers.
 */

use core::fmt;

/// Thread priority
///
/// Higher values indicate higher priority. Every thread carries a base
/// priority chosen at creation (or by the thread itself) and an effective
/// priority that additionally reflects donations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// Lowest priority (the idle thread runs here)
    pub const MIN: Priority = Priority(0);

    /// Priority of the bootstrap thread and the usual choice for new threads
    pub const DEFAULT: Priority = Priority(31);

    /// Highest priority
    pub const MAX: Priority = Priority(63);

    /// Whether the value lies in `[MIN, MAX]`
    pub fn is_valid(self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self)
    }

    /// Get the raw value
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time slice duration in timer ticks
///
/// A thread may run this many ticks before the scheduler asks for a
/// preemption at the next safe point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeSliceTicks(pub u32);

impl TimeSliceTicks {
    /// Default time slice (4 ticks)
    pub const DEFAULT: TimeSliceTicks = TimeSliceTicks(4);

    /// Get the value as u32
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for TimeSliceTicks {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Identifier of a lock-like resource owned by a synchronization primitive
///
/// The scheduler never dereferences it; it only records which thread holds
/// the resource and which threads wait on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub usize);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource({})", self.0)
    }
}

/// Ready-queue ordering key handed out by the dispatch policy
///
/// Smaller ranks are dispatched first. Threads with equal rank keep their
/// insertion order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(pub i64);

impl Rank {
    /// Rank shared by every thread under order-agnostic policies
    pub const FIFO: Rank = Rank(0);

    /// Rank placing higher effective priorities first
    pub fn by_priority(priority: Priority) -> Rank {
        Rank(-(priority.0 as i64))
    }
}

/// Category a timer tick is charged to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickCategory {
    /// The idle thread was running
    Idle,

    /// A kernel thread was running
    Kernel,

    /// A thread running a user program was running
    User,
}
