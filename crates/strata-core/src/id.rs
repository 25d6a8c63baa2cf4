//! Strongly-typed identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an arena.
///
/// Allocated from a monotonic atomic counter via [`ArenaId::next`]. Two
/// arenas with the same workspace name (for example, the same name opened
/// on two threads, or an arena recreated after a configuration change)
/// always have different IDs, so ownership checks never confuse them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate a fresh, unique arena ID. Thread-safe.
    pub fn next() -> Self {
        Self(ARENA_INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
