use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::Severity;

/// Per-severity rollout sequence numbers.
///
/// Each level counts independently, starting at zero. A counter is bumped once per
/// successful rollout of that level and never reset for the life of the instance.
///
/// Rollouts of one level are serialized through [`LevelRotationCounter::lock_level`],
/// so every writer sharing the counter sees the same sequence, even writers that
/// belong to a configuration that has since been replaced.
#[derive(Debug, Default)]
pub struct LevelRotationCounter {
    slots: [AtomicU64; Severity::COUNT],
    rollouts: [Mutex<()>; Severity::COUNT],
}

impl LevelRotationCounter {
    /// Create a counter with every level at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the sequence for `level` and return the new value.
    pub fn next_sequence(&self, level: Severity) -> u64 {
        self.slots[level.index()]
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1)
    }

    /// Current sequence for `level` (zero before the first rollout).
    pub fn current(&self, level: Severity) -> u64 {
        self.slots[level.index()].load(Ordering::Acquire)
    }

    /// Hold the rollout slot of `level`. Other levels are not blocked.
    pub fn lock_level(&self, level: Severity) -> MutexGuard<'_, ()> {
        // The guarded state is the sequence itself, which a panic cannot corrupt.
        self.rollouts[level.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
