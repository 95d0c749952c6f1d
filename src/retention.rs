use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How many rolled-out files each level keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// When false, rolled-out files accumulate forever.
    pub enabled: bool,
    /// Number of rolled-out files kept per level.
    pub window: u64,
}

impl RetentionConfig {
    /// Never delete rolled-out files.
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            window: 0,
        }
    }

    /// Keep the most recent `window` rolled-out files per level.
    pub const fn window(window: u64) -> Self {
        Self {
            enabled: true,
            window,
        }
    }
}

/// `base.index`, e.g. `info.log.3`.
pub fn numbered_path(base: &Path, index: u64) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Index that falls out of a `window`-sized retention window once `current`
/// files have been rolled out, if any.
pub fn expired_index(current: u64, window: u64) -> Option<u64> {
    current.checked_sub(window).filter(|index| *index > 0)
}

/// Sliding-window deletion policy, applied to each level's own sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    config: RetentionConfig,
}

impl RetentionPolicy {
    pub fn new(config: RetentionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> RetentionConfig {
        self.config
    }

    /// The rolled-out file to delete after rollout number `current` of `base`.
    ///
    /// Deletion lags rollout by exactly `window` rollouts, so the target is always
    /// the oldest surviving index.
    pub fn file_to_delete(&self, base: &Path, current: u64) -> Option<PathBuf> {
        if !self.config.enabled {
            return None;
        }
        expired_index(current, self.config.window).map(|index| numbered_path(base, index))
    }
}
