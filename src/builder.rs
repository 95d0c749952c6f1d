//! Builder pattern for initializing per-level logging.
//!
//! # Example
//!
//! ```rust,no_run
//! use levelroll::Severity;
//!
//! levelroll::builder()
//!     .with_logs_path("/var/log/app")
//!     .with_level(Severity::Trace, false)
//!     .with_max_file_size(1024 * 1024 * 1024)
//!     .with_rotate_num(10)
//!     .init()
//!     .expect("Failed to initialize logging");
//! ```

use std::path::PathBuf;

use crate::{LevelFlags, LogConfig, LogSubsystem, Result, Severity, init_log};

/// A builder for configuring and initializing logging.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    config: LogConfig,
}

impl LogBuilder {
    /// Create a new LogBuilder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LogConfig::new(),
        }
    }

    /// Create a LogBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self { config }
    }

    /// Enable or disable one severity tier.
    pub fn with_level(mut self, level: Severity, enabled: bool) -> Self {
        self.config.levels.set(level, enabled);
        self
    }

    /// Replace every tier flag at once.
    pub fn with_levels(mut self, levels: LevelFlags) -> Self {
        self.config = self.config.with_levels(levels);
        self
    }

    /// Directory for the per-level files.
    pub fn with_logs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_logs_path(path);
        self
    }

    /// Size in bytes at which a tier's file is rolled out.
    pub fn with_max_file_size(mut self, bytes: i64) -> Self {
        self.config = self.config.with_max_log_file_size(bytes);
        self
    }

    /// Rolled-out files kept per tier; 0 keeps them all.
    pub fn with_rotate_num(mut self, num: i64) -> Self {
        self.config = self.config.with_log_rotate_num(num);
        self
    }

    /// Mirror enabled tiers to standard output.
    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.config = self.config.with_stdout(enabled);
        self
    }

    /// Write per-level files.
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.config = self.config.with_log_to_file(enabled);
        self
    }

    /// Leading part of every file name.
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config = self.config.with_file_prefix(prefix);
        self
    }

    /// Get the current configuration without initializing.
    pub fn build(self) -> LogConfig {
        self.config
    }

    /// Apply the configuration to `subsystem` without touching the global subscriber.
    pub fn configure(self, subsystem: &LogSubsystem) -> Result<()> {
        subsystem.configure(&self.config)
    }

    /// Initialize process-wide logging with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file size or retention window is out of range
    /// - A log file cannot be created
    /// - Another global subscriber is already installed
    pub fn init(self) -> Result<()> {
        init_log(&self.config)
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
