//! # Levelroll
//!
//! Per-severity log files with size-based rollout and retention.
//!
//! ## Features
//!
//! - One file per severity tier (trace, debug, info, warning, error, fatal, global)
//! - Rollout to `<name>.1`, `<name>.2`, ... with an independent counter per tier
//! - Sliding retention window that deletes each tier's oldest rolled-out file
//! - Integration with the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust,no_run
//! use levelroll::{LogConfig, init_log};
//!
//! let config = LogConfig::new()
//!     .with_logs_path("/var/log/app")
//!     .with_log_rotate_num(10);
//! init_log(&config)?;
//!
//! tracing::info!("This is an info message");
//! levelroll::fatal!("This goes to the fatal file");
//! # Ok::<(), levelroll::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod counter;
pub mod error;
pub mod level;
pub mod retention;
pub mod rotation;
pub mod sanitize;
pub mod tracing_init;
pub mod writer;

pub use builder::LogBuilder;
pub use config::{LevelConfig, LevelFlags, LogConfig, LogLevelConfiguration};
pub use counter::LevelRotationCounter;
pub use error::{Error, Result};
pub use level::{FATAL_TARGET, GLOBAL_TARGET, Severity};
pub use retention::{RetentionConfig, RetentionPolicy};
pub use rotation::{Rollout, RolloutHandler, RolloutHook};
pub use sanitize::{escape_file_name, escape_os_file_name};
pub use tracing_init::{LevelRouter, LogSubsystem, file_layer, init_log, stdout_layer};
pub use writer::LevelFileWriter;

#[doc(hidden)]
pub use tracing as __tracing;

/// Create a [`LogBuilder`] with default settings.
pub fn builder() -> LogBuilder {
    LogBuilder::new()
}
