use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors that can occur in the logging library
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// A bounded configuration value is outside its allowed range.
    #[error("{name} must be in range [{min}, {max}], now is {value}")]
    OutOfRange {
        name: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// Renaming an active log file to its numbered name failed.
    #[error("Failed to roll out {}: {source}", .path.display())]
    Rotation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
