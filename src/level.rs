use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{Level, Metadata};

/// Event target that routes an event to the global log file.
pub const GLOBAL_TARGET: &str = "global";

/// Event target that marks an ERROR event as fatal.
pub const FATAL_TARGET: &str = "fatal";

/// Severity tiers that own a log file, a rollout counter and a retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Global,
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Number of severity tiers.
    pub const COUNT: usize = 7;

    /// Every tier, in index order.
    pub const ALL: [Severity; Severity::COUNT] = [
        Severity::Global,
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Dense index used to key per-level tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, as used in file names.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Parse a level name, treating anything unrecognised as [`Severity::Global`].
    ///
    /// Engines that report levels by name (e.g. "verbose" or "unknown") land on
    /// the global counter and naming scheme.
    pub fn from_name_or_global(name: &str) -> Self {
        name.parse().unwrap_or(Self::Global)
    }

    /// Classify a tracing event.
    pub fn of(metadata: &Metadata<'_>) -> Self {
        if metadata.target() == GLOBAL_TARGET {
            return Self::Global;
        }
        match *metadata.level() {
            Level::TRACE => Self::Trace,
            Level::DEBUG => Self::Debug,
            Level::INFO => Self::Info,
            Level::WARN => Self::Warning,
            _ if metadata.target() == FATAL_TARGET => Self::Fatal,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(crate::Error::Config(format!("unknown severity: {}", other))),
        }
    }
}

/// Emit a fatal event. Fatal events are logged at ERROR level under the
/// `fatal` target and never abort the process.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {
        $crate::__tracing::error!(target: $crate::FATAL_TARGET, $($arg)+)
    };
}
