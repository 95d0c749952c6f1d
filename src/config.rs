use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::retention::RetentionConfig;
use crate::{Error, Result, Severity};

/// Smallest accepted `max_log_file_size` (512 MiB).
pub const MAX_LOG_FILE_SIZE_MIN: i64 = 512 * 1024 * 1024;
/// Largest accepted `max_log_file_size` (4 GiB).
pub const MAX_LOG_FILE_SIZE_MAX: i64 = 4 * 1024 * 1024 * 1024;
/// Smallest accepted non-zero `log_rotate_num`.
pub const LOG_ROTATE_NUM_MIN: i64 = 1;
/// Largest accepted `log_rotate_num`.
pub const LOG_ROTATE_NUM_MAX: i64 = 1024;

/// Placeholder in a path template that is replaced by the time the file is opened.
pub const DATETIME_TOKEN: &str = "%datetime";

/// Parse a size string with optional units (K/M/G, optionally followed by B,
/// case-insensitive). A bare number is a byte count.
fn parse_size(s: &str) -> std::result::Result<i64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".to_string());
    }

    let upper = s.to_ascii_uppercase();
    let trimmed = upper.strip_suffix('B').unwrap_or(&upper);
    let (num_str, multiplier) = match trimmed.chars().last() {
        Some('K') => (&trimmed[..trimmed.len() - 1], 1024),
        Some('M') => (&trimmed[..trimmed.len() - 1], 1024 * 1024),
        Some('G') => (&trimmed[..trimmed.len() - 1], 1024 * 1024 * 1024),
        Some(c) if c.is_ascii_digit() => (trimmed, 1),
        _ => return Err(format!("invalid size: {}, supported units: K/M/G", s)),
    };

    let num: i64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

/// Size value that can be a number or string with units.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Number(i64),
    String(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeValue::deserialize(deserializer)? {
        SizeValue::Number(n) => Ok(n),
        SizeValue::String(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

/// Which severity tiers are enabled. The global tier is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFlags {
    #[serde(default = "default_true")]
    pub trace: bool,
    #[serde(default = "default_true")]
    pub debug: bool,
    #[serde(default = "default_true")]
    pub info: bool,
    #[serde(default = "default_true")]
    pub warning: bool,
    #[serde(default = "default_true")]
    pub error: bool,
    #[serde(default = "default_true")]
    pub fatal: bool,
}

impl LevelFlags {
    /// Every tier enabled.
    pub const fn all() -> Self {
        Self {
            trace: true,
            debug: true,
            info: true,
            warning: true,
            error: true,
            fatal: true,
        }
    }

    /// Every optional tier disabled.
    pub const fn none() -> Self {
        Self {
            trace: false,
            debug: false,
            info: false,
            warning: false,
            error: false,
            fatal: false,
        }
    }

    pub fn is_enabled(&self, level: Severity) -> bool {
        match level {
            Severity::Global => true,
            Severity::Trace => self.trace,
            Severity::Debug => self.debug,
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
            Severity::Fatal => self.fatal,
        }
    }

    /// Enable or disable one tier. The global tier cannot be disabled.
    pub fn set(&mut self, level: Severity, enabled: bool) {
        match level {
            Severity::Global => {}
            Severity::Trace => self.trace = enabled,
            Severity::Debug => self.debug = enabled,
            Severity::Info => self.info = enabled,
            Severity::Warning => self.warning = enabled,
            Severity::Error => self.error = enabled,
            Severity::Fatal => self.fatal = enabled,
        }
    }
}

impl Default for LevelFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Configuration for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Enabled severity tiers
    #[serde(default)]
    pub levels: LevelFlags,
    /// Directory holding the per-level files
    #[serde(default = "default_logs_path")]
    pub logs_path: PathBuf,
    /// Size at which a level's file is rolled out, in bytes.
    /// Accepts a number of bytes or a string with units (K/M/G), e.g. "1024MB".
    #[serde(
        default = "default_max_log_file_size",
        deserialize_with = "deserialize_size"
    )]
    pub max_log_file_size: i64,
    /// Rolled-out files kept per level; 0 keeps them all
    #[serde(default)]
    pub log_rotate_num: i64,
    /// Mirror enabled events to standard output
    #[serde(default)]
    pub log_to_stdout: bool,
    /// Write per-level files
    #[serde(default = "default_true")]
    pub log_to_file: bool,
    /// Leading part of every file name
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self {
            levels: LevelFlags::default(),
            logs_path: default_logs_path(),
            max_log_file_size: default_max_log_file_size(),
            log_rotate_num: 0,
            log_to_stdout: false,
            log_to_file: true,
            file_prefix: default_file_prefix(),
        }
    }

    /// Set the enabled tiers
    pub fn with_levels(mut self, levels: LevelFlags) -> Self {
        self.levels = levels;
        self
    }

    /// Set the logs directory
    pub fn with_logs_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.logs_path = path.into();
        self
    }

    /// Set the rollout size
    pub fn with_max_log_file_size(mut self, bytes: i64) -> Self {
        self.max_log_file_size = bytes;
        self
    }

    /// Set the retention window
    pub fn with_log_rotate_num(mut self, num: i64) -> Self {
        self.log_rotate_num = num;
        self
    }

    /// Enable stdout mirroring
    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.log_to_stdout = enabled;
        self
    }

    /// Enable per-level files
    pub fn with_log_to_file(mut self, enabled: bool) -> Self {
        self.log_to_file = enabled;
        self
    }

    /// Set the file name prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_true() -> bool {
    true
}

fn default_logs_path() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_log_file_size() -> i64 {
    1024 * 1024 * 1024
}

fn default_file_prefix() -> String {
    "levelroll".to_string()
}

/// Resolved settings for one severity tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfig {
    pub enabled: bool,
    /// File path template, present when the tier writes to a file.
    pub path_template: Option<PathBuf>,
    pub max_file_size: u64,
}

/// Validated per-level configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLevelConfiguration {
    levels: [LevelConfig; Severity::COUNT],
    retention: RetentionConfig,
    log_to_stdout: bool,
}

impl LogLevelConfiguration {
    /// Validate `config` and derive every tier's settings.
    ///
    /// Fails before anything is built if the size or the retention window is out
    /// of range. A retention window of 0 disables deletion.
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        let max_file_size = check_range(
            "max_log_file_size",
            config.max_log_file_size,
            MAX_LOG_FILE_SIZE_MIN,
            MAX_LOG_FILE_SIZE_MAX,
        )?;
        let retention = match config.log_rotate_num {
            0 => RetentionConfig::disabled(),
            num => RetentionConfig::window(check_range(
                "log_rotate_num",
                num,
                LOG_ROTATE_NUM_MIN,
                LOG_ROTATE_NUM_MAX,
            )?),
        };
        if config.log_to_file && config.file_prefix.trim().is_empty() {
            return Err(Error::Config("file_prefix must not be empty".to_string()));
        }

        let levels = Severity::ALL.map(|level| {
            let enabled = config.levels.is_enabled(level);
            let path_template = (enabled && config.log_to_file).then(|| {
                config.logs_path.join(format!(
                    "{}-{}-{}.log",
                    config.file_prefix,
                    DATETIME_TOKEN,
                    level.name()
                ))
            });
            LevelConfig {
                enabled,
                path_template,
                max_file_size,
            }
        });

        Ok(Self {
            levels,
            retention,
            log_to_stdout: config.log_to_stdout,
        })
    }

    pub fn level(&self, level: Severity) -> &LevelConfig {
        &self.levels[level.index()]
    }

    pub fn retention(&self) -> RetentionConfig {
        self.retention
    }

    pub fn log_to_stdout(&self) -> bool {
        self.log_to_stdout
    }
}

fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<u64> {
    if !(min..=max).contains(&value) {
        return Err(Error::OutOfRange {
            name,
            min,
            max,
            value,
        });
    }
    // In range means non-negative.
    Ok(value as u64)
}
