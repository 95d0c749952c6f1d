//! Rollout of full log files.
//!
//! The logging engine calls a [`RolloutHook`] whenever a level's active file is
//! about to exceed its size bound. [`RolloutHandler`] is the hook installed by
//! [`crate::init_log`]: it renames the active file to `<escaped base>.<seq>`, bumps
//! the level's sequence, and drops the file that fell out of the retention window.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::counter::LevelRotationCounter;
use crate::retention::{RetentionConfig, RetentionPolicy, numbered_path};
use crate::sanitize::escape_os_file_name;
use crate::{Error, Result, Severity};

/// Callback invoked before a level's active file is reopened.
///
/// Called synchronously from the writer of `level`. Different levels may roll out
/// concurrently. Engines that only know a level by name map it with
/// [`Severity::from_name_or_global`].
pub trait RolloutHook: Send + Sync {
    fn pre_rollout(&self, path: &Path, size: u64, level: Severity);
}

impl<F> RolloutHook for F
where
    F: Fn(&Path, u64, Severity) + Send + Sync,
{
    fn pre_rollout(&self, path: &Path, size: u64, level: Severity) {
        self(path, size, level)
    }
}

/// Operator-visible sink for rollout failures.
pub type DiagnosticSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Result of one successful rollout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollout {
    pub level: Severity,
    /// Sequence number given to the rolled-out file.
    pub sequence: u64,
    /// Where the active file now lives.
    pub rotated: PathBuf,
    /// File removed by the retention window, if one was actually removed.
    pub deleted: Option<PathBuf>,
}

/// Renames full log files and enforces per-level retention.
#[derive(Clone)]
pub struct RolloutHandler {
    counter: Arc<LevelRotationCounter>,
    retention: RetentionPolicy,
    diagnostics: DiagnosticSink,
}

impl RolloutHandler {
    /// Create a handler that reports failures on standard error.
    pub fn new(counter: Arc<LevelRotationCounter>, retention: RetentionConfig) -> Self {
        Self {
            counter,
            retention: RetentionPolicy::new(retention),
            diagnostics: Arc::new(|line: &str| eprintln!("{}", line)),
        }
    }

    /// Replace the failure sink.
    pub fn with_diagnostics<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.diagnostics = Arc::new(sink);
        self
    }

    pub fn counter(&self) -> &Arc<LevelRotationCounter> {
        &self.counter
    }

    pub fn retention(&self) -> RetentionConfig {
        self.retention.config()
    }

    /// Roll out `path` for `level`.
    ///
    /// The rename source is `path` as the engine wrote it; the escaped name is only
    /// used to build the destination. The level's sequence is committed after the
    /// rename succeeds, so every index the retention window targets was created.
    /// The level stays locked in the shared counter until the rollout is done.
    pub fn rotate(&self, path: &Path, level: Severity) -> Result<Rollout> {
        let escaped = escaped_path(path)?;
        let _slot = self.counter.lock_level(level);
        let rotated = numbered_path(&escaped, self.counter.current(level).wrapping_add(1));

        fs::rename(path, &rotated).map_err(|source| Error::Rotation {
            path: path.to_path_buf(),
            source,
        })?;
        let committed = self.counter.next_sequence(level);

        // Missing or undeletable files are left alone.
        let deleted = self
            .retention
            .file_to_delete(&escaped, committed)
            .filter(|expired| fs::remove_file(expired).is_ok());

        Ok(Rollout {
            level,
            sequence: committed,
            rotated,
            deleted,
        })
    }

    /// Roll out `path`, reporting any failure to the diagnostic sink instead of
    /// returning it. The engine has no error channel for its callbacks.
    pub fn handle(&self, path: &Path, size: u64, level: Severity) -> Option<Rollout> {
        match self.rotate(path, level) {
            Ok(rollout) => Some(rollout),
            Err(err) => {
                (self.diagnostics)(&format!(
                    "{}. Rollout of {} log ({} bytes) skipped.",
                    err, level, size
                ));
                None
            }
        }
    }
}

impl RolloutHook for RolloutHandler {
    fn pre_rollout(&self, path: &Path, size: u64, level: Severity) {
        self.handle(path, size, level);
    }
}

impl fmt::Debug for RolloutHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RolloutHandler")
            .field("counter", &self.counter)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

/// `dir/<escaped base>`, with `.` standing in for a missing directory.
fn escaped_path(path: &Path) -> Result<PathBuf> {
    let base = path.file_name().ok_or_else(|| Error::Rotation {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(dir.join(escape_os_file_name(base)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn touch(path: &Path) {
        fs::write(path, b"line\n").unwrap();
    }

    fn handler(retention: RetentionConfig) -> RolloutHandler {
        RolloutHandler::new(Arc::new(LevelRotationCounter::new()), retention)
    }

    #[test]
    fn test_escaped_path_without_directory() {
        assert_eq!(
            escaped_path(Path::new("a b.log")).unwrap(),
            PathBuf::from(r"./a\ b.log")
        );
    }

    #[test]
    fn test_escaped_path_rejects_bare_root() {
        assert!(escaped_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_sequences_per_level() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(RetentionConfig::disabled());

        for (n, level) in Severity::ALL.into_iter().enumerate() {
            let active = dir.path().join(format!("{}.log", level));
            let rotations = n as u64 + 1;
            for _ in 0..rotations {
                touch(&active);
                handler.rotate(&active, level).unwrap();
            }
            for index in 1..=rotations {
                assert!(numbered_path(&active, index).exists());
            }
            assert!(!numbered_path(&active, rotations + 1).exists());
            assert_eq!(handler.counter().current(level), rotations);
        }

        // Each level only ever saw its own rollouts.
        for (n, level) in Severity::ALL.into_iter().enumerate() {
            assert_eq!(handler.counter().current(level), n as u64 + 1);
        }
    }

    #[test]
    fn test_retention_window_of_two() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(RetentionConfig::window(2));
        let active = dir.path().join("info.log");

        let mut outcomes = Vec::new();
        for _ in 0..3 {
            touch(&active);
            outcomes.push(handler.rotate(&active, Severity::Info).unwrap());
        }

        assert_eq!(outcomes[0].deleted, None);
        assert_eq!(outcomes[1].deleted, None);
        assert_eq!(outcomes[2].deleted, Some(numbered_path(&active, 1)));
        assert!(!numbered_path(&active, 1).exists());
        assert!(numbered_path(&active, 2).exists());
        assert!(numbered_path(&active, 3).exists());
    }

    #[test]
    fn test_disabled_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(RetentionConfig::disabled());
        let active = dir.path().join("warning.log");

        for _ in 0..10 {
            touch(&active);
            let rollout = handler.rotate(&active, Severity::Warning).unwrap();
            assert_eq!(rollout.deleted, None);
        }
        for index in 1..=10 {
            assert!(numbered_path(&active, index).exists());
        }
    }

    #[test]
    fn test_missing_expired_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(RetentionConfig::window(1));
        let active = dir.path().join("error.log");

        touch(&active);
        handler.rotate(&active, Severity::Error).unwrap();
        fs::remove_file(numbered_path(&active, 1)).unwrap();

        touch(&active);
        let rollout = handler.rotate(&active, Severity::Error).unwrap();
        assert_eq!(rollout.sequence, 2);
        assert_eq!(rollout.deleted, None);
        assert!(numbered_path(&active, 2).exists());
    }

    #[test]
    fn test_unsafe_name_rotates_to_escaped_destination() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(RetentionConfig::disabled());
        let active = dir.path().join(r#"my "log".txt"#);

        touch(&active);
        let rollout = handler.rotate(&active, Severity::Debug).unwrap();

        assert_eq!(rollout.rotated, dir.path().join(r#"my\ \"log\".txt.1"#));
        assert!(rollout.rotated.exists());
        assert!(!active.exists());
    }

    #[test]
    fn test_failed_rename_is_reported_and_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let reported = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&reported);
        let handler = handler(RetentionConfig::window(3))
            .with_diagnostics(move |line| sink.lock().unwrap().push(line.to_string()));

        let missing = dir.path().join("missing").join("fatal.log");
        assert_eq!(handler.handle(&missing, 42, Severity::Fatal), None);
        assert_eq!(handler.counter().current(Severity::Fatal), 0);

        let lines = reported.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("fatal.log"));
        assert!(!lines[0].contains('\n'));
    }

    #[test]
    fn test_unknown_level_name_rolls_out_as_global() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(RetentionConfig::disabled());
        let active = dir.path().join("verbose.log");

        touch(&active);
        handler.pre_rollout(&active, 1, Severity::from_name_or_global("verbose"));

        assert_eq!(handler.counter().current(Severity::Global), 1);
        assert!(numbered_path(&active, 1).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_keeps_its_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let handler = handler(RetentionConfig::window(1));
        let active = dir.path().join(OsStr::from_bytes(b"info\xff.log"));

        touch(&active);
        let first = handler.rotate(&active, Severity::Info).unwrap();
        assert_eq!(
            first.rotated.file_name().unwrap().as_bytes(),
            b"info\xff.log.1"
        );
        assert!(first.rotated.exists());

        touch(&active);
        let second = handler.rotate(&active, Severity::Info).unwrap();
        assert_eq!(second.deleted, Some(first.rotated.clone()));
        assert!(!first.rotated.exists());
    }

    #[test]
    fn test_handlers_sharing_a_counter_never_reuse_a_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let counter = Arc::new(LevelRotationCounter::new());
        let workers: Vec<_> = ["old", "new"]
            .into_iter()
            .map(|name| {
                // Two configurations alive at once, rolling out the same level.
                let handler =
                    RolloutHandler::new(Arc::clone(&counter), RetentionConfig::disabled());
                let active = dir.path().join(format!("{}-error.log", name));
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            touch(&active);
                            let rollout = handler.rotate(&active, Severity::Error).unwrap();
                            assert_eq!(
                                rollout.rotated,
                                numbered_path(&active, rollout.sequence)
                            );
                            rollout.sequence
                        })
                        .collect::<Vec<u64>>()
                })
            })
            .collect();

        let mut sequences: Vec<u64> = workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (1..=100).collect::<Vec<u64>>());
        assert_eq!(counter.current(Severity::Error), 100);
    }

    #[test]
    fn test_closure_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let hook = move |path: &Path, size: u64, level: Severity| {
            sink.lock().unwrap().push((path.to_path_buf(), size, level));
        };
        hook.pre_rollout(Path::new("a.log"), 7, Severity::Trace);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[(PathBuf::from("a.log"), 7, Severity::Trace)]
        );
    }
}
