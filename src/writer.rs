use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::config::DATETIME_TOKEN;
use crate::rotation::RolloutHook;
use crate::Severity;

/// Rendering of [`DATETIME_TOKEN`] in file names, e.g. `26-10-16-09:30`.
const FILE_DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year repr:last_two]-[month]-[day]-[hour]:[minute]");

/// Current local time, falling back to UTC when the offset is unknown.
pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Replace the datetime token in the file name of `template` with `at`.
///
/// The directory part is used as given.
pub fn render_path(template: &Path, at: OffsetDateTime) -> PathBuf {
    match template.file_name().and_then(|name| name.to_str()) {
        Some(name) if name.contains(DATETIME_TOKEN) => {
            let stamp = at.format(FILE_DATETIME).unwrap_or_default();
            template.with_file_name(name.replace(DATETIME_TOKEN, &stamp))
        }
        _ => template.to_path_buf(),
    }
}

/// State of the current log file.
#[derive(Debug)]
struct FileState {
    file: File,
    size: u64,
}

/// Append-only writer for one severity tier.
///
/// Before every write the size is checked strictly: if the write would push a
/// non-empty file past `max_size`, the file is closed, the rollout hook runs, and
/// the path is reopened. When the hook could not move the file away, writing
/// continues into the same file and the next write tries again.
pub struct LevelFileWriter {
    level: Severity,
    path: PathBuf,
    max_size: u64,
    hook: Arc<dyn RolloutHook>,
    state: Option<FileState>,
}

impl LevelFileWriter {
    /// Open (or create) `path` for `level`.
    pub fn new(
        level: Severity,
        path: &Path,
        max_size: u64,
        hook: Arc<dyn RolloutHook>,
    ) -> io::Result<Self> {
        // Missing directories are created so `logs/` does not need to exist up front.
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = Self {
            level,
            path: path.to_path_buf(),
            max_size,
            hook,
            state: None,
        };
        writer.state = Some(writer.open()?);
        Ok(writer)
    }

    /// Open the file named by `template` at the current time.
    pub fn from_template(
        level: Severity,
        template: &Path,
        max_size: u64,
        hook: Arc<dyn RolloutHook>,
    ) -> io::Result<Self> {
        Self::new(level, &render_path(template, now()), max_size, hook)
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file.
    pub fn size(&self) -> u64 {
        self.state.as_ref().map(|s| s.size).unwrap_or(0)
    }

    fn open(&self) -> io::Result<FileState> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(FileState { file, size })
    }

    fn needs_rollout(&self, state: &FileState, buf_len: usize) -> bool {
        state.size > 0 && state.size + buf_len as u64 > self.max_size
    }

    fn rollout(&mut self) -> io::Result<()> {
        // Close before the hook renames the file.
        let size = self.state.take().map(|s| s.size).unwrap_or(0);
        self.hook.pre_rollout(&self.path, size, self.level);
        self.state = Some(self.open()?);
        Ok(())
    }

    fn current(&mut self, buf_len: usize) -> io::Result<&mut FileState> {
        if self.state.is_none() {
            self.state = Some(self.open()?);
        } else if self
            .state
            .as_ref()
            .is_some_and(|state| self.needs_rollout(state, buf_len))
        {
            self.rollout()?;
        }
        self.state
            .as_mut()
            .ok_or_else(|| io::Error::other("Failed to open log file"))
    }
}

impl Write for LevelFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let state = self.current(buf.len())?;
        let written = state.file.write(buf)?;
        state.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.state.as_mut() {
            Some(state) => state.file.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for LevelFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelFileWriter")
            .field("level", &self.level)
            .field("path", &self.path)
            .field("max_size", &self.max_size)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}
