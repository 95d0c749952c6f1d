use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use once_cell::sync::{Lazy, OnceCell};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::writer::OptionalWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogConfig, LogLevelConfiguration};
use crate::counter::LevelRotationCounter;
use crate::rotation::{RolloutHandler, RolloutHook};
use crate::writer::{self, LevelFileWriter};
use crate::{Error, Result, Severity};

static GLOBAL: Lazy<Arc<LogSubsystem>> = Lazy::new(|| Arc::new(LogSubsystem::new()));

static INSTALLED: OnceCell<()> = OnceCell::new();

const LINE_DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Line timestamp with millisecond precision.
#[derive(Debug, Clone, Copy, Default)]
struct LogTimestamp;

impl FormatTime for LogTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let stamp = writer::now()
            .format(LINE_DATETIME)
            .map_err(|_| std::fmt::Error)?;
        w.write_str(&stamp)
    }
}

/// Outputs of one applied configuration: a writer per file-backed tier and the
/// rollout handler they share.
pub struct LevelRouter {
    config: LogLevelConfiguration,
    handler: RolloutHandler,
    files: [Option<Mutex<LevelFileWriter>>; Severity::COUNT],
}

impl LevelRouter {
    fn build(config: LogLevelConfiguration, counter: Arc<LevelRotationCounter>) -> Result<Self> {
        let handler = RolloutHandler::new(counter, config.retention());
        let hook: Arc<dyn RolloutHook> = Arc::new(handler.clone());

        let mut files: [Option<Mutex<LevelFileWriter>>; Severity::COUNT] = Default::default();
        for level in Severity::ALL {
            let level_config = config.level(level);
            if let Some(template) = &level_config.path_template {
                let file = LevelFileWriter::from_template(
                    level,
                    template,
                    level_config.max_file_size,
                    Arc::clone(&hook),
                )?;
                files[level.index()] = Some(Mutex::new(file));
            }
        }

        Ok(Self {
            config,
            handler,
            files,
        })
    }

    pub fn configuration(&self) -> &LogLevelConfiguration {
        &self.config
    }

    /// The handler every file of this configuration rolls out through.
    pub fn handler(&self) -> &RolloutHandler {
        &self.handler
    }

    /// Active file of `level`, if the tier writes to a file.
    pub fn file_path(&self, level: Severity) -> Option<PathBuf> {
        let file = self.files[level.index()].as_ref()?;
        let guard = file.lock().ok()?;
        Some(guard.path().to_path_buf())
    }

    fn stdout_enabled(&self, level: Severity) -> bool {
        self.config.log_to_stdout() && self.config.level(level).enabled
    }

    fn write_file(&self, level: Severity, buf: &[u8]) -> io::Result<usize> {
        match &self.files[level.index()] {
            Some(file) => {
                let mut guard = file
                    .lock()
                    .map_err(|_| io::Error::other("log file lock poisoned"))?;
                guard.write_all(buf)?;
                Ok(buf.len())
            }
            None => Ok(buf.len()),
        }
    }

    fn flush_file(&self, level: Severity) -> io::Result<()> {
        match &self.files[level.index()] {
            Some(file) => file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for LevelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelRouter")
            .field("config", &self.config)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// Per-level logging state: the rollout counters, which live as long as the
/// subsystem, and the currently applied configuration, which `configure` replaces.
#[derive(Debug, Default)]
pub struct LogSubsystem {
    counter: Arc<LevelRotationCounter>,
    router: RwLock<Option<Arc<LevelRouter>>>,
}

impl LogSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance used by [`init_log`].
    pub fn global() -> &'static Arc<LogSubsystem> {
        &GLOBAL
    }

    pub fn counter(&self) -> &Arc<LevelRotationCounter> {
        &self.counter
    }

    /// Open every file `levels` names, without applying anything.
    fn prepare(&self, levels: LogLevelConfiguration) -> Result<LevelRouter> {
        LevelRouter::build(levels, Arc::clone(&self.counter))
    }

    fn apply(&self, router: LevelRouter) -> Result<()> {
        let mut guard = self
            .router
            .write()
            .map_err(|_| Error::Init("log router lock poisoned".to_string()))?;
        *guard = Some(Arc::new(router));
        Ok(())
    }

    /// Replace the applied configuration with `config`.
    ///
    /// On error nothing changes: the previous configuration, if any, stays active.
    pub fn configure(&self, config: &LogConfig) -> Result<()> {
        let router = self.prepare(LogLevelConfiguration::from_config(config)?)?;
        self.apply(router)
    }

    /// Currently applied configuration.
    pub fn router(&self) -> Option<Arc<LevelRouter>> {
        self.router.read().ok().and_then(|guard| guard.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.router().is_some()
    }
}

/// Writer for one event, bound to the configuration applied when it was made.
#[derive(Debug)]
pub struct RoutedWriter {
    router: Option<Arc<LevelRouter>>,
    level: Severity,
}

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.router {
            Some(router) => router.write_file(self.level, buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.router {
            Some(router) => router.flush_file(self.level),
            None => Ok(()),
        }
    }
}

/// [`MakeWriter`] sending each event to its tier's file.
#[derive(Debug, Clone)]
pub struct FileRoutes {
    subsystem: Arc<LogSubsystem>,
}

impl<'a> MakeWriter<'a> for FileRoutes {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter {
            router: self.subsystem.router(),
            level: Severity::Global,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        RoutedWriter {
            router: self.subsystem.router(),
            level: Severity::of(meta),
        }
    }
}

/// [`MakeWriter`] mirroring enabled tiers to standard output.
#[derive(Debug, Clone)]
pub struct StdoutRoutes {
    subsystem: Arc<LogSubsystem>,
}

impl<'a> MakeWriter<'a> for StdoutRoutes {
    type Writer = OptionalWriter<io::Stdout>;

    fn make_writer(&'a self) -> Self::Writer {
        OptionalWriter::none()
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        match self.subsystem.router() {
            Some(router) if router.stdout_enabled(Severity::of(meta)) => {
                OptionalWriter::some(io::stdout())
            }
            _ => OptionalWriter::none(),
        }
    }
}

/// Layer writing events into the per-level files of `subsystem`.
pub fn file_layer<S>(subsystem: Arc<LogSubsystem>) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer::<S>()
        .with_ansi(false)
        .with_target(false)
        .with_timer(LogTimestamp)
        .with_writer(FileRoutes { subsystem })
}

/// Layer mirroring events to standard output when `subsystem` asks for it.
pub fn stdout_layer<S>(subsystem: Arc<LogSubsystem>) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer::<S>()
        .with_ansi(false)
        .with_target(false)
        .with_timer(LogTimestamp)
        .with_writer(StdoutRoutes { subsystem })
}

/// Initialize per-level logging for the process.
///
/// The configuration is validated and every file opened before anything is
/// applied. The first call installs the global subscriber, before any file is
/// created; later calls replace the configuration in place, keeping the rollout
/// counters.
pub fn init_log(config: &LogConfig) -> Result<()> {
    let subsystem = LogSubsystem::global();
    let levels = LogLevelConfiguration::from_config(config)?;

    INSTALLED.get_or_try_init(|| {
        tracing_subscriber::registry()
            .with(file_layer(Arc::clone(subsystem)))
            .with(stdout_layer(Arc::clone(subsystem)))
            .try_init()
            .map_err(|e| Error::Init(e.to_string()))
    })?;

    let router = subsystem.prepare(levels)?;
    subsystem.apply(router)?;
    tracing::debug!(
        logs_path = %config.logs_path.display(),
        max_log_file_size = config.max_log_file_size,
        log_rotate_num = config.log_rotate_num,
        "log configuration applied"
    );
    Ok(())
}
