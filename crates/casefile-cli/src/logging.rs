//! The activity log: a line-oriented file sink and its viewer.
//!
//! Every line reads `<YYYY-MM-DD HH:MM:SS> - <LEVEL> - <message>`, with
//! `WARN` spelled `WARNING`. The level filter sits behind a reload handle and
//! the file behind a swappable [`Sink`], so a settings change to either
//! applies without restarting.

use std::{
  fmt, fs,
  io::{self, BufRead as _, BufReader, Write},
  path::{Path, PathBuf},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Context as _;
use casefile_core::case::TIMESTAMP_FORMAT;
use chrono::{Days, Local, NaiveDate};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
  EnvFilter, Registry,
  fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter, format},
  prelude::*,
  registry::LookupSpan,
  reload,
};

use crate::settings::{LogLevel, LogSettings};

// ─── Sink ────────────────────────────────────────────────────────────────────

/// The open log file. Clones share the file, and [`Sink::reopen`] swaps it
/// for every clone at once.
#[derive(Clone)]
pub struct Sink {
  file: Arc<Mutex<fs::File>>,
  path: Arc<Mutex<PathBuf>>,
}

impl Sink {
  /// Open `path` for appending, creating missing directories.
  pub fn open(path: &Path) -> anyhow::Result<Self> {
    Ok(Self {
      file: Arc::new(Mutex::new(open_log_file(path)?)),
      path: Arc::new(Mutex::new(path.to_path_buf())),
    })
  }

  pub fn path(&self) -> PathBuf { lock(&self.path).clone() }

  /// Switch to `path`. Returns `false` if it is already the open file.
  pub fn reopen(&self, path: &Path) -> anyhow::Result<bool> {
    let mut current = lock(&self.path);
    if current.as_path() == path {
      return Ok(false);
    }
    let file = open_log_file(path)?;
    *lock(&self.file) = file;
    *current = path.to_path_buf();
    Ok(true)
  }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_log_file(path: &Path) -> anyhow::Result<fs::File> {
  if let Some(dir) = path.parent()
    && !dir.as_os_str().is_empty()
  {
    fs::create_dir_all(dir)
      .with_context(|| format!("failed to create log directory {}", dir.display()))?;
  }
  fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("failed to open log file {}", path.display()))
}

pub struct SinkWriter<'a>(MutexGuard<'a, fs::File>);

impl Write for SinkWriter<'_> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.0.write(buf) }

  fn flush(&mut self) -> io::Result<()> { self.0.flush() }
}

impl<'a> MakeWriter<'a> for Sink {
  type Writer = SinkWriter<'a>;

  fn make_writer(&'a self) -> Self::Writer { SinkWriter(lock(&self.file)) }
}

/// Handle for changing the installed subscriber's level and file.
pub struct LogHandle {
  filter: reload::Handle<EnvFilter, Registry>,
  sink:   Sink,
}

impl LogHandle {
  /// Apply reloaded log settings: the level, then the file if it moved.
  pub fn apply(&self, settings: &LogSettings) -> anyhow::Result<()> {
    self
      .filter
      .reload(env_filter(settings.level))
      .context("failed to reload log filter")?;
    if self.sink.reopen(&settings.path)? {
      tracing::info!(path = %settings.path.display(), "log file reopened");
    }
    tracing::info!(level = %settings.level, "log settings applied");
    Ok(())
  }
}

fn env_filter(level: LogLevel) -> EnvFilter {
  EnvFilter::builder()
    .with_default_directive(level.as_level_filter().into())
    .from_env_lossy()
}

/// Install the global subscriber writing to `settings.path`.
pub fn init(settings: &LogSettings) -> anyhow::Result<LogHandle> {
  let sink = Sink::open(&settings.path)?;

  let (filter, handle) = reload::Layer::new(env_filter(settings.level));
  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .event_format(ActivityFormat)
        .with_writer(sink.clone())
        .with_ansi(false),
    )
    .try_init()
    .context("failed to install log subscriber")?;

  Ok(LogHandle { filter: handle, sink })
}

/// `<ts> - <LEVEL> - <fields>`.
struct ActivityFormat;

impl<S, N> FormatEvent<S, N> for ActivityFormat
where
  S: Subscriber + for<'a> LookupSpan<'a>,
  N: for<'a> FormatFields<'a> + 'static,
{
  fn format_event(
    &self,
    ctx: &FmtContext<'_, S, N>,
    mut writer: format::Writer<'_>,
    event: &Event<'_>,
  ) -> fmt::Result {
    write!(
      writer,
      "{} - {} - ",
      Local::now().format(TIMESTAMP_FORMAT),
      level_name(*event.metadata().level())
    )?;
    ctx.field_format().format_fields(writer.by_ref(), event)?;
    writeln!(writer)
  }
}

fn level_name(level: Level) -> &'static str {
  match level {
    Level::ERROR => "ERROR",
    Level::WARN => "WARNING",
    Level::INFO => "INFO",
    Level::DEBUG => "DEBUG",
    Level::TRACE => "TRACE",
  }
}

// ─── Viewer ──────────────────────────────────────────────────────────────────

/// Date range (inclusive) and level to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
  pub from:  NaiveDate,
  pub to:    NaiveDate,
  /// Upper-cased level name; `None` shows every level.
  pub level: Option<String>,
}

impl LogQuery {
  /// The last seven days through `today`, all levels.
  pub fn recent(today: NaiveDate) -> Self {
    Self {
      from:  today.checked_sub_days(Days::new(7)).unwrap_or(today),
      to:    today,
      level: None,
    }
  }

  /// `"ALL"` (any case) clears the level filter.
  pub fn with_level(mut self, level: &str) -> Self {
    let level = level.trim().to_uppercase();
    self.level = (level != "ALL").then_some(level);
    self
  }

  pub fn matches(&self, line: &str) -> bool {
    let parts: Vec<&str> = line.split(" - ").collect();
    if parts.len() < 3 {
      return false;
    }
    let Some(date) = parts[0].get(..10) else {
      return false;
    };

    let from = self.from.format("%Y-%m-%d").to_string();
    let to = self.to.format("%Y-%m-%d").to_string();
    if date < from.as_str() || date > to.as_str() {
      return false;
    }
    self.level.as_deref().is_none_or(|level| parts[1] == level)
  }
}

/// Matching lines of the log at `path`, or `None` if there is no log yet.
pub fn read_logs(path: &Path, query: &LogQuery) -> io::Result<Option<Vec<String>>> {
  let file = match fs::File::open(path) {
    Ok(file) => file,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(e),
  };

  let mut lines = Vec::new();
  for line in BufReader::new(file).lines() {
    let line = line?;
    if query.matches(&line) {
      lines.push(line);
    }
  }
  Ok(Some(lines))
}
