//! Layered settings: built-in defaults, an optional TOML file, then
//! `CASEFILE__*` environment variables.

use std::{
  fmt, fs,
  path::{Path, PathBuf},
  str::FromStr,
};

use anyhow::{Context as _, bail};
use casefile_report::ReportSettings;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store:  StoreSettings,
  pub log:    LogSettings,
  pub report: ReportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
  /// SQLite database file; created on first open.
  pub path: PathBuf,
}

impl Default for StoreSettings {
  fn default() -> Self { Self { path: PathBuf::from("casefile.db") } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
  pub level: LogLevel,
  /// Activity log file; its directory is created on startup.
  pub path:  PathBuf,
}

impl Default for LogSettings {
  fn default() -> Self {
    Self {
      level: LogLevel::Info,
      path:  PathBuf::from("logs/user_activity.log"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Debug,
  Info,
  #[serde(alias = "warn")]
  Warning,
  Error,
}

impl LogLevel {
  pub fn as_level_filter(self) -> LevelFilter {
    match self {
      Self::Debug => LevelFilter::DEBUG,
      Self::Info => LevelFilter::INFO,
      Self::Warning => LevelFilter::WARN,
      Self::Error => LevelFilter::ERROR,
    }
  }
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Debug => "debug",
      Self::Info => "info",
      Self::Warning => "warning",
      Self::Error => "error",
    })
  }
}

impl FromStr for LogLevel {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s.trim().to_lowercase().as_str() {
      "debug" => Self::Debug,
      "info" => Self::Info,
      "warn" | "warning" => Self::Warning,
      "error" => Self::Error,
      other => bail!("unknown log level {other:?} (debug, info, warning, error)"),
    })
  }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Keys accepted by [`SettingsHandle::set`].
pub const KNOWN_KEYS: &[&str] = &[
  "store.path",
  "log.level",
  "log.path",
  "report.title",
  "report.font",
  "report.output_dir",
  "report.font_dirs",
];

/// Read settings from `path` (optional) and the environment.
pub fn load(path: &Path) -> anyhow::Result<Settings> {
  config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("CASEFILE").separator("__"))
    .build()
    .with_context(|| format!("failed to read config file {}", path.display()))?
    .try_deserialize()
    .context("failed to deserialise settings")
}

/// The settings file plus the settings last loaded from it.
#[derive(Debug)]
pub struct SettingsHandle {
  path:    PathBuf,
  current: Settings,
}

impl SettingsHandle {
  pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
    let path = path.into();
    let current = load(&path)?;
    Ok(Self { path, current })
  }

  pub fn path(&self) -> &Path { &self.path }

  pub fn current(&self) -> &Settings { &self.current }

  pub fn reload(&mut self) -> anyhow::Result<&Settings> {
    self.current = load(&self.path)?;
    Ok(&self.current)
  }

  /// Persist `key = value` into the settings file and reload.
  ///
  /// `report.font_dirs` takes a comma-separated list.
  pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<&Settings> {
    if !KNOWN_KEYS.contains(&key) {
      bail!("unknown setting {key:?}; known: {}", KNOWN_KEYS.join(", "));
    }
    let Some((section, field)) = key.split_once('.') else {
      bail!("setting {key:?} has no section");
    };

    let value = match key {
      "log.level" => toml::Value::String(value.parse::<LogLevel>()?.to_string()),
      "report.font_dirs" => toml::Value::Array(
        value
          .split(',')
          .map(str::trim)
          .filter(|d| !d.is_empty())
          .map(|d| toml::Value::String(d.to_owned()))
          .collect(),
      ),
      _ => toml::Value::String(value.to_owned()),
    };

    let mut doc = match fs::read_to_string(&self.path) {
      Ok(raw) => raw
        .parse::<toml::Table>()
        .with_context(|| format!("parsing {}", self.path.display()))?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
      Err(e) => {
        return Err(e).with_context(|| format!("reading {}", self.path.display()));
      }
    };

    let table = doc
      .entry(section)
      .or_insert(toml::Value::Table(toml::Table::new()));
    let Some(table) = table.as_table_mut() else {
      bail!("{section:?} in {} is not a table", self.path.display());
    };
    table.insert(field.to_owned(), value);

    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)?;
    }
    fs::write(&self.path, toml::to_string_pretty(&doc)?)
      .with_context(|| format!("writing {}", self.path.display()))?;

    tracing::info!(key, path = %self.path.display(), "setting updated");
    self.reload()
  }
}
