//! The container's logging sink.
//!
//! By default messages are forwarded to `tracing` under the `fibre_inject`
//! target. A custom function can replace the sink entirely.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A custom log function, called with the level and the formatted message.
pub type LogFn = Arc<dyn Fn(LogLevel, &str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LogLevel {
  Info,
  Warn,
  Error,
  Fatal,
}

impl LogLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      LogLevel::Info => "info",
      LogLevel::Warn => "warn",
      LogLevel::Error => "error",
      LogLevel::Fatal => "fatal",
    }
  }
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LogLevel {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "" | "info" => Ok(LogLevel::Info),
      "warn" => Ok(LogLevel::Warn),
      "error" => Ok(LogLevel::Error),
      "fatal" => Ok(LogLevel::Fatal),
      _ => Err(Error::InvalidLogLevel(s.to_owned())),
    }
  }
}

/// Configuration of the logger used by a container.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoggerConfig {
  /// Added to every message as the `prefix` field.
  pub prefix: String,
  /// Messages below this level are dropped.
  pub level: LogLevel,
  pub enabled: bool,
  /// Replaces the `tracing` sink when set.
  #[cfg_attr(feature = "serde", serde(skip))]
  pub log_fn: Option<LogFn>,
}

impl Default for LoggerConfig {
  fn default() -> Self {
    Self {
      prefix: "fibre_inject".to_owned(),
      level: LogLevel::Info,
      enabled: true,
      log_fn: None,
    }
  }
}

impl fmt::Debug for LoggerConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoggerConfig")
      .field("prefix", &self.prefix)
      .field("level", &self.level)
      .field("enabled", &self.enabled)
      .field("has_log_fn", &self.log_fn.is_some())
      .finish()
  }
}

impl LoggerConfig {
  pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = prefix.into();
    self
  }

  pub fn level(mut self, level: LogLevel) -> Self {
    self.level = level;
    self
  }

  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  /// Routes every message to `f` instead of `tracing`.
  pub fn log_fn(mut self, f: impl Fn(LogLevel, &str) + Send + Sync + 'static) -> Self {
    self.log_fn = Some(Arc::new(f));
    self
  }
}

#[derive(Debug, Clone)]
pub(crate) struct Logger {
  config: LoggerConfig,
}

impl Logger {
  pub(crate) fn new(config: LoggerConfig) -> Self {
    Self { config }
  }

  pub(crate) fn info(&self, msg: impl AsRef<str>) {
    self.log(LogLevel::Info, msg.as_ref());
  }

  pub(crate) fn warn(&self, msg: impl AsRef<str>) {
    self.log(LogLevel::Warn, msg.as_ref());
  }

  pub(crate) fn log(&self, level: LogLevel, msg: &str) {
    if !self.config.enabled || level < self.config.level {
      return;
    }

    if let Some(log_fn) = &self.config.log_fn {
      log_fn(level, msg);
      return;
    }

    let prefix = self.config.prefix.as_str();
    match level {
      LogLevel::Info => tracing::info!(target: "fibre_inject", prefix, "{}", msg),
      LogLevel::Warn => tracing::warn!(target: "fibre_inject", prefix, "{}", msg),
      LogLevel::Error | LogLevel::Fatal => {
        tracing::error!(target: "fibre_inject", prefix, level = level.as_str(), "{}", msg)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use parking_lot::Mutex;

  fn capturing(level: LogLevel) -> (Logger, Arc<Mutex<Vec<(LogLevel, String)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let config = LoggerConfig::default()
      .level(level)
      .log_fn(move |level, msg| sink.lock().push((level, msg.to_owned())));
    (Logger::new(config), seen)
  }

  #[test]
  fn drops_messages_below_threshold() {
    let (logger, seen) = capturing(LogLevel::Warn);
    logger.info("hidden");
    logger.warn("shown");
    assert_eq!(*seen.lock(), vec![(LogLevel::Warn, "shown".to_owned())]);
  }

  #[test]
  fn disabled_logger_is_silent() {
    let seen = Arc::new(Mutex::new(0));
    let sink = seen.clone();
    let config = LoggerConfig::default()
      .enabled(false)
      .log_fn(move |_, _| *sink.lock() += 1);
    Logger::new(config).warn("nothing");
    assert_eq!(*seen.lock(), 0);
  }

  #[test]
  fn parses_levels() {
    assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    assert_eq!("".parse::<LogLevel>().unwrap(), LogLevel::Info);
    assert!(matches!("loud".parse::<LogLevel>(), Err(Error::InvalidLogLevel(_))));
  }
}
