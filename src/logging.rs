//! Logger seam for the client, and tracing setup for the binary.
//!
//! The client logs through the [`Logger`] trait so the sink can be swapped
//! (or silenced) without touching the fetch logic. The default sink forwards
//! to `tracing`; with no subscriber installed it does nothing.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log severities, lowest number is most severe.
///
/// Config files and the command line accept the same names, see `FromStr`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Severity {
  Emergency,
  Alert,
  Critical,
  #[default]
  Error,
  Warning,
  Notice,
  Info,
  Debug,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Severity::Emergency => "emergency",
      Severity::Alert => "alert",
      Severity::Critical => "critical",
      Severity::Error => "error",
      Severity::Warning => "warning",
      Severity::Notice => "notice",
      Severity::Info => "info",
      Severity::Debug => "debug",
    }
  }

  /// Closest `tracing` level.
  pub fn tracing_level(self) -> tracing::Level {
    match self {
      Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
        tracing::Level::ERROR
      }
      Severity::Warning => tracing::Level::WARN,
      Severity::Notice | Severity::Info => tracing::Level::INFO,
      Severity::Debug => tracing::Level::DEBUG,
    }
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}'")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
  type Err = UnknownSeverity;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "emergency" => Ok(Severity::Emergency),
      "alert" => Ok(Severity::Alert),
      "critical" => Ok(Severity::Critical),
      "error" => Ok(Severity::Error),
      "warning" | "warn" => Ok(Severity::Warning),
      "notice" => Ok(Severity::Notice),
      "info" => Ok(Severity::Info),
      "debug" => Ok(Severity::Debug),
      _ => Err(UnknownSeverity(s.to_string())),
    }
  }
}

impl TryFrom<String> for Severity {
  type Error = UnknownSeverity;

  fn try_from(s: String) -> Result<Self, UnknownSeverity> {
    s.parse()
  }
}

/// Structured fields attached to a log message, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
  fields: Vec<(&'static str, String)>,
}

impl LogContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
    self.fields.push((key, value.to_string()));
    self
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, v)| v.as_str())
  }

  /// Render every field not named in `skip`, or `None` if nothing is left.
  fn rest(&self, skip: &[&str]) -> Option<String> {
    let rest: Vec<String> = self
      .fields
      .iter()
      .filter(|(k, _)| !skip.contains(k))
      .map(|(k, v)| format!("{}={}", k, v))
      .collect();
    (!rest.is_empty()).then(|| rest.join(" "))
  }
}

impl fmt::Display for LogContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (key, value)) in self.fields.iter().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      write!(f, "{}={}", key, value)?;
    }
    Ok(())
  }
}

/// A sink for leveled, structured log messages.
///
/// Implementations must not panic and have no way to report failure back.
pub trait Logger: Send + Sync {
  fn log(&self, severity: Severity, message: &str, context: &LogContext);
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
  fn log(&self, _severity: Severity, _message: &str, _context: &LogContext) {}
}

/// Logger that forwards to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

/// Context keys the client emits, recorded as their own event fields.
const EVENT_FIELDS: [&str; 4] = ["path", "count", "time", "exception"];

impl Logger for TracingLogger {
  fn log(&self, severity: Severity, message: &str, context: &LogContext) {
    let extra = context.rest(&EVENT_FIELDS);

    // tracing levels must be known at compile time
    macro_rules! emit {
      ($level:expr) => {
        tracing::event!(
          target: "jsonapi_cache",
          $level,
          severity = %severity,
          path = context.get("path"),
          count = context.get("count"),
          time = context.get("time"),
          exception = context.get("exception"),
          extra = extra.as_deref(),
          "{}",
          message
        )
      };
    }

    match severity.tracing_level() {
      tracing::Level::ERROR => emit!(tracing::Level::ERROR),
      tracing::Level::WARN => emit!(tracing::Level::WARN),
      tracing::Level::INFO => emit!(tracing::Level::INFO),
      _ => emit!(tracing::Level::DEBUG),
    }
  }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr unless `log_file` is given. The returned guard must be
/// held until exit so buffered file output gets flushed.
pub fn init_tracing(log_file: Option<&Path>) -> std::io::Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  match log_file {
    Some(path) => {
      let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
      let (writer, guard) = tracing_appender::non_blocking(file);
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      Ok(None)
    }
  }
}
