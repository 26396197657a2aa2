//! Tracing setup and the structured events shared by the decision core

use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::types::{CellId, Quality, UeId};

/// Verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Every level, most verbose first
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Filter directive for this level (`"info"`, `"warn"`, ...)
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("warning") {
            return Ok(LogLevel::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| s.eq_ignore_ascii_case(level.as_str()))
            .ok_or_else(|| format!("unknown log level '{s}', expected one of trace, debug, info, warn, error"))
    }
}

/// Installs the global fmt subscriber at `level`.
///
/// `RUST_LOG`, when set, takes precedence.
///
/// ```
/// use loadho_common::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    init_logging_with_filter(level.as_str());
}

/// Installs the global fmt subscriber with an `EnvFilter` directive string.
///
/// ```
/// use loadho_common::init_logging_with_filter;
///
/// init_logging_with_filter("info,loadho_rrc::evaluator=debug");
/// ```
pub fn init_logging_with_filter(directives: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    // Already installed: keep the existing subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .try_init();
}

/// One line per cell per controller tick.
pub fn log_cell_load(time_ms: u64, cell: CellId, attached: u32, threshold: Quality) {
    tracing::info!(
        time_ms,
        cell = cell.value(),
        attached,
        threshold,
        "cell load sample"
    );
}

pub fn log_handover_decision(time_ms: u64, ue: UeId, source: CellId, target: CellId) {
    tracing::info!(
        time_ms,
        ue = ue.value(),
        source = source.value(),
        target = target.value(),
        "handover decision"
    );
}
