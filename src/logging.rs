/// Structured logging for the restoration planning engine
///
/// Library code emits `tracing` events tagged with the region being
/// planned and the pipeline stage that produced them. This module installs
/// the subscriber for the CLI (console, plus an optional append-mode log
/// file) and provides the summary helpers that pick a level from an outcome.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt as tfmt;
use tracing_subscriber::prelude::*;

use crate::engine::RestorationOutcome;
use crate::model::PlanError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Impairment,
    Freshness,
    Score,
    Size,
    Rollout,
    Economics,
    Engine,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Classify => write!(f, "CLASSIFY"),
            Stage::Impairment => write!(f, "IMPAIR"),
            Stage::Freshness => write!(f, "FRESH"),
            Stage::Score => write!(f, "SCORE"),
            Stage::Size => write!(f, "SIZE"),
            Stage::Rollout => write!(f, "ROLLOUT"),
            Stage::Economics => write!(f, "ECON"),
            Stage::Engine => write!(f, "ENGINE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriber Setup
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum LoggingError {
    EnvFilter { value: String, source: tracing_subscriber::filter::ParseError },
    LogFile { path: String, source: std::io::Error },
    Subscriber(tracing_subscriber::util::TryInitError),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::EnvFilter { value, .. } => {
                write!(f, "invalid log level/filter '{}'", value)
            }
            LoggingError::LogFile { path, source } => {
                write!(f, "could not open log file {}: {}", path, source)
            }
            LoggingError::Subscriber(err) => write!(f, "logging already initialized: {}", err),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggingError::EnvFilter { source, .. } => Some(source),
            LoggingError::LogFile { source, .. } => Some(source),
            LoggingError::Subscriber(err) => Some(err),
        }
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `min_level` when set. Console output
/// omits timestamps unless `console_timestamps` is set; the log file always
/// carries them.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&str>,
    console_timestamps: bool,
) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(min_level.as_directive()).map_err(|source| {
            LoggingError::EnvFilter {
                value: min_level.as_directive().to_string(),
                source,
            }
        })?,
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.to_string(),
                    source,
                })?;
            Some(
                tfmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let timed = console_timestamps
        .then(|| tfmt::layer().with_target(false).with_writer(std::io::stderr));
    let plain = (!console_timestamps).then(|| {
        tfmt::layer()
            .with_target(false)
            .without_time()
            .compact()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(timed)
        .with(plain)
        .with(file_layer)
        .try_init()
        .map_err(LoggingError::Subscriber)
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Logs input that failed validation for one site.
pub fn log_validation_failure(region: &str, err: &PlanError) {
    warn!(stage = %Stage::Engine, region, "invalid input, no plan produced: {}", err);
}

/// Logs the outcome for one site: critical plans at warn, everything else
/// at info.
pub fn log_plan_summary(region: &str, outcome: &RestorationOutcome) {
    match outcome {
        RestorationOutcome::NoActionRequired { severity } => {
            info!(
                stage = %Stage::Engine,
                region,
                score = severity.score,
                "healthy, no restoration required"
            );
        }
        RestorationOutcome::Planned(plan) => {
            let message = format!(
                "{} ({:.1}): {} quads / {} units, {} phase(s), ${}/yr",
                plan.severity.label,
                plan.severity.score,
                plan.deployment.total_quads,
                plan.deployment.total_units,
                plan.deployment.phases.len(),
                plan.deployment.annual_cost
            );
            if plan.severity.label == crate::severity::SeverityLabel::Critical {
                warn!(stage = %Stage::Engine, region, "{}", message);
            } else {
                info!(stage = %Stage::Engine, region, "{}", message);
            }
        }
    }
}

/// Logs a summary of a multi-site planning run.
pub fn log_batch_summary(total: usize, planned: usize, healthy: usize, failed: usize) {
    let message = format!(
        "Planning complete: {}/{} sites assessed ({} planned, {} healthy), {} invalid",
        planned + healthy,
        total,
        planned,
        healthy,
        failed
    );

    if failed == 0 {
        info!(stage = %Stage::Engine, "{}", message);
    } else if planned + healthy == 0 {
        error!(stage = %Stage::Engine, "{}", message);
    } else {
        warn!(stage = %Stage::Engine, "{}", message);
    }
}
