//! Stderr logger with per-crate level filtering.
//!
//! The solvers in this workspace log under their crate names
//! (`weld_align_core`, `weld_align_marker`, `weld_align_audit`, `weld_align`),
//! so a filter such as `warn,weld_align_marker=debug` surfaces rejected quads
//! without drowning the rest of a run in debug output. The syntax is the
//! familiar `RUST_LOG` subset: a bare level sets the default and
//! `target=level` pairs override it for a module path and its children.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LogFilterError {
    #[error("unknown log level {0:?}")]
    UnknownLevel(String),
    #[error("empty target in log directive {0:?}")]
    EmptyTarget(String),
}

/// Default level plus per-target overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    targets: Vec<(String, LevelFilter)>,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::new(LevelFilter::Info)
    }
}

impl From<LevelFilter> for LogFilter {
    fn from(level: LevelFilter) -> Self {
        Self::new(level)
    }
}

impl LogFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            targets: Vec::new(),
        }
    }

    /// Override the level for `target` and every module below it.
    /// A later override for the same target replaces the earlier one.
    pub fn with_target(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        let target = target.into();
        self.targets.retain(|(t, _)| *t != target);
        self.targets.push((target, level));
        self
    }

    pub fn default_level(&self) -> LevelFilter {
        self.default
    }

    /// Level that applies to `target`: the longest matching override, else the default.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .filter(|(prefix, _)| covers(prefix, target))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(self.default, |(_, level)| *level)
    }

    /// Most verbose level any target can reach.
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, Ord::max)
    }
}

fn covers(prefix: &str, target: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn parse_level(raw: &str) -> Result<LevelFilter, LogFilterError> {
    raw.trim()
        .parse()
        .map_err(|_| LogFilterError::UnknownLevel(raw.trim().to_string()))
}

impl FromStr for LogFilter {
    type Err = LogFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = LogFilter::default();
        for directive in s.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((target, level)) => {
                    let target = target.trim();
                    if target.is_empty() {
                        return Err(LogFilterError::EmptyTarget(directive.to_string()));
                    }
                    filter = filter.with_target(target, parse_level(level)?);
                }
                None => filter.default = parse_level(directive)?,
            }
        }
        Ok(filter)
    }
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default.as_str().to_ascii_lowercase())?;
        for (target, level) in &self.targets {
            write!(f, ",{target}={}", level.as_str().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

struct StderrLogger {
    filter: LogFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let _ = writeln!(
            std::io::stderr().lock(),
            "{:>5} {}: {} (+{:.3}s)",
            record.level(),
            record.target(),
            record.args(),
            self.started.elapsed().as_secs_f64()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Only the first call takes effect.
pub fn init_with_filter(filter: LogFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let max = filter.max_level();
    let logger = LOGGER.get_or_init(|| StderrLogger {
        filter,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(max);
    Ok(())
}

/// Same level for every target.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_filter(LogFilter::new(level))
}

/// Install a `tracing` subscriber instead of the stderr logger.
///
/// `RUST_LOG` wins when set; otherwise `filter` is used. `log` records are
/// forwarded into the subscriber. Returns `false` if a global subscriber was
/// already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(filter: &LogFilter, json: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.to_string()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    if json {
        builder.json().flatten_event(true).finish().try_init().is_ok()
    } else {
        builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init()
            .is_ok()
    }
}
