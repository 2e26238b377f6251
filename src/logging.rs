// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level`, then `ASSETFLOW_LOG`, then `info`.
//! `ASSETFLOW_LOG` also accepts full filter directives such as
//! `assetflow=debug,tower_http=debug`.
//!
//! Everything goes to stderr. Tool output that does not become an asset is
//! logged, never printed.

use anyhow::{Result, anyhow};
use tracing::warn;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding the fallback log filter.
pub const LOG_ENV: &str = "ASSETFLOW_LOG";

/// Noisy dependencies stay at warn unless a directive names them.
const DEPENDENCY_DIRECTIVES: &[&str] = &["hyper=warn", "notify=warn"];

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))?;

    if let Some(bad) = rejected {
        warn!(value = %bad, "ignoring invalid {LOG_ENV}, using info");
    }
    Ok(())
}

/// Filter for the given flag and environment value. An unparsable
/// environment value is returned alongside the default filter.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (with_dependencies(level_filter(level)), None);
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(_) => (with_dependencies(LevelFilter::INFO), Some(directives.to_string())),
        },
        None => (with_dependencies(LevelFilter::INFO), None),
    }
}

fn with_dependencies(level: LevelFilter) -> EnvFilter {
    let mut filter = EnvFilter::default().add_directive(level.into());
    for directive in DEPENDENCY_DIRECTIVES {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    filter
}

fn level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_environment() {
        let (filter, rejected) = build_filter(Some(LogLevel::Debug), Some("error"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        assert!(rejected.is_none());
    }

    #[test]
    fn environment_accepts_directives() {
        let (filter, rejected) = build_filter(None, Some("assetflow=trace,warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(rejected.is_none());
    }

    #[test]
    fn invalid_environment_falls_back_to_info() {
        let (filter, rejected) = build_filter(None, Some("assetflow=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(rejected.as_deref(), Some("assetflow=loud"));
    }
}
