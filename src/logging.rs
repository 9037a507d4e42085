// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. the level passed explicitly
//! 2. `DAGRUNNER_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs go to stderr, mirroring the convention that stdout stays free for a
//! collaborator's own output.

use anyhow::Result;
use tracing_subscriber::fmt;

/// Initialise the global logging subscriber. Safe to call once at startup.
pub fn init_logging(level: Option<tracing::Level>) -> Result<()> {
    let level = level.unwrap_or_else(|| {
        std::env::var("DAGRUNNER_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO)
    });

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_level_names_case_insensitively() {
        assert_eq!(parse_level_str("DEBUG"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level_str("warning"), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("nonsense"), None);
    }
}
