//! Logging bootstrap.
//!
//! The harness reports progress through a leveled, line-by-line log stream
//! on stderr while results go to stdout. Levels map onto `tracing`:
//! success and info at `info!`, warnings at `warn!`, errors at `error!`.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted for a filter directive.
const LOG_ENV: &str = "RLT_LOG";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Logging configuration, resolved from the environment with CLI overrides.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    json: bool,
}

impl LogConfig {
    /// Start from `RLT_LOG` if set, otherwise the given default level.
    pub fn from_env(default_level: &str) -> Self {
        let level = std::env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string());
        Self { level, json: false }
    }

    /// Override the level (e.g. `--verbose`).
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    /// Emit JSON log lines instead of the compact human format.
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    result.map_err(|e| LogError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_override_wins() {
        let config = LogConfig::from_env("info").with_level("debug");
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn json_flag_is_off_by_default() {
        let config = LogConfig::from_env("info");
        assert!(!config.json);
    }
}
