//! Harness configuration.
//!
//! One explicit record, constructed once by the command line (optionally
//! merged with a TOML file) and passed by reference into the orchestrator
//! and each load generator. No component reads ambient global state.

use crate::scenario::ScenarioKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Per-metric growth-rate thresholds for leak classification.
///
/// Defaults are fixed for reproducibility; the values are heuristic, not
/// provably correct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeakThresholds {
    /// Memory growth above this rate (MB/s) is flagged.
    #[serde(default = "default_rate")]
    pub memory_mb_per_sec: f64,
    /// Open-file-descriptor growth above this rate (fds/s) is flagged.
    #[serde(default = "default_rate")]
    pub fds_per_sec: f64,
    /// Thread-count growth above this rate (threads/s) is flagged.
    #[serde(default = "default_rate")]
    pub threads_per_sec: f64,
}

fn default_rate() -> f64 {
    0.1
}

impl Default for LeakThresholds {
    fn default() -> Self {
        Self {
            memory_mb_per_sec: default_rate(),
            fds_per_sec: default_rate(),
            threads_per_sec: default_rate(),
        }
    }
}

/// Full configuration for one harness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the server under test.
    pub url: String,
    /// PID of the server process to monitor; 0 disables monitoring.
    pub pid: u32,
    /// Scenarios to run, in order.
    pub scenarios: Vec<ScenarioKind>,
    /// Total request count for request-shaped scenarios.
    pub requests: usize,
    /// Connection count for the connection-hold scenario.
    pub connections: usize,
    /// Worker concurrency ceiling for coordinated scenarios.
    pub concurrency: usize,
    /// Seconds to hold connections open.
    pub hold_time_secs: u64,
    /// Seconds to wait after each scenario for resource cleanup.
    pub cleanup_time_secs: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Per-request timeout for script-execution paths, which pay external
    /// process startup latency.
    pub scripted_timeout_secs: u64,
    /// Resource sampling interval in milliseconds.
    pub interval_ms: u64,
    /// Delay between worker iterations in milliseconds.
    pub iteration_delay_ms: u64,
    /// Settle window before the monitor is stopped, in seconds.
    pub settle_secs: u64,
    /// Paths requested by the repeated-request scenario.
    pub request_paths: Vec<String>,
    /// Server-side script paths for the scripted-endpoint scenario.
    pub script_paths: Vec<String>,
    /// Path that yields a large generated response.
    pub large_response_path: String,
    /// Leak classification thresholds.
    pub thresholds: LeakThresholds,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            pid: 0,
            scenarios: ScenarioKind::all(),
            requests: 100,
            connections: 100,
            concurrency: 20,
            hold_time_secs: 10,
            cleanup_time_secs: 5,
            timeout_secs: 10,
            scripted_timeout_secs: 30,
            interval_ms: 500,
            iteration_delay_ms: 10,
            settle_secs: 2,
            request_paths: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/nonexistent".to_string(),
                "/this/path/does/not/exist".to_string(),
                "/very/long/path/to/test/buffer/handling/and/memory/usage/in/the/server"
                    .to_string(),
            ],
            script_paths: vec![
                "/cgi-bin/basic.py".to_string(),
                "/cgi-bin/slow.py".to_string(),
                "/cgi-bin/error.py".to_string(),
            ],
            large_response_path: "/cgi-bin/large.py".to_string(),
            thresholds: LeakThresholds::default(),
        }
    }
}

impl HarnessConfig {
    /// Load a configuration file, falling back to defaults for absent keys.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// PID to monitor, if monitoring is enabled.
    pub fn monitor_pid(&self) -> Option<u32> {
        (self.pid != 0).then_some(self.pid)
    }

    pub fn hold_time(&self) -> Duration {
        Duration::from_secs(self.hold_time_secs)
    }

    pub fn cleanup_time(&self) -> Duration {
        Duration::from_secs(self.cleanup_time_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn scripted_timeout(&self) -> Duration {
        Duration::from_secs(self.scripted_timeout_secs)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = HarnessConfig::default();
        assert_eq!(config.requests, 100);
        assert_eq!(config.connections, 100);
        assert_eq!(config.hold_time(), Duration::from_secs(10));
        assert_eq!(config.cleanup_time(), Duration::from_secs(5));
        assert_eq!(config.sample_interval(), Duration::from_millis(500));
        assert_eq!(config.scenarios.len(), 5);
    }

    #[test]
    fn pid_zero_disables_monitoring() {
        let mut config = HarnessConfig::default();
        assert_eq!(config.monitor_pid(), None);
        config.pid = 4242;
        assert_eq!(config.monitor_pid(), Some(4242));
    }

    #[test]
    fn threshold_defaults() {
        let t = LeakThresholds::default();
        assert_eq!(t.memory_mb_per_sec, 0.1);
        assert_eq!(t.fds_per_sec, 0.1);
        assert_eq!(t.threads_per_sec, 0.1);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: HarnessConfig = toml::from_str(
            r#"
url = "http://10.0.0.1:8081"
requests = 500
scenarios = ["repeated_request", "error_injection"]
"#,
        )
        .expect("parse should succeed");

        assert_eq!(parsed.url, "http://10.0.0.1:8081");
        assert_eq!(parsed.requests, 500);
        assert_eq!(
            parsed.scenarios,
            vec![ScenarioKind::RepeatedRequest, ScenarioKind::ErrorInjection]
        );
        // Untouched keys keep their defaults.
        assert_eq!(parsed.connections, 100);
        assert_eq!(parsed.thresholds.memory_mb_per_sec, 0.1);
    }

    #[test]
    fn config_roundtrips_through_serde() {
        let config = HarnessConfig::default();
        let encoded = toml::to_string(&config).expect("serialize should succeed");
        let decoded: HarnessConfig = toml::from_str(&encoded).expect("parse should succeed");
        assert_eq!(decoded.requests, config.requests);
        assert_eq!(decoded.scenarios, config.scenarios);
    }
}
