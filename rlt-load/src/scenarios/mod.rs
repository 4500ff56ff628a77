//! Load scenarios.
//!
//! Each scenario follows the same shape: build its request descriptors,
//! drive them through the worker coordinator (well-formed HTTP load) or a
//! direct loop (raw-transport behavior), and return a [`LoadResult`]. A
//! transport failure in one iteration counts as that iteration's failure
//! and never aborts the rest of the batch.

pub mod connection_hold;
pub mod error_injection;
pub mod large_payload;
pub mod repeated;
pub mod scripted;

use crate::coordinator::BatchOutcome;
use crate::stats;
use rlt_common::{HarnessConfig, ScenarioKind, Target};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Outcome of one scenario invocation. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadResult {
    pub name: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Per-iteration latencies, unordered.
    pub latencies: Vec<Duration>,
}

impl LoadResult {
    fn from_batch(kind: ScenarioKind, outcome: BatchOutcome) -> Self {
        Self {
            name: kind.name().to_string(),
            attempted: outcome.attempted,
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            latencies: outcome.latencies,
        }
    }

    /// Fraction of attempts that succeeded, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.attempted as f64) * 100.0
    }

    /// Latency percentile with `floor(n * fraction)` index semantics.
    pub fn latency_percentile(&self, fraction: f64) -> Option<Duration> {
        stats::percentile(&stats::sorted(&self.latencies), fraction)
    }
}

/// Run one scenario against the target.
pub fn run_scenario(kind: ScenarioKind, config: &HarnessConfig, target: &Target) -> LoadResult {
    info!(scenario = %kind, "starting scenario");

    let result = match kind {
        ScenarioKind::ConnectionHold => connection_hold::run(config, target),
        ScenarioKind::RepeatedRequest => repeated::run(config, target),
        ScenarioKind::ScriptedEndpoint => scripted::run(config, target),
        ScenarioKind::ErrorInjection => error_injection::run(config, target),
        ScenarioKind::LargePayload => large_payload::run(config, target),
    };

    info!(
        scenario = %kind,
        attempted = result.attempted,
        succeeded = result.succeeded,
        failed = result.failed,
        success_rate = %format!("{:.1}%", result.success_rate()),
        "scenario complete"
    );
    result
}

/// Give the server a window to release per-request resources before the
/// next scenario (or the final sample series) observes it.
fn wait_for_cleanup(config: &HarnessConfig) {
    let cleanup = config.cleanup_time();
    if cleanup.is_zero() {
        return;
    }
    info!(
        cleanup_secs = cleanup.as_secs(),
        "waiting for resource cleanup"
    );
    std::thread::sleep(cleanup);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(latencies_ms: &[u64]) -> LoadResult {
        LoadResult {
            name: "test".to_string(),
            attempted: latencies_ms.len(),
            succeeded: latencies_ms.len(),
            failed: 0,
            latencies: latencies_ms
                .iter()
                .map(|&v| Duration::from_millis(v))
                .collect(),
        }
    }

    #[test]
    fn success_rate_math() {
        let result = LoadResult {
            name: "test".to_string(),
            attempted: 8,
            succeeded: 6,
            failed: 2,
            latencies: Vec::new(),
        };
        assert!((result.success_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn success_rate_of_empty_result_is_zero() {
        let result = result_with(&[]);
        assert_eq!(result.success_rate(), 0.0);
    }

    #[test]
    fn percentiles_sort_the_unordered_collection() {
        // Deliberately unsorted input.
        let result = result_with(&[10, 1, 9, 2, 8, 3, 7, 4, 6, 5]);
        assert_eq!(
            result.latency_percentile(0.5),
            Some(Duration::from_millis(6))
        );
        assert_eq!(
            result.latency_percentile(0.9),
            Some(Duration::from_millis(10))
        );
    }

    #[test]
    fn load_result_serializes() {
        let result = result_with(&[1, 2]);
        let json = serde_json::to_string(&result).expect("serialize");
        let back: LoadResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.attempted, 2);
        assert_eq!(back.latencies.len(), 2);
    }
}
