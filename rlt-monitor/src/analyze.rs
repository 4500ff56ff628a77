//! Leak classification over a finished sample series.
//!
//! Pure computation: no I/O, no clock reads, deterministic for a given
//! series. Growth rates come only from values embedded in the samples.

use crate::process::UNAVAILABLE;
use crate::sampler::Sample;
use rlt_common::LeakThresholds;
use serde::{Deserialize, Serialize};

/// Resource metrics tracked for leak classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Memory,
    FileDescriptors,
    Threads,
}

impl MetricKind {
    /// Display label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Memory => "Memory Usage",
            Self::FileDescriptors => "File Descriptors",
            Self::Threads => "Threads",
        }
    }

    /// Unit suffix for growth rates.
    pub fn rate_unit(self) -> &'static str {
        match self {
            Self::Memory => "MB/s",
            Self::FileDescriptors => "FDs/s",
            Self::Threads => "threads/s",
        }
    }
}

/// Per-metric classification result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakVerdict {
    pub metric: MetricKind,
    /// First usable observation, or -1 when the metric was never readable.
    pub start_value: f64,
    /// Last usable observation, or -1.
    pub end_value: f64,
    /// Growth rate in the metric's unit per second.
    pub growth_rate: f64,
    pub is_leak: bool,
}

/// Analysis over one monitoring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakAnalysis {
    /// Span of the series in seconds (0 for fewer than two samples).
    pub duration_seconds: f64,
    pub verdicts: Vec<LeakVerdict>,
    /// OR across the per-metric flags.
    pub any_leak: bool,
}

impl LeakAnalysis {
    fn empty() -> Self {
        Self {
            duration_seconds: 0.0,
            verdicts: Vec::new(),
            any_leak: false,
        }
    }
}

/// Classify a finished sample series against the thresholds.
///
/// Zero samples yield an empty analysis; a single sample yields all-zero
/// growth rates with nothing flagged. Sentinel (-1) observations mean the
/// metric was unreadable at that instant and are excluded from rate math.
pub fn analyze(samples: &[Sample], thresholds: &LeakThresholds) -> LeakAnalysis {
    if samples.is_empty() {
        return LeakAnalysis::empty();
    }

    let first = &samples[0];
    let last = &samples[samples.len() - 1];
    let duration_seconds = (last.elapsed_seconds - first.elapsed_seconds).max(0.0);

    let verdicts = vec![
        classify(
            samples,
            MetricKind::Memory,
            |s| s.memory_mb,
            thresholds.memory_mb_per_sec,
        ),
        classify(
            samples,
            MetricKind::FileDescriptors,
            |s| s.fd_count as f64,
            thresholds.fds_per_sec,
        ),
        classify(
            samples,
            MetricKind::Threads,
            |s| s.thread_count as f64,
            thresholds.threads_per_sec,
        ),
    ];

    let any_leak = verdicts.iter().any(|v| v.is_leak);

    LeakAnalysis {
        duration_seconds,
        verdicts,
        any_leak,
    }
}

/// Classify one metric from its first and last usable observations.
fn classify(
    samples: &[Sample],
    metric: MetricKind,
    value: impl Fn(&Sample) -> f64,
    threshold: f64,
) -> LeakVerdict {
    let usable = |s: &&Sample| value(*s) != UNAVAILABLE as f64;
    let start = samples.iter().find(usable);
    let end = samples.iter().rev().find(usable);

    let (start_value, end_value, growth_rate) = match (start, end) {
        (Some(first), Some(last)) => {
            let span = last.elapsed_seconds - first.elapsed_seconds;
            let rate = if span > 0.0 {
                (value(last) - value(first)) / span
            } else {
                // Single usable observation (or none of the spacing the
                // formula needs): no rate by convention.
                0.0
            };
            (value(first), value(last), rate)
        }
        _ => (UNAVAILABLE as f64, UNAVAILABLE as f64, 0.0),
    };

    LeakVerdict {
        metric,
        start_value,
        end_value,
        growth_rate,
        is_leak: growth_rate > threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(elapsed: f64, memory_mb: f64, fd_count: i64, thread_count: i64) -> Sample {
        Sample {
            timestamp: Utc::now(),
            elapsed_seconds: elapsed,
            cpu_percent: 0.0,
            memory_mb,
            fd_count,
            thread_count,
            connection_count: 0,
        }
    }

    fn verdict(analysis: &LeakAnalysis, metric: MetricKind) -> &LeakVerdict {
        analysis
            .verdicts
            .iter()
            .find(|v| v.metric == metric)
            .expect("verdict present")
    }

    #[test]
    fn growing_memory_is_flagged() {
        // 100 -> 150 MB over 100s: 0.5 MB/s, above the 0.1 threshold.
        let samples = vec![sample(0.0, 100.0, 10, 2), sample(100.0, 150.0, 10, 2)];
        let analysis = analyze(&samples, &LeakThresholds::default());

        let memory = verdict(&analysis, MetricKind::Memory);
        assert!((memory.growth_rate - 0.5).abs() < 1e-9);
        assert!(memory.is_leak);
        assert!(analysis.any_leak);

        // The other metrics stayed flat.
        assert!(!verdict(&analysis, MetricKind::FileDescriptors).is_leak);
        assert!(!verdict(&analysis, MetricKind::Threads).is_leak);
    }

    #[test]
    fn flat_series_is_clean() {
        let samples = vec![sample(0.0, 100.0, 10, 2), sample(50.0, 100.0, 10, 2)];
        let analysis = analyze(&samples, &LeakThresholds::default());

        for v in &analysis.verdicts {
            assert_eq!(v.growth_rate, 0.0);
            assert!(!v.is_leak);
        }
        assert!(!analysis.any_leak);
        assert!((analysis.duration_seconds - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_series_yields_empty_analysis() {
        let analysis = analyze(&[], &LeakThresholds::default());
        assert!(analysis.verdicts.is_empty());
        assert!(!analysis.any_leak);
        assert_eq!(analysis.duration_seconds, 0.0);
    }

    #[test]
    fn single_sample_yields_zero_rates() {
        let samples = vec![sample(0.0, 100.0, 10, 2)];
        let analysis = analyze(&samples, &LeakThresholds::default());

        assert_eq!(analysis.verdicts.len(), 3);
        for v in &analysis.verdicts {
            assert_eq!(v.growth_rate, 0.0);
            assert!(!v.is_leak);
        }
        assert!(!analysis.any_leak);
    }

    #[test]
    fn fd_growth_flags_only_fds() {
        // 10 fds/s, far above threshold.
        let samples = vec![sample(0.0, 100.0, 100, 2), sample(10.0, 100.0, 200, 2)];
        let analysis = analyze(&samples, &LeakThresholds::default());

        assert!(verdict(&analysis, MetricKind::FileDescriptors).is_leak);
        assert!(!verdict(&analysis, MetricKind::Memory).is_leak);
        assert!(analysis.any_leak);
    }

    #[test]
    fn sentinel_observations_are_skipped() {
        // fd metric was denied for the first and last samples; the usable
        // window (elapsed 10..20, 100 -> 105 fds) is 0.5 fds/s.
        let samples = vec![
            sample(0.0, 100.0, -1, 2),
            sample(10.0, 100.0, 100, 2),
            sample(20.0, 100.0, 105, 2),
            sample(30.0, 100.0, -1, 2),
        ];
        let analysis = analyze(&samples, &LeakThresholds::default());

        let fds = verdict(&analysis, MetricKind::FileDescriptors);
        assert_eq!(fds.start_value, 100.0);
        assert_eq!(fds.end_value, 105.0);
        assert!((fds.growth_rate - 0.5).abs() < 1e-9);
        assert!(fds.is_leak);
    }

    #[test]
    fn metric_never_readable_reports_sentinels_unflagged() {
        let samples = vec![sample(0.0, 100.0, -1, 2), sample(10.0, 100.0, -1, 2)];
        let analysis = analyze(&samples, &LeakThresholds::default());

        let fds = verdict(&analysis, MetricKind::FileDescriptors);
        assert_eq!(fds.start_value, -1.0);
        assert_eq!(fds.end_value, -1.0);
        assert_eq!(fds.growth_rate, 0.0);
        assert!(!fds.is_leak);
    }

    #[test]
    fn rate_exactly_at_threshold_is_not_a_leak() {
        // 0.1 MB/s equals the default threshold; flagging requires strict
        // excess.
        let samples = vec![sample(0.0, 100.0, 10, 2), sample(100.0, 110.0, 10, 2)];
        let analysis = analyze(&samples, &LeakThresholds::default());
        assert!(!verdict(&analysis, MetricKind::Memory).is_leak);
    }

    #[test]
    fn shrinking_usage_is_never_a_leak() {
        let samples = vec![sample(0.0, 200.0, 50, 8), sample(10.0, 100.0, 10, 2)];
        let analysis = analyze(&samples, &LeakThresholds::default());
        for v in &analysis.verdicts {
            assert!(v.growth_rate < 0.0);
            assert!(!v.is_leak);
        }
    }

    #[test]
    fn custom_thresholds_apply_per_metric() {
        let thresholds = LeakThresholds {
            memory_mb_per_sec: 10.0,
            fds_per_sec: 0.01,
            threads_per_sec: 0.1,
        };
        // Memory grows 0.5 MB/s (below 10), fds grow 0.05/s (above 0.01).
        let samples = vec![sample(0.0, 100.0, 100, 2), sample(100.0, 150.0, 105, 2)];
        let analysis = analyze(&samples, &thresholds);

        assert!(!verdict(&analysis, MetricKind::Memory).is_leak);
        assert!(verdict(&analysis, MetricKind::FileDescriptors).is_leak);
    }
}
