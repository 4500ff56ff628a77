//! Terminal report and sample export.
//!
//! Renders a [`TestRun`] through the leveled log stream and, on request,
//! writes the sample series as CSV for downstream tooling.

use crate::orchestrator::TestRun;
use rlt_monitor::{LeakAnalysis, MonitorSession};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Print the run summary, line by line, through the log stream.
pub fn print_report(run: &TestRun) {
    info!(run_id = %run.run_id, target = %run.target, "===== run summary =====");
    if run.interrupted {
        warn!("run was interrupted; results are partial");
    }

    for result in &run.load_results {
        let p50 = result
            .latency_percentile(0.5)
            .map(|d| format!("{:.1}ms", d.as_secs_f64() * 1000.0))
            .unwrap_or_else(|| "-".to_string());
        let p90 = result
            .latency_percentile(0.9)
            .map(|d| format!("{:.1}ms", d.as_secs_f64() * 1000.0))
            .unwrap_or_else(|| "-".to_string());

        info!(
            scenario = %result.name,
            attempted = result.attempted,
            succeeded = result.succeeded,
            failed = result.failed,
            success_rate = %format!("{:.1}%", result.success_rate()),
            p50 = %p50,
            p90 = %p90,
            "scenario result"
        );
    }

    match &run.analysis {
        Some(analysis) => print_analysis(analysis),
        None => warn!("no resource data collected (monitoring was disabled)"),
    }
}

fn print_analysis(analysis: &LeakAnalysis) {
    info!(
        duration_secs = %format!("{:.1}", analysis.duration_seconds),
        "resource leak analysis"
    );

    for verdict in &analysis.verdicts {
        let line = format!(
            "{}: start {:.2}, end {:.2}, growth {:.4} {}",
            verdict.metric.label(),
            verdict.start_value,
            verdict.end_value,
            verdict.growth_rate,
            verdict.metric.rate_unit(),
        );
        if verdict.is_leak {
            warn!("{line} - POTENTIAL LEAK");
        } else {
            info!("{line} - OK");
        }
    }

    if analysis.any_leak {
        warn!("overall assessment: RESOURCE LEAKS DETECTED");
    } else {
        info!("overall assessment: no leaks detected");
    }
}

/// Write the flat sample series as CSV.
pub fn write_samples_csv(session: &MonitorSession, path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(
        file,
        "timestamp,elapsed,cpu_percent,memory_mb,fd_count,thread_count,connections"
    )?;
    for sample in &session.samples {
        writeln!(
            file,
            "{},{:.3},{:.1},{:.2},{},{},{}",
            sample.timestamp.to_rfc3339(),
            sample.elapsed_seconds,
            sample.cpu_percent,
            sample.memory_mb,
            sample.fd_count,
            sample.thread_count,
            sample.connection_count,
        )?;
    }
    file.flush()
}
