//! Run protocol.
//!
//! Sequences one harness run: reachability probe, monitor start, the
//! selected scenarios in order, a settle window, monitor stop, leak
//! analysis, and assembly of the final [`TestRun`]. Only the probe can
//! abort the run; monitoring problems degrade to "no resource data" and
//! the monitor is stopped on every path out of this module.

use chrono::{DateTime, Utc};
use rlt_common::{HarnessConfig, HarnessError, Target};
use rlt_load::http::HttpClient;
use rlt_load::scenarios::{self, LoadResult};
use rlt_monitor::{LeakAnalysis, MonitorSession, ResourceMonitor, analyze};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Timeout for the initial reachability probe. Deliberately short: a
/// server that cannot answer one GET in this window is not testable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// The complete artifact of one harness run. Read-only for report layers.
#[derive(Debug, Clone, Serialize)]
pub struct TestRun {
    pub run_id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    /// Whether a user interrupt cut the scenario list short.
    pub interrupted: bool,
    pub load_results: Vec<LoadResult>,
    /// `None` when monitoring was disabled.
    pub monitor_session: Option<MonitorSession>,
    pub analysis: Option<LeakAnalysis>,
}

/// Execute one run. `cancel` is observed between scenarios; when raised,
/// remaining scenarios are skipped and the monitor is stopped cleanly
/// before the partial result is returned.
pub fn run(config: &HarnessConfig, cancel: &AtomicBool) -> Result<TestRun, HarnessError> {
    let started_at = Utc::now();
    let target = Target::parse(&config.url)?;

    probe_target(&target)?;

    let monitor = start_monitor(config);

    let mut load_results: Vec<LoadResult> = Vec::new();
    let mut interrupted = false;
    for &kind in &config.scenarios {
        if cancel.load(Ordering::SeqCst) {
            warn!("interrupt received, skipping remaining scenarios");
            interrupted = true;
            break;
        }
        load_results.push(scenarios::run_scenario(kind, config, &target));
    }

    // Let late resource churn land in the sample series before freezing it.
    let settle = config.settle_time();
    if !interrupted && monitor.is_some() && !settle.is_zero() {
        info!(settle_secs = settle.as_secs(), "letting resource usage settle");
        std::thread::sleep(settle);
    }

    let monitor_session = monitor.map(ResourceMonitor::stop);
    let analysis = monitor_session
        .as_ref()
        .map(|session| analyze(&session.samples, &config.thresholds));

    Ok(TestRun {
        run_id: Uuid::new_v4(),
        target: target.base_url(),
        started_at,
        interrupted,
        load_results,
        monitor_session,
        analysis,
    })
}

/// One lightweight GET to prove the target answers at all.
fn probe_target(target: &Target) -> Result<(), HarnessError> {
    info!(target = %target, "checking target reachability");
    let client = HttpClient::new(PROBE_TIMEOUT);
    match client.get(&target.url_for("/")) {
        Ok(response) => {
            info!(status = response.status, "target is reachable");
            Ok(())
        }
        Err(e) => Err(HarnessError::Unreachable {
            url: target.base_url(),
            reason: e.to_string(),
        }),
    }
}

/// Start the sampler when a pid was supplied; any start failure disables
/// monitoring for the run instead of aborting it.
fn start_monitor(config: &HarnessConfig) -> Option<ResourceMonitor> {
    let Some(pid) = config.monitor_pid() else {
        warn!("no PID provided, resource monitoring disabled");
        return None;
    };

    let mut monitor = ResourceMonitor::new(pid, config.sample_interval());
    if monitor.start() {
        Some(monitor)
    } else {
        warn!(pid, "resource monitoring disabled for this run");
        None
    }
}
