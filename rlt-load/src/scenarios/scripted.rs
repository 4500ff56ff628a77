//! Scripted-endpoint scenario.
//!
//! The repeated-request shape pointed at server-side script execution
//! paths. Script invocations pay external process startup latency, so the
//! per-call timeout is longer, concurrency is capped lower, and iterations
//! are spaced further apart.

use super::{LoadResult, wait_for_cleanup};
use crate::coordinator::{IterationOutcome, run_batch};
use crate::http::HttpClient;
use rlt_common::{HarnessConfig, ScenarioKind, Target};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Script workers multiply load on the server (one child process per
/// request), so cap concurrency below the general ceiling.
const CONCURRENCY_CAP: usize = 10;

const ITERATION_DELAY: Duration = Duration::from_millis(50);

pub fn run(config: &HarnessConfig, target: &Target) -> LoadResult {
    let total = config.requests;
    let concurrency = config.concurrency.min(CONCURRENCY_CAP).min(total.max(1));
    let client = HttpClient::new(config.scripted_timeout());
    let paths = &config.script_paths;

    info!(
        requests = total,
        concurrency, "sending requests to script execution paths"
    );

    let outcome = run_batch(total, concurrency, ITERATION_DELAY, |i| {
        let path = &paths[i % paths.len()];
        let url = target.url_for(path);
        let start = Instant::now();
        let success = match client.get(&url) {
            Ok(response) => response.is_server_ok(),
            Err(e) => {
                debug!(iteration = i, path = %path, error = %e, "script request failed");
                false
            }
        };
        IterationOutcome {
            success,
            latency: start.elapsed(),
        }
    });

    wait_for_cleanup(config);
    LoadResult::from_batch(ScenarioKind::ScriptedEndpoint, outcome)
}
