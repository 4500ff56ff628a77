//! Repeated-request scenario.
//!
//! Sustained well-formed GETs round-robined over a fixed path list that
//! mixes valid pages, missing files, and deep paths. Exercises the
//! server's per-request setup/teardown under concurrency.

use super::{LoadResult, wait_for_cleanup};
use crate::coordinator::{IterationOutcome, run_batch};
use crate::http::HttpClient;
use rlt_common::{HarnessConfig, ScenarioKind, Target};
use std::time::Instant;
use tracing::{debug, info};

pub fn run(config: &HarnessConfig, target: &Target) -> LoadResult {
    let total = config.requests;
    let concurrency = config.concurrency.min(total.max(1));
    let client = HttpClient::new(config.request_timeout());
    let paths = &config.request_paths;

    info!(
        requests = total,
        concurrency, "sending HTTP requests over the standard path list"
    );

    let outcome = run_batch(total, concurrency, config.iteration_delay(), |i| {
        let path = &paths[i % paths.len()];
        let url = target.url_for(path);
        let start = Instant::now();
        let success = match client.get(&url) {
            Ok(response) => response.is_server_ok(),
            Err(e) => {
                debug!(iteration = i, path = %path, error = %e, "request failed");
                false
            }
        };
        IterationOutcome {
            success,
            latency: start.elapsed(),
        }
    });

    wait_for_cleanup(config);
    LoadResult::from_batch(ScenarioKind::RepeatedRequest, outcome)
}
