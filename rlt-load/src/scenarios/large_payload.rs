//! Large-payload scenario.
//!
//! Alternates between pulling a large generated response and pushing a
//! large request body, to surface buffers the server allocates per
//! transfer and never returns.

use super::{LoadResult, wait_for_cleanup};
use crate::coordinator::{IterationOutcome, run_batch};
use crate::http::HttpClient;
use rlt_common::{HarnessConfig, ScenarioKind, Target};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Request body size for the upload half of the alternation.
const UPLOAD_BYTES: usize = 1024 * 1024;

/// Transfers are big; keep the worker pool small.
const CONCURRENCY_CAP: usize = 5;

const ITERATION_DELAY: Duration = Duration::from_millis(50);

pub fn run(config: &HarnessConfig, target: &Target) -> LoadResult {
    let total = config.requests;
    let concurrency = config.concurrency.min(CONCURRENCY_CAP).min(total.max(1));
    let client = HttpClient::new(config.request_timeout());

    let download_url = target.url_for(&config.large_response_path);
    let upload_url = target.url_for("/");
    let payload = vec![b'X'; UPLOAD_BYTES];

    info!(
        requests = total,
        concurrency,
        upload_bytes = UPLOAD_BYTES,
        "alternating large responses and large request bodies"
    );

    let outcome = run_batch(total, concurrency, ITERATION_DELAY, |i| {
        let start = Instant::now();
        let exchange = if i % 2 == 0 {
            client.get(&download_url)
        } else {
            client.post(&upload_url, &payload)
        };
        let success = match exchange {
            Ok(response) => response.is_server_ok(),
            Err(e) => {
                debug!(iteration = i, error = %e, "large transfer failed");
                false
            }
        };
        IterationOutcome {
            success,
            latency: start.elapsed(),
        }
    });

    wait_for_cleanup(config);
    LoadResult::from_batch(ScenarioKind::LargePayload, outcome)
}
