//! Error-injection scenario.
//!
//! A fixed rotation of malformed inputs delivered over raw transport. The
//! point is survival, not status codes: once a probe has been delivered,
//! whatever the server does — answer, error, hang up — counts as handled.
//! Only a refused connection is a failure, because nothing was delivered.
//!
//! Runs as a direct sequential loop: the rotation deliberately violates
//! the protocol, and interleaving violations from concurrent workers would
//! blur which input the server failed to survive.

use super::{LoadResult, wait_for_cleanup};
use crate::transport::{RawConnection, request_frame};
use rlt_common::{HarnessConfig, ScenarioKind, Target};
use std::time::Instant;
use tracing::{debug, info};

/// The malformed inputs, in rotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    /// Request path far beyond typical buffer sizing.
    OversizedPath,
    /// A method token the grammar does not know.
    InvalidMethod,
    /// A protocol version that does not exist.
    InvalidVersion,
    /// A single 8 KiB header value.
    OversizedHeader,
    /// Connect, then hang up before sending anything.
    AbortAfterConnect,
    /// A Content-Length that is not a number.
    InvalidContentLength,
    /// Percent signs where percent-escapes should be.
    SpecialCharPath,
}

const ROTATION: [Probe; 7] = [
    Probe::OversizedPath,
    Probe::InvalidMethod,
    Probe::InvalidVersion,
    Probe::OversizedHeader,
    Probe::AbortAfterConnect,
    Probe::InvalidContentLength,
    Probe::SpecialCharPath,
];

impl Probe {
    /// The raw frame for this probe, or `None` for the connect-and-abort
    /// case, which sends nothing.
    fn frame(self, host: &str) -> Option<Vec<u8>> {
        match self {
            Self::OversizedPath => {
                let path = format!(
                    "/extremely/long/path/that/exceeds/typical/buffer/sizes{}",
                    "a".repeat(1000)
                );
                Some(request_frame("GET", &path, "HTTP/1.1", host, &[]))
            }
            Self::InvalidMethod => Some(request_frame("BAD", "/", "HTTP/1.1", host, &[])),
            Self::InvalidVersion => Some(request_frame("GET", "/", "HTTP/9.9", host, &[])),
            Self::OversizedHeader => {
                let value = "X".repeat(8192);
                Some(request_frame(
                    "GET",
                    "/",
                    "HTTP/1.1",
                    host,
                    &[("X-Large-Header", &value)],
                ))
            }
            Self::AbortAfterConnect => None,
            Self::InvalidContentLength => Some(request_frame(
                "POST",
                "/",
                "HTTP/1.1",
                host,
                &[("Content-Length", "not_a_number")],
            )),
            Self::SpecialCharPath => {
                Some(request_frame("GET", "/%%invalid%%", "HTTP/1.1", host, &[]))
            }
        }
    }
}

pub fn run(config: &HarnessConfig, target: &Target) -> LoadResult {
    let total = config.requests;
    let timeout = config.request_timeout();
    let delay = config.iteration_delay();

    info!(requests = total, "sending malformed inputs");

    let mut result = LoadResult {
        name: ScenarioKind::ErrorInjection.name().to_string(),
        attempted: 0,
        succeeded: 0,
        failed: 0,
        latencies: Vec::with_capacity(total),
    };

    for i in 0..total {
        let probe = ROTATION[i % ROTATION.len()];
        let start = Instant::now();
        let handled = deliver(probe, target, timeout);

        result.attempted += 1;
        if handled {
            result.succeeded += 1;
        } else {
            result.failed += 1;
        }
        result.latencies.push(start.elapsed());

        if (i + 1) % 10 == 0 {
            info!(completed = i + 1, total, "error probes delivered");
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    wait_for_cleanup(config);
    result
}

/// Deliver one probe. `true` means the server survived contact: we
/// connected and either sent the malformed frame or hung up on purpose.
/// Send/receive failures after the connect are the server's prerogative
/// when fed garbage and still count as handled.
fn deliver(probe: Probe, target: &Target, timeout: std::time::Duration) -> bool {
    let mut connection = match RawConnection::connect(&target.socket_addr(), timeout) {
        Ok(connection) => connection,
        Err(e) => {
            debug!(?probe, error = %e, "connect failed");
            return false;
        }
    };

    match probe.frame(target.host()) {
        None => {
            // Immediate disconnect after connect.
            connection.close();
        }
        Some(frame) => {
            let _ = connection.send(&frame);
            let mut buf = [0u8; 4096];
            let _ = connection.recv(&mut buf);
            connection.close();
        }
    }
    true
}
