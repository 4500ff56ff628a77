//! Connection-hold scenario.
//!
//! Opens many raw connections, keeps them alive across a hold window, then
//! probes each one to count how many the server still serves. Descriptive
//! rather than pass/fail: the interesting number is how many connections
//! survive, and what the fd series looks like while they are held.
//!
//! The socket list is owned by this single coordinating thread for the
//! whole scenario; it is never shared.

use super::{LoadResult, wait_for_cleanup};
use crate::transport::{RawConnection, TransportError, request_frame};
use rlt_common::{HarnessConfig, ScenarioKind, Target};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub fn run(config: &HarnessConfig, target: &Target) -> LoadResult {
    let total = config.connections;
    let timeout = config.request_timeout();

    info!(connections = total, "opening connections to hold");

    let mut connections: Vec<RawConnection> = Vec::with_capacity(total);
    let mut latencies: Vec<Duration> = Vec::with_capacity(total);

    for i in 0..total {
        let start = Instant::now();
        match open_and_greet(target, timeout) {
            Ok(connection) => {
                connections.push(connection);
                latencies.push(start.elapsed());
            }
            Err(e) => {
                // The server's accept backlog (or fd budget) is exhausted;
                // later attempts would only measure the same wall.
                warn!(connection = i + 1, error = %e, "failed to open connection, stopping early");
                break;
            }
        }
        if (i + 1) % 10 == 0 {
            info!(opened = i + 1, total, "connections opened");
        }
    }

    let opened = connections.len();
    let mut alive = 0usize;

    if opened > 0 {
        info!(
            opened,
            hold_secs = config.hold_time().as_secs(),
            "holding connections open"
        );
        std::thread::sleep(config.hold_time());

        for connection in &mut connections {
            if probe(connection, target.host()) {
                alive += 1;
            }
        }
        info!(alive, opened, "connections still active after hold");
    } else {
        error!("failed to open any connections");
    }

    for connection in connections {
        connection.close();
    }
    info!(closed = opened, "closed all connections");

    wait_for_cleanup(config);

    LoadResult {
        name: ScenarioKind::ConnectionHold.name().to_string(),
        attempted: total,
        succeeded: alive,
        failed: total - alive,
        latencies,
    }
}

/// Open one connection and send the minimal keep-alive request that makes
/// the server treat it as a live client, reading the initial response.
fn open_and_greet(target: &Target, timeout: Duration) -> Result<RawConnection, TransportError> {
    let mut connection = RawConnection::connect(&target.socket_addr(), timeout)?;
    let greeting = request_frame(
        "GET",
        "/",
        "HTTP/1.1",
        target.host(),
        &[("Connection", "keep-alive")],
    );
    connection.send(&greeting)?;
    let mut buf = [0u8; 4096];
    connection.recv(&mut buf)?;
    Ok(connection)
}

/// Second request on a held connection; any response at all means the
/// server is still serving it.
fn probe(connection: &mut RawConnection, host: &str) -> bool {
    let ping = request_frame("GET", "/ping", "HTTP/1.1", host, &[]);
    if connection.send(&ping).is_err() {
        return false;
    }
    let mut buf = [0u8; 4096];
    matches!(connection.recv(&mut buf), Ok(n) if n > 0)
}
