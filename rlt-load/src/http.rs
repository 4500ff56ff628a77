//! Well-formed HTTP client capability.
//!
//! Thin wrapper over a shared `ureq` agent. Statuses come back as values —
//! a 4xx or 5xx is data for the scenario to judge, not an error — and only
//! transport-level failures surface as `Err`. The agent is thread-safe and
//! is shared across coordinator workers.

use std::time::Duration;
use thiserror::Error;
use tracing::trace;
use ureq::Agent;

/// Errors from a single HTTP exchange.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("failed reading response body: {0}")]
    Body(#[from] std::io::Error),
}

/// The parts of a response the scenarios care about.
#[derive(Debug, Clone, Copy)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Bytes drained from the response body.
    pub body_bytes: u64,
}

impl HttpResponse {
    /// The scenarios' shared success criterion: anything below 500 means
    /// the server answered coherently.
    pub fn is_server_ok(&self) -> bool {
        self.status < 500
    }
}

/// HTTP client with a fixed per-exchange timeout.
#[derive(Clone)]
pub struct HttpClient {
    agent: Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            // 4xx/5xx are observations, not errors.
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.new_agent(),
        }
    }

    /// GET a URL, draining the body.
    pub fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self.agent.get(url).call()?;
        drain(response)
    }

    /// POST a byte payload, draining the body.
    pub fn post(&self, url: &str, body: &[u8]) -> Result<HttpResponse, HttpError> {
        let response = self
            .agent
            .post(url)
            .header("Content-Type", "application/octet-stream")
            .send(body)?;
        drain(response)
    }
}

/// Consume the body so the connection can be reused, keeping only counts.
fn drain(mut response: ureq::http::Response<ureq::Body>) -> Result<HttpResponse, HttpError> {
    let status = response.status().as_u16();
    let mut reader = response.body_mut().as_reader();
    let body_bytes = std::io::copy(&mut reader, &mut std::io::sink())?;
    trace!(status, body_bytes, "http exchange complete");
    Ok(HttpResponse { status, body_bytes })
}
