//! Harness-boundary error taxonomy.
//!
//! Only connectivity failures terminate a run; monitoring problems degrade
//! to "no resource data" and per-iteration request errors are folded into
//! result statistics where they occur. Subsystem-specific errors live next
//! to the modules that raise them.

use crate::target::TargetError;
use thiserror::Error;

/// Fatal errors surfaced by the orchestrator.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The target did not answer the initial reachability probe.
    #[error("could not connect to {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("invalid target: {0}")]
    Target(#[from] TargetError),
}
