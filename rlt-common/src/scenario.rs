//! Scenario identifiers.

use serde::{Deserialize, Serialize};

/// The load scenarios the harness can run against a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Open and hold many raw connections, then probe them for liveness.
    ConnectionHold,
    /// Sustained well-formed requests round-robined over a fixed path list.
    RepeatedRequest,
    /// Repeated requests against server-side script execution paths.
    ScriptedEndpoint,
    /// A fixed rotation of malformed inputs delivered over raw transport.
    ErrorInjection,
    /// Alternating large responses and large (>= 1 MiB) request bodies.
    LargePayload,
}

impl ScenarioKind {
    /// Every scenario, in the default execution order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::ConnectionHold,
            Self::RepeatedRequest,
            Self::ScriptedEndpoint,
            Self::ErrorInjection,
            Self::LargePayload,
        ]
    }

    /// Stable name used in results and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::ConnectionHold => "connection_hold",
            Self::RepeatedRequest => "repeated_request",
            Self::ScriptedEndpoint => "scripted_endpoint",
            Self::ErrorInjection => "error_injection",
            Self::LargePayload => "large_payload",
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ScenarioKind {
    type Err = String;

    /// Accepts the canonical names plus short command-line aliases
    /// (`connection`, `request`, `cgi`, `error`, `memory`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connection" | "connection_hold" | "connection-hold" => Ok(Self::ConnectionHold),
            "request" | "repeated" | "repeated_request" | "repeated-request" => {
                Ok(Self::RepeatedRequest)
            }
            "cgi" | "script" | "scripted" | "scripted_endpoint" | "scripted-endpoint" => {
                Ok(Self::ScriptedEndpoint)
            }
            "error" | "errors" | "error_injection" | "error-injection" => Ok(Self::ErrorInjection),
            "memory" | "payload" | "large_payload" | "large-payload" => Ok(Self::LargePayload),
            other => Err(format!("unknown scenario: {other}")),
        }
    }
}
