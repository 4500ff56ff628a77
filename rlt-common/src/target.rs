//! Target server address.
//!
//! Parses the base URL the harness points at into the pieces the two
//! transport capabilities need: full URLs for the HTTP client and a
//! host/port pair for raw socket connections.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a target URL.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("missing scheme in target url: {0}")]
    MissingScheme(String),

    #[error("unsupported scheme '{0}': only http targets can be exercised over raw transport")]
    UnsupportedScheme(String),

    #[error("empty host in target url")]
    EmptyHost,

    #[error("invalid port in target url: {0}")]
    InvalidPort(String),
}

/// A parsed `http://host:port` target.
///
/// The path component of the input, if any, is discarded: scenarios always
/// address the server with absolute paths of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Parse a base URL of the form `http://host[:port][/...]`.
    pub fn parse(url: &str) -> Result<Self, TargetError> {
        let rest = match url.split_once("://") {
            Some(("http", rest)) => rest,
            Some((scheme, _)) => return Err(TargetError::UnsupportedScheme(scheme.to_string())),
            None => return Err(TargetError::MissingScheme(url.to_string())),
        };

        // Netloc is everything up to the first slash.
        let netloc = rest.split('/').next().unwrap_or("");
        if netloc.is_empty() {
            return Err(TargetError::EmptyHost);
        }

        let (host, port) = match netloc.split_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| TargetError::InvalidPort(port_str.to_string()))?;
                (host, port)
            }
            None => (netloc, 80),
        };

        if host.is_empty() {
            return Err(TargetError::EmptyHost);
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Full URL for an absolute request path.
    pub fn url_for(&self, path: &str) -> String {
        debug_assert!(path.starts_with('/'), "request paths must be absolute");
        format!("http://{}:{}{}", self.host, self.port, path)
    }

    /// `host:port` string for raw socket address resolution.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_url())
    }
}
