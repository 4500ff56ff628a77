//! Raw transport capability.
//!
//! A plain TCP connection with timeouts, used where a scenario must
//! violate HTTP rather than speak it: held-open connections, malformed
//! request frames, deliberate aborts. The HTTP client cannot express
//! those, by design.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

/// Errors from raw socket operations.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not resolve address: {0}")]
    Resolve(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One raw TCP connection with symmetric read/write timeouts.
#[derive(Debug)]
pub struct RawConnection {
    stream: TcpStream,
}

impl RawConnection {
    /// Connect to `host:port` within `timeout`; the same bound applies to
    /// every subsequent read and write.
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self, TransportError> {
        let resolved: SocketAddr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| TransportError::Resolve(addr.to_string()))?;
        let stream = TcpStream::connect_timeout(&resolved, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Self { stream })
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(bytes)?;
        Ok(())
    }

    /// Read whatever the server has to say, up to the buffer size.
    /// Returns 0 on orderly close.
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(self.stream.read(buf)?)
    }

    /// Close both directions. Errors on an already-dead socket are moot.
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// Format an HTTP/1.1-shaped request frame.
///
/// No validation on purpose: callers feed this invalid methods, versions,
/// and paths to see how the server copes.
pub fn request_frame(
    method: &str,
    path: &str,
    version: &str,
    host: &str,
    extra_headers: &[(&str, &str)],
) -> Vec<u8> {
    let mut frame = format!("{method} {path} {version}\r\nHost: {host}\r\n");
    for (name, value) in extra_headers {
        frame.push_str(name);
        frame.push_str(": ");
        frame.push_str(value);
        frame.push_str("\r\n");
    }
    frame.push_str("\r\n");
    frame.into_bytes()
}
