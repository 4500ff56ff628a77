//! Load generation for the Resource Leak Tester.
//!
//! Two narrow transport capabilities ([`http::HttpClient`] for well-formed
//! load, [`transport::RawConnection`] for protocol-violation tests), a
//! [`coordinator`] that partitions a fixed amount of work across a fixed
//! number of OS-thread workers, and the five [`scenarios`] that compose
//! them into `LoadResult`s.

pub mod coordinator;
pub mod http;
pub mod scenarios;
pub mod stats;
pub mod transport;

pub use coordinator::{BatchOutcome, IterationOutcome, partition, run_batch};
pub use http::{HttpClient, HttpError, HttpResponse};
pub use scenarios::{LoadResult, run_scenario};
pub use transport::{RawConnection, TransportError};
