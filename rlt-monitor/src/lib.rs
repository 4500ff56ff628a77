//! Resource monitoring for the Resource Leak Tester.
//!
//! Three layers, leaf first: [`process`] wraps a pid as a capability that
//! snapshots CPU, memory, file-descriptor, thread, and socket metrics;
//! [`sampler`] runs a background sampling loop producing an ordered,
//! append-only series of snapshots; [`analyze`] turns a finished series
//! into per-metric leak verdicts.

pub mod analyze;
pub mod process;
pub mod sampler;

pub use analyze::{LeakAnalysis, LeakVerdict, MetricKind, analyze};
pub use process::{ProcessHandle, Snapshot, UNAVAILABLE};
pub use sampler::{MonitorSession, MonitorState, ResourceMonitor, Sample};
