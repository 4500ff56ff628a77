//! Shared foundation for the Resource Leak Tester.
//!
//! Holds the pieces every other crate in the workspace leans on: the
//! explicit configuration record, the target-address type, the error
//! taxonomy for the harness boundary, scenario identifiers, and the
//! logging bootstrap.

pub mod config;
pub mod error;
pub mod logging;
pub mod scenario;
pub mod target;

pub use config::{HarnessConfig, LeakThresholds};
pub use error::HarnessError;
pub use logging::{LogConfig, init_logging};
pub use scenario::ScenarioKind;
pub use target::{Target, TargetError};
