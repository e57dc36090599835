//! Ports - seams between the queue, the driver and the outside world.
//!
//! - `TaskRunner`: the work the admission queue gates (a compiler run in
//!   production, a gated stub in tests)
//! - `FailurePolicy`: what the build driver does when a unit fails

pub mod failure_policy;
pub mod task_runner;

pub use self::failure_policy::{FailurePolicy, Verdict};
pub use self::task_runner::TaskRunner;
