//! funnel-core
//!
//! Rate-limited Closure Compiler builds.
//!
//! # Modules
//! - **domain**: ids, task state, errors, compile requests, build switches
//! - **ports**: `TaskRunner` and `FailurePolicy` traits
//! - **queue**: `AdmissionQueue`, at most N runner calls at once, FIFO backlog
//! - **compile**: `ClosureRunner` and the staging/flag glue around it
//! - **impls**: stock failure policies
//! - **app**: `BuildDriver`
//! - **observability**: `QueueCounts` snapshots

pub mod app;
pub mod compile;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{BuildDriver, BuildError, BuildReport};
pub use domain::{BuildSwitches, CompileOptions, CompileRequest, FunnelError, RuntimeStamp};
pub use queue::{AdmissionQueue, Submission};
