//! Impls - stock implementations of the ports.
//!
//! - **AbortOnFirstFailure**: fatal-on-first-failure, the default
//! - **KeepGoing**: compile everything, report failures at the end
//!
//! The production `TaskRunner` lives in `compile` next to the rest of the
//! compiler glue.

pub mod failure_policy;

pub use self::failure_policy::{AbortOnFirstFailure, KeepGoing};
