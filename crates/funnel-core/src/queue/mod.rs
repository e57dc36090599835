//! Queue module: admission bookkeeping and the async gate built on it.
//!
//! Design intent:
//! - `QueueState` owns slot accounting (pending backlog, in-flight count).
//! - `AdmissionQueue` spawns admitted tasks and wires settlement back into
//!   `QueueState`, so a released slot is refilled in the same step.
//! - The runner's result passes through untouched.

mod admission;
mod state;

pub use admission::{AdmissionQueue, DEFAULT_MAX_PARALLEL, Submission};
