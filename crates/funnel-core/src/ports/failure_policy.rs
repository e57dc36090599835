//! FailurePolicy port - what a failed unit means for the whole build.

use crate::domain::{CompileRequest, FunnelError};

/// Outcome of asking a policy about a failed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Stop the build now.
    Abort,
    /// Record the failure and wait for the remaining units.
    Continue,
}

/// Decides whether a unit failure is fatal.
///
/// Kept out of the queue: the queue always releases the slot and forwards
/// the error, the driver asks the policy what to do next.
pub trait FailurePolicy: Send + Sync {
    fn on_failure(&self, request: &CompileRequest, error: &FunnelError) -> Verdict;
}
