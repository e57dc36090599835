//! Stock failure policies.

use crate::domain::{CompileRequest, FunnelError};
use crate::ports::{FailurePolicy, Verdict};

/// Any unit failure aborts the build.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFirstFailure;

impl FailurePolicy for AbortOnFirstFailure {
    fn on_failure(&self, request: &CompileRequest, error: &FunnelError) -> Verdict {
        tracing::error!(entry = %request.entry_module, error = %error, "compilation error");
        Verdict::Abort
    }
}

/// Failures are logged and collected; the build runs to the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepGoing;

impl FailurePolicy for KeepGoing {
    fn on_failure(&self, request: &CompileRequest, error: &FunnelError) -> Verdict {
        tracing::warn!(entry = %request.entry_module, error = %error, "compilation error, continuing");
        Verdict::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> (CompileRequest, FunnelError) {
        (
            CompileRequest::new("./src/amp.js", "dist", "v0.js"),
            FunnelError::Other("boom".into()),
        )
    }

    #[test]
    fn abort_policy_aborts() {
        let (req, err) = failure();
        assert_eq!(AbortOnFirstFailure.on_failure(&req, &err), Verdict::Abort);
    }

    #[test]
    fn keep_going_continues() {
        let (req, err) = failure();
        assert_eq!(KeepGoing.on_failure(&req, &err), Verdict::Continue);
    }
}
