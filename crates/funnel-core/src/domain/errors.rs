//! Errors - runner and queue level failures.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Operational classification of a failure.
///
/// - Compilation: the compiler rejected the input (bad source, type errors)
/// - Configuration: the build was set up wrong (token, paths, flags)
/// - Infrastructure: filesystem or process trouble around the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Compilation,
    Configuration,
    Infrastructure,
}

/// Failure reported by a task runner.
///
/// The admission queue forwards these to the submitter unchanged.
#[derive(Debug, Error)]
pub enum FunnelError {
    #[error("compilation of {entry} failed: {message}")]
    Compilation { entry: String, message: String },

    #[error("{entry} did not finish within {after:?}")]
    Timeout { entry: String, after: Duration },

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The runner panicked or was torn down before replying.
    #[error("runner aborted: {0}")]
    RunnerAborted(String),

    #[error("{0}")]
    Other(String),
}

impl FunnelError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FunnelError::Compilation { .. } => ErrorKind::Compilation,
            FunnelError::Other(_) => ErrorKind::Configuration,
            FunnelError::Timeout { .. } | FunnelError::Io { .. } | FunnelError::RunnerAborted(_) => {
                ErrorKind::Infrastructure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = FunnelError::io(
            "build/cc/_src_amp.js",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("build/cc/_src_amp.js"));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn compilation_error_is_classified() {
        let err = FunnelError::Compilation {
            entry: "./src/amp.js".into(),
            message: "ERROR - missing semicolon".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Compilation);
        assert!(err.to_string().contains("./src/amp.js"));
    }
}
