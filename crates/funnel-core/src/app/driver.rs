//! BuildDriver - one admission-queue submission per compilation unit.

use serde::Serialize;
use tokio::task::JoinSet;

use crate::compile::{ClosureRunner, CompilerConfig};
use crate::domain::{BuildId, BuildSwitches, CompileRequest, FunnelError, RuntimeStamp};
use crate::observability::QueueCounts;
use crate::ports::{FailurePolicy, TaskRunner, Verdict};
use crate::queue::AdmissionQueue;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Raised before anything is queued.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("compilation of {entry} failed: {source}")]
    Compilation {
        entry: String,
        #[source]
        source: FunnelError,
    },

    #[error("build interrupted: {0}")]
    Interrupted(String),
}

/// A unit that failed under a policy that kept going.
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub entry_module: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BuildReport<O> {
    pub build_id: BuildId,
    pub compiled: Vec<O>,
    pub failures: Vec<UnitFailure>,
    pub counts: QueueCounts,
}

impl<O> BuildReport<O> {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Submits compile requests through an [`AdmissionQueue`] and applies a
/// [`FailurePolicy`] as results come in.
pub struct BuildDriver<R: TaskRunner<Task = CompileRequest>> {
    queue: AdmissionQueue<R>,
    switches: BuildSwitches,
    stamp: RuntimeStamp,
}

impl BuildDriver<ClosureRunner> {
    /// Driver backed by the real compiler.
    pub fn closure(config: CompilerConfig, switches: BuildSwitches, stamp: RuntimeStamp) -> Self {
        let max_parallel = config.max_parallel;
        let runner = ClosureRunner::new(config, switches, stamp.clone());
        Self::new(AdmissionQueue::new(runner, max_parallel), switches, stamp)
    }
}

impl<R: TaskRunner<Task = CompileRequest>> BuildDriver<R> {
    pub fn new(queue: AdmissionQueue<R>, switches: BuildSwitches, stamp: RuntimeStamp) -> Self {
        Self {
            queue,
            switches,
            stamp,
        }
    }

    pub fn queue(&self) -> &AdmissionQueue<R> {
        &self.queue
    }

    /// A release build must not carry a development token.
    pub fn check_preconditions(&self) -> Result<(), BuildError> {
        if self.switches.production && self.stamp.is_development() {
            return Err(BuildError::Configuration(
                "should compile with a prod token".to_string(),
            ));
        }
        Ok(())
    }

    /// Compile every request.
    ///
    /// All requests are submitted up front; the queue decides when each one
    /// runs. Results are handled in completion order. When the policy says
    /// `Abort`, this returns right away; units already running are not
    /// cancelled.
    pub async fn run(
        &self,
        requests: Vec<CompileRequest>,
        policy: &dyn FailurePolicy,
    ) -> Result<BuildReport<R::Output>, BuildError> {
        self.check_preconditions()?;

        let build_id = BuildId::generate();
        let total = requests.len();
        tracing::info!(
            build_id = %build_id,
            units = total,
            max_parallel = self.queue.counts().max_parallel,
            "build started"
        );

        let mut settled = JoinSet::new();
        for request in requests {
            let submission = self.queue.submit(request.clone());
            settled.spawn(async move { (request, submission.await) });
        }

        let mut compiled = Vec::with_capacity(total);
        let mut failures = Vec::new();
        while let Some(joined) = settled.join_next().await {
            let (request, outcome) = joined.map_err(|e| BuildError::Interrupted(e.to_string()))?;
            match outcome {
                Ok(unit) => compiled.push(unit),
                Err(error) => match policy.on_failure(&request, &error) {
                    Verdict::Abort => {
                        return Err(BuildError::Compilation {
                            entry: request.entry_module,
                            source: error,
                        });
                    }
                    Verdict::Continue => failures.push(UnitFailure {
                        entry_module: request.entry_module,
                        error: error.to_string(),
                    }),
                },
            }
            tracing::debug!(
                build_id = %build_id,
                done = compiled.len() + failures.len(),
                total,
                "unit settled"
            );
        }

        let counts = self.queue.counts();
        tracing::info!(
            build_id = %build_id,
            compiled = compiled.len(),
            failed = failures.len(),
            "build finished"
        );
        Ok(BuildReport {
            build_id,
            compiled,
            failures,
            counts,
        })
    }
}
