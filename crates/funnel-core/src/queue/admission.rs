//! Bounded-concurrency admission queue.

use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::state::QueueState;
use crate::domain::{FunnelError, TaskId, TaskState};
use crate::observability::QueueCounts;
use crate::ports::TaskRunner;

/// Slots used when the caller does not pick a limit.
pub const DEFAULT_MAX_PARALLEL: NonZeroUsize = NonZeroUsize::new(4).unwrap();

type Reply<O> = oneshot::Sender<Result<O, FunnelError>>;

/// A task plus the channel its submitter is listening on.
struct Job<R: TaskRunner> {
    task: R::Task,
    reply: Reply<R::Output>,
}

struct Shared<R: TaskRunner> {
    runner: Arc<R>,
    // Never held across an await.
    state: Mutex<QueueState<Job<R>>>,
}

/// Gates calls to a [`TaskRunner`] so that at most `max_parallel` run at
/// once. Waiting tasks are admitted strictly in submission order.
///
/// Cloning is cheap and every clone shares the same slots.
///
/// Must be used from inside a tokio runtime: admitted tasks are spawned.
pub struct AdmissionQueue<R: TaskRunner> {
    shared: Arc<Shared<R>>,
}

impl<R: TaskRunner> Clone for AdmissionQueue<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: TaskRunner> AdmissionQueue<R> {
    pub fn new(runner: R, max_parallel: NonZeroUsize) -> Self {
        Self::from_shared_runner(Arc::new(runner), max_parallel)
    }

    pub fn from_shared_runner(runner: Arc<R>, max_parallel: NonZeroUsize) -> Self {
        Self {
            shared: Arc::new(Shared {
                runner,
                state: Mutex::new(QueueState::new(max_parallel)),
            }),
        }
    }

    pub fn runner(&self) -> &R {
        &self.shared.runner
    }

    /// Hand a task to the queue.
    ///
    /// Starts it right away when a slot is free, otherwise parks it at the
    /// tail of the backlog. The returned [`Submission`] resolves with the
    /// runner's own result once the task has actually run.
    pub fn submit(&self, task: R::Task) -> Submission<R::Output> {
        let id = TaskId::generate();
        let (reply, rx) = oneshot::channel();

        let (admitted, counts) = {
            let mut state = self.shared.lock();
            let admitted = state.submit(id, Job { task, reply });
            (admitted, state.counts())
        };

        match admitted {
            Some(job) => {
                tracing::debug!(task_id = %id, in_flight = counts.in_flight, "admitted");
                self.shared.start(id, job);
            }
            None => {
                tracing::debug!(task_id = %id, pending = counts.pending, "deferred, all slots busy");
            }
        }

        Submission { id, rx }
    }

    pub fn counts(&self) -> QueueCounts {
        self.shared.lock().counts()
    }

    /// `None` once the task has settled (or was never submitted here).
    pub fn state_of(&self, id: TaskId) -> Option<TaskState> {
        self.shared.lock().state_of(id)
    }
}

impl<R: TaskRunner> Shared<R> {
    fn lock(&self) -> MutexGuard<'_, QueueState<Job<R>>> {
        // Bookkeeping stays consistent even if a holder panicked mid-way:
        // every mutation is a single step.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run an already-admitted job.
    fn start(self: &Arc<Self>, id: TaskId, job: Job<R>) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let Job { task, reply } = job;
            let runner = Arc::clone(&shared.runner);

            // Inner spawn so a panicking runner still reaches on_settled.
            let outcome = match tokio::spawn(async move { runner.run(task).await }).await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(FunnelError::RunnerAborted(join_error.to_string())),
            };

            match &outcome {
                Ok(_) => tracing::debug!(task_id = %id, "settled ok"),
                Err(e) => tracing::debug!(task_id = %id, error = %e, "settled with error"),
            }

            shared.on_settled(id, outcome.is_ok());

            // The submitter may have dropped its Submission; nothing to do then.
            let _ = reply.send(outcome);
        });
    }

    /// Release the slot and, in the same critical section, admit the next
    /// waiting job.
    fn on_settled(self: &Arc<Self>, id: TaskId, succeeded: bool) {
        let next = self.lock().on_settled(id, succeeded);
        if let Some((next_id, job)) = next {
            tracing::debug!(task_id = %next_id, "admitted from backlog");
            self.start(next_id, job);
        }
    }
}

/// Pending result of [`AdmissionQueue::submit`].
///
/// Resolves only when the task's runner settles; sitting in the backlog
/// never resolves it.
#[must_use = "a submission does nothing observable unless awaited"]
pub struct Submission<O> {
    id: TaskId,
    rx: oneshot::Receiver<Result<O, FunnelError>>,
}

impl<O> Submission<O> {
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<O> Future for Submission<O> {
    type Output = Result<O, FunnelError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(outcome) => outcome,
            Err(_) => Err(FunnelError::RunnerAborted("reply channel closed".into())),
        })
    }
}
