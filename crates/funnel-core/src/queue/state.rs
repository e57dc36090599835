//! Admission bookkeeping, free of any async machinery.
//!
//! `QueueState` only counts slots and orders waiting jobs. Starting a job is
//! the caller's business: every method that admits something hands the job
//! back, already counted as in flight.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

use crate::domain::{TaskId, TaskState};
use crate::observability::QueueCounts;

pub(crate) struct QueueState<J> {
    max_parallel: usize,

    /// Waiting jobs, arrival order.
    pending: VecDeque<(TaskId, J)>,

    /// Jobs admitted and not yet settled.
    in_flight: usize,

    /// State of every task that has not settled yet.
    live: HashMap<TaskId, TaskState>,

    submitted: u64,
    succeeded: u64,
    failed: u64,
}

impl<J> QueueState<J> {
    pub(crate) fn new(max_parallel: NonZeroUsize) -> Self {
        Self {
            max_parallel: max_parallel.get(),
            pending: VecDeque::new(),
            in_flight: 0,
            live: HashMap::new(),
            submitted: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    fn has_free_slot(&self) -> bool {
        self.in_flight < self.max_parallel
    }

    /// Register a new job. `Some(job)` means it was admitted and must be
    /// started now; `None` means it was appended to `pending`.
    pub(crate) fn submit(&mut self, id: TaskId, job: J) -> Option<J> {
        self.submitted += 1;
        // A free slot with a non-empty backlog cannot happen (the backlog is
        // drained on every release); checking both keeps arrival order anyway.
        if self.has_free_slot() && self.pending.is_empty() {
            self.in_flight += 1;
            self.live.insert(id, TaskState::Running);
            Some(job)
        } else {
            self.live.insert(id, TaskState::Pending);
            self.pending.push_back((id, job));
            None
        }
    }

    /// Release the slot held by `id`, then admit the head of the backlog.
    pub(crate) fn on_settled(&mut self, id: TaskId, succeeded: bool) -> Option<(TaskId, J)> {
        let terminal = if succeeded {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        };
        debug_assert!(self.in_flight > 0, "{id} settled with nothing in flight");
        match self.live.remove(&id) {
            Some(state) => debug_assert!(state.can_transition_to(terminal), "{id}: {state:?} -> {terminal:?}"),
            None => debug_assert!(false, "{id} settled but was not live"),
        }

        self.in_flight = self.in_flight.saturating_sub(1);
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }

        self.try_admit_next()
    }

    /// Move the head of `pending` to running if a slot is free.
    pub(crate) fn try_admit_next(&mut self) -> Option<(TaskId, J)> {
        if !self.has_free_slot() {
            return None;
        }
        let (id, job) = self.pending.pop_front()?;
        self.in_flight += 1;
        if let Some(state) = self.live.get_mut(&id) {
            debug_assert!(state.can_transition_to(TaskState::Running));
            *state = TaskState::Running;
        }
        Some((id, job))
    }

    pub(crate) fn state_of(&self, id: TaskId) -> Option<TaskState> {
        self.live.get(&id).copied()
    }

    pub(crate) fn counts(&self) -> QueueCounts {
        QueueCounts {
            pending: self.pending.len(),
            in_flight: self.in_flight,
            max_parallel: self.max_parallel,
            submitted: self.submitted,
            succeeded: self.succeeded,
            failed: self.failed,
        }
    }
}
