//! Task state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle of one submitted task.
///
/// State transitions:
/// - Pending -> Running -> Succeeded
/// - Pending -> Running -> Failed
/// - (Pending is skipped when a slot is free at submit time)
///
/// A task never moves backwards and never reaches a terminal state without
/// having been Running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting for a free slot.
    Pending,

    /// Admitted; the runner is executing it.
    Running,

    /// Runner resolved.
    Succeeded,

    /// Runner failed (or panicked).
    Failed,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Whether `self -> next` is a legal step.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Running)
                | (TaskState::Running, TaskState::Succeeded)
                | (TaskState::Running, TaskState::Failed)
        )
    }
}
