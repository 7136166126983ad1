//! Errors surfaced by the execution pipeline.

use crate::agent::domain::{AgentId, AgentStatus};
use crate::store::ports::EntityStoreError;
use crate::task::domain::TaskId;
use thiserror::Error;

/// Classification of [`ExecutionError`] for queue owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionErrorKind {
    /// A task or agent is absent. Never retried.
    NotFound,
    /// The task was not in a runnable shape. Signals an upstream bug.
    Precondition,
    /// A concurrent change won a commit race. Reload and re-evaluate.
    Conflict,
    /// The store failed.
    Store,
}

/// Errors returned by the execution pipeline.
///
/// Backend failures are not errors here; they become
/// [`super::ExecutionOutcome::RetryScheduled`] or
/// [`super::ExecutionOutcome::Failed`].
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The assigned agent does not exist.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The task has no agent assigned.
    #[error("No agent assigned")]
    NoAgentAssigned {
        /// Task that was dispatched without an agent.
        task_id: TaskId,
    },

    /// The assigned agent cannot take work; the task was released.
    #[error("agent {agent_id} is {status} and cannot run task {task_id}")]
    AgentUnavailable {
        /// Task that was released.
        task_id: TaskId,
        /// Assigned agent.
        agent_id: AgentId,
        /// Agent status at claim time.
        status: AgentStatus,
    },

    /// A guarded commit lost a race and the task is still runnable.
    #[error("concurrent update: {0}")]
    Conflict(EntityStoreError),

    /// Store operation failed.
    #[error(transparent)]
    Store(EntityStoreError),
}

impl ExecutionError {
    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ExecutionErrorKind {
        match self {
            Self::TaskNotFound(_) | Self::AgentNotFound(_) => ExecutionErrorKind::NotFound,
            Self::NoAgentAssigned { .. } | Self::AgentUnavailable { .. } => {
                ExecutionErrorKind::Precondition
            }
            Self::Conflict(_) => ExecutionErrorKind::Conflict,
            Self::Store(_) => ExecutionErrorKind::Store,
        }
    }
}

impl From<EntityStoreError> for ExecutionError {
    fn from(err: EntityStoreError) -> Self {
        if err.is_conflict() {
            Self::Conflict(err)
        } else {
            Self::Store(err)
        }
    }
}
