//! Orchestrator driver errors.

use crate::orchestrator::ports::{EscalationSinkError, TaskDispatchError, TaskPlannerError};
use crate::project::domain::{ProjectId, ProjectStatus};
use crate::store::ports::EntityStoreError;
use crate::task::domain::TaskDomainError;
use thiserror::Error;

/// Errors raised while driving a project through its phases.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The project is paused or cancelled.
    #[error("project {project_id} is {status}")]
    ProjectNotRunnable {
        /// Project that was asked to step.
        project_id: ProjectId,
        /// Its current status.
        status: ProjectStatus,
    },
    /// The planner returned a plan that cannot be stored.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    /// The planner failed.
    #[error(transparent)]
    Planner(#[from] TaskPlannerError),
    /// A planned task failed validation.
    #[error(transparent)]
    Task(#[from] TaskDomainError),
    /// The escalation sink failed.
    #[error(transparent)]
    Escalation(#[from] EscalationSinkError),
    /// The work queue rejected a task.
    #[error(transparent)]
    Dispatch(#[from] TaskDispatchError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
}

impl OrchestratorError {
    /// Returns whether the step lost a guarded commit and can be retried.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(EntityStoreError::Conflict { .. }))
    }
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
