//! Store port for projects, tasks and agents.

use crate::agent::domain::{Agent, AgentId};
use crate::project::domain::{Project, ProjectId};
use crate::store::{CommitBatch, EntityRef};
use crate::task::domain::{Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for entity store operations.
pub type EntityStoreResult<T> = Result<T, EntityStoreError>;

/// Entity persistence contract.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Finds a project by identifier.
    ///
    /// Returns `None` when the project does not exist.
    async fn find_project(&self, id: ProjectId) -> EntityStoreResult<Option<Project>>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> EntityStoreResult<Option<Task>>;

    /// Finds an agent by identifier.
    ///
    /// Returns `None` when the agent does not exist.
    async fn find_agent(&self, id: AgentId) -> EntityStoreResult<Option<Agent>>;

    /// Returns every task of a project in insertion order.
    async fn list_project_tasks(&self, project_id: ProjectId) -> EntityStoreResult<Vec<Task>>;

    /// Returns every registered agent in insertion order.
    async fn list_agents(&self) -> EntityStoreResult<Vec<Agent>>;

    /// Returns every task with the given status, across projects.
    async fn list_tasks_with_status(&self, status: TaskStatus) -> EntityStoreResult<Vec<Task>>;

    /// Applies every write of `batch` or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`EntityStoreError::NotFound`] when an update targets a missing
    /// entity or a task insert names a missing project,
    /// [`EntityStoreError::Duplicate`] when an insert reuses an identifier,
    /// and [`EntityStoreError::Conflict`] when a revision or status guard
    /// fails.
    async fn commit(&self, batch: CommitBatch) -> EntityStoreResult<()>;
}

/// Errors returned by entity store implementations.
#[derive(Debug, Clone, Error)]
pub enum EntityStoreError {
    /// The entity was not found.
    #[error("{0} not found")]
    NotFound(EntityRef),

    /// An entity with the same identifier already exists.
    #[error("duplicate {0}")]
    Duplicate(EntityRef),

    /// A revision or status guard did not hold at commit time.
    #[error("{entity} changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        /// Entity whose guard failed.
        entity: EntityRef,
        /// State the write expected.
        expected: String,
        /// State found in the store.
        actual: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EntityStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether the error is a failed revision or status guard.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
