//! Service layer for project creation and status changes.

use crate::project::domain::{NewProject, Project, ProjectDomainError, ProjectId, ProjectStatus};
use crate::store::{
    CommitBatch,
    ports::{EntityStore, EntityStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for project operations.
#[derive(Debug, Error)]
pub enum ProjectServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ProjectDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    NotFound(ProjectId),
    /// The project is completed or cancelled.
    #[error("project {project_id} is {status} and can no longer change")]
    NotEditable {
        /// Project that rejected the change.
        project_id: ProjectId,
        /// Its current status.
        status: ProjectStatus,
    },
}

/// Result type for project service operations.
pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project lifecycle service.
#[derive(Clone)]
pub struct ProjectService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> ProjectService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    /// Creates a new project service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates and stores a project in `planning` status.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Domain`] when the name is blank or
    /// [`ProjectServiceError::Store`] when persistence fails.
    pub async fn create(&self, params: NewProject) -> ProjectServiceResult<Project> {
        let project = Project::new(params, &*self.clock)?;
        self.store
            .commit(CommitBatch::new().insert_project(project.clone()))
            .await?;
        Ok(project)
    }

    /// Retrieves a project by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Store`] when the lookup fails.
    pub async fn find_by_id(&self, id: ProjectId) -> ProjectServiceResult<Option<Project>> {
        Ok(self.store.find_project(id).await?)
    }

    /// Activates a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] for unknown projects and
    /// [`ProjectServiceError::NotEditable`] for finished ones.
    pub async fn activate(&self, id: ProjectId) -> ProjectServiceResult<Project> {
        self.transition(id, |project, clock| project.activate(clock))
            .await
    }

    /// Pauses a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] for unknown projects and
    /// [`ProjectServiceError::NotEditable`] for finished ones.
    pub async fn pause(&self, id: ProjectId) -> ProjectServiceResult<Project> {
        self.transition(id, |project, clock| project.pause(clock)).await
    }

    /// Cancels a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] for unknown projects and
    /// [`ProjectServiceError::NotEditable`] for finished ones.
    pub async fn cancel(&self, id: ProjectId) -> ProjectServiceResult<Project> {
        self.transition(id, |project, clock| project.cancel(clock)).await
    }

    async fn transition(
        &self,
        id: ProjectId,
        apply: impl FnOnce(&mut Project, &C) + Send,
    ) -> ProjectServiceResult<Project> {
        let mut project = self
            .store
            .find_project(id)
            .await?
            .ok_or(ProjectServiceError::NotFound(id))?;
        if !project.is_editable() {
            return Err(ProjectServiceError::NotEditable {
                project_id: id,
                status: project.status(),
            });
        }
        apply(&mut project, &*self.clock);
        self.store
            .commit(CommitBatch::new().update_project(project.clone()))
            .await?;
        Ok(project)
    }
}
