//! Service layer for task creation, cancellation and dependency edits.

use crate::agent::domain::{Agent, AgentStatus};
use crate::project::domain::ProjectId;
use crate::store::{
    CommitBatch,
    ports::{EntityStore, EntityStoreError},
};
use crate::task::domain::{DependencyGraph, NewTask, Task, TaskDomainError, TaskId, TaskStatus};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The owning project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The owning project is completed or cancelled.
    #[error("project {0} no longer accepts task changes")]
    ProjectNotEditable(ProjectId),
    /// A dependency names a task that does not exist.
    #[error("task {task_id} depends on unknown task {dependency_id}")]
    UnknownDependency {
        /// Dependent task.
        task_id: TaskId,
        /// Missing dependency.
        dependency_id: TaskId,
    },
    /// A dependency names a task of another project.
    #[error("task {task_id} cannot depend on {dependency_id} from another project")]
    ForeignDependency {
        /// Dependent task.
        task_id: TaskId,
        /// Dependency in another project.
        dependency_id: TaskId,
    },
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle service.
///
/// Every update is committed with a guard on the revision the task had when
/// it was loaded, so a concurrent edit or pipeline transition surfaces as
/// [`EntityStoreError::Conflict`] instead of being overwritten.
#[derive(Clone)]
pub struct TaskLifecycleService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> TaskLifecycleService<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a `pending` task in an editable project.
    ///
    /// Every dependency must be a task of the same project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when validation fails, the project is
    /// missing or finished, a dependency is unknown or foreign, or
    /// persistence fails.
    pub async fn create_task(&self, params: NewTask) -> TaskLifecycleResult<Task> {
        let task = Task::new(params, &*self.clock)?;
        let project_id = task.project_id();
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or(TaskLifecycleError::ProjectNotFound(project_id))?;
        if !project.is_editable() {
            return Err(TaskLifecycleError::ProjectNotEditable(project_id));
        }
        for dependency_id in task.dependencies() {
            self.load_dependency(&task, *dependency_id).await?;
        }
        self.store
            .commit(CommitBatch::new().insert_task(task.clone()))
            .await?;
        Ok(task)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when the lookup fails.
    pub async fn find_by_id(&self, id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.store.find_task(id).await?)
    }

    /// Cancels a task that has not reached a terminal state.
    ///
    /// A run already executing the task is not interrupted, but its agent is
    /// released in the same commit; the run's final commit conflicts with
    /// the cancellation and is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyTerminal`] for completed or
    /// cancelled tasks.
    pub async fn cancel(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        let mut task = self.load(id).await?;
        if task.is_terminal() {
            return Err(TaskDomainError::AlreadyTerminal {
                task_id: id,
                status: task.status(),
            }
            .into());
        }
        let observed = task.revision();
        let released = self.release_running_agent(&task).await?;
        task.cancel(&*self.clock);
        let mut batch = CommitBatch::new().update_task_if(task.clone(), observed);
        if let Some(agent) = released {
            batch = batch.update_agent_if(agent, AgentStatus::Working);
        }
        self.store.commit(batch).await?;
        Ok(task)
    }

    /// Reports progress on a task. Values outside `0..=100` are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks.
    pub async fn set_progress(&self, id: TaskId, percent: i32) -> TaskLifecycleResult<Task> {
        let mut task = self.load(id).await?;
        let observed = task.revision();
        task.set_progress(percent, &*self.clock);
        self.store
            .commit(CommitBatch::new().update_task_if(task.clone(), observed))
            .await?;
        Ok(task)
    }

    /// Makes `task_id` depend on `dependency_id`.
    ///
    /// The commit also checks that no task reachable from `dependency_id`
    /// changed since the cycle check read it, so two concurrent inserts
    /// cannot close a cycle between them.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DependencyCycle`] when the edge would close
    /// a cycle (self-dependency included), and
    /// [`TaskLifecycleError::UnknownDependency`] or
    /// [`TaskLifecycleError::ForeignDependency`] for invalid targets.
    pub async fn add_dependency(
        &self,
        task_id: TaskId,
        dependency_id: TaskId,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.load(task_id).await?;
        if task.is_blocking(dependency_id) {
            return Ok(task);
        }
        self.load_dependency(&task, dependency_id).await?;

        let siblings = self.store.list_project_tasks(task.project_id()).await?;
        let graph = DependencyGraph::from_tasks(&siblings);
        if graph.would_create_cycle(task_id, dependency_id) {
            return Err(TaskDomainError::DependencyCycle {
                task_id,
                dependency_id,
            }
            .into());
        }

        let observed = task.revision();
        task.add_dependency(dependency_id, &*self.clock);
        let reachable: HashSet<TaskId> = graph.reachable_from(dependency_id).into_iter().collect();
        let batch = siblings
            .iter()
            .filter(|sibling| sibling.id() != task_id && reachable.contains(&sibling.id()))
            .fold(
                CommitBatch::new().update_task_if(task.clone(), observed),
                CommitBatch::check_task,
            );
        self.store.commit(batch).await?;
        Ok(task)
    }

    /// Removes a dependency. Unknown dependencies are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks.
    pub async fn remove_dependency(
        &self,
        task_id: TaskId,
        dependency_id: TaskId,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.load(task_id).await?;
        if !task.is_blocking(dependency_id) {
            return Ok(task);
        }
        let observed = task.revision();
        task.remove_dependency(dependency_id, &*self.clock);
        self.store
            .commit(CommitBatch::new().update_task_if(task.clone(), observed))
            .await?;
        Ok(task)
    }

    /// Returns the agent of an `in_progress` task, marked idle, when it is
    /// still working on that task.
    async fn release_running_agent(&self, task: &Task) -> TaskLifecycleResult<Option<Agent>> {
        if task.status() != TaskStatus::InProgress {
            return Ok(None);
        }
        let Some(agent_id) = task.assigned_agent_id() else {
            return Ok(None);
        };
        let agent = self.store.find_agent(agent_id).await?.filter(|agent| {
            agent.status() == AgentStatus::Working && agent.current_task_id() == Some(task.id())
        });
        Ok(agent.map(|mut agent| {
            agent.mark_idle(&*self.clock);
            agent
        }))
    }

    async fn load(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        self.store
            .find_task(id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(id))
    }

    async fn load_dependency(&self, task: &Task, dependency_id: TaskId) -> TaskLifecycleResult<()> {
        let dependency = self.store.find_task(dependency_id).await?.ok_or(
            TaskLifecycleError::UnknownDependency {
                task_id: task.id(),
                dependency_id,
            },
        )?;
        if dependency.project_id() != task.project_id() {
            return Err(TaskLifecycleError::ForeignDependency {
                task_id: task.id(),
                dependency_id,
            });
        }
        Ok(())
    }
}
