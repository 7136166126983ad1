//! In-memory entity store for tests and single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::agent::domain::{Agent, AgentId, AgentStatus};
use crate::project::domain::{Project, ProjectId, ProjectStatus};
use crate::store::{
    CommitBatch, EntityRef, EntityWrite,
    ports::{EntityStore, EntityStoreError, EntityStoreResult},
};
use crate::task::domain::{Task, TaskId, TaskStatus};

/// Thread-safe in-memory entity store.
///
/// A commit validates every write under the write lock before applying any
/// of them in place.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
    agents: HashMap<AgentId, Agent>,
    task_order: Vec<TaskId>,
    project_tasks: HashMap<ProjectId, Vec<TaskId>>,
    agent_order: Vec<AgentId>,
}

impl InMemoryEntityStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> EntityStoreError {
    EntityStoreError::persistence(std::io::Error::other(err.to_string()))
}

fn conflict(entity: EntityRef, expected: impl ToString, actual: impl ToString) -> EntityStoreError {
    EntityStoreError::Conflict {
        entity,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// State a batch leaves behind for the entities it touched so far.
///
/// Validation walks the batch in order against this overlay and the current
/// state, so a later guard sees what an earlier write in the same batch did.
#[derive(Default)]
struct StagedView {
    projects: HashMap<ProjectId, ProjectStatus>,
    tasks: HashMap<TaskId, u64>,
    agents: HashMap<AgentId, AgentStatus>,
}

impl InMemoryStoreState {
    fn project_status(&self, staged: &StagedView, id: ProjectId) -> Option<ProjectStatus> {
        staged
            .projects
            .get(&id)
            .copied()
            .or_else(|| self.projects.get(&id).map(Project::status))
    }

    fn task_revision(&self, staged: &StagedView, id: TaskId) -> Option<u64> {
        staged
            .tasks
            .get(&id)
            .copied()
            .or_else(|| self.tasks.get(&id).map(Task::revision))
    }

    fn agent_status(&self, staged: &StagedView, id: AgentId) -> Option<AgentStatus> {
        staged
            .agents
            .get(&id)
            .copied()
            .or_else(|| self.agents.get(&id).map(Agent::status))
    }

    fn check_task_revision(
        &self,
        staged: &StagedView,
        id: TaskId,
        expected: Option<u64>,
    ) -> EntityStoreResult<()> {
        let actual = self
            .task_revision(staged, id)
            .ok_or(EntityStoreError::NotFound(EntityRef::Task(id)))?;
        match expected {
            Some(revision) if revision != actual => Err(conflict(
                EntityRef::Task(id),
                format!("revision {revision}"),
                format!("revision {actual}"),
            )),
            _ => Ok(()),
        }
    }

    /// Checks every write of a batch without changing anything.
    fn validate(&self, writes: &[EntityWrite]) -> EntityStoreResult<()> {
        let mut staged = StagedView::default();
        for write in writes {
            match write {
                EntityWrite::InsertProject(project) => {
                    let id = project.id();
                    if self.project_status(&staged, id).is_some() {
                        return Err(EntityStoreError::Duplicate(EntityRef::Project(id)));
                    }
                    staged.projects.insert(id, project.status());
                }
                EntityWrite::UpdateProject {
                    project,
                    expected_status,
                } => {
                    let id = project.id();
                    let actual = self
                        .project_status(&staged, id)
                        .ok_or(EntityStoreError::NotFound(EntityRef::Project(id)))?;
                    let stale = expected_status.filter(|status| *status != actual);
                    if let Some(expected) = stale {
                        return Err(conflict(EntityRef::Project(id), expected, actual));
                    }
                    staged.projects.insert(id, project.status());
                }
                EntityWrite::InsertTask(task) => {
                    let id = task.id();
                    if self.task_revision(&staged, id).is_some() {
                        return Err(EntityStoreError::Duplicate(EntityRef::Task(id)));
                    }
                    let project_id = task.project_id();
                    if self.project_status(&staged, project_id).is_none() {
                        return Err(EntityStoreError::NotFound(EntityRef::Project(project_id)));
                    }
                    staged.tasks.insert(id, task.revision());
                }
                EntityWrite::UpdateTask {
                    task,
                    expected_revision,
                } => {
                    self.check_task_revision(&staged, task.id(), *expected_revision)?;
                    staged.tasks.insert(task.id(), task.revision());
                }
                EntityWrite::CheckTask { task_id, revision } => {
                    self.check_task_revision(&staged, *task_id, Some(*revision))?;
                }
                EntityWrite::InsertAgent(agent) => {
                    let id = agent.id();
                    if self.agent_status(&staged, id).is_some() {
                        return Err(EntityStoreError::Duplicate(EntityRef::Agent(id)));
                    }
                    staged.agents.insert(id, agent.status());
                }
                EntityWrite::UpdateAgent {
                    agent,
                    expected_status,
                } => {
                    let id = agent.id();
                    let actual = self
                        .agent_status(&staged, id)
                        .ok_or(EntityStoreError::NotFound(EntityRef::Agent(id)))?;
                    let stale = expected_status.filter(|status| *status != actual);
                    if let Some(expected) = stale {
                        return Err(conflict(EntityRef::Agent(id), expected, actual));
                    }
                    staged.agents.insert(id, agent.status());
                }
            }
        }
        Ok(())
    }

    /// Applies one write that already passed [`Self::validate`].
    fn apply(&mut self, write: EntityWrite) {
        match write {
            EntityWrite::InsertProject(project) | EntityWrite::UpdateProject { project, .. } => {
                self.projects.insert(project.id(), project);
            }
            EntityWrite::InsertTask(task) => {
                let id = task.id();
                self.task_order.push(id);
                self.project_tasks
                    .entry(task.project_id())
                    .or_default()
                    .push(id);
                self.tasks.insert(id, task);
            }
            EntityWrite::UpdateTask { task, .. } => {
                self.tasks.insert(task.id(), task);
            }
            EntityWrite::CheckTask { .. } => {}
            EntityWrite::InsertAgent(agent) => {
                self.agent_order.push(agent.id());
                self.agents.insert(agent.id(), agent);
            }
            EntityWrite::UpdateAgent { agent, .. } => {
                self.agents.insert(agent.id(), agent);
            }
        }
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_project(&self, id: ProjectId) -> EntityStoreResult<Option<Project>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.projects.get(&id).cloned())
    }

    async fn find_task(&self, id: TaskId) -> EntityStoreResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_agent(&self, id: AgentId) -> EntityStoreResult<Option<Agent>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.agents.get(&id).cloned())
    }

    async fn list_project_tasks(&self, project_id: ProjectId) -> EntityStoreResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let tasks = state
            .project_tasks
            .get(&project_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(tasks)
    }

    async fn list_agents(&self) -> EntityStoreResult<Vec<Agent>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .agent_order
            .iter()
            .filter_map(|id| state.agents.get(id).cloned())
            .collect())
    }

    async fn list_tasks_with_status(&self, status: TaskStatus) -> EntityStoreResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .task_order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|task| task.status() == status)
            .cloned()
            .collect())
    }

    async fn commit(&self, batch: CommitBatch) -> EntityStoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write().map_err(lock_error)?;
        let writes = batch.into_writes();
        state.validate(&writes)?;
        for write in writes {
            state.apply(write);
        }
        Ok(())
    }
}
