//! Atomic write batches.

use crate::agent::domain::{Agent, AgentId, AgentStatus};
use crate::project::domain::{Project, ProjectId, ProjectStatus};
use crate::task::domain::{Task, TaskId};
use std::fmt;

/// Reference to a stored entity, used in store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// A project.
    Project(ProjectId),
    /// A task.
    Task(TaskId),
    /// An agent.
    Agent(AgentId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project {id}"),
            Self::Task(id) => write!(f, "task {id}"),
            Self::Agent(id) => write!(f, "agent {id}"),
        }
    }
}

/// One write inside a [`CommitBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum EntityWrite {
    /// Stores a new project.
    InsertProject(Project),
    /// Replaces an existing project.
    UpdateProject {
        /// New project state.
        project: Project,
        /// Status the stored project must still have for the write to apply.
        expected_status: Option<ProjectStatus>,
    },
    /// Stores a new task. Its project must exist.
    InsertTask(Task),
    /// Replaces an existing task.
    UpdateTask {
        /// New task state.
        task: Task,
        /// Revision the stored task must still have for the write to apply.
        expected_revision: Option<u64>,
    },
    /// Writes nothing, but fails the batch unless the stored task is still at
    /// `revision`.
    CheckTask {
        /// Task to check.
        task_id: TaskId,
        /// Revision the stored task must have.
        revision: u64,
    },
    /// Stores a new agent.
    InsertAgent(Agent),
    /// Replaces an existing agent.
    UpdateAgent {
        /// New agent state.
        agent: Agent,
        /// Status the stored agent must still have for the write to apply.
        expected_status: Option<AgentStatus>,
    },
}

/// Ordered set of writes committed all-or-nothing.
///
/// Writes are applied in insertion order, so a later write to the same
/// entity sees the state left by an earlier one, guards included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitBatch {
    writes: Vec<EntityWrite>,
}

impl CommitBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project insert.
    #[must_use]
    pub fn insert_project(mut self, project: Project) -> Self {
        self.writes.push(EntityWrite::InsertProject(project));
        self
    }

    /// Adds an unconditional project update.
    #[must_use]
    pub fn update_project(mut self, project: Project) -> Self {
        self.writes.push(EntityWrite::UpdateProject {
            project,
            expected_status: None,
        });
        self
    }

    /// Adds a project update that applies only while the stored project
    /// still has `expected` status.
    #[must_use]
    pub fn update_project_if(mut self, project: Project, expected: ProjectStatus) -> Self {
        self.writes.push(EntityWrite::UpdateProject {
            project,
            expected_status: Some(expected),
        });
        self
    }

    /// Adds a task insert.
    #[must_use]
    pub fn insert_task(mut self, task: Task) -> Self {
        self.writes.push(EntityWrite::InsertTask(task));
        self
    }

    /// Adds an unconditional task update.
    #[must_use]
    pub fn update_task(mut self, task: Task) -> Self {
        self.writes.push(EntityWrite::UpdateTask {
            task,
            expected_revision: None,
        });
        self
    }

    /// Adds a task update that applies only while the stored task is still
    /// at revision `expected`, the revision the caller loaded.
    #[must_use]
    pub fn update_task_if(mut self, task: Task, expected: u64) -> Self {
        self.writes.push(EntityWrite::UpdateTask {
            task,
            expected_revision: Some(expected),
        });
        self
    }

    /// Adds a guard that the stored copy of `task` has not changed since it
    /// was loaded.
    #[must_use]
    pub fn check_task(mut self, task: &Task) -> Self {
        self.writes.push(EntityWrite::CheckTask {
            task_id: task.id(),
            revision: task.revision(),
        });
        self
    }

    /// Adds an agent insert.
    #[must_use]
    pub fn insert_agent(mut self, agent: Agent) -> Self {
        self.writes.push(EntityWrite::InsertAgent(agent));
        self
    }

    /// Adds an unconditional agent update.
    #[must_use]
    pub fn update_agent(mut self, agent: Agent) -> Self {
        self.writes.push(EntityWrite::UpdateAgent {
            agent,
            expected_status: None,
        });
        self
    }

    /// Adds an agent update that applies only while the stored agent still
    /// has `expected` status.
    #[must_use]
    pub fn update_agent_if(mut self, agent: Agent, expected: AgentStatus) -> Self {
        self.writes.push(EntityWrite::UpdateAgent {
            agent,
            expected_status: Some(expected),
        });
        self
    }

    /// Consumes the batch and returns its writes.
    #[must_use]
    pub fn into_writes(self) -> Vec<EntityWrite> {
        self.writes
    }

    /// Returns the number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns whether the batch holds no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
