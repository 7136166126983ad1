//! Port for decomposing a project into tasks.

use crate::project::domain::Project;
use crate::task::domain::TaskPriority;
use async_trait::async_trait;
use thiserror::Error;

/// Planner failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task planning failed: {0}")]
pub struct TaskPlannerError(pub String);

/// One task proposed by a planner.
///
/// Tasks in a plan refer to each other through plan-local keys, since no
/// task identifiers exist before the plan is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    key: String,
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    skill_requirements: Vec<String>,
    depends_on: Vec<String>,
}

impl PlannedTask {
    /// Creates a planned task with a plan-local key and a title.
    #[must_use]
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            skill_requirements: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the required skills.
    #[must_use]
    pub fn with_skill_requirements(mut self, skills: impl IntoIterator<Item = String>) -> Self {
        self.skill_requirements = skills.into_iter().collect();
        self
    }

    /// Sets the keys of the planned tasks this one depends on.
    #[must_use]
    pub fn with_depends_on(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.depends_on = keys.into_iter().collect();
        self
    }

    /// Returns the plan-local key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the required skills.
    #[must_use]
    pub fn skill_requirements(&self) -> &[String] {
        &self.skill_requirements
    }

    /// Returns the dependency keys.
    #[must_use]
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }
}

/// Decomposition strategy consulted by the `PLAN` phase.
#[async_trait]
pub trait TaskPlanner: Send + Sync {
    /// Proposes the tasks for `project`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskPlannerError`] when no plan can be produced.
    async fn plan(&self, project: &Project) -> Result<Vec<PlannedTask>, TaskPlannerError>;
}
