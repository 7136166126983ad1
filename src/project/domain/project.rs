//! Project aggregate root.

use super::{ParseProjectStatusError, ProjectDomainError, ProjectId};
use crate::orchestrator::domain::OrchestratorPhase;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Project is being decomposed into tasks.
    #[default]
    Planning,
    /// Project work is under way.
    Active,
    /// Project work is on hold.
    Paused,
    /// All project work is accounted for.
    Completed,
    /// Project has been abandoned.
    Cancelled,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = ParseProjectStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseProjectStatusError(value.to_owned())),
        }
    }
}

/// Parameter object for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    name: String,
    description: Option<String>,
    initial_request: Option<String>,
    tech_stack: Vec<String>,
    context_files: Vec<String>,
}

impl NewProject {
    /// Creates a parameter object with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            initial_request: None,
            tech_stack: Vec::new(),
            context_files: Vec::new(),
        }
    }

    /// Sets the project description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the request the project is planned from.
    #[must_use]
    pub fn with_initial_request(mut self, request: impl Into<String>) -> Self {
        self.initial_request = Some(request.into());
        self
    }

    /// Sets the technology stack.
    #[must_use]
    pub fn with_tech_stack(mut self, tech_stack: impl IntoIterator<Item = String>) -> Self {
        self.tech_stack = tech_stack.into_iter().collect();
        self
    }

    /// Sets the context file list.
    #[must_use]
    pub fn with_context_files(mut self, files: impl IntoIterator<Item = String>) -> Self {
        self.context_files = files.into_iter().collect();
        self
    }
}

/// Project aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    description: Option<String>,
    status: ProjectStatus,
    orchestrator_phase: OrchestratorPhase,
    tech_stack: Vec<String>,
    constraints: BTreeMap<String, Value>,
    initial_request: Option<String>,
    context_files: Vec<String>,
    metadata: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project in `planning` status at the `PLAN` phase.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyName`] when the name is blank.
    pub fn new(params: NewProject, clock: &impl Clock) -> Result<Self, ProjectDomainError> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(ProjectDomainError::EmptyName);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: ProjectId::new(),
            name: name.to_owned(),
            description: params.description,
            status: ProjectStatus::Planning,
            orchestrator_phase: OrchestratorPhase::Plan,
            tech_stack: params.tech_stack,
            constraints: BTreeMap::new(),
            initial_request: params.initial_request,
            context_files: params.context_files,
            metadata: BTreeMap::new(),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the project description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the persisted orchestrator phase.
    #[must_use]
    pub const fn orchestrator_phase(&self) -> OrchestratorPhase {
        self.orchestrator_phase
    }

    /// Returns the technology stack.
    #[must_use]
    pub fn tech_stack(&self) -> &[String] {
        &self.tech_stack
    }

    /// Returns the constraint map.
    #[must_use]
    pub const fn constraints(&self) -> &BTreeMap<String, Value> {
        &self.constraints
    }

    /// Returns the request the project is planned from.
    #[must_use]
    pub fn initial_request(&self) -> Option<&str> {
        self.initial_request.as_deref()
    }

    /// Returns the context file list.
    #[must_use]
    pub fn context_files(&self) -> &[String] {
        &self.context_files
    }

    /// Returns the metadata map.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Activates the project.
    pub fn activate(&mut self, clock: &impl Clock) {
        self.status = ProjectStatus::Active;
        self.touch(clock);
    }

    /// Pauses the project.
    pub fn pause(&mut self, clock: &impl Clock) {
        self.status = ProjectStatus::Paused;
        self.touch(clock);
    }

    /// Marks the project as completed.
    pub fn complete(&mut self, clock: &impl Clock) {
        self.status = ProjectStatus::Completed;
        self.touch(clock);
    }

    /// Cancels the project.
    pub fn cancel(&mut self, clock: &impl Clock) {
        self.status = ProjectStatus::Cancelled;
        self.touch(clock);
    }

    /// Records the orchestrator phase the project has moved to.
    pub fn advance_phase(&mut self, next_phase: OrchestratorPhase, clock: &impl Clock) {
        self.orchestrator_phase = next_phase;
        self.touch(clock);
    }

    /// Returns whether the project is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    /// Returns whether the project can still be edited.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(
            self.status,
            ProjectStatus::Planning | ProjectStatus::Active | ProjectStatus::Paused
        )
    }

    /// Adds a technology to the stack if absent.
    pub fn add_tech(&mut self, technology: impl Into<String>, clock: &impl Clock) {
        if push_unique(&mut self.tech_stack, technology.into()) {
            self.touch(clock);
        }
    }

    /// Removes a technology from the stack if present.
    pub fn remove_tech(&mut self, technology: &str, clock: &impl Clock) {
        if remove_value(&mut self.tech_stack, technology) {
            self.touch(clock);
        }
    }

    /// Adds a context file if absent.
    pub fn add_context_file(&mut self, file_path: impl Into<String>, clock: &impl Clock) {
        if push_unique(&mut self.context_files, file_path.into()) {
            self.touch(clock);
        }
    }

    /// Removes a context file if present.
    pub fn remove_context_file(&mut self, file_path: &str, clock: &impl Clock) {
        if remove_value(&mut self.context_files, file_path) {
            self.touch(clock);
        }
    }

    /// Inserts or replaces a constraint.
    pub fn set_constraint(&mut self, key: impl Into<String>, value: Value, clock: &impl Clock) {
        self.constraints.insert(key.into(), value);
        self.touch(clock);
    }

    /// Returns a constraint value.
    #[must_use]
    pub fn get_constraint(&self, key: &str) -> Option<&Value> {
        self.constraints.get(key)
    }

    /// Removes a constraint if present.
    pub fn remove_constraint(&mut self, key: &str, clock: &impl Clock) {
        if self.constraints.remove(key).is_some() {
            self.touch(clock);
        }
    }

    /// Inserts or replaces a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value, clock: &impl Clock) {
        self.metadata.insert(key.into(), value);
        self.touch(clock);
    }

    /// Returns a metadata value.
    #[must_use]
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn push_unique(values: &mut Vec<String>, value: String) -> bool {
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

fn remove_value(values: &mut Vec<String>, value: &str) -> bool {
    let before = values.len();
    values.retain(|existing| existing != value);
    values.len() != before
}
