//! Task aggregate root and its status machine.

use super::{TaskDomainError, TaskId, TaskPriority, TaskStatus};
use crate::agent::domain::AgentId;
use crate::project::domain::ProjectId;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default execution timeout in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u32 = 30;

/// Default retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Longest allowed execution timeout in minutes.
pub const MAX_TIMEOUT_MINUTES: u32 = 1440;

/// Largest allowed retry budget.
pub const MAX_RETRY_LIMIT: u32 = 10;

/// Validated execution timeout, between one minute and one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTimeout(u32);

impl TaskTimeout {
    /// Creates a validated timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTimeout`] when the value is zero or
    /// exceeds 1440 minutes.
    pub const fn from_minutes(minutes: u32) -> Result<Self, TaskDomainError> {
        if minutes == 0 || minutes > MAX_TIMEOUT_MINUTES {
            return Err(TaskDomainError::InvalidTimeout(minutes));
        }
        Ok(Self(minutes))
    }

    /// Returns the timeout in minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.0
    }

    fn as_time_delta(self) -> TimeDelta {
        TimeDelta::try_minutes(i64::from(self.0)).unwrap_or(TimeDelta::MAX)
    }
}

impl Default for TaskTimeout {
    fn default() -> Self {
        Self(DEFAULT_TIMEOUT_MINUTES)
    }
}

/// What the caller should do after an execution attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// The task went back to `pending` and should be rescheduled.
    Retry,
    /// The retry budget is spent; the task stays `failed`.
    Exhausted,
}

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    project_id: ProjectId,
    title: String,
    description: Option<String>,
    parent_task_id: Option<TaskId>,
    dependencies: Vec<TaskId>,
    priority: TaskPriority,
    timeout_minutes: u32,
    max_retries: u32,
    skill_requirements: Vec<String>,
    complexity: Option<String>,
    metadata: BTreeMap<String, Value>,
}

impl NewTask {
    /// Creates a parameter object with the required fields.
    #[must_use]
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: None,
            parent_task_id: None,
            dependencies: Vec::new(),
            priority: TaskPriority::default(),
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            max_retries: DEFAULT_MAX_RETRIES,
            skill_requirements: Vec::new(),
            complexity: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the parent task.
    #[must_use]
    pub const fn with_parent(mut self, parent_task_id: TaskId) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }

    /// Sets the initial dependency list.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the execution timeout in minutes.
    #[must_use]
    pub const fn with_timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = minutes;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the skills an agent needs to take the task.
    #[must_use]
    pub fn with_skill_requirements(mut self, skills: impl IntoIterator<Item = String>) -> Self {
        self.skill_requirements = skills.into_iter().collect();
        self
    }

    /// Sets the complexity label.
    #[must_use]
    pub fn with_complexity(mut self, complexity: impl Into<String>) -> Self {
        self.complexity = Some(complexity.into());
        self
    }

    /// Sets the metadata map passed to the execution backend as context.
    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Task aggregate root.
///
/// Every mutation goes through a transition method; each one refreshes
/// `updated_at` from the supplied clock and advances the revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    parent_task_id: Option<TaskId>,
    title: String,
    description: Option<String>,
    dependencies: Vec<TaskId>,
    assigned_agent_id: Option<AgentId>,
    status: TaskStatus,
    priority: TaskPriority,
    progress_percent: u8,
    timeout: TaskTimeout,
    max_retries: u32,
    retry_count: u32,
    result: Option<String>,
    error_message: Option<String>,
    skill_requirements: Vec<String>,
    complexity: String,
    metadata: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    revision: u64,
}

impl Task {
    /// Creates a new `pending` task.
    ///
    /// Self-references in the initial dependency list are dropped, as are
    /// duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the title is blank or the timeout or
    /// retry limit is out of range.
    pub fn new(params: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = params.title.trim();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if params.max_retries > MAX_RETRY_LIMIT {
            return Err(TaskDomainError::InvalidMaxRetries(params.max_retries));
        }
        let timeout = TaskTimeout::from_minutes(params.timeout_minutes)?;
        let timestamp = clock.utc();
        let id = TaskId::new();

        let mut dependencies: Vec<TaskId> = Vec::with_capacity(params.dependencies.len());
        for dependency in params.dependencies {
            if dependency != id && !dependencies.contains(&dependency) {
                dependencies.push(dependency);
            }
        }

        Ok(Self {
            id,
            project_id: params.project_id,
            parent_task_id: params.parent_task_id,
            title: title.to_owned(),
            description: params.description,
            dependencies,
            assigned_agent_id: None,
            status: TaskStatus::Pending,
            priority: params.priority,
            progress_percent: 0,
            timeout,
            max_retries: params.max_retries,
            retry_count: 0,
            result: None,
            error_message: None,
            skill_requirements: params.skill_requirements,
            complexity: params.complexity.unwrap_or_else(|| "medium".to_owned()),
            metadata: params.metadata,
            created_at: timestamp,
            updated_at: timestamp,
            started_at: None,
            completed_at: None,
            revision: 0,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the parent task, if any.
    #[must_use]
    pub const fn parent_task_id(&self) -> Option<TaskId> {
        self.parent_task_id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the tasks this task depends on.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    /// Returns the assigned agent, if any.
    #[must_use]
    pub const fn assigned_agent_id(&self) -> Option<AgentId> {
        self.assigned_agent_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the progress percentage, always within `0..=100`.
    #[must_use]
    pub const fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// Returns the execution timeout.
    #[must_use]
    pub const fn timeout(&self) -> TaskTimeout {
        self.timeout
    }

    /// Returns the retry budget.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the number of failed attempts counted against the budget.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the result text of a completed task.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Returns the last recorded error.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the skills an agent needs to take the task.
    #[must_use]
    pub fn skill_requirements(&self) -> &[String] {
        &self.skill_requirements
    }

    /// Returns the complexity label.
    #[must_use]
    pub fn complexity(&self) -> &str {
        &self.complexity
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

    /// Returns when execution last started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the revision, advanced by every mutation.
    ///
    /// Guarded store updates compare it to detect concurrent writers.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns whether the task is a subtask of another task.
    #[must_use]
    pub const fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }

    /// Returns whether the task can never change state again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Assigns the task to an agent.
    ///
    /// Callers must not assign a task that is already `in_progress`.
    pub fn assign(&mut self, agent_id: AgentId, clock: &impl Clock) {
        self.assigned_agent_id = Some(agent_id);
        self.status = TaskStatus::Assigned;
        self.touch(clock);
    }

    /// Clears the agent assignment and returns the task to `pending`.
    pub fn unassign(&mut self, clock: &impl Clock) {
        self.assigned_agent_id = None;
        self.status = TaskStatus::Pending;
        self.touch(clock);
    }

    /// Marks the task as started.
    pub fn start(&mut self, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.status = TaskStatus::InProgress;
        self.started_at = Some(timestamp);
        self.updated_at = timestamp;
        self.revision = self.revision.saturating_add(1);
    }

    /// Marks the task as completed, storing `result` when given.
    pub fn complete(&mut self, result: Option<String>, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.status = TaskStatus::Completed;
        self.completed_at = Some(timestamp);
        self.progress_percent = 100;
        if let Some(text) = result {
            self.result = Some(text);
        }
        self.updated_at = timestamp;
        self.revision = self.revision.saturating_add(1);
    }

    /// Marks the task as failed. The retry counter is left untouched.
    pub fn fail(&mut self, error_message: impl Into<String>, clock: &impl Clock) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(error_message.into());
        self.touch(clock);
    }

    /// Cancels the task.
    pub fn cancel(&mut self, clock: &impl Clock) {
        self.status = TaskStatus::Cancelled;
        self.touch(clock);
    }

    /// Marks the task as blocked on its dependencies.
    pub fn block(&mut self, clock: &impl Clock) {
        self.status = TaskStatus::Blocked;
        self.touch(clock);
    }

    /// Unblocks the task and returns it to `pending`.
    pub fn unblock(&mut self, clock: &impl Clock) {
        self.status = TaskStatus::Pending;
        self.touch(clock);
    }

    /// Returns whether another attempt is allowed.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Counts one retry and returns the task to `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::RetriesExhausted`] when `retry_count` has
    /// already reached `max_retries`; the task is left unchanged.
    pub fn increment_retry(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if !self.can_retry() {
            return Err(TaskDomainError::RetriesExhausted {
                task_id: self.id,
                max_retries: self.max_retries,
            });
        }
        self.retry_count += 1;
        self.status = TaskStatus::Pending;
        self.touch(clock);
        Ok(())
    }

    /// Applies the outcome of a failed execution attempt.
    ///
    /// The task is marked `failed` with `error_message`. When the attempt
    /// leaves budget for another one, the retry is counted and the task goes
    /// back to `pending` with its agent assignment kept. Otherwise
    /// `retry_count` is pinned at `max_retries` and the task stays `failed`.
    pub fn record_failed_attempt(
        &mut self,
        error_message: impl Into<String>,
        clock: &impl Clock,
    ) -> FailureDisposition {
        self.fail(error_message, clock);
        if self.retry_count.saturating_add(1) < self.max_retries
            && self.increment_retry(clock).is_ok()
        {
            return FailureDisposition::Retry;
        }
        self.retry_count = self.max_retries;
        FailureDisposition::Exhausted
    }

    /// Sets the progress percentage, clamped into `0..=100`.
    pub fn set_progress(&mut self, percent: i32, clock: &impl Clock) {
        let clamped = percent.clamp(0, 100);
        self.progress_percent = u8::try_from(clamped).unwrap_or(100);
        self.touch(clock);
    }

    /// Inserts or replaces a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value, clock: &impl Clock) {
        self.metadata.insert(key.into(), value);
        self.touch(clock);
    }

    /// Adds a dependency. Self-references and duplicates are ignored.
    pub fn add_dependency(&mut self, task_id: TaskId, clock: &impl Clock) {
        if task_id == self.id || self.dependencies.contains(&task_id) {
            return;
        }
        self.dependencies.push(task_id);
        self.touch(clock);
    }

    /// Removes a dependency if present.
    pub fn remove_dependency(&mut self, task_id: TaskId, clock: &impl Clock) {
        let before = self.dependencies.len();
        self.dependencies.retain(|id| *id != task_id);
        if self.dependencies.len() != before {
            self.touch(clock);
        }
    }

    /// Returns whether `other_task_id` is in this task's dependency list.
    #[must_use]
    pub fn is_blocking(&self, other_task_id: TaskId) -> bool {
        self.dependencies.contains(&other_task_id)
    }

    /// Returns whether the task started and has run past its timeout.
    #[must_use]
    pub fn is_expired(&self, clock: &impl Clock) -> bool {
        self.started_at.is_some_and(|started| {
            clock.utc().signed_duration_since(started) > self.timeout.as_time_delta()
        })
    }

    /// Updates the `updated_at` timestamp and advances the revision.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.revision = self.revision.saturating_add(1);
    }
}
