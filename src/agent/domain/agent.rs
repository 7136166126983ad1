//! Agent aggregate root and its status machine.

use super::{AgentDomainError, AgentId, AgentStatus, CapabilitySet};
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Parameter object for registering an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgent {
    name: String,
    role: String,
    model_provider: Option<String>,
    model_name: Option<String>,
    permissions: CapabilitySet,
    skill_tags: CapabilitySet,
    communication_access: CapabilitySet,
}

impl NewAgent {
    /// Creates a parameter object with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            model_provider: None,
            model_name: None,
            permissions: CapabilitySet::new(),
            skill_tags: CapabilitySet::new(),
            communication_access: CapabilitySet::new(),
        }
    }

    /// Sets the model provider and model name backing the agent.
    #[must_use]
    pub fn with_model(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.model_provider = Some(provider.into());
        self.model_name = Some(model.into());
        self
    }

    /// Sets the permission set.
    #[must_use]
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = String>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// Sets the skill tags.
    #[must_use]
    pub fn with_skill_tags(mut self, skills: impl IntoIterator<Item = String>) -> Self {
        self.skill_tags = skills.into_iter().collect();
        self
    }

    /// Sets which agents this agent may talk to.
    #[must_use]
    pub fn with_communication_access(mut self, access: impl IntoIterator<Item = String>) -> Self {
        self.communication_access = access.into_iter().collect();
        self
    }
}

/// Agent aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    name: String,
    role: String,
    model_provider: String,
    model_name: String,
    status: AgentStatus,
    current_task_id: Option<TaskId>,
    permissions: CapabilitySet,
    skill_tags: CapabilitySet,
    communication_access: CapabilitySet,
    performance_score: f64,
    tasks_completed: u32,
    tasks_failed: u32,
    last_heartbeat: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Agent {
    /// Creates a new `idle` agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError`] when the name or role is blank.
    pub fn new(params: NewAgent, clock: &impl Clock) -> Result<Self, AgentDomainError> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(AgentDomainError::EmptyName);
        }
        let role = params.role.trim();
        if role.is_empty() {
            return Err(AgentDomainError::EmptyRole);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: AgentId::new(),
            name: name.to_owned(),
            role: role.to_owned(),
            model_provider: params.model_provider.unwrap_or_else(|| "z.ai".to_owned()),
            model_name: params.model_name.unwrap_or_else(|| "glm-4-plus".to_owned()),
            status: AgentStatus::Idle,
            current_task_id: None,
            permissions: params.permissions,
            skill_tags: params.skill_tags,
            communication_access: params.communication_access,
            performance_score: 0.0,
            tasks_completed: 0,
            tasks_failed: 0,
            last_heartbeat: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Returns the agent name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the agent role.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the model provider.
    #[must_use]
    pub fn model_provider(&self) -> &str {
        &self.model_provider
    }

    /// Returns the model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the task the agent is working on.
    #[must_use]
    pub const fn current_task_id(&self) -> Option<TaskId> {
        self.current_task_id
    }

    /// Returns the permission set.
    #[must_use]
    pub const fn permissions(&self) -> &CapabilitySet {
        &self.permissions
    }

    /// Returns the skill tags.
    #[must_use]
    pub const fn skill_tags(&self) -> &CapabilitySet {
        &self.skill_tags
    }

    /// Returns the communication access set.
    #[must_use]
    pub const fn communication_access(&self) -> &CapabilitySet {
        &self.communication_access
    }

    /// Returns `completed / (completed + failed)`, or `0.0` before any
    /// outcome was recorded.
    #[must_use]
    pub const fn performance_score(&self) -> f64 {
        self.performance_score
    }

    /// Returns the number of successful tasks.
    #[must_use]
    pub const fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    /// Returns the number of failed tasks.
    #[must_use]
    pub const fn tasks_failed(&self) -> u32 {
        self.tasks_failed
    }

    /// Returns the last heartbeat.
    #[must_use]
    pub const fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        self.last_heartbeat
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

    /// Returns whether the agent can take new work.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.status == AgentStatus::Idle
    }

    /// Returns whether the agent is enabled, whatever its activity.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status != AgentStatus::Disabled
    }

    /// Marks the agent as working on `task_id`.
    pub fn mark_working(&mut self, task_id: TaskId, clock: &impl Clock) {
        self.status = AgentStatus::Working;
        self.current_task_id = Some(task_id);
        self.touch(clock);
    }

    /// Marks the agent as idle and clears its current task.
    pub fn mark_idle(&mut self, clock: &impl Clock) {
        self.status = AgentStatus::Idle;
        self.current_task_id = None;
        self.touch(clock);
    }

    /// Marks the agent as errored.
    pub fn mark_error(&mut self, clock: &impl Clock) {
        self.status = AgentStatus::Error;
        self.touch(clock);
    }

    /// Switches the agent off.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] while the agent is
    /// working; the running task has to finish first.
    pub fn disable(&mut self, clock: &impl Clock) -> Result<(), AgentDomainError> {
        if self.status == AgentStatus::Working {
            return Err(AgentDomainError::InvalidTransition {
                agent_id: self.id,
                status: self.status,
                action: "disable",
            });
        }
        self.status = AgentStatus::Disabled;
        self.current_task_id = None;
        self.touch(clock);
        Ok(())
    }

    /// Switches a disabled agent back on as `idle`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless the agent is
    /// disabled.
    pub fn enable(&mut self, clock: &impl Clock) -> Result<(), AgentDomainError> {
        self.require_status(AgentStatus::Disabled, "enable")?;
        self.mark_idle(clock);
        Ok(())
    }

    /// Clears an error and returns the agent to `idle`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless the agent is in
    /// the error state.
    pub fn recover(&mut self, clock: &impl Clock) -> Result<(), AgentDomainError> {
        self.require_status(AgentStatus::Error, "recover")?;
        self.mark_idle(clock);
        Ok(())
    }

    /// Records a heartbeat.
    pub fn record_heartbeat(&mut self, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.last_heartbeat = Some(timestamp);
        self.updated_at = timestamp;
    }

    /// Counts a task outcome and recomputes the performance score.
    #[expect(
        clippy::float_arithmetic,
        reason = "the performance score is defined as a success ratio"
    )]
    pub fn record_task_completion(&mut self, success: bool, clock: &impl Clock) {
        if success {
            self.tasks_completed = self.tasks_completed.saturating_add(1);
        } else {
            self.tasks_failed = self.tasks_failed.saturating_add(1);
        }
        let completed = f64::from(self.tasks_completed);
        let total = completed + f64::from(self.tasks_failed);
        self.performance_score = if total > 0.0 { completed / total } else { 0.0 };
        self.touch(clock);
    }

    /// Returns whether the agent holds `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.allows(permission)
    }

    /// Returns whether the agent carries the `skill` tag.
    #[must_use]
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skill_tags.allows(skill)
    }

    /// Returns whether the agent may communicate with `other_agent_id`.
    #[must_use]
    pub fn can_communicate_with(&self, other_agent_id: &str) -> bool {
        self.communication_access.allows(other_agent_id)
    }

    fn require_status(
        &self,
        expected: AgentStatus,
        action: &'static str,
    ) -> Result<(), AgentDomainError> {
        if self.status == expected {
            return Ok(());
        }
        Err(AgentDomainError::InvalidTransition {
            agent_id: self.id,
            status: self.status,
            action,
        })
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
