//! In-process collaborators for tests and embedded use.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::agent::domain::Agent;
use crate::orchestrator::{
    domain::Escalation,
    ports::{
        AgentMatcher, EscalationSink, EscalationSinkError, PlannedTask, TaskDispatchError,
        TaskDispatcher, TaskPlanner, TaskPlannerError,
    },
};
use crate::project::domain::Project;
use crate::task::domain::{Task, TaskId};

/// Planner returning the same plan for every project.
#[derive(Debug, Clone, Default)]
pub struct StaticTaskPlanner {
    plan: Vec<PlannedTask>,
}

impl StaticTaskPlanner {
    /// Creates a planner that always proposes `plan`.
    #[must_use]
    pub const fn new(plan: Vec<PlannedTask>) -> Self {
        Self { plan }
    }
}

#[async_trait]
impl TaskPlanner for StaticTaskPlanner {
    async fn plan(&self, _project: &Project) -> Result<Vec<PlannedTask>, TaskPlannerError> {
        Ok(self.plan.clone())
    }
}

/// Matcher accepting every agent for every task.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyAgentMatcher;

impl AgentMatcher for AnyAgentMatcher {
    fn matches(&self, _agent: &Agent, _task: &Task) -> bool {
        true
    }
}

/// Escalation sink that keeps every report in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingEscalationSink {
    escalations: Arc<Mutex<Vec<Escalation>>>,
}

impl RecordingEscalationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reports received so far.
    #[must_use]
    pub fn escalations(&self) -> Vec<Escalation> {
        self.escalations
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EscalationSink for RecordingEscalationSink {
    async fn escalate(&self, escalation: Escalation) -> Result<(), EscalationSinkError> {
        let mut guard = self
            .escalations
            .lock()
            .map_err(|err| EscalationSinkError::new(std::io::Error::other(err.to_string())))?;
        guard.push(escalation);
        Ok(())
    }
}

/// Dispatcher that records task identifiers instead of running them.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    dispatched: Arc<Mutex<Vec<TaskId>>>,
}

impl RecordingDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dispatched identifiers in order.
    #[must_use]
    pub fn dispatched(&self) -> Vec<TaskId> {
        self.dispatched
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn dispatch(&self, task_id: TaskId) -> Result<(), TaskDispatchError> {
        let mut guard = self
            .dispatched
            .lock()
            .map_err(|err| TaskDispatchError::Unavailable(err.to_string()))?;
        guard.push(task_id);
        Ok(())
    }
}
