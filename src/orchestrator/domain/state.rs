//! Per-project snapshot recomputed on every `MONITOR` pass.

use super::{Escalation, EscalationReason, OrchestratorPhase};
use crate::agent::domain::{Agent, AgentId, AgentStatus};
use crate::project::domain::ProjectId;
use crate::task::domain::{DependencyGraph, Task, TaskId, TaskStatus};
use std::collections::{BTreeSet, HashMap};

/// Derived orchestrator state for one project.
///
/// The snapshot is never persisted; only the phase survives a restart, on
/// the project record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorState {
    project_id: ProjectId,
    phase: OrchestratorPhase,
    current_task_ids: BTreeSet<TaskId>,
    completed_task_ids: BTreeSet<TaskId>,
    failed_task_ids: BTreeSet<TaskId>,
    pending_tasks: usize,
    active_agent_ids: Vec<AgentId>,
    escalation_reason: Option<EscalationReason>,
    error_message: Option<String>,
    escalated_task_ids: Vec<TaskId>,
}

impl OrchestratorState {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn new(project_id: ProjectId, phase: OrchestratorPhase) -> Self {
        Self {
            project_id,
            phase,
            current_task_ids: BTreeSet::new(),
            completed_task_ids: BTreeSet::new(),
            failed_task_ids: BTreeSet::new(),
            pending_tasks: 0,
            active_agent_ids: Vec::new(),
            escalation_reason: None,
            error_message: None,
            escalated_task_ids: Vec::new(),
        }
    }

    /// Computes the snapshot of a project from its tasks and the agent pool.
    ///
    /// Tasks that are pending, assigned, in progress or blocked all count as
    /// pending work. Escalation signals are checked in order: a dependency
    /// cycle among open tasks, an open task depending on a cancelled or
    /// unknown task, then open work with no enabled agent. The first signal
    /// found sets both the reason and the error message.
    #[must_use]
    pub fn observe(
        project_id: ProjectId,
        phase: OrchestratorPhase,
        tasks: &[Task],
        agents: &[Agent],
    ) -> Self {
        let mut state = Self::new(project_id, phase);
        for task in tasks {
            match task.status() {
                TaskStatus::Assigned | TaskStatus::InProgress => {
                    state.current_task_ids.insert(task.id());
                }
                TaskStatus::Completed => {
                    state.completed_task_ids.insert(task.id());
                }
                TaskStatus::Failed => {
                    state.failed_task_ids.insert(task.id());
                }
                TaskStatus::Pending | TaskStatus::Blocked | TaskStatus::Cancelled => {}
            }
            if task.status().is_open() {
                state.pending_tasks = state.pending_tasks.saturating_add(1);
            }
        }
        state.active_agent_ids = agents
            .iter()
            .filter(|agent| agent.status() == AgentStatus::Working)
            .map(Agent::id)
            .collect();
        state.detect_escalation(tasks, agents);
        state
    }

    fn detect_escalation(&mut self, tasks: &[Task], agents: &[Agent]) {
        let open: Vec<&Task> = tasks.iter().filter(|task| task.status().is_open()).collect();
        if open.is_empty() {
            return;
        }

        if let Some(cycle) = DependencyGraph::from_tasks(open.iter().copied()).find_cycle() {
            let message = format!("dependency cycle among tasks: {}", join_ids(&cycle));
            self.escalate(EscalationReason::DependencyCycle, message, cycle);
            return;
        }

        let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|task| (task.id(), task)).collect();
        let mut stuck: Vec<TaskId> = open
            .iter()
            .filter(|task| {
                task.dependencies().iter().any(|dependency| {
                    by_id
                        .get(dependency)
                        .is_none_or(|found| found.status() == TaskStatus::Cancelled)
                })
            })
            .map(|task| task.id())
            .collect();
        if !stuck.is_empty() {
            stuck.sort();
            let message = format!(
                "tasks depend on cancelled or unknown tasks: {}",
                join_ids(&stuck)
            );
            self.escalate(EscalationReason::UnsatisfiableDependency, message, stuck);
            return;
        }

        if !agents.iter().any(Agent::is_enabled) {
            let message = format!("{} open tasks but no enabled agents", open.len());
            self.escalate(EscalationReason::NoEnabledAgents, message, Vec::new());
        }
    }

    fn escalate(&mut self, reason: EscalationReason, message: String, task_ids: Vec<TaskId>) {
        self.escalation_reason = Some(reason);
        self.error_message = Some(message);
        self.escalated_task_ids = task_ids;
    }

    /// Selects the phase after `MONITOR`.
    ///
    /// Priority is fixed: escalation (error and reason both set), then
    /// reassignment of failed tasks, then completion when nothing is
    /// pending, otherwise another delegation pass.
    #[must_use]
    pub fn route(&self) -> OrchestratorPhase {
        if self.error_message.is_some() && self.escalation_reason.is_some() {
            OrchestratorPhase::Escalate
        } else if !self.failed_task_ids.is_empty() {
            OrchestratorPhase::Reassign
        } else if self.pending_tasks == 0 {
            OrchestratorPhase::Complete
        } else {
            OrchestratorPhase::Delegate
        }
    }

    /// Returns the escalation report, when both reason and message are set.
    #[must_use]
    pub fn escalation(&self) -> Option<Escalation> {
        let reason = self.escalation_reason?;
        let message = self.error_message.clone()?;
        Some(Escalation {
            project_id: self.project_id,
            reason,
            message,
            task_ids: self.escalated_task_ids.clone(),
        })
    }

    /// Sets the pending task count.
    #[must_use]
    pub const fn with_pending_tasks(mut self, pending_tasks: usize) -> Self {
        self.pending_tasks = pending_tasks;
        self
    }

    /// Adds a failed task.
    #[must_use]
    pub fn with_failed_task(mut self, task_id: TaskId) -> Self {
        self.failed_task_ids.insert(task_id);
        self
    }

    /// Sets the error message.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Sets the escalation reason.
    #[must_use]
    pub const fn with_escalation_reason(mut self, reason: EscalationReason) -> Self {
        self.escalation_reason = Some(reason);
        self
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the phase the snapshot was taken in.
    #[must_use]
    pub const fn phase(&self) -> OrchestratorPhase {
        self.phase
    }

    /// Returns tasks currently assigned or in progress.
    #[must_use]
    pub const fn current_task_ids(&self) -> &BTreeSet<TaskId> {
        &self.current_task_ids
    }

    /// Returns completed tasks.
    #[must_use]
    pub const fn completed_task_ids(&self) -> &BTreeSet<TaskId> {
        &self.completed_task_ids
    }

    /// Returns failed tasks.
    #[must_use]
    pub const fn failed_task_ids(&self) -> &BTreeSet<TaskId> {
        &self.failed_task_ids
    }

    /// Returns the number of tasks that still need work.
    #[must_use]
    pub const fn pending_tasks(&self) -> usize {
        self.pending_tasks
    }

    /// Returns agents currently working.
    #[must_use]
    pub fn active_agent_ids(&self) -> &[AgentId] {
        &self.active_agent_ids
    }

    /// Returns the escalation reason.
    #[must_use]
    pub const fn escalation_reason(&self) -> Option<EscalationReason> {
        self.escalation_reason
    }

    /// Returns the error message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
