//! Conditions the control loop cannot resolve on its own.

use crate::project::domain::ProjectId;
use crate::task::domain::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a project was escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// Open tasks depend on each other in a cycle.
    DependencyCycle,
    /// An open task depends on a cancelled or unknown task.
    UnsatisfiableDependency,
    /// Open tasks remain but every agent is disabled or none exist.
    NoEnabledAgents,
}

impl EscalationReason {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DependencyCycle => "dependency_cycle",
            Self::UnsatisfiableDependency => "unsatisfiable_dependency",
            Self::NoEnabledAgents => "no_enabled_agents",
        }
    }
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-actionable report handed to an escalation sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    /// Project the report concerns.
    pub project_id: ProjectId,
    /// Classified cause.
    pub reason: EscalationReason,
    /// Readable description.
    pub message: String,
    /// Tasks involved, sorted.
    pub task_ids: Vec<TaskId>,
}
