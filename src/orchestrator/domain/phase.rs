//! Orchestrator phases and the static edges between them.

use super::{OrchestratorState, ParseOrchestratorPhaseError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the control loop for one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestratorPhase {
    /// Decompose the project into tasks.
    #[default]
    Plan,
    /// Assign ready tasks to idle agents.
    Delegate,
    /// Recompute state from the store and route.
    Monitor,
    /// Surface a condition that needs a human.
    Escalate,
    /// Release failed tasks for another assignment.
    Reassign,
    /// Finalise the project.
    Complete,
}

impl OrchestratorPhase {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "PLAN",
            Self::Delegate => "DELEGATE",
            Self::Monitor => "MONITOR",
            Self::Escalate => "ESCALATE",
            Self::Reassign => "REASSIGN",
            Self::Complete => "COMPLETE",
        }
    }

    /// Returns whether the control loop halts in this phase.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns the phase that follows this one.
    ///
    /// Only `MONITOR` consults `state`; every other edge is fixed. `COMPLETE`
    /// has no successor.
    #[must_use]
    pub fn next(self, state: &OrchestratorState) -> Option<Self> {
        match self {
            Self::Plan | Self::Reassign => Some(Self::Delegate),
            Self::Delegate | Self::Escalate => Some(Self::Monitor),
            Self::Monitor => Some(state.route()),
            Self::Complete => None,
        }
    }
}

impl fmt::Display for OrchestratorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OrchestratorPhase {
    type Error = ParseOrchestratorPhaseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "PLAN" => Ok(Self::Plan),
            "DELEGATE" => Ok(Self::Delegate),
            "MONITOR" => Ok(Self::Monitor),
            "ESCALATE" => Ok(Self::Escalate),
            "REASSIGN" => Ok(Self::Reassign),
            "COMPLETE" => Ok(Self::Complete),
            _ => Err(ParseOrchestratorPhaseError(value.to_owned())),
        }
    }
}
