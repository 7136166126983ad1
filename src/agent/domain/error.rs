//! Error types for agent domain validation and parsing.

use super::{AgentId, AgentStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning agent values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentDomainError {
    /// The agent name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyName,

    /// The agent role is empty after trimming.
    #[error("agent role must not be empty")]
    EmptyRole,

    /// The requested operation is not valid from the agent's status.
    #[error("cannot {action} agent {agent_id} while {status}")]
    InvalidTransition {
        /// Agent identifier.
        agent_id: AgentId,
        /// Current status.
        status: AgentStatus,
        /// Attempted operation.
        action: &'static str,
    },
}

/// Error returned while parsing agent statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent status: {0}")]
pub struct ParseAgentStatusError(pub String);
