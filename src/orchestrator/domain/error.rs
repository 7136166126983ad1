//! Parse errors for orchestrator values.

use thiserror::Error;

/// Error returned while parsing persisted phase names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown orchestrator phase: {0}")]
pub struct ParseOrchestratorPhaseError(pub String);
