//! Port receiving escalations.

use crate::orchestrator::domain::Escalation;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure delivering an escalation.
#[derive(Debug, Clone, Error)]
#[error("escalation delivery failed: {0}")]
pub struct EscalationSinkError(pub Arc<dyn std::error::Error + Send + Sync>);

impl EscalationSinkError {
    /// Wraps a delivery error.
    #[must_use]
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Destination for conditions that need a human.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    /// Delivers one escalation.
    ///
    /// # Errors
    ///
    /// Returns [`EscalationSinkError`] when the report could not be delivered.
    async fn escalate(&self, escalation: Escalation) -> Result<(), EscalationSinkError>;
}
