//! Execution backend port.

use crate::execution::domain::ExecutionRequest;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure raised by an execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ExecutionBackendError(pub String);

/// Opaque capability performing a task's work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Executes the task described by `request`.
    ///
    /// The response is structured; its `result` or `content` field holds the
    /// result text when present.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionBackendError`] when the work failed.
    async fn execute(&self, request: ExecutionRequest) -> Result<Value, ExecutionBackendError>;
}
