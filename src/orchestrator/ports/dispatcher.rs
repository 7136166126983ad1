//! Port handing assigned tasks to the work queue.

use crate::task::domain::TaskId;
use async_trait::async_trait;
use thiserror::Error;

/// Failure enqueueing a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskDispatchError {
    /// The queue no longer accepts work.
    #[error("work queue is closed")]
    Closed,
    /// The queue could not record the task.
    #[error("work queue unavailable: {0}")]
    Unavailable(String),
}

/// Work queue fed by the `DELEGATE` phase.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Enqueues `task_id` for execution.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDispatchError::Closed`] once the queue shut down, or
    /// [`TaskDispatchError::Unavailable`] when it cannot accept the task.
    async fn dispatch(&self, task_id: TaskId) -> Result<(), TaskDispatchError>;
}
