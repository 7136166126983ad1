//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The timeout lies outside the supported range.
    #[error("invalid task timeout {0} minutes, expected 1..=1440")]
    InvalidTimeout(u32),

    /// The retry limit lies outside the supported range.
    #[error("invalid max retries {0}, expected 0..=10")]
    InvalidMaxRetries(u32),

    /// The retry budget is exhausted.
    #[error("task {task_id} has exhausted its {max_retries} retries")]
    RetriesExhausted {
        /// Task identifier.
        task_id: TaskId,
        /// Configured retry limit.
        max_retries: u32,
    },

    /// The task has already reached a terminal state.
    #[error("task {task_id} is already {status}")]
    AlreadyTerminal {
        /// Task identifier.
        task_id: TaskId,
        /// Current terminal status.
        status: TaskStatus,
    },

    /// Adding the dependency would make the dependency graph cyclic.
    #[error("dependency from {task_id} on {dependency_id} would create a cycle")]
    DependencyCycle {
        /// Dependent task.
        task_id: TaskId,
        /// Dependency that closes the cycle.
        dependency_id: TaskId,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);
