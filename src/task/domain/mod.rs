//! Domain model for task lifecycle management.
//!
//! The task domain models the task status machine, priorities, retry
//! accounting and the dependency graph while keeping all infrastructure
//! concerns outside of the domain boundary.

mod dependency;
mod error;
mod ids;
mod status;
mod task;

pub use dependency::DependencyGraph;
pub use error::{ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use status::{TaskPriority, TaskStatus};
pub use task::{
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MINUTES, FailureDisposition, MAX_RETRY_LIMIT,
    MAX_TIMEOUT_MINUTES, NewTask, Task, TaskTimeout,
};
