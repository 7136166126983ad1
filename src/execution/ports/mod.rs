//! Port contracts for task execution.

pub mod backend;

pub use backend::{ExecutionBackend, ExecutionBackendError};

#[cfg(test)]
pub use backend::MockExecutionBackend;
