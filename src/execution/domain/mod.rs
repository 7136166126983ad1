//! Domain values for task execution.

mod error;
mod outcome;
mod request;
mod retry;

pub use error::{ExecutionError, ExecutionErrorKind};
pub use outcome::ExecutionOutcome;
pub use request::{ExecutionRequest, extract_result};
pub use retry::{DEFAULT_RETRY_DELAY, RetryPolicy};
