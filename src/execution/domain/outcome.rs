//! Result of one pipeline run.

use std::fmt;
use std::time::Duration;

/// What happened to the task a pipeline run was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The backend succeeded and the task is completed.
    Completed {
        /// Result text stored on the task.
        result: String,
    },
    /// The task was not executed.
    Skipped {
        /// Why the run did nothing, such as `already completed`.
        reason: String,
    },
    /// The backend failed and the retry budget is spent.
    Failed {
        /// Error text stored on the task.
        error: String,
    },
    /// The backend failed; the same task should be enqueued again.
    RetryScheduled {
        /// How long the queue owner should wait before re-enqueueing.
        delay: Duration,
    },
}

impl ExecutionOutcome {
    pub(crate) fn already(status: impl fmt::Display) -> Self {
        Self::Skipped {
            reason: format!("already {status}"),
        }
    }

    /// Returns the re-enqueue delay of a scheduled retry.
    #[must_use]
    pub const fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::RetryScheduled { delay } => Some(*delay),
            _ => None,
        }
    }

    /// Returns whether the run left the task for good, either completed or
    /// failed without retry.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
