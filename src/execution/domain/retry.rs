//! Retry scheduling policy.

use super::ExecutionOutcome;
use crate::task::domain::FailureDisposition;
use std::time::Duration;

/// Delay before a failed task is enqueued again.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Fixed-delay retry policy. The attempt cap is each task's `max_retries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Returns the re-enqueue delay.
    #[must_use]
    pub const fn delay(self) -> Duration {
        self.delay
    }

    /// Maps a failed attempt to the outcome reported to the queue owner.
    #[must_use]
    pub fn outcome(self, disposition: FailureDisposition, error: &str) -> ExecutionOutcome {
        match disposition {
            FailureDisposition::Retry => ExecutionOutcome::RetryScheduled { delay: self.delay },
            FailureDisposition::Exhausted => ExecutionOutcome::Failed {
                error: error.to_owned(),
            },
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}
