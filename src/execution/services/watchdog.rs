//! Timeout watchdog for tasks stuck in progress.

use crate::agent::domain::AgentStatus;
use crate::execution::domain::{ExecutionError, ExecutionOutcome, RetryPolicy};
use crate::store::{CommitBatch, ports::EntityStore};
use crate::task::domain::{Task, TaskId, TaskStatus};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fails `in_progress` tasks that ran past their timeout.
///
/// Expired tasks go through the same retry accounting as a backend failure,
/// and the agent working on them is released.
#[derive(Clone)]
pub struct TaskWatchdog<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    retry_policy: RetryPolicy,
}

impl<S, C> TaskWatchdog<S, C>
where
    S: EntityStore,
    C: Clock + Send + Sync,
{
    /// Creates a watchdog with the default retry policy.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Checks every running task once.
    ///
    /// Returns the outcome applied to each expired task. A task that settled
    /// or was claimed again concurrently is left out.
    ///
    /// A `RetryScheduled` task is back in `pending` with its agent kept, and
    /// the delegate phase leaves such tasks alone. The caller owns the retry:
    /// it should submit the returned ids to a dispatcher once the delay has
    /// passed, or rely on the next orchestrator run, which dispatches pending
    /// tasks that still hold an agent when it resumes.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Store`] when the store fails.
    pub async fn sweep(&self) -> Result<Vec<(TaskId, ExecutionOutcome)>, ExecutionError> {
        let running = self
            .store
            .list_tasks_with_status(TaskStatus::InProgress)
            .await?;
        let mut outcomes = Vec::new();
        for task in running {
            if !task.is_expired(&*self.clock) {
                continue;
            }
            let task_id = task.id();
            if let Some(outcome) = self.expire(task).await? {
                outcomes.push((task_id, outcome));
            }
        }
        Ok(outcomes)
    }

    async fn expire(&self, mut task: Task) -> Result<Option<ExecutionOutcome>, ExecutionError> {
        let task_id = task.id();
        let observed = task.revision();
        let error = format!("task timed out after {} minutes", task.timeout().minutes());
        let disposition = task.record_failed_attempt(error.clone(), &*self.clock);

        let assigned = match task.assigned_agent_id() {
            Some(agent_id) => self.store.find_agent(agent_id).await?,
            None => None,
        };
        let mut batch = CommitBatch::new();
        if let Some(mut agent) = assigned.filter(|agent| {
            agent.status() == AgentStatus::Working && agent.current_task_id() == Some(task_id)
        }) {
            agent.mark_idle(&*self.clock);
            agent.record_task_completion(false, &*self.clock);
            batch = batch.update_agent_if(agent, AgentStatus::Working);
        }
        batch = batch.update_task_if(task, observed);

        match self.store.commit(batch).await {
            Ok(()) => {
                warn!(task_id = %task_id, %error, "task expired");
                Ok(Some(self.retry_policy.outcome(disposition, &error)))
            }
            Err(err) if err.is_conflict() => {
                debug!(task_id = %task_id, "task settled before expiry was recorded");
                Ok(None)
            }
            Err(err) => Err(ExecutionError::Store(err)),
        }
    }
}
