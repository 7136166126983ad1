//! Task execution pipeline.

use crate::agent::domain::{Agent, AgentStatus};
use crate::execution::{
    domain::{ExecutionError, ExecutionOutcome, ExecutionRequest, RetryPolicy, extract_result},
    ports::ExecutionBackend,
};
use crate::store::{
    CommitBatch,
    ports::{EntityStore, EntityStoreError},
};
use crate::task::domain::{FailureDisposition, Task, TaskId};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result type for pipeline runs.
type ExecutionResult<T> = Result<T, ExecutionError>;

/// Runs one task through claim, execution and settlement.
///
/// The claim and the settlement are each one guarded commit covering both
/// the task and its agent. The claim only applies while the task is still at
/// the revision it was loaded with and the agent is still idle, which makes
/// a second concurrent run for the same task lose the race and skip. The
/// settlement only applies while the task is still at the revision the
/// claim wrote, so a run whose claim was expired or cancelled cannot
/// overwrite the work of a later run.
#[derive(Clone)]
pub struct TaskExecutionService<S, B, C>
where
    S: EntityStore,
    B: ExecutionBackend,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    backend: Arc<B>,
    clock: Arc<C>,
    retry_policy: RetryPolicy,
}

impl<S, B, C> TaskExecutionService<S, B, C>
where
    S: EntityStore,
    B: ExecutionBackend,
    C: Clock + Send + Sync,
{
    /// Creates a pipeline with the default retry policy.
    #[must_use]
    pub fn new(store: Arc<S>, backend: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            store,
            backend,
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

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Executes the task identified by `task_id`.
    ///
    /// Tasks that are not `pending` or `assigned` are skipped without calling
    /// the backend. A successful run completes the task; a failed run either
    /// schedules a retry or leaves the task `failed` once its budget is
    /// spent. If the task changed concurrently while the backend ran, the
    /// result is discarded and the run skipped; whoever changed the task
    /// released the agent.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::TaskNotFound`] and
    /// [`ExecutionError::AgentNotFound`] for missing entities,
    /// [`ExecutionError::NoAgentAssigned`] when the task has no agent,
    /// [`ExecutionError::AgentUnavailable`] when the agent is not idle,
    /// [`ExecutionError::Conflict`] when a claim race leaves the task
    /// runnable or its agent changed under a live claim, and
    /// [`ExecutionError::Store`] for store failures.
    #[tracing::instrument(skip_all, fields(task_id = %task_id))]
    pub async fn execute(&self, task_id: TaskId) -> ExecutionResult<ExecutionOutcome> {
        let task = self.load_task(task_id).await?;
        if !task.status().is_executable() {
            debug!(status = %task.status(), "skipping task");
            return Ok(ExecutionOutcome::already(task.status()));
        }
        let agent_id = task
            .assigned_agent_id()
            .ok_or(ExecutionError::NoAgentAssigned { task_id })?;
        let agent = self
            .store
            .find_agent(agent_id)
            .await?
            .ok_or(ExecutionError::AgentNotFound(agent_id))?;
        if !agent.is_idle() {
            if let Some(outcome) = self.claimed_elsewhere(task_id, &agent).await? {
                return Ok(outcome);
            }
            return Err(self.release_unavailable(task, &agent).await);
        }

        let (running, working) = match self.claim(task, agent).await? {
            Claim::Won(running, working) => (running, working),
            Claim::Lost(outcome) => return Ok(outcome),
        };
        info!(agent_id = %working.id(), "task started");

        let request = ExecutionRequest::from_task(&running);
        match self.backend.execute(request).await {
            Ok(response) => {
                let result = extract_result(&response);
                self.settle_success(running, working, result).await
            }
            Err(err) => self.settle_failure(running, working, err.to_string()).await,
        }
    }

    async fn load_task(&self, task_id: TaskId) -> ExecutionResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(ExecutionError::TaskNotFound(task_id))
    }

    /// Returns a skip outcome when the agent is busy because a concurrent
    /// run already claimed this same task.
    async fn claimed_elsewhere(
        &self,
        task_id: TaskId,
        agent: &Agent,
    ) -> ExecutionResult<Option<ExecutionOutcome>> {
        if agent.current_task_id() != Some(task_id) {
            return Ok(None);
        }
        let current = self.load_task(task_id).await?;
        if current.status().is_executable() {
            return Ok(None);
        }
        debug!(status = %current.status(), "task claimed by a concurrent run");
        Ok(Some(ExecutionOutcome::already(current.status())))
    }

    async fn claim(&self, mut task: Task, mut agent: Agent) -> ExecutionResult<Claim> {
        let observed = task.revision();
        task.start(&*self.clock);
        agent.mark_working(task.id(), &*self.clock);
        let batch = CommitBatch::new()
            .update_task_if(task.clone(), observed)
            .update_agent_if(agent.clone(), AgentStatus::Idle);
        match self.store.commit(batch).await {
            Ok(()) => Ok(Claim::Won(task, agent)),
            Err(err) if err.is_conflict() => {
                let current = self.load_task(task.id()).await?;
                if current.status().is_executable() {
                    return Err(ExecutionError::Conflict(err));
                }
                debug!(status = %current.status(), "claim lost to a concurrent run");
                Ok(Claim::Lost(ExecutionOutcome::already(current.status())))
            }
            Err(err) => Err(ExecutionError::Store(err)),
        }
    }

    async fn settle_success(
        &self,
        mut task: Task,
        mut agent: Agent,
        result: String,
    ) -> ExecutionResult<ExecutionOutcome> {
        let claimed = task.revision();
        task.complete(Some(result.clone()), &*self.clock);
        agent.mark_idle(&*self.clock);
        agent.record_task_completion(true, &*self.clock);
        if let Some(outcome) = self.settle(task, claimed, agent).await? {
            return Ok(outcome);
        }
        info!("task completed");
        Ok(ExecutionOutcome::Completed { result })
    }

    async fn settle_failure(
        &self,
        mut task: Task,
        mut agent: Agent,
        error: String,
    ) -> ExecutionResult<ExecutionOutcome> {
        let claimed = task.revision();
        let disposition = task.record_failed_attempt(error.clone(), &*self.clock);
        agent.mark_idle(&*self.clock);
        agent.record_task_completion(false, &*self.clock);
        let retry_count = task.retry_count();
        if let Some(outcome) = self.settle(task, claimed, agent).await? {
            return Ok(outcome);
        }
        match disposition {
            FailureDisposition::Retry => warn!(retry_count, %error, "task failed, retry scheduled"),
            FailureDisposition::Exhausted => warn!(retry_count, %error, "task failed for good"),
        }
        Ok(self.retry_policy.outcome(disposition, &error))
    }

    /// Commits the settled task and agent, guarded on the claimed revision.
    ///
    /// Returns a skip outcome when the task moved on while the backend ran.
    async fn settle(
        &self,
        task: Task,
        claimed: u64,
        agent: Agent,
    ) -> ExecutionResult<Option<ExecutionOutcome>> {
        let task_id = task.id();
        let batch = CommitBatch::new()
            .update_task_if(task, claimed)
            .update_agent_if(agent, AgentStatus::Working);
        match self.store.commit(batch).await {
            Ok(()) => Ok(None),
            Err(err) if err.is_conflict() => {
                self.discard_settlement(task_id, claimed, err).await.map(Some)
            }
            Err(err) => Err(ExecutionError::Store(err)),
        }
    }

    async fn discard_settlement(
        &self,
        task_id: TaskId,
        claimed: u64,
        conflict: EntityStoreError,
    ) -> ExecutionResult<ExecutionOutcome> {
        let current = self.load_task(task_id).await?;
        if current.revision() == claimed {
            return Err(ExecutionError::Conflict(conflict));
        }
        warn!(status = %current.status(), "task changed during execution, result discarded");
        Ok(ExecutionOutcome::already(current.status()))
    }

    async fn release_unavailable(&self, mut task: Task, agent: &Agent) -> ExecutionError {
        let unavailable = ExecutionError::AgentUnavailable {
            task_id: task.id(),
            agent_id: agent.id(),
            status: agent.status(),
        };
        let observed = task.revision();
        task.unassign(&*self.clock);
        let released = self
            .store
            .commit(CommitBatch::new().update_task_if(task, observed))
            .await;
        match released {
            Ok(()) => warn!(
                agent_id = %agent.id(),
                status = %agent.status(),
                "agent unavailable, task released"
            ),
            Err(err) => warn!(%err, "failed to release task of unavailable agent"),
        }
        unavailable
    }
}

enum Claim {
    Won(Task, Agent),
    Lost(ExecutionOutcome),
}
