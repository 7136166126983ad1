//! Bounded worker pool feeding the task execution pipeline.
//!
//! Workers share one bounded queue of task identifiers. Every run is
//! reported on a broadcast channel, and runs that schedule a retry are put
//! back on the queue once their delay has passed.

use crate::execution::{
    domain::{ExecutionError, ExecutionOutcome},
    ports::ExecutionBackend,
    services::TaskExecutionService,
};
use crate::orchestrator::ports::{TaskDispatchError, TaskDispatcher};
use crate::store::ports::EntityStore;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one pipeline run, as broadcast to subscribers.
pub type WorkerReport = (TaskId, Result<ExecutionOutcome, ExecutionError>);

const REPORT_CAPACITY: usize = 256;

/// Sizing of a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of concurrent workers.
    pub worker_count: usize,
    /// Capacity of the task queue; submitters wait while it is full.
    pub queue_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 256,
        }
    }
}

/// Cloneable handle for submitting work to a pool.
#[derive(Clone)]
pub struct WorkerPoolHandle {
    queue: mpsc::Sender<TaskId>,
    reports: broadcast::Sender<WorkerReport>,
    cancel: CancellationToken,
}

impl WorkerPoolHandle {
    /// Enqueues `task_id`, waiting for room when the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDispatchError::Closed`] once the pool is shut down.
    pub async fn submit(&self, task_id: TaskId) -> Result<(), TaskDispatchError> {
        if self.cancel.is_cancelled() {
            return Err(TaskDispatchError::Closed);
        }
        self.queue
            .send(task_id)
            .await
            .map_err(|_| TaskDispatchError::Closed)
    }

    /// Subscribes to run reports. Reports sent before subscribing are not
    /// replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerReport> {
        self.reports.subscribe()
    }

    /// Stops the workers and drops pending retries. A run already inside
    /// the pipeline finishes first.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Returns whether shutdown was requested.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn report(&self, report: WorkerReport) {
        if self.reports.send(report).is_err() {
            debug!("run report dropped, no subscribers");
        }
    }

    fn schedule_retry(&self, task_id: TaskId, delay: Duration) {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = handle.cancel.cancelled() => {
                    debug!(task_id = %task_id, "retry dropped on shutdown");
                }
                () = tokio::time::sleep(delay) => {
                    if let Err(err) = handle.submit(task_id).await {
                        warn!(task_id = %task_id, error = %err, "retry could not be enqueued");
                    }
                }
            }
        });
    }
}

#[async_trait]
impl TaskDispatcher for WorkerPoolHandle {
    async fn dispatch(&self, task_id: TaskId) -> Result<(), TaskDispatchError> {
        self.submit(task_id).await
    }
}

/// Running worker pool.
pub struct WorkerPool {
    handle: WorkerPoolHandle,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `config.worker_count` workers (at least one) on the current
    /// tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn spawn<S, B, C>(
        pipeline: Arc<TaskExecutionService<S, B, C>>,
        config: WorkerPoolConfig,
    ) -> Self
    where
        S: EntityStore + 'static,
        B: ExecutionBackend + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (queue, queue_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (reports, _) = broadcast::channel(REPORT_CAPACITY);
        let handle = WorkerPoolHandle {
            queue,
            reports,
            cancel: CancellationToken::new(),
        };
        let receiver = Arc::new(Mutex::new(queue_rx));
        let worker_count = config.worker_count.max(1);
        let workers = (0..worker_count)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&pipeline),
                    Arc::clone(&receiver),
                    handle.clone(),
                ))
            })
            .collect();
        info!(worker_count, queue_capacity = config.queue_capacity, "worker pool started");
        Self { handle, workers }
    }

    /// Returns a handle for submitting work.
    #[must_use]
    pub fn handle(&self) -> WorkerPoolHandle {
        self.handle.clone()
    }

    /// Shuts the pool down and waits for every worker to stop.
    pub async fn join(self) {
        self.handle.shutdown();
        for worker in self.workers {
            if let Err(err) = worker.await {
                warn!(error = %err, "worker ended abnormally");
            }
        }
        info!("worker pool stopped");
    }
}

async fn run_worker<S, B, C>(
    worker: usize,
    pipeline: Arc<TaskExecutionService<S, B, C>>,
    receiver: Arc<Mutex<mpsc::Receiver<TaskId>>>,
    handle: WorkerPoolHandle,
) where
    S: EntityStore,
    B: ExecutionBackend,
    C: Clock + Send + Sync,
{
    loop {
        let next = tokio::select! {
            () = handle.cancel.cancelled() => None,
            task_id = next_task(&receiver) => task_id,
        };
        let Some(task_id) = next else {
            break;
        };

        debug!(worker, task_id = %task_id, "worker picked task");
        let result = pipeline.execute(task_id).await;
        let retry_delay = match &result {
            Ok(outcome) => {
                debug!(worker, task_id = %task_id, ?outcome, "task run finished");
                outcome.retry_delay()
            }
            Err(err) => {
                warn!(worker, task_id = %task_id, error = %err, "task run rejected");
                None
            }
        };
        handle.report((task_id, result));
        if let Some(delay) = retry_delay {
            handle.schedule_retry(task_id, delay);
        }
    }
    debug!(worker, "worker stopped");
}

async fn next_task(receiver: &Mutex<mpsc::Receiver<TaskId>>) -> Option<TaskId> {
    receiver.lock().await.recv().await
}
