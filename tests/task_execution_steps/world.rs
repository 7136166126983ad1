//! Shared world state for task execution BDD scenarios.

use std::sync::Arc;

use crate::test_helpers::ScriptedBackend;
use mockable::DefaultClock;
use orchestrion::agent::domain::AgentId;
use orchestrion::execution::{
    domain::{ExecutionError, ExecutionOutcome},
    services::TaskExecutionService,
};
use orchestrion::store::adapters::memory::InMemoryEntityStore;
use orchestrion::task::domain::TaskId;
use rstest::fixture;

/// Pipeline type used by the BDD world.
pub type TestPipeline = TaskExecutionService<InMemoryEntityStore, ScriptedBackend, DefaultClock>;

/// Scenario world for execution pipeline behaviour tests.
pub struct ExecutionWorld {
    pub store: Arc<InMemoryEntityStore>,
    pub backend: Arc<ScriptedBackend>,
    pub task_id: Option<TaskId>,
    pub agent_id: Option<AgentId>,
    pub last_result: Option<Result<ExecutionOutcome, ExecutionError>>,
}

impl ExecutionWorld {
    /// Creates a world with an empty store and a succeeding backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryEntityStore::new()),
            backend: Arc::new(ScriptedBackend::succeeding()),
            task_id: None,
            agent_id: None,
            last_result: None,
        }
    }

    /// Builds a pipeline over the world's store and current backend.
    pub fn pipeline(&self) -> TestPipeline {
        TaskExecutionService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.backend),
            Arc::new(DefaultClock),
        )
    }

    pub fn task_id(&self) -> Result<TaskId, eyre::Report> {
        self.task_id
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    pub fn agent_id(&self) -> Result<AgentId, eyre::Report> {
        self.agent_id
            .ok_or_else(|| eyre::eyre!("missing agent in scenario world"))
    }

    pub fn last_result(&self) -> Result<&Result<ExecutionOutcome, ExecutionError>, eyre::Report> {
        self.last_result
            .as_ref()
            .ok_or_else(|| eyre::eyre!("the task was never executed"))
    }
}

impl Default for ExecutionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ExecutionWorld {
    ExecutionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
