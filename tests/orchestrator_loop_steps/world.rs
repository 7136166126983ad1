//! Shared world state for orchestrator loop BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use crate::test_helpers::ScriptedBackend;
use mockable::DefaultClock;
use orchestrion::orchestrator::{
    adapters::memory::{AnyAgentMatcher, RecordingEscalationSink, StaticTaskPlanner},
    ports::{PlannedTask, TaskDispatcher},
    services::{OrchestratorPorts, OrchestratorService, OrchestratorSettings, RunOutcome},
};
use orchestrion::project::domain::ProjectId;
use orchestrion::store::adapters::memory::InMemoryEntityStore;
use rstest::fixture;

/// Driver type used by the BDD world.
pub type TestDriver = OrchestratorService<InMemoryEntityStore, DefaultClock>;

/// Scenario world for control loop behaviour tests.
pub struct LoopWorld {
    pub store: Arc<InMemoryEntityStore>,
    pub plan: Vec<PlannedTask>,
    pub backend: Option<Arc<ScriptedBackend>>,
    pub project_id: Option<ProjectId>,
    pub escalations: RecordingEscalationSink,
    pub outcome: Option<RunOutcome>,
}

impl LoopWorld {
    /// Creates a world with an empty store and an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryEntityStore::new()),
            plan: Vec::new(),
            backend: None,
            project_id: None,
            escalations: RecordingEscalationSink::new(),
            outcome: None,
        }
    }

    /// Builds a driver that plans with the world's plan and hands work to
    /// `dispatcher`.
    pub fn driver(&self, dispatcher: Arc<dyn TaskDispatcher>) -> TestDriver {
        let ports = OrchestratorPorts {
            planner: Arc::new(StaticTaskPlanner::new(self.plan.clone())),
            matcher: Arc::new(AnyAgentMatcher),
            escalations: Arc::new(self.escalations.clone()),
            dispatcher,
        };
        let settings = OrchestratorSettings {
            monitor_interval: Duration::from_millis(2),
            max_loop_iterations: 10_000,
            ..OrchestratorSettings::default()
        };
        OrchestratorService::new(Arc::clone(&self.store), Arc::new(DefaultClock), ports)
            .with_settings(settings)
    }

    pub fn project_id(&self) -> Result<ProjectId, eyre::Report> {
        self.project_id
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }
}

impl Default for LoopWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LoopWorld {
    LoopWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
