//! Shared fixtures for in-memory integration tests.

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};
use orchestrion::agent::services::AgentRegistryService;
use orchestrion::project::services::ProjectService;
use orchestrion::store::adapters::memory::InMemoryEntityStore;
use orchestrion::task::services::TaskLifecycleService;
use rstest::fixture;
use std::sync::{Arc, Mutex};

/// Project, task and agent services over one shared store.
pub struct Services {
    pub store: Arc<InMemoryEntityStore>,
    pub projects: ProjectService<InMemoryEntityStore, DefaultClock>,
    pub tasks: TaskLifecycleService<InMemoryEntityStore, DefaultClock>,
    pub agents: AgentRegistryService<InMemoryEntityStore, DefaultClock>,
}

/// Provides fresh services over an empty store.
#[fixture]
pub fn services() -> Services {
    let store = Arc::new(InMemoryEntityStore::new());
    let clock = Arc::new(DefaultClock);
    Services {
        projects: ProjectService::new(Arc::clone(&store), Arc::clone(&clock)),
        tasks: TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&clock)),
        agents: AgentRegistryService::new(Arc::clone(&store), clock),
        store,
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct SteppedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl SteppedClock {
    /// Starts the clock at the current wall-clock time.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc::now())),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        *self.now.lock().expect("clock lock") += delta;
    }
}

impl Default for SteppedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SteppedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
