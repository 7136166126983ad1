//! Unit tests for task execution.


use crate::agent::domain::{Agent, NewAgent};
use crate::project::domain::{NewProject, Project};
use crate::store::{CommitBatch, adapters::memory::InMemoryEntityStore, ports::EntityStore};
use crate::task::domain::{NewTask, Task};
use mockable::Clock;
use std::sync::Arc;

/// Store seeded with one project, one agent and one task.
struct Seeded {
    store: Arc<InMemoryEntityStore>,
    task: Task,
    agent: Agent,
}

/// Seeds a task with the given retry budget, assigned to the agent when
/// `assign` is set.
async fn seed(clock: &impl Clock, max_retries: u32, assign: bool) -> Seeded {
    let store = Arc::new(InMemoryEntityStore::new());
    let project = Project::new(NewProject::new("Execution"), clock).expect("valid project");
    let agent = Agent::new(NewAgent::new("runner", "developer"), clock).expect("valid agent");
    let mut task = Task::new(
        NewTask::new(project.id(), "Run migrations")
            .with_description("Apply pending schema migrations")
            .with_max_retries(max_retries),
        clock,
    )
    .expect("valid task");
    if assign {
        task.assign(agent.id(), clock);
    }
    store
        .commit(
            CommitBatch::new()
                .insert_project(project)
                .insert_agent(agent.clone())
                .insert_task(task.clone()),
        )
        .await
        .expect("seed commit should succeed");
    Seeded { store, task, agent }
}
