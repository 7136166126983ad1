//! Given steps for task execution BDD scenarios.

use std::sync::Arc;

use super::world::{ExecutionWorld, run_async};
use crate::test_helpers::ScriptedBackend;
use eyre::WrapErr;
use mockable::DefaultClock;
use orchestrion::agent::domain::{Agent, NewAgent};
use orchestrion::project::domain::{NewProject, Project};
use orchestrion::store::{CommitBatch, ports::EntityStore};
use orchestrion::task::domain::{DEFAULT_MAX_RETRIES, NewTask, Task};
use rstest_bdd_macros::given;

fn seed(world: &mut ExecutionWorld, max_retries: u32, assigned: bool) -> Result<(), eyre::Report> {
    let clock = DefaultClock;
    let project = Project::new(NewProject::new("Pipeline"), &clock).wrap_err("build project")?;
    let agent =
        Agent::new(NewAgent::new("runner", "developer"), &clock).wrap_err("build agent")?;
    let mut task = Task::new(
        NewTask::new(project.id(), "Summarise logs").with_max_retries(max_retries),
        &clock,
    )
    .wrap_err("build task")?;
    if assigned {
        task.assign(agent.id(), &clock);
    }
    world.task_id = Some(task.id());
    world.agent_id = Some(agent.id());
    run_async(
        world.store.commit(
            CommitBatch::new()
                .insert_project(project)
                .insert_agent(agent)
                .insert_task(task),
        ),
    )
    .wrap_err("seed store for execution scenario")
}

#[given("a project with an agent and an assigned task allowing {max_retries:u32} retries")]
fn assigned_task(world: &mut ExecutionWorld, max_retries: u32) -> Result<(), eyre::Report> {
    seed(world, max_retries, true)
}

#[given("a project with an agent and an unassigned task")]
fn unassigned_task(world: &mut ExecutionWorld) -> Result<(), eyre::Report> {
    seed(world, DEFAULT_MAX_RETRIES, false)
}

#[given("the backend succeeds")]
fn backend_succeeds(world: &mut ExecutionWorld) {
    world.backend = Arc::new(ScriptedBackend::succeeding());
}

#[given(r#"the backend fails with "{message}""#)]
fn backend_fails(world: &mut ExecutionWorld, message: String) {
    world.backend = Arc::new(ScriptedBackend::failing(&message));
}
