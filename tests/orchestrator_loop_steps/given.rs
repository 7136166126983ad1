//! Given steps for orchestrator loop BDD scenarios.

use std::sync::Arc;

use super::world::{LoopWorld, run_async};
use crate::test_helpers::ScriptedBackend;
use eyre::WrapErr;
use mockable::DefaultClock;
use orchestrion::agent::domain::{Agent, NewAgent};
use orchestrion::orchestrator::ports::PlannedTask;
use orchestrion::project::domain::{NewProject, Project};
use orchestrion::store::{CommitBatch, ports::EntityStore};
use orchestrion::task::domain::{NewTask, Task};
use rstest_bdd_macros::given;

#[given("a team of {count:u32} idle agents")]
fn team_of_agents(world: &mut LoopWorld, count: u32) -> Result<(), eyre::Report> {
    let mut batch = CommitBatch::new();
    for index in 1..=count {
        let agent = Agent::new(
            NewAgent::new(format!("agent-{index}"), "developer"),
            &DefaultClock,
        )
        .wrap_err("build agent")?;
        batch = batch.insert_agent(agent);
    }
    run_async(world.store.commit(batch)).wrap_err("store agents")
}

#[given("a plan of {count:u32} chained tasks")]
fn chained_plan(world: &mut LoopWorld, count: u32) {
    world.plan = (1..=count)
        .map(|index| {
            let planned = PlannedTask::new(format!("step-{index}"), format!("Step {index}"));
            if index == 1 {
                planned
            } else {
                planned.with_depends_on([format!("step-{}", index - 1)])
            }
        })
        .collect();
}

#[given("a worker pool whose backend succeeds")]
fn backend_succeeds(world: &mut LoopWorld) {
    world.backend = Some(Arc::new(ScriptedBackend::succeeding()));
}

#[given(r#"a worker pool whose backend fails "{title}" once"#)]
fn backend_fails_once(world: &mut LoopWorld, title: String) {
    world.backend = Some(Arc::new(
        ScriptedBackend::succeeding().failing_first(&title, 1),
    ));
}

#[given("a project with {count:u32} tasks depending on each other")]
fn cyclic_project(world: &mut LoopWorld, count: u32) -> Result<(), eyre::Report> {
    let clock = DefaultClock;
    let project = Project::new(NewProject::new("Tangled"), &clock).wrap_err("build project")?;
    let mut tasks = (1..=count)
        .map(|index| Task::new(NewTask::new(project.id(), format!("Task {index}")), &clock))
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("build tasks")?;
    let ids: Vec<_> = tasks.iter().map(Task::id).collect();
    for (task, next) in tasks.iter_mut().zip(ids.iter().cycle().skip(1)) {
        task.add_dependency(*next, &clock);
    }

    world.project_id = Some(project.id());
    let batch = tasks
        .into_iter()
        .fold(CommitBatch::new().insert_project(project), CommitBatch::insert_task);
    run_async(world.store.commit(batch)).wrap_err("store cyclic project")
}
