//! When steps for orchestrator loop BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use super::world::{LoopWorld, run_async};
use eyre::{WrapErr, eyre};
use mockable::DefaultClock;
use orchestrion::execution::{domain::RetryPolicy, services::TaskExecutionService};
use orchestrion::orchestrator::adapters::memory::RecordingDispatcher;
use orchestrion::project::domain::{NewProject, Project, ProjectId};
use orchestrion::store::{CommitBatch, ports::EntityStore};
use orchestrion::worker::{WorkerPool, WorkerPoolConfig};
use rstest_bdd_macros::when;

fn ensure_project(world: &mut LoopWorld) -> Result<ProjectId, eyre::Report> {
    if let Some(project_id) = world.project_id {
        return Ok(project_id);
    }
    let project = Project::new(NewProject::new("Pipeline"), &DefaultClock)
        .wrap_err("build project")?;
    let project_id = project.id();
    run_async(world.store.commit(CommitBatch::new().insert_project(project)))
        .wrap_err("store project")?;
    world.project_id = Some(project_id);
    Ok(project_id)
}

#[when("the project is run to completion")]
fn run_to_completion(world: &mut LoopWorld) -> Result<(), eyre::Report> {
    let project_id = ensure_project(world)?;
    let backend = world
        .backend
        .clone()
        .ok_or_else(|| eyre!("missing worker pool backend in scenario world"))?;
    let pipeline = TaskExecutionService::new(
        Arc::clone(&world.store),
        backend,
        Arc::new(DefaultClock),
    )
    .with_retry_policy(RetryPolicy::new(Duration::from_millis(5)));
    let pool = WorkerPool::spawn(
        Arc::new(pipeline),
        WorkerPoolConfig {
            worker_count: 2,
            queue_capacity: 16,
        },
    );
    let driver = world.driver(Arc::new(pool.handle()));

    let result = run_async(tokio::time::timeout(
        Duration::from_secs(30),
        driver.run(project_id),
    ));
    run_async(pool.join());
    let outcome = result
        .wrap_err("run timed out")?
        .wrap_err("run failed")?;
    world.outcome = Some(outcome);
    Ok(())
}

#[when("the orchestrator steps {count:u32} times")]
fn step_repeatedly(world: &mut LoopWorld, count: u32) -> Result<(), eyre::Report> {
    let project_id = ensure_project(world)?;
    let driver = world.driver(Arc::new(RecordingDispatcher::new()));
    for index in 1..=count {
        run_async(driver.step(project_id)).wrap_err_with(|| format!("step {index}"))?;
    }
    Ok(())
}
