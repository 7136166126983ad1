//! Then steps for orchestrator loop BDD scenarios.

use super::world::{LoopWorld, run_async};
use eyre::{WrapErr, eyre};
use orchestrion::orchestrator::{domain::OrchestratorPhase, services::RunOutcome};
use orchestrion::project::domain::{Project, ProjectStatus};
use orchestrion::store::ports::EntityStore;
use orchestrion::task::domain::{Task, TaskStatus};
use rstest_bdd_macros::then;

fn stored_project(world: &LoopWorld) -> Result<Project, eyre::Report> {
    run_async(world.store.find_project(world.project_id()?))
        .wrap_err("load project")?
        .ok_or_else(|| eyre!("project missing from store"))
}

fn stored_tasks(world: &LoopWorld) -> Result<Vec<Task>, eyre::Report> {
    run_async(world.store.list_project_tasks(world.project_id()?)).wrap_err("list tasks")
}

#[then("the run completed")]
fn run_completed(world: &LoopWorld) -> Result<(), eyre::Report> {
    match world.outcome {
        Some(RunOutcome::Completed { .. }) => Ok(()),
        other => Err(eyre!("expected a completed run, got {other:?}")),
    }
}

#[then(r#"every task is "{status}""#)]
fn every_task_is(world: &LoopWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let tasks = stored_tasks(world)?;
    if tasks.is_empty() {
        return Err(eyre!("project has no tasks"));
    }
    if let Some(task) = tasks.iter().find(|task| task.status() != expected) {
        return Err(eyre!(
            "expected every task {expected}, {} is {}",
            task.title(),
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"the project status is "{status}""#)]
fn project_status_is(world: &LoopWorld, status: String) -> Result<(), eyre::Report> {
    let expected = ProjectStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let project = stored_project(world)?;
    if project.status() != expected {
        return Err(eyre!("expected project {expected}, found {}", project.status()));
    }
    Ok(())
}

#[then(r#"the project phase is "{phase}""#)]
fn project_phase_is(world: &LoopWorld, phase: String) -> Result<(), eyre::Report> {
    let expected = OrchestratorPhase::try_from(phase.as_str())
        .map_err(|err| eyre!("invalid expected phase in scenario: {err}"))?;
    let project = stored_project(world)?;
    if project.orchestrator_phase() != expected {
        return Err(eyre!(
            "expected phase {expected}, found {}",
            project.orchestrator_phase()
        ));
    }
    Ok(())
}

#[then(r#"task "{title}" retried {count:u32} times"#)]
fn task_retried(world: &LoopWorld, title: String, count: u32) -> Result<(), eyre::Report> {
    let tasks = stored_tasks(world)?;
    let task = tasks
        .iter()
        .find(|task| task.title() == title)
        .ok_or_else(|| eyre!("no task titled {title}"))?;
    if task.retry_count() != count {
        return Err(eyre!(
            "expected {count} retries for {title}, found {}",
            task.retry_count()
        ));
    }
    Ok(())
}

#[then(r#"an escalation with reason "{reason}" was raised"#)]
fn escalation_raised(world: &LoopWorld, reason: String) -> Result<(), eyre::Report> {
    let escalations = world.escalations.escalations();
    if escalations
        .iter()
        .any(|escalation| escalation.reason.as_str() == reason)
    {
        return Ok(());
    }
    Err(eyre!("no {reason} escalation among {escalations:?}"))
}
