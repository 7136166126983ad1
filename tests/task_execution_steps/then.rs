//! Then steps for task execution BDD scenarios.

use std::time::Duration;

use super::world::{ExecutionWorld, run_async};
use eyre::{WrapErr, eyre};
use orchestrion::agent::domain::AgentStatus;
use orchestrion::execution::domain::ExecutionOutcome;
use orchestrion::store::ports::EntityStore;
use orchestrion::task::domain::{Task, TaskStatus};
use rstest_bdd_macros::then;

fn stored_task(world: &ExecutionWorld) -> Result<Task, eyre::Report> {
    run_async(world.store.find_task(world.task_id()?))
        .wrap_err("load task")?
        .ok_or_else(|| eyre!("task missing from store"))
}

fn outcome(world: &ExecutionWorld) -> Result<&ExecutionOutcome, eyre::Report> {
    world
        .last_result()?
        .as_ref()
        .map_err(|err| eyre!("expected an outcome, execution failed: {err}"))
}

#[then("the outcome is completed")]
fn outcome_is_completed(world: &ExecutionWorld) -> Result<(), eyre::Report> {
    match outcome(world)? {
        ExecutionOutcome::Completed { .. } => Ok(()),
        other => Err(eyre!("expected completed outcome, got {other:?}")),
    }
}

#[then("the outcome is a retry after {seconds:u64} seconds")]
fn outcome_is_retry(world: &ExecutionWorld, seconds: u64) -> Result<(), eyre::Report> {
    let expected = ExecutionOutcome::RetryScheduled {
        delay: Duration::from_secs(seconds),
    };
    let actual = outcome(world)?;
    if *actual != expected {
        return Err(eyre!("expected {expected:?}, got {actual:?}"));
    }
    Ok(())
}

#[then(r#"the outcome is failed with "{message}""#)]
fn outcome_is_failed(world: &ExecutionWorld, message: String) -> Result<(), eyre::Report> {
    match outcome(world)? {
        ExecutionOutcome::Failed { error } if *error == message => Ok(()),
        other => Err(eyre!("expected failure with {message:?}, got {other:?}")),
    }
}

#[then("the outcome is skipped")]
fn outcome_is_skipped(world: &ExecutionWorld) -> Result<(), eyre::Report> {
    match outcome(world)? {
        ExecutionOutcome::Skipped { .. } => Ok(()),
        other => Err(eyre!("expected skipped outcome, got {other:?}")),
    }
}

#[then(r#"execution fails with "{message}""#)]
fn execution_fails(world: &ExecutionWorld, message: String) -> Result<(), eyre::Report> {
    match world.last_result()? {
        Err(err) if err.to_string() == message => Ok(()),
        other => Err(eyre!("expected error {message:?}, got {other:?}")),
    }
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ExecutionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let task = stored_task(world)?;
    if task.status() != expected {
        return Err(eyre!("expected task {expected}, found {}", task.status()));
    }
    Ok(())
}

#[then("the task has retried {count:u32} times")]
fn task_retried(world: &ExecutionWorld, count: u32) -> Result<(), eyre::Report> {
    let task = stored_task(world)?;
    if task.retry_count() != count {
        return Err(eyre!(
            "expected {count} retries, found {}",
            task.retry_count()
        ));
    }
    Ok(())
}

#[then(r#"the agent status is "{status}""#)]
fn agent_status_is(world: &ExecutionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = AgentStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let agent = run_async(world.store.find_agent(world.agent_id()?))
        .wrap_err("load agent")?
        .ok_or_else(|| eyre!("agent missing from store"))?;
    if agent.status() != expected {
        return Err(eyre!("expected agent {expected}, found {}", agent.status()));
    }
    Ok(())
}

#[then("the backend was called {count:u32} times")]
fn backend_called(world: &ExecutionWorld, count: u32) -> Result<(), eyre::Report> {
    let calls = world.backend.calls().len();
    if u32::try_from(calls).wrap_err("call count overflow")? != count {
        return Err(eyre!("expected {count} backend calls, found {calls}"));
    }
    Ok(())
}
