//! When steps for task execution BDD scenarios.

use super::world::{ExecutionWorld, run_async};
use rstest_bdd_macros::when;

fn execute(world: &mut ExecutionWorld, times: u32) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let pipeline = world.pipeline();
    for _ in 0..times {
        world.last_result = Some(run_async(pipeline.execute(task_id)));
    }
    Ok(())
}

#[when("the task is executed once")]
fn executed_once(world: &mut ExecutionWorld) -> Result<(), eyre::Report> {
    execute(world, 1)
}

#[when("the task is executed {times:u32} times")]
fn executed_repeatedly(world: &mut ExecutionWorld, times: u32) -> Result<(), eyre::Report> {
    execute(world, times)
}
