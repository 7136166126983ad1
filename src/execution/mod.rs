//! Task execution for Orchestrion.
//!
//! [`services::TaskExecutionService`] runs exactly one task end to end: it
//! checks preconditions, claims the task and its agent in one guarded
//! commit, calls the [`ports::ExecutionBackend`], and commits the outcome
//! together with the agent's bookkeeping. Backend failures are retried a
//! bounded number of times. [`services::TaskWatchdog`] applies the same
//! failure handling to tasks that ran past their timeout.
//!
//! - Domain types in [`domain`]
//! - Backend contract in [`ports`]
//! - Pipeline and watchdog in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
