//! Project lifecycle management for Orchestrion.
//!
//! A project is the root of a task tree and carries the persisted
//! orchestrator phase, the only durable trace of control-loop progress.
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
