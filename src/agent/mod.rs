//! Agent registration and status tracking for Orchestrion.
//!
//! Agents are the execution identities tasks get assigned to. This module
//! holds the agent status machine, the rolling performance score and the
//! capability checks used when matching agents to tasks.
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
