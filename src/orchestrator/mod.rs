//! Orchestrator control loop for Orchestrion.
//!
//! Each project moves through six phases: `PLAN`, `DELEGATE`, `MONITOR`,
//! `ESCALATE`, `REASSIGN` and `COMPLETE`. The driver runs one handler per
//! phase and persists the phase on the project after every step. Only the
//! transition out of `MONITOR` is data dependent; it is decided by
//! [`domain::OrchestratorState::route`].
//!
//! - Domain types in [`domain`]
//! - Collaborator contracts in [`ports`]
//! - In-memory collaborators in [`adapters`]
//! - Phase handlers and driver in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
