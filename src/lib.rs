//! Orchestrion: coordination core for autonomous software agents.
//!
//! This crate decomposes projects into tasks, assigns tasks to agents, drives
//! execution through a phased control loop and recovers from failures through
//! bounded retries, reassignment and escalation.
//!
//! # Architecture
//!
//! Orchestrion follows hexagonal architecture principles:
//!
//! - **Domain**: Pure state machines with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external collaborators
//! - **Adapters**: Concrete implementations of ports (in-memory store, test doubles)
//! - **Services**: Use cases composed from domain types and ports
//!
//! # Modules
//!
//! - [`project`]: Project aggregate and lifecycle
//! - [`task`]: Task status machine, dependencies and lifecycle
//! - [`agent`]: Agent status machine, capabilities and registry
//! - [`store`]: Entity store port with guarded atomic commits
//! - [`skill`]: Explicit skill catalog and agent/task matching
//! - [`execution`]: Task execution pipeline, retry policy and timeout watchdog
//! - [`orchestrator`]: Six-phase control loop and routing
//! - [`worker`]: Bounded worker pool feeding the execution pipeline
//! - [`config`]: Runtime configuration

pub mod agent;
pub mod config;
pub mod execution;
pub mod orchestrator;
pub mod project;
pub mod skill;
pub mod store;
pub mod task;
pub mod worker;

#[cfg(test)]
mod test_support;
