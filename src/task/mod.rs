//! Task lifecycle management for Orchestrion.
//!
//! Tasks are the units of work a project is decomposed into. This module
//! owns the task status machine, dependency bookkeeping and the retry
//! counter, plus the service used by callers to create, cancel and edit
//! tasks outside of execution. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]
//!
//! Persistence goes through the shared [`crate::store`] port so that task and
//! agent transitions can be committed together.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
