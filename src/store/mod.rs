//! Entity store for projects, tasks and agents.
//!
//! The store is the single durable system of record the core talks to. It
//! supports point reads, a few listing queries and atomic commits of a
//! [`CommitBatch`]. Task updates in a batch may carry the revision the
//! caller loaded, and project and agent updates an expected status; the
//! commit fails with [`ports::EntityStoreError::Conflict`] without applying
//! anything when a guard no longer holds.
//!
//! - Commit batches in [`batch`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod batch;
pub mod ports;

pub use batch::{CommitBatch, EntityRef, EntityWrite};

#[cfg(test)]
mod tests;
