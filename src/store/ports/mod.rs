//! Port contracts for entity persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by services.

pub mod entity_store;

pub use entity_store::{EntityStore, EntityStoreError, EntityStoreResult};
