//! Orchestrator collaborator adapters.

pub mod memory;
