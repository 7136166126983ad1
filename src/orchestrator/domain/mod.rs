//! Domain model for the orchestrator control loop.
//!
//! The phase graph, the per-project state snapshot and the routing function
//! are pure values; the handlers that act on them live in the services
//! layer.

mod error;
mod escalation;
mod phase;
mod state;

pub use error::ParseOrchestratorPhaseError;
pub use escalation::{Escalation, EscalationReason};
pub use phase::OrchestratorPhase;
pub use state::OrchestratorState;
