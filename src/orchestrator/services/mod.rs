//! Phase handlers and the orchestrator driver loop.

mod driver;
mod error;
mod handlers;

pub use driver::{OrchestratorPorts, OrchestratorService, OrchestratorSettings, RunOutcome};
pub use error::{OrchestratorError, OrchestratorResult};
