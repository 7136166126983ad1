//! Domain model for agents.
//!
//! The agent domain models lifecycle status, capability sets and
//! performance accounting. All infrastructure concerns are kept outside the
//! domain boundary.

mod agent;
mod capabilities;
mod error;
mod ids;
mod status;

pub use agent::{Agent, NewAgent};
pub use capabilities::{CapabilitySet, WILDCARD};
pub use error::{AgentDomainError, ParseAgentStatusError};
pub use ids::AgentId;
pub use status::AgentStatus;
