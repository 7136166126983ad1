//! Application services for agent registration and administration.

mod registry;

pub use registry::{AgentRegistryError, AgentRegistryResult, AgentRegistryService};
