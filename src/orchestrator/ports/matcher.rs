//! Port deciding whether an agent may take a task.

use crate::agent::domain::Agent;
use crate::task::domain::Task;

/// Eligibility policy consulted by the `DELEGATE` phase.
///
/// Availability is checked by the caller; a matcher only judges capability.
pub trait AgentMatcher: Send + Sync {
    /// Returns whether `agent` is capable of executing `task`.
    fn matches(&self, agent: &Agent, task: &Task) -> bool;
}
