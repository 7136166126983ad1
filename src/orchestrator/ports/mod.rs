//! Collaborator ports used by the phase handlers.

pub mod dispatcher;
pub mod escalation;
pub mod matcher;
pub mod planner;

pub use dispatcher::{TaskDispatchError, TaskDispatcher};
pub use escalation::{EscalationSink, EscalationSinkError};
pub use matcher::AgentMatcher;
pub use planner::{PlannedTask, TaskPlanner, TaskPlannerError};
