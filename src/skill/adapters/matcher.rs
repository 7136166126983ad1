//! Agent matching against task skill requirements.

use crate::agent::domain::Agent;
use crate::orchestrator::ports::AgentMatcher;
use crate::skill::domain::SkillRegistry;
use crate::task::domain::Task;
use std::sync::Arc;

/// Matches agents by skill tags and the permissions skills declare.
///
/// An agent matches when it carries every skill the task requires and holds
/// the permissions of each required skill known to the registry. Skills the
/// registry does not know only require the tag.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    registry: Arc<SkillRegistry>,
}

impl SkillMatcher {
    /// Creates a matcher over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }
}

impl AgentMatcher for SkillMatcher {
    fn matches(&self, agent: &Agent, task: &Task) -> bool {
        task.skill_requirements().iter().all(|skill| {
            agent.has_skill(skill)
                && self
                    .registry
                    .get(skill)
                    .is_none_or(|descriptor| descriptor.validate_permissions(agent).is_ok())
        })
    }
}
