//! Skill-based implementations of orchestrator ports.

mod matcher;

pub use matcher::SkillMatcher;
