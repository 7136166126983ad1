//! Error types for the skill catalog.

use thiserror::Error;

/// Errors returned by skill descriptors and the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SkillError {
    /// The skill name is empty after trimming.
    #[error("skill name must not be empty")]
    EmptyName,

    /// A skill with the same name is already registered.
    #[error("skill already registered: {0}")]
    Duplicate(String),

    /// The agent lacks permissions the skill declares.
    #[error("skill {skill} requires missing permissions: {}", .missing.join(", "))]
    MissingPermissions {
        /// Skill name.
        skill: String,
        /// Permissions the agent does not hold, sorted.
        missing: Vec<String>,
    },
}
