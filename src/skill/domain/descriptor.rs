//! Skill capability descriptors.

use super::SkillError;
use crate::agent::domain::Agent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declared capability of one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    name: String,
    description: String,
    required_permissions: BTreeSet<String>,
}

impl SkillDescriptor {
    /// Creates a descriptor with no required permissions.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::EmptyName`] when the name is blank.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, SkillError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SkillError::EmptyName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            description: description.into(),
            required_permissions: BTreeSet::new(),
        })
    }

    /// Sets the permissions an agent must hold to use the skill.
    #[must_use]
    pub fn with_required_permissions(
        mut self,
        permissions: impl IntoIterator<Item = String>,
    ) -> Self {
        self.required_permissions = permissions.into_iter().collect();
        self
    }

    /// Returns the skill name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the required permissions in sorted order.
    pub fn required_permissions(&self) -> impl Iterator<Item = &str> {
        self.required_permissions.iter().map(String::as_str)
    }

    /// Checks that `agent` holds every required permission.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::MissingPermissions`] listing what is missing.
    pub fn validate_permissions(&self, agent: &Agent) -> Result<(), SkillError> {
        let missing: Vec<String> = self
            .required_permissions
            .iter()
            .filter(|permission| !agent.has_permission(permission))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(SkillError::MissingPermissions {
            skill: self.name.clone(),
            missing,
        })
    }
}
