//! Explicit skill registry.

use super::{SkillDescriptor, SkillError};
use std::collections::BTreeMap;

/// Catalog of known skills keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillRegistry {
    skills: BTreeMap<String, SkillDescriptor>,
}

impl SkillRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a skill.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError::Duplicate`] when the name is taken.
    pub fn register(&mut self, descriptor: SkillDescriptor) -> Result<(), SkillError> {
        if self.skills.contains_key(descriptor.name()) {
            return Err(SkillError::Duplicate(descriptor.name().to_owned()));
        }
        self.skills.insert(descriptor.name().to_owned(), descriptor);
        Ok(())
    }

    /// Looks up a skill by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SkillDescriptor> {
        self.skills.get(name)
    }

    /// Returns every skill sorted by name.
    pub fn list(&self) -> impl Iterator<Item = &SkillDescriptor> {
        self.skills.values()
    }

    /// Returns the number of registered skills.
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Returns whether no skill is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
