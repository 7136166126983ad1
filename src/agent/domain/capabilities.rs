//! Capability sets with wildcard support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Entry granting every capability of a set.
pub const WILDCARD: &str = "*";

/// Set of permission, skill or communication entries.
///
/// An entry matches on exact equality, and the [`WILDCARD`] entry matches
/// everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<String>);

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Creates a set containing only the wildcard.
    #[must_use]
    pub fn wildcard() -> Self {
        Self::from_iter([WILDCARD.to_owned()])
    }

    /// Returns whether `entry` is granted by this set.
    #[must_use]
    pub fn allows(&self, entry: &str) -> bool {
        self.0.contains(WILDCARD) || self.0.contains(entry)
    }

    /// Returns whether every entry of `required` is granted.
    #[must_use]
    pub fn allows_all<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> bool {
        required.into_iter().all(|entry| self.allows(entry))
    }

    /// Adds an entry. Blank entries are ignored.
    pub fn insert(&mut self, entry: impl Into<String>) {
        let value = entry.into();
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.0.insert(trimmed.to_owned());
        }
    }

    /// Returns the entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}
