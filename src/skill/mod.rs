//! Skill catalog for Orchestrion.
//!
//! The catalog is an explicit [`domain::SkillRegistry`] value built at
//! startup and shared by reference; nothing registers itself globally. The
//! `DELEGATE` phase consults it through [`adapters::SkillMatcher`].

pub mod adapters;
pub mod domain;

#[cfg(test)]
mod tests;
