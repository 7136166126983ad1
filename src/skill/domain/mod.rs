//! Domain model for skills.

mod descriptor;
mod error;
mod registry;

pub use descriptor::SkillDescriptor;
pub use error::SkillError;
pub use registry::SkillRegistry;
