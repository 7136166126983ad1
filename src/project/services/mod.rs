//! Application services for project lifecycle management.

mod lifecycle;

pub use lifecycle::{ProjectService, ProjectServiceError, ProjectServiceResult};
