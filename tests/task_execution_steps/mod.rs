//! Step definitions for task execution scenarios.

pub mod world;

mod given;
mod then;
mod when;
