//! Step definitions for orchestrator loop scenarios.

pub mod world;

mod given;
mod then;
mod when;
