//! Unit tests for the orchestrator.
