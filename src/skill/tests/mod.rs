//! Unit tests for the skill catalog.
