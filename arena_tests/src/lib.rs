//! `arena_tests`
//!
//! Integration and smoke tests for the arena crates live in `tests/`.
