//! Common test utilities for docklift contract tests.
//!
//! This module provides:
//! - `TestEnv`: Isolated workspace and home directories plus CLI runner
//! - Fixtures: Reusable application document builders

pub mod env;
pub mod fixtures;

pub use env::*;
pub use fixtures::*;
