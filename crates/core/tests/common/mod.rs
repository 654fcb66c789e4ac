//! Common test utilities and helpers for lifecycle tests.
//!
//! This module provides shared functionality across integration tests:
//! - Fixtures (video configurations for both sink variants)
//! - Event-channel helpers

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;
