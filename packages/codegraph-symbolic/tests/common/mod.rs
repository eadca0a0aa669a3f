//! Common test utilities for codegraph-symbolic
//!
//! Source fixtures and small helpers shared by the integration tests.

// each test binary uses a subset
#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;
