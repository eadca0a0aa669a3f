//! Language-agnostic core API
//!
//! `SymbolicEngine` exposes every operation as a plain synchronous call that
//! returns a serde envelope. `dispatch` wraps the same calls for async hosts.

pub mod dispatch;
pub mod engine;
pub mod response;

pub use engine::SymbolicEngine;
pub use response::{
    EquivalenceResponse, GenerateTestsResponse, ModuleExecuteResponse, PathSummary,
    SymbolicExecuteResponse,
};
