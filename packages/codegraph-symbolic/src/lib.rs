/*
 * Codegraph Symbolic - Path Exploration & Test Synthesis
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (NativeValue, Span, SymbolicType, Deadline)
 * - config/      : Capability snapshot, tier presets, YAML loading
 * - features/    : Vertical slices (parsing → symbolic → smt → test_generation)
 * - api/         : Engine + serde envelopes + async dispatch
 *
 * Data flow (one function at a time):
 *   tree → paths → (solve) → classified paths → test cases
 */

#![allow(clippy::too_many_arguments)] // Explorer entry points carry budgets explicitly
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules (parsing, symbolic, smt, test_generation)
pub mod features;

/// Capability snapshot and tier presets
pub mod config;

/// Language-agnostic Core API
pub mod api;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use api::{GenerateTestsResponse, SymbolicEngine, SymbolicExecuteResponse};
pub use config::{CapabilitySnapshot, FeatureFlags, Limit, Tier};
pub use errors::{Result, SymbolicError};
pub use features::parsing::{parse_source, FunctionDef, SourceModule};
pub use features::symbolic::{FeasibilityReport, PathExplorer, PathExtractor};
pub use features::test_generation::{TestSuite, TestSynthesizer};
pub use shared::{CancellationToken, Deadline, NativeValue, SymbolicType};
