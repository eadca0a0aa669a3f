//! Test generation
//!
//! ```text
//! test_generation
//! ├── domain/          # TestCase, TestSuite, coercion warnings
//! ├── application/     # TestGenerationUseCase
//! └── infrastructure/  # coercion, boundary values, synthesizer, pytest rendering, equivalence
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{TestGenerationUseCase, TestGenerationUseCaseImpl};
pub use domain::{ExpectedBehavior, TestCase, TestInput, TestSuite};
pub use infrastructure::{EquivalenceChecker, EquivalenceReport, TestSynthesizer};
