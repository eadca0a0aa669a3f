//! Symbolic execution
//!
//! ```text
//! symbolic
//! ├── domain/          # BranchPoint, PathCondition, SymbolicPath, reports
//! ├── application/     # SymbolicExecutionUseCase
//! └── infrastructure/  # program, extractor, explorer, classifier, replay
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{SymbolicExecutionUseCase, SymbolicExecutionUseCaseImpl};
pub use domain::{
    ClassifiedPath, ExplorationOutcome, FeasibilityReport, PathCondition, PathStatus, SymbolicPath,
};
pub use infrastructure::{
    ConfidenceScorer, FeasibilityClassifier, PathExplorer, PathExtractor, PathIter,
};
