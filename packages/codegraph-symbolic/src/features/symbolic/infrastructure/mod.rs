//! Symbolic execution infrastructure

mod classifier;
mod concrete;
mod confidence;
mod explorer;
mod extractor;
mod fold;
pub mod prioritization;
mod program;

pub use classifier::FeasibilityClassifier;
pub use concrete::{evaluate, ConcreteInterpreter, ConcreteOutcome, ConcreteRun};
pub use confidence::ConfidenceScorer;
pub use explorer::{ExplorerState, PathExplorer};
pub use extractor::{PathExtractor, PathIter};
pub use prioritization::{
    Candidate, FewestConstraintsFirst, NovelCoverageFirst, PrioritizationStrategy,
};
pub use program::{Instr, Program};
