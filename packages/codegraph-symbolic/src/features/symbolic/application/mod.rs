//! Symbolic execution use case

use crate::config::CapabilitySnapshot;
use crate::errors::Result;
use crate::features::parsing::domain::FunctionDef;
use crate::features::symbolic::domain::{ExplorationOutcome, FeasibilityReport};
use crate::features::symbolic::infrastructure::{FeasibilityClassifier, PathExplorer};
use crate::shared::CancellationToken;

/// Explore one function and classify its paths
pub trait SymbolicExecutionUseCase: Send + Sync {
    fn explore(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<ExplorationOutcome>;

    fn execute(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<FeasibilityReport>;
}

#[derive(Debug, Clone)]
pub struct SymbolicExecutionUseCaseImpl {
    explorer: PathExplorer,
    classifier: FeasibilityClassifier,
}

impl SymbolicExecutionUseCaseImpl {
    pub fn new(explorer: PathExplorer, classifier: FeasibilityClassifier) -> Self {
        Self {
            explorer,
            classifier,
        }
    }
}

impl SymbolicExecutionUseCase for SymbolicExecutionUseCaseImpl {
    fn explore(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<ExplorationOutcome> {
        self.explorer.explore(func, snapshot, cancel)
    }

    fn execute(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<FeasibilityReport> {
        let outcome = self.explorer.explore(func, snapshot, cancel)?;
        Ok(self.classifier.classify(&outcome))
    }
}
