//! Test generation use cases

use crate::config::CapabilitySnapshot;
use crate::errors::Result;
use crate::features::parsing::domain::FunctionDef;
use crate::features::symbolic::application::SymbolicExecutionUseCase;
use crate::features::test_generation::domain::TestSuite;
use crate::features::test_generation::infrastructure::{
    EquivalenceChecker, EquivalenceReport, TestSynthesizer,
};
use crate::shared::CancellationToken;
use std::sync::Arc;

pub trait TestGenerationUseCase: Send + Sync {
    /// Explore, classify, and synthesize one test per feasible path
    fn generate(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<TestSuite>;

    fn check_equivalence(
        &self,
        left: &FunctionDef,
        right: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<EquivalenceReport>;
}

#[derive(Clone)]
pub struct TestGenerationUseCaseImpl {
    execution: Arc<dyn SymbolicExecutionUseCase>,
}

impl TestGenerationUseCaseImpl {
    pub fn new(execution: Arc<dyn SymbolicExecutionUseCase>) -> Self {
        Self { execution }
    }
}

impl TestGenerationUseCase for TestGenerationUseCaseImpl {
    fn generate(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<TestSuite> {
        let report = self.execution.execute(func, snapshot, cancel)?;
        Ok(TestSynthesizer::for_snapshot(snapshot).synthesize(&report, func))
    }

    fn check_equivalence(
        &self,
        left: &FunctionDef,
        right: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<EquivalenceReport> {
        EquivalenceChecker::new(self.execution.as_ref()).check(left, right, snapshot, cancel)
    }
}
