//! SymbolicEngine - language-agnostic entry point
//!
//! Owns the resolved capability snapshot and the shared solver pool. Every
//! operation is a plain synchronous call; `dispatch` wraps them for async
//! hosts.
//!
//! Thread-safe: Yes (Send + Sync)

use super::response::{
    EquivalenceResponse, GenerateTestsResponse, ModuleExecuteResponse, SymbolicExecuteResponse,
};
use crate::config::{CapabilitySnapshot, Tier};
use crate::errors::Result;
use crate::features::parsing::{parse_source, FunctionDef};
use crate::features::smt::infrastructure::SolverPool;
use crate::features::symbolic::application::{
    SymbolicExecutionUseCase, SymbolicExecutionUseCaseImpl,
};
use crate::features::symbolic::domain::FeasibilityReport;
use crate::features::symbolic::infrastructure::{FeasibilityClassifier, PathExplorer};
use crate::features::test_generation::application::{
    TestGenerationUseCase, TestGenerationUseCaseImpl,
};
use crate::features::test_generation::domain::TestSuite;
use crate::features::test_generation::infrastructure::EquivalenceReport;
use crate::shared::CancellationToken;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SymbolicEngine {
    snapshot: Arc<CapabilitySnapshot>,
    pool: Arc<SolverPool>,
    execution: Arc<SymbolicExecutionUseCaseImpl>,
    generation: TestGenerationUseCaseImpl,
}

impl SymbolicEngine {
    /// Validate `snapshot` and size the solver pool from it
    pub fn new(snapshot: CapabilitySnapshot) -> Result<Self> {
        let pool = Arc::new(SolverPool::new(snapshot.solver_pool_size));
        Self::with_pool(snapshot, pool)
    }

    pub fn for_tier(tier: Tier) -> Result<Self> {
        Self::new(tier.snapshot())
    }

    /// Use a caller-provided pool (shared between engines or deliberately empty)
    pub fn with_pool(snapshot: CapabilitySnapshot, pool: Arc<SolverPool>) -> Result<Self> {
        snapshot.validate()?;
        let execution = Arc::new(SymbolicExecutionUseCaseImpl::new(
            PathExplorer::new(Arc::clone(&pool)),
            FeasibilityClassifier::new(),
        ));
        let generation =
            TestGenerationUseCaseImpl::new(Arc::clone(&execution) as Arc<dyn SymbolicExecutionUseCase>);
        info!(
            tier = %snapshot.tier,
            max_paths = %snapshot.max_paths,
            pool = pool.capacity(),
            "Symbolic engine ready"
        );
        Ok(Self {
            snapshot: Arc::new(snapshot),
            pool,
            execution,
            generation,
        })
    }

    pub fn snapshot(&self) -> &Arc<CapabilitySnapshot> {
        &self.snapshot
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Typed operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Explore and classify one function
    pub fn analyze(
        &self,
        source: &str,
        language: &str,
        entry_point: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<FeasibilityReport> {
        let module = parse_source(source, language)?;
        let func = module.function(entry_point)?;
        self.execution.execute(func, &self.snapshot, cancel)
    }

    /// Explore one function and synthesize its test suite
    pub fn generate_tests(
        &self,
        source: &str,
        function_name: Option<&str>,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<TestSuite> {
        let module = parse_source(source, language)?;
        let func = module.function(function_name)?;
        self.generation.generate(func, &self.snapshot, cancel)
    }

    /// Compare two functions of the same module on synthesized inputs
    pub fn compare_functions(
        &self,
        source: &str,
        left: &str,
        right: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<EquivalenceReport> {
        let module = parse_source(source, language)?;
        let left = module.function(Some(left))?;
        let right = module.function(Some(right))?;
        self.generation
            .check_equivalence(left, right, &self.snapshot, cancel)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Envelope operations
    // ═══════════════════════════════════════════════════════════════════════

    pub fn symbolic_execute(
        &self,
        source_code: &str,
        language: &str,
        entry_point: Option<&str>,
    ) -> SymbolicExecuteResponse {
        self.symbolic_execute_cancellable(source_code, language, entry_point, &CancellationToken::new())
    }

    pub fn symbolic_execute_cancellable(
        &self,
        source_code: &str,
        language: &str,
        entry_point: Option<&str>,
        cancel: &CancellationToken,
    ) -> SymbolicExecuteResponse {
        match self.analyze(source_code, language, entry_point, cancel) {
            Ok(report) => SymbolicExecuteResponse::from(&report),
            Err(e) => {
                warn!(error = %e, "symbolic_execute failed");
                SymbolicExecuteResponse::failure(e)
            }
        }
    }

    /// Explore every top-level function in parallel
    ///
    /// Runs on a rayon pool no wider than the solver pool so no exploration
    /// waits on a checkout.
    pub fn symbolic_execute_module(&self, source_code: &str, language: &str) -> ModuleExecuteResponse {
        self.symbolic_execute_module_cancellable(source_code, language, &CancellationToken::new())
    }

    /// One token covers every function of the module
    pub fn symbolic_execute_module_cancellable(
        &self,
        source_code: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> ModuleExecuteResponse {
        let module = match parse_source(source_code, language) {
            Ok(m) => m,
            Err(e) => {
                return ModuleExecuteResponse {
                    success: false,
                    functions: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        let run = |func: &FunctionDef| match self.execution.execute(func, &self.snapshot, cancel) {
            Ok(report) => SymbolicExecuteResponse::from(&report),
            Err(e) => SymbolicExecuteResponse::failure(e),
        };

        let functions: Vec<SymbolicExecuteResponse> =
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.pool.capacity().max(1))
                .build()
            {
                Ok(threads) => threads.install(|| module.functions.par_iter().map(run).collect()),
                Err(e) => {
                    warn!(error = %e, "Falling back to sequential module exploration");
                    module.functions.iter().map(run).collect()
                }
            };

        info!(functions = functions.len(), "Module explored");
        ModuleExecuteResponse {
            success: functions.iter().all(|f| f.success),
            functions,
            error: None,
        }
    }

    pub fn generate_unit_tests(
        &self,
        source_code: &str,
        function_name: Option<&str>,
        language: &str,
    ) -> GenerateTestsResponse {
        self.generate_unit_tests_cancellable(source_code, function_name, language, &CancellationToken::new())
    }

    pub fn generate_unit_tests_cancellable(
        &self,
        source_code: &str,
        function_name: Option<&str>,
        language: &str,
        cancel: &CancellationToken,
    ) -> GenerateTestsResponse {
        match self.generate_tests(source_code, function_name, language, cancel) {
            Ok(suite) => GenerateTestsResponse::from(suite),
            Err(e) => {
                warn!(error = %e, "generate_unit_tests failed");
                GenerateTestsResponse::failure(e)
            }
        }
    }

    pub fn check_equivalence(
        &self,
        source_code: &str,
        left: &str,
        right: &str,
        language: &str,
    ) -> EquivalenceResponse {
        self.check_equivalence_cancellable(source_code, left, right, language, &CancellationToken::new())
    }

    pub fn check_equivalence_cancellable(
        &self,
        source_code: &str,
        left: &str,
        right: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> EquivalenceResponse {
        match self.compare_functions(source_code, left, right, language, cancel) {
            Ok(report) => EquivalenceResponse::from(report),
            Err(e) => EquivalenceResponse::failure(e),
        }
    }
}
