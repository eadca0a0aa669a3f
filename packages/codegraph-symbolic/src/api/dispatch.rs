//! Async dispatch
//!
//! Each call runs on tokio's blocking pool so the host's event loop never
//! waits on exploration. Dropping the returned future cancels the
//! exploration at its next checkpoint.

use super::engine::SymbolicEngine;
use super::response::{
    EquivalenceResponse, GenerateTestsResponse, ModuleExecuteResponse, SymbolicExecuteResponse,
};
use crate::shared::CancellationToken;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

fn default_language() -> String {
    "python".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolicExecuteRequest {
    pub source_code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub entry_point: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleExecuteRequest {
    pub source_code: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateTestsRequest {
    pub source_code: String,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EquivalenceRequest {
    pub source_code: String,
    pub left: String,
    pub right: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Cancels the token when the awaiting future goes away
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

async fn offload<T, F>(work: F, on_panic: fn(String) -> T) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Blocking worker failed");
            on_panic(format!("worker failed: {}", e))
        }
    }
}

pub async fn symbolic_execute(
    engine: Arc<SymbolicEngine>,
    request: SymbolicExecuteRequest,
) -> SymbolicExecuteResponse {
    let guard = CancelOnDrop(CancellationToken::new());
    let cancel = guard.0.clone();
    let response = offload(
        move || {
            engine.symbolic_execute_cancellable(
                &request.source_code,
                &request.language,
                request.entry_point.as_deref(),
                &cancel,
            )
        },
        |e| SymbolicExecuteResponse::failure(e),
    )
    .await;
    drop(guard);
    response
}

pub async fn symbolic_execute_module(
    engine: Arc<SymbolicEngine>,
    request: ModuleExecuteRequest,
) -> ModuleExecuteResponse {
    let guard = CancelOnDrop(CancellationToken::new());
    let cancel = guard.0.clone();
    let response = offload(
        move || {
            engine.symbolic_execute_module_cancellable(
                &request.source_code,
                &request.language,
                &cancel,
            )
        },
        |e| ModuleExecuteResponse {
            success: false,
            functions: Vec::new(),
            error: Some(e),
        },
    )
    .await;
    drop(guard);
    response
}

pub async fn generate_unit_tests(
    engine: Arc<SymbolicEngine>,
    request: GenerateTestsRequest,
) -> GenerateTestsResponse {
    let guard = CancelOnDrop(CancellationToken::new());
    let cancel = guard.0.clone();
    let response = offload(
        move || {
            engine.generate_unit_tests_cancellable(
                &request.source_code,
                request.function_name.as_deref(),
                &request.language,
                &cancel,
            )
        },
        |e| GenerateTestsResponse::failure(e),
    )
    .await;
    drop(guard);
    response
}

pub async fn check_equivalence(
    engine: Arc<SymbolicEngine>,
    request: EquivalenceRequest,
) -> EquivalenceResponse {
    let guard = CancelOnDrop(CancellationToken::new());
    let cancel = guard.0.clone();
    let response = offload(
        move || {
            engine.check_equivalence_cancellable(
                &request.source_code,
                &request.left,
                &request.right,
                &request.language,
                &cancel,
            )
        },
        |e| EquivalenceResponse::failure(e),
    )
    .await;
    drop(guard);
    response
}

fn failure_value(error: impl std::fmt::Display) -> Value {
    json!({ "success": false, "error": error.to_string() })
}

fn to_value<T: serde::Serialize>(response: T) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| failure_value(e))
}

/// Route a named tool call with JSON params to the matching operation
pub async fn dispatch(engine: Arc<SymbolicEngine>, tool: &str, params: Value) -> Value {
    debug!(tool, "Dispatching");
    match tool {
        "symbolic_execute" => match serde_json::from_value(params) {
            Ok(request) => to_value(symbolic_execute(engine, request).await),
            Err(e) => failure_value(e),
        },
        "symbolic_execute_module" => match serde_json::from_value(params) {
            Ok(request) => to_value(symbolic_execute_module(engine, request).await),
            Err(e) => failure_value(e),
        },
        "generate_unit_tests" => match serde_json::from_value(params) {
            Ok(request) => to_value(generate_unit_tests(engine, request).await),
            Err(e) => failure_value(e),
        },
        "check_equivalence" => match serde_json::from_value(params) {
            Ok(request) => to_value(check_equivalence(engine, request).await),
            Err(e) => failure_value(e),
        },
        other => failure_value(format!("unknown tool '{}'", other)),
    }
}
