//! Async dispatch over the blocking pool

mod common;

use codegraph_symbolic::api::dispatch::{self, GenerateTestsRequest, SymbolicExecuteRequest};
use codegraph_symbolic::{SymbolicEngine, Tier};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn engine() -> Arc<SymbolicEngine> {
    Arc::new(SymbolicEngine::for_tier(Tier::Community).unwrap())
}

#[tokio::test]
async fn test_symbolic_execute_request() {
    let response = dispatch::symbolic_execute(
        engine(),
        SymbolicExecuteRequest {
            source_code: CLASSIFY.to_string(),
            language: "python".to_string(),
            entry_point: Some("classify".to_string()),
        },
    )
    .await;
    assert!(response.success);
    assert_eq!(response.total_paths, 3);
    assert_eq!(response.paths[0].conditions, vec!["x > 100".to_string()]);
}

#[tokio::test]
async fn test_generate_unit_tests_request() {
    let response = dispatch::generate_unit_tests(
        engine(),
        GenerateTestsRequest {
            source_code: CLASSIFY.to_string(),
            function_name: None,
            language: "python".to_string(),
        },
    )
    .await;
    assert!(response.success);
    assert_eq!(response.test_cases.len(), 3);
    assert!(response.test_module.contains("import pytest"));
}

#[tokio::test]
async fn test_json_dispatch_defaults_language() {
    let value = dispatch::dispatch(
        engine(),
        "symbolic_execute",
        json!({ "source_code": CLASSIFY }),
    )
    .await;
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["feasible_count"], json!(3));
    assert_eq!(value["termination"], json!("exhausted"));
}

#[tokio::test]
async fn test_json_dispatch_rejects_bad_input() {
    let unknown = dispatch::dispatch(engine(), "optimize", json!({})).await;
    assert_eq!(unknown["success"], json!(false));
    assert!(unknown["error"].as_str().unwrap().contains("optimize"));

    let missing = dispatch::dispatch(engine(), "generate_unit_tests", json!({})).await;
    assert_eq!(missing["success"], json!(false));
    assert!(missing["error"].as_str().unwrap().contains("source_code"));
}

#[tokio::test]
async fn test_structural_errors_stay_in_band() {
    let value = dispatch::dispatch(
        engine(),
        "symbolic_execute",
        json!({ "source_code": CLASSIFY, "entry_point": "nowhere" }),
    )
    .await;
    assert_eq!(value["success"], json!(false));
    assert!(value["error"].as_str().unwrap().contains("nowhere"));
}

#[tokio::test]
async fn test_concurrent_calls_agree() {
    let engine = engine();
    let request = || SymbolicExecuteRequest {
        source_code: COUNTDOWN.to_string(),
        language: "python".to_string(),
        entry_point: None,
    };
    let (a, b, c) = tokio::join!(
        dispatch::symbolic_execute(Arc::clone(&engine), request()),
        dispatch::symbolic_execute(Arc::clone(&engine), request()),
        dispatch::symbolic_execute(Arc::clone(&engine), request()),
    );
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn test_module_dispatch() {
    let value = dispatch::dispatch(
        engine(),
        "symbolic_execute_module",
        json!({ "source_code": CLAMPS, "language": "python" }),
    )
    .await;
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["functions"].as_array().map(Vec::len), Some(3));
}
