//! Classified paths

use super::path::SymbolicPath;
use crate::features::smt::domain::SolverModel;
use serde::{Deserialize, Serialize};

/// Feasibility verdict. The model lives inside `Feasible`, so a model exists
/// exactly when the path is feasible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathStatus {
    Feasible { model: SolverModel },
    Infeasible,
    Unknown { reason: String },
    Pruned { reason: String },
}

impl PathStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PathStatus::Feasible { .. } => "feasible",
            PathStatus::Infeasible => "infeasible",
            PathStatus::Unknown { .. } => "unknown",
            PathStatus::Pruned { .. } => "pruned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPath {
    pub path: SymbolicPath,
    pub status: PathStatus,
    /// Filled in by the classifier; always within `[0, 1]`
    #[serde(default)]
    pub confidence: f64,
}

impl ClassifiedPath {
    pub fn new(path: SymbolicPath, status: PathStatus) -> Self {
        Self {
            path,
            status,
            confidence: 0.0,
        }
    }

    pub fn model(&self) -> Option<&SolverModel> {
        match &self.status {
            PathStatus::Feasible { model } => Some(model),
            _ => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self.status, PathStatus::Feasible { .. })
    }
}
