//! Symbolic paths

use super::branch::BranchId;
use super::condition::PathCondition;
use crate::features::parsing::domain::Expr;
use crate::shared::SymbolicType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PathId = u32;

/// How the path leaves the function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Terminal {
    /// `return`, value expressed over parameters and opaque symbols
    Return { value: Option<Expr> },
    Raise { exception: Option<String> },
    /// End of body without `return`
    FallThrough,
    /// Cut short by the depth budget
    Truncated { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Both edges were live; this one was taken
    Forked,
    /// The guard folded to a constant
    Folded,
    /// Loop fuel ran out; the exit edge was forced
    FuelExhausted,
}

/// One branch-point evaluation on the path, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub branch: BranchId,
    pub outcome: bool,
    pub kind: DecisionKind,
}

/// An ordered condition list plus how the path ends. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolicPath {
    id: PathId,
    conditions: Vec<PathCondition>,
    decisions: Vec<Decision>,
    depth: usize,
    terminal: Terminal,
    /// Symbolic inputs the path reads (parameters and opaque values)
    symbols: BTreeMap<String, SymbolicType>,
}

impl SymbolicPath {
    pub fn new(
        id: PathId,
        conditions: Vec<PathCondition>,
        decisions: Vec<Decision>,
        depth: usize,
        terminal: Terminal,
        symbols: BTreeMap<String, SymbolicType>,
    ) -> Self {
        Self {
            id,
            conditions,
            decisions,
            depth,
            terminal,
            symbols,
        }
    }

    pub fn id(&self) -> PathId {
        self.id
    }

    pub fn conditions(&self) -> &[PathCondition] {
        &self.conditions
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// Number of forked branch decisions
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn symbols(&self) -> &BTreeMap<String, SymbolicType> {
        &self.symbols
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self.terminal, Terminal::Truncated { .. })
    }

    /// Loop guards whose exit edge was forced by fuel exhaustion
    pub fn fuel_exhausted(&self) -> impl Iterator<Item = BranchId> + '_ {
        self.decisions
            .iter()
            .filter(|d| d.kind == DecisionKind::FuelExhausted)
            .map(|d| d.branch)
    }

    /// Path identity: hash of the ordered condition sequence
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for c in &self.conditions {
            hasher.update(&c.branch.to_le_bytes());
            hasher.update(&[u8::from(c.polarity)]);
            hasher.update(c.expr.to_string().as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize()
    }

    /// `"c1 and c2"`, or `"no conditions"`
    pub fn describe_conditions(&self) -> String {
        if self.conditions.is_empty() {
            return "no conditions".to_string();
        }
        self.conditions
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Same conditions under a new id
    pub fn with_id(mut self, id: PathId) -> Self {
        self.id = id;
        self
    }
}
