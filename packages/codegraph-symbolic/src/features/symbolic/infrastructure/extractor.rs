//! Path extractor
//!
//! Walks a compiled `Program` symbolically. Every local is kept as an
//! expression over the parameters and opaque symbols, so each recorded
//! condition mentions inputs only. Guards that fold to a constant take one
//! edge, symbolic guards fork, and loop guards stop forking once their fuel
//! is spent.
//!
//! `PathIter` is lazy: the explorer pulls one path at a time and can stop
//! early without the rest of the tree ever being built.

use super::fold;
use super::prioritization::{strategy_for, Candidate, PrioritizationStrategy};
use super::program::{Instr, Program, RAISES_PREFIX};
use crate::config::{CapabilitySnapshot, Limit};
use crate::errors::Result;
use crate::features::parsing::domain::{Expr, FunctionDef, FunctionSignature};
use crate::features::symbolic::domain::{
    condition_type, BranchId, BranchPoint, Decision, DecisionKind, PathCondition, PathId,
    SymbolicPath, Terminal,
};
use crate::shared::SymbolicType;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use std::sync::Arc;
use tracing::trace;

/// Instruction budget for a single path
pub const DEFAULT_MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct PathExtractor {
    max_depth: Limit,
    fuel: u32,
    formal_verification: bool,
    max_steps: usize,
    strategy: Option<Arc<dyn PrioritizationStrategy>>,
}

impl PathExtractor {
    pub fn new(snapshot: &CapabilitySnapshot) -> Self {
        Self {
            max_depth: snapshot.max_depth,
            fuel: snapshot.max_loop_iterations.max(1),
            formal_verification: snapshot.features.formal_verification,
            max_steps: DEFAULT_MAX_STEPS,
            strategy: strategy_for(snapshot),
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn PrioritizationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn depth_first(mut self) -> Self {
        self.strategy = None;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Compile `func` and start a lazy walk over its paths
    pub fn paths(&self, func: &FunctionDef) -> Result<PathIter> {
        let program = Program::compile(func, self.formal_verification)?;
        let signature = FunctionSignature::infer(func);
        Ok(self.paths_for(program, &signature))
    }

    pub fn paths_for(&self, program: Program, signature: &FunctionSignature) -> PathIter {
        let mut root = WorkItem::default();
        for param in &signature.params {
            root.env.insert(param.name.clone(), Expr::name(&param.name));
            root.symbols.insert(param.name.clone(), param.ty);
        }

        let mut iter = PathIter {
            program,
            max_depth: self.max_depth,
            fuel: self.fuel,
            max_steps: self.max_steps,
            worklist: match &self.strategy {
                Some(strategy) => Worklist::Queue(BinaryHeap::new(), Arc::clone(strategy)),
                None => Worklist::Stack(Vec::new()),
            },
            covered: FxHashSet::default(),
            next_id: 0,
            seq: 0,
        };
        iter.push(root);
        iter
    }
}

#[derive(Debug, Clone, Default)]
struct WorkItem {
    pc: usize,
    env: FxHashMap<String, Expr>,
    /// Opaque source fragments already bound on this path
    opaque: FxHashMap<String, Expr>,
    conditions: Vec<PathCondition>,
    decisions: Vec<Decision>,
    /// Guard visits on this path, forked with the item. Siblings that share a
    /// loop prefix share its count, so every path leaves a loop after the same
    /// number of guard visits. Not pooled across the iterator: a branch inside
    /// a loop forks once per unrolled iteration and `max_paths` bounds the total.
    visits: FxHashMap<BranchId, u32>,
    symbols: BTreeMap<String, SymbolicType>,
    fresh: u32,
    depth: usize,
    steps: usize,
}

fn sanitize(callee: &str) -> String {
    callee
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

impl WorkItem {
    fn fresh_symbol(&mut self, stem: &str, ty: SymbolicType) -> Expr {
        let name = format!("__{}_{}", stem, self.fresh);
        self.fresh += 1;
        self.symbols.insert(name.clone(), ty);
        Expr::Name(name)
    }

    /// Substitute the current environment into `e` and fold constants
    fn eval(&mut self, e: &Expr) -> Expr {
        match e {
            Expr::Int(_) | Expr::Float(_) | Expr::Bool(_) | Expr::Str(_) | Expr::None => e.clone(),
            Expr::List(items) => Expr::List(items.iter().map(|i| self.eval(i)).collect()),
            Expr::Dict(entries) => Expr::Dict(
                entries
                    .iter()
                    .map(|(k, v)| (self.eval(k), self.eval(v)))
                    .collect(),
            ),
            Expr::Name(n) => {
                if let Some(v) = self.env.get(n) {
                    return v.clone();
                }
                if let Some(stem) = n.strip_prefix("__") {
                    if n.starts_with(RAISES_PREFIX) {
                        // a fresh switch per evaluation: loop iterations raise independently
                        return self.fresh_symbol(stem, SymbolicType::Bool);
                    }
                }
                // module-level name: stable for the whole path
                let sym = self.fresh_symbol(&format!("global_{}", sanitize(n)), SymbolicType::Int);
                self.env.insert(n.clone(), sym.clone());
                sym
            }
            Expr::Compare { op, left, right } => {
                let (l, r) = (self.eval(left), self.eval(right));
                fold::compare(*op, l, r)
            }
            Expr::Logical { op, left, right } => {
                let (l, r) = (self.eval(left), self.eval(right));
                fold::logical(*op, l, r)
            }
            Expr::Not(inner) => {
                let v = self.eval(inner);
                fold::not(v)
            }
            Expr::Arith { op, left, right } => {
                let (l, r) = (self.eval(left), self.eval(right));
                fold::arith(*op, l, r)
            }
            Expr::Neg(inner) => {
                let v = self.eval(inner);
                fold::neg(v)
            }
            Expr::Len(inner) => {
                let v = self.eval(inner);
                fold::len(v)
            }
            Expr::Call { callee, .. } => {
                self.fresh_symbol(&format!("call_{}", sanitize(callee)), SymbolicType::Int)
            }
            Expr::Opaque(text) => {
                if let Some(v) = self.opaque.get(text) {
                    return v.clone();
                }
                let sym = self.fresh_symbol("opaque", SymbolicType::Int);
                self.opaque.insert(text.clone(), sym.clone());
                sym
            }
        }
    }

    /// `iter[index]` when both are known, otherwise a fresh element symbol
    fn element(&mut self, iter: &str, index: &str) -> Expr {
        let container = self.env.get(iter).cloned();
        let position = self.env.get(index).and_then(|e| match e {
            Expr::Int(i) => usize::try_from(*i).ok(),
            _ => None,
        });
        match (container, position) {
            (Some(Expr::List(items)), Some(i)) if i < items.len() => items[i].clone(),
            (Some(Expr::Dict(entries)), Some(i)) if i < entries.len() => entries[i].0.clone(),
            (Some(Expr::Str(s)), Some(i)) => match s.chars().nth(i) {
                Some(c) => Expr::Str(c.to_string()),
                None => self.fresh_symbol("elem", SymbolicType::Int),
            },
            _ => self.fresh_symbol("elem", SymbolicType::Int),
        }
    }

    fn decide(&mut self, branch: BranchId, outcome: bool, kind: DecisionKind) {
        self.decisions.push(Decision {
            branch,
            outcome,
            kind,
        });
    }

    fn assume(&mut self, expr: Expr, polarity: bool, branch: BranchId) {
        let ty = condition_type(&expr, &self.symbols);
        self.conditions
            .push(PathCondition::new(expr, polarity, branch, ty));
    }
}

enum Step {
    Emit(WorkItem, Terminal),
    Fork(WorkItem, WorkItem),
}

struct Queued {
    score: i64,
    seq: u64,
    item: WorkItem,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        (self.score, self.seq) == (other.score, other.seq)
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.score, self.seq).cmp(&(other.score, other.seq))
    }
}

enum Worklist {
    Stack(Vec<WorkItem>),
    Queue(BinaryHeap<Reverse<Queued>>, Arc<dyn PrioritizationStrategy>),
}

/// Lazy, deterministic path enumeration over one function
pub struct PathIter {
    program: Program,
    max_depth: Limit,
    fuel: u32,
    max_steps: usize,
    worklist: Worklist,
    /// Branch edges taken by emitted paths
    covered: FxHashSet<(BranchId, bool)>,
    next_id: PathId,
    seq: u64,
}

impl PathIter {
    pub fn branch_points(&self) -> &[BranchPoint] {
        &self.program.branch_points
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Paths emitted so far
    pub fn emitted(&self) -> u32 {
        self.next_id
    }

    fn push(&mut self, item: WorkItem) {
        match &mut self.worklist {
            Worklist::Stack(stack) => stack.push(item),
            Worklist::Queue(heap, strategy) => {
                let novel_edges = item
                    .decisions
                    .iter()
                    .filter(|d| {
                        d.kind == DecisionKind::Forked
                            && !self.covered.contains(&(d.branch, d.outcome))
                    })
                    .count();
                let score = strategy.score(&Candidate {
                    conditions: &item.conditions,
                    decisions: &item.decisions,
                    novel_edges,
                });
                self.seq += 1;
                heap.push(Reverse(Queued {
                    score,
                    seq: self.seq,
                    item,
                }));
            }
        }
    }

    fn pop(&mut self) -> Option<WorkItem> {
        match &mut self.worklist {
            Worklist::Stack(stack) => stack.pop(),
            Worklist::Queue(heap, _) => heap.pop().map(|Reverse(q)| q.item),
        }
    }

    fn advance(&self, mut item: WorkItem) -> Step {
        loop {
            item.steps += 1;
            if item.steps > self.max_steps {
                let reason = format!("instruction budget of {} steps exhausted", self.max_steps);
                return Step::Emit(item, Terminal::Truncated { reason });
            }
            let Some(instr) = self.program.instrs.get(item.pc) else {
                return Step::Emit(item, Terminal::FallThrough);
            };

            match instr {
                Instr::Assign { target, value } => {
                    let v = item.eval(value);
                    item.env.insert(target.clone(), v);
                    item.pc += 1;
                }
                Instr::Element {
                    target,
                    iter,
                    index,
                } => {
                    let v = item.element(iter, index);
                    item.env.insert(target.clone(), v);
                    item.pc += 1;
                }
                Instr::Havoc { target } => {
                    let v = item.fresh_symbol("exc", SymbolicType::Int);
                    item.env.insert(target.clone(), v);
                    item.pc += 1;
                }
                Instr::Jump(target) => item.pc = *target,
                Instr::Return(value) => {
                    let value = value.as_ref().map(|v| item.eval(v));
                    return Step::Emit(item, Terminal::Return { value });
                }
                Instr::Raise(kind) => {
                    return Step::Emit(
                        item,
                        Terminal::Raise {
                            exception: kind.clone(),
                        },
                    )
                }
                Instr::End => return Step::Emit(item, Terminal::FallThrough),
                Instr::Assume { point, test } => {
                    let t = item.eval(test);
                    match fold::truth(&t) {
                        // assumptions never count as decisions
                        Some(true) => item.pc += 1,
                        Some(false) => {
                            return Step::Emit(
                                item,
                                Terminal::Raise {
                                    exception: Some("AssertionError".to_string()),
                                },
                            );
                        }
                        None => {
                            item.assume(t, true, *point);
                            item.pc += 1;
                        }
                    }
                }
                Instr::Branch {
                    point,
                    test,
                    on_true,
                    on_false,
                } => {
                    let (point, on_true, on_false) = (*point, *on_true, *on_false);
                    let is_guard = self
                        .program
                        .branch_point(point)
                        .map_or(false, BranchPoint::is_loop_guard);
                    let visits = {
                        let v = item.visits.entry(point).or_insert(0);
                        *v += 1;
                        *v
                    };
                    if is_guard && visits > self.fuel {
                        item.decide(point, false, DecisionKind::FuelExhausted);
                        item.pc = on_false;
                        continue;
                    }

                    let t = item.eval(test);
                    if let Some(taken) = fold::truth(&t) {
                        item.decide(point, taken, DecisionKind::Folded);
                        item.pc = if taken { on_true } else { on_false };
                        continue;
                    }

                    if self.max_depth.is_reached(item.depth) {
                        let reason = format!("max_depth {} reached", self.max_depth);
                        return Step::Emit(item, Terminal::Truncated { reason });
                    }

                    let mut other = item.clone();
                    item.assume(t.clone(), true, point);
                    item.decide(point, true, DecisionKind::Forked);
                    item.depth += 1;
                    item.pc = on_true;

                    other.assume(t, false, point);
                    other.decide(point, false, DecisionKind::Forked);
                    other.depth += 1;
                    other.pc = on_false;
                    return Step::Fork(item, other);
                }
            }
        }
    }

    fn finish(&mut self, item: WorkItem, terminal: Terminal) -> SymbolicPath {
        let id = self.next_id;
        self.next_id += 1;
        for d in &item.decisions {
            if d.kind != DecisionKind::FuelExhausted {
                self.covered.insert((d.branch, d.outcome));
            }
        }
        trace!(
            path = id,
            conditions = item.conditions.len(),
            depth = item.depth,
            "Path extracted"
        );
        SymbolicPath::new(
            id,
            item.conditions,
            item.decisions,
            item.depth,
            terminal,
            item.symbols,
        )
    }
}

impl Iterator for PathIter {
    type Item = SymbolicPath;

    fn next(&mut self) -> Option<SymbolicPath> {
        while let Some(item) = self.pop() {
            match self.advance(item) {
                Step::Emit(item, terminal) => return Some(self.finish(item, terminal)),
                Step::Fork(taken, other) => {
                    // the true edge is explored first in both orders
                    if matches!(self.worklist, Worklist::Stack(_)) {
                        self.push(other);
                        self.push(taken);
                    } else {
                        self.push(taken);
                        self.push(other);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureFlags, Tier};
    use crate::features::parsing::parse_source;

    fn extract(src: &str, snapshot: &CapabilitySnapshot) -> Vec<SymbolicPath> {
        let module = parse_source(src, "python").unwrap();
        let func = module.function(None).unwrap();
        PathExtractor::new(snapshot).paths(func).unwrap().collect()
    }

    fn enterprise() -> CapabilitySnapshot {
        CapabilitySnapshot::for_tier(Tier::Enterprise).max_loop_iterations(3)
    }

    #[test]
    fn test_two_way_branch() {
        let paths = extract(
            "def f(x):\n    if x > 0:\n        return 1\n    return 2\n",
            &enterprise(),
        );
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].describe_conditions(), "x > 0");
        assert_eq!(paths[1].describe_conditions(), "x <= 0");
        assert_eq!(paths[0].id(), 0);
        assert_eq!(paths[1].id(), 1);
    }

    #[test]
    fn test_locals_are_substituted() {
        let paths = extract(
            "def f(x):\n    y = x + 1\n    if y > 10:\n        return y\n    return 0\n",
            &enterprise(),
        );
        assert_eq!(paths[0].describe_conditions(), "(x + 1) > 10");
        assert_eq!(
            paths[0].terminal(),
            &Terminal::Return {
                value: Some(Expr::arith(
                    crate::features::parsing::domain::ArithOp::Add,
                    Expr::name("x"),
                    Expr::int(1)
                ))
            }
        );
    }

    #[test]
    fn test_constant_guard_folds() {
        let paths = extract(
            "def f(x):\n    y = 5\n    if y > 3:\n        return 1\n    return 2\n",
            &enterprise(),
        );
        assert_eq!(paths.len(), 1);
        assert!(paths[0].conditions().is_empty());
        assert_eq!(paths[0].decisions()[0].kind, DecisionKind::Folded);
    }

    #[test]
    fn test_loop_fuel_bounds_paths() {
        let paths = extract(
            "def f(x):\n    while x > 0:\n        x = x - 1\n    return x\n",
            &enterprise(),
        );
        // exits after 0, 1, 2 iterations plus the forced exit after 3
        assert_eq!(paths.len(), 4);
        let forced: Vec<_> = paths.iter().filter(|p| p.fuel_exhausted().count() > 0).collect();
        assert_eq!(forced.len(), 1);
        assert_eq!(forced[0].conditions().len(), 3);
    }

    #[test]
    fn test_fuel_is_consistent_across_siblings() {
        let snapshot = enterprise().max_loop_iterations(3);
        let paths = extract(
            "def f(x):\n    while True:\n        if x > 0:\n            x = x - 1\n    return x\n",
            &snapshot,
        );
        // one fork per unrolled iteration
        assert_eq!(paths.len(), 8);
        for path in &paths {
            let guard_visits: Vec<_> = path
                .decisions()
                .iter()
                .filter(|d| d.kind != DecisionKind::Forked)
                .collect();
            assert_eq!(guard_visits.len(), 4);
            assert_eq!(guard_visits[3].kind, DecisionKind::FuelExhausted);
        }
    }

    #[test]
    fn test_infinite_loop_terminates() {
        let paths = extract(
            "def f(x):\n    while True:\n        x = x + 1\n    return x\n",
            &enterprise(),
        );
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].fuel_exhausted().count(), 1);
    }

    #[test]
    fn test_depth_budget_truncates() {
        let snapshot = enterprise().max_depth(Limit::Finite(1));
        let paths = extract(
            "def f(a, b):\n    if a > 0:\n        a = 1\n    if b > 0:\n        return 1\n    return 0\n",
            &snapshot,
        );
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.is_truncated()));
        assert!(paths.iter().all(|p| p.depth() <= 1));
    }

    #[test]
    fn test_calls_become_opaque_symbols() {
        let paths = extract(
            "def f(x):\n    if compute(x) > 0:\n        return 1\n    return 0\n",
            &enterprise(),
        );
        assert_eq!(paths[0].describe_conditions(), "__call_compute_0 > 0");
        assert!(paths[0].symbols().contains_key("__call_compute_0"));
    }

    #[test]
    fn test_prioritized_order_is_deterministic() {
        let snapshot = enterprise().features(FeatureFlags {
            smart_path_prioritization: true,
            ..FeatureFlags::default()
        });
        let src = "def f(a, b):\n    if a > 0:\n        if b > 0:\n            return 1\n    return 0\n";
        let first: Vec<_> = extract(src, &snapshot)
            .iter()
            .map(|p| p.describe_conditions())
            .collect();
        let second: Vec<_> = extract(src, &snapshot)
            .iter()
            .map(|p| p.describe_conditions())
            .collect();
        assert_eq!(first, second);
        // the shortest condition list surfaces first
        assert_eq!(first[0], "a <= 0");
    }

    #[test]
    fn test_range_loop_folds_counter() {
        let paths = extract(
            "def f(n):\n    total = 0\n    for i in range(n):\n        total = total + i\n    return total\n",
            &enterprise(),
        );
        assert_eq!(paths.len(), 4);
        assert_eq!(paths.last().map(|p| p.describe_conditions()).as_deref(), Some("0 >= n"));
    }
}
