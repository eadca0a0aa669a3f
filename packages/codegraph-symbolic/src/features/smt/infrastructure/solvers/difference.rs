//! Difference-constraint contradiction check
//!
//! Integer atoms of the form `x + a <op> y + b` become edges of a constraint
//! graph (`x - y <= w`); a negative cycle proves the conjunction unsatisfiable.
//! Catches relational contradictions such as `x < y && y < x` that per-variable
//! intervals cannot see.

use crate::features::parsing::domain::{ArithOp, CmpOp};
use crate::features::smt::domain::{Problem, Sort, Term};
use rustc_hash::FxHashMap;

/// Node 0 is the constant zero
const ZERO: usize = 0;

#[derive(Debug, Default)]
pub struct DifferenceGraph {
    nodes: FxHashMap<String, usize>,
    /// (from, to, weight): to - from <= weight
    edges: Vec<(usize, usize, i128)>,
}

/// `var + offset`, or a bare constant when `var` is `None`
fn linear<'t>(term: &'t Term, problem: &Problem) -> Option<(Option<&'t str>, i128)> {
    match term {
        Term::Int(c) => Some((None, i128::from(*c))),
        Term::Var(name) if problem.sort_of(name) == Some(Sort::Int) => Some((Some(name), 0)),
        Term::Arith { op, left, right } => {
            let (lv, lo) = linear(left, problem)?;
            let (rv, ro) = linear(right, problem)?;
            match (op, lv, rv) {
                (ArithOp::Add, v, None) | (ArithOp::Add, None, v) => Some((v, lo + ro)),
                (ArithOp::Sub, v, None) => Some((v, lo - ro)),
                _ => None,
            }
        }
        _ => None,
    }
}

impl DifferenceGraph {
    pub fn from_problem(problem: &Problem) -> Self {
        let mut graph = Self::default();
        graph.nodes.insert(String::new(), ZERO);
        for assertion in &problem.assertions {
            graph.add_atom(assertion, problem);
        }
        graph
    }

    fn node(&mut self, var: Option<&str>) -> usize {
        match var {
            None => ZERO,
            Some(name) => {
                let next = self.nodes.len();
                *self.nodes.entry(name.to_string()).or_insert(next)
            }
        }
    }

    /// x - y <= w
    fn constrain(&mut self, x: usize, y: usize, w: i128) {
        self.edges.push((y, x, w));
    }

    fn add_atom(&mut self, term: &Term, problem: &Problem) {
        let Term::Cmp { op, left, right } = term else {
            return;
        };
        let (Some((xv, a)), Some((yv, b))) = (linear(left, problem), linear(right, problem)) else {
            return;
        };
        if xv.is_none() && yv.is_none() {
            return;
        }
        let x = self.node(xv);
        let y = self.node(yv);
        // x + a <op> y + b   <=>   x - y <op> b - a
        let d = b - a;
        match op {
            CmpOp::Le => self.constrain(x, y, d),
            CmpOp::Lt => self.constrain(x, y, d - 1),
            CmpOp::Ge => self.constrain(y, x, -d),
            CmpOp::Gt => self.constrain(y, x, -d - 1),
            CmpOp::Eq => {
                self.constrain(x, y, d);
                self.constrain(y, x, -d);
            }
            CmpOp::Ne | CmpOp::In | CmpOp::NotIn => {}
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Bellman-Ford from a virtual source connected to every node
    pub fn has_negative_cycle(&self) -> bool {
        if self.edges.is_empty() {
            return false;
        }
        let n = self.nodes.len();
        let mut dist = vec![0i128; n];
        for _ in 0..n {
            let mut changed = false;
            for &(from, to, w) in &self.edges {
                let candidate = dist[from] + w;
                if candidate < dist[to] {
                    dist[to] = candidate;
                    changed = true;
                }
            }
            if !changed {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(atoms: Vec<Term>) -> Problem {
        let mut p = Problem::new();
        p.declare("x", Sort::Int);
        p.declare("y", Sort::Int);
        p.declare("z", Sort::Int);
        for a in atoms {
            p.assert(a);
        }
        p
    }

    #[test]
    fn test_cycle_detection() {
        let p = problem(vec![
            Term::cmp(CmpOp::Lt, Term::var("x"), Term::var("y")),
            Term::cmp(CmpOp::Lt, Term::var("y"), Term::var("z")),
            Term::cmp(CmpOp::Lt, Term::var("z"), Term::var("x")),
        ]);
        assert!(DifferenceGraph::from_problem(&p).has_negative_cycle());
    }

    #[test]
    fn test_consistent_chain() {
        let p = problem(vec![
            Term::cmp(CmpOp::Lt, Term::var("x"), Term::var("y")),
            Term::cmp(CmpOp::Le, Term::var("y"), Term::var("z")),
            Term::cmp(CmpOp::Ge, Term::var("x"), Term::Int(0)),
        ]);
        assert!(!DifferenceGraph::from_problem(&p).has_negative_cycle());
    }

    #[test]
    fn test_offsets_and_bounds() {
        // x + 1 > y, y > 10, x < 5
        let p = problem(vec![
            Term::cmp(
                CmpOp::Gt,
                Term::arith(ArithOp::Add, Term::var("x"), Term::Int(1)),
                Term::var("y"),
            ),
            Term::cmp(CmpOp::Gt, Term::var("y"), Term::Int(10)),
            Term::cmp(CmpOp::Lt, Term::var("x"), Term::Int(5)),
        ]);
        assert!(DifferenceGraph::from_problem(&p).has_negative_cycle());
    }
}
