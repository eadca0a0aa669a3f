//! Branch program
//!
//! A function body compiled to a flat instruction list whose only
//! divergence points are `Branch` instructions, one per `BranchPoint`.
//! Loops become guarded back edges, `for` loops iterate a hidden index,
//! `try` handlers become binary "raises?" branches and `finally` bodies are
//! inlined on every exit edge. Both the path extractor and the concrete
//! interpreter walk this form, so their branch traces line up.

use crate::errors::{Result, SymbolicError};
use crate::features::parsing::domain::{ArithOp, CmpOp, ExceptHandler, Expr, FunctionDef, Stmt};
use crate::features::symbolic::domain::{BranchId, BranchKind, BranchPoint};
use crate::shared::Span;

const UNPATCHED: usize = usize::MAX;

/// Name prefix of the per-handler "raises?" switch
pub const RAISES_PREFIX: &str = "__raises_";

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Assign {
        target: String,
        value: Expr,
    },
    /// `target = next(iter)` for the hidden iterator and index of a `for` loop
    Element {
        target: String,
        iter: String,
        index: String,
    },
    /// Bind `target` to an unknown value (`except E as e`)
    Havoc {
        target: String,
    },
    Branch {
        point: BranchId,
        test: Expr,
        on_true: usize,
        on_false: usize,
    },
    /// `assert` without formal verification: the test simply holds
    Assume {
        point: BranchId,
        test: Expr,
    },
    Jump(usize),
    Return(Option<Expr>),
    Raise(Option<String>),
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instrs: Vec<Instr>,
    pub branch_points: Vec<BranchPoint>,
}

impl Program {
    pub fn compile(func: &FunctionDef, formal_verification: bool) -> Result<Program> {
        let mut c = Compiler {
            instrs: Vec::new(),
            points: Vec::new(),
            loops: Vec::new(),
            tries: Vec::new(),
            finally_stack: Vec::new(),
            formal: formal_verification,
        };
        c.block(&func.body)?;
        c.emit(Instr::End);

        let mut program = Program {
            instrs: c.instrs,
            branch_points: c.points,
        };
        for instr in &program.instrs {
            if let Instr::Branch {
                point,
                on_true,
                on_false,
                ..
            } = instr
            {
                if let Some(bp) = program.branch_points.get_mut(*point as usize) {
                    bp.successors = [*on_true, *on_false];
                }
            }
        }
        Ok(program)
    }

    pub fn branch_point(&self, id: BranchId) -> Option<&BranchPoint> {
        self.branch_points.get(id as usize)
    }
}

struct LoopCtx {
    /// Known for `while` (the guard); patched later for `for` (the increment)
    continue_target: Option<usize>,
    continue_patches: Vec<usize>,
    break_patches: Vec<usize>,
}

struct TryScope {
    handlers: Vec<(Option<String>, Vec<usize>)>,
    /// `finally_stack` length outside this `try`
    finally_depth: usize,
}

struct Compiler {
    instrs: Vec<Instr>,
    points: Vec<BranchPoint>,
    loops: Vec<LoopCtx>,
    tries: Vec<TryScope>,
    finally_stack: Vec<Vec<Stmt>>,
    formal: bool,
}

fn catches(handler: &Option<String>, raised: &Option<String>) -> bool {
    match (handler.as_deref(), raised.as_deref()) {
        (None, _) => true,
        (Some("Exception" | "BaseException"), Some(_)) => true,
        (Some(h), Some(r)) => h == r,
        // bare `raise` re-raises something unknown
        (Some(_), None) => false,
    }
}

impl Compiler {
    fn emit(&mut self, instr: Instr) -> usize {
        self.instrs.push(instr);
        self.instrs.len() - 1
    }

    fn here(&self) -> usize {
        self.instrs.len()
    }

    fn point(&mut self, expr: &Expr, kind: BranchKind, span: Span) -> BranchId {
        let id = self.points.len() as BranchId;
        self.points.push(BranchPoint {
            id,
            span,
            expr: expr.clone(),
            kind,
            successors: [UNPATCHED, UNPATCHED],
        });
        id
    }

    fn patch_jump(&mut self, at: usize, target: usize) {
        if let Some(Instr::Jump(t)) = self.instrs.get_mut(at) {
            *t = target;
        }
    }

    fn patch_false(&mut self, at: usize, target: usize) {
        if let Some(Instr::Branch { on_false, .. }) = self.instrs.get_mut(at) {
            *on_false = target;
        }
    }

    fn patch_true(&mut self, at: usize, target: usize) {
        if let Some(Instr::Branch { on_true, .. }) = self.instrs.get_mut(at) {
            *on_true = target;
        }
    }

    fn block(&mut self, body: &[Stmt]) -> Result<()> {
        body.iter().try_for_each(|s| self.stmt(s))
    }

    /// Inline `finally` bodies from `from` outward-in, innermost first
    fn emit_finally_from(&mut self, from: usize) -> Result<()> {
        let saved = self.finally_stack.clone();
        for i in (from..saved.len()).rev() {
            self.finally_stack.truncate(i);
            self.block(&saved[i])?;
        }
        self.finally_stack = saved;
        Ok(())
    }

    fn raise(&mut self, kind: Option<String>) -> Result<()> {
        let target = self.tries.iter().enumerate().rev().find_map(|(scope, t)| {
            t.handlers
                .iter()
                .position(|(h, _)| catches(h, &kind))
                .map(|handler| (scope, handler, t.finally_depth))
        });
        match target {
            Some((scope, handler, finally_depth)) => {
                // the matching try's own finally runs after its handler
                self.emit_finally_from(finally_depth + 1)?;
                let at = self.emit(Instr::Jump(UNPATCHED));
                self.tries[scope].handlers[handler].1.push(at);
            }
            None => {
                self.emit_finally_from(0)?;
                self.emit(Instr::Raise(kind));
            }
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Pass | Stmt::Expr { .. } => {}
            Stmt::Assign { target, value, .. } => {
                self.emit(Instr::Assign {
                    target: target.clone(),
                    value: value.clone(),
                });
            }
            Stmt::Return { value, .. } => {
                self.emit_finally_from(0)?;
                self.emit(Instr::Return(value.clone()));
            }
            Stmt::Raise { kind, .. } => self.raise(kind.clone())?,
            Stmt::Assert { test, span } => {
                let point = self.point(test, BranchKind::Assertion, *span);
                if self.formal {
                    let here = self.here();
                    let b = self.emit(Instr::Branch {
                        point,
                        test: test.clone(),
                        on_true: here + 1,
                        on_false: UNPATCHED,
                    });
                    let skip = self.emit(Instr::Jump(UNPATCHED));
                    let failed = self.here();
                    self.patch_false(b, failed);
                    self.raise(Some("AssertionError".to_string()))?;
                    let after = self.here();
                    self.patch_jump(skip, after);
                } else {
                    self.emit(Instr::Assume {
                        point,
                        test: test.clone(),
                    });
                }
            }
            Stmt::If {
                test,
                body,
                orelse,
                span,
            } => {
                let point = self.point(test, BranchKind::Conditional, *span);
                let here = self.here();
                let b = self.emit(Instr::Branch {
                    point,
                    test: test.clone(),
                    on_true: here + 1,
                    on_false: UNPATCHED,
                });
                self.block(body)?;
                let j = self.emit(Instr::Jump(UNPATCHED));
                let else_start = self.here();
                self.patch_false(b, else_start);
                self.block(orelse)?;
                let after = self.here();
                self.patch_jump(j, after);
            }
            Stmt::While {
                test,
                body,
                orelse,
                span,
            } => {
                let point = self.point(test, BranchKind::LoopGuard, *span);
                let guard = self.emit(Instr::Branch {
                    point,
                    test: test.clone(),
                    on_true: UNPATCHED,
                    on_false: UNPATCHED,
                });
                self.patch_true(guard, guard + 1);
                self.loops.push(LoopCtx {
                    continue_target: Some(guard),
                    continue_patches: Vec::new(),
                    break_patches: Vec::new(),
                });
                self.block(body)?;
                self.emit(Instr::Jump(guard));
                self.finish_loop(guard, guard, orelse)?;
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
                span,
            } => self.for_loop(target, iter, body, orelse, *span)?,
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            } => self.try_stmt(body, handlers, orelse, finalbody)?,
            Stmt::Break { span } => {
                let at = self.emit(Instr::Jump(UNPATCHED));
                match self.loops.last_mut() {
                    Some(ctx) => ctx.break_patches.push(at),
                    None => {
                        return Err(SymbolicError::parse_structure_at(
                            "'break' outside loop",
                            span.start_line,
                        ))
                    }
                }
            }
            Stmt::Continue { span } => {
                let at = self.emit(Instr::Jump(UNPATCHED));
                match self.loops.last_mut() {
                    Some(ctx) => match ctx.continue_target {
                        Some(target) => {
                            if let Some(Instr::Jump(t)) = self.instrs.get_mut(at) {
                                *t = target;
                            }
                        }
                        None => ctx.continue_patches.push(at),
                    },
                    None => {
                        return Err(SymbolicError::parse_structure_at(
                            "'continue' not properly in loop",
                            span.start_line,
                        ))
                    }
                }
            }
        }
        Ok(())
    }

    /// Pop the loop context, lay out `else`, patch `continue` and `break`
    fn finish_loop(&mut self, guard: usize, continue_target: usize, orelse: &[Stmt]) -> Result<()> {
        let ctx = self.loops.pop().ok_or_else(|| {
            SymbolicError::parse_structure("loop context missing while closing loop")
        })?;
        for at in ctx.continue_patches {
            self.patch_jump(at, continue_target);
        }
        let exit = self.here();
        self.patch_false(guard, exit);
        self.block(orelse)?;
        let after = self.here();
        for at in ctx.break_patches {
            self.patch_jump(at, after);
        }
        Ok(())
    }

    fn for_loop(
        &mut self,
        target: &str,
        iter: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        span: Span,
    ) -> Result<()> {
        let id = self.points.len();
        let range = match iter {
            Expr::Call { callee, args } if callee == "range" => range_bounds(args),
            _ => None,
        };

        let (test, step_instr, element) = match range {
            Some((start, stop, step)) => {
                let counter = format!("__range_{}", id);
                let limit = format!("__stop_{}", id);
                self.emit(Instr::Assign {
                    target: counter.clone(),
                    value: start,
                });
                self.emit(Instr::Assign {
                    target: limit.clone(),
                    value: stop,
                });
                let op = if step > 0 { CmpOp::Lt } else { CmpOp::Gt };
                let test = Expr::compare(op, Expr::name(&counter), Expr::name(&limit));
                let step_instr = Instr::Assign {
                    target: counter.clone(),
                    value: Expr::arith(ArithOp::Add, Expr::name(&counter), Expr::int(step)),
                };
                let element = Instr::Assign {
                    target: target.to_string(),
                    value: Expr::name(&counter),
                };
                (test, step_instr, element)
            }
            None => {
                let it = format!("__iter_{}", id);
                let index = format!("__index_{}", id);
                self.emit(Instr::Assign {
                    target: it.clone(),
                    value: iter.clone(),
                });
                self.emit(Instr::Assign {
                    target: index.clone(),
                    value: Expr::int(0),
                });
                let test = Expr::compare(CmpOp::Gt, Expr::len(Expr::name(&it)), Expr::name(&index));
                let step_instr = Instr::Assign {
                    target: index.clone(),
                    value: Expr::arith(ArithOp::Add, Expr::name(&index), Expr::int(1)),
                };
                let element = Instr::Element {
                    target: target.to_string(),
                    iter: it,
                    index,
                };
                (test, step_instr, element)
            }
        };

        let point = self.point(&test, BranchKind::LoopGuard, span);
        let guard = self.emit(Instr::Branch {
            point,
            test,
            on_true: UNPATCHED,
            on_false: UNPATCHED,
        });
        self.patch_true(guard, guard + 1);
        self.emit(element);
        self.loops.push(LoopCtx {
            continue_target: None,
            continue_patches: Vec::new(),
            break_patches: Vec::new(),
        });
        self.block(body)?;
        let increment = self.emit(step_instr);
        self.emit(Instr::Jump(guard));
        self.finish_loop(guard, increment, orelse)
    }

    fn try_stmt(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
    ) -> Result<()> {
        // one "raises?" branch per handler, in clause order
        let mut dispatch = Vec::with_capacity(handlers.len());
        for handler in handlers {
            let id = self.points.len();
            let switch = Expr::name(format!("{}{}", RAISES_PREFIX, id));
            let point = self.point(
                &switch,
                BranchKind::ExceptionHandler {
                    exception: handler.kind.clone(),
                },
                handler.span,
            );
            let here = self.here();
            let b = self.emit(Instr::Branch {
                point,
                test: switch,
                on_true: UNPATCHED,
                on_false: here + 1,
            });
            dispatch.push(b);
        }

        let finally_depth = self.finally_stack.len();
        self.finally_stack.push(finalbody.to_vec());
        self.tries.push(TryScope {
            handlers: handlers.iter().map(|h| (h.kind.clone(), Vec::new())).collect(),
            finally_depth,
        });
        self.block(body)?;
        let scope = self.tries.pop().ok_or_else(|| {
            SymbolicError::parse_structure("try scope missing while closing try")
        })?;
        self.finally_stack.pop();

        self.block(orelse)?;
        self.block(finalbody)?;
        let mut exits = vec![self.emit(Instr::Jump(UNPATCHED))];

        for ((handler, (_, raise_sites)), b) in handlers.iter().zip(scope.handlers).zip(dispatch) {
            let start = self.here();
            self.patch_true(b, start);
            for at in raise_sites {
                self.patch_jump(at, start);
            }
            if let Some(name) = &handler.name {
                self.emit(Instr::Havoc {
                    target: name.clone(),
                });
            }
            self.finally_stack.push(finalbody.to_vec());
            self.block(&handler.body)?;
            self.finally_stack.pop();
            self.block(finalbody)?;
            exits.push(self.emit(Instr::Jump(UNPATCHED)));
        }

        let after = self.here();
        for at in exits {
            self.patch_jump(at, after);
        }
        Ok(())
    }
}

/// `(start, stop, step)` for `range(...)` with a literal, non-zero step
fn range_bounds(args: &[Expr]) -> Option<(Expr, Expr, i64)> {
    match args {
        [stop] => Some((Expr::int(0), stop.clone(), 1)),
        [start, stop] => Some((start.clone(), stop.clone(), 1)),
        [start, stop, step] => {
            let step = match step {
                Expr::Int(s) => *s,
                Expr::Neg(inner) => match inner.as_ref() {
                    Expr::Int(s) => -*s,
                    _ => return None,
                },
                _ => return None,
            };
            (step != 0).then(|| (start.clone(), stop.clone(), step))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::Param;

    fn stmt_if(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
        Stmt::If {
            test,
            body,
            orelse,
            span: Span::zero(),
        }
    }

    fn ret(v: i64) -> Stmt {
        Stmt::Return {
            value: Some(Expr::int(v)),
            span: Span::zero(),
        }
    }

    #[test]
    fn test_if_layout() {
        let func = FunctionDef::new(
            "f",
            vec![Param::new("x")],
            vec![stmt_if(
                Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(0)),
                vec![ret(1)],
                vec![ret(2)],
            )],
        );
        let program = Program::compile(&func, false).unwrap();
        assert_eq!(program.branch_points.len(), 1);
        let [t, f] = program.branch_points[0].successors;
        assert_eq!(program.instrs[t], Instr::Return(Some(Expr::int(1))));
        assert_eq!(program.instrs[f], Instr::Return(Some(Expr::int(2))));
    }

    #[test]
    fn test_break_outside_loop_is_structural_error() {
        let func = FunctionDef::new("f", vec![], vec![Stmt::Break { span: Span::zero() }]);
        let err = Program::compile(&func, false).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_raise_inside_try_jumps_to_handler() {
        let func = FunctionDef::new(
            "f",
            vec![],
            vec![Stmt::Try {
                body: vec![Stmt::Raise {
                    kind: Some("ValueError".into()),
                    span: Span::zero(),
                }],
                handlers: vec![ExceptHandler {
                    kind: Some("ValueError".into()),
                    name: None,
                    body: vec![ret(7)],
                    span: Span::zero(),
                }],
                orelse: vec![],
                finalbody: vec![],
                span: Span::zero(),
            }],
        );
        let program = Program::compile(&func, false).unwrap();
        assert!(!program.instrs.iter().any(|i| matches!(i, Instr::Raise(_))));
        assert!(matches!(
            program.branch_points[0].kind,
            BranchKind::ExceptionHandler { .. }
        ));
    }

    #[test]
    fn test_formal_assert_adds_failing_edge() {
        let func = FunctionDef::new(
            "f",
            vec![Param::new("x")],
            vec![Stmt::Assert {
                test: Expr::compare(CmpOp::Ge, Expr::name("x"), Expr::int(0)),
                span: Span::zero(),
            }],
        );
        let relaxed = Program::compile(&func, false).unwrap();
        assert!(relaxed.instrs.iter().any(|i| matches!(i, Instr::Assume { .. })));
        let formal = Program::compile(&func, true).unwrap();
        assert!(formal
            .instrs
            .iter()
            .any(|i| matches!(i, Instr::Raise(Some(k)) if k == "AssertionError")));
    }

    #[test]
    fn test_range_loop_uses_counter() {
        let func = FunctionDef::new(
            "f",
            vec![Param::new("n")],
            vec![Stmt::For {
                target: "i".into(),
                iter: Expr::Call {
                    callee: "range".into(),
                    args: vec![Expr::name("n")],
                },
                body: vec![Stmt::Pass],
                orelse: vec![],
                span: Span::zero(),
            }],
        );
        let program = Program::compile(&func, false).unwrap();
        assert_eq!(
            program.branch_points[0].expr.to_string(),
            "__range_0 < __stop_0"
        );
    }
}
