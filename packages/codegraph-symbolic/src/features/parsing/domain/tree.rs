//! Normalized syntax tree
//!
//! A closed, language-neutral statement/expression tree. Every front end
//! lowers into these types; every consumer matches on them exhaustively, so
//! adding a variant is a compile error everywhere it is not handled.

use super::language::Language;
use crate::errors::{Result, SymbolicError};
use crate::shared::{NativeValue, Span, SymbolicType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CmpOp {
    /// Logical complement (`<` becomes `>=`)
    pub fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
            Self::In => Self::NotIn,
            Self::NotIn => Self::In,
        }
    }

    /// Operator with swapped operands (`a < b` is `b > a`). Membership has no mirror.
    pub fn flip(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Eq),
            Self::Ne => Some(Self::Ne),
            Self::Lt => Some(Self::Gt),
            Self::Le => Some(Self::Ge),
            Self::Gt => Some(Self::Lt),
            Self::Ge => Some(Self::Le),
            Self::In | Self::NotIn => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Name(String),
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Neg(Box<Expr>),
    /// `len(x)`, the one interpreted builtin
    Len(Box<Expr>),
    /// Call to an unresolved function; evaluates to a fresh opaque symbol
    Call { callee: String, args: Vec<Expr> },
    /// Recognized but unmodeled expression, kept as source text
    Opaque(String),
}

impl Expr {
    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into())
    }

    pub fn int(v: i64) -> Self {
        Expr::Int(v)
    }

    pub fn str(v: impl Into<String>) -> Self {
        Expr::Str(v.into())
    }

    pub fn compare(op: CmpOp, left: Expr, right: Expr) -> Self {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn arith(op: ArithOp, left: Expr, right: Expr) -> Self {
        Expr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn len(inner: Expr) -> Self {
        Expr::Len(Box::new(inner))
    }

    pub fn is_literal(&self) -> bool {
        match self {
            Expr::Int(_) | Expr::Float(_) | Expr::Bool(_) | Expr::Str(_) | Expr::None => true,
            Expr::List(items) => items.iter().all(Expr::is_literal),
            Expr::Dict(entries) => entries.iter().all(|(k, v)| k.is_literal() && v.is_literal()),
            _ => false,
        }
    }

    /// Literal value, if the expression is one
    pub fn as_literal(&self) -> Option<NativeValue> {
        match self {
            Expr::Int(v) => Some(NativeValue::Int(*v)),
            Expr::Float(v) => Some(NativeValue::Float(*v)),
            Expr::Bool(v) => Some(NativeValue::Bool(*v)),
            Expr::Str(v) => Some(NativeValue::Str(v.clone())),
            Expr::None => Some(NativeValue::None),
            Expr::List(items) => items
                .iter()
                .map(Expr::as_literal)
                .collect::<Option<Vec<_>>>()
                .map(NativeValue::List),
            Expr::Dict(entries) => entries
                .iter()
                .map(|(k, v)| Some((k.as_literal()?, v.as_literal()?)))
                .collect::<Option<Vec<_>>>()
                .map(NativeValue::Dict),
            _ => None,
        }
    }

    /// Type tag of a literal
    pub fn literal_type(&self) -> Option<SymbolicType> {
        match self {
            Expr::Int(_) => Some(SymbolicType::Int),
            Expr::Float(_) => Some(SymbolicType::Float),
            Expr::Bool(_) => Some(SymbolicType::Bool),
            Expr::Str(_) => Some(SymbolicType::String),
            Expr::List(_) => Some(SymbolicType::List),
            Expr::Dict(_) => Some(SymbolicType::Dict),
            _ => None,
        }
    }

    /// Logical complement, pushing the negation into comparisons
    pub fn negated(&self) -> Expr {
        match self {
            Expr::Not(inner) => (**inner).clone(),
            Expr::Bool(b) => Expr::Bool(!b),
            Expr::Compare { op, left, right } => Expr::Compare {
                op: op.negate(),
                left: left.clone(),
                right: right.clone(),
            },
            Expr::Logical { op, left, right } => Expr::Logical {
                op: match op {
                    LogicalOp::And => LogicalOp::Or,
                    LogicalOp::Or => LogicalOp::And,
                },
                left: Box::new(left.negated()),
                right: Box::new(right.negated()),
            },
            other => Expr::Not(Box::new(other.clone())),
        }
    }

    /// Every `Name` referenced, in first-occurrence order
    pub fn free_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            Expr::Name(n) => {
                if !out.contains(n) {
                    out.push(n.clone());
                }
            }
            Expr::Int(_)
            | Expr::Float(_)
            | Expr::Bool(_)
            | Expr::Str(_)
            | Expr::None
            | Expr::Opaque(_) => {}
            Expr::List(items) => items.iter().for_each(|e| e.collect_names(out)),
            Expr::Dict(entries) => entries.iter().for_each(|(k, v)| {
                k.collect_names(out);
                v.collect_names(out);
            }),
            Expr::Compare { left, right, .. }
            | Expr::Logical { left, right, .. }
            | Expr::Arith { left, right, .. } => {
                left.collect_names(out);
                right.collect_names(out);
            }
            Expr::Not(inner) | Expr::Neg(inner) | Expr::Len(inner) => inner.collect_names(out),
            Expr::Call { args, .. } => args.iter().for_each(|e| e.collect_names(out)),
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::Compare { .. } | Expr::Logical { .. } | Expr::Arith { .. } | Expr::Not(_)
        )
    }
}

fn fmt_operand(f: &mut fmt::Formatter<'_>, e: &Expr) -> fmt::Result {
    if e.is_compound() {
        write!(f, "({})", e)
    } else {
        write!(f, "{}", e)
    }
}

fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Python-like rendering, used in path descriptions
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{}", v),
            Expr::Float(v) => write!(f, "{}", NativeValue::Float(*v)),
            Expr::Bool(v) => write!(f, "{}", NativeValue::Bool(*v)),
            Expr::Str(v) => write!(f, "{}", NativeValue::Str(v.clone())),
            Expr::None => f.write_str("None"),
            Expr::List(items) => {
                f.write_str("[")?;
                fmt_list(f, items)?;
                f.write_str("]")
            }
            Expr::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Expr::Name(n) => f.write_str(n),
            Expr::Compare { op, left, right } => {
                fmt_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                fmt_operand(f, right)
            }
            Expr::Logical { op, left, right } => {
                let word = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                fmt_operand(f, left)?;
                write!(f, " {} ", word)?;
                fmt_operand(f, right)
            }
            Expr::Not(inner) => {
                f.write_str("not ")?;
                fmt_operand(f, inner)
            }
            Expr::Arith { op, left, right } => {
                fmt_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                fmt_operand(f, right)
            }
            Expr::Neg(inner) => {
                f.write_str("-")?;
                fmt_operand(f, inner)
            }
            Expr::Len(inner) => write!(f, "len({})", inner),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                fmt_list(f, args)?;
                f.write_str(")")
            }
            Expr::Opaque(text) => f.write_str(text),
        }
    }
}

/// One `except` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    /// Exception class name; `None` for a bare `except:`
    pub kind: Option<String>,
    /// Bound name (`except E as e`)
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Statement node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Assign {
        target: String,
        value: Expr,
        span: Span,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        span: Span,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        span: Span,
    },
    For {
        target: String,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        span: Span,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Raise {
        kind: Option<String>,
        span: Span,
    },
    Assert {
        test: Expr,
        span: Span,
    },
    Expr {
        value: Expr,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Pass,
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Raise { span, .. }
            | Stmt::Assert { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span } => *span,
            Stmt::Pass => Span::zero(),
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub annotation: Option<SymbolicType>,
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }

    pub fn typed(name: impl Into<String>, ty: SymbolicType) -> Self {
        Self {
            name: name.into(),
            annotation: Some(ty),
            default: None,
        }
    }
}

/// One function, the unit of exploration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
    pub language: Language,
    /// Original text, used when rendering test modules
    pub source_text: Option<String>,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params,
            body,
            span: Span::zero(),
            language: Language::Python,
            source_text: None,
        }
    }

    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A lowered source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceModule {
    pub language: Language,
    pub functions: Vec<FunctionDef>,
}

impl SourceModule {
    /// Look up an entry point; `None` selects the first function
    pub fn function(&self, name: Option<&str>) -> Result<&FunctionDef> {
        match name {
            Some(name) => self
                .functions
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| SymbolicError::EntryPointNotFound(name.to_string())),
            None => self
                .functions
                .first()
                .ok_or_else(|| SymbolicError::EntryPointNotFound("<first function>".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_python_like() {
        let e = Expr::and(
            Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(0)),
            Expr::compare(
                CmpOp::Le,
                Expr::arith(ArithOp::Add, Expr::name("y"), Expr::int(1)),
                Expr::int(10),
            ),
        );
        assert_eq!(e.to_string(), "(x > 0) and ((y + 1) <= 10)");
        assert_eq!(
            Expr::compare(CmpOp::NotIn, Expr::str("k"), Expr::name("d")).to_string(),
            "'k' not in d"
        );
    }

    #[test]
    fn test_negation_pushes_into_comparisons() {
        let e = Expr::compare(CmpOp::Lt, Expr::name("x"), Expr::int(0));
        assert_eq!(
            e.negated(),
            Expr::compare(CmpOp::Ge, Expr::name("x"), Expr::int(0))
        );
        assert_eq!(Expr::not(Expr::name("flag")).negated(), Expr::name("flag"));
        assert_eq!(Expr::name("flag").negated(), Expr::not(Expr::name("flag")));
    }

    #[test]
    fn test_free_names_first_occurrence_order() {
        let e = Expr::and(
            Expr::compare(CmpOp::Gt, Expr::name("b"), Expr::name("a")),
            Expr::compare(CmpOp::Gt, Expr::len(Expr::name("b")), Expr::int(0)),
        );
        assert_eq!(e.free_names(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_missing_entry_point() {
        let module = SourceModule {
            language: Language::Python,
            functions: vec![FunctionDef::new("f", vec![], vec![Stmt::Pass])],
        };
        assert!(module.function(Some("f")).is_ok());
        assert!(module.function(None).is_ok());
        assert!(matches!(
            module.function(Some("g")),
            Err(SymbolicError::EntryPointNotFound(_))
        ));
    }
}
