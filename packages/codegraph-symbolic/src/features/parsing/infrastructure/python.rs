//! Python front end
//!
//! Parses with tree-sitter and lowers top-level functions into the
//! normalized tree. Recognized-but-unmodeled expressions become `Opaque`;
//! unknown node kinds and syntax errors are fatal.

use tree_sitter::{Node, Parser as TSParser, Tree};

use crate::errors::{Result, SymbolicError};
use crate::features::parsing::domain::{
    ArithOp, CmpOp, ExceptHandler, Expr, FunctionDef, Language, LogicalOp, Param, SourceModule,
    Stmt,
};
use crate::features::parsing::ports::LanguageFrontend;
use crate::shared::{Span, SymbolicType};

/// Tree-sitter based Python front end
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonFrontend;

impl PythonFrontend {
    pub fn new() -> Self {
        Self
    }

    fn parse_tree(&self, source: &str) -> Result<Tree> {
        let mut parser = TSParser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .map_err(|e| SymbolicError::parse_structure(format!("Failed to set language: {}", e)))?;

        parser
            .parse(source, None)
            .ok_or_else(|| SymbolicError::parse_structure("Failed to parse source code"))
    }
}

impl LanguageFrontend for PythonFrontend {
    fn language(&self) -> Language {
        Language::Python
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext, "py" | "pyi")
    }

    fn lower_module(&self, source: &str) -> Result<SourceModule> {
        let tree = self.parse_tree(source)?;
        let root = tree.root_node();
        let lw = Lowerer { source };

        if root.has_error() {
            if let Some(bad) = first_error(root) {
                return Err(lw.error(
                    bad,
                    format!("syntax error near '{}'", lw.snippet(bad)),
                ));
            }
        }

        let mut functions = Vec::new();
        for child in named(root) {
            match child.kind() {
                "function_definition" => functions.push(lw.function(child)?),
                "decorated_definition" => {
                    if let Some(def) = child.child_by_field_name("definition") {
                        if def.kind() == "function_definition" {
                            functions.push(lw.function(def)?);
                        }
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(functions = functions.len(), "lowered python module");
        Ok(SourceModule {
            language: Language::Python,
            functions,
        })
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() || child.is_missing() {
                if let Some(found) = first_error(child) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Named, non-comment children
fn named(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn parse_int(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    if cleaned.ends_with('j') {
        return None;
    }
    let cleaned = cleaned.trim_end_matches('l');
    if let Some(hex) = cleaned.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = cleaned.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = cleaned.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        cleaned.parse().ok()
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    if cleaned.ends_with('j') || cleaned.ends_with('J') {
        return None;
    }
    cleaned.parse().ok()
}

/// Decode a plain or raw string literal; f-strings and bytes yield `None`
fn decode_string(text: &str) -> Option<String> {
    let quote_at = text.find(|c| c == '\'' || c == '"')?;
    let prefix = text[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }
    let quoted = &text[quote_at..];
    let width = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    if quoted.len() < width * 2 {
        return None;
    }
    let body = quoted.get(width..quoted.len() - width)?;
    if prefix.contains('r') {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\x");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

const OPAQUE_EXPRESSIONS: &[&str] = &[
    "attribute",
    "subscript",
    "list_comprehension",
    "dictionary_comprehension",
    "set_comprehension",
    "generator_expression",
    "lambda",
    "conditional_expression",
    "await",
    "named_expression",
    "ellipsis",
    "slice",
    "list_splat",
    "dictionary_splat",
    "parenthesized_list_splat",
    "yield",
];

const IGNORED_STATEMENTS: &[&str] = &[
    "global_statement",
    "nonlocal_statement",
    "import_statement",
    "import_from_statement",
    "future_import_statement",
    "delete_statement",
    "function_definition",
    "class_definition",
    "decorated_definition",
    "type_alias_statement",
];

struct Lowerer<'s> {
    source: &'s str,
}

impl<'s> Lowerer<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    fn snippet(&self, node: Node<'_>) -> String {
        let text = self.text(node);
        let first_line = text.lines().next().unwrap_or("");
        first_line.chars().take(40).collect()
    }

    fn span(&self, node: Node<'_>) -> Span {
        let start = node.start_position();
        let end = node.end_position();
        Span::new(
            start.row as u32 + 1,
            start.column as u32,
            end.row as u32 + 1,
            end.column as u32,
        )
    }

    fn error(&self, node: Node<'_>, msg: impl Into<String>) -> SymbolicError {
        SymbolicError::parse_structure_at(msg, node.start_position().row as u32 + 1)
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name).ok_or_else(|| {
            self.error(
                node,
                format!("'{}' node is missing its '{}' field", node.kind(), name),
            )
        })
    }

    fn opaque(&self, node: Node<'_>) -> Expr {
        Expr::Opaque(self.text(node).split_whitespace().collect::<Vec<_>>().join(" "))
    }

    // ── definitions ───────────────────────────────────────────────────────

    fn function(&self, node: Node<'_>) -> Result<FunctionDef> {
        let name = self.text(self.field(node, "name")?).to_string();
        let params = match node.child_by_field_name("parameters") {
            Some(p) => self.params(p)?,
            None => Vec::new(),
        };
        let body = self.block(self.field(node, "body")?)?;

        Ok(FunctionDef {
            name,
            params,
            body,
            span: self.span(node),
            language: Language::Python,
            source_text: Some(self.text(node).to_string()),
        })
    }

    fn annotation(&self, node: Node<'_>) -> Option<SymbolicType> {
        node.child_by_field_name("type")
            .and_then(|t| SymbolicType::from_annotation(self.text(t)))
    }

    fn params(&self, node: Node<'_>) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        for child in named(node) {
            match child.kind() {
                "identifier" => params.push(Param::new(self.text(child))),
                "typed_parameter" => {
                    let Some(first) = named(child).into_iter().next() else {
                        continue;
                    };
                    if first.kind() != "identifier" {
                        continue;
                    }
                    params.push(Param {
                        name: self.text(first).to_string(),
                        annotation: self.annotation(child),
                        default: None,
                    });
                }
                "default_parameter" | "typed_default_parameter" => {
                    let name = self.text(self.field(child, "name")?).to_string();
                    let default = self.expr(self.field(child, "value")?)?;
                    params.push(Param {
                        name,
                        annotation: self.annotation(child),
                        default: Some(default),
                    });
                }
                "list_splat_pattern"
                | "dictionary_splat_pattern"
                | "keyword_separator"
                | "positional_separator" => {}
                other => {
                    return Err(self.error(child, format!("unrecognized parameter node '{}'", other)))
                }
            }
        }
        Ok(params)
    }

    // ── statements ────────────────────────────────────────────────────────

    fn block(&self, node: Node<'_>) -> Result<Vec<Stmt>> {
        let mut out = Vec::new();
        if node.kind() == "block" {
            for child in named(node) {
                self.stmt(child, &mut out)?;
            }
        } else {
            self.stmt(node, &mut out)?;
        }
        Ok(out)
    }

    fn stmt(&self, node: Node<'_>, out: &mut Vec<Stmt>) -> Result<()> {
        let span = self.span(node);
        match node.kind() {
            "expression_statement" => {
                for child in named(node) {
                    match child.kind() {
                        "assignment" => self.assignment(child, out)?,
                        "augmented_assignment" => self.augmented_assignment(child, out)?,
                        _ => out.push(Stmt::Expr {
                            value: self.expr(child)?,
                            span,
                        }),
                    }
                }
            }
            "return_statement" => {
                let value = match named(node).into_iter().next() {
                    Some(v) => Some(self.expr(v)?),
                    None => None,
                };
                out.push(Stmt::Return { value, span });
            }
            "raise_statement" => {
                let kind = named(node).into_iter().next().map(|exc| {
                    let class = match exc.kind() {
                        "call" => exc.child_by_field_name("function").unwrap_or(exc),
                        _ => exc,
                    };
                    self.text(class).to_string()
                });
                out.push(Stmt::Raise { kind, span });
            }
            "assert_statement" => {
                let test = named(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.error(node, "assert without a condition"))?;
                out.push(Stmt::Assert {
                    test: self.expr(test)?,
                    span,
                });
            }
            "if_statement" => {
                let test = self.expr(self.field(node, "condition")?)?;
                let body = self.block(self.field(node, "consequence")?)?;
                let alternatives = field_children(node, "alternative");
                let orelse = self.if_chain(&alternatives)?;
                out.push(Stmt::If {
                    test,
                    body,
                    orelse,
                    span,
                });
            }
            "while_statement" => {
                let test = self.expr(self.field(node, "condition")?)?;
                let body = self.block(self.field(node, "body")?)?;
                let orelse = self.else_body(node)?;
                out.push(Stmt::While {
                    test,
                    body,
                    orelse,
                    span,
                });
            }
            "for_statement" => self.for_loop(node, out)?,
            "try_statement" => self.try_stmt(node, out)?,
            "with_statement" => out.extend(self.block(self.field(node, "body")?)?),
            "pass_statement" => out.push(Stmt::Pass),
            "break_statement" => out.push(Stmt::Break { span }),
            "continue_statement" => out.push(Stmt::Continue { span }),
            kind if IGNORED_STATEMENTS.contains(&kind) => {}
            "ERROR" => return Err(self.error(node, "syntax error")),
            other => {
                return Err(self.error(node, format!("unsupported statement '{}'", other)));
            }
        }
        Ok(())
    }

    fn if_chain(&self, alternatives: &[Node<'_>]) -> Result<Vec<Stmt>> {
        let Some((first, rest)) = alternatives.split_first() else {
            return Ok(Vec::new());
        };
        match first.kind() {
            "elif_clause" => Ok(vec![Stmt::If {
                test: self.expr(self.field(*first, "condition")?)?,
                body: self.block(self.field(*first, "consequence")?)?,
                orelse: self.if_chain(rest)?,
                span: self.span(*first),
            }]),
            "else_clause" => self.block(self.field(*first, "body")?),
            other => Err(self.error(*first, format!("unexpected if alternative '{}'", other))),
        }
    }

    /// `else:` body of a loop
    fn else_body(&self, node: Node<'_>) -> Result<Vec<Stmt>> {
        match node.child_by_field_name("alternative") {
            Some(alt) => self.block(self.field(alt, "body")?),
            None => Ok(Vec::new()),
        }
    }

    fn for_loop(&self, node: Node<'_>, out: &mut Vec<Stmt>) -> Result<()> {
        let span = self.span(node);
        let left = self.field(node, "left")?;
        let iter = self.expr(self.field(node, "right")?)?;
        let mut body = Vec::new();

        let target = if left.kind() == "identifier" {
            self.text(left).to_string()
        } else {
            let target = format!("__target_{}", span.start_line);
            for (i, name) in self.pattern_names(left).into_iter().enumerate() {
                body.push(Stmt::Assign {
                    target: name,
                    value: Expr::Opaque(format!("{}[{}]", target, i)),
                    span,
                });
            }
            target
        };

        body.extend(self.block(self.field(node, "body")?)?);
        let orelse = self.else_body(node)?;
        out.push(Stmt::For {
            target,
            iter,
            body,
            orelse,
            span,
        });
        Ok(())
    }

    fn try_stmt(&self, node: Node<'_>, out: &mut Vec<Stmt>) -> Result<()> {
        let body = self.block(self.field(node, "body")?)?;
        let mut handlers = Vec::new();
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();

        for clause in named(node) {
            match clause.kind() {
                "except_clause" | "except_group_clause" => handlers.push(self.handler(clause)?),
                "else_clause" => orelse = self.block(self.field(clause, "body")?)?,
                "finally_clause" => {
                    if let Some(block) = named(clause).into_iter().find(|c| c.kind() == "block") {
                        finalbody = self.block(block)?;
                    }
                }
                _ => {}
            }
        }

        out.push(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
            span: self.span(node),
        });
        Ok(())
    }

    fn handler(&self, clause: Node<'_>) -> Result<ExceptHandler> {
        let children = named(clause);
        let block = children
            .iter()
            .find(|c| c.kind() == "block")
            .copied()
            .ok_or_else(|| self.error(clause, "except clause without a body"))?;
        let heads: Vec<Node<'_>> = children
            .iter()
            .filter(|c| c.kind() != "block")
            .copied()
            .collect();

        let (kind, name) = match heads.first() {
            None => (None, None),
            Some(head) if head.kind() == "as_pattern" => {
                let class = named(*head).into_iter().next();
                let alias = head
                    .child_by_field_name("alias")
                    .map(|a| self.text(a).to_string());
                (class.map(|c| self.text(c).to_string()), alias)
            }
            Some(head) => (
                Some(self.text(*head).to_string()),
                heads.get(1).map(|n| self.text(*n).to_string()),
            ),
        };

        Ok(ExceptHandler {
            kind,
            name,
            body: self.block(block)?,
            span: self.span(clause),
        })
    }

    /// Identifiers bound by an unpacking pattern, in order
    fn pattern_names(&self, node: Node<'_>) -> Vec<String> {
        match node.kind() {
            "identifier" => vec![self.text(node).to_string()],
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "expression_list" | "parenthesized_expression" => named(node)
                .into_iter()
                .flat_map(|c| self.pattern_names(c))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn assignment(&self, node: Node<'_>, out: &mut Vec<Stmt>) -> Result<()> {
        let span = self.span(node);
        let mut targets = vec![self.field(node, "left")?];
        let mut right = match node.child_by_field_name("right") {
            Some(r) => r,
            // annotation only (`x: int`)
            None => return Ok(()),
        };
        while right.kind() == "assignment" {
            targets.push(self.field(right, "left")?);
            match right.child_by_field_name("right") {
                Some(r) => right = r,
                None => return Ok(()),
            }
        }
        let value = self.expr(right)?;

        for target in targets {
            match target.kind() {
                "identifier" => out.push(Stmt::Assign {
                    target: self.text(target).to_string(),
                    value: value.clone(),
                    span,
                }),
                "pattern_list" | "tuple_pattern" | "list_pattern" => {
                    let names = self.pattern_names(target);
                    let items = match &value {
                        Expr::List(items) if items.len() == names.len() => Some(items.clone()),
                        _ => None,
                    };
                    for (i, name) in names.into_iter().enumerate() {
                        let part = match &items {
                            Some(items) => items[i].clone(),
                            None => Expr::Opaque(format!("{}[{}]", self.text(right), i)),
                        };
                        out.push(Stmt::Assign {
                            target: name,
                            value: part,
                            span,
                        });
                    }
                }
                // attribute / subscript stores are not tracked
                _ => out.push(Stmt::Expr {
                    value: value.clone(),
                    span,
                }),
            }
        }
        Ok(())
    }

    fn augmented_assignment(&self, node: Node<'_>, out: &mut Vec<Stmt>) -> Result<()> {
        let span = self.span(node);
        let left = self.field(node, "left")?;
        let rhs = self.expr(self.field(node, "right")?)?;
        let op = match self.field(node, "operator")?.kind() {
            "+=" => Some(ArithOp::Add),
            "-=" => Some(ArithOp::Sub),
            "*=" => Some(ArithOp::Mul),
            "/=" => Some(ArithOp::Div),
            "//=" => Some(ArithOp::FloorDiv),
            "%=" => Some(ArithOp::Mod),
            _ => None,
        };

        if left.kind() != "identifier" {
            out.push(Stmt::Expr { value: rhs, span });
            return Ok(());
        }
        let target = self.text(left).to_string();
        let value = match op {
            Some(op) => Expr::arith(op, Expr::Name(target.clone()), rhs),
            None => self.opaque(node),
        };
        out.push(Stmt::Assign {
            target,
            value,
            span,
        });
        Ok(())
    }

    // ── expressions ───────────────────────────────────────────────────────

    fn expr(&self, node: Node<'_>) -> Result<Expr> {
        match node.kind() {
            "identifier" => Ok(Expr::Name(self.text(node).to_string())),
            "integer" => Ok(parse_int(self.text(node))
                .map(Expr::Int)
                .unwrap_or_else(|| self.opaque(node))),
            "float" => Ok(parse_float(self.text(node))
                .map(Expr::Float)
                .unwrap_or_else(|| self.opaque(node))),
            "string" => Ok(decode_string(self.text(node))
                .map(Expr::Str)
                .unwrap_or_else(|| self.opaque(node))),
            "concatenated_string" => {
                let mut joined = String::new();
                for part in named(node) {
                    match decode_string(self.text(part)) {
                        Some(s) => joined.push_str(&s),
                        None => return Ok(self.opaque(node)),
                    }
                }
                Ok(Expr::Str(joined))
            }
            "true" => Ok(Expr::Bool(true)),
            "false" => Ok(Expr::Bool(false)),
            "none" => Ok(Expr::None),
            "comparison_operator" => self.comparison(node),
            "boolean_operator" => {
                let op = match self.field(node, "operator")?.kind() {
                    "and" => LogicalOp::And,
                    "or" => LogicalOp::Or,
                    other => {
                        return Err(self.error(node, format!("unknown boolean operator '{}'", other)))
                    }
                };
                Ok(Expr::Logical {
                    op,
                    left: Box::new(self.expr(self.field(node, "left")?)?),
                    right: Box::new(self.expr(self.field(node, "right")?)?),
                })
            }
            "not_operator" => Ok(Expr::not(self.expr(self.field(node, "argument")?)?)),
            "binary_operator" => {
                let op = match self.field(node, "operator")?.kind() {
                    "+" => ArithOp::Add,
                    "-" => ArithOp::Sub,
                    "*" => ArithOp::Mul,
                    "/" => ArithOp::Div,
                    "//" => ArithOp::FloorDiv,
                    "%" => ArithOp::Mod,
                    _ => return Ok(self.opaque(node)),
                };
                Ok(Expr::arith(
                    op,
                    self.expr(self.field(node, "left")?)?,
                    self.expr(self.field(node, "right")?)?,
                ))
            }
            "unary_operator" => {
                let arg = self.expr(self.field(node, "argument")?)?;
                match self.field(node, "operator")?.kind() {
                    "-" => Ok(match arg {
                        Expr::Int(v) => v.checked_neg().map(Expr::Int).unwrap_or_else(|| self.opaque(node)),
                        Expr::Float(v) => Expr::Float(-v),
                        other => Expr::Neg(Box::new(other)),
                    }),
                    "+" => Ok(arg),
                    _ => Ok(self.opaque(node)),
                }
            }
            "parenthesized_expression" => match named(node).into_iter().next() {
                Some(inner) => self.expr(inner),
                None => Err(self.error(node, "empty parentheses")),
            },
            "call" => self.call(node),
            "list" | "tuple" | "set" | "expression_list" => Ok(Expr::List(
                named(node)
                    .into_iter()
                    .map(|c| self.expr(c))
                    .collect::<Result<Vec<_>>>()?,
            )),
            "dictionary" => {
                let mut entries = Vec::new();
                for child in named(node) {
                    if child.kind() != "pair" {
                        return Ok(self.opaque(node));
                    }
                    entries.push((
                        self.expr(self.field(child, "key")?)?,
                        self.expr(self.field(child, "value")?)?,
                    ));
                }
                Ok(Expr::Dict(entries))
            }
            kind if OPAQUE_EXPRESSIONS.contains(&kind) => Ok(self.opaque(node)),
            "ERROR" => Err(self.error(node, "syntax error")),
            other => Err(self.error(node, format!("unsupported expression '{}'", other))),
        }
    }

    fn comparison(&self, node: Node<'_>) -> Result<Expr> {
        let operands = named(node);
        let tokens = field_children(node, "operators");
        let mut ops = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let kind = tokens[i].kind();
            let next = tokens.get(i + 1).map(|t| t.kind());
            let (op, width) = match (kind, next) {
                ("not", Some("in")) => (CmpOp::NotIn, 2),
                ("is", Some("not")) => (CmpOp::Ne, 2),
                ("<", _) => (CmpOp::Lt, 1),
                ("<=", _) => (CmpOp::Le, 1),
                (">", _) => (CmpOp::Gt, 1),
                (">=", _) => (CmpOp::Ge, 1),
                ("==", _) | ("is", _) => (CmpOp::Eq, 1),
                ("!=", _) | ("<>", _) | ("is not", _) => (CmpOp::Ne, 1),
                ("in", _) => (CmpOp::In, 1),
                ("not in", _) => (CmpOp::NotIn, 1),
                (other, _) => {
                    return Err(self.error(node, format!("unknown comparison operator '{}'", other)))
                }
            };
            ops.push(op);
            i += width;
        }

        if ops.is_empty() || ops.len() + 1 != operands.len() {
            return Err(self.error(node, "malformed comparison chain"));
        }

        let values = operands
            .into_iter()
            .map(|o| self.expr(o))
            .collect::<Result<Vec<_>>>()?;

        // a < b < c  ==>  (a < b) and (b < c)
        let mut chain: Option<Expr> = None;
        for (k, op) in ops.into_iter().enumerate() {
            let link = Expr::compare(op, values[k].clone(), values[k + 1].clone());
            chain = Some(match chain {
                Some(prev) => Expr::and(prev, link),
                None => link,
            });
        }
        chain.ok_or_else(|| self.error(node, "malformed comparison chain"))
    }

    fn call(&self, node: Node<'_>) -> Result<Expr> {
        let function = self.field(node, "function")?;
        let callee: String = self
            .text(function)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("");

        let mut args = Vec::new();
        let mut positional = 0usize;
        if let Some(list) = node.child_by_field_name("arguments") {
            if list.kind() != "argument_list" {
                return Ok(self.opaque(node));
            }
            for arg in named(list) {
                match arg.kind() {
                    "keyword_argument" => args.push(self.expr(self.field(arg, "value")?)?),
                    _ => {
                        positional += 1;
                        args.push(self.expr(arg)?);
                    }
                }
            }
        }

        if function.kind() == "identifier" && callee == "len" && positional == 1 && args.len() == 1
        {
            if let Some(arg) = args.pop() {
                return Ok(Expr::len(arg));
            }
        }
        Ok(Expr::Call { callee, args })
    }
}
