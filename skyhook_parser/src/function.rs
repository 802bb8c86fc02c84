//! Function-source normalization.
//!
//! Engines stringify live functions in several shapes: declarations,
//! anonymous expressions, arrows, classes, and method shorthand
//! (`async foo() {...}`) which is not a parseable statement on its own.
//! This module turns any of those into exactly one normalized node, or
//! fails with `UnparseableSource`.

use crate::ast::{Arrow, Class, Expr, ExprKind, Function, Program, Stmt, StmtKind};
use crate::parser;
use skyhook_core::{SkyhookError, SkyhookResult};

/// A normalized function node.
#[derive(Debug, Clone)]
pub enum FunctionNode {
    /// A `function` (declaration or expression).
    Function(Function),
    /// An arrow function.
    Arrow(Arrow),
    /// A class (declaration or expression).
    Class(Class),
}

impl FunctionNode {
    /// The declared name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Function(func) => func.name.as_deref(),
            Self::Arrow(_) => None,
            Self::Class(class) => class.name.as_deref(),
        }
    }

    /// Whether this node is a class.
    #[must_use]
    pub fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    /// Convert into an expression node (declarations become expressions).
    #[must_use]
    pub fn into_expr(self) -> Expr {
        match self {
            Self::Function(func) => Expr::synthesized(ExprKind::Function(Box::new(func))),
            Self::Arrow(arrow) => Expr::synthesized(ExprKind::Arrow(Box::new(arrow))),
            Self::Class(class) => Expr::synthesized(ExprKind::Class(Box::new(class))),
        }
    }
}

/// A normalized parse of one function's source.
#[derive(Debug, Clone)]
pub struct ParsedFunction {
    /// The function/class/arrow node.
    pub node: FunctionNode,
    /// The containing file, used as a print context.
    pub file: Program,
}

/// Parse the engine stringification of a single function or class.
///
/// Attempts, in order: a standalone program parse; a bare expression parse
/// (anonymous `function () {}` forms); a re-parse with a synthesized
/// `function` keyword for method shorthand. Modifier prefixes (`async`,
/// `*`, `get`, `set`) are folded into the retry.
pub fn parse_function_source(source: &str) -> SkyhookResult<ParsedFunction> {
    let trimmed = source.trim();

    let program_error = match parser::parse(trimmed) {
        Ok(program) => {
            if let Some(parsed) = extract_single_node(program) {
                return Ok(parsed);
            }
            None
        }
        Err(err) => Some(err),
    };

    if let Ok(expr) = parser::parse_expression(trimmed) {
        if let Some(node) = node_from_expr(expr) {
            return Ok(wrap_node(node));
        }
    }

    if let Some(retry_source) = shorthand_retry_source(trimmed) {
        if let Ok(program) = parser::parse(&retry_source) {
            if let Some(parsed) = extract_single_node(program) {
                return Ok(parsed);
            }
        }
    }

    let detail = match program_error {
        Some(err) => format!("`{}`: {err}", truncate(trimmed)),
        None => format!("`{}`: not a single function or class", truncate(trimmed)),
    };
    Err(SkyhookError::unparseable(detail))
}

/// Accept a program that is exactly one function/class declaration or one
/// expression statement wrapping a function/arrow/class expression.
fn extract_single_node(program: Program) -> Option<ParsedFunction> {
    if program.body.len() != 1 {
        return None;
    }
    let span = program.span;
    let stmt = program.body.into_iter().next()?;
    let node = match stmt.kind {
        StmtKind::FunctionDecl(func) => FunctionNode::Function(*func),
        StmtKind::ClassDecl(class) => FunctionNode::Class(*class),
        StmtKind::Expr(expr) => node_from_expr(*expr)?,
        _ => return None,
    };
    Some(ParsedFunction {
        node: node.clone(),
        file: Program::new(
            vec![Stmt::synthesized(StmtKind::Expr(Box::new(
                node.into_expr(),
            )))],
            span,
        ),
    })
}

fn node_from_expr(expr: Expr) -> Option<FunctionNode> {
    match expr.kind {
        ExprKind::Function(func) => Some(FunctionNode::Function(*func)),
        ExprKind::Arrow(arrow) => Some(FunctionNode::Arrow(*arrow)),
        ExprKind::Class(class) => Some(FunctionNode::Class(*class)),
        _ => None,
    }
}

fn wrap_node(node: FunctionNode) -> ParsedFunction {
    let file = Program::new(
        vec![Stmt::synthesized(StmtKind::Expr(Box::new(
            node.clone().into_expr(),
        )))],
        skyhook_core::Span::dummy(),
    );
    ParsedFunction { node, file }
}

/// Build the `function `-prefixed retry source for method shorthand,
/// folding the method's modifier prefixes into function syntax.
fn shorthand_retry_source(source: &str) -> Option<String> {
    let mut rest = source;
    let mut is_async = false;
    let mut is_generator = false;

    if let Some(stripped) = rest.strip_prefix("async ") {
        is_async = true;
        rest = stripped.trim_start();
    }
    if let Some(stripped) = rest.strip_prefix('*') {
        is_generator = true;
        rest = stripped.trim_start();
    }
    // Accessor shorthand stringifies with its keyword; the body is an
    // ordinary function either way.
    for accessor in ["get ", "set "] {
        if let Some(stripped) = rest.strip_prefix(accessor) {
            rest = stripped.trim_start();
            break;
        }
    }

    // Already keyword-led sources have nothing to retry.
    if rest.starts_with("function") || rest.starts_with("class") {
        return None;
    }

    let keyword = match (is_async, is_generator) {
        (true, true) => "async function* ",
        (true, false) => "async function ",
        (false, true) => "function* ",
        (false, false) => "function ",
    };
    Some(format!("{keyword}{rest}"))
}

fn truncate(source: &str) -> &str {
    let limit = 60;
    match source.char_indices().nth(limit) {
        Some((idx, _)) => &source[..idx],
        None => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_declaration() {
        let parsed = parse_function_source("function g() { return \"hi\"; }").unwrap();
        assert!(matches!(parsed.node, FunctionNode::Function(_)));
        assert_eq!(parsed.node.name(), Some("g"));
    }

    #[test]
    fn test_anonymous_function_expression() {
        let parsed = parse_function_source("function () { return 1; }").unwrap();
        assert!(matches!(parsed.node, FunctionNode::Function(_)));
        assert_eq!(parsed.node.name(), None);
    }

    #[test]
    fn test_arrow() {
        let parsed = parse_function_source("() => x").unwrap();
        assert!(matches!(parsed.node, FunctionNode::Arrow(_)));
    }

    #[test]
    fn test_class_declaration() {
        let parsed = parse_function_source("class A { constructor() {} }").unwrap();
        assert!(parsed.node.is_class());
        assert_eq!(parsed.node.name(), Some("A"));
    }

    #[test]
    fn test_method_shorthand_retry() {
        let parsed = parse_function_source("foo(a, b) { return a + b; }").unwrap();
        let FunctionNode::Function(func) = &parsed.node else {
            panic!("expected function");
        };
        assert_eq!(func.name.as_deref(), Some("foo"));
        assert!(!func.is_async);
    }

    #[test]
    fn test_async_method_shorthand() {
        let parsed = parse_function_source("async foo() { return 1; }").unwrap();
        let FunctionNode::Function(func) = &parsed.node else {
            panic!("expected function");
        };
        assert!(func.is_async);
        assert_eq!(func.name.as_deref(), Some("foo"));
    }

    #[test]
    fn test_generator_method_shorthand() {
        let parsed = parse_function_source("*items() { yield 1; }").unwrap();
        let FunctionNode::Function(func) = &parsed.node else {
            panic!("expected function");
        };
        assert!(func.is_generator);
    }

    #[test]
    fn test_getter_shorthand() {
        let parsed = parse_function_source("get value() { return this._v; }").unwrap();
        let FunctionNode::Function(func) = &parsed.node else {
            panic!("expected function");
        };
        assert_eq!(func.name.as_deref(), Some("value"));
    }

    #[test]
    fn test_unparseable() {
        let err = parse_function_source("not a function at all (").unwrap_err();
        assert!(matches!(err, SkyhookError::UnparseableSource { .. }));
    }

    #[test]
    fn test_file_context_prints() {
        let parsed = parse_function_source("(a) => a + 1").unwrap();
        let printed = crate::codegen::print_program(&parsed.file);
        assert!(printed.contains("=> a + 1"));
    }
}
