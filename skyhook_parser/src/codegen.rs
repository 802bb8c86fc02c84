//! AST-to-source printing.
//!
//! Output is deterministic and non-minified: statements one per line,
//! two-space indentation inside bodies, parentheses inserted from operator
//! precedence. The same tree always prints to the same text, which the
//! serializer's byte-identical-output invariant relies on.

use crate::ast::{
    Arg, Arrow, ArrowBody, ArrayItem, Class, ClassMember, Declarator, Expr, ExprKind, ForInit,
    ForTarget, Function, MemberProp, MethodKind, ObjectPatProp, ObjectProp, Pattern, Program,
    PropKey, Stmt, StmtKind, VarDecl,
};

// Precedence levels for parenthesization. Higher binds tighter. The binary
// ladder occupies 3..=14, mirroring the parser's binding powers.
const PREC_SEQUENCE: u8 = 0;
const PREC_ASSIGN: u8 = 1;
const PREC_CONDITIONAL: u8 = 2;
const PREC_UNARY: u8 = 15;
const PREC_POSTFIX: u8 = 16;
const PREC_CALL: u8 = 17;
const PREC_PRIMARY: u8 = 18;

/// Print a whole program.
#[must_use]
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::new();
    for stmt in &program.body {
        printer.stmt(stmt);
        printer.newline();
    }
    printer.out
}

/// Print a single statement (no trailing newline).
#[must_use]
pub fn print_stmt(stmt: &Stmt) -> String {
    let mut printer = Printer::new();
    printer.stmt(stmt);
    printer.out
}

/// Print a single expression.
#[must_use]
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::new();
    printer.expr(expr, PREC_SEQUENCE);
    printer.out
}

// =============================================================================
// Printer
// =============================================================================

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                // A leading function/class/object would parse as a
                // declaration or block; parenthesize the whole expression.
                if leftmost_needs_parens(expr) {
                    self.push("(");
                    self.expr(expr, PREC_SEQUENCE);
                    self.push(");");
                } else {
                    self.expr(expr, PREC_SEQUENCE);
                    self.push(";");
                }
            }
            StmtKind::VarDecl(decl) => {
                self.var_decl(decl);
                self.push(";");
            }
            StmtKind::FunctionDecl(func) => self.function(func),
            StmtKind::ClassDecl(class) => self.class(class),
            StmtKind::Return(value) => {
                self.push("return");
                if let Some(value) = value {
                    self.push(" ");
                    self.expr(value, PREC_SEQUENCE);
                }
                self.push(";");
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.push("if (");
                self.expr(test, PREC_SEQUENCE);
                self.push(") ");
                self.nested_stmt(consequent);
                if let Some(alternate) = alternate {
                    self.push(" else ");
                    self.nested_stmt(alternate);
                }
            }
            StmtKind::Block(body) => self.block(body),
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.push("for (");
                match init {
                    Some(ForInit::Decl(decl)) => self.var_decl(decl),
                    Some(ForInit::Expr(expr)) => self.expr(expr, PREC_SEQUENCE),
                    None => {}
                }
                self.push("; ");
                if let Some(test) = test {
                    self.expr(test, PREC_SEQUENCE);
                }
                self.push("; ");
                if let Some(update) = update {
                    self.expr(update, PREC_SEQUENCE);
                }
                self.push(") ");
                self.nested_stmt(body);
            }
            StmtKind::ForIn { left, right, body } => {
                self.push("for (");
                self.for_target(left);
                self.push(" in ");
                self.expr(right, PREC_SEQUENCE);
                self.push(") ");
                self.nested_stmt(body);
            }
            StmtKind::ForOf { left, right, body } => {
                self.push("for (");
                self.for_target(left);
                self.push(" of ");
                self.expr(right, PREC_ASSIGN);
                self.push(") ");
                self.nested_stmt(body);
            }
            StmtKind::While { test, body } => {
                self.push("while (");
                self.expr(test, PREC_SEQUENCE);
                self.push(") ");
                self.nested_stmt(body);
            }
            StmtKind::DoWhile { body, test } => {
                self.push("do ");
                self.nested_stmt(body);
                self.push(" while (");
                self.expr(test, PREC_SEQUENCE);
                self.push(");");
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.push("try ");
                self.block(block);
                if let Some(handler) = handler {
                    self.push(" catch ");
                    if let Some(param) = &handler.param {
                        self.push("(");
                        self.pattern(param);
                        self.push(") ");
                    }
                    self.block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.block(finalizer);
                }
            }
            StmtKind::Throw(value) => {
                self.push("throw ");
                self.expr(value, PREC_SEQUENCE);
                self.push(";");
            }
            StmtKind::Break => self.push("break;"),
            StmtKind::Continue => self.push("continue;"),
            StmtKind::Empty => self.push(";"),
        }
    }

    /// Print a nested statement; blocks stay inline, everything else too
    /// (single-statement bodies print on the same line).
    fn nested_stmt(&mut self, stmt: &Stmt) {
        self.stmt(stmt);
    }

    fn block(&mut self, body: &[Stmt]) {
        if body.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.indent += 1;
        for stmt in body {
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        self.push(decl.kind.as_str());
        self.push(" ");
        for (i, declarator) in decl.decls.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.declarator(declarator);
        }
    }

    fn declarator(&mut self, declarator: &Declarator) {
        self.pattern(&declarator.pattern);
        if let Some(init) = &declarator.init {
            self.push(" = ");
            self.expr(init, PREC_ASSIGN);
        }
    }

    fn for_target(&mut self, target: &ForTarget) {
        match target {
            ForTarget::Decl(kind, pattern) => {
                self.push(kind.as_str());
                self.push(" ");
                self.pattern(pattern);
            }
            ForTarget::Expr(expr) => self.expr(expr, PREC_CALL),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        let prec = precedence(expr);
        if prec < min_prec {
            self.push("(");
            self.expr(expr, PREC_SEQUENCE);
            self.push(")");
            return;
        }

        match &expr.kind {
            ExprKind::Ident(name) => self.push(name),
            ExprKind::Number(n) => {
                let text = format_number(*n);
                self.push(&text);
            }
            ExprKind::BigInt(digits) => {
                self.push(digits);
                self.push("n");
            }
            ExprKind::String(s) => {
                let quoted = quote_string(s);
                self.push(&quoted);
            }
            ExprKind::Bool(b) => self.push(if *b { "true" } else { "false" }),
            ExprKind::Null => self.push("null"),
            ExprKind::Template { quasis, exprs } => {
                self.push("`");
                for (i, quasi) in quasis.iter().enumerate() {
                    let escaped = escape_template(quasi);
                    self.push(&escaped);
                    if let Some(expr) = exprs.get(i) {
                        self.push("${");
                        self.expr(expr, PREC_SEQUENCE);
                        self.push("}");
                    }
                }
                self.push("`");
            }
            ExprKind::Array(items) => {
                self.push("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match item {
                        ArrayItem::Hole => {}
                        ArrayItem::Expr(expr) => self.expr(expr, PREC_ASSIGN),
                        ArrayItem::Spread(expr) => {
                            self.push("...");
                            self.expr(expr, PREC_ASSIGN);
                        }
                    }
                }
                if matches!(items.last(), Some(ArrayItem::Hole)) {
                    self.push(",");
                }
                self.push("]");
            }
            ExprKind::Object(props) => {
                if props.is_empty() {
                    self.push("{}");
                    return;
                }
                self.push("{ ");
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.object_prop(prop);
                }
                self.push(" }");
            }
            ExprKind::Function(func) => self.function(func),
            ExprKind::Arrow(arrow) => self.arrow(arrow),
            ExprKind::Class(class) => self.class(class),
            ExprKind::Unary { op, operand } => {
                self.push(op.as_str());
                if op.is_word() {
                    self.push(" ");
                }
                // Parenthesizing nested unary/update operands avoids `--x`
                // ambiguity from `-(-x)`.
                self.expr(operand, PREC_POSTFIX);
            }
            ExprKind::Update {
                op,
                prefix,
                operand,
            } => {
                if *prefix {
                    self.push(op.as_str());
                    self.expr(operand, PREC_POSTFIX);
                } else {
                    self.expr(operand, PREC_CALL);
                    self.push(op.as_str());
                }
            }
            ExprKind::Binary { op, left, right } => {
                let (left_prec, right_prec) = binary_sides(prec, matches!(op, crate::ast::BinaryOp::Exp));
                self.expr(left, left_prec);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(right, right_prec);
            }
            ExprKind::Logical { op, left, right } => {
                let (left_prec, right_prec) = binary_sides(prec, false);
                self.expr(left, left_prec);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(right, right_prec);
            }
            ExprKind::Assign { op, target, value } => {
                self.expr(target, PREC_CALL);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.expr(value, PREC_ASSIGN);
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test, PREC_CONDITIONAL + 1);
                self.push(" ? ");
                self.expr(consequent, PREC_ASSIGN);
                self.push(" : ");
                self.expr(alternate, PREC_ASSIGN);
            }
            ExprKind::Call { callee, args } => {
                self.expr(callee, PREC_CALL);
                self.args(args);
            }
            ExprKind::New { callee, args } => {
                self.push("new ");
                self.expr(callee, PREC_CALL);
                self.args(args);
            }
            ExprKind::Member { object, property } => {
                // A numeric literal base would swallow the dot: `5.x`.
                if matches!(object.kind, ExprKind::Number(_)) {
                    self.push("(");
                    self.expr(object, PREC_SEQUENCE);
                    self.push(")");
                } else {
                    self.expr(object, PREC_CALL);
                }
                match property {
                    MemberProp::Ident(name) => {
                        self.push(".");
                        self.push(name);
                    }
                    MemberProp::Computed(index) => {
                        self.push("[");
                        self.expr(index, PREC_SEQUENCE);
                        self.push("]");
                    }
                }
            }
            ExprKind::Sequence(exprs) => {
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(expr, PREC_ASSIGN);
                }
            }
            ExprKind::This => self.push("this"),
            ExprKind::Super => self.push("super"),
            ExprKind::Await(operand) => {
                self.push("await ");
                self.expr(operand, PREC_UNARY);
            }
            ExprKind::Yield { argument, delegate } => {
                self.push("yield");
                if *delegate {
                    self.push("*");
                }
                if let Some(argument) = argument {
                    self.push(" ");
                    self.expr(argument, PREC_ASSIGN);
                }
            }
        }
    }

    fn args(&mut self, args: &[Arg]) {
        self.push("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            match arg {
                Arg::Expr(expr) => self.expr(expr, PREC_ASSIGN),
                Arg::Spread(expr) => {
                    self.push("...");
                    self.expr(expr, PREC_ASSIGN);
                }
            }
        }
        self.push(")");
    }

    fn object_prop(&mut self, prop: &ObjectProp) {
        match prop {
            ObjectProp::KeyValue { key, value } => {
                self.prop_key(key);
                self.push(": ");
                self.expr(value, PREC_ASSIGN);
            }
            ObjectProp::Shorthand(name) => self.push(name),
            ObjectProp::Method { key, kind, func } => self.method(key, *kind, func, false),
            ObjectProp::Spread(expr) => {
                self.push("...");
                self.expr(expr, PREC_ASSIGN);
            }
        }
    }

    fn prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(name) => self.push(name),
            PropKey::String(s) => {
                let quoted = quote_string(s);
                self.push(&quoted);
            }
            PropKey::Number(n) => {
                let text = format_number(*n);
                self.push(&text);
            }
            PropKey::Computed(expr) => {
                self.push("[");
                self.expr(expr, PREC_SEQUENCE);
                self.push("]");
            }
        }
    }

    // =========================================================================
    // Functions, Classes, Patterns
    // =========================================================================

    fn function(&mut self, func: &Function) {
        if func.is_async {
            self.push("async ");
        }
        self.push("function");
        if func.is_generator {
            self.push("*");
        }
        if let Some(name) = &func.name {
            self.push(" ");
            self.push(name);
        }
        self.params(&func.params);
        self.push(" ");
        self.block(&func.body);
    }

    fn arrow(&mut self, arrow: &Arrow) {
        if arrow.is_async {
            self.push("async ");
        }
        self.params(&arrow.params);
        self.push(" => ");
        match &arrow.body {
            ArrowBody::Expr(expr) => {
                // An object-literal body would parse as a block.
                if matches!(expr.kind, ExprKind::Object(_)) {
                    self.push("(");
                    self.expr(expr, PREC_SEQUENCE);
                    self.push(")");
                } else {
                    self.expr(expr, PREC_ASSIGN);
                }
            }
            ArrowBody::Block(body) => self.block(body),
        }
    }

    fn class(&mut self, class: &Class) {
        self.push("class");
        if let Some(name) = &class.name {
            self.push(" ");
            self.push(name);
        }
        if let Some(superclass) = &class.superclass {
            self.push(" extends ");
            self.expr(superclass, PREC_CALL);
        }
        self.push(" ");
        if class.members.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.indent += 1;
        for member in &class.members {
            self.newline();
            self.class_member(member);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn class_member(&mut self, member: &ClassMember) {
        if member.is_static {
            self.push("static ");
        }
        self.method(&member.key, member.kind, &member.func, true);
    }

    fn method(&mut self, key: &PropKey, kind: MethodKind, func: &Function, _in_class: bool) {
        match kind {
            MethodKind::Getter => self.push("get "),
            MethodKind::Setter => self.push("set "),
            MethodKind::Constructor | MethodKind::Method => {
                if func.is_async {
                    self.push("async ");
                }
                if func.is_generator {
                    self.push("*");
                }
            }
        }
        self.prop_key(key);
        self.params(&func.params);
        self.push(" ");
        self.block(&func.body);
    }

    fn params(&mut self, params: &[Pattern]) {
        self.push("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.pattern(param);
        }
        self.push(")");
    }

    fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Ident(name) => self.push(name),
            Pattern::Object { props, rest } => {
                self.push("{");
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match prop {
                        ObjectPatProp::Shorthand { name, default } => {
                            self.push(name);
                            if let Some(default) = default {
                                self.push(" = ");
                                self.expr(default, PREC_ASSIGN);
                            }
                        }
                        ObjectPatProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.push(": ");
                            self.pattern(value);
                        }
                    }
                }
                if let Some(rest) = rest {
                    if !props.is_empty() {
                        self.push(", ");
                    }
                    self.push("...");
                    self.pattern(rest);
                }
                self.push("}");
            }
            Pattern::Array { elements, rest } => {
                self.push("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(element) = element {
                        self.pattern(element);
                    }
                }
                if let Some(rest) = rest {
                    if !elements.is_empty() {
                        self.push(", ");
                    }
                    self.push("...");
                    self.pattern(rest);
                }
                self.push("]");
            }
            Pattern::Assign { target, default } => {
                self.pattern(target);
                self.push(" = ");
                self.expr(default, PREC_ASSIGN);
            }
            Pattern::Rest(inner) => {
                self.push("...");
                self.pattern(inner);
            }
        }
    }
}

// =============================================================================
// Precedence and Literal Formatting
// =============================================================================

/// The precedence of an expression when printed.
fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Sequence(_) => PREC_SEQUENCE,
        ExprKind::Assign { .. } | ExprKind::Arrow(_) | ExprKind::Yield { .. } => PREC_ASSIGN,
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Logical { op, .. } => match op {
            crate::ast::LogicalOp::Coalesce => 3,
            crate::ast::LogicalOp::Or => 4,
            crate::ast::LogicalOp::And => 5,
        },
        ExprKind::Binary { op, .. } => binary_precedence(*op),
        ExprKind::Unary { .. } | ExprKind::Await(_) => PREC_UNARY,
        ExprKind::Update { prefix, .. } => {
            if *prefix {
                PREC_UNARY
            } else {
                PREC_POSTFIX
            }
        }
        ExprKind::Call { .. } | ExprKind::New { .. } | ExprKind::Member { .. } => PREC_CALL,
        ExprKind::Function(_) | ExprKind::Class(_) => PREC_CALL,
        _ => PREC_PRIMARY,
    }
}

fn binary_precedence(op: crate::ast::BinaryOp) -> u8 {
    use crate::ast::BinaryOp::*;
    match op {
        BitOr => 6,
        BitXor => 7,
        BitAnd => 8,
        Eq | NotEq | StrictEq | StrictNotEq => 9,
        Lt | LtEq | Gt | GtEq | In | Instanceof => 10,
        Shl | Shr | UShr => 11,
        Add | Sub => 12,
        Mul | Div | Mod => 13,
        Exp => 14,
    }
}

/// Minimum precedences for the two sides of a binary operator.
fn binary_sides(prec: u8, right_assoc: bool) -> (u8, u8) {
    if right_assoc {
        (prec + 1, prec)
    } else {
        (prec, prec + 1)
    }
}

/// Whether an expression statement would be misparsed without wrapping
/// parentheses (leftmost token opens a block, declaration, or object).
fn leftmost_needs_parens(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Function(_) | ExprKind::Class(_) | ExprKind::Object(_) => true,
        ExprKind::Assign { target, .. } => leftmost_needs_parens(target),
        ExprKind::Binary { left, .. } | ExprKind::Logical { left, .. } => {
            leftmost_needs_parens(left)
        }
        ExprKind::Conditional { test, .. } => leftmost_needs_parens(test),
        ExprKind::Call { callee, .. } => leftmost_needs_parens(callee),
        ExprKind::Member { object, .. } => leftmost_needs_parens(object),
        ExprKind::Sequence(exprs) => exprs.first().is_some_and(leftmost_needs_parens),
        ExprKind::Update {
            prefix: false,
            operand,
            ..
        } => leftmost_needs_parens(operand),
        _ => false,
    }
}

/// Print a number the way JavaScript source expects it.
fn format_number(n: f64) -> String {
    if n == n.trunc() && n.is_finite() && n.abs() < 9_007_199_254_740_992.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Quote and escape a string literal with double quotes.
fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Escape a template quasi chunk.
fn escape_template(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_expression};

    fn round_trip_expr(source: &str) -> String {
        print_expr(&parse_expression(source).expect("parse failed"))
    }

    #[test]
    fn test_literals() {
        assert_eq!(round_trip_expr("42"), "42");
        assert_eq!(round_trip_expr("1.5"), "1.5");
        assert_eq!(round_trip_expr("\"hi\""), "\"hi\"");
        assert_eq!(round_trip_expr("123n"), "123n");
        assert_eq!(round_trip_expr("null"), "null");
    }

    #[test]
    fn test_precedence_preserved() {
        assert_eq!(round_trip_expr("(1 + 2) * 3"), "(1 + 2) * 3");
        assert_eq!(round_trip_expr("1 + 2 * 3"), "1 + 2 * 3");
        assert_eq!(round_trip_expr("a = b = c"), "a = b = c");
    }

    #[test]
    fn test_iife_parenthesization() {
        let printed = round_trip_expr("((x) => x + 1)(5)");
        assert_eq!(printed, "((x) => x + 1)(5)");
    }

    #[test]
    fn test_arrow_object_body_wrapped() {
        let printed = round_trip_expr("() => ({a: 1})");
        assert_eq!(printed, "() => ({ a: 1 })");
    }

    #[test]
    fn test_nested_negation_unambiguous() {
        let expr = parse_expression("-(-5)").unwrap();
        assert_eq!(print_expr(&expr), "-(-5)");
    }

    #[test]
    fn test_array_holes() {
        assert_eq!(round_trip_expr("[1, , 2]"), "[1, , 2]");
        assert_eq!(round_trip_expr("[,]"), "[,]");
    }

    #[test]
    fn test_member_and_calls() {
        assert_eq!(round_trip_expr("a.b[c](1, ...xs)"), "a.b[c](1, ...xs)");
        assert_eq!(round_trip_expr("new a.B(1)"), "new a.B(1)");
    }

    #[test]
    fn test_template_round_trip() {
        assert_eq!(round_trip_expr("`a${x + 1}b`"), "`a${x + 1}b`");
    }

    #[test]
    fn test_function_statement_parenthesized() {
        let program = parse("(function () { return 1; });").unwrap();
        let printed = print_stmt(&program.body[0]);
        assert!(printed.starts_with("(function"));
        assert!(printed.ends_with(");"));
    }

    #[test]
    fn test_class_printing() {
        let printed = round_trip_expr("class A extends B { constructor(x) { this.x = x; } }");
        assert!(printed.starts_with("class A extends B {"));
        assert!(printed.contains("constructor(x)"));
    }

    #[test]
    fn test_statement_shapes() {
        let source = "if (a) { b(); } else { c(); }";
        let program = parse(source).unwrap();
        let printed = print_stmt(&program.body[0]);
        assert!(printed.starts_with("if (a) {"));
        assert!(printed.contains("} else {"));
    }

    #[test]
    fn test_deterministic_output() {
        let source = "const f = (a, b) => { return a + b; };";
        let program = parse(source).unwrap();
        assert_eq!(print_program(&program), print_program(&program));
    }

    #[test]
    fn test_var_decl_and_patterns() {
        let program = parse("var {a, b: [c]} = o, n = 1;").unwrap();
        let printed = print_stmt(&program.body[0]);
        assert_eq!(printed, "var {a, b: [c]} = o, n = 1;");
    }
}
