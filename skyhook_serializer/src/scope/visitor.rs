//! Free-variable discovery.
//!
//! One depth-first walk threads a lexical frame stack through the tree in
//! evaluation order. Blocks pre-hoist function declarations and bare `var`
//! declarators; initialized declarations bind *after* their initializer is
//! visited, so right-hand sides see the pre-declaration scope. An
//! identifier is free when it is a reference (not a binding name, not a
//! member/property name) and no frame on the stack binds it.

use super::symbol::{BindingFlags, FrameStack};
use rustc_hash::FxHashSet;
use skyhook_parser::ast::{
    Arg, ArrowBody, ArrayItem, CatchClause, Declarator, Expr, ExprKind, ForInit, ForTarget,
    Function, MemberProp, ObjectPatProp, ObjectProp, Pattern, PropKey, Stmt, StmtKind, VarDecl,
    VarKind,
};
use skyhook_parser::FunctionNode;

/// Names that are bindings of the language or host itself and never report
/// as free variables.
const IMPLICIT_GLOBALS: &[&str] = &["undefined", "NaN", "Infinity", "arguments", "globalThis"];

/// Result of analyzing one function.
#[derive(Debug, Default)]
pub struct Analysis {
    /// Free-variable names, deduplicated, in first-use order.
    pub free: Vec<String>,
    /// Every identifier text appearing anywhere in the function, used to
    /// seed name-allocator exclude sets.
    pub ident_index: FxHashSet<String>,
}

/// Analyze a function/arrow/class node for free variables.
#[must_use]
pub fn analyze(node: &FunctionNode) -> Analysis {
    let mut visitor = Visitor::default();
    visitor.stack.push();
    match node {
        FunctionNode::Function(func) => visitor.function(func, true),
        FunctionNode::Arrow(arrow) => visitor.arrow(arrow),
        FunctionNode::Class(class) => visitor.class(class, true),
    }
    visitor.stack.pop();
    Analysis {
        free: visitor.free,
        ident_index: visitor.idents,
    }
}

#[derive(Default)]
struct Visitor {
    stack: FrameStack,
    free: Vec<String>,
    seen_free: FxHashSet<String>,
    idents: FxHashSet<String>,
}

impl Visitor {
    // =========================================================================
    // References
    // =========================================================================

    fn reference(&mut self, name: &str) {
        self.idents.insert(name.to_string());
        if self.stack.is_bound(name) {
            return;
        }
        if IMPLICIT_GLOBALS.contains(&name) {
            return;
        }
        if self.seen_free.insert(name.to_string()) {
            self.free.push(name.to_string());
        }
    }

    /// Record an identifier text that is not a reference (binding names,
    /// member names, property keys).
    fn non_reference(&mut self, name: &str) {
        self.idents.insert(name.to_string());
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn function(&mut self, func: &Function, bind_own_name: bool) {
        self.stack.push();
        if bind_own_name {
            if let Some(name) = &func.name {
                self.non_reference(name);
                self.stack.bind(name.clone(), BindingFlags::SELF_NAME);
            }
        }
        self.params(&func.params);
        self.hoist_block(&func.body);
        for stmt in &func.body {
            self.stmt(stmt);
        }
        self.stack.pop();
    }

    fn arrow(&mut self, arrow: &skyhook_parser::ast::Arrow) {
        self.stack.push();
        self.params(&arrow.params);
        match &arrow.body {
            ArrowBody::Expr(expr) => self.expr(expr),
            ArrowBody::Block(body) => {
                self.hoist_block(body);
                for stmt in body {
                    self.stmt(stmt);
                }
            }
        }
        self.stack.pop();
    }

    fn class(&mut self, class: &skyhook_parser::ast::Class, bind_own_name: bool) {
        self.stack.push();
        if bind_own_name {
            if let Some(name) = &class.name {
                self.non_reference(name);
                self.stack.bind(name.clone(), BindingFlags::SELF_NAME);
            }
        }
        if let Some(superclass) = &class.superclass {
            self.expr(superclass);
        }
        for member in &class.members {
            self.prop_key(&member.key);
            self.function(&member.func, false);
        }
        self.stack.pop();
    }

    /// Bind parameters in order. Following the load-time transformer's
    /// rule, a parameter's own names are bound before its default
    /// initializer is visited, so a default sees itself and everything to
    /// its left.
    fn params(&mut self, params: &[Pattern]) {
        for param in params {
            self.bind_pattern(param, BindingFlags::PARAM);
            self.pattern_exprs(param);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Hoist function declarations and bare `var` declarators of a block.
    fn hoist_block(&mut self, body: &[Stmt]) {
        for stmt in body {
            match &stmt.kind {
                StmtKind::FunctionDecl(func) => {
                    if let Some(name) = &func.name {
                        self.non_reference(name);
                        self.stack.bind(name.clone(), BindingFlags::HOISTED_FN);
                    }
                }
                StmtKind::VarDecl(decl) if decl.kind == VarKind::Var => {
                    for declarator in &decl.decls {
                        if declarator.init.is_none() {
                            self.bind_pattern(&declarator.pattern, BindingFlags::HOISTED_VAR);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::VarDecl(decl) => self.var_decl(decl),
            StmtKind::FunctionDecl(func) => {
                // Name already hoisted at block entry.
                self.function(func, true);
            }
            StmtKind::ClassDecl(class) => {
                self.class(class, true);
                if let Some(name) = &class.name {
                    self.stack.bind(name.clone(), BindingFlags::DECLARED);
                }
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test);
                self.stmt(consequent);
                if let Some(alternate) = alternate {
                    self.stmt(alternate);
                }
            }
            StmtKind::Block(body) => {
                self.stack.push();
                self.hoist_block(body);
                for stmt in body {
                    self.stmt(stmt);
                }
                self.stack.pop();
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.stack.push();
                match init {
                    Some(ForInit::Decl(decl)) => self.var_decl(decl),
                    Some(ForInit::Expr(expr)) => self.expr(expr),
                    None => {}
                }
                if let Some(test) = test {
                    self.expr(test);
                }
                if let Some(update) = update {
                    self.expr(update);
                }
                self.stmt(body);
                self.stack.pop();
            }
            StmtKind::ForIn { left, right, body } | StmtKind::ForOf { left, right, body } => {
                self.stack.push();
                self.expr(right);
                match left {
                    ForTarget::Decl(_, pattern) => {
                        self.bind_pattern(pattern, BindingFlags::FOR_BINDING);
                        self.pattern_exprs(pattern);
                    }
                    ForTarget::Expr(expr) => self.expr(expr),
                }
                self.stmt(body);
                self.stack.pop();
            }
            StmtKind::While { test, body } => {
                self.expr(test);
                self.stmt(body);
            }
            StmtKind::DoWhile { body, test } => {
                self.stmt(body);
                self.expr(test);
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.stack.push();
                self.hoist_block(block);
                for stmt in block {
                    self.stmt(stmt);
                }
                self.stack.pop();
                if let Some(handler) = handler {
                    self.catch_clause(handler);
                }
                if let Some(finalizer) = finalizer {
                    self.stack.push();
                    self.hoist_block(finalizer);
                    for stmt in finalizer {
                        self.stmt(stmt);
                    }
                    self.stack.pop();
                }
            }
            StmtKind::Throw(value) => self.expr(value),
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
        }
    }

    fn catch_clause(&mut self, handler: &CatchClause) {
        self.stack.push();
        if let Some(param) = &handler.param {
            self.bind_pattern(param, BindingFlags::CATCH);
            self.pattern_exprs(param);
        }
        self.hoist_block(&handler.body);
        for stmt in &handler.body {
            self.stmt(stmt);
        }
        self.stack.pop();
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        for declarator in &decl.decls {
            self.declarator(decl.kind, declarator);
        }
    }

    fn declarator(&mut self, kind: VarKind, declarator: &Declarator) {
        match &declarator.init {
            Some(init) => {
                // The right-hand side sees the pre-declaration scope.
                self.expr(init);
                self.bind_pattern(&declarator.pattern, BindingFlags::DECLARED);
                self.pattern_exprs(&declarator.pattern);
            }
            None if kind == VarKind::Var => {
                // Already hoisted at block entry.
            }
            None => {
                self.bind_pattern(&declarator.pattern, BindingFlags::DECLARED);
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) => self.reference(name),
            ExprKind::Number(_)
            | ExprKind::BigInt(_)
            | ExprKind::String(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
            | ExprKind::This
            | ExprKind::Super => {}
            ExprKind::Template { exprs, .. } => {
                for expr in exprs {
                    self.expr(expr);
                }
            }
            ExprKind::Array(items) => {
                for item in items {
                    match item {
                        ArrayItem::Hole => {}
                        ArrayItem::Expr(expr) | ArrayItem::Spread(expr) => self.expr(expr),
                    }
                }
            }
            ExprKind::Object(props) => {
                for prop in props {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.expr(value);
                        }
                        // Shorthand `{ a }` reads the binding `a`.
                        ObjectProp::Shorthand(name) => self.reference(name),
                        ObjectProp::Method { key, func, .. } => {
                            self.prop_key(key);
                            self.function(func, false);
                        }
                        ObjectProp::Spread(expr) => self.expr(expr),
                    }
                }
            }
            ExprKind::Function(func) => self.function(func, true),
            ExprKind::Arrow(arrow) => self.arrow(arrow),
            ExprKind::Class(class) => self.class(class, true),
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Update { operand, .. } => self.expr(operand),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Assign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test);
                self.expr(consequent);
                self.expr(alternate);
            }
            ExprKind::Call { callee, args } | ExprKind::New { callee, args } => {
                self.expr(callee);
                for arg in args {
                    match arg {
                        Arg::Expr(expr) | Arg::Spread(expr) => self.expr(expr),
                    }
                }
            }
            ExprKind::Member { object, property } => {
                self.expr(object);
                match property {
                    // The name in `obj.name` is not a reference.
                    MemberProp::Ident(name) => self.non_reference(name),
                    MemberProp::Computed(index) => self.expr(index),
                }
            }
            ExprKind::Sequence(exprs) => {
                for expr in exprs {
                    self.expr(expr);
                }
            }
            ExprKind::Await(operand) => self.expr(operand),
            ExprKind::Yield { argument, .. } => {
                if let Some(argument) = argument {
                    self.expr(argument);
                }
            }
        }
    }

    fn prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(name) => self.non_reference(name),
            PropKey::String(_) | PropKey::Number(_) => {}
            PropKey::Computed(expr) => self.expr(expr),
        }
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    /// Bind every name a pattern introduces.
    fn bind_pattern(&mut self, pattern: &Pattern, flags: BindingFlags) {
        let mut names = Vec::new();
        pattern.collect_names(&mut names);
        for name in names {
            self.non_reference(name);
            self.stack.bind(name.to_string(), flags);
        }
    }

    /// Visit the expressions a pattern embeds (defaults, computed keys).
    fn pattern_exprs(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Ident(_) => {}
            Pattern::Object { props, rest } => {
                for prop in props {
                    match prop {
                        ObjectPatProp::Shorthand { default, .. } => {
                            if let Some(default) = default {
                                self.expr(default);
                            }
                        }
                        ObjectPatProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.pattern_exprs(value);
                        }
                    }
                }
                if let Some(rest) = rest {
                    self.pattern_exprs(rest);
                }
            }
            Pattern::Array { elements, rest } => {
                for element in elements.iter().flatten() {
                    self.pattern_exprs(element);
                }
                if let Some(rest) = rest {
                    self.pattern_exprs(rest);
                }
            }
            Pattern::Assign { target, default } => {
                self.pattern_exprs(target);
                self.expr(default);
            }
            Pattern::Rest(inner) => self.pattern_exprs(inner),
        }
    }
}
