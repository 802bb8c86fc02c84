//! Closure emission and module assembly.
//!
//! Every serialized function becomes one preamble statement of the shape
//!
//! ```text
//! var v1 = ((_self, _super, a, b) => <function-expr>)(<this>, <super>, <a>, <b>);
//! ```
//!
//! an immediately-invoked arrow whose parameters re-bind the function's
//! free variables (named exactly as they occur in the body), plus a minted
//! `_self` when a bound receiver applies and a minted `_super` when a
//! class's heritage target is substituted. The module is the preamble,
//! the postamble, and a final `exports.handler` line.

use crate::names::{NameAllocator, SELF_PREFIX, SUPER_PREFIX, VALUE_PREFIX};
use rustc_hash::FxHashSet;
use skyhook_parser::ast::{
    Arg, Arrow, ArrowBody, Declarator, Expr, ExprKind, MemberProp, Pattern, Program, Stmt,
    StmtKind, VarDecl, VarKind,
};
use skyhook_parser::codegen::print_program;
use skyhook_parser::FunctionNode;
use skyhook_core::{Span, SkyhookResult};

/// One function emission request.
pub struct FunctionEmit {
    /// The identifier the declaration binds.
    pub ident: String,
    /// The (post-transform) function node.
    pub node: FunctionNode,
    /// Free variables: body name paired with the serialized value
    /// expression passed for it.
    pub free: Vec<(String, Expr)>,
    /// Serialized heritage value for a class whose meta-prototype was
    /// altered; substituted for the extends target as `_super`.
    pub super_binding: Option<Expr>,
    /// Identifiers occurring in the function body plus in-scope free
    /// names; minted names must avoid all of them.
    pub exclude: FxHashSet<String>,
}

/// Emit `var <ident> = ((params…) => <fn-expr>)(args…);`.
pub fn function_decl(request: FunctionEmit, names: &mut NameAllocator) -> SkyhookResult<Stmt> {
    let FunctionEmit {
        ident,
        mut node,
        free,
        super_binding,
        mut exclude,
    } = request;

    let mut params: Vec<Pattern> = Vec::new();
    let mut args: Vec<Arg> = Vec::new();

    if let Some(super_expr) = super_binding {
        let super_name = names.next_name(SUPER_PREFIX, &exclude);
        substitute_heritage(&mut node, &super_name);
        exclude.insert(super_name.clone());
        params.push(Pattern::Ident(super_name));
        args.push(Arg::Expr(super_expr));
    }

    // Free-variable parameters keep the body's own names.
    for (name, value_expr) in free {
        params.push(Pattern::Ident(name));
        args.push(Arg::Expr(value_expr));
    }

    Ok(var_stmt(ident, iife(params, node.into_expr(), args)))
}

/// Emit `var <ident> = ((_self) => <target>.bind(_self, args…))(<this>);`
/// for a bound function whose target is already declared.
pub fn bound_decl(
    ident: String,
    target: Expr,
    this: Expr,
    bound_args: Vec<Expr>,
    names: &mut NameAllocator,
    exclude: &FxHashSet<String>,
) -> Stmt {
    let self_name = names.next_name(SELF_PREFIX, exclude);

    let mut bind_args = vec![Arg::Expr(Expr::ident(self_name.clone()))];
    bind_args.extend(bound_args.into_iter().map(Arg::Expr));

    let bind_call = Expr::synthesized(ExprKind::Call {
        callee: Box::new(Expr::synthesized(ExprKind::Member {
            object: Box::new(target),
            property: MemberProp::Ident("bind".to_string()),
        })),
        args: bind_args,
    });

    var_stmt(
        ident,
        iife(vec![Pattern::Ident(self_name)], bind_call, vec![Arg::Expr(this)]),
    )
}

/// Replace a class node's extends target with the minted `_super` name.
fn substitute_heritage(node: &mut FunctionNode, super_name: &str) {
    if let FunctionNode::Class(class) = node {
        class.superclass = Some(Box::new(Expr::ident(super_name)));
    }
}

fn iife(params: Vec<Pattern>, body: Expr, args: Vec<Arg>) -> Expr {
    let arrow = Expr::synthesized(ExprKind::Arrow(Box::new(Arrow {
        params,
        body: ArrowBody::Expr(Box::new(body)),
        is_async: false,
        span: Span::dummy(),
    })));
    Expr::synthesized(ExprKind::Call {
        callee: Box::new(arrow),
        args,
    })
}

// =============================================================================
// Statement Constructors
// =============================================================================

/// `var <ident> = <init>;`
pub fn var_stmt(ident: String, init: Expr) -> Stmt {
    Stmt::synthesized(StmtKind::VarDecl(VarDecl {
        kind: VarKind::Var,
        decls: vec![Declarator {
            pattern: Pattern::Ident(ident),
            init: Some(init),
            span: Span::dummy(),
        }],
    }))
}

/// `var <ident> = {};` or `var <ident> = [];`
pub fn shell_stmt(ident: String, array: bool) -> Stmt {
    let empty = if array {
        Expr::synthesized(ExprKind::Array(Vec::new()))
    } else {
        Expr::synthesized(ExprKind::Object(Vec::new()))
    };
    var_stmt(ident, empty)
}

/// `<ident>.key = value;` (or `<ident>["key"] = value;` for keys that are
/// not valid identifiers).
pub fn set_prop_stmt(ident: &str, key: &str, value: Expr) -> Stmt {
    let property = if is_valid_ident(key) {
        MemberProp::Ident(key.to_string())
    } else {
        MemberProp::Computed(Box::new(Expr::synthesized(ExprKind::String(
            key.to_string(),
        ))))
    };
    assign_stmt(
        Expr::synthesized(ExprKind::Member {
            object: Box::new(Expr::ident(ident)),
            property,
        }),
        value,
    )
}

/// `<ident>[<index>] = value;`
pub fn set_index_stmt(ident: &str, index: usize, value: Expr) -> Stmt {
    assign_stmt(
        Expr::synthesized(ExprKind::Member {
            object: Box::new(Expr::ident(ident)),
            property: MemberProp::Computed(Box::new(Expr::synthesized(ExprKind::Number(
                index as f64,
            )))),
        }),
        value,
    )
}

/// `<ident>.push(e1, e2, …);`
pub fn push_stmt(ident: &str, elements: Vec<Expr>) -> Stmt {
    Stmt::synthesized(StmtKind::Expr(Box::new(Expr::synthesized(
        ExprKind::Call {
            callee: Box::new(Expr::synthesized(ExprKind::Member {
                object: Box::new(Expr::ident(ident)),
                property: MemberProp::Ident("push".to_string()),
            })),
            args: elements.into_iter().map(Arg::Expr).collect(),
        },
    ))))
}

/// `<ident>.length = n;`
pub fn set_length_stmt(ident: &str, length: usize) -> Stmt {
    set_prop_stmt(
        ident,
        "length",
        Expr::synthesized(ExprKind::Number(length as f64)),
    )
}

/// `Object.setPrototypeOf(<target>, <proto>);`
pub fn set_proto_stmt(target: Expr, proto: Expr) -> Stmt {
    Stmt::synthesized(StmtKind::Expr(Box::new(Expr::synthesized(
        ExprKind::Call {
            callee: Box::new(Expr::synthesized(ExprKind::Member {
                object: Box::new(Expr::ident("Object")),
                property: MemberProp::Ident("setPrototypeOf".to_string()),
            })),
            args: vec![Arg::Expr(target), Arg::Expr(proto)],
        },
    ))))
}

/// `<target> = <value>;`
pub fn assign_stmt(target: Expr, value: Expr) -> Stmt {
    Stmt::synthesized(StmtKind::Expr(Box::new(Expr::synthesized(
        ExprKind::Assign {
            op: skyhook_parser::ast::AssignOp::Assign,
            target: Box::new(target),
            value: Box::new(value),
        },
    ))))
}

/// `<expr>.prototype` / any member on an emitted identifier.
pub fn member_expr(object: Expr, name: &str) -> Expr {
    Expr::synthesized(ExprKind::Member {
        object: Box::new(object),
        property: MemberProp::Ident(name.to_string()),
    })
}

fn is_valid_ident(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first == '$' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
        && skyhook_parser::token::Keyword::from_str(key).is_none()
}

// =============================================================================
// Module Assembly
// =============================================================================

/// Assemble the final module text: preamble, postamble, export line.
#[must_use]
pub fn assemble_module(
    preamble: Vec<Stmt>,
    postamble: Vec<Stmt>,
    root_ident: &str,
    factory: bool,
) -> String {
    let root: Expr = if factory {
        Expr::synthesized(ExprKind::Call {
            callee: Box::new(Expr::ident(root_ident)),
            args: Vec::new(),
        })
    } else {
        Expr::ident(root_ident)
    };
    let export = assign_stmt(member_expr(Expr::ident("exports"), "handler"), root);

    let mut body = preamble;
    body.extend(postamble);
    body.push(export);
    print_program(&Program::new(body, Span::dummy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyhook_parser::codegen::print_stmt;
    use skyhook_parser::parse_function_source;

    #[test]
    fn test_function_decl_shape() {
        let parsed = parse_function_source("() => x").unwrap();
        let mut names = NameAllocator::new();
        let stmt = function_decl(
            FunctionEmit {
                ident: "v1".to_string(),
                node: parsed.node,
                free: vec![(
                    "x".to_string(),
                    Expr::synthesized(ExprKind::String("hi".to_string())),
                )],
                super_binding: None,
                exclude: FxHashSet::default(),
            },
            &mut names,
        )
        .unwrap();
        assert_eq!(print_stmt(&stmt), "var v1 = ((x) => () => x)(\"hi\");");
    }

    #[test]
    fn test_super_substitution() {
        let parsed = parse_function_source("class C extends A {}").unwrap();
        let mut names = NameAllocator::new();
        let stmt = function_decl(
            FunctionEmit {
                ident: "v2".to_string(),
                node: parsed.node,
                free: Vec::new(),
                super_binding: Some(Expr::ident("v1")),
                exclude: FxHashSet::default(),
            },
            &mut names,
        )
        .unwrap();
        let printed = print_stmt(&stmt);
        assert_eq!(
            printed,
            "var v2 = ((_super1) => class C extends _super1 {})(v1);"
        );
    }

    #[test]
    fn test_bound_decl_shape() {
        let mut names = NameAllocator::new();
        let stmt = bound_decl(
            "v2".to_string(),
            Expr::ident("v1"),
            Expr::ident("v3"),
            vec![Expr::synthesized(ExprKind::Number(1.0))],
            &mut names,
            &FxHashSet::default(),
        );
        assert_eq!(
            print_stmt(&stmt),
            "var v2 = ((_self1) => v1.bind(_self1, 1))(v3);"
        );
    }

    #[test]
    fn test_minted_names_avoid_collisions() {
        let mut names = NameAllocator::new();
        let mut exclude = FxHashSet::default();
        exclude.insert("_self1".to_string());
        let stmt = bound_decl(
            "v1".to_string(),
            Expr::ident("t"),
            Expr::ident("o"),
            Vec::new(),
            &mut names,
            &exclude,
        );
        assert!(print_stmt(&stmt).contains("_self2"));
    }

    #[test]
    fn test_prop_key_quoting() {
        let stmt = set_prop_stmt("v1", "valid_key", Expr::synthesized(ExprKind::Number(1.0)));
        assert_eq!(print_stmt(&stmt), "v1.valid_key = 1;");
        let stmt = set_prop_stmt("v1", "has space", Expr::synthesized(ExprKind::Number(1.0)));
        assert_eq!(print_stmt(&stmt), "v1[\"has space\"] = 1;");
        let stmt = set_prop_stmt("v1", "class", Expr::synthesized(ExprKind::Null));
        assert_eq!(print_stmt(&stmt), "v1[\"class\"] = null;");
    }

    #[test]
    fn test_assemble_module_export() {
        let module = assemble_module(
            vec![shell_stmt("v1".to_string(), false)],
            vec![set_prop_stmt(
                "v1",
                "a",
                Expr::synthesized(ExprKind::Number(1.0)),
            )],
            "v1",
            false,
        );
        assert_eq!(module, "var v1 = {};\nv1.a = 1;\nexports.handler = v1;\n");
    }

    #[test]
    fn test_assemble_module_factory() {
        let module = assemble_module(Vec::new(), Vec::new(), "v1", true);
        assert!(module.ends_with("exports.handler = v1();\n"));
    }
}
