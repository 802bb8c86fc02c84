//! The value-graph serializer.
//!
//! Walks the reachable object graph depth-first in evaluation order and
//! emits statements into two ordered lists:
//!
//! - the **preamble** declares every composite value: empty shells for
//!   objects and arrays, wrapper declarations for functions;
//! - the **postamble** fills own properties, wires prototypes, and closes
//!   cycles.
//!
//! Because a value's identifier is allocated and its shell emitted before
//! its contents are walked, a value that reaches itself simply resolves to
//! its already-cached identifier; the two-phase split is what makes cyclic
//! graphs serializable at all. Identity dedup: each distinct composite
//! value (by pointer identity) is emitted exactly once.

use crate::emit::{self, FunctionEmit};
use crate::names::{NameAllocator, VALUE_PREFIX};
use crate::scope::{self, ResolvedScopes};
use crate::transform::{self, SerializeOptions};
use rustc_hash::{FxHashMap, FxHashSet};
use skyhook_core::{
    GlobalSet, JsValue, ObjectRef, Proto, SkyhookError, SkyhookResult,
    value::{NATIVE_BODY_MARKER, BOUND_NAME_PREFIX},
};
use skyhook_parser::ast::{Expr, ExprKind, Stmt, UnaryOp};
use skyhook_parser::{parse_function_source, FunctionNode};
use skyhook_probe::EngineProbe;
use tracing::debug;

/// Serializer state for one `serialize` call.
pub struct GraphSerializer<'a> {
    engine: &'a dyn EngineProbe,
    options: &'a SerializeOptions,
    globals: &'a GlobalSet,
    /// Identity cache: object id → emitted identifier.
    cache: FxHashMap<usize, String>,
    names: NameAllocator,
    /// Names minted identifiers must avoid: every identifier and free
    /// variable seen in any serialized function body so far.
    exclude: FxHashSet<String>,
    /// Declarations, in first-encounter order.
    pub preamble: Vec<Stmt>,
    /// Property wiring, prototype calls, cycle closure.
    pub postamble: Vec<Stmt>,
    /// Path from the serialization root, for error context.
    path: Vec<String>,
}

impl<'a> GraphSerializer<'a> {
    /// Create a serializer over an engine, options and global whitelist.
    pub fn new(
        engine: &'a dyn EngineProbe,
        options: &'a SerializeOptions,
        globals: &'a GlobalSet,
    ) -> Self {
        Self {
            engine,
            options,
            globals,
            cache: FxHashMap::default(),
            names: NameAllocator::new(),
            exclude: FxHashSet::default(),
            preamble: Vec::new(),
            postamble: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Serialize the root function and return its emitted identifier.
    pub fn serialize_root(&mut self, func: &ObjectRef) -> SkyhookResult<String> {
        if func.read().as_function().is_none() {
            return Err(SkyhookError::internal(
                "serialization root is not a function",
            ));
        }
        let expr = self.serialize_value(&JsValue::Object(func.clone()))?;
        match expr.kind {
            ExprKind::Ident(ident) => Ok(ident),
            _ => Err(SkyhookError::internal(
                "root serialized to a non-identifier expression",
            )),
        }
    }

    /// Serialize any value to an expression denoting it.
    pub fn serialize_value(&mut self, value: &JsValue) -> SkyhookResult<Expr> {
        self.serialize_value_inner(value)
            .map_err(|err| self.attach_path(err))
    }

    fn serialize_value_inner(&mut self, value: &JsValue) -> SkyhookResult<Expr> {
        // The replacement hook runs before the cache lookup: a replaced
        // value's identity is what gets deduplicated from here on.
        let replaced;
        let value = match &self.options.pre_serialize_value {
            Some(hook) => {
                replaced = hook(value);
                &replaced
            }
            None => value,
        };

        match value {
            JsValue::Undefined => Ok(Expr::ident("undefined")),
            JsValue::Null => Ok(Expr::synthesized(ExprKind::Null)),
            JsValue::Bool(b) => Ok(Expr::synthesized(ExprKind::Bool(*b))),
            JsValue::Number(n) => Ok(number_literal(*n)),
            JsValue::String(s) => Ok(Expr::synthesized(ExprKind::String(s.clone()))),
            JsValue::BigInt(digits) => Ok(bigint_literal(digits)),
            JsValue::Object(obj) => {
                // Whitelisted globals are referenced, never copied.
                if let Some(name) = self.globals.name_of(value) {
                    return Ok(Expr::ident(name));
                }
                self.serialize_object(obj)
            }
        }
    }

    // =========================================================================
    // Composites
    // =========================================================================

    fn serialize_object(&mut self, obj: &ObjectRef) -> SkyhookResult<Expr> {
        let id = obj.id().as_usize();
        if let Some(ident) = self.cache.get(&id) {
            return Ok(Expr::ident(ident));
        }

        enum Snapshot {
            Plain {
                props: Vec<(String, JsValue)>,
                proto: Proto,
            },
            Array {
                elements: Vec<Option<JsValue>>,
                props: Vec<(String, JsValue)>,
                proto: Proto,
            },
            Function,
            Native(String),
        }

        let snapshot = {
            let guard = obj.read();
            match &guard.kind {
                skyhook_core::ObjectKind::Plain => Snapshot::Plain {
                    props: guard.properties.clone(),
                    proto: guard.proto.clone(),
                },
                skyhook_core::ObjectKind::Array(elements) => Snapshot::Array {
                    elements: elements.clone(),
                    props: guard.properties.clone(),
                    proto: guard.proto.clone(),
                },
                skyhook_core::ObjectKind::Function(_) => Snapshot::Function,
                skyhook_core::ObjectKind::Native { description } => {
                    Snapshot::Native(description.clone())
                }
            }
        };

        match snapshot {
            Snapshot::Plain { props, proto } => {
                // A class's `prototype` object is never rebuilt as a plain
                // object: the class body declares its methods, so the
                // reference becomes `<class>.prototype`.
                if let Some(expr) = self.try_class_prototype(obj)? {
                    return Ok(expr);
                }
                self.serialize_plain(obj, props, proto)
            }
            Snapshot::Array {
                elements,
                props,
                proto,
            } => self.serialize_array(obj, elements, props, proto),
            Snapshot::Function => self.serialize_function(obj),
            Snapshot::Native(description) => Err(SkyhookError::native_function(description)),
        }
    }

    fn serialize_plain(
        &mut self,
        obj: &ObjectRef,
        props: Vec<(String, JsValue)>,
        proto: Proto,
    ) -> SkyhookResult<Expr> {
        let ident = self.allocate(obj);
        self.preamble.push(emit::shell_stmt(ident.clone(), false));
        self.emit_props(&ident, props)?;
        self.emit_proto(&ident, obj, proto)?;
        Ok(Expr::ident(ident))
    }

    fn serialize_array(
        &mut self,
        obj: &ObjectRef,
        elements: Vec<Option<JsValue>>,
        props: Vec<(String, JsValue)>,
        proto: Proto,
    ) -> SkyhookResult<Expr> {
        let ident = self.allocate(obj);
        self.preamble.push(emit::shell_stmt(ident.clone(), true));

        let dense = elements.iter().all(Option::is_some);
        if dense {
            if !elements.is_empty() {
                let mut exprs = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    self.path.push(format!("[{index}]"));
                    let element = element.as_ref().expect("dense array");
                    exprs.push(self.serialize_value(element)?);
                    self.path.pop();
                }
                self.postamble.push(emit::push_stmt(&ident, exprs));
            }
        } else {
            // Holes are preserved by indexed assignment plus an explicit
            // trailing length.
            let length = elements.len();
            for (index, element) in elements.into_iter().enumerate() {
                let Some(element) = element else { continue };
                self.path.push(format!("[{index}]"));
                let expr = self.serialize_value(&element)?;
                self.path.pop();
                self.postamble.push(emit::set_index_stmt(&ident, index, expr));
            }
            self.postamble.push(emit::set_length_stmt(&ident, length));
        }

        self.emit_props(&ident, props)?;
        self.emit_proto(&ident, obj, proto)?;
        Ok(Expr::ident(ident))
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn serialize_function(&mut self, func: &ObjectRef) -> SkyhookResult<Expr> {
        let (name, meta_proto, prototype, own_props) = {
            let guard = func.read();
            let data = guard
                .as_function()
                .ok_or_else(|| SkyhookError::internal("function snapshot on non-function"))?;
            (
                data.name.clone(),
                guard.proto.clone(),
                data.prototype.clone(),
                guard.properties.clone(),
            )
        };

        if name.starts_with(BOUND_NAME_PREFIX) {
            return self.serialize_bound(func);
        }

        let source = self.engine.source_of(func)?;
        if source.contains(NATIVE_BODY_MARKER) {
            return Err(SkyhookError::native_function(name));
        }

        let parsed = parse_function_source(&source)?;
        let mut node = parsed.node;
        let mut file = parsed.file;

        transform::run_phase("pre-process", &self.options.pre_process, &mut node, &mut file)?;

        let analysis = scope::analyze(&node);
        debug!(name = %name, free = analysis.free.len(), "serializing function");

        self.exclude.extend(analysis.ident_index.iter().cloned());
        let ident = self.allocate(func);

        let resolved = if analysis.free.is_empty() && !matches!(node, FunctionNode::Class(_)) {
            None
        } else {
            match scope::resolve_scopes(self.engine, func) {
                Ok(resolved) => Some(resolved),
                // A function with nothing to resolve tolerates a missing
                // chain; classes only need it for the heritage check.
                Err(_) if analysis.free.is_empty() => None,
                Err(err) => return Err(err),
            }
        };

        let mut free: Vec<(String, Expr)> = Vec::new();
        for free_name in &analysis.free {
            let value = resolved.as_ref().and_then(|r| r.get(free_name)).cloned();
            match value {
                None => {
                    if self.options.strict {
                        return Err(SkyhookError::unresolved(free_name.clone()));
                    }
                    // Left in place: the emitted body keeps the bare
                    // identifier.
                    debug!(name = %free_name, "unresolved free variable");
                }
                Some(value) => {
                    // A whitelisted global captured under its own global
                    // name stays a direct reference in the body.
                    if self.globals.name_of(&value) == Some(free_name.as_str()) {
                        continue;
                    }
                    self.path.push(format!(".<{free_name}>"));
                    let expr = self.serialize_value(&value)?;
                    self.path.pop();
                    free.push((free_name.clone(), expr));
                }
            }
        }

        transform::run_phase(
            "post-process",
            &self.options.post_process,
            &mut node,
            &mut file,
        )?;

        let is_class = node.is_class();
        let mut super_binding = None;
        if let FunctionNode::Class(class) = &node {
            if !heritage_is_default(class, &meta_proto, resolved.as_ref()) {
                self.path.push(".<proto>".to_string());
                super_binding = Some(self.serialize_proto_expr(&meta_proto)?);
                self.path.pop();
            }
        }

        let stmt = emit::function_decl(
            FunctionEmit {
                ident: ident.clone(),
                node,
                free,
                super_binding,
                exclude: self.exclude.clone(),
            },
            &mut self.names,
        )?;
        self.preamble.push(stmt);

        // The function's `prototype` object (with its `constructor`
        // back-reference) is rebuilt in the postamble. Class bodies
        // already declare their methods, so classes skip this.
        if !is_class {
            if let Some(proto_obj) = prototype {
                self.path.push(".prototype".to_string());
                let expr = self.serialize_value(&JsValue::Object(proto_obj))?;
                self.path.pop();
                self.postamble.push(emit::assign_stmt(
                    emit::member_expr(Expr::ident(&ident), "prototype"),
                    expr,
                ));
            }
            // An altered meta-prototype is restored with a set-prototype
            // call; classes express theirs through the heritage clause.
            if !matches!(meta_proto, Proto::FunctionProto) {
                self.path.push(".<proto>".to_string());
                let proto_expr = self.serialize_proto_expr(&meta_proto)?;
                self.path.pop();
                self.postamble
                    .push(emit::set_proto_stmt(Expr::ident(&ident), proto_expr));
            }
        }

        self.emit_props(&ident, own_props)?;
        Ok(Expr::ident(ident))
    }

    /// A `bound `-named function never serializes directly: unwrap to the
    /// target, serialize that, and re-apply the bind with the serialized
    /// receiver and arguments. Nested bound targets unwrap level by level,
    /// each re-applying its own bind.
    fn serialize_bound(&mut self, func: &ObjectRef) -> SkyhookResult<Expr> {
        let internals = self.engine.bound_internals_of(func)?;
        let ident = self.allocate(func);

        self.path.push(".<target>".to_string());
        let target = self.serialize_value(&JsValue::Object(internals.target.clone()))?;
        self.path.pop();

        self.path.push(".<this>".to_string());
        let this = self.serialize_value(&internals.this)?;
        self.path.pop();

        let mut bound_args = Vec::with_capacity(internals.args.len());
        for (index, arg) in internals.args.iter().enumerate() {
            self.path.push(format!(".<arg{index}>"));
            bound_args.push(self.serialize_value(arg)?);
            self.path.pop();
        }

        let stmt = emit::bound_decl(
            ident.clone(),
            target,
            this,
            bound_args,
            &mut self.names,
            &self.exclude,
        );
        self.preamble.push(stmt);
        Ok(Expr::ident(ident))
    }

    // =========================================================================
    // Shared Pieces
    // =========================================================================

    /// When `obj` is the `prototype` object of a class constructor,
    /// serialize the class and reference `<class>.prototype` instead of
    /// rebuilding the object.
    fn try_class_prototype(&mut self, obj: &ObjectRef) -> SkyhookResult<Option<Expr>> {
        let ctor = {
            let guard = obj.read();
            match guard.get("constructor") {
                Some(JsValue::Object(ctor)) => ctor.clone(),
                _ => return Ok(None),
            }
        };
        let is_class_prototype = {
            let guard = ctor.read();
            match guard.as_function() {
                Some(data) => {
                    data.prototype
                        .as_ref()
                        .is_some_and(|proto| proto.ptr_eq(obj))
                        && data.source.trim_start().starts_with("class")
                }
                None => false,
            }
        };
        if !is_class_prototype {
            return Ok(None);
        }
        let class_expr = self.serialize_value(&JsValue::Object(ctor))?;
        Ok(Some(emit::member_expr(class_expr, "prototype")))
    }

    fn allocate(&mut self, obj: &ObjectRef) -> String {
        let ident = self.names.next_name(VALUE_PREFIX, &self.exclude);
        self.cache.insert(obj.id().as_usize(), ident.clone());
        ident
    }

    fn emit_props(&mut self, ident: &str, props: Vec<(String, JsValue)>) -> SkyhookResult<()> {
        for (key, value) in props {
            self.path.push(format!(".{key}"));
            let expr = self.serialize_value(&value)?;
            self.path.pop();
            self.postamble.push(emit::set_prop_stmt(ident, &key, expr));
        }
        Ok(())
    }

    /// Emit a set-prototype call when the prototype is neither the
    /// object-root nor the array-root prototype.
    fn emit_proto(&mut self, ident: &str, owner: &ObjectRef, proto: Proto) -> SkyhookResult<()> {
        match proto {
            Proto::ObjectProto | Proto::ArrayProto => Ok(()),
            other => {
                if let Proto::Object(_) = &other {
                    self.check_proto_chain(owner)?;
                }
                self.path.push(".<proto>".to_string());
                let proto_expr = self.serialize_proto_expr(&other)?;
                self.path.pop();
                self.postamble
                    .push(emit::set_proto_stmt(Expr::ident(ident), proto_expr));
                Ok(())
            }
        }
    }

    fn serialize_proto_expr(&mut self, proto: &Proto) -> SkyhookResult<Expr> {
        Ok(match proto {
            Proto::ObjectProto => emit::member_expr(Expr::ident("Object"), "prototype"),
            Proto::ArrayProto => emit::member_expr(Expr::ident("Array"), "prototype"),
            Proto::FunctionProto => emit::member_expr(Expr::ident("Function"), "prototype"),
            Proto::Null => Expr::synthesized(ExprKind::Null),
            Proto::Object(obj) => self.serialize_value(&JsValue::Object(obj.clone()))?,
        })
    }

    /// Reject prototype chains that cycle back on themselves; evaluating
    /// the emitted set-prototype calls would throw.
    fn check_proto_chain(&self, start: &ObjectRef) -> SkyhookResult<()> {
        let mut seen = FxHashSet::default();
        seen.insert(start.id().as_usize());
        let mut current = start.clone();
        loop {
            let next = match &current.read().proto {
                Proto::Object(next) => next.clone(),
                _ => return Ok(()),
            };
            if !seen.insert(next.id().as_usize()) {
                return Err(SkyhookError::cyclic_prototype(self.path_string()));
            }
            current = next;
        }
    }

    fn attach_path(&self, err: SkyhookError) -> SkyhookError {
        if err.path().is_some() {
            err
        } else {
            err.at_path(self.path_string())
        }
    }

    fn path_string(&self) -> String {
        let mut path = String::from("handler");
        for segment in &self.path {
            path.push_str(segment);
        }
        path
    }
}

// =============================================================================
// Literal Construction
// =============================================================================

fn number_literal(n: f64) -> Expr {
    if n.is_nan() {
        return Expr::ident("NaN");
    }
    if n == f64::INFINITY {
        return Expr::ident("Infinity");
    }
    if n == f64::NEG_INFINITY {
        return negate(Expr::ident("Infinity"));
    }
    if n.is_sign_negative() {
        // Covers both negative numbers and -0.
        return negate(Expr::synthesized(ExprKind::Number(-n)));
    }
    Expr::synthesized(ExprKind::Number(n))
}

fn bigint_literal(digits: &str) -> Expr {
    match digits.strip_prefix('-') {
        Some(abs) => negate(Expr::synthesized(ExprKind::BigInt(abs.to_string()))),
        None => Expr::synthesized(ExprKind::BigInt(digits.to_string())),
    }
}

fn negate(operand: Expr) -> Expr {
    Expr::synthesized(ExprKind::Unary {
        op: UnaryOp::Minus,
        operand: Box::new(operand),
    })
}

/// Whether a class's heritage clause already produces the recorded
/// meta-prototype (the default), or the chain was altered afterwards.
fn heritage_is_default(
    class: &skyhook_parser::ast::Class,
    meta_proto: &Proto,
    resolved: Option<&ResolvedScopes>,
) -> bool {
    match (&class.superclass, meta_proto) {
        (None, Proto::FunctionProto) => true,
        (Some(heritage), Proto::Object(actual)) => match &heritage.kind {
            ExprKind::Ident(name) => match resolved.and_then(|r| r.get(name)) {
                Some(JsValue::Object(expected)) => expected.ptr_eq(actual),
                _ => false,
            },
            // Computed heritage targets cannot be verified; leave the
            // clause untouched.
            _ => true,
        },
        (Some(_), Proto::FunctionProto) => false,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyhook_core::{default_globals, FunctionData};
    use skyhook_parser::codegen::print_stmt;
    use skyhook_probe::LocalProbe;
    use smallvec::smallvec;

    fn run(value: JsValue) -> (Expr, Vec<String>, Vec<String>) {
        let options = SerializeOptions::default();
        let globals = default_globals().global_set();
        let probe = LocalProbe::new();
        let mut serializer = GraphSerializer::new(&probe, &options, &globals);
        let expr = serializer.serialize_value(&value).expect("serialize failed");
        let preamble = serializer.preamble.iter().map(print_stmt).collect();
        let postamble = serializer.postamble.iter().map(print_stmt).collect();
        (expr, preamble, postamble)
    }

    #[test]
    fn test_primitive_literals() {
        let cases: &[(JsValue, &str)] = &[
            (JsValue::Undefined, "undefined"),
            (JsValue::Null, "null"),
            (JsValue::Bool(true), "true"),
            (JsValue::Number(3.5), "3.5"),
            (JsValue::Number(-2.0), "-2"),
            (JsValue::Number(f64::NAN), "NaN"),
            (JsValue::Number(f64::NEG_INFINITY), "-Infinity"),
            (JsValue::Number(-0.0), "-0"),
            (JsValue::string("hi"), "\"hi\""),
            (JsValue::BigInt("123".into()), "123n"),
            (JsValue::BigInt("-9".into()), "-9n"),
        ];
        for (value, expected) in cases {
            let (expr, preamble, _) = run(value.clone());
            assert!(preamble.is_empty(), "primitives never emit declarations");
            assert_eq!(&skyhook_parser::codegen::print_expr(&expr), expected);
        }
    }

    #[test]
    fn test_plain_object_two_phase() {
        let obj = ObjectRef::plain();
        obj.write().set("a", JsValue::Number(1.0));
        obj.write().set("b", JsValue::string("x"));
        let (expr, preamble, postamble) = run(JsValue::Object(obj));
        assert_eq!(skyhook_parser::codegen::print_expr(&expr), "v1");
        assert_eq!(preamble, vec!["var v1 = {};"]);
        assert_eq!(postamble, vec!["v1.a = 1;", "v1.b = \"x\";"]);
    }

    #[test]
    fn test_self_cycle() {
        let obj = ObjectRef::plain();
        obj.write().set("self", JsValue::Object(obj.clone()));
        let (_, preamble, postamble) = run(JsValue::Object(obj));
        assert_eq!(preamble, vec!["var v1 = {};"]);
        assert_eq!(postamble, vec!["v1.self = v1;"]);
    }

    #[test]
    fn test_identity_dedup() {
        let shared = ObjectRef::plain();
        let arr = ObjectRef::array(vec![
            Some(JsValue::Object(shared.clone())),
            Some(JsValue::Object(shared.clone())),
        ]);
        let (_, preamble, postamble) = run(JsValue::Object(arr));
        // One declaration for the array, one for the shared object.
        assert_eq!(preamble.len(), 2);
        assert_eq!(postamble, vec!["v1.push(v2, v2);"]);
    }

    #[test]
    fn test_sparse_array() {
        let arr = ObjectRef::array(vec![
            Some(JsValue::Number(1.0)),
            None,
            Some(JsValue::Number(3.0)),
            None,
        ]);
        let (_, _, postamble) = run(JsValue::Object(arr));
        assert_eq!(
            postamble,
            vec!["v1[0] = 1;", "v1[2] = 3;", "v1.length = 4;"]
        );
    }

    #[test]
    fn test_custom_prototype_emits_set_prototype() {
        let proto = ObjectRef::plain();
        let obj = ObjectRef::plain();
        obj.write().proto = Proto::Object(proto);
        let (_, preamble, postamble) = run(JsValue::Object(obj));
        assert_eq!(preamble.len(), 2);
        assert_eq!(postamble, vec!["Object.setPrototypeOf(v1, v2);"]);
    }

    #[test]
    fn test_null_prototype() {
        let obj = ObjectRef::plain();
        obj.write().proto = Proto::Null;
        let (_, _, postamble) = run(JsValue::Object(obj));
        assert_eq!(postamble, vec!["Object.setPrototypeOf(v1, null);"]);
    }

    #[test]
    fn test_cyclic_prototype_chain_rejected() {
        let a = ObjectRef::plain();
        let b = ObjectRef::plain();
        a.write().proto = Proto::Object(b.clone());
        b.write().proto = Proto::Object(a.clone());
        let options = SerializeOptions::default();
        let globals = default_globals().global_set();
        let probe = LocalProbe::new();
        let mut serializer = GraphSerializer::new(&probe, &options, &globals);
        let err = serializer
            .serialize_value(&JsValue::Object(a))
            .unwrap_err();
        assert!(matches!(err.root(), SkyhookError::CyclicPrototype { .. }));
    }

    #[test]
    fn test_globals_referenced_not_copied() {
        let console = default_globals().console.clone();
        let obj = ObjectRef::plain();
        obj.write().set("log", JsValue::Object(console));
        let (_, preamble, postamble) = run(JsValue::Object(obj));
        assert_eq!(preamble, vec!["var v1 = {};"]);
        assert_eq!(postamble, vec!["v1.log = console;"]);
    }

    #[test]
    fn test_native_function_rejected() {
        let func = ObjectRef::function(FunctionData::new(
            "setTimeout",
            "function setTimeout() { [native code] }",
        ));
        let options = SerializeOptions::default();
        let globals = default_globals().global_set();
        let probe = LocalProbe::new();
        let mut serializer = GraphSerializer::new(&probe, &options, &globals);
        let err = serializer
            .serialize_value(&JsValue::Object(func))
            .unwrap_err();
        assert!(matches!(
            err.root(),
            SkyhookError::NativeFunctionUnsupported { .. }
        ));
    }

    #[test]
    fn test_simple_closure() {
        let mut data = FunctionData::new("", "() => x");
        data.scopes = Some(smallvec![ScopeFrameHelper::frame(&[(
            "x",
            JsValue::string("hi")
        )])]);
        let func = ObjectRef::function(data);
        let (_, preamble, _) = run(JsValue::Object(func));
        assert_eq!(preamble, vec!["var v1 = ((x) => () => x)(\"hi\");"]);
    }

    #[test]
    fn test_pre_serialize_value_replaces_before_cache() {
        let secret = ObjectRef::plain();
        secret.write().set("token", JsValue::string("s3cr3t"));
        let obj = ObjectRef::plain();
        obj.write().set("cfg", JsValue::Object(secret));

        let mut options = SerializeOptions::default();
        options.pre_serialize_value = Some(Box::new(|value| match value {
            JsValue::String(s) if s == "s3cr3t" => JsValue::string("<redacted>"),
            other => other.clone(),
        }));
        let globals = default_globals().global_set();
        let probe = LocalProbe::new();
        let mut serializer = GraphSerializer::new(&probe, &options, &globals);
        serializer.serialize_value(&JsValue::Object(obj)).unwrap();
        let postamble: Vec<String> = serializer.postamble.iter().map(print_stmt).collect();
        assert!(postamble.contains(&"v2.token = \"<redacted>\";".to_string()));
    }

    #[test]
    fn test_error_path_context() {
        let inner = ObjectRef::new(skyhook_core::JsObject::native("console-like"));
        let obj = ObjectRef::plain();
        obj.write().set("bad", JsValue::Object(inner));
        let options = SerializeOptions::default();
        let globals = default_globals().global_set();
        let probe = LocalProbe::new();
        let mut serializer = GraphSerializer::new(&probe, &options, &globals);
        let err = serializer
            .serialize_value(&JsValue::Object(obj))
            .unwrap_err();
        assert_eq!(err.path(), Some("handler.bad"));
    }

    /// Small helper because `ScopeFrame::new` takes owned pairs.
    struct ScopeFrameHelper;

    impl ScopeFrameHelper {
        fn frame(bindings: &[(&str, JsValue)]) -> skyhook_core::ScopeFrame {
            skyhook_core::ScopeFrame::new(
                bindings
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect(),
            )
        }
    }
}
