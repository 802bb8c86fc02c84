//! Module-level invariants: determinism, strictness, registry fallback,
//! factory export.

use skyhook_core::{FunctionData, JsValue, ObjectRef, ScopeFrame, SkyhookError};
use skyhook_serializer::{register, serialize, SerializeOptions};
use smallvec::smallvec;

fn closure(source: &str, bindings: &[(&str, JsValue)]) -> ObjectRef {
    let mut data = FunctionData::new("", source);
    data.scopes = Some(smallvec![ScopeFrame::new(
        bindings
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
    )]);
    ObjectRef::function(data)
}

/// Two runs over the same graph produce byte-identical output (the name
/// counter is per-call, so it resets between runs).
#[test]
fn emission_is_deterministic() {
    let shared = ObjectRef::plain();
    shared.write().set("n", JsValue::Number(1.0));
    let arr = ObjectRef::array(vec![
        Some(JsValue::Object(shared.clone())),
        Some(JsValue::Object(shared)),
        None,
        Some(JsValue::string("end")),
    ]);
    let func = closure("() => arr", &[("arr", JsValue::Object(arr))]);

    let first = serialize(&func, &SerializeOptions::default()).unwrap();
    let second = serialize(&func, &SerializeOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unresolved_free_variable_is_left_in_place() {
    let func = closure("() => missing + 1", &[]);
    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    // No parameter is injected; the identifier stays as written.
    assert_eq!(
        module,
        "var v1 = (() => () => missing + 1)();\nexports.handler = v1;\n"
    );
}

#[test]
fn strict_mode_fails_on_unresolved() {
    let func = closure("() => missing + 1", &[]);
    let options = SerializeOptions {
        strict: true,
        ..SerializeOptions::default()
    };
    let err = serialize(&func, &options).unwrap_err();
    assert!(matches!(
        err.root(),
        SkyhookError::UnresolvedFreeVariable { .. }
    ));
}

/// A closure whose scope chain is not retrievable serializes through the
/// process-wide registry instead.
#[test]
fn registry_fallback_resolves_captures() {
    // No recorded scopes: the probe fails with ScopesMissing.
    let func = ObjectRef::function(FunctionData::new(
        "registered",
        "function registered() { return x + y; }",
    ));
    register(
        &func,
        "src/handlers.js",
        "() => [x, y]",
        vec![JsValue::Number(2.0), JsValue::Number(40.0)],
    )
    .unwrap();

    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    assert!(module.contains("((x, y) => function registered"));
    assert!(module.contains(")(2, 40);"));
}

#[test]
fn missing_scopes_without_registry_entry_is_fatal() {
    let func = ObjectRef::function(FunctionData::new("orphan", "() => lost"));
    let err = serialize(&func, &SerializeOptions::default()).unwrap_err();
    assert!(matches!(err.root(), SkyhookError::ScopesMissing { .. }));
}

#[test]
fn factory_mode_invokes_root_export() {
    let inner = closure("() => payload", &[("payload", JsValue::string("p"))]);
    let factory = closure("() => make()", &[("make", JsValue::Object(inner))]);
    let options = SerializeOptions {
        is_factory_function: true,
        ..SerializeOptions::default()
    };
    let module = serialize(&factory, &options).unwrap();
    assert!(module.ends_with("exports.handler = v1();\n"));
}

/// A name shadowed by a later `const` in the same block resolves to the
/// outer binding for uses before the declarator.
#[test]
fn later_const_shadow_resolves_to_outer_binding() {
    let func = closure(
        "() => { const copy = x; const x = \"inner\"; return copy; }",
        &[("x", JsValue::string("outer"))],
    );
    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    assert!(module.contains("(\"outer\")"));
    assert!(module.contains("((x) =>"));
}

/// A function declaration nested in a block is in scope before its
/// syntactic position and never reports free.
#[test]
fn hoisted_function_declaration_is_not_free() {
    let func = closure(
        "() => { return helper(tail); function helper(n) { return n; } }",
        &[("tail", JsValue::Number(9.0))],
    );
    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    assert!(module.contains("((tail) =>"));
    assert!(!module.contains("(helper,"));
}

#[test]
fn bigint_and_special_numbers_round_trip_as_literals() {
    let func = closure(
        "() => [big, notNum, inf, negZero]",
        &[
            ("big", JsValue::BigInt("900719925474099100001".into())),
            ("notNum", JsValue::Number(f64::NAN)),
            ("inf", JsValue::Number(f64::INFINITY)),
            ("negZero", JsValue::Number(-0.0)),
        ],
    );
    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    assert!(module.contains("(900719925474099100001n, NaN, Infinity, -0)"));
}
