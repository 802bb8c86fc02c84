//! End-to-end serialization scenarios.
//!
//! Each test builds a live value graph the way the engine probe would
//! materialize it, serializes the root closure, and asserts on the emitted
//! module text.

use skyhook_core::{
    BoundInternals, FunctionData, JsValue, ObjectRef, Proto, ScopeFrame,
};
use skyhook_serializer::{serialize, SerializeOptions};
use smallvec::smallvec;

fn frame(bindings: &[(&str, JsValue)]) -> ScopeFrame {
    ScopeFrame::new(
        bindings
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
    )
}

/// A closure with one captured frame.
fn closure(source: &str, bindings: &[(&str, JsValue)]) -> ObjectRef {
    let mut data = FunctionData::new("", source);
    data.scopes = Some(smallvec![frame(bindings)]);
    ObjectRef::function(data)
}

/// A named function with no captures.
fn plain_function(name: &str, source: &str) -> ObjectRef {
    let mut data = FunctionData::new(name, source);
    data.scopes = Some(smallvec![]);
    ObjectRef::function(data)
}

/// A class constructor with its prototype object wired up.
fn class_function(name: &str, source: &str, bindings: &[(&str, JsValue)]) -> ObjectRef {
    let mut data = FunctionData::new(name, source);
    data.scopes = Some(smallvec![frame(bindings)]);
    let class = ObjectRef::function(data);

    let prototype = ObjectRef::plain();
    prototype
        .write()
        .set("constructor", JsValue::Object(class.clone()));
    class
        .write()
        .as_function_mut()
        .expect("class fixture")
        .prototype = Some(prototype);
    class
}

/// Index of the line declaring `ident`, and the first line referencing it.
fn decl_and_first_use(module: &str, ident: &str) -> (usize, usize) {
    let decl_prefix = format!("var {ident} = ");
    let mut decl = None;
    let mut first_use = None;
    for (index, line) in module.lines().enumerate() {
        if line.starts_with(&decl_prefix) {
            decl.get_or_insert(index);
        } else if line.contains(ident) {
            first_use.get_or_insert(index);
        }
    }
    (
        decl.unwrap_or_else(|| panic!("no declaration of {ident}")),
        first_use.unwrap_or(usize::MAX),
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenario_1_captured_string() {
    let func = closure("() => x", &[("x", JsValue::string("hi"))]);
    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    assert_eq!(
        module,
        "var v1 = ((x) => () => x)(\"hi\");\nexports.handler = v1;\n"
    );
}

#[test]
fn scenario_2_array_of_functions() {
    let g = plain_function("g", "function g() { return \"hi\"; }");
    let arr = ObjectRef::array(vec![Some(JsValue::Object(g))]);
    let func = closure("() => arr", &[("arr", JsValue::Object(arr))]);

    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    assert!(module.contains("var v2 = [];"));
    assert!(module.contains("function g()"));
    assert!(module.contains("v2.push(v3);"));
    assert!(module.contains("var v1 = ((arr) => () => arr)(v2);"));
    assert!(module.ends_with("exports.handler = v1;\n"));
}

#[test]
fn scenario_3_shared_function_identity() {
    let g = plain_function("g", "function g() { return \"hi\"; }");
    let func = closure(
        "() => [g, g, b]",
        &[
            ("g", JsValue::Object(g.clone())),
            ("b", JsValue::Object(g)),
        ],
    );

    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    // One declaration for the shared function; both parameters receive the
    // same identifier.
    assert_eq!(module.matches("function g()").count(), 1);
    assert!(module.contains("((g, b) => () => [g, g, b])(v2, v2);"));
}

#[test]
fn scenario_4_bound_function() {
    let g = plain_function("g", "function g() { return this.v; }");
    let receiver = ObjectRef::plain();
    receiver.write().set("v", JsValue::string("ok"));

    let mut bound_data = FunctionData::new("bound g", "function () { [native code] }");
    bound_data.bound = Some(BoundInternals {
        target: g,
        this: JsValue::Object(receiver),
        args: Vec::new(),
    });
    let f = ObjectRef::function(bound_data);

    let func = closure("() => f()", &[("f", JsValue::Object(f))]);
    let module = serialize(&func, &SerializeOptions::default()).unwrap();

    assert!(module.contains("function g()"));
    assert!(module.contains(".bind(_self1))(v4);"));
    assert!(module.contains("v4.v = \"ok\";"));
    assert!(module.contains("var v1 = ((f) => () => f())(v2);"));
}

#[test]
fn scenario_5_class_instance() {
    let class = class_function(
        "A",
        "class A {\n  constructor(x) {\n    this.x = x;\n  }\n  get() {\n    return this.x;\n  }\n}",
        &[],
    );
    let prototype = class
        .read()
        .as_function()
        .unwrap()
        .prototype
        .clone()
        .unwrap();

    let instance = ObjectRef::plain();
    instance.write().set("x", JsValue::string("v"));
    instance.write().proto = Proto::Object(prototype);

    let func = closure("() => a.get()", &[("a", JsValue::Object(instance))]);
    let module = serialize(&func, &SerializeOptions::default()).unwrap();

    assert!(module.contains("class A {"));
    assert!(module.contains("constructor(x)"));
    assert!(module.contains("v2.x = \"v\";"));
    // The instance's prototype chain lands on the class's own prototype
    // object, not a rebuilt copy.
    assert!(module.contains("Object.setPrototypeOf(v2, v3.prototype);"));
}

#[test]
fn scenario_6_class_with_altered_meta_prototype() {
    let class_a = class_function("A", "class A {\n  constructor(x) {\n    this.x = x;\n  }\n}", &[]);
    let class_b = class_function("B", "class B {}", &[]);

    let class_c = class_function(
        "C",
        "class C extends A {}",
        &[("A", JsValue::Object(class_a))],
    );
    // setPrototypeOf(C, B): the meta-prototype no longer matches the
    // heritage clause.
    class_c.write().proto = Proto::Object(class_b);

    let func = closure(
        "() => new C(\"v\").constructor.name",
        &[("C", JsValue::Object(class_c))],
    );
    let module = serialize(&func, &SerializeOptions::default()).unwrap();

    assert!(module.contains("class C extends _super1"));
    assert!(module.contains("class B {}"));
    // The altered chain is expressed through the substituted heritage, not
    // a set-prototype call on the class.
    assert!(!module.contains("setPrototypeOf(v2"));
    assert!(module.contains("() => new C(\"v\").constructor.name"));
}

#[test]
fn scenario_7_self_referential_object() {
    let o = ObjectRef::plain();
    o.write().set("self", JsValue::Object(o.clone()));
    let func = closure("() => o", &[("o", JsValue::Object(o))]);

    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    assert_eq!(
        module,
        "var v2 = {};\nvar v1 = ((o) => () => o)(v2);\nv2.self = v2;\nexports.handler = v1;\n"
    );
}

#[test]
fn scenario_8_globals_referenced_by_name() {
    let globals = skyhook_core::default_globals();
    let func = closure(
        "() => [Object, Array, console]",
        &[
            ("Object", JsValue::Object(globals.object_ctor.clone())),
            ("Array", JsValue::Object(globals.array_ctor.clone())),
            ("console", JsValue::Object(globals.console.clone())),
        ],
    );

    let module = serialize(&func, &SerializeOptions::default()).unwrap();
    // No declarations and no wrapper parameters for whitelisted globals:
    // the body references them directly.
    assert_eq!(
        module,
        "var v1 = (() => () => [Object, Array, console])();\nexports.handler = v1;\n"
    );
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn declarations_precede_uses() {
    let g = plain_function("g", "function g() { return shared; }");
    g.write()
        .as_function_mut()
        .unwrap()
        .scopes = Some(smallvec![frame(&[(
        "shared",
        JsValue::string("s")
    )])]);

    let shared_obj = ObjectRef::plain();
    let arr = ObjectRef::array(vec![
        Some(JsValue::Object(shared_obj.clone())),
        Some(JsValue::Object(g)),
    ]);
    shared_obj.write().set("list", JsValue::Object(arr.clone()));

    let func = closure("() => arr", &[("arr", JsValue::Object(arr))]);
    let module = serialize(&func, &SerializeOptions::default()).unwrap();

    for ident in ["v1", "v2", "v3", "v4"] {
        let (decl, first_use) = decl_and_first_use(&module, ident);
        assert!(
            decl < first_use,
            "{ident} declared at line {decl} but used at line {first_use}\n{module}"
        );
    }
}
