//! Remote-to-local value mirroring.
//!
//! Walks a remote object graph over the inspector session and rebuilds it
//! as local [`skyhook_core::value`] objects. A memo from remote object id
//! to local handle keeps identity: two remote references to one object
//! mirror to one local handle, and cycles terminate.

use super::protocol::RemoteObject;
use super::InspectorSession;
use rustc_hash::FxHashMap;
use skyhook_core::{
    BoundInternals, FunctionData, JsObject, JsValue, ObjectKind, ObjectRef, Proto, ScopeFrame,
    SkyhookError, SkyhookResult,
};
use smallvec::SmallVec;
use tracing::debug;

/// Object ids of the engine's well-known prototype roots, fetched once per
/// mirror pass from the default context.
struct WellKnownProtos {
    object: Option<String>,
    array: Option<String>,
    function: Option<String>,
}

/// One mirroring pass over a session.
pub struct Mirror<'s> {
    session: &'s InspectorSession,
    /// Remote object id → local handle.
    memo: FxHashMap<String, ObjectRef>,
    well_known: Option<WellKnownProtos>,
}

impl<'s> Mirror<'s> {
    /// Create a mirror over the given session.
    #[must_use]
    pub fn new(session: &'s InspectorSession) -> Self {
        Self {
            session,
            memo: FxHashMap::default(),
            well_known: None,
        }
    }

    /// Mirror a remote function by object id.
    pub fn function(&mut self, object_id: &str) -> SkyhookResult<ObjectRef> {
        let remote = RemoteObject {
            kind: "function".to_string(),
            object_id: Some(object_id.to_string()),
            ..RemoteObject::default()
        };
        self.object(&remote)
    }

    /// Mirror any remote value.
    pub fn value(&mut self, remote: &RemoteObject) -> SkyhookResult<JsValue> {
        match remote.kind.as_str() {
            "undefined" => Ok(JsValue::Undefined),
            "boolean" => Ok(JsValue::Bool(
                remote.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            )),
            "string" => Ok(JsValue::String(
                remote
                    .value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            )),
            "number" => Ok(JsValue::Number(Self::mirror_number(remote)?)),
            "bigint" => {
                let digits = remote
                    .unserializable_value
                    .as_deref()
                    .and_then(|v| v.strip_suffix('n'))
                    .ok_or_else(|| {
                        SkyhookError::probe_unavailable("bigint without digit encoding")
                    })?;
                Ok(JsValue::BigInt(digits.to_string()))
            }
            "object" if remote.subtype.as_deref() == Some("null") => Ok(JsValue::Null),
            "object" | "function" => Ok(JsValue::Object(self.object(remote)?)),
            other => Err(SkyhookError::probe_unavailable(format!(
                "unmirrorable remote value of type `{other}`"
            ))),
        }
    }

    fn mirror_number(remote: &RemoteObject) -> SkyhookResult<f64> {
        if let Some(value) = remote.value.as_ref().and_then(|v| v.as_f64()) {
            return Ok(value);
        }
        match remote.unserializable_value.as_deref() {
            Some("NaN") => Ok(f64::NAN),
            Some("Infinity") => Ok(f64::INFINITY),
            Some("-Infinity") => Ok(f64::NEG_INFINITY),
            Some("-0") => Ok(-0.0),
            other => Err(SkyhookError::probe_unavailable(format!(
                "number without a usable encoding: {other:?}"
            ))),
        }
    }

    // =========================================================================
    // Objects
    // =========================================================================

    fn object(&mut self, remote: &RemoteObject) -> SkyhookResult<ObjectRef> {
        let object_id = remote.object_id.clone().ok_or_else(|| {
            SkyhookError::probe_unavailable("composite remote value without object id")
        })?;
        if let Some(existing) = self.memo.get(&object_id) {
            return Ok(existing.clone());
        }

        // Shell first so cycles land on the memo instead of recursing.
        let is_function = remote.kind == "function";
        let is_array = remote.subtype.as_deref() == Some("array");
        let shell = if is_function {
            ObjectRef::function(FunctionData::new("", ""))
        } else if is_array {
            ObjectRef::array(Vec::new())
        } else {
            ObjectRef::plain()
        };
        self.memo.insert(object_id.clone(), shell.clone());
        debug!(%object_id, "mirroring remote object");

        let props = self.session.get_properties(&object_id)?;

        // Mirror child values without holding the shell's lock.
        let mut elements: Vec<Option<JsValue>> = Vec::new();
        let mut plain_props: Vec<(String, JsValue)> = Vec::new();
        for descriptor in &props.result {
            if !descriptor.is_own || !descriptor.enumerable {
                continue;
            }
            if is_function && matches!(descriptor.name.as_str(), "name" | "length" | "prototype") {
                continue;
            }
            if is_array && descriptor.name == "length" {
                continue;
            }
            let value = match &descriptor.value {
                Some(value) => self.value(value)?,
                None => continue,
            };
            if is_array {
                if let Ok(index) = descriptor.name.parse::<usize>() {
                    if elements.len() <= index {
                        elements.resize(index + 1, None);
                    }
                    elements[index] = Some(value);
                    continue;
                }
            }
            plain_props.push((descriptor.name.clone(), value));
        }

        let function_data = if is_function {
            Some(self.function_data(&object_id, &props)?)
        } else {
            None
        };

        let proto = self.prototype_of(&props, is_array, is_function)?;

        {
            let mut guard = shell.write();
            if let Some(data) = function_data {
                guard.kind = ObjectKind::Function(Box::new(data));
            } else if is_array {
                guard.kind = ObjectKind::Array(elements);
            }
            guard.properties = plain_props;
            guard.proto = proto;
        }
        Ok(shell)
    }

    fn prototype_of(
        &mut self,
        props: &super::protocol::GetPropertiesResponse,
        is_array: bool,
        is_function: bool,
    ) -> SkyhookResult<Proto> {
        let default = if is_function {
            Proto::FunctionProto
        } else if is_array {
            Proto::ArrayProto
        } else {
            Proto::ObjectProto
        };
        let Some(remote) = props.internal("[[Prototype]]") else {
            return Ok(default);
        };
        if remote.subtype.as_deref() == Some("null") {
            return Ok(Proto::Null);
        }
        let Some(proto_id) = remote.object_id.as_deref() else {
            return Ok(default);
        };

        let known = self.well_known_protos()?;
        if known.object.as_deref() == Some(proto_id) {
            return Ok(Proto::ObjectProto);
        }
        if known.array.as_deref() == Some(proto_id) {
            return Ok(Proto::ArrayProto);
        }
        if known.function.as_deref() == Some(proto_id) {
            return Ok(Proto::FunctionProto);
        }
        let remote = remote.clone();
        Ok(Proto::Object(self.object(&remote)?))
    }

    fn well_known_protos(&mut self) -> SkyhookResult<&WellKnownProtos> {
        if self.well_known.is_none() {
            let mut fetch = |expr: &str| -> SkyhookResult<Option<String>> {
                Ok(self.session.evaluate(expr, false)?.object_id)
            };
            let object = fetch("Object.prototype")?;
            let array = fetch("Array.prototype")?;
            let function = fetch("Function.prototype")?;
            self.well_known = Some(WellKnownProtos {
                object,
                array,
                function,
            });
        }
        Ok(self.well_known.as_ref().expect("just initialized"))
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn function_data(
        &mut self,
        object_id: &str,
        props: &super::protocol::GetPropertiesResponse,
    ) -> SkyhookResult<FunctionData> {
        let source = self.session.stringify_function(object_id)?;
        let name = props
            .own("name")
            .and_then(|d| d.value.as_ref())
            .and_then(|v| v.value.as_ref())
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let mut data = FunctionData::new(name, source);

        if let Some(target) = props.internal("[[TargetFunction]]") {
            let target = target.clone();
            let this = props.internal("[[BoundThis]]").cloned().unwrap_or(RemoteObject {
                kind: "undefined".to_string(),
                ..RemoteObject::default()
            });
            let args = props.internal("[[BoundArgs]]").cloned();
            data.bound = Some(BoundInternals {
                target: self.object(&target)?,
                this: self.value(&this)?,
                args: match args {
                    Some(args) => self.bound_args(&args)?,
                    None => Vec::new(),
                },
            });
        }

        if let Some(scopes) = props.internal("[[Scopes]]").cloned() {
            data.scopes = Some(self.scope_chain(&scopes)?);
        }

        if let Some(prototype) = props.own("prototype").and_then(|d| d.value.clone()) {
            if prototype.object_id.is_some() {
                data.prototype = Some(self.object(&prototype)?);
            }
        }

        Ok(data)
    }

    fn bound_args(&mut self, remote: &RemoteObject) -> SkyhookResult<Vec<JsValue>> {
        let Some(object_id) = remote.object_id.as_deref() else {
            return Ok(Vec::new());
        };
        let props = self.session.get_properties(object_id)?;
        let mut indexed: Vec<(usize, JsValue)> = Vec::new();
        for descriptor in &props.result {
            let Ok(index) = descriptor.name.parse::<usize>() else {
                continue;
            };
            if let Some(value) = &descriptor.value {
                indexed.push((index, self.value(value)?));
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, value)| value).collect())
    }

    /// Mirror the `[[Scopes]]` chain. The wire order is innermost first;
    /// [`FunctionData::scopes`] stores outer-to-inner, so the collected
    /// frames are reversed. Global scopes are not captured: whitelisted
    /// globals are referenced by name, and everything else on the global
    /// object is not part of the closure.
    fn scope_chain(&mut self, remote: &RemoteObject) -> SkyhookResult<SmallVec<[ScopeFrame; 4]>> {
        let Some(list_id) = remote.object_id.as_deref() else {
            return Ok(SmallVec::new());
        };
        let list = self.session.get_properties(list_id)?;

        let mut frames: Vec<ScopeFrame> = Vec::new();
        let mut entries: Vec<(usize, RemoteObject)> = Vec::new();
        for descriptor in &list.result {
            let Ok(index) = descriptor.name.parse::<usize>() else {
                continue;
            };
            if let Some(value) = &descriptor.value {
                entries.push((index, value.clone()));
            }
        }
        entries.sort_by_key(|(index, _)| *index);

        for (_, scope) in entries {
            if scope
                .description
                .as_deref()
                .is_some_and(|d| d.starts_with("Global"))
            {
                continue;
            }
            let Some(scope_id) = scope.object_id.as_deref() else {
                continue;
            };
            frames.push(self.scope_frame(scope_id)?);
        }

        frames.reverse();
        Ok(frames.into_iter().collect())
    }

    fn scope_frame(&mut self, scope_id: &str) -> SkyhookResult<ScopeFrame> {
        let props = self.session.get_properties(scope_id)?;
        let mut bindings = Vec::new();
        for descriptor in &props.result {
            let value = match &descriptor.value {
                Some(value) => self.value(value)?,
                // Some engines elide binding values from the descriptor;
                // park the scope object in the scratch table and read the
                // binding back by name.
                None => {
                    let expr = self.session.stash(scope_id)?;
                    let remote = self
                        .session
                        .evaluate(&format!("{expr}[{:?}]", descriptor.name), false)?;
                    self.value(&remote)?
                }
            };
            bindings.push((descriptor.name.clone(), value));
        }
        Ok(ScopeFrame::new(bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::{InspectorProbe, Transport};
    use serde_json::{json, Value};
    use skyhook_core::SkyhookResult;

    /// A transport that answers from a canned script keyed on method and
    /// the interesting request parameter.
    struct ScriptedTransport;

    impl ScriptedTransport {
        fn properties_for(object_id: &str) -> Value {
            match object_id {
                "fn:1" => json!({
                    "result": [
                        {"name": "name", "value": {"type": "string", "value": "f"}, "enumerable": false, "isOwn": true}
                    ],
                    "internalProperties": [
                        {"name": "[[Scopes]]", "value": {"type": "object", "objectId": "scopes:1"}},
                        {"name": "[[Prototype]]", "value": {"type": "object", "objectId": "proto:fun"}}
                    ]
                }),
                "scopes:1" => json!({
                    "result": [
                        {"name": "0", "value": {"type": "object", "objectId": "scope:0", "description": "Closure"}},
                        {"name": "1", "value": {"type": "object", "objectId": "scope:g", "description": "Global"}}
                    ]
                }),
                "scope:0" => json!({
                    "result": [
                        {"name": "o", "value": {"type": "object", "objectId": "obj:1"}, "enumerable": true, "isOwn": true},
                        {"name": "s", "value": {"type": "string", "value": "hi"}, "enumerable": true, "isOwn": true}
                    ]
                }),
                "obj:1" => json!({
                    "result": [
                        {"name": "self", "value": {"type": "object", "objectId": "obj:1"}, "enumerable": true, "isOwn": true},
                        {"name": "n", "value": {"type": "number", "value": 7}, "enumerable": true, "isOwn": true}
                    ],
                    "internalProperties": [
                        {"name": "[[Prototype]]", "value": {"type": "object", "objectId": "proto:obj"}}
                    ]
                }),
                other => panic!("unexpected getProperties for {other}"),
            }
        }

        fn evaluate_result(expression: &str) -> Value {
            let object_id = match expression {
                "Object.prototype" => "proto:obj",
                "Array.prototype" => "proto:arr",
                "Function.prototype" => "proto:fun",
                expr if expr.starts_with("globalThis.__skyhookScratch = ") => {
                    return json!({"result": {"type": "object", "objectId": "scratch"}});
                }
                other => panic!("unexpected evaluate of {other}"),
            };
            json!({"result": {"type": "object", "objectId": object_id}})
        }
    }

    impl Transport for ScriptedTransport {
        fn call(&mut self, method: &str, params: Value) -> SkyhookResult<Value> {
            Ok(match method {
                "Runtime.createContext" => json!({"executionContextId": 9}),
                "Runtime.evaluate" => {
                    Self::evaluate_result(params["expression"].as_str().unwrap())
                }
                "Runtime.getProperties" => {
                    Self::properties_for(params["objectId"].as_str().unwrap())
                }
                "Runtime.callFunctionOn" => {
                    // The only synthesized call in this script is function
                    // stringification.
                    json!({"result": {"type": "string", "value": "() => [o, s]"}})
                }
                other => panic!("unexpected method {other}"),
            })
        }
    }

    #[test]
    fn test_mirror_function_with_captured_cycle() {
        let probe = InspectorProbe::new(Box::new(ScriptedTransport));
        let func = probe.mirror_function("fn:1").unwrap();

        let guard = func.read();
        let data = guard.as_function().unwrap();
        assert_eq!(data.name, "f");
        assert_eq!(data.source, "() => [o, s]");

        // One non-global frame; string binding mirrored by value.
        let scopes = data.scopes.as_ref().unwrap();
        assert_eq!(scopes.len(), 1);
        assert!(matches!(
            scopes[0].get("s"),
            Some(JsValue::String(s)) if s == "hi"
        ));

        // The captured object's self-reference mirrors to the same handle.
        let Some(JsValue::Object(obj)) = scopes[0].get("o") else {
            panic!("expected object binding");
        };
        let obj_guard = obj.read();
        let Some(JsValue::Object(inner)) = obj_guard.get("self") else {
            panic!("expected self reference");
        };
        assert!(inner.ptr_eq(obj));
        assert!(matches!(obj_guard.proto, Proto::ObjectProto));
    }
}
