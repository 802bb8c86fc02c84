//! Wire types for the inspector protocol.
//!
//! Three operation shapes cover everything the probe needs:
//! `Runtime.evaluate` (evaluate-in-context), `Runtime.getProperties`
//! (get-properties-of-object-id) and `Runtime.callFunctionOn`
//! (call-function-on-object-id). Every remote value travels as a
//! [`RemoteObject`]; composite values carry an opaque object id assigned
//! by the engine, which the transport must keep stable for the lifetime
//! of a session.

use serde::{Deserialize, Serialize};

/// Parameters of an evaluate-in-context request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// The expression to evaluate.
    pub expression: String,
    /// Execution context to evaluate in; `None` is the default context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<u64>,
    /// Whether to return the result by value instead of by object id.
    pub return_by_value: bool,
}

/// Parameters of a get-properties request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesParams {
    /// The object to enumerate.
    pub object_id: String,
    /// Restrict to own properties.
    pub own_properties: bool,
}

/// Parameters of a call-function-on request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    /// The receiver object (`this` inside the synthesized function).
    pub object_id: String,
    /// Source of the synthesized function to invoke.
    pub function_declaration: String,
    /// Call arguments.
    pub arguments: Vec<CallArgument>,
    /// Whether to return the result by value.
    pub return_by_value: bool,
}

/// One argument of a call-function-on request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    /// A JSON-serializable value argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// An object argument, by id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl CallArgument {
    /// A by-value argument.
    #[must_use]
    pub fn value(value: serde_json::Value) -> Self {
        Self {
            value: Some(value),
            object_id: None,
        }
    }
}

/// A value as reported by the engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Value type: `object`, `function`, `number`, `string`, `boolean`,
    /// `bigint`, `undefined`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Subtype for objects: `array`, `null`, ...
    #[serde(default)]
    pub subtype: Option<String>,
    /// JSON value, when representable.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Encoding of values JSON cannot carry: `NaN`, `Infinity`,
    /// `-Infinity`, `-0`, or bigint digits with an `n` suffix.
    #[serde(default)]
    pub unserializable_value: Option<String>,
    /// Opaque engine-assigned id for composite values.
    #[serde(default)]
    pub object_id: Option<String>,
    /// Human-readable description (function sources, class names, ...).
    #[serde(default)]
    pub description: Option<String>,
}

/// Response to an evaluate or call-function-on request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// The produced value.
    pub result: RemoteObject,
    /// Present when evaluation threw.
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// Details of a remote exception.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Short description of the thrown value.
    #[serde(default)]
    pub text: String,
}

/// Response to a get-properties request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesResponse {
    /// Own property descriptors.
    pub result: Vec<PropertyDescriptor>,
    /// Engine-internal slots (`[[Scopes]]`, `[[TargetFunction]]`, ...).
    #[serde(default)]
    pub internal_properties: Vec<InternalPropertyDescriptor>,
}

impl GetPropertiesResponse {
    /// Find an internal slot by name.
    #[must_use]
    pub fn internal(&self, name: &str) -> Option<&RemoteObject> {
        self.internal_properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_ref())
    }

    /// Find an own property descriptor by name.
    #[must_use]
    pub fn own(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.result.iter().find(|p| p.name == name)
    }
}

/// One own property.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name.
    pub name: String,
    /// Property value; absent for accessor properties.
    #[serde(default)]
    pub value: Option<RemoteObject>,
    /// Whether the property is enumerable.
    #[serde(default)]
    pub enumerable: bool,
    /// Whether the property is own (as opposed to inherited).
    #[serde(default)]
    pub is_own: bool,
}

/// One engine-internal slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalPropertyDescriptor {
    /// Slot name, e.g. `[[Scopes]]`.
    pub name: String,
    /// Slot value.
    #[serde(default)]
    pub value: Option<RemoteObject>,
}
