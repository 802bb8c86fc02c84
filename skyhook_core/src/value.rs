//! The materialized JavaScript value graph.
//!
//! A serialization run operates on values that have been materialized into
//! this graph, either by the host program constructing them directly or by
//! the inspector probe mirroring them out of a remote engine. Object values
//! are shared handles with pointer identity; identity is what the serializer
//! deduplicates on and what makes cycles representable.
//!
//! ```text
//! JsValue ── primitives (inlined by the serializer, never cached)
//!    └── Object(ObjectRef) ── Arc<RwLock<JsObject>>
//!            ├── properties: insertion-ordered own properties
//!            ├── kind: Plain | Array | Function(FunctionData) | Native
//!            └── proto: ObjectProto | ArrayProto | FunctionProto | Null | Object(_)
//! ```

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, Weak};

/// The `bound ` name prefix the engine gives partially-applied functions.
pub const BOUND_NAME_PREFIX: &str = "bound ";

/// The marker embedded in the stringification of engine-native functions.
pub const NATIVE_BODY_MARKER: &str = "[native code]";

// =============================================================================
// Values
// =============================================================================

/// A JavaScript value.
#[derive(Debug, Clone)]
pub enum JsValue {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number, including `-0`, `NaN` and the infinities.
    Number(f64),
    /// A string.
    String(String),
    /// A bigint, kept as its radix-10 digit string (optional leading `-`).
    BigInt(String),
    /// An object, array, function or host object.
    Object(ObjectRef),
}

impl JsValue {
    /// Convenience constructor for string values.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Convenience constructor for number values.
    #[inline]
    #[must_use]
    pub fn number(n: f64) -> Self {
        Self::Number(n)
    }

    /// Whether this value is a primitive (inlined, never identity-cached).
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Object(_))
    }

    /// The object handle, if this value is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// JavaScript `===` semantics: structural for primitives (`NaN !== NaN`),
    /// pointer identity for objects.
    #[must_use]
    pub fn strict_eq(&self, other: &JsValue) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// =============================================================================
// Object Handles
// =============================================================================

/// Identity of an object handle, stable for the handle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Raw pointer value backing the identity.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

/// A shared, identity-bearing handle to a [`JsObject`].
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<JsObject>>);

impl ObjectRef {
    /// Wrap an object into a fresh handle with a new identity.
    #[must_use]
    pub fn new(object: JsObject) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// A fresh plain object (`{}` with the default prototype).
    #[must_use]
    pub fn plain() -> Self {
        Self::new(JsObject::plain())
    }

    /// A fresh array with the given elements (`None` is a hole).
    #[must_use]
    pub fn array(elements: Vec<Option<JsValue>>) -> Self {
        Self::new(JsObject::array(elements))
    }

    /// A fresh function object.
    #[must_use]
    pub fn function(data: FunctionData) -> Self {
        Self::new(JsObject::function(data))
    }

    /// This handle's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Whether two handles refer to the same object.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Read access to the object.
    pub fn read(&self) -> RwLockReadGuard<'_, JsObject> {
        self.0.read()
    }

    /// Write access to the object.
    pub fn write(&self) -> RwLockWriteGuard<'_, JsObject> {
        self.0.write()
    }

    /// Downgrade to a weak handle (used by the process-wide registry).
    #[must_use]
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Cycles are routine in this graph; print identity, not contents.
        let kind = match &self.read().kind {
            ObjectKind::Plain => "object",
            ObjectKind::Array(_) => "array",
            ObjectKind::Function(_) => "function",
            ObjectKind::Native { .. } => "native",
        };
        write!(f, "ObjectRef({kind}@{:#x})", self.id().as_usize())
    }
}

/// A weak counterpart to [`ObjectRef`].
#[derive(Clone)]
pub struct WeakObjectRef(Weak<RwLock<JsObject>>);

impl WeakObjectRef {
    /// Upgrade back to a strong handle if the object is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }
}

// =============================================================================
// Objects
// =============================================================================

/// An object in the value graph.
#[derive(Debug)]
pub struct JsObject {
    /// What kind of object this is.
    pub kind: ObjectKind,
    /// Own enumerable string-keyed properties, in insertion order.
    ///
    /// Insertion order is the order the serializer emits in; keeping it here
    /// (rather than a hash map) is what makes two runs over the same graph
    /// byte-identical.
    pub properties: Vec<(String, JsValue)>,
    /// The object's own prototype (its meta-prototype, for functions).
    pub proto: Proto,
}

impl JsObject {
    /// A plain `{}` with the default object prototype.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            kind: ObjectKind::Plain,
            properties: Vec::new(),
            proto: Proto::ObjectProto,
        }
    }

    /// An array with the default array prototype.
    #[must_use]
    pub fn array(elements: Vec<Option<JsValue>>) -> Self {
        Self {
            kind: ObjectKind::Array(elements),
            properties: Vec::new(),
            proto: Proto::ArrayProto,
        }
    }

    /// A function object with the default function prototype.
    #[must_use]
    pub fn function(data: FunctionData) -> Self {
        Self {
            kind: ObjectKind::Function(Box::new(data)),
            properties: Vec::new(),
            proto: Proto::FunctionProto,
        }
    }

    /// A native host object (e.g. `console`) with a description.
    pub fn native(description: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Native {
                description: description.into(),
            },
            properties: Vec::new(),
            proto: Proto::ObjectProto,
        }
    }

    /// Get an own property by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsValue> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set an own property, replacing in place or appending in order.
    pub fn set(&mut self, key: impl Into<String>, value: JsValue) {
        let key = key.into();
        if let Some(slot) = self.properties.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.properties.push((key, value));
        }
    }

    /// The function data, if this object is a function.
    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.kind {
            ObjectKind::Function(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable function data, if this object is a function.
    pub fn as_function_mut(&mut self) -> Option<&mut FunctionData> {
        match &mut self.kind {
            ObjectKind::Function(data) => Some(data),
            _ => None,
        }
    }
}

/// Object kinds distinguished by the serializer.
#[derive(Debug)]
pub enum ObjectKind {
    /// An ordinary object.
    Plain,
    /// An array; `None` elements are holes.
    Array(Vec<Option<JsValue>>),
    /// A function, with its introspected internals.
    Function(Box<FunctionData>),
    /// A host-provided object with no serializable contents.
    Native {
        /// Engine description, e.g. `console`.
        description: String,
    },
}

/// An object's prototype link.
///
/// The three well-known roots are named rather than materialized so that
/// "default prototype" checks need no global bookkeeping.
#[derive(Debug, Clone)]
pub enum Proto {
    /// The object-root prototype (`Object.prototype`).
    ObjectProto,
    /// The array-root prototype (`Array.prototype`).
    ArrayProto,
    /// The function-root prototype (`Function.prototype`).
    FunctionProto,
    /// A `null` prototype.
    Null,
    /// A user object.
    Object(ObjectRef),
}

impl Proto {
    /// Whether this is one of the three well-known roots.
    #[must_use]
    pub fn is_well_known(&self) -> bool {
        matches!(
            self,
            Self::ObjectProto | Self::ArrayProto | Self::FunctionProto
        )
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Introspected internals of a live function.
#[derive(Debug)]
pub struct FunctionData {
    /// Declared name as the engine reports it; may be empty, and is
    /// `bound `-prefixed for partially-applied functions.
    pub name: String,
    /// The engine's canonical stringification of the function.
    pub source: String,
    /// Captured lexical scope chain, ordered outer-to-inner.
    ///
    /// `None` means the chain is not retrievable (the probe fails with
    /// `ScopesMissing` and callers fall back to the closure registry).
    pub scopes: Option<SmallVec<[ScopeFrame; 4]>>,
    /// Bound-function internals. Present iff [`FunctionData::is_bound`].
    pub bound: Option<BoundInternals>,
    /// The object stored as the function's `prototype` property, if any.
    pub prototype: Option<ObjectRef>,
}

impl FunctionData {
    /// A function with source and name only (no scopes recorded).
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            scopes: None,
            bound: None,
            prototype: None,
        }
    }

    /// Whether the declared name carries the `bound ` prefix.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.name.starts_with(BOUND_NAME_PREFIX)
    }

    /// Whether the source is the engine's native-body marker.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.source.contains(NATIVE_BODY_MARKER)
    }

    /// The declared name with any `bound ` prefixes stripped.
    #[must_use]
    pub fn unbound_name(&self) -> &str {
        let mut name = self.name.as_str();
        while let Some(rest) = name.strip_prefix(BOUND_NAME_PREFIX) {
            name = rest;
        }
        name
    }
}

/// Internals of a function produced by partial application.
#[derive(Debug, Clone)]
pub struct BoundInternals {
    /// The wrapped target function.
    pub target: ObjectRef,
    /// The captured receiver.
    pub this: JsValue,
    /// The captured leading arguments.
    pub args: Vec<JsValue>,
}

/// One frame of a captured scope chain: name-to-value bindings.
#[derive(Debug, Clone, Default)]
pub struct ScopeFrame {
    /// Bindings in this frame, in the order the engine reported them.
    pub bindings: Vec<(String, JsValue)>,
}

impl ScopeFrame {
    /// Build a frame from name/value pairs.
    #[must_use]
    pub fn new(bindings: Vec<(String, JsValue)>) -> Self {
        Self { bindings }
    }

    /// Look up a binding by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&JsValue> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_eq_primitives() {
        assert!(JsValue::Number(1.0).strict_eq(&JsValue::Number(1.0)));
        assert!(!JsValue::Number(f64::NAN).strict_eq(&JsValue::Number(f64::NAN)));
        assert!(JsValue::Number(0.0).strict_eq(&JsValue::Number(-0.0)));
        assert!(JsValue::string("a").strict_eq(&JsValue::string("a")));
        assert!(!JsValue::Null.strict_eq(&JsValue::Undefined));
    }

    #[test]
    fn test_strict_eq_objects_is_identity() {
        let a = ObjectRef::plain();
        let b = ObjectRef::plain();
        assert!(JsValue::Object(a.clone()).strict_eq(&JsValue::Object(a.clone())));
        assert!(!JsValue::Object(a).strict_eq(&JsValue::Object(b)));
    }

    #[test]
    fn test_object_set_replaces_in_place() {
        let obj = ObjectRef::plain();
        obj.write().set("a", JsValue::Number(1.0));
        obj.write().set("b", JsValue::Number(2.0));
        obj.write().set("a", JsValue::Number(3.0));
        let guard = obj.read();
        assert_eq!(guard.properties.len(), 2);
        assert_eq!(guard.properties[0].0, "a");
        assert!(matches!(guard.get("a"), Some(JsValue::Number(n)) if *n == 3.0));
    }

    #[test]
    fn test_cyclic_object_debug_does_not_recurse() {
        let obj = ObjectRef::plain();
        obj.write()
            .set("self", JsValue::Object(obj.clone()));
        let repr = format!("{:?}", obj);
        assert!(repr.contains("object@"));
    }

    #[test]
    fn test_bound_name_detection() {
        let mut data = FunctionData::new("bound bound g", "function () { [native code] }");
        assert!(data.is_bound());
        assert!(data.is_native());
        assert_eq!(data.unbound_name(), "g");
        data.name = "g".to_string();
        assert!(!data.is_bound());
    }

    #[test]
    fn test_scope_frame_lookup() {
        let frame = ScopeFrame::new(vec![
            ("x".to_string(), JsValue::string("hi")),
            ("y".to_string(), JsValue::Null),
        ]);
        assert!(matches!(frame.get("x"), Some(JsValue::String(s)) if s == "hi"));
        assert!(frame.get("z").is_none());
    }
}
