//! Well-known globals and the identity-keyed whitelist.
//!
//! Captured values that are the host's own built-in roots (`Object`,
//! `Array`, `console`, ...) must be referenced by their global identifier in
//! the emitted module, never copied. Membership is decided by value
//! identity, not by name: a program that reassigns the global `Object`
//! produces a different value, which compares unequal here and is
//! serialized normally.

use crate::value::{FunctionData, JsObject, JsValue, ObjectRef};
use std::sync::OnceLock;

// =============================================================================
// Intrinsic Objects
// =============================================================================

/// The host's built-in root objects, one identity per process.
#[derive(Debug)]
pub struct Intrinsics {
    /// The `Object` constructor.
    pub object_ctor: ObjectRef,
    /// The `Array` constructor.
    pub array_ctor: ObjectRef,
    /// The `Function` constructor.
    pub function_ctor: ObjectRef,
    /// The `Number` constructor.
    pub number_ctor: ObjectRef,
    /// The `String` constructor.
    pub string_ctor: ObjectRef,
    /// The `Boolean` constructor.
    pub boolean_ctor: ObjectRef,
    /// The `Math` namespace object.
    pub math: ObjectRef,
    /// The `JSON` namespace object.
    pub json: ObjectRef,
    /// The host `console` object.
    pub console: ObjectRef,
    /// The host `process` object.
    pub process: ObjectRef,
}

impl Intrinsics {
    /// Materialize a fresh set of intrinsic objects.
    #[must_use]
    pub fn new() -> Self {
        Self {
            object_ctor: native_ctor("Object"),
            array_ctor: native_ctor("Array"),
            function_ctor: native_ctor("Function"),
            number_ctor: native_ctor("Number"),
            string_ctor: native_ctor("String"),
            boolean_ctor: native_ctor("Boolean"),
            math: ObjectRef::new(JsObject::native("Math")),
            json: ObjectRef::new(JsObject::native("JSON")),
            console: ObjectRef::new(JsObject::native("console")),
            process: ObjectRef::new(JsObject::native("process")),
        }
    }

    /// The default global whitelist over these intrinsics.
    #[must_use]
    pub fn global_set(&self) -> GlobalSet {
        let mut set = GlobalSet::default();
        set.insert("Object", self.object_ctor.clone());
        set.insert("Array", self.array_ctor.clone());
        set.insert("Function", self.function_ctor.clone());
        set.insert("Number", self.number_ctor.clone());
        set.insert("String", self.string_ctor.clone());
        set.insert("Boolean", self.boolean_ctor.clone());
        set.insert("Math", self.math.clone());
        set.insert("JSON", self.json.clone());
        set.insert("console", self.console.clone());
        set.insert("process", self.process.clone());
        set
    }
}

impl Default for Intrinsics {
    fn default() -> Self {
        Self::new()
    }
}

/// A native constructor function (source carries the native-body marker).
fn native_ctor(name: &str) -> ObjectRef {
    ObjectRef::function(FunctionData::new(
        name,
        format!("function {name}() {{ [native code] }}"),
    ))
}

/// Process-wide intrinsics, created lazily on first use.
pub fn default_globals() -> &'static Intrinsics {
    static INTRINSICS: OnceLock<Intrinsics> = OnceLock::new();
    INTRINSICS.get_or_init(Intrinsics::new)
}

// =============================================================================
// Global Whitelist
// =============================================================================

/// Identity-keyed mapping from well-known values to their global names.
#[derive(Debug, Clone, Default)]
pub struct GlobalSet {
    entries: Vec<(String, ObjectRef)>,
}

impl GlobalSet {
    /// Add a named global to the set.
    pub fn insert(&mut self, name: impl Into<String>, value: ObjectRef) {
        self.entries.push((name.into(), value));
    }

    /// The global name of `value`, if it is identity-equal to a member.
    #[must_use]
    pub fn name_of(&self, value: &JsValue) -> Option<&str> {
        let obj = value.as_object()?;
        self.entries
            .iter()
            .find(|(_, member)| member.ptr_eq(obj))
            .map(|(name, _)| name.as_str())
    }

    /// Whether `value` is identity-equal to a member.
    #[must_use]
    pub fn contains(&self, value: &JsValue) -> bool {
        self.name_of(value).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_by_identity_not_name() {
        let intrinsics = Intrinsics::new();
        let set = intrinsics.global_set();

        let real = JsValue::Object(intrinsics.object_ctor.clone());
        assert_eq!(set.name_of(&real), Some("Object"));

        // A reassigned `Object` is a different value and must not match.
        let impostor = JsValue::Object(native_ctor("Object"));
        assert!(!set.contains(&impostor));
    }

    #[test]
    fn test_primitives_are_never_members() {
        let set = Intrinsics::new().global_set();
        assert!(!set.contains(&JsValue::string("Object")));
        assert!(!set.contains(&JsValue::Undefined));
    }

    #[test]
    fn test_default_globals_is_a_singleton() {
        let a = default_globals();
        let b = default_globals();
        assert!(a.console.ptr_eq(&b.console));
    }

    #[test]
    fn test_native_ctor_source_carries_marker() {
        let ctor = native_ctor("Array");
        let guard = ctor.read();
        let data = guard.as_function().unwrap();
        assert!(data.is_native());
        assert_eq!(data.name, "Array");
    }
}
