//! # Skyhook Probe
//!
//! Engine introspection behind one seam: the [`EngineProbe`] trait exposes
//! the three operations the serializer needs from a live function: its
//! source text, its bound-function internals, and its captured scope chain.
//!
//! Two implementations ship here:
//!
//! - [`LocalProbe`] serves value graphs already materialized in memory
//!   (the host program built them, or a mirror did).
//! - [`inspector::InspectorProbe`] speaks a debugger/inspector protocol to
//!   a remote engine over a pluggable transport and mirrors remote values
//!   into the local graph.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod inspector;
pub mod local;

pub use inspector::{InspectorProbe, InspectorSession, Transport};
pub use local::LocalProbe;

use skyhook_core::{BoundInternals, FunctionData, ObjectRef, ScopeFrame, SkyhookResult};

/// Introspection operations over a live function handle.
///
/// Contract notes:
/// - `source_of` returns either readable source or a string containing the
///   native-body marker (`[native code]`).
/// - `bound_internals_of` may only be called when the function's declared
///   name carries the `bound ` prefix; otherwise it fails `NotBound`.
/// - `scopes_of` returns the captured lexical scope chain **innermost
///   first** (the wire order); fails `ScopesMissing` when the chain is not
///   retrievable, which is the signal to fall back to the closure registry.
pub trait EngineProbe {
    /// The engine's canonical stringification of the function.
    fn source_of(&self, func: &ObjectRef) -> SkyhookResult<String>;

    /// Target, receiver and leading arguments of a bound function.
    fn bound_internals_of(&self, func: &ObjectRef) -> SkyhookResult<BoundInternals>;

    /// The captured lexical scope chain, innermost first.
    fn scopes_of(&self, func: &ObjectRef) -> SkyhookResult<Vec<ScopeFrame>>;
}

/// Run `f` against the function data of `func`, failing with an internal
/// error when the handle is not a function.
pub(crate) fn with_function_data<R>(
    func: &ObjectRef,
    f: impl FnOnce(&FunctionData) -> SkyhookResult<R>,
) -> SkyhookResult<R> {
    let guard = func.read();
    match guard.as_function() {
        Some(data) => f(data),
        None => Err(skyhook_core::SkyhookError::internal(
            "probe handle is not a function",
        )),
    }
}
