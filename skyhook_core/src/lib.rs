//! # Skyhook Core
//!
//! Shared foundation for the skyhook closure serializer: source spans, the
//! error taxonomy, the materialized JavaScript value graph, and the
//! identity-keyed table of well-known globals.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod error;
pub mod intrinsics;
pub mod span;
pub mod value;

pub use error::{SkyhookError, SkyhookResult};
pub use intrinsics::{GlobalSet, Intrinsics, default_globals};
pub use span::Span;
pub use value::{
    BoundInternals, FunctionData, JsObject, JsValue, ObjectId, ObjectKind, Proto, ScopeFrame,
    WeakObjectRef,
};
pub use value::ObjectRef;
