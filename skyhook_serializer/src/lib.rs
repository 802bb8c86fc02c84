//! # Skyhook Serializer
//!
//! Serializes a live function, plus the transitive closure of values it
//! references, into a self-contained JavaScript module. Evaluating the
//! module in a fresh process reproduces the function under
//! `exports.handler`.
//!
//! ```text
//! serialize(func)
//!   └─ engine probe ─ source, bound internals, scope chain
//!      └─ function parser ─ normalized AST
//!         └─ free-variable analyzer ─ names + resolved values
//!            └─ value-graph serializer ─ preamble/postamble statements
//!               └─ closure emitter ─ module text
//! ```
//!
//! Failures are fail-closed: no partial module text is ever returned.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod emit;
pub mod graph;
pub mod names;
pub mod registry;
pub mod scope;
pub mod transform;

pub use graph::GraphSerializer;
pub use names::NameAllocator;
pub use registry::{RegistryEntry, captured_bindings, register};
pub use scope::{Analysis, ResolvedScopes, analyze, resolve_scopes};
pub use transform::{AstTransform, SerializeOptions};

use skyhook_core::{GlobalSet, ObjectRef, SkyhookResult, default_globals};
use skyhook_probe::{EngineProbe, LocalProbe};
use tracing::debug;

/// A serializer bound to an engine probe and a global whitelist.
pub struct Serializer<'a> {
    engine: &'a dyn EngineProbe,
    globals: GlobalSet,
}

impl<'a> Serializer<'a> {
    /// Create a serializer over an engine probe with the default global
    /// whitelist.
    #[must_use]
    pub fn new(engine: &'a dyn EngineProbe) -> Self {
        Self {
            engine,
            globals: default_globals().global_set(),
        }
    }

    /// Replace the global whitelist.
    #[must_use]
    pub fn with_globals(mut self, globals: GlobalSet) -> Self {
        self.globals = globals;
        self
    }

    /// Serialize `func` into a complete module text ending in
    /// `exports.handler = …;`.
    pub fn serialize(
        &self,
        func: &ObjectRef,
        options: &SerializeOptions,
    ) -> SkyhookResult<String> {
        let mut graph = GraphSerializer::new(self.engine, options, &self.globals);
        let root = graph.serialize_root(func)?;
        debug!(
            root = %root,
            preamble = graph.preamble.len(),
            postamble = graph.postamble.len(),
            "assembling module"
        );
        Ok(emit::assemble_module(
            graph.preamble,
            graph.postamble,
            &root,
            options.is_factory_function,
        ))
    }
}

/// Serialize a function from an in-memory value graph with the default
/// probe and global whitelist.
pub fn serialize(func: &ObjectRef, options: &SerializeOptions) -> SkyhookResult<String> {
    Serializer::new(&LocalProbe::new()).serialize(func, options)
}
