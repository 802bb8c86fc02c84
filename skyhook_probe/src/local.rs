//! Probe over in-memory value graphs.

use crate::EngineProbe;
use skyhook_core::{BoundInternals, ObjectRef, ScopeFrame, SkyhookError, SkyhookResult};
use tracing::trace;

/// Serves probe queries from [`FunctionData`](skyhook_core::FunctionData)
/// already present in the value graph.
///
/// This is the ingest path for graphs the host program constructed itself
/// and for graphs the inspector mirror produced earlier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProbe;

impl LocalProbe {
    /// Create a local probe.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EngineProbe for LocalProbe {
    fn source_of(&self, func: &ObjectRef) -> SkyhookResult<String> {
        crate::with_function_data(func, |data| {
            trace!(name = %data.name, "source_of");
            Ok(data.source.clone())
        })
    }

    fn bound_internals_of(&self, func: &ObjectRef) -> SkyhookResult<BoundInternals> {
        crate::with_function_data(func, |data| {
            if !data.is_bound() {
                return Err(SkyhookError::not_bound(&data.name));
            }
            data.bound
                .clone()
                .ok_or_else(|| SkyhookError::not_bound(&data.name))
        })
    }

    fn scopes_of(&self, func: &ObjectRef) -> SkyhookResult<Vec<ScopeFrame>> {
        crate::with_function_data(func, |data| {
            trace!(name = %data.name, "scopes_of");
            match &data.scopes {
                // Stored outer-to-inner; the probe contract is innermost
                // first.
                Some(frames) => Ok(frames.iter().rev().cloned().collect()),
                None => Err(SkyhookError::scopes_missing(&data.name)),
            }
        })
    }
}
