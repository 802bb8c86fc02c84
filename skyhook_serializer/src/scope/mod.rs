//! Free-variable analysis and value resolution.

pub mod symbol;
pub mod visitor;

pub use symbol::{BindingFlags, Frame, FrameStack};
pub use visitor::{Analysis, analyze};

use crate::registry;
use skyhook_core::{JsValue, ObjectRef, ScopeFrame, SkyhookError, SkyhookResult};
use skyhook_probe::EngineProbe;
use tracing::debug;

/// Resolved bindings for one function, from whichever ingest path served
/// them.
#[derive(Debug)]
pub enum ResolvedScopes {
    /// Probe-served scope chain, ordered outer-to-inner.
    Chain(Vec<ScopeFrame>),
    /// Registry-served flat binding list.
    Registry(Vec<(String, JsValue)>),
}

impl ResolvedScopes {
    /// The value bound to `name`.
    ///
    /// For a probe-served chain the walk is outer-to-innermost and the
    /// first match wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&JsValue> {
        match self {
            Self::Chain(frames) => frames.iter().find_map(|frame| frame.get(name)),
            Self::Registry(bindings) => bindings
                .iter()
                .find(|(bound, _)| bound == name)
                .map(|(_, value)| value),
        }
    }
}

/// Resolve the bindings visible to `func`, preferring the engine probe and
/// falling back to the closure registry when the probe cannot serve the
/// chain. Only when both paths come up empty does the failure become
/// fatal.
pub fn resolve_scopes(
    engine: &dyn EngineProbe,
    func: &ObjectRef,
) -> SkyhookResult<ResolvedScopes> {
    let probe_error = match engine.scopes_of(func) {
        Ok(mut frames) => {
            // The wire order is innermost first; resolution walks
            // outer-to-innermost.
            frames.reverse();
            return Ok(ResolvedScopes::Chain(frames));
        }
        Err(
            err @ (SkyhookError::ScopesMissing { .. } | SkyhookError::ProbeUnavailable { .. }),
        ) => err,
        Err(other) => return Err(other),
    };

    if let Some(bindings) = registry::captured_bindings(func)? {
        debug!("resolved bindings through the closure registry");
        return Ok(ResolvedScopes::Registry(bindings));
    }
    Err(probe_error)
}
