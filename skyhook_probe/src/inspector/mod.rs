//! Inspector-protocol probe.
//!
//! [`InspectorSession`] owns one debugger connection. Requests are strictly
//! serialized: the remote side keeps a single scratch table keyed by a
//! monotonically-incrementing id, so two in-flight requests would race on
//! ids. The scratch table itself lives in a side-channel execution context
//! created lazily on first use, out of reach of the host program's globals.
//!
//! [`InspectorProbe`] mirrors remote functions (and everything they
//! capture) into local [`skyhook_core::value`] graphs and then answers the
//! [`EngineProbe`](crate::EngineProbe) operations from the mirrored data.

pub mod mirror;
pub mod protocol;

use crate::{EngineProbe, LocalProbe};
use parking_lot::Mutex;
use protocol::{
    CallArgument, CallFunctionOnParams, EvaluateParams, EvaluateResponse, GetPropertiesParams,
    GetPropertiesResponse, RemoteObject,
};
use skyhook_core::{BoundInternals, ObjectRef, ScopeFrame, SkyhookError, SkyhookResult};
use tracing::{debug, trace};

/// Name of the scratch table inside the side-channel context.
const SCRATCH_TABLE: &str = "__skyhookScratch";

// =============================================================================
// Transport
// =============================================================================

/// A synchronous request/response channel to the engine's inspector.
///
/// Implementations wrap whatever carries the protocol (a pipe, a socket, a
/// test script). Object ids returned by the engine must stay stable for
/// the lifetime of the session.
pub trait Transport: Send {
    /// Issue one request and block for its response.
    fn call(
        &mut self,
        method: &str,
        params: serde_json::Value,
    ) -> SkyhookResult<serde_json::Value>;
}

// =============================================================================
// Session
// =============================================================================

struct SessionInner {
    transport: Box<dyn Transport>,
    /// Monotone counter behind request ids and scratch-table keys.
    next_id: u64,
    /// The side-channel execution context, once created.
    scratch_context: Option<u64>,
}

/// One serialized inspector connection.
///
/// All requests go through an internal mutex: at most one outstanding
/// remote evaluation at any time.
pub struct InspectorSession {
    inner: Mutex<SessionInner>,
}

impl InspectorSession {
    /// Create a session over the given transport.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                transport,
                next_id: 0,
                scratch_context: None,
            }),
        }
    }

    /// Evaluate an expression in the side-channel context.
    pub fn evaluate(&self, expression: &str, by_value: bool) -> SkyhookResult<RemoteObject> {
        let mut inner = self.inner.lock();
        let context_id = Self::ensure_scratch_context(&mut inner)?;
        Self::evaluate_in(&mut inner, expression, Some(context_id), by_value)
    }

    /// Enumerate the own and internal properties of a remote object.
    pub fn get_properties(&self, object_id: &str) -> SkyhookResult<GetPropertiesResponse> {
        let mut inner = self.inner.lock();
        let params = serde_json::to_value(GetPropertiesParams {
            object_id: object_id.to_string(),
            own_properties: true,
        })
        .map_err(|e| SkyhookError::probe_unavailable(e.to_string()))?;
        let raw = Self::request(&mut inner, "Runtime.getProperties", params)?;
        serde_json::from_value(raw).map_err(|e| SkyhookError::probe_unavailable(e.to_string()))
    }

    /// Invoke a synthesized function with a remote object as receiver.
    pub fn call_function_on(
        &self,
        object_id: &str,
        declaration: &str,
        arguments: Vec<CallArgument>,
        by_value: bool,
    ) -> SkyhookResult<RemoteObject> {
        let mut inner = self.inner.lock();
        let params = serde_json::to_value(CallFunctionOnParams {
            object_id: object_id.to_string(),
            function_declaration: declaration.to_string(),
            arguments,
            return_by_value: by_value,
        })
        .map_err(|e| SkyhookError::probe_unavailable(e.to_string()))?;
        let raw = Self::request(&mut inner, "Runtime.callFunctionOn", params)?;
        let response: EvaluateResponse = serde_json::from_value(raw)
            .map_err(|e| SkyhookError::probe_unavailable(e.to_string()))?;
        Self::unwrap_response(response)
    }

    /// Park a remote object in the scratch table under a fresh key and
    /// return an expression that reads it back.
    ///
    /// This is the protocol's only way to hand an object from one request
    /// to a later evaluate: the synthesized function assigns `this` into
    /// the table, and the caller dereferences the returned expression.
    pub fn stash(&self, object_id: &str) -> SkyhookResult<String> {
        let key = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            format!("s{}", inner.next_id)
        };
        let declaration = format!(
            "function (key) {{ (globalThis.{SCRATCH_TABLE} = globalThis.{SCRATCH_TABLE} || {{}})[key] = this; }}"
        );
        self.call_function_on(
            object_id,
            &declaration,
            vec![CallArgument::value(serde_json::Value::String(key.clone()))],
            true,
        )?;
        Ok(format!("globalThis.{SCRATCH_TABLE}[\"{key}\"]"))
    }

    /// The engine's stringification of a remote function.
    pub fn stringify_function(&self, object_id: &str) -> SkyhookResult<String> {
        let result = self.call_function_on(
            object_id,
            "function () { return String(this); }",
            Vec::new(),
            true,
        )?;
        match result.value {
            Some(serde_json::Value::String(source)) => Ok(source),
            other => Err(SkyhookError::probe_unavailable(format!(
                "function stringification returned {other:?}"
            ))),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_scratch_context(inner: &mut SessionInner) -> SkyhookResult<u64> {
        if let Some(id) = inner.scratch_context {
            return Ok(id);
        }
        let raw = Self::request(inner, "Runtime.createContext", serde_json::json!({}))?;
        let id = raw
            .get("executionContextId")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| {
                SkyhookError::probe_unavailable("createContext returned no context id")
            })?;
        debug!(context = id, "created side-channel context");
        Self::evaluate_in(
            inner,
            &format!("globalThis.{SCRATCH_TABLE} = globalThis.{SCRATCH_TABLE} || {{}}"),
            Some(id),
            true,
        )?;
        inner.scratch_context = Some(id);
        Ok(id)
    }

    fn evaluate_in(
        inner: &mut SessionInner,
        expression: &str,
        context_id: Option<u64>,
        by_value: bool,
    ) -> SkyhookResult<RemoteObject> {
        let params = serde_json::to_value(EvaluateParams {
            expression: expression.to_string(),
            context_id,
            return_by_value: by_value,
        })
        .map_err(|e| SkyhookError::probe_unavailable(e.to_string()))?;
        let raw = Self::request(inner, "Runtime.evaluate", params)?;
        let response: EvaluateResponse = serde_json::from_value(raw)
            .map_err(|e| SkyhookError::probe_unavailable(e.to_string()))?;
        Self::unwrap_response(response)
    }

    fn request(
        inner: &mut SessionInner,
        method: &str,
        params: serde_json::Value,
    ) -> SkyhookResult<serde_json::Value> {
        inner.next_id += 1;
        trace!(id = inner.next_id, method, "inspector request");
        inner.transport.call(method, params)
    }

    fn unwrap_response(response: EvaluateResponse) -> SkyhookResult<RemoteObject> {
        if let Some(details) = response.exception_details {
            return Err(SkyhookError::probe_unavailable(format!(
                "remote evaluation threw: {}",
                details.text
            )));
        }
        Ok(response.result)
    }
}

// =============================================================================
// Probe
// =============================================================================

/// Probe over a remote engine.
///
/// `mirror_function` materializes a remote function (source, name, bound
/// internals, scope chain, prototype objects, and every captured value)
/// into the local graph; the `EngineProbe` operations then answer from
/// that graph.
pub struct InspectorProbe {
    session: InspectorSession,
}

impl InspectorProbe {
    /// Create a probe over the given transport.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            session: InspectorSession::new(transport),
        }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &InspectorSession {
        &self.session
    }

    /// Mirror the remote function with the given object id into the local
    /// value graph.
    pub fn mirror_function(&self, object_id: &str) -> SkyhookResult<ObjectRef> {
        let mut mirror = mirror::Mirror::new(&self.session);
        mirror.function(object_id)
    }
}

impl EngineProbe for InspectorProbe {
    fn source_of(&self, func: &ObjectRef) -> SkyhookResult<String> {
        LocalProbe::new().source_of(func)
    }

    fn bound_internals_of(&self, func: &ObjectRef) -> SkyhookResult<BoundInternals> {
        LocalProbe::new().bound_internals_of(func)
    }

    fn scopes_of(&self, func: &ObjectRef) -> SkyhookResult<Vec<ScopeFrame>> {
        LocalProbe::new().scopes_of(func)
    }
}
