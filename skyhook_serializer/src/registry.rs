//! Process-wide closure registry.
//!
//! The alternate ingest path for hosts without an inspector protocol: a
//! load-time transformer wraps every function literal with a registration
//! call carrying a source-file identifier and an extractor of the shape
//! `() => [a, b, c]`. The registry parses the extractor to recover the
//! captured identifier names and pairs them with the captured values.
//!
//! The table is process-lifetime: entries are weak (they never keep a
//! function alive) and are never removed.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use skyhook_core::{JsValue, ObjectRef, SkyhookError, SkyhookResult, WeakObjectRef};
use skyhook_parser::ast::{ArrayItem, ArrowBody, ExprKind};
use std::sync::OnceLock;

/// A registered closure record.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Identifier of the source file that registered the function.
    pub source_file: String,
    /// Source text of the extractor, a `() => [a, b, c]` arrow.
    pub extractor_source: String,
    /// Captured values, in extractor order.
    pub captured: Vec<JsValue>,
}

struct Slot {
    handle: WeakObjectRef,
    entry: RegistryEntry,
}

fn table() -> &'static RwLock<FxHashMap<usize, Slot>> {
    static TABLE: OnceLock<RwLock<FxHashMap<usize, Slot>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// Register a function with its extractor.
///
/// Fails with `DuplicateRegistration` when the same live function is
/// already registered. A slot whose weak handle has died belongs to a
/// reclaimed function whose address was reused; it is silently replaced.
pub fn register(
    func: &ObjectRef,
    source_file: impl Into<String>,
    extractor_source: impl Into<String>,
    captured: Vec<JsValue>,
) -> SkyhookResult<()> {
    let key = func.id().as_usize();
    let mut guard = table().write();

    if let Some(slot) = guard.get(&key) {
        if slot
            .handle
            .upgrade()
            .is_some_and(|existing| existing.ptr_eq(func))
        {
            let name = func
                .read()
                .as_function()
                .map(|data| data.name.clone())
                .unwrap_or_default();
            return Err(SkyhookError::duplicate_registration(name));
        }
    }

    guard.insert(
        key,
        Slot {
            handle: func.downgrade(),
            entry: RegistryEntry {
                source_file: source_file.into(),
                extractor_source: extractor_source.into(),
                captured,
            },
        },
    );
    Ok(())
}

/// Look up the registry entry of a live function.
#[must_use]
pub fn lookup(func: &ObjectRef) -> Option<RegistryEntry> {
    let guard = table().read();
    let slot = guard.get(&func.id().as_usize())?;
    let alive = slot.handle.upgrade()?;
    alive.ptr_eq(func).then(|| slot.entry.clone())
}

/// The captured bindings of a registered function: extractor identifier
/// names paired with the captured values.
///
/// Returns `Ok(None)` when the function is not registered; fails with
/// `MalformedRegistryEntry` when the extractor does not have the required
/// shape or its arity does not match the captured values.
pub fn captured_bindings(func: &ObjectRef) -> SkyhookResult<Option<Vec<(String, JsValue)>>> {
    let Some(entry) = lookup(func) else {
        return Ok(None);
    };

    let names = extractor_names(&entry.extractor_source)?;
    if names.len() != entry.captured.len() {
        return Err(SkyhookError::malformed_registry(format!(
            "extractor names {} captured values {} in `{}`",
            names.len(),
            entry.captured.len(),
            entry.source_file,
        )));
    }
    Ok(Some(names.into_iter().zip(entry.captured).collect()))
}

/// Parse an extractor source down to its identifier list.
///
/// The only accepted shape is a zero-parameter arrow whose body is an
/// array literal each of whose elements is a bare identifier.
fn extractor_names(source: &str) -> SkyhookResult<Vec<String>> {
    let malformed = |detail: &str| {
        SkyhookError::malformed_registry(format!("extractor `{source}`: {detail}"))
    };

    let expr = skyhook_parser::parse_expression(source)
        .map_err(|err| malformed(&err.to_string()))?;
    let ExprKind::Arrow(arrow) = expr.kind else {
        return Err(malformed("not an arrow function"));
    };
    if !arrow.params.is_empty() {
        return Err(malformed("extractor takes parameters"));
    }
    let ArrowBody::Expr(body) = &arrow.body else {
        return Err(malformed("extractor body is not an expression"));
    };
    let ExprKind::Array(items) = &body.kind else {
        return Err(malformed("extractor body is not an array literal"));
    };

    let mut names = Vec::with_capacity(items.len());
    for item in items {
        let ArrayItem::Expr(element) = item else {
            return Err(malformed("array element is not a bare identifier"));
        };
        let ExprKind::Ident(name) = &element.kind else {
            return Err(malformed("array element is not a bare identifier"));
        };
        names.push(name.clone());
    }
    Ok(names)
}
