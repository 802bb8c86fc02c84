//! Error taxonomy for the closure serializer.
//!
//! All failures are fail-closed: a `SkyhookError` reaching the top-level
//! `serialize` caller means no module text was produced. Errors crossing the
//! serializer boundary are wrapped with the path of the offending sub-value
//! from the serialization root (see [`SkyhookError::at_path`]).

use crate::span::Span;
use std::fmt;

/// Result alias used throughout the workspace.
pub type SkyhookResult<T> = Result<T, SkyhookError>;

/// All error conditions the serializer can surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SkyhookError {
    /// The lexer rejected the function source.
    LexError {
        /// Human-readable description.
        message: String,
        /// Offending range in the source text.
        span: Span,
    },
    /// The parser rejected the function source.
    SyntaxError {
        /// Human-readable description.
        message: String,
        /// Offending range in the source text.
        span: Span,
    },
    /// The function source did not parse even after the shorthand retry.
    UnparseableSource {
        /// Description of both failed attempts.
        message: String,
    },
    /// The function is engine-native and not a bound-target wrapper.
    NativeFunctionUnsupported {
        /// Declared name of the native function or object.
        name: String,
    },
    /// The engine exposes no introspection protocol.
    ProbeUnavailable {
        /// Transport or session detail.
        message: String,
    },
    /// Bound internals were requested for a function that is not bound.
    NotBound {
        /// Declared name of the function.
        name: String,
    },
    /// The lexical scope chain could not be retrieved.
    ScopesMissing {
        /// Declared name of the function.
        name: String,
    },
    /// A pre- or post-process transform did not produce the expected shape.
    InvalidConfiguration {
        /// What the pipeline observed.
        message: String,
    },
    /// Setting the requested prototype chain would create a cycle.
    CyclicPrototype {
        /// Path from the serialization root to the offending object.
        path: String,
    },
    /// A closure-registry extractor had the wrong shape or arity.
    MalformedRegistryEntry {
        /// What the registry observed.
        message: String,
    },
    /// A free variable resolved to no binding in any enclosing scope.
    UnresolvedFreeVariable {
        /// The unresolved identifier text.
        name: String,
    },
    /// The same function was registered with the closure registry twice.
    DuplicateRegistration {
        /// Declared name of the function.
        name: String,
    },
    /// Invariant violation inside the serializer itself.
    Internal {
        /// Description of the broken invariant.
        message: String,
    },
    /// An error wrapped with serialization context.
    WithPath {
        /// Path from the serialization root (e.g. `handler.captured.arr[2]`).
        path: String,
        /// The underlying error.
        source: Box<SkyhookError>,
    },
}

impl SkyhookError {
    /// Lexer failure at `span`.
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self::LexError {
            message: message.into(),
            span,
        }
    }

    /// Parser failure at `span`.
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span,
        }
    }

    /// Source did not parse after every normalization attempt.
    pub fn unparseable(message: impl Into<String>) -> Self {
        Self::UnparseableSource {
            message: message.into(),
        }
    }

    /// Native function or host object with no serializable body.
    pub fn native_function(name: impl Into<String>) -> Self {
        Self::NativeFunctionUnsupported { name: name.into() }
    }

    /// Engine probe transport or session failure.
    pub fn probe_unavailable(message: impl Into<String>) -> Self {
        Self::ProbeUnavailable {
            message: message.into(),
        }
    }

    /// Bound internals requested on a non-bound function.
    pub fn not_bound(name: impl Into<String>) -> Self {
        Self::NotBound { name: name.into() }
    }

    /// Scope chain not retrievable.
    pub fn scopes_missing(name: impl Into<String>) -> Self {
        Self::ScopesMissing { name: name.into() }
    }

    /// Transform pipeline misconfiguration.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Prototype chain cycle detected at `path`.
    pub fn cyclic_prototype(path: impl Into<String>) -> Self {
        Self::CyclicPrototype { path: path.into() }
    }

    /// Registry extractor shape or arity mismatch.
    pub fn malformed_registry(message: impl Into<String>) -> Self {
        Self::MalformedRegistryEntry {
            message: message.into(),
        }
    }

    /// Free variable with no binding in any enclosing scope.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::UnresolvedFreeVariable { name: name.into() }
    }

    /// Second registration of one function.
    pub fn duplicate_registration(name: impl Into<String>) -> Self {
        Self::DuplicateRegistration { name: name.into() }
    }

    /// Internal invariant violation.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wrap this error with the path of the value being serialized.
    ///
    /// Nested wraps are flattened: only the outermost path is kept, since it
    /// is computed from the serialization root.
    #[must_use]
    pub fn at_path(self, path: impl Into<String>) -> Self {
        match self {
            Self::WithPath { source, .. } => Self::WithPath {
                path: path.into(),
                source,
            },
            other => Self::WithPath {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, unwrapping any context wrapper.
    #[must_use]
    pub fn root(&self) -> &SkyhookError {
        match self {
            Self::WithPath { source, .. } => source.root(),
            other => other,
        }
    }

    /// The serialization path attached to this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::WithPath { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for SkyhookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexError { message, span } => write!(f, "lex error at {span}: {message}"),
            Self::SyntaxError { message, span } => write!(f, "syntax error at {span}: {message}"),
            Self::UnparseableSource { message } => {
                write!(f, "function source is not parseable: {message}")
            }
            Self::NativeFunctionUnsupported { name } => {
                write!(f, "native function `{name}` has no serializable body")
            }
            Self::ProbeUnavailable { message } => write!(f, "engine probe unavailable: {message}"),
            Self::NotBound { name } => {
                write!(f, "function `{name}` has no bound internals")
            }
            Self::ScopesMissing { name } => {
                write!(f, "scope chain of `{name}` is not retrievable")
            }
            Self::InvalidConfiguration { message } => {
                write!(f, "invalid configuration: {message}")
            }
            Self::CyclicPrototype { path } => {
                write!(f, "prototype chain cycle at {path}")
            }
            Self::MalformedRegistryEntry { message } => {
                write!(f, "malformed registry entry: {message}")
            }
            Self::UnresolvedFreeVariable { name } => {
                write!(f, "free variable `{name}` resolved to no enclosing scope")
            }
            Self::DuplicateRegistration { name } => {
                write!(f, "function `{name}` is already registered")
            }
            Self::Internal { message } => write!(f, "internal error: {message}"),
            Self::WithPath { path, source } => write!(f, "at {path}: {source}"),
        }
    }
}

impl std::error::Error for SkyhookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WithPath { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_variants() {
        assert!(matches!(
            SkyhookError::syntax("bad", Span::new(0, 1)),
            SkyhookError::SyntaxError { .. }
        ));
        assert!(matches!(
            SkyhookError::not_bound("f"),
            SkyhookError::NotBound { .. }
        ));
        assert!(matches!(
            SkyhookError::duplicate_registration("f"),
            SkyhookError::DuplicateRegistration { .. }
        ));
    }

    #[test]
    fn test_at_path_wraps_and_root_unwraps() {
        let err = SkyhookError::unresolved("x").at_path("handler.obj.fn");
        assert_eq!(err.path(), Some("handler.obj.fn"));
        assert!(matches!(
            err.root(),
            SkyhookError::UnresolvedFreeVariable { .. }
        ));
    }

    #[test]
    fn test_at_path_flattens_nested_wraps() {
        let err = SkyhookError::internal("boom")
            .at_path("inner")
            .at_path("outer");
        assert_eq!(err.path(), Some("outer"));
        assert!(matches!(err.root(), SkyhookError::Internal { .. }));
    }

    #[test]
    fn test_display_includes_path() {
        let err = SkyhookError::cyclic_prototype("handler.proto").at_path("handler");
        let text = err.to_string();
        assert!(text.contains("handler"));
        assert!(text.contains("prototype chain cycle"));
    }
}
