//! Lexical frames and binding classification.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

bitflags::bitflags! {
    /// How a name became bound in its frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindingFlags: u8 {
        /// Bound by a parameter pattern.
        const PARAM = 1 << 0;
        /// Hoisted function declaration.
        const HOISTED_FN = 1 << 1;
        /// Hoisted bare `var` declarator.
        const HOISTED_VAR = 1 << 2;
        /// Bound by an initialized or lexical declarator.
        const DECLARED = 1 << 3;
        /// Bound by a catch-clause parameter.
        const CATCH = 1 << 4;
        /// A function or class expression's own name.
        const SELF_NAME = 1 << 5;
        /// Bound by a for-loop head.
        const FOR_BINDING = 1 << 6;
    }
}

/// One lexical frame: the names bound at some point in the tree.
#[derive(Debug, Default)]
pub struct Frame {
    bindings: FxHashMap<String, BindingFlags>,
}

impl Frame {
    /// Bind a name, merging flags if it is already bound.
    pub fn bind(&mut self, name: impl Into<String>, flags: BindingFlags) {
        *self
            .bindings
            .entry(name.into())
            .or_insert(BindingFlags::empty()) |= flags;
    }

    /// Whether this frame binds `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Flags of a binding, if present.
    #[must_use]
    pub fn flags(&self, name: &str) -> Option<BindingFlags> {
        self.bindings.get(name).copied()
    }
}

/// A stack of lexical frames. Frames compose by union: a name is bound if
/// any frame on the stack binds it.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: SmallVec<[Frame; 8]>,
}

impl FrameStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fresh frame.
    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pop the innermost frame.
    pub fn pop(&mut self) {
        self.frames.pop().expect("frame stack underflow");
    }

    /// Bind a name in the innermost frame.
    pub fn bind(&mut self, name: impl Into<String>, flags: BindingFlags) {
        self.frames
            .last_mut()
            .expect("bind with no frame")
            .bind(name, flags);
    }

    /// Whether any frame binds `name`.
    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.contains(name))
    }

    /// Current stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
