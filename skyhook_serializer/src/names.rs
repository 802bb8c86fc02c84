//! Collision-free identifier allocation.

use rustc_hash::{FxHashMap, FxHashSet};

/// Default prefix for serialized values.
pub const VALUE_PREFIX: &str = "v";
/// Default prefix for injected bound receivers.
pub const SELF_PREFIX: &str = "_self";
/// Default prefix for substituted class heritage targets.
pub const SUPER_PREFIX: &str = "_super";

/// Mints identifier names from per-prefix monotone counters.
///
/// The first name for prefix `v` is `v1`; `next_name` skips anything in
/// the exclude set, so emitted names never collide with identifiers
/// already present in a function body or with in-scope free variables.
#[derive(Debug, Default)]
pub struct NameAllocator {
    counters: FxHashMap<String, u32>,
}

impl NameAllocator {
    /// Create an allocator with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The next free name for `prefix`, skipping the exclude set.
    pub fn next_name(&mut self, prefix: &str, exclude: &FxHashSet<String>) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{prefix}{counter}");
            if !exclude.contains(&candidate) {
                return candidate;
            }
        }
    }
}
