//! String interning pool.
//!
//! Topic and license strings repeat heavily across packages ("MIT",
//! "zig", "cli"); the in-memory store routes them through a [`StringPool`]
//! so each distinct value is allocated once. This is an internal
//! optimization only and never part of the store contract.

use std::{collections::HashSet, sync::Arc};

/// An owned mapping from string value to a single canonical allocation.
#[derive(Debug, Default)]
pub struct StringPool {
    entries: HashSet<Arc<str>>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical allocation for `value`, inserting it on first
    /// sight.
    pub fn intern(&mut self, value: &str) -> Arc<str> {
        if let Some(existing) = self.entries.get(value) {
            return Arc::clone(existing);
        }
        let entry: Arc<str> = Arc::from(value);
        self.entries.insert(Arc::clone(&entry));
        entry
    }

    /// Number of distinct strings held by the pool.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let mut pool = StringPool::new();
        let a = pool.intern("MIT");
        let b = pool.intern("MIT");
        let c = pool.intern("Apache-2.0");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_empty_pool() {
        let pool = StringPool::new();
        assert!(pool.is_empty());
    }
}
