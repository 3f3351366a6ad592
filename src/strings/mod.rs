//! Global string interning table: every fixed-area string-like member
//! value is stored as a 32-bit interned string number, not raw text.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Bidirectional text <-> interned-number table, shared by every object
/// repository and string-like unique-key index in one application.
pub struct StringTable {
    to_id: DashMap<String, u32>,
    to_text: DashMap<u32, String>,
    next_id: AtomicU32,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    /// An empty table. Interned IDs start at 1; 0 is reserved as "no value".
    pub fn new() -> Self {
        Self {
            to_id: DashMap::new(),
            to_text: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Return `text`'s interned ID, assigning a fresh one if this is the
    /// first time it has been seen.
    pub fn intern(&self, text: &str) -> u32 {
        if let Some(id) = self.to_id.get(text) {
            return *id;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.to_id.entry(text.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(e) => *e.get(),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(id);
                self.to_text.insert(id, text.to_string());
                id
            }
        }
    }

    /// Look up the text behind an interned ID.
    pub fn text_for(&self, id: u32) -> Option<String> {
        self.to_text.get(&id).map(|s| s.clone())
    }

    /// Number of distinct strings interned.
    pub fn len(&self) -> usize {
        self.to_id.len()
    }

    /// True iff no string has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_text_returns_same_id() {
        let table = StringTable::new();
        let a = table.intern("hello");
        let b = table.intern("hello");
        assert_eq!(a, b);
        assert_eq!(table.text_for(a).as_deref(), Some("hello"));
    }

    #[test]
    fn distinct_text_gets_distinct_ids() {
        let table = StringTable::new();
        let a = table.intern("one");
        let b = table.intern("two");
        assert_ne!(a, b);
    }
}
