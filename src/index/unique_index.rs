//! Strict one-to-one value -> object-ID index.

use crate::core::{Error, Result};
use crate::index::key::IndexKey;
use dashmap::DashMap;

/// A unique-key index: every value maps to at most one object.
#[derive(Default)]
pub struct UniqueIndex {
    map: DashMap<IndexKey, u32>,
}

impl UniqueIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key -> object_id`. Fails with [`Error::Duplicate`] if the
    /// value is already claimed by a different object.
    pub fn insert(&self, key: IndexKey, object_id: u32) -> Result<()> {
        match self.map.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(Error::Duplicate(format!("value already indexed to object {}", e.get()))),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(object_id);
                Ok(())
            }
        }
    }

    /// Remove the mapping for `key`, if it points at `object_id`.
    pub fn delete(&self, key: &IndexKey, object_id: u32) -> Result<()> {
        if let Some(entry) = self.map.get(key) {
            if *entry != object_id {
                return Err(Error::NotFound("index entry points at a different object".to_string()));
            }
        } else {
            return Err(Error::NotFound("value not indexed".to_string()));
        }
        self.map.remove(key);
        Ok(())
    }

    /// Look up the object-ID claiming `key`.
    pub fn lookup(&self, key: &IndexKey) -> Option<u32> {
        self.map.get(key).map(|v| *v)
    }

    /// Number of distinct values indexed.
    pub fn size(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_is_rejected() {
        let idx = UniqueIndex::new();
        idx.insert(IndexKey::Unsigned(1), 10).unwrap();
        let err = idx.insert(IndexKey::Unsigned(1), 11);
        assert!(err.is_err());
        assert_eq!(idx.lookup(&IndexKey::Unsigned(1)), Some(10));
    }

    #[test]
    fn delete_then_reinsert_succeeds() {
        let idx = UniqueIndex::new();
        idx.insert(IndexKey::Unsigned(1), 10).unwrap();
        idx.delete(&IndexKey::Unsigned(1), 10).unwrap();
        idx.insert(IndexKey::Unsigned(1), 99).unwrap();
        assert_eq!(idx.lookup(&IndexKey::Unsigned(1)), Some(99));
    }
}
