//! Categorical value -> Id-Set index, for enum-typed and other
//! low-cardinality members.

use crate::core::Result;
use crate::idset::IdSet;
use crate::index::key::IndexKey;
use dashmap::DashMap;

/// Maps each distinct value of a low-cardinality member to the set of
/// objects that carry it.
#[derive(Default)]
pub struct EnumIndex {
    map: DashMap<IndexKey, IdSet>,
}

impl EnumIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `object_id` to the set for `key`.
    pub fn insert(&self, key: IndexKey, object_id: u32) {
        self.map.entry(key).or_insert_with(IdSet::new).insert(object_id);
    }

    /// Remove `object_id` from the set for `key`, dropping the entry if
    /// it becomes empty.
    pub fn delete(&self, key: &IndexKey, object_id: u32) -> Result<()> {
        let emptied = {
            let mut entry = match self.map.get_mut(key) {
                Some(e) => e,
                None => return Ok(()),
            };
            entry.remove(object_id).ok();
            entry.count() == 0
        };
        if emptied {
            self.map.remove(key);
        }
        Ok(())
    }

    /// The set of objects carrying `key`, if any.
    pub fn lookup(&self, key: &IndexKey) -> Option<IdSet> {
        self.map.get(key).map(|v| v.clone())
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
    fn groups_multiple_objects_under_one_value() {
        let idx = EnumIndex::new();
        idx.insert(IndexKey::EnumRef(1), 10);
        idx.insert(IndexKey::EnumRef(1), 11);
        let set = idx.lookup(&IndexKey::EnumRef(1)).unwrap();
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn delete_clears_entry_when_set_is_empty() {
        let idx = EnumIndex::new();
        idx.insert(IndexKey::EnumRef(1), 10);
        idx.delete(&IndexKey::EnumRef(1), 10).unwrap();
        assert!(idx.lookup(&IndexKey::EnumRef(1)).is_none());
        assert_eq!(idx.size(), 0);
    }
}
