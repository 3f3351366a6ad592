//! Compressed ordered set of 32-bit object IDs: a sorted map from
//! segment number to a 256-bit segment payload.

use crate::core::{Error, Result};
use crate::idset::arena;
use crate::idset::segment::Segment;
use std::collections::BTreeMap;
use std::sync::Arc;

fn split(id: u32) -> (u16, u16) {
    ((id / 256) as u16, (id % 256) as u16)
}

#[derive(Debug, Clone, Default, PartialEq)]
struct IdSetInner {
    segments: BTreeMap<u16, Segment>,
    slots: BTreeMap<u16, u32>,
}

impl Drop for IdSetInner {
    fn drop(&mut self) {
        for (_, slot) in self.slots.iter() {
            arena::release_slot(*slot);
        }
    }
}

/// A segmented-bitmap set of 32-bit object IDs.
///
/// Cheap to clone: clones share the inner control block until a
/// mutator runs, at which point `Arc::make_mut` copies it out
/// ("clone-on-write"). Callers must serialise mutators on a shared set
/// themselves; an `IdSet` has no internal lock.
#[derive(Debug, Clone)]
pub struct IdSet {
    inner: Arc<IdSetInner>,
}

impl Default for IdSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IdSet {
    fn eq(&self, other: &Self) -> bool {
        self.inner.segments == other.inner.segments
    }
}

impl IdSet {
    /// An empty set.
    pub fn new() -> Self {
        Self { inner: Arc::new(IdSetInner::default()) }
    }

    fn inner_mut(&mut self) -> &mut IdSetInner {
        Arc::make_mut(&mut self.inner)
    }

    fn ensure_segment(&mut self, segno: u16) -> &mut Segment {
        if !self.inner.segments.contains_key(&segno) {
            let slot = arena::allocate_slot();
            let inner = self.inner_mut();
            inner.slots.insert(segno, slot);
            inner.segments.insert(segno, Segment::empty(segno));
        }
        self.inner_mut().segments.get_mut(&segno).unwrap()
    }

    /// Insert `id`. Returns `1` if newly added, `0` if already present.
    pub fn insert(&mut self, id: u32) -> u8 {
        let (segno, oset) = split(id);
        let newly = self.ensure_segment(segno).set(oset);
        if newly {
            1
        } else {
            0
        }
    }

    /// Remove `id`. Errors if absent.
    pub fn remove(&mut self, id: u32) -> Result<()> {
        let (segno, oset) = split(id);
        let inner = self.inner_mut();
        let Some(segment) = inner.segments.get_mut(&segno) else {
            return Err(Error::NotFound(format!("id {id} not present")));
        };
        if !segment.clear(oset) {
            return Err(Error::NotFound(format!("id {id} not present")));
        }
        if segment.is_empty() {
            inner.segments.remove(&segno);
            if let Some(slot) = inner.slots.remove(&segno) {
                arena::release_slot(slot);
            }
        }
        Ok(())
    }

    /// True iff `id` is a member.
    pub fn contains(&self, id: u32) -> bool {
        let (segno, oset) = split(id);
        self.inner.segments.get(&segno).map(|s| s.is_set(oset)).unwrap_or(false)
    }

    /// Total population.
    pub fn count(&self) -> u32 {
        self.inner.segments.values().map(|s| s.count() as u32).sum()
    }

    /// Number of non-empty segments.
    pub fn segment_count(&self) -> usize {
        self.inner.segments.len()
    }

    /// The `count` ids at rank range `[start, start+count)`, ascending.
    pub fn fetch(&self, start: u32, count: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut rank = 0u32;
        'outer: for segment in self.inner.segments.values() {
            for oset in segment.set_offsets() {
                if rank >= start && ((rank - start) as u32) < count {
                    out.push(segment.segno() as u32 * 256 + oset as u32);
                }
                rank += 1;
                if out.len() as u32 == count {
                    break 'outer;
                }
            }
        }
        out
    }

    /// All members in ascending order.
    pub fn members(&self) -> Vec<u32> {
        self.fetch(0, self.count())
    }

    /// In-place union: `self |= other`.
    pub fn union_assign(&mut self, other: &IdSet) {
        let other_segments: Vec<Segment> = other.inner.segments.values().cloned().collect();
        for seg in other_segments {
            let segno = seg.segno();
            self.ensure_segment(segno).union_with(&seg);
        }
    }

    /// In-place intersection: `self &= other`. Removes any segment that
    /// becomes empty.
    pub fn intersect_assign(&mut self, other: &IdSet) {
        let inner = self.inner_mut();
        let mut to_remove = Vec::new();
        for (segno, segment) in inner.segments.iter_mut() {
            match other.inner.segments.get(segno) {
                Some(other_seg) => {
                    segment.intersect_with(other_seg);
                    if segment.is_empty() {
                        to_remove.push(*segno);
                    }
                }
                None => to_remove.push(*segno),
            }
        }
        for segno in to_remove {
            inner.segments.remove(&segno);
            if let Some(slot) = inner.slots.remove(&segno) {
                arena::release_slot(slot);
            }
        }
    }

    /// Union of `self` and `other`, leaving both unchanged.
    pub fn union(&self, other: &IdSet) -> IdSet {
        let mut out = self.clone();
        out.union_assign(other);
        out
    }

    /// Intersection of `self` and `other`, leaving both unchanged.
    pub fn intersect(&self, other: &IdSet) -> IdSet {
        let mut out = self.clone();
        out.intersect_assign(other);
        out
    }

    /// Textual export: one `export_line` per segment, ascending, newline separated.
    pub fn export(&self) -> String {
        self.inner.segments.values().map(|s| s.export_line()).collect::<Vec<_>>().join("\n")
    }

    /// Parse `export` output back into a fresh set.
    pub fn import(text: &str) -> Result<Self> {
        let mut out = IdSet::new();
        for line in text.lines().filter(|l| !l.is_empty()) {
            let segment = Segment::import_line(line)?;
            let segno = segment.segno();
            let slot = arena::allocate_slot();
            let inner = out.inner_mut();
            inner.slots.insert(segno, slot);
            inner.segments.insert(segno, segment);
        }
        Ok(out)
    }
}
