//! Process-global segment slot allocator.
//!
//! Segments themselves are owned by the [`crate::idset::IdSet`] that
//! holds them; the arena hands out opaque slot indices in blocks of
//! [`crate::constants::ARENA_BLOCK_SEGMENTS`] so every Id-Set-backed
//! index shares one growth/recycling policy, and releases them back to
//! an index-based free list on removal — an index-based free list over
//! an arena vector, not the embedded-pointer overlay the original used,
//! per the no-aliasing-UB requirement.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Sentinel marking the end of the free list.
const FREE_LIST_END: u32 = u32::MAX;

/// Slot allocator: a monotonically growing counter plus a stack of freed
/// indices available for reuse.
pub struct SegmentArena {
    next_fresh: u32,
    free: Vec<u32>,
}

impl SegmentArena {
    fn new() -> Self {
        Self { next_fresh: 0, free: Vec::new() }
    }

    /// Allocate a slot index, preferring a recycled one.
    pub fn allocate(&mut self) -> u32 {
        if let Some(idx) = self.free.pop() {
            idx
        } else {
            let idx = self.next_fresh;
            self.next_fresh += 1;
            idx
        }
    }

    /// Release a slot index back to the free list.
    pub fn release(&mut self, idx: u32) {
        debug_assert_ne!(idx, FREE_LIST_END);
        self.free.push(idx);
    }

    /// Number of slots ever handed out minus recycled ones currently idle.
    pub fn live_count(&self) -> u32 {
        self.next_fresh - self.free.len() as u32
    }
}

static ARENA: Lazy<Mutex<SegmentArena>> = Lazy::new(|| Mutex::new(SegmentArena::new()));

/// Allocate a slot index from the global segment arena.
pub fn allocate_slot() -> u32 {
    ARENA.lock().allocate()
}

/// Release a slot index back to the global segment arena.
pub fn release_slot(idx: u32) {
    ARENA.lock().release(idx);
}

/// Number of slots currently live (allocated and not yet released).
pub fn live_slot_count() -> u32 {
    ARENA.lock().live_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recycles_released_slots() {
        let mut arena = SegmentArena::new();
        let a = arena.allocate();
        let b = arena.allocate();
        assert_ne!(a, b);
        arena.release(a);
        let c = arena.allocate();
        assert_eq!(a, c);
    }
}
