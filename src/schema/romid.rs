//! ROMID — the (classID, objectID, memberID) triple that keys every
//! value inside an [`crate::container::ObjectContainer`].

use serde::{Deserialize, Serialize};

/// Real-object-member identifier. Total order is class, then object,
/// then member — matching field declaration order so the derived `Ord`
/// is correct without a manual impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Romid {
    /// Class ID of the (possibly embedded) record this value belongs to.
    pub class_id: u16,
    /// Object ID within that class's repository.
    pub object_id: u32,
    /// Member ID within the class.
    pub member_id: u16,
}

impl Romid {
    /// Build a new ROMID.
    pub fn new(class_id: u16, object_id: u32, member_id: u16) -> Self {
        Self {
            class_id,
            object_id,
            member_id,
        }
    }

    /// The lowest ROMID for a given class ID (member 0, object 0) — the
    /// start of the half-open range `[classId:0:0, classId+1:0:0)` used
    /// by `list_subs`.
    pub fn range_start(class_id: u16) -> Self {
        Self::new(class_id, 0, 0)
    }

    /// The exclusive end of that same range.
    pub fn range_end(class_id: u16) -> Self {
        Self::new(class_id + 1, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_class_then_object_then_member() {
        let a = Romid::new(1, 1, 5);
        let b = Romid::new(1, 2, 0);
        let c = Romid::new(2, 0, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn range_covers_only_its_class() {
        let start = Romid::range_start(3);
        let end = Romid::range_end(3);
        assert!(Romid::new(3, 1, 0) >= start && Romid::new(3, 1, 0) < end);
        assert!(Romid::new(4, 0, 0) >= end);
    }
}
