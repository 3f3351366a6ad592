//! Class members: name, type, population bounds, position.

use serde::{Deserialize, Serialize};

/// Minimum population of a member: optional (0) or required (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinPopulation {
    /// The member may be absent.
    Optional,
    /// The member must carry a value.
    Required,
}

/// Maximum population of a member: single-valued or multi-valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxPopulation {
    /// At most one value.
    One,
    /// Any number of values.
    Many,
}

/// A named, typed field of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Name, unique within the class.
    pub name: String,
    /// Name of the [`crate::schema::DataType`] this member holds.
    pub type_name: String,
    /// Minimum population.
    pub min: MinPopulation,
    /// Maximum population.
    pub max: MaxPopulation,
    /// Stable position within the class (0-based).
    pub position: u16,
    /// Stable member ID, assigned by the ADP registry on registration.
    pub member_id: Option<u16>,
}

impl Member {
    /// Build a member not yet registered (no member ID).
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, min: MinPopulation, max: MaxPopulation, position: u16) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            min,
            max,
            position,
            member_id: None,
        }
    }

    /// Structural equality: same type/name/min/max, ignoring assigned ID.
    pub fn structurally_eq(&self, other: &Member) -> bool {
        self.name == other.name && self.type_name == other.type_name && self.min == other.min && self.max == other.max
    }
}
