//! Classes: named, ordered lists of members with a lifecycle.

use crate::core::{Error, Result};
use crate::schema::member::Member;
use serde::{Deserialize, Serialize};

/// Which ID partition a class (and its members) draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Designation {
    /// System-defined class (IDs 1-20).
    System,
    /// Application/user-defined class (IDs 21-50).
    User,
    /// Configuration class (IDs 51-1000).
    Config,
}

/// A class's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassState {
    /// Not yet initialized to a name/designation.
    NotInit,
    /// Members may be added.
    UnderConstruction,
    /// Order and composition are fixed.
    Frozen,
}

/// Named, ordered list of members describing a record shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    /// Class name, unique within an ADP registry.
    pub name: String,
    /// ID partition this class belongs to.
    pub designation: Designation,
    state: ClassState,
    members: Vec<Member>,
    /// Stable class ID, assigned by the ADP registry on registration.
    pub class_id: Option<u16>,
}

impl Class {
    /// Begin constructing a new class under the given designation.
    pub fn new(name: impl Into<String>, designation: Designation) -> Self {
        Self {
            name: name.into(),
            designation,
            state: ClassState::UnderConstruction,
            members: Vec::new(),
            class_id: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClassState {
        self.state
    }

    /// The class's members in position order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a member by name.
    pub fn member_by_name(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Look up a member by its assigned member ID.
    pub fn member_by_id(&self, member_id: u16) -> Option<&Member> {
        self.members.iter().find(|m| m.member_id == Some(member_id))
    }

    /// Add a member. Only legal while under construction; rejects a
    /// duplicate member name.
    pub fn add_member(&mut self, member: Member) -> Result<()> {
        if self.state != ClassState::UnderConstruction {
            return Err(Error::Sequence(format!("class {} is not under construction", self.name)));
        }
        if self.members.iter().any(|m| m.name == member.name) {
            return Err(Error::Duplicate(format!("member {} already exists on class {}", member.name, self.name)));
        }
        self.members.push(member);
        Ok(())
    }

    /// Freeze the class: no further member changes permitted.
    pub fn freeze(&mut self) -> Result<()> {
        if self.state != ClassState::UnderConstruction {
            return Err(Error::Sequence(format!("class {} cannot be frozen from its current state", self.name)));
        }
        self.state = ClassState::Frozen;
        Ok(())
    }

    /// True once the class is frozen.
    pub fn is_frozen(&self) -> bool {
        self.state == ClassState::Frozen
    }

    /// Structural equality: same member count, same type/name/min/max at
    /// every position.
    pub fn structurally_eq(&self, other: &Class) -> bool {
        self.members.len() == other.members.len()
            && self.members.iter().zip(other.members.iter()).all(|(a, b)| a.structurally_eq(b))
    }

    /// Append a member without checking lifecycle state. Used only when
    /// rebuilding a class to stamp member IDs after registration.
    pub(crate) fn add_member_unchecked(&mut self, member: Member) {
        self.members.push(member);
    }

    /// Mark frozen without checking lifecycle state. Used only when
    /// rebuilding a class after registration.
    pub(crate) fn freeze_unchecked(&mut self) {
        self.state = ClassState::Frozen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::member::{MaxPopulation, MinPopulation};

    #[test]
    fn members_only_addable_under_construction() {
        let mut class = Class::new("Person", Designation::User);
        class
            .add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0))
            .unwrap();
        class.freeze().unwrap();
        let err = class.add_member(Member::new("age", "u16", MinPopulation::Optional, MaxPopulation::One, 1));
        assert!(err.is_err());
    }

    #[test]
    fn rejects_duplicate_member_name() {
        let mut class = Class::new("Person", Designation::User);
        class
            .add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0))
            .unwrap();
        let err = class.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 1));
        assert!(err.is_err());
    }

    #[test]
    fn structural_equality_ignores_class_id() {
        let mut a = Class::new("Person", Designation::User);
        a.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
        let mut b = Class::new("PersonAlias", Designation::User);
        b.add_member(Member::new("name", "string", MinPopulation::Required, MaxPopulation::One, 0)).unwrap();
        b.class_id = Some(99);
        assert!(a.structurally_eq(&b));
    }
}
