//! Schema and type system: data types, classes, members, enums, regex
//! types, ROMIDs, and the ADP registry that ties them together with
//! stable numeric IDs.

mod adp;
mod class;
mod data_type;
mod enum_type;
mod member;
mod regex_type;
mod romid;

pub use adp::AdpRegistry;
pub use class::{Class, ClassState, Designation};
pub use data_type::DataType;
pub use enum_type::{EnumItem, EnumType};
pub use member::{MaxPopulation, Member, MinPopulation};
pub use regex_type::RegexType;
pub use romid::Romid;
