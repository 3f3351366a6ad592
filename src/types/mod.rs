//! Base types and the tagged scalar [`Atom`] value.

mod atom;
mod base_type;
/// Text parsing helpers for [`Atom::set_value_text`].
pub mod parse;

pub use atom::{Atom, AtomValue};
pub use base_type::BaseType;
