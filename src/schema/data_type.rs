//! The sum-typed "what am I" for a concrete data type: built-in,
//! application-defined regex string, enum reference, or class reference.
//!
//! The original class library used a base "data type" class with sibling
//! subclasses per kind and virtual dispatch; here the kinds are a tagged
//! union and the ADP's "what am I" query is a `match`, not a virtual call.

use crate::types::base_type::BaseType;

/// A concrete, named data type.
#[derive(Debug, Clone)]
pub enum DataType {
    /// A built-in primitive (every [`BaseType`] except `AppString`,
    /// `EnumRef`, `ClassRef`).
    Builtin {
        /// Globally unique type name.
        name: String,
        /// Primitive category.
        base: BaseType,
    },
    /// Application-defined, regex-validated string.
    AppString {
        /// Globally unique type name.
        name: String,
        /// Name of the registered [`crate::schema::RegexType`].
        regex_name: String,
    },
    /// Reference to an enumeration's selected item.
    EnumRef {
        /// Globally unique type name.
        name: String,
        /// Name of the registered [`crate::schema::EnumType`].
        enum_name: String,
    },
    /// Reference to another class, embedded or by object-ID.
    ClassRef {
        /// Globally unique type name.
        name: String,
        /// Name of the registered [`crate::schema::Class`].
        class_name: String,
    },
}

impl DataType {
    /// The type's globally unique name.
    pub fn name(&self) -> &str {
        match self {
            DataType::Builtin { name, .. } => name,
            DataType::AppString { name, .. } => name,
            DataType::EnumRef { name, .. } => name,
            DataType::ClassRef { name, .. } => name,
        }
    }

    /// The type's base-type tag.
    pub fn base(&self) -> BaseType {
        match self {
            DataType::Builtin { base, .. } => *base,
            DataType::AppString { .. } => BaseType::AppString,
            DataType::EnumRef { .. } => BaseType::EnumRef,
            DataType::ClassRef { .. } => BaseType::ClassRef,
        }
    }
}
