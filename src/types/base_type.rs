//! The closed enumeration of primitive value categories.

use serde::{Deserialize, Serialize};

/// A primitive value category. Every [`crate::schema::DataType`] carries
/// exactly one of these as its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    /// 64-bit floating point.
    Float,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// Two-state boolean.
    Bool,
    /// Three-state boolean (true/false/unset).
    TriBool,
    /// Day-count date (no time-of-day component).
    DateDay,
    /// Seconds-of-day time.
    TimeOfDay,
    /// Wall-clock date+time with seconds resolution.
    DateTime,
    /// Seconds-since-epoch timestamp.
    TimeEpoch,
    /// IPv4 or IPv6 address.
    IpAddr,
    /// Domain name.
    Domain,
    /// Email address.
    Email,
    /// URL.
    Url,
    /// Free string, not indexed for search.
    Str,
    /// Indexable free text (tokenized into a text index).
    Text,
    /// Opaque binary blob, stored in a blob repository.
    Binary,
    /// Text document blob with extractable words.
    TextDocument,
    /// Application-defined, regex-validated string.
    AppString,
    /// Reference to an enumeration's selected item.
    EnumRef,
    /// Reference to another class (embedded sub-record or foreign key).
    ClassRef,
}

impl BaseType {
    /// True if values of this type fit in 32 bits or fewer and can be
    /// stored inline in an Object Container's code word.
    pub fn is_inline32(self) -> bool {
        matches!(
            self,
            BaseType::I8
                | BaseType::I16
                | BaseType::I32
                | BaseType::U8
                | BaseType::U16
                | BaseType::U32
                | BaseType::Bool
                | BaseType::TriBool
                | BaseType::DateDay
                | BaseType::TimeOfDay
                | BaseType::EnumRef
        )
    }

    /// True if values of this type require the 64-bit "large value" side
    /// array (64-bit primitives, wall-clock dates, blob/class references
    /// which are stored as a 32-bit ID but may be widened later).
    pub fn is_large(self) -> bool {
        matches!(
            self,
            BaseType::Float | BaseType::I64 | BaseType::U64 | BaseType::DateTime | BaseType::TimeEpoch
        )
    }

    /// True if values of this type are owned strings stored in the
    /// container's string side array.
    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            BaseType::IpAddr
                | BaseType::Domain
                | BaseType::Email
                | BaseType::Url
                | BaseType::Str
                | BaseType::Text
                | BaseType::AppString
        )
    }

    /// True if values of this type are stored out-of-line in a blob
    /// repository and referenced by a 32-bit blob ID.
    pub fn is_blob(self) -> bool {
        matches!(self, BaseType::Binary | BaseType::TextDocument)
    }
}
