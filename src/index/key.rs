//! Hashable, orderable key wrapper for every base type an index can hold.

use crate::strings::StringTable;
use crate::types::AtomValue;
use std::net::IpAddr;

/// A value reduced to a hashable, orderable key, as stored by the
/// unique-key and enum indexes. String-like values are stored by their
/// interned number, never by their text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Bit pattern of a float, for hashing/ordering purposes.
    FloatBits(u64),
    /// Any signed integer, widened to 64 bits.
    Signed(i64),
    /// Any unsigned integer, widened to 64 bits.
    Unsigned(u64),
    /// Boolean.
    Bool(bool),
    /// Tri-state boolean.
    TriBool(Option<bool>),
    /// IP address.
    IpAddr(IpAddr),
    /// Interned string number (covers domain/email/url/string/text/app-string).
    StringId(u32),
    /// Enum item code.
    EnumRef(u32),
}

/// Reduce an atom value to its index key, interning string-like values
/// into `table` as a side effect.
pub fn key_for(value: &AtomValue, table: &StringTable) -> IndexKey {
    match value {
        AtomValue::Float(f) => IndexKey::FloatBits(f.to_bits()),
        AtomValue::I8(v) => IndexKey::Signed(*v as i64),
        AtomValue::I16(v) => IndexKey::Signed(*v as i64),
        AtomValue::I32(v) => IndexKey::Signed(*v as i64),
        AtomValue::I64(v) => IndexKey::Signed(*v),
        AtomValue::U8(v) => IndexKey::Unsigned(*v as u64),
        AtomValue::U16(v) => IndexKey::Unsigned(*v as u64),
        AtomValue::U32(v) => IndexKey::Unsigned(*v as u64),
        AtomValue::U64(v) => IndexKey::Unsigned(*v),
        AtomValue::Bool(v) => IndexKey::Bool(*v),
        AtomValue::TriBool(v) => IndexKey::TriBool(*v),
        AtomValue::DateDay(v) => IndexKey::Signed(*v as i64),
        AtomValue::TimeOfDay(v) => IndexKey::Unsigned(*v as u64),
        AtomValue::DateTime(v) => IndexKey::Signed(v.and_utc().timestamp()),
        AtomValue::TimeEpoch(v) => IndexKey::Signed(*v),
        AtomValue::IpAddr(v) => IndexKey::IpAddr(*v),
        AtomValue::Domain(s) | AtomValue::Email(s) | AtomValue::Url(s) | AtomValue::Str(s) | AtomValue::Text(s) | AtomValue::AppString(s) => {
            IndexKey::StringId(table.intern(s))
        }
        AtomValue::Binary(v) | AtomValue::TextDocument(v) | AtomValue::ClassRef(v) => IndexKey::Unsigned(*v as u64),
        AtomValue::EnumRef(v) => IndexKey::EnumRef(*v),
    }
}
