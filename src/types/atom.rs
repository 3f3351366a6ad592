//! Tagged scalar value used at every public API boundary.

use crate::core::{Error, Result};
use crate::types::base_type::BaseType;
use crate::types::parse;
use serde::{Deserialize, Serialize};

/// The payload carried by an [`Atom`]. Exactly one variant is populated
/// at a time, matching the atom's [`BaseType`] tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AtomValue {
    /// 64-bit float.
    Float(f64),
    /// Signed integers.
    I8(i8),
    /// Signed 16-bit.
    I16(i16),
    /// Signed 32-bit.
    I32(i32),
    /// Signed 64-bit.
    I64(i64),
    /// Unsigned 8-bit.
    U8(u8),
    /// Unsigned 16-bit.
    U16(u16),
    /// Unsigned 32-bit.
    U32(u32),
    /// Unsigned 64-bit.
    U64(u64),
    /// Two-state boolean.
    Bool(bool),
    /// Three-state boolean; `None` is "unset".
    TriBool(Option<bool>),
    /// Day-count date.
    DateDay(i32),
    /// Seconds-of-day.
    TimeOfDay(u32),
    /// Wall-clock date+time, seconds resolution.
    DateTime(chrono::NaiveDateTime),
    /// Seconds-since-epoch.
    TimeEpoch(i64),
    /// IP address.
    IpAddr(std::net::IpAddr),
    /// Domain name.
    Domain(String),
    /// Email address.
    Email(String),
    /// URL.
    Url(String),
    /// Free string.
    Str(String),
    /// Indexable free text.
    Text(String),
    /// Blob ID of an opaque binary value.
    Binary(u32),
    /// Blob ID of a text-document value.
    TextDocument(u32),
    /// Application-defined regex-validated string.
    AppString(String),
    /// Selected item ordinal of an enumeration.
    EnumRef(u32),
    /// Object ID of a referenced/embedded class instance.
    ClassRef(u32),
}

/// A tagged scalar value carrying one value of any base type, or no
/// value at all ("clear").
///
/// The original class library distinguished clear/set/holds-chain/
/// holds-string-number as distinct internal states; this implementation
/// parses eagerly so only clear/set is observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    base: BaseType,
    value: Option<AtomValue>,
}

impl Atom {
    /// Create a clear atom of the given base type.
    pub fn new(base: BaseType) -> Self {
        Self { base, value: None }
    }

    /// The atom's base type.
    pub fn base(&self) -> BaseType {
        self.base
    }

    /// True iff no value has been set.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Return to the untyped-null state, keeping the base type.
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// The carried value, if set.
    pub fn value(&self) -> Option<&AtomValue> {
        self.value.as_ref()
    }

    /// Assign the raw payload word directly (no parsing, no coercion
    /// beyond the variant matching this atom's base type).
    pub fn set_value(&mut self, value: AtomValue) -> Result<()> {
        if !Self::value_matches_base(&value, self.base) {
            return Err(Error::Type(format!("value variant does not match base type {:?}", self.base)));
        }
        self.value = Some(value);
        Ok(())
    }

    fn value_matches_base(value: &AtomValue, base: BaseType) -> bool {
        matches!(
            (value, base),
            (AtomValue::Float(_), BaseType::Float)
                | (AtomValue::I8(_), BaseType::I8)
                | (AtomValue::I16(_), BaseType::I16)
                | (AtomValue::I32(_), BaseType::I32)
                | (AtomValue::I64(_), BaseType::I64)
                | (AtomValue::U8(_), BaseType::U8)
                | (AtomValue::U16(_), BaseType::U16)
                | (AtomValue::U32(_), BaseType::U32)
                | (AtomValue::U64(_), BaseType::U64)
                | (AtomValue::Bool(_), BaseType::Bool)
                | (AtomValue::TriBool(_), BaseType::TriBool)
                | (AtomValue::DateDay(_), BaseType::DateDay)
                | (AtomValue::TimeOfDay(_), BaseType::TimeOfDay)
                | (AtomValue::DateTime(_), BaseType::DateTime)
                | (AtomValue::TimeEpoch(_), BaseType::TimeEpoch)
                | (AtomValue::IpAddr(_), BaseType::IpAddr)
                | (AtomValue::Domain(_), BaseType::Domain)
                | (AtomValue::Email(_), BaseType::Email)
                | (AtomValue::Url(_), BaseType::Url)
                | (AtomValue::Str(_), BaseType::Str)
                | (AtomValue::Text(_), BaseType::Text)
                | (AtomValue::Binary(_), BaseType::Binary)
                | (AtomValue::TextDocument(_), BaseType::TextDocument)
                | (AtomValue::AppString(_), BaseType::AppString)
                | (AtomValue::EnumRef(_), BaseType::EnumRef)
                | (AtomValue::ClassRef(_), BaseType::ClassRef)
        )
    }

    /// Parse `text` according to this atom's base type.
    ///
    /// String-like types are validated against their syntax (domain,
    /// email, url); numeric types accept decimal or `0x`-hex; booleans
    /// accept `{true,yes,y,1}`/`{false,no,n,0}`.
    pub fn set_value_text(&mut self, text: &str) -> Result<()> {
        let value = match self.base {
            BaseType::Float => AtomValue::Float(parse::parse_float(text)?),
            BaseType::I8 => AtomValue::I8(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::I16 => AtomValue::I16(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::I32 => AtomValue::I32(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::I64 => AtomValue::I64(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::U8 => AtomValue::U8(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::U16 => AtomValue::U16(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::U32 => AtomValue::U32(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::U64 => AtomValue::U64(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::Bool => AtomValue::Bool(parse::parse_bool(text)?),
            BaseType::TriBool => AtomValue::TriBool(parse::parse_tribool(text)?),
            BaseType::DateDay => AtomValue::DateDay(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::TimeOfDay => AtomValue::TimeOfDay(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::DateTime => AtomValue::DateTime(
                chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                    .map_err(|_| Error::BadValue(format!("not a datetime: {text}")))?,
            ),
            BaseType::TimeEpoch => AtomValue::TimeEpoch(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::IpAddr => AtomValue::IpAddr(text.parse().map_err(|_| Error::BadValue(format!("not an ip address: {text}")))?),
            BaseType::Domain => {
                parse::validate_domain(text)?;
                AtomValue::Domain(text.to_string())
            }
            BaseType::Email => {
                parse::validate_email(text)?;
                AtomValue::Email(text.to_string())
            }
            BaseType::Url => {
                parse::validate_url(text)?;
                AtomValue::Url(text.to_string())
            }
            BaseType::Str => AtomValue::Str(text.to_string()),
            BaseType::Text => AtomValue::Text(text.to_string()),
            BaseType::AppString => AtomValue::AppString(text.to_string()),
            BaseType::Binary | BaseType::TextDocument => {
                return Err(Error::Type("blob members must be set via set_value_blob".to_string()));
            }
            BaseType::EnumRef => AtomValue::EnumRef(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
            BaseType::ClassRef => AtomValue::ClassRef(parse::parse_int(text)?.try_into().map_err(|_| Error::BadValue(text.to_string()))?),
        };
        self.value = Some(value);
        Ok(())
    }

    /// Set a blob-backed value (`binary` or `text-document`) to the given
    /// blob ID.
    pub fn set_value_blob(&mut self, blob_id: u32) -> Result<()> {
        let value = match self.base {
            BaseType::Binary => AtomValue::Binary(blob_id),
            BaseType::TextDocument => AtomValue::TextDocument(blob_id),
            _ => return Err(Error::Type("set_value_blob called on a non-blob member".to_string())),
        };
        self.value = Some(value);
        Ok(())
    }

    /// Parse `text` as a number, inferring the smallest signed/unsigned
    /// base that holds it (preferring unsigned for non-negative values).
    pub fn set_number(&mut self, text: &str) -> Result<()> {
        if let Ok(f) = parse::parse_float(text) {
            if text.contains('.') {
                self.base = BaseType::Float;
                self.value = Some(AtomValue::Float(f));
                return Ok(());
            }
        }
        let n = parse::parse_int(text)?;
        if n >= 0 {
            if let Ok(v) = u8::try_from(n) {
                self.base = BaseType::U8;
                self.value = Some(AtomValue::U8(v));
            } else if let Ok(v) = u16::try_from(n) {
                self.base = BaseType::U16;
                self.value = Some(AtomValue::U16(v));
            } else if let Ok(v) = u32::try_from(n) {
                self.base = BaseType::U32;
                self.value = Some(AtomValue::U32(v));
            } else {
                let v = u64::try_from(n).map_err(|_| Error::BadValue(text.to_string()))?;
                self.base = BaseType::U64;
                self.value = Some(AtomValue::U64(v));
            }
        } else if let Ok(v) = i8::try_from(n) {
            self.base = BaseType::I8;
            self.value = Some(AtomValue::I8(v));
        } else if let Ok(v) = i16::try_from(n) {
            self.base = BaseType::I16;
            self.value = Some(AtomValue::I16(v));
        } else if let Ok(v) = i32::try_from(n) {
            self.base = BaseType::I32;
            self.value = Some(AtomValue::I32(v));
        } else {
            let v = i64::try_from(n).map_err(|_| Error::BadValue(text.to_string()))?;
            self.base = BaseType::I64;
            self.value = Some(AtomValue::I64(v));
        }
        Ok(())
    }

    /// Render the textual form appropriate to the carried base type.
    pub fn str(&self) -> String {
        match &self.value {
            None => String::new(),
            Some(v) => match v {
                AtomValue::Float(x) => x.to_string(),
                AtomValue::I8(x) => x.to_string(),
                AtomValue::I16(x) => x.to_string(),
                AtomValue::I32(x) => x.to_string(),
                AtomValue::I64(x) => x.to_string(),
                AtomValue::U8(x) => x.to_string(),
                AtomValue::U16(x) => x.to_string(),
                AtomValue::U32(x) => x.to_string(),
                AtomValue::U64(x) => x.to_string(),
                AtomValue::Bool(x) => x.to_string(),
                AtomValue::TriBool(x) => match x {
                    Some(true) => "true".to_string(),
                    Some(false) => "false".to_string(),
                    None => "unset".to_string(),
                },
                AtomValue::DateDay(x) => x.to_string(),
                AtomValue::TimeOfDay(x) => x.to_string(),
                AtomValue::DateTime(x) => x.format("%Y-%m-%d %H:%M:%S").to_string(),
                AtomValue::TimeEpoch(x) => x.to_string(),
                AtomValue::IpAddr(x) => x.to_string(),
                AtomValue::Domain(x) | AtomValue::Email(x) | AtomValue::Url(x) | AtomValue::Str(x) | AtomValue::Text(x) | AtomValue::AppString(x) => x.clone(),
                AtomValue::Binary(x) | AtomValue::TextDocument(x) | AtomValue::EnumRef(x) | AtomValue::ClassRef(x) => x.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_atom_is_null() {
        let atom = Atom::new(BaseType::U16);
        assert!(atom.is_null());
        assert_eq!(atom.str(), "");
    }

    #[test]
    fn parses_uint_text() {
        let mut atom = Atom::new(BaseType::U16);
        atom.set_value_text("36").unwrap();
        assert_eq!(atom.value(), Some(&AtomValue::U16(36)));
        assert_eq!(atom.str(), "36");
    }

    #[test]
    fn parses_hex_text() {
        let mut atom = Atom::new(BaseType::U32);
        atom.set_value_text("0xFF").unwrap();
        assert_eq!(atom.value(), Some(&AtomValue::U32(255)));
    }

    #[test]
    fn rejects_bad_email() {
        let mut atom = Atom::new(BaseType::Email);
        assert!(atom.set_value_text("not-an-email").is_err());
        assert!(atom.is_null());
    }

    #[test]
    fn set_number_infers_smallest_base() {
        let mut atom = Atom::new(BaseType::U8);
        atom.set_number("300").unwrap();
        assert_eq!(atom.base(), BaseType::U16);
        atom.set_number("-5").unwrap();
        assert_eq!(atom.base(), BaseType::I8);
    }

    #[test]
    fn blob_value_rejects_text_set() {
        let mut atom = Atom::new(BaseType::Binary);
        assert!(atom.set_value_text("abc").is_err());
        atom.set_value_blob(7).unwrap();
        assert_eq!(atom.value(), Some(&AtomValue::Binary(7)));
    }
}
