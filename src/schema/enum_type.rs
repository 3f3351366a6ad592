//! Enumerations: ordered lists of display strings with numeric codes.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// One item of an [`EnumType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumItem {
    /// Display string.
    pub label: String,
    /// Numeric code: either the default ordinal or an application-supplied value.
    pub code: u32,
}

/// Ordered list of display strings, each with a numeric code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumType {
    /// Enum name, unique among the ADP's registered types.
    pub name: String,
    items: Vec<EnumItem>,
    max_len: usize,
}

impl EnumType {
    /// Begin an empty enumeration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            max_len: 0,
        }
    }

    /// Append an item with a default ordinal code (its position).
    pub fn add_item(&mut self, label: impl Into<String>) {
        let label = label.into();
        self.max_len = self.max_len.max(label.len());
        let code = self.items.len() as u32;
        self.items.push(EnumItem { label, code });
    }

    /// Append an item with an application-supplied code.
    pub fn add_item_with_code(&mut self, label: impl Into<String>, code: u32) -> Result<()> {
        if self.items.iter().any(|i| i.code == code) {
            return Err(Error::Duplicate(format!("enum code {code} already used in {}", self.name)));
        }
        let label = label.into();
        self.max_len = self.max_len.max(label.len());
        self.items.push(EnumItem { label, code });
        Ok(())
    }

    /// The enum's items in declaration order.
    pub fn items(&self) -> &[EnumItem] {
        &self.items
    }

    /// Longest label length, for front-end control sizing.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Look up an item by its numeric code.
    pub fn item_by_code(&self, code: u32) -> Option<&EnumItem> {
        self.items.iter().find(|i| i.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_max_label_length() {
        let mut e = EnumType::new("Color");
        e.add_item("Red");
        e.add_item("Chartreuse");
        assert_eq!(e.max_len(), "Chartreuse".len());
    }

    #[test]
    fn rejects_duplicate_code() {
        let mut e = EnumType::new("Status");
        e.add_item_with_code("Active", 1).unwrap();
        assert!(e.add_item_with_code("Inactive", 1).is_err());
    }
}
