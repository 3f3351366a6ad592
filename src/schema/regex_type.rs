//! Application-defined, regex-validated string types.

use crate::core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A base type whose value is any string matching a stored pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexType {
    /// Type name, unique among the ADP's registered types.
    pub name: String,
    /// The regular expression source.
    pub pattern: String,
}

impl RegexType {
    /// Build a regex type, compiling the pattern once to reject it early.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        Regex::new(&pattern).map_err(|e| Error::Config(format!("invalid regex pattern: {e}")))?;
        Ok(Self { name: name.into(), pattern })
    }

    /// Validate `text` matches the stored pattern in full.
    pub fn validate(&self, text: &str) -> Result<()> {
        let re = Regex::new(&self.pattern).map_err(|e| Error::Config(format!("invalid regex pattern: {e}")))?;
        if re.is_match(text) {
            Ok(())
        } else {
            Err(Error::BadValue(format!("{text:?} does not match {}", self.name)))
        }
    }
}
