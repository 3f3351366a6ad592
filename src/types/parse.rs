//! Text parsing rules shared by [`crate::types::Atom::set_value_text`].
//!
//! Numeric parsing accepts decimal or a `0x`/`0X`-prefixed hex literal;
//! boolean parsing is case-insensitive over `{true,yes,y,1}` /
//! `{false,no,n,0}`. Both rules come from how the original class library's
//! `hzAtom`/`hdbClass` parse incoming text.

use crate::core::{Error, Result};

/// Parse a signed or unsigned integer literal, decimal or `0x`-prefixed hex.
pub fn parse_int(text: &str) -> Result<i128> {
    let text = text.trim();
    let (neg, rest) = match text.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, text),
    };

    let value = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).map_err(|_| Error::BadValue(format!("not a hex integer: {text}")))?
    } else {
        rest.parse::<i128>()
            .map_err(|_| Error::BadValue(format!("not a decimal integer: {text}")))?
    };

    Ok(if neg { -value } else { value })
}

/// Parse a floating-point literal.
pub fn parse_float(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::BadValue(format!("not a float: {text}")))
}

/// Parse a two-state boolean, case-insensitively.
pub fn parse_bool(text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(Error::BadValue(format!("not a boolean: {text}"))),
    }
}

/// Parse a tri-state boolean: `unset`/empty maps to `None`.
pub fn parse_tribool(text: &str) -> Result<Option<bool>> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unset") {
        return Ok(None);
    }
    parse_bool(trimmed).map(Some)
}

/// Validate a domain name: at least one dot, only label characters.
pub fn validate_domain(text: &str) -> Result<()> {
    let labels: Vec<&str> = text.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty() || !l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')) {
        return Err(Error::BadValue(format!("not a domain: {text}")));
    }
    Ok(())
}

/// Validate an email address: exactly one `@`, non-empty local part, a
/// valid domain after it.
pub fn validate_email(text: &str) -> Result<()> {
    let mut parts = text.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().ok_or_else(|| Error::BadValue(format!("not an email: {text}")))?;
    if local.is_empty() {
        return Err(Error::BadValue(format!("not an email: {text}")));
    }
    validate_domain(domain)
}

/// Validate a URL: a recognised scheme followed by `://`.
pub fn validate_url(text: &str) -> Result<()> {
    if let Some((scheme, rest)) = text.split_once("://") {
        if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric()) && !rest.is_empty() {
            return Ok(());
        }
    }
    Err(Error::BadValue(format!("not a url: {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_int("42").unwrap(), 42);
        assert_eq!(parse_int("-42").unwrap(), -42);
        assert_eq!(parse_int("0x2A").unwrap(), 42);
        assert_eq!(parse_int("0X2a").unwrap(), 42);
    }

    #[test]
    fn rejects_garbage_int() {
        assert!(parse_int("abc").is_err());
    }

    #[test]
    fn parses_bool_variants() {
        for s in ["true", "YES", "y", "1"] {
            assert!(parse_bool(s).unwrap());
        }
        for s in ["false", "NO", "n", "0"] {
            assert!(!parse_bool(s).unwrap());
        }
    }

    #[test]
    fn tribool_unset() {
        assert_eq!(parse_tribool("").unwrap(), None);
        assert_eq!(parse_tribool("unset").unwrap(), None);
        assert_eq!(parse_tribool("true").unwrap(), Some(true));
    }

    #[test]
    fn validates_email_and_domain() {
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("a-b.c").is_err());
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("localhost").is_err());
    }

    #[test]
    fn validates_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("not-a-url").is_err());
    }
}
