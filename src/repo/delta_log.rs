//! Delta log line wire format, shared by a repository's local append-only
//! file and the payload sent to the mirroring daemon:
//!
//! ```text
//! @[rN.]cC.oO.mM=ENCODED_VALUE\n
//! ```

use crate::constants::DELTA_ESCAPE_BYTE;
use crate::core::{Error, Result};

/// One parsed delta line.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaLine {
    /// Repository ID, if this line carries a per-repository delta.
    pub repo_id: Option<u16>,
    /// Class ID.
    pub class_id: u16,
    /// Object ID.
    pub object_id: u32,
    /// Member ID.
    pub member_id: u16,
    /// Escaped text encoding of the value.
    pub encoded_value: String,
}

/// Escape `0x01`, `\r` and `\n` so the line can be stored newline-delimited.
/// Operates on raw UTF-8 bytes: a multi-byte character is copied through
/// untouched since none of its continuation bytes can collide with the
/// single-byte escape markers below 0x80.
pub fn escape(text: &str) -> String {
    let mut out = Vec::with_capacity(text.len());
    for b in text.as_bytes() {
        match *b {
            DELTA_ESCAPE_BYTE => {
                out.push(DELTA_ESCAPE_BYTE);
                out.push(DELTA_ESCAPE_BYTE);
            }
            b'\r' => {
                out.push(DELTA_ESCAPE_BYTE);
                out.push(b'r');
            }
            b'\n' => {
                out.push(DELTA_ESCAPE_BYTE);
                out.push(b'n');
            }
            other => out.push(other),
        }
    }
    // Safe: every byte is either copied verbatim from valid UTF-8 or is one
    // of the ASCII escape markers/letters introduced above.
    String::from_utf8(out).expect("escape preserves UTF-8 validity")
}

/// Reverse [`escape`].
pub fn unescape(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == DELTA_ESCAPE_BYTE && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'r' => out.push(b'\r'),
                b'n' => out.push(b'\n'),
                esc if esc == DELTA_ESCAPE_BYTE => out.push(DELTA_ESCAPE_BYTE),
                other => out.push(other),
            }
            i += 2;
        } else {
            out.push(b);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|e| Error::Corrupt(format!("delta value is not valid UTF-8 after unescape: {e}")))
}

/// Member ID reserved for a tombstone marker line. Real member IDs are
/// always >= 1 ([`crate::constants::MEMBER_ID_SYSTEM`] starts at 1), so this
/// value can never collide with an actual member's delta.
pub const DELETE_MARKER_MEMBER_ID: u16 = 0;

/// Render a delta line for (optionally repository-scoped) member `value`.
pub fn encode_line(repo_id: Option<u16>, class_id: u16, object_id: u32, member_id: u16, value: &str) -> String {
    let mut line = String::from("@");
    if let Some(r) = repo_id {
        line.push_str(&format!("r{r}."));
    }
    line.push_str(&format!("c{class_id}.o{object_id}.m{member_id}={}", escape(value)));
    line
}

/// Render a tombstone marker line for `object_id`: a delta line addressed
/// to [`DELETE_MARKER_MEMBER_ID`] rather than any real member.
pub fn encode_delete_line(repo_id: Option<u16>, class_id: u16, object_id: u32) -> String {
    encode_line(repo_id, class_id, object_id, DELETE_MARKER_MEMBER_ID, "1")
}

/// Parse a line produced by [`encode_line`].
pub fn parse_line(line: &str) -> Result<DeltaLine> {
    let rest = line.strip_prefix('@').ok_or_else(|| Error::Corrupt(format!("delta line missing '@': {line}")))?;

    let (repo_id, rest) = if let Some(stripped) = rest.strip_prefix('r') {
        let dot = stripped.find('.').ok_or_else(|| Error::Corrupt(format!("malformed repo-scoped delta line: {line}")))?;
        let id: u16 = stripped[..dot].parse().map_err(|_| Error::Corrupt(format!("bad repository id in delta line: {line}")))?;
        (Some(id), &stripped[dot + 1..])
    } else {
        (None, rest)
    };

    let rest = rest.strip_prefix('c').ok_or_else(|| Error::Corrupt(format!("delta line missing class field: {line}")))?;
    let c_dot = rest.find('.').ok_or_else(|| Error::Corrupt(format!("malformed delta line: {line}")))?;
    let class_id: u16 = rest[..c_dot].parse().map_err(|_| Error::Corrupt(format!("bad class id in delta line: {line}")))?;

    let rest = &rest[c_dot + 1..];
    let rest = rest.strip_prefix('o').ok_or_else(|| Error::Corrupt(format!("delta line missing object field: {line}")))?;
    let o_dot = rest.find('.').ok_or_else(|| Error::Corrupt(format!("malformed delta line: {line}")))?;
    let object_id: u32 = rest[..o_dot].parse().map_err(|_| Error::Corrupt(format!("bad object id in delta line: {line}")))?;

    let rest = &rest[o_dot + 1..];
    let rest = rest.strip_prefix('m').ok_or_else(|| Error::Corrupt(format!("delta line missing member field: {line}")))?;
    let eq = rest.find('=').ok_or_else(|| Error::Corrupt(format!("malformed delta line: {line}")))?;
    let member_id: u16 = rest[..eq].parse().map_err(|_| Error::Corrupt(format!("bad member id in delta line: {line}")))?;

    let encoded_value = unescape(&rest[eq + 1..])?;

    Ok(DeltaLine {
        repo_id,
        class_id,
        object_id,
        member_id,
        encoded_value,
    })
}
