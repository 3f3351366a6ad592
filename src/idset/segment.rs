//! A single 256-bit membership segment.

use crate::constants::SEGMENT_BYTES;
use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Membership bitmap for the 256 object IDs `segno*256 .. segno*256+255`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    data: [u8; SEGMENT_BYTES],
    count: u16,
    segno: u16,
}

impl Segment {
    /// A freshly allocated, empty segment for the given segment number.
    pub fn empty(segno: u16) -> Self {
        Self {
            data: [0u8; SEGMENT_BYTES],
            count: 0,
            segno,
        }
    }

    /// The segment number.
    pub fn segno(&self) -> u16 {
        self.segno
    }

    /// Population count.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// True iff no bits are set.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Test membership of the bit at byte offset `oset` (0..256).
    pub fn is_set(&self, oset: u16) -> bool {
        let (byte, bit) = (oset / 8, oset % 8);
        self.data[byte as usize] & (1 << bit) != 0
    }

    /// Set the bit at `oset`. Returns `true` if it was newly set.
    pub fn set(&mut self, oset: u16) -> bool {
        let (byte, bit) = (oset / 8, oset % 8);
        let mask = 1u8 << bit;
        if self.data[byte as usize] & mask != 0 {
            false
        } else {
            self.data[byte as usize] |= mask;
            self.count += 1;
            true
        }
    }

    /// Clear the bit at `oset`. Returns `true` if it was previously set.
    pub fn clear(&mut self, oset: u16) -> bool {
        let (byte, bit) = (oset / 8, oset % 8);
        let mask = 1u8 << bit;
        if self.data[byte as usize] & mask == 0 {
            false
        } else {
            self.data[byte as usize] &= !mask;
            self.count -= 1;
            true
        }
    }

    /// In-place union with another segment of the same segment number.
    pub fn union_with(&mut self, other: &Segment) {
        debug_assert_eq!(self.segno, other.segno);
        for i in 0..SEGMENT_BYTES {
            self.data[i] |= other.data[i];
        }
        self.recount();
    }

    /// In-place intersection with another segment of the same segment number.
    pub fn intersect_with(&mut self, other: &Segment) {
        debug_assert_eq!(self.segno, other.segno);
        for i in 0..SEGMENT_BYTES {
            self.data[i] &= other.data[i];
        }
        self.recount();
    }

    fn recount(&mut self) {
        self.count = self.data.iter().map(|b| b.count_ones() as u16).sum();
    }

    /// Ascending offsets of the set bits.
    pub fn set_offsets(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.count as usize);
        for byte in 0..SEGMENT_BYTES {
            let b = self.data[byte];
            if b == 0 {
                continue;
            }
            for bit in 0..8u16 {
                if b & (1 << bit) != 0 {
                    out.push((byte as u16) * 8 + bit);
                }
            }
        }
        out
    }

    /// Textual export form: decimal segment number, `[`, 2-hex-digits
    /// per byte, `]`.
    pub fn export_line(&self) -> String {
        let mut s = format!("{}[", self.segno);
        for b in &self.data {
            s.push_str(&format!("{b:02x}"));
        }
        s.push(']');
        s
    }

    /// Parse one `export_line` output back into a segment.
    pub fn import_line(line: &str) -> Result<Self> {
        let (segno_str, rest) = line.split_once('[').ok_or_else(|| Error::Corrupt(format!("malformed segment line: {line}")))?;
        let hex = rest.strip_suffix(']').ok_or_else(|| Error::Corrupt(format!("malformed segment line: {line}")))?;
        let segno: u16 = segno_str.parse().map_err(|_| Error::Corrupt(format!("bad segment number: {segno_str}")))?;
        let bytes = hex::decode(hex).map_err(|e| Error::Corrupt(format!("bad segment hex payload: {e}")))?;
        if bytes.len() != SEGMENT_BYTES {
            return Err(Error::Corrupt(format!("segment payload has {} bytes, expected {SEGMENT_BYTES}", bytes.len())));
        }
        let mut data = [0u8; SEGMENT_BYTES];
        data.copy_from_slice(&bytes);
        let mut segment = Segment { data, count: 0, segno };
        segment.recount();
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_track_count() {
        let mut s = Segment::empty(0);
        assert!(s.set(5));
        assert!(!s.set(5));
        assert_eq!(s.count(), 1);
        assert!(s.clear(5));
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn union_and_intersect() {
        let mut a = Segment::empty(0);
        a.set(1);
        a.set(2);
        let mut b = Segment::empty(0);
        b.set(2);
        b.set(3);

        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u.count(), 3);

        let mut i = a.clone();
        i.intersect_with(&b);
        assert_eq!(i.count(), 1);
        assert!(i.is_set(2));
    }

    #[test]
    fn export_import_round_trip() {
        let mut s = Segment::empty(7);
        s.set(0);
        s.set(255);
        let line = s.export_line();
        let back = Segment::import_line(&line).unwrap();
        assert_eq!(s, back);
    }
}
