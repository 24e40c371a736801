//! Conversion between UTF-8 byte offsets and UTF-16 code unit offsets.
//!
//! Public positions in this crate are UTF-16 offsets; Rust strings are
//! indexed by byte.

use std::ops::Range;

/// Number of UTF-16 code units in `text`.
#[inline]
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Offset table for one string.
#[derive(Debug, Clone, Default)]
pub(crate) struct Utf16Index {
    /// `(byte offset, utf16 offset)` of every char start, plus the end.
    starts: Vec<(usize, usize)>,
}

impl Utf16Index {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = Vec::with_capacity(text.len() + 1);
        let mut utf16 = 0;
        for (byte, c) in text.char_indices() {
            starts.push((byte, utf16));
            utf16 += c.len_utf16();
        }
        starts.push((text.len(), utf16));
        Self { starts }
    }

    /// Total length in UTF-16 code units.
    pub(crate) fn len(&self) -> usize {
        self.starts.last().map_or(0, |&(_, u)| u)
    }

    /// UTF-16 offset of a byte offset; offsets inside a char map to its start.
    pub(crate) fn to_utf16(&self, byte: usize) -> usize {
        match self.starts.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.starts[i].1,
            Err(0) => 0,
            Err(i) => self.starts[i - 1].1,
        }
    }

    /// Byte offset of a UTF-16 offset; offsets inside a surrogate pair map to
    /// the start of the char.
    pub(crate) fn to_byte(&self, utf16: usize) -> usize {
        match self.starts.binary_search_by_key(&utf16, |&(_, u)| u) {
            Ok(i) => self.starts[i].0,
            Err(0) => 0,
            Err(i) => self.starts[i - 1].0,
        }
    }

    pub(crate) fn byte_range(&self, range: Range<usize>) -> Range<usize> {
        self.to_byte(range.start)..self.to_byte(range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_offsets_are_identical() {
        let index = Utf16Index::new("hello");
        assert_eq!(index.len(), 5);
        assert_eq!(index.to_utf16(3), 3);
        assert_eq!(index.to_byte(3), 3);
    }

    #[test]
    fn multibyte_and_surrogates() {
        // "é" is 2 bytes / 1 unit, "𝄞" is 4 bytes / 2 units.
        let text = "é𝄞a";
        let index = Utf16Index::new(text);
        assert_eq!(utf16_len(text), 4);
        assert_eq!(index.len(), 4);
        assert_eq!(index.to_utf16(2), 1);
        assert_eq!(index.to_utf16(6), 3);
        assert_eq!(index.to_byte(1), 2);
        assert_eq!(index.to_byte(2), 2);
        assert_eq!(index.to_byte(3), 6);
        assert_eq!(index.byte_range(1..4), 2..7);
    }
}
