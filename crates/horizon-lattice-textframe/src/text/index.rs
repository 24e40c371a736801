//! Positions in a frame and conversions between the three index spaces.
//!
//! A frame has three ways of addressing text:
//!
//! - original offsets, UTF-16 offsets into the shaped text;
//! - truncated offsets, UTF-16 offsets into the [`TruncatedText`](super::TruncatedText);
//! - frame positions ([`TextFrameIndex`]), which address both the displayed
//!   original text and the inside of truncation tokens.
//!
//! Every conversion clamps its input instead of failing. A token is atomic
//! with respect to original ranges: an original range that touches the
//! interior of an elided span maps to the whole token.

use std::cmp::Ordering;
use std::ops::Range;

use super::attributes::TextAttributes;
use super::frame::{TextFrame, TruncationToken};

/// An opaque, totally ordered position in a [`TextFrame`].
///
/// Positions are created and consumed by the mapping functions of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextFrameIndex {
    original: usize,
    in_token: usize,
}

impl TextFrameIndex {
    pub(crate) const fn new(original: usize, in_token: usize) -> Self {
        Self { original, in_token }
    }
}

impl PartialOrd for TextFrameIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextFrameIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.original
            .cmp(&other.original)
            .then(self.in_token.cmp(&other.in_token))
    }
}

/// An ordered pair of frame positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextFrameRange {
    pub start: TextFrameIndex,
    pub end: TextFrameIndex,
}

impl TextFrameRange {
    /// A range between two positions, in either order.
    pub fn new(a: TextFrameIndex, b: TextFrameIndex) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// An empty range at `index`.
    pub fn empty_at(index: TextFrameIndex) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: TextFrameIndex) -> bool {
        self.start <= index && index < self.end
    }

    /// Whether the two ranges share at least one position.
    pub fn overlaps(&self, other: &TextFrameRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A range in either the original or the truncated text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextRange {
    /// UTF-16 offsets into the shaped text.
    Original(Range<usize>),
    /// UTF-16 offsets into the truncated text.
    Truncated(Range<usize>),
}

/// A token addressed by a frame position.
#[derive(Debug, Clone, Copy)]
pub struct TokenPosition<'a> {
    pub token: &'a TruncationToken,
    pub index: usize,
    /// Offset inside the token text.
    pub offset_in_token: usize,
}

fn clamp_range(range: Range<usize>, bounds: &Range<usize>) -> Range<usize> {
    let start = range.start.clamp(bounds.start, bounds.end);
    let end = range.end.clamp(bounds.start, bounds.end);
    start.min(end)..start.max(end)
}

impl TextFrame {
    /// Index of the token whose elided span starts at `original`.
    fn token_starting_at(&self, original: usize) -> Option<usize> {
        let tokens = self.truncation_tokens();
        let i = tokens.partition_point(|t| t.elided.start < original);
        (i < tokens.len() && tokens[i].elided.start == original).then_some(i)
    }

    /// Index of the token whose elided span contains `original`.
    fn token_containing(&self, original: usize) -> Option<usize> {
        let tokens = self.truncation_tokens();
        let i = tokens.partition_point(|t| t.elided.end <= original);
        (i < tokens.len() && tokens[i].elided.contains(&original)).then_some(i)
    }

    /// Clamp a position to the frame and normalize it.
    fn clamp_index(&self, index: TextFrameIndex) -> TextFrameIndex {
        let range = self.range_in_original();
        let original = index.original.clamp(range.start, range.end);
        match self.token_containing(original) {
            Some(i) => {
                let token = &self.truncation_tokens()[i];
                if original > token.elided.start {
                    TextFrameIndex::new(token.elided.start, 0)
                } else if index.in_token >= token.len_utf16() {
                    TextFrameIndex::new(token.elided.end, 0)
                } else {
                    TextFrameIndex::new(original, index.in_token)
                }
            }
            None => TextFrameIndex::new(original, 0),
        }
    }

    /// Length of the truncated text, without building it.
    pub fn truncated_len(&self) -> usize {
        let elided: usize = self.truncation_tokens().iter().map(|t| t.elided.len()).sum();
        let inserted: usize = self.truncation_tokens().iter().map(|t| t.len_utf16()).sum();
        self.range_in_original().len() - elided + inserted
    }

    /// The range from the first to the last position of the frame.
    pub fn full_range(&self) -> TextFrameRange {
        let range = self.range_in_original();
        TextFrameRange {
            start: TextFrameIndex::new(range.start, 0),
            end: TextFrameIndex::new(range.end, 0),
        }
    }

    /// The position of original offset `offset`.
    ///
    /// Offsets inside an elided span address `in_token_offset` inside the
    /// span's token; an offset past the token's end addresses the position
    /// after the token.
    pub fn index_for_original(&self, offset: usize, in_token_offset: usize) -> TextFrameIndex {
        let range = self.range_in_original();
        let offset = offset.clamp(range.start, range.end);
        match self.token_containing(offset) {
            Some(i) => {
                let token = &self.truncation_tokens()[i];
                self.clamp_index(TextFrameIndex::new(token.elided.start, in_token_offset))
            }
            None => TextFrameIndex::new(offset, 0),
        }
    }

    /// The position of truncated-text offset `offset`.
    pub fn index_for_truncated(&self, offset: usize) -> TextFrameIndex {
        let offset = offset.min(self.truncated_len());
        let mut original = self.range_in_original().start;
        let mut truncated = 0;
        for token in self.truncation_tokens() {
            let before = token.elided.start - original;
            if offset < truncated + before {
                return TextFrameIndex::new(original + (offset - truncated), 0);
            }
            truncated += before;
            if offset < truncated + token.len_utf16() {
                return TextFrameIndex::new(token.elided.start, offset - truncated);
            }
            truncated += token.len_utf16();
            original = token.elided.end;
        }
        TextFrameIndex::new(original + (offset - truncated), 0)
    }

    /// The truncated-text offset of `index`.
    pub fn truncated_offset_for_index(&self, index: TextFrameIndex) -> usize {
        let index = self.clamp_index(index);
        let mut original = self.range_in_original().start;
        let mut truncated = 0;
        for token in self.truncation_tokens() {
            if index.original <= token.elided.start {
                let in_token = if index.original == token.elided.start {
                    index.in_token
                } else {
                    0
                };
                return truncated + (index.original - original) + in_token;
            }
            truncated += token.elided.start - original + token.len_utf16();
            original = token.elided.end;
        }
        truncated + (index.original - original)
    }

    /// The frame range of an original range, widened to whole tokens.
    pub fn range_for_original_range(&self, range: Range<usize>) -> TextFrameRange {
        let range = clamp_range(range, &self.range_in_original());
        let start = self.index_for_original(range.start, 0);
        let end = match self.token_containing(range.end) {
            Some(i) if range.end > self.truncation_tokens()[i].elided.start => {
                TextFrameIndex::new(self.truncation_tokens()[i].elided.end, 0)
            }
            _ => self.index_for_original(range.end, 0),
        };
        TextFrameRange::new(start, end.max(start))
    }

    /// The frame range of a truncated-text range.
    pub fn range_for_truncated_range(&self, range: Range<usize>) -> TextFrameRange {
        let range = clamp_range(range, &(0..self.truncated_len()));
        TextFrameRange::new(
            self.index_for_truncated(range.start),
            self.index_for_truncated(range.end),
        )
    }

    /// The frame range of an original or truncated range.
    pub fn range_for_text_range(&self, range: TextRange) -> TextFrameRange {
        match range {
            TextRange::Original(range) => self.range_for_original_range(range),
            TextRange::Truncated(range) => self.range_for_truncated_range(range),
        }
    }

    /// The truncated-text range of a frame range.
    pub fn truncated_range_for_range(&self, range: TextFrameRange) -> Range<usize> {
        self.truncated_offset_for_index(range.start)..self.truncated_offset_for_index(range.end)
    }

    /// The original range addressed by a position: empty at its offset, or
    /// the whole elided span when the position lies on a token.
    pub fn original_range_for_index(&self, index: TextFrameIndex) -> Range<usize> {
        self.original_range_and_token_for_index(index).0
    }

    /// Like [`original_range_for_index`](Self::original_range_for_index),
    /// plus the token and the offset inside it.
    pub fn original_range_and_token_for_index(
        &self,
        index: TextFrameIndex,
    ) -> (Range<usize>, Option<TokenPosition<'_>>) {
        let index = self.clamp_index(index);
        match self.token_starting_at(index.original) {
            Some(i) => {
                let token = &self.truncation_tokens()[i];
                (
                    token.elided_range(),
                    Some(TokenPosition {
                        token,
                        index: i,
                        offset_in_token: index.in_token,
                    }),
                )
            }
            None => (index.original..index.original, None),
        }
    }

    /// The original range covered by a frame range; tokens map to their
    /// whole elided span.
    pub fn original_range_for_range(&self, range: TextFrameRange) -> Range<usize> {
        if range.is_empty() {
            return self.original_range_for_index(range.start);
        }
        let start = self.clamp_index(range.start);
        let end = self.clamp_index(range.end);
        let end = match self.token_starting_at(end.original) {
            Some(i) if end.in_token > 0 => self.truncation_tokens()[i].elided.end,
            _ => end.original,
        };
        start.original..end.max(start.original)
    }

    /// The frame range of the last token, or an empty range at the end of
    /// the frame when nothing was truncated.
    pub fn last_truncation_token_range(&self) -> TextFrameRange {
        match self.truncation_tokens().last() {
            Some(token) => TextFrameRange {
                start: TextFrameIndex::new(token.elided.start, 0),
                end: TextFrameIndex::new(token.elided.end, 0),
            },
            None => TextFrameRange::empty_at(self.full_range().end),
        }
    }

    /// Attributes of the text at `index`; the token's attributes on a token.
    ///
    /// At the end of the frame the attributes of the last unit are returned.
    pub fn attributes_at(&self, index: TextFrameIndex) -> Option<&TextAttributes> {
        let index = self.clamp_index(index);
        if let Some(i) = self.token_starting_at(index.original) {
            return Some(self.truncation_tokens()[i].attributes());
        }
        let range = self.range_in_original();
        if range.is_empty() {
            return None;
        }
        let offset = index.original.min(range.end - 1);
        match self.token_containing(offset) {
            Some(i) => Some(self.truncation_tokens()[i].attributes()),
            _ => self.shaped_text().attributes_at(offset),
        }
    }

    /// Attributes at a truncated-text offset.
    pub fn attributes_at_truncated_offset(&self, offset: usize) -> Option<&TextAttributes> {
        self.attributes_at(self.index_for_truncated(offset))
    }

    /// Index of the line containing `index`; the end of the frame belongs to
    /// the last line.
    pub fn line_index_for_index(&self, index: TextFrameIndex) -> Option<usize> {
        let lines = self.lines();
        let last = lines.len().checked_sub(1)?;
        let index = self.clamp_index(index);
        let i = lines.partition_point(|line| line.end_index() <= index);
        Some(i.min(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size;
    use crate::text::attributes::{AttributedText, TextAttributes};
    use crate::text::font::{Font, FontFamily};
    use crate::text::options::TextFrameOptions;
    use crate::text::shaped::ShapedText;
    use crate::text::shaper::FixedPitchShaper;

    /// "abcdefghijklmnopqrstuvwxyz" in one 50pt line: "abcdefghi…", token
    /// eliding 9..26.
    fn truncated_frame() -> TextFrame {
        let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
        let text = AttributedText::plain("abcdefghijklmnopqrstuvwxyz", attributes);
        let shaped = ShapedText::new(&text, &FixedPitchShaper::new());
        let options = TextFrameOptions::new().max_line_count(1);
        TextFrame::new(&shaped, Size::new(50.0, 20.0), 1.0, &options)
    }

    #[test]
    fn index_ordering() {
        let a = TextFrameIndex::new(3, 0);
        let b = TextFrameIndex::new(3, 1);
        let c = TextFrameIndex::new(4, 0);
        assert!(a < b && b < c);
        assert_eq!(TextFrameRange::new(c, a).start, a);
    }

    #[test]
    fn text_ranges_in_either_space() {
        let frame = truncated_frame();
        let token = frame.range_for_original_range(12..14);
        assert_eq!(frame.range_for_text_range(TextRange::Original(12..14)), token);
        assert_eq!(frame.range_for_text_range(TextRange::Truncated(9..10)), token);
        assert_eq!(
            frame.range_for_text_range(TextRange::Truncated(2..4)),
            frame.range_for_original_range(2..4)
        );
    }

    #[test]
    fn original_offsets_round_trip_outside_tokens() {
        let frame = truncated_frame();
        for o in 0..=9 {
            let index = frame.index_for_original(o, 0);
            let expected = if o == 9 { 9..26 } else { o..o };
            assert_eq!(frame.original_range_for_index(index), expected);
        }
        for o in 10..26 {
            let index = frame.index_for_original(o, 0);
            assert_eq!(frame.original_range_for_index(index), 9..26);
        }
        assert_eq!(frame.original_range_for_index(frame.index_for_original(26, 0)), 26..26);
    }

    #[test]
    fn truncated_offsets_are_bijective() {
        let frame = truncated_frame();
        assert_eq!(frame.truncated_len(), 10);
        let mut previous = None;
        for t in 0..=10 {
            let index = frame.index_for_truncated(t);
            assert_eq!(frame.truncated_offset_for_index(index), t);
            if let Some(p) = previous {
                assert!(p < index);
            }
            previous = Some(index);
            assert_eq!(frame.range_for_truncated_range(t..t), TextFrameRange::empty_at(index));
        }
        assert_eq!(frame.index_for_truncated(99), frame.full_range().end);
    }

    #[test]
    fn partial_overlap_widens_to_the_token() {
        let frame = truncated_frame();
        let range = frame.range_for_original_range(5..12);
        assert_eq!(frame.original_range_for_range(range), 5..26);
        let range = frame.range_for_original_range(12..14);
        assert_eq!(frame.original_range_for_range(range), 9..26);
        let range = frame.range_for_original_range(2..4);
        assert_eq!(frame.original_range_for_range(range), 2..4);
    }

    #[test]
    fn in_token_offsets_are_clamped() {
        let frame = truncated_frame();
        let inside = frame.index_for_original(12, 0);
        assert_eq!(frame.truncated_offset_for_index(inside), 9);
        let past = frame.index_for_original(12, 5);
        assert_eq!(past, frame.full_range().end);
        let (range, token) = frame.original_range_and_token_for_index(inside);
        assert_eq!(range, 9..26);
        let token = token.unwrap();
        assert_eq!(token.offset_in_token, 0);
        assert_eq!(token.token.text(), "\u{2026}");
    }

    #[test]
    fn last_token_range() {
        let frame = truncated_frame();
        let range = frame.last_truncation_token_range();
        assert!(!range.is_empty());
        assert_eq!(frame.truncated_range_for_range(range), 9..10);

        let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
        let shaped = ShapedText::new(&AttributedText::plain("abc", attributes), &FixedPitchShaper::new());
        let frame = TextFrame::new(&shaped, Size::new(100.0, 20.0), 1.0, &TextFrameOptions::default());
        let range = frame.last_truncation_token_range();
        assert!(range.is_empty());
        assert_eq!(frame.truncated_offset_for_index(range.start), 3);
    }

    #[test]
    fn attributes_and_lines() {
        let frame = truncated_frame();
        assert!(frame.attributes_at_truncated_offset(9).is_some());
        assert_eq!(frame.line_index_for_index(frame.full_range().end), Some(0));
        assert_eq!(TextFrame::empty().line_index_for_index(TextFrameIndex::default()), None);
        assert!(TextFrame::empty().attributes_at(TextFrameIndex::default()).is_none());
    }
}
