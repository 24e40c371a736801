//! The immutable result of laying out shaped text in a fixed-size frame.
//!
//! A [`TextFrame`] owns its lines, the truncation tokens substituted for
//! elided text and a [`LayoutInfo`] summary. Everything is computed at
//! construction except the [`TruncatedText`], which is built on first use and
//! then cached. Frames are `Send + Sync`; any number of threads may query one
//! frame concurrently.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_textframe::Size;
//! use horizon_lattice_textframe::text::{
//!     AttributedText, FixedPitchShaper, Font, FontFamily, ShapedText, TextAttributes,
//!     TextFrame, TextFrameOptions,
//! };
//!
//! let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
//! let text = AttributedText::plain("The quick brown fox jumps over the lazy dog", attributes);
//! let shaped = ShapedText::new(&text, &FixedPitchShaper::new());
//!
//! let options = TextFrameOptions::new().max_line_count(1);
//! let frame = TextFrame::new(&shaped, Size::new(100.0, 40.0), 2.0, &options);
//!
//! assert_eq!(frame.line_count(), 1);
//! assert!(frame.layout_info().is_truncated());
//! assert_eq!(frame.truncated_text().text(), "The quick brown fox\u{2026}");
//! ```

use std::ops::Range;
use std::sync::{Arc, OnceLock};

use bitflags::bitflags;
use static_assertions::assert_impl_all;

use super::attributes::{AttributeSpan, TextAlignment, TextAttributes, TextFlags};
use super::bidi::WritingDirection;
use super::index::{TextFrameIndex, TextFrameRange};
use super::layout::{self, LayoutOutput};
use super::options::TextFrameOptions;
use super::shaped::{Cluster, ShapedText, ShapedToken};
use super::shaper::ShapedGlyph;
use super::font::LineMetrics;
use crate::cancellation::CancellationFlag;
use crate::error::TextFrameResult;
use crate::types::{Rect, Size};

bitflags! {
    /// Flags describing how the layout was produced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayoutFlags: u8 {
        /// Text was replaced by a token or clipped.
        const IS_TRUNCATED = 1 << 0;
        /// The text scale factor is below 1.
        const IS_SCALED = 1 << 1;
        /// A maximum typographic width narrower than the frame was applied.
        const HAS_MAX_TYPOGRAPHIC_WIDTH = 1 << 2;
    }
}

/// Content flags of the displayed text plus the layout flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextFrameFlags {
    pub content: TextFlags,
    pub layout: LayoutFlags,
}

/// The alignment shared by all lines, if they share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsistentAlignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Summary metrics of a laid-out frame.
///
/// All lengths include the text scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutInfo {
    pub line_count: usize,
    pub flags: TextFrameFlags,
    pub consistent_alignment: ConsistentAlignment,
    /// The size the frame was laid out for.
    pub size: Size,
    /// Display scale; 0 when unspecified.
    pub display_scale: f32,
    /// Union of the typographic bounds of all lines, trailing whitespace excluded.
    pub layout_bounds: Rect,
    pub text_scale_factor: f32,
    pub first_baseline: f32,
    pub last_baseline: f32,
    pub first_line_ascent: f32,
    pub first_line_leading: f32,
    pub first_line_height: f32,
    pub last_line_descent: f32,
    pub last_line_leading: f32,
    pub last_line_height: f32,
}

impl LayoutInfo {
    pub fn is_truncated(&self) -> bool {
        self.flags.layout.contains(LayoutFlags::IS_TRUNCATED)
    }

    pub fn is_scaled(&self) -> bool {
        self.flags.layout.contains(LayoutFlags::IS_SCALED)
    }
}

/// A truncation token placed in a frame.
#[derive(Debug, Clone)]
pub struct TruncationToken {
    pub(crate) token: Arc<ShapedToken>,
    pub(crate) elided: Range<usize>,
    pub(crate) line: usize,
    pub(crate) truncated_start: usize,
}

impl TruncationToken {
    /// The displayed token text.
    pub fn text(&self) -> &str {
        self.token.text()
    }

    pub fn attributes(&self) -> &TextAttributes {
        self.token.attributes()
    }

    /// The range of the original text the token replaces.
    pub fn elided_range(&self) -> Range<usize> {
        self.elided.clone()
    }

    pub fn line_index(&self) -> usize {
        self.line
    }

    /// The token's range in the truncated text.
    pub fn truncated_range(&self) -> Range<usize> {
        self.truncated_start..self.truncated_start + self.token.len_utf16()
    }

    pub(crate) fn len_utf16(&self) -> usize {
        self.token.len_utf16()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SegmentKind {
    /// Clusters of one run, in logical order.
    Text { run: usize, clusters: Range<usize> },
    Token { token: usize },
}

/// A piece of a line with a single level, positioned in visual order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LineSegment {
    pub(crate) kind: SegmentKind,
    pub(crate) level: u8,
    /// Left edge in frame coordinates.
    pub(crate) x: f32,
    pub(crate) width: f32,
}

/// One laid-out line.
#[derive(Debug, Clone)]
pub struct TextFrameLine {
    pub(crate) index: usize,
    /// Original range, including elided text and the terminator.
    pub(crate) range: Range<usize>,
    /// Start of the trailing whitespace and terminator.
    pub(crate) trailing_whitespace_start: usize,
    pub(crate) paragraph: usize,
    pub(crate) baseline: f32,
    pub(crate) ascent: f32,
    pub(crate) descent: f32,
    pub(crate) leading: f32,
    /// Left edge of the content without trailing whitespace.
    pub(crate) x: f32,
    /// Width without trailing whitespace.
    pub(crate) width: f32,
    pub(crate) alignment: TextAlignment,
    pub(crate) direction: WritingDirection,
    pub(crate) token: Option<usize>,
    /// Segments in visual order, left to right.
    pub(crate) segments: Vec<LineSegment>,
}

impl TextFrameLine {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Range of the original text covered by this line, elided text included.
    pub fn range_in_original(&self) -> Range<usize> {
        self.range.clone()
    }

    /// First frame position of the line.
    pub fn start_index(&self) -> TextFrameIndex {
        TextFrameIndex::new(self.range.start, 0)
    }

    /// Frame position after the line.
    pub fn end_index(&self) -> TextFrameIndex {
        TextFrameIndex::new(self.range.end, 0)
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    pub fn descent(&self) -> f32 {
        self.descent
    }

    pub fn leading(&self) -> f32 {
        self.leading
    }

    /// Ascent plus descent plus leading.
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.leading
    }

    /// Typographic bounds, trailing whitespace excluded.
    pub fn typographic_bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.baseline - self.ascent,
            self.width,
            self.ascent + self.descent,
        )
    }

    /// Resolved alignment: never [`TextAlignment::Natural`].
    pub fn alignment(&self) -> TextAlignment {
        self.alignment
    }

    pub fn writing_direction(&self) -> WritingDirection {
        self.direction
    }

    pub fn paragraph_index(&self) -> usize {
        self.paragraph
    }

    /// Whether a truncation token is displayed on this line.
    pub fn has_truncation_token(&self) -> bool {
        self.token.is_some()
    }

    /// Top of the line box, leading excluded.
    pub(crate) fn top(&self) -> f32 {
        self.baseline - self.ascent
    }

    pub(crate) fn bottom(&self) -> f32 {
        self.baseline + self.descent
    }
}

/// The displayed text: the original range with elided spans replaced by
/// their tokens.
#[derive(Debug, Clone)]
pub struct TruncatedText {
    text: String,
    len_utf16: usize,
    spans: Vec<AttributeSpan>,
}

impl TruncatedText {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    /// Attribute spans in truncated-text offsets.
    pub fn spans(&self) -> &[AttributeSpan] {
        &self.spans
    }
}

/// A cluster positioned on a line, or a whole truncation token.
#[derive(Debug, Clone)]
pub(crate) struct PlacedCluster<'a> {
    pub(crate) start: TextFrameIndex,
    pub(crate) end: TextFrameIndex,
    pub(crate) x0: f32,
    pub(crate) x1: f32,
    pub(crate) level: u8,
    pub(crate) segment: usize,
    /// `None` for a truncation token.
    pub(crate) cluster: Option<&'a Cluster>,
    pub(crate) is_trailing_whitespace: bool,
}

/// What a segment draws with.
pub(crate) struct SegmentSource<'a> {
    pub(crate) clusters: &'a [Cluster],
    pub(crate) glyphs: &'a [ShapedGlyph],
    pub(crate) attributes: &'a TextAttributes,
    /// Run metrics at a text scale of 1.
    pub(crate) metrics: LineMetrics,
}

/// Text laid out in a frame.
#[derive(Debug)]
pub struct TextFrame {
    shaped: ShapedText,
    range_in_original: Range<usize>,
    lines: Vec<TextFrameLine>,
    tokens: Vec<TruncationToken>,
    info: LayoutInfo,
    truncated_text: OnceLock<TruncatedText>,
}

assert_impl_all!(TextFrame: Send, Sync);

/// Normalize a display scale: non-finite or non-positive means unspecified (0).
pub(crate) fn normalize_display_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        0.0
    }
}

impl TextFrame {
    /// Lay out all of `shaped`.
    ///
    /// Use [`TextFrame::with_range`] to lay out a sub-range or to pass a
    /// cancellation flag.
    pub fn new(
        shaped: &ShapedText,
        size: Size,
        display_scale: f32,
        options: &TextFrameOptions,
    ) -> Self {
        // Layout only fails when cancelled, which requires a flag.
        Self::with_range(shaped, None, size, display_scale, options, None)
            .unwrap_or_else(|_| Self::empty_for(shaped.clone(), 0..0, size, display_scale))
    }

    /// Lay out `range` of `shaped` (the whole text when `None`).
    ///
    /// The range is clamped to the text and widened to grapheme cluster
    /// boundaries. A non-positive or non-finite frame
    /// width or height produces a frame without lines; an invalid display
    /// scale is treated as unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`TextFrameError::Cancelled`](crate::TextFrameError::Cancelled)
    /// if `cancellation` is signalled before the layout completes.
    pub fn with_range(
        shaped: &ShapedText,
        range: Option<Range<usize>>,
        size: Size,
        display_scale: f32,
        options: &TextFrameOptions,
        cancellation: Option<&CancellationFlag>,
    ) -> TextFrameResult<Self> {
        let len = shaped.len_utf16();
        let range = match range {
            Some(r) => {
                let start = r.start.min(len);
                shaped.snap_to_clusters(start..r.end.clamp(start, len))
            }
            None => 0..len,
        };
        if range.is_empty() {
            return Ok(Self::empty_for(shaped.clone(), range, size, display_scale));
        }
        if !size.is_usable() {
            return Ok(Self::empty_for(
                shaped.clone(),
                range.start..range.start,
                size,
                display_scale,
            ));
        }

        let output = layout::layout(shaped, range, size, options, cancellation)?;
        Ok(Self::from_layout(shaped.clone(), output, size, display_scale))
    }

    /// A frame without text or lines.
    pub fn empty() -> Self {
        Self::empty_for(ShapedText::empty(), 0..0, Size::ZERO, 0.0)
    }

    fn empty_for(
        shaped: ShapedText,
        range: Range<usize>,
        size: Size,
        display_scale: f32,
    ) -> Self {
        Self {
            shaped,
            range_in_original: range,
            lines: Vec::new(),
            tokens: Vec::new(),
            info: LayoutInfo {
                size,
                display_scale: normalize_display_scale(display_scale),
                text_scale_factor: 1.0,
                ..LayoutInfo::default()
            },
            truncated_text: OnceLock::new(),
        }
    }

    fn from_layout(
        shaped: ShapedText,
        output: LayoutOutput,
        size: Size,
        display_scale: f32,
    ) -> Self {
        let LayoutOutput {
            lines,
            mut tokens,
            range_in_original,
            scale,
            layout_flags,
            content_flags,
            consistent_alignment,
            layout_bounds,
        } = output;

        let mut truncated = 0usize;
        let mut cursor = range_in_original.start;
        for token in tokens.iter_mut() {
            truncated += token.elided.start - cursor;
            token.truncated_start = truncated;
            truncated += token.len_utf16();
            cursor = token.elided.end;
        }

        let mut info = LayoutInfo {
            line_count: lines.len(),
            flags: TextFrameFlags {
                content: content_flags,
                layout: layout_flags,
            },
            consistent_alignment,
            size,
            display_scale: normalize_display_scale(display_scale),
            layout_bounds,
            text_scale_factor: scale,
            ..LayoutInfo::default()
        };
        if let (Some(first), Some(last)) = (lines.first(), lines.last()) {
            info.first_baseline = first.baseline;
            info.first_line_ascent = first.ascent;
            info.first_line_leading = first.leading;
            info.first_line_height = first.height();
            info.last_baseline = last.baseline;
            info.last_line_descent = last.descent;
            info.last_line_leading = last.leading;
            info.last_line_height = last.height();
        }

        Self {
            shaped,
            range_in_original,
            lines,
            tokens,
            info,
            truncated_text: OnceLock::new(),
        }
    }

    /// The shaped text this frame was laid out from.
    pub fn shaped_text(&self) -> &ShapedText {
        &self.shaped
    }

    /// The displayed range of the original text.
    ///
    /// Shorter than the requested range only when the tail was clipped
    /// without a token or the frame size was degenerate.
    pub fn range_in_original(&self) -> Range<usize> {
        self.range_in_original.clone()
    }

    pub fn layout_info(&self) -> &LayoutInfo {
        &self.info
    }

    pub fn lines(&self) -> &[TextFrameLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Tokens in order of their position.
    pub fn truncation_tokens(&self) -> &[TruncationToken] {
        &self.tokens
    }

    /// The display scale used for pixel snapping, if specified.
    pub fn display_scale(&self) -> Option<f32> {
        (self.info.display_scale > 0.0).then_some(self.info.display_scale)
    }

    /// The displayed text, computed on first access and cached.
    pub fn truncated_text(&self) -> &TruncatedText {
        self.truncated_text.get_or_init(|| self.build_truncated_text())
    }

    fn build_truncated_text(&self) -> TruncatedText {
        let mut text = String::new();
        let mut spans = Vec::new();
        let mut offset = 0usize;
        let push_original = |range: Range<usize>,
                                 text: &mut String,
                                 spans: &mut Vec<AttributeSpan>,
                                 offset: &mut usize| {
            if range.is_empty() {
                return;
            }
            text.push_str(self.shaped.substring(range.clone()));
            for span in self.shaped.spans() {
                let start = span.range.start.max(range.start);
                let end = span.range.end.min(range.end);
                if start < end {
                    spans.push(AttributeSpan {
                        range: *offset + (start - range.start)..*offset + (end - range.start),
                        attributes: span.attributes.clone(),
                    });
                }
            }
            *offset += range.len();
        };

        let mut cursor = self.range_in_original.start;
        for token in &self.tokens {
            push_original(cursor..token.elided.start, &mut text, &mut spans, &mut offset);
            text.push_str(token.text());
            spans.push(AttributeSpan {
                range: offset..offset + token.len_utf16(),
                attributes: token.token.attributes.clone(),
            });
            offset += token.len_utf16();
            cursor = token.elided.end;
        }
        push_original(
            cursor..self.range_in_original.end,
            &mut text,
            &mut spans,
            &mut offset,
        );

        TruncatedText {
            text,
            len_utf16: offset,
            spans,
        }
    }

    /// Clusters, glyphs and attributes behind a segment.
    pub(crate) fn segment_source(&self, segment: &LineSegment) -> SegmentSource<'_> {
        match &segment.kind {
            SegmentKind::Text { run, clusters } => {
                let run = &self.shaped.runs()[*run];
                SegmentSource {
                    clusters: &self.shaped.clusters()[clusters.clone()],
                    glyphs: self.shaped.glyphs(),
                    attributes: self.shaped.span_attributes(run.span),
                    metrics: run.metrics,
                }
            }
            SegmentKind::Token { token } => {
                let token = &self.tokens[*token].token;
                SegmentSource {
                    clusters: &token.clusters,
                    glyphs: &token.glyphs,
                    attributes: &token.attributes,
                    metrics: token.metrics,
                }
            }
        }
    }

    /// Horizontal extent of every cluster of a segment, in logical order.
    pub(crate) fn cluster_boxes<'a>(
        &self,
        segment: &LineSegment,
        clusters: &'a [Cluster],
    ) -> Vec<(&'a Cluster, f32, f32)> {
        let scale = self.info.text_scale_factor;
        let rtl = segment.level % 2 == 1;
        let mut advance = 0.0;
        clusters
            .iter()
            .map(|cluster| {
                let width = cluster.advance * scale;
                let (x0, x1) = if rtl {
                    let right = segment.x + segment.width - advance;
                    (right - width, right)
                } else {
                    let left = segment.x + advance;
                    (left, left + width)
                };
                advance += width;
                (cluster, x0, x1)
            })
            .collect()
    }

    /// Frame range of a cluster of `segment`. Every cluster of a token maps
    /// to the whole token.
    pub(crate) fn cluster_frame_range(&self, segment: &LineSegment, cluster: &Cluster) -> TextFrameRange {
        match &segment.kind {
            SegmentKind::Token { token } => {
                let elided = &self.tokens[*token].elided;
                TextFrameRange {
                    start: TextFrameIndex::new(elided.start, 0),
                    end: TextFrameIndex::new(elided.end, 0),
                }
            }
            SegmentKind::Text { .. } => TextFrameRange {
                start: TextFrameIndex::new(cluster.start, 0),
                end: TextFrameIndex::new(cluster.end, 0),
            },
        }
    }

    /// Whether a cluster belongs to the trailing whitespace of `line`.
    pub(crate) fn is_trailing(line: &TextFrameLine, segment: &LineSegment, cluster: &Cluster) -> bool {
        matches!(segment.kind, SegmentKind::Text { .. })
            && cluster.start >= line.trailing_whitespace_start
    }

    /// Clusters of a line in visual order; a token is one entry.
    pub(crate) fn placed_clusters(&self, line: &TextFrameLine) -> Vec<PlacedCluster<'_>> {
        let mut placed = Vec::new();
        for (index, segment) in line.segments.iter().enumerate() {
            match &segment.kind {
                SegmentKind::Token { token } => {
                    let elided = &self.tokens[*token].elided;
                    placed.push(PlacedCluster {
                        start: TextFrameIndex::new(elided.start, 0),
                        end: TextFrameIndex::new(elided.end, 0),
                        x0: segment.x,
                        x1: segment.x + segment.width,
                        level: segment.level,
                        segment: index,
                        cluster: None,
                        is_trailing_whitespace: false,
                    });
                }
                SegmentKind::Text { clusters, .. } => {
                    let clusters = &self.shaped.clusters()[clusters.clone()];
                    let mut boxes = self.cluster_boxes(segment, clusters);
                    boxes.sort_by(|a, b| a.1.total_cmp(&b.1));
                    placed.extend(boxes.into_iter().map(|(cluster, x0, x1)| PlacedCluster {
                        start: TextFrameIndex::new(cluster.start, 0),
                        end: TextFrameIndex::new(cluster.end, 0),
                        x0,
                        x1,
                        level: segment.level,
                        segment: index,
                        cluster: Some(cluster),
                        is_trailing_whitespace: cluster.start >= line.trailing_whitespace_start,
                    }));
                }
            }
        }
        placed
    }

    /// Lines whose range overlaps `[start, end)`, or that contain `start` when
    /// the range is empty.
    pub(crate) fn lines_overlapping(
        &self,
        start: TextFrameIndex,
        end: TextFrameIndex,
    ) -> impl Iterator<Item = &TextFrameLine> {
        self.lines
            .iter()
            .filter(move |line| line.start_index() < end && start < line.end_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::attributes::{AttributedText, TextAttributes};
    use crate::text::font::{Font, FontFamily};
    use crate::text::shaper::FixedPitchShaper;
    use crate::text::utf16::utf16_len;

    fn shaped(text: &str) -> ShapedText {
        let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
        ShapedText::new(&AttributedText::plain(text, attributes), &FixedPitchShaper::new())
    }

    #[test]
    fn empty_frame() {
        let frame = TextFrame::empty();
        assert_eq!(frame.line_count(), 0);
        assert_eq!(frame.layout_info().layout_bounds, Rect::ZERO);
        assert_eq!(frame.layout_info().text_scale_factor, 1.0);
        assert_eq!(frame.truncated_text().len_utf16(), 0);
        assert_eq!(frame.display_scale(), None);
    }

    #[test]
    fn range_is_clamped() {
        let text = shaped("Hello");
        let frame = TextFrame::with_range(
            &text,
            Some(3..99),
            Size::new(100.0, 100.0),
            1.0,
            &TextFrameOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(frame.range_in_original(), 3..5);
        assert_eq!(frame.truncated_text().text(), "lo");
    }

    #[test]
    fn range_inside_a_cluster_is_widened() {
        let text = shaped("a\u{1F600}bcd");
        let frame = TextFrame::with_range(
            &text,
            Some(2..5),
            Size::new(100.0, 100.0),
            1.0,
            &TextFrameOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(frame.range_in_original(), 1..5);
        let truncated = frame.truncated_text();
        assert_eq!(truncated.text(), "\u{1F600}bc");
        assert_eq!(utf16_len(truncated.text()), truncated.len_utf16());
        for offset in 0..=truncated.len_utf16() {
            let index = frame.index_for_truncated(offset);
            assert_eq!(frame.truncated_offset_for_index(index), offset);
        }
    }

    #[test]
    fn degenerate_size_has_no_lines() {
        let text = shaped("Hello");
        for size in [Size::new(0.0, 10.0), Size::new(10.0, -1.0), Size::new(f32::NAN, 10.0)] {
            let frame = TextFrame::new(&text, size, 1.0, &TextFrameOptions::default());
            assert_eq!(frame.line_count(), 0);
            assert_eq!(frame.layout_info().layout_bounds, Rect::ZERO);
        }
    }

    #[test]
    fn invalid_display_scale_is_unspecified() {
        let text = shaped("Hello");
        for scale in [0.0, -2.0, f32::INFINITY, f32::NAN] {
            let frame = TextFrame::new(&text, Size::new(100.0, 20.0), scale, &TextFrameOptions::default());
            assert_eq!(frame.display_scale(), None);
            assert_eq!(frame.layout_info().display_scale, 0.0);
        }
    }

    #[test]
    fn truncated_text_spans_follow_tokens() {
        let text = shaped("abcdefghijklmnopqrstuvwxyz");
        let options = TextFrameOptions::new().max_line_count(1);
        let frame = TextFrame::new(&text, Size::new(50.0, 20.0), 1.0, &options);
        let truncated = frame.truncated_text();
        assert_eq!(truncated.text(), "abcdefghi\u{2026}");
        assert_eq!(truncated.spans().len(), 2);
        assert_eq!(truncated.spans()[1].range, 9..10);
        assert_eq!(frame.truncation_tokens()[0].truncated_range(), 9..10);
        assert_eq!(frame.truncation_tokens()[0].line_index(), 0);
    }
}
