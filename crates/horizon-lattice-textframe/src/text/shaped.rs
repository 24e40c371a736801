//! Immutable shaped text, the input of the layout engine.
//!
//! [`ShapedText`] splits an [`AttributedText`] into paragraphs and runs of
//! uniform attributes and embedding level, shapes every run once and records
//! per-grapheme-cluster advances. Line breaking, truncation and scaling only
//! rearrange and measure these clusters; no glyph is shaped again.
//!
//! All positions are UTF-16 offsets into the attributed text.

use std::ops::Range;
use std::sync::Arc;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::attributes::{AttributeSpan, AttributedText, ParagraphStyle, TextAttributes, TextFlags};
use super::bidi::{WritingDirection, paragraph_levels};
use super::font::LineMetrics;
use super::line_break::{BreakOpportunity, find_break_opportunities};
use super::shaper::{FixedPitchShaper, GlyphShaper, ShapedGlyph, is_line_terminator};
use super::utf16::{Utf16Index, utf16_len};
use crate::logging::targets;

/// Text of the default truncation token.
pub const DEFAULT_TRUNCATION_TOKEN: &str = "\u{2026}";

/// One grapheme cluster with its share of the shaped advance.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cluster {
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// Advance at a text scale of 1.
    pub(crate) advance: f32,
    pub(crate) is_whitespace: bool,
    pub(crate) is_terminator: bool,
    /// `(part, count)` when the cluster is one of `count` clusters sharing a
    /// ligature glyph.
    pub(crate) ligature: Option<(u16, u16)>,
    /// Glyphs drawn for this cluster. A ligature glyph belongs to part 0.
    pub(crate) glyphs: Range<usize>,
}

/// A maximal range of one paragraph with uniform attributes and level.
#[derive(Debug, Clone)]
pub(crate) struct Run {
    pub(crate) range: Range<usize>,
    pub(crate) clusters: Range<usize>,
    /// Index of the attribute span.
    pub(crate) span: usize,
    pub(crate) level: u8,
    pub(crate) metrics: LineMetrics,
}

#[derive(Debug, Clone)]
pub(crate) struct Paragraph {
    /// Range including the terminator.
    pub(crate) range: Range<usize>,
    /// End of the content, excluding the terminator.
    pub(crate) content_end: usize,
    pub(crate) style: ParagraphStyle,
    pub(crate) direction: WritingDirection,
}

/// Shape `text` into clusters and glyphs appended to the given vectors.
///
/// `base` is the UTF-16 offset of `text` in its owner. Returns the run metrics.
fn shape_clusters(
    text: &str,
    base: usize,
    attributes: &TextAttributes,
    direction: WritingDirection,
    shaper: &dyn GlyphShaper,
    clusters: &mut Vec<Cluster>,
    glyphs: &mut Vec<ShapedGlyph>,
) -> LineMetrics {
    let graphemes: Vec<(usize, &str)> = text.grapheme_indices(true).collect();
    let first_cluster = clusters.len();
    let mut offset = base;
    for &(_, grapheme) in &graphemes {
        let len = utf16_len(grapheme);
        let is_terminator = grapheme.chars().all(is_line_terminator);
        clusters.push(Cluster {
            start: offset,
            end: offset + len,
            advance: 0.0,
            is_whitespace: !is_terminator && grapheme.chars().all(char::is_whitespace),
            is_terminator,
            ligature: None,
            glyphs: glyphs.len()..glyphs.len(),
        });
        offset += len;
    }
    let local = &mut clusters[first_cluster..];

    if let Some(attachment) = attributes.attachment {
        if let Some(first) = local.first_mut() {
            first.advance = attachment.width;
        }
        return LineMetrics {
            ascent: attachment.ascent,
            descent: attachment.descent,
            leading: 0.0,
            ..LineMetrics::approximate(attributes.font.size())
        };
    }

    let fragment = shaper.shape(text, &attributes.font, direction);
    let grapheme_of = |byte: usize| graphemes.partition_point(|&(start, _)| start <= byte).saturating_sub(1);

    for glyph in fragment.glyphs {
        if local.is_empty() {
            break;
        }
        let first = grapheme_of(glyph.cluster_start).min(local.len() - 1);
        let covered = graphemes[first..]
            .iter()
            .take_while(|&&(start, _)| start < glyph.cluster_end.max(glyph.cluster_start + 1))
            .count()
            .max(1);
        let glyph_index = glyphs.len();
        glyphs.push(glyph);

        let owner = &mut local[first];
        if owner.glyphs.is_empty() {
            owner.glyphs = glyph_index..glyph_index + 1;
        } else {
            owner.glyphs.end = glyph_index + 1;
        }
        if covered == 1 {
            owner.advance += glyph.advance;
        } else {
            let share = glyph.advance / covered as f32;
            for (part, cluster) in local[first..first + covered].iter_mut().enumerate() {
                cluster.advance += share;
                cluster.ligature = Some((part as u16, covered as u16));
            }
        }
    }
    // Clusters without glyphs still need a valid, ordered glyph range.
    let mut cursor = local.first().map_or(0, |c| c.glyphs.start);
    for cluster in local.iter_mut() {
        if cluster.glyphs.is_empty() {
            cluster.glyphs = cursor..cursor;
        } else {
            cursor = cluster.glyphs.end;
        }
    }
    fragment.metrics
}

/// A pre-shaped string substituted for elided text.
///
/// # Example
///
/// ```
/// use horizon_lattice_textframe::text::{
///     FixedPitchShaper, Font, FontFamily, ShapedToken, TextAttributes,
/// };
///
/// let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
/// let token = ShapedToken::new(" [more]", attributes, &FixedPitchShaper::new());
/// assert_eq!(token.len_utf16(), 7);
/// assert_eq!(token.width(), 35.0);
/// ```
#[derive(Debug, Clone)]
pub struct ShapedToken {
    text: String,
    len_utf16: usize,
    pub(crate) clusters: Vec<Cluster>,
    pub(crate) glyphs: Vec<ShapedGlyph>,
    pub(crate) attributes: Arc<TextAttributes>,
    pub(crate) metrics: LineMetrics,
    width: f32,
}

impl ShapedToken {
    /// Shape a token. An empty `text` is replaced by the default ellipsis.
    pub fn new(text: &str, attributes: TextAttributes, shaper: &dyn GlyphShaper) -> Self {
        let text = if text.is_empty() {
            DEFAULT_TRUNCATION_TOKEN
        } else {
            text
        };
        let attributes = attributes.for_truncation_token();
        let direction = super::bidi::detect_base_direction(text).unwrap_or_default();
        let mut clusters = Vec::new();
        let mut glyphs = Vec::new();
        let metrics = shape_clusters(
            text,
            0,
            &attributes,
            direction,
            shaper,
            &mut clusters,
            &mut glyphs,
        );
        let width = clusters.iter().map(|c| c.advance).sum();
        Self {
            text: text.to_string(),
            len_utf16: utf16_len(text),
            clusters,
            glyphs,
            attributes: Arc::new(attributes),
            metrics,
            width,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    /// Width at a text scale of 1.
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn attributes(&self) -> &TextAttributes {
        &self.attributes
    }
}

#[derive(Debug)]
struct ShapedTextData {
    text: String,
    index: Utf16Index,
    spans: Vec<AttributeSpan>,
    paragraphs: Vec<Paragraph>,
    runs: Vec<Run>,
    clusters: Vec<Cluster>,
    glyphs: Vec<ShapedGlyph>,
    breaks: Vec<BreakOpportunity>,
    flags: TextFlags,
    /// Default truncation token for each attribute span.
    span_tokens: Vec<Arc<ShapedToken>>,
}

/// Shaped, immutable text shared by every frame laid out from it.
///
/// Cloning is cheap; clones share the shaped data.
///
/// # Example
///
/// ```
/// use horizon_lattice_textframe::text::{
///     AttributedText, FixedPitchShaper, Font, FontFamily, ShapedText, TextAttributes,
/// };
///
/// let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
/// let text = AttributedText::plain("Hello\nWorld", attributes);
/// let shaped = ShapedText::new(&text, &FixedPitchShaper::new());
/// assert_eq!(shaped.len_utf16(), 11);
/// assert_eq!(shaped.paragraph_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ShapedText {
    inner: Arc<ShapedTextData>,
}

impl ShapedText {
    /// Shape `text` with `shaper`.
    pub fn new(text: &AttributedText, shaper: &dyn GlyphShaper) -> Self {
        let source = text.text();
        let index = Utf16Index::new(source);
        let mut paragraphs = Vec::new();
        let mut runs = Vec::new();
        let mut clusters = Vec::new();
        let mut glyphs = Vec::new();

        for (byte_range, content_end_byte) in paragraph_byte_ranges(source) {
            let range = index.to_utf16(byte_range.start)..index.to_utf16(byte_range.end);
            let style = text.paragraph_style_at(range.start);
            let paragraph_text = &source[byte_range.clone()];
            let (direction, levels) = paragraph_levels(paragraph_text, style.base_direction);

            let mut run_start = byte_range.start;
            let mut current: Option<(usize, u8)> = None;
            for (relative, c) in paragraph_text.char_indices() {
                let byte = byte_range.start + relative;
                let span = text.span_index_at(index.to_utf16(byte)).unwrap_or(0);
                let level = if is_line_terminator(c) {
                    direction.level()
                } else {
                    levels.get(relative).copied().unwrap_or(direction.level())
                };
                match current {
                    Some(key) if key == (span, level) => {}
                    Some((span_key, level_key)) => {
                        runs.push(shape_run(
                            source,
                            &index,
                            run_start..byte,
                            text.spans(),
                            span_key,
                            level_key,
                            shaper,
                            &mut clusters,
                            &mut glyphs,
                        ));
                        run_start = byte;
                        current = Some((span, level));
                    }
                    None => current = Some((span, level)),
                }
            }
            if let Some((span, level)) = current {
                runs.push(shape_run(
                    source,
                    &index,
                    run_start..byte_range.end,
                    text.spans(),
                    span,
                    level,
                    shaper,
                    &mut clusters,
                    &mut glyphs,
                ));
            }

            paragraphs.push(Paragraph {
                range,
                content_end: index.to_utf16(content_end_byte),
                style,
                direction,
            });
        }

        let flags = text
            .spans()
            .iter()
            .fold(TextFlags::empty(), |acc, span| acc | span.attributes.flags());
        let span_tokens = text
            .spans()
            .iter()
            .map(|span| {
                Arc::new(ShapedToken::new(
                    DEFAULT_TRUNCATION_TOKEN,
                    span.attributes.as_ref().clone(),
                    shaper,
                ))
            })
            .collect();

        debug!(
            target: targets::SHAPING,
            paragraphs = paragraphs.len(),
            runs = runs.len(),
            clusters = clusters.len(),
            "shaped text"
        );

        Self {
            inner: Arc::new(ShapedTextData {
                breaks: find_break_opportunities(source, &index),
                text: source.to_string(),
                index,
                spans: text.spans().to_vec(),
                paragraphs,
                runs,
                clusters,
                glyphs,
                flags,
                span_tokens,
            }),
        }
    }

    /// Shaped text without any content.
    pub fn empty() -> Self {
        Self::new(&AttributedText::new(), &FixedPitchShaper::new())
    }

    /// The source string.
    pub fn text(&self) -> &str {
        &self.inner.text
    }

    pub fn len_utf16(&self) -> usize {
        self.inner.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.text.is_empty()
    }

    pub fn paragraph_count(&self) -> usize {
        self.inner.paragraphs.len()
    }

    /// Flags of all attributes in the text.
    pub fn flags(&self) -> TextFlags {
        self.inner.flags
    }

    /// Attribute spans of the source text.
    pub fn spans(&self) -> &[AttributeSpan] {
        &self.inner.spans
    }

    /// Substring for a UTF-16 range.
    pub fn substring(&self, range: Range<usize>) -> &str {
        let bytes = self.inner.index.byte_range(range);
        &self.inner.text[bytes]
    }

    /// Attributes at a UTF-16 offset, or `None` for empty text.
    pub fn attributes_at(&self, offset: usize) -> Option<&TextAttributes> {
        let spans = &self.inner.spans;
        if spans.is_empty() {
            return None;
        }
        let i = spans.partition_point(|s| s.range.end <= offset).min(spans.len() - 1);
        Some(&spans[i].attributes)
    }

    pub(crate) fn paragraphs(&self) -> &[Paragraph] {
        &self.inner.paragraphs
    }

    pub(crate) fn runs(&self) -> &[Run] {
        &self.inner.runs
    }

    pub(crate) fn clusters(&self) -> &[Cluster] {
        &self.inner.clusters
    }

    pub(crate) fn glyphs(&self) -> &[ShapedGlyph] {
        &self.inner.glyphs
    }

    pub(crate) fn breaks(&self) -> &[BreakOpportunity] {
        &self.inner.breaks
    }

    pub(crate) fn span_attributes(&self, span: usize) -> &Arc<TextAttributes> {
        &self.inner.spans[span].attributes
    }

    pub(crate) fn default_token(&self, span: usize) -> &Arc<ShapedToken> {
        &self.inner.span_tokens[span]
    }

    /// Index of the first cluster starting at or after `offset`.
    pub(crate) fn cluster_at_or_after(&self, offset: usize) -> usize {
        self.inner.clusters.partition_point(|c| c.start < offset)
    }

    /// Widen `range` to grapheme cluster boundaries.
    ///
    /// The start moves back to the start of the cluster containing it and a
    /// non-empty range's end moves forward to the end of its last cluster.
    pub(crate) fn snap_to_clusters(&self, range: Range<usize>) -> Range<usize> {
        let clusters = &self.inner.clusters;
        let start = clusters
            .get(clusters.partition_point(|c| c.end <= range.start))
            .map_or(range.start, |c| c.start.min(range.start));
        if range.end <= range.start {
            return start..start;
        }
        let end = match clusters.get(clusters.partition_point(|c| c.end < range.end)) {
            Some(c) if c.start < range.end => c.end,
            _ => range.end,
        };
        start..end
    }

    /// Index of the run containing `offset`, clamped to the last run.
    pub(crate) fn run_at(&self, offset: usize) -> usize {
        let runs = &self.inner.runs;
        runs.partition_point(|r| r.range.end <= offset)
            .min(runs.len().saturating_sub(1))
    }
}

#[allow(clippy::too_many_arguments)]
fn shape_run(
    source: &str,
    index: &Utf16Index,
    bytes: Range<usize>,
    spans: &[AttributeSpan],
    span: usize,
    level: u8,
    shaper: &dyn GlyphShaper,
    clusters: &mut Vec<Cluster>,
    glyphs: &mut Vec<ShapedGlyph>,
) -> Run {
    let range = index.to_utf16(bytes.start)..index.to_utf16(bytes.end);
    let first_cluster = clusters.len();
    let metrics = shape_clusters(
        &source[bytes],
        range.start,
        &spans[span].attributes,
        WritingDirection::from_level(level),
        shaper,
        clusters,
        glyphs,
    );
    Run {
        range,
        clusters: first_cluster..clusters.len(),
        span,
        level,
        metrics,
    }
}

/// Byte ranges of the paragraphs of `text`, each with the end of its content.
///
/// A paragraph includes its terminator; `"\r\n"` is one terminator. Text
/// ending in a terminator has no trailing empty paragraph.
fn paragraph_byte_ranges(text: &str) -> Vec<(Range<usize>, usize)> {
    let mut paragraphs = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((byte, c)) = chars.next() {
        if !matches!(c, '\n' | '\r' | '\u{85}' | '\u{2029}') {
            continue;
        }
        let mut end = byte + c.len_utf8();
        if c == '\r' {
            if let Some(&(next, '\n')) = chars.peek() {
                end = next + 1;
                chars.next();
            }
        }
        paragraphs.push((start..end, byte));
        start = end;
    }
    if start < text.len() {
        paragraphs.push((start..text.len(), text.len()));
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::attributes::TextAttachment;
    use crate::text::font::{Font, FontFamily};
    use crate::text::shaper::FixedPitchShaper;

    fn attrs() -> TextAttributes {
        TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0))
    }

    fn shape(text: &AttributedText) -> ShapedText {
        ShapedText::new(text, &FixedPitchShaper::new().ligature("fi"))
    }

    #[test]
    fn paragraph_splitting() {
        assert_eq!(
            paragraph_byte_ranges("a\r\nb\nc"),
            vec![(0..3, 1), (3..5, 4), (5..6, 6)]
        );
        assert_eq!(paragraph_byte_ranges("a\n"), vec![(0..2, 1)]);
        assert!(paragraph_byte_ranges("").is_empty());
    }

    #[test]
    fn runs_split_on_attributes_and_levels() {
        let text = AttributedText::new()
            .push("ab ", attrs())
            .push("cd אב", attrs().with_underline(Default::default()));
        let shaped = shape(&text);
        let runs = shaped.runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].range, 0..3);
        assert_eq!(runs[1].range, 3..6);
        assert_eq!(runs[2].range, 6..8);
        assert_eq!(runs[2].level, 1);
        assert!(shaped.flags().contains(TextFlags::HAS_UNDERLINE));
    }

    #[test]
    fn clusters_cover_text() {
        let shaped = shape(&AttributedText::plain("a b\nc", attrs()));
        let clusters = shaped.clusters();
        assert_eq!(clusters.len(), 5);
        assert!(clusters[1].is_whitespace);
        assert!(clusters[3].is_terminator);
        assert_eq!(clusters[3].advance, 0.0);
        assert_eq!(shaped.paragraphs()[0].content_end, 3);
        assert_eq!(shaped.paragraphs()[1].range, 4..5);
        for pair in clusters.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn ligature_advance_is_divided() {
        let shaped = shape(&AttributedText::plain("fit", attrs()));
        let clusters = shaped.clusters();
        assert_eq!(clusters[0].ligature, Some((0, 2)));
        assert_eq!(clusters[1].ligature, Some((1, 2)));
        assert_eq!(clusters[0].advance, 5.0);
        assert_eq!(clusters[0].glyphs, 0..1);
        assert!(clusters[1].glyphs.is_empty());
        assert_eq!(clusters[2].ligature, None);
    }

    #[test]
    fn attachments_use_their_own_metrics() {
        let attachment = TextAttachment {
            id: 7,
            width: 30.0,
            ascent: 20.0,
            descent: 4.0,
        };
        let text = AttributedText::new()
            .push("a", attrs())
            .push("\u{FFFC}", attrs().with_attachment(attachment));
        let shaped = shape(&text);
        assert_eq!(shaped.clusters()[1].advance, 30.0);
        assert_eq!(shaped.runs()[1].metrics.ascent, 20.0);
    }

    #[test]
    fn default_tokens_per_span() {
        let shaped = shape(&AttributedText::plain("abc", attrs().with_link("x")));
        let token = shaped.default_token(0);
        assert_eq!(token.text(), DEFAULT_TRUNCATION_TOKEN);
        assert_eq!(token.width(), 5.0);
        assert!(token.attributes().link.is_some());
    }

    #[test]
    fn ranges_snap_to_grapheme_clusters() {
        let text = ShapedText::new(
            &AttributedText::plain("a\u{1F600}be\u{301}c", attrs()),
            &FixedPitchShaper::new(),
        );
        assert_eq!(text.snap_to_clusters(2..5), 1..6);
        assert_eq!(text.snap_to_clusters(1..3), 1..3);
        assert_eq!(text.snap_to_clusters(5..6), 4..6);
        assert_eq!(text.snap_to_clusters(2..2), 1..1);
        assert_eq!(text.snap_to_clusters(7..7), 7..7);
    }

    #[test]
    fn attribute_lookup_and_substring() {
        let text = AttributedText::new()
            .push("ab", attrs())
            .push("cd", attrs().with_link("l"));
        let shaped = shape(&text);
        assert!(shaped.attributes_at(1).unwrap().link.is_none());
        assert!(shaped.attributes_at(2).unwrap().link.is_some());
        assert_eq!(shaped.substring(1..3), "bc");
        assert_eq!(shaped.run_at(3), 1);
        assert_eq!(shaped.cluster_at_or_after(2), 2);
    }
}
