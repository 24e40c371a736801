//! Glyph shaping backends.
//!
//! The layout engine never shapes text itself. [`ShapedText`](super::ShapedText)
//! asks a [`GlyphShaper`] to shape each run once, in logical order, and keeps
//! the resulting glyphs and metrics. Two shapers are provided:
//!
//! - [`CosmicShaper`] shapes with real fonts through `cosmic-text`;
//! - [`FixedPitchShaper`] gives every grapheme cluster the same advance and
//!   needs no fonts, which makes layouts reproducible in tests and headless
//!   tools.

use std::collections::HashMap;
use std::ops::Range;

use cosmic_text::{Buffer, Metrics, Shaping, Wrap};
use fontdb::ID as FontFaceId;
use parking_lot::{Mutex, MutexGuard};
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use super::bidi::WritingDirection;
use super::font::{Font, FontMetrics, LineMetrics};
use super::font_system::FontSystem;
use crate::logging::targets;

/// A glyph produced by a shaper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    /// Face the glyph belongs to, if the shaper uses real fonts.
    pub font_id: Option<FontFaceId>,
    /// Start of the byte range of the shaped text this glyph represents.
    pub cluster_start: usize,
    /// End of the byte range of the shaped text this glyph represents.
    pub cluster_end: usize,
    pub advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// Output of shaping one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapedFragment {
    /// Glyphs in logical order.
    pub glyphs: Vec<ShapedGlyph>,
    /// Resolved metrics of the run's font.
    pub metrics: LineMetrics,
}

/// Shapes a run of text with uniform font and direction.
///
/// Implementations must return glyphs in logical order with cluster ranges
/// relative to `text`. Characters not covered by any glyph get a zero
/// advance. `direction` is the resolved direction of the run; neutral
/// characters are shaped in it.
pub trait GlyphShaper {
    fn shape(&self, text: &str, font: &Font, direction: WritingDirection) -> ShapedFragment;
}

/// Whether `c` ends a paragraph or line.
pub(crate) fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// A deterministic shaper with one glyph per grapheme cluster.
///
/// Every cluster advances by `advance_ratio * font size`; line terminators
/// advance by zero. Registered ligature sequences become a single glyph
/// spanning several clusters.
///
/// # Example
///
/// ```
/// use horizon_lattice_textframe::text::{
///     Font, FontFamily, FixedPitchShaper, GlyphShaper, WritingDirection,
/// };
///
/// let shaper = FixedPitchShaper::new().ligature("fi");
/// let font = Font::new(FontFamily::Monospace, 10.0);
/// let fragment = shaper.shape("fin", &font, WritingDirection::LeftToRight);
/// assert_eq!(fragment.glyphs.len(), 2);
/// assert_eq!(fragment.glyphs[0].advance, 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct FixedPitchShaper {
    advance_ratio: f32,
    ligatures: Vec<String>,
}

impl Default for FixedPitchShaper {
    fn default() -> Self {
        Self {
            advance_ratio: 0.5,
            ligatures: Vec::new(),
        }
    }
}

impl FixedPitchShaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the advance of one cluster as a fraction of the font size.
    pub fn advance_ratio(mut self, ratio: f32) -> Self {
        self.advance_ratio = ratio;
        self
    }

    /// Register a ligature sequence.
    pub fn ligature(mut self, sequence: impl Into<String>) -> Self {
        self.ligatures.push(sequence.into());
        self
    }
}

impl GlyphShaper for FixedPitchShaper {
    fn shape(&self, text: &str, font: &Font, _direction: WritingDirection) -> ShapedFragment {
        let advance = font.size() * self.advance_ratio;
        let graphemes: Vec<(usize, &str)> = text.grapheme_indices(true).collect();
        let mut glyphs = Vec::with_capacity(graphemes.len());

        let mut i = 0;
        while i < graphemes.len() {
            let (start, grapheme) = graphemes[i];
            let ligature = self.ligatures.iter().find_map(|seq| {
                let count = seq.graphemes(true).count();
                (count > 1 && text[start..].starts_with(seq.as_str())).then_some((seq.len(), count))
            });
            let (len, count) = ligature.unwrap_or((grapheme.len(), 1));
            let first = grapheme.chars().next().unwrap_or(' ');
            let clusters_advance = if count == 1 && grapheme.chars().all(is_line_terminator) {
                0.0
            } else {
                advance * count as f32
            };
            glyphs.push(ShapedGlyph {
                glyph_id: (first as u32 & 0xFFFF) as u16,
                font_id: None,
                cluster_start: start,
                cluster_end: start + len,
                advance: clusters_advance,
                x_offset: 0.0,
                y_offset: 0.0,
            });
            i += count;
        }

        ShapedFragment {
            glyphs,
            metrics: LineMetrics::approximate(font.size()),
        }
    }
}

/// Shapes with real fonts through `cosmic-text`.
///
/// The font system is kept behind a mutex that is held for one shaping call.
/// cosmic-text resolves the direction of each piece itself, so every piece
/// is prefixed with a directional mark for the requested direction. Neutral
/// characters in a right-to-left run then shape right-to-left with mirrored
/// brackets.
pub struct CosmicShaper {
    font_system: Mutex<FontSystem>,
    metrics: Mutex<HashMap<FontFaceId, Option<FontMetrics>>>,
}

impl CosmicShaper {
    pub fn new(font_system: FontSystem) -> Self {
        Self {
            font_system: Mutex::new(font_system),
            metrics: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the font system, for example to load additional fonts.
    pub fn font_system(&self) -> MutexGuard<'_, FontSystem> {
        self.font_system.lock()
    }

    fn face_metrics(&self, font_system: &FontSystem, face: FontFaceId) -> Option<FontMetrics> {
        *self
            .metrics
            .lock()
            .entry(face)
            .or_insert_with(|| font_system.face_metrics(face))
    }

    /// Shape one piece of text that contains no line terminators.
    #[allow(clippy::too_many_arguments)]
    fn shape_piece(
        &self,
        font_system: &mut FontSystem,
        text: &str,
        font: &Font,
        direction: WritingDirection,
        offset: usize,
        glyphs: &mut Vec<ShapedGlyph>,
        first_face: &mut Option<FontFaceId>,
    ) {
        let size = font.size();
        let mut buffer = Buffer::new(font_system.inner_mut(), Metrics::new(size, size * 1.2));
        buffer.set_wrap(font_system.inner_mut(), Wrap::None);
        buffer.set_size(font_system.inner_mut(), None, None);
        let mark = direction_mark(direction);
        let marked = format!("{mark}{text}");
        buffer.set_text(font_system.inner_mut(), &marked, font.to_attrs(), Shaping::Advanced);
        buffer.shape_until_scroll(font_system.inner_mut(), false);

        let first = glyphs.len();
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                let Some(cluster) = unmarked_cluster(glyph.start..glyph.end, mark.len_utf8()) else {
                    continue;
                };
                first_face.get_or_insert(glyph.font_id);
                glyphs.push(ShapedGlyph {
                    glyph_id: glyph.glyph_id,
                    font_id: Some(glyph.font_id),
                    cluster_start: offset + cluster.start,
                    cluster_end: offset + cluster.end,
                    advance: glyph.w,
                    x_offset: glyph.x_offset,
                    y_offset: glyph.y_offset,
                });
            }
        }
        // Right-to-left runs come out in visual order.
        glyphs[first..].sort_by_key(|g| g.cluster_start);
    }
}

impl GlyphShaper for CosmicShaper {
    fn shape(&self, text: &str, font: &Font, direction: WritingDirection) -> ShapedFragment {
        if font.size() <= 0.0 || !font.size().is_finite() {
            return ShapedFragment::default();
        }
        let mut font_system = self.font_system.lock();
        let mut glyphs = Vec::new();
        let mut first_face = None;

        let mut piece_start = 0;
        for (byte, c) in text.char_indices() {
            if is_line_terminator(c) {
                if piece_start < byte {
                    self.shape_piece(
                        &mut font_system,
                        &text[piece_start..byte],
                        font,
                        direction,
                        piece_start,
                        &mut glyphs,
                        &mut first_face,
                    );
                }
                piece_start = byte + c.len_utf8();
            }
        }
        if piece_start < text.len() {
            self.shape_piece(
                &mut font_system,
                &text[piece_start..],
                font,
                direction,
                piece_start,
                &mut glyphs,
                &mut first_face,
            );
        }

        let metrics = first_face
            .and_then(|face| self.face_metrics(&font_system, face))
            .map(|m| m.scaled(font.size()))
            .unwrap_or_else(|| LineMetrics::approximate(font.size()));

        trace!(
            target: targets::SHAPING,
            glyphs = glyphs.len(),
            rtl = direction.is_rtl(),
            "shaped run"
        );

        ShapedFragment { glyphs, metrics }
    }
}

/// Zero-width mark that makes cosmic-text resolve a piece in `direction`.
fn direction_mark(direction: WritingDirection) -> char {
    match direction {
        WritingDirection::LeftToRight => '\u{200E}',
        WritingDirection::RightToLeft => '\u{200F}',
    }
}

/// Byte range of a glyph in the unmarked piece.
///
/// Returns `None` for a glyph of the leading mark alone.
fn unmarked_cluster(marked: Range<usize>, mark_len: usize) -> Option<Range<usize>> {
    (marked.end > mark_len).then(|| marked.start.saturating_sub(mark_len)..marked.end - mark_len)
}

impl std::fmt::Debug for CosmicShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmicShaper").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::FontFamily;

    fn font() -> Font {
        Font::new(FontFamily::Monospace, 10.0)
    }

    #[test]
    fn fixed_pitch_one_glyph_per_grapheme() {
        let shaped = FixedPitchShaper::new().shape("ae\u{301}\n", &font(), WritingDirection::LeftToRight);
        assert_eq!(shaped.glyphs.len(), 3);
        assert_eq!(shaped.glyphs[0].advance, 5.0);
        assert_eq!(shaped.glyphs[1].cluster_start, 1);
        assert_eq!(shaped.glyphs[1].cluster_end, 4);
        assert_eq!(shaped.glyphs[2].advance, 0.0);
        assert_eq!(shaped.metrics.ascent, 8.0);
        assert_eq!(shaped.metrics.descent, 2.0);
    }

    #[test]
    fn direction_marks_are_stripped_from_clusters() {
        assert_eq!(direction_mark(WritingDirection::RightToLeft), '\u{200F}');
        assert_eq!(direction_mark(WritingDirection::LeftToRight).len_utf8(), 3);
        assert_eq!(unmarked_cluster(0..3, 3), None);
        assert_eq!(unmarked_cluster(3..4, 3), Some(0..1));
        assert_eq!(unmarked_cluster(0..5, 3), Some(0..2));
    }

    #[test]
    #[ignore = "requires system fonts"]
    fn cosmic_shaper_honours_rtl_direction() {
        let shaper = CosmicShaper::new(FontSystem::new());
        let shaped = shaper.shape("(1)", &font(), WritingDirection::RightToLeft);
        assert!(!shaped.glyphs.is_empty());
        assert_eq!(shaped.glyphs[0].cluster_start, 0);
        assert!(shaped.glyphs.iter().all(|g| g.cluster_end <= 3));
    }

    #[test]
    fn fixed_pitch_ligature() {
        let shaper = FixedPitchShaper::new().ligature("ffi");
        let shaped = shaper.shape("offic", &font(), WritingDirection::LeftToRight);
        assert_eq!(shaped.glyphs.len(), 3);
        assert_eq!(shaped.glyphs[1].cluster_start, 1);
        assert_eq!(shaped.glyphs[1].cluster_end, 4);
        assert_eq!(shaped.glyphs[1].advance, 15.0);
    }
}
