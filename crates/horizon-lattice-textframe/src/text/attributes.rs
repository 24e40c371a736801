//! Attributed text: a string plus per-range attributes and paragraph styles.
//!
//! Attribute spans are contiguous and cover the whole text; appending text
//! with [`AttributedText::push`] adds one span. Paragraph styles apply to the
//! paragraphs whose first unit lies in their range.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_textframe::Color;
//! use horizon_lattice_textframe::text::{AttributedText, Font, FontFamily, TextAttributes};
//!
//! let body = TextAttributes::new(Font::new(FontFamily::SansSerif, 14.0));
//! let link = body.clone().with_link("https://example.com").with_color(Color::BLUE);
//!
//! let text = AttributedText::new()
//!     .push("Read the ", body.clone())
//!     .push("manual", link)
//!     .push(".", body);
//! assert_eq!(text.len_utf16(), 16);
//! assert_eq!(text.spans().len(), 3);
//! ```

use std::ops::Range;
use std::sync::Arc;

use bitflags::bitflags;

use super::bidi::WritingDirection;
use super::font::Font;
use super::options::TruncationMode;
use super::utf16::utf16_len;
use crate::types::Color;

bitflags! {
    /// Summary of the attributes present in a piece of text.
    ///
    /// Lets drawing and ink-bounds computations skip work for features that
    /// do not occur.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextFlags: u16 {
        const HAS_LINK = 1 << 0;
        const HAS_BACKGROUND = 1 << 1;
        const HAS_SHADOW = 1 << 2;
        const HAS_UNDERLINE = 1 << 3;
        const HAS_STRIKETHROUGH = 1 << 4;
        const HAS_STROKE = 1 << 5;
        const HAS_ATTACHMENT = 1 << 6;
        const HAS_BASELINE_OFFSET = 1 << 7;
        /// Some color is not a shade of gray.
        const MAY_NOT_BE_GRAYSCALE = 1 << 8;
        /// Some color lies outside the standard range.
        const USES_EXTENDED_COLOR = 1 << 9;
    }
}

/// Text decoration line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextDecorationStyle {
    #[default]
    Solid,
    Dotted,
    Dashed,
    Wavy,
}

/// An underline or strikethrough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDecoration {
    pub style: TextDecorationStyle,
    /// Decoration color; the text color when `None`.
    pub color: Option<Color>,
    /// Multiplier of the font's decoration thickness.
    pub thickness: f32,
}

impl Default for TextDecoration {
    fn default() -> Self {
        Self {
            style: TextDecorationStyle::Solid,
            color: None,
            thickness: 1.0,
        }
    }
}

impl TextDecoration {
    pub fn new(style: TextDecorationStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }
}

/// Glyph outline stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStroke {
    /// Stroke width in points at a text scale of 1.
    pub width: f32,
    /// Stroke color; the text color when `None`.
    pub color: Option<Color>,
}

/// A drop shadow under glyphs and decorations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextShadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur_radius: f32,
    pub color: Color,
}

/// An inline object occupying one grapheme cluster, usually U+FFFC.
///
/// Attachments are measured by their own dimensions instead of by shaping
/// and are handed to the drawing surface by `id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAttachment {
    pub id: u64,
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// Attributes of a range of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAttributes {
    pub font: Font,
    pub color: Color,
    pub background: Option<Color>,
    pub underline: Option<TextDecoration>,
    pub strikethrough: Option<TextDecoration>,
    pub stroke: Option<TextStroke>,
    pub shadow: Option<TextShadow>,
    /// Vertical offset of the glyphs from the baseline, positive upward.
    pub baseline_offset: f32,
    pub link: Option<Arc<str>>,
    pub attachment: Option<TextAttachment>,
}

impl TextAttributes {
    /// Plain black text in `font`.
    pub fn new(font: Font) -> Self {
        Self {
            font,
            color: Color::BLACK,
            background: None,
            underline: None,
            strikethrough: None,
            stroke: None,
            shadow: None,
            baseline_offset: 0.0,
            link: None,
            attachment: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_underline(mut self, decoration: TextDecoration) -> Self {
        self.underline = Some(decoration);
        self
    }

    pub fn with_strikethrough(mut self, decoration: TextDecoration) -> Self {
        self.strikethrough = Some(decoration);
        self
    }

    pub fn with_stroke(mut self, stroke: TextStroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_shadow(mut self, shadow: TextShadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn with_baseline_offset(mut self, offset: f32) -> Self {
        self.baseline_offset = offset;
        self
    }

    pub fn with_link(mut self, link: impl Into<Arc<str>>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_attachment(mut self, attachment: TextAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// The flags describing these attributes.
    pub fn flags(&self) -> TextFlags {
        let mut flags = TextFlags::empty();
        flags.set(TextFlags::HAS_LINK, self.link.is_some());
        flags.set(TextFlags::HAS_BACKGROUND, self.background.is_some());
        flags.set(TextFlags::HAS_SHADOW, self.shadow.is_some());
        flags.set(TextFlags::HAS_UNDERLINE, self.underline.is_some());
        flags.set(TextFlags::HAS_STRIKETHROUGH, self.strikethrough.is_some());
        flags.set(TextFlags::HAS_STROKE, self.stroke.is_some());
        flags.set(TextFlags::HAS_ATTACHMENT, self.attachment.is_some());
        flags.set(TextFlags::HAS_BASELINE_OFFSET, self.baseline_offset != 0.0);

        let colors = [
            Some(self.color),
            self.background,
            self.underline.and_then(|d| d.color),
            self.strikethrough.and_then(|d| d.color),
            self.stroke.and_then(|s| s.color),
            self.shadow.map(|s| s.color),
        ];
        for color in colors.into_iter().flatten() {
            if !color.is_grayscale() {
                flags |= TextFlags::MAY_NOT_BE_GRAYSCALE;
            }
            if color.is_extended_range() {
                flags |= TextFlags::USES_EXTENDED_COLOR;
            }
        }
        flags
    }

    /// Attributes suitable for a truncation token standing in for this text.
    pub(crate) fn for_truncation_token(&self) -> Self {
        Self {
            attachment: None,
            ..self.clone()
        }
    }
}

impl Default for TextAttributes {
    fn default() -> Self {
        Self::new(Font::default())
    }
}

/// Horizontal alignment of the lines of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlignment {
    /// Left for left-to-right paragraphs, right for right-to-left ones.
    #[default]
    Natural,
    Left,
    Right,
    Center,
}

/// Limits the number of lines of a single paragraph.
///
/// The last allowed line is truncated like the last line of a frame, with
/// the elided text limited to the paragraph. [`TruncationMode::Clip`] is
/// treated as [`TruncationMode::End`] here since interior text can only be
/// removed by substituting a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationScope {
    pub max_line_count: usize,
    pub mode: TruncationMode,
}

/// Paragraph-level layout attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParagraphStyle {
    pub alignment: TextAlignment,
    /// Base writing direction; detected from the first strong character when `None`.
    pub base_direction: Option<WritingDirection>,
    pub truncation_scope: Option<TruncationScope>,
}

impl ParagraphStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn base_direction(mut self, direction: WritingDirection) -> Self {
        self.base_direction = Some(direction);
        self
    }

    pub fn truncation_scope(mut self, max_line_count: usize, mode: TruncationMode) -> Self {
        self.truncation_scope = Some(TruncationScope {
            max_line_count,
            mode,
        });
        self
    }
}

/// A run of text sharing one set of attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpan {
    /// UTF-16 range in the attributed text.
    pub range: Range<usize>,
    pub attributes: Arc<TextAttributes>,
}

/// A string with attribute spans and paragraph styles.
#[derive(Debug, Clone, Default)]
pub struct AttributedText {
    text: String,
    len_utf16: usize,
    spans: Vec<AttributeSpan>,
    paragraph_styles: Vec<(Range<usize>, ParagraphStyle)>,
}

impl AttributedText {
    /// An empty attributed text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text with a single set of attributes.
    pub fn plain(text: impl Into<String>, attributes: TextAttributes) -> Self {
        Self::new().push(text, attributes)
    }

    /// Append text with the given attributes.
    pub fn push(mut self, text: impl Into<String>, attributes: TextAttributes) -> Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        let len = utf16_len(&text);
        let start = self.len_utf16;
        self.text.push_str(&text);
        self.len_utf16 += len;
        self.spans.push(AttributeSpan {
            range: start..start + len,
            attributes: Arc::new(attributes),
        });
        self
    }

    /// Apply a paragraph style to the paragraphs starting in `range`.
    ///
    /// Later styles take precedence over earlier ones.
    pub fn with_paragraph_style(mut self, range: Range<usize>, style: ParagraphStyle) -> Self {
        self.paragraph_styles.push((range, style));
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn spans(&self) -> &[AttributeSpan] {
        &self.spans
    }

    /// Index of the span containing UTF-16 offset `offset`.
    pub(crate) fn span_index_at(&self, offset: usize) -> Option<usize> {
        if self.spans.is_empty() {
            return None;
        }
        let i = self.spans.partition_point(|s| s.range.end <= offset);
        Some(i.min(self.spans.len() - 1))
    }

    /// The paragraph style for a paragraph starting at `offset`.
    pub fn paragraph_style_at(&self, offset: usize) -> ParagraphStyle {
        self.paragraph_styles
            .iter()
            .rev()
            .find(|(range, _)| range.contains(&offset) || range.start == offset)
            .map(|(_, style)| *style)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::FontFamily;

    fn attrs() -> TextAttributes {
        TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0))
    }

    #[test]
    fn spans_are_contiguous() {
        let text = AttributedText::new()
            .push("ab", attrs())
            .push("", attrs())
            .push("𝄞c", attrs().with_color(Color::RED));
        assert_eq!(text.len_utf16(), 5);
        assert_eq!(text.spans().len(), 2);
        assert_eq!(text.spans()[1].range, 2..5);
        assert_eq!(text.span_index_at(0), Some(0));
        assert_eq!(text.span_index_at(2), Some(1));
        assert_eq!(text.span_index_at(99), Some(1));
        assert_eq!(AttributedText::new().span_index_at(0), None);
    }

    #[test]
    fn attribute_flags() {
        assert_eq!(attrs().flags(), TextFlags::empty());
        let decorated = attrs()
            .with_link("x")
            .with_underline(TextDecoration::default())
            .with_color(Color::RED)
            .with_baseline_offset(2.0);
        let flags = decorated.flags();
        assert!(flags.contains(
            TextFlags::HAS_LINK
                | TextFlags::HAS_UNDERLINE
                | TextFlags::MAY_NOT_BE_GRAYSCALE
                | TextFlags::HAS_BASELINE_OFFSET
        ));
        assert!(!flags.contains(TextFlags::HAS_SHADOW));
        let extended = attrs().with_background(Color::new(1.5, 1.5, 1.5, 1.0));
        assert!(extended.flags().contains(TextFlags::USES_EXTENDED_COLOR));
    }

    #[test]
    fn stroke_and_strikethrough_flags() {
        let struck = attrs()
            .with_strikethrough(TextDecoration::new(TextDecorationStyle::Dashed).with_thickness(2.0))
            .with_stroke(TextStroke {
                width: 1.0,
                color: Some(Color::BLUE),
            });
        assert_eq!(struck.strikethrough.map(|d| d.thickness), Some(2.0));
        let flags = struck.flags();
        assert!(flags.contains(
            TextFlags::HAS_STRIKETHROUGH | TextFlags::HAS_STROKE | TextFlags::MAY_NOT_BE_GRAYSCALE
        ));
        assert!(!flags.contains(TextFlags::HAS_UNDERLINE));
    }

    #[test]
    fn paragraph_style_lookup() {
        let centered = ParagraphStyle::new().alignment(TextAlignment::Center);
        let text = AttributedText::plain("one\ntwo", attrs()).with_paragraph_style(4..7, centered);
        assert_eq!(text.paragraph_style_at(0).alignment, TextAlignment::Natural);
        assert_eq!(text.paragraph_style_at(4).alignment, TextAlignment::Center);
    }

    #[test]
    fn token_attributes_drop_attachment() {
        let a = attrs().with_attachment(TextAttachment {
            id: 1,
            width: 10.0,
            ascent: 8.0,
            descent: 2.0,
        });
        assert!(a.for_truncation_token().attachment.is_none());
    }
}
