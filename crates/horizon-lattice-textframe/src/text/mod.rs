//! Text frames: layout, truncation, index mapping, geometry and drawing.
//!
//! The pipeline has three stages:
//!
//! 1. Build an [`AttributedText`] from strings and [`TextAttributes`].
//! 2. Shape it once into a [`ShapedText`] with a [`GlyphShaper`]. The
//!    [`CosmicShaper`] uses real fonts through cosmic-text; the
//!    [`FixedPitchShaper`] gives every grapheme cluster the same advance.
//! 3. Lay the shaped text out in a [`TextFrame`] of a given size. A frame can
//!    be built many times from one shaped text, e.g. for different widths.
//!
//! # Getting Started
//!
//! ```
//! use horizon_lattice_textframe::{Point, Size};
//! use horizon_lattice_textframe::text::{
//!     AttributedText, FixedPitchShaper, Font, FontFamily, ShapedText, TextAttributes,
//!     TextFrame, TextFrameOptions,
//! };
//!
//! let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
//! let text = AttributedText::plain("Hello world again", attributes);
//! let shaped = ShapedText::new(&text, &FixedPitchShaper::new());
//!
//! let frame = TextFrame::new(&shaped, Size::new(40.0, 100.0), 2.0, &TextFrameOptions::default());
//! assert_eq!(frame.line_count(), 3);
//!
//! let rects = frame.rects_for_range(frame.full_range(), Point::ZERO, None);
//! assert_eq!(rects.len(), 3);
//! ```
//!
//! # Shaping With System Fonts
//!
//! ```no_run
//! use horizon_lattice_textframe::Size;
//! use horizon_lattice_textframe::text::{
//!     AttributedText, CosmicShaper, Font, FontFamily, FontSystem, ShapedText,
//!     TextAttributes, TextFrame, TextFrameOptions, TruncationMode,
//! };
//!
//! let shaper = CosmicShaper::new(FontSystem::new());
//! let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 14.0));
//! let text = AttributedText::plain("A long headline that will not fit", attributes);
//! let shaped = ShapedText::new(&text, &shaper);
//!
//! let options = TextFrameOptions::new()
//!     .max_line_count(1)
//!     .last_line_truncation_mode(TruncationMode::Middle);
//! let frame = TextFrame::new(&shaped, Size::new(120.0, 20.0), 2.0, &options);
//! println!("{}", frame.truncated_text().text());
//! ```

mod attributes;
mod bidi;
mod draw;
mod font;
mod font_system;
mod frame;
mod geometry;
mod index;
mod layout;
mod line_break;
mod options;
mod shaped;
mod shaper;
mod utf16;

pub use attributes::{
    AttributeSpan, AttributedText, ParagraphStyle, TextAlignment, TextAttachment,
    TextAttributes, TextDecoration, TextDecorationStyle, TextFlags, TextShadow, TextStroke,
    TruncationScope,
};
pub use bidi::{WritingDirection, detect_base_direction};
pub use draw::{DrawingMode, DrawingOptions, TextHighlightStyle};
pub use font::{Font, FontFamily, FontMetrics, FontStretch, FontStyle, FontWeight, LineMetrics};
pub use font_system::{FontLoadError, FontSystem, FontSystemConfig};
pub use frame::{
    ConsistentAlignment, LayoutFlags, LayoutInfo, TextFrame, TextFrameFlags, TextFrameLine,
    TruncatedText, TruncationToken,
};
pub use geometry::{GraphemeClusterInfo, TextLink, TextLinkArray, TextRectArray};
pub use index::{TextFrameIndex, TextFrameRange, TextRange, TokenPosition};
pub use line_break::{BreakOpportunity, BreakType};
pub use options::{LineBreakMode, TextFrameOptions, TruncationMode};
pub use shaped::{DEFAULT_TRUNCATION_TOKEN, ShapedText, ShapedToken};
pub use shaper::{CosmicShaper, FixedPitchShaper, GlyphShaper, ShapedFragment, ShapedGlyph};
pub use utf16::utf16_len;

// Re-export fontdb::ID for users who need to work with font face IDs
pub use fontdb::ID as FontFaceId;
