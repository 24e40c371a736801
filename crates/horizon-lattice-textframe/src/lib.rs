//! Text frame layout for Horizon Lattice.
//!
//! This crate lays out attributed text in a fixed-size frame and answers
//! questions about the result. A [`TextFrame`](text::TextFrame) breaks
//! shaped text into lines, truncates with a token when the text does not
//! fit, optionally scales the text down to make it fit, and then supports
//! hit-testing, selection and link rectangles, ink bounds and drawing onto
//! any [`DrawingSurface`].
//!
//! # Getting Started
//!
//! ```
//! use horizon_lattice_textframe::{Point, RecordingSurface, Size};
//! use horizon_lattice_textframe::text::{
//!     AttributedText, DrawingOptions, FixedPitchShaper, Font, FontFamily, ShapedText,
//!     TextAttributes, TextFrame, TextFrameOptions,
//! };
//!
//! let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
//! let text = AttributedText::plain("The quick brown fox jumps over the lazy dog", attributes);
//! let shaped = ShapedText::new(&text, &FixedPitchShaper::new());
//!
//! let options = TextFrameOptions::new().max_line_count(1);
//! let frame = TextFrame::new(&shaped, Size::new(100.0, 40.0), 2.0, &options);
//! assert_eq!(frame.truncated_text().text(), "The quick brown fox\u{2026}");
//!
//! let mut surface = RecordingSurface::new();
//! frame.draw(
//!     frame.full_range(),
//!     Point::ZERO,
//!     Some(&mut surface),
//!     None,
//!     true,
//!     &DrawingOptions::default(),
//!     None,
//! );
//! assert_eq!(surface.save_depth(), 0);
//! ```
//!
//! # Cancellation
//!
//! Layout, ink bounds and drawing accept an optional [`CancellationFlag`]:
//!
//! ```
//! use horizon_lattice_textframe::{CancellationFlag, Size, TextFrameError};
//! use horizon_lattice_textframe::text::{
//!     AttributedText, FixedPitchShaper, Font, FontFamily, ShapedText, TextAttributes,
//!     TextFrame, TextFrameOptions,
//! };
//!
//! let attributes = TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0));
//! let text = AttributedText::plain("Cancelled before it started", attributes);
//! let shaped = ShapedText::new(&text, &FixedPitchShaper::new());
//!
//! let flag = CancellationFlag::new();
//! flag.cancel();
//! let result = TextFrame::with_range(
//!     &shaped,
//!     None,
//!     Size::new(100.0, 100.0),
//!     1.0,
//!     &TextFrameOptions::default(),
//!     Some(&flag),
//! );
//! assert!(matches!(result, Err(TextFrameError::Cancelled)));
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through `tracing` under the targets in
//! [`logging::targets`].

mod cancellation;
mod error;
pub mod logging;
mod surface;
pub mod text;
mod transform;
mod types;

// Core infrastructure
pub use cancellation::CancellationFlag;
pub use error::{TextFrameError, TextFrameResult};

// Drawing
pub use surface::{DrawCommand, DrawingSurface, GlyphRun, PositionedGlyph, RecordingSurface};
pub use transform::{Transform2D, TransformStack};
pub use types::{Color, Point, Rect, Size};
