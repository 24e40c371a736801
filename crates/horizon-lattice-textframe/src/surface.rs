//! The drawing surface interface used by [`TextFrame::draw`](crate::text::TextFrame::draw).
//!
//! A text frame never rasterizes anything itself. It issues fills, lines,
//! glyph runs and attachment placeholders to a [`DrawingSurface`] in frame
//! order. [`RecordingSurface`] keeps those calls as [`DrawCommand`]s, which is
//! useful for tests and for replaying text into another renderer.

use fontdb::ID as FontFaceId;

use crate::text::{TextDecorationStyle, TextShadow, TextStroke};
use crate::transform::{Transform2D, TransformStack};
use crate::types::{Color, Point, Rect};

/// A glyph at an absolute position on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub glyph_id: u16,
    /// Face the glyph belongs to; `None` for glyphs from a font-free shaper.
    pub font_id: Option<FontFaceId>,
    /// Pen position on the baseline.
    pub position: Point,
}

/// Glyphs sharing one font, size and paint.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub glyphs: Vec<PositionedGlyph>,
    /// Font size in points, text scale included.
    pub font_size: f32,
    pub color: Color,
    /// Outline stroke, width already scaled.
    pub stroke: Option<TextStroke>,
}

/// A 2D paint target for text frames.
///
/// # State Stack
///
/// `save` pushes the transform and shadow state, `restore` pops it. Calls are
/// always balanced by the frame, including when drawing is cancelled.
pub trait DrawingSurface {
    /// Whether the surface can be drawn to. Drawing into an invalid surface
    /// is a no-op.
    fn is_valid(&self) -> bool {
        true
    }

    // =========================================================================
    // State Management
    // =========================================================================

    /// Save the current state.
    fn save(&mut self);

    /// Restore the previously saved state.
    fn restore(&mut self);

    /// The current transform from frame coordinates to device space.
    fn transform(&self) -> &Transform2D;

    /// Set the shadow applied to subsequent drawing, or clear it.
    fn set_shadow(&mut self, shadow: Option<TextShadow>);

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Fill a rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Stroke a horizontal decoration line.
    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f32,
        color: Color,
        style: TextDecorationStyle,
    );

    /// Draw a run of glyphs.
    fn draw_glyphs(&mut self, run: &GlyphRun);

    /// Draw the inline object `id` in `bounds`.
    fn draw_attachment(&mut self, id: u64, bounds: Rect);
}

/// A call recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    SetShadow(Option<TextShadow>),
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeLine {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
        style: TextDecorationStyle,
    },
    Glyphs(GlyphRun),
    Attachment {
        id: u64,
        bounds: Rect,
    },
}

/// A surface that records every call.
///
/// # Example
///
/// ```
/// use horizon_lattice_textframe::{Color, DrawCommand, DrawingSurface, Rect, RecordingSurface};
///
/// let mut surface = RecordingSurface::new();
/// surface.save();
/// surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::RED);
/// surface.restore();
/// assert_eq!(surface.commands().len(), 3);
/// assert_eq!(surface.commands()[0], DrawCommand::Save);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    transforms: TransformStack,
    commands: Vec<DrawCommand>,
    valid: bool,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            transforms: TransformStack::new(),
            commands: Vec::new(),
            valid: true,
        }
    }

    /// A surface whose base transform is `base`, e.g. a device scale.
    pub fn with_transform(base: Transform2D) -> Self {
        Self {
            transforms: TransformStack::with_base(base),
            ..Self::new()
        }
    }

    /// A surface that reports itself as invalid.
    pub fn invalid() -> Self {
        Self {
            valid: false,
            ..Self::new()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Depth of the saved state stack.
    pub fn save_depth(&self) -> usize {
        self.transforms.depth()
    }

    /// All recorded glyph runs.
    pub fn glyph_runs(&self) -> impl Iterator<Item = &GlyphRun> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Glyphs(run) => Some(run),
            _ => None,
        })
    }
}

impl DrawingSurface for RecordingSurface {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn save(&mut self) {
        self.transforms.save();
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.transforms.restore();
        self.commands.push(DrawCommand::Restore);
    }

    fn transform(&self) -> &Transform2D {
        self.transforms.current()
    }

    fn set_shadow(&mut self, shadow: Option<TextShadow>) {
        self.commands.push(DrawCommand::SetShadow(shadow));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f32,
        color: Color,
        style: TextDecorationStyle,
    ) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            width,
            color,
            style,
        });
    }

    fn draw_glyphs(&mut self, run: &GlyphRun) {
        self.commands.push(DrawCommand::Glyphs(run.clone()));
    }

    fn draw_attachment(&mut self, id: u64, bounds: Rect) {
        self.commands.push(DrawCommand::Attachment { id, bounds });
    }
}
