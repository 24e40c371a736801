//! Painting a frame onto a [`DrawingSurface`].
//!
//! Each line is painted in three passes: backgrounds, then per segment the
//! underline, the glyphs or attachments, and the strikethrough. Shadows are
//! set on the surface around the segments that carry one.

use tracing::trace;

use super::attributes::{TextShadow, TextStroke};
use super::frame::{LineSegment, TextFrame, TextFrameLine};
use super::index::TextFrameRange;
use crate::cancellation::{CancellationFlag, is_cancelled};
use crate::logging::targets;
use crate::surface::{DrawingSurface, GlyphRun, PositionedGlyph};
use crate::types::{Color, Point, Rect};

/// Which layers to paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawingMode {
    #[default]
    All,
    /// Backgrounds and the highlight background only.
    BackgroundOnly,
    /// Everything except backgrounds.
    ForegroundOnly,
}

/// Colors overriding the attributes inside the highlighted range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextHighlightStyle {
    pub text_color: Option<Color>,
    pub background_color: Option<Color>,
}

/// Options for [`TextFrame::draw`] and [`TextFrame::image_bounds`].
///
/// # Example
///
/// ```
/// use horizon_lattice_textframe::Color;
/// use horizon_lattice_textframe::text::{
///     DrawingMode, DrawingOptions, TextFrameRange, TextHighlightStyle,
/// };
///
/// let options = DrawingOptions::new()
///     .mode(DrawingMode::ForegroundOnly)
///     .link_color(Color::BLUE)
///     .highlight(
///         TextFrameRange::default(),
///         TextHighlightStyle {
///             text_color: Some(Color::WHITE),
///             background_color: Some(Color::BLUE),
///         },
///     );
/// assert_eq!(options.mode, DrawingMode::ForegroundOnly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawingOptions {
    pub mode: DrawingMode,
    pub highlight: Option<(TextFrameRange, TextHighlightStyle)>,
    /// Text color of links; the link's own color when `None`.
    pub link_color: Option<Color>,
}

impl DrawingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: DrawingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn highlight(mut self, range: TextFrameRange, style: TextHighlightStyle) -> Self {
        self.highlight = Some((range, style));
        self
    }

    pub fn link_color(mut self, color: Color) -> Self {
        self.link_color = Some(color);
        self
    }

    /// The highlight style applying to `range`, if it overlaps the highlight.
    pub(crate) fn highlight_for(&self, range: TextFrameRange) -> Option<&TextHighlightStyle> {
        self.highlight
            .as_ref()
            .filter(|(highlight, _)| highlight.overlaps(&range))
            .map(|(_, style)| style)
    }
}

/// A horizontal stretch of one fill color.
struct Fill {
    x0: f32,
    x1: f32,
    color: Color,
}

impl TextFrame {
    /// Paint `range` of the frame with its origin at `origin`.
    ///
    /// `base_vertical_scale` is the device scale used to pixel-align
    /// baselines; the surface transform's vertical scale is used when it is
    /// `None`. A `None` or invalid surface and an empty range draw nothing.
    /// The flag is polled per line and per segment; the surface state saved
    /// at the start is restored even when drawing stops early.
    #[allow(clippy::too_many_arguments)]
    pub fn draw<S: DrawingSurface + ?Sized>(
        &self,
        range: TextFrameRange,
        origin: Point,
        surface: Option<&mut S>,
        base_vertical_scale: Option<f32>,
        pixel_align_baselines: bool,
        options: &DrawingOptions,
        cancellation: Option<&CancellationFlag>,
    ) {
        let Some(surface) = surface else {
            return;
        };
        if !surface.is_valid() || range.is_empty() || self.lines().is_empty() {
            return;
        }

        let vertical_scale = base_vertical_scale
            .filter(|s| s.is_finite() && *s != 0.0)
            .unwrap_or_else(|| surface.transform().vertical_scale())
            .abs();

        surface.save();
        'lines: for line in self.lines_overlapping(range.start, range.end) {
            if is_cancelled(cancellation) {
                trace!(target: targets::DRAW, line = line.index(), "drawing cancelled");
                break;
            }
            let mut baseline = origin.y + line.baseline;
            if pixel_align_baselines && vertical_scale > 0.0 && vertical_scale.is_finite() {
                baseline = (baseline * vertical_scale).round() / vertical_scale;
            }

            if options.mode != DrawingMode::ForegroundOnly {
                self.draw_backgrounds(line, range, origin.x, baseline, options, surface);
            }
            if options.mode == DrawingMode::BackgroundOnly {
                continue;
            }

            for segment in &line.segments {
                if is_cancelled(cancellation) {
                    trace!(target: targets::DRAW, line = line.index(), "drawing cancelled");
                    break 'lines;
                }
                self.draw_segment(line, segment, range, origin.x, baseline, options, surface);
            }
        }
        surface.restore();
    }

    fn draw_backgrounds<S: DrawingSurface + ?Sized>(
        &self,
        line: &TextFrameLine,
        range: TextFrameRange,
        origin_x: f32,
        baseline: f32,
        options: &DrawingOptions,
        surface: &mut S,
    ) {
        let top = baseline - line.ascent;
        let bottom = baseline + line.descent;
        let mut pending: Option<Fill> = None;
        let flush = |fill: Option<Fill>, surface: &mut S| {
            if let Some(fill) = fill {
                let rect = Rect::from_edges(origin_x + fill.x0, top, origin_x + fill.x1, bottom);
                surface.fill_rect(rect, fill.color);
            }
        };

        for placed in self.placed_clusters(line) {
            let cluster_range = TextFrameRange {
                start: placed.start,
                end: placed.end,
            };
            if placed.is_trailing_whitespace || !cluster_range.overlaps(&range) {
                continue;
            }
            let attributes = self.segment_source(&line.segments[placed.segment]).attributes;
            let color = options
                .highlight_for(cluster_range)
                .and_then(|style| style.background_color)
                .or(attributes.background);
            let Some(color) = color else {
                flush(pending.take(), surface);
                continue;
            };
            if let Some(fill) = pending
                .as_mut()
                .filter(|fill| fill.color == color && (fill.x1 - placed.x0).abs() < 1e-3)
            {
                fill.x1 = placed.x1;
                continue;
            }
            flush(pending.take(), surface);
            pending = Some(Fill {
                x0: placed.x0,
                x1: placed.x1,
                color,
            });
        }
        flush(pending, surface);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_segment<S: DrawingSurface + ?Sized>(
        &self,
        line: &TextFrameLine,
        segment: &LineSegment,
        range: TextFrameRange,
        origin_x: f32,
        baseline: f32,
        options: &DrawingOptions,
        surface: &mut S,
    ) {
        let scale = self.layout_info().text_scale_factor;
        let source = self.segment_source(segment);
        let attributes = source.attributes;
        let metrics = source.metrics.scaled_by(scale);
        let baseline = baseline - attributes.baseline_offset * scale;

        let boxes: Vec<_> = self
            .cluster_boxes(segment, source.clusters)
            .into_iter()
            .filter(|(cluster, ..)| {
                !Self::is_trailing(line, segment, cluster)
                    && self.cluster_frame_range(segment, cluster).overlaps(&range)
            })
            .collect();
        let (Some(left), Some(right)) = (
            boxes.iter().map(|b| b.1).reduce(f32::min),
            boxes.iter().map(|b| b.2).reduce(f32::max),
        ) else {
            return;
        };
        let (left, right) = (origin_x + left, origin_x + right);

        let base_color = match (&attributes.link, options.link_color) {
            (Some(_), Some(link_color)) => link_color,
            _ => attributes.color,
        };
        let color_for = |cluster_range: TextFrameRange| {
            options
                .highlight_for(cluster_range)
                .and_then(|style| style.text_color)
                .unwrap_or(base_color)
        };

        if let Some(shadow) = attributes.shadow {
            surface.set_shadow(Some(TextShadow {
                offset_x: shadow.offset_x * scale,
                offset_y: shadow.offset_y * scale,
                blur_radius: shadow.blur_radius * scale,
                color: shadow.color,
            }));
        }

        if let Some(underline) = attributes.underline {
            let y = baseline + metrics.underline_offset;
            surface.stroke_line(
                Point::new(left, y),
                Point::new(right, y),
                metrics.underline_thickness * underline.thickness,
                underline.color.unwrap_or(base_color),
                underline.style,
            );
        }

        if let Some(attachment) = attributes.attachment {
            for (_, x0, _) in &boxes {
                let x = origin_x + x0;
                surface.draw_attachment(
                    attachment.id,
                    Rect::from_edges(
                        x,
                        baseline - attachment.ascent * scale,
                        x + attachment.width * scale,
                        baseline + attachment.descent * scale,
                    ),
                );
            }
        } else {
            let rtl = segment.level % 2 == 1;
            let stroke = attributes.stroke.map(|stroke| TextStroke {
                width: stroke.width * scale,
                color: stroke.color,
            });
            let mut current: Option<(Color, Vec<PositionedGlyph>)> = None;
            let emit = |run: Option<(Color, Vec<PositionedGlyph>)>, surface: &mut S| {
                if let Some((color, glyphs)) = run.filter(|(_, glyphs)| !glyphs.is_empty()) {
                    surface.draw_glyphs(&GlyphRun {
                        glyphs,
                        font_size: attributes.font.size() * scale,
                        color,
                        stroke,
                    });
                }
            };

            for (cluster, x0, x1) in &boxes {
                if cluster.is_terminator {
                    continue;
                }
                let color = color_for(self.cluster_frame_range(segment, cluster));
                if current.as_ref().is_some_and(|(c, _)| *c != color) {
                    emit(current.take(), surface);
                }
                let glyphs = &mut current.get_or_insert_with(|| (color, Vec::new())).1;

                let mut pen = 0.0;
                for glyph in &source.glyphs[cluster.glyphs.clone()] {
                    let advance = glyph.advance * scale;
                    let x = if rtl {
                        x1 - pen - advance
                    } else {
                        x0 + pen
                    };
                    glyphs.push(PositionedGlyph {
                        glyph_id: glyph.glyph_id,
                        font_id: glyph.font_id,
                        position: Point::new(
                            origin_x + x + glyph.x_offset * scale,
                            baseline + glyph.y_offset * scale,
                        ),
                    });
                    pen += advance;
                }
            }
            emit(current, surface);
        }

        if let Some(strikethrough) = attributes.strikethrough {
            let y = baseline + metrics.strikethrough_offset;
            surface.stroke_line(
                Point::new(left, y),
                Point::new(right, y),
                metrics.strikethrough_thickness * strikethrough.thickness,
                strikethrough.color.unwrap_or(base_color),
                strikethrough.style,
            );
        }

        if attributes.shadow.is_some() {
            surface.set_shadow(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size;
    use crate::surface::{DrawCommand, RecordingSurface};
    use crate::text::attributes::{
        AttributedText, TextAttributes, TextDecoration, TextDecorationStyle,
    };
    use crate::text::font::{Font, FontFamily};
    use crate::text::options::TextFrameOptions;
    use crate::text::shaped::ShapedText;
    use crate::text::shaper::FixedPitchShaper;

    fn attrs() -> TextAttributes {
        TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0))
    }

    fn frame(text: AttributedText) -> TextFrame {
        let shaped = ShapedText::new(&text, &FixedPitchShaper::new());
        TextFrame::new(&shaped, Size::new(100.0, 100.0), 1.0, &TextFrameOptions::default())
    }

    fn draw(frame: &TextFrame, origin: Point, options: &DrawingOptions) -> Vec<DrawCommand> {
        let mut surface = RecordingSurface::new();
        frame.draw(
            frame.full_range(),
            origin,
            Some(&mut surface),
            None,
            true,
            options,
            None,
        );
        assert_eq!(surface.save_depth(), 0);
        surface.take_commands()
    }

    #[test]
    fn glyphs_are_positioned_on_aligned_baselines() {
        let frame = frame(AttributedText::plain("ab", attrs()));
        let commands = draw(&frame, Point::new(1.0, 0.3), &DrawingOptions::default());
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], DrawCommand::Save);
        let DrawCommand::Glyphs(run) = &commands[1] else {
            panic!("expected glyphs, got {:?}", commands[1]);
        };
        assert_eq!(run.glyphs.len(), 2);
        assert_eq!(run.glyphs[0].position, Point::new(1.0, 8.0));
        assert_eq!(run.glyphs[1].position, Point::new(6.0, 8.0));
        assert_eq!(run.color, Color::BLACK);
        assert_eq!(run.font_size, 10.0);
        assert_eq!(commands[2], DrawCommand::Restore);
    }

    #[test]
    fn backgrounds_merge_and_modes_filter() {
        let text = AttributedText::new()
            .push("ab", attrs().with_background(Color::GRAY))
            .push("cd", attrs().with_background(Color::GRAY).with_color(Color::RED));
        let frame = frame(text);

        let commands = draw(&frame, Point::ZERO, &DrawingOptions::default());
        let fills: Vec<_> = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
            .collect();
        assert_eq!(
            fills,
            vec![&DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 20.0, 10.0),
                color: Color::GRAY,
            }]
        );

        let background = draw(&frame, Point::ZERO, &DrawingOptions::new().mode(DrawingMode::BackgroundOnly));
        assert_eq!(background.len(), 3);

        let foreground = draw(&frame, Point::ZERO, &DrawingOptions::new().mode(DrawingMode::ForegroundOnly));
        assert!(foreground.iter().all(|c| !matches!(c, DrawCommand::FillRect { .. })));
        assert_eq!(foreground.iter().filter(|c| matches!(c, DrawCommand::Glyphs(_))).count(), 2);
    }

    #[test]
    fn highlight_and_link_colors() {
        let text = AttributedText::new()
            .push("ab", attrs())
            .push("cd", attrs().with_link("https://example.com"));
        let frame = frame(text);
        let highlighted = frame.range_for_original_range(1..2);
        let options = DrawingOptions::new().link_color(Color::BLUE).highlight(
            highlighted,
            TextHighlightStyle {
                text_color: Some(Color::WHITE),
                background_color: Some(Color::RED),
            },
        );
        let commands = draw(&frame, Point::ZERO, &options);
        assert!(commands.contains(&DrawCommand::FillRect {
            rect: Rect::new(5.0, 0.0, 5.0, 10.0),
            color: Color::RED,
        }));
        let colors: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Glyphs(run) => Some((run.color, run.glyphs.len())),
                _ => None,
            })
            .collect();
        assert_eq!(
            colors,
            vec![(Color::BLACK, 1), (Color::WHITE, 1), (Color::BLUE, 2)]
        );
    }

    #[test]
    fn decorations_and_shadow_wrap_glyphs() {
        let shadow = TextShadow {
            offset_x: 1.0,
            offset_y: 1.0,
            blur_radius: 0.0,
            color: Color::BLACK,
        };
        let text = AttributedText::plain(
            "ab",
            attrs()
                .with_underline(TextDecoration::new(TextDecorationStyle::Wavy))
                .with_shadow(shadow),
        );
        let commands = draw(&frame(text), Point::ZERO, &DrawingOptions::default());
        assert_eq!(commands[1], DrawCommand::SetShadow(Some(shadow)));
        assert_eq!(
            commands[2],
            DrawCommand::StrokeLine {
                from: Point::new(0.0, 9.0),
                to: Point::new(10.0, 9.0),
                width: 0.5,
                color: Color::BLACK,
                style: TextDecorationStyle::Wavy,
            }
        );
        assert!(matches!(commands[3], DrawCommand::Glyphs(_)));
        assert_eq!(commands[4], DrawCommand::SetShadow(None));
        assert_eq!(commands[5], DrawCommand::Restore);
    }

    #[test]
    fn no_surface_and_invalid_surface_are_no_ops() {
        let frame = frame(AttributedText::plain("ab", attrs()));
        let options = DrawingOptions::default();
        frame.draw::<RecordingSurface>(
            frame.full_range(),
            Point::ZERO,
            None,
            None,
            false,
            &options,
            None,
        );
        let mut invalid = RecordingSurface::invalid();
        frame.draw(frame.full_range(), Point::ZERO, Some(&mut invalid), None, false, &options, None);
        assert!(invalid.commands().is_empty());
    }

    #[test]
    fn cancelled_drawing_restores_state() {
        let frame = frame(AttributedText::plain("ab\ncd", attrs()));
        let flag = CancellationFlag::new();
        flag.cancel();
        let mut surface = RecordingSurface::new();
        frame.draw(
            frame.full_range(),
            Point::ZERO,
            Some(&mut surface),
            None,
            false,
            &DrawingOptions::default(),
            Some(&flag),
        );
        assert_eq!(surface.commands(), &[DrawCommand::Save, DrawCommand::Restore]);
    }
}
