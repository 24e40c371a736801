//! Geometric queries: hit-testing, range rectangles, links and ink bounds.
//!
//! All queries take the frame origin in the caller's coordinate space and an
//! optional display scale. When no valid scale is passed the frame's own
//! display scale is used; when neither is known nothing is pixel-snapped.

use std::ops::Range;
use std::sync::Arc;

use super::bidi::WritingDirection;
use super::draw::{DrawingMode, DrawingOptions};
use super::frame::{TextFrame, TextFrameLine, normalize_display_scale};
use super::index::TextFrameRange;
use crate::cancellation::{CancellationFlag, is_cancelled};
use crate::types::{Point, Rect};

/// The grapheme cluster nearest to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphemeClusterInfo {
    /// Empty for a line without content.
    pub range: TextFrameRange,
    /// Typographic bounds of the cluster.
    pub bounds: Rect,
    pub writing_direction: WritingDirection,
    /// The bounds are an equal share of a ligature glyph's advance.
    pub is_ligature_fraction: bool,
}

/// Rectangles covering a range, plus their union.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRectArray {
    rects: Vec<Rect>,
    bounds: Rect,
}

impl TextRectArray {
    fn push(&mut self, rect: Rect) {
        self.bounds = if self.rects.is_empty() {
            rect
        } else {
            self.bounds.union(&rect)
        };
        self.rects.push(rect);
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// The union of all rectangles; [`Rect::ZERO`] when empty.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Index and rectangle nearest to `point`; the first one on ties.
    pub fn rect_closest_to_point(&self, point: Point) -> Option<(usize, Rect)> {
        let mut best: Option<(usize, Rect, f32)> = None;
        for (i, rect) in self.rects.iter().enumerate() {
            let distance = rect.distance_to(point);
            if best.is_none_or(|(_, _, d)| distance < d) {
                best = Some((i, *rect, distance));
            }
        }
        best.map(|(i, rect, _)| (i, rect))
    }
}

/// A link in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLink {
    pub link: Arc<str>,
    pub range: TextFrameRange,
    pub rects: TextRectArray,
}

/// All links in a frame, in text order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLinkArray {
    links: Vec<TextLink>,
}

impl TextLinkArray {
    pub fn links(&self) -> &[TextLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextLink> {
        self.links.iter()
    }

    /// The link with a rectangle nearest to `point`, if within `max_distance`.
    pub fn link_closest_to_point(&self, point: Point, max_distance: f32) -> Option<&TextLink> {
        let mut best: Option<(&TextLink, f32)> = None;
        for link in &self.links {
            let Some((_, rect)) = link.rects.rect_closest_to_point(point) else {
                continue;
            };
            let distance = rect.distance_to(point);
            if distance <= max_distance && best.is_none_or(|(_, d)| distance < d) {
                best = Some((link, distance));
            }
        }
        best.map(|(link, _)| link)
    }
}

/// Horizontal distance from `x` to `[x0, x1]`.
fn horizontal_distance(x: f32, x0: f32, x1: f32) -> f32 {
    if x < x0 {
        x0 - x
    } else if x > x1 {
        x - x1
    } else {
        0.0
    }
}

fn line_box(line: &TextFrameLine, x0: f32, x1: f32, origin: Point) -> Rect {
    Rect::from_edges(
        origin.x + x0,
        origin.y + line.top(),
        origin.x + x1,
        origin.y + line.bottom(),
    )
}

fn include(bounds: &mut Option<Rect>, rect: Rect) {
    *bounds = Some(match bounds {
        Some(b) => b.union(&rect),
        None => rect,
    });
}

impl TextFrame {
    /// The pixel-snapping scale for a query.
    fn query_scale(&self, display_scale: Option<f32>) -> f32 {
        match display_scale.map(normalize_display_scale) {
            Some(scale) if scale > 0.0 => scale,
            _ => self.layout_info().display_scale,
        }
    }

    /// Find the grapheme cluster closest to `point`.
    ///
    /// The nearest line is chosen by vertical distance, then the nearest
    /// cluster of that line by horizontal distance. Trailing whitespace is
    /// not considered. Equal distances resolve to the earlier line and the
    /// logically earlier cluster. Returns `None` for a frame without lines.
    pub fn grapheme_cluster_closest_to_point(
        &self,
        point: Point,
        origin: Point,
        display_scale: Option<f32>,
    ) -> Option<GraphemeClusterInfo> {
        let scale = self.query_scale(display_scale);
        let local = Point::new(point.x - origin.x, point.y - origin.y);

        let mut nearest: Option<(&TextFrameLine, f32)> = None;
        for line in self.lines() {
            let distance = if local.y < line.top() {
                line.top() - local.y
            } else if local.y > line.bottom() {
                local.y - line.bottom()
            } else {
                0.0
            };
            if nearest.is_none_or(|(_, d)| distance < d) {
                nearest = Some((line, distance));
            }
        }
        let (line, _) = nearest?;

        let closest = self
            .placed_clusters(line)
            .into_iter()
            .filter(|c| !c.is_trailing_whitespace)
            .min_by(|a, b| {
                horizontal_distance(local.x, a.x0, a.x1)
                    .total_cmp(&horizontal_distance(local.x, b.x0, b.x1))
                    .then(a.start.cmp(&b.start))
            });

        Some(match closest {
            Some(cluster) => GraphemeClusterInfo {
                range: TextFrameRange {
                    start: cluster.start,
                    end: cluster.end,
                },
                bounds: line_box(line, cluster.x0, cluster.x1, origin).rounded_to_scale(scale),
                writing_direction: WritingDirection::from_level(cluster.level),
                is_ligature_fraction: cluster.cluster.is_some_and(|c| c.ligature.is_some()),
            },
            None => {
                let x = if line.direction.is_rtl() {
                    line.x + line.width
                } else {
                    line.x
                };
                GraphemeClusterInfo {
                    range: TextFrameRange::empty_at(line.start_index()),
                    bounds: line_box(line, x, x, origin).rounded_to_scale(scale),
                    writing_direction: line.direction,
                    is_ligature_fraction: false,
                }
            }
        })
    }

    /// Rectangles covering `range`, at least one per line the range overlaps.
    ///
    /// A line contributes one rectangle per visually contiguous stretch of
    /// selected clusters with the same level. Trailing whitespace is not
    /// covered; a line whose selected part is only trailing whitespace
    /// contributes a zero-width rectangle at its trailing edge.
    pub fn rects_for_range(
        &self,
        range: TextFrameRange,
        origin: Point,
        display_scale: Option<f32>,
    ) -> TextRectArray {
        let scale = self.query_scale(display_scale);
        let mut result = TextRectArray::default();
        if range.is_empty() {
            return result;
        }

        for line in self.lines_overlapping(range.start, range.end) {
            let mut current: Option<(f32, f32, u8, usize)> = None;
            let mut any = false;
            for (visual, cluster) in self.placed_clusters(line).iter().enumerate() {
                if cluster.is_trailing_whitespace
                    || !(cluster.start < range.end && range.start < cluster.end)
                {
                    continue;
                }
                any = true;
                let extends = current
                    .is_some_and(|(_, _, level, last)| level == cluster.level && last + 1 == visual);
                if extends {
                    if let Some(stretch) = current.as_mut() {
                        stretch.1 = cluster.x1;
                        stretch.3 = visual;
                    }
                } else {
                    if let Some((x0, x1, ..)) = current {
                        result.push(line_box(line, x0, x1, origin).rounded_to_scale(scale));
                    }
                    current = Some((cluster.x0, cluster.x1, cluster.level, visual));
                }
            }
            if let Some((x0, x1, ..)) = current {
                result.push(line_box(line, x0, x1, origin).rounded_to_scale(scale));
            }
            if !any {
                let x = if line.direction.is_rtl() {
                    line.x
                } else {
                    line.x + line.width
                };
                result.push(line_box(line, x, x, origin).rounded_to_scale(scale));
            }
        }
        result
    }

    /// Rectangles of every link in the displayed text.
    ///
    /// Adjacent spans with the same link form one link. A token carrying a
    /// link is covered once.
    pub fn rects_for_all_links(&self, origin: Point, display_scale: Option<f32>) -> TextLinkArray {
        let mut ranges: Vec<(Arc<str>, Range<usize>)> = Vec::new();
        for span in self.truncated_text().spans() {
            let Some(link) = &span.attributes.link else {
                continue;
            };
            match ranges.last_mut() {
                Some((previous, range)) if previous == link && range.end == span.range.start => {
                    range.end = span.range.end;
                }
                _ => ranges.push((link.clone(), span.range.clone())),
            }
        }

        let links = ranges
            .into_iter()
            .filter_map(|(link, range)| {
                let range = self.range_for_truncated_range(range);
                let rects = self.rects_for_range(range, origin, display_scale);
                (!rects.is_empty()).then_some(TextLink { link, range, rects })
            })
            .collect();
        TextLinkArray { links }
    }

    /// The union of the painted extents of `range`.
    ///
    /// Includes glyph boxes, strokes, shadows, decorations, backgrounds,
    /// attachments and the highlight background of `options`. Glyph ink is
    /// approximated by the typographic box of its run. The flag is polled
    /// per line and per segment; when it is set the union accumulated so far
    /// is returned. The result is expanded outward to the pixel grid.
    pub fn image_bounds(
        &self,
        range: TextFrameRange,
        origin: Point,
        display_scale: Option<f32>,
        options: &DrawingOptions,
        cancellation: Option<&CancellationFlag>,
    ) -> Rect {
        let scale = self.query_scale(display_scale);
        let text_scale = self.layout_info().text_scale_factor;
        let mut bounds: Option<Rect> = None;

        'lines: for line in self.lines_overlapping(range.start, range.end) {
            if is_cancelled(cancellation) {
                break;
            }
            for segment in &line.segments {
                if is_cancelled(cancellation) {
                    break 'lines;
                }
                let source = self.segment_source(segment);
                let attributes = source.attributes;
                let metrics = source.metrics.scaled_by(text_scale);
                let baseline = line.baseline - attributes.baseline_offset * text_scale;

                for (cluster, x0, x1) in self.cluster_boxes(segment, source.clusters) {
                    let cluster_range = self.cluster_frame_range(segment, cluster);
                    if !cluster_range.overlaps(&range) || Self::is_trailing(line, segment, cluster) {
                        continue;
                    }
                    let line_rect = Rect::from_edges(x0, line.top(), x1, line.bottom());

                    if options.mode != DrawingMode::ForegroundOnly {
                        if attributes.background.is_some() {
                            include(&mut bounds, line_rect);
                        }
                        if options
                            .highlight_for(cluster_range)
                            .is_some_and(|h| h.background_color.is_some())
                        {
                            include(&mut bounds, line_rect);
                        }
                    }
                    if options.mode == DrawingMode::BackgroundOnly {
                        continue;
                    }

                    let mut ink: Option<Rect> = None;
                    if let Some(decoration) = attributes.underline {
                        let y = baseline + metrics.underline_offset;
                        let half = metrics.underline_thickness * decoration.thickness / 2.0;
                        include(&mut ink, Rect::from_edges(x0, y - half, x1, y + half));
                    }
                    if let Some(decoration) = attributes.strikethrough {
                        let y = baseline + metrics.strikethrough_offset;
                        let half = metrics.strikethrough_thickness * decoration.thickness / 2.0;
                        include(&mut ink, Rect::from_edges(x0, y - half, x1, y + half));
                    }
                    if let Some(attachment) = attributes.attachment {
                        include(
                            &mut ink,
                            Rect::from_edges(
                                x0,
                                baseline - attachment.ascent * text_scale,
                                x0 + attachment.width * text_scale,
                                baseline + attachment.descent * text_scale,
                            ),
                        );
                    } else if !cluster.is_whitespace && !cluster.is_terminator {
                        let mut glyph = Rect::from_edges(
                            x0,
                            baseline - metrics.ascent,
                            x1,
                            baseline + metrics.descent,
                        );
                        if let Some(stroke) = attributes.stroke {
                            glyph = glyph.inflate(stroke.width * text_scale / 2.0);
                        }
                        include(&mut ink, glyph);
                    }

                    if let Some(ink) = ink {
                        include(&mut bounds, ink);
                        if let Some(shadow) = attributes.shadow {
                            let shadow_rect = ink
                                .offset(shadow.offset_x * text_scale, shadow.offset_y * text_scale)
                                .inflate(shadow.blur_radius * text_scale);
                            include(&mut bounds, shadow_rect);
                        }
                    }
                }
            }
        }

        bounds
            .map(|b| b.offset(origin.x, origin.y).expanded_to_scale(scale))
            .unwrap_or(Rect::ZERO)
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
    use crate::types::Color;

    fn attrs() -> TextAttributes {
        TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0))
    }

    fn frame(text: AttributedText, size: Size) -> TextFrame {
        let shaped = ShapedText::new(&text, &FixedPitchShaper::new().ligature("fi"));
        TextFrame::new(&shaped, size, 0.0, &TextFrameOptions::default())
    }

    #[test]
    fn hit_testing_clamps_to_lines_and_clusters() {
        let frame = frame(AttributedText::plain("ab cd\nef", attrs()), Size::new(100.0, 100.0));
        let hit = frame
            .grapheme_cluster_closest_to_point(Point::new(7.0, 5.0), Point::ZERO, None)
            .unwrap();
        assert_eq!(frame.original_range_for_range(hit.range), 1..2);
        assert_eq!(hit.bounds, Rect::new(5.0, 0.0, 5.0, 10.0));

        let below = frame
            .grapheme_cluster_closest_to_point(Point::new(500.0, 500.0), Point::ZERO, None)
            .unwrap();
        assert_eq!(frame.original_range_for_range(below.range), 7..8);

        // Ties go to the earlier cluster.
        let edge = frame
            .grapheme_cluster_closest_to_point(Point::new(5.0, 5.0), Point::ZERO, None)
            .unwrap();
        assert_eq!(frame.original_range_for_range(edge.range), 0..1);
    }

    #[test]
    fn hit_testing_ignores_trailing_whitespace() {
        let frame = frame(AttributedText::plain("ab   \ncd", attrs()), Size::new(100.0, 100.0));
        let hit = frame
            .grapheme_cluster_closest_to_point(Point::new(22.0, 5.0), Point::ZERO, None)
            .unwrap();
        assert_eq!(frame.original_range_for_range(hit.range), 1..2);
    }

    #[test]
    fn ligature_clusters_are_fractions() {
        let frame = frame(AttributedText::plain("fit", attrs()), Size::new(100.0, 100.0));
        let hit = frame
            .grapheme_cluster_closest_to_point(Point::new(6.0, 5.0), Point::ZERO, None)
            .unwrap();
        assert!(hit.is_ligature_fraction);
        assert_eq!(hit.bounds, Rect::new(5.0, 0.0, 5.0, 10.0));
    }

    #[test]
    fn rects_split_per_line() {
        let frame = frame(AttributedText::plain("ab cd\nef", attrs()), Size::new(100.0, 100.0));
        let rects = frame.rects_for_range(frame.full_range(), Point::new(10.0, 10.0), None);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects.rects()[0], Rect::new(10.0, 10.0, 25.0, 10.0));
        assert_eq!(rects.rects()[1], Rect::new(10.0, 20.0, 10.0, 10.0));
        assert_eq!(rects.bounds(), frame.layout_info().layout_bounds.offset(10.0, 10.0));
        assert!(frame.rects_for_range(TextFrameRange::default(), Point::ZERO, None).is_empty());
    }

    #[test]
    fn rects_are_snapped_to_the_display_scale() {
        let frame = frame(AttributedText::plain("ab", attrs()), Size::new(100.0, 100.0));
        let rects = frame.rects_for_range(frame.full_range(), Point::new(0.3, 0.3), Some(2.0));
        assert_eq!(rects.rects()[0], Rect::from_edges(0.5, 0.5, 10.5, 10.5));
    }

    #[test]
    fn links_are_collected_once() {
        let text = AttributedText::new()
            .push("see ", attrs())
            .push("docs", attrs().with_link("https://example.com/docs"))
            .push(" now", attrs());
        let frame = frame(text, Size::new(200.0, 100.0));
        let links = frame.rects_for_all_links(Point::ZERO, None);
        assert_eq!(links.len(), 1);
        let link = &links.links()[0];
        assert_eq!(&*link.link, "https://example.com/docs");
        assert_eq!(link.rects.rects(), &[Rect::new(20.0, 0.0, 20.0, 10.0)]);
        assert!(links.link_closest_to_point(Point::new(30.0, 15.0), 10.0).is_some());
        assert!(links.link_closest_to_point(Point::new(100.0, 50.0), 10.0).is_none());
    }

    #[test]
    fn image_bounds_include_decorations() {
        let shadowed = attrs()
            .with_background(Color::GRAY)
            .with_shadow(crate::text::TextShadow {
                offset_x: 2.0,
                offset_y: 2.0,
                blur_radius: 1.0,
                color: Color::BLACK,
            });
        let frame = frame(AttributedText::plain("ab", shadowed), Size::new(100.0, 100.0));
        let bounds = frame.image_bounds(
            frame.full_range(),
            Point::ZERO,
            None,
            &DrawingOptions::default(),
            None,
        );
        assert_eq!(bounds, Rect::from_edges(0.0, 0.0, 13.0, 13.0));

        let background = frame.image_bounds(
            frame.full_range(),
            Point::ZERO,
            None,
            &DrawingOptions::new().mode(DrawingMode::BackgroundOnly),
            None,
        );
        assert_eq!(background, Rect::from_edges(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn cancelled_image_bounds_are_empty() {
        let frame = frame(AttributedText::plain("ab", attrs()), Size::new(100.0, 100.0));
        let flag = CancellationFlag::new();
        flag.cancel();
        let bounds = frame.image_bounds(
            frame.full_range(),
            Point::ZERO,
            Some(2.0),
            &DrawingOptions::default(),
            Some(&flag),
        );
        assert_eq!(bounds, Rect::ZERO);
    }
}
