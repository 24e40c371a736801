//! The layout engine: line breaking, scale fitting and truncation.
//!
//! Layout runs in three phases:
//!
//! 1. Lines are broken greedily at the current text scale. Word mode ends a
//!    line at the last allowed break opportunity and falls back to a grapheme
//!    boundary for words wider than the frame. Lines are added while the line
//!    limit and the frame height allow.
//! 2. If the text does not fit and a minimum scale factor below 1 is set, the
//!    scale is lowered in fixed steps until it fits or the minimum is reached.
//! 3. Overflowing text is truncated on the last line and paragraphs with a
//!    truncation scope are truncated on their last allowed line. Each line is
//!    then split into segments of uniform embedding level, reordered for
//!    display and aligned.

use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, trace};

use super::attributes::{TextAlignment, TextAttributes, TextFlags};
use super::frame::{
    ConsistentAlignment, LayoutFlags, LineSegment, SegmentKind, TextFrameLine, TruncationToken,
};
use super::bidi::visual_order;
use super::font::LineMetrics;
use super::line_break::{BreakType, break_at};
use super::options::{LineBreakMode, TextFrameOptions, TruncationMode};
use super::shaped::{Paragraph, ShapedText, ShapedToken};
use crate::cancellation::{CancellationFlag, is_cancelled};
use crate::error::{TextFrameError, TextFrameResult};
use crate::logging::targets;
use crate::types::{Rect, Size};

/// Tolerance for width and height comparisons.
const EPSILON: f32 = 1e-3;

/// Everything a frame needs from a layout pass.
#[derive(Debug)]
pub(crate) struct LayoutOutput {
    pub(crate) lines: Vec<TextFrameLine>,
    pub(crate) tokens: Vec<TruncationToken>,
    pub(crate) range_in_original: Range<usize>,
    pub(crate) scale: f32,
    pub(crate) layout_flags: LayoutFlags,
    pub(crate) content_flags: TextFlags,
    pub(crate) consistent_alignment: ConsistentAlignment,
    pub(crate) layout_bounds: Rect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct VerticalMetrics {
    ascent: f32,
    descent: f32,
    leading: f32,
}

impl VerticalMetrics {
    fn new(metrics: &LineMetrics, attributes: &TextAttributes, scale: f32) -> Self {
        let offset = attributes.baseline_offset;
        Self {
            ascent: (metrics.ascent + offset.max(0.0)) * scale,
            descent: (metrics.descent + (-offset).max(0.0)) * scale,
            leading: metrics.leading * scale,
        }
    }

    fn max(self, other: Self) -> Self {
        Self {
            ascent: self.ascent.max(other.ascent),
            descent: self.descent.max(other.descent),
            leading: self.leading.max(other.leading),
        }
    }
}

/// A line produced by the breaker.
#[derive(Debug, Clone)]
struct BrokenLine {
    range: Range<usize>,
    paragraph: usize,
    metrics: VerticalMetrics,
    baseline: f32,
    /// Width without trailing whitespace.
    width: f32,
}

#[derive(Debug, Clone, Copy)]
struct ScopeTruncation {
    line: usize,
    mode: TruncationMode,
}

#[derive(Debug)]
struct Breaking {
    lines: Vec<BrokenLine>,
    /// Text remained after the last line.
    overflow: bool,
    scoped: Vec<ScopeTruncation>,
    fits: bool,
}

#[derive(Debug)]
struct Truncation {
    line: usize,
    elided: Range<usize>,
    token: Arc<ShapedToken>,
    /// New end of the truncated line.
    line_end: usize,
}

/// A line piece in logical order, before reordering.
#[derive(Debug)]
struct Piece {
    kind: SegmentKind,
    level: u8,
    width: f32,
    trailing: bool,
}

struct Engine<'a> {
    shaped: &'a ShapedText,
    range: Range<usize>,
    width: f32,
    height: f32,
    options: &'a TextFrameOptions,
    cancellation: Option<&'a CancellationFlag>,
}

/// Lay out `range` of `shaped` in a frame of `size`.
///
/// `range` must be non-empty and `size` usable.
pub(crate) fn layout(
    shaped: &ShapedText,
    range: Range<usize>,
    size: Size,
    options: &TextFrameOptions,
    cancellation: Option<&CancellationFlag>,
) -> TextFrameResult<LayoutOutput> {
    let mut flags = LayoutFlags::empty();
    let mut width = size.width;
    if let Some(maximum) = options.valid_maximum_width() {
        if maximum < width {
            width = maximum;
            flags |= LayoutFlags::HAS_MAX_TYPOGRAPHIC_WIDTH;
        }
    }

    let engine = Engine {
        shaped,
        range,
        width,
        height: size.height,
        options,
        cancellation,
    };
    engine.check_cancelled()?;

    let (scale, breaking) = engine.find_scale()?;
    if scale < 1.0 {
        flags |= LayoutFlags::IS_SCALED;
    }
    let output = engine.assemble(scale, breaking, flags)?;

    debug!(
        target: targets::LAYOUT,
        lines = output.lines.len(),
        tokens = output.tokens.len(),
        scale = output.scale,
        truncated = output.layout_flags.contains(LayoutFlags::IS_TRUNCATED),
        "laid out text frame"
    );
    Ok(output)
}

impl Engine<'_> {
    fn check_cancelled(&self) -> TextFrameResult<()> {
        if is_cancelled(self.cancellation) {
            Err(TextFrameError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn paragraphs(&self) -> impl Iterator<Item = (usize, &Paragraph)> {
        let range = self.range.clone();
        self.shaped
            .paragraphs()
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.range.start < range.end && p.range.end > range.start)
    }

    fn cluster_range(&self, range: Range<usize>) -> Range<usize> {
        self.shaped.cluster_at_or_after(range.start)..self.shaped.cluster_at_or_after(range.end)
    }

    fn width_of(&self, range: Range<usize>, scale: f32) -> f32 {
        self.shaped.clusters()[self.cluster_range(range)]
            .iter()
            .map(|c| c.advance * scale)
            .sum()
    }

    /// Start of the trailing whitespace and terminators of `range`.
    fn content_end(&self, range: Range<usize>) -> usize {
        let clusters = self.shaped.clusters();
        let Range { start: first, end } = self.cluster_range(range.clone());
        let mut i = end;
        while i > first && (clusters[i - 1].is_whitespace || clusters[i - 1].is_terminator) {
            i -= 1;
        }
        if i == end { range.end } else { clusters[i].start }
    }

    fn metrics(&self, range: Range<usize>, scale: f32) -> VerticalMetrics {
        let runs = self.shaped.runs();
        let mut result: Option<VerticalMetrics> = None;
        for run in &runs[self.shaped.run_at(range.start)..] {
            if run.range.start >= range.end && result.is_some() {
                break;
            }
            let attributes = self.shaped.span_attributes(run.span);
            let metrics = VerticalMetrics::new(&run.metrics, attributes, scale);
            result = Some(result.map_or(metrics, |m| m.max(metrics)));
        }
        result.unwrap_or_default()
    }

    /// End of the line starting at `pos` in a paragraph ending at `paragraph_end`.
    fn next_line_end(&self, pos: usize, paragraph_end: usize, scale: f32) -> usize {
        let clusters = self.shaped.clusters();
        let breaks = self.shaped.breaks();
        let mut x = 0.0;
        let mut candidate = None;
        let mut i = self.shaped.cluster_at_or_after(pos);

        while let Some(cluster) = clusters.get(i) {
            if cluster.start >= paragraph_end {
                break;
            }
            if cluster.is_terminator {
                return cluster.end.min(paragraph_end);
            }
            let advance = cluster.advance * scale;
            if !cluster.is_whitespace && cluster.start > pos && x + advance > self.width + EPSILON {
                if self.options.line_break_mode == LineBreakMode::Word {
                    if let Some(end) = candidate {
                        return end;
                    }
                }
                return cluster.start;
            }
            x += advance;
            i += 1;
            if cluster.end < paragraph_end {
                match break_at(breaks, cluster.end) {
                    Some(BreakType::Mandatory) => return cluster.end,
                    Some(BreakType::Allowed) => candidate = Some(cluster.end),
                    None => {}
                }
            }
        }
        paragraph_end
    }

    fn break_lines(&self, scale: f32) -> TextFrameResult<Breaking> {
        let limit = self.options.line_limit();
        let mut lines: Vec<BrokenLine> = Vec::new();
        let mut scoped = Vec::new();
        let mut overflow = false;

        'paragraphs: for (index, paragraph) in self.paragraphs() {
            let end = paragraph.range.end.min(self.range.end);
            let content_end = paragraph.content_end.min(end);
            let mut pos = paragraph.range.start.max(self.range.start);
            let mut paragraph_lines = 0;

            while pos < end {
                self.check_cancelled()?;
                if lines.len() >= limit {
                    overflow = true;
                    break 'paragraphs;
                }
                let line_end = self.next_line_end(pos, end, scale);
                let metrics = self.metrics(pos..line_end, scale);
                let baseline = match lines.last() {
                    Some(previous) => {
                        previous.baseline
                            + previous.metrics.descent
                            + previous.metrics.leading
                            + metrics.ascent
                    }
                    None => metrics.ascent,
                };
                if !lines.is_empty() && baseline + metrics.descent > self.height + EPSILON {
                    overflow = true;
                    break 'paragraphs;
                }
                let width = self.width_of(pos..self.content_end(pos..line_end), scale);
                lines.push(BrokenLine {
                    range: pos..line_end,
                    paragraph: index,
                    metrics,
                    baseline,
                    width,
                });
                paragraph_lines += 1;
                pos = line_end;

                if let Some(scope) = paragraph.style.truncation_scope {
                    if paragraph_lines >= scope.max_line_count.max(1) && pos < content_end {
                        scoped.push(ScopeTruncation {
                            line: lines.len() - 1,
                            mode: scope.mode,
                        });
                        break;
                    }
                }
            }
        }

        let fits = !overflow
            && scoped.is_empty()
            && lines.iter().all(|l| l.width <= self.width + EPSILON)
            && lines
                .last()
                .is_none_or(|l| l.baseline + l.metrics.descent <= self.height + EPSILON);
        Ok(Breaking {
            lines,
            overflow,
            scoped,
            fits,
        })
    }

    /// The largest scale at which the text fits, stepping down from 1.
    fn find_scale(&self) -> TextFrameResult<(f32, Breaking)> {
        let breaking = self.break_lines(1.0)?;
        let minimum = self.options.clamped_minimum_scale();
        if breaking.fits || minimum >= 1.0 {
            return Ok((1.0, breaking));
        }

        let step = self.options.clamped_step();
        let mut k = 1u32;
        loop {
            let scale = 1.0 - step * k as f32;
            if scale <= minimum + 1e-6 {
                break;
            }
            self.check_cancelled()?;
            let candidate = self.break_lines(scale)?;
            trace!(target: targets::LAYOUT, scale, fits = candidate.fits, "tried text scale");
            if candidate.fits {
                return Ok((scale, candidate));
            }
            k += 1;
        }
        Ok((minimum, self.break_lines(minimum)?))
    }

    fn default_token_at(&self, offset: usize) -> Arc<ShapedToken> {
        let run = &self.shaped.runs()[self.shaped.run_at(offset)];
        self.shaped.default_token(run.span).clone()
    }

    /// End of the longest prefix starting at `from` that fits `available`,
    /// trailing whitespace trimmed.
    fn fit_prefix(&self, from: usize, limit: usize, available: f32, scale: f32) -> usize {
        let clusters = self.shaped.clusters();
        let mut x = 0.0;
        let mut end = from;
        for cluster in &clusters[self.shaped.cluster_at_or_after(from)..] {
            if cluster.start >= limit || cluster.is_terminator {
                break;
            }
            let advance = cluster.advance * scale;
            if x + advance > available + EPSILON {
                break;
            }
            x += advance;
            if !cluster.is_whitespace {
                end = cluster.end;
            }
        }
        end
    }

    /// Start of the longest suffix ending at `to` that fits `available`,
    /// leading whitespace trimmed.
    fn fit_suffix(&self, limit: usize, to: usize, available: f32, scale: f32) -> usize {
        let clusters = self.shaped.clusters();
        let Range { start: first, end: mut i } = self.cluster_range(limit..to);
        let mut x = 0.0;
        let mut start = to;
        while i > first {
            let cluster = &clusters[i - 1];
            let advance = cluster.advance * scale;
            if cluster.is_terminator || x + advance > available + EPSILON {
                break;
            }
            x += advance;
            if !cluster.is_whitespace {
                start = cluster.start;
            }
            i -= 1;
        }
        start
    }

    /// Keep a prefix and a suffix of `from..to` of about equal width.
    fn fit_middle(&self, from: usize, to: usize, available: f32, scale: f32) -> Range<usize> {
        let clusters = self.shaped.clusters();
        let Range {
            start: mut head,
            end: mut tail,
        } = self.cluster_range(from..to);
        let (mut head_width, mut tail_width) = (0.0, 0.0);
        let (mut head_open, mut tail_open) = (true, true);
        let (mut prefix_end, mut suffix_start) = (from, to);

        while (head_open || tail_open) && head < tail {
            let take_head = head_open && (!tail_open || head_width <= tail_width);
            let cluster = if take_head { &clusters[head] } else { &clusters[tail - 1] };
            let advance = cluster.advance * scale;
            if cluster.is_terminator || head_width + tail_width + advance > available + EPSILON {
                if take_head {
                    head_open = false;
                } else {
                    tail_open = false;
                }
                continue;
            }
            if take_head {
                head_width += advance;
                head += 1;
                if !cluster.is_whitespace {
                    prefix_end = cluster.end;
                }
            } else {
                tail_width += advance;
                tail -= 1;
                if !cluster.is_whitespace {
                    suffix_start = cluster.start;
                }
            }
        }
        if head >= tail {
            return prefix_end..prefix_end;
        }
        prefix_end..suffix_start
    }

    fn elided_range(
        &self,
        line: &BrokenLine,
        mode: TruncationMode,
        region_end: usize,
        content_end: usize,
        token_width: f32,
        scale: f32,
    ) -> Range<usize> {
        let available = self.width - token_width;
        let start = line.range.start;
        match mode {
            TruncationMode::Start => {
                start..self.fit_suffix(start, content_end.min(region_end), available, scale)
            }
            TruncationMode::Middle => {
                self.fit_middle(start, content_end.min(region_end), available, scale)
            }
            TruncationMode::End | TruncationMode::Clip => {
                self.fit_prefix(start, region_end.min(content_end), available, scale)..region_end
            }
        }
    }

    /// Choose the elided range and token for a truncated line.
    ///
    /// Text after `line.range.start` up to `region_end` may be elided. Start
    /// and middle truncation only apply when the region lies within the
    /// line's paragraph; otherwise the end is truncated.
    fn truncate(
        &self,
        line: &BrokenLine,
        region_end: usize,
        mode: TruncationMode,
        custom: Option<&Arc<ShapedToken>>,
        scale: f32,
    ) -> Option<(Range<usize>, Arc<ShapedToken>)> {
        let paragraph = &self.shaped.paragraphs()[line.paragraph];
        let paragraph_end = paragraph.range.end.min(self.range.end);
        let content_end = paragraph.content_end.min(paragraph_end);
        let mode = match mode {
            TruncationMode::Start | TruncationMode::Middle if region_end > paragraph_end => {
                TruncationMode::End
            }
            TruncationMode::Clip => TruncationMode::End,
            mode => mode,
        };

        let probe_offset = match mode {
            TruncationMode::Start => line.range.start,
            _ => self
                .content_end(line.range.clone())
                .saturating_sub(1)
                .max(line.range.start),
        };
        let mut token = custom
            .cloned()
            .unwrap_or_else(|| self.default_token_at(probe_offset));
        let mut elided =
            self.elided_range(line, mode, region_end, content_end, token.width() * scale, scale);

        if custom.is_none() && !elided.is_empty() {
            let actual = self.default_token_at(elided.start);
            if !Arc::ptr_eq(&actual, &token) {
                if (actual.width() - token.width()).abs() > EPSILON {
                    elided = self.elided_range(
                        line,
                        mode,
                        region_end,
                        content_end,
                        actual.width() * scale,
                        scale,
                    );
                }
                token = actual;
            }
        }
        (!elided.is_empty()).then_some((elided, token))
    }

    /// Segment pieces for `range`, split at runs and at the trailing whitespace.
    fn text_pieces(
        &self,
        range: Range<usize>,
        trailing_start: usize,
        base_level: u8,
        scale: f32,
        pieces: &mut Vec<Piece>,
    ) {
        if range.is_empty() {
            return;
        }
        let runs = self.shaped.runs();
        let first = self.shaped.run_at(range.start);
        for (run_index, run) in runs.iter().enumerate().skip(first) {
            if run.range.start >= range.end {
                break;
            }
            let start = run.range.start.max(range.start);
            let end = run.range.end.min(range.end);
            if start >= end {
                continue;
            }
            let parts = [
                (start..end.min(trailing_start), run.level, false),
                (start.max(trailing_start)..end, base_level, true),
            ];
            for (part, level, trailing) in parts {
                if part.is_empty() {
                    continue;
                }
                let owned = &self.shaped.clusters()[run.clusters.clone()];
                let clusters = run.clusters.start + owned.partition_point(|c| c.start < part.start)
                    ..run.clusters.start + owned.partition_point(|c| c.start < part.end);
                if clusters.is_empty() {
                    continue;
                }
                let width = self.shaped.clusters()[clusters.clone()]
                    .iter()
                    .map(|c| c.advance * scale)
                    .sum();
                pieces.push(Piece {
                    width,
                    kind: SegmentKind::Text {
                        run: run_index,
                        clusters,
                    },
                    level,
                    trailing,
                });
            }
        }
    }

    fn assemble(
        &self,
        scale: f32,
        breaking: Breaking,
        mut flags: LayoutFlags,
    ) -> TextFrameResult<LayoutOutput> {
        let Breaking {
            lines: mut broken,
            overflow,
            scoped,
            ..
        } = breaking;
        let paragraphs = self.shaped.paragraphs();
        let mut range_end = self.range.end;
        let mut truncations: Vec<Truncation> = Vec::new();

        let last = broken.len().checked_sub(1);
        let frame_truncation = last.filter(|&i| overflow || broken[i].width > self.width + EPSILON);
        if let Some(last) = frame_truncation {
            let mode = self.options.last_line_truncation_mode;
            let truncation = match mode {
                TruncationMode::Clip => None,
                mode => self.truncate(
                    &broken[last],
                    self.range.end,
                    mode,
                    self.options.truncation_token.as_ref(),
                    scale,
                ),
            };
            match truncation {
                Some((elided, token)) => truncations.push(Truncation {
                    line: last,
                    elided,
                    token,
                    line_end: self.range.end,
                }),
                None if overflow => {
                    range_end = broken[last].range.end;
                    flags |= LayoutFlags::IS_TRUNCATED;
                }
                None => {}
            }
        }

        for scope in scoped {
            if Some(scope.line) == frame_truncation {
                continue;
            }
            let paragraph = &paragraphs[broken[scope.line].paragraph];
            let paragraph_end = paragraph.range.end.min(self.range.end);
            let region_end = paragraph.content_end.min(paragraph_end);
            match self.truncate(&broken[scope.line], region_end, scope.mode, None, scale) {
                Some((elided, token)) => truncations.push(Truncation {
                    line: scope.line,
                    elided,
                    token,
                    line_end: paragraph_end,
                }),
                None => broken[scope.line].range.end = paragraph_end,
            }
        }
        truncations.sort_by_key(|t| t.line);
        if !truncations.is_empty() {
            flags |= LayoutFlags::IS_TRUNCATED;
        }

        let mut tokens = Vec::with_capacity(truncations.len());
        let mut line_tokens: Vec<Option<usize>> = vec![None; broken.len()];
        for truncation in truncations {
            let planned = &mut broken[truncation.line];
            planned.range.end = truncation.line_end;
            let token_metrics = VerticalMetrics::new(
                &truncation.token.metrics,
                truncation.token.attributes(),
                scale,
            );
            planned.metrics = planned.metrics.max(token_metrics);
            line_tokens[truncation.line] = Some(tokens.len());
            tokens.push(TruncationToken {
                token: truncation.token,
                elided: truncation.elided,
                line: truncation.line,
                truncated_start: 0,
            });
        }

        let mut lines: Vec<TextFrameLine> = Vec::with_capacity(broken.len());
        let mut content_flags = TextFlags::empty();
        for (index, planned) in broken.into_iter().enumerate() {
            self.check_cancelled()?;
            let paragraph = &paragraphs[planned.paragraph];
            let base_level = paragraph.direction.level();
            let token = line_tokens[index];
            let elided = token.map(|t| tokens[t].elided.clone());

            let trailing_start = match &elided {
                Some(e) if e.end >= planned.range.end => planned.range.end,
                Some(e) => self.content_end(e.end..planned.range.end),
                None => self.content_end(planned.range.clone()),
            };

            let mut pieces = Vec::new();
            match (&elided, token) {
                (Some(e), Some(t)) => {
                    self.text_pieces(planned.range.start..e.start, trailing_start, base_level, scale, &mut pieces);
                    pieces.push(Piece {
                        kind: SegmentKind::Token { token: t },
                        level: base_level,
                        width: tokens[t].token.width() * scale,
                        trailing: false,
                    });
                    self.text_pieces(e.end..planned.range.end, trailing_start, base_level, scale, &mut pieces);
                }
                _ => self.text_pieces(planned.range.clone(), trailing_start, base_level, scale, &mut pieces),
            }

            for piece in &pieces {
                content_flags |= match &piece.kind {
                    SegmentKind::Text { run, .. } => {
                        self.shaped.span_attributes(self.shaped.runs()[*run].span).flags()
                    }
                    SegmentKind::Token { token } => tokens[*token].attributes().flags(),
                };
            }

            let total: f32 = pieces.iter().map(|p| p.width).sum();
            let trailing_width: f32 = pieces.iter().filter(|p| p.trailing).map(|p| p.width).sum();
            let content_width = total - trailing_width;
            let alignment = match paragraph.style.alignment {
                TextAlignment::Natural if paragraph.direction.is_rtl() => TextAlignment::Right,
                TextAlignment::Natural => TextAlignment::Left,
                alignment => alignment,
            };
            let x = match alignment {
                TextAlignment::Right => self.width - content_width,
                TextAlignment::Center => (self.width - content_width) / 2.0,
                _ => 0.0,
            };

            let levels: Vec<u8> = pieces.iter().map(|p| p.level).collect();
            let mut slots: Vec<Option<Piece>> = pieces.into_iter().map(Some).collect();
            let mut cursor = if paragraph.direction.is_rtl() { x - trailing_width } else { x };
            let mut segments = Vec::with_capacity(slots.len());
            for logical in visual_order(&levels) {
                let Some(piece) = slots[logical].take() else {
                    continue;
                };
                segments.push(LineSegment {
                    kind: piece.kind,
                    level: piece.level,
                    x: cursor,
                    width: piece.width,
                });
                cursor += piece.width;
            }

            let metrics = planned.metrics;
            let baseline = match lines.last() {
                Some(previous) => {
                    previous.baseline + previous.descent + previous.leading + metrics.ascent
                }
                None => metrics.ascent,
            };
            lines.push(TextFrameLine {
                index,
                range: planned.range,
                trailing_whitespace_start: trailing_start,
                paragraph: planned.paragraph,
                baseline,
                ascent: metrics.ascent,
                descent: metrics.descent,
                leading: metrics.leading,
                x,
                width: content_width,
                alignment,
                direction: paragraph.direction,
                token,
                segments,
            });
        }

        let consistent_alignment = {
            let mut alignments = lines.iter().map(|l| match l.alignment {
                TextAlignment::Right => ConsistentAlignment::Right,
                TextAlignment::Center => ConsistentAlignment::Center,
                _ => ConsistentAlignment::Left,
            });
            match alignments.next() {
                Some(first) if alignments.all(|a| a == first) => first,
                _ => ConsistentAlignment::None,
            }
        };
        let layout_bounds = lines
            .iter()
            .map(TextFrameLine::typographic_bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Rect::ZERO);

        Ok(LayoutOutput {
            lines,
            tokens,
            range_in_original: self.range.start..range_end,
            scale,
            layout_flags: flags,
            content_flags,
            consistent_alignment,
            layout_bounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::attributes::{AttributedText, ParagraphStyle, TextAttributes};
    use crate::text::font::{Font, FontFamily};
    use crate::text::shaper::FixedPitchShaper;

    fn attrs() -> TextAttributes {
        TextAttributes::new(Font::new(FontFamily::SansSerif, 10.0))
    }

    fn shaped(text: &str) -> ShapedText {
        ShapedText::new(&AttributedText::plain(text, attrs()), &FixedPitchShaper::new())
    }

    fn run(text: &ShapedText, size: Size, options: &TextFrameOptions) -> LayoutOutput {
        layout(text, 0..text.len_utf16(), size, options, None).unwrap()
    }

    fn line_texts(text: &ShapedText, output: &LayoutOutput) -> Vec<String> {
        output
            .lines
            .iter()
            .map(|l| text.substring(l.range.clone()).to_string())
            .collect()
    }

    #[test]
    fn word_wrapping_keeps_trailing_spaces_on_the_line() {
        let text = shaped("Hello world again");
        let output = run(&text, Size::new(40.0, 100.0), &TextFrameOptions::default());
        assert_eq!(line_texts(&text, &output), ["Hello ", "world ", "again"]);
        assert_eq!(output.lines[0].width, 25.0);
        assert_eq!(output.lines[0].trailing_whitespace_start, 5);
        assert_eq!(output.lines[1].baseline, 18.0);
    }

    #[test]
    fn overlong_words_break_between_clusters() {
        let text = shaped("abcdefghij");
        let output = run(&text, Size::new(22.0, 100.0), &TextFrameOptions::default());
        assert_eq!(line_texts(&text, &output), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn character_mode_ignores_word_boundaries() {
        let text = shaped("ab cdef");
        let options = TextFrameOptions::new().line_break_mode(LineBreakMode::Character);
        let output = run(&text, Size::new(25.0, 100.0), &options);
        assert_eq!(line_texts(&text, &output), ["ab cd", "ef"]);
    }

    #[test]
    fn terminators_end_lines() {
        let text = shaped("one\ntwo\u{2028}three");
        let output = run(&text, Size::new(200.0, 100.0), &TextFrameOptions::default());
        assert_eq!(line_texts(&text, &output), ["one\n", "two\u{2028}", "three"]);
        assert_eq!(output.lines[0].paragraph, 0);
        assert_eq!(output.lines[2].paragraph, 1);
    }

    #[test]
    fn height_limits_lines_but_keeps_the_first() {
        let text = shaped("aa bb cc");
        let output = run(&text, Size::new(12.0, 5.0), &TextFrameOptions::default());
        assert_eq!(output.lines.len(), 1);
        assert!(output.layout_flags.contains(LayoutFlags::IS_TRUNCATED));
    }

    #[test]
    fn start_truncation_keeps_the_tail() {
        let text = shaped("abcdefghijklmnop");
        let options = TextFrameOptions::new()
            .max_line_count(1)
            .last_line_truncation_mode(TruncationMode::Start);
        let output = run(&text, Size::new(30.0, 100.0), &options);
        assert_eq!(output.tokens[0].elided, 0..11);
        assert_eq!(output.lines[0].range, 0..16);
    }

    #[test]
    fn middle_truncation_balances_head_and_tail() {
        let text = shaped("abcdefghijklmnop");
        let options = TextFrameOptions::new()
            .max_line_count(1)
            .last_line_truncation_mode(TruncationMode::Middle);
        let output = run(&text, Size::new(30.0, 100.0), &options);
        assert_eq!(output.tokens[0].elided, 3..14);
    }

    #[test]
    fn middle_truncation_across_paragraphs_truncates_the_end() {
        let text = shaped("abcdefgh\nijklmnop");
        let options = TextFrameOptions::new()
            .max_line_count(1)
            .last_line_truncation_mode(TruncationMode::Middle);
        let output = run(&text, Size::new(30.0, 100.0), &options);
        assert_eq!(output.tokens[0].elided, 5..17);
    }

    #[test]
    fn clip_drops_text_without_a_token() {
        let text = shaped("aa bb cc");
        let options = TextFrameOptions::new()
            .max_line_count(1)
            .last_line_truncation_mode(TruncationMode::Clip);
        let output = run(&text, Size::new(12.0, 100.0), &options);
        assert!(output.tokens.is_empty());
        assert_eq!(output.range_in_original, 0..3);
        assert!(output.layout_flags.contains(LayoutFlags::IS_TRUNCATED));
    }

    #[test]
    fn paragraph_scope_truncates_inside_the_frame() {
        let style = ParagraphStyle::new().truncation_scope(1, TruncationMode::End);
        let attributed = AttributedText::plain("aaaa bbbb cccc\nnext", attrs())
            .with_paragraph_style(0..1, style);
        let text = ShapedText::new(&attributed, &FixedPitchShaper::new());
        let output = run(&text, Size::new(30.0, 100.0), &TextFrameOptions::default());
        assert_eq!(output.lines.len(), 2);
        assert_eq!(output.tokens.len(), 1);
        assert_eq!(output.tokens[0].elided, 4..14);
        assert_eq!(output.lines[0].range, 0..15);
        assert_eq!(output.lines[1].range, 15..19);
        assert!(output.layout_flags.contains(LayoutFlags::IS_TRUNCATED));
    }

    #[test]
    fn alignment_positions_lines() {
        let attributed = AttributedText::plain("ab\ncd", attrs())
            .with_paragraph_style(0..1, ParagraphStyle::new().alignment(TextAlignment::Center))
            .with_paragraph_style(3..4, ParagraphStyle::new().alignment(TextAlignment::Right));
        let text = ShapedText::new(&attributed, &FixedPitchShaper::new());
        let output = run(&text, Size::new(100.0, 100.0), &TextFrameOptions::default());
        assert_eq!(output.lines[0].x, 45.0);
        assert_eq!(output.lines[1].x, 90.0);
        assert_eq!(output.consistent_alignment, ConsistentAlignment::None);
        assert_eq!(output.layout_bounds, Rect::from_edges(45.0, 0.0, 100.0, 20.0));
    }

    #[test]
    fn mixed_direction_segments_are_in_visual_order() {
        let text = shaped("\u{5D0}\u{5D1} ab \u{5D2}\u{5D3}");
        let output = run(&text, Size::new(100.0, 100.0), &TextFrameOptions::default());
        let line = &output.lines[0];
        assert!(line.direction.is_rtl());
        let levels: Vec<u8> = line.segments.iter().map(|s| s.level).collect();
        assert_eq!(levels, [1, 2, 1]);
        let xs: Vec<f32> = line.segments.iter().map(|s| s.x).collect();
        assert_eq!(xs, [60.0, 75.0, 85.0]);
        let starts: Vec<usize> = line
            .segments
            .iter()
            .filter_map(|s| match &s.kind {
                SegmentKind::Text { clusters, .. } => Some(text.clusters()[clusters.start].start),
                SegmentKind::Token { .. } => None,
            })
            .collect();
        assert_eq!(starts, [5, 3, 0]);
    }

    #[test]
    fn maximum_typographic_width_narrows_lines() {
        let text = shaped("aa bb");
        let options = TextFrameOptions::new().maximum_typographic_width(15.0);
        let output = run(&text, Size::new(100.0, 100.0), &options);
        assert_eq!(output.lines.len(), 2);
        assert!(output.layout_flags.contains(LayoutFlags::HAS_MAX_TYPOGRAPHIC_WIDTH));
    }

    #[test]
    fn cancelled_layout_fails() {
        let text = shaped("abc");
        let flag = CancellationFlag::new();
        flag.cancel();
        let result = layout(&text, 0..3, Size::new(100.0, 100.0), &TextFrameOptions::default(), Some(&flag));
        assert!(matches!(result, Err(TextFrameError::Cancelled)));
    }
}
