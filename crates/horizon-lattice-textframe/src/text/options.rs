//! Layout options for text frames.

use std::sync::Arc;

use super::shaped::ShapedToken;

/// How lines are broken when text exceeds the frame width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineBreakMode {
    /// Break at word boundaries; overlong words break between grapheme clusters.
    #[default]
    Word,
    /// Break between any two grapheme clusters.
    Character,
}

/// Where a truncation token replaces text on the last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TruncationMode {
    /// Keep the head and replace the tail.
    #[default]
    End,
    /// Keep head and tail and replace the middle of the last line's paragraph.
    Middle,
    /// Keep the tail of the last line's paragraph and replace its head.
    Start,
    /// Drop the overflowing text without a token.
    Clip,
}

/// Options controlling how a [`TextFrame`](super::TextFrame) is laid out.
///
/// # Example
///
/// ```
/// use horizon_lattice_textframe::text::{TextFrameOptions, TruncationMode};
///
/// let options = TextFrameOptions::new()
///     .max_line_count(2)
///     .last_line_truncation_mode(TruncationMode::Middle)
///     .minimum_text_scale_factor(0.5);
/// assert_eq!(options.max_line_count, 2);
/// ```
#[derive(Debug, Clone)]
pub struct TextFrameOptions {
    /// Maximum number of lines; 0 means unlimited.
    pub max_line_count: usize,
    pub line_break_mode: LineBreakMode,
    pub last_line_truncation_mode: TruncationMode,
    /// Token for the last line; "…" in the attributes at the truncation
    /// point when `None`.
    pub truncation_token: Option<Arc<ShapedToken>>,
    /// Smallest text scale factor the fit search may use, in `(0, 1]`.
    pub minimum_text_scale_factor: f32,
    /// Granularity of the fit search, in `(0, 1]`.
    pub text_scale_factor_step_size: f32,
    /// Upper bound of the layout width regardless of the frame width.
    pub maximum_typographic_width: Option<f32>,
}

impl Default for TextFrameOptions {
    fn default() -> Self {
        Self {
            max_line_count: 0,
            line_break_mode: LineBreakMode::Word,
            last_line_truncation_mode: TruncationMode::End,
            truncation_token: None,
            minimum_text_scale_factor: 1.0,
            text_scale_factor_step_size: 1.0 / 128.0,
            maximum_typographic_width: None,
        }
    }
}

impl TextFrameOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of lines (0 for unlimited).
    pub fn max_line_count(mut self, count: usize) -> Self {
        self.max_line_count = count;
        self
    }

    pub fn line_break_mode(mut self, mode: LineBreakMode) -> Self {
        self.line_break_mode = mode;
        self
    }

    pub fn last_line_truncation_mode(mut self, mode: TruncationMode) -> Self {
        self.last_line_truncation_mode = mode;
        self
    }

    pub fn truncation_token(mut self, token: ShapedToken) -> Self {
        self.truncation_token = Some(Arc::new(token));
        self
    }

    /// Allow shrinking the text down to `factor` to make it fit.
    pub fn minimum_text_scale_factor(mut self, factor: f32) -> Self {
        self.minimum_text_scale_factor = factor;
        self
    }

    pub fn text_scale_factor_step_size(mut self, step: f32) -> Self {
        self.text_scale_factor_step_size = step;
        self
    }

    pub fn maximum_typographic_width(mut self, width: f32) -> Self {
        self.maximum_typographic_width = Some(width);
        self
    }

    /// Effective line limit, `usize::MAX` when unlimited.
    pub(crate) fn line_limit(&self) -> usize {
        if self.max_line_count == 0 {
            usize::MAX
        } else {
            self.max_line_count
        }
    }

    /// The minimum scale clamped to `(0, 1]`; invalid values mean 1.
    pub(crate) fn clamped_minimum_scale(&self) -> f32 {
        let factor = self.minimum_text_scale_factor;
        if factor.is_finite() && factor > 0.0 {
            factor.min(1.0)
        } else {
            1.0
        }
    }

    /// The step clamped to `[1/1024, 1]`; invalid values mean the default.
    pub(crate) fn clamped_step(&self) -> f32 {
        let step = self.text_scale_factor_step_size;
        if step.is_finite() && step > 0.0 {
            step.clamp(1.0 / 1024.0, 1.0)
        } else {
            1.0 / 128.0
        }
    }

    /// The maximum typographic width when it is positive and finite.
    pub(crate) fn valid_maximum_width(&self) -> Option<f32> {
        self.maximum_typographic_width
            .filter(|w| w.is_finite() && *w > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = TextFrameOptions::default();
        assert_eq!(options.line_limit(), usize::MAX);
        assert_eq!(options.clamped_minimum_scale(), 1.0);
        assert_eq!(options.clamped_step(), 1.0 / 128.0);
        assert_eq!(options.valid_maximum_width(), None);
    }

    #[test]
    fn invalid_values_are_clamped() {
        let options = TextFrameOptions::new()
            .minimum_text_scale_factor(f32::NAN)
            .text_scale_factor_step_size(-1.0)
            .maximum_typographic_width(0.0);
        assert_eq!(options.clamped_minimum_scale(), 1.0);
        assert_eq!(options.clamped_step(), 1.0 / 128.0);
        assert_eq!(options.valid_maximum_width(), None);

        let options = TextFrameOptions::new()
            .minimum_text_scale_factor(4.0)
            .text_scale_factor_step_size(1e-9)
            .max_line_count(3);
        assert_eq!(options.clamped_minimum_scale(), 1.0);
        assert_eq!(options.clamped_step(), 1.0 / 1024.0);
        assert_eq!(options.line_limit(), 3);
    }
}
