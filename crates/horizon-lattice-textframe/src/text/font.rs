//! Font descriptors and metrics.
//!
//! A [`Font`] describes what to shape with; it does not own font data. The
//! [`GlyphShaper`](super::GlyphShaper) resolves it to concrete faces and
//! reports resolved [`LineMetrics`] for every shaped run.

use std::fmt;

/// Font weight, typically ranging from 100 (thin) to 900 (black).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: Self = Self(100);
    pub const LIGHT: Self = Self(300);
    pub const NORMAL: Self = Self(400);
    pub const MEDIUM: Self = Self(500);
    pub const SEMI_BOLD: Self = Self(600);
    pub const BOLD: Self = Self(700);
    pub const BLACK: Self = Self(900);

    /// Create a font weight from a numeric value (100-900).
    pub fn new(weight: u16) -> Self {
        Self(weight.clamp(100, 900))
    }

    /// Convert to cosmic-text Weight.
    pub fn to_cosmic(self) -> cosmic_text::Weight {
        cosmic_text::Weight(self.0)
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Font style (normal, italic, or oblique).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    /// Convert to cosmic-text Style.
    pub fn to_cosmic(self) -> cosmic_text::Style {
        match self {
            FontStyle::Normal => cosmic_text::Style::Normal,
            FontStyle::Italic => cosmic_text::Style::Italic,
            FontStyle::Oblique => cosmic_text::Style::Oblique,
        }
    }
}

/// Font stretch (condensed to expanded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStretch {
    Condensed,
    SemiCondensed,
    #[default]
    Normal,
    SemiExpanded,
    Expanded,
}

impl FontStretch {
    /// Convert to cosmic-text Stretch.
    pub fn to_cosmic(self) -> cosmic_text::Stretch {
        match self {
            FontStretch::Condensed => cosmic_text::Stretch::Condensed,
            FontStretch::SemiCondensed => cosmic_text::Stretch::SemiCondensed,
            FontStretch::Normal => cosmic_text::Stretch::Normal,
            FontStretch::SemiExpanded => cosmic_text::Stretch::SemiExpanded,
            FontStretch::Expanded => cosmic_text::Stretch::Expanded,
        }
    }
}

/// Font family specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FontFamily {
    /// A specific font family by name.
    Name(String),
    Serif,
    #[default]
    SansSerif,
    Monospace,
}

impl FontFamily {
    /// Create a named font family.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Convert to cosmic-text Family.
    pub fn to_cosmic(&self) -> cosmic_text::Family<'_> {
        match self {
            FontFamily::Name(name) => cosmic_text::Family::Name(name.as_str()),
            FontFamily::Serif => cosmic_text::Family::Serif,
            FontFamily::SansSerif => cosmic_text::Family::SansSerif,
            FontFamily::Monospace => cosmic_text::Family::Monospace,
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontFamily::Name(name) => write!(f, "{}", name),
            FontFamily::Serif => write!(f, "serif"),
            FontFamily::SansSerif => write!(f, "sans-serif"),
            FontFamily::Monospace => write!(f, "monospace"),
        }
    }
}

/// A font specification: family, size and style.
///
/// # Example
///
/// ```
/// use horizon_lattice_textframe::text::{Font, FontFamily, FontWeight};
///
/// let body = Font::new(FontFamily::SansSerif, 15.0);
/// let bold = body.with_weight(FontWeight::BOLD);
/// assert_eq!(bold.size(), 15.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    family: FontFamily,
    size: f32,
    weight: FontWeight,
    style: FontStyle,
    stretch: FontStretch,
}

impl Font {
    /// Create a new font with the given family and size in points.
    pub fn new(family: FontFamily, size: f32) -> Self {
        Self {
            family,
            size,
            weight: FontWeight::NORMAL,
            style: FontStyle::Normal,
            stretch: FontStretch::Normal,
        }
    }

    pub fn family(&self) -> &FontFamily {
        &self.family
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn stretch(&self) -> FontStretch {
        self.stretch
    }

    /// Create a copy with a different size.
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Create a copy with a different weight.
    pub fn with_weight(&self, weight: FontWeight) -> Self {
        Self {
            weight,
            ..self.clone()
        }
    }

    /// Create a copy with a different style.
    pub fn with_style(&self, style: FontStyle) -> Self {
        Self {
            style,
            ..self.clone()
        }
    }

    /// Convert to cosmic-text Attrs for text shaping.
    pub fn to_attrs(&self) -> cosmic_text::Attrs<'_> {
        cosmic_text::Attrs::new()
            .family(self.family.to_cosmic())
            .weight(self.weight.to_cosmic())
            .style(self.style.to_cosmic())
            .stretch(self.stretch.to_cosmic())
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new(FontFamily::SansSerif, 16.0)
    }
}

/// Font metrics in font units, as read from a face.
///
/// Values need to be scaled by `size / units_per_em`; see [`FontMetrics::scaled`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    /// Distance from the baseline to the top of the highest glyph.
    pub ascent: i16,
    /// Distance from the baseline to the lowest glyph (typically negative).
    pub descent: i16,
    pub line_gap: i16,
    /// Underline position relative to the baseline (typically negative).
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub strikeout_position: i16,
    pub strikeout_thickness: i16,
}

impl FontMetrics {
    /// Resolve these metrics for a font size.
    pub fn scaled(&self, font_size: f32) -> LineMetrics {
        if self.units_per_em == 0 {
            return LineMetrics::approximate(font_size);
        }
        let k = font_size / self.units_per_em as f32;
        let fallback = LineMetrics::approximate(font_size);
        let thickness = |units: i16, fallback: f32| {
            if units > 0 { units as f32 * k } else { fallback }
        };
        LineMetrics {
            ascent: self.ascent as f32 * k,
            descent: -(self.descent as f32) * k,
            leading: (self.line_gap as f32 * k).max(0.0),
            underline_offset: if self.underline_position != 0 {
                -(self.underline_position as f32) * k
            } else {
                fallback.underline_offset
            },
            underline_thickness: thickness(self.underline_thickness, fallback.underline_thickness),
            strikethrough_offset: if self.strikeout_position != 0 {
                -(self.strikeout_position as f32) * k
            } else {
                fallback.strikethrough_offset
            },
            strikethrough_thickness: thickness(
                self.strikeout_thickness,
                fallback.strikethrough_thickness,
            ),
        }
    }
}

/// Resolved vertical metrics of a run in points, y axis down.
///
/// `descent` is positive below the baseline. Decoration offsets are relative
/// to the baseline, so the underline offset is positive and the strikethrough
/// offset negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    pub underline_offset: f32,
    pub underline_thickness: f32,
    pub strikethrough_offset: f32,
    pub strikethrough_thickness: f32,
}

impl LineMetrics {
    /// Typical proportions for a font without readable metrics.
    pub fn approximate(font_size: f32) -> Self {
        Self {
            ascent: font_size * 0.8,
            descent: font_size * 0.2,
            leading: 0.0,
            underline_offset: font_size * 0.1,
            underline_thickness: font_size * 0.05,
            strikethrough_offset: -font_size * 0.3,
            strikethrough_thickness: font_size * 0.05,
        }
    }

    /// Ascent plus descent plus leading.
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.leading
    }

    /// Multiply every metric by `factor`.
    pub fn scaled_by(&self, factor: f32) -> Self {
        Self {
            ascent: self.ascent * factor,
            descent: self.descent * factor,
            leading: self.leading * factor,
            underline_offset: self.underline_offset * factor,
            underline_thickness: self.underline_thickness * factor,
            strikethrough_offset: self.strikethrough_offset * factor,
            strikethrough_thickness: self.strikethrough_thickness * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_copies() {
        let font = Font::new(FontFamily::name("Inter"), 12.0);
        let big = font.with_size(24.0).with_style(FontStyle::Italic);
        assert_eq!(big.size(), 24.0);
        assert_eq!(big.style(), FontStyle::Italic);
        assert_eq!(big.family(), &FontFamily::Name("Inter".into()));
        assert_eq!(font.size(), 12.0);
    }

    #[test]
    fn weight_is_clamped() {
        assert_eq!(FontWeight::new(50), FontWeight::THIN);
        assert_eq!(FontWeight::new(1000), FontWeight::BLACK);
    }

    #[test]
    fn metrics_scale_to_points() {
        let metrics = FontMetrics {
            units_per_em: 1000,
            ascent: 800,
            descent: -200,
            line_gap: 100,
            underline_position: -100,
            underline_thickness: 50,
            strikeout_position: 300,
            strikeout_thickness: 0,
        };
        let scaled = metrics.scaled(10.0);
        assert_eq!(scaled.ascent, 8.0);
        assert_eq!(scaled.descent, 2.0);
        assert_eq!(scaled.leading, 1.0);
        assert_eq!(scaled.underline_offset, 1.0);
        assert_eq!(scaled.underline_thickness, 0.5);
        assert_eq!(scaled.strikethrough_offset, -3.0);
        assert_eq!(scaled.strikethrough_thickness, 0.5);
        assert_eq!(scaled.height(), 11.0);
    }

    #[test]
    fn scaled_by_halves() {
        let m = LineMetrics::approximate(20.0).scaled_by(0.5);
        assert_eq!(m.ascent, 8.0);
        assert_eq!(m.descent, 2.0);
    }
}
