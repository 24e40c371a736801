//! Bidirectional text support.
//!
//! Embedding levels come from the Unicode Bidirectional Algorithm as
//! implemented by `unicode-bidi`. Line layout reorders runs visually with
//! [`visual_order`], which applies rule L2 to a sequence of run levels
//! through [`BidiInfo::reorder_visual`].
//!
//! # Example
//!
//! ```
//! use horizon_lattice_textframe::text::{WritingDirection, detect_base_direction};
//!
//! assert_eq!(detect_base_direction("Hello"), Some(WritingDirection::LeftToRight));
//! assert_eq!(detect_base_direction("שלום"), Some(WritingDirection::RightToLeft));
//! assert_eq!(detect_base_direction("123"), None);
//! ```

use unicode_bidi::{BidiClass, BidiInfo, Level, bidi_class};

/// Writing direction of a paragraph, line or glyph run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl WritingDirection {
    #[inline]
    pub fn is_rtl(self) -> bool {
        self == WritingDirection::RightToLeft
    }

    /// Direction of an embedding level (odd levels are right-to-left).
    #[inline]
    pub fn from_level(level: u8) -> Self {
        if level % 2 == 1 {
            WritingDirection::RightToLeft
        } else {
            WritingDirection::LeftToRight
        }
    }

    /// Base embedding level for this direction.
    #[inline]
    pub fn level(self) -> u8 {
        match self {
            WritingDirection::LeftToRight => 0,
            WritingDirection::RightToLeft => 1,
        }
    }
}

/// Detect the base direction from the first strong character.
///
/// Returns `None` when the text contains no strong directional character.
pub fn detect_base_direction(text: &str) -> Option<WritingDirection> {
    text.chars().find_map(|c| match bidi_class(c) {
        BidiClass::L => Some(WritingDirection::LeftToRight),
        BidiClass::R | BidiClass::AL => Some(WritingDirection::RightToLeft),
        _ => None,
    })
}

/// Resolve embedding levels for one paragraph.
///
/// Returns the resolved paragraph direction and one level per byte of
/// `text`. Without an explicit `base`, the direction follows the first
/// strong character and falls back to left-to-right.
pub(crate) fn paragraph_levels(
    text: &str,
    base: Option<WritingDirection>,
) -> (WritingDirection, Vec<u8>) {
    let base = base.or_else(|| detect_base_direction(text)).unwrap_or_default();
    if text.is_empty() {
        return (base, Vec::new());
    }
    let default_level = match base {
        WritingDirection::LeftToRight => Level::ltr(),
        WritingDirection::RightToLeft => Level::rtl(),
    };
    let info = BidiInfo::new(text, Some(default_level));
    let levels = info.levels.iter().map(|level| level.number()).collect();
    (base, levels)
}

/// Visual order of a sequence of runs given their embedding levels.
///
/// Element `i` of the result is the logical index of the run displayed at
/// visual position `i`, counted from the left.
pub(crate) fn visual_order(levels: &[u8]) -> Vec<usize> {
    if levels.is_empty() {
        return Vec::new();
    }
    let levels: Vec<Level> = levels
        .iter()
        .map(|&level| Level::new(level).unwrap_or_else(|_| Level::ltr()))
        .collect();
    BidiInfo::reorder_visual(&levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_direction() {
        assert_eq!(
            detect_base_direction("  abc"),
            Some(WritingDirection::LeftToRight)
        );
        assert_eq!(
            detect_base_direction("123 مرحبا"),
            Some(WritingDirection::RightToLeft)
        );
        assert_eq!(detect_base_direction(""), None);
    }

    #[test]
    fn levels_for_mixed_text() {
        let text = "ab אב";
        let (base, levels) = paragraph_levels(text, None);
        assert_eq!(base, WritingDirection::LeftToRight);
        assert_eq!(levels.len(), text.len());
        assert_eq!(levels[0], 0);
        assert_eq!(*levels.last().unwrap(), 1);
    }

    #[test]
    fn explicit_base_direction_wins() {
        let (base, levels) = paragraph_levels("abc", Some(WritingDirection::RightToLeft));
        assert_eq!(base, WritingDirection::RightToLeft);
        assert!(levels.iter().all(|&l| l == 2));
    }

    #[test]
    fn visual_order_reverses_rtl_runs() {
        assert_eq!(visual_order(&[0, 0, 0]), vec![0, 1, 2]);
        assert_eq!(visual_order(&[1, 1, 1]), vec![2, 1, 0]);
        assert_eq!(visual_order(&[0, 1, 1, 0]), vec![0, 2, 1, 3]);
        assert_eq!(visual_order(&[1, 2, 1]), vec![2, 1, 0]);
        assert_eq!(visual_order(&[0, 1, 2, 2, 1, 0]), vec![0, 4, 2, 3, 1, 5]);
        assert!(visual_order(&[]).is_empty());
    }

    #[test]
    fn direction_levels() {
        assert_eq!(WritingDirection::from_level(3), WritingDirection::RightToLeft);
        assert_eq!(WritingDirection::RightToLeft.level(), 1);
        assert!(!WritingDirection::LeftToRight.is_rtl());
    }
}
