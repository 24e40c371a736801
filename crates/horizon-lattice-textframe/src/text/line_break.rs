//! Line break opportunities (Unicode Line Breaking Algorithm, UAX #14).
//!
//! Wraps `unicode-linebreak` and reports positions as UTF-16 offsets. An
//! opportunity at offset `n` means a line may end before the unit at `n`.

use unicode_linebreak::{BreakOpportunity as UnicodeBreakOpportunity, linebreaks};

use super::utf16::Utf16Index;

/// Whether a break is required or merely allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakType {
    /// The line must end here (after a newline or separator).
    Mandatory,
    /// The line may end here when wrapping.
    Allowed,
}

/// A position where a line may or must end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakOpportunity {
    /// UTF-16 offset of the first unit after the break.
    pub offset: usize,
    pub break_type: BreakType,
}

/// Find all break opportunities of `text`, in ascending order.
///
/// The end of the text is always reported as a mandatory break.
pub(crate) fn find_break_opportunities(text: &str, index: &Utf16Index) -> Vec<BreakOpportunity> {
    linebreaks(text)
        .map(|(byte, kind)| BreakOpportunity {
            offset: index.to_utf16(byte),
            break_type: match kind {
                UnicodeBreakOpportunity::Mandatory => BreakType::Mandatory,
                UnicodeBreakOpportunity::Allowed => BreakType::Allowed,
            },
        })
        .collect()
}

/// Look up the break at exactly `offset` in a sorted opportunity list.
pub(crate) fn break_at(breaks: &[BreakOpportunity], offset: usize) -> Option<BreakType> {
    breaks
        .binary_search_by_key(&offset, |b| b.offset)
        .ok()
        .map(|i| breaks[i].break_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaks(text: &str) -> Vec<BreakOpportunity> {
        find_break_opportunities(text, &Utf16Index::new(text))
    }

    #[test]
    fn breaks_after_spaces() {
        let found = breaks("Hello world");
        assert_eq!(
            found,
            vec![
                BreakOpportunity {
                    offset: 6,
                    break_type: BreakType::Allowed
                },
                BreakOpportunity {
                    offset: 11,
                    break_type: BreakType::Mandatory
                },
            ]
        );
    }

    #[test]
    fn newline_is_mandatory() {
        let found = breaks("a\nb");
        assert_eq!(break_at(&found, 2), Some(BreakType::Mandatory));
        assert_eq!(break_at(&found, 1), None);
    }

    #[test]
    fn offsets_are_utf16() {
        // "é" takes two bytes but a single UTF-16 unit.
        let found = breaks("é é");
        assert_eq!(break_at(&found, 2), Some(BreakType::Allowed));
        assert_eq!(break_at(&found, 3), Some(BreakType::Mandatory));
    }
}
