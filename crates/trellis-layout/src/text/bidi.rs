//! Bidirectional text resolution.
//!
//! [UAX #9: Unicode Bidirectional Algorithm](https://www.unicode.org/reports/tr9/)
//!
//! Embedding levels are resolved once per paragraph with `unicode-bidi`.
//! Lines are reordered here, after breaking: rule L1 resets trailing
//! whitespace on each line to the paragraph level and rule L2 reverses runs
//! from the highest level down.
//!
//! [§ 2.4 Applying the Bidi Algorithm](https://www.w3.org/TR/css-writing-modes-4/#bidi-algo)
//!
//! "UAs must apply the bidirectional algorithm ... to each sequence of
//! inline-level boxes uninterrupted by any block boundary or forced
//! paragraph break." Inline `unicode-bidi` values enter the algorithm as
//! the formatting characters in [`controls`], which are part of the
//! analyzed text but never measured.

use std::ops::Range;

use unicode_bidi::{BidiClass, BidiInfo, Level};

use crate::style::{Direction, UnicodeBidi};

/// Explicit formatting characters standing in for `unicode-bidi` values.
pub mod controls {
    /// LEFT-TO-RIGHT EMBEDDING
    pub const LRE: char = '\u{202A}';
    /// RIGHT-TO-LEFT EMBEDDING
    pub const RLE: char = '\u{202B}';
    /// POP DIRECTIONAL FORMATTING
    pub const PDF: char = '\u{202C}';
    /// LEFT-TO-RIGHT OVERRIDE
    pub const LRO: char = '\u{202D}';
    /// RIGHT-TO-LEFT OVERRIDE
    pub const RLO: char = '\u{202E}';
    /// LEFT-TO-RIGHT ISOLATE
    pub const LRI: char = '\u{2066}';
    /// RIGHT-TO-LEFT ISOLATE
    pub const RLI: char = '\u{2067}';
    /// FIRST STRONG ISOLATE
    pub const FSI: char = '\u{2068}';
    /// POP DIRECTIONAL ISOLATE
    pub const PDI: char = '\u{2069}';

    /// True for any explicit bidi formatting character.
    #[must_use]
    pub const fn is_control(c: char) -> bool {
        matches!(c, '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}')
    }
}

/// [§ 2.2 Embeddings and Overrides](https://www.w3.org/TR/css-writing-modes-4/#unicode-bidi)
///
/// Formatting characters opening and closing an inline box with the given
/// `unicode-bidi` and `direction`, or `None` for `normal`.
#[must_use]
pub const fn bracket_controls(
    unicode_bidi: UnicodeBidi,
    direction: Direction,
) -> Option<(&'static [char], &'static [char])> {
    use controls::{FSI, LRE, LRI, LRO, PDF, PDI, RLE, RLI, RLO};
    let rtl = direction.is_rtl();
    let pair: (&'static [char], &'static [char]) = match unicode_bidi {
        UnicodeBidi::Normal => return None,
        UnicodeBidi::Embed if rtl => (&[RLE], &[PDF]),
        UnicodeBidi::Embed => (&[LRE], &[PDF]),
        UnicodeBidi::BidiOverride if rtl => (&[RLO], &[PDF]),
        UnicodeBidi::BidiOverride => (&[LRO], &[PDF]),
        UnicodeBidi::Isolate if rtl => (&[RLI], &[PDI]),
        UnicodeBidi::Isolate => (&[LRI], &[PDI]),
        UnicodeBidi::Plaintext => (&[FSI], &[PDI]),
        // "This combines the isolation behavior of isolate with the
        // directional override behavior of bidi-override"
        UnicodeBidi::IsolateOverride if rtl => (&[RLI, RLO], &[PDF, PDI]),
        UnicodeBidi::IsolateOverride => (&[LRI, LRO], &[PDF, PDI]),
    };
    Some(pair)
}

/// Resolved embedding levels for one paragraph of inline content.
#[derive(Debug, Clone)]
pub struct BidiParagraph {
    /// One level per byte of the analyzed text; empty when the whole
    /// paragraph is at `base` (the left-to-right fast path).
    levels: Vec<u8>,
    classes: Vec<BidiClass>,
    base: u8,
}

impl BidiParagraph {
    /// Resolve levels for `text`. `plaintext` derives the base direction
    /// from the first strong character instead of `direction`.
    ///
    /// Paragraphs with nothing right-to-left in them and a left-to-right
    /// base skip the algorithm entirely.
    #[must_use]
    pub fn analyze(
        text: &str,
        direction: Direction,
        plaintext: bool,
        classify: impl Fn(char) -> BidiClass,
    ) -> Self {
        let needs_bidi = direction.is_rtl()
            || text.chars().any(|c| {
                matches!(
                    classify(c),
                    BidiClass::R
                        | BidiClass::AL
                        | BidiClass::AN
                        | BidiClass::RLE
                        | BidiClass::RLO
                        | BidiClass::RLI
                        | BidiClass::FSI
                )
            });
        if !needs_bidi {
            return Self {
                levels: Vec::new(),
                classes: Vec::new(),
                base: 0,
            };
        }

        let default_level = if plaintext {
            None
        } else if direction.is_rtl() {
            Some(Level::rtl())
        } else {
            Some(Level::ltr())
        };
        let info = BidiInfo::new(text, default_level);
        let base = info
            .paragraphs
            .first()
            .map_or_else(|| default_level.map_or(0, |l| l.number()), |p| p.level.number());
        Self {
            levels: info.levels.iter().map(|l| l.number()).collect(),
            classes: info.original_classes.clone(),
            base,
        }
    }

    /// True if every level equals the base level.
    #[must_use]
    pub fn is_unidirectional(&self) -> bool {
        self.levels.iter().all(|l| *l == self.base)
    }

    /// Paragraph embedding level.
    #[must_use]
    pub const fn base_level(&self) -> u8 {
        self.base
    }

    /// Paragraph direction.
    #[must_use]
    pub const fn base_direction(&self) -> Direction {
        Direction::from_level(self.base)
    }

    /// Level of the character starting at byte `offset`.
    #[must_use]
    pub fn level_at(&self, offset: usize) -> u8 {
        self.levels.get(offset).copied().unwrap_or(self.base)
    }

    /// Levels for the line `range`, with rule L1 applied: trailing
    /// whitespace and isolate formatting characters, and whitespace before
    /// segment or paragraph separators, drop to the paragraph level.
    #[must_use]
    pub fn line_levels(&self, range: Range<usize>) -> Vec<u8> {
        let len = range.end.saturating_sub(range.start);
        if self.levels.is_empty() {
            return vec![self.base; len];
        }
        let mut levels = self.levels[range.clone()].to_vec();
        let classes = &self.classes[range];
        let resets = |class: BidiClass| {
            matches!(
                class,
                BidiClass::WS
                    | BidiClass::FSI
                    | BidiClass::LRI
                    | BidiClass::RLI
                    | BidiClass::PDI
                    | BidiClass::BN
                    | BidiClass::LRE
                    | BidiClass::RLE
                    | BidiClass::LRO
                    | BidiClass::RLO
                    | BidiClass::PDF
            )
        };
        let mut trailing = true;
        for i in (0..levels.len()).rev() {
            match classes[i] {
                BidiClass::B | BidiClass::S => {
                    levels[i] = self.base;
                    trailing = true;
                }
                class if trailing && resets(class) => levels[i] = self.base,
                _ => trailing = false,
            }
        }
        levels
    }
}

/// [UAX #9 § 3.4 L2](https://www.unicode.org/reports/tr9/#L2)
///
/// "From the highest level found in the text to the lowest odd level on
/// each line, including intermediate levels not actually present in the
/// text, reverse any contiguous sequence of characters that are at that
/// level or higher."
///
/// Returns the visual order of items given their levels in logical order.
#[must_use]
pub fn reorder_visually(levels: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    let Some(&highest) = levels.iter().max() else {
        return order;
    };
    let Some(lowest_odd) = levels.iter().map(|l| l | 1).min() else {
        return order;
    };
    let mut level = highest;
    while level >= lowest_odd && level > 0 {
        let mut i = 0;
        while i < order.len() {
            if levels[order[i]] >= level {
                let start = i;
                while i < order.len() && levels[order[i]] >= level {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        level -= 1;
    }
    order
}
