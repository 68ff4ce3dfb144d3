//! Font metrics consumed by line breaking and line box construction.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."

use unicode_bidi::BidiClass;

use crate::style::Font;

/// Soft hyphen, an explicit hyphenation opportunity.
pub const SOFT_HYPHEN: char = '\u{00AD}';

/// Glyph drawn at the end of a line broken at a hyphenation opportunity.
pub const HYPHEN: &str = "\u{2010}";

/// Text measurement interface.
///
/// Implementors provide advance widths and vertical metrics; layout never
/// shapes text itself. Every method except [`Self::measure_run`] has a
/// default derived from the font size and the Unicode tables, so a minimal
/// provider only needs to measure.
pub trait FontMetrics {
    /// Total advance width of `text` in `font`.
    ///
    /// Soft hyphens and bidi formatting characters never reach this method.
    fn measure_run(&self, text: &str, font: &Font) -> f32;

    /// Height of the font's ascent above the alphabetic baseline.
    fn ascent(&self, font: &Font) -> f32 {
        font.size * 0.8
    }

    /// Depth of the font's descent below the alphabetic baseline.
    fn descent(&self, font: &Font) -> f32 {
        font.size * 0.2
    }

    /// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// "The initial value of 'line-height' is 'normal'. We recommend a used
    /// value for 'normal' between 1.0 and 1.2."
    fn normal_line_height(&self, font: &Font) -> f32 {
        font.size * 1.2
    }

    /// Height of lowercase letters, used by `vertical-align: middle`.
    fn x_height(&self, font: &Font) -> f32 {
        font.size * 0.5
    }

    /// Distance from the alphabetic baseline down to the ideographic one.
    fn ideographic_offset(&self, font: &Font) -> f32 {
        self.descent(font)
    }

    /// [UAX #14](https://www.unicode.org/reports/tr14/)
    ///
    /// True if a soft wrap opportunity exists between `before` and `after`.
    fn can_break_between(&self, before: char, after: char) -> bool {
        pair_break_opportunity(before, after)
    }

    /// [UAX #9](https://www.unicode.org/reports/tr9/) bidirectional class.
    fn bidi_class(&self, c: char) -> BidiClass {
        unicode_bidi::bidi_class(c)
    }

    /// Byte offsets inside `word` where `hyphens: auto` may break it.
    fn hyphenation_points(&self, word: &str) -> Vec<usize> {
        let _ = word;
        Vec::new()
    }
}

/// Runs the line breaking algorithm over just the two characters.
fn pair_break_opportunity(before: char, after: char) -> bool {
    let mut buffer = [0_u8; 8];
    let first_len = before.encode_utf8(&mut buffer).len();
    let second_len = after.encode_utf8(&mut buffer[first_len..]).len();
    let Ok(pair) = std::str::from_utf8(&buffer[..first_len + second_len]) else {
        return false;
    };
    unicode_linebreak::linebreaks(pair).any(|(offset, _)| offset == first_len)
}

/// Approximate font metrics using fixed ratios.
///
/// The average advance width of Latin glyphs in a proportional font is
/// approximately 0.6x the font size. Used as a fallback when no real
/// metrics are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn measure_run(&self, text: &str, font: &Font) -> f32 {
        const CHAR_WIDTH_RATIO: f32 = 0.6;
        text.chars().count() as f32 * font.size * CHAR_WIDTH_RATIO
    }
}

/// Every character advances by the same fixed width regardless of font
/// size. Deterministic text geometry for tests and the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthMetrics {
    advance: f32,
}

impl FixedWidthMetrics {
    /// Metrics where each character is `advance` pixels wide.
    #[must_use]
    pub const fn new(advance: f32) -> Self {
        Self { advance }
    }
}

impl FontMetrics for FixedWidthMetrics {
    fn measure_run(&self, text: &str, _font: &Font) -> f32 {
        text.chars().count() as f32 * self.advance
    }
}
