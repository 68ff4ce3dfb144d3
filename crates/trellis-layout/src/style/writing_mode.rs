//! Writing modes and inline base direction.
//!
//! [§ 2 Block Flow Direction](https://www.w3.org/TR/css-writing-modes-4/#block-flow)

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// [§ 2 Block Flow Direction](https://www.w3.org/TR/css-writing-modes-4/#block-flow)
///
/// "The writing-mode property specifies whether lines of text are laid out
/// horizontally or vertically and the direction in which blocks progress."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WritingMode {
    /// [§ 2](https://www.w3.org/TR/css-writing-modes-4/#valdef-writing-mode-horizontal-tb)
    ///
    /// "Top-to-bottom block flow direction. Both the writing mode and the
    /// typographic mode are horizontal."
    ///
    /// Mapping:
    ///   - block-start  → top
    ///   - line-left    → left
    #[default]
    HorizontalTb,

    /// [§ 2](https://www.w3.org/TR/css-writing-modes-4/#valdef-writing-mode-vertical-rl)
    ///
    /// "Right-to-left block flow direction. Both the writing mode and the
    /// typographic mode are vertical."
    ///
    /// Mapping:
    ///   - block-start  → right
    ///   - line-left    → top
    VerticalRl,

    /// [§ 2](https://www.w3.org/TR/css-writing-modes-4/#valdef-writing-mode-vertical-lr)
    ///
    /// "Left-to-right block flow direction. Both the writing mode and the
    /// typographic mode are vertical."
    ///
    /// Mapping:
    ///   - block-start  → left
    ///   - line-left    → top
    VerticalLr,
}

impl WritingMode {
    /// True when lines run horizontally.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::HorizontalTb)
    }

    /// True when block flow runs against the physical axis (vertical-rl).
    ///
    /// Layout stores these coordinates unflipped; painters mirror the block
    /// axis themselves.
    #[must_use]
    pub const fn is_flipped_blocks(self) -> bool {
        matches!(self, Self::VerticalRl)
    }
}

/// [§ 2.1 Specifying Directionality](https://www.w3.org/TR/css-writing-modes-4/#direction)
///
/// "This property specifies the inline base direction or directionality of
/// any bidi paragraph, embedding, isolate, or override established by the box."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Direction {
    /// "Left-to-right directionality."
    #[default]
    Ltr,
    /// "Right-to-left directionality."
    Rtl,
}

impl Direction {
    /// True for right-to-left.
    #[must_use]
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Rtl)
    }

    /// Direction of a bidi embedding level (odd levels are right-to-left).
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        if level % 2 == 1 { Self::Rtl } else { Self::Ltr }
    }
}

/// [§ 2.2 Embeddings and Overrides](https://www.w3.org/TR/css-writing-modes-4/#unicode-bidi)
///
/// "The unicode-bidi property specifies how the box interacts with the
/// bidirectional algorithm."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum UnicodeBidi {
    /// "The box does not open an additional level of embedding."
    #[default]
    Normal,
    /// "If the box is inline, this value creates a directional embedding."
    Embed,
    /// "The contents of the box are considered to be inside a separate,
    /// independent paragraph."
    Isolate,
    /// "This creates a directional override for inline boxes."
    BidiOverride,
    /// "This combines the isolation behavior of isolate with the
    /// directional override behavior of bidi-override."
    IsolateOverride,
    /// "Each paragraph's base direction is determined from its content."
    Plaintext,
}

/// Baseline used to align inline content within a line.
///
/// [§ 4.1 Dominant Baseline](https://www.w3.org/TR/css-inline-3/#dominant-baseline-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DominantBaseline {
    /// Alphabetic in horizontal writing modes, ideographic in vertical ones.
    #[default]
    Auto,
    /// "Use the alphabetic baseline."
    Alphabetic,
    /// "Use the ideographic-under baseline."
    Ideographic,
}

impl DominantBaseline {
    /// Resolve `auto` against the writing mode.
    #[must_use]
    pub const fn resolve(self, writing_mode: WritingMode) -> BaselineType {
        match self {
            Self::Alphabetic => BaselineType::Alphabetic,
            Self::Ideographic => BaselineType::Ideographic,
            Self::Auto => {
                if writing_mode.is_horizontal() {
                    BaselineType::Alphabetic
                } else {
                    BaselineType::Ideographic
                }
            }
        }
    }
}

/// A resolved dominant baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineType {
    /// Latin-style baseline under most glyphs.
    Alphabetic,
    /// Bottom edge of the ideographic em box.
    Ideographic,
}
