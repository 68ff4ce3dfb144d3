//! Computed length values consumed by layout.
//!
//! [§ 6 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
//!
//! Style resolution happens upstream; the engine receives values that are
//! resolved "as far as possible without laying out the document", which
//! leaves `auto`, percentages and the intrinsic sizing keywords.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A computed length for sizing properties.
///
/// Serialized as a bare number (pixels), `"auto"`, `"<n>%"` or one of the
/// intrinsic keywords, so documents read the way style sheets do.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "LengthRepr")]
pub enum Length {
    /// [§ 4.4 Automatic values](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
    ///
    /// "This keyword allows the user agent to compute the value based on
    /// other properties."
    #[default]
    Auto,
    /// An absolute length in CSS pixels.
    Px(f32),
    /// A percentage of the containing block's corresponding dimension.
    Percent(f32),
    /// [§ 5.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
    ///
    /// "The smallest size a box could take that doesn't lead to overflow."
    MinContent,
    /// "A box's ideal size in a given axis when given infinite available space."
    MaxContent,
    /// [§ 5.1](https://www.w3.org/TR/css-sizing-3/#valdef-width-fit-content)
    ///
    /// "min(max-content size, max(min-content size, stretch-fit size))"
    FitContent,
}

impl Length {
    /// A zero pixel length.
    pub const ZERO: Self = Self::Px(0.0);

    /// True for `auto`.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// [§ 6.1 Used Values](https://www.w3.org/TR/css-cascade-4/#used)
    ///
    /// Resolve against `basis` (the containing block's size in the same axis).
    /// Returns `None` for `auto`, intrinsic keywords, and percentages of an
    /// indefinite basis; callers decide what those mean for their property.
    #[must_use]
    pub fn resolve(&self, basis: Option<f32>) -> Option<f32> {
        match *self {
            Self::Px(px) => Some(px),
            Self::Percent(pct) => basis.map(|b| b * pct / 100.0),
            Self::Auto | Self::MinContent | Self::MaxContent | Self::FitContent => None,
        }
    }

    /// Resolve against `basis`, substituting `default` where [`Self::resolve`]
    /// would return `None`.
    #[must_use]
    pub fn resolve_or(&self, basis: Option<f32>, default: f32) -> f32 {
        self.resolve(basis).unwrap_or(default)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Px(px) => write!(f, "{px}px"),
            Self::Percent(pct) => write!(f, "{pct}%"),
            Self::MinContent => f.write_str("min-content"),
            Self::MaxContent => f.write_str("max-content"),
            Self::FitContent => f.write_str("fit-content"),
        }
    }
}

/// Wire form of [`Length`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Px(f32),
    Keyword(String),
}

impl TryFrom<LengthRepr> for Length {
    type Error = String;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Px(px) => Ok(Self::Px(px)),
            LengthRepr::Keyword(word) => {
                let word = word.trim();
                match word {
                    "auto" => Ok(Self::Auto),
                    "min-content" => Ok(Self::MinContent),
                    "max-content" => Ok(Self::MaxContent),
                    "fit-content" => Ok(Self::FitContent),
                    _ => {
                        if let Some(pct) = word.strip_suffix('%') {
                            pct.trim()
                                .parse::<f32>()
                                .map(Self::Percent)
                                .map_err(|e| format!("invalid percentage '{word}': {e}"))
                        } else {
                            word.strip_suffix("px")
                                .unwrap_or(word)
                                .trim()
                                .parse::<f32>()
                                .map(Self::Px)
                                .map_err(|e| format!("invalid length '{word}': {e}"))
                        }
                    }
                }
            }
        }
    }
}

impl From<Length> for LengthRepr {
    fn from(length: Length) -> Self {
        match length {
            Length::Px(px) => Self::Px(px),
            other => Self::Keyword(other.to_string()),
        }
    }
}

/// Values for the four flow-relative sides of a box.
///
/// [§ 6.2 Flow-relative Directions](https://www.w3.org/TR/css-writing-modes-4/#logical-directions)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Sides<T> {
    /// "block-start"
    pub block_start: T,
    /// "block-end"
    pub block_end: T,
    /// "inline-start": line-left in ltr, line-right in rtl.
    pub inline_start: T,
    /// "inline-end"
    pub inline_end: T,
}

impl<T: Copy> Sides<T> {
    /// All four sides set to `value`.
    #[must_use]
    pub const fn all(value: T) -> Self {
        Self {
            block_start: value,
            block_end: value,
            inline_start: value,
            inline_end: value,
        }
    }

    /// `(line_left, line_right)` for the given inline base direction.
    #[must_use]
    pub const fn line_sides(&self, direction: super::Direction) -> (T, T) {
        match direction {
            super::Direction::Ltr => (self.inline_start, self.inline_end),
            super::Direction::Rtl => (self.inline_end, self.inline_start),
        }
    }
}

impl Sides<Length> {
    /// Zero on every side.
    pub const ZERO: Self = Self::all(Length::ZERO);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_decodes_from_css_like_strings() {
        let lengths: Vec<Length> =
            serde_json::from_str(r#"[12, "auto", "50%", "8px", "min-content"]"#)
                .expect("valid lengths");
        assert_eq!(
            lengths,
            vec![
                Length::Px(12.0),
                Length::Auto,
                Length::Percent(50.0),
                Length::Px(8.0),
                Length::MinContent,
            ]
        );
    }

    #[test]
    fn test_length_rejects_garbage() {
        assert!(serde_json::from_str::<Length>(r#""wide""#).is_err());
    }

    #[test]
    fn test_percent_of_indefinite_basis_is_unresolved() {
        assert_eq!(Length::Percent(50.0).resolve(None), None);
        assert_eq!(Length::Percent(50.0).resolve(Some(300.0)), Some(150.0));
        assert_eq!(Length::Auto.resolve_or(Some(300.0), 7.0), 7.0);
    }
}
