//! Layout configuration.
//!
//! Everything that is not a property of the document itself: the viewport,
//! how the flow is fragmented, and a few engine-wide defaults. Loaded from
//! JSON by the command line; library users usually build it in code.

use serde::{Deserialize, Serialize};
use trellis_common::ConfigError;

use crate::pagination::LineGrid;

/// [§ 1 Introduction](https://www.w3.org/TR/css-break-3/#intro)
///
/// "In paged media, the content of the document is split into one or more
/// discrete display surfaces."
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Fragmentation {
    /// One unbroken flow.
    #[default]
    Continuous,
    /// Pages of a fixed content height.
    Pages {
        /// Block-axis size of each page.
        height: f32,
        /// Space drawn between pages. Presentation only; layout ignores it.
        #[serde(default)]
        gap: f32,
    },
    /// Columns of a fixed height, filled in order.
    Columns {
        /// Columns per row.
        count: u32,
        /// Inline-axis space between columns.
        #[serde(default)]
        gap: f32,
        /// Block-axis size of each column.
        height: f32,
    },
}

/// The initial containing block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Engine-wide layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Viewport the root box is laid out against.
    pub viewport: Viewport,
    /// How the root flow is broken.
    pub fragmentation: Fragmentation,
    /// [Quirks Mode § 3.7](https://quirks.spec.whatwg.org/#the-body-element-fills-the-html-element-quirk)
    ///
    /// Enables the legacy margin quirks: a `body` box and table cells drop
    /// their first child's leading margin.
    pub quirks_mode: bool,
    /// Font size given to the root box when the document sets none.
    pub default_font_size: f32,
    /// Grid that `line-snap` aligns lines against.
    pub line_grid: Option<LineGrid>,
    /// Default limit on consecutive hyphenated lines, used where
    /// `hyphenate-limit-lines` is unset. `None` means unlimited.
    pub max_consecutive_hyphenated_lines: Option<u32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            fragmentation: Fragmentation::Continuous,
            quirks_mode: false,
            default_font_size: 16.0,
            line_grid: None,
            max_consecutive_hyphenated_lines: None,
        }
    }
}

impl LayoutConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Decode`] for malformed JSON and the matching
    /// variant for any value [`Self::validate`] rejects.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable.
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Viewport { width, height } = self.viewport;
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(ConfigError::InvalidViewport { width, height });
        }
        match self.fragmentation {
            Fragmentation::Continuous => {}
            Fragmentation::Pages { height, .. } => {
                if height.is_nan() || height <= 0.0 {
                    return Err(ConfigError::NonPositiveFragmentHeight(height));
                }
            }
            Fragmentation::Columns { count, height, .. } => {
                if count == 0 {
                    return Err(ConfigError::ZeroColumns);
                }
                if height.is_nan() || height <= 0.0 {
                    return Err(ConfigError::NonPositiveFragmentHeight(height));
                }
            }
        }
        if let Some(grid) = self.line_grid
            && (grid.pitch.is_nan() || grid.pitch <= 0.0)
        {
            return Err(ConfigError::NonPositiveGridPitch(grid.pitch));
        }
        Ok(())
    }
}
