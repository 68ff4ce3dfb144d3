//! Block-and-line visual layout for the Trellis engine.
//!
//! # Scope
//!
//! This crate turns a styled box tree into box rectangles in one
//! synchronous, depth-first pass:
//! - **Block layout** ([§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting))
//!   - Margin collapsing, clearance, auto margins
//!   - Shrink-to-fit widths from an intrinsic measure pass
//!   - Relative and absolute positioning from static positions
//!
//! - **Floats** ([§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats))
//!   - Placement against a lazily rebuilt interval tree
//!   - Intruding and overhanging floats across block boundaries
//!
//! - **Inline layout** ([§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting))
//!   - Bidi resolution ([UAX #9](https://www.unicode.org/reports/tr9/)) and
//!     line breaking ([UAX #14](https://www.unicode.org/reports/tr14/))
//!   - Line box trees with alignment, justification and vertical alignment
//!
//! - **Fragmentation** ([CSS Fragmentation Level 3](https://www.w3.org/TR/css-break-3/))
//!   - Pages and columns, pagination struts, line grids
//!
//! - **Overflow** ([CSS Overflow Level 3](https://www.w3.org/TR/css-overflow-3/))
//!
//! # Not Yet Implemented
//!
//! - Splitting boxes across pages (content is moved, never split)
//! - Orthogonal writing modes (laid out in the parent's block direction)
//! - Tables beyond single cells

/// Block layout driver.
mod block;
/// Layout configuration.
pub mod config;
/// JSON box tree documents.
pub mod document;
/// The layout pass entry point.
pub mod engine;
/// Float placement per [§ 9.5](https://www.w3.org/TR/CSS2/visuren.html#floats).
pub mod float;
/// Rectangles, edges and box dimensions.
pub mod geometry;
/// Inline formatting contexts and line box trees.
pub mod inline;
/// Interval tree used for float queries.
pub mod interval_tree;
/// Margin collapsing per [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins).
pub mod margin;
/// Layout and visual overflow.
pub mod overflow;
/// Page and column fragmentation.
pub mod pagination;
/// Used and intrinsic sizes per [§ 10](https://www.w3.org/TR/CSS2/visudet.html).
pub mod sizing;
/// Pass counters and repaint bookkeeping.
pub mod stats;
/// Computed style consumed by layout.
pub mod style;
/// Text measurement, bidi and line breaking.
pub mod text;
/// The box tree.
pub mod tree;

// Re-exports for convenience
pub use config::{Fragmentation, LayoutConfig, Viewport};
pub use document::parse_document;
pub use engine::{LayoutOutput, absolute_rects, layout};
pub use float::{FloatKind, FloatManager, FloatingObject};
pub use geometry::{BoxDimensions, EdgeSizes, LogicalEdges, Rect};
pub use inline::{InlineBoxArena, InlineBoxId, InlineBoxKind, LineSnapshot, RootLine};
pub use margin::{CollapsedMargin, MarginState, MarginValues};
pub use pagination::{LineGrid, PaginationContext};
pub use stats::LayoutStats;
pub use style::ComputedStyle;
pub use text::{ApproximateFontMetrics, FixedWidthMetrics, FontMetrics};
pub use tree::{BoxId, BoxKind, BoxTree, LayoutBox};
pub use trellis_common::{ConfigError, DocumentError, TreeError};
