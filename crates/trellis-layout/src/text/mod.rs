//! Text: measurement, bidi resolution, and line breaking.

pub mod bidi;
mod line_breaker;
mod metrics;
mod paragraph;

pub use bidi::{BidiParagraph, reorder_visually};
pub use line_breaker::{LineBreak, LineBreaker, LineFloats};
pub use metrics::{ApproximateFontMetrics, FixedWidthMetrics, FontMetrics, HYPHEN, SOFT_HYPHEN};
pub use paragraph::{
    BreakKind, InlineItem, ItemKind, ItemStyle, OBJECT_REPLACEMENT, Paragraph, Position, Segment,
    margin_box_inline_size, measure_text,
};
