//! Box model geometry.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)
//!
//! All geometry is stored physically (`x`, `y`, `width`, `height`) and
//! exposed through logical accessors that swap axes for vertical writing
//! modes. Block-flow flipping for `vertical-rl` is a paint-time concern:
//! layout stores "flipped blocks" coordinates, the same way it stores every
//! other writing mode, with the block axis growing away from block-start.

use serde::{Deserialize, Serialize};

use crate::style::WritingMode;

/// A rectangle positioned in 2D space.
///
/// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Construct a rectangle from its origin and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// True when the rectangle encloses no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Smallest rectangle containing both `self` and `other`.
    ///
    /// Empty rectangles still contribute their origin; overflow accumulation
    /// relies on a zero-height child extending the scrollable area.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Self::new(x, y, max_x - x, max_y - y)
    }

    /// True if `other` lies entirely inside `self` (edges inclusive).
    #[must_use]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// True if the interiors of the two rectangles overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }

    /// Move the rectangle by `(dx, dy)`.
    #[must_use]
    pub const fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow the rectangle outward by the given edges.
    #[must_use]
    pub fn outset(&self, edges: &EdgeSizes) -> Self {
        Self::new(
            self.x - edges.left,
            self.y - edges.top,
            self.width + edges.horizontal(),
            self.height + edges.vertical(),
        )
    }

    /// Shrink the rectangle inward by the given edges, clamping at zero size.
    #[must_use]
    pub fn inset(&self, edges: &EdgeSizes) -> Self {
        Self::new(
            self.x + edges.left,
            self.y + edges.top,
            (self.width - edges.horizontal()).max(0.0),
            (self.height - edges.vertical()).max(0.0),
        )
    }

    /// Grow the rectangle by `amount` on every side.
    #[must_use]
    pub fn inflate(&self, amount: f32) -> Self {
        self.outset(&EdgeSizes::uniform(amount))
    }

    /// A rectangle given in flow-relative terms, stored physically.
    #[must_use]
    pub const fn from_logical(
        line_left: f32,
        block_start: f32,
        inline_size: f32,
        block_size: f32,
        writing_mode: WritingMode,
    ) -> Self {
        if writing_mode.is_horizontal() {
            Self::new(line_left, block_start, inline_size, block_size)
        } else {
            Self::new(block_start, line_left, block_size, inline_size)
        }
    }
}

/// Edge sizes for padding, border, or margin.
///
/// [§ 3 The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f32,
    /// Right edge size.
    pub right: f32,
    /// Bottom edge size.
    pub bottom: f32,
    /// Left edge size.
    pub left: f32,
}

impl EdgeSizes {
    /// All four sides set to `value`.
    #[must_use]
    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// `left + right`
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// `top + bottom`
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    /// True when every side is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

/// Edge sizes expressed relative to the flow: block-start/end and
/// line-left/right.
///
/// [§ 6.2 Flow-relative Directions](https://www.w3.org/TR/css-writing-modes-4/#logical-directions)
///
/// "line-left: Nominally the side from which LTR text would start."
///
/// Layout works on these; the physical [`EdgeSizes`] are derived when the
/// results are stored on a box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogicalEdges {
    /// Edge at block-start (top in horizontal-tb).
    pub block_start: f32,
    /// Edge at block-end.
    pub block_end: f32,
    /// Edge at line-left (left in horizontal-tb).
    pub line_left: f32,
    /// Edge at line-right.
    pub line_right: f32,
}

impl LogicalEdges {
    /// `block_start + block_end`
    #[must_use]
    pub fn block_sum(&self) -> f32 {
        self.block_start + self.block_end
    }

    /// `line_left + line_right`
    #[must_use]
    pub fn inline_sum(&self) -> f32 {
        self.line_left + self.line_right
    }

    /// Sum two sets of edges side by side.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self {
            block_start: self.block_start + other.block_start,
            block_end: self.block_end + other.block_end,
            line_left: self.line_left + other.line_left,
            line_right: self.line_right + other.line_right,
        }
    }

    /// Read physical sides back in logical terms for `writing_mode`.
    #[must_use]
    pub const fn from_physical(edges: &EdgeSizes, writing_mode: WritingMode) -> Self {
        if writing_mode.is_horizontal() {
            Self {
                block_start: edges.top,
                block_end: edges.bottom,
                line_left: edges.left,
                line_right: edges.right,
            }
        } else {
            Self {
                block_start: edges.left,
                block_end: edges.right,
                line_left: edges.top,
                line_right: edges.bottom,
            }
        }
    }

    /// Map onto physical sides for `writing_mode`.
    ///
    /// | Writing Mode   | block-start | line-left |
    /// |----------------|-------------|-----------|
    /// | horizontal-tb  | top         | left      |
    /// | vertical-rl    | right       | top       |
    /// | vertical-lr    | left        | top       |
    ///
    /// Block flow is stored unflipped, so vertical-rl maps block-start onto
    /// the left side of the stored rectangle just like vertical-lr does.
    #[must_use]
    pub const fn to_physical(&self, writing_mode: WritingMode) -> EdgeSizes {
        if writing_mode.is_horizontal() {
            EdgeSizes {
                top: self.block_start,
                bottom: self.block_end,
                left: self.line_left,
                right: self.line_right,
            }
        } else {
            EdgeSizes {
                left: self.block_start,
                right: self.block_end,
                top: self.line_left,
                bottom: self.line_right,
            }
        }
    }
}

/// [§ 3. The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
///
/// "Each box has a content area and optional surrounding padding, border,
/// and margin areas."
///
/// ```text
/// ┌───────────────── margin ─────────────────┐
/// │   ┌───────────── border ─────────────┐   │
/// │   │   ┌───────── padding ────────┐   │   │
/// │   │   │          CONTENT         │   │   │
/// │   │   └──────────────────────────┘   │   │
/// │   └──────────────────────────────────┘   │
/// └──────────────────────────────────────────┘
/// ```
///
/// The stored frame is the *border box*, relative to the parent's border box
/// origin; the other boxes are derived from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxDimensions {
    /// Border box, relative to the containing block's border-box origin.
    pub frame: Rect,
    /// Padding widths.
    pub padding: EdgeSizes,
    /// Border widths.
    pub border: EdgeSizes,
    /// Margin widths (may be negative).
    pub margin: EdgeSizes,
}

impl BoxDimensions {
    /// [§ 3.3 Borders](https://www.w3.org/TR/css-box-3/#borders)
    ///
    /// "The border box contains content, padding, and border areas."
    #[must_use]
    pub const fn border_box(&self) -> Rect {
        self.frame
    }

    /// [§ 3.2 Padding](https://www.w3.org/TR/css-box-3/#paddings)
    ///
    /// "The padding box contains both the content and padding areas."
    #[must_use]
    pub fn padding_box(&self) -> Rect {
        self.frame.inset(&self.border)
    }

    /// [§ 3.1 Content](https://www.w3.org/TR/css-box-3/#content-area)
    ///
    /// "The content box contains the actual content of the element."
    #[must_use]
    pub fn content_box(&self) -> Rect {
        self.padding_box().inset(&self.padding)
    }

    /// [§ 3.1 Margins](https://www.w3.org/TR/css-box-3/#margins)
    ///
    /// "The margin box is the outermost box, and contains all four areas."
    ///
    /// ```text
    /// x = frame.x - margin.left
    /// width = frame.width + margin.left + margin.right
    /// ```
    #[must_use]
    pub fn margin_box(&self) -> Rect {
        self.frame.outset(&self.margin)
    }

    /// Border box in the box's own coordinate space (origin at 0,0).
    #[must_use]
    pub const fn local_border_box(&self) -> Rect {
        Rect::new(0.0, 0.0, self.frame.width, self.frame.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_extends_both_corners() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(-5.0, 5.0, 10.0, 20.0);
        assert_eq!(a.union(&b), Rect::new(-5.0, 0.0, 15.0, 25.0));
    }

    #[test]
    fn test_intersects_is_exclusive_at_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(a.intersects(&Rect::new(9.0, 9.0, 5.0, 5.0)));
    }

    #[test]
    fn test_box_dimensions_derive_inner_boxes() {
        let dims = BoxDimensions {
            frame: Rect::new(10.0, 20.0, 100.0, 50.0),
            padding: EdgeSizes::uniform(5.0),
            border: EdgeSizes::uniform(1.0),
            margin: EdgeSizes::uniform(8.0),
        };
        assert_eq!(dims.padding_box(), Rect::new(11.0, 21.0, 98.0, 48.0));
        assert_eq!(dims.content_box(), Rect::new(16.0, 26.0, 88.0, 38.0));
        assert_eq!(dims.margin_box(), Rect::new(2.0, 12.0, 116.0, 66.0));
    }

    #[test]
    fn test_logical_edges_swap_for_vertical_modes() {
        let edges = LogicalEdges {
            block_start: 1.0,
            block_end: 2.0,
            line_left: 3.0,
            line_right: 4.0,
        };
        let physical = edges.to_physical(WritingMode::VerticalLr);
        assert_eq!(physical.left, 1.0);
        assert_eq!(physical.right, 2.0);
        assert_eq!(physical.top, 3.0);
        assert_eq!(physical.bottom, 4.0);
    }
}
