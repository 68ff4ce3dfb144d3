//! Used widths, heights and intrinsic sizes.
//!
//! [§ 10 Visual formatting model details](https://www.w3.org/TR/CSS2/visudet.html)
//!
//! Everything here is flow-relative: "left" and "right" are line-left and
//! line-right, and all sizes are border-box sizes unless a name says
//! otherwise.

use crate::geometry::LogicalEdges;
use crate::style::{BoxSizing, ComputedStyle, Length};
use crate::text::{BreakKind, FontMetrics, ItemKind, Paragraph};
use crate::tree::{BoxId, BoxKind, BoxTree};

/// Nesting depth past which intrinsic measurement treats content as empty.
const MAX_MEASURE_DEPTH: usize = 64;

/// Used margins, borders and padding of one box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsedEdges {
    /// Margins; `auto` resolves to zero here and is filled in by
    /// [`used_inline_size`].
    pub margin: LogicalEdges,
    /// Border widths.
    pub border: LogicalEdges,
    /// Padding.
    pub padding: LogicalEdges,
    /// The line-left margin is `auto`.
    pub auto_margin_left: bool,
    /// The line-right margin is `auto`.
    pub auto_margin_right: bool,
}

impl UsedEdges {
    /// [§ 8 Box model](https://www.w3.org/TR/CSS2/box.html)
    ///
    /// "Percentages: refer to width of containing block", on every side.
    #[must_use]
    pub fn resolve(style: &ComputedStyle, containing_width: f32) -> Self {
        let basis = Some(containing_width);
        let (margin_left, margin_right) = style.margin.line_sides(style.direction);
        let (padding_left, padding_right) = style.padding.line_sides(style.direction);
        let (border_left, border_right) = style.border_width.line_sides(style.direction);
        Self {
            margin: LogicalEdges {
                block_start: style.margin.block_start.resolve_or(basis, 0.0),
                block_end: style.margin.block_end.resolve_or(basis, 0.0),
                line_left: margin_left.resolve_or(basis, 0.0),
                line_right: margin_right.resolve_or(basis, 0.0),
            },
            border: LogicalEdges {
                block_start: style.border_width.block_start.max(0.0),
                block_end: style.border_width.block_end.max(0.0),
                line_left: border_left.max(0.0),
                line_right: border_right.max(0.0),
            },
            padding: LogicalEdges {
                block_start: style.padding.block_start.resolve_or(basis, 0.0).max(0.0),
                block_end: style.padding.block_end.resolve_or(basis, 0.0).max(0.0),
                line_left: padding_left.resolve_or(basis, 0.0).max(0.0),
                line_right: padding_right.resolve_or(basis, 0.0).max(0.0),
            },
            auto_margin_left: margin_left.is_auto(),
            auto_margin_right: margin_right.is_auto(),
        }
    }

    /// Border plus padding on each side.
    #[must_use]
    pub fn border_padding(&self) -> LogicalEdges {
        self.border.plus(&self.padding)
    }
}

/// Min-content and max-content inline sizes of a border box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntrinsicSizes {
    /// [§ 5.1](https://www.w3.org/TR/css-sizing-3/#min-content)
    ///
    /// "The smallest size a box could take that doesn't lead to overflow
    /// that could be avoided by choosing a larger size."
    pub min_content: f32,
    /// [§ 5.1](https://www.w3.org/TR/css-sizing-3/#max-content)
    ///
    /// "A box's ideal size in a given axis when given infinite available
    /// space."
    pub max_content: f32,
}

impl IntrinsicSizes {
    const fn both(size: f32) -> Self {
        Self {
            min_content: size,
            max_content: size,
        }
    }

    /// [§ 10.3.5](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "min(max(preferred minimum width, available width), preferred width)"
    #[must_use]
    pub fn shrink_to_fit(&self, available: f32) -> f32 {
        self.min_content.max(available).min(self.max_content)
    }
}

/// Border-box size for a specified `size` under the box's `box-sizing`.
fn border_box_size(box_sizing: BoxSizing, size: f32, border_padding: f32) -> f32 {
    match box_sizing {
        BoxSizing::ContentBox => size.max(0.0) + border_padding,
        BoxSizing::BorderBox => size.max(border_padding),
    }
}

/// Intrinsic inline sizes of `id`'s border box.
#[must_use]
pub fn intrinsic_sizes(tree: &BoxTree, metrics: &dyn FontMetrics, id: BoxId) -> IntrinsicSizes {
    measure(tree, metrics, id, 0)
}

fn measure(tree: &BoxTree, metrics: &dyn FontMetrics, id: BoxId, depth: usize) -> IntrinsicSizes {
    let node = &tree[id];
    let style = &node.style;
    let border_padding = UsedEdges::resolve(style, 0.0).border_padding().inline_sum();

    // STEP 1: Replaced elements use their natural width.
    if let BoxKind::Replaced { intrinsic_width, .. } = node.kind {
        let width = style.width.resolve(None).unwrap_or(intrinsic_width);
        return IntrinsicSizes::both(border_box_size(style.box_sizing, width, border_padding));
    }

    // STEP 2: A fixed width is both intrinsic sizes.
    if let Some(width) = style.width.resolve(None) {
        return IntrinsicSizes::both(border_box_size(style.box_sizing, width, border_padding));
    }

    if depth >= MAX_MEASURE_DEPTH || (!node.kind.is_block_container() && node.kind != BoxKind::Inline) {
        return IntrinsicSizes::both(border_padding);
    }

    // STEP 3: Measure the content.
    let content = if tree.children_inline(id) {
        measure_inline_content(tree, metrics, id, depth)
    } else {
        tree.children(id)
            .iter()
            .filter(|child| !tree[**child].style.is_out_of_flow_positioned())
            .map(|child| {
                let sizes = measure(tree, metrics, *child, depth + 1);
                let margins = UsedEdges::resolve(&tree[*child].style, 0.0).margin.inline_sum();
                IntrinsicSizes {
                    min_content: sizes.min_content + margins,
                    max_content: sizes.max_content + margins,
                }
            })
            .fold(IntrinsicSizes::default(), |acc, sizes| IntrinsicSizes {
                min_content: acc.min_content.max(sizes.min_content),
                max_content: acc.max_content.max(sizes.max_content),
            })
    };

    // STEP 4: Clamp by min/max-width, which only apply when fixed here.
    let mut sizes = IntrinsicSizes {
        min_content: content.min_content + border_padding,
        max_content: content.max_content.max(content.min_content) + border_padding,
    };
    if let Some(max) = style.max_width.resolve(None) {
        let max = border_box_size(style.box_sizing, max, border_padding);
        sizes.min_content = sizes.min_content.min(max);
        sizes.max_content = sizes.max_content.min(max);
    }
    if let Some(min) = style.min_width.resolve(None) {
        let min = border_box_size(style.box_sizing, min, border_padding);
        sizes.min_content = sizes.min_content.max(min);
        sizes.max_content = sizes.max_content.max(min);
    }
    sizes
}

/// [§ 5.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
///
/// The min-content size is the widest unbreakable segment; the max-content
/// size is the widest run between forced breaks. Atomic inlines and floats
/// contribute their own intrinsic sizes in place of whatever width the
/// paragraph recorded for them.
fn measure_inline_content(tree: &BoxTree, metrics: &dyn FontMetrics, block: BoxId, depth: usize) -> IntrinsicSizes {
    let paragraph = Paragraph::build(tree, block, 0.0, metrics);
    let contribution = |index: usize| {
        let item = &paragraph.items[index];
        let sizes = measure(tree, metrics, item.box_id, depth + 1);
        let margins = UsedEdges::resolve(&tree[item.box_id].style, 0.0).margin.inline_sum();
        (
            sizes.min_content + margins - item.width,
            sizes.max_content + margins - item.width,
        )
    };

    let mut sizes = IntrinsicSizes::default();
    let mut line = 0.0_f32;
    for segment in &paragraph.segments {
        let mut min = segment.width - segment.trailing_space;
        let mut max = segment.width;
        for (index, _) in paragraph.pieces(segment.start, segment.end) {
            if matches!(paragraph.items[index].kind, ItemKind::Atomic | ItemKind::Float) {
                let (min_delta, max_delta) = contribution(index);
                min += min_delta;
                max += max_delta;
            }
        }
        if let BreakKind::Hyphen(hyphen) = segment.break_after {
            min += hyphen;
        }
        sizes.min_content = sizes.min_content.max(min);
        line += max;
        if matches!(segment.break_after, BreakKind::Forced | BreakKind::End) {
            sizes.max_content = sizes.max_content.max(line - segment.trailing_space);
            line = 0.0;
        }
    }
    sizes.max_content = sizes.max_content.max(line);
    sizes
}

/// How a box's auto width is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthMode {
    /// Block-level box in normal flow: fill the containing block and let
    /// auto margins absorb the rest.
    Fill,
    /// Floats, atomic inlines and out-of-flow boxes: shrink to fit, with
    /// auto margins zero.
    ShrinkToFit,
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
/// 'padding-right' + 'border-right-width' + 'margin-right' = width of
/// containing block"
///
/// Returns the border-box inline size and the used edges.
#[must_use]
pub fn used_inline_size(
    tree: &BoxTree,
    metrics: &dyn FontMetrics,
    id: BoxId,
    containing_width: f32,
    mode: WidthMode,
) -> (f32, UsedEdges) {
    let node = &tree[id];
    let style = &node.style;
    let basis = Some(containing_width);

    // STEP 1: Resolve edges; percentages refer to the containing block.
    let mut edges = UsedEdges::resolve(style, containing_width);
    let border_padding = edges.border_padding().inline_sum();
    let available = containing_width - edges.margin.inline_sum();

    // STEP 2: Tentative width.
    let intrinsic = || intrinsic_sizes(tree, metrics, id);
    let specified = |length: Length| -> Option<f32> {
        match length {
            Length::Px(_) | Length::Percent(_) => length
                .resolve(basis)
                .map(|size| border_box_size(style.box_sizing, size, border_padding)),
            Length::MinContent => Some(intrinsic().min_content),
            Length::MaxContent => Some(intrinsic().max_content),
            Length::FitContent => Some(intrinsic().shrink_to_fit(available)),
            Length::Auto => None,
        }
    };
    let mut width = match (specified(style.width), &node.kind) {
        (Some(width), _) => width,
        (None, BoxKind::Replaced { intrinsic_width, .. }) => {
            border_box_size(style.box_sizing, *intrinsic_width, border_padding)
        }
        (None, _) if mode == WidthMode::ShrinkToFit => intrinsic().shrink_to_fit(available),
        (None, _) => available.max(border_padding),
    };

    // STEP 3: min-width wins over max-width.
    // [§ 10.4](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
    if let Some(max) = specified(style.max_width) {
        width = width.min(max);
    }
    let min = specified(style.min_width).unwrap_or(border_padding);
    width = width.max(min).max(border_padding);

    // STEP 4: Auto margins.
    //
    // "If both 'margin-left' and 'margin-right' are 'auto', their used
    // values are equal. This horizontally centers the element." A negative
    // remainder leaves auto margins at zero.
    if mode == WidthMode::Fill {
        let remaining = (containing_width - width - edges.margin.inline_sum()).max(0.0);
        match (edges.auto_margin_left, edges.auto_margin_right) {
            (true, true) => {
                edges.margin.line_left = remaining / 2.0;
                edges.margin.line_right = remaining / 2.0;
            }
            (true, false) => edges.margin.line_left = remaining,
            (false, true) => edges.margin.line_right = remaining,
            (false, false) => {}
        }
    }
    (width, edges)
}

/// [§ 10.6.3 Block-level non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
///
/// Border-box block size from the height content produced (`auto_height`,
/// already including border and padding), `height` and its min/max
/// constraints. Percentages of an indefinite containing block behave as
/// `auto`.
#[must_use]
pub fn used_block_size(
    style: &ComputedStyle,
    auto_height: f32,
    border_padding: f32,
    containing_height: Option<f32>,
) -> f32 {
    let specified = |length: Length| {
        length
            .resolve(containing_height)
            .map(|size| border_box_size(style.box_sizing, size, border_padding))
    };
    let mut height = specified(style.height).unwrap_or(auto_height);
    // [§ 10.7](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
    if let Some(max) = specified(style.max_height) {
        height = height.min(max);
    }
    let min = specified(style.min_height).unwrap_or(border_padding);
    height.max(min).max(border_padding)
}

/// Block size of a definite-height box's content area, for resolving
/// children's percentage heights.
#[must_use]
pub fn definite_content_height(
    style: &ComputedStyle,
    border_padding: f32,
    containing_height: Option<f32>,
) -> Option<f32> {
    let height = style.height.resolve(containing_height)?;
    Some(match style.box_sizing {
        BoxSizing::ContentBox => height.max(0.0),
        BoxSizing::BorderBox => (height - border_padding).max(0.0),
    })
}

/// True if `height` is `auto` (or an unresolvable percentage) and the
/// minimum is zero, so the block's height follows its content.
#[must_use]
pub fn has_auto_height(style: &ComputedStyle, containing_height: Option<f32>) -> bool {
    style.height.resolve(containing_height).is_none()
        && style.min_height.resolve_or(containing_height, 0.0) <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Sides;
    use crate::text::FixedWidthMetrics;

    const METRICS: FixedWidthMetrics = FixedWidthMetrics::new(8.0);

    fn block_with_text(style: ComputedStyle, text: &str) -> (BoxTree, BoxId) {
        let mut tree = BoxTree::new();
        let block = tree.create(BoxKind::Block, style);
        let run = tree.create(BoxKind::Text(text.to_string()), ComputedStyle::default());
        tree.append_child(block, run).expect("append");
        (tree, block)
    }

    #[test]
    fn test_intrinsic_sizes_of_text() {
        let (tree, block) = block_with_text(ComputedStyle::default(), "ab abcd a");
        let sizes = intrinsic_sizes(&tree, &METRICS, block);
        assert_eq!(sizes.min_content, 32.0);
        assert_eq!(sizes.max_content, 72.0);
    }

    #[test]
    fn test_shrink_to_fit_clamps_between_intrinsic_sizes() {
        let sizes = IntrinsicSizes {
            min_content: 30.0,
            max_content: 90.0,
        };
        assert_eq!(sizes.shrink_to_fit(10.0), 30.0);
        assert_eq!(sizes.shrink_to_fit(50.0), 50.0);
        assert_eq!(sizes.shrink_to_fit(500.0), 90.0);
    }

    #[test]
    fn test_auto_margins_center_fixed_width_block() {
        let style = ComputedStyle {
            width: Length::Px(100.0),
            margin: Sides {
                inline_start: Length::Auto,
                inline_end: Length::Auto,
                ..Sides::ZERO
            },
            ..ComputedStyle::default()
        };
        let (tree, block) = block_with_text(style, "x");
        let (width, edges) = used_inline_size(&tree, &METRICS, block, 300.0, WidthMode::Fill);
        assert_eq!(width, 100.0);
        assert_eq!(edges.margin.line_left, 100.0);
        assert_eq!(edges.margin.line_right, 100.0);
    }

    #[test]
    fn test_auto_width_fills_and_respects_max_width() {
        let style = ComputedStyle {
            padding: Sides::all(Length::Px(5.0)),
            max_width: Length::Px(120.0),
            ..ComputedStyle::default()
        };
        let (tree, block) = block_with_text(style, "x");
        let (width, _) = used_inline_size(&tree, &METRICS, block, 300.0, WidthMode::Fill);
        assert_eq!(width, 130.0, "max-width applies to the content box");
    }

    #[test]
    fn test_floats_shrink_to_fit() {
        let (tree, block) = block_with_text(ComputedStyle::default(), "abc def");
        let (width, _) = used_inline_size(&tree, &METRICS, block, 300.0, WidthMode::ShrinkToFit);
        assert_eq!(width, 56.0);
        let (narrow, _) = used_inline_size(&tree, &METRICS, block, 40.0, WidthMode::ShrinkToFit);
        assert_eq!(narrow, 40.0);
    }

    #[test]
    fn test_block_size_honors_min_and_percentages() {
        let style = ComputedStyle {
            height: Length::Percent(50.0),
            min_height: Length::Px(80.0),
            ..ComputedStyle::default()
        };
        assert_eq!(used_block_size(&style, 10.0, 0.0, Some(100.0)), 80.0);
        assert_eq!(used_block_size(&style, 10.0, 0.0, None), 80.0);
        let auto = ComputedStyle::default();
        assert_eq!(used_block_size(&auto, 42.0, 4.0, None), 42.0);
        assert!(has_auto_height(&auto, None));
    }
}
