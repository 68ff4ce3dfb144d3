//! Building one line box tree from a broken line.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "The height of each inline-level box in the line box is calculated ...
//! The inline-level boxes are aligned vertically according to their
//! 'vertical-align' property ... The line box height is the distance
//! between the uppermost box top and the lowermost box bottom."
//!
//! A line is built in three passes over the pieces the line breaker chose:
//! leaves are collected in logical order and reordered visually, flow boxes
//! are rebuilt around them, then the inline pass positions everything along
//! the line and the block pass aligns everything against the baseline.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ops::Range;

use crate::inline::arena::{InlineBox, InlineBoxArena, InlineBoxId, InlineBoxKind, RootLine, TextRun};
use crate::pagination::LineGrid;
use crate::style::{
    AnnotationPosition, BaselineType, Clear, ComputedStyle, Font, LineHeight, LineSnap, TextAlign,
    TextJustify, VerticalAlign,
};
use crate::text::{
    FontMetrics, HYPHEN, ItemKind, LineBreak, Paragraph, SOFT_HYPHEN, measure_text, reorder_visually,
};
use crate::tree::{BoxId, BoxTree};

/// [§ 10.8.1 'line-height'](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
#[must_use]
pub fn used_line_height(style: &ComputedStyle, metrics: &dyn FontMetrics) -> f32 {
    match style.line_height {
        LineHeight::Normal => metrics.normal_line_height(&style.font),
        LineHeight::Number(factor) => factor * style.font.size,
        LineHeight::Px(px) => px,
    }
}

/// Vertical extent of one inline-level box around its baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoxMetrics {
    /// Content area above the baseline.
    ascent: f32,
    /// Content area below the baseline.
    descent: f32,
    /// Extent above the baseline that counts towards the line height.
    above: f32,
    /// Extent below the baseline that counts towards the line height.
    below: f32,
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
///
/// "Let A be the font's ascent and D its descent ... Calculate L = line-height
/// - AD, and add half the leading above A and the other half below D."
fn strut(style: &ComputedStyle, metrics: &dyn FontMetrics, baseline: BaselineType) -> BoxMetrics {
    let mut ascent = metrics.ascent(&style.font);
    let mut descent = metrics.descent(&style.font);
    if baseline == BaselineType::Ideographic {
        let offset = metrics.ideographic_offset(&style.font);
        ascent += offset;
        descent -= offset;
    }
    let half_leading = (used_line_height(style, metrics) - (ascent + descent)) / 2.0;
    BoxMetrics {
        ascent,
        descent,
        above: ascent + half_leading,
        below: descent + half_leading,
    }
}

/// Baseline of the last line inside `id`, from its border-box top.
///
/// [§ 10.8.1](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
///
/// "The baseline of an 'inline-block' is the baseline of its last line box
/// in the normal flow, unless it has either no in-flow line boxes or if its
/// 'overflow' property has a computed value other than 'visible'".
#[must_use]
pub fn last_line_baseline(tree: &BoxTree, arena: &InlineBoxArena, id: BoxId) -> Option<f32> {
    let node = &tree[id];
    if node.style.overflow.clips() {
        return None;
    }
    if let Some(last) = node.lines.last {
        return arena.get(last).and_then(InlineBox::root_line).map(|line| line.baseline);
    }
    tree.children(id)
        .iter()
        .rev()
        .filter(|child| !tree[**child].is_out_of_flow())
        .find_map(|child| {
            last_line_baseline(tree, arena, *child).map(|baseline| tree[*child].logical_top() + baseline)
        })
}

/// Where one line goes and what surrounds it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePlacement {
    /// Logical top of the line in the block.
    pub line_top: f32,
    /// Line-left edge of the space left by floats.
    pub line_left: f32,
    /// Inline size of the space left by floats, before `text_indent`.
    pub available_width: f32,
    /// `text-indent`, non-zero on the first line only.
    pub text_indent: f32,
    /// The line ends the paragraph.
    pub is_last_line: bool,
    /// Grid that `line-snap` aligns against.
    pub grid: Option<LineGrid>,
    /// Offset of the block's top from the fragmentation root.
    pub block_offset: f32,
}

/// A finished line.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltLine {
    /// Root inline box.
    pub root: InlineBoxId,
    /// Block-axis size of the line box.
    pub height: f32,
    /// Static positions `(box, logical left, logical top)` of out-of-flow
    /// boxes met on the line.
    pub positioned: Vec<(BoxId, f32, f32)>,
    /// `clear` of a `<br>` ending the line.
    pub clear: Clear,
}

struct Leaf {
    item: usize,
    box_id: BoxId,
    // `None` for an inline box with nothing inside it on this line.
    kind: Option<InlineBoxKind>,
    width: f32,
    level: u8,
    // Open items of the enclosing inline boxes, outermost first.
    chain: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct EdgeParts {
    margin: f32,
    border_padding: f32,
}

/// Line-left and line-right edges of an inline box.
fn flow_edges(style: &ComputedStyle, containing_width: f32) -> (EdgeParts, EdgeParts) {
    let basis = Some(containing_width);
    let (margin_left, margin_right) = style.margin.line_sides(style.direction);
    let (padding_left, padding_right) = style.padding.line_sides(style.direction);
    let (border_left, border_right) = style.border_width.line_sides(style.direction);
    (
        EdgeParts {
            margin: margin_left.resolve_or(basis, 0.0),
            border_padding: border_left + padding_left.resolve_or(basis, 0.0),
        },
        EdgeParts {
            margin: margin_right.resolve_or(basis, 0.0),
            border_padding: border_right + padding_right.resolve_or(basis, 0.0),
        },
    )
}

#[derive(Debug, Clone, Copy)]
struct Extents {
    top: f32,
    bottom: f32,
}

impl Extents {
    const EMPTY: Self = Self {
        top: f32::INFINITY,
        bottom: f32::NEG_INFINITY,
    };

    fn include(&mut self, top: f32, bottom: f32) {
        self.top = self.top.min(top);
        self.bottom = self.bottom.max(bottom);
    }

    fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

struct Placement {
    id: InlineBoxId,
    baseline: f32,
    ascent: f32,
    descent: f32,
}

struct Deferred {
    align: VerticalAlign,
    extents: Extents,
    range: Range<usize>,
}

/// Block-axis alignment of one line's boxes relative to the root baseline.
struct VerticalPass<'a> {
    tree: &'a BoxTree,
    arena: &'a InlineBoxArena,
    metrics: &'a dyn FontMetrics,
    baseline: BaselineType,
    out: Vec<Placement>,
    deferred: Vec<Deferred>,
}

impl VerticalPass<'_> {
    fn metrics_for(&self, id: InlineBoxId) -> BoxMetrics {
        let node = &self.arena[id];
        let layout_box = &self.tree[node.box_id];
        if node.kind != InlineBoxKind::Atomic {
            return strut(&layout_box.style, self.metrics, self.baseline);
        }
        let margins = layout_box.logical_margins();
        let height = layout_box.logical_height() + margins.block_sum();
        let ascent = last_line_baseline(self.tree, self.arena, node.box_id)
            .map_or(height, |baseline| margins.block_start + baseline);
        BoxMetrics {
            ascent,
            descent: height - ascent,
            above: ascent,
            below: height - ascent,
        }
    }

    /// [§ 10.8.1 'vertical-align'](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
    ///
    /// Downward distance from the parent's baseline to the child's.
    fn baseline_shift(&self, align: VerticalAlign, parent: &ComputedStyle, child: BoxMetrics) -> f32 {
        let parent_metrics = strut(parent, self.metrics, self.baseline);
        let size = parent.font.size;
        match align {
            VerticalAlign::Baseline | VerticalAlign::Top | VerticalAlign::Bottom => 0.0,
            VerticalAlign::Sub => size / 5.0 + 1.0,
            VerticalAlign::Super => -(size / 3.0 + 1.0),
            VerticalAlign::TextTop => child.above - parent_metrics.ascent,
            VerticalAlign::TextBottom => parent_metrics.descent - child.below,
            // "Align the vertical midpoint of the box with the baseline of
            // the parent box plus half the x-height of the parent."
            VerticalAlign::Middle => {
                -self.metrics.x_height(&parent.font) / 2.0 - (child.below - child.above) / 2.0
            }
            VerticalAlign::Length(raise) => -raise,
        }
    }

    fn walk(&mut self, parent: InlineBoxId, parent_style: &ComputedStyle, parent_baseline: f32, extents: &mut Extents, nested: bool) {
        let tree = self.tree;
        let children: Vec<_> = self.arena.children(parent).collect();
        for child in children {
            let style = &tree[self.arena[child].box_id].style;
            let metrics = self.metrics_for(child);
            let align = style.vertical_align;
            if align.is_line_relative() && !nested {
                let start = self.out.len();
                let mut own = Extents::EMPTY;
                self.place(child, 0.0, metrics, &mut own, true);
                self.deferred.push(Deferred {
                    align,
                    extents: own,
                    range: start..self.out.len(),
                });
            } else {
                let baseline = parent_baseline + self.baseline_shift(align, parent_style, metrics);
                self.place(child, baseline, metrics, extents, nested);
            }
        }
    }

    fn place(&mut self, id: InlineBoxId, baseline: f32, metrics: BoxMetrics, extents: &mut Extents, nested: bool) {
        let tree = self.tree;
        let node = &self.arena[id];
        let style = &tree[node.box_id].style;
        self.out.push(Placement {
            id,
            baseline,
            ascent: metrics.ascent,
            descent: metrics.descent,
        });
        extents.include(baseline - metrics.above, baseline + metrics.below);

        // [CSS Ruby § 4.1](https://www.w3.org/TR/css-ruby-1/#ruby-layout)
        //
        // Annotations sit outside the base's line-height box and grow the
        // line instead of moving the base.
        if let Some(annotation) = &style.annotation {
            let font = Font {
                size: annotation.font_size.unwrap_or(style.font.size / 2.0),
                family: style.font.family.clone(),
            };
            let height = self.metrics.normal_line_height(&font);
            match annotation.position {
                AnnotationPosition::Over => extents.include(baseline - metrics.above - height, baseline),
                AnnotationPosition::Under => extents.include(baseline, baseline + metrics.below + height),
            }
        }

        if matches!(node.kind, InlineBoxKind::Flow { .. }) {
            self.walk(id, style, baseline, extents, nested);
        }
    }
}

/// Justification never adds space at the line's edges or against an atomic
/// inline, so a text run touching either loses that side's expansion.
fn mark_expansion_edges(leaves: &mut [Leaf]) {
    // `Some(true)` for text, `Some(false)` for what blocks expansion, `None`
    // for empty inline boxes, which are transparent.
    let sides: Vec<Option<bool>> = leaves
        .iter()
        .map(|leaf| match leaf.kind {
            Some(InlineBoxKind::Text(_)) => Some(true),
            Some(_) => Some(false),
            None => None,
        })
        .collect();
    for (index, leaf) in leaves.iter_mut().enumerate() {
        let before = sides[..index].iter().rev().find_map(|side| *side).unwrap_or(false);
        let after = sides[index + 1..].iter().find_map(|side| *side).unwrap_or(false);
        if let Some(InlineBoxKind::Text(run)) = &mut leaf.kind {
            run.allows_leading_expansion = before;
            run.allows_trailing_expansion = after;
        }
    }
}

/// Builds line box trees for one paragraph.
pub struct LineBuilder<'a> {
    tree: &'a BoxTree,
    metrics: &'a dyn FontMetrics,
    paragraph: &'a Paragraph,
    block: BoxId,
    containing_width: f32,
}

impl<'a> LineBuilder<'a> {
    /// A builder for the lines of `block`, whose content box is
    /// `containing_width` wide.
    #[must_use]
    pub fn new(
        tree: &'a BoxTree,
        metrics: &'a dyn FontMetrics,
        paragraph: &'a Paragraph,
        block: BoxId,
        containing_width: f32,
    ) -> Self {
        Self {
            tree,
            metrics,
            paragraph,
            block,
            containing_width,
        }
    }

    /// Build the line `line` at `placement`, allocating its boxes in `arena`.
    pub fn build(&self, arena: &mut InlineBoxArena, line: &LineBreak, placement: &LinePlacement) -> BuiltLine {
        let block_style = &self.tree[self.block].style;
        let direction = line.direction;

        // STEP 1: Collect leaves in logical order.
        let (mut leaves, opens, closes, positioned, clear) = self.collect_leaves(line);
        let hang = self.trim_line_end(&mut leaves, line);
        if let Some(hyphen_width) = line.hyphen_width
            && let Some(Leaf {
                kind: Some(InlineBoxKind::Text(run)),
                width,
                ..
            }) = leaves.last_mut()
        {
            run.text.push_str(HYPHEN);
            run.hyphenated = true;
            *width += hyphen_width;
        }
        mark_expansion_edges(&mut leaves);

        let root = arena.alloc(InlineBox::new(
            self.block,
            InlineBoxKind::Root(RootLine {
                line_top: placement.line_top,
                line_bottom: placement.line_top,
                baseline: placement.line_top,
                floats: line.placed_floats.clone(),
                hyphenated: line.is_hyphenated(),
                ends_with_break: line.forced,
                direction,
                pagination_strut: 0.0,
            }),
        ));
        arena[root].bidi_level = self.paragraph.bidi.base_level();

        // STEP 2: Reorder visually and rebuild the flow boxes around each leaf.
        // [UAX #9 § 3.4 Reordering Resolved Levels](https://www.unicode.org/reports/tr9/#Reordering_Resolved_Levels)
        let levels: Vec<u8> = leaves.iter().map(|leaf| leaf.level).collect();
        let order = reorder_visually(&levels);
        let leaf_ids = self.build_tree(arena, root, &leaves, &order, &opens, &closes);

        // STEP 3: Inline pass.
        let indent = placement.text_indent;
        let available = placement.available_width - indent;
        let mut x = 0.0;
        self.place_inline(arena, root, &mut x);
        let mut content_width = x - hang;
        let slack = available - content_width;

        let justify = block_style.text_align == TextAlign::Justify
            && block_style.text_justify != TextJustify::None
            && !line.forced
            && !placement.is_last_line
            && slack > 0.0;
        let justified = justify && self.justify(arena, root, slack);
        if justified {
            content_width = available;
        }

        // [§ 16.2 Alignment](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
        let rtl = direction.is_rtl();
        let align = match block_style.text_align {
            TextAlign::Start | TextAlign::Justify if rtl => TextAlign::Right,
            TextAlign::Start | TextAlign::Justify => TextAlign::Left,
            TextAlign::End if rtl => TextAlign::Left,
            TextAlign::End => TextAlign::Right,
            other => other,
        };
        let offset = if justified {
            0.0
        } else if slack < 0.0 {
            if rtl { slack } else { 0.0 }
        } else {
            match align {
                TextAlign::Right => slack,
                TextAlign::Center => slack / 2.0,
                _ => 0.0,
            }
        };
        let start = placement.line_left + if rtl { 0.0 } else { indent } + offset;
        let mut x = start;
        self.place_inline(arena, root, &mut x);
        arena[root].logical_left = start;
        arena[root].logical_width = content_width;

        // STEP 4: Block pass.
        let height = if leaves.is_empty() {
            // A line holding only floats or positioned boxes has no height.
            arena[root].logical_top = placement.line_top;
            0.0
        } else {
            self.place_vertically(arena, root, placement)
        };

        // STEP 5: Static positions of out-of-flow boxes.
        let positioned = positioned
            .into_iter()
            .map(|(item, box_id)| {
                let following = leaves
                    .iter()
                    .zip(&leaf_ids)
                    .find(|(leaf, id)| leaf.item > item && id.is_some())
                    .and_then(|(_, id)| *id);
                let left = following.map_or(start + content_width, |id| arena[id].logical_left);
                (box_id, left, placement.line_top)
            })
            .collect();

        BuiltLine {
            root,
            height,
            positioned,
            clear,
        }
    }

    #[allow(clippy::type_complexity)]
    fn collect_leaves(&self, line: &LineBreak) -> (Vec<Leaf>, Vec<usize>, Vec<usize>, Vec<(usize, BoxId)>, Clear) {
        let paragraph = self.paragraph;
        let base = paragraph.bidi.base_level();
        let line_start = line.start.offset;
        let levels = paragraph.bidi.line_levels(line.start.offset..line.end.offset.max(line.start.offset));
        let level_at = |offset: usize| levels.get(offset.saturating_sub(line_start)).copied().unwrap_or(base);
        let open_of: HashMap<BoxId, usize> = paragraph
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.kind == ItemKind::Open)
            .map(|(index, item)| (item.box_id, index))
            .collect();
        let chain_of = |mut parent: Option<usize>| {
            let mut chain = Vec::new();
            while let Some(open) = parent {
                chain.push(open);
                parent = paragraph.items[open].parent;
            }
            chain.reverse();
            chain
        };

        let mut leaves = Vec::new();
        let mut opens = Vec::new();
        let mut closes = Vec::new();
        let mut positioned = Vec::new();
        let mut clear = Clear::None;
        for (index, range) in paragraph.pieces(line.start, line.end) {
            let item = &paragraph.items[index];
            match item.kind {
                ItemKind::Text => {
                    let mut run_start = range.start;
                    let mut run_level = level_at(range.start);
                    let boundaries = paragraph.text[range.clone()]
                        .char_indices()
                        .map(|(offset, _)| range.start + offset)
                        .chain(std::iter::once(range.end));
                    for at in boundaries {
                        let level = if at < range.end { level_at(at) } else { u8::MAX };
                        if level == run_level && at < range.end {
                            continue;
                        }
                        let visible: String = paragraph.text[run_start..at]
                            .chars()
                            .filter(|c| *c != SOFT_HYPHEN && *c != '\n')
                            .collect();
                        if !visible.is_empty() {
                            leaves.push(Leaf {
                                item: index,
                                box_id: item.box_id,
                                width: measure_text(self.metrics, &visible, &item.style.font),
                                kind: Some(InlineBoxKind::Text(TextRun {
                                    text: visible,
                                    expansion: 0.0,
                                    hyphenated: false,
                                    allows_leading_expansion: true,
                                    allows_trailing_expansion: true,
                                })),
                                level: run_level,
                                chain: chain_of(item.parent),
                            });
                        }
                        run_start = at;
                        run_level = level;
                    }
                }
                ItemKind::Atomic | ItemKind::LineBreak => {
                    let kind = if item.kind == ItemKind::Atomic {
                        InlineBoxKind::Atomic
                    } else {
                        clear = self.tree[item.box_id].style.clear;
                        InlineBoxKind::LineBreak
                    };
                    leaves.push(Leaf {
                        item: index,
                        box_id: item.box_id,
                        kind: Some(kind),
                        width: item.width,
                        level: level_at(range.start),
                        chain: chain_of(item.parent),
                    });
                }
                ItemKind::Open => opens.push(index),
                ItemKind::Close => {
                    if let Some(open) = open_of.get(&item.box_id) {
                        closes.push(*open);
                    }
                }
                ItemKind::Positioned => positioned.push((index, item.box_id)),
                ItemKind::Float => {}
            }
        }

        // Inline boxes opened and closed on this line with nothing inside
        // still occupy their edges.
        for open in &opens {
            let has_content = leaves.iter().any(|leaf| leaf.chain.contains(open));
            if !has_content && closes.contains(open) {
                let item = &paragraph.items[*open];
                let mut chain = chain_of(item.parent);
                chain.push(*open);
                leaves.push(Leaf {
                    item: *open,
                    box_id: item.box_id,
                    kind: None,
                    width: 0.0,
                    level: level_at(item.range.start),
                    chain,
                });
            }
        }
        leaves.sort_by_key(|leaf| leaf.item);
        (leaves, opens, closes, positioned, clear)
    }

    /// [§ 4.1.2 Phase II](https://www.w3.org/TR/css-text-3/#white-space-phase-2)
    ///
    /// "A sequence of collapsible spaces at the end of a line is removed."
    /// Returns the width of preserved spaces that still hang.
    fn trim_line_end(&self, leaves: &mut Vec<Leaf>, line: &LineBreak) -> f32 {
        let mut trimmed = 0.0;
        while let Some(leaf) = leaves.last_mut() {
            let style = &self.paragraph.items[leaf.item].style;
            let Some(InlineBoxKind::Text(run)) = &mut leaf.kind else {
                break;
            };
            if !style.white_space.collapses_spaces() {
                break;
            }
            let kept = run.text.trim_end_matches(' ').len();
            if kept == run.text.len() {
                break;
            }
            run.text.truncate(kept);
            let width = measure_text(self.metrics, &run.text, &style.font);
            trimmed += leaf.width - width;
            leaf.width = width;
            if !run.text.is_empty() {
                break;
            }
            let _ = leaves.pop();
        }
        (line.trailing_space - trimmed).max(0.0)
    }

    fn build_tree(
        &self,
        arena: &mut InlineBoxArena,
        root: InlineBoxId,
        leaves: &[Leaf],
        order: &[usize],
        opens: &[usize],
        closes: &[usize],
    ) -> Vec<Option<InlineBoxId>> {
        let mut leaf_ids = vec![None; leaves.len()];
        let mut stack: Vec<(usize, InlineBoxId)> = Vec::new();
        let mut fragments: BTreeMap<usize, Vec<InlineBoxId>> = BTreeMap::new();
        for &index in order {
            let leaf = &leaves[index];
            let common = stack
                .iter()
                .zip(&leaf.chain)
                .take_while(|((open, _), wanted)| open == *wanted)
                .count();
            stack.truncate(common);
            for &open in &leaf.chain[common..] {
                let parent = stack.last().map_or(root, |(_, id)| *id);
                let mut node = InlineBox::new(
                    self.paragraph.items[open].box_id,
                    InlineBoxKind::Flow {
                        include_left_edge: false,
                        include_right_edge: false,
                    },
                );
                node.bidi_level = leaf.level;
                let id = arena.alloc(node);
                arena.append_child(parent, id);
                stack.push((open, id));
                fragments.entry(open).or_default().push(id);
            }
            if let Some(kind) = &leaf.kind {
                let parent = stack.last().map_or(root, |(_, id)| *id);
                let mut node = InlineBox::new(leaf.box_id, kind.clone());
                node.logical_width = leaf.width;
                node.bidi_level = leaf.level;
                let id = arena.alloc(node);
                arena.append_child(parent, id);
                leaf_ids[index] = Some(id);
            }
        }

        // An inline box split by reordering draws its start edge on the
        // first fragment in its own direction and its end edge on the last.
        for (open, ids) in &fragments {
            let (Some(first), Some(last)) = (ids.first().copied(), ids.last().copied()) else {
                continue;
            };
            let rtl = self.tree[self.paragraph.items[*open].box_id].style.direction.is_rtl();
            let (left_edge_here, right_edge_here) = if rtl {
                (closes.contains(open), opens.contains(open))
            } else {
                (opens.contains(open), closes.contains(open))
            };
            if let InlineBoxKind::Flow {
                include_left_edge, ..
            } = &mut arena[first].kind
            {
                *include_left_edge = left_edge_here;
            }
            if let InlineBoxKind::Flow {
                include_right_edge, ..
            } = &mut arena[last].kind
            {
                *include_right_edge = right_edge_here;
            }
        }
        leaf_ids
    }

    /// Lay the children of `id` out left to right from `x`.
    fn place_inline(&self, arena: &mut InlineBoxArena, id: InlineBoxId, x: &mut f32) {
        let children: Vec<_> = arena.children(id).collect();
        for child in children {
            match arena[child].kind {
                InlineBoxKind::Flow {
                    include_left_edge,
                    include_right_edge,
                } => {
                    let style = &self.tree[arena[child].box_id].style;
                    let (left, right) = flow_edges(style, self.containing_width);
                    if include_left_edge {
                        *x += left.margin;
                    }
                    let border_left = *x;
                    if include_left_edge {
                        *x += left.border_padding;
                    }
                    self.place_inline(arena, child, x);
                    if include_right_edge {
                        *x += right.border_padding;
                    }
                    let node = &mut arena[child];
                    node.logical_left = border_left;
                    node.logical_width = *x - border_left;
                    if include_right_edge {
                        *x += right.margin;
                    }
                }
                _ => {
                    let node = &mut arena[child];
                    node.logical_left = *x;
                    *x += node.logical_width;
                }
            }
        }
    }

    /// [§ 7.3 Justification](https://www.w3.org/TR/css-text-3/#justify-opportunities)
    ///
    /// Spread `slack` over the line's expansion opportunities. Returns false
    /// when the line has none.
    fn justify(&self, arena: &mut InlineBoxArena, root: InlineBoxId, slack: f32) -> bool {
        let inter_character = self.tree[self.block].style.text_justify == TextJustify::InterCharacter;
        let runs: Vec<InlineBoxId> = arena
            .leaves(root)
            .into_iter()
            .filter(|id| matches!(arena[*id].kind, InlineBoxKind::Text(_)))
            .collect();
        // A boundary between two runs is an opportunity only when both sides
        // allow it; it is credited to the run on the left.
        let boundary_allowed = |index: usize| {
            let after = runs.get(index + 1).and_then(|id| match &arena[*id].kind {
                InlineBoxKind::Text(run) => Some(run.allows_leading_expansion),
                _ => None,
            });
            match &arena[runs[index]].kind {
                InlineBoxKind::Text(run) => run.allows_trailing_expansion && after.unwrap_or(false),
                _ => false,
            }
        };
        let opportunities: Vec<usize> = runs
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let InlineBoxKind::Text(run) = &arena[*id].kind else {
                    return 0;
                };
                let boundary = boundary_allowed(index);
                if inter_character {
                    run.text.chars().count().saturating_sub(1) + usize::from(boundary)
                } else {
                    let text = if run.allows_leading_expansion {
                        run.text.as_str()
                    } else {
                        run.text.trim_start_matches(' ')
                    };
                    let text = if boundary { text } else { text.trim_end_matches(' ') };
                    text.matches(' ').count()
                }
            })
            .collect();
        let total: usize = opportunities.iter().sum();
        if total == 0 {
            return false;
        }
        let per_opportunity = slack / total as f32;
        for (id, count) in runs.iter().zip(&opportunities) {
            let node = &mut arena[*id];
            let expansion = per_opportunity * *count as f32;
            node.logical_width += expansion;
            if let InlineBoxKind::Text(run) = &mut node.kind {
                run.expansion = expansion;
            }
        }
        let mut x = 0.0;
        self.place_inline(arena, root, &mut x);
        true
    }

    fn place_vertically(&self, arena: &mut InlineBoxArena, root: InlineBoxId, placement: &LinePlacement) -> f32 {
        let block_style = &self.tree[self.block].style;
        let baseline = block_style
            .dominant_baseline
            .resolve(block_style.writing_mode);
        let root_metrics = strut(block_style, self.metrics, baseline);

        let mut pass = VerticalPass {
            tree: self.tree,
            arena,
            metrics: self.metrics,
            baseline,
            out: Vec::new(),
            deferred: Vec::new(),
        };
        // The root inline box's strut always counts.
        let mut extents = Extents::EMPTY;
        extents.include(-root_metrics.above, root_metrics.below);
        pass.walk(root, block_style, 0.0, &mut extents, false);
        let VerticalPass {
            mut out, deferred, ..
        } = pass;

        // `top` and `bottom` boxes first stretch the line, then align to it.
        for late in &deferred {
            let height = late.extents.height();
            match late.align {
                VerticalAlign::Top if extents.top + height > extents.bottom => {
                    extents.bottom = extents.top + height;
                }
                VerticalAlign::Bottom if extents.bottom - height < extents.top => {
                    extents.top = extents.bottom - height;
                }
                _ => {}
            }
        }
        for late in &deferred {
            let shift = if late.align == VerticalAlign::Top {
                extents.top - late.extents.top
            } else {
                extents.bottom - late.extents.bottom
            };
            for placed in &mut out[late.range.clone()] {
                placed.baseline += shift;
            }
        }

        let line_height = extents.height();
        let root_baseline = placement.line_top - extents.top;
        for placed in &out {
            let node = &mut arena[placed.id];
            node.logical_top = root_baseline + placed.baseline - placed.ascent;
            node.logical_height = placed.ascent + placed.descent;
            node.baseline = placed.ascent;
        }
        {
            let node = &mut arena[root];
            node.logical_top = root_baseline - root_metrics.ascent;
            node.logical_height = root_metrics.ascent + root_metrics.descent;
            node.baseline = root_metrics.ascent;
            if let InlineBoxKind::Root(line) = &mut node.kind {
                line.line_top = placement.line_top;
                line.line_bottom = placement.line_top + line_height;
                line.baseline = root_baseline;
            }
        }

        self.snap_to_grid(arena, root, placement, line_height, root_baseline)
    }

    /// [CSS Line Grid § 3 'line-snap'](https://drafts.csswg.org/css-line-grid/#line-snap)
    ///
    /// Returns the final line height.
    fn snap_to_grid(
        &self,
        arena: &mut InlineBoxArena,
        root: InlineBoxId,
        placement: &LinePlacement,
        line_height: f32,
        root_baseline: f32,
    ) -> f32 {
        let Some(grid) = placement.grid else {
            return line_height;
        };
        let (shift, snapped_height) = match self.tree[self.block].style.line_snap {
            LineSnap::None => return line_height,
            // "Snap the baseline of each line to the line grid."
            LineSnap::Baseline => {
                let absolute = placement.block_offset + root_baseline;
                let shift = grid.next_line_at_or_after(absolute) - absolute;
                (shift, line_height + shift)
            }
            // "Snap each line box to the line grid, centering the line box
            // within the smallest number of grid units that contains it."
            LineSnap::Contain => {
                let absolute_top = placement.block_offset + placement.line_top;
                let to_grid = grid.next_line_at_or_after(absolute_top) - absolute_top;
                let units = (line_height / grid.pitch - 1e-3).ceil().max(1.0);
                let grid_height = units * grid.pitch;
                (to_grid + (grid_height - line_height) / 2.0, to_grid + grid_height)
            }
        };
        arena.shift_block(root, shift);
        if let InlineBoxKind::Root(line) = &mut arena[root].kind {
            line.line_top = placement.line_top;
            line.line_bottom = placement.line_top + snapped_height;
        }
        snapped_height
    }
}

/// Move atomic inline boxes to where their leaves ended up on `root`'s line.
pub fn place_atomic_boxes(tree: &mut BoxTree, root: InlineBoxId) {
    let placements: Vec<(BoxId, f32, f32)> = {
        let arena = tree.inline_boxes();
        arena
            .leaves(root)
            .into_iter()
            .filter(|id| arena[*id].kind == InlineBoxKind::Atomic)
            .map(|id| {
                let leaf = &arena[id];
                (leaf.box_id, leaf.logical_left, leaf.logical_top)
            })
            .collect()
    };
    for (box_id, left, top) in placements {
        let node = &mut tree[box_id];
        let margins = node.logical_margins();
        node.set_logical_location(left + margins.line_left, top + margins.block_start);
    }
}
