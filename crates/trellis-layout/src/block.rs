//! Block layout.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."
//!
//! Children are laid out at an estimated position first, since a child's
//! final position depends on margins that only collapse once the child's
//! own margins are known. A child whose position or available width then
//! changes is laid out again when something position-dependent (floats,
//! pagination, a line grid) could have shaped its content.

use log::trace;
use trellis_common::warning::warn_once;

use crate::config::LayoutConfig;
use crate::float::{FloatKind, FloatManager};
use crate::geometry::LogicalEdges;
use crate::inline::used_line_height;
use crate::margin::{ChildMargins, CollapseFlags, CollapsedMargin, MarginState, MarginValues};
use crate::pagination::{LineGrid, PaginationContext};
use crate::sizing::{self, UsedEdges, WidthMode};
use crate::stats::LayoutStats;
use crate::style::{Clear, LineGridMode, Position, WritingMode};
use crate::text::FontMetrics;
use crate::tree::{BoxId, BoxKind, BoxTree};

// Bound on re-placing a child whose height changes with the space beside
// floats.
const MAX_PLACEMENT_PASSES: usize = 4;

/// Steps of one block's layout. A block only moves forward through them;
/// steps that do not apply are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LayoutPhase {
    Init,
    LayingOutChildren,
    ResolvingFloats,
    BuildingLines,
    AccumulatingOverflow,
    PaginationAdjust,
    Done,
}

pub(crate) struct PhaseTracker {
    block: BoxId,
    phase: LayoutPhase,
}

impl PhaseTracker {
    const fn new(block: BoxId) -> Self {
        Self {
            block,
            phase: LayoutPhase::Init,
        }
    }

    fn enter(&mut self, next: LayoutPhase) {
        debug_assert!(
            next >= self.phase,
            "block {} went back from {:?} to {next:?}",
            self.block,
            self.phase
        );
        self.phase = next;
        trace!(target: "trellis::block", "{} {next:?}", self.block);
    }

    pub(crate) fn resolving_floats(&mut self) {
        self.enter(LayoutPhase::ResolvingFloats);
    }

    pub(crate) fn building_lines(&mut self) {
        self.enter(LayoutPhase::BuildingLines);
    }
}

/// Space a box is laid out against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Containing {
    /// Inline size available to the box's margin box.
    pub width: f32,
    /// Definite block size for percentage heights, if any.
    pub height: Option<f32>,
}

/// Floats of the parent that may reach into a child, with the child's
/// border-box origin in the parent's logical space.
pub(crate) struct Intruding<'f> {
    pub floats: &'f FloatManager,
    pub logical_left: f32,
    pub logical_top: f32,
}

/// What a block reports back to its parent.
pub(crate) struct BlockOutcome {
    /// Floats known to the block, including any that overhang its bottom.
    pub floats: FloatManager,
    /// Collapsed before/after margins.
    pub margins: MarginValues,
    /// Zero height with nothing separating its two margins.
    pub self_collapsing: bool,
}

/// Out-of-flow box waiting for its containing block's final size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StaticPosition {
    pub box_id: BoxId,
    pub logical_left: f32,
    pub logical_top: f32,
}

/// Where a block child goes and how wide it may be.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ChildPlacement {
    left: f32,
    top: f32,
    available: f32,
}

/// The border box of a finished block, as seen by its out-of-flow children.
struct ContainerGeometry {
    width: f32,
    height: f32,
    border: LogicalEdges,
}

/// Shared state of one layout pass.
pub(crate) struct LayoutContext<'a> {
    pub tree: &'a mut BoxTree,
    pub config: &'a LayoutConfig,
    pub metrics: &'a dyn FontMetrics,
    pub pagination: PaginationContext,
    pub stats: LayoutStats,
    writing_mode: WritingMode,
}

impl<'a> LayoutContext<'a> {
    pub(crate) fn new(
        tree: &'a mut BoxTree,
        config: &'a LayoutConfig,
        metrics: &'a dyn FontMetrics,
        writing_mode: WritingMode,
    ) -> Self {
        Self {
            tree,
            config,
            metrics,
            pagination: PaginationContext::new(&config.fragmentation, config.line_grid),
            stats: LayoutStats::default(),
            writing_mode,
        }
    }

    /// Lay out `id` and everything below it. The box's size is set; its
    /// position is left to the caller.
    pub(crate) fn layout_block(
        &mut self,
        id: BoxId,
        containing: Containing,
        mode: WidthMode,
        intruding: Option<Intruding<'_>>,
    ) -> BlockOutcome {
        let mut phase = PhaseTracker::new(id);
        self.prepare_box(id);

        // STEP 1: Inline size and edges.
        let (width, edges) =
            sizing::used_inline_size(self.tree, self.metrics, id, containing.width, mode);
        self.store_edges(id, &edges);
        let bp = edges.border_padding();
        let content_width = (width - bp.inline_sum()).max(0.0);
        let own = MarginValues::from_margins(edges.margin.block_start, edges.margin.block_end);

        if let BoxKind::Replaced {
            intrinsic_width,
            intrinsic_height,
        } = self.tree[id].kind
        {
            self.layout_replaced(id, width, &bp, containing, (intrinsic_width, intrinsic_height));
            phase.enter(LayoutPhase::AccumulatingOverflow);
            self.tree[id].add_own_visual_overflow();
            phase.enter(LayoutPhase::Done);
            return BlockOutcome {
                floats: FloatManager::new(bp.line_left, bp.line_left + content_width),
                margins: own,
                self_collapsing: false,
            };
        }

        // STEP 2: Floats this block can see.
        let establishes_bfc = self.establishes_bfc(id);
        let mut floats = FloatManager::new(bp.line_left, bp.line_left + content_width);
        if !establishes_bfc && let Some(parent) = intruding {
            floats.import_intruding(parent.floats, parent.logical_left, parent.logical_top);
        }
        self.enter_line_grid(id, bp.block_start);

        // STEP 3: Children.
        let style = &self.tree[id].style;
        let auto_height = sizing::has_auto_height(style, containing.height);
        let children_containing = Containing {
            width: content_width,
            height: sizing::definite_content_height(style, bp.block_sum(), containing.height),
        };
        let mut positioned = Vec::new();
        let mut logical_height;
        let (margins, has_content) = if self.tree.children_inline(id) {
            let (bottom, has_content) = self.layout_inline_content(
                id,
                &mut floats,
                bp.block_start,
                content_width,
                &mut positioned,
                &mut phase,
            );
            logical_height = bottom + bp.block_end;
            (own, has_content)
        } else {
            phase.enter(LayoutPhase::LayingOutChildren);
            let flags = CollapseFlags {
                isolates_children: establishes_bfc,
                quirk_container: self.is_quirk_container(id),
                auto_height,
            };
            let mut state = MarginState::begin_block(bp.block_start, bp.block_end, own, flags);
            logical_height = bp.block_start;
            let has_content = self.layout_block_children(
                id,
                &mut floats,
                &mut state,
                &mut logical_height,
                children_containing,
                &mut positioned,
            );
            let values = state.finalize_block(&mut logical_height, bp.block_start, bp.block_end);
            (values, has_content)
        };

        // STEP 4: Block size.
        //
        // [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
        //
        // "In addition, if the element has any floating descendants whose
        // bottom margin edge is below the element's bottom content edge,
        // then the height is increased to include those edges."
        if establishes_bfc {
            logical_height = logical_height.max(floats.lowest_float_logical_bottom() + bp.block_end);
        }
        let height = sizing::used_block_size(
            &self.tree[id].style,
            logical_height,
            bp.block_sum(),
            containing.height,
        );
        self.tree[id].set_logical_size(width, height);
        let self_collapsing =
            !has_content && height <= 0.0 && bp.block_sum() == 0.0 && !establishes_bfc && auto_height;
        self.store_margin_values(id, own, margins);

        // STEP 5: Out-of-flow children, now that the container's size is known.
        if !positioned.is_empty() {
            let container = ContainerGeometry {
                width,
                height,
                border: edges.border,
            };
            for position in positioned {
                self.layout_positioned(position, &container);
            }
        }

        phase.enter(LayoutPhase::AccumulatingOverflow);
        self.accumulate_overflow(id);

        phase.enter(LayoutPhase::PaginationAdjust);
        if self.pagination.is_paginated() {
            let offset = self.pagination.current().offset;
            self.tree[id].ensure_rare_data().page_logical_offset = offset;
        }

        phase.enter(LayoutPhase::Done);
        BlockOutcome {
            floats,
            margins,
            self_collapsing,
        }
    }

    pub(crate) fn prepare_box(&mut self, id: BoxId) {
        self.stats.boxes_laid_out += 1;
        let mode = self.writing_mode;
        let node = &mut self.tree[id];
        if node.style.writing_mode.is_horizontal() != mode.is_horizontal() {
            warn_once(
                "Layout",
                "orthogonal writing mode laid out in its parent's block direction",
            );
        }
        node.flow_mode = mode;
        node.reset_overflow();
        node.needs_layout = false;
    }

    pub(crate) fn store_edges(&mut self, id: BoxId, edges: &UsedEdges) {
        let node = &mut self.tree[id];
        let mode = node.flow_mode;
        node.dimensions.margin = edges.margin.to_physical(mode);
        node.dimensions.border = edges.border.to_physical(mode);
        node.dimensions.padding = edges.padding.to_physical(mode);
    }

    fn store_margin_values(&mut self, id: BoxId, own: MarginValues, collapsed: MarginValues) {
        let node = &mut self.tree[id];
        if collapsed != own {
            node.ensure_rare_data().margin_values = Some(collapsed);
        } else if let Some(rare) = node.rare.as_deref_mut() {
            rare.margin_values = None;
        }
    }

    /// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
    ///
    /// "if 'width' has a computed value of 'auto', 'height' has some other
    /// computed value, and the element does have an intrinsic ratio then the
    /// used value of 'width' is: (used height) * (intrinsic ratio)"
    fn layout_replaced(
        &mut self,
        id: BoxId,
        width: f32,
        bp: &LogicalEdges,
        containing: Containing,
        (intrinsic_width, intrinsic_height): (f32, f32),
    ) {
        let style = &self.tree[id].style;
        let content_height = style.height.resolve(containing.height);
        let mut width = width;
        if style.width.is_auto()
            && let Some(height) = content_height
            && intrinsic_height > 0.0
        {
            width = height * intrinsic_width / intrinsic_height + bp.inline_sum();
        }
        let ratio_height = if intrinsic_width > 0.0 {
            (width - bp.inline_sum()).max(0.0) * intrinsic_height / intrinsic_width
        } else {
            intrinsic_height
        };
        let height = sizing::used_block_size(
            style,
            ratio_height + bp.block_sum(),
            bp.block_sum(),
            containing.height,
        );
        self.tree[id].set_logical_size(width, height);
    }

    /// [CSS Line Grid § 2](https://drafts.csswg.org/css-line-grid/#line-grid)
    ///
    /// "create: A new line grid is established by this element." The grid
    /// pitch is the block's own line height and its first line sits on the
    /// content edge.
    fn enter_line_grid(&mut self, id: BoxId, content_top: f32) {
        let style = &self.tree[id].style;
        if style.line_grid != LineGridMode::Create {
            return;
        }
        let pitch = used_line_height(style, self.metrics);
        if pitch > 0.0 {
            let origin = self.pagination.current().offset + content_top;
            self.pagination.set_line_grid(Some(LineGrid { pitch, origin }));
        }
    }

    /// [§ 9.4.1](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// "Floats, absolutely positioned elements, block containers (such as
    /// inline-blocks, table-cells, and table-captions) that are not block
    /// boxes, and block boxes with 'overflow' other than 'visible' ...
    /// establish new block formatting contexts for their contents."
    pub(crate) fn establishes_bfc(&self, id: BoxId) -> bool {
        let node = &self.tree[id];
        node.style.establishes_bfc()
            || matches!(node.kind, BoxKind::InlineBlock | BoxKind::TableCell)
            || node
                .parent()
                .is_none_or(|parent| self.tree[parent].kind == BoxKind::Inline)
    }

    fn is_quirk_container(&self, id: BoxId) -> bool {
        let node = &self.tree[id];
        self.config.quirks_mode
            && (node.kind == BoxKind::TableCell || node.name.as_deref() == Some("body"))
    }

    fn layout_block_children(
        &mut self,
        id: BoxId,
        floats: &mut FloatManager,
        state: &mut MarginState,
        logical_height: &mut f32,
        containing: Containing,
        positioned: &mut Vec<StaticPosition>,
    ) -> bool {
        let content_left = floats.content_left();
        let mut has_content = false;
        for child in self.tree.children(id).to_vec() {
            let style = &self.tree[child].style;
            let static_top = if state.at_before_side() {
                *logical_height
            } else {
                *logical_height + state.margin()
            };
            if style.is_out_of_flow_positioned() {
                // [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
                //
                // The static position is where the box would have been in
                // normal flow.
                let handle = floats.insert(child, FloatKind::Positioned, 0.0, 0.0);
                let _ = floats.place(handle, static_top);
                positioned.push(StaticPosition {
                    box_id: child,
                    logical_left: content_left,
                    logical_top: static_top,
                });
                continue;
            }
            if style.is_floating() {
                self.layout_float(child, containing.width);
                self.place_float(child, floats, static_top);
                continue;
            }
            has_content |= self.layout_block_child(child, floats, state, logical_height, containing);
        }
        has_content
    }

    /// Lay out one in-flow block child and advance `logical_height` past it.
    /// Returns true if the child separates the margins around it.
    fn layout_block_child(
        &mut self,
        child: BoxId,
        floats: &mut FloatManager,
        state: &mut MarginState,
        logical_height: &mut f32,
        containing: Containing,
    ) -> bool {
        let (clear, break_before, break_after, avoids_break_inside) = {
            let style = &self.tree[child].style;
            (
                style.clear,
                style.break_before,
                style.break_after,
                style.avoids_break_inside(),
            )
        };
        let child_bfc = self.establishes_bfc(child);
        let before = UsedEdges::resolve(&self.tree[child].style, containing.width)
            .margin
            .block_start;

        // STEP 1: Estimate where the child will land.
        let mut estimate = state.estimate_logical_top(*logical_height, CollapsedMargin::new(before));
        estimate = floats.clearance_position(clear, estimate);
        estimate = self.pagination.apply_break_before(break_before, estimate);

        // STEP 2: Lay it out there.
        let expected = self.expected_block_size(child, containing);
        let mut placement =
            self.child_placement(child, floats, estimate, expected, containing, child_bfc);
        let mut outcome = self.layout_child_at(child, floats, placement, containing);

        // STEP 3: Collapse margins and apply clearance.
        let forced = self.pagination.apply_break_before(break_before, *logical_height) > *logical_height;
        if forced && !state.at_before_side() {
            state.clear_margin();
        }
        let saved_before = state.block_values().before;
        let child_margins = ChildMargins {
            values: outcome.margins,
            self_collapsing: outcome.self_collapsing,
        };
        let mut top = state.collapse_margins(logical_height, child_margins);
        if clear != Clear::None {
            let clear_to = floats.clearance_position(clear, top);
            top = state.apply_clearance(logical_height, top, clear_to, child_margins, saved_before);
        }

        // STEP 4: A forced break moves the child to the next page.
        let broken = self.pagination.apply_break_before(break_before, top);
        if broken > top {
            *logical_height += broken - top;
            top = broken;
        }

        // STEP 5: Final position; lay out again if it moved where it matters.
        // A new formatting context narrowed beside floats can change height,
        // and with it the band that has to clear them.
        let height = self.tree[child].logical_height();
        let mut next = self.child_placement(child, floats, top, height, containing, child_bfc);
        let mut passes = 0;
        while next != placement && passes < MAX_PLACEMENT_PASSES {
            passes += 1;
            if self.position_dependent(floats) {
                self.stats.relayouts += 1;
                outcome = self.layout_child_at(child, floats, next, containing);
            } else {
                self.tree[child].set_logical_location(next.left, next.top);
            }
            placement = next;
            let height = self.tree[child].logical_height();
            next = self.child_placement(child, floats, top, height, containing, child_bfc);
        }
        if placement.top > top {
            *logical_height += placement.top - top;
        }

        // STEP 6: Unsplittable children move whole to the next page.
        let mut height = self.tree[child].logical_height();
        let unsplittable =
            avoids_break_inside || matches!(self.tree[child].kind, BoxKind::Replaced { .. });
        let mut strut = 0.0;
        if unsplittable && !outcome.self_collapsing {
            strut = self.pagination.adjust_for_unsplittable(placement.top, height);
            if strut > 0.0 {
                placement.top += strut;
                *logical_height += strut;
                self.stats.pagination_struts += 1;
                self.stats.relayouts += 1;
                outcome = self.layout_child_at(child, floats, placement, containing);
                height = self.tree[child].logical_height();
            }
        }
        self.tree[child].set_pagination_strut(strut);

        // STEP 7: Floats hanging out of the child now affect its siblings.
        if !self.establishes_bfc(child) {
            floats.import_overhanging(&outcome.floats, placement.left, placement.top, height);
        }

        if !outcome.self_collapsing {
            *logical_height = placement.top + height;
        }
        let after = self.pagination.apply_break_after(break_after, *logical_height);
        if after > *logical_height {
            *logical_height = after;
            state.clear_margin();
        }
        self.apply_relative_offset(child, containing);
        !outcome.self_collapsing
    }

    /// Border-box position and available width for a block child whose
    /// top margin edge collapsed to `top`.
    ///
    /// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
    ///
    /// "The border box of a table, a block-level replaced element, or an
    /// element in the normal flow that establishes a new block formatting
    /// context ... must not overlap the margin box of any floats in the
    /// same block formatting context as the element itself."
    ///
    /// The child's border box is `height` tall; every float beside any part
    /// of it narrows the space.
    fn child_placement(
        &self,
        child: BoxId,
        floats: &FloatManager,
        top: f32,
        height: f32,
        containing: Containing,
        child_bfc: bool,
    ) -> ChildPlacement {
        let (width, edges) =
            sizing::used_inline_size(self.tree, self.metrics, child, containing.width, WidthMode::Fill);
        let placement = ChildPlacement {
            left: floats.content_left() + edges.margin.line_left,
            top,
            available: containing.width,
        };
        if !child_bfc || !floats.has_floats() {
            return placement;
        }
        let style = &self.tree[child].style;
        let needed = if style.width.is_auto() {
            sizing::intrinsic_sizes(self.tree, self.metrics, child).min_content
        } else {
            width
        } + edges.margin.inline_sum();
        let (y, band) = floats.find_band(top, needed, height);
        let band_width = band.width();
        if band_width >= floats.content_width() {
            return ChildPlacement { top: y, ..placement };
        }
        let (_, narrowed) =
            sizing::used_inline_size(self.tree, self.metrics, child, band_width, WidthMode::Fill);
        ChildPlacement {
            left: band.left + narrowed.margin.line_left,
            top: y,
            available: band_width,
        }
    }

    /// Border-box block size of `child` before it is laid out where it
    /// lands: the last layout's, or what its height properties alone give.
    fn expected_block_size(&self, child: BoxId, containing: Containing) -> f32 {
        let node = &self.tree[child];
        let border_padding = UsedEdges::resolve(&node.style, containing.width)
            .border_padding()
            .block_sum();
        let specified = sizing::used_block_size(&node.style, 0.0, border_padding, containing.height);
        node.logical_height().max(specified)
    }

    fn position_dependent(&self, floats: &FloatManager) -> bool {
        floats.has_floats()
            || self.pagination.is_paginated()
            || self.pagination.current().line_grid.is_some()
    }

    fn layout_child_at(
        &mut self,
        child: BoxId,
        floats: &FloatManager,
        placement: ChildPlacement,
        containing: Containing,
    ) -> BlockOutcome {
        self.pagination.push(placement.top);
        let outcome = self.layout_block(
            child,
            Containing {
                width: placement.available,
                height: containing.height,
            },
            WidthMode::Fill,
            Some(Intruding {
                floats,
                logical_left: placement.left,
                logical_top: placement.top,
            }),
        );
        self.pagination.pop();
        self.tree[child].set_logical_location(placement.left, placement.top);
        outcome
    }

    /// Lay out a float's contents. It is never fragmented; [`Self::place_float`]
    /// moves it as a whole.
    pub(crate) fn layout_float(&mut self, child: BoxId, containing_width: f32) {
        self.pagination.push_monolithic();
        let _ = self.layout_block(
            child,
            Containing {
                width: containing_width,
                height: None,
            },
            WidthMode::ShrinkToFit,
            None,
        );
        self.pagination.pop();
    }

    /// Place a laid-out float at or below `hint`, pushing it to the next
    /// page if it would straddle a boundary.
    pub(crate) fn place_float(&mut self, child: BoxId, floats: &mut FloatManager, hint: f32) {
        let node = &self.tree[child];
        let margins = node.logical_margins();
        let width = node.logical_width() + margins.inline_sum();
        let height = node.logical_height() + margins.block_sum();
        let kind = FloatKind::from_float(node.style.float).unwrap_or(FloatKind::Left);
        let handle = floats.insert(child, kind, width, height);
        let Some(mut rect) = floats.place(handle, hint) else {
            return;
        };
        let strut = self.pagination.adjust_for_unsplittable(rect.y, height);
        if strut > 0.0 {
            let _ = floats.remove(handle);
            let handle = floats.insert(child, kind, width, height);
            if let Some(moved) = floats.place(handle, rect.y + strut) {
                rect = moved;
            }
            floats.set_pagination_strut(handle, strut);
            self.stats.pagination_struts += 1;
        }
        self.stats.floats_placed += 1;
        let node = &mut self.tree[child];
        node.set_pagination_strut(strut);
        node.set_logical_location(rect.x + margins.line_left, rect.y + margins.block_start);
    }

    /// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
    ///
    /// The containing block is the padding box of the parent. A box with
    /// neither inset set on an axis stays at its static position.
    fn layout_positioned(&mut self, position: StaticPosition, container: &ContainerGeometry) {
        let child = position.box_id;
        let cb_width = (container.width - container.border.inline_sum()).max(0.0);
        let cb_height = (container.height - container.border.block_sum()).max(0.0);
        self.pagination.push_monolithic();
        let _ = self.layout_block(
            child,
            Containing {
                width: cb_width,
                height: Some(cb_height),
            },
            WidthMode::ShrinkToFit,
            None,
        );
        self.pagination.pop();

        let node = &self.tree[child];
        let margins = node.logical_margins();
        let (width, height) = (node.logical_width(), node.logical_height());
        let inset = &node.style.inset;
        let (inset_left, inset_right) = inset.line_sides(node.style.direction);
        let (basis_width, basis_height) = (Some(cb_width), Some(cb_height));
        let border = &container.border;

        let left = inset_left
            .resolve(basis_width)
            .map(|offset| border.line_left + offset + margins.line_left)
            .or_else(|| {
                inset_right.resolve(basis_width).map(|offset| {
                    container.width - border.line_right - offset - margins.line_right - width
                })
            })
            .unwrap_or(position.logical_left + margins.line_left);
        let top = inset
            .block_start
            .resolve(basis_height)
            .map(|offset| border.block_start + offset + margins.block_start)
            .or_else(|| {
                inset.block_end.resolve(basis_height).map(|offset| {
                    container.height - border.block_end - offset - margins.block_end - height
                })
            })
            .unwrap_or(position.logical_top + margins.block_start);
        self.tree[child].set_logical_location(left, top);
    }

    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
    ///
    /// "Once a box has been laid out according to the normal flow or
    /// floated, it may be shifted relative to this position."
    pub(crate) fn apply_relative_offset(&mut self, child: BoxId, containing: Containing) {
        let node = &mut self.tree[child];
        if node.style.position != Position::Relative {
            if let Some(rare) = node.rare.as_deref_mut() {
                rare.relative_offset = None;
            }
            return;
        }
        let inset = &node.style.inset;
        let (inset_left, inset_right) = inset.line_sides(node.style.direction);
        let basis = Some(containing.width);
        let dx = inset_left
            .resolve(basis)
            .or_else(|| inset_right.resolve(basis).map(|offset| -offset))
            .unwrap_or(0.0);
        let dy = inset
            .block_start
            .resolve(containing.height)
            .or_else(|| inset.block_end.resolve(containing.height).map(|offset| -offset))
            .unwrap_or(0.0);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        node.set_logical_location(node.logical_left() + dx, node.logical_top() + dy);
        node.ensure_rare_data().relative_offset = Some((dx, dy));
    }

    /// Rebuild `id`'s overflow from its own effects, its lines and every box
    /// positioned in its coordinate space.
    fn accumulate_overflow(&mut self, id: BoxId) {
        self.tree[id].reset_overflow();
        self.tree[id].add_own_visual_overflow();
        self.add_line_overflow(id);
        let mut pending = self.tree.children(id).to_vec();
        while let Some(child) = pending.pop() {
            self.tree.propagate_overflow(id, child);
            // Boxes inside inline boxes are positioned in the block's space.
            if self.tree[child].kind == BoxKind::Inline {
                pending.extend_from_slice(self.tree.children(child));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ComputedStyle, Float, Length, Sides};
    use crate::text::FixedWidthMetrics;

    const METRICS: FixedWidthMetrics = FixedWidthMetrics::new(8.0);

    fn block(height: f32, margin_before: f32, margin_after: f32) -> ComputedStyle {
        ComputedStyle {
            height: Length::Px(height),
            margin: Sides {
                block_start: Length::Px(margin_before),
                block_end: Length::Px(margin_after),
                ..Sides::ZERO
            },
            ..ComputedStyle::default()
        }
    }

    fn run(tree: &mut BoxTree, root: BoxId, config: &LayoutConfig) -> LayoutStats {
        let mut ctx = LayoutContext::new(tree, config, &METRICS, WritingMode::HorizontalTb);
        let _ = ctx.layout_block(
            root,
            Containing {
                width: config.viewport.width,
                height: None,
            },
            WidthMode::Fill,
            None,
        );
        ctx.stats
    }

    #[test]
    fn test_sibling_margins_collapse_to_the_larger() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let first = tree.create(BoxKind::Block, block(20.0, 0.0, 10.0));
        let second = tree.create(BoxKind::Block, block(20.0, 15.0, 0.0));
        tree.append_child(root, first).expect("append");
        tree.append_child(root, second).expect("append");

        let _ = run(&mut tree, root, &LayoutConfig::default());
        assert_eq!(tree[first].frame().y, 0.0);
        assert_eq!(tree[second].frame().y, 35.0);
        assert_eq!(tree[root].frame().height, 55.0);
    }

    #[test]
    fn test_first_child_margin_collapses_through_parent() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let parent = tree.create(BoxKind::Block, block(0.0, 5.0, 0.0));
        tree[parent].style.height = Length::Auto;
        let child = tree.create(BoxKind::Block, block(10.0, 12.0, 0.0));
        tree.append_child(root, parent).expect("append");
        tree.append_child(parent, child).expect("append");

        let _ = run(&mut tree, root, &LayoutConfig::default());
        assert_eq!(tree[parent].frame().y, 12.0);
        assert_eq!(tree[child].frame().y, 0.0);
        assert_eq!(
            tree[parent].margin_values().map(|m| m.effective_before()),
            Some(12.0)
        );
    }

    #[test]
    fn test_empty_block_is_self_collapsing() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let above = tree.create(BoxKind::Block, block(10.0, 0.0, 10.0));
        let empty = tree.create(BoxKind::Block, block(0.0, 20.0, 5.0));
        tree[empty].style.height = Length::Auto;
        let below = tree.create(BoxKind::Block, block(10.0, 8.0, 0.0));
        for id in [above, empty, below] {
            tree.append_child(root, id).expect("append");
        }

        let _ = run(&mut tree, root, &LayoutConfig::default());
        // All three adjoining margins collapse to the largest, 20.
        assert_eq!(tree[below].frame().y, 30.0);
    }

    #[test]
    fn test_float_is_placed_and_root_contains_it() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let float = tree.create(
            BoxKind::Block,
            ComputedStyle {
                float: Float::Right,
                width: Length::Px(100.0),
                height: Length::Px(60.0),
                ..ComputedStyle::default()
            },
        );
        tree.append_child(root, float).expect("append");

        let stats = run(
            &mut tree,
            root,
            &LayoutConfig {
                viewport: crate::config::Viewport {
                    width: 300.0,
                    height: 200.0,
                },
                ..LayoutConfig::default()
            },
        );
        assert_eq!(stats.floats_placed, 1);
        assert_eq!(tree[float].frame().x, 200.0);
        assert_eq!(tree[root].frame().height, 60.0);
    }

    #[test]
    fn test_cleared_block_moves_below_float() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let float = tree.create(
            BoxKind::Block,
            ComputedStyle {
                float: Float::Left,
                width: Length::Px(50.0),
                height: Length::Px(40.0),
                ..ComputedStyle::default()
            },
        );
        let cleared = tree.create(
            BoxKind::Block,
            ComputedStyle {
                clear: Clear::Left,
                ..block(10.0, 0.0, 0.0)
            },
        );
        tree.append_child(root, float).expect("append");
        tree.append_child(root, cleared).expect("append");

        let _ = run(&mut tree, root, &LayoutConfig::default());
        assert_eq!(tree[cleared].frame().y, 40.0);
    }

    #[test]
    fn test_absolute_box_uses_insets_against_padding_box() {
        let mut tree = BoxTree::new();
        let root = tree.create(
            BoxKind::Block,
            ComputedStyle {
                height: Length::Px(100.0),
                ..ComputedStyle::default()
            },
        );
        tree.set_root(root).expect("root");
        let abs = tree.create(
            BoxKind::Block,
            ComputedStyle {
                position: Position::Absolute,
                width: Length::Px(20.0),
                height: Length::Px(10.0),
                inset: Sides {
                    block_end: Length::Px(5.0),
                    inline_end: Length::Px(5.0),
                    ..Sides::all(Length::Auto)
                },
                ..ComputedStyle::default()
            },
        );
        tree.append_child(root, abs).expect("append");

        let _ = run(&mut tree, root, &LayoutConfig::default());
        assert_eq!(tree[abs].frame().x, 800.0 - 5.0 - 20.0);
        assert_eq!(tree[abs].frame().y, 100.0 - 5.0 - 10.0);
        assert_eq!(tree[root].frame().height, 100.0);
    }

    #[test]
    fn test_relative_offset_shifts_after_flow() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let shifted = tree.create(
            BoxKind::Block,
            ComputedStyle {
                position: Position::Relative,
                inset: Sides {
                    block_start: Length::Px(7.0),
                    inline_start: Length::Px(3.0),
                    ..Sides::all(Length::Auto)
                },
                ..block(10.0, 0.0, 0.0)
            },
        );
        let next = tree.create(BoxKind::Block, block(10.0, 0.0, 0.0));
        tree.append_child(root, shifted).expect("append");
        tree.append_child(root, next).expect("append");

        let _ = run(&mut tree, root, &LayoutConfig::default());
        assert_eq!((tree[shifted].frame().x, tree[shifted].frame().y), (3.0, 7.0));
        assert_eq!(tree[next].frame().y, 10.0);
        assert_eq!(
            tree[shifted].rare_data().and_then(|rare| rare.relative_offset),
            Some((3.0, 7.0))
        );
    }
}
