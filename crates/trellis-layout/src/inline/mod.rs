//! Inline formatting contexts: line box trees and the driver that fills a
//! block with lines.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block."
//!
//! Lines are built one at a time. Each line is broken on a trial copy of
//! the breaker; the trial is committed only once the line has a final
//! position, since a line that cannot fit beside floats, or that would
//! straddle a page boundary, is broken again further down.

mod arena;
mod line_box;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

pub use arena::{
    InlineBox, InlineBoxArena, InlineBoxId, InlineBoxKind, InlineBoxSnapshot, LineSnapshot,
    RootLine, TextRun,
};
pub use line_box::{
    BuiltLine, LineBuilder, LinePlacement, last_line_baseline, place_atomic_boxes,
    used_line_height,
};

use crate::block::{Containing, LayoutContext, PhaseTracker, StaticPosition};
use crate::float::{FloatKind, FloatManager};
use crate::geometry::Rect;
use crate::overflow::shadow_extent;
use crate::sizing::{UsedEdges, WidthMode};
use crate::text::{LineBreaker, LineFloats, Paragraph};
use crate::tree::{BoxId, BoxKind, LineList};

/// Places floats met by the breaker at the top of the line being broken.
struct FloatPlacer<'c, 'a> {
    ctx: &'c mut LayoutContext<'a>,
    floats: &'c mut FloatManager,
    line_top: f32,
    line_height: f32,
    text_indent: f32,
}

impl LineFloats for FloatPlacer<'_, '_> {
    fn place_on_line(&mut self, box_id: BoxId, _width: f32) -> f32 {
        self.ctx.place_float(box_id, self.floats, self.line_top);
        self.floats
            .available_width_at(self.line_top, self.line_height)
            .width()
            - self.text_indent
    }
}

impl LayoutContext<'_> {
    /// Fill `block` with lines starting at `content_top`. Returns the bottom
    /// of the last line and whether any line has height.
    pub(crate) fn layout_inline_content(
        &mut self,
        block: BoxId,
        floats: &mut FloatManager,
        content_top: f32,
        content_width: f32,
        positioned: &mut Vec<StaticPosition>,
        phase: &mut PhaseTracker,
    ) -> (f32, bool) {
        // STEP 1: Drop the previous lines.
        let old = std::mem::take(&mut self.tree[block].lines);
        self.tree.inline_boxes.free_lines(old);

        // STEP 2: Size everything the paragraph measures as a unit.
        phase.resolving_floats();
        self.layout_inline_descendants(block, content_width);

        // STEP 3: Flatten the content and break it into lines.
        phase.building_lines();
        let paragraph = Paragraph::build(self.tree, block, content_width, self.metrics);
        let style = &self.tree[block].style;
        let hyphenate_limit = match (
            style.hyphenate_limit_lines,
            self.config.max_consecutive_hyphenated_lines,
        ) {
            (Some(own), Some(default)) => Some(own.min(default)),
            (own, default) => own.or(default),
        };
        let text_indent = style.text_indent.resolve_or(Some(content_width), 0.0);
        let line_height_guess = used_line_height(style, self.metrics);
        let metrics = self.metrics;
        let state = self.pagination.current();

        let mut breaker = LineBreaker::new(&paragraph, metrics, hyphenate_limit);
        let mut lines = LineList::default();
        let mut top = content_top;
        let mut at = paragraph.start();
        let mut first_line = true;
        let mut has_content = false;
        let mut carried_strut = 0.0;
        loop {
            let indent = if first_line { text_indent } else { 0.0 };
            let band = floats.available_width_at(top, line_height_guess);
            let mut trial = breaker.clone();
            let line = {
                let mut placer = FloatPlacer {
                    ctx: &mut *self,
                    floats: &mut *floats,
                    line_top: top,
                    line_height: line_height_guess,
                    text_indent: indent,
                };
                trial.next_line(at, band.width() - indent, &mut placer)
            };
            let Some(line) = line else {
                break;
            };

            // Content too wide for the space beside the floats moves below them.
            if line.overflows
                && line.placed_floats.is_empty()
                && band.width() < floats.content_width()
                && let Some(next) = floats.next_free_logical_top_below(top)
                && next > top
            {
                top = next;
                continue;
            }

            let band = floats.available_width_at(top, line_height_guess);
            let placement = LinePlacement {
                line_top: top,
                line_left: band.left,
                available_width: band.width(),
                text_indent: indent,
                is_last_line: line.end >= paragraph.end(),
                grid: state.line_grid,
                block_offset: state.offset,
            };
            let built = self.tree.with_inline_boxes(|tree, arena| {
                LineBuilder::new(tree, metrics, &paragraph, block, content_width)
                    .build(arena, &line, &placement)
            });
            self.stats.lines_built += 1;

            // A line that would straddle a page boundary is broken again
            // at the top of the next page, where floats may differ.
            let strut = self.pagination.adjust_line(top, built.height);
            if strut > 0.0 {
                self.tree.inline_boxes.free_subtree(built.root);
                for float in &line.placed_floats {
                    let _ = floats.remove_box(*float);
                }
                top += strut;
                carried_strut += strut;
                self.stats.pagination_struts += 1;
                continue;
            }

            breaker = trial;
            if let InlineBoxKind::Root(root_line) = &mut self.tree.inline_boxes[built.root].kind {
                root_line.pagination_strut = carried_strut;
            }
            carried_strut = 0.0;
            self.tree.inline_boxes.push_line(&mut lines, built.root);
            place_atomic_boxes(self.tree, built.root);
            for float in &line.placed_floats {
                if let Some(handle) = floats.handle_for(*float) {
                    floats.set_originating_line(handle, Some(built.root));
                }
            }
            has_content |= built.height > 0.0;

            let bottom = top + built.height;
            for float in &line.deferred_floats {
                self.place_float(*float, floats, bottom);
            }
            for (box_id, logical_left, logical_top) in built.positioned {
                let handle = floats.insert(box_id, FloatKind::Positioned, 0.0, 0.0);
                let _ = floats.place(handle, logical_top);
                positioned.push(StaticPosition {
                    box_id,
                    logical_left,
                    logical_top,
                });
            }
            top = floats.clearance_position(built.clear, bottom);
            at = line.end;
            first_line = false;
        }

        self.tree[block].lines = lines;
        self.assign_inline_frames(block);
        (top, has_content)
    }

    /// Lay out the atomic inlines and floats among `parent`'s inline
    /// descendants, and reset the inline boxes themselves.
    fn layout_inline_descendants(&mut self, parent: BoxId, content_width: f32) {
        for child in self.tree.children(parent).to_vec() {
            let node = &self.tree[child];
            if node.style.is_out_of_flow_positioned() {
                continue;
            }
            if node.style.is_floating() {
                self.layout_float(child, content_width);
                continue;
            }
            match node.kind {
                BoxKind::Inline => {
                    self.prepare_inline_box(child, content_width);
                    self.layout_inline_descendants(child, content_width);
                }
                BoxKind::Text(_) | BoxKind::LineBreak => {
                    self.prepare_inline_box(child, content_width);
                }
                BoxKind::Block
                | BoxKind::InlineBlock
                | BoxKind::Replaced { .. }
                | BoxKind::TableCell => {
                    self.layout_atomic(child, content_width);
                }
            }
        }
    }

    fn layout_atomic(&mut self, id: BoxId, content_width: f32) {
        self.pagination.push_monolithic();
        let _ = self.layout_block(
            id,
            Containing {
                width: content_width,
                height: None,
            },
            WidthMode::ShrinkToFit,
            None,
        );
        self.pagination.pop();
    }

    fn prepare_inline_box(&mut self, id: BoxId, content_width: f32) {
        self.prepare_box(id);
        let edges = UsedEdges::resolve(&self.tree[id].style, content_width);
        self.store_edges(id, &edges);
        let node = &mut self.tree[id];
        node.set_logical_location(0.0, 0.0);
        node.set_logical_size(0.0, 0.0);
    }

    /// Give inline, text and line-break boxes a frame: the union of their
    /// fragments on every line, in the block's coordinate space.
    fn assign_inline_frames(&mut self, block: BoxId) {
        let mut frames: Vec<(BoxId, Rect)> = Vec::new();
        let mut slots: HashMap<BoxId, usize> = HashMap::new();
        {
            let arena = self.tree.inline_boxes();
            for root in arena.lines(self.tree[block].lines) {
                for id in arena.subtree(root) {
                    let fragment = &arena[id];
                    if matches!(fragment.kind, InlineBoxKind::Root(_) | InlineBoxKind::Atomic) {
                        continue;
                    }
                    let rect = Rect::new(
                        fragment.logical_left,
                        fragment.logical_top,
                        fragment.logical_width,
                        fragment.logical_height,
                    );
                    match slots.entry(fragment.box_id) {
                        Entry::Occupied(slot) => {
                            let frame = &mut frames[*slot.get()].1;
                            *frame = frame.union(&rect);
                        }
                        Entry::Vacant(slot) => {
                            let _ = slot.insert(frames.len());
                            frames.push((fragment.box_id, rect));
                        }
                    }
                }
            }
        }
        for (box_id, rect) in frames {
            let node = &mut self.tree[box_id];
            node.set_logical_location(rect.x, rect.y);
            node.set_logical_size(rect.width, rect.height);
        }
    }

    /// Add the extent of `block`'s lines and the ink of text shadows to its
    /// overflow.
    pub(crate) fn add_line_overflow(&mut self, block: BoxId) {
        let mode = self.tree[block].flow_mode;
        let mut layout: Option<Rect> = None;
        let mut visual: Option<Rect> = None;
        let grow = |acc: &mut Option<Rect>, rect: Rect| {
            *acc = Some(acc.map_or(rect, |current| current.union(&rect)));
        };
        {
            let tree = &*self.tree;
            let arena = tree.inline_boxes();
            for root in arena.lines(tree[block].lines) {
                for id in arena.subtree(root) {
                    let fragment = &arena[id];
                    let (top, height) = match &fragment.kind {
                        InlineBoxKind::Root(line) => (line.line_top, line.line_height()),
                        _ => (fragment.logical_top, fragment.logical_height),
                    };
                    let rect =
                        Rect::from_logical(fragment.logical_left, top, fragment.logical_width, height, mode);
                    if rect.is_empty() {
                        continue;
                    }
                    grow(&mut layout, rect);
                    if matches!(fragment.kind, InlineBoxKind::Text(_))
                        && let Some(shadow) =
                            shadow_extent(rect, &tree[fragment.box_id].style.text_shadow)
                    {
                        grow(&mut visual, shadow);
                    }
                }
            }
        }
        let node = &mut self.tree[block];
        if let Some(rect) = layout {
            node.add_layout_overflow(rect);
            node.add_visual_overflow(rect);
        }
        if let Some(rect) = visual {
            node.add_visual_overflow(rect);
        }
    }
}
