//! Page and column fragmentation.
//!
//! [CSS Fragmentation Module Level 3](https://www.w3.org/TR/css-break-3/)
//!
//! "When laying out a fragmented flow, the UA must ... break the content
//! across fragmentainers." Layout never splits boxes here. It only pushes
//! content that would straddle a fragmentainer boundary down to the next
//! one, recording the extra offset as a pagination strut. Columns reuse the
//! same arithmetic with the column height as the page height.
//!
//! Offsets passed to [`PaginationContext`] are relative to the block
//! currently being laid out; the context's [`LayoutState`] stack converts
//! them to offsets from the fragmentation root.

use serde::{Deserialize, Serialize};

use crate::config::Fragmentation;
use crate::geometry::Rect;
use crate::style::BreakBetween;

// Offsets within this distance of a boundary count as on it.
const BOUNDARY_EPSILON: f32 = 1e-3;

/// [CSS Line Grid § 2](https://drafts.csswg.org/css-line-grid/#line-grid)
///
/// Evenly spaced horizontal lines that `line-snap` aligns line boxes to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineGrid {
    /// Distance between grid lines.
    pub pitch: f32,
    /// Offset of the first grid line from the fragmentation root's top.
    #[serde(default)]
    pub origin: f32,
}

impl LineGrid {
    /// The first grid line at or after `offset`.
    #[must_use]
    pub fn next_line_at_or_after(&self, offset: f32) -> f32 {
        let steps = ((offset - self.origin) / self.pitch - BOUNDARY_EPSILON).ceil();
        self.origin + steps * self.pitch
    }
}

/// Whether an offset exactly on a boundary belongs to the fragment above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryRule {
    /// A point on the boundary is the end of the previous page: no room
    /// remains there.
    Include,
    /// A point on the boundary is the start of the next page: the whole
    /// page remains.
    Exclude,
}

/// Per-block coordinate frame pushed while descending the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutState {
    /// Offset of the current block's border-box top from the
    /// fragmentation root.
    pub offset: f32,
    /// Height of each fragmentainer, or zero when unfragmented.
    pub page_height: f32,
    /// Grid for line snapping, in fragmentation-root coordinates.
    pub line_grid: Option<LineGrid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Continuous,
    Pages,
    Columns,
}

/// Fragmentation arithmetic threaded through one layout pass.
#[derive(Debug, Clone)]
pub struct PaginationContext {
    mode: Mode,
    gap: f32,
    columns: u32,
    stack: Vec<LayoutState>,
}

impl PaginationContext {
    /// A context for `fragmentation` with the root's line grid.
    #[must_use]
    pub fn new(fragmentation: &Fragmentation, line_grid: Option<LineGrid>) -> Self {
        let (mode, page_height, gap, columns) = match *fragmentation {
            Fragmentation::Continuous => (Mode::Continuous, 0.0, 0.0, 1),
            Fragmentation::Pages { height, gap } => (Mode::Pages, height, gap, 1),
            Fragmentation::Columns { count, gap, height } => (Mode::Columns, height, gap, count.max(1)),
        };
        Self {
            mode,
            gap,
            columns,
            stack: vec![LayoutState {
                offset: 0.0,
                page_height,
                line_grid,
            }],
        }
    }

    /// The innermost layout state.
    #[must_use]
    pub fn current(&self) -> LayoutState {
        self.stack.last().copied().unwrap_or(LayoutState {
            offset: 0.0,
            page_height: 0.0,
            line_grid: None,
        })
    }

    /// Enter a child block whose top is `delta` below the current block's.
    pub fn push(&mut self, delta: f32) {
        let current = self.current();
        self.stack.push(LayoutState {
            offset: current.offset + delta,
            ..current
        });
    }

    /// Enter a box that is never fragmented (a float, an atomic inline or
    /// an out-of-flow box). Content inside it sees an unfragmented flow;
    /// the box itself is moved as a whole by its parent.
    pub fn push_monolithic(&mut self) {
        let current = self.current();
        self.stack.push(LayoutState {
            page_height: 0.0,
            ..current
        });
    }

    /// Replace the innermost state's line grid, for a block that creates
    /// its own (`line-grid: create`).
    pub fn set_line_grid(&mut self, line_grid: Option<LineGrid>) {
        if let Some(state) = self.stack.last_mut() {
            state.line_grid = line_grid;
        }
    }

    /// Leave the block entered by the matching [`Self::push`] or
    /// [`Self::push_monolithic`].
    pub fn pop(&mut self) {
        debug_assert!(self.stack.len() > 1, "popped the root layout state");
        if self.stack.len() > 1 {
            let _ = self.stack.pop();
        }
    }

    /// True when the flow is broken into pages or columns.
    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.current().page_height > 0.0
    }

    /// Height of one page or column, zero when unfragmented.
    #[must_use]
    pub fn page_logical_height(&self) -> f32 {
        self.current().page_height
    }

    /// Room left on the page containing block-relative `offset`.
    ///
    /// Infinite when unfragmented.
    #[must_use]
    pub fn page_remaining_height(&self, offset: f32, rule: BoundaryRule) -> f32 {
        let state = self.current();
        let page = state.page_height;
        if page <= 0.0 {
            return f32::INFINITY;
        }
        let mut position = (state.offset + offset).rem_euclid(page);
        if page - position < BOUNDARY_EPSILON {
            position = 0.0;
        }
        let remaining = page - position;
        match rule {
            BoundaryRule::Include if position == 0.0 => 0.0,
            BoundaryRule::Include | BoundaryRule::Exclude => remaining,
        }
    }

    /// Block-relative top of the next page after `offset`.
    ///
    /// With [`BoundaryRule::Include`] an offset already on a boundary is its
    /// own answer.
    #[must_use]
    pub fn next_page_top(&self, offset: f32, rule: BoundaryRule) -> f32 {
        if !self.is_paginated() {
            return offset;
        }
        offset + self.page_remaining_height(offset, rule)
    }

    fn forces_break(&self, value: BreakBetween) -> bool {
        match value {
            BreakBetween::Page => self.mode != Mode::Continuous,
            BreakBetween::Column => self.mode == Mode::Columns,
            BreakBetween::Auto | BreakBetween::Avoid => false,
        }
    }

    /// [§ 3.1 Breaks Between Boxes](https://www.w3.org/TR/css-break-3/#break-between)
    ///
    /// "Always force a break before the principal box." A forced break at
    /// the top of a page is ignored.
    #[must_use]
    pub fn apply_break_before(&self, break_before: BreakBetween, offset: f32) -> f32 {
        if self.forces_break(break_before) {
            self.next_page_top(offset, BoundaryRule::Include)
        } else {
            offset
        }
    }

    /// Offset the content following a box with `break_after` starts at.
    #[must_use]
    pub fn apply_break_after(&self, break_after: BreakBetween, offset: f32) -> f32 {
        if self.forces_break(break_after) {
            self.next_page_top(offset, BoundaryRule::Include)
        } else {
            offset
        }
    }

    /// [§ 4.4 Unforced Breaks](https://www.w3.org/TR/css-break-3/#unforced-breaks)
    ///
    /// Strut that moves an unbreakable box of `height` at `offset` to the
    /// next page if it would otherwise straddle a boundary. A box already
    /// at the top of a page stays, even when taller than the page.
    #[must_use]
    pub fn adjust_for_unsplittable(&self, offset: f32, height: f32) -> f32 {
        if !self.is_paginated() || height <= 0.0 {
            return 0.0;
        }
        let remaining = self.page_remaining_height(offset, BoundaryRule::Exclude);
        if remaining == self.page_logical_height() || height <= remaining + BOUNDARY_EPSILON {
            return 0.0;
        }
        remaining
    }

    /// Strut for a line box; lines never split.
    #[must_use]
    pub fn adjust_line(&self, line_top: f32, line_height: f32) -> f32 {
        self.adjust_for_unsplittable(line_top, line_height)
    }

    /// Pages or columns needed for `content_height`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn page_count(&self, content_height: f32) -> usize {
        let page = self.page_logical_height();
        if page <= 0.0 {
            return 1;
        }
        (content_height / page - BOUNDARY_EPSILON).ceil().max(1.0) as usize
    }

    /// Rectangles of the fragmentainers holding `content_height`, for a
    /// root `width` wide. Pages stack vertically separated by the gap;
    /// columns fill rows of `count` side by side.
    #[must_use]
    pub fn fragments(&self, content_height: f32, width: f32) -> Vec<Rect> {
        let page = self.page_logical_height();
        if page <= 0.0 {
            return Vec::new();
        }
        let count = self.page_count(content_height);
        match self.mode {
            Mode::Continuous => Vec::new(),
            Mode::Pages => (0..count)
                .map(|i| Rect::new(0.0, i as f32 * (page + self.gap), width, page))
                .collect(),
            Mode::Columns => {
                let columns = self.columns as usize;
                let column_width = self.column_width(width);
                (0..count)
                    .map(|i| {
                        let (row, column) = (i / columns, i % columns);
                        Rect::new(
                            column as f32 * (column_width + self.gap),
                            row as f32 * (page + self.gap),
                            column_width,
                            page,
                        )
                    })
                    .collect()
            }
        }
    }

    /// Inline size of one column out of `width`; `width` itself outside
    /// column mode.
    #[must_use]
    pub fn column_width(&self, width: f32) -> f32 {
        if self.mode != Mode::Columns {
            return width;
        }
        let columns = self.columns as f32;
        ((width - (columns - 1.0) * self.gap) / columns).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(height: f32) -> PaginationContext {
        PaginationContext::new(&Fragmentation::Pages { height, gap: 0.0 }, None)
    }

    #[test]
    fn test_boundary_rules_differ_only_on_the_boundary() {
        let ctx = pages(100.0);
        assert_eq!(ctx.page_remaining_height(100.0, BoundaryRule::Exclude), 100.0);
        assert_eq!(ctx.page_remaining_height(100.0, BoundaryRule::Include), 0.0);
        assert_eq!(ctx.page_remaining_height(30.0, BoundaryRule::Exclude), 70.0);
        assert_eq!(ctx.page_remaining_height(30.0, BoundaryRule::Include), 70.0);
        assert_eq!(ctx.next_page_top(30.0, BoundaryRule::Include), 100.0);
        assert_eq!(ctx.next_page_top(100.0, BoundaryRule::Include), 100.0);
        assert_eq!(ctx.next_page_top(100.0, BoundaryRule::Exclude), 200.0);
    }

    #[test]
    fn test_offsets_are_relative_to_pushed_state() {
        let mut ctx = pages(100.0);
        ctx.push(60.0);
        assert_eq!(ctx.page_remaining_height(10.0, BoundaryRule::Exclude), 30.0);
        assert_eq!(ctx.next_page_top(10.0, BoundaryRule::Exclude), 40.0);
        ctx.pop();
        assert_eq!(ctx.current().offset, 0.0);
    }

    #[test]
    fn test_unsplittable_box_moves_unless_at_page_top() {
        let ctx = pages(100.0);
        assert_eq!(ctx.adjust_for_unsplittable(80.0, 30.0), 20.0);
        assert_eq!(ctx.adjust_for_unsplittable(80.0, 20.0), 0.0);
        assert_eq!(ctx.adjust_for_unsplittable(100.0, 250.0), 0.0, "taller than a page but already at its top");
        assert_eq!(ctx.adjust_for_unsplittable(50.0, 250.0), 50.0);
    }

    #[test]
    fn test_forced_breaks_ignore_page_top_and_continuous_flow() {
        let ctx = pages(100.0);
        assert_eq!(ctx.apply_break_before(BreakBetween::Page, 30.0), 100.0);
        assert_eq!(ctx.apply_break_before(BreakBetween::Page, 0.0), 0.0);
        assert_eq!(ctx.apply_break_before(BreakBetween::Column, 30.0), 30.0);
        let flow = PaginationContext::new(&Fragmentation::Continuous, None);
        assert_eq!(flow.apply_break_after(BreakBetween::Page, 30.0), 30.0);
        assert_eq!(flow.adjust_line(95.0, 20.0), 0.0);
    }

    #[test]
    fn test_column_fragments_fill_rows() {
        let ctx = PaginationContext::new(
            &Fragmentation::Columns {
                count: 2,
                gap: 20.0,
                height: 100.0,
            },
            None,
        );
        assert_eq!(ctx.column_width(220.0), 100.0);
        let rects = ctx.fragments(250.0, 220.0);
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[1], Rect::new(120.0, 0.0, 100.0, 100.0));
        assert_eq!(rects[2], Rect::new(0.0, 120.0, 100.0, 100.0));
    }

    #[test]
    fn test_grid_line_lookup() {
        let grid = LineGrid {
            pitch: 20.0,
            origin: 5.0,
        };
        assert_eq!(grid.next_line_at_or_after(5.0), 5.0);
        assert_eq!(grid.next_line_at_or_after(6.0), 25.0);
        assert_eq!(grid.next_line_at_or_after(-30.0), -15.0);
    }
}
