//! Counters and repaint bookkeeping for one layout pass.

use serde::Serialize;

use crate::geometry::Rect;

/// What a layout pass did, reported at `debug` level and returned to the
/// caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    /// Boxes whose layout ran, counting relayouts.
    pub boxes_laid_out: usize,
    /// Line boxes built, counting rebuilds.
    pub lines_built: usize,
    /// Children laid out a second time because their position changed.
    pub relayouts: usize,
    /// Boxes and lines pushed to a later page or column.
    pub pagination_struts: usize,
    /// Floats placed.
    pub floats_placed: usize,
    /// Pages or columns in the result.
    pub pages: usize,
}

/// Rectangles that must be repainted after a pass because a box moved or
/// changed size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepaintScheduler {
    rects: Vec<Rect>,
}

impl RepaintScheduler {
    /// Record a box whose border box went from `old` to `new`, both in
    /// root coordinates. Unchanged boxes record nothing.
    pub fn box_changed(&mut self, old: Rect, new: Rect) {
        if old == new {
            return;
        }
        for rect in [old, new] {
            if !rect.is_empty() {
                self.rects.push(rect);
            }
        }
    }

    /// Recorded rectangles.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Nothing needs repainting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Hand over the recorded rectangles, leaving the scheduler empty.
    pub fn take(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.rects)
    }
}
