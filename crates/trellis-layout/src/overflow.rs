//! Layout and visual overflow.
//!
//! [§ 2 Types of Overflow](https://www.w3.org/TR/css-overflow-3/#overflow-concepts)
//!
//! "Scrollable overflow: the set of boxes and text that overflow the bounds
//! of a box and that can be reached by scrolling." (layout overflow here)
//!
//! "Ink overflow: the part of a box and its contents that creates a visual
//! effect outside of the box's border box." (visual overflow here)
//!
//! Rectangles are kept in the box's own coordinate space: `(0, 0)` is the
//! top-left of its border box. A box whose overflow equals its border box
//! stores nothing; the tracker is allocated on the first contribution that
//! reaches outside.

use serde::Serialize;

use crate::geometry::Rect;
use crate::style::{OverflowMode, Shadow};
use crate::tree::{BoxId, BoxTree, LayoutBox};

/// Overflow rectangles of one box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Overflow {
    layout: Rect,
    visual: Rect,
}

impl Overflow {
    /// Overflow equal to `border_box`.
    #[must_use]
    pub const fn new(border_box: Rect) -> Self {
        Self {
            layout: border_box,
            visual: border_box,
        }
    }

    /// Widen the scrollable extent to include `rect`.
    pub fn add_layout_overflow(&mut self, rect: Rect) {
        self.layout = self.layout.union(&rect);
    }

    /// Widen the ink extent to include `rect`.
    pub fn add_visual_overflow(&mut self, rect: Rect) {
        self.visual = self.visual.union(&rect);
    }

    /// Scrollable extent.
    #[must_use]
    pub const fn layout_overflow_rect(&self) -> Rect {
        self.layout
    }

    /// Ink extent.
    #[must_use]
    pub const fn visual_overflow_rect(&self) -> Rect {
        self.visual
    }
}

/// [§ 6.1 Drop Shadows](https://www.w3.org/TR/css-backgrounds-3/#shadow-shape)
///
/// Ink rectangle of `shadows` cast by `rect`: each outer shadow is the rect
/// moved by its offset and grown by spread plus blur.
#[must_use]
pub fn shadow_extent(rect: Rect, shadows: &[Shadow]) -> Option<Rect> {
    shadows
        .iter()
        .filter(|shadow| !shadow.inset)
        .map(|shadow| {
            rect.translate(shadow.offset_x, shadow.offset_y)
                .inflate(shadow.spread + shadow.blur)
        })
        .reduce(|a, b| a.union(&b))
}

impl LayoutBox {
    fn overflow_mut(&mut self) -> &mut Overflow {
        let border_box = self.dimensions.local_border_box();
        self.overflow
            .get_or_insert_with(|| Box::new(Overflow::new(border_box)))
    }

    /// Add a scrollable-area contribution, in this box's coordinate space.
    pub fn add_layout_overflow(&mut self, rect: Rect) {
        if self.dimensions.local_border_box().contains_rect(&rect) {
            return;
        }
        self.overflow_mut().add_layout_overflow(rect);
    }

    /// Add an ink contribution, in this box's coordinate space.
    pub fn add_visual_overflow(&mut self, rect: Rect) {
        if self.dimensions.local_border_box().contains_rect(&rect) {
            return;
        }
        self.overflow_mut().add_visual_overflow(rect);
    }

    /// Scrollable extent, in this box's coordinate space.
    #[must_use]
    pub fn layout_overflow_rect(&self) -> Rect {
        self.overflow
            .as_ref()
            .map_or_else(|| self.dimensions.local_border_box(), |o| o.layout)
    }

    /// Ink extent, in this box's coordinate space.
    #[must_use]
    pub fn visual_overflow_rect(&self) -> Rect {
        self.overflow
            .as_ref()
            .map_or_else(|| self.dimensions.local_border_box(), |o| o.visual)
    }

    /// True if anything reaches outside the border box.
    #[must_use]
    pub const fn has_overflow(&self) -> bool {
        self.overflow.is_some()
    }

    /// Reset overflow to the border box ahead of re-accumulation.
    pub fn reset_overflow(&mut self) {
        self.overflow = None;
    }

    /// Add the box's own ink effects: box shadows and outline.
    pub fn add_own_visual_overflow(&mut self) {
        let border_box = self.dimensions.local_border_box();
        if let Some(shadow) = shadow_extent(border_box, &self.style.box_shadow) {
            self.add_visual_overflow(shadow);
        }
        let outline = self.style.outline;
        if outline.width > 0.0 {
            self.add_visual_overflow(border_box.inflate(outline.width + outline.offset));
        }
    }

    /// What this box adds to its parent's overflow: its layout and visual
    /// extents translated through its frame into the parent's space.
    #[must_use]
    pub fn overflow_contribution(&self) -> (Rect, Rect) {
        let frame = self.frame();
        let layout = if self.style.overflow.clips() {
            frame
        } else {
            self.layout_overflow_rect().translate(frame.x, frame.y)
        };
        let visual = self.visual_overflow_rect().translate(frame.x, frame.y);
        (layout, visual)
    }

    /// Add a child's contribution. The child's frame is its border box in
    /// this box's coordinate space; the child's own overflow is translated
    /// through it.
    ///
    /// [§ 2.2 Scrollable Overflow](https://www.w3.org/TR/css-overflow-3/#scrollable)
    ///
    /// A `clip` container discards its children's scrollable overflow and any
    /// clipping container discards their ink.
    pub fn add_overflow_from_child(&mut self, child: &LayoutBox) {
        let (layout, visual) = child.overflow_contribution();
        self.add_child_contribution(layout, visual);
    }

    fn add_child_contribution(&mut self, layout: Rect, visual: Rect) {
        let mode = self.style.overflow;
        if !matches!(mode, OverflowMode::Clip) {
            self.add_layout_overflow(layout);
        }
        if !mode.clips() {
            self.add_visual_overflow(visual);
        }
    }
}

impl BoxTree {
    /// Fold `child`'s overflow into `parent`'s, where `child`'s frame is in
    /// `parent`'s coordinate space.
    pub fn propagate_overflow(&mut self, parent: BoxId, child: BoxId) {
        let (layout, visual) = self[child].overflow_contribution();
        self[parent].add_child_contribution(layout, visual);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ComputedStyle;
    use crate::tree::BoxKind;

    fn sized_box(tree: &mut BoxTree, style: ComputedStyle, frame: Rect) -> BoxId {
        let id = tree.create(BoxKind::Block, style);
        tree[id].dimensions.frame = frame;
        id
    }

    #[test]
    fn test_overflow_starts_at_border_box_and_allocates_lazily() {
        let mut tree = BoxTree::new();
        let id = sized_box(&mut tree, ComputedStyle::default(), Rect::new(5.0, 5.0, 100.0, 40.0));
        tree[id].add_layout_overflow(Rect::new(10.0, 10.0, 20.0, 20.0));
        assert!(!tree[id].has_overflow());
        assert_eq!(tree[id].visual_overflow_rect(), Rect::new(0.0, 0.0, 100.0, 40.0));
    }

    #[test]
    fn test_child_overflow_is_translated_into_parent_space() {
        let mut tree = BoxTree::new();
        let parent = sized_box(&mut tree, ComputedStyle::default(), Rect::new(0.0, 0.0, 100.0, 50.0));
        let child = sized_box(&mut tree, ComputedStyle::default(), Rect::new(20.0, 30.0, 100.0, 40.0));
        let child_box = tree[child].clone();
        tree[parent].add_overflow_from_child(&child_box);
        assert_eq!(tree[parent].layout_overflow_rect(), Rect::new(0.0, 0.0, 120.0, 70.0));
        assert_eq!(tree[parent].visual_overflow_rect(), Rect::new(0.0, 0.0, 120.0, 70.0));
    }

    #[test]
    fn test_clipping_parent_keeps_scrollable_but_not_ink_overflow() {
        let mut tree = BoxTree::new();
        let hidden = ComputedStyle {
            overflow: OverflowMode::Hidden,
            ..ComputedStyle::default()
        };
        let parent = sized_box(&mut tree, hidden, Rect::new(0.0, 0.0, 100.0, 50.0));
        let child = sized_box(&mut tree, ComputedStyle::default(), Rect::new(0.0, 40.0, 100.0, 40.0));
        let child_box = tree[child].clone();
        tree[parent].add_overflow_from_child(&child_box);
        assert_eq!(tree[parent].layout_overflow_rect().max_y(), 80.0);
        assert_eq!(tree[parent].visual_overflow_rect().max_y(), 50.0);
    }

    #[test]
    fn test_shadow_and_outline_extend_visual_overflow_only() {
        let mut tree = BoxTree::new();
        let style = ComputedStyle {
            box_shadow: vec![Shadow {
                offset_x: 4.0,
                offset_y: 4.0,
                blur: 2.0,
                ..Shadow::default()
            }],
            ..ComputedStyle::default()
        };
        let id = sized_box(&mut tree, style, Rect::new(0.0, 0.0, 10.0, 10.0));
        tree[id].add_own_visual_overflow();
        assert_eq!(tree[id].visual_overflow_rect(), Rect::new(0.0, 0.0, 16.0, 16.0));
        assert_eq!(tree[id].layout_overflow_rect(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }
}
