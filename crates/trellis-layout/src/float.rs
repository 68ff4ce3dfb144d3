//! CSS Float Layout.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A float is a box that is shifted to the left or right on the current line.
//! The most interesting characteristic of a float is that content may flow along
//! its side (or be prohibited from doing so by the 'clear' property)."
//!
//! Each block that lays out children owns a [`FloatManager`]. It holds the
//! floats the block placed itself plus copies of floats that reach into it
//! from its parent (intruding) or out of its children (overhanging). All
//! rectangles are margin boxes in the owning block's logical space:
//! `x` runs from line-left, `y` from block-start of the border box.

use std::cell::{Cell, OnceCell};
use std::collections::HashMap;

use serde::Serialize;

use crate::geometry::Rect;
use crate::inline::InlineBoxId;
use crate::interval_tree::{Interval, IntervalTree};
use crate::style::{Clear, Float};
use crate::tree::BoxId;

/// Which list a floating object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FloatKind {
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
    /// An out-of-flow positioned box. Tracked for bookkeeping only; it never
    /// narrows lines.
    Positioned,
}

impl FloatKind {
    /// Kind for a `float` value; `None` for `float: none`.
    #[must_use]
    pub const fn from_float(float: Float) -> Option<Self> {
        match float {
            Float::None => None,
            Float::Left => Some(Self::Left),
            Float::Right => Some(Self::Right),
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
            Self::Positioned => 4,
        }
    }
}

/// A set of [`FloatKind`]s used to filter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatKindSet(u8);

impl FloatKindSet {
    /// No kinds.
    pub const NONE: Self = Self(0);
    /// Left floats.
    pub const LEFT: Self = Self(1);
    /// Right floats.
    pub const RIGHT: Self = Self(2);
    /// Both float sides.
    pub const LEFT_RIGHT: Self = Self(3);
    /// Positioned objects.
    pub const POSITIONED: Self = Self(4);
    /// Everything.
    pub const ALL: Self = Self(7);

    /// True if `kind` is in the set.
    #[must_use]
    pub const fn contains(self, kind: FloatKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// [§ 9.5.2](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// The float sides a `clear` value must get below.
    #[must_use]
    pub const fn from_clear(clear: Clear) -> Self {
        match clear {
            Clear::None => Self::NONE,
            Clear::Left => Self::LEFT,
            Clear::Right => Self::RIGHT,
            Clear::Both => Self::LEFT_RIGHT,
        }
    }
}

/// A float (or positioned box) known to a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloatingObject {
    /// The floating box.
    pub box_id: BoxId,
    /// Left, right or positioned.
    pub kind: FloatKind,
    /// Margin box in the owner's logical space. Only the size is meaningful
    /// until [`Self::placed`] is set.
    pub frame: Rect,
    /// Set once placement fixed the frame's position.
    pub placed: bool,
    /// Offset that pushed the float onto a later page or column.
    pub pagination_strut: f32,
    /// Line whose layout placed this float, if any.
    #[serde(skip)]
    pub originating_line: Option<InlineBoxId>,
    /// True if the owning block placed the float itself; false for copies
    /// of intruding or overhanging floats.
    pub owned: bool,
}

impl FloatingObject {
    /// Block-start edge of the margin box.
    #[must_use]
    pub const fn logical_top(&self) -> f32 {
        self.frame.y
    }

    /// Block-end edge of the margin box.
    #[must_use]
    pub fn logical_bottom(&self) -> f32 {
        self.frame.max_y()
    }

    /// Line-left edge of the margin box.
    #[must_use]
    pub const fn logical_left(&self) -> f32 {
        self.frame.x
    }

    /// Line-right edge of the margin box.
    #[must_use]
    pub fn logical_right(&self) -> f32 {
        self.frame.max_x()
    }

    const fn narrows_lines(&self) -> bool {
        self.placed && !matches!(self.kind, FloatKind::Positioned)
    }
}

/// Generation-checked handle to a [`FloatingObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct FloatSlot {
    generation: u32,
    entry: Option<FloatingObject>,
}

/// Line-left and line-right edges left free by floats over some band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatEdges {
    /// Line-left edge of the free space.
    pub left: f32,
    /// Line-right edge of the free space.
    pub right: f32,
}

impl FloatEdges {
    /// Free inline size, clamped at zero.
    #[must_use]
    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }
}

/// Tracks the floats of one block formatting context as seen by one block.
///
/// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
///
/// "Since a float is not in the flow, non-positioned block boxes created
/// before and after the float box flow vertically as if the float did not
/// exist. However, the current and subsequent line boxes created next to
/// the float are shortened as necessary to make room for the margin box
/// of the float."
///
/// Floats are kept in insertion order with O(1) lookup by box. Band queries
/// go through an interval tree over `[logical_top, logical_bottom)` that is
/// dropped on every mutation and rebuilt by the first query after it.
#[derive(Debug, Clone)]
pub struct FloatManager {
    slots: Vec<FloatSlot>,
    free: Vec<u32>,
    order: Vec<FloatHandle>,
    by_box: HashMap<BoxId, FloatHandle>,
    tree: OnceCell<IntervalTree<FloatHandle>>,
    rebuilds: Cell<u32>,
    content_left: f32,
    content_right: f32,
    left_count: usize,
    right_count: usize,
    positioned_count: usize,
}

impl FloatManager {
    /// A manager for a block whose content box spans
    /// `[content_left, content_right)` on the inline axis.
    #[must_use]
    pub fn new(content_left: f32, content_right: f32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            by_box: HashMap::new(),
            tree: OnceCell::new(),
            rebuilds: Cell::new(0),
            content_left,
            content_right: content_right.max(content_left),
            left_count: 0,
            right_count: 0,
            positioned_count: 0,
        }
    }

    /// Line-left content edge.
    #[must_use]
    pub const fn content_left(&self) -> f32 {
        self.content_left
    }

    /// Line-right content edge.
    #[must_use]
    pub const fn content_right(&self) -> f32 {
        self.content_right
    }

    /// Content inline size.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        self.content_right - self.content_left
    }

    /// Number of floating objects of every kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// True if any left or right float is tracked.
    #[must_use]
    pub const fn has_floats(&self) -> bool {
        self.left_count + self.right_count > 0
    }

    /// Number of objects of `kind`.
    #[must_use]
    pub const fn count(&self, kind: FloatKind) -> usize {
        match kind {
            FloatKind::Left => self.left_count,
            FloatKind::Right => self.right_count,
            FloatKind::Positioned => self.positioned_count,
        }
    }

    /// How many times the interval tree has been built.
    #[must_use]
    pub fn interval_tree_rebuilds(&self) -> u32 {
        self.rebuilds.get()
    }

    fn invalidate(&mut self) {
        let _ = self.tree.take();
    }

    fn tree(&self) -> &IntervalTree<FloatHandle> {
        self.tree.get_or_init(|| {
            self.rebuilds.set(self.rebuilds.get() + 1);
            IntervalTree::build(self.iter_handles().filter_map(|(handle, object)| {
                object.narrows_lines().then(|| Interval {
                    low: object.logical_top(),
                    high: object.logical_bottom(),
                    value: handle,
                })
            }))
        })
    }

    /// Look up a floating object.
    #[must_use]
    pub fn get(&self, handle: FloatHandle) -> Option<&FloatingObject> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn get_mut(&mut self, handle: FloatHandle) -> Option<&mut FloatingObject> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Handle of the object tracking `box_id`.
    #[must_use]
    pub fn handle_for(&self, box_id: BoxId) -> Option<FloatHandle> {
        self.by_box.get(&box_id).copied()
    }

    /// True if `box_id` is tracked.
    #[must_use]
    pub fn contains_box(&self, box_id: BoxId) -> bool {
        self.by_box.contains_key(&box_id)
    }

    fn iter_handles(&self) -> impl Iterator<Item = (FloatHandle, &FloatingObject)> + '_ {
        self.order
            .iter()
            .filter_map(|handle| self.get(*handle).map(|object| (*handle, object)))
    }

    /// Floating objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FloatingObject> + '_ {
        self.iter_handles().map(|(_, object)| object)
    }

    /// Start tracking `box_id` with a margin box of the given logical size.
    /// The object is unplaced. A box already tracked keeps its object.
    pub fn insert(&mut self, box_id: BoxId, kind: FloatKind, width: f32, height: f32) -> FloatHandle {
        if let Some(existing) = self.handle_for(box_id) {
            return existing;
        }
        self.insert_object(FloatingObject {
            box_id,
            kind,
            frame: Rect::new(0.0, 0.0, width.max(0.0), height.max(0.0)),
            placed: false,
            pagination_strut: 0.0,
            originating_line: None,
            owned: true,
        })
    }

    fn insert_object(&mut self, object: FloatingObject) -> FloatHandle {
        match object.kind {
            FloatKind::Left => self.left_count += 1,
            FloatKind::Right => self.right_count += 1,
            FloatKind::Positioned => self.positioned_count += 1,
        }
        let box_id = object.box_id;
        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(object);
            FloatHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(FloatSlot {
                generation: 0,
                entry: Some(object),
            });
            FloatHandle {
                index,
                generation: 0,
            }
        };
        self.order.push(handle);
        let _ = self.by_box.insert(box_id, handle);
        self.invalidate();
        handle
    }

    /// Stop tracking a floating object, returning it.
    pub fn remove(&mut self, handle: FloatHandle) -> Option<FloatingObject> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let object = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.order.retain(|h| *h != handle);
        let _ = self.by_box.remove(&object.box_id);
        match object.kind {
            FloatKind::Left => self.left_count -= 1,
            FloatKind::Right => self.right_count -= 1,
            FloatKind::Positioned => self.positioned_count -= 1,
        }
        self.invalidate();
        Some(object)
    }

    /// Stop tracking `box_id`, if it is tracked.
    pub fn remove_box(&mut self, box_id: BoxId) -> Option<FloatingObject> {
        let handle = self.handle_for(box_id)?;
        self.remove(handle)
    }

    /// Forget every floating object.
    pub fn clear(&mut self) {
        let (left, right) = (self.content_left, self.content_right);
        *self = Self::new(left, right);
    }

    /// Record the line whose layout placed a float.
    pub fn set_originating_line(&mut self, handle: FloatHandle, line: Option<InlineBoxId>) {
        if let Some(object) = self.get_mut(handle) {
            object.originating_line = line;
        }
    }

    /// Record the pagination strut that moved a float.
    pub fn set_pagination_strut(&mut self, handle: FloatHandle, strut: f32) {
        if let Some(object) = self.get_mut(handle) {
            object.pagination_strut = strut;
        }
    }

    /// [§ 9.5.1 Positioning the float: the 'float' property](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Place an unplaced float at or below `logical_top_hint`, returning its
    /// margin box.
    ///
    /// "A floated box is shifted to the left or right until its outer edge
    /// touches the containing block edge or the outer edge of another float."
    ///
    /// Positioned objects are recorded at the line-left content edge and
    /// the hint without any search.
    pub fn place(&mut self, handle: FloatHandle, logical_top_hint: f32) -> Option<Rect> {
        let object = self.get(handle)?;
        if object.placed {
            return Some(object.frame);
        }
        let (kind, width) = (object.kind, object.frame.width);

        let (x, y) = if kind == FloatKind::Positioned {
            (self.content_left, logical_top_hint)
        } else {
            // STEP 1: Start at the highest allowed position.
            //
            // "The outer top of a floating box may not be higher than the
            // outer top of any block or floated box generated by an element
            // earlier in the source document."
            let earlier_tops = self
                .iter()
                .filter(|o| o.narrows_lines())
                .map(FloatingObject::logical_top)
                .fold(f32::NEG_INFINITY, f32::max);
            let y = logical_top_hint.max(earlier_tops);

            // STEP 2: Find a position where the float fits.
            let (y, edges) = self.find_space(y, width);

            // STEP 3: Shift as far left or right as possible.
            // "A left-floating box must be put as far to the left as possible,
            // a right-floating box as far to the right as possible."
            let x = match kind {
                FloatKind::Left => edges.left,
                _ => (edges.right - width).max(edges.left),
            };
            (x, y)
        };

        let object = self.get_mut(handle)?;
        object.frame.x = x;
        object.frame.y = y;
        object.placed = true;
        let frame = object.frame;
        self.invalidate();
        log::trace!(target: "trellis::float", "placed {kind:?} float at {frame:?}");
        Some(frame)
    }

    /// Lowest position at or below `logical_top` where something `width`
    /// wide fits beside the floats, with the free edges there.
    ///
    /// Every float above the returned position either ends before it or
    /// covers it, so checking the single point is enough once the start is
    /// below every earlier float's top. A box that never fits is placed at
    /// the last float bottom and overflows.
    #[must_use]
    pub fn find_space(&self, logical_top: f32, width: f32) -> (f32, FloatEdges) {
        let content_width = self.content_width();
        let mut y = logical_top;
        loop {
            let edges = self.edges_at(y);
            let available = edges.width();
            if available >= width || available >= content_width {
                return (y, edges);
            }
            // STEP 4: Doesn't fit at this Y; advance to the next float
            // bottom edge.
            match self.next_free_logical_top_below(y) {
                Some(next) => y = next,
                None => return (y, edges),
            }
        }
    }

    /// Lowest position at or below `logical_top` where a box `width` wide
    /// and `height` tall clears every float its band overlaps, with the free
    /// edges across that band.
    ///
    /// Unlike [`Self::find_space`], a float starting partway down the box
    /// still counts. A box that never fits stops at the last float bottom.
    #[must_use]
    pub fn find_band(&self, logical_top: f32, width: f32, height: f32) -> (f32, FloatEdges) {
        let content_width = self.content_width();
        let mut y = logical_top;
        loop {
            let edges = self.available_width_at(y, height);
            let available = edges.width();
            if available >= width || available >= content_width {
                return (y, edges);
            }
            match self.next_free_logical_top_below(y) {
                Some(next) => y = next,
                None => return (y, edges),
            }
        }
    }

    /// Line-left and line-right edges free at the single position `y`.
    #[must_use]
    pub fn edges_at(&self, y: f32) -> FloatEdges {
        let mut edges = FloatEdges {
            left: self.content_left,
            right: self.content_right,
        };
        if !self.has_floats() {
            return edges;
        }
        self.tree()
            .for_each_containing(y, |interval| self.narrow(&mut edges, interval.value));
        edges
    }

    /// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
    ///
    /// "The current and subsequent line boxes created next to the float are
    /// shortened as necessary to make room for the margin box of the float."
    ///
    /// Free edges over the band `[y, y + line_height)`. A zero-height band
    /// is treated as the single position `y`.
    #[must_use]
    pub fn available_width_at(&self, y: f32, line_height: f32) -> FloatEdges {
        if line_height <= 0.0 {
            return self.edges_at(y);
        }
        let mut edges = FloatEdges {
            left: self.content_left,
            right: self.content_right,
        };
        if !self.has_floats() {
            return edges;
        }
        self.tree().for_each_overlapping(y, y + line_height, |interval| {
            self.narrow(&mut edges, interval.value);
        });
        edges
    }

    fn narrow(&self, edges: &mut FloatEdges, handle: FloatHandle) {
        let Some(object) = self.get(handle) else {
            return;
        };
        match object.kind {
            FloatKind::Left => edges.left = edges.left.max(object.logical_right()),
            FloatKind::Right => edges.right = edges.right.min(object.logical_left()),
            FloatKind::Positioned => {}
        }
    }

    /// Smallest placed float bottom strictly below `y`, if any.
    #[must_use]
    pub fn next_free_logical_top_below(&self, y: f32) -> Option<f32> {
        self.iter()
            .filter(|o| o.narrows_lines())
            .map(FloatingObject::logical_bottom)
            .filter(|bottom| *bottom > y)
            .reduce(f32::min)
    }

    /// [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// Lowest margin-box bottom among placed objects of the given kinds;
    /// zero when there are none.
    #[must_use]
    pub fn logical_bottom(&self, kinds: FloatKindSet) -> f32 {
        self.iter()
            .filter(|o| o.placed && kinds.contains(o.kind))
            .map(FloatingObject::logical_bottom)
            .fold(0.0, f32::max)
    }

    /// Lowest bottom of any left or right float.
    #[must_use]
    pub fn lowest_float_logical_bottom(&self) -> f32 {
        self.logical_bottom(FloatKindSet::LEFT_RIGHT)
    }

    /// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// Position a box at `logical_top` must move down to in order to clear
    /// the sides named by `clear`. Never above `logical_top`.
    #[must_use]
    pub fn clearance_position(&self, clear: Clear, logical_top: f32) -> f32 {
        let kinds = FloatKindSet::from_clear(clear);
        if kinds == FloatKindSet::NONE {
            return logical_top;
        }
        logical_top.max(self.logical_bottom(kinds))
    }

    /// Copy the parent's floats that reach below `logical_top` into this
    /// manager. This block's border box sits at `(logical_left, logical_top)`
    /// in the parent's logical space. Copies are not owned.
    pub fn import_intruding(&mut self, parent: &Self, logical_left: f32, logical_top: f32) {
        for object in parent.iter() {
            if !object.narrows_lines()
                || object.logical_bottom() <= logical_top
                || self.contains_box(object.box_id)
            {
                continue;
            }
            let mut copy = object.clone();
            copy.frame = copy.frame.translate(-logical_left, -logical_top);
            copy.owned = false;
            let _ = self.insert_object(copy);
        }
    }

    /// Floats whose margin box reaches below `logical_height`.
    pub fn overhanging(&self, logical_height: f32) -> impl Iterator<Item = &FloatingObject> + '_ {
        self.iter()
            .filter(move |o| o.narrows_lines() && o.logical_bottom() > logical_height)
    }

    /// Copy a child's floats that hang out of its bottom into this manager.
    /// The child's border box sits at `(logical_left, logical_top)` here and
    /// is `logical_height` tall. Floats this manager already tracks (ones
    /// that intruded into the child from here) are skipped.
    pub fn import_overhanging(
        &mut self,
        child: &Self,
        logical_left: f32,
        logical_top: f32,
        logical_height: f32,
    ) {
        let copies: Vec<FloatingObject> = child
            .overhanging(logical_height)
            .filter(|o| !self.contains_box(o.box_id))
            .map(|o| {
                let mut copy = o.clone();
                copy.frame = copy.frame.translate(logical_left, logical_top);
                copy.owned = false;
                copy
            })
            .collect();
        for copy in copies {
            let _ = self.insert_object(copy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ComputedStyle;
    use crate::tree::{BoxKind, BoxTree};
    use quickcheck_macros::quickcheck;

    fn boxes(n: usize) -> (BoxTree, Vec<BoxId>) {
        let mut tree = BoxTree::new();
        let ids = (0..n)
            .map(|_| tree.create(BoxKind::Block, ComputedStyle::default()))
            .collect();
        (tree, ids)
    }

    fn place(manager: &mut FloatManager, id: BoxId, kind: FloatKind, w: f32, h: f32, y: f32) -> Rect {
        let handle = manager.insert(id, kind, w, h);
        manager.place(handle, y).expect("live handle")
    }

    #[test]
    fn test_left_floats_stack_horizontally() {
        let (_tree, ids) = boxes(2);
        let mut manager = FloatManager::new(0.0, 300.0);
        let a = place(&mut manager, ids[0], FloatKind::Left, 100.0, 50.0, 0.0);
        let b = place(&mut manager, ids[1], FloatKind::Left, 100.0, 50.0, 0.0);
        assert_eq!(a, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(b, Rect::new(100.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_right_float_goes_to_right_edge() {
        let (_tree, ids) = boxes(1);
        let mut manager = FloatManager::new(10.0, 310.0);
        let rect = place(&mut manager, ids[0], FloatKind::Right, 80.0, 20.0, 5.0);
        assert_eq!(rect, Rect::new(230.0, 5.0, 80.0, 20.0));
    }

    #[test]
    fn test_float_moves_below_when_row_is_full() {
        let (_tree, ids) = boxes(3);
        let mut manager = FloatManager::new(0.0, 200.0);
        let _ = place(&mut manager, ids[0], FloatKind::Left, 120.0, 40.0, 0.0);
        let _ = place(&mut manager, ids[1], FloatKind::Right, 60.0, 70.0, 0.0);
        let third = place(&mut manager, ids[2], FloatKind::Left, 100.0, 10.0, 0.0);
        assert_eq!(third, Rect::new(0.0, 40.0, 100.0, 10.0));
    }

    #[test]
    fn test_float_wider_than_container_overflows_flush() {
        let (_tree, ids) = boxes(1);
        let mut manager = FloatManager::new(0.0, 100.0);
        let rect = place(&mut manager, ids[0], FloatKind::Right, 150.0, 10.0, 0.0);
        assert_eq!(rect.x, 0.0);
    }

    #[test]
    fn test_later_float_not_above_earlier_float() {
        let (_tree, ids) = boxes(2);
        let mut manager = FloatManager::new(0.0, 300.0);
        let _ = place(&mut manager, ids[0], FloatKind::Left, 50.0, 10.0, 30.0);
        let second = place(&mut manager, ids[1], FloatKind::Right, 50.0, 10.0, 0.0);
        assert_eq!(second.y, 30.0);
    }

    #[test]
    fn test_available_width_uses_band_overlap() {
        let (_tree, ids) = boxes(2);
        let mut manager = FloatManager::new(0.0, 300.0);
        let _ = place(&mut manager, ids[0], FloatKind::Left, 100.0, 50.0, 0.0);
        let _ = place(&mut manager, ids[1], FloatKind::Right, 30.0, 20.0, 0.0);
        let edges = manager.available_width_at(40.0, 16.0);
        assert_eq!((edges.left, edges.right), (100.0, 300.0));
        let edges = manager.available_width_at(0.0, 16.0);
        assert_eq!((edges.left, edges.right), (100.0, 270.0));
        assert_eq!(manager.available_width_at(50.0, 16.0).width(), 300.0);
    }

    #[test]
    fn test_band_search_counts_floats_starting_below_the_top() {
        let (_tree, ids) = boxes(2);
        let mut manager = FloatManager::new(0.0, 300.0);
        let _ = place(&mut manager, ids[0], FloatKind::Left, 200.0, 50.0, 0.0);
        let right = place(&mut manager, ids[1], FloatKind::Right, 200.0, 50.0, 0.0);
        assert_eq!(right, Rect::new(100.0, 50.0, 200.0, 50.0));

        // A single point at the top sees only the left float.
        let (y, edges) = manager.find_space(0.0, 100.0);
        assert_eq!((y, edges.left), (0.0, 200.0));

        // A 100px tall box starting there would run into the right float.
        let (y, edges) = manager.find_band(0.0, 100.0, 100.0);
        assert_eq!(y, 50.0);
        assert_eq!((edges.left, edges.right), (0.0, 100.0));

        // Once it is short enough to end above the right float it fits.
        let (y, edges) = manager.find_band(0.0, 100.0, 50.0);
        assert_eq!((y, edges.left, edges.right), (0.0, 200.0, 300.0));
    }

    #[test]
    fn test_clearance_and_next_free_top() {
        let (_tree, ids) = boxes(2);
        let mut manager = FloatManager::new(0.0, 300.0);
        let _ = place(&mut manager, ids[0], FloatKind::Left, 10.0, 50.0, 0.0);
        let _ = place(&mut manager, ids[1], FloatKind::Right, 10.0, 80.0, 0.0);
        assert_eq!(manager.clearance_position(Clear::Left, 10.0), 50.0);
        assert_eq!(manager.clearance_position(Clear::Both, 10.0), 80.0);
        assert_eq!(manager.clearance_position(Clear::None, 10.0), 10.0);
        assert_eq!(manager.next_free_logical_top_below(0.0), Some(50.0));
        assert_eq!(manager.next_free_logical_top_below(80.0), None);
    }

    #[test]
    fn test_positioned_objects_never_narrow_lines() {
        let (_tree, ids) = boxes(1);
        let mut manager = FloatManager::new(0.0, 300.0);
        let _ = place(&mut manager, ids[0], FloatKind::Positioned, 100.0, 100.0, 0.0);
        assert_eq!(manager.available_width_at(0.0, 10.0).width(), 300.0);
        assert_eq!(manager.count(FloatKind::Positioned), 1);
        assert_eq!(manager.logical_bottom(FloatKindSet::POSITIONED), 100.0);
        assert_eq!(manager.lowest_float_logical_bottom(), 0.0);
    }

    #[test]
    fn test_interval_tree_rebuilds_lazily() {
        let (_tree, ids) = boxes(2);
        let mut manager = FloatManager::new(0.0, 300.0);
        let _ = place(&mut manager, ids[0], FloatKind::Left, 10.0, 10.0, 0.0);
        let _ = place(&mut manager, ids[1], FloatKind::Left, 10.0, 10.0, 0.0);
        let before = manager.interval_tree_rebuilds();
        let _ = manager.available_width_at(0.0, 5.0);
        let _ = manager.available_width_at(5.0, 5.0);
        assert_eq!(manager.interval_tree_rebuilds(), before + 1);
        let _ = manager.remove_box(ids[0]);
        assert_eq!(manager.interval_tree_rebuilds(), before + 1);
        assert_eq!(manager.available_width_at(0.0, 5.0).left, 20.0);
        assert_eq!(manager.interval_tree_rebuilds(), before + 2);
    }

    #[test]
    fn test_intruding_and_overhanging_floats_translate() {
        let (_tree, ids) = boxes(2);
        let mut parent = FloatManager::new(0.0, 300.0);
        let _ = place(&mut parent, ids[0], FloatKind::Left, 100.0, 60.0, 0.0);
        let mut child = FloatManager::new(0.0, 280.0);
        child.import_intruding(&parent, 10.0, 20.0);
        let copy = child.iter().next().expect("intruding float");
        assert_eq!(copy.frame, Rect::new(-10.0, -20.0, 100.0, 60.0));
        assert!(!copy.owned);

        let _ = place(&mut child, ids[1], FloatKind::Right, 50.0, 30.0, 10.0);
        parent.import_overhanging(&child, 10.0, 20.0, 15.0);
        assert_eq!(parent.len(), 2, "the intruding float is not copied back");
        let overhang = parent.get(parent.handle_for(ids[1]).expect("copied")).expect("live");
        assert_eq!(overhang.frame, Rect::new(240.0, 30.0, 50.0, 30.0));
    }

    #[test]
    fn test_removed_handles_go_stale() {
        let (_tree, ids) = boxes(1);
        let mut manager = FloatManager::new(0.0, 100.0);
        let handle = manager.insert(ids[0], FloatKind::Left, 10.0, 10.0);
        assert!(manager.remove(handle).is_some());
        assert!(manager.remove(handle).is_none());
        assert!(manager.place(handle, 0.0).is_none());
        assert!(manager.is_empty());
    }

    #[quickcheck]
    fn prop_same_side_floats_never_overlap(sizes: Vec<(u8, u8, u8, bool)>) -> bool {
        let (_tree, ids) = boxes(sizes.len());
        let mut manager = FloatManager::new(0.0, 200.0);
        let mut placed: Vec<(FloatKind, Rect)> = Vec::new();
        for ((w, h, y, left), id) in sizes.iter().zip(&ids) {
            let kind = if *left { FloatKind::Left } else { FloatKind::Right };
            let rect = place(
                &mut manager,
                *id,
                kind,
                f32::from(*w % 150) + 1.0,
                f32::from(*h % 60) + 1.0,
                f32::from(*y % 100),
            );
            placed.push((kind, rect));
        }
        placed.iter().enumerate().all(|(i, (kind, a))| {
            placed[i + 1..]
                .iter()
                .filter(|(other, _)| other == kind)
                .all(|(_, b)| !a.intersects(b))
        })
    }

    #[quickcheck]
    fn prop_lowest_bottom_is_monotonic(sizes: Vec<(u8, u8)>) -> bool {
        let (_tree, ids) = boxes(sizes.len());
        let mut manager = FloatManager::new(0.0, 200.0);
        let mut last = manager.lowest_float_logical_bottom();
        for ((w, h), id) in sizes.iter().zip(&ids) {
            let _ = place(&mut manager, *id, FloatKind::Left, f32::from(*w), f32::from(*h), 0.0);
            let bottom = manager.lowest_float_logical_bottom();
            if bottom < last {
                return false;
            }
            last = bottom;
        }
        for id in &ids {
            let _ = manager.remove_box(*id);
            let bottom = manager.lowest_float_logical_bottom();
            if bottom > last {
                return false;
            }
            last = bottom;
        }
        true
    }
}
