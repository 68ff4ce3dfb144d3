//! The box tree.
//!
//! Boxes live in an arena addressed by generational [`BoxId`]s. A parent
//! owns its children's slots; children hold a non-owning parent id for
//! upward queries. Removing a box frees its whole subtree and bumps the
//! generation of every freed slot, so ids held across the removal go stale
//! instead of aliasing a new box.
//!
//! Structural fixups (anonymous block wrapping) run in [`BoxTree::normalize`]
//! before a layout pass; the pass itself only writes geometry.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::Serialize;
use trellis_common::TreeError;
use trellis_common::warning::warn_once;

use crate::geometry::{BoxDimensions, LogicalEdges, Rect};
use crate::inline::{InlineBoxArena, InlineBoxId};
use crate::margin::MarginValues;
use crate::overflow::Overflow;
use crate::style::{ComputedStyle, WritingMode};

/// A type-safe, generation-checked index into a [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoxId {
    index: u32,
    generation: u32,
}

impl BoxId {
    /// Slot index; stable for the lifetime of the box.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this id was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    const fn stale_error(self) -> TreeError {
        TreeError::StaleBox {
            index: self.index,
            generation: self.generation,
        }
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// What a box is, with the data only that kind carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxKind {
    /// [§ 9.2.1 Block-level elements and block boxes](https://www.w3.org/TR/CSS2/visuren.html#block-boxes)
    ///
    /// "A block container box either contains only block-level boxes or
    /// establishes an inline formatting context and thus contains only
    /// inline-level boxes."
    Block,
    /// [§ 9.2.4 'display: inline-block'](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
    ///
    /// "This value causes an element to generate an inline-level block
    /// container. The inside of an inline-block is formatted as a block box,
    /// and the element itself is formatted as an atomic inline-level box."
    InlineBlock,
    /// [§ 9.2.2 Inline-level elements and inline boxes](https://www.w3.org/TR/CSS2/visuren.html#inline-boxes)
    ///
    /// A non-atomic inline whose content participates in its parent's
    /// inline formatting context.
    Inline,
    /// A run of text content.
    Text(String),
    /// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
    ///
    /// Content outside the formatting model, sized by its intrinsic
    /// dimensions unless style says otherwise.
    Replaced {
        /// Natural width in pixels.
        intrinsic_width: f32,
        /// Natural height in pixels.
        intrinsic_height: f32,
    },
    /// A forced line break (`<br>`).
    LineBreak,
    /// [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
    ///
    /// Laid out as a block formatting context root. Table-cell margins do
    /// not collapse with their content and quirks mode drops the first
    /// child's leading margin.
    TableCell,
}

impl BoxKind {
    /// Kinds that may hold child boxes.
    #[must_use]
    pub const fn can_have_children(&self) -> bool {
        matches!(
            self,
            Self::Block | Self::InlineBlock | Self::Inline | Self::TableCell
        )
    }

    /// Kinds that lay out their children as a block container.
    #[must_use]
    pub const fn is_block_container(&self) -> bool {
        matches!(self, Self::Block | Self::InlineBlock | Self::TableCell)
    }

    /// Kinds that sit in an inline formatting context when in flow.
    #[must_use]
    pub const fn is_inline_level(&self) -> bool {
        matches!(
            self,
            Self::InlineBlock
                | Self::Inline
                | Self::Text(_)
                | Self::Replaced { .. }
                | Self::LineBreak
        )
    }

    /// Inline-level kinds laid out as a single unbreakable box.
    #[must_use]
    pub const fn is_atomic_inline(&self) -> bool {
        matches!(self, Self::InlineBlock | Self::Replaced { .. })
    }

    /// Short label for debugging output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::InlineBlock => "inline-block",
            Self::Inline => "inline",
            Self::Text(_) => "text",
            Self::Replaced { .. } => "replaced",
            Self::LineBreak => "br",
            Self::TableCell => "table-cell",
        }
    }
}

/// Fields most boxes never need, allocated on first write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RareData {
    /// Offset added to the box's logical top to push it onto the next page
    /// or column.
    pub pagination_strut: f32,
    /// Absolute block offset of the box's top at the time it was laid out,
    /// relative to the fragmentation root.
    pub page_logical_offset: f32,
    /// Collapsed before/after margin extremes, once they differ from the
    /// box's own margins.
    pub margin_values: Option<MarginValues>,
    /// Relative-positioning shift applied after normal-flow layout.
    pub relative_offset: Option<(f32, f32)>,
    /// Column or page rectangles produced by a fragmentation root.
    pub fragments: Vec<Rect>,
}

/// The line boxes produced for a block that establishes an inline
/// formatting context. Lines are linked root to root inside the tree's
/// inline box arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineList {
    /// First line's root box.
    pub first: Option<InlineBoxId>,
    /// Last line's root box.
    pub last: Option<InlineBoxId>,
    /// Number of lines, including empty ones.
    pub count: usize,
}

impl LineList {
    /// No lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// One box in the tree with its style and the geometry layout assigned.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    /// What kind of box this is.
    pub kind: BoxKind,
    /// Resolved style.
    pub style: ComputedStyle,
    /// Optional debug label (element name in the source document).
    pub name: Option<String>,
    /// Generated by [`BoxTree::normalize`] rather than by the document.
    pub anonymous: bool,
    /// Physical geometry; the frame is relative to the parent's border box.
    pub dimensions: BoxDimensions,
    /// Writing mode of the formatting context this box was laid out in.
    pub flow_mode: WritingMode,
    /// Lines, for blocks that establish an inline formatting context.
    pub lines: LineList,
    pub(crate) parent: Option<BoxId>,
    pub(crate) children: Vec<BoxId>,
    pub(crate) overflow: Option<Box<Overflow>>,
    pub(crate) rare: Option<Box<RareData>>,
    pub(crate) needs_layout: bool,
}

impl LayoutBox {
    fn new(kind: BoxKind, style: ComputedStyle) -> Self {
        Self {
            flow_mode: style.writing_mode,
            kind,
            style,
            name: None,
            anonymous: false,
            dimensions: BoxDimensions::default(),
            lines: LineList::default(),
            parent: None,
            children: Vec::new(),
            overflow: None,
            rare: None,
            needs_layout: true,
        }
    }

    /// Parent box, if attached.
    #[must_use]
    pub const fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> &[BoxId] {
        &self.children
    }

    /// Border box relative to the parent's border box.
    #[must_use]
    pub const fn frame(&self) -> Rect {
        self.dimensions.frame
    }

    /// True once layout has assigned geometry and nothing invalidated it.
    #[must_use]
    pub const fn is_laid_out(&self) -> bool {
        !self.needs_layout
    }

    /// Rare data, if any field was ever written.
    #[must_use]
    pub fn rare_data(&self) -> Option<&RareData> {
        self.rare.as_deref()
    }

    /// Rare data, allocating it on first use.
    pub fn ensure_rare_data(&mut self) -> &mut RareData {
        self.rare.get_or_insert_with(Box::default)
    }

    /// Pagination strut recorded during the last layout, or zero.
    #[must_use]
    pub fn pagination_strut(&self) -> f32 {
        self.rare.as_ref().map_or(0.0, |rare| rare.pagination_strut)
    }

    /// Record a pagination strut. A zero strut does not allocate.
    pub fn set_pagination_strut(&mut self, strut: f32) {
        if strut != 0.0 || self.rare.is_some() {
            self.ensure_rare_data().pagination_strut = strut;
        }
    }

    /// Collapsed margin values from the last layout, if they were stored.
    #[must_use]
    pub fn margin_values(&self) -> Option<MarginValues> {
        self.rare.as_ref().and_then(|rare| rare.margin_values)
    }

    // [§ 6.2 Flow-relative Directions](https://www.w3.org/TR/css-writing-modes-4/#logical-directions)
    //
    // Geometry is stored physically. The logical accessors below swap axes
    // when the box was laid out in a vertical writing mode; block-flow
    // flipping is left to the painter.

    /// Position along the block axis.
    #[must_use]
    pub const fn logical_top(&self) -> f32 {
        if self.flow_mode.is_horizontal() {
            self.dimensions.frame.y
        } else {
            self.dimensions.frame.x
        }
    }

    /// Position along the inline axis, from line-left.
    #[must_use]
    pub const fn logical_left(&self) -> f32 {
        if self.flow_mode.is_horizontal() {
            self.dimensions.frame.x
        } else {
            self.dimensions.frame.y
        }
    }

    /// Size along the inline axis.
    #[must_use]
    pub const fn logical_width(&self) -> f32 {
        if self.flow_mode.is_horizontal() {
            self.dimensions.frame.width
        } else {
            self.dimensions.frame.height
        }
    }

    /// Size along the block axis.
    #[must_use]
    pub const fn logical_height(&self) -> f32 {
        if self.flow_mode.is_horizontal() {
            self.dimensions.frame.height
        } else {
            self.dimensions.frame.width
        }
    }

    /// Set the logical position, storing it physically.
    pub const fn set_logical_location(&mut self, logical_left: f32, logical_top: f32) {
        if self.flow_mode.is_horizontal() {
            self.dimensions.frame.x = logical_left;
            self.dimensions.frame.y = logical_top;
        } else {
            self.dimensions.frame.x = logical_top;
            self.dimensions.frame.y = logical_left;
        }
    }

    /// Set the logical size, storing it physically.
    pub const fn set_logical_size(&mut self, logical_width: f32, logical_height: f32) {
        if self.flow_mode.is_horizontal() {
            self.dimensions.frame.width = logical_width;
            self.dimensions.frame.height = logical_height;
        } else {
            self.dimensions.frame.width = logical_height;
            self.dimensions.frame.height = logical_width;
        }
    }

    /// Move the box along the block axis.
    pub const fn set_logical_top(&mut self, logical_top: f32) {
        let left = self.logical_left();
        self.set_logical_location(left, logical_top);
    }

    /// Set just the block-axis size.
    pub const fn set_logical_height(&mut self, logical_height: f32) {
        let width = self.logical_width();
        self.set_logical_size(width, logical_height);
    }

    /// Margins in the box's flow-relative terms.
    #[must_use]
    pub const fn logical_margins(&self) -> LogicalEdges {
        LogicalEdges::from_physical(&self.dimensions.margin, self.flow_mode)
    }

    /// Border plus padding in the box's flow-relative terms.
    #[must_use]
    pub fn logical_border_padding(&self) -> LogicalEdges {
        LogicalEdges::from_physical(&self.dimensions.border, self.flow_mode)
            .plus(&LogicalEdges::from_physical(&self.dimensions.padding, self.flow_mode))
    }

    /// Text content for text boxes.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            BoxKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Floated or out-of-flow positioned.
    #[must_use]
    pub const fn is_out_of_flow(&self) -> bool {
        self.style.is_floating() || self.style.is_out_of_flow_positioned()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<LayoutBox>,
}

/// Arena-based box tree with O(1) access and traversal.
///
/// Every relationship is an id, so layout can hold one box mutably while
/// reading others by index without fighting the borrow checker.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<BoxId>,
    live: usize,
    pub(crate) inline_boxes: InlineBoxArena,
}

impl BoxTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached box.
    pub fn create(&mut self, kind: BoxKind, style: ComputedStyle) -> BoxId {
        let entry = LayoutBox::new(kind, style);
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return BoxId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        BoxId {
            index,
            generation: 0,
        }
    }

    /// Allocate a detached box with a debug name.
    pub fn create_named(&mut self, kind: BoxKind, style: ComputedStyle, name: &str) -> BoxId {
        let id = self.create(kind, style);
        self[id].name = Some(name.to_string());
        id
    }

    /// Make `id` the root box laid out against the viewport.
    ///
    /// # Errors
    /// Fails if `id` is stale or attached under another box.
    pub fn set_root(&mut self, id: BoxId) -> Result<(), TreeError> {
        let node = self.get(id).ok_or_else(|| id.stale_error())?;
        if node.parent.is_some() {
            return Err(TreeError::AlreadyHasParent(id.index));
        }
        self.root = Some(id);
        Ok(())
    }

    /// The root box, if one was set and is still live.
    #[must_use]
    pub fn root(&self) -> Option<BoxId> {
        self.root.filter(|id| self.contains(*id))
    }

    /// Get a box by id.
    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    /// Get a mutable box by id.
    #[must_use]
    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut LayoutBox> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// True if `id` names a live box.
    #[must_use]
    pub fn contains(&self, id: BoxId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live boxes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// True when no boxes are live.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Children of `id` in document order; empty for stale ids.
    #[must_use]
    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    /// Fails if either id is stale, `parent` cannot hold children, `child`
    /// already has a parent, or `child` is an ancestor of `parent`.
    pub fn append_child(&mut self, parent: BoxId, child: BoxId) -> Result<(), TreeError> {
        let parent_node = self.get(parent).ok_or_else(|| parent.stale_error())?;
        if !parent_node.kind.can_have_children() {
            return Err(TreeError::NotAContainer(parent.index));
        }
        let child_node = self.get(child).ok_or_else(|| child.stale_error())?;
        if child_node.parent.is_some() || self.root == Some(child) {
            return Err(TreeError::AlreadyHasParent(child.index));
        }
        if self.ancestors(parent).any(|a| a == child) || parent == child {
            return Err(TreeError::Cycle {
                parent: parent.index,
                child: child.index,
            });
        }
        self[child].parent = Some(parent);
        self[parent].children.push(child);
        self.mark_needs_layout(parent);
        Ok(())
    }

    /// Detach `id` from its parent and free its whole subtree, including
    /// any line boxes it owns.
    ///
    /// # Errors
    /// Fails if `id` is stale.
    pub fn remove(&mut self, id: BoxId) -> Result<(), TreeError> {
        let parent = self.get(id).ok_or_else(|| id.stale_error())?.parent;
        if let Some(parent) = parent {
            self[parent].children.retain(|c| *c != id);
            self.mark_needs_layout(parent);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        for victim in self.descendants(id) {
            let lines = self[victim].lines;
            self.inline_boxes.free_lines(lines);
            let slot = &mut self.slots[victim.index as usize];
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(victim.index);
            self.live -= 1;
        }
        Ok(())
    }

    /// Run `f` with shared access to the boxes and exclusive access to the
    /// inline box arena.
    pub(crate) fn with_inline_boxes<R>(&mut self, f: impl FnOnce(&Self, &mut InlineBoxArena) -> R) -> R {
        let mut arena = std::mem::take(&mut self.inline_boxes);
        let result = f(self, &mut arena);
        self.inline_boxes = arena;
        result
    }

    /// The arena holding every line box of this tree.
    #[must_use]
    pub const fn inline_boxes(&self) -> &InlineBoxArena {
        &self.inline_boxes
    }

    /// Iterate from `id`'s parent up to the root.
    pub fn ancestors(&self, id: BoxId) -> impl Iterator<Item = BoxId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// `id` and all of its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Flag `id` and its ancestors for layout.
    pub fn mark_needs_layout(&mut self, id: BoxId) {
        let mut current = Some(id);
        while let Some(box_id) = current {
            let Some(node) = self.get_mut(box_id) else {
                break;
            };
            node.needs_layout = true;
            current = node.parent;
        }
    }

    /// True if every in-flow child of `id` is inline-level, meaning `id`
    /// establishes an inline formatting context. Blocks with no in-flow
    /// children are treated as block containers.
    #[must_use]
    pub fn children_inline(&self, id: BoxId) -> bool {
        let mut saw_inline = false;
        for child in self.children(id) {
            let node = &self[*child];
            if node.is_out_of_flow() {
                continue;
            }
            if !node.kind.is_inline_level() {
                return false;
            }
            saw_inline = true;
        }
        saw_inline
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "If a block container box has a block-level box inside it, then we
    /// force it to have only block-level boxes inside it."
    ///
    /// Wraps each run of inline-level children of a block container that
    /// also has in-flow block-level children in an anonymous block. Floats
    /// and positioned boxes join the run they appear in, so a float between
    /// two words is still placed by the line breaker. Block-level boxes
    /// inside inlines are not split out; they are laid out as inline-blocks.
    pub fn normalize(&mut self) {
        let Some(root) = self.root() else {
            return;
        };
        for id in self.descendants(root) {
            // Whitespace runs dropped while fixing an ancestor are gone.
            if !self.contains(id) {
                continue;
            }
            if self[id].kind == BoxKind::Inline {
                let has_block = self.children(id).iter().any(|c| {
                    let node = &self[*c];
                    !node.is_out_of_flow() && !node.kind.is_inline_level()
                });
                if has_block {
                    warn_once(
                        "Layout",
                        "block-level box inside an inline is laid out as an inline-block",
                    );
                }
                continue;
            }
            if !self[id].kind.is_block_container() {
                continue;
            }
            let has_block_child = self.children(id).iter().any(|c| {
                let node = &self[*c];
                !node.is_out_of_flow() && !node.kind.is_inline_level()
            });
            let has_inline_child = self.children(id).iter().any(|c| {
                let node = &self[*c];
                !node.is_out_of_flow() && node.kind.is_inline_level()
            });
            if has_block_child && has_inline_child {
                self.wrap_inline_runs(id);
            }
        }
    }

    fn wrap_inline_runs(&mut self, parent: BoxId) {
        let children = std::mem::take(&mut self[parent].children);
        let anon_style = ComputedStyle::anonymous_from(&self[parent].style);
        let mut rebuilt = Vec::with_capacity(children.len());
        let mut run: Vec<BoxId> = Vec::new();

        for child in children {
            let node = &self[child];
            let inline_level = node.kind.is_inline_level();
            let joins_run = (inline_level && !node.is_out_of_flow())
                || (node.is_out_of_flow() && !run.is_empty());
            if joins_run {
                run.push(child);
            } else {
                self.flush_run(parent, &anon_style, &mut run, &mut rebuilt);
                rebuilt.push(child);
            }
        }
        self.flush_run(parent, &anon_style, &mut run, &mut rebuilt);
        self[parent].children = rebuilt;
    }

    fn flush_run(
        &mut self,
        parent: BoxId,
        style: &ComputedStyle,
        run: &mut Vec<BoxId>,
        rebuilt: &mut Vec<BoxId>,
    ) {
        if run.is_empty() {
            return;
        }
        // A run of nothing but collapsible whitespace and out-of-flow boxes
        // generates no anonymous block.
        let only_whitespace = run.iter().all(|c| {
            let node = &self[*c];
            node.is_out_of_flow()
                || node.text().is_some_and(|t| {
                    node.style.white_space.collapses_spaces()
                        && t.chars().all(|ch| matches!(ch, ' ' | '\t' | '\n' | '\r'))
                })
        });
        let has_in_flow = run.iter().any(|c| !self[*c].is_out_of_flow());
        if only_whitespace && has_in_flow {
            for child in run.drain(..) {
                if self[child].is_out_of_flow() {
                    rebuilt.push(child);
                } else {
                    self[child].parent = None;
                    let _ = self.remove(child);
                }
            }
            return;
        }
        let anon = self.create(BoxKind::Block, style.clone());
        self[anon].anonymous = true;
        self[anon].parent = Some(parent);
        for child in run.drain(..) {
            self[child].parent = Some(anon);
            self[anon].children.push(child);
        }
        rebuilt.push(anon);
    }
}

impl Index<BoxId> for BoxTree {
    type Output = LayoutBox;

    fn index(&self, id: BoxId) -> &LayoutBox {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale box id {id}"),
        }
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut LayoutBox {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale box id {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(tree: &mut BoxTree, s: &str) -> BoxId {
        tree.create(BoxKind::Text(s.to_string()), ComputedStyle::default())
    }

    #[test]
    fn test_append_and_traverse() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let a = tree.create(BoxKind::Block, ComputedStyle::default());
        let b = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.append_child(root, a).expect("append a");
        tree.append_child(root, b).expect("append b");

        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.descendants(root), vec![root, a, b]);
    }

    #[test]
    fn test_removed_ids_go_stale() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        let child = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.append_child(root, child).expect("append");
        tree.remove(child).expect("remove");

        assert!(!tree.contains(child));
        let reused = tree.create(BoxKind::Block, ComputedStyle::default());
        assert_eq!(reused.index(), child.index());
        assert_ne!(reused.generation(), child.generation());
        assert!(matches!(
            tree.append_child(root, child),
            Err(TreeError::StaleBox { .. })
        ));
    }

    #[test]
    fn test_append_rejects_cycles_and_leaf_parents() {
        let mut tree = BoxTree::new();
        let outer = tree.create(BoxKind::Block, ComputedStyle::default());
        let inner = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.append_child(outer, inner).expect("append");
        assert!(matches!(
            tree.append_child(inner, outer),
            Err(TreeError::Cycle { .. })
        ));
        let leaf = text(&mut tree, "x");
        let other = tree.create(BoxKind::Block, ComputedStyle::default());
        assert_eq!(
            tree.append_child(leaf, other),
            Err(TreeError::NotAContainer(leaf.index()))
        );
    }

    #[test]
    fn test_normalize_wraps_mixed_children() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let words = text(&mut tree, "hello");
        let block = tree.create(BoxKind::Block, ComputedStyle::default());
        let space = text(&mut tree, "  \n ");
        tree.append_child(root, words).expect("append");
        tree.append_child(root, block).expect("append");
        tree.append_child(root, space).expect("append");

        tree.normalize();

        let children = tree.children(root).to_vec();
        assert_eq!(children.len(), 2, "whitespace-only run is dropped");
        assert!(tree[children[0]].anonymous);
        assert_eq!(tree.children(children[0]), &[words]);
        assert_eq!(tree.parent(words), Some(children[0]));
        assert_eq!(children[1], block);
        assert!(!tree.contains(space));
    }

    #[test]
    fn test_children_inline_ignores_floats() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        let float = tree.create(
            BoxKind::Block,
            ComputedStyle {
                float: crate::style::Float::Left,
                ..ComputedStyle::default()
            },
        );
        let words = text(&mut tree, "wrap me");
        tree.append_child(root, float).expect("append");
        tree.append_child(root, words).expect("append");
        assert!(tree.children_inline(root));
    }

    #[test]
    fn test_logical_accessors_swap_in_vertical_mode() {
        let mut tree = BoxTree::new();
        let id = tree.create(BoxKind::Block, ComputedStyle::default());
        let node = &mut tree[id];
        node.flow_mode = WritingMode::VerticalLr;
        node.set_logical_location(5.0, 10.0);
        node.set_logical_size(100.0, 20.0);
        assert_eq!(node.frame(), Rect::new(10.0, 5.0, 20.0, 100.0));
        assert_eq!(node.logical_width(), 100.0);
        assert_eq!(node.logical_top(), 10.0);
    }
}
