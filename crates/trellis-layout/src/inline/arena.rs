//! Storage for line box trees.
//!
//! Every block that holds inline content owns a chain of root inline boxes,
//! one per line, each the root of a small tree of flow boxes (inline
//! elements) and leaf boxes (text runs, atomic inlines, line breaks). All of
//! those boxes live in one [`InlineBoxArena`] owned by the box tree and are
//! addressed by generational [`InlineBoxId`]s that also name their arena, so
//! an id can never resolve against the wrong tree.
//!
//! Links between inline boxes are ids, never references. Siblings are linked
//! through `prev`/`next`; lines of one block are linked the same way at the
//! root level.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

use crate::style::Direction;
use crate::tree::{BoxId, LineList};

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

/// Generational id of a box in an [`InlineBoxArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InlineBoxId {
    arena: u32,
    index: u32,
    generation: u32,
}

impl fmt::Display for InlineBoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}v{}", self.arena, self.index, self.generation)
    }
}

/// A text run placed on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    /// The run's characters, without soft hyphens; ends with the hyphen
    /// glyph when the line was hyphenated here.
    pub text: String,
    /// Extra inline size added by justification.
    pub expansion: f32,
    /// The run ends in an inserted hyphen.
    pub hyphenated: bool,
    /// Justification may add space before the first character.
    pub allows_leading_expansion: bool,
    /// Justification may add space after the last character.
    pub allows_trailing_expansion: bool,
}

/// Per-line data of a root inline box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootLine {
    /// Top of the line box, in the block's logical coordinates.
    pub line_top: f32,
    /// Bottom of the line box.
    pub line_bottom: f32,
    /// Logical position of the root baseline.
    pub baseline: f32,
    /// Floats placed beside this line.
    pub floats: Vec<BoxId>,
    /// The line ends with an inserted hyphen.
    pub hyphenated: bool,
    /// The line ends at a forced break.
    pub ends_with_break: bool,
    /// Base direction of the line.
    pub direction: Direction,
    /// Offset added to push the line past a page or column boundary.
    pub pagination_strut: f32,
}

impl RootLine {
    /// Block-axis size of the line box.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        (self.line_bottom - self.line_top).max(0.0)
    }
}

/// What an inline box represents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InlineBoxKind {
    /// A run of text.
    Text(TextRun),
    /// An atomic inline; the rectangle is its margin box.
    Atomic,
    /// A forced line break.
    LineBreak,
    /// A fragment of an inline element on this line.
    Flow {
        /// The element's start edge (margin, border, padding) is on this line.
        include_left_edge: bool,
        /// The element's end edge is on this line.
        include_right_edge: bool,
    },
    /// The root of one line.
    Root(RootLine),
}

/// One box of a line box tree.
///
/// Geometry is logical and relative to the owning block's border box.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineBox {
    /// The layout box this fragment belongs to; the block itself for roots.
    pub box_id: BoxId,
    /// Box type and type-specific data.
    pub kind: InlineBoxKind,
    /// Line-left position.
    pub logical_left: f32,
    /// Block-start position.
    pub logical_top: f32,
    /// Inline size.
    pub logical_width: f32,
    /// Block size.
    pub logical_height: f32,
    /// Distance from `logical_top` down to the box's baseline.
    pub baseline: f32,
    /// Resolved bidi embedding level.
    pub bidi_level: u8,
    pub(crate) parent: Option<InlineBoxId>,
    pub(crate) prev: Option<InlineBoxId>,
    pub(crate) next: Option<InlineBoxId>,
    pub(crate) first_child: Option<InlineBoxId>,
    pub(crate) last_child: Option<InlineBoxId>,
}

impl InlineBox {
    /// A detached box with empty geometry.
    #[must_use]
    pub const fn new(box_id: BoxId, kind: InlineBoxKind) -> Self {
        Self {
            box_id,
            kind,
            logical_left: 0.0,
            logical_top: 0.0,
            logical_width: 0.0,
            logical_height: 0.0,
            baseline: 0.0,
            bidi_level: 0,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
        }
    }

    /// Line-right edge.
    #[must_use]
    pub fn logical_right(&self) -> f32 {
        self.logical_left + self.logical_width
    }

    /// Block-end edge.
    #[must_use]
    pub fn logical_bottom(&self) -> f32 {
        self.logical_top + self.logical_height
    }

    /// Parent flow box or root.
    #[must_use]
    pub const fn parent(&self) -> Option<InlineBoxId> {
        self.parent
    }

    /// Next sibling, or the next line for roots.
    #[must_use]
    pub const fn next(&self) -> Option<InlineBoxId> {
        self.next
    }

    /// Previous sibling, or the previous line for roots.
    #[must_use]
    pub const fn prev(&self) -> Option<InlineBoxId> {
        self.prev
    }

    /// Root data, for root boxes.
    #[must_use]
    pub const fn root_line(&self) -> Option<&RootLine> {
        match &self.kind {
            InlineBoxKind::Root(line) => Some(line),
            _ => None,
        }
    }

    /// True for text, atomic and line break boxes.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(
            self.kind,
            InlineBoxKind::Text(_) | InlineBoxKind::Atomic | InlineBoxKind::LineBreak
        )
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<InlineBox>,
}

/// Arena holding every inline box of one box tree.
#[derive(Debug, Clone)]
pub struct InlineBoxArena {
    id: u32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Default for InlineBoxArena {
    fn default() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl InlineBoxArena {
    /// An empty arena with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Store `node` and return its id.
    pub fn alloc(&mut self, node: InlineBox) -> InlineBoxId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return InlineBoxId {
                arena: self.id,
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        InlineBoxId {
            arena: self.id,
            index,
            generation: 0,
        }
    }

    /// The box for `id`, or `None` if it was freed or belongs to another arena.
    #[must_use]
    pub fn get(&self, id: InlineBoxId) -> Option<&InlineBox> {
        if id.arena != self.id {
            return None;
        }
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Mutable access to the box for `id`.
    pub fn get_mut(&mut self, id: InlineBoxId) -> Option<&mut InlineBox> {
        if id.arena != self.id {
            return None;
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: InlineBoxId, child: InlineBoxId) {
        let previous_last = self[parent].last_child;
        {
            let node = &mut self[child];
            node.parent = Some(parent);
            node.prev = previous_last;
            node.next = None;
        }
        match previous_last {
            Some(last) => self[last].next = Some(child),
            None => self[parent].first_child = Some(child),
        }
        self[parent].last_child = Some(child);
    }

    /// Children of `id` in visual order.
    pub fn children(&self, id: InlineBoxId) -> impl Iterator<Item = InlineBoxId> + '_ {
        let first = self.get(id).and_then(|node| node.first_child);
        std::iter::successors(first, move |current| self.get(*current).and_then(|node| node.next))
    }

    /// `id` and all its descendants, parents before children.
    #[must_use]
    pub fn subtree(&self, id: InlineBoxId) -> Vec<InlineBoxId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            let children: Vec<_> = self.children(current).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Leaf boxes under `id`, in visual order.
    #[must_use]
    pub fn leaves(&self, id: InlineBoxId) -> Vec<InlineBoxId> {
        self.subtree(id)
            .into_iter()
            .filter(|current| self[*current].is_leaf())
            .collect()
    }

    /// Free `id` and everything under it.
    pub fn free_subtree(&mut self, id: InlineBoxId) {
        for victim in self.subtree(id) {
            let slot = &mut self.slots[victim.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(victim.index);
            self.live -= 1;
        }
    }

    /// Free every line of a block.
    pub fn free_lines(&mut self, lines: LineList) {
        let roots: Vec<_> = self.lines(lines).collect();
        for root in roots {
            self.free_subtree(root);
        }
    }

    /// Link `root` after the last line in `lines`.
    pub fn push_line(&mut self, lines: &mut LineList, root: InlineBoxId) {
        if let Some(last) = lines.last {
            self[last].next = Some(root);
            self[root].prev = Some(last);
        } else {
            lines.first = Some(root);
        }
        lines.last = Some(root);
        lines.count += 1;
    }

    /// Root boxes of `lines`, first to last.
    pub fn lines(&self, lines: LineList) -> impl Iterator<Item = InlineBoxId> + '_ {
        std::iter::successors(lines.first, move |current| self.get(*current).and_then(|node| node.next))
    }

    /// Move a whole line tree down by `delta`.
    pub fn shift_block(&mut self, root: InlineBoxId, delta: f32) {
        if delta == 0.0 {
            return;
        }
        for id in self.subtree(root) {
            let node = &mut self[id];
            node.logical_top += delta;
            if let InlineBoxKind::Root(line) = &mut node.kind {
                line.line_top += delta;
                line.line_bottom += delta;
                line.baseline += delta;
            }
        }
    }

    /// Serializable view of one line, for dumps.
    #[must_use]
    pub fn snapshot(&self, root: InlineBoxId) -> Option<LineSnapshot> {
        let line = self.get(root)?.root_line()?.clone();
        let boxes = self
            .subtree(root)
            .into_iter()
            .skip(1)
            .map(|id| {
                let node = &self[id];
                let depth = std::iter::successors(node.parent, |p| self.get(*p).and_then(|n| n.parent)).count();
                InlineBoxSnapshot {
                    box_id: node.box_id,
                    depth,
                    kind: node.kind.clone(),
                    logical_left: node.logical_left,
                    logical_top: node.logical_top,
                    logical_width: node.logical_width,
                    logical_height: node.logical_height,
                    bidi_level: node.bidi_level,
                }
            })
            .collect();
        Some(LineSnapshot { line, boxes })
    }
}

impl Index<InlineBoxId> for InlineBoxArena {
    type Output = InlineBox;

    fn index(&self, id: InlineBoxId) -> &InlineBox {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale inline box id {id}"),
        }
    }
}

impl IndexMut<InlineBoxId> for InlineBoxArena {
    fn index_mut(&mut self, id: InlineBoxId) -> &mut InlineBox {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale inline box id {id}"),
        }
    }
}

/// One line as plain data.
#[derive(Debug, Clone, Serialize)]
pub struct LineSnapshot {
    /// Line metrics.
    pub line: RootLine,
    /// Every non-root box, parents before children.
    pub boxes: Vec<InlineBoxSnapshot>,
}

/// One inline box as plain data.
#[derive(Debug, Clone, Serialize)]
pub struct InlineBoxSnapshot {
    /// Generating layout box.
    pub box_id: BoxId,
    /// Nesting depth below the root, starting at 1.
    pub depth: usize,
    /// Kind and payload.
    pub kind: InlineBoxKind,
    /// Line-left position.
    pub logical_left: f32,
    /// Block-start position.
    pub logical_top: f32,
    /// Inline size.
    pub logical_width: f32,
    /// Block size.
    pub logical_height: f32,
    /// Bidi level.
    pub bidi_level: u8,
}
