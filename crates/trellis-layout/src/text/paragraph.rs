//! Inline content of one block, flattened for line breaking.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! A block that establishes an inline formatting context is walked once
//! into a [`Paragraph`]: the white-space processed text of all its inline
//! descendants, a list of [`InlineItem`]s mapping byte ranges of that text
//! back to boxes, and the soft wrap opportunities between them grouped into
//! [`Segment`]s. Line breaking then only ever looks at segments.
//!
//! Atomic inlines stand in the text as U+FFFC OBJECT REPLACEMENT CHARACTER
//! and forced breaks as `\n`, so the bidi and line breaking algorithms see
//! them in context.

use std::ops::Range;

use crate::style::{ComputedStyle, Font, Hyphens, OverflowWrap, UnicodeBidi, WhiteSpace, WordBreak};
use crate::text::bidi::{self, BidiParagraph};
use crate::text::metrics::{FontMetrics, HYPHEN, SOFT_HYPHEN};
use crate::tree::{BoxId, BoxKind, BoxTree};

/// Stand-in character for atomic inline boxes.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// What an [`InlineItem`] contributes to the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A run of text from one text box.
    Text,
    /// Start of a non-atomic inline box.
    Open,
    /// End of a non-atomic inline box.
    Close,
    /// An inline-block, replaced box, or block-level box inside an inline.
    Atomic,
    /// A `<br>`.
    LineBreak,
    /// A float met in the inline flow.
    Float,
    /// An out-of-flow positioned box; only its static position matters.
    Positioned,
}

/// The style values line breaking reads from an item's box.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStyle {
    /// Font for measurement.
    pub font: Font,
    /// `white-space`
    pub white_space: WhiteSpace,
    /// `word-break`
    pub word_break: WordBreak,
    /// `overflow-wrap`
    pub overflow_wrap: OverflowWrap,
    /// `hyphens`
    pub hyphens: Hyphens,
}

impl ItemStyle {
    fn from_style(style: &ComputedStyle) -> Self {
        Self {
            font: style.font.clone(),
            white_space: style.white_space,
            word_break: style.word_break,
            overflow_wrap: style.overflow_wrap,
            hyphens: style.hyphens,
        }
    }
}

/// One piece of flattened inline content.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineItem {
    /// Item type.
    pub kind: ItemKind,
    /// Box that generated the item.
    pub box_id: BoxId,
    /// Byte range in the paragraph text; empty for everything but text,
    /// atomic inlines and line breaks.
    pub range: Range<usize>,
    /// Inline size contributed outside of text: the margin box of an atomic
    /// inline or float, and the start or end edge of an inline box.
    pub width: f32,
    /// Index of the `Open` item of the innermost enclosing inline box.
    pub parent: Option<usize>,
    /// Style subset used while breaking.
    pub style: ItemStyle,
}

impl InlineItem {
    /// True for items that occupy no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// A point in the paragraph: byte `offset` within item `item`.
///
/// Ordering is lexicographic, which matches text order because items are
/// stored in text order and empty items sit at their range start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    /// Item index; equal to the item count at the paragraph end.
    pub item: usize,
    /// Byte offset into the paragraph text.
    pub offset: usize,
}

/// How a segment ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakKind {
    /// End of the paragraph.
    End,
    /// A soft wrap opportunity.
    Soft,
    /// A hyphenation opportunity; breaking here draws a hyphen this wide.
    Hyphen(f32),
    /// A forced break: `<br>` or a preserved newline.
    Forced,
}

/// Content between two consecutive break opportunities.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// First position in the segment.
    pub start: Position,
    /// Position just past the segment.
    pub end: Position,
    /// Full inline size, including trailing whitespace.
    pub width: f32,
    /// Inline size of trailing whitespace that hangs at a line end.
    pub trailing_space: f32,
    /// The opportunity after the segment.
    pub break_after: BreakKind,
    /// True if any float item lies in the segment.
    pub has_floats: bool,
}

/// Flattened inline content of one block.
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// Processed text, including bidi formatting characters.
    pub text: String,
    /// Items in text order.
    pub items: Vec<InlineItem>,
    /// Segments in text order; they tile the whole paragraph.
    pub segments: Vec<Segment>,
    /// Resolved embedding levels.
    pub bidi: BidiParagraph,
}

/// Measure `text` in `font`, skipping characters that have no advance.
pub fn measure_text(metrics: &dyn FontMetrics, text: &str, font: &Font) -> f32 {
    if text
        .chars()
        .any(|c| c == SOFT_HYPHEN || c == '\n' || bidi::controls::is_control(c))
    {
        let visible: String = text
            .chars()
            .filter(|c| *c != SOFT_HYPHEN && *c != '\n' && !bidi::controls::is_control(*c))
            .collect();
        return metrics.measure_run(&visible, font);
    }
    metrics.measure_run(text, font)
}

/// Inline-axis size of a box's margin box.
#[must_use]
pub fn margin_box_inline_size(tree: &BoxTree, id: BoxId) -> f32 {
    let node = &tree[id];
    let margin = node.dimensions.margin;
    if node.flow_mode.is_horizontal() {
        node.logical_width() + margin.left + margin.right
    } else {
        node.logical_width() + margin.top + margin.bottom
    }
}

fn inline_edge(style: &ComputedStyle, containing_width: f32, start: bool) -> f32 {
    let basis = Some(containing_width);
    if start {
        style.margin.inline_start.resolve_or(basis, 0.0)
            + style.border_width.inline_start
            + style.padding.inline_start.resolve_or(basis, 0.0)
    } else {
        style.margin.inline_end.resolve_or(basis, 0.0)
            + style.border_width.inline_end
            + style.padding.inline_end.resolve_or(basis, 0.0)
    }
}

struct Builder<'a> {
    tree: &'a BoxTree,
    containing_width: f32,
    text: String,
    items: Vec<InlineItem>,
    // The last emitted character was a collapsible space (or nothing yet).
    after_collapsible_space: bool,
}

impl Builder<'_> {
    fn push_item(&mut self, kind: ItemKind, box_id: BoxId, range: Range<usize>, width: f32, parent: Option<usize>) {
        let style = ItemStyle::from_style(&self.tree[box_id].style);
        self.items.push(InlineItem {
            kind,
            box_id,
            range,
            width,
            parent,
            style,
        });
    }

    fn visit(&mut self, id: BoxId, parent: Option<usize>) {
        let tree = self.tree;
        let node = &tree[id];
        if node.style.is_floating() {
            let width = margin_box_inline_size(tree, id);
            let at = self.text.len();
            self.push_item(ItemKind::Float, id, at..at, width, parent);
            return;
        }
        if node.style.is_out_of_flow_positioned() {
            let at = self.text.len();
            self.push_item(ItemKind::Positioned, id, at..at, 0.0, parent);
            return;
        }
        match &node.kind {
            BoxKind::Text(text) => {
                let white_space = node.style.white_space;
                let start = self.text.len();
                self.push_text(text, white_space);
                let end = self.text.len();
                self.push_item(ItemKind::Text, id, start..end, 0.0, parent);
            }
            BoxKind::LineBreak => {
                // Spaces before a forced break collapse away.
                if self.after_collapsible_space && self.text.ends_with(' ') {
                    let _ = self.text.pop();
                    self.clamp_item_ranges();
                }
                let start = self.text.len();
                self.text.push('\n');
                self.after_collapsible_space = true;
                self.push_item(ItemKind::LineBreak, id, start..start + 1, 0.0, parent);
            }
            BoxKind::Inline => {
                let style = &node.style;
                let controls = bidi::bracket_controls(style.unicode_bidi, style.direction);
                let open_width = inline_edge(style, self.containing_width, true);
                let close_width = inline_edge(style, self.containing_width, false);
                if let Some((open, _)) = controls {
                    self.text.extend(open.iter());
                }
                let at = self.text.len();
                self.push_item(ItemKind::Open, id, at..at, open_width, parent);
                let open_index = self.items.len() - 1;
                for child in tree.children(id) {
                    self.visit(*child, Some(open_index));
                }
                let at = self.text.len();
                self.push_item(ItemKind::Close, id, at..at, close_width, parent);
                if let Some((_, close)) = controls {
                    self.text.extend(close.iter());
                }
            }
            // Atomic inlines, and block-level boxes that ended up inside an
            // inline, occupy one object replacement character.
            _ => {
                let width = margin_box_inline_size(tree, id);
                let start = self.text.len();
                self.text.push(OBJECT_REPLACEMENT);
                self.after_collapsible_space = false;
                let end = self.text.len();
                self.push_item(ItemKind::Atomic, id, start..end, width, parent);
            }
        }
    }

    // Keep item ranges inside the text after a collapsed space is popped.
    fn clamp_item_ranges(&mut self) {
        let len = self.text.len();
        for item in &mut self.items {
            item.range.start = item.range.start.min(len);
            item.range.end = item.range.end.min(len);
        }
    }

    /// [§ 4.1.1 Phase I: Collapsing and Transformation](https://www.w3.org/TR/css-text-3/#white-space-phase-1)
    fn push_text(&mut self, text: &str, white_space: WhiteSpace) {
        if !white_space.collapses_spaces() {
            for c in text.chars() {
                if c != '\r' {
                    self.text.push(c);
                }
            }
            self.after_collapsible_space = false;
            return;
        }
        for c in text.chars() {
            match c {
                '\n' | '\r' if white_space.preserves_newlines() => {
                    // "any collapsible spaces immediately preceding a
                    // segment break are removed"
                    if self.after_collapsible_space && self.text.ends_with(' ') {
                        let _ = self.text.pop();
                        self.clamp_item_ranges();
                    }
                    if c == '\n' {
                        self.text.push('\n');
                    }
                    self.after_collapsible_space = true;
                }
                ' ' | '\t' | '\n' | '\r' => {
                    // "Any collapsible space immediately following another
                    // collapsible space ... is collapsed to have zero advance width."
                    if !self.after_collapsible_space {
                        self.text.push(' ');
                        self.after_collapsible_space = true;
                    }
                }
                _ => {
                    self.text.push(c);
                    self.after_collapsible_space = false;
                }
            }
        }
    }
}

impl Paragraph {
    /// Flatten the inline children of `block`.
    ///
    /// Atomic inlines and floats must already be laid out: their margin
    /// boxes are read from the tree. `containing_width` resolves percentage
    /// edges of inline boxes.
    #[must_use]
    pub fn build(tree: &BoxTree, block: BoxId, containing_width: f32, metrics: &dyn FontMetrics) -> Self {
        let block_style = &tree[block].style;
        let mut builder = Builder {
            tree,
            containing_width,
            text: String::new(),
            items: Vec::new(),
            after_collapsible_space: true,
        };
        for child in tree.children(block) {
            builder.visit(*child, None);
        }
        let Builder { text, items, .. } = builder;

        let plaintext = matches!(block_style.unicode_bidi, UnicodeBidi::Plaintext);
        let bidi = BidiParagraph::analyze(&text, block_style.direction, plaintext, |c| metrics.bidi_class(c));
        let mut paragraph = Self {
            text,
            items,
            segments: Vec::new(),
            bidi,
        };
        paragraph.segments = paragraph.build_segments(metrics);
        paragraph
    }

    /// Position at the start of the paragraph.
    #[must_use]
    pub fn start(&self) -> Position {
        Position {
            item: 0,
            offset: self.items.first().map_or(0, |item| item.range.start),
        }
    }

    /// Position past the end of the paragraph.
    #[must_use]
    pub fn end(&self) -> Position {
        Position {
            item: self.items.len(),
            offset: self.text.len(),
        }
    }

    /// Index of the item whose text contains byte `offset`.
    fn item_at(&self, offset: usize) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.range.start <= offset && offset < item.range.end)
    }

    /// Position of a break at text offset `offset`: after every item that
    /// ends at or before it, including inline box ends, and before any
    /// inline box that starts there.
    #[must_use]
    pub fn position_at(&self, offset: usize) -> Position {
        for (index, item) in self.items.iter().enumerate() {
            let starts_here = item.is_empty() && item.range.start >= offset && item.kind != ItemKind::Close;
            if item.range.end > offset || starts_here || (item.is_empty() && item.range.start > offset) {
                return Position {
                    item: index,
                    offset: offset.max(item.range.start),
                };
            }
        }
        self.end()
    }

    /// Byte range of item `index` covered by `[start, end)`.
    #[must_use]
    pub fn item_range(&self, index: usize, start: Position, end: Position) -> Range<usize> {
        let item = &self.items[index];
        let from = if index == start.item { start.offset.max(item.range.start) } else { item.range.start };
        let to = if index == end.item { end.offset.min(item.range.end) } else { item.range.end };
        from..to.max(from)
    }

    /// Items overlapping `[start, end)`, with the byte range of each that
    /// falls inside it. Empty items count when their index is inside.
    pub fn pieces(&self, start: Position, end: Position) -> impl Iterator<Item = (usize, Range<usize>)> + '_ {
        let last = end.item.min(self.items.len().saturating_sub(1));
        (start.item..=last)
            .filter(move |index| *index < self.items.len())
            .filter_map(move |index| {
                let range = self.item_range(index, start, end);
                let item = &self.items[index];
                if index == end.item && (item.is_empty() || range.is_empty()) {
                    return None;
                }
                if !item.is_empty() && range.is_empty() {
                    return None;
                }
                Some((index, range))
            })
    }

    /// Inline size of everything in `[start, end)`.
    #[must_use]
    pub fn measure(&self, metrics: &dyn FontMetrics, start: Position, end: Position) -> f32 {
        self.pieces(start, end)
            .map(|(index, range)| {
                let item = &self.items[index];
                match item.kind {
                    ItemKind::Text => measure_text(metrics, &self.text[range], &item.style.font),
                    ItemKind::Open | ItemKind::Close | ItemKind::Atomic => item.width,
                    ItemKind::LineBreak | ItemKind::Float | ItemKind::Positioned => 0.0,
                }
            })
            .sum()
    }

    /// Inline size of the whitespace at the end of `[start, end)` that
    /// hangs when a line ends there.
    #[must_use]
    pub fn trailing_space(&self, metrics: &dyn FontMetrics, start: Position, end: Position) -> f32 {
        let pieces: Vec<_> = self.pieces(start, end).collect();
        let mut width = 0.0;
        for (index, range) in pieces.into_iter().rev() {
            let item = &self.items[index];
            match item.kind {
                ItemKind::Open | ItemKind::Close | ItemKind::Float | ItemKind::Positioned => {}
                ItemKind::Atomic | ItemKind::LineBreak => return width,
                ItemKind::Text => {
                    let hangs = item.style.white_space.collapses_spaces()
                        || item.style.white_space == WhiteSpace::PreWrap;
                    if !hangs {
                        return width;
                    }
                    let text = &self.text[range];
                    let trimmed = text.trim_end_matches([' ', '\t']);
                    width += measure_text(metrics, &text[trimmed.len()..], &item.style.font);
                    if !trimmed.is_empty() {
                        return width;
                    }
                }
            }
        }
        width
    }

    /// [§ 5 Line Breaking and Word Boundaries](https://www.w3.org/TR/css-text-3/#line-breaking)
    ///
    /// Soft wrap and hyphenation opportunities as `(offset, kind)`, plus
    /// forced breaks after every newline.
    fn opportunities(&self, metrics: &dyn FontMetrics) -> Vec<(usize, BreakKind)> {
        let visible: Vec<(usize, char)> = self
            .text
            .char_indices()
            .filter(|(_, c)| !bidi::controls::is_control(*c))
            .collect();
        let mut out = Vec::new();
        for pair in visible.windows(2) {
            let (before_at, before) = pair[0];
            let (after_at, after) = pair[1];
            if before == '\n' {
                out.push((after_at, BreakKind::Forced));
                continue;
            }
            let Some(item) = self.item_at(before_at).map(|i| &self.items[i]) else {
                continue;
            };
            let style = &item.style;
            if !style.white_space.allows_wrap() {
                continue;
            }
            if before == SOFT_HYPHEN {
                if style.hyphens != Hyphens::None {
                    out.push((after_at, BreakKind::Hyphen(metrics.measure_run(HYPHEN, &style.font))));
                }
                continue;
            }
            let both_letters = before.is_alphanumeric() && after.is_alphanumeric();
            let allowed = match style.word_break {
                WordBreak::BreakAll => both_letters || metrics.can_break_between(before, after),
                WordBreak::KeepAll => !both_letters && metrics.can_break_between(before, after),
                WordBreak::Normal => metrics.can_break_between(before, after),
            };
            if allowed {
                out.push((after_at, BreakKind::Soft));
            }
        }
        // A trailing newline still ends its line.
        if let Some((at, '\n')) = visible.last() {
            out.push((at + 1, BreakKind::Forced));
        }

        for item in &self.items {
            if item.kind == ItemKind::Text && item.style.hyphens == Hyphens::Auto && item.style.white_space.allows_wrap() {
                out.extend(self.auto_hyphenation(metrics, item));
            }
        }
        out.sort_by_key(|(offset, _)| *offset);
        out.dedup_by_key(|(offset, _)| *offset);
        out.retain(|(offset, _)| *offset > 0 && *offset <= self.text.len());
        out
    }

    fn auto_hyphenation(&self, metrics: &dyn FontMetrics, item: &InlineItem) -> Vec<(usize, BreakKind)> {
        let hyphen = metrics.measure_run(HYPHEN, &item.style.font);
        let text = &self.text[item.range.clone()];
        let mut out = Vec::new();
        let mut word_start = None;
        for (i, c) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
            match (c.is_alphabetic(), word_start) {
                (true, None) => word_start = Some(i),
                (false, Some(start)) => {
                    let word = &text[start..i];
                    for point in metrics.hyphenation_points(word) {
                        if point > 0 && point < word.len() && word.is_char_boundary(point) {
                            out.push((item.range.start + start + point, BreakKind::Hyphen(hyphen)));
                        }
                    }
                    word_start = None;
                }
                _ => {}
            }
        }
        out
    }

    fn build_segments(&self, metrics: &dyn FontMetrics) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut start = self.start();
        let end = self.end();
        let mut breaks = self.opportunities(metrics).into_iter().peekable();
        loop {
            let (next, break_after) = loop {
                match breaks.next() {
                    Some((offset, kind)) => {
                        let position = self.position_at(offset);
                        if position > start && position < end {
                            break (position, kind);
                        }
                        if position >= end {
                            // A forced break at the very end still ends the
                            // last line.
                            break (end, if kind == BreakKind::Forced { BreakKind::Forced } else { BreakKind::End });
                        }
                    }
                    None => break (end, BreakKind::End),
                }
            };
            if next <= start && start >= end {
                break;
            }
            let has_floats = self.pieces(start, next).any(|(i, _)| self.items[i].kind == ItemKind::Float);
            segments.push(Segment {
                start,
                end: next,
                width: self.measure(metrics, start, next),
                trailing_space: self.trailing_space(metrics, start, next),
                break_after,
                has_floats,
            });
            if next >= end {
                break;
            }
            start = next;
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::ComputedStyle;
    use crate::text::metrics::FixedWidthMetrics;

    fn paragraph_of(texts: &[(&str, ComputedStyle)]) -> Paragraph {
        let mut tree = BoxTree::new();
        let block = tree.create(BoxKind::Block, ComputedStyle::default());
        for (text, style) in texts {
            let id = tree.create(BoxKind::Text((*text).to_string()), style.clone());
            tree.append_child(block, id).expect("append");
        }
        Paragraph::build(&tree, block, 300.0, &FixedWidthMetrics::new(8.0))
    }

    #[test]
    fn test_spaces_collapse_across_boxes() {
        let p = paragraph_of(&[("  hello   ", ComputedStyle::default()), ("  world", ComputedStyle::default())]);
        assert_eq!(p.text, "hello world");
        assert_eq!(p.items[0].range, 0..6);
        assert_eq!(p.items[1].range, 6..11);
    }

    #[test]
    fn test_segments_break_after_spaces_and_hang_them() {
        let p = paragraph_of(&[("aa bbb c", ComputedStyle::default())]);
        let widths: Vec<_> = p.segments.iter().map(|s| (s.width, s.trailing_space)).collect();
        assert_eq!(widths, vec![(24.0, 8.0), (32.0, 8.0), (8.0, 0.0)]);
        assert_eq!(p.segments.last().map(|s| s.break_after), Some(BreakKind::End));
    }

    #[test]
    fn test_nowrap_suppresses_soft_wraps() {
        let style = ComputedStyle {
            white_space: WhiteSpace::Nowrap,
            ..ComputedStyle::default()
        };
        let p = paragraph_of(&[("aa bb cc", style)]);
        assert_eq!(p.segments.len(), 1);
    }

    #[test]
    fn test_preserved_newline_forces_break() {
        let style = ComputedStyle {
            white_space: WhiteSpace::Pre,
            ..ComputedStyle::default()
        };
        let p = paragraph_of(&[("ab\ncd", style)]);
        assert_eq!(p.segments.len(), 2);
        assert_eq!(p.segments[0].break_after, BreakKind::Forced);
        assert_eq!(p.segments[0].width, 16.0, "the newline has no advance");
    }

    #[test]
    fn test_soft_hyphen_is_hyphen_opportunity_unless_disabled() {
        let p = paragraph_of(&[("hy\u{AD}phen", ComputedStyle::default())]);
        assert!(matches!(p.segments[0].break_after, BreakKind::Hyphen(w) if w == 8.0));
        assert_eq!(p.segments[0].width, 16.0);

        let none = ComputedStyle {
            hyphens: Hyphens::None,
            ..ComputedStyle::default()
        };
        let p = paragraph_of(&[("hy\u{AD}phen", none)]);
        assert_eq!(p.segments.len(), 1);
    }

    #[test]
    fn test_break_all_allows_breaks_between_letters() {
        let style = ComputedStyle {
            word_break: WordBreak::BreakAll,
            ..ComputedStyle::default()
        };
        let p = paragraph_of(&[("abc", style)]);
        assert_eq!(p.segments.len(), 3);
    }

    #[test]
    fn test_inline_box_edges_and_break_positions() {
        let mut tree = BoxTree::new();
        let block = tree.create(BoxKind::Block, ComputedStyle::default());
        let first = tree.create(BoxKind::Text("aa ".to_string()), ComputedStyle::default());
        let span_style = ComputedStyle {
            padding: crate::style::Sides {
                inline_start: crate::style::Length::Px(5.0),
                ..crate::style::Sides::ZERO
            },
            ..ComputedStyle::default()
        };
        let span = tree.create(BoxKind::Inline, span_style);
        let inner = tree.create(BoxKind::Text("bb".to_string()), ComputedStyle::default());
        tree.append_child(block, first).expect("append");
        tree.append_child(block, span).expect("append");
        tree.append_child(span, inner).expect("append");
        let p = Paragraph::build(&tree, block, 300.0, &FixedWidthMetrics::new(8.0));

        assert_eq!(p.segments.len(), 2);
        // The break lands before the span opens, so its edge starts line two.
        assert_eq!(p.segments[1].start, Position { item: 1, offset: 3 });
        assert_eq!(p.segments[1].width, 5.0 + 16.0);
    }
}
