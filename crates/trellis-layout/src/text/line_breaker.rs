//! Greedy line breaking over a [`Paragraph`].
//!
//! [§ 5 Line Breaking and Word Boundaries](https://www.w3.org/TR/css-text-3/#line-breaking)
//!
//! "When inline-level content is laid out into lines, it is broken across
//! line boxes. Such a break is called a line break."
//!
//! Each call to [`LineBreaker::next_line`] takes as many segments as fit in
//! the available width. A line always takes at least one segment, so
//! breaking always makes progress; when that segment does not fit and
//! `overflow-wrap` allows it, the segment is split between characters
//! instead. Floats met on the line are placed immediately if they fit next
//! to the content committed before them, otherwise they wait until after the
//! line. Content following a placed float is measured against the narrowed
//! width, so a line holding only floats ends there when the text after them
//! no longer fits.

use crate::style::{Direction, OverflowWrap};
use crate::text::metrics::FontMetrics;
use crate::text::paragraph::{BreakKind, ItemKind, Paragraph, Position, measure_text};
use crate::tree::BoxId;

// Slack for accumulated f32 error in the fit test.
const FIT_EPSILON: f32 = 1e-3;

/// Receives floats as the breaker meets them.
pub trait LineFloats {
    /// Place the float `box_id`, whose margin box is `width` wide, at the
    /// top of the current line. Returns the line's new available width.
    fn place_on_line(&mut self, box_id: BoxId, width: f32) -> f32;
}

/// The result of breaking one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBreak {
    /// First position on the line, after skipped leading spaces.
    pub start: Position,
    /// Position just past the line; the next line starts here.
    pub end: Position,
    /// Inline size of the content, without hanging trailing whitespace and
    /// with the hyphen if one is drawn.
    pub width: f32,
    /// Inline size of the whitespace hanging at the end.
    pub trailing_space: f32,
    /// Width of the hyphen drawn at the end, if the line ends at a
    /// hyphenation opportunity.
    pub hyphen_width: Option<f32>,
    /// The line ends at a forced break.
    pub forced: bool,
    /// The first segment alone was wider than the available width.
    pub overflows: bool,
    /// Available width after placing floats on this line.
    pub available_width: f32,
    /// Floats placed beside this line.
    pub placed_floats: Vec<BoxId>,
    /// Floats that must be placed after this line.
    pub deferred_floats: Vec<BoxId>,
    /// Resolved base direction the line's runs are ordered in.
    pub direction: Direction,
}

impl LineBreak {
    /// True if the line ends with a drawn hyphen.
    #[must_use]
    pub const fn is_hyphenated(&self) -> bool {
        self.hyphen_width.is_some()
    }
}

struct Chunk {
    end: Position,
    width: f32,
    trailing: f32,
    break_after: BreakKind,
    next_segment: usize,
    has_floats: bool,
}

/// Breaks one paragraph into lines.
#[derive(Clone)]
pub struct LineBreaker<'a> {
    paragraph: &'a Paragraph,
    metrics: &'a dyn FontMetrics,
    hyphenate_limit: Option<u32>,
    consecutive_hyphenated: u32,
}

impl<'a> LineBreaker<'a> {
    /// A breaker over `paragraph`. At most `hyphenate_limit` consecutive
    /// lines end in a hyphen.
    #[must_use]
    pub fn new(paragraph: &'a Paragraph, metrics: &'a dyn FontMetrics, hyphenate_limit: Option<u32>) -> Self {
        Self {
            paragraph,
            metrics,
            hyphenate_limit,
            consecutive_hyphenated: 0,
        }
    }

    fn may_hyphenate(&self) -> bool {
        self.hyphenate_limit
            .is_none_or(|limit| self.consecutive_hyphenated < limit)
    }

    /// Break the line starting at `start` into `available_width`.
    ///
    /// Returns `None` once the paragraph is exhausted.
    pub fn next_line(
        &mut self,
        start: Position,
        available_width: f32,
        floats: &mut dyn LineFloats,
    ) -> Option<LineBreak> {
        let start = self.skip_leading_spaces(start);
        let mut index = self.paragraph.segments.iter().position(|s| s.end > start)?;

        let mut line = LineBreak {
            start,
            end: start,
            width: 0.0,
            trailing_space: 0.0,
            hyphen_width: None,
            forced: false,
            overflows: false,
            available_width,
            placed_floats: Vec::new(),
            deferred_floats: Vec::new(),
            direction: self.paragraph.bidi.base_direction(),
        };
        let mut used = 0.0_f32;

        while let Some(chunk) = self.next_chunk(index, line.end) {
            // STEP 1: Floats ahead of the chunk's content sit at the break
            // already taken, so they belong to this line whether or not the
            // content after them fits.
            if chunk.has_floats {
                let content = self.skip_leading_floats(line.end, chunk.end);
                if content > line.end {
                    self.handle_floats(line.end, content, used, floats, &mut line);
                    line.end = content;
                }
            }

            // STEP 2: Test the content against the width left beside them.
            let hyphen = match chunk.break_after {
                BreakKind::Hyphen(width) => Some(width),
                _ => None,
            };
            let needed = used + chunk.width - chunk.trailing + hyphen.unwrap_or(0.0);
            if needed > line.available_width + FIT_EPSILON {
                if line.end > start {
                    break;
                }
                line.overflows = true;
                if let Some(split) = self.emergency_split(start, chunk.end, line.available_width) {
                    self.handle_floats(line.end, split, used, floats, &mut line);
                    used = self.paragraph.measure(self.metrics, start, split);
                    line.end = split;
                    line.trailing_space = 0.0;
                    line.hyphen_width = None;
                    break;
                }
            }

            // STEP 3: Commit the chunk, placing floats inside it against the
            // content before each.
            if chunk.has_floats {
                self.handle_floats(line.end, chunk.end, used, floats, &mut line);
            }
            used += chunk.width;
            line.end = chunk.end;
            line.trailing_space = chunk.trailing;
            line.hyphen_width = hyphen;
            index = chunk.next_segment;

            match chunk.break_after {
                BreakKind::Forced => {
                    line.forced = true;
                    break;
                }
                BreakKind::End => break,
                BreakKind::Soft | BreakKind::Hyphen(_) => {}
            }
        }

        line.width = used - line.trailing_space + line.hyphen_width.unwrap_or(0.0);
        if line.is_hyphenated() {
            self.consecutive_hyphenated += 1;
        } else {
            self.consecutive_hyphenated = 0;
        }
        Some(line)
    }

    /// Segments from `index` up to the next usable break, clipped to start
    /// at `from`.
    fn next_chunk(&self, mut index: usize, from: Position) -> Option<Chunk> {
        let segments = &self.paragraph.segments;
        let _ = segments.get(index)?;
        let mut chunk = Chunk {
            end: from,
            width: 0.0,
            trailing: 0.0,
            break_after: BreakKind::End,
            next_segment: index,
            has_floats: false,
        };
        while let Some(segment) = segments.get(index) {
            let (width, trailing) = if segment.start < from {
                (
                    self.paragraph.measure(self.metrics, from, segment.end),
                    self.paragraph.trailing_space(self.metrics, from, segment.end),
                )
            } else {
                (segment.width, segment.trailing_space)
            };
            chunk.width += width;
            chunk.trailing = trailing;
            chunk.end = segment.end;
            chunk.break_after = segment.break_after;
            chunk.has_floats |= segment.has_floats;
            index += 1;
            chunk.next_segment = index;
            // A hyphenation opportunity past the consecutive line limit is
            // not a break at all.
            if !matches!(segment.break_after, BreakKind::Hyphen(_)) || self.may_hyphenate() {
                break;
            }
        }
        Some(chunk)
    }

    /// [§ 5.5 Overflow Wrapping](https://www.w3.org/TR/css-text-3/#overflow-wrap-property)
    ///
    /// The last position in `[from, to)` before content would exceed
    /// `available`, if `overflow-wrap` allows breaking there. At least one
    /// character always stays on the line.
    fn emergency_split(&self, from: Position, to: Position, available: f32) -> Option<Position> {
        let paragraph = self.paragraph;
        let mut used = 0.0;
        let mut placed_any = false;
        for (index, range) in paragraph.pieces(from, to) {
            let item = &paragraph.items[index];
            match item.kind {
                ItemKind::Text => {
                    let splittable = item.style.overflow_wrap != OverflowWrap::Normal
                        && item.style.white_space.allows_wrap();
                    let mut buffer = [0_u8; 4];
                    for (offset, c) in paragraph.text[range.clone()].char_indices() {
                        let width = measure_text(self.metrics, c.encode_utf8(&mut buffer), &item.style.font);
                        if splittable && placed_any && used + width > available + FIT_EPSILON {
                            return Some(Position {
                                item: index,
                                offset: range.start + offset,
                            });
                        }
                        used += width;
                        placed_any |= width > 0.0;
                    }
                }
                ItemKind::Atomic => {
                    used += item.width;
                    placed_any = true;
                }
                ItemKind::Open | ItemKind::Close => used += item.width,
                ItemKind::LineBreak | ItemKind::Float | ItemKind::Positioned => {}
            }
        }
        None
    }

    /// Position past the floats and positioned boxes that open `[from, to)`.
    fn skip_leading_floats(&self, from: Position, to: Position) -> Position {
        let mut at = from;
        for (index, _) in self.paragraph.pieces(from, to) {
            let item = &self.paragraph.items[index];
            if !matches!(item.kind, ItemKind::Float | ItemKind::Positioned) {
                break;
            }
            at = Position {
                item: index + 1,
                offset: item.range.start,
            };
        }
        at
    }

    /// Place or defer each float in `[from, to)`. `used` is the width on the
    /// line at `from`, hanging whitespace included.
    fn handle_floats(
        &self,
        from: Position,
        to: Position,
        used: f32,
        floats: &mut dyn LineFloats,
        line: &mut LineBreak,
    ) {
        for (index, range) in self.paragraph.pieces(from, to) {
            let item = &self.paragraph.items[index];
            if item.kind != ItemKind::Float {
                continue;
            }
            let at = Position {
                item: index,
                offset: range.start,
            };
            let before = self.paragraph.measure(self.metrics, from, at);
            let mut hanging = self.paragraph.trailing_space(self.metrics, from, at);
            if hanging + FIT_EPSILON >= before {
                hanging += line.trailing_space;
            }
            let committed = used + before - hanging;
            // Floats keep their document order: once one waits, the rest do.
            if line.deferred_floats.is_empty()
                && committed + item.width <= line.available_width + FIT_EPSILON
            {
                line.available_width = floats.place_on_line(item.box_id, item.width);
                line.placed_floats.push(item.box_id);
            } else {
                line.deferred_floats.push(item.box_id);
            }
        }
    }

    /// [§ 4.1.2 Phase II: Trimming and Positioning](https://www.w3.org/TR/css-text-3/#white-space-phase-2)
    ///
    /// "A sequence of collapsible spaces at the beginning of a line is removed."
    fn skip_leading_spaces(&self, mut at: Position) -> Position {
        let paragraph = self.paragraph;
        while let Some(item) = paragraph.items.get(at.item) {
            if item.kind != ItemKind::Text || !item.style.white_space.collapses_spaces() {
                return at;
            }
            let offset = at.offset.clamp(item.range.start, item.range.end);
            let rest = &paragraph.text[offset..item.range.end];
            let kept = rest.trim_start_matches(' ');
            if !kept.is_empty() {
                at.offset = item.range.end - kept.len();
                return at;
            }
            at = Position {
                item: at.item + 1,
                offset: item.range.end,
            };
        }
        paragraph.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ComputedStyle, Float};
    use crate::text::metrics::FixedWidthMetrics;
    use crate::tree::{BoxKind, BoxTree};

    const METRICS: FixedWidthMetrics = FixedWidthMetrics::new(8.0);

    #[derive(Default)]
    struct RecordingFloats {
        available: f32,
        placed: Vec<BoxId>,
    }

    impl LineFloats for RecordingFloats {
        fn place_on_line(&mut self, box_id: BoxId, width: f32) -> f32 {
            self.placed.push(box_id);
            self.available -= width;
            self.available
        }
    }

    fn paragraph(text: &str, style: ComputedStyle) -> Paragraph {
        let mut tree = BoxTree::new();
        let block = tree.create(BoxKind::Block, ComputedStyle::default());
        let id = tree.create(BoxKind::Text(text.to_string()), style);
        tree.append_child(block, id).expect("append");
        Paragraph::build(&tree, block, 300.0, &METRICS)
    }

    fn lines(paragraph: &Paragraph, available: f32, limit: Option<u32>) -> Vec<(String, f32)> {
        let mut breaker = LineBreaker::new(paragraph, &METRICS, limit);
        let mut floats = RecordingFloats::default();
        let mut at = paragraph.start();
        let mut out = Vec::new();
        while let Some(line) = breaker.next_line(at, available, &mut floats) {
            let text: String = paragraph.text[line.start.offset..line.end.offset]
                .chars()
                .filter(|c| *c != '\u{AD}')
                .collect();
            out.push((text, line.width));
            at = line.end;
        }
        out
    }

    #[test]
    fn test_greedy_fill_hangs_trailing_space() {
        let p = paragraph("aa bb cc dd", ComputedStyle::default());
        assert_eq!(
            lines(&p, 48.0, None),
            vec![("aa bb ".to_string(), 40.0), ("cc dd".to_string(), 40.0)]
        );
    }

    #[test]
    fn test_overlong_word_overflows_its_own_line() {
        let p = paragraph("abcdefgh ij", ComputedStyle::default());
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let line = breaker
            .next_line(p.start(), 32.0, &mut RecordingFloats::default())
            .expect("line");
        assert!(line.overflows);
        assert_eq!(line.width, 64.0);
    }

    #[test]
    fn test_overflow_wrap_anywhere_splits_between_characters() {
        let style = ComputedStyle {
            overflow_wrap: OverflowWrap::Anywhere,
            ..ComputedStyle::default()
        };
        let p = paragraph("abcdefgh", style);
        let result = lines(&p, 32.0, None);
        assert_eq!(result, vec![("abcd".to_string(), 32.0), ("efgh".to_string(), 32.0)]);
    }

    #[test]
    fn test_forced_break_ends_line() {
        let style = ComputedStyle {
            white_space: crate::style::WhiteSpace::PreLine,
            ..ComputedStyle::default()
        };
        let p = paragraph("aa\nbb", style);
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let line = breaker
            .next_line(p.start(), 300.0, &mut RecordingFloats::default())
            .expect("line");
        assert!(line.forced);
        assert_eq!(line.width, 16.0);
    }

    #[test]
    fn test_hyphenated_line_counts_the_hyphen() {
        let p = paragraph("aa\u{AD}bb\u{AD}cc", ComputedStyle::default());
        assert_eq!(
            lines(&p, 24.0, None),
            vec![
                ("aa".to_string(), 24.0),
                ("bb".to_string(), 24.0),
                ("cc".to_string(), 16.0),
            ]
        );
    }

    #[test]
    fn test_consecutive_hyphen_limit_suppresses_opportunity() {
        let p = paragraph("aa\u{AD}bb\u{AD}cc", ComputedStyle::default());
        assert_eq!(
            lines(&p, 24.0, Some(1)),
            vec![("aa".to_string(), 24.0), ("bbcc".to_string(), 32.0)]
        );
    }

    fn paragraph_with_float(float_width: f32) -> (Paragraph, BoxId) {
        let mut tree = BoxTree::new();
        let block = tree.create(BoxKind::Block, ComputedStyle::default());
        let before = tree.create(BoxKind::Text("aa ".to_string()), ComputedStyle::default());
        let float = tree.create(
            BoxKind::Block,
            ComputedStyle {
                float: Float::Left,
                ..ComputedStyle::default()
            },
        );
        tree[float].set_logical_size(float_width, 10.0);
        let after = tree.create(BoxKind::Text("bb".to_string()), ComputedStyle::default());
        for child in [before, float, after] {
            tree.append_child(block, child).expect("append");
        }
        (Paragraph::build(&tree, block, 300.0, &METRICS), float)
    }

    #[test]
    fn test_float_that_fits_is_placed_on_the_line() {
        let (p, float) = paragraph_with_float(20.0);
        let mut floats = RecordingFloats {
            available: 100.0,
            placed: Vec::new(),
        };
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let line = breaker.next_line(p.start(), 100.0, &mut floats).expect("line");
        assert_eq!(line.placed_floats, vec![float]);
        assert_eq!(line.available_width, 80.0);
        assert!(line.deferred_floats.is_empty());
    }

    #[test]
    fn test_float_that_does_not_fit_is_deferred() {
        let (p, float) = paragraph_with_float(40.0);
        let mut floats = RecordingFloats {
            available: 48.0,
            placed: Vec::new(),
        };
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let line = breaker.next_line(p.start(), 48.0, &mut floats).expect("line");
        assert_eq!(line.deferred_floats, vec![float]);
        assert!(floats.placed.is_empty());
        assert_eq!(line.available_width, 48.0);
    }

    #[test]
    fn test_float_fit_ignores_hanging_space_before_it() {
        // "aa" is 16 wide; the space after it hangs, so 32 more fits in 48.
        let (p, float) = paragraph_with_float(32.0);
        let mut floats = RecordingFloats {
            available: 48.0,
            placed: Vec::new(),
        };
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let line = breaker.next_line(p.start(), 48.0, &mut floats).expect("line");
        assert_eq!(line.placed_floats, vec![float]);
        assert_eq!(line.available_width, 16.0);
        assert_eq!(line.width, 16.0);
    }

    #[test]
    fn test_leading_float_is_placed_before_its_text_is_measured() {
        let mut tree = BoxTree::new();
        let block = tree.create(BoxKind::Block, ComputedStyle::default());
        let float = tree.create(
            BoxKind::Block,
            ComputedStyle {
                float: Float::Left,
                ..ComputedStyle::default()
            },
        );
        tree[float].set_logical_size(96.0, 20.0);
        let text = tree.create(BoxKind::Text("x".to_string()), ComputedStyle::default());
        for child in [float, text] {
            tree.append_child(block, child).expect("append");
        }
        let p = Paragraph::build(&tree, block, 100.0, &METRICS);

        let mut floats = RecordingFloats {
            available: 100.0,
            placed: Vec::new(),
        };
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let first = breaker.next_line(p.start(), 100.0, &mut floats).expect("line");
        assert_eq!(first.placed_floats, vec![float]);
        assert_eq!(first.available_width, 4.0);
        assert_eq!(first.width, 0.0);
        assert!(!first.overflows);

        // The text no longer fits beside the float and starts the next line.
        let second = breaker.next_line(first.end, 100.0, &mut floats).expect("line");
        assert!(second.placed_floats.is_empty());
        assert_eq!(second.width, 8.0);
        assert_eq!(floats.placed, vec![float]);
    }

    #[test]
    fn test_line_carries_the_paragraph_direction() {
        let style = ComputedStyle {
            direction: Direction::Rtl,
            ..ComputedStyle::default()
        };
        let mut tree = BoxTree::new();
        let block = tree.create(BoxKind::Block, style.clone());
        let id = tree.create(BoxKind::Text("abc".to_string()), style);
        tree.append_child(block, id).expect("append");
        let p = Paragraph::build(&tree, block, 300.0, &METRICS);
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let line = breaker
            .next_line(p.start(), 300.0, &mut RecordingFloats::default())
            .expect("line");
        assert_eq!(line.direction, Direction::Rtl);

        let p = paragraph("abc", ComputedStyle::default());
        let mut breaker = LineBreaker::new(&p, &METRICS, None);
        let line = breaker
            .next_line(p.start(), 300.0, &mut RecordingFloats::default())
            .expect("line");
        assert_eq!(line.direction, Direction::Ltr);
    }
}
