//! Margin collapsing.
//!
//! [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
//!
//! "In CSS, the adjoining margins of two or more boxes (which might or might
//! not be siblings) can combine to form a single margin. Margins that combine
//! this way are said to collapse, and the resulting combined margin is called
//! a collapsed margin."
//!
//! A [`MarginState`] lives for the duration of one block's child loop. It
//! carries the largest positive and largest negative margin seen at the
//! current collapsing boundary, so each new adjoining margin is folded in
//! without rescanning earlier siblings.

use serde::Serialize;

/// A set of adjoining margins reduced to its two extremes.
///
/// [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths. In the case of negative
/// margins, the maximum of the absolute values of the negative adjoining
/// margins is deducted from the maximum of the positive adjoining margins."
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CollapsedMargin {
    /// Largest positive margin in the set (zero if none).
    pub positive: f32,
    /// Largest absolute value among the negative margins (zero if none).
    pub negative: f32,
}

impl CollapsedMargin {
    /// A set holding the single margin `value`.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self {
            positive: value.max(0.0),
            negative: (-value).max(0.0),
        }
    }

    /// The union of two adjoining sets.
    #[must_use]
    pub fn adjoin(&self, other: &Self) -> Self {
        Self {
            positive: self.positive.max(other.positive),
            negative: self.negative.max(other.negative),
        }
    }

    /// `max(positives) - max(|negatives|)`
    #[must_use]
    pub fn solve(&self) -> f32 {
        self.positive - self.negative
    }
}

/// Collapsed margin extremes on both block-axis sides of a box, after the
/// box's own margins have collapsed with any children they adjoin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarginValues {
    /// Margins collapsing through the block-start side.
    pub before: CollapsedMargin,
    /// Margins collapsing through the block-end side.
    pub after: CollapsedMargin,
}

impl MarginValues {
    /// Values for a box whose margins collapse with nothing inside it.
    #[must_use]
    pub fn from_margins(before: f32, after: f32) -> Self {
        Self {
            before: CollapsedMargin::new(before),
            after: CollapsedMargin::new(after),
        }
    }

    /// Collapsed before margin as a single length.
    #[must_use]
    pub fn effective_before(&self) -> f32 {
        self.before.solve()
    }

    /// Collapsed after margin as a single length.
    #[must_use]
    pub fn effective_after(&self) -> f32 {
        self.after.solve()
    }

    /// Both sides folded together, as a self-collapsing box presents them.
    #[must_use]
    pub fn through(&self) -> CollapsedMargin {
        self.before.adjoin(&self.after)
    }
}

/// Properties of the block that decide whether its margins can collapse
/// with its children's at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollapseFlags {
    /// The block is the root, establishes a new block formatting context,
    /// or is otherwise barred from collapsing with its contents.
    pub isolates_children: bool,
    /// Legacy body/table-cell behavior: the first in-flow child's before
    /// margin is dropped.
    pub quirk_container: bool,
    /// The block's block-size is `auto` and its minimum is zero, so the
    /// last child's after margin can collapse through the block's bottom.
    pub auto_height: bool,
}

/// The margins of one child, as presented to its parent's collapsing state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChildMargins {
    /// The child's collapsed margin values.
    pub values: MarginValues,
    /// The child has zero height and nothing separating its own margins.
    pub self_collapsing: bool,
}

/// [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// Per-block collapsing state. "At before side" and "at after side" are
/// separate flags rather than one phase enum: a block made of nothing but
/// self-collapsing children is at both sides at once.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginState {
    can_collapse_before_with_children: bool,
    can_collapse_after_with_children: bool,
    quirk_container: bool,
    at_before_side: bool,
    at_after_side: bool,
    positive: f32,
    negative: f32,
    block: MarginValues,
    last_child_collapsed_with_before: bool,
}

impl MarginState {
    /// Start collapsing for a block with the given before/after border plus
    /// padding and its own (uncollapsed) margin values.
    ///
    /// "The top margin of a box is adjoining to the top margin of its first
    /// in-flow child if the box has no top border, no top padding, and the
    /// child has no clearance."
    #[must_use]
    pub fn begin_block(
        before_border_padding: f32,
        after_border_padding: f32,
        own: MarginValues,
        flags: CollapseFlags,
    ) -> Self {
        let can_collapse_with_children = !flags.isolates_children;
        let can_collapse_before_with_children =
            can_collapse_with_children && before_border_padding == 0.0;
        // "...bottom margin of a last in-flow child and bottom margin of its
        // parent if the parent has 'auto' computed height"
        let can_collapse_after_with_children =
            can_collapse_with_children && after_border_padding == 0.0 && flags.auto_height;
        let (positive, negative) = if can_collapse_before_with_children {
            (own.before.positive, own.before.negative)
        } else {
            (0.0, 0.0)
        };
        Self {
            can_collapse_before_with_children,
            can_collapse_after_with_children,
            quirk_container: flags.quirk_container,
            at_before_side: true,
            at_after_side: false,
            positive,
            negative,
            block: own,
            last_child_collapsed_with_before: false,
        }
    }

    /// Still collapsing with the block's own before margin.
    #[must_use]
    pub const fn can_collapse_with_margin_before(&self) -> bool {
        self.at_before_side && self.can_collapse_before_with_children
    }

    /// Collapsing through the block's own after margin.
    #[must_use]
    pub const fn can_collapse_with_margin_after(&self) -> bool {
        self.at_after_side && self.can_collapse_after_with_children
    }

    /// True until the first child that is not self-collapsing.
    #[must_use]
    pub const fn at_before_side(&self) -> bool {
        self.at_before_side
    }

    /// The pending collapsed margin at the current boundary.
    #[must_use]
    pub fn margin(&self) -> f32 {
        self.positive - self.negative
    }

    /// The pending margin set at the current boundary.
    #[must_use]
    pub const fn pending(&self) -> CollapsedMargin {
        CollapsedMargin {
            positive: self.positive,
            negative: self.negative,
        }
    }

    /// The block's own margin values as collapsing has updated them so far.
    #[must_use]
    pub const fn block_values(&self) -> MarginValues {
        self.block
    }

    /// Drop the pending margin. A forced break truncates margins at the
    /// fragmentation boundary.
    pub const fn clear_margin(&mut self) {
        self.positive = 0.0;
        self.negative = 0.0;
    }

    /// Guess where a child will land before its own margins are known.
    ///
    /// Uses the child's uncollapsed before margin; children laid out at the
    /// estimate only need relayout when the real position differs.
    #[must_use]
    pub fn estimate_logical_top(&self, logical_height: f32, child_before: CollapsedMargin) -> f32 {
        if self.can_collapse_with_margin_before() {
            return logical_height;
        }
        logical_height + self.positive.max(child_before.positive)
            - self.negative.max(child_before.negative)
    }

    /// Collapse a laid-out child's margins into the running state, advancing
    /// `logical_height` past the collapsed gap, and return the child's
    /// logical top.
    pub fn collapse_margins(&mut self, logical_height: &mut f32, child: ChildMargins) -> f32 {
        let mut before = child.values.before;
        if self.quirk_container && self.at_before_side && !child.self_collapsing {
            before = CollapsedMargin::default();
        }
        // A self-collapsing child's before and after margins adjoin each
        // other and everything around them.
        let combined = if child.self_collapsing {
            before.adjoin(&child.values.after)
        } else {
            before
        };

        self.last_child_collapsed_with_before = self.can_collapse_with_margin_before();
        if self.last_child_collapsed_with_before {
            self.block.before = self.block.before.adjoin(&combined);
        }

        let mut logical_top = *logical_height;
        if child.self_collapsing {
            let collapsed_before = self.pending().adjoin(&before);
            self.positive = self.positive.max(combined.positive);
            self.negative = self.negative.max(combined.negative);
            if !self.can_collapse_with_margin_before() {
                // Position the child as if its after margin were not there.
                logical_top = *logical_height + collapsed_before.solve();
            }
        } else {
            if !self.at_before_side || !self.can_collapse_before_with_children {
                *logical_height +=
                    self.positive.max(combined.positive) - self.negative.max(combined.negative);
                logical_top = *logical_height;
            }
            self.positive = child.values.after.positive;
            self.negative = child.values.after.negative;
            self.at_before_side = false;
        }
        logical_top
    }

    /// [§ 9.5.2 Controlling flow next to floats](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "Clearance inhibits margin collapsing and acts as spacing above the
    /// margin-top of an element."
    ///
    /// Moves a child that collapsed to `logical_top` down to `clear_to`.
    /// `saved_before` is the block's before margin set from before the child
    /// was collapsed in; a cleared child no longer adjoins the block's top,
    /// so that set is restored. Returns the child's new logical top.
    pub fn apply_clearance(
        &mut self,
        logical_height: &mut f32,
        logical_top: f32,
        clear_to: f32,
        child: ChildMargins,
        saved_before: CollapsedMargin,
    ) -> f32 {
        if clear_to <= logical_top {
            return logical_top;
        }
        if child.self_collapsing {
            let through = child.values.through();
            self.positive = through.positive;
            self.negative = through.negative;
            *logical_height = clear_to;
        } else {
            *logical_height += clear_to - logical_top;
        }
        if self.last_child_collapsed_with_before {
            self.block.before = saved_before;
            self.last_child_collapsed_with_before = false;
        }
        self.at_before_side = false;
        clear_to
    }

    /// Close the block: add the pending margin when it cannot collapse
    /// through the block's after side, add after border and padding, and
    /// return the block's final margin values.
    #[must_use]
    pub fn finalize_block(
        &mut self,
        logical_height: &mut f32,
        before_border_padding: f32,
        after_border_padding: f32,
    ) -> MarginValues {
        self.at_after_side = true;
        if !self.can_collapse_with_margin_after() && !self.can_collapse_with_margin_before() {
            *logical_height += self.margin();
        }
        *logical_height += after_border_padding;
        *logical_height = logical_height.max(before_border_padding + after_border_padding);

        if self.can_collapse_with_margin_after() && !self.can_collapse_with_margin_before() {
            self.block.after = self.block.after.adjoin(&self.pending());
        }
        self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn child(before: f32, after: f32) -> ChildMargins {
        ChildMargins {
            values: MarginValues::from_margins(before, after),
            self_collapsing: false,
        }
    }

    fn flags() -> CollapseFlags {
        CollapseFlags {
            isolates_children: false,
            quirk_container: false,
            auto_height: true,
        }
    }

    #[test]
    fn test_sibling_margins_take_the_larger() {
        // A bordered container so nothing collapses through its edges.
        let mut state = MarginState::begin_block(1.0, 1.0, MarginValues::default(), flags());
        let mut height = 1.0;
        let first = state.collapse_margins(&mut height, child(0.0, 10.0));
        assert_eq!(first, 1.0);
        height += 20.0;
        let second = state.collapse_margins(&mut height, child(15.0, 0.0));
        assert_eq!(second - 21.0, 15.0);
    }

    #[test]
    fn test_positive_and_negative_margins_offset() {
        let mut state = MarginState::begin_block(1.0, 1.0, MarginValues::default(), flags());
        let mut height = 1.0;
        let _ = state.collapse_margins(&mut height, child(0.0, 20.0));
        height += 10.0;
        let top = state.collapse_margins(&mut height, child(-30.0, 0.0));
        assert_eq!(top, 11.0 - 10.0);
    }

    #[test]
    fn test_first_child_margin_collapses_through_parent_top() {
        let own = MarginValues::from_margins(5.0, 0.0);
        let mut state = MarginState::begin_block(0.0, 0.0, own, flags());
        let mut height = 0.0;
        let top = state.collapse_margins(&mut height, child(12.0, 0.0));
        assert_eq!(top, 0.0, "child sits at the parent's border edge");
        assert_eq!(state.block_values().effective_before(), 12.0);
    }

    #[test]
    fn test_border_separates_parent_and_child_margins() {
        let own = MarginValues::from_margins(5.0, 0.0);
        let mut state = MarginState::begin_block(2.0, 0.0, own, flags());
        let mut height = 2.0;
        let top = state.collapse_margins(&mut height, child(12.0, 0.0));
        assert_eq!(top, 14.0);
        assert_eq!(state.block_values().effective_before(), 5.0);
    }

    #[test]
    fn test_self_collapsing_child_folds_into_running_margin() {
        let mut state = MarginState::begin_block(1.0, 1.0, MarginValues::default(), flags());
        let mut height = 1.0;
        let _ = state.collapse_margins(&mut height, child(0.0, 10.0));
        height += 10.0;
        let empty = ChildMargins {
            values: MarginValues::from_margins(25.0, 5.0),
            self_collapsing: true,
        };
        let _ = state.collapse_margins(&mut height, empty);
        assert_eq!(height, 11.0, "self-collapsing child adds no height");
        let top = state.collapse_margins(&mut height, child(3.0, 0.0));
        assert_eq!(top, 11.0 + 25.0);
    }

    #[test]
    fn test_last_child_margin_collapses_through_parent_bottom() {
        let mut state = MarginState::begin_block(0.0, 0.0, MarginValues::default(), flags());
        let mut height = 0.0;
        let _ = state.collapse_margins(&mut height, child(0.0, 18.0));
        height += 40.0;
        let values = state.finalize_block(&mut height, 0.0, 0.0);
        assert_eq!(height, 40.0);
        assert_eq!(values.effective_after(), 18.0);
    }

    #[test]
    fn test_isolated_block_keeps_child_margins_inside() {
        let isolated = CollapseFlags {
            isolates_children: true,
            ..flags()
        };
        let mut state = MarginState::begin_block(0.0, 0.0, MarginValues::default(), isolated);
        let mut height = 0.0;
        let top = state.collapse_margins(&mut height, child(7.0, 9.0));
        assert_eq!(top, 7.0);
        height += 10.0;
        let values = state.finalize_block(&mut height, 0.0, 0.0);
        assert_eq!(height, 26.0);
        assert_eq!(values, MarginValues::default());
    }

    #[test]
    fn test_quirk_container_drops_first_child_margin() {
        let quirky = CollapseFlags {
            isolates_children: true,
            quirk_container: true,
            auto_height: true,
        };
        let mut state = MarginState::begin_block(0.0, 0.0, MarginValues::default(), quirky);
        let mut height = 0.0;
        let top = state.collapse_margins(&mut height, child(16.0, 16.0));
        assert_eq!(top, 0.0);
    }

    #[test]
    fn test_clearance_stops_collapsing_with_parent_top() {
        let own = MarginValues::from_margins(4.0, 0.0);
        let mut state = MarginState::begin_block(0.0, 0.0, own, flags());
        let saved = state.block_values().before;
        let mut height = 0.0;
        let c = child(10.0, 0.0);
        let top = state.collapse_margins(&mut height, c);
        let cleared = state.apply_clearance(&mut height, top, 50.0, c, saved);
        assert_eq!(cleared, 50.0);
        assert_eq!(height, 50.0);
        assert_eq!(state.block_values().effective_before(), 4.0);
        assert!(!state.can_collapse_with_margin_before());
    }

    #[quickcheck]
    fn prop_adjoining_margins_solve_to_formula(margins: Vec<i16>) -> bool {
        let margins: Vec<f32> = margins.into_iter().map(f32::from).collect();
        let collapsed = margins
            .iter()
            .fold(CollapsedMargin::default(), |set, m| set.adjoin(&CollapsedMargin::new(*m)));
        let positive = margins.iter().copied().fold(0.0_f32, f32::max);
        let negative = margins.iter().map(|m| -m).fold(0.0_f32, f32::max);
        collapsed.solve() == positive - negative
    }

    #[quickcheck]
    fn prop_adjoin_is_order_independent(a: i16, b: i16, c: i16) -> bool {
        let [a, b, c] = [a, b, c].map(|m| CollapsedMargin::new(f32::from(m)));
        a.adjoin(&b).adjoin(&c) == c.adjoin(&a).adjoin(&b)
    }
}
