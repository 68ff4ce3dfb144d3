//! A static interval tree over half-open `[low, high)` ranges.
//!
//! Entries are sorted by `low` and the tree is implicit: the node for a
//! range of the sorted array sits at the range's midpoint, with its left and
//! right subtrees on either side. Each node stores the largest `high` in its
//! subtree, which lets a query skip whole subtrees that end above it.
//!
//! The tree is immutable once built; owners rebuild it after mutation.

/// One stored interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    /// Inclusive start.
    pub low: f32,
    /// Exclusive end.
    pub high: f32,
    /// Payload returned by queries.
    pub value: T,
}

/// Interval tree with `O(log n + k)` overlap queries.
#[derive(Debug, Clone)]
pub struct IntervalTree<T> {
    intervals: Vec<Interval<T>>,
    max_high: Vec<f32>,
}

impl<T: Copy> IntervalTree<T> {
    /// Build a tree from unordered intervals. Empty intervals are dropped:
    /// nothing can overlap them.
    #[must_use]
    pub fn build(intervals: impl IntoIterator<Item = Interval<T>>) -> Self {
        let mut intervals: Vec<_> = intervals.into_iter().filter(|i| i.high > i.low).collect();
        intervals.sort_by(|a, b| a.low.total_cmp(&b.low));
        let mut max_high = vec![f32::NEG_INFINITY; intervals.len()];
        let _ = Self::fill_max_high(&intervals, &mut max_high, 0, intervals.len());
        Self {
            intervals,
            max_high,
        }
    }

    fn fill_max_high(
        intervals: &[Interval<T>],
        max_high: &mut [f32],
        start: usize,
        end: usize,
    ) -> f32 {
        if start >= end {
            return f32::NEG_INFINITY;
        }
        let mid = start + (end - start) / 2;
        let left = Self::fill_max_high(intervals, max_high, start, mid);
        let right = Self::fill_max_high(intervals, max_high, mid + 1, end);
        let max = intervals[mid].high.max(left).max(right);
        max_high[mid] = max;
        max
    }

    /// Number of stored intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Visit every interval overlapping `[low, high)`.
    pub fn for_each_overlapping(&self, low: f32, high: f32, mut visit: impl FnMut(&Interval<T>)) {
        if high <= low {
            return;
        }
        self.walk(0, self.intervals.len(), low, &|start| start < high, &mut visit);
    }

    /// Visit every interval containing `point`.
    pub fn for_each_containing(&self, point: f32, mut visit: impl FnMut(&Interval<T>)) {
        self.walk(0, self.intervals.len(), point, &|start| start <= point, &mut visit);
    }

    /// Intervals overlapping `[low, high)`, in ascending `low` order.
    #[must_use]
    pub fn overlapping(&self, low: f32, high: f32) -> Vec<T> {
        let mut out = Vec::new();
        self.for_each_overlapping(low, high, |interval| out.push(interval.value));
        out
    }

    // Every match must end after `after` and start where `starts_in` allows.
    fn walk(
        &self,
        start: usize,
        end: usize,
        after: f32,
        starts_in: &dyn Fn(f32) -> bool,
        visit: &mut dyn FnMut(&Interval<T>),
    ) {
        if start >= end {
            return;
        }
        let mid = start + (end - start) / 2;
        if self.max_high[mid] <= after {
            return;
        }
        self.walk(start, mid, after, starts_in, visit);
        let node = &self.intervals[mid];
        if !starts_in(node.low) {
            // Everything to the right starts even later.
            return;
        }
        if node.high > after {
            visit(node);
        }
        self.walk(mid + 1, end, after, starts_in, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn interval(low: f32, high: f32, value: usize) -> Interval<usize> {
        Interval { low, high, value }
    }

    #[test]
    fn test_overlap_is_half_open() {
        let tree = IntervalTree::build([interval(0.0, 10.0, 0), interval(10.0, 20.0, 1)]);
        assert_eq!(tree.overlapping(10.0, 11.0), vec![1]);
        assert_eq!(tree.overlapping(9.0, 10.0), vec![0]);
        assert!(tree.overlapping(20.0, 30.0).is_empty());
    }

    #[test]
    fn test_point_query_includes_start_excludes_end() {
        let tree = IntervalTree::build([interval(0.0, 10.0, 0), interval(5.0, 15.0, 1)]);
        let mut hits = Vec::new();
        tree.for_each_containing(10.0, |i| hits.push(i.value));
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_empty_intervals_are_dropped() {
        let tree = IntervalTree::build([interval(3.0, 3.0, 0)]);
        assert!(tree.is_empty());
    }

    #[quickcheck]
    fn prop_matches_linear_scan(raw: Vec<(u8, u8)>, query: (u8, u8)) -> bool {
        let intervals: Vec<_> = raw
            .iter()
            .enumerate()
            .map(|(i, (a, len))| interval(f32::from(*a), f32::from(*a) + f32::from(*len), i))
            .collect();
        let (low, high) = (f32::from(query.0), f32::from(query.0) + f32::from(query.1));
        let tree = IntervalTree::build(intervals.clone());
        let mut expected: Vec<usize> = intervals
            .iter()
            .filter(|i| high > low && i.high > i.low && i.low < high && i.high > low)
            .map(|i| i.value)
            .collect();
        let mut actual = tree.overlapping(low, high);
        expected.sort_unstable();
        actual.sort_unstable();
        expected == actual
    }
}
