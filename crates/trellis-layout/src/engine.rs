//! One layout pass over a whole box tree.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;
use trellis_common::TreeError;

use crate::block::{Containing, LayoutContext};
use crate::config::LayoutConfig;
use crate::geometry::Rect;
use crate::sizing::WidthMode;
use crate::stats::{LayoutStats, RepaintScheduler};
use crate::text::FontMetrics;
use crate::tree::{BoxId, BoxKind, BoxTree};

/// What a layout pass produced beyond the geometry stored on the boxes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOutput {
    /// Counters for the pass.
    pub stats: LayoutStats,
    /// Root-space rectangles that changed since the previous pass.
    pub repaint: Vec<Rect>,
    /// Page or column rectangles, in root coordinates. Empty when the flow
    /// is continuous.
    pub fragments: Vec<Rect>,
    /// The root's scrollable extent, in root coordinates.
    pub layout_overflow: Rect,
    /// The root's ink extent, in root coordinates.
    pub visual_overflow: Rect,
}

/// Lay out every box in `tree` against `config`'s viewport.
///
/// Anonymous block wrapping runs first. The pass is idempotent: laying out
/// an unchanged tree again yields the same rectangles and no repaint.
///
/// # Errors
/// Returns [`TreeError::NoRoot`] if the tree has no root box.
pub fn layout(
    tree: &mut BoxTree,
    config: &LayoutConfig,
    metrics: &dyn FontMetrics,
) -> Result<LayoutOutput, TreeError> {
    let root = tree.root().ok_or(TreeError::NoRoot)?;

    // STEP 1: Structural fixups, then remember where everything was.
    tree.normalize();
    let before = absolute_rects(tree, root);

    // STEP 2: Lay out from the root.
    let writing_mode = tree[root].style.writing_mode;
    let (inline_size, block_size) = if writing_mode.is_horizontal() {
        (config.viewport.width, config.viewport.height)
    } else {
        (config.viewport.height, config.viewport.width)
    };
    let mut ctx = LayoutContext::new(tree, config, metrics, writing_mode);
    let width = ctx.pagination.column_width(inline_size);
    let _ = ctx.layout_block(
        root,
        Containing {
            width,
            height: Some(block_size),
        },
        WidthMode::Fill,
        None,
    );
    let margins = ctx.tree[root].logical_margins();
    ctx.tree[root].set_logical_location(margins.line_left, margins.block_start);

    // STEP 3: Fragments.
    let root_height = ctx.tree[root].logical_height() + margins.block_sum();
    let mut stats = ctx.stats;
    stats.pages = ctx.pagination.page_count(root_height);
    let fragments: Vec<Rect> = ctx
        .pagination
        .fragments(root_height, width)
        .into_iter()
        .map(|r| Rect::from_logical(r.x, r.y, r.width, r.height, writing_mode))
        .collect();
    if !fragments.is_empty() || tree[root].rare_data().is_some() {
        tree[root].ensure_rare_data().fragments.clone_from(&fragments);
    }

    // STEP 4: Repaint what moved.
    let after = absolute_rects(tree, root);
    let mut repaint = RepaintScheduler::default();
    for (id, new) in &after {
        repaint.box_changed(before.get(id).copied().unwrap_or_default(), *new);
    }
    for (id, old) in &before {
        if !after.contains_key(id) {
            repaint.box_changed(*old, Rect::default());
        }
    }

    let frame = tree[root].frame();
    let layout_overflow = tree[root].layout_overflow_rect().translate(frame.x, frame.y);
    let visual_overflow = tree[root].visual_overflow_rect().translate(frame.x, frame.y);
    debug!(
        target: "trellis::layout",
        "laid out {} boxes, {} lines, {} relayouts, {} floats, {} struts, {} pages",
        stats.boxes_laid_out,
        stats.lines_built,
        stats.relayouts,
        stats.floats_placed,
        stats.pagination_struts,
        stats.pages
    );
    #[cfg(feature = "layout-trace")]
    for id in tree.descendants(root) {
        log::trace!(target: "trellis::layout", "{id} {:?}", tree[id].frame());
    }

    Ok(LayoutOutput {
        stats,
        repaint: repaint.take(),
        fragments,
        layout_overflow,
        visual_overflow,
    })
}

/// Border boxes of every laid-out box under `root`, in root coordinates.
///
/// Frames are relative to the containing block's border box. Boxes inside
/// an inline box are positioned in the enclosing block's space, so inline
/// boxes pass their origin through unchanged.
#[must_use]
pub fn absolute_rects(tree: &BoxTree, root: BoxId) -> HashMap<BoxId, Rect> {
    let mut rects = HashMap::new();
    let mut pending = vec![(root, 0.0_f32, 0.0_f32)];
    while let Some((id, origin_x, origin_y)) = pending.pop() {
        let node = &tree[id];
        if !node.is_laid_out() {
            continue;
        }
        let rect = node.frame().translate(origin_x, origin_y);
        let _ = rects.insert(id, rect);
        let (child_x, child_y) = if node.kind == BoxKind::Inline {
            (origin_x, origin_y)
        } else {
            (rect.x, rect.y)
        };
        pending.extend(tree.children(id).iter().map(|child| (*child, child_x, child_y)));
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Fragmentation, Viewport};
    use crate::style::{ComputedStyle, Length};
    use crate::text::FixedWidthMetrics;

    const METRICS: FixedWidthMetrics = FixedWidthMetrics::new(8.0);

    fn sized(height: f32) -> ComputedStyle {
        ComputedStyle {
            height: Length::Px(height),
            ..ComputedStyle::default()
        }
    }

    #[test]
    fn test_layout_without_root_fails() {
        let mut tree = BoxTree::new();
        assert_eq!(
            layout(&mut tree, &LayoutConfig::default(), &METRICS),
            Err(TreeError::NoRoot)
        );
    }

    #[test]
    fn test_second_pass_needs_no_repaint() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let child = tree.create(BoxKind::Block, sized(40.0));
        tree.append_child(root, child).expect("append");

        let first = layout(&mut tree, &LayoutConfig::default(), &METRICS).expect("layout");
        assert!(!first.repaint.is_empty());
        let frame = tree[child].frame();
        let second = layout(&mut tree, &LayoutConfig::default(), &METRICS).expect("layout");
        assert!(second.repaint.is_empty());
        assert_eq!(tree[child].frame(), frame);
    }

    #[test]
    fn test_pages_are_reported_as_fragments() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let tall = tree.create(BoxKind::Block, sized(250.0));
        tree.append_child(root, tall).expect("append");
        let config = LayoutConfig {
            viewport: Viewport {
                width: 200.0,
                height: 100.0,
            },
            fragmentation: Fragmentation::Pages {
                height: 100.0,
                gap: 10.0,
            },
            ..LayoutConfig::default()
        };

        let output = layout(&mut tree, &config, &METRICS).expect("layout");
        assert_eq!(output.stats.pages, 3);
        assert_eq!(output.fragments.len(), 3);
        assert_eq!(
            tree[root].rare_data().map(|rare| rare.fragments.len()),
            Some(3)
        );
    }

    #[test]
    fn test_absolute_rects_accumulate_parent_offsets() {
        let mut tree = BoxTree::new();
        let root = tree.create(BoxKind::Block, ComputedStyle::default());
        tree.set_root(root).expect("root");
        let first = tree.create(BoxKind::Block, sized(30.0));
        let second = tree.create(BoxKind::Block, ComputedStyle::default());
        let nested = tree.create(BoxKind::Block, sized(10.0));
        tree.append_child(root, first).expect("append");
        tree.append_child(root, second).expect("append");
        tree.append_child(second, nested).expect("append");

        let _ = layout(&mut tree, &LayoutConfig::default(), &METRICS).expect("layout");
        let rects = absolute_rects(&tree, root);
        assert_eq!(rects[&nested], Rect::new(0.0, 30.0, 800.0, 10.0));
    }
}
