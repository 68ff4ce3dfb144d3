//! Integration tests for whole layout passes over JSON documents.

use quickcheck_macros::quickcheck;
use trellis_layout::{
    BoxId, BoxTree, FixedWidthMetrics, Fragmentation, LayoutConfig, LayoutOutput, Rect, Viewport,
    absolute_rects, layout, parse_document,
};

const METRICS: FixedWidthMetrics = FixedWidthMetrics::new(8.0);

/// Helper: decode `json` and lay it out in a `width` x 600 viewport.
fn lay_out(json: &str, width: f32) -> (BoxTree, LayoutOutput) {
    lay_out_with(json, config(width))
}

fn lay_out_with(json: &str, config: LayoutConfig) -> (BoxTree, LayoutOutput) {
    let mut tree = parse_document(json, &config).expect("valid document");
    let output = layout(&mut tree, &config, &METRICS).expect("layout");
    (tree, output)
}

fn config(width: f32) -> LayoutConfig {
    LayoutConfig {
        viewport: Viewport {
            width,
            height: 600.0,
        },
        ..LayoutConfig::default()
    }
}

/// Helper: the box the document labelled `name`.
fn named(tree: &BoxTree, name: &str) -> BoxId {
    let root = tree.root().expect("root");
    tree.descendants(root)
        .into_iter()
        .find(|id| tree[*id].name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("no box named {name}"))
}

/// Helper: line-left edge and inline size of each line of `block`.
fn lines(tree: &BoxTree, block: BoxId) -> Vec<(f32, f32)> {
    let arena = tree.inline_boxes();
    arena
        .lines(tree[block].lines)
        .map(|root| (arena[root].logical_left, arena[root].logical_width))
        .collect()
}

/// Helper: top and height of each line of `block`.
fn line_boxes(tree: &BoxTree, block: BoxId) -> Vec<(f32, f32)> {
    let arena = tree.inline_boxes();
    arena
        .lines(tree[block].lines)
        .filter_map(|root| arena[root].root_line())
        .map(|line| (line.line_top, line.line_height()))
        .collect()
}

// ---------------------------------------------------------------------------
// Margin collapsing
//
// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
//
// "When two or more margins collapse, the resulting margin width is the
// maximum of the collapsing margins' widths. In the case of negative
// margins, the maximum of the absolute values of the negative adjoining
// margins is deducted from the maximum of the positive adjoining margins."
// ---------------------------------------------------------------------------

fn siblings(after: f32, before: f32) -> String {
    format!(
        r#"{{ "children": [
            {{ "name": "a", "style": {{ "height": 10, "margin": {{ "block-end": {after} }} }} }},
            {{ "name": "b", "style": {{ "height": 10, "margin": {{ "block-start": {before} }} }} }}
        ] }}"#
    )
}

#[test]
fn test_sibling_margins_collapse_to_larger() {
    let (tree, _) = lay_out(&siblings(10.0, 15.0), 800.0);
    assert_eq!(tree[named(&tree, "b")].frame().y, 25.0);
}

#[test]
fn test_negative_margin_is_deducted_from_positive() {
    let (tree, _) = lay_out(&siblings(20.0, -30.0), 800.0);
    assert_eq!(tree[named(&tree, "b")].frame().y, 0.0);
}

#[test]
fn test_first_child_margin_escapes_parent() {
    let (tree, _) = lay_out(
        r#"{ "children": [
            { "name": "outer", "children": [
                { "name": "inner", "style": { "height": 10, "margin": { "block-start": 12 } } }
            ] }
        ] }"#,
        800.0,
    );
    let rects = absolute_rects(&tree, tree.root().expect("root"));
    assert_eq!(rects[&named(&tree, "outer")].y, 12.0);
    assert_eq!(rects[&named(&tree, "inner")].y, 12.0);
}

#[quickcheck]
fn prop_adjoining_sibling_margins_collapse(after: i8, before: i8) -> bool {
    let (after, before) = (f32::from(after), f32::from(before));
    let (tree, _) = lay_out(&siblings(after, before), 800.0);
    let collapsed = after.max(before).max(0.0) + after.min(before).min(0.0);
    (tree[named(&tree, "b")].frame().y - (10.0 + collapsed)).abs() < 1e-3
}

// ---------------------------------------------------------------------------
// Floats
//
// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//
// "Since a float is not in the flow, non-positioned block boxes created
// before and after the float box flow vertically as if the float did not
// exist. However, the current and subsequent line boxes created next to
// the float are shortened as necessary to make room for the margin box of
// the float."
// ---------------------------------------------------------------------------

#[test]
fn test_lines_beside_float_are_shortened() {
    let (tree, _) = lay_out(
        r#"{ "name": "root", "style": { "width": 300, "line-height": { "px": 40 } }, "children": [
            { "name": "float", "style": { "float": "left", "width": 100, "height": 50 } },
            "aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii jjjj kkkk llll mmmm nnnn oooo pppp"
        ] }"#,
        800.0,
    );
    let root = named(&tree, "root");
    let lines = lines(&tree, root);
    assert!(lines.len() >= 3);
    // Lines at 0 and 40 overlap the 50px float; the line at 80 does not.
    for (left, width) in &lines[..2] {
        assert_eq!(*left, 100.0);
        assert!(left + width <= 300.0);
    }
    assert_eq!(lines[2].0, 0.0);
    assert_eq!(tree[named(&tree, "float")].frame().x, 0.0);
}

#[test]
fn test_second_line_below_float_gets_full_width() {
    // Fifty characters, 400px at 8px each.
    let text = format!("{}aaaaa", "aaaa ".repeat(9));
    assert_eq!(text.chars().count(), 50);
    let json = serde_json::json!({
        "name": "root",
        "style": { "width": 300, "line-height": { "px": 50 } },
        "children": [
            { "style": { "float": "left", "width": 100, "height": 50 } },
            text,
        ]
    })
    .to_string();
    let (tree, _) = lay_out(&json, 800.0);
    let root = named(&tree, "root");
    // Beside the float 200px are free; below it all 300px are.
    assert_eq!(lines(&tree, root), vec![(100.0, 192.0), (0.0, 200.0)]);
    let tops: Vec<f32> = line_boxes(&tree, root).iter().map(|(top, _)| *top).collect();
    assert_eq!(tops, vec![0.0, 50.0]);
}

#[test]
fn test_float_leading_a_line_is_placed_at_its_top() {
    let (tree, _) = lay_out(
        r#"{ "name": "root", "style": { "width": 100 }, "children": [
            { "name": "float", "style": { "float": "left", "width": 96, "height": 20 } },
            "x"
        ] }"#,
        800.0,
    );
    let float = tree[named(&tree, "float")].frame();
    assert_eq!((float.x, float.y), (0.0, 0.0));

    // The 8px of text cannot fit in the 4px beside the float and drops
    // below it at full width.
    let root = named(&tree, "root");
    let text_line = lines(&tree, root)
        .into_iter()
        .zip(line_boxes(&tree, root))
        .find(|((_, width), _)| *width > 0.0)
        .expect("a line with text");
    assert_eq!(text_line.0, (0.0, 8.0));
    assert_eq!(text_line.1.0, 20.0);
}

#[test]
fn test_line_holding_only_a_float_after_break_is_kept() {
    let (tree, _) = lay_out(
        r#"{ "name": "root", "style": { "width": 300, "line-height": { "px": 20 } }, "children": [
            "aa",
            { "kind": "br" },
            { "name": "float", "style": { "float": "left", "width": 10, "height": 10 } }
        ] }"#,
        800.0,
    );
    let root = named(&tree, "root");
    let boxes = line_boxes(&tree, root);
    assert_eq!(boxes.len(), 2);
    assert_eq!(boxes[0], (0.0, 20.0));
    // No content and no forced break: zero height, still in the list.
    assert_eq!(boxes[1], (20.0, 0.0));
    assert_eq!(tree[named(&tree, "float")].frame().y, 20.0);
}

#[test]
fn test_right_float_sits_at_line_right() {
    let (tree, output) = lay_out(
        r#"{ "style": { "width": 300 }, "children": [
            { "name": "float", "style": { "float": "right", "width": 50, "height": 70 } }
        ] }"#,
        800.0,
    );
    assert_eq!(tree[named(&tree, "float")].frame().x, 250.0);
    assert_eq!(output.stats.floats_placed, 1);
}

#[test]
fn test_clearance_moves_block_below_float() {
    let (tree, _) = lay_out(
        r#"{ "children": [
            { "style": { "float": "left", "width": 100, "height": 50 } },
            { "name": "cleared", "style": { "clear": "left", "height": 10 } }
        ] }"#,
        800.0,
    );
    assert_eq!(tree[named(&tree, "cleared")].frame().y, 50.0);
}

#[test]
fn test_new_formatting_context_avoids_float() {
    let (tree, _) = lay_out(
        r#"{ "style": { "width": 300 }, "children": [
            { "style": { "float": "left", "width": 100, "height": 50 } },
            { "name": "bfc", "style": { "overflow": "hidden", "height": 20 } }
        ] }"#,
        800.0,
    );
    let bfc = tree[named(&tree, "bfc")].frame();
    assert_eq!(bfc.x, 100.0);
    assert_eq!(bfc.width, 200.0);
}

#[test]
fn test_new_formatting_context_clears_floats_across_its_height() {
    let (tree, _) = lay_out(
        r#"{ "style": { "width": 300 }, "children": [
            { "name": "left", "style": { "float": "left", "width": 200, "height": 50 } },
            { "name": "right", "style": { "float": "right", "width": 200, "height": 50 } },
            { "name": "bfc", "style": { "overflow": "hidden", "width": 100, "height": 100 } }
        ] }"#,
        800.0,
    );
    let right = tree[named(&tree, "right")].frame();
    assert_eq!((right.x, right.y), (100.0, 50.0));
    let bfc = tree[named(&tree, "bfc")].frame();
    for float in ["left", "right"] {
        let frame = tree[named(&tree, float)].frame();
        assert!(!bfc.intersects(&frame), "{bfc:?} overlaps {float} float {frame:?}");
    }
    assert_eq!((bfc.x, bfc.y), (0.0, 50.0));
}

#[test]
fn test_new_formatting_context_steps_past_the_shorter_float() {
    let (tree, _) = lay_out(
        r#"{ "style": { "width": 300 }, "children": [
            { "style": { "float": "left", "width": 100, "height": 30 } },
            { "style": { "float": "right", "width": 100, "height": 80 } },
            { "name": "bfc", "style": { "overflow": "hidden", "width": 150, "height": 40 } }
        ] }"#,
        800.0,
    );
    // 100px between the floats is too narrow; once the left float ends at
    // 30 there are 200px beside the taller right one.
    let bfc = tree[named(&tree, "bfc")].frame();
    assert_eq!((bfc.x, bfc.y, bfc.width), (0.0, 30.0, 150.0));
}

#[quickcheck]
fn prop_lines_fit_available_width(words: Vec<u8>, width: u16) -> bool {
    let width = 48.0 + f32::from(width % 400);
    let text: Vec<String> = words
        .iter()
        .take(60)
        .map(|w| "x".repeat(usize::from(w % 5) + 1))
        .collect();
    let json = serde_json::json!({ "name": "root", "children": [text.join(" ")] }).to_string();
    let (tree, _) = lay_out(&json, width);
    lines(&tree, named(&tree, "root"))
        .into_iter()
        .all(|(left, inline_size)| left >= 0.0 && left + inline_size <= width + 1e-3)
}

// ---------------------------------------------------------------------------
// Positioning
// ---------------------------------------------------------------------------

#[test]
fn test_absolute_box_uses_insets_against_container() {
    let (tree, _) = lay_out(
        r#"{ "style": { "position": "relative", "width": 400, "height": 200 }, "children": [
            { "name": "abs", "style": { "position": "absolute", "width": 50, "height": 20,
                                        "inset": { "block-end": 10, "inline-end": 30 } } }
        ] }"#,
        800.0,
    );
    let frame = tree[named(&tree, "abs")].frame();
    assert_eq!((frame.x, frame.y), (320.0, 170.0));
}

// ---------------------------------------------------------------------------
// Fragmentation
//
// [§ 3.2 Breaks Within Boxes](https://www.w3.org/TR/css-break-3/#break-within)
// ---------------------------------------------------------------------------

fn paged(height: f32) -> LayoutConfig {
    LayoutConfig {
        fragmentation: Fragmentation::Pages { height, gap: 0.0 },
        ..config(400.0)
    }
}

#[test]
fn test_avoid_break_inside_moves_box_to_next_page() {
    let (tree, output) = lay_out_with(
        r#"{ "children": [
            { "style": { "height": 60 } },
            { "name": "keep", "style": { "height": 60, "break-inside": "avoid" } }
        ] }"#,
        paged(100.0),
    );
    let keep = named(&tree, "keep");
    assert_eq!(tree[keep].frame().y, 100.0);
    assert_eq!(tree[keep].pagination_strut(), 40.0);
    assert_eq!(output.stats.pages, 2);
}

#[test]
fn test_forced_break_starts_new_page() {
    let (tree, _) = lay_out_with(
        r#"{ "children": [
            { "style": { "height": 30 } },
            { "name": "next", "style": { "height": 30, "break-before": "page" } }
        ] }"#,
        paged(100.0),
    );
    assert_eq!(tree[named(&tree, "next")].frame().y, 100.0);
}

#[test]
fn test_lines_never_straddle_page_boundary() {
    let (tree, output) = lay_out_with(
        r#"{ "name": "root", "style": { "width": 40, "line-height": { "px": 30 } },
             "children": [ "aa bb cc dd ee ff gg hh" ] }"#,
        paged(100.0),
    );
    let arena = tree.inline_boxes();
    for root in arena.lines(tree[named(&tree, "root")].lines) {
        let line = arena[root].root_line().expect("root line");
        let page = (line.line_top / 100.0).floor();
        assert!(line.line_bottom <= (page + 1.0) * 100.0 + 1e-3);
    }
    assert!(output.stats.pagination_struts > 0);
}

// ---------------------------------------------------------------------------
// Overflow and repaint
// ---------------------------------------------------------------------------

#[test]
fn test_overflow_contains_border_box() {
    let (tree, output) = lay_out(
        r#"{ "style": { "height": 50 }, "children": [
            { "style": { "height": 80, "box-shadow": [ { "offset-x": 5, "blur": 3 } ] } },
            { "style": { "width": 900, "height": 10 } }
        ] }"#,
        800.0,
    );
    let root = tree.root().expect("root");
    for id in tree.descendants(root) {
        let node = &tree[id];
        let border_box = node.dimensions.local_border_box();
        assert!(node.layout_overflow_rect().contains_rect(&border_box));
        assert!(node.visual_overflow_rect().contains_rect(&border_box));
    }
    assert!(output.layout_overflow.max_x() >= 900.0);
    assert!(output.layout_overflow.max_y() >= 90.0);
    // The shadow reaches offset plus blur past the first child.
    assert!(output.visual_overflow.max_x() >= 808.0);
}

#[test]
fn test_relayout_is_idempotent() {
    let json = r#"{ "children": [
        { "style": { "float": "left", "width": 60, "height": 30 } },
        "some words to wrap around the float",
        { "style": { "margin": { "block-start": 7 }, "height": 5 } }
    ] }"#;
    let config = config(160.0);
    let mut tree = parse_document(json, &config).expect("valid document");
    let root = tree.root().expect("root");

    let _ = layout(&mut tree, &config, &METRICS).expect("layout");
    let first: Vec<(BoxId, Rect)> = {
        let rects = absolute_rects(&tree, root);
        let mut rects: Vec<_> = rects.into_iter().collect();
        rects.sort_by_key(|(id, _)| *id);
        rects
    };
    let second = layout(&mut tree, &config, &METRICS).expect("layout");
    let mut again: Vec<_> = absolute_rects(&tree, root).into_iter().collect();
    again.sort_by_key(|(id, _)| *id);

    assert!(second.repaint.is_empty());
    assert_eq!(first, again);
}
