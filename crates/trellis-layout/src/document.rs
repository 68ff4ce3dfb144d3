//! Box tree documents.
//!
//! A JSON description of boxes and their style, so the engine can be driven
//! without a DOM or a style system. Each node is either a bare string (a
//! text box) or an object:
//!
//! ```json
//! { "kind": "block", "name": "body",
//!   "style": { "width": 300, "margin": { "block-start": 10 } },
//!   "children": [ "Some text", { "kind": "br" } ] }
//! ```
//!
//! Inherited properties (font, `line-height`, `text-align`, `direction`,
//! `white-space` and the rest of [`ComputedStyle::anonymous_from`]) flow from
//! parent to child; a node's `style` object is merged over them key by key,
//! recursing into nested objects.

use serde::Deserialize;
use serde_json::{Map, Value};
use trellis_common::{DocumentError, warning};

use crate::config::LayoutConfig;
use crate::style::{ComputedStyle, Font};
use crate::tree::{BoxId, BoxKind, BoxTree};

/// The kinds of box a document node can describe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// A block container.
    #[default]
    Block,
    /// An inline-level block container.
    InlineBlock,
    /// An inline element.
    Inline,
    /// Styled text; the characters come from `text`.
    Text,
    /// Replaced content sized by `intrinsic-width` and `intrinsic-height`.
    Replaced,
    /// A forced line break.
    #[serde(rename = "br")]
    LineBreak,
    /// A table cell, laid out as a block formatting context root.
    TableCell,
}

/// A node written as an object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ElementNode {
    /// Box kind.
    pub kind: NodeKind,
    /// Debug label; `body` matters in quirks mode.
    pub name: Option<String>,
    /// Declared style, merged over the inherited style.
    pub style: Map<String, Value>,
    /// Characters of a `text` node.
    pub text: String,
    /// Natural width of a `replaced` node.
    pub intrinsic_width: f32,
    /// Natural height of a `replaced` node.
    pub intrinsic_height: f32,
    /// Child nodes in document order.
    pub children: Vec<DocumentNode>,
}

/// One node of a document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentNode {
    /// A bare string: a text box styled like its parent.
    Text(String),
    /// Any other box.
    Element(ElementNode),
}

/// Decode a document into a box tree rooted at its top node.
///
/// The root inherits `config.default_font_size`. Decoding starts a new
/// document, so warnings already reported for a previous one may repeat.
///
/// # Errors
/// Returns [`DocumentError::Decode`] if the JSON is malformed or a style
/// value is invalid, and [`DocumentError::Tree`] if the nesting is not a
/// valid box tree (children under text, line breaks or replaced boxes).
pub fn parse_document(json: &str, config: &LayoutConfig) -> Result<BoxTree, DocumentError> {
    let node: DocumentNode = serde_json::from_str(json)?;
    warning::clear_warnings();
    let initial = ComputedStyle {
        font: Font {
            size: config.default_font_size,
            family: None,
        },
        ..ComputedStyle::default()
    };
    let mut tree = BoxTree::new();
    let root = build_node(&mut tree, &node, &initial)?;
    tree.set_root(root)?;
    Ok(tree)
}

fn build_node(
    tree: &mut BoxTree,
    node: &DocumentNode,
    parent_style: &ComputedStyle,
) -> Result<BoxId, DocumentError> {
    let inherited = ComputedStyle::anonymous_from(parent_style);
    let element = match node {
        DocumentNode::Text(text) => return Ok(tree.create(BoxKind::Text(text.clone()), inherited)),
        DocumentNode::Element(element) => element,
    };
    let style = resolve_style(&inherited, &element.style)?;
    let kind = match element.kind {
        NodeKind::Block => BoxKind::Block,
        NodeKind::InlineBlock => BoxKind::InlineBlock,
        NodeKind::Inline => BoxKind::Inline,
        NodeKind::Text => BoxKind::Text(element.text.clone()),
        NodeKind::Replaced => BoxKind::Replaced {
            intrinsic_width: element.intrinsic_width.max(0.0),
            intrinsic_height: element.intrinsic_height.max(0.0),
        },
        NodeKind::LineBreak => BoxKind::LineBreak,
        NodeKind::TableCell => BoxKind::TableCell,
    };
    let id = match &element.name {
        Some(name) => tree.create_named(kind, style.clone(), name),
        None => tree.create(kind, style.clone()),
    };
    for child in &element.children {
        let child_id = build_node(tree, child, &style)?;
        tree.append_child(id, child_id)?;
    }
    Ok(id)
}

fn resolve_style(
    inherited: &ComputedStyle,
    declared: &Map<String, Value>,
) -> Result<ComputedStyle, serde_json::Error> {
    if declared.is_empty() {
        return Ok(inherited.clone());
    }
    let mut value = serde_json::to_value(inherited)?;
    merge(&mut value, Value::Object(declared.clone()));
    serde_json::from_value(value)
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Length, TextAlign};
    use trellis_common::TreeError;

    #[test]
    fn test_inherited_properties_flow_to_children() {
        let tree = parse_document(
            r#"{ "style": { "text-align": "center", "font": { "size": 20 },
                            "margin": { "block-start": 8 } },
                 "children": [ { "kind": "inline", "children": [ "hi" ] } ] }"#,
            &LayoutConfig::default(),
        )
        .expect("valid document");
        let root = tree.root().expect("root");
        let inline = tree.children(root)[0];
        let text = tree.children(inline)[0];
        assert_eq!(tree[root].style.margin.block_start, Length::Px(8.0));
        assert_eq!(tree[text].style.text_align, TextAlign::Center);
        assert_eq!(tree[text].style.font.size, 20.0);
        assert_eq!(tree[inline].style.margin.block_start, Length::ZERO);
        assert_eq!(tree[text].text(), Some("hi"));
    }

    #[test]
    fn test_root_uses_configured_font_size() {
        let config = LayoutConfig {
            default_font_size: 12.0,
            ..LayoutConfig::default()
        };
        let tree = parse_document(r#"{ "name": "body", "children": ["x"] }"#, &config)
            .expect("valid document");
        let root = tree.root().expect("root");
        assert_eq!(tree[root].style.font.size, 12.0);
        assert_eq!(tree[root].name.as_deref(), Some("body"));
    }

    #[test]
    fn test_replaced_and_break_nodes() {
        let tree = parse_document(
            r#"{ "children": [ { "kind": "replaced", "intrinsic-width": 40, "intrinsic-height": 30 },
                               { "kind": "br" } ] }"#,
            &LayoutConfig::default(),
        )
        .expect("valid document");
        let root = tree.root().expect("root");
        let children = tree.children(root);
        assert_eq!(
            tree[children[0]].kind,
            BoxKind::Replaced {
                intrinsic_width: 40.0,
                intrinsic_height: 30.0
            }
        );
        assert_eq!(tree[children[1]].kind, BoxKind::LineBreak);
    }

    #[test]
    fn test_children_under_text_are_rejected() {
        let result = parse_document(
            r#"{ "kind": "text", "text": "a", "children": ["b"] }"#,
            &LayoutConfig::default(),
        );
        assert!(matches!(
            result,
            Err(DocumentError::Tree(TreeError::NotAContainer(_)))
        ));
    }

    #[test]
    fn test_bad_style_value_is_a_decode_error() {
        let result = parse_document(
            r#"{ "style": { "float": "sideways" } }"#,
            &LayoutConfig::default(),
        );
        assert!(matches!(result, Err(DocumentError::Decode(_))));
    }
}
