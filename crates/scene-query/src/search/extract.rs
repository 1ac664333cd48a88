//! Value reads off a matched node.

use serde_json::Value;

use crate::storage::{NodeContent, NodeId, NodeView, SceneTree};

/// Attribute of the node's element, falling back to an element property.
pub fn attribute_value(tree: &SceneTree, id: NodeId, name: &str) -> Option<Value> {
    tree.get(id)?.element.as_ref()?.attribute_or_property(name)
}

/// Direct property of the node's element.
pub fn property_value(tree: &SceneTree, id: NodeId, name: &str) -> Option<Value> {
    tree.get(id)?.element.as_ref()?.properties.get(name).cloned()
}

pub fn data_value(tree: &SceneTree, id: NodeId, name: &str) -> Option<Value> {
    tree.get(id)?.data.get(name).cloned()
}

/// Context entry visible at the node: its own, else the nearest ancestor's.
pub fn context_value(tree: &SceneTree, id: NodeId, name: &str) -> Option<Value> {
    tree.get(id)?;
    std::iter::once(id)
        .chain(NodeView::new(tree, id).ancestors())
        .find_map(|current| tree.get(current)?.context.get(name).cloned())
}

/// Concatenated text leaves of the subtree in pre-order; `None` if there
/// are none.
pub fn text_content(tree: &SceneTree, id: NodeId) -> Option<String> {
    let mut text = None::<String>;
    let mut pending = vec![id];
    while let Some(current) = pending.pop() {
        let Some(node) = tree.get(current) else {
            continue;
        };
        match &node.content {
            NodeContent::Text(value) => text.get_or_insert_with(String::new).push_str(value),
            NodeContent::Structured => pending.extend(node.children.iter().rev().copied()),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Element, RootKey, SceneNode};
    use serde_json::json;

    #[test]
    fn reads_values_by_kind() {
        let mut tree = SceneTree::new();
        let root = tree.insert_root(
            RootKey::new("main"),
            SceneNode::new().with_context("theme", json!("dark")),
        );
        let input = tree
            .insert_child(
                root,
                SceneNode::element(
                    "input",
                    Element::new(1)
                        .with_attribute("placeholder", "Name")
                        .with_property("value", json!("Ada")),
                )
                .with_data("field", json!({"required": true})),
            )
            .unwrap();

        assert_eq!(attribute_value(&tree, input, "placeholder"), Some(json!("Name")));
        assert_eq!(attribute_value(&tree, input, "value"), Some(json!("Ada")));
        assert_eq!(property_value(&tree, input, "placeholder"), None);
        assert_eq!(property_value(&tree, input, "value"), Some(json!("Ada")));
        assert_eq!(
            data_value(&tree, input, "field"),
            Some(json!({"required": true}))
        );
        assert_eq!(context_value(&tree, input, "theme"), Some(json!("dark")));
        assert_eq!(context_value(&tree, input, "locale"), None);
        assert_eq!(attribute_value(&tree, root, "placeholder"), None);
    }

    #[test]
    fn text_content_joins_leaves_in_order() {
        let mut tree = SceneTree::new();
        let root = tree.insert_root(RootKey::new("main"), SceneNode::new());
        let p = tree
            .insert_child(root, SceneNode::element("p", Element::new(1)))
            .unwrap();
        tree.insert_child(p, SceneNode::text("Hello, ")).unwrap();
        let b = tree
            .insert_child(p, SceneNode::element("b", Element::new(2)))
            .unwrap();
        tree.insert_child(b, SceneNode::text("world")).unwrap();
        tree.insert_child(p, SceneNode::text("!")).unwrap();

        assert_eq!(text_content(&tree, p).as_deref(), Some("Hello, world!"));
        assert_eq!(text_content(&tree, b).as_deref(), Some("world"));

        let empty = tree
            .insert_child(root, SceneNode::element("hr", Element::new(3)))
            .unwrap();
        assert_eq!(text_content(&tree, empty), None);
    }
}
