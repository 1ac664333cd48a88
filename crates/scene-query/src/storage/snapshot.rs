//! Nested snapshot format for building a [`SceneTree`] from host data.
//!
//! Host adapters that live outside this crate (a device bridge, a test
//! fixture) describe their tree as JSON and hand it over in one piece:
//!
//! ```json
//! { "main": { "identity": "App", "children": [
//!     { "tag": "div", "identity": "panel", "element": { "handle": 1 } },
//!     { "text": "Hello" }
//! ] } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SceneQueryError};

use super::index_types::NodeId;
use super::node::{Element, NodeContent, SceneNode};
use super::tree::{RootKey, SceneTree};

/// One node of a nested snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
    /// Present only on text leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    fn to_node(&self) -> Result<SceneNode> {
        let content = match &self.text {
            Some(text) => {
                if !self.children.is_empty() {
                    return Err(SceneQueryError::InvalidInput(format!(
                        "text leaf '{text}' cannot have children"
                    )));
                }
                NodeContent::Text(text.clone())
            }
            None => NodeContent::Structured,
        };
        let mut node = SceneNode::new();
        node.tag = self.tag.clone();
        if let Some(identity) = &self.identity {
            node.set_identity(identity);
        }
        node.key = self.key.clone();
        node.element = self.element.clone();
        node.data = self.data.clone();
        node.context = self.context.clone();
        node.content = content;
        Ok(node)
    }
}

impl SceneTree {
    /// Builds a tree from `(root key, snapshot)` pairs, preserving order.
    pub fn from_snapshots<I>(roots: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RootKey, NodeSnapshot)>,
    {
        let mut tree = SceneTree::new();
        for (key, snapshot) in roots {
            let root = tree.insert_root(key, snapshot.to_node()?);
            tree.insert_snapshot_children(root, &snapshot)?;
        }
        Ok(tree)
    }

    /// Builds a tree from a JSON object mapping root keys to snapshots.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(roots) = value else {
            return Err(SceneQueryError::InvalidInput(
                "scene snapshot must be an object keyed by root".to_string(),
            ));
        };
        let mut parsed = Vec::with_capacity(roots.len());
        for (key, raw) in roots {
            let snapshot = serde_json::from_value::<NodeSnapshot>(raw).map_err(|error| {
                SceneQueryError::InvalidInput(format!("invalid snapshot for root {key}: {error}"))
            })?;
            parsed.push((RootKey::new(key), snapshot));
        }
        Self::from_snapshots(parsed)
    }

    /// Appends `snapshot` and its subtree under `parent`.
    pub fn insert_snapshot(&mut self, parent: NodeId, snapshot: &NodeSnapshot) -> Result<NodeId> {
        let id = self.insert_child(parent, snapshot.to_node()?)?;
        self.insert_snapshot_children(id, snapshot)?;
        Ok(id)
    }

    fn insert_snapshot_children(&mut self, parent: NodeId, snapshot: &NodeSnapshot) -> Result<()> {
        for child in &snapshot.children {
            self.insert_snapshot(parent, child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_tree_from_json() {
        let tree = SceneTree::from_json(json!({
            "main": {
                "identity": "App",
                "children": [
                    { "tag": "div", "identity": "a/b", "element": { "handle": 1 } },
                    { "text": "Hello" }
                ]
            }
        }))
        .expect("snapshot");

        let root = tree.root(&RootKey::new("main")).expect("root");
        let children = tree.children(root);
        assert_eq!(children.len(), 2);
        let div = tree.get(children[0]).expect("div");
        assert_eq!(div.identity(), Some("a_b"));
        assert!(div.has_element());
        assert_eq!(tree.get(children[1]).and_then(|n| n.text_value()), Some("Hello"));
        assert_eq!(tree.parent(children[1]), Some(root));
    }

    #[test]
    fn roots_keep_document_order() {
        let tree = SceneTree::from_json(json!({
            "zeta": { "tag": "div" },
            "alpha": { "tag": "div" },
            "mid": { "tag": "div" }
        }))
        .expect("snapshot");
        let keys = tree.roots().map(|(key, _)| key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn text_leaf_with_children_is_rejected() {
        let error = SceneTree::from_json(json!({
            "main": { "text": "x", "children": [ { "tag": "div" } ] }
        }))
        .unwrap_err();
        assert!(matches!(error, SceneQueryError::InvalidInput(_)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = SceneTree::from_json(json!({ "main": { "tagg": "div" } })).unwrap_err();
        assert!(error.to_string().contains("main"));
    }
}
