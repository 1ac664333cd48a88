//! The scene arena: every node of every mounted root.

use std::fmt;

use crate::error::{Result, SceneQueryError};

use super::index_types::NodeId;
use super::node::SceneNode;
use super::slab::NodeSlab;

/// Opaque identifier the host uses for one of its render roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootKey(String);

impl RootKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RootKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Arena holding the host's node hierarchy.
///
/// Children are ordered handle lists and each node keeps a non-owning parent
/// handle. The search core only ever borrows the tree immutably.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    nodes: NodeSlab<SceneNode>,
    roots: Vec<(RootKey, NodeId)>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `node` as a new root. Replaces any root already under `key`.
    pub fn insert_root(&mut self, key: RootKey, mut node: SceneNode) -> NodeId {
        node.set_parent(None);
        node.children.clear();
        if let Some(existing) = self.root(&key) {
            self.remove_subtree(existing);
        }
        let id = self.nodes.insert(node);
        self.roots.push((key, id));
        id
    }

    /// Appends `node` as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, mut node: SceneNode) -> Result<NodeId> {
        if self.nodes.get(parent).is_none() {
            return Err(SceneQueryError::InvalidInput(format!(
                "parent node {parent} does not exist"
            )));
        }
        node.set_parent(Some(parent));
        node.children.clear();
        let id = self.nodes.insert(node);
        self.nodes[parent].add_child(id);
        Ok(id)
    }

    /// Removes `id` and all of its descendants. Returns the number of nodes removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(id) else {
            return 0;
        };
        match node.parent() {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.remove_child(id);
                }
            }
            None => self.roots.retain(|(_, root)| *root != id),
        }

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.try_remove(current) {
                pending.extend(node.children.iter().copied());
                removed += 1;
            }
        }
        removed
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Children of `id` in host order; empty for unknown handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(SceneNode::parent)
    }

    /// Mounted roots in mount order.
    pub fn roots(&self) -> impl Iterator<Item = (&RootKey, NodeId)> {
        self.roots.iter().map(|(key, id)| (key, *id))
    }

    pub fn root_ids(&self) -> Vec<NodeId> {
        self.roots.iter().map(|(_, id)| *id).collect()
    }

    pub fn root(&self, key: &RootKey) -> Option<NodeId> {
        self.roots
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, id)| *id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
