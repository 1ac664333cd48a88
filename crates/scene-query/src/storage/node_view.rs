//! Node view helpers for derived properties of scene nodes.
//!
//! Nothing here is stored on the node itself; everything is computed by
//! walking parent or child links in the arena.

use std::collections::VecDeque;

use super::index_types::NodeId;
use super::tree::SceneTree;

/// A node handle paired with the tree it belongs to.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a SceneTree,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    #[inline]
    pub fn new(tree: &'a SceneTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// Iterates strict ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeId> + 'a {
        let tree = self.tree;
        std::iter::successors(tree.parent(self.id), move |current| tree.parent(*current))
    }

    /// Number of ancestors (0 for roots).
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Position of this node within its parent's children.
    pub fn index_in_parent(&self) -> Option<(NodeId, usize)> {
        let parent = self.tree.parent(self.id)?;
        let position = self
            .tree
            .children(parent)
            .iter()
            .position(|child| *child == self.id)?;
        Some((parent, position))
    }

    /// Nearest node, starting with this one, that carries a backing element.
    pub fn nearest_element_ancestor(&self) -> Option<NodeId> {
        std::iter::once(self.id)
            .chain(self.ancestors())
            .find(|id| self.tree.get(*id).is_some_and(|node| node.has_element()))
    }

    /// Breadth-first search of this subtree, this node included, for the
    /// first node carrying a backing element.
    pub fn nearest_element_descendant(&self) -> Option<NodeId> {
        let mut queue = VecDeque::from([self.id]);
        while let Some(current) = queue.pop_front() {
            let Some(node) = self.tree.get(current) else {
                continue;
            };
            if node.has_element() {
                return Some(current);
            }
            queue.extend(node.children.iter().copied());
        }
        None
    }

    /// Human-readable root-to-node path such as `App/div.panel/input`.
    ///
    /// Used in log lines and error messages only.
    pub fn describe(&self) -> String {
        let mut segments = std::iter::once(self.id)
            .chain(self.ancestors())
            .filter_map(|id| self.tree.get(id))
            .map(|node| {
                match (node.tag.as_deref(), node.identity(), node.text_value()) {
                    (_, _, Some(_)) => "#text".to_string(),
                    (Some(tag), Some(identity), _) => format!("{tag}.{identity}"),
                    (Some(tag), None, _) => tag.to_string(),
                    (None, Some(identity), _) => format!(".{identity}"),
                    (None, None, _) => "_".to_string(),
                }
            })
            .collect::<Vec<_>>();
        segments.reverse();
        segments.join("/")
    }
}
