//! Segment-by-segment tree matching.
//!
//! The working set starts as a virtual anchor whose children are the scope's
//! top nodes, so the first segment tests those nodes directly. Every later
//! segment runs from the nodes the previous one produced. Results keep host
//! pre-order and are never re-sorted.

use fnv::FnvHashSet;

use crate::error::{Result, SceneQueryError};
use crate::storage::{NodeId, NodeView, SceneNode, SceneTree};

use super::evaluate::evaluate_filter;
use super::expression::{Filter, Identifier, IndexSpec, MatchingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Above the scope; its children are the top nodes.
    Top,
    Node(NodeId),
}

/// Walks a [`SceneTree`] for a parsed expression.
pub struct TreeMatcher<'a> {
    tree: &'a SceneTree,
    top: Vec<NodeId>,
    strict_index: bool,
}

impl<'a> TreeMatcher<'a> {
    /// Creates a matcher confined to the subtrees of `top`.
    pub fn new(tree: &'a SceneTree, top: Vec<NodeId>) -> Self {
        Self {
            tree,
            top,
            strict_index: false,
        }
    }

    /// Raise a search error, instead of returning nothing, when a bare
    /// index falls outside the match list.
    pub fn with_strict_index(mut self, strict_index: bool) -> Self {
        self.strict_index = strict_index;
        self
    }

    /// Runs every identifier in order and returns the final working set.
    pub fn find(&self, identifiers: &[Identifier]) -> Result<Vec<NodeId>> {
        let mut working = vec![Anchor::Top];
        let mut matches = Vec::new();
        for (position, identifier) in identifiers.iter().enumerate() {
            matches = self.step(&working, identifier)?;
            log::trace!(
                "scene query step segment={position} identifier={identifier} matches={}",
                matches.len()
            );
            if matches.is_empty() {
                break;
            }
            working = matches.iter().copied().map(Anchor::Node).collect();
        }
        Ok(matches)
    }

    fn step(&self, working: &[Anchor], identifier: &Identifier) -> Result<Vec<NodeId>> {
        let child_index = effective_child_index(identifier)?;
        let mut matches = Vec::new();
        for anchor in working {
            if identifier.sibling_offset != 0 {
                if let Anchor::Node(id) = *anchor {
                    matches.extend(self.sibling(id, identifier));
                }
                continue;
            }
            match child_index {
                Some(spec) => {
                    let mut local = Vec::new();
                    self.descend(*anchor, identifier, &mut local);
                    if let Some(position) = spec.resolve(local.len()) {
                        matches.push(local[position]);
                    }
                }
                None => self.descend(*anchor, identifier, &mut matches),
            }
        }

        let matches = dedup_in_order(matches);
        let Some(spec) = identifier.bare_index() else {
            return Ok(matches);
        };
        match spec.resolve(matches.len()) {
            Some(position) => Ok(vec![matches[position]]),
            None if self.strict_index => Err(SceneQueryError::Search(format!(
                "index {spec} out of range for {} matches of '{identifier}'",
                matches.len()
            ))),
            None => Ok(Vec::new()),
        }
    }

    fn descend(&self, anchor: Anchor, identifier: &Identifier, out: &mut Vec<NodeId>) {
        match identifier.mode {
            MatchingMode::Exact => self.match_exact(anchor, identifier, out),
            MatchingMode::AnyDescendant => self.match_any(anchor, identifier, out),
            MatchingMode::Ancestor => {
                if let Anchor::Node(id) = anchor {
                    out.extend(self.match_ancestor(id, identifier));
                }
            }
        }
    }

    /// Tests immediate children, looking through untagged wrappers.
    fn match_exact(&self, anchor: Anchor, identifier: &Identifier, out: &mut Vec<NodeId>) {
        for &child in self.children(anchor) {
            let Some(node) = self.tree.get(child) else {
                continue;
            };
            if node.is_text() {
                continue;
            }
            if let Some(target) = self.accept(child, identifier) {
                out.push(target);
            } else if node.tag.is_none() {
                self.match_exact(Anchor::Node(child), identifier, out);
            }
        }
    }

    /// Searches the whole subtree; below a match only its own children are
    /// searched further, in exact mode.
    fn match_any(&self, anchor: Anchor, identifier: &Identifier, out: &mut Vec<NodeId>) {
        for &child in self.children(anchor) {
            if self.tree.get(child).map_or(true, SceneNode::is_text) {
                continue;
            }
            match self.accept(child, identifier) {
                Some(target) => {
                    out.push(target);
                    self.match_exact(Anchor::Node(child), identifier, out);
                }
                None => self.match_any(Anchor::Node(child), identifier, out),
            }
        }
    }

    /// The parent when the segment has no selector, otherwise the nearest
    /// accepting ancestor. Never walks above a top node.
    fn match_ancestor(&self, id: NodeId, identifier: &Identifier) -> Option<NodeId> {
        if self.is_top(id) {
            return None;
        }
        if !identifier.has_selector() {
            let parent = self.tree.parent(id)?;
            return self.accept(parent, identifier);
        }
        for ancestor in NodeView::new(self.tree, id).ancestors() {
            if let Some(target) = self.accept(ancestor, identifier) {
                return Some(target);
            }
            if self.is_top(ancestor) {
                break;
            }
        }
        None
    }

    fn sibling(&self, id: NodeId, identifier: &Identifier) -> Option<NodeId> {
        if self.is_top(id) {
            return None;
        }
        let (parent, position) = NodeView::new(self.tree, id).index_in_parent()?;
        let target = i64::try_from(position).ok()? + i64::from(identifier.sibling_offset);
        let sibling = *self.tree.children(parent).get(usize::try_from(target).ok()?)?;
        self.accept(sibling, identifier)
    }

    /// Identity predicate, then every filter. Returns the node to report,
    /// which a text filter may have re-anchored.
    fn accept(&self, id: NodeId, identifier: &Identifier) -> Option<NodeId> {
        let node = self.tree.get(id)?;
        if node.is_text() || !identity_matches(node, identifier) {
            return None;
        }
        let mut target = id;
        for filter in &identifier.filters {
            let matched = evaluate_filter(self.tree, id, filter)?;
            if matched != id {
                target = matched;
            }
        }
        Some(target)
    }

    fn children(&self, anchor: Anchor) -> &[NodeId] {
        match anchor {
            Anchor::Top => &self.top,
            Anchor::Node(id) => self.tree.children(id),
        }
    }

    fn is_top(&self, id: NodeId) -> bool {
        self.top.contains(&id)
    }
}

fn identity_matches(node: &SceneNode, identifier: &Identifier) -> bool {
    if let Some(tag) = &identifier.tag {
        if !tag.matches(node.tag.as_deref()) {
            return false;
        }
    }
    if let Some(id) = &identifier.id {
        return node.identity() == Some(id.as_str());
    }
    if let Some(key) = &identifier.key {
        return node.key.as_deref().is_some_and(|candidate| key.matches(candidate));
    }
    true
}

/// The one child-index spec of a segment, wherever it was stored.
fn effective_child_index(identifier: &Identifier) -> Result<Option<IndexSpec>> {
    let mut specs = identifier
        .filters
        .iter()
        .filter_map(|filter| match filter {
            Filter::ChildIndex(spec) => Some(*spec),
            _ => None,
        })
        .chain(identifier.child_index);
    let first = specs.next();
    if specs.next().is_some() {
        return Err(SceneQueryError::Search(format!(
            "multiple child-index filters on '{identifier}'"
        )));
    }
    Ok(first)
}

fn dedup_in_order(matches: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = FnvHashSet::default();
    matches.into_iter().filter(|id| seen.insert(*id)).collect()
}
