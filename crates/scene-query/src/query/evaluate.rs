//! Filter evaluation against a single scene node.

use crate::storage::{NodeContent, NodeId, NodeView, SceneTree};

use super::expression::{Filter, ValuePredicate};

/// Evaluates one filter against `id`.
///
/// Returns the node the match resolves to, which is `id` itself for every
/// filter except text: a text match is re-anchored to the nearest node,
/// `id` included, that carries a backing element. Index filters always pass
/// here; the matcher applies them to whole result lists.
pub fn evaluate_filter(tree: &SceneTree, id: NodeId, filter: &Filter) -> Option<NodeId> {
    let node = tree.get(id)?;
    match filter {
        Filter::Index(_) | Filter::ChildIndex(_) => Some(id),
        Filter::Text(predicate) => {
            if !contains_matching_text(tree, id, predicate) {
                return None;
            }
            NodeView::new(tree, id).nearest_element_ancestor()
        }
        Filter::Attribute { name, predicate } => {
            let value = node.element.as_ref()?.attribute_or_property(name)?;
            predicate.matches_value(&value).then_some(id)
        }
        Filter::Data { name, predicate } => {
            let value = node.data.get(name)?;
            predicate.matches_value(value).then_some(id)
        }
    }
}

/// Scans the children of `id` for a text leaf matching `predicate`,
/// looking through untagged wrapper children.
fn contains_matching_text(tree: &SceneTree, id: NodeId, predicate: &ValuePredicate) -> bool {
    tree.children(id).iter().any(|child| {
        let Some(node) = tree.get(*child) else {
            return false;
        };
        match &node.content {
            NodeContent::Text(text) => predicate.matches_text(text),
            NodeContent::Structured if node.tag.is_none() => {
                contains_matching_text(tree, *child, predicate)
            }
            NodeContent::Structured => false,
        }
    })
}
