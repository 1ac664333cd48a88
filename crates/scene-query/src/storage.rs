//! Storage layer for the scene tree.
//!
//! This module provides the read-only node model the query engine walks:
//! - Compact node handles and a slab arena with slot reuse
//! - Scene nodes with optional backing elements
//! - Derived views (ancestors, nearest element, descriptions)
//! - A nested JSON snapshot format for host adapters

mod entry;
mod index_types;
mod node;
mod node_view;
mod slab;
mod snapshot;
mod tree;

pub use index_types::{NodeId, OptionNodeId};
pub use node::{
    normalize_identity, Element, ElementHandle, NodeContent, SceneNode,
    IDENTITY_SEPARATOR_REPLACEMENT,
};
pub use node_view::NodeView;
pub use slab::NodeSlab;
pub use snapshot::NodeSnapshot;
pub use tree::{RootKey, SceneTree};
