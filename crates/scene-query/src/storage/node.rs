//! Scene node types.
//!
//! A node is either a structured node with ordered children or a text leaf.
//! Only "real" nodes carry an [`Element`]; grouping nodes produced by
//! composite components have none and are called virtual.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thin_vec::ThinVec;

use super::index_types::{NodeId, OptionNodeId};

/// Character substituted for `/` inside identities, since `/` separates
/// query path segments.
pub const IDENTITY_SEPARATOR_REPLACEMENT: char = '_';

/// Normalizes a raw component identity for matching.
pub fn normalize_identity(raw: &str) -> String {
    raw.replace('/', &IDENTITY_SEPARATOR_REPLACEMENT.to_string())
}

// ---------------------------------------------------------------------------
// Backing element
// ---------------------------------------------------------------------------

/// Opaque handle to the host resource behind a real node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub u64);

/// The concrete element backing a real node.
///
/// Attributes are the element's declared attribute nodes; properties are
/// everything else the host exposes on the element object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub handle: ElementHandle,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Default for ElementHandle {
    fn default() -> Self {
        Self(0)
    }
}

impl Element {
    pub fn new(handle: u64) -> Self {
        Self {
            handle: ElementHandle(handle),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Reads `name` as an attribute, falling back to a direct property.
    pub fn attribute_or_property(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.attributes.get(name) {
            return Some(Value::String(value.clone()));
        }
        self.properties.get(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// SceneNode
// ---------------------------------------------------------------------------

/// Node payload: structured children or a literal text leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Structured,
    Text(String),
}

/// A node in the scene arena.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub tag: Option<String>,
    identity: Option<String>,
    pub key: Option<String>,
    /// Child node handles in host sibling order (empty for leaves).
    pub children: ThinVec<NodeId>,
    parent: OptionNodeId,
    pub element: Option<Element>,
    pub data: Map<String, Value>,
    pub context: Map<String, Value>,
    pub content: NodeContent,
}

impl SceneNode {
    /// Creates an empty structured node with no tag (a virtual wrapper).
    pub fn new() -> Self {
        Self {
            tag: None,
            identity: None,
            key: None,
            children: ThinVec::new(),
            parent: OptionNodeId::none(),
            element: None,
            data: Map::new(),
            context: Map::new(),
            content: NodeContent::Structured,
        }
    }

    /// Creates a text leaf.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            content: NodeContent::Text(value.into()),
            ..Self::new()
        }
    }

    /// Creates a tagged node backed by an element.
    pub fn element(tag: impl Into<String>, element: Element) -> Self {
        Self {
            tag: Some(tag.into()),
            element: Some(element),
            ..Self::new()
        }
    }

    pub fn with_identity(mut self, identity: &str) -> Self {
        self.set_identity(identity);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_data(mut self, name: impl Into<String>, value: Value) -> Self {
        self.data.insert(name.into(), value);
        self
    }

    pub fn with_context(mut self, name: impl Into<String>, value: Value) -> Self {
        self.context.insert(name.into(), value);
        self
    }

    pub fn set_identity(&mut self, identity: &str) {
        self.identity = Some(normalize_identity(identity));
    }

    /// Returns the normalized identity.
    #[inline]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent.to_option()
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = OptionNodeId::from_option(parent);
    }

    #[inline]
    pub fn has_element(&self) -> bool {
        self.element.is_some()
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.element.is_none()
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.content, NodeContent::Text(_))
    }

    /// Literal text for a text leaf.
    #[inline]
    pub fn text_value(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text(value) => Some(value.as_str()),
            NodeContent::Structured => None,
        }
    }

    /// Adds a child handle, ignoring duplicates.
    pub fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// Removes a child handle, returns true if it was present.
    pub fn remove_child(&mut self, child: NodeId) -> bool {
        if let Some(pos) = self.children.iter().position(|&c| c == child) {
            self.children.remove(pos);
            true
        } else {
            false
        }
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new()
    }
}
