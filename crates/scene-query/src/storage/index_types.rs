//! Compact node handles for the scene arena.

use std::fmt;

use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A compact 32-bit handle to a node in a [`SceneTree`](super::SceneTree).
///
/// `u32::MAX` is reserved as the `OptionNodeId` none sentinel. Handles are
/// only meaningful for the snapshot that produced them: slots are recycled
/// once the host removes a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new NodeId from a slot number.
    ///
    /// # Panics
    /// Panics if `index >= u32::MAX` (reserved for the none sentinel).
    #[inline]
    pub fn new(index: usize) -> Self {
        assert!(
            index < u32::MAX as usize,
            "node id must be less than u32::MAX"
        );
        Self(index as u32)
    }

    /// Returns the slot number.
    #[inline]
    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u32::deserialize(deserializer)?;
        if value == u32::MAX {
            return Err(D::Error::custom("NodeId cannot be u32::MAX"));
        }
        Ok(Self(value))
    }
}

/// An optional node handle using u32::MAX as the None sentinel.
///
/// Used for the parent back-reference so every node stays small.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct OptionNodeId(u32);

impl OptionNodeId {
    #[inline]
    pub fn none() -> Self {
        Self(u32::MAX)
    }

    #[inline]
    pub fn some(id: NodeId) -> Self {
        Self(id.0)
    }

    #[inline]
    pub fn from_option(id: Option<NodeId>) -> Self {
        id.map_or(Self::none(), Self::some)
    }

    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        if self.0 == u32::MAX {
            None
        } else {
            Some(NodeId(self.0))
        }
    }
}

impl Default for OptionNodeId {
    fn default() -> Self {
        Self::none()
    }
}
