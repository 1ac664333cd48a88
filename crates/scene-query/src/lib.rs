//! Scene-tree query library.
//!
//! This crate locates nodes in a retained-mode UI tree:
//! - Arena storage for scene nodes and host snapshots
//! - A compact path query language with filters
//! - Tree matching and filter evaluation
//! - Polled waits gated on render quiescence

pub mod error;
pub mod frame;
pub mod query;
pub mod search;
pub mod storage;

// Re-export main types
pub use error::{ParseError, Result, SceneQueryError};
pub use frame::FrameCounter;
pub use query::{render_identifiers, Identifier, QueryParser, TreeMatcher};
pub use search::{
    ElementPolicy, FindOptions, PollSettings, SceneFinder, SceneHost, Scope, SharedScene,
    WaitOutcome,
};
pub use storage::{Element, NodeId, NodeSnapshot, RootKey, SceneNode, SceneTree};
