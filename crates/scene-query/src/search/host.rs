//! Host boundary: where the scene tree and its render-commit signal come from.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, SceneQueryError};
use crate::frame::FrameCounter;
use crate::storage::SceneTree;

/// A provider of scene snapshots.
///
/// Implementations hand out read-only access to the current tree and own
/// the [`FrameCounter`] their render-commit hook advances.
pub trait SceneHost: Send + Sync {
    /// Runs `f` against the current tree. Fails with
    /// [`SceneQueryError::HostNotReady`] while no tree is available.
    fn with_tree<R>(&self, f: impl FnOnce(&SceneTree) -> R) -> Result<R>;

    fn frame_counter(&self) -> &FrameCounter;

    /// Commits any render the host has queued. Only used to make the first
    /// quiescence check deterministic.
    fn flush_pending_render(&self) {}
}

impl<T: SceneHost> SceneHost for Arc<T> {
    fn with_tree<R>(&self, f: impl FnOnce(&SceneTree) -> R) -> Result<R> {
        self.as_ref().with_tree(f)
    }

    fn frame_counter(&self) -> &FrameCounter {
        self.as_ref().frame_counter()
    }

    fn flush_pending_render(&self) {
        self.as_ref().flush_pending_render()
    }
}

// ---------------------------------------------------------------------------
// SharedScene
// ---------------------------------------------------------------------------

/// In-process host: a lockable tree plus its frame counter.
///
/// Every mutation goes through [`SharedScene::mount`], [`SharedScene::commit`],
/// or [`SharedScene::unmount`], each of which counts as one render commit.
#[derive(Debug, Default)]
pub struct SharedScene {
    tree: RwLock<Option<SceneTree>>,
    frames: FrameCounter,
}

impl SharedScene {
    /// Creates a host with nothing mounted yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree_mounted(tree: SceneTree) -> Self {
        let scene = Self::new();
        scene.mount(tree);
        scene
    }

    /// Replaces the whole tree.
    pub fn mount(&self, tree: SceneTree) {
        *self.tree.write() = Some(tree);
        let frame = self.frames.advance();
        log::debug!("scene mounted frame={frame}");
    }

    /// Mutates the mounted tree, then advances the frame counter once.
    pub fn commit<R>(&self, f: impl FnOnce(&mut SceneTree) -> R) -> Result<R> {
        let result = {
            let mut guard = self.tree.write();
            let tree = guard
                .as_mut()
                .ok_or_else(|| SceneQueryError::HostNotReady("no scene tree is mounted".into()))?;
            f(tree)
        };
        let frame = self.frames.advance();
        log::trace!("scene commit frame={frame}");
        Ok(result)
    }

    /// Drops the tree. Later reads fail as not ready until the next mount.
    pub fn unmount(&self) -> Option<SceneTree> {
        let tree = self.tree.write().take();
        let frame = self.frames.advance();
        log::debug!("scene unmounted frame={frame}");
        tree
    }

    pub fn is_mounted(&self) -> bool {
        self.tree.read().is_some()
    }
}

impl SceneHost for SharedScene {
    fn with_tree<R>(&self, f: impl FnOnce(&SceneTree) -> R) -> Result<R> {
        let guard = self.tree.read();
        let tree = guard
            .as_ref()
            .ok_or_else(|| SceneQueryError::HostNotReady("no scene tree is mounted".into()))?;
        Ok(f(tree))
    }

    fn frame_counter(&self) -> &FrameCounter {
        &self.frames
    }
}
