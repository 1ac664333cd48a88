//! Render-commit frame counter.
//!
//! The host advances the counter exactly once per render commit. The poller
//! only reads it: two equal readings one tick apart mean the tree has been
//! quiescent in between and is safe to search.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing count of host render commits.
#[derive(Debug, Default)]
pub struct FrameCounter {
    frames: AtomicU64,
}

impl FrameCounter {
    /// Creates a counter starting at frame 0.
    pub fn new() -> Self {
        Self {
            frames: AtomicU64::new(0),
        }
    }

    /// Records one render commit and returns the new frame number.
    ///
    /// This is the host's commit hook; the search core never calls it.
    pub fn advance(&self) -> u64 {
        self.frames.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current frame number without advancing.
    pub fn current(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    /// Returns true if no commit happened since `baseline` was read.
    #[inline]
    pub fn is_quiescent_since(&self, baseline: u64) -> bool {
        self.current() == baseline
    }
}
