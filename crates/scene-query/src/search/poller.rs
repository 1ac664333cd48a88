//! Stabilization-aware polling.
//!
//! A poll only searches the tree when the frame counter has not moved since
//! the previous tick, so a match is never read from a half-committed render.
//!
//! ```text
//! INIT -> (tick) -> CHECK -> FOUND -> DONE
//!                          -> TIMED_OUT -> DONE
//!                          -> UNSTABLE -> (tick) -> CHECK
//! ```

use std::time::{Duration, Instant};

use crate::error::{Result, SceneQueryError};
use crate::frame::FrameCounter;
use crate::storage::NodeId;

/// What a wait is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// At least one match.
    Present,
    /// No match at all.
    Absent,
}

impl Presence {
    fn is_satisfied_by(self, matches: &[NodeId]) -> bool {
        match self {
            Self::Present => !matches.is_empty(),
            Self::Absent => matches.is_empty(),
        }
    }
}

/// Result of a completed wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Matches from the successful check; empty for absence waits.
    pub nodes: Vec<NodeId>,
    pub elapsed: Duration,
    /// Number of checks run, including skipped unstable ones.
    pub polls: u32,
}

/// Outcome of one check.
#[derive(Debug)]
pub enum PollStep {
    Done(Result<WaitOutcome>),
    Reschedule,
}

/// State of one outstanding wait. Time and frame readings are passed in, so
/// the state machine itself never sleeps.
#[derive(Debug)]
pub struct StabilizationPoller {
    expression: String,
    presence: Presence,
    started: Instant,
    deadline: Instant,
    baseline: u64,
    polls: u32,
}

impl StabilizationPoller {
    /// INIT: records the frame baseline and the deadline. The first check
    /// belongs one tick later.
    pub fn start(
        expression: impl Into<String>,
        presence: Presence,
        timeout: Duration,
        frames: &FrameCounter,
        now: Instant,
    ) -> Self {
        Self {
            expression: expression.into(),
            presence,
            started: now,
            deadline: now + timeout,
            baseline: frames.current(),
            polls: 0,
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// CHECK: searches if the tree has been quiescent since the last check.
    ///
    /// `search` runs the whole parse and match pipeline. A host that is not
    /// ready counts as zero matches until the deadline, then surfaces.
    pub fn check<F>(&mut self, now: Instant, frames: &FrameCounter, search: F) -> PollStep
    where
        F: FnOnce() -> Result<Vec<NodeId>>,
    {
        self.polls += 1;
        let before_deadline = now < self.deadline;

        if !frames.is_quiescent_since(self.baseline) {
            let frame = frames.current();
            log::trace!(
                "scene poll unstable expression={:?} frame={frame} baseline={} poll={}",
                self.expression,
                self.baseline,
                self.polls
            );
            self.baseline = frame;
            return self.reschedule_or_time_out(now, before_deadline);
        }

        let matches = match search() {
            Ok(matches) => matches,
            Err(error) if error.is_transient() && before_deadline => {
                log::trace!(
                    "scene poll host not ready expression={:?} error={error}",
                    self.expression
                );
                Vec::new()
            }
            Err(error) => {
                log::debug!(
                    "scene poll failed expression={:?} poll={} error={error}",
                    self.expression,
                    self.polls
                );
                return PollStep::Done(Err(error));
            }
        };
        log::trace!(
            "scene poll searched expression={:?} matches={} poll={}",
            self.expression,
            matches.len(),
            self.polls
        );

        if self.presence.is_satisfied_by(&matches) {
            let elapsed = now.saturating_duration_since(self.started);
            log::debug!(
                "scene poll done expression={:?} presence={:?} matches={} elapsed_ms={} polls={}",
                self.expression,
                self.presence,
                matches.len(),
                elapsed.as_millis(),
                self.polls
            );
            return PollStep::Done(Ok(WaitOutcome {
                nodes: matches,
                elapsed,
                polls: self.polls,
            }));
        }
        self.reschedule_or_time_out(now, before_deadline)
    }

    fn reschedule_or_time_out(&self, now: Instant, before_deadline: bool) -> PollStep {
        if before_deadline {
            return PollStep::Reschedule;
        }
        let elapsed = now.saturating_duration_since(self.started);
        log::debug!(
            "scene poll timed out expression={:?} presence={:?} elapsed_ms={} polls={}",
            self.expression,
            self.presence,
            elapsed.as_millis(),
            self.polls
        );
        PollStep::Done(Err(SceneQueryError::Timeout {
            expression: self.expression.clone(),
            elapsed,
        }))
    }
}
