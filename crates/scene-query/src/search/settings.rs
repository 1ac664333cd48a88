//! Poller cadence, default timeouts and per-finder search options.
//!
//! Settings read from the environment fall back to the defaults below.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const POLL_INTERVAL_ENV: &str = "SCENE_QUERY_POLL_INTERVAL_MS";
const TIMEOUT_ENV: &str = "SCENE_QUERY_TIMEOUT_MS";

/// Poller cadence and the timeout used when a caller does not pass one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub default_timeout_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl PollSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source; empty or
    /// unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str, default: u64| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        Self {
            interval_ms: read(POLL_INTERVAL_ENV, DEFAULT_POLL_INTERVAL_MS),
            default_timeout_ms: read(TIMEOUT_ENV, DEFAULT_TIMEOUT_MS),
        }
    }

    /// Tick interval, never shorter than 1 ms.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// What a search returns when the caller needs a concrete element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ElementPolicy {
    /// Return logical nodes as matched, virtual or not.
    #[default]
    Logical,
    /// Every match must carry an element; a virtual match is a search error.
    RequireElement,
    /// Replace a virtual match by the nearest element-bearing node in its
    /// subtree. With `tolerate_missing`, a match with none is dropped
    /// instead of failing.
    NearestDescendant { tolerate_missing: bool },
}

/// Per-finder search options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FindOptions {
    pub element: ElementPolicy,
    /// Out-of-range bare indices raise a search error instead of matching
    /// nothing.
    pub strict_index: bool,
}
