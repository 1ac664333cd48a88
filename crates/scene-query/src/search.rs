//! Searching a host's scene.
//!
//! This module provides:
//! - The host boundary trait and an in-process shared scene
//! - Synchronous finds and value getters
//! - Polled waits for presence or absence, gated on render quiescence

mod engine;
mod extract;
mod host;
mod poller;
mod settings;

#[cfg(test)]
mod tests;

pub use engine::{run_query, SceneFinder, Scope};
pub use extract::{attribute_value, context_value, data_value, property_value, text_content};
pub use host::{SceneHost, SharedScene};
pub use poller::{PollStep, Presence, StabilizationPoller, WaitOutcome};
pub use settings::{ElementPolicy, FindOptions, PollSettings};
