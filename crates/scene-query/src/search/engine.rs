//! Search entry points: synchronous finds and polled waits.

use std::time::{Duration, Instant};

use fnv::FnvHashSet;
use serde_json::Value;

use crate::error::{Result, SceneQueryError};
use crate::query::{Identifier, QueryParser, TreeMatcher};
use crate::storage::{NodeId, NodeView, RootKey, SceneTree};

use super::extract::{attribute_value, context_value, data_value, property_value, text_content};
use super::host::SceneHost;
use super::poller::{PollStep, Presence, StabilizationPoller, WaitOutcome};
use super::settings::{ElementPolicy, FindOptions, PollSettings};

/// Initial working set of a search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    /// Every mounted root.
    #[default]
    Everywhere,
    /// One mounted root.
    Root(RootKey),
    /// The subtree of one node, the node included.
    Node(NodeId),
}

impl Scope {
    /// Top nodes for the scope; empty when the root or node is gone.
    fn top_nodes(&self, tree: &SceneTree) -> Vec<NodeId> {
        match self {
            Self::Everywhere => tree.root_ids(),
            Self::Root(key) => tree.root(key).into_iter().collect(),
            Self::Node(id) => tree.contains(*id).then_some(*id).into_iter().collect(),
        }
    }
}

/// Runs parsed identifiers against one tree snapshot and applies the
/// element policy to the result.
pub fn run_query(
    tree: &SceneTree,
    identifiers: &[Identifier],
    scope: &Scope,
    options: &FindOptions,
) -> Result<Vec<NodeId>> {
    let matches = TreeMatcher::new(tree, scope.top_nodes(tree))
        .with_strict_index(options.strict_index)
        .find(identifiers)?;
    apply_element_policy(tree, matches, options.element)
}

fn apply_element_policy(
    tree: &SceneTree,
    matches: Vec<NodeId>,
    policy: ElementPolicy,
) -> Result<Vec<NodeId>> {
    match policy {
        ElementPolicy::Logical => Ok(matches),
        ElementPolicy::RequireElement => {
            if let Some(virtual_node) = matches
                .iter()
                .find(|id| tree.get(**id).is_some_and(|node| node.is_virtual()))
            {
                return Err(SceneQueryError::Search(format!(
                    "virtual node present: {}",
                    NodeView::new(tree, *virtual_node).describe()
                )));
            }
            Ok(matches)
        }
        ElementPolicy::NearestDescendant { tolerate_missing } => {
            let mut resolved = Vec::with_capacity(matches.len());
            let mut seen = FnvHashSet::default();
            for id in matches {
                match NodeView::new(tree, id).nearest_element_descendant() {
                    Some(element) => {
                        if seen.insert(element) {
                            resolved.push(element);
                        }
                    }
                    None if tolerate_missing => {}
                    None => {
                        return Err(SceneQueryError::Search(format!(
                            "virtual node present with no element below it: {}",
                            NodeView::new(tree, id).describe()
                        )))
                    }
                }
            }
            Ok(resolved)
        }
    }
}

// ---------------------------------------------------------------------------
// SceneFinder
// ---------------------------------------------------------------------------

/// Query front end bound to one host.
///
/// Synchronous methods read the current snapshot once. Async methods poll
/// the host until the tree is quiescent and the wait is satisfied, or the
/// timeout elapses. Returned [`NodeId`]s are only meaningful against the
/// snapshot they came from.
#[derive(Debug)]
pub struct SceneFinder<H> {
    host: H,
    settings: PollSettings,
    options: FindOptions,
}

impl<H: SceneHost> SceneFinder<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            settings: PollSettings::default(),
            options: FindOptions::default(),
        }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_options(mut self, options: FindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// All matches across every mounted root.
    pub fn find_all(&self, expression: &str) -> Result<Vec<NodeId>> {
        self.find_all_in(expression, &Scope::Everywhere)
    }

    pub fn find_all_in(&self, expression: &str, scope: &Scope) -> Result<Vec<NodeId>> {
        let identifiers = QueryParser::parse(expression)?;
        let matches = self.search(&identifiers, scope)?;
        log::debug!(
            "scene find expression={expression:?} scope={scope:?} matches={}",
            matches.len()
        );
        Ok(matches)
    }

    pub fn find_first(&self, expression: &str) -> Result<Option<NodeId>> {
        Ok(self.find_all(expression)?.into_iter().next())
    }

    /// First match that carries an element, resolving virtual matches to
    /// their nearest element descendant.
    pub fn find_element(&self, expression: &str) -> Result<Option<NodeId>> {
        let identifiers = QueryParser::parse(expression)?;
        let options = FindOptions {
            element: match self.options.element {
                ElementPolicy::Logical => ElementPolicy::NearestDescendant {
                    tolerate_missing: true,
                },
                policy => policy,
            },
            ..self.options
        };
        self.host.with_tree(|tree| {
            run_query(tree, &identifiers, &Scope::Everywhere, &options)
                .map(|matches| matches.into_iter().next())
        })?
    }

    /// Waits for at least one match.
    pub async fn find_within(&self, expression: &str, timeout: Duration) -> Result<WaitOutcome> {
        self.wait(expression, Presence::Present, timeout).await
    }

    pub async fn find_within_default(&self, expression: &str) -> Result<WaitOutcome> {
        self.find_within(expression, self.settings.default_timeout())
            .await
    }

    /// Waits until the expression matches nothing.
    pub async fn wait_until_absent(
        &self,
        expression: &str,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        self.wait(expression, Presence::Absent, timeout).await
    }

    async fn wait(
        &self,
        expression: &str,
        presence: Presence,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        let identifiers = QueryParser::parse(expression)?;
        self.host.flush_pending_render();

        let frames = self.host.frame_counter();
        let mut poller =
            StabilizationPoller::start(expression, presence, timeout, frames, Instant::now());
        loop {
            tokio::time::sleep(self.settings.interval()).await;
            let step = poller.check(Instant::now(), frames, || {
                self.search(&identifiers, &Scope::Everywhere)
            });
            if let PollStep::Done(result) = step {
                return result;
            }
        }
    }

    fn search(&self, identifiers: &[Identifier], scope: &Scope) -> Result<Vec<NodeId>> {
        self.host
            .with_tree(|tree| run_query(tree, identifiers, scope, &self.options))?
    }

    // -----------------------------------------------------------------------
    // Value getters
    // -----------------------------------------------------------------------

    pub fn attribute(&self, expression: &str, name: &str) -> Result<Option<Value>> {
        self.read_first(expression, |tree, id| attribute_value(tree, id, name))
    }

    pub fn property(&self, expression: &str, name: &str) -> Result<Option<Value>> {
        self.read_first(expression, |tree, id| property_value(tree, id, name))
    }

    pub fn data(&self, expression: &str, name: &str) -> Result<Option<Value>> {
        self.read_first(expression, |tree, id| data_value(tree, id, name))
    }

    pub fn context(&self, expression: &str, name: &str) -> Result<Option<Value>> {
        self.read_first(expression, |tree, id| context_value(tree, id, name))
    }

    pub fn text(&self, expression: &str) -> Result<Option<String>> {
        self.read_first(expression, text_content)
    }

    /// Runs the query and reads from its first match within one snapshot.
    fn read_first<T>(
        &self,
        expression: &str,
        read: impl FnOnce(&SceneTree, NodeId) -> Option<T>,
    ) -> Result<Option<T>> {
        let identifiers = QueryParser::parse(expression)?;
        self.host.with_tree(|tree| {
            let matches = run_query(tree, &identifiers, &Scope::Everywhere, &self.options)?;
            Ok(matches.first().and_then(|id| read(tree, *id)))
        })?
    }
}
