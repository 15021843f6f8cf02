// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation and execution.
//!
//! An [`Evaluator`] binds one graph to one variable store and drives
//! demand-driven, memoized evaluation runs over it:
//!
//! - control links (into `In`) decide what runs next,
//! - data links are pulled on demand when a node resolves its inputs,
//! - every node executes at most once per run,
//! - a state node suspends only the branch that reached it.
//!
//! Failures are branch-local. They are logged, recorded in the diagnostics
//! log and never unwind past the entry points.

use crate::graph::{Graph, GraphError};
use crate::host::{EffectHost, NoHost};
use crate::node::{NodeId, NodeInstance};
use crate::registry::{
    ActionOutput, NodeBehavior, NodeContext, NodeInputs, NodeKind, NodeRegistry, RegistryError,
};
use crate::value::{Value, ValueType};
use crate::variable::{VariableError, VariableStore};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::Instrument;

/// Future value produced by a state node, awaitable by several consumers
pub type DeferredValue = Shared<BoxFuture<'static, Option<Value>>>;

/// Result of executing a node
#[derive(Clone)]
pub enum NodeResult {
    /// A single value
    Value(Value),
    /// One value per declared output, in output order
    ValueList(Vec<Value>),
    /// Named branch selected by a condition
    Trigger(String),
    /// Value that resolves later
    Deferred(DeferredValue),
    /// Nothing
    None,
}

impl fmt::Debug for NodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::ValueList(vs) => f.debug_tuple("ValueList").field(vs).finish(),
            Self::Trigger(t) => f.debug_tuple("Trigger").field(t).finish(),
            Self::Deferred(_) => f.write_str("Deferred"),
            Self::None => f.write_str("None"),
        }
    }
}

impl From<ActionOutput> for NodeResult {
    fn from(output: ActionOutput) -> Self {
        match output {
            ActionOutput::Value(v) => Self::Value(v),
            ActionOutput::ValueList(vs) => Self::ValueList(vs),
            ActionOutput::None => Self::None,
        }
    }
}

/// Evaluator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Refuse graphs whose data links form a cycle
    pub reject_cycles: bool,
    /// Longest control chain plus data chain a branch may walk
    pub max_depth: usize,
    /// Number of diagnostics kept before the oldest is dropped
    pub diagnostics_capacity: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            reject_cycles: true,
            max_depth: 512,
            diagnostics_capacity: 64,
        }
    }
}

/// A branch-local failure observed during a run
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Run number, unique per evaluator
    pub run: u64,
    /// Node whose branch was aborted
    pub node: NodeId,
    /// What went wrong
    pub error: EvaluationError,
}

type SharedEvaluation = Shared<BoxFuture<'static, Result<NodeResult, EvaluationError>>>;

enum CacheEntry {
    /// Execution started; later requests join it instead of executing again
    Pending(SharedEvaluation),
    Done(Result<NodeResult, EvaluationError>),
}

/// Per-run memo table and visited set
#[derive(Default)]
struct EvaluationCache {
    results: HashMap<NodeId, CacheEntry>,
    visited: HashSet<NodeId>,
}

impl EvaluationCache {
    /// Returns false if the node was already visited in this run
    fn mark_visited(&mut self, node_id: &NodeId) -> bool {
        self.visited.insert(node_id.clone())
    }
}

struct EvaluatorState {
    graph: Arc<Graph>,
    registry: Arc<NodeRegistry>,
    variables: VariableStore,
    host: Arc<dyn EffectHost>,
    config: EvaluatorConfig,
    subscribed: Mutex<HashSet<NodeId>>,
    diagnostics: Mutex<VecDeque<Diagnostic>>,
    next_run: AtomicU64,
}

impl EvaluatorState {
    fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NodeInstance> {
        self.graph
            .nodes()
            .filter(move |n| self.registry.kind(&n.runtime_type) == Some(kind))
    }

    fn record(&self, diagnostic: Diagnostic) {
        let mut diagnostics = self.diagnostics.lock();
        if diagnostics.len() >= self.config.diagnostics_capacity {
            diagnostics.pop_front();
        }
        if self.config.diagnostics_capacity > 0 {
            diagnostics.push_back(diagnostic);
        }
    }
}

/// Runs effect graphs against one graph instance.
///
/// Cloning yields another handle onto the same instance (same variables,
/// same subscriptions).
#[derive(Clone)]
pub struct Evaluator {
    state: Arc<EvaluatorState>,
}

impl Evaluator {
    /// Create an evaluator with no host and the default configuration
    pub fn new(graph: Arc<Graph>, registry: Arc<NodeRegistry>) -> Result<Self, EvaluationError> {
        Self::with_host(graph, registry, Arc::new(NoHost), EvaluatorConfig::default())
    }

    /// Create an evaluator bound to a host
    pub fn with_host(
        graph: Arc<Graph>,
        registry: Arc<NodeRegistry>,
        host: Arc<dyn EffectHost>,
        config: EvaluatorConfig,
    ) -> Result<Self, EvaluationError> {
        if config.reject_cycles {
            graph.data_dependency_order()?;
        }

        let variables = VariableStore::new(graph.variables().iter().cloned());
        Ok(Self {
            state: Arc::new(EvaluatorState {
                graph,
                registry,
                variables,
                host,
                config,
                subscribed: Mutex::new(HashSet::new()),
                diagnostics: Mutex::new(VecDeque::new()),
                next_run: AtomicU64::new(1),
            }),
        })
    }

    /// The graph being evaluated
    pub fn graph(&self) -> &Graph {
        &self.state.graph
    }

    /// Variables of this graph instance
    pub fn variables(&self) -> &VariableStore {
        &self.state.variables
    }

    /// Run the graph from its root node.
    ///
    /// A graph without a root is a no-op. The returned future completes once
    /// every branch, including suspended ones, has finished.
    pub fn start_execution(&self) -> BoxFuture<'static, ()> {
        let state = Arc::clone(&self.state);
        async move {
            let roots: Vec<NodeId> = state
                .nodes_of_kind(NodeKind::Root)
                .map(|n| n.id.clone())
                .collect();
            let Some(root) = roots.first().cloned() else {
                tracing::debug!(graph = %state.graph.name, "no root node, nothing to execute");
                return;
            };
            if roots.len() > 1 {
                tracing::warn!(graph = %state.graph.name, %root, count = roots.len(), "graph has several root nodes, using the first");
            }

            let run = Run::begin(state);
            let span = tracing::debug_span!("effect_run", run = run.id);
            run.traverse(root, 0).instrument(span).await;
        }
        .boxed()
    }

    /// Start [`Self::start_execution`] on the current tokio runtime
    pub fn spawn_execution(&self) -> Option<tokio::task::JoinHandle<()>> {
        spawn_on_current(self.start_execution())
    }

    /// Subscribe every event node of the graph.
    ///
    /// Each event node is traversed like a root: it subscribes, then its
    /// control output is followed once. Later occurrences resume through the
    /// node's [`Reentry`]. Event nodes that already subscribed on this
    /// evaluator are skipped, so calling this again only arms new ones.
    pub fn subscribe_events(&self) -> BoxFuture<'static, ()> {
        let state = Arc::clone(&self.state);
        async move {
            let events: Vec<NodeId> = {
                let subscribed = state.subscribed.lock();
                state
                    .nodes_of_kind(NodeKind::Event)
                    .filter(|n| !subscribed.contains(&n.id))
                    .map(|n| n.id.clone())
                    .collect()
            };
            if events.is_empty() {
                return;
            }

            let run = Run::begin(state);
            let span = tracing::debug_span!("event_subscription", run = run.id);
            join_all(events.into_iter().map(|node_id| run.traverse(node_id, 0)))
                .instrument(span)
                .await;
        }
        .boxed()
    }

    /// Read a variable of this graph instance
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.state.variables.value(name)
    }

    /// Write a variable of this graph instance
    pub fn set_variable(&self, name: &str, value: Value) -> Result<(), EvaluationError> {
        self.state.variables.set(name, value)?;
        Ok(())
    }

    /// Branch failures recorded so far, oldest first
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.state.diagnostics.lock().iter().cloned().collect()
    }

    /// Forget recorded diagnostics
    pub fn clear_diagnostics(&self) {
        self.state.diagnostics.lock().clear();
    }
}

/// Handle an occurrence source uses to resume an event node.
///
/// Each firing starts a fresh run that continues from the event node's
/// control output. The handle does not keep the evaluator alive; firing it
/// after the evaluator is gone does nothing.
#[derive(Clone)]
pub struct Reentry {
    state: Weak<EvaluatorState>,
    node_id: NodeId,
}

impl Reentry {
    /// The event node this handle resumes
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Resume traversal; completes when the resumed run has finished
    pub fn fire(&self) -> BoxFuture<'static, ()> {
        let state = self.state.upgrade();
        let node_id = self.node_id.clone();
        async move {
            let Some(state) = state else {
                tracing::debug!(node = %node_id, "evaluator dropped, ignoring event");
                return;
            };
            let run = Run::begin(state);
            let span = tracing::debug_span!("event_run", run = run.id, node = %node_id);
            run.resume_from(node_id).instrument(span).await;
        }
        .boxed()
    }

    /// Fire on the current tokio runtime without waiting
    pub fn spawn(&self) -> Option<tokio::task::JoinHandle<()>> {
        spawn_on_current(self.fire())
    }
}

impl fmt::Debug for Reentry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reentry")
            .field("node_id", &self.node_id)
            .field("live", &(self.state.strong_count() > 0))
            .finish()
    }
}

fn spawn_on_current(future: BoxFuture<'static, ()>) -> Option<tokio::task::JoinHandle<()>> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(future)),
        Err(error) => {
            tracing::error!(%error, "no tokio runtime to spawn on");
            None
        }
    }
}

/// One evaluation run: a cache scoped to a single entry-point call chain
struct Run {
    id: u64,
    state: Arc<EvaluatorState>,
    cache: Mutex<EvaluationCache>,
}

impl Run {
    fn begin(state: Arc<EvaluatorState>) -> Arc<Self> {
        let id = state.next_run.fetch_add(1, Ordering::Relaxed);
        Arc::new(Self {
            id,
            state,
            cache: Mutex::new(EvaluationCache::default()),
        })
    }

    fn report(&self, node_id: &NodeId, error: EvaluationError) {
        tracing::warn!(run = self.id, node = %node_id, %error, "branch aborted");
        self.state.record(Diagnostic {
            run: self.id,
            node: node_id.clone(),
            error,
        });
    }

    /// Execute a node reached through control flow, then route from it
    fn traverse(self: &Arc<Self>, node_id: NodeId, depth: usize) -> BoxFuture<'static, ()> {
        let run = Arc::clone(self);
        async move {
            if !run.cache.lock().mark_visited(&node_id) {
                tracing::trace!(node = %node_id, "already visited");
                return;
            }

            match run.evaluate(node_id.clone(), Vec::new(), depth).await {
                Ok(result) => run.route(node_id, result, depth).await,
                Err(error) => run.report(&node_id, error),
            }
        }
        .boxed()
    }

    /// Continue from an event node's control output without executing it again
    async fn resume_from(self: &Arc<Self>, node_id: NodeId) {
        {
            let mut cache = self.cache.lock();
            cache.mark_visited(&node_id);
            cache
                .results
                .insert(node_id.clone(), CacheEntry::Done(Ok(NodeResult::None)));
        }
        self.route(node_id, NodeResult::None, 0).await;
    }

    /// Follow the outgoing control links selected by `result`
    async fn route(self: &Arc<Self>, node_id: NodeId, result: NodeResult, depth: usize) {
        // Collect first, traverse after
        let targets: Vec<NodeId> = {
            let trigger = match &result {
                NodeResult::Trigger(name) => Some(name.as_str()),
                _ => None,
            };
            self.state
                .graph
                .control_links_from(&node_id, trigger)
                .map(|l| l.target_node.clone())
                .collect()
        };

        if let NodeResult::Deferred(future) = result {
            tracing::debug!(node = %node_id, "branch suspended");
            future.await;
            tracing::debug!(node = %node_id, "branch resumed");
        }

        join_all(targets.into_iter().map(|target| self.traverse(target, depth + 1))).await;
    }

    /// Memoized execution of a node.
    ///
    /// `chain` holds the nodes whose inputs are being resolved above this one.
    fn evaluate(
        self: &Arc<Self>,
        node_id: NodeId,
        chain: Vec<NodeId>,
        depth: usize,
    ) -> BoxFuture<'static, Result<NodeResult, EvaluationError>> {
        let run = Arc::clone(self);
        async move {
            if chain.contains(&node_id) {
                return Err(EvaluationError::CycleDetected(node_id));
            }
            let limit = run.state.config.max_depth;
            if depth + chain.len() > limit {
                return Err(EvaluationError::DepthExceeded { node: node_id, limit });
            }

            let pending = {
                let mut cache = run.cache.lock();
                match cache.results.get(&node_id) {
                    Some(CacheEntry::Done(outcome)) => return outcome.clone(),
                    Some(CacheEntry::Pending(pending)) => pending.clone(),
                    None => {
                        let mut chain = chain;
                        chain.push(node_id.clone());
                        let pending = run.execute(node_id.clone(), chain, depth).shared();
                        cache
                            .results
                            .insert(node_id.clone(), CacheEntry::Pending(pending.clone()));
                        pending
                    }
                }
            };

            let outcome = pending.await;
            run.cache
                .lock()
                .results
                .insert(node_id, CacheEntry::Done(outcome.clone()));
            outcome
        }
        .boxed()
    }

    fn execute(
        self: &Arc<Self>,
        node_id: NodeId,
        chain: Vec<NodeId>,
        depth: usize,
    ) -> BoxFuture<'static, Result<NodeResult, EvaluationError>> {
        let run = Arc::clone(self);
        async move {
            let state = Arc::clone(&run.state);
            let node = state
                .graph
                .node(&node_id)
                .ok_or_else(|| EvaluationError::DanglingNode(node_id.clone()))?;
            let kind = state
                .registry
                .kind(&node.runtime_type)
                .ok_or_else(|| EvaluationError::UnknownNodeType(node.runtime_type.clone()))?;

            match kind {
                NodeKind::Root => return Ok(NodeResult::None),
                NodeKind::Event => {
                    let first = state.subscribed.lock().insert(node_id.clone());
                    if !first {
                        tracing::debug!(node = %node_id, "event node already subscribed");
                        return Ok(NodeResult::None);
                    }
                }
                _ => {}
            }

            let inputs = run.resolve_inputs(node, &chain, depth).await?;
            let behavior = state.registry.resolve(&node.runtime_type)?;
            let ctx = NodeContext {
                node,
                variables: &state.variables,
                host: &state.host,
            };

            tracing::debug!(run = run.id, node = %node_id, runtime_type = %node.runtime_type, "executing node");
            let result = match behavior {
                NodeBehavior::Root => NodeResult::None,
                NodeBehavior::Action(action) => action.execute(&inputs, &ctx).into(),
                NodeBehavior::Condition(condition) => {
                    NodeResult::Trigger(condition.execute(&inputs, &ctx).into_name())
                }
                NodeBehavior::State(state_node) => {
                    NodeResult::Deferred(state_node.execute(&inputs, &ctx).shared())
                }
                NodeBehavior::Event(event) => {
                    let reentry = Reentry {
                        state: Arc::downgrade(&state),
                        node_id: node_id.clone(),
                    };
                    event.subscribe(&inputs, &ctx, reentry);
                    NodeResult::None
                }
            };
            tracing::trace!(node = %node_id, ?result, "node executed");
            Ok(result)
        }
        .boxed()
    }

    /// Walk the data links into `node`, one slot per declared input
    async fn resolve_inputs(
        self: &Arc<Self>,
        node: &NodeInstance,
        chain: &[NodeId],
        depth: usize,
    ) -> Result<NodeInputs, EvaluationError> {
        let graph = &self.state.graph;
        let mut values = Vec::with_capacity(node.inputs.len());

        for port in &node.inputs {
            let Some(link) = graph.links_into(&node.id, &port.name).next() else {
                values.push(port.placeholder());
                continue;
            };

            let source = graph
                .node(&link.source_node)
                .ok_or_else(|| EvaluationError::DanglingNode(link.source_node.clone()))?;
            if self.state.registry.kind(&source.runtime_type) == Some(NodeKind::Root) {
                values.push(port.placeholder());
                continue;
            }

            let value = match self.evaluate(source.id.clone(), chain.to_vec(), depth).await? {
                NodeResult::ValueList(list) => {
                    let index = source.output_index(&link.source_port).ok_or_else(|| {
                        EvaluationError::DanglingPort {
                            node: source.id.clone(),
                            port: link.source_port.clone(),
                        }
                    })?;
                    list.get(index).cloned()
                }
                NodeResult::Value(value) => Some(value),
                NodeResult::Deferred(future) => future.await,
                NodeResult::Trigger(_) | NodeResult::None => None,
            };

            let value = match value.map(|v| (v.value_type(), port.accept(v))) {
                Some((_, Some(accepted))) => Some(accepted),
                Some((found, None)) => {
                    tracing::warn!(
                        node = %node.id,
                        port = %port.name,
                        %found,
                        "incompatible input value, using default"
                    );
                    port.placeholder()
                }
                None => port.placeholder(),
            };
            values.push(value);
        }

        Ok(NodeInputs::new(values))
    }
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// No behavior registered for a runtime type
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A link references a node that is not in the graph
    #[error("Node not found: {0}")]
    DanglingNode(NodeId),

    /// A link references a port the node does not declare
    #[error("Port '{port}' not declared on node {node}")]
    DanglingPort {
        /// Node the link points at
        node: NodeId,
        /// Missing port
        port: String,
    },

    /// Value not assignable to a variable
    #[error("Variable '{name}' expects {expected}, got {found}")]
    VariableTypeMismatch {
        /// Variable name
        name: String,
        /// Declared type
        expected: ValueType,
        /// Rejected type
        found: ValueType,
    },

    /// No variable with this name
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// Data links form a cycle through this node
    #[error("Graph contains a data cycle through node {0}")]
    CycleDetected(NodeId),

    /// Branch walked deeper than the configured limit
    #[error("Traversal depth limit {limit} exceeded at node {node}")]
    DepthExceeded {
        /// Node where the limit was hit
        node: NodeId,
        /// Configured limit
        limit: usize,
    },

    /// Graph rejected for another structural reason
    #[error(transparent)]
    InvalidGraph(GraphError),

    /// Other variable store failure
    #[error(transparent)]
    Variable(VariableError),
}

impl From<RegistryError> for EvaluationError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::UnknownNodeType(t) => Self::UnknownNodeType(t),
        }
    }
}

impl From<VariableError> for EvaluationError {
    fn from(error: VariableError) -> Self {
        match error {
            VariableError::NotFound(name) => Self::VariableNotFound(name),
            VariableError::TypeMismatch {
                name,
                expected,
                found,
            } => Self::VariableTypeMismatch {
                name,
                expected,
                found,
            },
            other => Self::Variable(other),
        }
    }
}

impl From<GraphError> for EvaluationError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::CycleDetected(node) => Self::CycleDetected(node),
            other => Self::InvalidGraph(other),
        }
    }
}
