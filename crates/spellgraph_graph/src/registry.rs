// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node behaviors and the registry that maps runtime type tags to them.
//!
//! Every behavior belongs to exactly one capability kind. The kind is fixed
//! when the type is registered, so the evaluator dispatches on a closed enum
//! instead of probing behaviors at runtime.

use crate::evaluation::Reentry;
use crate::host::EffectHost;
use crate::node::{NodeCategory, NodeInstance, NodeType};
use crate::value::Value;
use crate::variable::VariableStore;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use std::sync::Arc;

/// Positional input values of one node execution.
///
/// One slot per declared input, in declaration order. A slot is `None` only
/// for an unlinked untyped port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInputs(Vec<Option<Value>>);

impl NodeInputs {
    /// Wrap resolved input slots
    pub fn new(values: Vec<Option<Value>>) -> Self {
        Self(values)
    }

    /// Get the value at a position
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// Get a float, converting ints; `default` when absent or non-numeric
    pub fn float_or(&self, index: usize, default: f32) -> f32 {
        self.get(index).and_then(Value::as_f32).unwrap_or(default)
    }

    /// Get a float, zero when absent
    pub fn float(&self, index: usize) -> f32 {
        self.float_or(index, 0.0)
    }

    /// Get a bool, false when absent
    pub fn bool(&self, index: usize) -> bool {
        self.get(index).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no slots
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a node can see while it executes
pub struct NodeContext<'a> {
    /// The node instance being executed
    pub node: &'a NodeInstance,
    /// Variables of the graph instance
    pub variables: &'a VariableStore,
    /// Game-side collaborator
    pub host: &'a Arc<dyn EffectHost>,
}

/// Result of an action node
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput {
    /// A single value
    Value(Value),
    /// One value per declared output, in output order
    ValueList(Vec<Value>),
    /// Nothing
    None,
}

impl From<Value> for ActionOutput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Option<Value>> for ActionOutput {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::None, Self::Value)
    }
}

/// Named control-flow token selecting one outgoing branch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trigger(pub String);

impl Trigger {
    /// Create a trigger
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Trigger name, matched against link source ports
    pub fn into_name(self) -> String {
        self.0
    }
}

/// Single-shot computation, pure or side-effecting
pub trait ActionNode: Send + Sync {
    /// Execute the node
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput;
}

/// Selects exactly one of a finite set of named branches
pub trait ConditionNode: Send + Sync {
    /// Evaluate the condition
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> Trigger;
}

/// Long-running effect resolving later
pub trait StateNode: Send + Sync {
    /// Start the state; the returned future resolves when it is over
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> BoxFuture<'static, Option<Value>>;
}

/// Entry point driven by an external occurrence
pub trait EventNode: Send + Sync {
    /// Register `reenter` with the occurrence source.
    ///
    /// Each firing of `reenter` resumes traversal from this node's control output.
    fn subscribe(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>, reenter: Reentry);
}

/// Capability kind of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Designated start marker
    Root,
    /// See [`ActionNode`]
    Action,
    /// See [`ConditionNode`]
    Condition,
    /// See [`StateNode`]
    State,
    /// See [`EventNode`]
    Event,
}

/// A constructed node behavior
pub enum NodeBehavior {
    /// Start marker, does nothing
    Root,
    /// Action behavior
    Action(Box<dyn ActionNode>),
    /// Condition behavior
    Condition(Box<dyn ConditionNode>),
    /// State behavior
    State(Box<dyn StateNode>),
    /// Event behavior
    Event(Box<dyn EventNode>),
}

impl NodeBehavior {
    /// Capability kind of this behavior
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Root => NodeKind::Root,
            Self::Action(_) => NodeKind::Action,
            Self::Condition(_) => NodeKind::Condition,
            Self::State(_) => NodeKind::State,
            Self::Event(_) => NodeKind::Event,
        }
    }
}

type NodeFactory = Arc<dyn Fn() -> NodeBehavior + Send + Sync>;

struct RegistryEntry {
    node_type: NodeType,
    kind: NodeKind,
    factory: NodeFactory,
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered entries by type tag
    entries: IndexMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    fn insert(&mut self, node_type: NodeType, kind: NodeKind, factory: NodeFactory) {
        if self.entries.contains_key(&node_type.id) {
            tracing::warn!(node_type = %node_type.id, "replacing registered node type");
        }
        self.entries.insert(
            node_type.id.clone(),
            RegistryEntry {
                node_type,
                kind,
                factory,
            },
        );
    }

    /// Register the start marker type
    pub fn register_root(&mut self, node_type: NodeType) {
        self.insert(node_type, NodeKind::Root, Arc::new(|| NodeBehavior::Root));
    }

    /// Register an action type
    pub fn register_action<N, F>(&mut self, node_type: NodeType, factory: F)
    where
        N: ActionNode + 'static,
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.insert(
            node_type,
            NodeKind::Action,
            Arc::new(move || NodeBehavior::Action(Box::new(factory()))),
        );
    }

    /// Register a condition type
    pub fn register_condition<N, F>(&mut self, node_type: NodeType, factory: F)
    where
        N: ConditionNode + 'static,
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.insert(
            node_type,
            NodeKind::Condition,
            Arc::new(move || NodeBehavior::Condition(Box::new(factory()))),
        );
    }

    /// Register a state type
    pub fn register_state<N, F>(&mut self, node_type: NodeType, factory: F)
    where
        N: StateNode + 'static,
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.insert(
            node_type,
            NodeKind::State,
            Arc::new(move || NodeBehavior::State(Box::new(factory()))),
        );
    }

    /// Register an event type
    pub fn register_event<N, F>(&mut self, node_type: NodeType, factory: F)
    where
        N: EventNode + 'static,
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.insert(
            node_type,
            NodeKind::Event,
            Arc::new(move || NodeBehavior::Event(Box::new(factory()))),
        );
    }

    /// Construct a fresh behavior for a type tag
    pub fn resolve(&self, runtime_type: &str) -> Result<NodeBehavior, RegistryError> {
        self.entries
            .get(runtime_type)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| RegistryError::UnknownNodeType(runtime_type.to_string()))
    }

    /// Capability kind of a type tag
    pub fn kind(&self, runtime_type: &str) -> Option<NodeKind> {
        self.entries.get(runtime_type).map(|e| e.kind)
    }

    /// Check if a type tag is registered
    pub fn contains(&self, runtime_type: &str) -> bool {
        self.entries.contains_key(runtime_type)
    }

    /// Get a node type by tag
    pub fn get(&self, runtime_type: &str) -> Option<&NodeType> {
        self.entries.get(runtime_type).map(|e| &e.node_type)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.entries.values().map(|e| &e.node_type)
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types().filter(move |t| t.category == category)
    }

    /// Create a node instance from a type tag
    pub fn create_node(&self, runtime_type: &str) -> Option<NodeInstance> {
        self.get(runtime_type).map(NodeInstance::new)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when resolving a node type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// No behavior registered for the tag
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
}
