// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph model.

use crate::port::Port;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node within a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Entry points (root, events)
    Special,
    /// Blackboard variable access and debugging
    General,
    /// Math operations
    Math,
    /// Branching and comparisons
    Conditional,
    /// Timed effects
    Time,
    /// Damage and combat effects
    Combat,
    /// Character stats
    Stats,
    /// External occurrences
    Events,
    /// Custom/user-defined
    Custom,
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique runtime type tag
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Declared data inputs, in positional order
    pub inputs: Vec<Port>,
    /// Declared data outputs, in positional order
    pub outputs: Vec<Port>,
}

/// A node instance in a graph description.
///
/// Immutable once loaded; only the evaluator's cache and the variable store
/// change during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Unique instance ID
    pub id: NodeId,
    /// Runtime type tag, resolved through the node registry
    pub runtime_type: String,
    /// Node-specific configuration (selected options, constants)
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
    /// Declared data inputs; excludes the control input
    #[serde(default)]
    pub inputs: Vec<Port>,
    /// Declared data outputs; excludes the control output
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl NodeInstance {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        Self {
            id: NodeId::new(),
            runtime_type: node_type.id.clone(),
            parameters: IndexMap::new(),
            inputs: node_type.inputs.clone(),
            outputs: node_type.outputs.clone(),
        }
    }

    /// Set the instance id
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set a static parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Set the default value of a declared input
    pub fn with_input_default(mut self, port: &str, value: impl Into<Value>) -> Self {
        if let Some(p) = self.inputs.iter_mut().find(|p| p.name == port) {
            p.default_value = Some(value.into());
        }
        self
    }

    /// Get a static parameter
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// Get a string parameter
    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameter(key).and_then(Value::as_str)
    }

    /// Names of the declared inputs, in order
    pub fn input_port_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|p| p.name.as_str())
    }

    /// Names of the declared outputs, in order
    pub fn output_port_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|p| p.name.as_str())
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Positional index of a declared output
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.output_port_names().position(|n| n == name)
    }
}
