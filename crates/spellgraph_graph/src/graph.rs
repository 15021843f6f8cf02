// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph description and the immutable graph model built from it.

use crate::evaluation::EvaluationError;
use crate::link::Link;
use crate::node::{NodeId, NodeInstance};
use crate::port::{CONTROL_IN, CONTROL_OUT};
use crate::registry::NodeRegistry;
use crate::variable::Variable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declarative graph as produced by the authoring layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Graph name
    pub name: String,
    /// Node records
    #[serde(default)]
    pub nodes: Vec<NodeInstance>,
    /// Link records
    #[serde(default)]
    pub links: Vec<Link>,
    /// Instance variable declarations
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl GraphDescription {
    /// Create a new empty description
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a node record
    pub fn add_node(&mut self, node: NodeInstance) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Add a link record between two ports
    pub fn link(
        &mut self,
        source_node: &NodeId,
        source_port: &str,
        target_node: &NodeId,
        target_port: &str,
    ) {
        self.links.push(Link::new(
            source_node.clone(),
            source_port,
            target_node.clone(),
            target_port,
        ));
    }

    /// Add a control link from `Out` to `In`
    pub fn sequence(&mut self, source_node: &NodeId, target_node: &NodeId) {
        self.link(source_node, CONTROL_OUT, target_node, CONTROL_IN);
    }

    /// Declare an instance variable
    pub fn add_variable(&mut self, variable: Variable) {
        self.variables.push(variable);
    }

    /// Copy declared ports from the registry into nodes that list none.
    ///
    /// Hand-written descriptions only need to spell out ports whose defaults
    /// they override. Nodes of unknown types are left untouched.
    pub fn fill_declared_ports(&mut self, registry: &NodeRegistry) {
        for node in &mut self.nodes {
            let Some(node_type) = registry.get(&node.runtime_type) else {
                continue;
            };
            if node.inputs.is_empty() {
                node.inputs = node_type.inputs.clone();
            }
            if node.outputs.is_empty() {
                node.outputs = node_type.outputs.clone();
            }
        }
    }
}

/// Immutable in-memory graph: nodes, links and variable declarations
#[derive(Debug, Clone)]
pub struct Graph {
    /// Graph name
    pub name: String,
    nodes: IndexMap<NodeId, NodeInstance>,
    links: Vec<Link>,
    variables: Vec<Variable>,
}

impl Graph {
    /// Build a graph from a description.
    ///
    /// Node ids and variable names must be unique. Links are kept as-is, so a
    /// link may still reference a missing node; evaluation handles that per
    /// branch.
    pub fn from_description(description: GraphDescription) -> Result<Self, GraphError> {
        let mut nodes = IndexMap::with_capacity(description.nodes.len());
        for node in description.nodes {
            if nodes.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode(node.id));
            }
            nodes.insert(node.id.clone(), node);
        }

        let mut names = HashSet::new();
        for variable in &description.variables {
            if !names.insert(variable.name.as_str()) {
                return Err(GraphError::DuplicateVariable(variable.name.clone()));
            }
        }

        Ok(Self {
            name: description.name,
            nodes,
            links: description.links,
            variables: description.variables,
        })
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&NodeInstance> {
        self.nodes.get(node_id)
    }

    /// Get all nodes, in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get links leaving a node
    pub fn links_from<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.source_node == *node_id)
    }

    /// Get links entering a specific port of a node
    pub fn links_into<'a>(
        &'a self,
        node_id: &'a NodeId,
        port: &'a str,
    ) -> impl Iterator<Item = &'a Link> + 'a {
        self.links
            .iter()
            .filter(move |l| l.target_node == *node_id && l.target_port == port)
    }

    /// Get control links leaving a node, optionally only from one trigger port
    pub fn control_links_from<'a>(
        &'a self,
        node_id: &'a NodeId,
        trigger: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Link> + 'a {
        self.links_from(node_id)
            .filter(|l| l.is_control())
            .filter(move |l| trigger.map_or(true, |t| l.source_port == t))
    }

    /// Get a variable declaration by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Get all variable declarations
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Get nodes in data-dependency order (sources before consumers).
    ///
    /// Only data links count: control cycles are bounded by the evaluator's
    /// visited set, data cycles would recurse without end.
    pub fn data_dependency_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        node_id: &'a NodeId,
        visited: &mut HashSet<&'a NodeId>,
        temp_mark: &mut HashSet<&'a NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), GraphError> {
        if temp_mark.contains(node_id) {
            return Err(GraphError::CycleDetected(node_id.clone()));
        }
        if visited.contains(node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit every node this one pulls data from
        for link in self.links.iter().filter(|l| l.target_node == *node_id && !l.is_control()) {
            if self.nodes.contains_key(&link.source_node) {
                self.visit(&link.source_node, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(node_id);
        visited.insert(node_id);
        order.push(node_id.clone());

        Ok(())
    }

    /// Report structural problems without rejecting the graph.
    ///
    /// Covers unknown runtime types, links to missing nodes and links to
    /// ports the node does not declare.
    pub fn validate(&self, registry: &NodeRegistry) -> Vec<EvaluationError> {
        let mut issues = Vec::new();

        for node in self.nodes.values() {
            if !registry.contains(&node.runtime_type) {
                issues.push(EvaluationError::UnknownNodeType(node.runtime_type.clone()));
            }
        }

        for link in &self.links {
            match self.nodes.get(&link.source_node) {
                None => issues.push(EvaluationError::DanglingNode(link.source_node.clone())),
                Some(source) => {
                    if link.source_port != CONTROL_OUT && source.output_index(&link.source_port).is_none() {
                        issues.push(EvaluationError::DanglingPort {
                            node: source.id.clone(),
                            port: link.source_port.clone(),
                        });
                    }
                }
            }
            match self.nodes.get(&link.target_node) {
                None => issues.push(EvaluationError::DanglingNode(link.target_node.clone())),
                Some(target) => {
                    if !link.is_control() && target.input(&link.target_port).is_none() {
                        issues.push(EvaluationError::DanglingPort {
                            node: target.id.clone(),
                            port: link.target_port.clone(),
                        });
                    }
                }
            }
        }

        issues
    }
}

impl TryFrom<GraphDescription> for Graph {
    type Error = GraphError;

    fn try_from(description: GraphDescription) -> Result<Self, Self::Error> {
        Self::from_description(description)
    }
}

/// Error when building a graph from a description
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Two nodes share an id
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Two variables share a name
    #[error("Duplicate variable: {0}")]
    DuplicateVariable(String),

    /// Data links form a cycle through this node
    #[error("Graph contains a data cycle through node {0}")]
    CycleDetected(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::create_effect_registry;
    use crate::value::ValueType;

    fn add_chain() -> (GraphDescription, NodeId, NodeId, NodeId) {
        let registry = create_effect_registry();
        let mut desc = GraphDescription::new("chain");
        let root = desc.add_node(registry.create_node("root").unwrap().with_id("root"));
        let a = desc.add_node(registry.create_node("math_add").unwrap().with_id("a"));
        let b = desc.add_node(registry.create_node("math_multiply").unwrap().with_id("b"));
        desc.sequence(&root, &b);
        desc.link(&a, "Result", &b, "A");
        (desc, root, a, b)
    }

    #[test]
    fn test_structural_queries() {
        let (desc, root, a, b) = add_chain();
        let graph = Graph::from_description(desc).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.links_from(&root).count(), 1);
        assert_eq!(graph.links_into(&b, "A").next().unwrap().source_node, a);
        assert_eq!(graph.links_into(&b, "B").count(), 0);
        assert_eq!(graph.control_links_from(&root, None).count(), 1);
        assert_eq!(graph.control_links_from(&a, None).count(), 0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let (mut desc, ..) = add_chain();
        let dup = desc.nodes[1].clone();
        desc.add_node(dup);
        assert_eq!(
            Graph::from_description(desc).unwrap_err(),
            GraphError::DuplicateNode(NodeId::from("a"))
        );
    }

    #[test]
    fn test_duplicate_variables_rejected() {
        let (mut desc, ..) = add_chain();
        desc.add_variable(Variable::new("x", ValueType::Int));
        desc.add_variable(Variable::new("x", ValueType::Float));
        assert!(matches!(
            Graph::from_description(desc),
            Err(GraphError::DuplicateVariable(_))
        ));
    }

    #[test]
    fn test_dependency_order() {
        let (desc, _, a, b) = add_chain();
        let graph = Graph::from_description(desc).unwrap();
        let order = graph.data_dependency_order().unwrap();
        let pos = |id: &NodeId| order.iter().position(|n| n == id).unwrap();
        assert!(pos(&a) < pos(&b));
    }

    #[test]
    fn test_data_cycle_detected() {
        let (mut desc, _, a, b) = add_chain();
        desc.link(&b, "Result", &a, "A");
        let graph = Graph::from_description(desc).unwrap();
        assert!(matches!(
            graph.data_dependency_order(),
            Err(GraphError::CycleDetected(_))
        ));
    }

    #[test]
    fn test_control_cycle_allowed() {
        let (mut desc, root, _, b) = add_chain();
        desc.sequence(&b, &root);
        let graph = Graph::from_description(desc).unwrap();
        assert!(graph.data_dependency_order().is_ok());
    }

    #[test]
    fn test_description_round_trips() {
        let (mut desc, ..) = add_chain();
        desc.add_variable(Variable::with_value("mana", 50.0));

        let ron_text = ron::to_string(&desc).unwrap();
        let from_ron: GraphDescription = ron::from_str(&ron_text).unwrap();
        assert_eq!(from_ron.nodes.len(), 3);
        assert_eq!(from_ron.links, desc.links);

        let json_text = serde_json::to_string(&desc).unwrap();
        let from_json: GraphDescription = serde_json::from_str(&json_text).unwrap();
        assert_eq!(from_json.variables, desc.variables);
    }

    #[test]
    fn test_hand_written_ron_gets_declared_ports() {
        let text = r#"(
            name: "tiny",
            nodes: [
                (id: "root", runtime_type: "root"),
                (id: "add", runtime_type: "math_add", inputs: [
                    (name: "A", value_type: Some(Float), default_value: Some(Float(5.0))),
                    (name: "B", value_type: Some(Float)),
                ]),
                (id: "set", runtime_type: "set_var", parameters: {"variable": String("mana")}),
            ],
            links: [
                (source_node: "root", source_port: "Out", target_node: "set", target_port: "In"),
                (source_node: "add", source_port: "Result", target_node: "set", target_port: "Value"),
            ],
            variables: [(name: "mana", value_type: Float, value: Float(0.0))],
        )"#;
        let registry = create_effect_registry();
        let mut desc: GraphDescription = ron::from_str(text).unwrap();
        desc.fill_declared_ports(&registry);

        let graph = Graph::from_description(desc).unwrap();
        assert!(graph.validate(&registry).is_empty());
        let set = graph.node(&NodeId::from("set")).unwrap();
        assert_eq!(set.output_index("Old Value"), Some(1));
        let add = graph.node(&NodeId::from("add")).unwrap();
        assert_eq!(add.outputs.len(), 1);
        assert_eq!(add.parameter_str("variable"), None);
    }

    #[test]
    fn test_validate_reports_dangling_references() {
        let registry = create_effect_registry();
        let (mut desc, root, _, b) = add_chain();
        desc.sequence(&root, &NodeId::from("missing"));
        desc.link(&b, "Nope", &root, "In");
        desc.link(&root, "Out", &b, "C");
        desc.add_node(NodeInstance {
            id: NodeId::from("odd"),
            runtime_type: "no_such_type".to_string(),
            parameters: IndexMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        });
        let graph = Graph::from_description(desc).unwrap();
        let issues = graph.validate(&registry);

        assert!(issues.contains(&EvaluationError::UnknownNodeType("no_such_type".to_string())));
        assert!(issues.contains(&EvaluationError::DanglingNode(NodeId::from("missing"))));
        assert!(issues.contains(&EvaluationError::DanglingPort {
            node: b.clone(),
            port: "Nope".to_string()
        }));
        assert!(issues.contains(&EvaluationError::DanglingPort {
            node: b,
            port: "C".to_string()
        }));
        assert_eq!(issues.len(), 4);
    }
}
