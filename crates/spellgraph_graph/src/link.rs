// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::node::NodeId;
use crate::port::CONTROL_IN;
use serde::{Deserialize, Serialize};

/// A directed link from an output port to an input port.
///
/// Links into [`CONTROL_IN`] sequence execution; every other link carries data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source node ID
    pub source_node: NodeId,
    /// Source port name (an output, `Out`, or a trigger name)
    pub source_port: String,
    /// Target node ID
    pub target_node: NodeId,
    /// Target port name (a declared input or `In`)
    pub target_port: String,
}

impl Link {
    /// Create a new link
    pub fn new(
        source_node: impl Into<NodeId>,
        source_port: impl Into<String>,
        target_node: impl Into<NodeId>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            source_port: source_port.into(),
            target_node: target_node.into(),
            target_port: target_port.into(),
        }
    }

    /// Check if this link sequences execution rather than carrying data
    pub fn is_control(&self) -> bool {
        self.target_port == CONTROL_IN
    }
}
