// SPDX-License-Identifier: MIT OR Apache-2.0
//! General purpose nodes.

use crate::node::{NodeCategory, NodeType};
use crate::port::Port;
use crate::registry::{ActionNode, ActionOutput, NodeContext, NodeInputs, NodeRegistry};

/// Register general nodes
pub fn register(registry: &mut NodeRegistry) {
    registry.register_action(
        NodeType {
            id: "general_debug".to_string(),
            name: "Debug".to_string(),
            category: NodeCategory::General,
            description: "Log a value and its type".to_string(),
            inputs: vec![Port::any("Value")],
            outputs: vec![],
        },
        || DebugLog,
    );
}

/// Logs its input
pub struct DebugLog;

impl ActionNode for DebugLog {
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput {
        match inputs.get(0) {
            Some(value) => {
                tracing::info!(node = %ctx.node.id, %value, value_type = %value.value_type(), "debug");
            }
            None => tracing::info!(node = %ctx.node.id, "debug: no value"),
        }
        ActionOutput::None
    }
}
