// SPDX-License-Identifier: MIT OR Apache-2.0
//! Root marker and variable access nodes.

use crate::evaluation::EvaluationError;
use crate::node::{NodeCategory, NodeType};
use crate::port::Port;
use crate::registry::{ActionNode, ActionOutput, NodeContext, NodeInputs, NodeRegistry};
use crate::variable::Assignment;

/// Register special nodes
pub fn register(registry: &mut NodeRegistry) {
    registry.register_root(NodeType {
        id: "root".to_string(),
        name: "Root".to_string(),
        category: NodeCategory::Special,
        description: "Start of an effect".to_string(),
        inputs: vec![],
        outputs: vec![],
    });

    registry.register_action(
        NodeType {
            id: "get_var".to_string(),
            name: "Get Variable".to_string(),
            category: NodeCategory::Special,
            description: "Read an instance variable".to_string(),
            inputs: vec![],
            outputs: vec![Port::any("Value")],
        },
        || GetVariable,
    );

    registry.register_action(
        NodeType {
            id: "set_var".to_string(),
            name: "Set Variable".to_string(),
            category: NodeCategory::Special,
            description: "Write an instance variable".to_string(),
            inputs: vec![Port::any("Value")],
            outputs: vec![Port::any("New Value"), Port::any("Old Value")],
        },
        || SetVariable,
    );
}

fn variable_name<'a>(ctx: &'a NodeContext<'_>) -> Option<&'a str> {
    let name = ctx.node.parameter_str("variable");
    if name.is_none() {
        tracing::warn!(node = %ctx.node.id, "no variable selected");
    }
    name
}

/// Returns the current value of the `variable` parameter's variable
pub struct GetVariable;

impl ActionNode for GetVariable {
    fn execute(&self, _inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput {
        let Some(name) = variable_name(ctx) else {
            return ActionOutput::None;
        };
        let value = ctx.variables.value(name);
        if value.is_none() {
            let error = EvaluationError::VariableNotFound(name.to_string());
            tracing::warn!(node = %ctx.node.id, %error, "get_var failed");
        }
        value.into()
    }
}

/// Assigns its input, yielding `[new, old]`
pub struct SetVariable;

impl ActionNode for SetVariable {
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput {
        let Some(name) = variable_name(ctx) else {
            return ActionOutput::None;
        };
        let Some(value) = inputs.get(0).cloned() else {
            tracing::warn!(node = %ctx.node.id, variable = name, "no value to assign");
            return ActionOutput::None;
        };

        match ctx.variables.set(name, value) {
            Ok(Assignment { new, old }) => ActionOutput::ValueList(vec![new, old]),
            Err(error) => {
                let error = EvaluationError::from(error);
                tracing::warn!(node = %ctx.node.id, %error, "set_var failed");
                ActionOutput::None
            }
        }
    }
}
