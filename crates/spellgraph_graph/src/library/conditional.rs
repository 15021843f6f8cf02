// SPDX-License-Identifier: MIT OR Apache-2.0
//! Branching and comparison nodes.

use crate::node::{NodeCategory, NodeType};
use crate::port::Port;
use crate::registry::{
    ActionNode, ActionOutput, ConditionNode, NodeContext, NodeInputs, NodeRegistry, Trigger,
};
use crate::value::{Value, ValueType};
use std::str::FromStr;

/// Register conditional nodes
pub fn register(registry: &mut NodeRegistry) {
    registry.register_condition(
        NodeType {
            id: "condition_bool".to_string(),
            name: "Bool".to_string(),
            category: NodeCategory::Conditional,
            description: "Branch on a bool".to_string(),
            inputs: vec![Port::new("Value", ValueType::Bool)],
            outputs: vec![Port::any("True"), Port::any("False")],
        },
        || BoolBranch,
    );

    registry.register_action(
        NodeType {
            id: "condition_comparison".to_string(),
            name: "Comparison".to_string(),
            category: NodeCategory::Conditional,
            description: "Compare two floats".to_string(),
            inputs: vec![Port::new("A", ValueType::Float), Port::new("B", ValueType::Float)],
            outputs: vec![Port::new("Result", ValueType::Bool)],
        },
        || Compare,
    );
}

/// Fires `True` or `False` depending on its input
pub struct BoolBranch;

impl ConditionNode for BoolBranch {
    fn execute(&self, inputs: &NodeInputs, _ctx: &NodeContext<'_>) -> Trigger {
        if inputs.bool(0) {
            Trigger::new("True")
        } else {
            Trigger::new("False")
        }
    }
}

/// Comparison operator selected by the `comparison` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    /// `<`
    #[default]
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
}

impl Comparison {
    /// Apply the operator
    pub fn compare(self, a: f32, b: f32) -> bool {
        match self {
            Self::Less => a < b,
            Self::Greater => a > b,
            Self::LessOrEqual => a <= b,
            Self::GreaterOrEqual => a >= b,
            Self::Equal => a == b,
            Self::NotEqual => a != b,
        }
    }
}

/// Unrecognized comparison operator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown comparison operator: {0}")]
pub struct UnknownComparison(pub String);

impl FromStr for Comparison {
    type Err = UnknownComparison;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Self::Less),
            ">" => Ok(Self::Greater),
            "<=" => Ok(Self::LessOrEqual),
            ">=" => Ok(Self::GreaterOrEqual),
            "==" => Ok(Self::Equal),
            "!=" => Ok(Self::NotEqual),
            other => Err(UnknownComparison(other.to_string())),
        }
    }
}

/// Compares `A` and `B`; an unknown operator yields false
pub struct Compare;

impl ActionNode for Compare {
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput {
        let (a, b) = (inputs.float(0), inputs.float(1));
        let result = match ctx.node.parameter_str("comparison").map(str::parse::<Comparison>) {
            None => Comparison::default().compare(a, b),
            Some(Ok(op)) => op.compare(a, b),
            Some(Err(error)) => {
                tracing::warn!(node = %ctx.node.id, %error, "comparison failed");
                false
            }
        };
        Value::Bool(result).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EffectHost, NoHost};
    use crate::library::create_effect_registry;
    use crate::variable::VariableStore;
    use std::sync::Arc;

    fn compare(op: Option<&str>, a: f32, b: f32) -> ActionOutput {
        let registry = create_effect_registry();
        let mut node = registry.create_node("condition_comparison").unwrap();
        if let Some(op) = op {
            node = node.with_parameter("comparison", op);
        }
        let variables = VariableStore::default();
        let host: Arc<dyn EffectHost> = Arc::new(NoHost);
        let ctx = NodeContext {
            node: &node,
            variables: &variables,
            host: &host,
        };
        let inputs = NodeInputs::new(vec![Some(Value::Float(a)), Some(Value::Float(b))]);
        Compare.execute(&inputs, &ctx)
    }

    #[test]
    fn test_operators() {
        let truth = ActionOutput::Value(Value::Bool(true));
        assert_eq!(compare(Some("<"), 1.0, 2.0), truth);
        assert_eq!(compare(Some(">="), 2.0, 2.0), truth);
        assert_eq!(compare(Some("!="), 1.0, 2.0), truth);
        assert_eq!(compare(Some("=="), 1.0, 2.0), ActionOutput::Value(Value::Bool(false)));
        // Defaults to "<"
        assert_eq!(compare(None, 1.0, 2.0), truth);
    }

    #[test]
    fn test_unknown_operator_is_false() {
        assert_eq!(compare(Some("<>"), 1.0, 2.0), ActionOutput::Value(Value::Bool(false)));
        assert!("=<".parse::<Comparison>().is_err());
    }

    #[test]
    fn test_bool_branch() {
        let registry = create_effect_registry();
        let node = registry.create_node("condition_bool").unwrap();
        let variables = VariableStore::default();
        let host: Arc<dyn EffectHost> = Arc::new(NoHost);
        let ctx = NodeContext {
            node: &node,
            variables: &variables,
            host: &host,
        };
        let yes = NodeInputs::new(vec![Some(Value::Bool(true))]);
        let no = NodeInputs::new(vec![Some(Value::Bool(false))]);
        assert_eq!(BoolBranch.execute(&yes, &ctx).into_name(), "True");
        assert_eq!(BoolBranch.execute(&no, &ctx).into_name(), "False");
    }
}
