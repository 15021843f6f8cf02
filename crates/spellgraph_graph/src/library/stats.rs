// SPDX-License-Identifier: MIT OR Apache-2.0
//! Character stat nodes.

use crate::host::{StatType, TargetSelector};
use crate::library::option_param;
use crate::node::{NodeCategory, NodeType};
use crate::port::Port;
use crate::registry::{ActionNode, ActionOutput, NodeContext, NodeInputs, NodeRegistry};
use crate::value::{Value, ValueType};

/// Register stat nodes
pub fn register(registry: &mut NodeRegistry) {
    registry.register_action(
        NodeType {
            id: "stat_get".to_string(),
            name: "Get Stat".to_string(),
            category: NodeCategory::Stats,
            description: "Read a stat of the player or target".to_string(),
            inputs: vec![],
            outputs: vec![Port::new("Value", ValueType::Float)],
        },
        || GetStat,
    );

    registry.register_action(
        NodeType {
            id: "stat_set".to_string(),
            name: "Set Stat".to_string(),
            category: NodeCategory::Stats,
            description: "Modify a stat of the player or target".to_string(),
            inputs: vec![Port::new("Value", ValueType::Float)],
            outputs: vec![
                Port::new("New Value", ValueType::Float),
                Port::new("Old Value", ValueType::Float),
            ],
        },
        || SetStat,
    );
}

fn selection(ctx: &NodeContext<'_>) -> (TargetSelector, StatType) {
    (
        option_param(ctx, "target", TargetSelector::Player),
        option_param(ctx, "stat", StatType::Health),
    )
}

/// Reads the selected stat
pub struct GetStat;

impl ActionNode for GetStat {
    fn execute(&self, _inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput {
        let (who, stat) = selection(ctx);
        let value = ctx.host.stat(who, stat);
        if value.is_none() {
            tracing::warn!(node = %ctx.node.id, ?who, ?stat, "stat unavailable");
        }
        value.map(Value::Float).into()
    }
}

/// Writes the selected stat, yielding `[new, old]`
pub struct SetStat;

impl ActionNode for SetStat {
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput {
        let (who, stat) = selection(ctx);
        let new = inputs.float(0);
        let Some(old) = ctx.host.set_stat(who, stat, new) else {
            tracing::warn!(node = %ctx.node.id, ?who, ?stat, "stat not writable");
            return ActionOutput::None;
        };
        tracing::debug!(node = %ctx.node.id, ?who, ?stat, old, new, "stat set");
        ActionOutput::ValueList(vec![Value::Float(new), Value::Float(old)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EffectHost, NoHost, SandboxHost};
    use crate::library::create_effect_registry;
    use crate::variable::VariableStore;
    use std::sync::Arc;

    fn with_ctx<R>(type_id: &str, host: Arc<dyn EffectHost>, f: impl FnOnce(&NodeContext<'_>) -> R) -> R {
        let registry = create_effect_registry();
        let node = registry
            .create_node(type_id)
            .unwrap()
            .with_parameter("stat", "ad")
            .with_parameter("target", "Target");
        let variables = VariableStore::default();
        let ctx = NodeContext {
            node: &node,
            variables: &variables,
            host: &host,
        };
        f(&ctx)
    }

    #[test]
    fn test_get_stat() {
        let host = Arc::new(SandboxHost::new().with_stat(TargetSelector::Target, StatType::Ad, 60.0));
        let out = with_ctx("stat_get", host, |ctx| GetStat.execute(&NodeInputs::default(), ctx));
        assert_eq!(out, ActionOutput::Value(Value::Float(60.0)));

        let out = with_ctx("stat_get", Arc::new(SandboxHost::new()), |ctx| {
            GetStat.execute(&NodeInputs::default(), ctx)
        });
        assert_eq!(out, ActionOutput::None);
    }

    #[test]
    fn test_set_stat_returns_new_then_old() {
        let host = Arc::new(SandboxHost::new().with_stat(TargetSelector::Target, StatType::Ad, 60.0));
        let inputs = NodeInputs::new(vec![Some(Value::Float(75.0))]);
        let out = with_ctx("stat_set", host.clone(), |ctx| SetStat.execute(&inputs, ctx));
        assert_eq!(
            out,
            ActionOutput::ValueList(vec![Value::Float(75.0), Value::Float(60.0)])
        );
        assert_eq!(host.stat(TargetSelector::Target, StatType::Ad), Some(75.0));
    }

    #[test]
    fn test_set_stat_refused_by_host() {
        let inputs = NodeInputs::new(vec![Some(Value::Float(75.0))]);
        let out = with_ctx("stat_set", Arc::new(NoHost), |ctx| SetStat.execute(&inputs, ctx));
        assert_eq!(out, ActionOutput::None);

        let host = Arc::new(SandboxHost::new());
        let out = with_ctx("stat_set", host.clone(), |ctx| SetStat.execute(&inputs, ctx));
        assert_eq!(out, ActionOutput::None);
        assert_eq!(host.stat(TargetSelector::Target, StatType::Ad), None);
    }
}
