// SPDX-License-Identifier: MIT OR Apache-2.0
//! Combat nodes.

use crate::host::{DamageType, StatType, TargetSelector};
use crate::library::option_param;
use crate::node::{NodeCategory, NodeType};
use crate::port::Port;
use crate::registry::{ActionNode, ActionOutput, NodeContext, NodeInputs, NodeRegistry};
use crate::value::{Value, ValueType};

/// Register combat nodes
pub fn register(registry: &mut NodeRegistry) {
    registry.register_action(
        NodeType {
            id: "combat_damage".to_string(),
            name: "Damage".to_string(),
            category: NodeCategory::Combat,
            description: "Deal damage to a target".to_string(),
            inputs: vec![Port::new("Damage", ValueType::Float)],
            outputs: vec![Port::new("Dealt", ValueType::Float)],
        },
        || Damage,
    );
}

/// Mitigates `Damage` by the target's resistance and removes it from health.
///
/// Parameters: `damage_type` (default physical), `target` (default the
/// current target).
pub struct Damage;

impl ActionNode for Damage {
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> ActionOutput {
        let damage_type = option_param(ctx, "damage_type", DamageType::Physical);
        let who = option_param(ctx, "target", TargetSelector::Target);

        let resistance = damage_type
            .resistance()
            .and_then(|stat| ctx.host.stat(who, stat))
            .unwrap_or(0.0);
        let dealt = damage_type.mitigate(inputs.float(0), resistance);

        match ctx.host.stat(who, StatType::Health) {
            Some(health) => {
                ctx.host.set_stat(who, StatType::Health, health - dealt);
                tracing::debug!(node = %ctx.node.id, ?who, ?damage_type, dealt, "damage dealt");
            }
            None => tracing::warn!(node = %ctx.node.id, ?who, "target has no health"),
        }
        Value::Float(dealt).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EffectHost, SandboxHost};
    use crate::library::create_effect_registry;
    use crate::variable::VariableStore;
    use std::sync::Arc;

    fn hit(host: &Arc<SandboxHost>, damage_type: &str, damage: f32) -> ActionOutput {
        let registry = create_effect_registry();
        let node = registry
            .create_node("combat_damage")
            .unwrap()
            .with_parameter("damage_type", damage_type);
        let variables = VariableStore::default();
        let host: Arc<dyn EffectHost> = host.clone();
        let ctx = NodeContext {
            node: &node,
            variables: &variables,
            host: &host,
        };
        Damage.execute(&NodeInputs::new(vec![Some(Value::Float(damage))]), &ctx)
    }

    fn dummy() -> Arc<SandboxHost> {
        Arc::new(
            SandboxHost::new()
                .with_stat(TargetSelector::Target, StatType::Health, 1000.0)
                .with_stat(TargetSelector::Target, StatType::Ar, 100.0)
                .with_stat(TargetSelector::Target, StatType::Mr, -100.0),
        )
    }

    #[test]
    fn test_physical_damage_mitigated_by_armor() {
        let host = dummy();
        assert_eq!(hit(&host, "Physical", 100.0), ActionOutput::Value(Value::Float(50.0)));
        assert_eq!(host.stat(TargetSelector::Target, StatType::Health), Some(950.0));
    }

    #[test]
    fn test_negative_resist_amplifies() {
        let host = dummy();
        assert_eq!(hit(&host, "Magic", 100.0), ActionOutput::Value(Value::Float(150.0)));
        assert_eq!(hit(&host, "True", 100.0), ActionOutput::Value(Value::Float(100.0)));
        assert_eq!(host.stat(TargetSelector::Target, StatType::Health), Some(750.0));
    }

    #[test]
    fn test_unknown_damage_type_falls_back_to_physical() {
        let host = dummy();
        assert_eq!(hit(&host, "Fire", 100.0), ActionOutput::Value(Value::Float(50.0)));
    }
}
