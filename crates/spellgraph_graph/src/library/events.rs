// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event nodes.

use crate::evaluation::Reentry;
use crate::host::HostEvent;
use crate::node::{NodeCategory, NodeType};
use crate::registry::{EventNode, NodeContext, NodeInputs, NodeRegistry};

/// Register event nodes
pub fn register(registry: &mut NodeRegistry) {
    registry.register_event(
        NodeType {
            id: "event_on_auto_attack".to_string(),
            name: "On Auto Attack".to_string(),
            category: NodeCategory::Events,
            description: "Runs its branch every time the player auto attacks".to_string(),
            inputs: vec![],
            outputs: vec![],
        },
        || OnHostEvent(HostEvent::AutoAttack),
    );
}

/// Subscribes to one host event
pub struct OnHostEvent(pub HostEvent);

impl EventNode for OnHostEvent {
    fn subscribe(&self, _inputs: &NodeInputs, ctx: &NodeContext<'_>, reenter: Reentry) {
        tracing::debug!(node = %ctx.node.id, event = ?self.0, "subscribing");
        ctx.host.subscribe(self.0, reenter);
    }
}
