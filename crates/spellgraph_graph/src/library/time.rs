// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timed nodes.

use crate::node::{NodeCategory, NodeType};
use crate::port::Port;
use crate::registry::{NodeContext, NodeInputs, NodeRegistry, StateNode};
use crate::value::{Value, ValueType};
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;

/// Register time nodes
pub fn register(registry: &mut NodeRegistry) {
    registry.register_state(
        NodeType {
            id: "time_wait".to_string(),
            name: "Wait".to_string(),
            category: NodeCategory::Time,
            description: "Suspend the branch for a number of seconds".to_string(),
            inputs: vec![Port::new("Seconds", ValueType::Float)],
            outputs: vec![],
        },
        || Wait,
    );
}

/// Suspends for `Seconds`; negative or NaN waits nothing
pub struct Wait;

impl Wait {
    /// Clamp a requested wait
    pub fn duration(seconds: f32) -> Duration {
        Duration::try_from_secs_f32(seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl StateNode for Wait {
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext<'_>) -> BoxFuture<'static, Option<Value>> {
        let duration = Self::duration(inputs.float(0));
        tracing::debug!(node = %ctx.node.id, ?duration, "waiting");
        async move {
            tokio::time::sleep(duration).await;
            None
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Evaluator;
    use crate::graph::{Graph, GraphDescription};
    use crate::library::create_effect_registry;
    use crate::variable::Variable;
    use std::sync::Arc;

    #[test]
    fn test_duration_clamps() {
        assert_eq!(Wait::duration(-1.0), Duration::ZERO);
        assert_eq!(Wait::duration(f32::NAN), Duration::ZERO);
        assert_eq!(Wait::duration(1.5), Duration::from_millis(1500));
        assert_eq!(Wait::duration(f32::INFINITY), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_delays_only_its_branch() {
        let registry = Arc::new(create_effect_registry());
        let mut desc = GraphDescription::new("wait");
        desc.add_variable(Variable::with_value("after_wait", false));
        desc.add_variable(Variable::with_value("sibling", false));

        let root = desc.add_node(registry.create_node("root").unwrap());
        let wait = desc.add_node(
            registry
                .create_node("time_wait")
                .unwrap()
                .with_input_default("Seconds", 2.0),
        );
        let mut setter = |name: &str| {
            desc.add_node(
                registry
                    .create_node("set_var")
                    .unwrap()
                    .with_parameter("variable", name)
                    .with_input_default("Value", true),
            )
        };
        let after = setter("after_wait");
        let sibling = setter("sibling");
        desc.sequence(&root, &wait);
        desc.sequence(&wait, &after);
        desc.sequence(&root, &sibling);

        let graph = Arc::new(Graph::from_description(desc).unwrap());
        let evaluator = Evaluator::new(graph, registry).unwrap();
        let mut run = evaluator.start_execution();

        assert!(futures::poll!(&mut run).is_pending());
        assert_eq!(evaluator.get_variable("sibling"), Some(Value::Bool(true)));
        assert_eq!(evaluator.get_variable("after_wait"), Some(Value::Bool(false)));

        run.await;
        assert_eq!(evaluator.get_variable("after_wait"), Some(Value::Bool(true)));
    }
}
