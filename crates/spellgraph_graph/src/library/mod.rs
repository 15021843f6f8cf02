// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node library.
//!
//! Each submodule registers one category of effect nodes.

pub mod combat;
pub mod conditional;
pub mod events;
pub mod general;
pub mod math;
pub mod special;
pub mod stats;
pub mod time;

use crate::registry::{NodeContext, NodeRegistry};
use std::fmt::Display;
use std::str::FromStr;

/// Create a registry holding every built-in node type
pub fn create_effect_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    special::register(&mut registry);
    general::register(&mut registry);
    math::register(&mut registry);
    conditional::register(&mut registry);
    time::register(&mut registry);
    combat::register(&mut registry);
    stats::register(&mut registry);
    events::register(&mut registry);
    registry
}

/// Parse an option parameter, falling back to `default` when absent or invalid
pub(crate) fn option_param<T>(ctx: &NodeContext<'_>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = ctx.node.parameter_str(key) else {
        return default;
    };
    raw.parse().unwrap_or_else(|error: T::Err| {
        tracing::warn!(node = %ctx.node.id, parameter = key, %error, "invalid option, using default");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeCategory;
    use crate::registry::NodeKind;

    #[test]
    fn test_registry_has_every_category() {
        let registry = create_effect_registry();
        for category in [
            NodeCategory::Special,
            NodeCategory::General,
            NodeCategory::Math,
            NodeCategory::Conditional,
            NodeCategory::Time,
            NodeCategory::Combat,
            NodeCategory::Stats,
            NodeCategory::Events,
        ] {
            assert!(
                registry.types_in_category(category).count() > 0,
                "no nodes in {category:?}"
            );
        }
    }

    #[test]
    fn test_kinds() {
        let registry = create_effect_registry();
        assert_eq!(registry.kind("root"), Some(NodeKind::Root));
        assert_eq!(registry.kind("math_add"), Some(NodeKind::Action));
        assert_eq!(registry.kind("condition_bool"), Some(NodeKind::Condition));
        assert_eq!(registry.kind("condition_comparison"), Some(NodeKind::Action));
        assert_eq!(registry.kind("time_wait"), Some(NodeKind::State));
        assert_eq!(registry.kind("event_on_auto_attack"), Some(NodeKind::Event));
    }
}
