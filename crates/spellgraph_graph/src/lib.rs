// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect graph engine for `SpellGraph`.
//!
//! An effect is a directed graph of typed nodes. Control links decide what
//! runs next; data links carry values between nodes and are pulled on demand.
//!
//! ## Architecture
//!
//! - [`graph`]: immutable graph model built from a serializable description
//! - [`registry`]: runtime type tags mapped to node behaviors of a fixed
//!   capability kind (root, action, condition, state, event)
//! - [`variable`]: per-instance typed variable store
//! - [`evaluation`]: memoized evaluator, control-flow router and event reentry
//! - [`host`]: game-side collaborator for stats, damage and external events
//! - [`library`]: built-in effect nodes

pub mod evaluation;
pub mod graph;
pub mod host;
pub mod library;
pub mod link;
pub mod node;
pub mod port;
pub mod registry;
pub mod value;
pub mod variable;

pub use evaluation::{Diagnostic, EvaluationError, Evaluator, EvaluatorConfig, NodeResult, Reentry};
pub use graph::{Graph, GraphDescription, GraphError};
pub use host::{DamageType, EffectHost, HostEvent, NoHost, SandboxHost, StatType, TargetSelector};
pub use library::create_effect_registry;
pub use link::Link;
pub use node::{NodeCategory, NodeId, NodeInstance, NodeType};
pub use port::{Port, CONTROL_IN, CONTROL_OUT};
pub use registry::{
    ActionNode, ActionOutput, ConditionNode, EventNode, NodeContext, NodeInputs, NodeKind,
    NodeRegistry, StateNode, Trigger,
};
pub use value::{ObjectRef, Value, ValueType};
pub use variable::{Assignment, Variable, VariableError, VariableStore};
