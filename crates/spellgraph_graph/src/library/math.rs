// SPDX-License-Identifier: MIT OR Apache-2.0
//! Float arithmetic nodes.

use crate::node::{NodeCategory, NodeType};
use crate::port::Port;
use crate::registry::{ActionNode, ActionOutput, NodeContext, NodeInputs, NodeRegistry};
use crate::value::{Value, ValueType};

/// Register math nodes
pub fn register(registry: &mut NodeRegistry) {
    let binary: [(&str, &str, &str, fn(f32, f32) -> f32); 4] = [
        ("math_add", "Add", "A + B", |a, b| a + b),
        ("math_subtract", "Subtract", "A - B", |a, b| a - b),
        ("math_multiply", "Multiply", "A * B", |a, b| a * b),
        ("math_power", "Power", "A raised to B", f32::powf),
    ];
    for (id, name, description, op) in binary {
        registry.register_action(
            math_type(id, name, description, vec![float("A"), float("B")]),
            move || Arithmetic(op),
        );
    }

    registry.register_action(
        math_type(
            "math_divide",
            "Divide",
            "A / B",
            vec![float("A"), float("B").with_default(1.0)],
        ),
        || Arithmetic(|a, b| a / b),
    );

    registry.register_action(
        math_type("math_square_root", "Square Root", "Square root of A", vec![float("A")]),
        || SquareRoot,
    );
}

fn float(name: &str) -> Port {
    Port::new(name, ValueType::Float)
}

fn math_type(id: &str, name: &str, description: &str, inputs: Vec<Port>) -> NodeType {
    NodeType {
        id: id.to_string(),
        name: name.to_string(),
        category: NodeCategory::Math,
        description: description.to_string(),
        inputs,
        outputs: vec![float("Result")],
    }
}

/// Binary float operation over inputs `A` and `B`
pub struct Arithmetic(pub fn(f32, f32) -> f32);

impl ActionNode for Arithmetic {
    fn execute(&self, inputs: &NodeInputs, _ctx: &NodeContext<'_>) -> ActionOutput {
        Value::Float((self.0)(inputs.float(0), inputs.float(1))).into()
    }
}

/// Square root of input `A`
pub struct SquareRoot;

impl ActionNode for SquareRoot {
    fn execute(&self, inputs: &NodeInputs, _ctx: &NodeContext<'_>) -> ActionOutput {
        Value::Float(inputs.float(0).sqrt()).into()
    }
}
