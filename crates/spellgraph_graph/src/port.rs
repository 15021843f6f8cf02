// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port declarations for node inputs/outputs.
//!
//! Data ports are declared on the node. The control ports [`CONTROL_IN`] and
//! [`CONTROL_OUT`] are implicit on every node and never appear in the declared
//! port lists.

use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// Reserved control-input port name
pub const CONTROL_IN: &str = "In";

/// Reserved control-output port name
pub const CONTROL_OUT: &str = "Out";

/// A declared data port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique among the node's inputs (or outputs)
    pub name: String,
    /// Declared type; `None` accepts any value
    #[serde(default)]
    pub value_type: Option<ValueType>,
    /// Explicit default for unlinked inputs
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl Port {
    /// Create a typed port
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type: Some(value_type),
            default_value: None,
        }
    }

    /// Create a port that accepts any value
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
            default_value: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Positional placeholder for an unlinked input.
    ///
    /// Explicit default first, then the zero value of the declared type.
    /// Untyped ports have no placeholder value.
    pub fn placeholder(&self) -> Option<Value> {
        self.default_value
            .clone()
            .or_else(|| self.value_type.map(ValueType::default_value))
    }

    /// Fit an incoming value to this port's declared type
    pub fn accept(&self, value: Value) -> Option<Value> {
        match self.value_type {
            Some(ty) => value.coerce(ty),
            None => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_prefers_explicit_default() {
        let port = Port::new("B", ValueType::Float).with_default(1.0);
        assert_eq!(port.placeholder(), Some(Value::Float(1.0)));
        assert_eq!(Port::new("A", ValueType::Float).placeholder(), Some(Value::Float(0.0)));
        assert_eq!(Port::any("Value").placeholder(), None);
    }

    #[test]
    fn test_accept_coerces() {
        let port = Port::new("A", ValueType::Float);
        assert_eq!(port.accept(Value::Int(2)), Some(Value::Float(2.0)));
        assert_eq!(port.accept(Value::Bool(true)), None);
        assert_eq!(Port::any("x").accept(Value::Bool(true)), Some(Value::Bool(true)));
    }
}
