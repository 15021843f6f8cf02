// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed values that flow through ports and live in variables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of value types understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// Boolean value
    Bool,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector
    Vector4,
    /// Reference to a host-side object
    Object,
}

impl ValueType {
    /// The "empty" value of this type, used for unlinked inputs
    pub fn default_value(self) -> Value {
        match self {
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::Bool => Value::Bool(false),
            Self::Vector2 => Value::Vector2([0.0; 2]),
            Self::Vector3 => Value::Vector3([0.0; 3]),
            Self::Vector4 => Value::Vector4([0.0; 4]),
            Self::Object => Value::Object(ObjectRef::default()),
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Vector2 => "vector2",
            Self::Vector3 => "vector3",
            Self::Vector4 => "vector4",
            Self::Object => "object",
        }
    }

    /// Whether a value of type `other` may be stored in a cell of this type.
    ///
    /// Only exact matches and integer-to-float widening are accepted.
    pub fn is_assignable_from(self, other: ValueType) -> bool {
        self == other || matches!((self, other), (Self::Float, Self::Int))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque handle to an object owned by the host (an entity, a prefab, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(pub String);

/// A typed scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// String
    String(String),
    /// Boolean
    Bool(bool),
    /// 2D vector
    Vector2([f32; 2]),
    /// 3D vector
    Vector3([f32; 3]),
    /// 4D vector
    Vector4([f32; 4]),
    /// Host object reference
    Object(ObjectRef),
}

impl Value {
    /// Get the type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::Bool(_) => ValueType::Bool,
            Self::Vector2(_) => ValueType::Vector2,
            Self::Vector3(_) => ValueType::Vector3,
            Self::Vector4(_) => ValueType::Vector4,
            Self::Object(_) => ValueType::Object,
        }
    }

    /// Convert this value to `target`, if an implicit conversion exists.
    pub fn coerce(&self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self.clone());
        }

        match (self, target) {
            (Self::Int(i), ValueType::Float) => Some(Self::Float(*i as f32)),
            (Self::Float(f), ValueType::Int) => Some(Self::Int(f.round() as i32)),
            (Self::Object(_), ValueType::String) => None,
            (v, ValueType::String) => Some(Self::String(v.to_string())),
            // Scalar splat into vectors
            (Self::Float(f), ValueType::Vector2) => Some(Self::Vector2([*f; 2])),
            (Self::Float(f), ValueType::Vector3) => Some(Self::Vector3([*f; 3])),
            (Self::Float(f), ValueType::Vector4) => Some(Self::Vector4([*f; 4])),
            // Widening
            (Self::Vector2([x, y]), ValueType::Vector3) => Some(Self::Vector3([*x, *y, 0.0])),
            (Self::Vector2([x, y]), ValueType::Vector4) => Some(Self::Vector4([*x, *y, 0.0, 0.0])),
            (Self::Vector3([x, y, z]), ValueType::Vector4) => Some(Self::Vector4([*x, *y, *z, 0.0])),
            _ => None,
        }
    }

    /// Numeric view of this value
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// Boolean view of this value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String view of this value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Vector2([x, y]) => write!(f, "({x}, {y})"),
            Self::Vector3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Self::Vector4([x, y, z, w]) => write!(f, "({x}, {y}, {z}, {w})"),
            Self::Object(o) => write!(f, "<{}>", o.0),
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(3).coerce(ValueType::Float), Some(Value::Float(3.0)));
        assert_eq!(Value::Float(2.6).coerce(ValueType::Int), Some(Value::Int(3)));
        assert_eq!(Value::Bool(true).coerce(ValueType::Float), None);
    }

    #[test]
    fn test_vector_widening() {
        assert_eq!(
            Value::Vector2([1.0, 2.0]).coerce(ValueType::Vector4),
            Some(Value::Vector4([1.0, 2.0, 0.0, 0.0]))
        );
        assert_eq!(Value::Vector4([1.0; 4]).coerce(ValueType::Vector2), None);
        assert_eq!(Value::Float(0.5).coerce(ValueType::Vector3), Some(Value::Vector3([0.5; 3])));
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(Value::Int(7).coerce(ValueType::String), Some(Value::from("7")));
        assert_eq!(Value::Object(ObjectRef("hero".into())).coerce(ValueType::String), None);
    }

    #[test]
    fn test_assignability() {
        assert!(ValueType::Float.is_assignable_from(ValueType::Int));
        assert!(!ValueType::Int.is_assignable_from(ValueType::Float));
        assert!(!ValueType::Bool.is_assignable_from(ValueType::String));
    }

    #[test]
    fn test_defaults_are_typed() {
        for ty in [ValueType::Int, ValueType::Float, ValueType::Vector3, ValueType::Object] {
            assert_eq!(ty.default_value().value_type(), ty);
        }
    }
}
