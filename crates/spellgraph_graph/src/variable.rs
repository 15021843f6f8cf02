// SPDX-License-Identifier: MIT OR Apache-2.0
//! Instance variables and the per-instance variable store.
//!
//! The store is shared by every node of one graph instance. Writers are not
//! serialized beyond the lock around a single get/set; callers that share one
//! store between several graph instances own the resulting races.

use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named, typed variable declared on a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name, unique within a graph
    pub name: String,
    /// Declared type
    pub value_type: ValueType,
    /// Current value
    pub value: Value,
}

impl Variable {
    /// Declare a variable holding the default value of its type
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            value: value_type.default_value(),
        }
    }

    /// Declare a variable with an initial value, typed after that value
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            value_type: value.value_type(),
            value,
        }
    }
}

/// Result of a successful [`VariableStore::set`]
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Value now stored, after conversion to the declared type
    pub new: Value,
    /// Value it replaced
    pub old: Value,
}

/// Named, typed value cells of one graph instance.
///
/// Cloning yields another handle onto the same cells.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    cells: Arc<RwLock<IndexMap<String, Variable>>>,
}

impl VariableStore {
    /// Create a store from declared variables; later duplicates win
    pub fn new(variables: impl IntoIterator<Item = Variable>) -> Self {
        let cells = variables
            .into_iter()
            .map(|v| (v.name.clone(), v))
            .collect();
        Self {
            cells: Arc::new(RwLock::new(cells)),
        }
    }

    /// Get a snapshot of a variable
    pub fn get(&self, name: &str) -> Option<Variable> {
        self.cells.read().get(name).cloned()
    }

    /// Get the current value of a variable
    pub fn value(&self, name: &str) -> Option<Value> {
        self.cells.read().get(name).map(|v| v.value.clone())
    }

    /// Assign a value, returning what was stored and what it replaced.
    ///
    /// The value must be assignable to the declared type; it is converted on
    /// the way in (an `Int` written to a `Float` cell is stored as a float).
    pub fn set(&self, name: &str, value: Value) -> Result<Assignment, VariableError> {
        let mut cells = self.cells.write();
        let cell = cells
            .get_mut(name)
            .ok_or_else(|| VariableError::NotFound(name.to_string()))?;

        let found = value.value_type();
        if !cell.value_type.is_assignable_from(found) {
            return Err(VariableError::TypeMismatch {
                name: name.to_string(),
                expected: cell.value_type,
                found,
            });
        }

        let stored = value
            .coerce(cell.value_type)
            .ok_or(VariableError::TypeMismatch {
                name: name.to_string(),
                expected: cell.value_type,
                found,
            })?;
        let old = std::mem::replace(&mut cell.value, stored.clone());
        Ok(Assignment { new: stored, old })
    }

    /// Rename a variable, keeping its type and value
    pub fn rename(&self, old: &str, new: &str) -> Result<(), VariableError> {
        let mut cells = self.cells.write();
        if old == new {
            return if cells.contains_key(old) {
                Ok(())
            } else {
                Err(VariableError::NotFound(old.to_string()))
            };
        }
        if cells.contains_key(new) {
            return Err(VariableError::AlreadyExists(new.to_string()));
        }
        let index = cells
            .get_index_of(old)
            .ok_or_else(|| VariableError::NotFound(old.to_string()))?;

        // Rebuild in place so declaration order is kept
        let (_, mut variable) = cells
            .shift_remove_index(index)
            .ok_or_else(|| VariableError::NotFound(old.to_string()))?;
        variable.name = new.to_string();
        cells.shift_insert(index, new.to_string(), variable);
        Ok(())
    }

    /// Declared variable names, in declaration order
    pub fn names(&self) -> Vec<String> {
        self.cells.read().keys().cloned().collect()
    }

    /// Snapshot of all variables, in declaration order
    pub fn snapshot(&self) -> Vec<Variable> {
        self.cells.read().values().cloned().collect()
    }

    /// Number of declared variables
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// Check if no variables are declared
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }
}

/// Error when reading or writing a variable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VariableError {
    /// No variable with this name
    #[error("Variable not found: {0}")]
    NotFound(String),

    /// Value type is not assignable to the declared type
    #[error("Variable '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Variable name
        name: String,
        /// Declared type
        expected: ValueType,
        /// Type of the rejected value
        found: ValueType,
    },

    /// Rename target already taken
    #[error("Variable already exists: {0}")]
    AlreadyExists(String),
}
