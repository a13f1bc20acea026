// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for operator inputs/outputs.

use crate::affinity::AffinityTable;
use crate::error::{GraphError, Result};
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub Uuid);

impl SlotId {
    /// Create a new random slot ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot, at most one incoming link
    Input,
    /// Output slot, fans out to any number of inputs
    Output,
}

/// A typed connection point on an operator.
///
/// Slots never own links; the [`Graph`](crate::graph::Graph) does. The
/// literal value is always stored in the layout of the declared type and is
/// only read when the slot has no incoming link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Unique slot ID
    pub id: SlotId,
    /// Slot name
    pub name: String,
    /// Slot direction
    pub direction: SlotDirection,
    value_type: ValueType,
    value: Value,
}

impl Slot {
    /// Create a slot holding the zero value of `value_type`
    pub fn new(value_type: ValueType, direction: SlotDirection, name: impl Into<String>) -> Self {
        Self {
            id: SlotId::new(),
            name: name.into(),
            direction,
            value_type,
            value: Value::zero(value_type),
        }
    }

    /// Create a new input slot
    pub fn input(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(value_type, SlotDirection::Input, name)
    }

    /// Create a new output slot
    pub fn output(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(value_type, SlotDirection::Output, name)
    }

    /// Builder: store a literal, falling back to zero when it cannot be converted
    pub(crate) fn with_literal(mut self, value: impl Into<Value>) -> Self {
        if let Some(converted) = value.into().convert_to_type(self.value_type, 0.0) {
            self.value = converted;
        }
        self
    }

    /// Declared type
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Stored literal
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether this is an input slot
    pub fn is_input(&self) -> bool {
        self.direction == SlotDirection::Input
    }

    /// Store a literal, converting it to the declared type
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let converted = value
            .convert_to_type(self.value_type, 0.0)
            .ok_or_else(|| GraphError::IncompatibleValue {
                value: value.layout(),
                to: self.value_type,
            })?;
        self.value = converted;
        Ok(())
    }

    /// Change the declared type, converting the stored literal.
    ///
    /// Literals that cannot be converted reset to the zero value.
    pub(crate) fn retype(&mut self, value_type: ValueType) {
        if self.value_type == value_type {
            return;
        }
        self.value = self
            .value
            .convert_to_type(value_type, 0.0)
            .unwrap_or_else(|| Value::zero(value_type));
        self.value_type = value_type;
    }

    /// Check if this slot may be linked into `input`
    pub fn can_link(&self, input: &Slot) -> bool {
        can_link(self, input)
    }
}

/// Whether `output` may be linked into `input`.
///
/// Requires an Output to Input pairing and an input type that is identical
/// to, or listed in, the affinity of the output type.
pub fn can_link(output: &Slot, input: &Slot) -> bool {
    output.direction == SlotDirection::Output
        && input.direction == SlotDirection::Input
        && AffinityTable::global().accepts(output.value_type, input.value_type)
}
