// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while editing an operator graph.

use crate::operator::OperatorId;
use crate::slot::SlotId;
use crate::value::{ValueLayout, ValueType};

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error when editing or migrating a graph.
///
/// Every variant leaves the graph as it was before the failing call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Link or operand type is not compatible
    #[error("incompatible types: {from} cannot feed {to}")]
    IncompatibleType {
        /// Source type
        from: ValueType,
        /// Destination type
        to: ValueType,
    },

    /// Literal cannot be stored in a slot of the given type
    #[error("a {value:?} literal cannot be stored as {to}")]
    IncompatibleValue {
        /// Layout of the rejected literal
        value: ValueLayout,
        /// Declared slot type
        to: ValueType,
    },

    /// Operand index is invalid or removal would go below the minimum
    #[error("operand index {index} out of range ({len} operands, minimum {min})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current operand count
        len: usize,
        /// Minimum operand count
        min: usize,
    },

    /// Adding an operand would exceed what the operator supports
    #[error("{kind} cannot take more operands: {reason}")]
    OperandLimit {
        /// Operator name
        kind: &'static str,
        /// Why the limit was hit
        reason: String,
    },

    /// Operator has no dynamically typed operands
    #[error("{0} has no dynamic operands")]
    NotDynamic(&'static str),

    /// Sanitizer could not build a canonical replacement
    #[error("cannot migrate {kind}: {reason}")]
    UnmigratableNode {
        /// Legacy operator name
        kind: &'static str,
        /// Why migration failed
        reason: String,
    },

    /// Operator not found
    #[error("operator not found: {0:?}")]
    OperatorNotFound(OperatorId),

    /// Slot not found
    #[error("slot not found: {0:?}")]
    SlotNotFound(SlotId),

    /// Slot has the wrong direction for the requested operation
    #[error("slot {0:?} has the wrong direction")]
    InvalidDirection(SlotId),

    /// Link would introduce a cycle
    #[error("link would create a cycle")]
    CycleDetected,

    /// Operator setting is invalid
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}
