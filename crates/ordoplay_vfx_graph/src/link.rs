// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links carrying a value from an output slot into an input slot.
//!
//! A link always runs output to input, and an input slot holds at most one
//! link. Both rules are enforced by [`Graph::link`](crate::Graph::link); a
//! `Link` on its own is plain data.

use crate::operator::OperatorId;
use crate::slot::SlotId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// A link from an output slot to an input slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Operator owning the output slot
    pub from_operator: OperatorId,
    /// Output slot
    pub from_slot: SlotId,
    /// Operator owning the input slot
    pub to_operator: OperatorId,
    /// Input slot
    pub to_slot: SlotId,
}

impl Link {
    /// Link `output` of `upstream` into `input` of `downstream`
    pub fn new(upstream: OperatorId, output: SlotId, downstream: OperatorId, input: SlotId) -> Self {
        Self {
            id: LinkId::new(),
            from_operator: upstream,
            from_slot: output,
            to_operator: downstream,
            to_slot: input,
        }
    }

    /// Whether the link feeds an operator from its own output
    pub fn is_loop(&self) -> bool {
        self.from_operator == self.to_operator
    }
}
