// SPDX-License-Identifier: MIT OR Apache-2.0
//! VFX operator graph for `OrdoPlay` Editor.
//!
//! Effects are authored as a dataflow graph of operators whose typed slots
//! are joined by links. This crate provides:
//! - Value types and the type affinity table deciding which links are legal
//! - Operators with cascaded (growable) operand lists and per-operand types
//! - Output type unification for numeric operators
//! - Expression building and evaluation
//! - Sanitization of legacy graphs that still use deprecated operators
//!
//! ## Architecture
//!
//! The [`Graph`] owns operators and links. Operators own their slots and
//! describe themselves through a static [`OperatorLibrary`]. Evaluation turns
//! the upstream subgraph of a slot into an [`Expression`] tree which is then
//! compiled to a [`Value`].

pub mod affinity;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod expression;
pub mod graph;
pub mod link;
pub mod operator;
pub mod sanitize;
pub mod slot;
pub mod value;

pub use affinity::{AffinityTable, TYPE_PRECEDENCE};
pub use config::SanitizeConfig;
pub use error::{GraphError, Result};
pub use evaluation::{compile, EvaluationContext, EvaluationError};
pub use expression::Expression;
pub use graph::Graph;
pub use link::{Link, LinkId};
pub use operator::library::OperatorLibrary;
pub use operator::{Operator, OperatorId, OperatorKind, SwizzleMask};
pub use sanitize::{sanitize, sanitize_with, LegacyOperator, MigrationReport, MigrationStatus};
pub use slot::{Slot, SlotDirection, SlotId};
pub use value::{Value, ValueLayout, ValueType};
