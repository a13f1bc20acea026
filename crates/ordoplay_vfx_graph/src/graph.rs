// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing operators and links.
//!
//! The graph is the only owner of links. Every mutation that can invalidate a
//! link (retyping an operand, removing an operand or an operator) severs the
//! affected links before returning, so the graph never holds a link between
//! incompatible slots.

use crate::error::{GraphError, Result};
use crate::evaluation::{EvaluationContext, EvaluationError};
use crate::expression::Expression;
use crate::link::{Link, LinkId};
use crate::operator::{Operator, OperatorId, SwizzleMask};
use crate::slot::{can_link, Slot, SlotDirection, SlotId};
use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An operator graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Operators in the graph
    operators: IndexMap<OperatorId, Operator>,
    /// Links between slots
    links: IndexMap<LinkId, Link>,
    /// Mutation counter
    revision: u64,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operators: IndexMap::new(),
            links: IndexMap::new(),
            revision: 0,
        }
    }

    /// Counter bumped by every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Add an operator to the graph
    pub fn add_operator(&mut self, operator: Operator) -> OperatorId {
        let id = operator.id;
        self.operators.insert(id, operator);
        self.touch();
        id
    }

    /// Remove an operator and its links
    pub fn remove_operator(&mut self, operator_id: OperatorId) -> Option<Operator> {
        if !self.operators.contains_key(&operator_id) {
            return None;
        }
        self.links.retain(|_, l| !touches_operator(l, operator_id));
        self.touch();
        self.operators.shift_remove(&operator_id)
    }

    /// Get an operator by ID
    pub fn operator(&self, operator_id: OperatorId) -> Option<&Operator> {
        self.operators.get(&operator_id)
    }

    /// Get all operators
    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values()
    }

    /// Get all operator IDs
    pub fn operator_ids(&self) -> impl Iterator<Item = OperatorId> + '_ {
        self.operators.keys().copied()
    }

    /// Inline constant operators
    pub fn inline_operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values().filter(|op| op.is_inline())
    }

    /// Get the number of operators
    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    fn operator_entry_mut(&mut self, operator_id: OperatorId) -> Result<&mut Operator> {
        self.operators
            .get_mut(&operator_id)
            .ok_or(GraphError::OperatorNotFound(operator_id))
    }

    /// Find a slot and the operator owning it
    pub fn locate(&self, slot_id: SlotId) -> Option<(OperatorId, &Slot)> {
        self.operators
            .values()
            .find_map(|op| op.slot(slot_id).map(|slot| (op.id, slot)))
    }

    /// Get a slot by ID
    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.locate(slot_id).map(|(_, slot)| slot)
    }

    /// Link an output slot into an input slot.
    ///
    /// Replaces any link the input already has.
    pub fn link(&mut self, from: SlotId, to: SlotId) -> Result<LinkId> {
        let (from_operator, output) = self.locate(from).ok_or(GraphError::SlotNotFound(from))?;
        let (to_operator, input) = self.locate(to).ok_or(GraphError::SlotNotFound(to))?;
        if output.direction != SlotDirection::Output {
            return Err(GraphError::InvalidDirection(from));
        }
        if input.direction != SlotDirection::Input {
            return Err(GraphError::InvalidDirection(to));
        }
        if !can_link(output, input) {
            return Err(GraphError::IncompatibleType {
                from: output.value_type(),
                to: input.value_type(),
            });
        }
        let link = Link::new(from_operator, from, to_operator, to);
        if link.is_loop() || self.reaches(to_operator, from_operator) {
            return Err(GraphError::CycleDetected);
        }

        self.links.retain(|_, l| l.to_slot != to);
        let id = link.id;
        self.links.insert(id, link);
        self.touch();
        tracing::debug!(?from, ?to, "linked slots");
        Ok(id)
    }

    /// Link `from` into `to`, first retyping `to` to the operand type that
    /// best receives the source, when `to` is a dynamic operand.
    pub fn link_adapting(&mut self, from: SlotId, to: SlotId) -> Result<LinkId> {
        let source_type = self.slot(from).ok_or(GraphError::SlotNotFound(from))?.value_type();
        let (operator_id, input) = self.locate(to).ok_or(GraphError::SlotNotFound(to))?;
        let current = input.value_type();
        let operator = self
            .operator(operator_id)
            .ok_or(GraphError::OperatorNotFound(operator_id))?;
        let retype = match operator.operand_index(to) {
            Some(index) if operator.descriptor().is_dynamic() && !operator.is_deprecated() => operator
                .best_operand_type(source_type)
                .filter(|best| *best != current)
                .map(|best| (index, best)),
            _ => None,
        };
        if let Some((index, best)) = retype {
            self.set_operand_type(operator_id, index, best)?;
        }
        self.link(from, to)
    }

    /// Remove the incoming link of an input slot; the stored literal is kept
    pub fn unlink(&mut self, input: SlotId) -> Option<Link> {
        let id = self.links.values().find(|l| l.to_slot == input)?.id;
        self.touch();
        tracing::debug!(?input, "unlinked slot");
        self.links.shift_remove(&id)
    }

    /// Whether a slot has a link.
    ///
    /// Slots have no sub-slots, so the transitive query answers the same as
    /// the direct one.
    pub fn has_link(&self, slot_id: SlotId, transitive: bool) -> bool {
        let _ = transitive;
        self.links.values().any(|l| l.from_slot == slot_id || l.to_slot == slot_id)
    }

    /// Output slot feeding an input slot
    pub fn source_of(&self, input: SlotId) -> Option<SlotId> {
        self.link_to(input).map(|l| l.from_slot)
    }

    /// Input slots fed by an output slot
    pub fn fan_out(&self, output: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.links_from(output).map(|l| l.to_slot)
    }

    /// Get a link by ID
    pub fn get_link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get links from a specific output slot
    pub fn links_from(&self, slot_id: SlotId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.from_slot == slot_id)
    }

    /// Get the link into a specific input slot
    pub fn link_to(&self, slot_id: SlotId) -> Option<&Link> {
        self.links.values().find(|l| l.to_slot == slot_id)
    }

    /// Get links involving an operator
    pub fn links_for_operator(&self, operator_id: OperatorId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| touches_operator(l, operator_id))
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether data flows from `start` to `target`
    fn reaches(&self, start: OperatorId, target: OperatorId) -> bool {
        let mut stack = vec![start];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if seen.insert(current) {
                stack.extend(
                    self.links
                        .values()
                        .filter(|l| l.from_operator == current)
                        .map(|l| l.to_operator),
                );
            }
        }
        false
    }

    /// Drop links of an operator that its slot types no longer allow
    fn prune_links(&mut self, operator_id: OperatorId) -> Vec<Link> {
        let stale: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| touches_operator(l, operator_id))
            .filter(|l| match (self.slot(l.from_slot), self.slot(l.to_slot)) {
                (Some(output), Some(input)) => !can_link(output, input),
                _ => true,
            })
            .map(|l| l.id)
            .collect();
        let dropped: Vec<Link> = stale
            .iter()
            .filter_map(|id| self.links.shift_remove(id))
            .collect();
        for link in &dropped {
            tracing::debug!(from = ?link.from_slot, to = ?link.to_slot, "dropped incompatible link");
        }
        dropped
    }

    /// Append an operand to a cascaded operator.
    ///
    /// Returns the new slot and the links severed because the output type
    /// changed.
    pub fn add_operand(&mut self, operator_id: OperatorId) -> Result<(SlotId, Vec<Link>)> {
        let slot = self.operator_entry_mut(operator_id)?.add_operand()?;
        let dropped = self.prune_links(operator_id);
        self.touch();
        tracing::debug!(?operator_id, dropped = dropped.len(), "added operand");
        Ok((slot, dropped))
    }

    /// Remove an operand of a cascaded operator and return the links it
    /// severed: the operand's own link, then any output link the new output
    /// type no longer allows.
    ///
    /// Links and literals of the other operands are untouched.
    pub fn remove_operand(&mut self, operator_id: OperatorId, index: usize) -> Result<Vec<Link>> {
        let removed = self.operator_entry_mut(operator_id)?.remove_operand(index)?;
        let own = self.link_to(removed.id).map(|l| l.id);
        let mut dropped: Vec<Link> = own.and_then(|id| self.links.shift_remove(&id)).into_iter().collect();
        dropped.extend(self.prune_links(operator_id));
        self.touch();
        tracing::debug!(?operator_id, index, dropped = dropped.len(), "removed operand");
        Ok(dropped)
    }

    /// Retype an operand, dropping links that no longer fit
    pub fn set_operand_type(
        &mut self,
        operator_id: OperatorId,
        index: usize,
        value_type: ValueType,
    ) -> Result<Vec<Link>> {
        self.operator_entry_mut(operator_id)?
            .set_operand_type(index, value_type)?;
        let dropped = self.prune_links(operator_id);
        self.touch();
        tracing::debug!(?operator_id, index, %value_type, "retyped operand");
        Ok(dropped)
    }

    /// Parse and apply a swizzle mask
    pub fn set_swizzle_mask(&mut self, operator_id: OperatorId, mask: &str) -> Result<Vec<Link>> {
        let mask = SwizzleMask::parse(mask)?;
        self.operator_entry_mut(operator_id)?.set_swizzle_mask(mask)?;
        let dropped = self.prune_links(operator_id);
        self.touch();
        Ok(dropped)
    }

    /// Store a literal on an input slot
    pub fn set_value(&mut self, slot_id: SlotId, value: impl Into<Value>) -> Result<()> {
        let (operator_id, slot) = self.locate(slot_id).ok_or(GraphError::SlotNotFound(slot_id))?;
        if !slot.is_input() {
            return Err(GraphError::InvalidDirection(slot_id));
        }
        self.operator_entry_mut(operator_id)?
            .input_mut(slot_id)
            .ok_or(GraphError::SlotNotFound(slot_id))?
            .set_value(value)?;
        self.touch();
        Ok(())
    }

    /// Build the expression tree of a slot.
    ///
    /// An output feeding several inputs appears once in the tree, shared
    /// by every consumer.
    pub fn expression(&self, slot_id: SlotId) -> std::result::Result<Expression, EvaluationError> {
        EvaluationContext::new(self).expression(slot_id)
    }

    /// Evaluate a slot, reducing each upstream slot once
    pub fn evaluate(&self, slot_id: SlotId) -> std::result::Result<Value, EvaluationError> {
        EvaluationContext::new(self).evaluate(slot_id)
    }

    /// Get operators in topological order, upstream first
    pub fn topological_order(&self) -> Result<Vec<OperatorId>> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for operator_id in self.operators.keys() {
            if !visited.contains(operator_id) {
                self.visit(*operator_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        operator_id: OperatorId,
        visited: &mut HashSet<OperatorId>,
        temp_mark: &mut HashSet<OperatorId>,
        order: &mut Vec<OperatorId>,
    ) -> Result<()> {
        if temp_mark.contains(&operator_id) {
            return Err(GraphError::CycleDetected);
        }
        if visited.contains(&operator_id) {
            return Ok(());
        }

        temp_mark.insert(operator_id);

        // Visit all operators this one depends on
        for link in self.links_for_operator(operator_id) {
            if link.to_operator == operator_id {
                self.visit(link.from_operator, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&operator_id);
        visited.insert(operator_id);
        order.push(operator_id);

        Ok(())
    }
}

fn touches_operator(link: &Link, operator_id: OperatorId) -> bool {
    link.from_operator == operator_id || link.to_operator == operator_id
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
