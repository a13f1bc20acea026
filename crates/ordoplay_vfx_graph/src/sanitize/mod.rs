// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph sanitization: replacing deprecated operators with canonical ones.
//!
//! Each deprecated operator is planned first and applied second. Planning
//! builds the canonical replacement, picks operand types from the upstream
//! links and legacy literals, and lists every link the replacement cannot
//! carry. Only a successful plan touches the graph, so a node that fails
//! leaves the graph as it was and the rest of the batch proceeds.

pub mod deprecated;

pub use deprecated::{DeprecatedEntry, LegacyOperator, DEPRECATED_OPERATORS};

use crate::affinity::{unify_all, AffinityTable};
use crate::config::SanitizeConfig;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::operator::{Operator, OperatorId, OperatorKind};
use crate::slot::{can_link, Slot, SlotDirection, SlotId};
use crate::value::{Value, ValueType};

/// A link the replacement operator could not carry
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedLink {
    /// Name of the slot on the deprecated operator
    pub slot: String,
    /// Side of the operator the link was attached to
    pub direction: SlotDirection,
    /// Type of the output end
    pub from: ValueType,
    /// Type of the input end
    pub to: ValueType,
}

/// Outcome of migrating one operator
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStatus {
    /// Replaced with every link and literal preserved
    Migrated,
    /// Replaced, but these links were dropped
    Partial(Vec<DroppedLink>),
    /// Not replaced
    Failed(GraphError),
}

/// Per-operator sanitization report
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationReport {
    /// Name of the deprecated kind
    pub original_kind: &'static str,
    /// ID of the deprecated operator
    pub original: OperatorId,
    /// Position of the deprecated operator in the graph UI
    pub position: [f32; 2],
    /// ID of the canonical operator, when one was inserted
    pub replacement: Option<OperatorId>,
    /// Outcome
    pub status: MigrationStatus,
}

impl MigrationReport {
    /// Whether a replacement was inserted
    pub fn is_migrated(&self) -> bool {
        self.replacement.is_some()
    }

    /// Links dropped during migration
    pub fn dropped_links(&self) -> &[DroppedLink] {
        match &self.status {
            MigrationStatus::Partial(dropped) => dropped,
            _ => &[],
        }
    }
}

/// Replace every deprecated operator using the default settings
pub fn sanitize(graph: &mut Graph) -> Vec<MigrationReport> {
    sanitize_with(graph, &SanitizeConfig::default())
}

/// Replace every deprecated operator.
///
/// Operators are visited upstream first, so a replacement sees the already
/// migrated types of its sources.
pub fn sanitize_with(graph: &mut Graph, config: &SanitizeConfig) -> Vec<MigrationReport> {
    let order = graph
        .topological_order()
        .unwrap_or_else(|_| graph.operator_ids().collect());
    let pending: Vec<(OperatorId, LegacyOperator)> = order
        .into_iter()
        .filter_map(|id| match graph.operator(id)?.kind() {
            OperatorKind::Deprecated(legacy) => Some((id, legacy)),
            _ => None,
        })
        .collect();

    let reports: Vec<MigrationReport> = pending
        .into_iter()
        .filter_map(|(id, legacy)| migrate(graph, id, legacy, config))
        .collect();

    let failed = reports
        .iter()
        .filter(|r| matches!(r.status, MigrationStatus::Failed(_)))
        .count();
    let partial = reports.iter().filter(|r| !r.dropped_links().is_empty()).count();
    if !reports.is_empty() {
        tracing::info!(
            operators = reports.len(),
            failed,
            partial,
            "sanitized deprecated operators"
        );
    }
    reports
}

/// A link to recreate on the replacement
struct PlannedLink {
    from: SlotId,
    to: SlotId,
    /// Slot of the deprecated operator the link was attached to
    slot: String,
    direction: SlotDirection,
}

struct Plan {
    operator: Operator,
    links: Vec<PlannedLink>,
    dropped: Vec<DroppedLink>,
}

fn migrate(
    graph: &mut Graph,
    id: OperatorId,
    legacy: LegacyOperator,
    config: &SanitizeConfig,
) -> Option<MigrationReport> {
    let old = graph.operator(id)?;
    let position = old.position;
    let entry = legacy.entry();
    let report = |replacement, status| MigrationReport {
        original_kind: entry.name,
        original: id,
        position,
        replacement,
        status,
    };

    let plan = plan(graph, old, entry).and_then(|plan| {
        if !config.fail_open && !plan.dropped.is_empty() {
            return Err(GraphError::UnmigratableNode {
                kind: entry.name,
                reason: format!("replacement would drop {} link(s)", plan.dropped.len()),
            });
        }
        Ok(plan)
    });
    let plan = match plan {
        Ok(plan) => plan,
        Err(error) => {
            tracing::warn!(kind = entry.name, %error, "cannot migrate deprecated operator");
            if !config.keep_unmigratable {
                graph.remove_operator(id);
            }
            return Some(report(None, MigrationStatus::Failed(error)));
        }
    };

    let Plan {
        operator,
        links,
        mut dropped,
    } = plan;
    graph.remove_operator(id);
    let replacement = graph.add_operator(operator);
    dropped.extend(relink(graph, entry.name, links));

    for link in &dropped {
        tracing::warn!(
            kind = entry.name,
            slot = %link.slot,
            from = %link.from,
            to = %link.to,
            "dropped link"
        );
    }
    tracing::debug!(kind = entry.name, ?replacement, "migrated deprecated operator");
    let status = if dropped.is_empty() {
        MigrationStatus::Migrated
    } else {
        MigrationStatus::Partial(dropped)
    };
    Some(report(Some(replacement), status))
}

/// Recreate planned links, returning those the graph refused
fn relink(graph: &mut Graph, kind: &str, links: Vec<PlannedLink>) -> Vec<DroppedLink> {
    let mut dropped = Vec::new();
    for link in links {
        if let Err(error) = graph.link(link.from, link.to) {
            tracing::warn!(kind, slot = %link.slot, %error, "link lost during migration");
            let types = |slot| graph.slot(slot).map(Slot::value_type).unwrap_or(ValueType::FloatN);
            dropped.push(DroppedLink {
                from: types(link.from),
                to: types(link.to),
                slot: link.slot,
                direction: link.direction,
            });
        }
    }
    dropped
}

fn unmigratable(entry: &DeprecatedEntry, reason: impl Into<String>) -> GraphError {
    GraphError::UnmigratableNode {
        kind: entry.name,
        reason: reason.into(),
    }
}

/// Build the replacement of `old` without touching the graph
fn plan(graph: &Graph, old: &Operator, entry: &DeprecatedEntry) -> Result<Plan> {
    let mut operator = Operator::new(entry.replacement).with_position(old.position[0], old.position[1]);
    if let Some(mask) = old.swizzle_mask() {
        operator.set_swizzle_mask(mask.clone())?;
    }

    let wanted = old.operand_count();
    while operator.operand_count() < wanted && operator.add_operand().is_ok() {}
    while operator.operand_count() > wanted
        && operator.remove_operand(operator.operand_count() - 1).is_ok()
    {}
    if operator.operand_count() != wanted || operator.operand_offset() != old.operand_offset() {
        return Err(unmigratable(
            entry,
            format!(
                "{} takes {} operands, found {wanted}",
                operator.name(),
                operator.operand_count()
            ),
        ));
    }

    let source_type = |slot: &Slot| {
        graph
            .source_of(slot.id)
            .and_then(|source| graph.slot(source))
            .map(Slot::value_type)
    };

    // Operand types: linked operands follow their source, legacy literals
    // follow their channel count.
    let accepted = operator.descriptor().accepted;
    let default_type = operator.descriptor().default_type;
    let mut types = Vec::with_capacity(wanted);
    for slot in old.operands() {
        let chosen = match source_type(slot) {
            Some(source) => operator.best_operand_type(source),
            None => match slot.value() {
                Value::FloatN(channels) => ValueType::float_with_channels(channels.len())
                    .and_then(|ty| AffinityTable::global().best_match(ty, accepted))
                    .or(Some(default_type)),
                other => AffinityTable::global().best_match(
                    ValueType::float_with_channels(other.channels().len()).unwrap_or(default_type),
                    accepted,
                ),
            },
        };
        let chosen = chosen.ok_or_else(|| {
            unmigratable(entry, format!("no operand type of {} fits '{}'", operator.name(), slot.name))
        })?;
        types.push(chosen);
    }
    if operator.descriptor().uniform {
        if let Some(shared) = unify_all(types.iter().copied()).or_else(|| types.first().copied()) {
            operator.set_operand_type(0, shared)?;
        }
    } else {
        for (index, value_type) in types.into_iter().enumerate() {
            operator.set_operand_type(index, value_type)?;
        }
    }

    // Literals: FloatN values are converted, typed leading inputs copied as is
    for (index, slot) in old.inputs().iter().enumerate() {
        if let Some(target) = operator.input(index) {
            if let Some(value) = slot.value().convert_to_type(target.value_type(), 0.0) {
                operator.set_input_value(index, value)?;
            }
        }
    }

    let mut links = Vec::new();
    let mut dropped = Vec::new();

    for (slot, target) in old.inputs().iter().zip(operator.inputs()) {
        let Some(source) = graph.source_of(slot.id) else {
            continue;
        };
        let Some(output) = graph.slot(source) else {
            continue;
        };
        if can_link(output, target) {
            links.push(PlannedLink {
                from: source,
                to: target.id,
                slot: slot.name.clone(),
                direction: SlotDirection::Input,
            });
        } else {
            dropped.push(DroppedLink {
                slot: slot.name.clone(),
                direction: SlotDirection::Input,
                from: output.value_type(),
                to: target.value_type(),
            });
        }
    }

    for (slot, replacement) in old.outputs().iter().zip(operator.outputs()) {
        for destination in graph.fan_out(slot.id) {
            let Some(input) = graph.slot(destination) else {
                continue;
            };
            if can_link(replacement, input) {
                links.push(PlannedLink {
                    from: replacement.id,
                    to: destination,
                    slot: slot.name.clone(),
                    direction: SlotDirection::Output,
                });
            } else {
                dropped.push(DroppedLink {
                    slot: slot.name.clone(),
                    direction: SlotDirection::Output,
                    from: replacement.value_type(),
                    to: input.value_type(),
                });
            }
        }
    }

    Ok(Plan {
        operator,
        links,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inline(graph: &mut Graph, value_type: ValueType, value: impl Into<Value>) -> SlotId {
        let mut op = Operator::inline(value_type);
        op.set_input_value(0, value).unwrap();
        let output = op.outputs()[0].id;
        graph.add_operator(op);
        output
    }

    fn sink(graph: &mut Graph, value_type: ValueType) -> SlotId {
        let op = Operator::inline(value_type);
        let input = op.inputs()[0].id;
        graph.add_operator(op);
        input
    }

    fn canonical(graph: &Graph) -> Vec<&Operator> {
        graph.operators().filter(|op| !op.is_inline()).collect()
    }

    #[test]
    fn test_round_trip_preserves_links() {
        let mut graph = Graph::new("legacy");
        let one = inline(&mut graph, ValueType::Float, 1.0);
        let vec3 = inline(&mut graph, ValueType::Vector3, [1.0, 2.0, 3.0]);
        let legacy = Operator::deprecated(LegacyOperator::Add).with_position(10.0, 20.0);
        let legacy_id = legacy.id;
        let (a, b, out) = (legacy.inputs()[0].id, legacy.inputs()[1].id, legacy.outputs()[0].id);
        graph.add_operator(legacy);
        graph.link(one, a).unwrap();
        graph.link(vec3, b).unwrap();
        let sink_n = sink(&mut graph, ValueType::FloatN);
        let sink_v3 = sink(&mut graph, ValueType::Vector3);
        graph.link(out, sink_n).unwrap();
        graph.link(out, sink_v3).unwrap();
        let operator_count = graph.operator_count();

        let reports = sanitize(&mut graph);
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.status, MigrationStatus::Migrated);
        assert_eq!(report.original, legacy_id);
        assert_eq!(report.position, [10.0, 20.0]);

        assert_eq!(graph.operator_count(), operator_count);
        let ops = canonical(&graph);
        assert_eq!(ops.len(), 1);
        let add = ops[0];
        assert_eq!(Some(add.id), report.replacement);
        assert_eq!(add.kind(), OperatorKind::Add);
        assert_eq!(add.position, [10.0, 20.0]);
        assert!(add.inputs().iter().all(|s| graph.has_link(s.id, true)));
        assert_eq!(add.operands()[0].value_type(), ValueType::Float);
        assert_eq!(add.operands()[1].value_type(), ValueType::Vector3);

        let new_out = add.outputs()[0].id;
        assert_eq!(graph.fan_out(new_out).count(), 2);
        assert_eq!(graph.evaluate(new_out).unwrap(), Value::Float3([2.0, 3.0, 4.0]));
        assert_eq!(graph.link_count(), 4);
    }

    #[test]
    fn test_unlinked_literals_are_converted() {
        let mut graph = Graph::default();
        let mut legacy = Operator::deprecated(LegacyOperator::Multiply);
        legacy.set_input_value(0, Value::FloatN(vec![1.0, 2.0, 3.0])).unwrap();
        legacy.set_input_value(1, Value::FloatN(vec![4.0])).unwrap();
        let out = legacy.outputs()[0].id;
        graph.add_operator(legacy);
        let target = sink(&mut graph, ValueType::FloatN);
        graph.link(out, target).unwrap();

        let reports = sanitize(&mut graph);
        assert_eq!(reports[0].status, MigrationStatus::Migrated);
        let mul = canonical(&graph)[0];
        assert_eq!(mul.operands()[0].value(), &Value::Float3([1.0, 2.0, 3.0]));
        assert_eq!(mul.operands()[1].value(), &Value::Float(4.0));
        assert!(graph.has_link(mul.outputs()[0].id, false));
        let result = graph.evaluate(mul.outputs()[0].id).unwrap();
        assert_eq!(result, Value::Float3([4.0, 8.0, 12.0]));
    }

    #[test]
    fn test_branch_keeps_predicate_and_unifies_operands() {
        let mut graph = Graph::default();
        let vec2 = inline(&mut graph, ValueType::Vector2, [5.0, 6.0]);
        let mut legacy = Operator::deprecated(LegacyOperator::Branch);
        legacy.set_input_value(0, true).unwrap();
        legacy.set_input_value(2, Value::FloatN(vec![1.0, 2.0, 3.0])).unwrap();
        let if_true = legacy.inputs()[1].id;
        graph.add_operator(legacy);
        graph.link(vec2, if_true).unwrap();

        let reports = sanitize(&mut graph);
        assert_eq!(reports[0].status, MigrationStatus::Migrated);
        let branch = canonical(&graph)[0];
        assert_eq!(branch.kind(), OperatorKind::Branch);
        assert_eq!(branch.inputs()[0].value(), &Value::Bool(true));
        assert_eq!(branch.operands()[0].value_type(), ValueType::Vector3);
        assert_eq!(branch.operands()[1].value(), &Value::Float3([1.0, 2.0, 3.0]));
        assert!(graph.has_link(branch.operands()[0].id, false));
        let result = graph.evaluate(branch.outputs()[0].id).unwrap();
        assert_eq!(result, Value::Float3([5.0, 6.0, 0.0]));
    }

    #[test]
    fn test_dot_product_of_two_floats() {
        let mut graph = Graph::default();
        let two = inline(&mut graph, ValueType::Float, 2.0);
        let three = inline(&mut graph, ValueType::Float, 3.0);
        let legacy = Operator::deprecated(LegacyOperator::DotProduct);
        let (a, b, out) = (legacy.inputs()[0].id, legacy.inputs()[1].id, legacy.outputs()[0].id);
        graph.add_operator(legacy);
        graph.link(two, a).unwrap();
        graph.link(three, b).unwrap();
        let target = sink(&mut graph, ValueType::Float);
        graph.link(out, target).unwrap();

        let reports = sanitize(&mut graph);
        assert_eq!(reports[0].status, MigrationStatus::Migrated);
        let dot = canonical(&graph)[0];
        assert_eq!(dot.operands()[0].value_type(), ValueType::Float);
        assert_eq!(graph.evaluate(target).unwrap(), Value::Float(6.0));
    }

    #[test]
    fn test_unmigratable_node_does_not_abort_batch() {
        let mut graph = Graph::default();
        let mut sine = Operator::deprecated(LegacyOperator::Sine);
        sine.set_input_value(0, Value::FloatN(vec![1.0, 2.0])).unwrap();
        let out = sine.outputs()[0].id;
        let sine = graph.add_operator(sine);
        let target = sink(&mut graph, ValueType::Position);
        graph.link(out, target).unwrap();
        graph.add_operator(Operator::deprecated(LegacyOperator::Cosine));

        let strict = SanitizeConfig {
            fail_open: false,
            ..SanitizeConfig::default()
        };
        let reports = sanitize_with(&mut graph, &strict);
        assert_eq!(reports.len(), 2);
        let failed = reports.iter().find(|r| r.original == sine).unwrap();
        assert!(matches!(
            failed.status,
            MigrationStatus::Failed(GraphError::UnmigratableNode { .. })
        ));
        assert!(!failed.is_migrated());
        assert!(reports.iter().any(|r| r.is_migrated()));
        assert!(graph.operator(sine).is_some());

        let discard = SanitizeConfig {
            keep_unmigratable: false,
            ..strict
        };
        let reports = sanitize_with(&mut graph, &discard);
        assert_eq!(reports.len(), 1);
        assert!(graph.operator(sine).is_none());
        assert!(!graph.has_link(target, false));
        assert!(graph.operators().all(|op| !op.is_deprecated()));
    }

    #[test]
    fn test_refused_links_keep_direction_and_legacy_slot() {
        let mut graph = Graph::default();
        let upstream = Operator::new(OperatorKind::Add);
        let (upstream_in, upstream_out) = (upstream.inputs()[0].id, upstream.outputs()[0].id);
        graph.add_operator(upstream);
        let downstream = Operator::new(OperatorKind::Add);
        let (downstream_in, downstream_out) = (downstream.inputs()[0].id, downstream.outputs()[0].id);
        graph.add_operator(downstream);
        graph.link(upstream_out, downstream_in).unwrap();

        let links = vec![
            PlannedLink {
                from: downstream_out,
                to: upstream_in,
                slot: "o".to_string(),
                direction: SlotDirection::Output,
            },
            PlannedLink {
                from: upstream_out,
                to: upstream_out,
                slot: "b".to_string(),
                direction: SlotDirection::Input,
            },
        ];
        let dropped = relink(&mut graph, "Add (FloatN)", links);
        assert_eq!(
            dropped,
            vec![
                DroppedLink {
                    slot: "o".to_string(),
                    direction: SlotDirection::Output,
                    from: ValueType::Float,
                    to: ValueType::Float,
                },
                DroppedLink {
                    slot: "b".to_string(),
                    direction: SlotDirection::Input,
                    from: ValueType::Float,
                    to: ValueType::Float,
                },
            ]
        );
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_component_mask_becomes_swizzle() {
        let mut graph = Graph::default();
        let color = inline(&mut graph, ValueType::Vector4, [1.0, 2.0, 3.0, 4.0]);
        let mask = Operator::deprecated(LegacyOperator::ComponentMask);
        let (input, out) = (mask.inputs()[0].id, mask.outputs()[0].id);
        let mask = graph.add_operator(mask);
        graph.set_swizzle_mask(mask, "wx").unwrap();
        graph.link(color, input).unwrap();
        let target = sink(&mut graph, ValueType::FloatN);
        graph.link(out, target).unwrap();

        let reports = sanitize(&mut graph);
        assert_eq!(reports[0].status, MigrationStatus::Migrated);
        let swizzle = canonical(&graph)[0];
        assert_eq!(swizzle.kind(), OperatorKind::Swizzle);
        assert_eq!(swizzle.swizzle_mask().unwrap().channels(), &[3, 0]);
        assert_eq!(swizzle.outputs()[0].value_type(), ValueType::Vector2);
        assert_eq!(graph.evaluate(target).unwrap(), Value::Float2([4.0, 1.0]));
    }

    #[test]
    fn test_single_operand_append_vector_shrinks() {
        let mut graph = Graph::default();
        let mut legacy = Operator::deprecated(LegacyOperator::AppendVector);
        legacy.set_input_value(0, Value::FloatN(vec![1.0, 2.0])).unwrap();
        graph.add_operator(legacy);

        let reports = sanitize(&mut graph);
        assert_eq!(reports[0].status, MigrationStatus::Migrated);
        let append = canonical(&graph)[0];
        assert_eq!(append.operand_count(), 1);
        assert_eq!(append.outputs()[0].value_type(), ValueType::Vector2);
        let result = graph.evaluate(append.outputs()[0].id).unwrap();
        assert_eq!(result, Value::Float2([1.0, 2.0]));
    }

    #[test]
    fn test_fit_clamped_becomes_clamped_remap() {
        let mut graph = Graph::default();
        let mut legacy = Operator::deprecated(LegacyOperator::FitClamped);
        for (index, value) in [3.0, 0.0, 2.0, 10.0, 20.0].into_iter().enumerate() {
            legacy.set_input_value(index, Value::FloatN(vec![value])).unwrap();
        }
        graph.add_operator(legacy);

        sanitize(&mut graph);
        let remap = canonical(&graph)[0];
        assert_eq!(remap.kind(), OperatorKind::RemapClamped);
        assert_eq!(graph.evaluate(remap.outputs()[0].id).unwrap(), Value::Float(20.0));
    }

    #[test]
    fn test_incompatible_downstream_link_is_reported() {
        let mut graph = Graph::default();
        let mut legacy = Operator::deprecated(LegacyOperator::Sine);
        legacy.set_input_value(0, Value::FloatN(vec![1.0, 2.0])).unwrap();
        let legacy_id = legacy.id;
        let out = legacy.outputs()[0].id;
        graph.add_operator(legacy);
        let target = sink(&mut graph, ValueType::Position);
        graph.link(out, target).unwrap();

        let strict = SanitizeConfig {
            fail_open: false,
            ..SanitizeConfig::default()
        };
        let reports = sanitize_with(&mut graph, &strict);
        assert!(matches!(reports[0].status, MigrationStatus::Failed(_)));
        assert!(graph.operator(legacy_id).is_some());
        assert!(graph.has_link(target, false));

        let reports = sanitize(&mut graph);
        let dropped = reports[0].dropped_links();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].direction, SlotDirection::Output);
        assert_eq!(dropped[0].from, ValueType::Vector2);
        assert_eq!(dropped[0].to, ValueType::Position);
        assert!(!graph.has_link(target, false));
        assert!(graph.operator(legacy_id).is_none());
    }

    #[test]
    fn test_chained_deprecated_operators() {
        let mut graph = Graph::default();
        let vec3 = inline(&mut graph, ValueType::Vector3, [1.0, -2.0, 3.0]);
        let abs = Operator::deprecated(LegacyOperator::Absolute);
        let (abs_in, abs_out) = (abs.inputs()[0].id, abs.outputs()[0].id);
        let length = Operator::deprecated(LegacyOperator::Length);
        let (length_in, length_out) = (length.inputs()[0].id, length.outputs()[0].id);
        graph.add_operator(length);
        graph.add_operator(abs);
        graph.link(vec3, abs_in).unwrap();
        graph.link(abs_out, length_in).unwrap();
        let target = sink(&mut graph, ValueType::Float);
        graph.link(length_out, target).unwrap();

        let reports = sanitize(&mut graph);
        assert!(reports.iter().all(|r| r.status == MigrationStatus::Migrated));
        assert_eq!(reports[0].original_kind, "Absolute (FloatN)");
        assert_eq!(canonical(&graph).len(), 2);
        assert_eq!(graph.evaluate(target).unwrap(), Value::Float(14.0f32.sqrt()));
        assert!(sanitize(&mut graph).is_empty());
    }

    const SOURCE_TYPES: [Option<ValueType>; 5] = [
        None,
        Some(ValueType::Float),
        Some(ValueType::Vector2),
        Some(ValueType::Vector3),
        Some(ValueType::Vector4),
    ];

    proptest! {
        #[test]
        fn test_sanitize_preserves_links_and_literals(
            row in 0..DEPRECATED_OPERATORS.len(),
            sources in prop::collection::vec(0..SOURCE_TYPES.len(), 5),
            sizes in prop::collection::vec(1..=4usize, 5),
            values in prop::collection::vec(-10.0f32..10.0, 20),
        ) {
            let entry = &DEPRECATED_OPERATORS[row];

            let mut graph = Graph::default();
            let mut legacy = Operator::deprecated(entry.legacy);
            let offset = legacy.operand_offset();
            let mut linked = Vec::new();
            for i in 0..legacy.operand_count() {
                let literal = Value::FloatN(values[i * 4..i * 4 + sizes[i]].to_vec());
                legacy.set_input_value(offset + i, literal).unwrap();
            }
            let old_inputs: Vec<Slot> = legacy.inputs().to_vec();
            let out = legacy.outputs()[0].id;
            let legacy_id = graph.add_operator(legacy);
            for i in 0..old_inputs.len() - offset {
                if let Some(value_type) = SOURCE_TYPES[sources[i]] {
                    let source = inline(&mut graph, value_type, 1.0);
                    graph.link(source, old_inputs[offset + i].id).unwrap();
                    linked.push(offset + i);
                }
            }
            let target = sink(&mut graph, ValueType::FloatN);
            graph.link(out, target).unwrap();

            let reports = sanitize(&mut graph);
            prop_assert_eq!(&reports[0].status, &MigrationStatus::Migrated);
            prop_assert!(graph.operator(legacy_id).is_none());

            let ops = canonical(&graph);
            prop_assert_eq!(ops.len(), 1);
            let new = ops[0];
            prop_assert!(graph.has_link(new.outputs()[0].id, false));
            for (index, old) in old_inputs.iter().enumerate() {
                let slot = &new.inputs()[index];
                if linked.contains(&index) {
                    prop_assert!(graph.has_link(slot.id, true));
                } else if let Value::FloatN(channels) = old.value() {
                    let migrated = slot.value().channels();
                    prop_assert!(migrated.len() >= channels.len() || channels.len() == 1);
                    prop_assert_eq!(migrated[0], channels[0]);
                    if channels.len() > 1 {
                        prop_assert_eq!(&migrated[..channels.len()], &channels[..]);
                    }
                } else {
                    prop_assert_eq!(slot.value(), old.value());
                }
            }
        }
    }
}
