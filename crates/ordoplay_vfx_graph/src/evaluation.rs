// SPDX-License-Identifier: MIT OR Apache-2.0
//! CPU evaluation of expressions and graph slots.
//!
//! [`compile`] reduces an [`Expression`] bottom-up into a concrete [`Value`].
//! It is pure: the same expression always yields the same result, and a node
//! shared by several parents is reduced once. Integer arithmetic stays in its
//! own width (`u32` division and remainder are never widened), wraps on
//! overflow, and yields `0` when dividing by zero.
//!
//! [`EvaluationContext`] resolves slots of a [`Graph`], caching the
//! expression and value of every slot it visits, so each slot of a shared
//! subgraph is built and reduced once per context.

use crate::expression::{BinaryOp, Expression, UnaryOp};
use crate::graph::Graph;
use crate::operator::OperatorId;
use crate::slot::{SlotDirection, SlotId};
use crate::value::{Value, ValueLayout, ValueType};
use std::collections::HashMap;
use std::f32::consts::TAU;

/// Reduce an expression to its value
pub fn compile(expression: &Expression) -> Result<Value, EvaluationError> {
    Compiler::default().compile(expression)
}

/// Reducer remembering the value of every node it has seen
#[derive(Default)]
struct Compiler {
    cache: HashMap<*const Expression, Value>,
}

impl Compiler {
    fn node(&mut self, expression: &Expression) -> Result<Value, EvaluationError> {
        let key = expression as *const Expression;
        if let Some(value) = self.cache.get(&key) {
            return Ok(value.clone());
        }
        let value = self.compile(expression)?;
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    fn compile(&mut self, expression: &Expression) -> Result<Value, EvaluationError> {
        match expression {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Convert { operand, layout, pad } => {
                let value = self.node(operand)?;
                value.convert(*layout, *pad).ok_or(EvaluationError::TypeMismatch {
                    expected: *layout,
                    found: value.layout(),
                })
            }
            Expression::Normalize(operand) => {
                let value = self.node(operand)?;
                let channels = float_channels(&value)?;
                let length = channels.iter().map(|c| c * c).sum::<f32>().sqrt();
                let normalized: Vec<f32> = if length > 0.0 {
                    channels.iter().map(|c| c / length).collect()
                } else {
                    vec![0.0; channels.len()]
                };
                Ok(Value::from_channels(value.layout(), &normalized, 0.0))
            }
            Expression::Unary { op, operand } => unary(*op, self.node(operand)?),
            Expression::Binary { op, lhs, rhs } => binary(*op, self.node(lhs)?, self.node(rhs)?),
            Expression::Clamp { value, min, max } => {
                let lower = binary(BinaryOp::Maximum, self.node(value)?, self.node(min)?)?;
                binary(BinaryOp::Minimum, lower, self.node(max)?)
            }
            Expression::Lerp { x, y, s } => {
                let (x, y, s) = (self.node(x)?, self.node(y)?, self.node(s)?);
                same_layout(&x, &y)?;
                same_layout(&x, &s)?;
                let (cx, cy, cs) = (float_channels(&x)?, float_channels(&y)?, float_channels(&s)?);
                let data: Vec<f32> = cx
                    .iter()
                    .zip(&cy)
                    .zip(&cs)
                    .map(|((a, b), t)| a + (b - a) * t)
                    .collect();
                Ok(Value::from_channels(x.layout(), &data, 0.0))
            }
            Expression::Length(operand) => {
                let channels = float_channels(&self.node(operand)?)?;
                Ok(Value::Float(channels.iter().map(|c| c * c).sum::<f32>().sqrt()))
            }
            Expression::Dot(lhs, rhs) => {
                let (a, b) = (self.node(lhs)?, self.node(rhs)?);
                same_layout(&a, &b)?;
                let (ca, cb) = (float_channels(&a)?, float_channels(&b)?);
                Ok(Value::Float(ca.iter().zip(&cb).map(|(x, y)| x * y).sum()))
            }
            Expression::Distance(lhs, rhs) => {
                let (a, b) = (self.node(lhs)?, self.node(rhs)?);
                same_layout(&a, &b)?;
                let (ca, cb) = (float_channels(&a)?, float_channels(&b)?);
                let squared: f32 = ca.iter().zip(&cb).map(|(x, y)| (x - y) * (x - y)).sum();
                Ok(Value::Float(squared.sqrt()))
            }
            Expression::Branch {
                predicate,
                if_true,
                if_false,
            } => {
                let predicate = self.node(predicate)?;
                match predicate.as_bool() {
                    Some(true) => self.node(if_true),
                    Some(false) => self.node(if_false),
                    None => Err(EvaluationError::TypeMismatch {
                        expected: ValueLayout::Bool,
                        found: predicate.layout(),
                    }),
                }
            }
            Expression::Append(parts) => {
                let mut data = Vec::with_capacity(4);
                for part in parts {
                    data.extend(float_channels(&self.node(part)?)?);
                }
                let layout = ValueLayout::float_with_channels(data.len())
                    .ok_or(EvaluationError::ChannelOverflow(data.len()))?;
                Ok(Value::from_channels(layout, &data, 0.0))
            }
            Expression::Swizzle { operand, mask } => {
                let channels = float_channels(&self.node(operand)?)?;
                let last = channels.len().saturating_sub(1);
                let data: Vec<f32> = mask
                    .iter()
                    .map(|i| channels.get((*i).min(last)).copied().unwrap_or(0.0))
                    .collect();
                let layout = ValueLayout::float_with_channels(data.len())
                    .ok_or(EvaluationError::ChannelOverflow(data.len()))?;
                Ok(Value::from_channels(layout, &data, 0.0))
            }
        }
    }
}

fn same_layout(a: &Value, b: &Value) -> Result<(), EvaluationError> {
    if a.layout() == b.layout() {
        Ok(())
    } else {
        Err(EvaluationError::TypeMismatch {
            expected: a.layout(),
            found: b.layout(),
        })
    }
}

fn float_channels(value: &Value) -> Result<Vec<f32>, EvaluationError> {
    match value {
        Value::Float(_) | Value::Float2(_) | Value::Float3(_) | Value::Float4(_) | Value::FloatN(_) => {
            Ok(value.channels())
        }
        other => Err(EvaluationError::TypeMismatch {
            expected: ValueLayout::Float,
            found: other.layout(),
        }),
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvaluationError> {
    match (op, &value) {
        (UnaryOp::Absolute, Value::Int32(v)) => return Ok(Value::Int32(v.wrapping_abs())),
        (UnaryOp::Absolute, Value::Uint32(_)) => return Ok(value),
        _ => {}
    }
    let channels = float_channels(&value)?;
    let f = |x: f32| match op {
        UnaryOp::Absolute => x.abs(),
        UnaryOp::Sine => x.sin(),
        UnaryOp::Cosine => x.cos(),
        UnaryOp::Floor => x.floor(),
        UnaryOp::Fraction => x - x.floor(),
        UnaryOp::OneMinus => 1.0 - x,
        UnaryOp::Reciprocal => 1.0 / x,
        UnaryOp::SquareRoot => x.sqrt(),
        UnaryOp::Saturate => x.clamp(0.0, 1.0),
        UnaryOp::Ceiling => x.ceil(),
        UnaryOp::Round => x.round(),
        UnaryOp::Sign => {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        UnaryOp::Tangent => x.tan(),
        UnaryOp::RemapToZeroOne => x * 0.5 + 0.5,
        UnaryOp::RemapToNegOnePosOne => x * 2.0 - 1.0,
        UnaryOp::SawtoothWave => x - x.floor(),
        UnaryOp::SineWave => (x * TAU).sin() * 0.5 + 0.5,
        UnaryOp::SquareWave => ((x - x.floor()) * 2.0).floor(),
        UnaryOp::TriangleWave => 1.0 - ((x - x.floor()) * 2.0 - 1.0).abs(),
    };
    let data: Vec<f32> = channels.into_iter().map(f).collect();
    Ok(Value::from_channels(value.layout(), &data, 0.0))
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvaluationError> {
    same_layout(&lhs, &rhs)?;
    match (&lhs, &rhs) {
        (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(int_binary(op, *a, *b))),
        (Value::Uint32(a), Value::Uint32(b)) => Ok(Value::Uint32(uint_binary(op, *a, *b))),
        _ => {
            let (a, b) = (float_channels(&lhs)?, float_channels(&rhs)?);
            let data: Vec<f32> = a.iter().zip(&b).map(|(x, y)| float_binary(op, *x, *y)).collect();
            Ok(Value::from_channels(lhs.layout(), &data, 0.0))
        }
    }
}

fn float_binary(op: BinaryOp, a: f32, b: f32) -> f32 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        BinaryOp::Minimum => a.min(b),
        BinaryOp::Maximum => a.max(b),
        BinaryOp::Modulo => a - (a / b).floor() * b,
        BinaryOp::Power => a.powf(b),
        BinaryOp::Step => {
            if a >= b {
                1.0
            } else {
                0.0
            }
        }
    }
}

fn int_binary(op: BinaryOp, a: i32, b: i32) -> i32 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Subtract => a.wrapping_sub(b),
        BinaryOp::Multiply => a.wrapping_mul(b),
        BinaryOp::Divide => a.checked_div(b).unwrap_or(0),
        BinaryOp::Minimum => a.min(b),
        BinaryOp::Maximum => a.max(b),
        BinaryOp::Modulo => a.checked_rem(b).unwrap_or(0),
        BinaryOp::Power => match (a, b) {
            (_, 0..) => a.wrapping_pow(b.unsigned_abs()),
            (1, _) => 1,
            (-1, _) => if b % 2 == 0 { 1 } else { -1 },
            _ => 0,
        },
        BinaryOp::Step => i32::from(a >= b),
    }
}

fn uint_binary(op: BinaryOp, a: u32, b: u32) -> u32 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Subtract => a.wrapping_sub(b),
        BinaryOp::Multiply => a.wrapping_mul(b),
        BinaryOp::Divide => a.checked_div(b).unwrap_or(0),
        BinaryOp::Minimum => a.min(b),
        BinaryOp::Maximum => a.max(b),
        BinaryOp::Modulo => a.checked_rem(b).unwrap_or(0),
        BinaryOp::Power => a.wrapping_pow(b),
        BinaryOp::Step => u32::from(a >= b),
    }
}

/// Context for evaluating slots of a graph on the CPU.
///
/// Slot ownership and incoming links are indexed once when the context is
/// created. The context must not outlive a mutation of the graph.
pub struct EvaluationContext<'a> {
    /// The graph being evaluated
    pub graph: &'a Graph,
    owners: HashMap<SlotId, OperatorId>,
    sources: HashMap<SlotId, SlotId>,
    expressions: HashMap<SlotId, Expression>,
    values: HashMap<SlotId, Value>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(graph: &'a Graph) -> Self {
        let owners = graph
            .operators()
            .flat_map(|op| op.slots().map(move |slot| (slot.id, op.id)))
            .collect();
        let sources = graph.links().map(|l| (l.to_slot, l.from_slot)).collect();
        Self {
            graph,
            owners,
            sources,
            expressions: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Number of slots whose value is cached
    pub fn cached_values(&self) -> usize {
        self.values.len()
    }

    /// Build the expression of a slot; shared upstream slots share nodes
    pub fn expression(&mut self, slot: SlotId) -> Result<Expression, EvaluationError> {
        self.resolve(slot, &mut Vec::new(), Self::expression_of)
    }

    /// Evaluate a slot, reducing every upstream slot once
    pub fn evaluate(&mut self, slot: SlotId) -> Result<Value, EvaluationError> {
        self.value_of(slot, &mut Vec::new())
    }

    fn expression_of(
        &mut self,
        slot: SlotId,
        stack: &mut Vec<OperatorId>,
    ) -> Result<Expression, EvaluationError> {
        if let Some(expression) = self.expressions.get(&slot) {
            return Ok(expression.clone());
        }
        let expression = self.resolve(slot, stack, Self::expression_of)?;
        self.expressions.insert(slot, expression.clone());
        Ok(expression)
    }

    fn value_of(&mut self, slot: SlotId, stack: &mut Vec<OperatorId>) -> Result<Value, EvaluationError> {
        if let Some(value) = self.values.get(&slot) {
            return Ok(value.clone());
        }
        let expression = self.resolve(slot, stack, |context, slot, stack| {
            context.value_of(slot, stack).map(Expression::Literal)
        })?;
        let value = compile(&expression)?;
        self.values.insert(slot, value.clone());
        Ok(value)
    }

    /// Expression of `slot` in terms of what `upstream` yields for the
    /// slots it depends on
    fn resolve<F>(
        &mut self,
        slot_id: SlotId,
        stack: &mut Vec<OperatorId>,
        upstream: F,
    ) -> Result<Expression, EvaluationError>
    where
        F: Fn(&mut Self, SlotId, &mut Vec<OperatorId>) -> Result<Expression, EvaluationError>,
    {
        let graph = self.graph;
        let operator = self
            .owners
            .get(&slot_id)
            .and_then(|id| graph.operator(*id))
            .ok_or(EvaluationError::SlotNotFound(slot_id))?;
        let slot = operator.slot(slot_id).ok_or(EvaluationError::SlotNotFound(slot_id))?;
        let value_type = slot.value_type();

        let source = self.sources.get(&slot_id).copied();

        let expression = match slot.direction {
            SlotDirection::Input => match source {
                Some(source) => {
                    let source = upstream(self, source, stack)?;
                    if value_type == ValueType::FloatN {
                        source
                    } else {
                        source.convert(value_type.layout(), 0.0)
                    }
                }
                None => Expression::Literal(slot.value().clone()),
            },
            SlotDirection::Output => {
                if stack.contains(&operator.id) {
                    return Err(EvaluationError::CycleDetected);
                }
                stack.push(operator.id);
                let inputs = operator
                    .inputs()
                    .iter()
                    .map(|input| upstream(self, input.id, stack))
                    .collect::<Result<Vec<_>, _>>()?;
                stack.pop();
                let index = operator
                    .outputs()
                    .iter()
                    .position(|s| s.id == slot_id)
                    .unwrap_or_default();
                operator.build_expression(index, inputs)?
            }
        };

        Ok(if value_type == ValueType::Direction {
            expression.normalize()
        } else {
            expression
        })
    }
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// Graph contains a cycle
    #[error("graph contains a cycle")]
    CycleDetected,

    /// Slot not found
    #[error("slot not found: {0:?}")]
    SlotNotFound(SlotId),

    /// Operand layouts do not match
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Expected layout
        expected: ValueLayout,
        /// Actual layout
        found: ValueLayout,
    },

    /// Result would hold more than four float channels
    #[error("{0} channels do not fit in a float vector")]
    ChannelOverflow(usize),

    /// Operator cannot be evaluated, e.g. a deprecated operator
    #[error("{0} cannot be evaluated; sanitize the graph first")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Operator, OperatorKind};
    use std::sync::Arc;

    fn lit(v: impl Into<Value>) -> Expression {
        Expression::literal(v)
    }

    #[test]
    fn test_unsigned_modulo_stays_unsigned() {
        let (a, b) = (1_610_612_737u32, 805_306_361u32);
        let e = Expression::binary(BinaryOp::Modulo, lit(a), lit(b));
        assert_eq!(compile(&e).unwrap(), Value::Uint32(a % b));
    }

    #[test]
    fn test_float_modulo_repeats() {
        let e = Expression::binary(BinaryOp::Modulo, lit(-1.0), lit(3.0));
        assert_eq!(compile(&e).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn test_integer_division_by_zero_is_zero() {
        let e = Expression::binary(BinaryOp::Divide, lit(7i32), lit(0i32));
        assert_eq!(compile(&e).unwrap(), Value::Int32(0));
        let e = Expression::binary(BinaryOp::Modulo, lit(7u32), lit(0u32));
        assert_eq!(compile(&e).unwrap(), Value::Uint32(0));
    }

    #[test]
    fn test_mismatched_layouts_are_rejected() {
        let e = Expression::binary(BinaryOp::Add, lit(1.0), lit([1.0, 2.0]));
        assert!(matches!(compile(&e), Err(EvaluationError::TypeMismatch { .. })));
    }

    #[test]
    fn test_normalize_zero_vector() {
        let e = lit([0.0, 0.0, 0.0]).normalize();
        assert_eq!(compile(&e).unwrap(), Value::Float3([0.0; 3]));
        let e = lit([3.0, 0.0, 4.0]).normalize();
        assert_eq!(compile(&e).unwrap(), Value::Float3([0.6, 0.0, 0.8]));
    }

    #[test]
    fn test_clamp_integers() {
        let e = Expression::Clamp {
            value: Arc::new(lit(-6i32)),
            min: Arc::new(lit(-3i32)),
            max: Arc::new(lit(4i32)),
        };
        assert_eq!(compile(&e).unwrap(), Value::Int32(-3));
    }

    #[test]
    fn test_swizzle_clamps_out_of_range_channels() {
        let e = Expression::Swizzle {
            operand: Arc::new(lit([1.0, 2.0])),
            mask: vec![1, 2, 0],
        };
        assert_eq!(compile(&e).unwrap(), Value::Float3([2.0, 2.0, 1.0]));
    }

    #[test]
    fn test_branch_requires_bool() {
        let e = Expression::Branch {
            predicate: Arc::new(lit(1.0)),
            if_true: Arc::new(lit(1.0)),
            if_false: Arc::new(lit(2.0)),
        };
        assert!(compile(&e).is_err());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let e = Expression::binary(
            BinaryOp::Add,
            lit([1.0, 2.0, 3.0]),
            lit([6.0, 5.0, 4.0]).normalize(),
        );
        assert_eq!(compile(&e).unwrap(), compile(&e).unwrap());
    }

    #[test]
    fn test_new_unary_functions() {
        let cases = [
            (UnaryOp::Ceiling, 1.25, 2.0),
            (UnaryOp::Round, -2.5, -3.0),
            (UnaryOp::Sign, -0.5, -1.0),
            (UnaryOp::Sign, 0.0, 0.0),
            (UnaryOp::RemapToZeroOne, -1.0, 0.0),
            (UnaryOp::RemapToNegOnePosOne, 0.75, 0.5),
            (UnaryOp::SawtoothWave, 2.25, 0.25),
            (UnaryOp::SquareWave, 0.25, 0.0),
            (UnaryOp::SquareWave, 1.75, 1.0),
            (UnaryOp::TriangleWave, 0.5, 1.0),
            (UnaryOp::TriangleWave, 1.0, 0.0),
            (UnaryOp::SineWave, 0.0, 0.5),
        ];
        for (op, x, expected) in cases {
            let result = compile(&Expression::unary(op, lit(x))).unwrap();
            assert_eq!(result, Value::Float(expected), "{op:?}({x})");
        }
    }

    #[test]
    fn test_shared_nodes_are_reduced_once() {
        let mut e = lit(1.0);
        for _ in 0..60 {
            let child = Arc::new(e);
            e = Expression::Binary {
                op: BinaryOp::Add,
                lhs: child.clone(),
                rhs: child,
            };
        }
        assert_eq!(compile(&e).unwrap(), Value::Float(2.0f32.powi(60)));
    }

    #[test]
    fn test_context_caches_slot_values() {
        let mut graph = Graph::default();
        let mut sine = Operator::new(OperatorKind::Sine);
        sine.set_input_value(0, 0.5).unwrap();
        let sine_out = sine.outputs()[0].id;
        graph.add_operator(sine);
        let add = Operator::new(OperatorKind::Add);
        let (a, b, out) = (add.inputs()[0].id, add.inputs()[1].id, add.outputs()[0].id);
        graph.add_operator(add);
        graph.link(sine_out, a).unwrap();
        graph.link(sine_out, b).unwrap();

        let mut context = EvaluationContext::new(&graph);
        let expected = Value::Float(0.5f32.sin() * 2.0);
        assert_eq!(context.evaluate(out).unwrap(), expected);
        assert_eq!(context.cached_values(), 5);
        assert_eq!(context.evaluate(out).unwrap(), expected);
        assert_eq!(compile(&context.expression(out).unwrap()).unwrap(), expected);

        let missing = SlotId::new();
        assert_eq!(context.evaluate(missing), Err(EvaluationError::SlotNotFound(missing)));
    }
}
