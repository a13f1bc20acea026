// SPDX-License-Identifier: MIT OR Apache-2.0
//! Operator definitions: slot layout, operand protocol and expression building.
//!
//! An [`Operator`] owns its input and output [`Slot`]s. Inputs are made of
//! optional leading inputs with a fixed type (the Branch predicate) followed
//! by the operands. Operand indices used by this module count operands only.
//!
//! Operators with [`Arity::Cascaded`] grow and shrink their operand list;
//! operators with dynamic operands retype them within the accepted types of
//! their [`OperatorDescriptor`], and the output type is re-derived after
//! every change.

pub mod library;

use crate::affinity::{unify_all, AffinityTable};
use crate::error::{GraphError, Result};
use crate::evaluation::EvaluationError;
use crate::expression::{BinaryOp, Expression, UnaryOp};
use crate::sanitize::LegacyOperator;
use crate::slot::{Slot, SlotId};
use crate::value::{Value, ValueLayout, ValueType};
use library::{Arity, OperatorDescriptor, OutputRule};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorId(pub Uuid);

impl OperatorId {
    /// Create a new random operator ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperatorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Operator kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Cascaded sum
    Add,
    /// Cascaded difference
    Subtract,
    /// Cascaded product
    Multiply,
    /// Cascaded quotient
    Divide,
    /// Cascaded minimum
    Minimum,
    /// Cascaded maximum
    Maximum,
    /// Concatenate operands into a vector
    AppendVector,
    /// Remainder
    Modulo,
    /// Exponentiation
    Power,
    /// Clamp to a range
    Clamp,
    /// Linear interpolation
    Lerp,
    /// Step function
    Step,
    /// Snap to a multiple of a step
    Discretize,
    /// Linear range mapping
    Remap,
    /// Linear range mapping with the input clamped to the old range
    RemapClamped,
    /// Hermite interpolation
    Smoothstep,
    /// Periodic rising ramp
    SawtoothWave,
    /// Periodic sine in `[0, 1]`
    SineWave,
    /// Periodic step
    SquareWave,
    /// Periodic triangle
    TriangleWave,
    /// Absolute value
    Absolute,
    /// Sine
    Sine,
    /// Cosine
    Cosine,
    /// Round down
    Floor,
    /// Fractional part
    Fraction,
    /// `1 - x`
    OneMinus,
    /// `1 / x`
    Reciprocal,
    /// Square root
    SquareRoot,
    /// Clamp to `[0, 1]`
    Saturate,
    /// Round up
    Ceiling,
    /// Round to nearest
    Round,
    /// Sign of each channel
    Sign,
    /// Tangent
    Tangent,
    /// `[-1, 1]` to `[0, 1]`
    RemapToZeroOne,
    /// `[0, 1]` to `[-1, 1]`
    RemapToNegOnePosOne,
    /// Unit vector
    Normalize,
    /// Vector length
    Length,
    /// Dot product
    DotProduct,
    /// Distance between points
    Distance,
    /// Squared distance between points
    SquaredDistance,
    /// Squared vector length
    SquaredLength,
    /// Predicate selection
    Branch,
    /// Channel reordering
    Swizzle,
    /// Constant of the given type
    Inline(ValueType),
    /// Legacy FloatN operator awaiting sanitization
    Deprecated(LegacyOperator),
}

impl OperatorKind {
    /// Static descriptor of this kind
    pub fn descriptor(self) -> &'static OperatorDescriptor {
        library::descriptor(self)
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Deprecated(legacy) => legacy.name(),
            _ => self.descriptor().name,
        }
    }

    fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            Self::Add => BinaryOp::Add,
            Self::Subtract => BinaryOp::Subtract,
            Self::Multiply => BinaryOp::Multiply,
            Self::Divide => BinaryOp::Divide,
            Self::Minimum => BinaryOp::Minimum,
            Self::Maximum => BinaryOp::Maximum,
            Self::Modulo => BinaryOp::Modulo,
            Self::Power => BinaryOp::Power,
            Self::Step => BinaryOp::Step,
            _ => return None,
        })
    }

    fn unary_op(self) -> Option<UnaryOp> {
        Some(match self {
            Self::Absolute => UnaryOp::Absolute,
            Self::Sine => UnaryOp::Sine,
            Self::Cosine => UnaryOp::Cosine,
            Self::Floor => UnaryOp::Floor,
            Self::Fraction => UnaryOp::Fraction,
            Self::OneMinus => UnaryOp::OneMinus,
            Self::Reciprocal => UnaryOp::Reciprocal,
            Self::SquareRoot => UnaryOp::SquareRoot,
            Self::Saturate => UnaryOp::Saturate,
            Self::Ceiling => UnaryOp::Ceiling,
            Self::Round => UnaryOp::Round,
            Self::Sign => UnaryOp::Sign,
            Self::Tangent => UnaryOp::Tangent,
            Self::RemapToZeroOne => UnaryOp::RemapToZeroOne,
            Self::RemapToNegOnePosOne => UnaryOp::RemapToNegOnePosOne,
            _ => return None,
        })
    }

    /// Wave shape applied to `input * frequency`
    fn wave_op(self) -> Option<UnaryOp> {
        Some(match self {
            Self::SawtoothWave => UnaryOp::SawtoothWave,
            Self::SineWave => UnaryOp::SineWave,
            Self::SquareWave => UnaryOp::SquareWave,
            Self::TriangleWave => UnaryOp::TriangleWave,
            _ => return None,
        })
    }
}

/// Channel selection of a Swizzle operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwizzleMask(Vec<usize>);

impl SwizzleMask {
    /// Parse a mask of one to four `xyzw` or `rgba` characters
    pub fn parse(mask: &str) -> Result<Self> {
        let channels = mask
            .chars()
            .map(|c| match c.to_ascii_lowercase() {
                'x' | 'r' => Ok(0),
                'y' | 'g' => Ok(1),
                'z' | 'b' => Ok(2),
                'w' | 'a' => Ok(3),
                other => Err(GraphError::InvalidSetting(format!(
                    "swizzle channel '{other}' is not one of xyzw or rgba"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        if channels.is_empty() || channels.len() > 4 {
            return Err(GraphError::InvalidSetting(format!(
                "swizzle mask '{mask}' must select one to four channels"
            )));
        }
        Ok(Self(channels))
    }

    /// Selected channel indices
    pub fn channels(&self) -> &[usize] {
        &self.0
    }
}

impl Default for SwizzleMask {
    fn default() -> Self {
        Self(vec![0, 1, 2, 3])
    }
}

/// An operator instance in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    /// Unique instance ID
    pub id: OperatorId,
    /// Position in the graph UI
    pub position: [f32; 2],
    kind: OperatorKind,
    inputs: Vec<Slot>,
    outputs: Vec<Slot>,
    mask: Option<SwizzleMask>,
}

impl Operator {
    /// Create an operator of `kind` with its default slots
    pub fn new(kind: OperatorKind) -> Self {
        match kind {
            OperatorKind::Inline(value_type) => Self::inline(value_type),
            OperatorKind::Deprecated(legacy) => Self::deprecated(legacy),
            _ => Self::from_descriptor(kind.descriptor()),
        }
    }

    fn from_descriptor(descriptor: &'static OperatorDescriptor) -> Self {
        let leading = descriptor
            .leading
            .iter()
            .map(|input| Slot::input(input.name, input.value_type));
        let operands = descriptor
            .operands
            .iter()
            .take(descriptor.arity.initial())
            .map(|info| Slot::input(info.name, descriptor.default_type).with_literal(info.default));
        let mut operator = Self {
            id: OperatorId::new(),
            position: [0.0, 0.0],
            kind: descriptor.kind,
            inputs: leading.chain(operands).collect(),
            outputs: vec![Slot::output(descriptor.output_name, descriptor.default_type)],
            mask: (descriptor.output == OutputRule::SwizzleMask).then(SwizzleMask::default),
        };
        operator.resolve_output();
        operator
    }

    /// Inline constant of `value_type`; its single input holds the value
    pub fn inline(value_type: ValueType) -> Self {
        Self {
            id: OperatorId::new(),
            position: [0.0, 0.0],
            kind: OperatorKind::Inline(value_type),
            inputs: vec![Slot::input("value", value_type)],
            outputs: vec![Slot::output("value", value_type)],
            mask: None,
        }
    }

    /// Deprecated operator with FloatN operands, as found in legacy graphs
    pub fn deprecated(legacy: LegacyOperator) -> Self {
        let entry = legacy.entry();
        let leading = entry
            .leading
            .iter()
            .map(|input| Slot::input(input.name, input.value_type));
        let operands = entry
            .operands
            .iter()
            .map(|info| Slot::input(info.name, ValueType::FloatN).with_literal(info.default));
        Self {
            id: OperatorId::new(),
            position: [0.0, 0.0],
            kind: OperatorKind::Deprecated(legacy),
            inputs: leading.chain(operands).collect(),
            outputs: vec![Slot::output("o", entry.output)],
            mask: (entry.replacement.descriptor().output == OutputRule::SwizzleMask)
                .then(SwizzleMask::default),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Operator kind
    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Static descriptor
    pub fn descriptor(&self) -> &'static OperatorDescriptor {
        self.kind.descriptor()
    }

    /// Whether this is an inline constant
    pub fn is_inline(&self) -> bool {
        matches!(self.kind, OperatorKind::Inline(_))
    }

    /// Whether this operator awaits sanitization
    pub fn is_deprecated(&self) -> bool {
        matches!(self.kind, OperatorKind::Deprecated(_))
    }

    /// All input slots
    pub fn inputs(&self) -> &[Slot] {
        &self.inputs
    }

    /// All output slots
    pub fn outputs(&self) -> &[Slot] {
        &self.outputs
    }

    /// Get an input slot by index
    pub fn input(&self, index: usize) -> Option<&Slot> {
        self.inputs.get(index)
    }

    /// Get an output slot by index
    pub fn output(&self, index: usize) -> Option<&Slot> {
        self.outputs.get(index)
    }

    /// Get a slot by ID
    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slots().find(|s| s.id == slot_id)
    }

    /// Get all slots
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Index of the first operand among the inputs
    pub fn operand_offset(&self) -> usize {
        match self.kind {
            OperatorKind::Deprecated(legacy) => legacy.entry().leading.len(),
            _ => self.descriptor().leading.len(),
        }
    }

    /// Operand slots
    pub fn operands(&self) -> &[Slot] {
        &self.inputs[self.operand_offset()..]
    }

    /// Number of operands
    pub fn operand_count(&self) -> usize {
        self.operands().len()
    }

    /// Operand index of an input slot
    pub fn operand_index(&self, slot_id: SlotId) -> Option<usize> {
        self.operands().iter().position(|s| s.id == slot_id)
    }

    /// Current swizzle mask, for Swizzle operators
    pub fn swizzle_mask(&self) -> Option<&SwizzleMask> {
        self.mask.as_ref()
    }

    /// Store a literal on the input at `index`
    pub fn set_input_value(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        let len = self.inputs.len();
        let slot = self.inputs.get_mut(index).ok_or(GraphError::IndexOutOfRange {
            index,
            len,
            min: 0,
        })?;
        slot.set_value(value)
    }

    pub(crate) fn input_mut(&mut self, slot_id: SlotId) -> Option<&mut Slot> {
        self.inputs.iter_mut().find(|s| s.id == slot_id)
    }

    /// Type an operand should take to receive a value of type `source`
    pub fn best_operand_type(&self, source: ValueType) -> Option<ValueType> {
        match self.kind {
            OperatorKind::Inline(_) => Some(source),
            OperatorKind::Deprecated(_) => None,
            _ => AffinityTable::global().best_match(source, self.descriptor().accepted),
        }
    }

    fn limit(&self, reason: impl Into<String>) -> GraphError {
        GraphError::OperandLimit {
            kind: self.name(),
            reason: reason.into(),
        }
    }

    fn appended_channels(&self) -> usize {
        self.operands().iter().map(|s| s.value_type().channel_count()).sum()
    }

    /// Append an operand typed like the last one
    pub(crate) fn add_operand(&mut self) -> Result<SlotId> {
        if self.is_deprecated() {
            return Err(GraphError::NotDynamic(self.name()));
        }
        let descriptor = self.descriptor();
        let Arity::Cascaded { max, .. } = descriptor.arity else {
            return Err(self.limit("operand count is fixed"));
        };
        let count = self.operand_count();
        if max.is_some_and(|max| count >= max) {
            return Err(self.limit(format!("at most {count} operands")));
        }
        let value_type = self
            .operands()
            .last()
            .map_or(descriptor.default_type, Slot::value_type);
        if descriptor.output == OutputRule::AppendChannels
            && self.appended_channels() + value_type.channel_count() > 4
        {
            return Err(self.limit("output would exceed four channels"));
        }
        let slot = Slot::input(operand_name(descriptor, count), value_type)
            .with_literal(descriptor.identity);
        let id = slot.id;
        self.inputs.push(slot);
        self.resolve_output();
        Ok(id)
    }

    /// Remove the operand at `index`, returning its slot
    pub(crate) fn remove_operand(&mut self, index: usize) -> Result<Slot> {
        if self.is_deprecated() {
            return Err(GraphError::NotDynamic(self.name()));
        }
        let descriptor = self.descriptor();
        let Arity::Cascaded { min, .. } = descriptor.arity else {
            return Err(self.limit("operand count is fixed"));
        };
        let len = self.operand_count();
        if index >= len || len <= min {
            return Err(GraphError::IndexOutOfRange { index, len, min });
        }
        let slot = self.inputs.remove(self.operand_offset() + index);
        self.resolve_output();
        Ok(slot)
    }

    /// Retype the operand at `index`; uniform operators retype every operand
    pub(crate) fn set_operand_type(&mut self, index: usize, value_type: ValueType) -> Result<()> {
        let descriptor = self.descriptor();
        if !descriptor.is_dynamic() || self.is_deprecated() {
            return Err(GraphError::NotDynamic(self.name()));
        }
        let len = self.operand_count();
        let current = self
            .operands()
            .get(index)
            .map(Slot::value_type)
            .ok_or(GraphError::IndexOutOfRange {
                index,
                len,
                min: descriptor.arity.min(),
            })?;
        let accepted = self.is_inline() || descriptor.accepted.contains(&value_type);
        if !accepted {
            return Err(GraphError::IncompatibleType {
                from: value_type,
                to: current,
            });
        }
        if descriptor.output == OutputRule::AppendChannels {
            let channels = self.appended_channels() - current.channel_count() + value_type.channel_count();
            if channels > 4 {
                return Err(self.limit("output would exceed four channels"));
            }
        }

        let offset = self.operand_offset();
        if descriptor.uniform {
            for slot in &mut self.inputs[offset..] {
                slot.retype(value_type);
            }
        } else {
            self.inputs[offset + index].retype(value_type);
        }
        if self.is_inline() {
            self.kind = OperatorKind::Inline(value_type);
        }
        self.resolve_output();
        Ok(())
    }

    /// Replace the swizzle mask
    pub(crate) fn set_swizzle_mask(&mut self, mask: SwizzleMask) -> Result<()> {
        if self.mask.is_none() {
            return Err(GraphError::InvalidSetting(format!(
                "{} has no swizzle mask",
                self.name()
            )));
        }
        self.mask = Some(mask);
        self.resolve_output();
        Ok(())
    }

    /// Output type implied by the current operands
    pub fn resolved_output_type(&self) -> ValueType {
        if let OperatorKind::Deprecated(legacy) = self.kind {
            return legacy.entry().output;
        }
        let descriptor = self.descriptor();
        let operand_types = self.operands().iter().map(Slot::value_type);
        match descriptor.output {
            OutputRule::Unified => unify_all(operand_types).unwrap_or(descriptor.default_type),
            OutputRule::SameAsOperand => self
                .operands()
                .first()
                .map_or(descriptor.default_type, Slot::value_type),
            OutputRule::Float => ValueType::Float,
            OutputRule::AppendChannels => {
                ValueType::float_with_channels(self.appended_channels()).unwrap_or(ValueType::Vector4)
            }
            OutputRule::SwizzleMask => {
                let channels = self.mask.as_ref().map_or(4, |m| m.channels().len());
                ValueType::float_with_channels(channels).unwrap_or(ValueType::Vector4)
            }
        }
    }

    fn resolve_output(&mut self) {
        let value_type = self.resolved_output_type();
        for output in &mut self.outputs {
            output.retype(value_type);
        }
    }

    /// Build the expression of the output at `output_index`.
    ///
    /// `inputs` holds one expression per input slot, already converted to
    /// the layout of that slot.
    pub fn build_expression(
        &self,
        output_index: usize,
        mut inputs: Vec<Expression>,
    ) -> std::result::Result<Expression, EvaluationError> {
        let unsupported = || EvaluationError::Unsupported(self.name());
        let output = self.outputs.get(output_index).ok_or_else(unsupported)?;
        if self.is_deprecated() {
            return Err(unsupported());
        }
        let descriptor = self.descriptor();
        let operands = inputs.split_off(self.operand_offset().min(inputs.len()));
        let layout = output.value_type().layout();

        if let Some(op) = self.kind.binary_op() {
            let mut converted = operands
                .into_iter()
                .map(|e| e.convert(layout, descriptor.identity));
            let first = converted.next().ok_or_else(unsupported)?;
            return Ok(converted.fold(first, |acc, e| Expression::binary(op, acc, e)));
        }
        if let Some(op) = self.kind.unary_op() {
            let [x] = take(operands).ok_or_else(unsupported)?;
            return Ok(Expression::unary(op, x));
        }
        if let Some(op) = self.kind.wave_op() {
            let [x, frequency] = take(convert_all(operands, layout)).ok_or_else(unsupported)?;
            return Ok(Expression::unary(op, Expression::binary(BinaryOp::Multiply, x, frequency)));
        }

        let expression = match self.kind {
            OperatorKind::Clamp => {
                let [value, min, max] = take(convert_all(operands, layout)).ok_or_else(unsupported)?;
                Expression::Clamp {
                    value: Arc::new(value),
                    min: Arc::new(min),
                    max: Arc::new(max),
                }
            }
            OperatorKind::Lerp => {
                let [x, y, s] = take(convert_all(operands, layout)).ok_or_else(unsupported)?;
                Expression::Lerp {
                    x: Arc::new(x),
                    y: Arc::new(y),
                    s: Arc::new(s),
                }
            }
            OperatorKind::Discretize => {
                let [a, b] = take(convert_all(operands, layout)).ok_or_else(unsupported)?;
                let b = Arc::new(b);
                let steps = Expression::unary(UnaryOp::Floor, binary(BinaryOp::Divide, Arc::new(a), b.clone()));
                binary(BinaryOp::Multiply, Arc::new(steps), b)
            }
            OperatorKind::Remap | OperatorKind::RemapClamped => {
                let [x, old_min, old_max, new_min, new_max] =
                    take(convert_all(operands, layout)).ok_or_else(unsupported)?;
                let (old_min, new_min) = (Arc::new(old_min), Arc::new(new_min));
                let offset = binary(BinaryOp::Subtract, Arc::new(x), old_min.clone());
                let range = binary(BinaryOp::Subtract, Arc::new(old_max), old_min);
                let mut t = binary(BinaryOp::Divide, Arc::new(offset), Arc::new(range));
                if self.kind == OperatorKind::RemapClamped {
                    t = Expression::unary(UnaryOp::Saturate, t);
                }
                let span = binary(BinaryOp::Subtract, Arc::new(new_max), new_min.clone());
                let scaled = binary(BinaryOp::Multiply, Arc::new(span), Arc::new(t));
                binary(BinaryOp::Add, new_min, Arc::new(scaled))
            }
            OperatorKind::Smoothstep => {
                let [x, y, s] = take(convert_all(operands, layout)).ok_or_else(unsupported)?;
                let x = Arc::new(x);
                let offset = binary(BinaryOp::Subtract, Arc::new(s), x.clone());
                let range = binary(BinaryOp::Subtract, Arc::new(y), x);
                let t = Arc::new(Expression::unary(
                    UnaryOp::Saturate,
                    binary(BinaryOp::Divide, Arc::new(offset), Arc::new(range)),
                ));
                let constant = |c: f32| Arc::new(Expression::literal(c).convert(layout, 0.0));
                let twice = binary(BinaryOp::Multiply, constant(2.0), t.clone());
                let slope = binary(BinaryOp::Subtract, constant(3.0), Arc::new(twice));
                let square = binary(BinaryOp::Multiply, t.clone(), t);
                binary(BinaryOp::Multiply, Arc::new(square), Arc::new(slope))
            }
            OperatorKind::SquaredDistance => {
                let [a, b] = take(operands).ok_or_else(unsupported)?;
                let delta = Arc::new(Expression::binary(BinaryOp::Subtract, a, b));
                Expression::Dot(delta.clone(), delta)
            }
            OperatorKind::SquaredLength => {
                let [x] = take(operands).ok_or_else(unsupported)?;
                let x = Arc::new(x);
                Expression::Dot(x.clone(), x)
            }
            OperatorKind::Normalize => {
                let [x] = take(operands).ok_or_else(unsupported)?;
                x.normalize()
            }
            OperatorKind::Length => {
                let [x] = take(operands).ok_or_else(unsupported)?;
                Expression::Length(Arc::new(x))
            }
            OperatorKind::DotProduct => {
                let [a, b] = take(operands).ok_or_else(unsupported)?;
                Expression::Dot(Arc::new(a), Arc::new(b))
            }
            OperatorKind::Distance => {
                let [a, b] = take(operands).ok_or_else(unsupported)?;
                Expression::Distance(Arc::new(a), Arc::new(b))
            }
            OperatorKind::Branch => {
                let [predicate] = take(inputs).ok_or_else(unsupported)?;
                let [if_true, if_false] = take(operands).ok_or_else(unsupported)?;
                Expression::Branch {
                    predicate: Arc::new(predicate),
                    if_true: Arc::new(if_true),
                    if_false: Arc::new(if_false),
                }
            }
            OperatorKind::AppendVector => Expression::Append(operands),
            OperatorKind::Swizzle => {
                let [vector] = take(operands).ok_or_else(unsupported)?;
                Expression::Swizzle {
                    operand: Arc::new(vector),
                    mask: self.mask.clone().unwrap_or_default().0,
                }
            }
            OperatorKind::Inline(_) => {
                let [value] = take(operands).ok_or_else(unsupported)?;
                value
            }
            _ => return Err(unsupported()),
        };
        Ok(expression)
    }
}

fn operand_name(descriptor: &OperatorDescriptor, index: usize) -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    match descriptor.operands.get(index) {
        Some(info) => info.name.to_string(),
        None => LETTERS
            .get(index)
            .map_or_else(|| format!("a{index}"), |c| char::from(*c).to_string()),
    }
}

fn binary(op: BinaryOp, lhs: Arc<Expression>, rhs: Arc<Expression>) -> Expression {
    Expression::Binary { op, lhs, rhs }
}

fn convert_all(expressions: Vec<Expression>, layout: ValueLayout) -> Vec<Expression> {
    expressions.into_iter().map(|e| e.convert(layout, 0.0)).collect()
}

fn take<const N: usize>(expressions: Vec<Expression>) -> Option<[Expression; N]> {
    expressions.try_into().ok()
}
