// SPDX-License-Identifier: MIT OR Apache-2.0
//! Expression trees produced by operator slots.
//!
//! Every slot resolves to an [`Expression`]: a literal, or an operator
//! function applied to the expressions of its inputs. Child nodes are held in
//! an [`Arc`], so an output feeding several inputs is shared rather than
//! copied, and the expressions of a graph form a DAG with one node per slot.
//! They are reduced to a [`Value`] by [`compile`](crate::evaluation::compile).

use crate::value::{Value, ValueLayout};
use std::collections::HashSet;
use std::sync::Arc;

/// Component-wise unary functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `|x|`
    Absolute,
    /// `sin(x)`
    Sine,
    /// `cos(x)`
    Cosine,
    /// `floor(x)`
    Floor,
    /// `x - floor(x)`
    Fraction,
    /// `1 - x`
    OneMinus,
    /// `1 / x`
    Reciprocal,
    /// `sqrt(x)`
    SquareRoot,
    /// `clamp(x, 0, 1)`
    Saturate,
    /// `ceil(x)`
    Ceiling,
    /// Round half away from zero
    Round,
    /// `-1`, `0` or `1`
    Sign,
    /// `tan(x)`
    Tangent,
    /// `x * 0.5 + 0.5`
    RemapToZeroOne,
    /// `x * 2 - 1`
    RemapToNegOnePosOne,
    /// `fract(x)`
    SawtoothWave,
    /// `sin(2 pi x) * 0.5 + 0.5`
    SineWave,
    /// `0` on the first half of each period, `1` on the second
    SquareWave,
    /// `1 - |2 fract(x) - 1|`
    TriangleWave,
}

/// Component-wise binary functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
    /// `min(a, b)`
    Minimum,
    /// `max(a, b)`
    Maximum,
    /// Integer remainder, or `a - floor(a / b) * b` for floats
    Modulo,
    /// `pow(a, b)`
    Power,
    /// `a >= b ? 1 : 0`
    Step,
}

/// A composable expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant value
    Literal(Value),
    /// Shape conversion; vectors widened with `pad`
    Convert {
        /// Converted expression
        operand: Arc<Expression>,
        /// Target layout
        layout: ValueLayout,
        /// Value for channels the operand does not have
        pad: f32,
    },
    /// Vector normalization, zero vectors stay zero
    Normalize(Arc<Expression>),
    /// Unary function
    Unary {
        /// Function
        op: UnaryOp,
        /// Argument
        operand: Arc<Expression>,
    },
    /// Binary function over two operands of the same layout
    Binary {
        /// Function
        op: BinaryOp,
        /// Left operand
        lhs: Arc<Expression>,
        /// Right operand
        rhs: Arc<Expression>,
    },
    /// `min(max(value, min), max)`
    Clamp {
        /// Clamped value
        value: Arc<Expression>,
        /// Lower bound
        min: Arc<Expression>,
        /// Upper bound
        max: Arc<Expression>,
    },
    /// `x + (y - x) * s`
    Lerp {
        /// Start
        x: Arc<Expression>,
        /// End
        y: Arc<Expression>,
        /// Blend factor
        s: Arc<Expression>,
    },
    /// Euclidean length
    Length(Arc<Expression>),
    /// Dot product
    Dot(Arc<Expression>, Arc<Expression>),
    /// Euclidean distance
    Distance(Arc<Expression>, Arc<Expression>),
    /// Select between two expressions of the same layout
    Branch {
        /// Boolean predicate
        predicate: Arc<Expression>,
        /// Chosen when the predicate is true
        if_true: Arc<Expression>,
        /// Chosen when the predicate is false
        if_false: Arc<Expression>,
    },
    /// Concatenate the channels of float expressions
    Append(Vec<Expression>),
    /// Reorder channels; indices past the last channel read the last channel
    Swizzle {
        /// Source vector
        operand: Arc<Expression>,
        /// Channel indices
        mask: Vec<usize>,
    },
}

impl Expression {
    /// Literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Wrap in a conversion to `layout`, unless the layout already matches
    pub fn convert(self, layout: ValueLayout, pad: f32) -> Self {
        if self.layout() == layout && !matches!(self, Self::Literal(Value::FloatN(_))) {
            return self;
        }
        Self::Convert {
            operand: Arc::new(self),
            layout,
            pad,
        }
    }

    /// Wrap in a normalization
    pub fn normalize(self) -> Self {
        Self::Normalize(Arc::new(self))
    }

    /// Unary function of this expression
    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Self::Unary {
            op,
            operand: Arc::new(operand),
        }
    }

    /// Binary function of two expressions
    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Self::Binary {
            op,
            lhs: Arc::new(lhs),
            rhs: Arc::new(rhs),
        }
    }

    /// Layout of the value this expression compiles to
    pub fn layout(&self) -> ValueLayout {
        match self {
            Self::Literal(value) => value.layout(),
            Self::Convert { layout, .. } => *layout,
            Self::Normalize(operand) | Self::Unary { operand, .. } => operand.layout(),
            Self::Binary { lhs, .. } => lhs.layout(),
            Self::Clamp { value, .. } => value.layout(),
            Self::Lerp { x, .. } => x.layout(),
            Self::Length(_) | Self::Dot(..) | Self::Distance(..) => ValueLayout::Float,
            Self::Branch { if_true, .. } => if_true.layout(),
            Self::Append(parts) => {
                let channels = parts.iter().map(|p| p.layout().channel_count()).sum();
                ValueLayout::float_with_channels(channels).unwrap_or(ValueLayout::Float4)
            }
            Self::Swizzle { mask, .. } => {
                ValueLayout::float_with_channels(mask.len()).unwrap_or(ValueLayout::Float4)
            }
        }
    }

    /// Number of distinct nodes; shared subexpressions count once
    pub fn node_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if seen.insert(node as *const Expression) {
                stack.extend(node.children());
            }
        }
        seen.len()
    }

    /// Direct children of this node
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Convert { operand, .. }
            | Self::Normalize(operand)
            | Self::Unary { operand, .. }
            | Self::Length(operand)
            | Self::Swizzle { operand, .. } => vec![operand.as_ref()],
            Self::Binary { lhs, rhs, .. } | Self::Dot(lhs, rhs) | Self::Distance(lhs, rhs) => {
                vec![lhs.as_ref(), rhs.as_ref()]
            }
            Self::Clamp { value, min, max } => vec![value.as_ref(), min.as_ref(), max.as_ref()],
            Self::Lerp { x, y, s } => vec![x.as_ref(), y.as_ref(), s.as_ref()],
            Self::Branch {
                predicate,
                if_true,
                if_false,
            } => vec![predicate.as_ref(), if_true.as_ref(), if_false.as_ref()],
            Self::Append(parts) => parts.iter().collect(),
        }
    }
}
