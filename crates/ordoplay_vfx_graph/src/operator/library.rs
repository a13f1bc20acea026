// SPDX-License-Identifier: MIT OR Apache-2.0
//! Static descriptors for every canonical operator.
//!
//! A descriptor fixes the slot layout of an operator kind: its leading
//! inputs, its dynamically typed operands, the types they may take and how
//! the output type follows from them.

use super::{Operator, OperatorKind};
use crate::affinity::TYPE_PRECEDENCE;
use crate::sanitize::LegacyOperator;
use crate::value::ValueType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use OperatorCategory as C;
use OperatorKind as K;

/// Operator category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorCategory {
    /// Cascaded arithmetic
    Arithmetic,
    /// Component-wise math functions
    Math,
    /// Trigonometry
    Trigonometry,
    /// Periodic waves
    Wave,
    /// Vector construction and reduction
    Vector,
    /// Flow control
    Logic,
    /// Inline constants
    Inline,
    /// Deprecated operators awaiting sanitization
    Legacy,
}

/// How many operands an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many operands
    Fixed(usize),
    /// Variadic operands folded left to right
    Cascaded {
        /// Minimum operand count
        min: usize,
        /// Operand count of a fresh operator
        initial: usize,
        /// Maximum operand count, if any
        max: Option<usize>,
    },
}

impl Arity {
    /// Number of operands a fresh operator starts with
    pub fn initial(self) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Cascaded { initial, .. } => initial,
        }
    }

    /// Smallest allowed operand count
    pub fn min(self) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Cascaded { min, .. } => min,
        }
    }
}

/// Rule deriving the output type from the operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRule {
    /// Greatest operand type in [`TYPE_PRECEDENCE`]
    Unified,
    /// Type of the (shared) operand type
    SameAsOperand,
    /// Always `Float`
    Float,
    /// Float vector with the sum of the operand channels
    AppendChannels,
    /// Float vector with as many channels as the swizzle mask
    SwizzleMask,
}

/// Non-dynamic input preceding the operands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedInput {
    /// Slot name
    pub name: &'static str,
    /// Slot type
    pub value_type: ValueType,
}

/// Name and starting literal of an operand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperandInfo {
    /// Slot name
    pub name: &'static str,
    /// Starting literal, converted to the operand type
    pub default: f32,
}

/// Static description of an operator kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorDescriptor {
    /// Kind described
    pub kind: OperatorKind,
    /// Display name
    pub name: &'static str,
    /// Category
    pub category: OperatorCategory,
    /// Description
    pub description: &'static str,
    /// Inputs preceding the operands
    pub leading: &'static [FixedInput],
    /// Named operands; a fresh operator gets the first `arity.initial()`
    pub operands: &'static [OperandInfo],
    /// Operand count rule
    pub arity: Arity,
    /// Types an operand may take; empty when operands are not dynamic
    pub accepted: &'static [ValueType],
    /// Type of fresh operands
    pub default_type: ValueType,
    /// Setting one operand type sets all of them
    pub uniform: bool,
    /// Neutral value: literal of added operands and pad for widened operands
    pub identity: f32,
    /// Output type rule
    pub output: OutputRule,
    /// Output slot name
    pub output_name: &'static str,
}

impl OperatorDescriptor {
    /// Whether operand types may be changed
    pub fn is_dynamic(&self) -> bool {
        !self.accepted.is_empty()
    }
}

/// Every numeric type, in unification order
pub const NUMERIC_TYPES: &[ValueType] = &TYPE_PRECEDENCE;

/// Float scalar and plain float vectors
pub const FLOAT_TYPES: &[ValueType] = &[
    ValueType::Float,
    ValueType::Vector2,
    ValueType::Vector3,
    ValueType::Vector4,
];

const APPENDABLE_TYPES: &[ValueType] = FLOAT_TYPES;

const A_B: &[OperandInfo] = &[
    OperandInfo { name: "a", default: 0.0 },
    OperandInfo { name: "b", default: 0.0 },
];

const A_B_ONE: &[OperandInfo] = &[
    OperandInfo { name: "a", default: 1.0 },
    OperandInfo { name: "b", default: 1.0 },
];

const X: &[OperandInfo] = &[OperandInfo { name: "x", default: 0.0 }];

const REMAP_OPERANDS: &[OperandInfo] = &[
    OperandInfo { name: "input", default: 0.5 },
    OperandInfo { name: "oldRangeMin", default: 0.0 },
    OperandInfo { name: "oldRangeMax", default: 1.0 },
    OperandInfo { name: "newRangeMin", default: 0.0 },
    OperandInfo { name: "newRangeMax", default: 1.0 },
];

const WAVE: &[OperandInfo] = &[
    OperandInfo { name: "input", default: 0.0 },
    OperandInfo { name: "frequency", default: 1.0 },
];

const fn cascaded(
    kind: OperatorKind,
    name: &'static str,
    description: &'static str,
    operands: &'static [OperandInfo],
    identity: f32,
) -> OperatorDescriptor {
    OperatorDescriptor {
        kind,
        name,
        category: OperatorCategory::Arithmetic,
        description,
        leading: &[],
        operands,
        arity: Arity::Cascaded { min: 2, initial: 2, max: None },
        accepted: NUMERIC_TYPES,
        default_type: ValueType::Float,
        uniform: false,
        identity,
        output: OutputRule::Unified,
        output_name: "o",
    }
}

const fn unary(
    kind: OperatorKind,
    name: &'static str,
    category: OperatorCategory,
    description: &'static str,
    operands: &'static [OperandInfo],
    accepted: &'static [ValueType],
) -> OperatorDescriptor {
    OperatorDescriptor {
        kind,
        name,
        category,
        description,
        leading: &[],
        operands,
        arity: Arity::Fixed(1),
        accepted,
        default_type: ValueType::Float,
        uniform: true,
        identity: 0.0,
        output: OutputRule::SameAsOperand,
        output_name: "o",
    }
}

const fn fixed_unified(
    kind: OperatorKind,
    name: &'static str,
    category: OperatorCategory,
    description: &'static str,
    operands: &'static [OperandInfo],
    accepted: &'static [ValueType],
) -> OperatorDescriptor {
    OperatorDescriptor {
        kind,
        name,
        category,
        description,
        leading: &[],
        operands,
        arity: Arity::Fixed(operands.len()),
        accepted,
        default_type: ValueType::Float,
        uniform: false,
        identity: 0.0,
        output: OutputRule::Unified,
        output_name: "o",
    }
}

const fn reducer(
    kind: OperatorKind,
    name: &'static str,
    description: &'static str,
    operands: &'static [OperandInfo],
) -> OperatorDescriptor {
    OperatorDescriptor {
        kind,
        name,
        category: OperatorCategory::Vector,
        description,
        leading: &[],
        operands,
        arity: Arity::Fixed(operands.len()),
        accepted: FLOAT_TYPES,
        default_type: ValueType::Vector3,
        uniform: true,
        identity: 0.0,
        output: OutputRule::Float,
        output_name: "o",
    }
}

static ADD: OperatorDescriptor = cascaded(K::Add, "Add", "Sum of all operands", A_B, 0.0);
static SUBTRACT: OperatorDescriptor =
    cascaded(K::Subtract, "Subtract", "First operand minus the others", A_B, 0.0);
static MULTIPLY: OperatorDescriptor =
    cascaded(K::Multiply, "Multiply", "Product of all operands", A_B_ONE, 1.0);
static DIVIDE: OperatorDescriptor =
    cascaded(K::Divide, "Divide", "First operand divided by the others", A_B_ONE, 1.0);
static MINIMUM: OperatorDescriptor =
    cascaded(K::Minimum, "Minimum", "Component-wise minimum", A_B, f32::MAX);
static MAXIMUM: OperatorDescriptor =
    cascaded(K::Maximum, "Maximum", "Component-wise maximum", A_B, f32::MIN);

static APPEND_VECTOR: OperatorDescriptor = OperatorDescriptor {
    kind: K::AppendVector,
    name: "Append Vector",
    category: C::Vector,
    description: "Concatenate operands into a wider vector",
    leading: &[],
    operands: &[
        OperandInfo { name: "x", default: 0.0 },
        OperandInfo { name: "y", default: 0.0 },
        OperandInfo { name: "z", default: 0.0 },
        OperandInfo { name: "w", default: 0.0 },
    ],
    arity: Arity::Cascaded { min: 1, initial: 2, max: Some(4) },
    accepted: APPENDABLE_TYPES,
    default_type: ValueType::Float,
    uniform: false,
    identity: 0.0,
    output: OutputRule::AppendChannels,
    output_name: "o",
};

static MODULO: OperatorDescriptor = fixed_unified(
    K::Modulo,
    "Modulo",
    C::Math,
    "Remainder of a divided by b",
    &[
        OperandInfo { name: "a", default: 0.0 },
        OperandInfo { name: "b", default: 1.0 },
    ],
    NUMERIC_TYPES,
);
static POWER: OperatorDescriptor = fixed_unified(
    K::Power,
    "Power",
    C::Math,
    "a raised to b",
    &[
        OperandInfo { name: "a", default: 0.0 },
        OperandInfo { name: "b", default: 1.0 },
    ],
    NUMERIC_TYPES,
);
static CLAMP: OperatorDescriptor = fixed_unified(
    K::Clamp,
    "Clamp",
    C::Math,
    "Restrict input to [min, max]",
    &[
        OperandInfo { name: "input", default: 0.0 },
        OperandInfo { name: "min", default: 0.0 },
        OperandInfo { name: "max", default: 1.0 },
    ],
    NUMERIC_TYPES,
);
static LERP: OperatorDescriptor = fixed_unified(
    K::Lerp,
    "Lerp",
    C::Math,
    "Linear interpolation between x and y",
    &[
        OperandInfo { name: "x", default: 0.0 },
        OperandInfo { name: "y", default: 1.0 },
        OperandInfo { name: "s", default: 0.5 },
    ],
    FLOAT_TYPES,
);
static STEP: OperatorDescriptor = fixed_unified(
    K::Step,
    "Step",
    C::Math,
    "1 where value >= threshold, else 0",
    &[
        OperandInfo { name: "value", default: 0.0 },
        OperandInfo { name: "threshold", default: 0.5 },
    ],
    FLOAT_TYPES,
);

static DISCRETIZE: OperatorDescriptor = fixed_unified(
    K::Discretize,
    "Discretize",
    C::Math,
    "Snap a down to a multiple of b",
    &[
        OperandInfo { name: "a", default: 0.0 },
        OperandInfo { name: "b", default: 1.0 },
    ],
    FLOAT_TYPES,
);
static REMAP: OperatorDescriptor = fixed_unified(
    K::Remap,
    "Remap",
    C::Math,
    "Map input from the old range onto the new range",
    REMAP_OPERANDS,
    FLOAT_TYPES,
);
static REMAP_CLAMPED: OperatorDescriptor = fixed_unified(
    K::RemapClamped,
    "Remap (Clamped)",
    C::Math,
    "Remap with the input clamped to the old range",
    REMAP_OPERANDS,
    FLOAT_TYPES,
);
static SMOOTHSTEP: OperatorDescriptor = fixed_unified(
    K::Smoothstep,
    "Smoothstep",
    C::Math,
    "Hermite interpolation of s between x and y",
    &[
        OperandInfo { name: "x", default: 0.0 },
        OperandInfo { name: "y", default: 1.0 },
        OperandInfo { name: "s", default: 0.5 },
    ],
    FLOAT_TYPES,
);
static SAWTOOTH_WAVE: OperatorDescriptor = fixed_unified(
    K::SawtoothWave,
    "Sawtooth Wave",
    C::Wave,
    "Rising ramp repeating at the frequency",
    WAVE,
    FLOAT_TYPES,
);
static SINE_WAVE: OperatorDescriptor = fixed_unified(
    K::SineWave,
    "Sine Wave",
    C::Wave,
    "Sine in [0, 1] repeating at the frequency",
    WAVE,
    FLOAT_TYPES,
);
static SQUARE_WAVE: OperatorDescriptor = fixed_unified(
    K::SquareWave,
    "Square Wave",
    C::Wave,
    "0 then 1 over each period",
    WAVE,
    FLOAT_TYPES,
);
static TRIANGLE_WAVE: OperatorDescriptor = fixed_unified(
    K::TriangleWave,
    "Triangle Wave",
    C::Wave,
    "Rising then falling ramp over each period",
    WAVE,
    FLOAT_TYPES,
);

static ABSOLUTE: OperatorDescriptor =
    unary(K::Absolute, "Absolute", C::Math, "Absolute value", X, NUMERIC_TYPES);
static SINE: OperatorDescriptor = unary(K::Sine, "Sine", C::Trigonometry, "Sine", X, FLOAT_TYPES);
static COSINE: OperatorDescriptor =
    unary(K::Cosine, "Cosine", C::Trigonometry, "Cosine", X, FLOAT_TYPES);
static FLOOR: OperatorDescriptor = unary(K::Floor, "Floor", C::Math, "Round down", X, FLOAT_TYPES);
static FRACTION: OperatorDescriptor =
    unary(K::Fraction, "Fraction", C::Math, "Fractional part", X, FLOAT_TYPES);
static ONE_MINUS: OperatorDescriptor =
    unary(K::OneMinus, "One Minus", C::Math, "1 - x", X, FLOAT_TYPES);
static RECIPROCAL: OperatorDescriptor = unary(
    K::Reciprocal,
    "Reciprocal",
    C::Math,
    "1 / x",
    &[OperandInfo { name: "x", default: 1.0 }],
    FLOAT_TYPES,
);
static SQUARE_ROOT: OperatorDescriptor =
    unary(K::SquareRoot, "Square Root", C::Math, "Square root", X, FLOAT_TYPES);
static SATURATE: OperatorDescriptor =
    unary(K::Saturate, "Saturate", C::Math, "Clamp to [0, 1]", X, FLOAT_TYPES);
static CEILING: OperatorDescriptor = unary(K::Ceiling, "Ceiling", C::Math, "Round up", X, FLOAT_TYPES);
static ROUND: OperatorDescriptor =
    unary(K::Round, "Round", C::Math, "Round to the nearest integer", X, FLOAT_TYPES);
static SIGN: OperatorDescriptor = unary(K::Sign, "Sign", C::Math, "-1, 0 or 1", X, FLOAT_TYPES);
static TANGENT: OperatorDescriptor =
    unary(K::Tangent, "Tangent", C::Trigonometry, "Tangent", X, FLOAT_TYPES);
static REMAP_TO_ZERO_ONE: OperatorDescriptor = unary(
    K::RemapToZeroOne,
    "Remap [0..1]",
    C::Math,
    "Map [-1, 1] onto [0, 1]",
    X,
    FLOAT_TYPES,
);
static REMAP_TO_NEG_ONE_POS_ONE: OperatorDescriptor = unary(
    K::RemapToNegOnePosOne,
    "Remap [-1..1]",
    C::Math,
    "Map [0, 1] onto [-1, 1]",
    X,
    FLOAT_TYPES,
);
static NORMALIZE: OperatorDescriptor =
    unary(K::Normalize, "Normalize", C::Vector, "Unit length vector", X, FLOAT_TYPES);

static LENGTH: OperatorDescriptor = reducer(K::Length, "Length", "Euclidean length", X);
static DOT_PRODUCT: OperatorDescriptor = reducer(K::DotProduct, "Dot Product", "Dot product", A_B);
static DISTANCE: OperatorDescriptor =
    reducer(K::Distance, "Distance", "Distance between a and b", A_B);
static SQUARED_DISTANCE: OperatorDescriptor = reducer(
    K::SquaredDistance,
    "Squared Distance",
    "Squared distance between a and b",
    A_B,
);
static SQUARED_LENGTH: OperatorDescriptor =
    reducer(K::SquaredLength, "Squared Length", "Squared euclidean length", X);

static BRANCH: OperatorDescriptor = OperatorDescriptor {
    kind: K::Branch,
    name: "Branch",
    category: C::Logic,
    description: "Select True or False from a predicate",
    leading: &[FixedInput { name: "predicate", value_type: ValueType::Bool }],
    operands: &[
        OperandInfo { name: "True", default: 0.0 },
        OperandInfo { name: "False", default: 0.0 },
    ],
    arity: Arity::Fixed(2),
    accepted: &ValueType::UNIVERSE,
    default_type: ValueType::Float,
    uniform: true,
    identity: 0.0,
    output: OutputRule::SameAsOperand,
    output_name: "o",
};

static SWIZZLE: OperatorDescriptor = OperatorDescriptor {
    kind: K::Swizzle,
    name: "Swizzle",
    category: C::Vector,
    description: "Reorder vector channels",
    leading: &[],
    operands: &[OperandInfo { name: "vector", default: 0.0 }],
    arity: Arity::Fixed(1),
    accepted: FLOAT_TYPES,
    default_type: ValueType::Vector4,
    uniform: true,
    identity: 0.0,
    output: OutputRule::SwizzleMask,
    output_name: "o",
};

static INLINE: OperatorDescriptor = OperatorDescriptor {
    kind: K::Inline(ValueType::Float),
    name: "Inline",
    category: C::Inline,
    description: "Constant value",
    leading: &[],
    operands: &[OperandInfo { name: "value", default: 0.0 }],
    arity: Arity::Fixed(1),
    accepted: &ValueType::UNIVERSE,
    default_type: ValueType::Float,
    uniform: true,
    identity: 0.0,
    output: OutputRule::SameAsOperand,
    output_name: "value",
};

static LEGACY: OperatorDescriptor = OperatorDescriptor {
    kind: K::Deprecated(LegacyOperator::Add),
    name: "Legacy",
    category: C::Legacy,
    description: "Deprecated operator with polymorphic float operands",
    leading: &[],
    operands: &[],
    arity: Arity::Fixed(0),
    accepted: &[],
    default_type: ValueType::FloatN,
    uniform: false,
    identity: 0.0,
    output: OutputRule::SameAsOperand,
    output_name: "o",
};

/// Every canonical operator, in library order
static LIBRARY: [&OperatorDescriptor; 43] = [
    &ADD,
    &SUBTRACT,
    &MULTIPLY,
    &DIVIDE,
    &MINIMUM,
    &MAXIMUM,
    &APPEND_VECTOR,
    &MODULO,
    &POWER,
    &CLAMP,
    &LERP,
    &STEP,
    &DISCRETIZE,
    &REMAP,
    &REMAP_CLAMPED,
    &SMOOTHSTEP,
    &SAWTOOTH_WAVE,
    &SINE_WAVE,
    &SQUARE_WAVE,
    &TRIANGLE_WAVE,
    &ABSOLUTE,
    &SINE,
    &COSINE,
    &FLOOR,
    &FRACTION,
    &ONE_MINUS,
    &RECIPROCAL,
    &SQUARE_ROOT,
    &SATURATE,
    &CEILING,
    &ROUND,
    &SIGN,
    &TANGENT,
    &REMAP_TO_ZERO_ONE,
    &REMAP_TO_NEG_ONE_POS_ONE,
    &NORMALIZE,
    &LENGTH,
    &DOT_PRODUCT,
    &DISTANCE,
    &SQUARED_DISTANCE,
    &SQUARED_LENGTH,
    &BRANCH,
    &SWIZZLE,
];

/// Descriptor of an operator kind.
///
/// Inline operators share one descriptor whatever their type; deprecated
/// operators share a descriptor without dynamic operands.
pub fn descriptor(kind: OperatorKind) -> &'static OperatorDescriptor {
    match kind {
        K::Add => &ADD,
        K::Subtract => &SUBTRACT,
        K::Multiply => &MULTIPLY,
        K::Divide => &DIVIDE,
        K::Minimum => &MINIMUM,
        K::Maximum => &MAXIMUM,
        K::AppendVector => &APPEND_VECTOR,
        K::Modulo => &MODULO,
        K::Power => &POWER,
        K::Clamp => &CLAMP,
        K::Lerp => &LERP,
        K::Step => &STEP,
        K::Discretize => &DISCRETIZE,
        K::Remap => &REMAP,
        K::RemapClamped => &REMAP_CLAMPED,
        K::Smoothstep => &SMOOTHSTEP,
        K::SawtoothWave => &SAWTOOTH_WAVE,
        K::SineWave => &SINE_WAVE,
        K::SquareWave => &SQUARE_WAVE,
        K::TriangleWave => &TRIANGLE_WAVE,
        K::Absolute => &ABSOLUTE,
        K::Sine => &SINE,
        K::Cosine => &COSINE,
        K::Floor => &FLOOR,
        K::Fraction => &FRACTION,
        K::OneMinus => &ONE_MINUS,
        K::Reciprocal => &RECIPROCAL,
        K::SquareRoot => &SQUARE_ROOT,
        K::Saturate => &SATURATE,
        K::Ceiling => &CEILING,
        K::Round => &ROUND,
        K::Sign => &SIGN,
        K::Tangent => &TANGENT,
        K::RemapToZeroOne => &REMAP_TO_ZERO_ONE,
        K::RemapToNegOnePosOne => &REMAP_TO_NEG_ONE_POS_ONE,
        K::Normalize => &NORMALIZE,
        K::Length => &LENGTH,
        K::DotProduct => &DOT_PRODUCT,
        K::Distance => &DISTANCE,
        K::SquaredDistance => &SQUARED_DISTANCE,
        K::SquaredLength => &SQUARED_LENGTH,
        K::Branch => &BRANCH,
        K::Swizzle => &SWIZZLE,
        K::Inline(_) => &INLINE,
        K::Deprecated(_) => &LEGACY,
    }
}

/// Registry of canonical operators by name
pub struct OperatorLibrary {
    descriptors: IndexMap<&'static str, &'static OperatorDescriptor>,
}

impl OperatorLibrary {
    /// Registry holding every canonical operator
    pub fn new() -> Self {
        Self {
            descriptors: LIBRARY.iter().map(|d| (d.name, *d)).collect(),
        }
    }

    /// Look up a descriptor by display name
    pub fn get(&self, name: &str) -> Option<&'static OperatorDescriptor> {
        self.descriptors.get(name).copied()
    }

    /// All descriptors
    pub fn descriptors(&self) -> impl Iterator<Item = &'static OperatorDescriptor> + '_ {
        self.descriptors.values().copied()
    }

    /// Descriptors in a category
    pub fn in_category(
        &self,
        category: OperatorCategory,
    ) -> impl Iterator<Item = &'static OperatorDescriptor> + '_ {
        self.descriptors().filter(move |d| d.category == category)
    }

    /// Instantiate an operator by display name
    pub fn create(&self, name: &str) -> Option<Operator> {
        self.get(name).map(|d| Operator::new(d.kind))
    }
}

impl Default for OperatorLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entry_matches_its_kind() {
        for entry in LIBRARY {
            assert!(std::ptr::eq(descriptor(entry.kind), entry), "{}", entry.name);
            assert!(entry.operands.len() >= entry.arity.initial(), "{}", entry.name);
            assert!(entry.arity.initial() >= entry.arity.min(), "{}", entry.name);
            if entry.is_dynamic() {
                assert!(entry.accepted.contains(&entry.default_type), "{}", entry.name);
            }
        }
    }

    #[test]
    fn test_library_create_by_name() {
        let library = OperatorLibrary::new();
        assert_eq!(library.descriptors().count(), LIBRARY.len());
        let op = library.create("Multiply").unwrap();
        assert_eq!(op.kind(), OperatorKind::Multiply);
        assert!(library.create("FloatN Add").is_none());
        assert_eq!(library.in_category(OperatorCategory::Trigonometry).count(), 3);
        assert_eq!(library.in_category(OperatorCategory::Wave).count(), 4);
        let remap = library.create("Remap (Clamped)").unwrap();
        assert_eq!(remap.operand_count(), 5);
    }
}
