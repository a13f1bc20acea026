// SPDX-License-Identifier: MIT OR Apache-2.0
//! Table of deprecated operators and their canonical replacements.
//!
//! Deprecated operators declare their operands as [`ValueType::FloatN`]. The
//! table is static data: which canonical kind replaces each legacy kind, and
//! the slots the legacy operator was saved with.

use crate::operator::library::{FixedInput, OperandInfo};
use crate::operator::OperatorKind;
use crate::value::ValueType;
use serde::{Deserialize, Serialize};

use LegacyOperator as L;
use OperatorKind as K;
use ValueType::{Float, FloatN};

/// Deprecated operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegacyOperator {
    /// `|x|` over FloatN
    Absolute,
    /// Two-operand add over FloatN
    Add,
    /// Append vector over FloatN
    AppendVector,
    /// Branch over FloatN
    Branch,
    /// Ceiling over FloatN
    Ceiling,
    /// Clamp over FloatN
    Clamp,
    /// Channel mask, migrated to a swizzle
    ComponentMask,
    /// Cosine over FloatN
    Cosine,
    /// Discretize over FloatN
    Discretize,
    /// Distance over FloatN
    Distance,
    /// Two-operand divide over FloatN
    Divide,
    /// Dot product over FloatN
    DotProduct,
    /// Clamped range fit over FloatN
    FitClamped,
    /// Floor over FloatN
    Floor,
    /// Fraction over FloatN
    Fraction,
    /// Length over FloatN
    Length,
    /// Lerp over FloatN
    Lerp,
    /// Two-operand maximum over FloatN
    Maximum,
    /// Two-operand minimum over FloatN
    Minimum,
    /// Modulo over FloatN
    Modulo,
    /// Two-operand multiply over FloatN
    Multiply,
    /// Normalize over FloatN
    Normalize,
    /// One minus over FloatN
    OneMinus,
    /// Power over FloatN
    Power,
    /// Reciprocal over FloatN
    Reciprocal,
    /// Remap over FloatN
    Remap,
    /// `[0, 1]` to `[-1, 1]` over FloatN
    RemapToNegOnePosOne,
    /// `[-1, 1]` to `[0, 1]` over FloatN
    RemapToZeroOne,
    /// Round over FloatN
    Round,
    /// Saturate over FloatN
    Saturate,
    /// Sawtooth wave over FloatN
    SawtoothWave,
    /// Sign over FloatN
    Sign,
    /// Sine over FloatN
    Sine,
    /// Sine wave over FloatN
    SineWave,
    /// Smoothstep over FloatN
    Smoothstep,
    /// Squared distance over FloatN
    SquaredDistance,
    /// Squared length over FloatN
    SquaredLength,
    /// Square root over FloatN
    SquareRoot,
    /// Square wave over FloatN
    SquareWave,
    /// Step over FloatN
    Step,
    /// Two-operand subtract over FloatN
    Subtract,
    /// Swizzle over FloatN
    Swizzle,
    /// Tangent over FloatN
    Tangent,
    /// Triangle wave over FloatN
    TriangleWave,
}

impl LegacyOperator {
    /// Table entry for this kind
    pub fn entry(self) -> &'static DeprecatedEntry {
        &DEPRECATED_OPERATORS[self as usize]
    }

    /// Display name
    pub fn name(self) -> &'static str {
        self.entry().name
    }
}

/// One row of the deprecated operator table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeprecatedEntry {
    /// Legacy kind
    pub legacy: LegacyOperator,
    /// Display name
    pub name: &'static str,
    /// Typed inputs preceding the FloatN operands
    pub leading: &'static [FixedInput],
    /// FloatN operands
    pub operands: &'static [OperandInfo],
    /// Output type
    pub output: ValueType,
    /// Canonical kind replacing this one
    pub replacement: OperatorKind,
}

impl DeprecatedEntry {
    /// Number of FloatN operands
    pub fn float_n_operands(&self) -> usize {
        self.operands.len()
    }
}

const X: &[OperandInfo] = &[OperandInfo { name: "x", default: 0.0 }];
const X_ONE: &[OperandInfo] = &[OperandInfo { name: "x", default: 1.0 }];
const A_B: &[OperandInfo] = &[
    OperandInfo { name: "a", default: 0.0 },
    OperandInfo { name: "b", default: 0.0 },
];
const A_B_ONE: &[OperandInfo] = &[
    OperandInfo { name: "a", default: 1.0 },
    OperandInfo { name: "b", default: 1.0 },
];
const A_B_STEP: &[OperandInfo] = &[
    OperandInfo { name: "a", default: 0.0 },
    OperandInfo { name: "b", default: 1.0 },
];
const CLAMP: &[OperandInfo] = &[
    OperandInfo { name: "input", default: 0.0 },
    OperandInfo { name: "min", default: 0.0 },
    OperandInfo { name: "max", default: 1.0 },
];
const LERP: &[OperandInfo] = &[
    OperandInfo { name: "x", default: 0.0 },
    OperandInfo { name: "y", default: 1.0 },
    OperandInfo { name: "s", default: 0.5 },
];
const REMAP: &[OperandInfo] = &[
    OperandInfo { name: "input", default: 0.5 },
    OperandInfo { name: "oldRangeMin", default: 0.0 },
    OperandInfo { name: "oldRangeMax", default: 1.0 },
    OperandInfo { name: "newRangeMin", default: 0.0 },
    OperandInfo { name: "newRangeMax", default: 1.0 },
];
const STEP: &[OperandInfo] = &[
    OperandInfo { name: "value", default: 0.0 },
    OperandInfo { name: "threshold", default: 0.5 },
];
const WAVE: &[OperandInfo] = &[
    OperandInfo { name: "input", default: 0.0 },
    OperandInfo { name: "frequency", default: 1.0 },
];

const fn row(
    legacy: LegacyOperator,
    name: &'static str,
    operands: &'static [OperandInfo],
    output: ValueType,
    replacement: OperatorKind,
) -> DeprecatedEntry {
    DeprecatedEntry {
        legacy,
        name,
        leading: &[],
        operands,
        output,
        replacement,
    }
}

/// Every deprecated operator, indexed by [`LegacyOperator`] discriminant
pub static DEPRECATED_OPERATORS: [DeprecatedEntry; 44] = [
    row(L::Absolute, "Absolute (FloatN)", X, FloatN, K::Absolute),
    row(L::Add, "Add (FloatN)", A_B, FloatN, K::Add),
    row(L::AppendVector, "Append Vector (FloatN)", X, FloatN, K::AppendVector),
    DeprecatedEntry {
        legacy: L::Branch,
        name: "Branch (FloatN)",
        leading: &[FixedInput { name: "predicate", value_type: ValueType::Bool }],
        operands: &[
            OperandInfo { name: "True", default: 0.0 },
            OperandInfo { name: "False", default: 0.0 },
        ],
        output: FloatN,
        replacement: K::Branch,
    },
    row(L::Ceiling, "Ceiling (FloatN)", X, FloatN, K::Ceiling),
    row(L::Clamp, "Clamp (FloatN)", CLAMP, FloatN, K::Clamp),
    row(L::ComponentMask, "Component Mask", X, FloatN, K::Swizzle),
    row(L::Cosine, "Cosine (FloatN)", X, FloatN, K::Cosine),
    row(L::Discretize, "Discretize (FloatN)", A_B_STEP, FloatN, K::Discretize),
    row(L::Distance, "Distance (FloatN)", A_B, Float, K::Distance),
    row(L::Divide, "Divide (FloatN)", A_B_ONE, FloatN, K::Divide),
    row(L::DotProduct, "Dot Product (FloatN)", A_B, Float, K::DotProduct),
    row(L::FitClamped, "Fit Clamped", REMAP, FloatN, K::RemapClamped),
    row(L::Floor, "Floor (FloatN)", X, FloatN, K::Floor),
    row(L::Fraction, "Fraction (FloatN)", X, FloatN, K::Fraction),
    row(L::Length, "Length (FloatN)", X, Float, K::Length),
    row(L::Lerp, "Lerp (FloatN)", LERP, FloatN, K::Lerp),
    row(L::Maximum, "Maximum (FloatN)", A_B, FloatN, K::Maximum),
    row(L::Minimum, "Minimum (FloatN)", A_B, FloatN, K::Minimum),
    row(L::Modulo, "Modulo (FloatN)", A_B_STEP, FloatN, K::Modulo),
    row(L::Multiply, "Multiply (FloatN)", A_B_ONE, FloatN, K::Multiply),
    row(L::Normalize, "Normalize (FloatN)", X, FloatN, K::Normalize),
    row(L::OneMinus, "One Minus (FloatN)", X, FloatN, K::OneMinus),
    row(L::Power, "Power (FloatN)", A_B_STEP, FloatN, K::Power),
    row(L::Reciprocal, "Reciprocal (FloatN)", X_ONE, FloatN, K::Reciprocal),
    row(L::Remap, "Remap (FloatN)", REMAP, FloatN, K::Remap),
    row(L::RemapToNegOnePosOne, "Remap [-1..1] (FloatN)", X, FloatN, K::RemapToNegOnePosOne),
    row(L::RemapToZeroOne, "Remap [0..1] (FloatN)", X, FloatN, K::RemapToZeroOne),
    row(L::Round, "Round (FloatN)", X, FloatN, K::Round),
    row(L::Saturate, "Saturate (FloatN)", X, FloatN, K::Saturate),
    row(L::SawtoothWave, "Sawtooth Wave (FloatN)", WAVE, FloatN, K::SawtoothWave),
    row(L::Sign, "Sign (FloatN)", X, FloatN, K::Sign),
    row(L::Sine, "Sine (FloatN)", X, FloatN, K::Sine),
    row(L::SineWave, "Sine Wave (FloatN)", WAVE, FloatN, K::SineWave),
    row(L::Smoothstep, "Smoothstep (FloatN)", LERP, FloatN, K::Smoothstep),
    row(L::SquaredDistance, "Squared Distance (FloatN)", A_B, Float, K::SquaredDistance),
    row(L::SquaredLength, "Squared Length (FloatN)", X, Float, K::SquaredLength),
    row(L::SquareRoot, "Square Root (FloatN)", X, FloatN, K::SquareRoot),
    row(L::SquareWave, "Square Wave (FloatN)", WAVE, FloatN, K::SquareWave),
    row(L::Step, "Step (FloatN)", STEP, FloatN, K::Step),
    row(L::Subtract, "Subtract (FloatN)", A_B, FloatN, K::Subtract),
    row(L::Swizzle, "Swizzle (FloatN)", X, FloatN, K::Swizzle),
    row(L::Tangent, "Tangent (FloatN)", X, FloatN, K::Tangent),
    row(L::TriangleWave, "Triangle Wave (FloatN)", WAVE, FloatN, K::TriangleWave),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::library::{descriptor, Arity};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_is_indexed_by_discriminant() {
        for (i, entry) in DEPRECATED_OPERATORS.iter().enumerate() {
            assert_eq!(entry.legacy as usize, i, "{}", entry.name);
        }
    }

    #[test]
    fn test_operand_counts() {
        let counts: Vec<(&str, usize)> = DEPRECATED_OPERATORS
            .iter()
            .map(|e| (e.name, e.float_n_operands()))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Absolute (FloatN)", 1),
                ("Add (FloatN)", 2),
                ("Append Vector (FloatN)", 1),
                ("Branch (FloatN)", 2),
                ("Ceiling (FloatN)", 1),
                ("Clamp (FloatN)", 3),
                ("Component Mask", 1),
                ("Cosine (FloatN)", 1),
                ("Discretize (FloatN)", 2),
                ("Distance (FloatN)", 2),
                ("Divide (FloatN)", 2),
                ("Dot Product (FloatN)", 2),
                ("Fit Clamped", 5),
                ("Floor (FloatN)", 1),
                ("Fraction (FloatN)", 1),
                ("Length (FloatN)", 1),
                ("Lerp (FloatN)", 3),
                ("Maximum (FloatN)", 2),
                ("Minimum (FloatN)", 2),
                ("Modulo (FloatN)", 2),
                ("Multiply (FloatN)", 2),
                ("Normalize (FloatN)", 1),
                ("One Minus (FloatN)", 1),
                ("Power (FloatN)", 2),
                ("Reciprocal (FloatN)", 1),
                ("Remap (FloatN)", 5),
                ("Remap [-1..1] (FloatN)", 1),
                ("Remap [0..1] (FloatN)", 1),
                ("Round (FloatN)", 1),
                ("Saturate (FloatN)", 1),
                ("Sawtooth Wave (FloatN)", 2),
                ("Sign (FloatN)", 1),
                ("Sine (FloatN)", 1),
                ("Sine Wave (FloatN)", 2),
                ("Smoothstep (FloatN)", 3),
                ("Squared Distance (FloatN)", 2),
                ("Squared Length (FloatN)", 1),
                ("Square Root (FloatN)", 1),
                ("Square Wave (FloatN)", 2),
                ("Step (FloatN)", 2),
                ("Subtract (FloatN)", 2),
                ("Swizzle (FloatN)", 1),
                ("Tangent (FloatN)", 1),
                ("Triangle Wave (FloatN)", 2),
            ]
        );
    }

    #[test]
    fn test_replacements_fit_their_canonical_shape() {
        for entry in DEPRECATED_OPERATORS.iter() {
            let canonical = descriptor(entry.replacement);
            assert_eq!(entry.leading, canonical.leading, "{}", entry.name);
            assert!(canonical.is_dynamic(), "{}", entry.name);
            match canonical.arity {
                Arity::Fixed(n) => assert_eq!(entry.float_n_operands(), n, "{}", entry.name),
                Arity::Cascaded { min, max, .. } => {
                    assert!(entry.float_n_operands() >= min, "{}", entry.name);
                    assert!(!max.is_some_and(|max| entry.float_n_operands() > max), "{}", entry.name);
                }
            }
        }
    }
}
