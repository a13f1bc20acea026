// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type affinity: which value types convert into which, and how close they are.
//!
//! The [`AffinityTable`] lists, for every canonical [`ValueType`], the other
//! types an output of that type may feed, nearest first. It drives both link
//! compatibility and the choice of operand type when a dynamic operator is
//! connected to a source it does not accept as-is.
//!
//! The ranking key for a candidate `S` of a base type `T` is
//! `(same layout ? 0 : 1, |channels(S) - channels(T)|, same integer kind ? 0 : 1)`,
//! ties broken by [`ValueType::UNIVERSE`] order.

use crate::value::ValueType;
use indexmap::IndexMap;
use std::sync::LazyLock;

/// Total order used to resolve the output type of unified numeric operators.
///
/// Do not reorder: saved effects rely on `Direction` losing against
/// `Vector`, and `Vector` losing against `Position`.
pub const TYPE_PRECEDENCE: [ValueType; 9] = [
    ValueType::Int32,
    ValueType::Uint32,
    ValueType::Float,
    ValueType::Vector2,
    ValueType::Vector3,
    ValueType::Direction,
    ValueType::Vector,
    ValueType::Position,
    ValueType::Vector4,
];

static GLOBAL: LazyLock<AffinityTable> = LazyLock::new(|| {
    let table = AffinityTable::build();
    if let Err(err) = table.validate() {
        panic!("malformed type affinity table: {err}");
    }
    table
});

/// Whether an output of type `from` may feed an input of type `to`
pub fn can_convert(from: ValueType, to: ValueType) -> bool {
    if from == to {
        return true;
    }
    // Legacy polymorphic slots accept and feed any numeric shape
    if from == ValueType::FloatN || to == ValueType::FloatN {
        return from.is_numeric() && to.is_numeric();
    }
    if from.is_scalar() {
        return to.is_numeric();
    }
    if from.is_plain_vector() {
        return to.is_scalar()
            || to.is_plain_vector()
            || (from == ValueType::Vector3 && to.is_spatial());
    }
    if from.is_spatial() {
        return to.is_spatial() || to == ValueType::Vector3;
    }
    false
}

/// Rank of `ty` in [`TYPE_PRECEDENCE`], if it takes part in unification
pub fn precedence(ty: ValueType) -> Option<usize> {
    TYPE_PRECEDENCE.iter().position(|t| *t == ty)
}

/// Combine two operand types into the resulting output type
pub fn unify(a: ValueType, b: ValueType) -> Option<ValueType> {
    let (ra, rb) = (precedence(a)?, precedence(b)?);
    Some(if rb > ra { b } else { a })
}

/// Fold [`unify`] left to right over `types`
pub fn unify_all(types: impl IntoIterator<Item = ValueType>) -> Option<ValueType> {
    let mut iter = types.into_iter();
    let first = iter.next()?;
    precedence(first)?;
    iter.try_fold(first, unify)
}

/// Ranked conversion candidates per type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityTable {
    entries: IndexMap<ValueType, Vec<ValueType>>,
}

impl AffinityTable {
    /// Derive the table from the conversion rules
    pub fn build() -> Self {
        let entries = ValueType::UNIVERSE
            .iter()
            .map(|&base| (base, ranked_candidates(base)))
            .collect();
        Self { entries }
    }

    /// Wrap explicit entries, rejecting malformed tables
    pub fn from_entries(entries: IndexMap<ValueType, Vec<ValueType>>) -> Result<Self, AffinityError> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    /// The process-wide table, validated on first use
    pub fn global() -> &'static AffinityTable {
        &GLOBAL
    }

    /// Check that every canonical type has an entry and that entries are sane
    pub fn validate(&self) -> Result<(), AffinityError> {
        for ty in ValueType::UNIVERSE {
            let candidates = self.entries.get(&ty).ok_or(AffinityError::MissingEntry(ty))?;
            for (i, candidate) in candidates.iter().enumerate() {
                if *candidate == ty {
                    return Err(AffinityError::SelfReference(ty));
                }
                if !ValueType::UNIVERSE.contains(candidate) {
                    return Err(AffinityError::UnknownType { base: ty, candidate: *candidate });
                }
                if candidates[..i].contains(candidate) {
                    return Err(AffinityError::Duplicate { base: ty, candidate: *candidate });
                }
            }
        }
        Ok(())
    }

    /// Candidates for `ty`, nearest first. Empty for types outside the universe.
    pub fn candidates(&self, ty: ValueType) -> &[ValueType] {
        self.entries.get(&ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over all entries in universe order
    pub fn iter(&self) -> impl Iterator<Item = (ValueType, &[ValueType])> {
        self.entries.iter().map(|(ty, c)| (*ty, c.as_slice()))
    }

    /// Whether an output of type `output` may be linked into an input of type `input`
    pub fn accepts(&self, output: ValueType, input: ValueType) -> bool {
        if output == input {
            return true;
        }
        if output == ValueType::FloatN || input == ValueType::FloatN {
            return can_convert(output, input);
        }
        self.candidates(output).contains(&input)
    }

    /// Pick the type in `accepted` that best receives a `source` value.
    ///
    /// An exact match wins, otherwise the nearest candidate from the table.
    /// Legacy `FloatN` sources have no entry and resolve to the widest
    /// accepted float type.
    pub fn best_match(&self, source: ValueType, accepted: &[ValueType]) -> Option<ValueType> {
        if accepted.contains(&source) {
            return Some(source);
        }
        if source == ValueType::FloatN {
            return [ValueType::Vector4, ValueType::Vector3, ValueType::Vector2, ValueType::Float]
                .into_iter()
                .find(|t| accepted.contains(t));
        }
        self.candidates(source)
            .iter()
            .copied()
            .find(|t| accepted.contains(t))
    }
}

fn ranked_candidates(base: ValueType) -> Vec<ValueType> {
    let base_layout = base.layout();
    let base_channels = base.channel_count();
    let mut ranked: Vec<(u8, usize, u8, usize)> = ValueType::UNIVERSE
        .iter()
        .enumerate()
        .filter(|&(_, &other)| other != base && can_convert(base, other))
        .map(|(order, &other)| {
            (
                u8::from(other.layout() != base_layout),
                other.channel_count().abs_diff(base_channels),
                u8::from(other.is_integer() != base.is_integer()),
                order,
            )
        })
        .collect();
    ranked.sort_unstable();
    ranked
        .into_iter()
        .map(|(.., order)| ValueType::UNIVERSE[order])
        .collect()
}

/// Malformed static affinity configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AffinityError {
    /// A canonical type has no entry
    #[error("no affinity entry for {0}")]
    MissingEntry(ValueType),

    /// A type lists itself as a candidate
    #[error("{0} lists itself as an affinity candidate")]
    SelfReference(ValueType),

    /// A candidate is not a canonical type
    #[error("{base} lists {candidate}, which is not a canonical type")]
    UnknownType {
        /// Entry owner
        base: ValueType,
        /// Offending candidate
        candidate: ValueType,
    },

    /// A candidate appears twice
    #[error("{base} lists {candidate} more than once")]
    Duplicate {
        /// Entry owner
        base: ValueType,
        /// Offending candidate
        candidate: ValueType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use ValueType::*;

    fn golden() -> Vec<(ValueType, Vec<ValueType>)> {
        vec![
            (Matrix4x4, vec![]),
            (Vector4, vec![Color, Vector3, Vector2, Float, Int32, Uint32]),
            (Color, vec![Vector4, Vector3, Vector2, Float, Int32, Uint32]),
            (
                Vector3,
                vec![Position, Direction, Vector, Vector4, Color, Vector2, Float, Int32, Uint32],
            ),
            (Position, vec![Vector3, Direction, Vector]),
            (Direction, vec![Vector3, Position, Vector]),
            (Vector, vec![Vector3, Position, Direction]),
            (Vector2, vec![Vector3, Float, Int32, Uint32, Vector4, Color]),
            (
                Float,
                vec![Int32, Uint32, Vector2, Vector3, Position, Direction, Vector, Vector4, Color],
            ),
            (
                Int32,
                vec![Uint32, Float, Vector2, Vector3, Position, Direction, Vector, Vector4, Color],
            ),
            (
                Uint32,
                vec![Int32, Float, Vector2, Vector3, Position, Direction, Vector, Vector4, Color],
            ),
            (Bool, vec![]),
        ]
    }

    /// Independent rederivation: stable sort over universe order, keyed on
    /// the three ranking criteria.
    fn rederive(base: ValueType) -> Vec<ValueType> {
        let mut compatible: Vec<ValueType> = ValueType::UNIVERSE
            .into_iter()
            .filter(|s| *s != base && can_convert(base, *s))
            .collect();
        compatible.sort_by_key(|s| {
            let diff_type = if s.layout() == base.layout() { 0 } else { 1 };
            let diff_channels = (s.channel_count() as i64 - base.channel_count() as i64).abs();
            let diff_integer = if s.is_integer() == base.is_integer() { 0 } else { 1 };
            (diff_type, diff_channels, diff_integer)
        });
        compatible
    }

    #[test]
    fn test_affinity_matches_golden_table() {
        let table = AffinityTable::global();
        let current: Vec<(ValueType, Vec<ValueType>)> =
            table.iter().map(|(t, c)| (t, c.to_vec())).collect();
        assert_eq!(
            golden(),
            current,
            "affinity or conversion rules changed; review saved effects before updating"
        );
    }

    #[test]
    fn test_affinity_matches_rederivation() {
        for (ty, candidates) in AffinityTable::build().iter() {
            assert_eq!(rederive(ty), candidates.to_vec(), "{ty}");
        }
    }

    #[test]
    fn test_validation_rejects_malformed_tables() {
        let mut entries: IndexMap<ValueType, Vec<ValueType>> =
            golden().into_iter().collect();
        entries.shift_remove(&Bool);
        assert_eq!(
            AffinityTable::from_entries(entries.clone()).unwrap_err(),
            AffinityError::MissingEntry(Bool)
        );

        entries.insert(Bool, vec![Bool]);
        assert_eq!(
            AffinityTable::from_entries(entries.clone()).unwrap_err(),
            AffinityError::SelfReference(Bool)
        );

        entries.insert(Bool, vec![FloatN]);
        assert!(matches!(
            AffinityTable::from_entries(entries.clone()),
            Err(AffinityError::UnknownType { .. })
        ));

        entries.insert(Bool, vec![Float, Float]);
        assert!(matches!(
            AffinityTable::from_entries(entries),
            Err(AffinityError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_best_match() {
        let table = AffinityTable::global();
        let float_family = [Float, Vector2, Vector3, Vector4];
        assert_eq!(table.best_match(Vector2, &float_family), Some(Vector2));
        assert_eq!(table.best_match(Position, &float_family), Some(Vector3));
        assert_eq!(table.best_match(Color, &float_family), Some(Vector4));
        assert_eq!(table.best_match(Int32, &float_family), Some(Float));
        assert_eq!(table.best_match(FloatN, &float_family), Some(Vector4));
        assert_eq!(table.best_match(Bool, &float_family), None);
    }

    #[test]
    fn test_unify_reference_table() {
        // Row/column order follows TYPE_PRECEDENCE.
        let reference = [
            [Int32, Uint32, Float, Vector2, Vector3, Direction, Vector, Position, Vector4],
            [Uint32, Uint32, Float, Vector2, Vector3, Direction, Vector, Position, Vector4],
            [Float, Float, Float, Vector2, Vector3, Direction, Vector, Position, Vector4],
            [Vector2, Vector2, Vector2, Vector2, Vector3, Direction, Vector, Position, Vector4],
            [Vector3, Vector3, Vector3, Vector3, Vector3, Direction, Vector, Position, Vector4],
            [Direction, Direction, Direction, Direction, Direction, Direction, Vector, Position, Vector4],
            [Vector, Vector, Vector, Vector, Vector, Vector, Vector, Position, Vector4],
            [Position, Position, Position, Position, Position, Position, Position, Position, Vector4],
            [Vector4, Vector4, Vector4, Vector4, Vector4, Vector4, Vector4, Vector4, Vector4],
        ];
        for (i, a) in TYPE_PRECEDENCE.iter().enumerate() {
            for (j, b) in TYPE_PRECEDENCE.iter().enumerate() {
                assert_eq!(unify(*a, *b), Some(reference[i][j]), "{a} with {b}");
            }
        }
        assert_eq!(unify(Int32, Uint32), Some(Uint32));
        assert_eq!(unify(Vector, Position), Some(Position));
        assert_eq!(unify(Position, Vector4), Some(Vector4));
        assert_eq!(unify(Color, Float), None);
    }

    fn any_unified_type() -> impl Strategy<Value = ValueType> {
        prop::sample::select(TYPE_PRECEDENCE.to_vec())
    }

    proptest! {
        #[test]
        fn prop_unify_is_order_independent(
            types in prop::collection::vec(any_unified_type(), 1..8)
        ) {
            let left = unify_all(types.iter().copied());
            let right = types.iter().rev().copied().try_fold(*types.last().unwrap(), unify);
            prop_assert_eq!(left, right);
            let max = types.iter().copied().max_by_key(|t| precedence(*t));
            prop_assert_eq!(left, max);
        }

        #[test]
        fn prop_unify_is_associative(a in any_unified_type(), b in any_unified_type(), c in any_unified_type()) {
            let lhs = unify(a, b).and_then(|ab| unify(ab, c));
            let rhs = unify(b, c).and_then(|bc| unify(a, bc));
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn prop_accepts_matches_table_membership(
            a in prop::sample::select(ValueType::UNIVERSE.to_vec()),
            b in prop::sample::select(ValueType::UNIVERSE.to_vec()),
        ) {
            let table = AffinityTable::global();
            prop_assert_eq!(table.accepts(a, b), a == b || table.candidates(a).contains(&b));
            prop_assert_eq!(table.accepts(a, b), can_convert(a, b));
        }
    }
}
