//! Shared enumerations and the predicate condition algebra.
//!
//! The algebra is a set of pure functions over [`PredicateCondition`]:
//! classification, flip (swap operand order), inverse (logical negation),
//! and the decomposition of a between condition into its two bound
//! conditions plus the exact reverse.
//!
//! Every enum here also has a process-wide name table used for `Display`
//! and `FromStr`. The tables are built once on first use and never written
//! again.

use crate::error::{LqpError, LqpResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Position of a column in a node's output
pub type ColumnId = u16;

/// Comparison, range, set and null relations used by predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PredicateCondition {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    /// `lower <= x <= upper`
    BetweenInclusive,
    /// `lower < x <= upper`
    BetweenLowerExclusive,
    /// `lower <= x < upper`
    BetweenUpperExclusive,
    /// `lower < x < upper`
    BetweenExclusive,
    In,
    NotIn,
    Like,
    NotLike,
    IsNull,
    IsNotNull,
}

impl PredicateCondition {
    /// All conditions, in declaration order
    pub const ALL: [PredicateCondition; 16] = [
        PredicateCondition::Equals,
        PredicateCondition::NotEquals,
        PredicateCondition::LessThan,
        PredicateCondition::LessThanEquals,
        PredicateCondition::GreaterThan,
        PredicateCondition::GreaterThanEquals,
        PredicateCondition::BetweenInclusive,
        PredicateCondition::BetweenLowerExclusive,
        PredicateCondition::BetweenUpperExclusive,
        PredicateCondition::BetweenExclusive,
        PredicateCondition::In,
        PredicateCondition::NotIn,
        PredicateCondition::Like,
        PredicateCondition::NotLike,
        PredicateCondition::IsNull,
        PredicateCondition::IsNotNull,
    ];
}

/// Join semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinMode {
    Cross,
    Inner,
    Left,
    Right,
    FullOuter,
    Semi,
    AntiNullAsTrue,
    AntiNullAsFalse,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    Ascending,
    Descending,
}

/// Union semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperationMode {
    Unique,
    All,
    Positions,
}

/// Whether a table holds data or references into other tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableType {
    Data,
    References,
}

/// File formats for import and export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Tbl,
    Binary,
    /// Resolved from the file extension by the importer/exporter
    Auto,
}

/// Verbosity of node descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DescriptionMode {
    #[default]
    Short,
    Detailed,
}

// Classification

/// Conditions that compare exactly two operands
pub fn is_binary_predicate_condition(condition: PredicateCondition) -> bool {
    matches!(
        condition,
        PredicateCondition::Equals
            | PredicateCondition::NotEquals
            | PredicateCondition::LessThan
            | PredicateCondition::LessThanEquals
            | PredicateCondition::GreaterThan
            | PredicateCondition::GreaterThanEquals
            | PredicateCondition::Like
            | PredicateCondition::NotLike
            | PredicateCondition::In
            | PredicateCondition::NotIn
    )
}

/// Binary conditions that are meaningful on ordered (numeric) values
pub fn is_binary_numeric_predicate_condition(condition: PredicateCondition) -> bool {
    matches!(
        condition,
        PredicateCondition::Equals
            | PredicateCondition::NotEquals
            | PredicateCondition::LessThan
            | PredicateCondition::LessThanEquals
            | PredicateCondition::GreaterThan
            | PredicateCondition::GreaterThanEquals
    )
}

pub fn is_between_predicate_condition(condition: PredicateCondition) -> bool {
    matches!(
        condition,
        PredicateCondition::BetweenInclusive
            | PredicateCondition::BetweenLowerExclusive
            | PredicateCondition::BetweenUpperExclusive
            | PredicateCondition::BetweenExclusive
    )
}

/// Whether the lower bound of a between condition is part of the range
pub fn is_lower_inclusive_between(condition: PredicateCondition) -> LqpResult<bool> {
    match condition {
        PredicateCondition::BetweenInclusive | PredicateCondition::BetweenUpperExclusive => {
            Ok(true)
        }
        PredicateCondition::BetweenLowerExclusive | PredicateCondition::BetweenExclusive => {
            Ok(false)
        }
        _ => Err(unsupported("classify bounds of", condition)),
    }
}

/// Whether the upper bound of a between condition is part of the range
pub fn is_upper_inclusive_between(condition: PredicateCondition) -> LqpResult<bool> {
    match condition {
        PredicateCondition::BetweenInclusive | PredicateCondition::BetweenLowerExclusive => {
            Ok(true)
        }
        PredicateCondition::BetweenUpperExclusive | PredicateCondition::BetweenExclusive => {
            Ok(false)
        }
        _ => Err(unsupported("classify bounds of", condition)),
    }
}

// Algebra

/// Turn `a op b` into `b op' a`
pub fn flip_predicate_condition(condition: PredicateCondition) -> LqpResult<PredicateCondition> {
    match condition {
        PredicateCondition::Equals => Ok(PredicateCondition::Equals),
        PredicateCondition::NotEquals => Ok(PredicateCondition::NotEquals),
        PredicateCondition::LessThan => Ok(PredicateCondition::GreaterThan),
        PredicateCondition::LessThanEquals => Ok(PredicateCondition::GreaterThanEquals),
        PredicateCondition::GreaterThan => Ok(PredicateCondition::LessThan),
        PredicateCondition::GreaterThanEquals => Ok(PredicateCondition::LessThanEquals),

        PredicateCondition::BetweenInclusive
        | PredicateCondition::BetweenLowerExclusive
        | PredicateCondition::BetweenUpperExclusive
        | PredicateCondition::BetweenExclusive
        | PredicateCondition::In
        | PredicateCondition::NotIn
        | PredicateCondition::Like
        | PredicateCondition::NotLike
        | PredicateCondition::IsNull
        | PredicateCondition::IsNotNull => Err(unsupported("flip", condition)),
    }
}

/// Logical negation. Note that `a > b` negates to `a <= b`.
pub fn inverse_predicate_condition(
    condition: PredicateCondition,
) -> LqpResult<PredicateCondition> {
    match condition {
        PredicateCondition::Equals => Ok(PredicateCondition::NotEquals),
        PredicateCondition::NotEquals => Ok(PredicateCondition::Equals),
        PredicateCondition::GreaterThan => Ok(PredicateCondition::LessThanEquals),
        PredicateCondition::LessThanEquals => Ok(PredicateCondition::GreaterThan),
        PredicateCondition::GreaterThanEquals => Ok(PredicateCondition::LessThan),
        PredicateCondition::LessThan => Ok(PredicateCondition::GreaterThanEquals),
        PredicateCondition::Like => Ok(PredicateCondition::NotLike),
        PredicateCondition::NotLike => Ok(PredicateCondition::Like),
        PredicateCondition::IsNull => Ok(PredicateCondition::IsNotNull),
        PredicateCondition::IsNotNull => Ok(PredicateCondition::IsNull),
        PredicateCondition::In => Ok(PredicateCondition::NotIn),
        PredicateCondition::NotIn => Ok(PredicateCondition::In),

        PredicateCondition::BetweenInclusive
        | PredicateCondition::BetweenLowerExclusive
        | PredicateCondition::BetweenUpperExclusive
        | PredicateCondition::BetweenExclusive => Err(unsupported("inverse", condition)),
    }
}

/// Split a between condition into its (lower bound, upper bound) conditions
pub fn between_to_conditions(
    condition: PredicateCondition,
) -> LqpResult<(PredicateCondition, PredicateCondition)> {
    match condition {
        PredicateCondition::BetweenInclusive => Ok((
            PredicateCondition::GreaterThanEquals,
            PredicateCondition::LessThanEquals,
        )),
        PredicateCondition::BetweenLowerExclusive => Ok((
            PredicateCondition::GreaterThan,
            PredicateCondition::LessThanEquals,
        )),
        PredicateCondition::BetweenUpperExclusive => Ok((
            PredicateCondition::GreaterThanEquals,
            PredicateCondition::LessThan,
        )),
        PredicateCondition::BetweenExclusive => {
            Ok((PredicateCondition::GreaterThan, PredicateCondition::LessThan))
        }
        _ => Err(unsupported("decompose", condition)),
    }
}

/// Reverse of [`between_to_conditions`]
pub fn conditions_to_between(
    lower: PredicateCondition,
    upper: PredicateCondition,
) -> LqpResult<PredicateCondition> {
    match (lower, upper) {
        (PredicateCondition::GreaterThan, PredicateCondition::LessThan) => {
            Ok(PredicateCondition::BetweenExclusive)
        }
        (PredicateCondition::GreaterThan, PredicateCondition::LessThanEquals) => {
            Ok(PredicateCondition::BetweenLowerExclusive)
        }
        (PredicateCondition::GreaterThanEquals, PredicateCondition::LessThan) => {
            Ok(PredicateCondition::BetweenUpperExclusive)
        }
        (PredicateCondition::GreaterThanEquals, PredicateCondition::LessThanEquals) => {
            Ok(PredicateCondition::BetweenInclusive)
        }
        _ => Err(LqpError::InvalidBetweenBounds { lower, upper }),
    }
}

pub fn is_semi_or_anti_join(join_mode: JoinMode) -> bool {
    matches!(
        join_mode,
        JoinMode::Semi | JoinMode::AntiNullAsTrue | JoinMode::AntiNullAsFalse
    )
}

fn unsupported(operation: &'static str, condition: PredicateCondition) -> LqpError {
    LqpError::UnsupportedCondition {
        operation,
        condition,
    }
}

// Name tables

/// Immutable bidirectional mapping between enum values and display names
struct NameTable<T: 'static> {
    kind: &'static str,
    to_name: HashMap<T, &'static str>,
    from_name: HashMap<&'static str, T>,
}

impl<T: Copy + Eq + std::hash::Hash> NameTable<T> {
    fn new(kind: &'static str, entries: &[(T, &'static str)]) -> Self {
        NameTable {
            kind,
            to_name: entries.iter().copied().collect(),
            from_name: entries.iter().map(|&(value, name)| (name, value)).collect(),
        }
    }

    fn name(&self, value: T) -> &'static str {
        // Tables are exhaustive over closed enums; a miss is a table bug.
        self.to_name.get(&value).copied().unwrap_or("<invalid>")
    }

    fn parse(&self, name: &str) -> LqpResult<T> {
        self.from_name
            .get(name)
            .copied()
            .ok_or_else(|| LqpError::UnknownName {
                kind: self.kind,
                name: name.to_string(),
            })
    }
}

static PREDICATE_CONDITION_NAMES: Lazy<NameTable<PredicateCondition>> = Lazy::new(|| {
    NameTable::new(
        "predicate condition",
        &[
            (PredicateCondition::Equals, "="),
            (PredicateCondition::NotEquals, "!="),
            (PredicateCondition::LessThan, "<"),
            (PredicateCondition::LessThanEquals, "<="),
            (PredicateCondition::GreaterThan, ">"),
            (PredicateCondition::GreaterThanEquals, ">="),
            (PredicateCondition::BetweenInclusive, "BETWEEN INCLUSIVE"),
            (PredicateCondition::BetweenLowerExclusive, "BETWEEN LOWER EXCLUSIVE"),
            (PredicateCondition::BetweenUpperExclusive, "BETWEEN UPPER EXCLUSIVE"),
            (PredicateCondition::BetweenExclusive, "BETWEEN EXCLUSIVE"),
            (PredicateCondition::Like, "LIKE"),
            (PredicateCondition::NotLike, "NOT LIKE"),
            (PredicateCondition::In, "IN"),
            (PredicateCondition::NotIn, "NOT IN"),
            (PredicateCondition::IsNull, "IS NULL"),
            (PredicateCondition::IsNotNull, "IS NOT NULL"),
        ],
    )
});

static JOIN_MODE_NAMES: Lazy<NameTable<JoinMode>> = Lazy::new(|| {
    NameTable::new(
        "join mode",
        &[
            (JoinMode::Cross, "Cross"),
            (JoinMode::Inner, "Inner"),
            (JoinMode::Left, "Left"),
            (JoinMode::FullOuter, "FullOuter"),
            (JoinMode::Right, "Right"),
            (JoinMode::Semi, "Semi"),
            (JoinMode::AntiNullAsTrue, "AntiNullAsTrue"),
            (JoinMode::AntiNullAsFalse, "AntiNullAsFalse"),
        ],
    )
});

static SORT_MODE_NAMES: Lazy<NameTable<SortMode>> = Lazy::new(|| {
    NameTable::new(
        "sort mode",
        &[
            (SortMode::Ascending, "Ascending"),
            (SortMode::Descending, "Descending"),
        ],
    )
});

static SET_OPERATION_MODE_NAMES: Lazy<NameTable<SetOperationMode>> = Lazy::new(|| {
    NameTable::new(
        "set operation mode",
        &[
            (SetOperationMode::Unique, "Unique"),
            (SetOperationMode::All, "All"),
            (SetOperationMode::Positions, "Positions"),
        ],
    )
});

static TABLE_TYPE_NAMES: Lazy<NameTable<TableType>> = Lazy::new(|| {
    NameTable::new(
        "table type",
        &[(TableType::Data, "Data"), (TableType::References, "References")],
    )
});

static FILE_TYPE_NAMES: Lazy<NameTable<FileType>> = Lazy::new(|| {
    NameTable::new(
        "file type",
        &[
            (FileType::Csv, "Csv"),
            (FileType::Tbl, "Tbl"),
            (FileType::Binary, "Binary"),
            (FileType::Auto, "Auto"),
        ],
    )
});

macro_rules! impl_name_table {
    ($ty:ty, $table:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str($table.name(*self))
            }
        }

        impl FromStr for $ty {
            type Err = LqpError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $table.parse(s)
            }
        }
    };
}

impl_name_table!(PredicateCondition, PREDICATE_CONDITION_NAMES);
impl_name_table!(JoinMode, JOIN_MODE_NAMES);
impl_name_table!(SortMode, SORT_MODE_NAMES);
impl_name_table!(SetOperationMode, SET_OPERATION_MODE_NAMES);
impl_name_table!(TableType, TABLE_TYPE_NAMES);
impl_name_table!(FileType, FILE_TYPE_NAMES);
