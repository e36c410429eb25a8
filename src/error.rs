//! Error Types
//!
//! Two channels:
//! - [`LqpError`]: contract violations (wrong variant assumed, condition outside
//!   an operation's domain, missing column). The caller's plan is malformed.
//! - [`PruningError`]: a statistics object has no pruning rule. Expected, and
//!   handled by the optimizer as "no refinement available".

use crate::types::{ColumnId, PredicateCondition};
use crate::value::DataType;
use thiserror::Error;

/// Usage errors raised by plan nodes and the predicate condition algebra
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LqpError {
    /// Flip, inverse or decomposition applied outside its domain
    #[error("Can't {operation} predicate condition {condition}")]
    UnsupportedCondition {
        operation: &'static str,
        condition: PredicateCondition,
    },

    /// Recomposition with a (lower, upper) pair that is not a valid between
    #[error("Conditions ({lower}, {upper}) do not form a between condition")]
    InvalidBetweenBounds {
        lower: PredicateCondition,
        upper: PredicateCondition,
    },

    /// Column metadata requested from a node that outputs no columns
    #[error("{node} does not output any columns")]
    NoOutputColumns { node: String },

    /// Column id past the end of the node's output
    #[error("{node} has no column {column_id} (outputs {column_count} columns)")]
    ColumnOutOfRange {
        node: String,
        column_id: ColumnId,
        column_count: usize,
    },

    /// Reverse lookup in one of the name tables failed
    #[error("Unknown {kind} name: '{name}'")]
    UnknownName { kind: &'static str, name: String },

    /// Table not registered
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column not registered for a table
    #[error("Unknown column {column_id} in table '{table}'")]
    UnknownColumn { table: String, column_id: ColumnId },

    /// Structural problem in a plan (wrong input count, bad predicate arity)
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

/// Result type for plan operations
pub type LqpResult<T> = Result<T, LqpError>;

/// Outcome of a pruning request that produced no refined statistics
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PruningError {
    /// The statistics object implements no pruning rule
    #[error("Pruning has not yet been implemented for {data_type} statistics")]
    NotSupported { data_type: DataType },
}
