//! Attribute statistics and predicate-driven pruning.
//!
//! When the optimizer folds a predicate into a scan, the rows the predicate
//! rules out are gone from that scan's point of view. [`AttributeStatistics::pruned`]
//! asks a statistics object for a refined copy describing what is left.
//! Not every kind of statistics knows how to do that; the default answer
//! is [`PruningError::NotSupported`] and callers keep the unpruned object.
//!
//! # Example
//!
//! ```
//! use planlayer::statistics::{AttributeStatistics, ColumnStatistics};
//! use planlayer::types::PredicateCondition;
//! use planlayer::value::{DataType, Value};
//!
//! // 100 rows with values in [0, 99]
//! let stats = ColumnStatistics::new(DataType::Int32, 100.0, 0.0, 100.0)
//!     .with_range(Value::Int32(0), Value::Int32(99));
//!
//! // Drop the 50 rows with value >= 50
//! let pruned = stats
//!     .pruned(50, PredicateCondition::GreaterThanEquals, &Value::Int32(50), None)
//!     .unwrap();
//! assert_eq!(pruned.distinct_count(), Some(50.0));
//! ```

use crate::error::{LqpError, LqpResult, PruningError};
use crate::types::{
    is_between_predicate_condition, is_lower_inclusive_between, is_upper_inclusive_between,
    ColumnId, PredicateCondition,
};
use crate::value::{DataType, Value};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Statistics about the values of one column.
///
/// Objects are immutable once shared; refinement produces a new object.
pub trait AttributeStatistics: Send + Sync + fmt::Debug {
    fn data_type(&self) -> DataType;

    /// Statistics after removing `num_values_pruned` rows that satisfied
    /// `condition` against `value` (and `value2`, the upper bound of a
    /// between condition).
    fn pruned(
        &self,
        num_values_pruned: u64,
        condition: PredicateCondition,
        value: &Value,
        value2: Option<&Value>,
    ) -> Result<Arc<dyn AttributeStatistics>, PruningError> {
        let _ = (num_values_pruned, condition, value, value2);
        Err(PruningError::NotSupported {
            data_type: self.data_type(),
        })
    }

    /// Estimated number of distinct non-null values, if tracked
    fn distinct_count(&self) -> Option<f64> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Distinct count only; offers no pruning rule
#[derive(Debug, Clone, PartialEq)]
pub struct DistinctValueCount {
    pub data_type: DataType,
    pub count: f64,
}

impl DistinctValueCount {
    pub fn new(data_type: DataType, count: f64) -> Self {
        DistinctValueCount { data_type, count }
    }
}

impl AttributeStatistics for DistinctValueCount {
    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn distinct_count(&self) -> Option<f64> {
        Some(self.count)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Row, null and distinct counts with an optional value range.
///
/// Counts are estimates and therefore floating point.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    pub data_type: DataType,
    pub row_count: f64,
    pub null_count: f64,
    pub distinct_count: f64,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

impl ColumnStatistics {
    pub fn new(data_type: DataType, row_count: f64, null_count: f64, distinct_count: f64) -> Self {
        ColumnStatistics {
            data_type,
            row_count,
            null_count,
            distinct_count,
            min: None,
            max: None,
        }
    }

    pub fn with_range(mut self, min: Value, max: Value) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn non_null_count(&self) -> f64 {
        (self.row_count - self.null_count).max(0.0)
    }

    /// Lower `max` to `bound` if that narrows the range
    fn cap_max(&mut self, bound: &Value) {
        if self.comparable(bound)
            && self
                .max
                .as_ref()
                .is_none_or(|max| bound.compare(max) == Some(Ordering::Less))
        {
            self.max = Some(bound.clone());
        }
    }

    /// Raise `min` to `bound` if that narrows the range
    fn raise_min(&mut self, bound: &Value) {
        if self.comparable(bound)
            && self
                .min
                .as_ref()
                .is_none_or(|min| bound.compare(min) == Some(Ordering::Greater))
        {
            self.min = Some(bound.clone());
        }
    }

    fn comparable(&self, bound: &Value) -> bool {
        self.data_type.is_ordered()
            && !bound.is_null()
            && (bound.data_type() == self.data_type
                || (bound.data_type().is_numeric() && self.data_type.is_numeric()))
    }

    /// Whether a lower bound reaches `min`: inclusive bounds from `min`
    /// down, exclusive ones only strictly below it
    fn covers_min(&self, bound: &Value, inclusive: bool) -> bool {
        self.min
            .as_ref()
            .and_then(|min| bound.compare(min))
            .is_some_and(|ordering| {
                ordering == Ordering::Less || (inclusive && ordering == Ordering::Equal)
            })
    }

    fn covers_max(&self, bound: &Value, inclusive: bool) -> bool {
        self.max
            .as_ref()
            .and_then(|max| bound.compare(max))
            .is_some_and(|ordering| {
                ordering == Ordering::Greater || (inclusive && ordering == Ordering::Equal)
            })
    }

    /// Tighten the range after removing the rows between `lower` and
    /// `upper`. Removing a middle slice leaves the range as is; only a slice
    /// that reaches past one end of the range moves that end. An exclusive
    /// bound equal to a range end keeps the rows at that end.
    fn prune_between(&mut self, condition: PredicateCondition, lower: &Value, upper: &Value) {
        let (Ok(lower_inclusive), Ok(upper_inclusive)) = (
            is_lower_inclusive_between(condition),
            is_upper_inclusive_between(condition),
        ) else {
            return;
        };
        match (
            self.covers_min(lower, lower_inclusive),
            self.covers_max(upper, upper_inclusive),
        ) {
            // Every non-null value was inside the slice
            (true, true) => {
                self.min = None;
                self.max = None;
            }
            (true, false) => self.raise_min(upper),
            (false, true) => self.cap_max(lower),
            (false, false) => {}
        }
    }

    fn scaled_distinct_count(&self, remaining_non_null: f64) -> f64 {
        let non_null = self.non_null_count();
        if remaining_non_null <= 0.0 || non_null <= 0.0 {
            return 0.0;
        }
        (self.distinct_count * remaining_non_null / non_null).max(1.0)
    }
}

impl AttributeStatistics for ColumnStatistics {
    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn pruned(
        &self,
        num_values_pruned: u64,
        condition: PredicateCondition,
        value: &Value,
        value2: Option<&Value>,
    ) -> Result<Arc<dyn AttributeStatistics>, PruningError> {
        if self.data_type == DataType::Null {
            return Err(PruningError::NotSupported {
                data_type: self.data_type,
            });
        }

        let removed = (num_values_pruned as f64).min(self.row_count);
        let mut result = self.clone();
        result.row_count = self.row_count - removed;

        match condition {
            PredicateCondition::IsNull => {
                result.null_count = (self.null_count - removed).max(0.0);
            }
            PredicateCondition::IsNotNull => {
                // Only nulls remain
                result.null_count = result.row_count;
                result.distinct_count = 0.0;
                result.min = None;
                result.max = None;
            }
            _ => {
                let remaining_non_null = (self.non_null_count() - removed).max(0.0);
                result.null_count = self.null_count.min(result.row_count);
                result.distinct_count = self.scaled_distinct_count(remaining_non_null);

                match condition {
                    PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals => {
                        result.cap_max(value);
                    }
                    PredicateCondition::LessThan | PredicateCondition::LessThanEquals => {
                        result.raise_min(value);
                    }
                    PredicateCondition::NotEquals if remaining_non_null > 0.0 => {
                        // Everything but `value` is gone
                        result.distinct_count = 1.0;
                        if result.comparable(value) {
                            result.min = Some(value.clone());
                            result.max = Some(value.clone());
                        }
                    }
                    c if is_between_predicate_condition(c) => {
                        if let Some(upper) = value2 {
                            result.prune_between(c, value, upper);
                        }
                    }
                    _ => {}
                }

                if remaining_non_null <= 0.0 {
                    result.min = None;
                    result.max = None;
                }
            }
        }

        Ok(Arc::new(result))
    }

    fn distinct_count(&self) -> Option<f64> {
        Some(self.distinct_count)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Per-table, per-column statistics used during optimization
#[derive(Debug, Default)]
pub struct StatisticsRegistry {
    tables: HashMap<String, Vec<Arc<dyn AttributeStatistics>>>,
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the statistics of a table, one entry per column
    pub fn register_table(
        &mut self,
        table_name: impl Into<String>,
        columns: Vec<Arc<dyn AttributeStatistics>>,
    ) {
        self.tables.insert(table_name.into(), columns);
    }

    pub fn get(&self, table_name: &str, column_id: ColumnId) -> LqpResult<Arc<dyn AttributeStatistics>> {
        self.slot(table_name, column_id).map(Arc::clone)
    }

    fn slot(&self, table_name: &str, column_id: ColumnId) -> LqpResult<&Arc<dyn AttributeStatistics>> {
        let columns = self
            .tables
            .get(table_name)
            .ok_or_else(|| LqpError::UnknownTable(table_name.to_string()))?;
        columns
            .get(usize::from(column_id))
            .ok_or_else(|| LqpError::UnknownColumn {
                table: table_name.to_string(),
                column_id,
            })
    }

    /// Replace a column's statistics with their pruned version.
    ///
    /// Returns `Ok(false)` and keeps the current statistics when they offer
    /// no pruning rule.
    pub fn refine(
        &mut self,
        table_name: &str,
        column_id: ColumnId,
        num_values_pruned: u64,
        condition: PredicateCondition,
        value: &Value,
        value2: Option<&Value>,
    ) -> LqpResult<bool> {
        let current = self.get(table_name, column_id)?;
        match current.pruned(num_values_pruned, condition, value, value2) {
            Ok(refined) => {
                if let Some(slot) = self
                    .tables
                    .get_mut(table_name)
                    .and_then(|columns| columns.get_mut(usize::from(column_id)))
                {
                    *slot = refined;
                }
                Ok(true)
            }
            Err(err) => {
                tracing::debug!(
                    table = table_name,
                    column_id,
                    %condition,
                    "keeping unpruned statistics: {err}"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_stats() -> ColumnStatistics {
        ColumnStatistics::new(DataType::Int32, 100.0, 10.0, 45.0)
            .with_range(Value::Int32(0), Value::Int32(90))
    }

    fn downcast(stats: &Arc<dyn AttributeStatistics>) -> &ColumnStatistics {
        stats.as_any().downcast_ref::<ColumnStatistics>().unwrap()
    }

    #[test]
    fn test_default_pruning_is_not_supported() {
        let stats = DistinctValueCount::new(DataType::Float64, 7.0);
        let result = stats.pruned(3, PredicateCondition::Equals, &Value::Float64(1.0), None);
        assert_eq!(
            result.unwrap_err(),
            PruningError::NotSupported {
                data_type: DataType::Float64
            }
        );
    }

    #[test]
    fn test_prune_greater_than_caps_max() {
        let pruned = int_stats()
            .pruned(45, PredicateCondition::GreaterThan, &Value::Int32(40), None)
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.row_count, 55.0);
        assert_eq!(pruned.null_count, 10.0);
        assert_eq!(pruned.distinct_count, 45.0 * 45.0 / 90.0);
        assert_eq!(pruned.min, Some(Value::Int32(0)));
        assert_eq!(pruned.max, Some(Value::Int32(40)));
    }

    #[test]
    fn test_prune_less_than_raises_min() {
        let pruned = int_stats()
            .pruned(20, PredicateCondition::LessThanEquals, &Value::Int64(20), None)
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.min, Some(Value::Int64(20)));
        assert_eq!(pruned.max, Some(Value::Int32(90)));
    }

    #[test]
    fn test_bound_outside_range_keeps_range() {
        let pruned = int_stats()
            .pruned(0, PredicateCondition::GreaterThan, &Value::Int32(500), None)
            .unwrap();
        assert_eq!(downcast(&pruned).max, Some(Value::Int32(90)));
    }

    #[test]
    fn test_prune_null_checks() {
        let pruned = int_stats()
            .pruned(10, PredicateCondition::IsNull, &Value::Null, None)
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.null_count, 0.0);
        assert_eq!(pruned.distinct_count, 45.0);

        let pruned = int_stats()
            .pruned(90, PredicateCondition::IsNotNull, &Value::Null, None)
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.row_count, 10.0);
        assert_eq!(pruned.null_count, 10.0);
        assert_eq!(pruned.distinct_count, 0.0);
        assert_eq!(pruned.min, None);
    }

    #[test]
    fn test_prune_between_at_range_end() {
        let pruned = int_stats()
            .pruned(
                30,
                PredicateCondition::BetweenInclusive,
                &Value::Int32(60),
                Some(&Value::Int32(100)),
            )
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.min, Some(Value::Int32(0)));
        assert_eq!(pruned.max, Some(Value::Int32(60)));

        // A slice in the middle leaves both ends
        let pruned = int_stats()
            .pruned(
                10,
                PredicateCondition::BetweenExclusive,
                &Value::Int32(30),
                Some(&Value::Int32(40)),
            )
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.min, Some(Value::Int32(0)));
        assert_eq!(pruned.max, Some(Value::Int32(90)));
    }

    #[test]
    fn test_prune_exclusive_between_keeps_range_end() {
        // (0, 50] leaves the rows equal to 0
        let pruned = int_stats()
            .pruned(
                40,
                PredicateCondition::BetweenLowerExclusive,
                &Value::Int32(0),
                Some(&Value::Int32(50)),
            )
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.min, Some(Value::Int32(0)));
        assert_eq!(pruned.max, Some(Value::Int32(90)));

        // [40, 90) leaves the rows equal to 90
        let pruned = int_stats()
            .pruned(
                40,
                PredicateCondition::BetweenUpperExclusive,
                &Value::Int32(40),
                Some(&Value::Int32(90)),
            )
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.min, Some(Value::Int32(0)));
        assert_eq!(pruned.max, Some(Value::Int32(90)));

        // (0, 90) leaves both ends
        let pruned = int_stats()
            .pruned(
                60,
                PredicateCondition::BetweenExclusive,
                &Value::Int32(0),
                Some(&Value::Int32(90)),
            )
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.min, Some(Value::Int32(0)));
        assert_eq!(pruned.max, Some(Value::Int32(90)));
    }

    #[test]
    fn test_prune_exclusive_between_past_range_end() {
        // (-1, 50) reaches below the minimum
        let pruned = int_stats()
            .pruned(
                40,
                PredicateCondition::BetweenExclusive,
                &Value::Int32(-1),
                Some(&Value::Int32(50)),
            )
            .unwrap();
        let pruned = downcast(&pruned);
        assert_eq!(pruned.min, Some(Value::Int32(50)));
        assert_eq!(pruned.max, Some(Value::Int32(90)));

        // [0, 90] covers everything
        let pruned = int_stats()
            .pruned(
                50,
                PredicateCondition::BetweenInclusive,
                &Value::Int32(0),
                Some(&Value::Int32(90)),
            )
            .unwrap();
        assert_eq!(downcast(&pruned).min, None);
    }

    #[test]
    fn test_distinct_count_never_below_one() {
        let pruned = int_stats()
            .pruned(89, PredicateCondition::GreaterThan, &Value::Int32(0), None)
            .unwrap();
        assert_eq!(pruned.distinct_count(), Some(1.0));
    }

    #[test]
    fn test_registry_refine_and_fallback() {
        let mut registry = StatisticsRegistry::new();
        registry.register_table(
            "orders",
            vec![
                Arc::new(int_stats()),
                Arc::new(DistinctValueCount::new(DataType::String, 12.0)),
            ],
        );

        let refined = registry
            .refine("orders", 0, 45, PredicateCondition::GreaterThan, &Value::Int32(40), None)
            .unwrap();
        assert!(refined);
        let column = registry.get("orders", 0).unwrap();
        assert_eq!(downcast(&column).max, Some(Value::Int32(40)));

        let refined = registry
            .refine("orders", 1, 3, PredicateCondition::Equals, &Value::string("x"), None)
            .unwrap();
        assert!(!refined);
        assert_eq!(registry.get("orders", 1).unwrap().distinct_count(), Some(12.0));
    }

    #[test]
    fn test_registry_unknown_entries() {
        let registry = StatisticsRegistry::new();
        assert_eq!(
            registry.get("missing", 0).unwrap_err(),
            LqpError::UnknownTable("missing".to_string())
        );

        let mut registry = StatisticsRegistry::new();
        registry.register_table("t", Vec::new());
        assert!(matches!(
            registry.get("t", 0),
            Err(LqpError::UnknownColumn { column_id: 0, .. })
        ));
    }
}
