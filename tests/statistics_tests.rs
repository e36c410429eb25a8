//! Statistics pruning through the registry, including the unsupported
//! fallback.

use planlayer::statistics::DistinctValueCount;
use planlayer::{
    AttributeStatistics, ColumnStatistics, DataType, LqpError, PredicateCondition, PruningError,
    StatisticsRegistry, Value,
};
use std::sync::Arc;

fn column_stats(registry: &StatisticsRegistry, column_id: u16) -> ColumnStatistics {
    registry
        .get("lineitem", column_id)
        .unwrap()
        .as_any()
        .downcast_ref::<ColumnStatistics>()
        .unwrap()
        .clone()
}

fn registry() -> StatisticsRegistry {
    let mut registry = StatisticsRegistry::new();
    registry.register_table(
        "lineitem",
        vec![
            Arc::new(
                ColumnStatistics::new(DataType::Float64, 1000.0, 0.0, 500.0)
                    .with_range(Value::Float64(0.0), Value::Float64(1000.0)),
            ),
            Arc::new(
                ColumnStatistics::new(DataType::String, 1000.0, 100.0, 30.0)
                    .with_range(Value::string("AIR"), Value::string("TRUCK")),
            ),
            Arc::new(DistinctValueCount::new(DataType::Int32, 7.0)),
        ],
    );
    registry
}

#[test]
fn test_refinements_accumulate() {
    let mut registry = registry();
    assert!(registry
        .refine("lineitem", 0, 500, PredicateCondition::GreaterThan, &Value::Float64(500.0), None)
        .unwrap());
    assert!(registry
        .refine("lineitem", 0, 100, PredicateCondition::LessThan, &Value::Int32(100), None)
        .unwrap());

    let stats = column_stats(&registry, 0);
    assert_eq!(stats.row_count, 400.0);
    assert_eq!(stats.min, Some(Value::Int32(100)));
    assert_eq!(stats.max, Some(Value::Float64(500.0)));
    assert_eq!(stats.distinct_count, 200.0);
}

#[test]
fn test_string_ranges_tighten() {
    let mut registry = registry();
    registry
        .refine("lineitem", 1, 300, PredicateCondition::GreaterThanEquals, &Value::string("RAIL"), None)
        .unwrap();
    let stats = column_stats(&registry, 1);
    assert_eq!(stats.max, Some(Value::string("RAIL")));
    assert_eq!(stats.null_count, 100.0);
}

#[test]
fn test_mismatched_bound_type_keeps_range() {
    let mut registry = registry();
    registry
        .refine("lineitem", 1, 10, PredicateCondition::LessThan, &Value::Int32(3), None)
        .unwrap();
    assert_eq!(column_stats(&registry, 1).min, Some(Value::string("AIR")));
}

#[test]
fn test_unsupported_pruning_keeps_original() {
    let mut registry = registry();
    let before = registry.get("lineitem", 2).unwrap();
    let refined = registry
        .refine("lineitem", 2, 1, PredicateCondition::Equals, &Value::Int32(3), None)
        .unwrap();
    assert!(!refined);
    assert!(Arc::ptr_eq(&before, &registry.get("lineitem", 2).unwrap()));
}

#[test]
fn test_pruning_error_is_distinct_from_usage_errors() {
    let stats = DistinctValueCount::new(DataType::String, 3.0);
    let err = stats
        .pruned(1, PredicateCondition::Like, &Value::string("a%"), None)
        .unwrap_err();
    assert_eq!(
        err,
        PruningError::NotSupported {
            data_type: DataType::String
        }
    );
    assert!(err.to_string().contains("not yet been implemented"));

    let mut registry = registry();
    assert_eq!(
        registry
            .refine("lineitem", 9, 1, PredicateCondition::Equals, &Value::Int32(1), None)
            .unwrap_err(),
        LqpError::UnknownColumn {
            table: "lineitem".to_string(),
            column_id: 9
        }
    );
}
