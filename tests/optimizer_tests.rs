//! Optimizer driver tests: rule application, fixpoint detection, iteration
//! limits and custom rules.

use planlayer::config::OptimizerConfig;
use planlayer::lqp::nodes::{ColumnDefinition, LimitNode, PredicateNode, StoredTableNode};
use planlayer::lqp::{
    lqp_deep_copy, lqp_deep_equals, lqp_find_nodes_by_type, LqpNode, LqpNodeKind, LqpNodeRef,
};
use planlayer::{
    DataType, DescriptionMode, Expression, LqpNodeType, LqpResult, Optimizer, OptimizerRule,
    PredicateCondition,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn scan() -> LqpNodeRef {
    StoredTableNode::make(
        "events",
        vec![
            ColumnDefinition::new("ts", DataType::Int64, false),
            ColumnDefinition::new("kind", DataType::String, true),
        ],
    )
}

fn ts() -> Expression {
    Expression::column("events", 0, "ts", DataType::Int64, false)
}

fn compare(condition: PredicateCondition, left: Expression, right: Expression) -> Expression {
    Expression::binary(condition, left, right).unwrap()
}

/// `100 <= ts` below `ts < 200`: needs normalization before composition
fn window_plan() -> LqpNodeRef {
    let lower = PredicateNode::make(
        compare(PredicateCondition::LessThanEquals, Expression::value(100_i64), ts()),
        scan(),
    );
    PredicateNode::make(
        compare(PredicateCondition::LessThan, ts(), Expression::value(200_i64)),
        lower,
    )
}

#[test]
fn test_rules_combine_to_between() {
    let optimized = Optimizer::new().optimize(&window_plan()).unwrap();
    let predicates = lqp_find_nodes_by_type(&optimized, LqpNodeType::Predicate);
    assert_eq!(predicates.len(), 1);
    assert_eq!(
        optimized.description(DescriptionMode::Short),
        "[Predicate] ts BETWEEN UPPER EXCLUSIVE 100 AND 200"
    );
}

#[test]
fn test_disabled_rules_leave_plan_alone() {
    let config = OptimizerConfig {
        max_iterations: 10,
        enable_predicate_normalization: false,
        enable_between_composition: false,
    };
    let plan = window_plan();
    let optimized = Optimizer::from_config(&config).optimize(&plan).unwrap();
    assert!(lqp_deep_equals(&plan, &optimized));
}

#[test]
fn test_composition_alone_cannot_merge_unnormalized_bounds() {
    let config = OptimizerConfig {
        max_iterations: 10,
        enable_predicate_normalization: false,
        enable_between_composition: true,
    };
    let optimized = Optimizer::from_config(&config).optimize(&window_plan()).unwrap();
    assert_eq!(
        lqp_find_nodes_by_type(&optimized, LqpNodeType::Predicate).len(),
        2
    );
}

#[test]
fn test_input_plan_is_untouched() {
    let plan = window_plan();
    let before = lqp_deep_copy(&plan);
    let _ = Optimizer::new().optimize(&plan).unwrap();
    assert!(lqp_deep_equals(&plan, &before));
}

/// Wraps the root in another Limit on every pass; never converges
struct GrowingRule {
    applications: Arc<AtomicUsize>,
}

impl OptimizerRule for GrowingRule {
    fn name(&self) -> &'static str {
        "Growing"
    }

    fn apply_to_plan(&self, root: LqpNodeRef) -> LqpResult<LqpNodeRef> {
        self.applications.fetch_add(1, Ordering::SeqCst);
        Ok(LimitNode::make(1, root))
    }
}

#[test]
fn test_max_iterations_bounds_passes() {
    let applications = Arc::new(AtomicUsize::new(0));
    let mut optimizer = Optimizer::empty(3);
    optimizer.add_rule(Box::new(GrowingRule {
        applications: Arc::clone(&applications),
    }));

    let optimized = optimizer.optimize(&scan()).unwrap();
    assert_eq!(applications.load(Ordering::SeqCst), 3);
    assert_eq!(lqp_find_nodes_by_type(&optimized, LqpNodeType::Limit).len(), 3);
}

/// Counts passes without changing anything
struct CountingRule {
    applications: Arc<AtomicUsize>,
}

impl OptimizerRule for CountingRule {
    fn name(&self) -> &'static str {
        "Counting"
    }

    fn apply_to_plan(&self, root: LqpNodeRef) -> LqpResult<LqpNodeRef> {
        self.applications.fetch_add(1, Ordering::SeqCst);
        Ok(root)
    }
}

#[test]
fn test_fixpoint_stops_after_first_unchanged_pass() {
    let applications = Arc::new(AtomicUsize::new(0));
    let mut optimizer = Optimizer::empty(10);
    optimizer.add_rule(Box::new(CountingRule {
        applications: Arc::clone(&applications),
    }));
    optimizer.optimize(&window_plan()).unwrap();
    assert_eq!(applications.load(Ordering::SeqCst), 1);
}

/// Replaces the root by a structurally identical fresh node: the plan is
/// new by identity but unchanged by structure, so this is a fixpoint.
struct RebuildRootRule;

impl OptimizerRule for RebuildRootRule {
    fn name(&self) -> &'static str {
        "RebuildRoot"
    }

    fn apply_to_plan(&self, root: LqpNodeRef) -> LqpResult<LqpNodeRef> {
        let LqpNodeKind::Limit(limit) = root.kind() else {
            return Ok(root);
        };
        Ok(LqpNode::with_inputs(*limit, root.left_input(), None))
    }
}

#[test]
fn test_fixpoint_is_structural() {
    let mut optimizer = Optimizer::empty(10);
    optimizer.add_rule(Box::new(RebuildRootRule));
    let plan = LimitNode::make(5, scan());
    let optimized = optimizer.optimize(&plan).unwrap();
    assert!(lqp_deep_equals(&plan, &optimized));
}
