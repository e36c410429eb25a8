//! # Plan Optimizer
//!
//! Rewrite rules applied to fixpoint:
//!
//! - Predicate normalization: `5 < a` -> `a > 5`
//! - Between composition: `Predicate(Predicate(x, a >= 1), a < 9)` ->
//!   `Predicate(x, a BETWEEN UPPER EXCLUSIVE 1 AND 9)`
//!
//! ```text
//! LqpNode (from translation) -> [deep copy] -> [rules]* -> optimized LqpNode
//! ```
//!
//! The caller's plan is never touched: the optimizer works on a deep copy and
//! is the only writer of that copy. After every pass the plan is compared
//! with a snapshot taken before the pass; deep hash pre-screens, deep equals
//! confirms.

mod rules;

pub use rules::{BetweenCompositionRule, PredicateNormalizationRule};

use crate::config::OptimizerConfig;
use crate::error::LqpResult;
use crate::lqp::deep::{lqp_deep_copy, lqp_deep_equals, lqp_hash};
use crate::lqp::node::{InputSide, LqpNodeRef, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A plan-to-plan rewrite.
///
/// Rules may rewire inputs of the plan they are given, and return the
/// (possibly new) root.
pub trait OptimizerRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply_to_plan(&self, root: LqpNodeRef) -> LqpResult<LqpNodeRef>;
}

/// Rule driver with fixpoint iteration
pub struct Optimizer {
    rules: Vec<Box<dyn OptimizerRule>>,
    /// Maximum number of optimization passes
    max_iterations: usize,
}

impl Optimizer {
    /// Optimizer with all rules enabled and default max iterations
    pub fn new() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        let mut optimizer = Optimizer {
            rules: Vec::new(),
            max_iterations: config.max_iterations,
        };
        if config.enable_predicate_normalization {
            optimizer.add_rule(Box::new(PredicateNormalizationRule));
        }
        if config.enable_between_composition {
            optimizer.add_rule(Box::new(BetweenCompositionRule));
        }
        optimizer
    }

    /// Optimizer without rules
    pub fn empty(max_iterations: usize) -> Self {
        Optimizer {
            rules: Vec::new(),
            max_iterations,
        }
    }

    pub fn add_rule(&mut self, rule: Box<dyn OptimizerRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Optimize a plan to fixpoint
    ///
    /// Applies all rules per pass until a pass leaves the plan deep-equal to
    /// its predecessor or `max_iterations` passes have run.
    pub fn optimize(&self, plan: &LqpNodeRef) -> LqpResult<LqpNodeRef> {
        let mut current = lqp_deep_copy(plan);

        for iteration in 0..self.max_iterations {
            let snapshot = lqp_deep_copy(&current);
            let snapshot_hash = lqp_hash(&snapshot);

            for rule in &self.rules {
                current = rule.apply_to_plan(current)?;
            }

            if lqp_hash(&current) == snapshot_hash && lqp_deep_equals(&current, &snapshot) {
                tracing::debug!(iteration, "optimizer reached fixpoint");
                return Ok(current);
            }
        }

        tracing::debug!(
            max_iterations = self.max_iterations,
            "optimizer stopped without reaching fixpoint"
        );
        Ok(current)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite a plan bottom-up.
///
/// `rewrite` sees every node once, after its inputs have been rewritten, and
/// returns a replacement or `None` to keep the node. A shared node's
/// replacement is installed under all of its parents.
pub(crate) fn rewrite_bottom_up<F>(root: &LqpNodeRef, mut rewrite: F) -> LqpResult<LqpNodeRef>
where
    F: FnMut(&LqpNodeRef) -> LqpResult<Option<LqpNodeRef>>,
{
    let mut rewritten = HashMap::new();
    rewrite_node(root, &mut rewrite, &mut rewritten)
}

fn rewrite_node<F>(
    node: &LqpNodeRef,
    rewrite: &mut F,
    rewritten: &mut HashMap<NodeId, LqpNodeRef>,
) -> LqpResult<LqpNodeRef>
where
    F: FnMut(&LqpNodeRef) -> LqpResult<Option<LqpNodeRef>>,
{
    if let Some(result) = rewritten.get(&node.id()) {
        return Ok(Arc::clone(result));
    }

    for side in [InputSide::Left, InputSide::Right] {
        if let Some(input) = node.input(side) {
            let new_input = rewrite_node(&input, rewrite, rewritten)?;
            if !Arc::ptr_eq(&new_input, &input) {
                node.set_input(side, Some(new_input));
            }
        }
    }

    let result = rewrite(node)?.unwrap_or_else(|| Arc::clone(node));
    rewritten.insert(node.id(), Arc::clone(&result));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::lqp::nodes::{ColumnDefinition, LimitNode, PredicateNode, StoredTableNode};
    use crate::types::{DescriptionMode, PredicateCondition};
    use crate::value::DataType;

    fn table() -> LqpNodeRef {
        StoredTableNode::make("t", vec![ColumnDefinition::new("a", DataType::Int32, false)])
    }

    fn column_a() -> Expression {
        Expression::column("t", 0, "a", DataType::Int32, false)
    }

    #[test]
    fn test_from_config_selects_rules() {
        assert_eq!(
            Optimizer::new().rule_names(),
            vec!["PredicateNormalization", "BetweenComposition"]
        );

        let config = OptimizerConfig {
            max_iterations: 4,
            enable_predicate_normalization: false,
            enable_between_composition: true,
        };
        let optimizer = Optimizer::from_config(&config);
        assert_eq!(optimizer.rule_names(), vec!["BetweenComposition"]);
        assert_eq!(optimizer.max_iterations(), 4);
    }

    #[test]
    fn test_optimize_does_not_mutate_input() {
        let predicate =
            Expression::binary(PredicateCondition::LessThan, Expression::value(5), column_a())
                .unwrap();
        let plan = LimitNode::make(3, PredicateNode::make(predicate, table()));
        let before = lqp_deep_copy(&plan);

        let optimized = Optimizer::new().optimize(&plan).unwrap();
        assert!(lqp_deep_equals(&plan, &before));
        assert!(!lqp_deep_equals(&plan, &optimized));
        assert_eq!(
            optimized.left_input().unwrap().description(DescriptionMode::Short),
            "[Predicate] a > 5"
        );
    }

    #[test]
    fn test_optimize_without_rules_is_a_copy() {
        let plan = LimitNode::make(3, table());
        let optimized = Optimizer::empty(10).optimize(&plan).unwrap();
        assert!(!Arc::ptr_eq(&plan, &optimized));
        assert!(lqp_deep_equals(&plan, &optimized));
    }

    #[test]
    fn test_rewrite_bottom_up_visits_shared_node_once() {
        let source = table();
        let plan = crate::lqp::nodes::JoinNode::cross(Arc::clone(&source), Arc::clone(&source));
        let mut calls = 0;
        let replacement = table();
        let result = rewrite_bottom_up(&plan, |node| {
            calls += 1;
            if Arc::ptr_eq(node, &source) {
                Ok(Some(Arc::clone(&replacement)))
            } else {
                Ok(None)
            }
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert!(Arc::ptr_eq(&result, &plan));
        assert!(Arc::ptr_eq(&plan.left_input().unwrap(), &replacement));
        assert!(Arc::ptr_eq(&plan.right_input().unwrap(), &replacement));
    }
}
