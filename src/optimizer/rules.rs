//! Predicate rewrite rules.

use super::{rewrite_bottom_up, OptimizerRule};
use crate::error::LqpResult;
use crate::expression::{ColumnExpression, Expression};
use crate::lqp::node::{LqpNode, LqpNodeKind, LqpNodeRef};
use crate::lqp::nodes::PredicateNode;
use crate::types::{
    conditions_to_between, is_binary_numeric_predicate_condition, PredicateCondition,
};
use crate::value::Value;

/// Puts the column on the left of a column/literal comparison.
///
/// `5 < a` becomes `a > 5`, so later rules and statistics only have to
/// handle one orientation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateNormalizationRule;

impl PredicateNormalizationRule {
    fn normalize(predicate: &Expression) -> LqpResult<Option<Expression>> {
        let Some(predicate) = predicate.as_predicate() else {
            return Ok(None);
        };
        if !is_binary_numeric_predicate_condition(predicate.condition()) {
            return Ok(None);
        }
        let literal_first = matches!(
            predicate.arguments(),
            [Expression::Value(_), Expression::Column(_)]
        );
        if !literal_first {
            return Ok(None);
        }
        Ok(Some(Expression::Predicate(predicate.flipped()?)))
    }
}

impl OptimizerRule for PredicateNormalizationRule {
    fn name(&self) -> &'static str {
        "PredicateNormalization"
    }

    fn apply_to_plan(&self, root: LqpNodeRef) -> LqpResult<LqpNodeRef> {
        rewrite_bottom_up(&root, |node| {
            let LqpNodeKind::Predicate(predicate_node) = node.kind() else {
                return Ok(None);
            };
            let Some(normalized) = Self::normalize(&predicate_node.predicate)? else {
                return Ok(None);
            };
            tracing::debug!(
                rule = self.name(),
                from = %predicate_node.predicate,
                to = %normalized,
                "normalized predicate"
            );
            Ok(Some(LqpNode::with_inputs(
                PredicateNode::new(normalized),
                node.left_input(),
                None,
            )))
        })
    }
}

/// Merges a lower and an upper bound on the same column, stacked as two
/// predicate nodes, into one between predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetweenCompositionRule;

/// `column <op> value` with a range comparison
struct RangeBound<'a> {
    column: &'a ColumnExpression,
    condition: PredicateCondition,
    value: &'a Value,
}

impl<'a> RangeBound<'a> {
    fn from_expression(expression: &'a Expression) -> Option<Self> {
        let predicate = expression.as_predicate()?;
        if !matches!(
            predicate.condition(),
            PredicateCondition::LessThan
                | PredicateCondition::LessThanEquals
                | PredicateCondition::GreaterThan
                | PredicateCondition::GreaterThanEquals
        ) {
            return None;
        }
        Some(RangeBound {
            column: predicate.arguments().first()?.as_column()?,
            condition: predicate.condition(),
            value: predicate.arguments().get(1)?.as_value()?,
        })
    }

    fn is_lower(&self) -> bool {
        matches!(
            self.condition,
            PredicateCondition::GreaterThan | PredicateCondition::GreaterThanEquals
        )
    }
}

impl BetweenCompositionRule {
    fn compose(outer: &LqpNodeRef) -> LqpResult<Option<LqpNodeRef>> {
        let LqpNodeKind::Predicate(outer_predicate) = outer.kind() else {
            return Ok(None);
        };
        let Some(input) = outer.left_input() else {
            return Ok(None);
        };
        let LqpNodeKind::Predicate(inner_predicate) = input.kind() else {
            return Ok(None);
        };
        let (Some(a), Some(b)) = (
            RangeBound::from_expression(&outer_predicate.predicate),
            RangeBound::from_expression(&inner_predicate.predicate),
        ) else {
            return Ok(None);
        };
        if a.column != b.column {
            return Ok(None);
        }
        let (lower, upper) = match (a.is_lower(), b.is_lower()) {
            (true, false) => (a, b),
            (false, true) => (b, a),
            _ => return Ok(None),
        };

        let condition = conditions_to_between(lower.condition, upper.condition)?;
        let between = Expression::between(
            condition,
            Expression::Column(lower.column.clone()),
            Expression::Value(lower.value.clone()),
            Expression::Value(upper.value.clone()),
        )?;
        tracing::debug!(rule = "BetweenComposition", predicate = %between, "composed between");
        Ok(Some(LqpNode::with_inputs(
            PredicateNode::new(between),
            input.left_input(),
            None,
        )))
    }
}

impl OptimizerRule for BetweenCompositionRule {
    fn name(&self) -> &'static str {
        "BetweenComposition"
    }

    fn apply_to_plan(&self, root: LqpNodeRef) -> LqpResult<LqpNodeRef> {
        rewrite_bottom_up(&root, Self::compose)
    }
}
