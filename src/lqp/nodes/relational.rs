//! Query operators.
//!
//! Predicate, Sort and Limit pass their left input's columns through
//! unchanged. Projection and Join build a new column list; Union takes
//! the left input's layout and widens nullability over both sides.

use crate::error::{LqpError, LqpResult};
use crate::expression::Expression;
use crate::lqp::deep::NodeMapping;
use crate::lqp::node::{
    check_column_id, hash_of, LqpNode, LqpNodeRef, ShallowNode, UniqueColumnCombinations,
};
use crate::types::{is_semi_or_anti_join, ColumnId, DescriptionMode, JoinMode, SetOperationMode, SortMode};

fn forward_unique_column_combinations(node: &LqpNode) -> UniqueColumnCombinations {
    node.left_input()
        .map(|input| input.unique_column_combinations())
        .unwrap_or_default()
}

fn required_input(node: &LqpNode, input: Option<LqpNodeRef>, side: &str) -> LqpResult<LqpNodeRef> {
    input.ok_or_else(|| {
        LqpError::InvalidPlan(format!(
            "{} has no {side} input",
            node.description(DescriptionMode::Short)
        ))
    })
}

/// Filters its input's rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateNode {
    pub predicate: Expression,
}

impl PredicateNode {
    pub fn new(predicate: Expression) -> Self {
        PredicateNode { predicate }
    }

    pub fn make(predicate: Expression, input: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(predicate), Some(input), None)
    }
}

impl ShallowNode for PredicateNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        format!("[Predicate] {}", self.predicate)
    }

    fn unique_column_combinations(&self, node: &LqpNode) -> UniqueColumnCombinations {
        forward_unique_column_combinations(node)
    }

    fn shallow_hash(&self) -> u64 {
        hash_of(&self.predicate)
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// Computes a new column list from its input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionNode {
    pub expressions: Vec<Expression>,
}

impl ProjectionNode {
    pub fn new(expressions: Vec<Expression>) -> Self {
        ProjectionNode { expressions }
    }

    pub fn make(expressions: Vec<Expression>, input: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(expressions), Some(input), None)
    }
}

impl ShallowNode for ProjectionNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        let expressions: Vec<String> = self.expressions.iter().map(ToString::to_string).collect();
        format!("[Projection] {}", expressions.join(", "))
    }

    fn output_expressions(&self, _node: &LqpNode) -> Vec<Expression> {
        self.expressions.clone()
    }

    fn is_column_nullable(&self, node: &LqpNode, column_id: ColumnId) -> LqpResult<bool> {
        let index = check_column_id(
            || self.description(DescriptionMode::Short),
            column_id,
            self.expressions.len(),
        )?;
        let expression = &self.expressions[index];

        // A forwarded column keeps whatever nullability the input reports,
        // which can be wider than the column's schema (outer joins).
        if let Some(input) = node.left_input() {
            if let Some(input_column) = input.find_column_id(expression) {
                return input.is_column_nullable(input_column);
            }
        }
        Ok(expression.is_nullable())
    }

    fn unique_column_combinations(&self, node: &LqpNode) -> UniqueColumnCombinations {
        let Some(input) = node.left_input() else {
            return UniqueColumnCombinations::new();
        };
        let input_outputs = input.output_expressions();

        // Keep a combination only if every column survives the projection
        input
            .unique_column_combinations()
            .into_iter()
            .filter_map(|combination| {
                combination
                    .iter()
                    .map(|&input_column| {
                        let expression = input_outputs.get(usize::from(input_column))?;
                        let position = self.expressions.iter().position(|e| e == expression)?;
                        ColumnId::try_from(position).ok()
                    })
                    .collect::<Option<_>>()
            })
            .collect()
    }

    fn shallow_hash(&self) -> u64 {
        hash_of(&self.expressions)
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self.expressions == rhs.expressions
    }
}

/// Combines two inputs.
///
/// Output is the left input's columns followed by the right input's, except
/// for semi and anti joins, which only emit the left side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinNode {
    pub join_mode: JoinMode,
    /// Conjunction of join conditions; empty for cross joins
    pub join_predicates: Vec<Expression>,
}

impl JoinNode {
    pub fn new(join_mode: JoinMode, join_predicates: Vec<Expression>) -> Self {
        JoinNode {
            join_mode,
            join_predicates,
        }
    }

    pub fn make(
        join_mode: JoinMode,
        join_predicates: Vec<Expression>,
        left: LqpNodeRef,
        right: LqpNodeRef,
    ) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(join_mode, join_predicates), Some(left), Some(right))
    }

    pub fn cross(left: LqpNodeRef, right: LqpNodeRef) -> LqpNodeRef {
        Self::make(JoinMode::Cross, Vec::new(), left, right)
    }
}

impl ShallowNode for JoinNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        let mut description = format!("[Join] Mode: {}", self.join_mode);
        if !self.join_predicates.is_empty() {
            let predicates: Vec<String> =
                self.join_predicates.iter().map(ToString::to_string).collect();
            description.push_str(&format!(" [{}]", predicates.join(" AND ")));
        }
        description
    }

    fn output_expressions(&self, node: &LqpNode) -> Vec<Expression> {
        let mut outputs = node
            .left_input()
            .map(|input| input.output_expressions())
            .unwrap_or_default();
        if !is_semi_or_anti_join(self.join_mode) {
            if let Some(right) = node.right_input() {
                outputs.extend(right.output_expressions());
            }
        }
        outputs
    }

    fn is_column_nullable(&self, node: &LqpNode, column_id: ColumnId) -> LqpResult<bool> {
        let left = required_input(node, node.left_input(), "left")?;
        let left_count = left.column_count();
        if is_semi_or_anti_join(self.join_mode) {
            check_column_id(|| self.description(DescriptionMode::Short), column_id, left_count)?;
            return left.is_column_nullable(column_id);
        }

        let right = required_input(node, node.right_input(), "right")?;
        let index = check_column_id(
            || self.description(DescriptionMode::Short),
            column_id,
            left_count + right.column_count(),
        )?;

        if index < left_count {
            let padded = matches!(self.join_mode, JoinMode::Right | JoinMode::FullOuter);
            Ok(padded || left.is_column_nullable(column_id)?)
        } else {
            let padded = matches!(self.join_mode, JoinMode::Left | JoinMode::FullOuter);
            // index - left_count < right's column count, which fit a ColumnId
            let right_column = ColumnId::try_from(index - left_count)
                .map_err(|_| LqpError::InvalidPlan("join output too wide".to_string()))?;
            Ok(padded || right.is_column_nullable(right_column)?)
        }
    }

    fn unique_column_combinations(&self, node: &LqpNode) -> UniqueColumnCombinations {
        // Semi and anti joins only drop rows of the left input
        if is_semi_or_anti_join(self.join_mode) {
            forward_unique_column_combinations(node)
        } else {
            UniqueColumnCombinations::new()
        }
    }

    fn shallow_hash(&self) -> u64 {
        hash_of(&(self.join_mode, &self.join_predicates))
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// Orders its input's rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortNode {
    pub order_by: Vec<(Expression, SortMode)>,
}

impl SortNode {
    pub fn new(order_by: Vec<(Expression, SortMode)>) -> Self {
        SortNode { order_by }
    }

    pub fn make(order_by: Vec<(Expression, SortMode)>, input: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(order_by), Some(input), None)
    }
}

impl ShallowNode for SortNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        let keys: Vec<String> = self
            .order_by
            .iter()
            .map(|(expression, mode)| format!("{expression} ({mode})"))
            .collect();
        format!("[Sort] {}", keys.join(", "))
    }

    fn unique_column_combinations(&self, node: &LqpNode) -> UniqueColumnCombinations {
        forward_unique_column_combinations(node)
    }

    fn shallow_hash(&self) -> u64 {
        hash_of(&self.order_by)
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LimitNode {
    pub row_count: u64,
}

impl LimitNode {
    pub fn new(row_count: u64) -> Self {
        LimitNode { row_count }
    }

    pub fn make(row_count: u64, input: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(row_count), Some(input), None)
    }
}

impl ShallowNode for LimitNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        format!("[Limit] {}", self.row_count)
    }

    fn unique_column_combinations(&self, node: &LqpNode) -> UniqueColumnCombinations {
        forward_unique_column_combinations(node)
    }

    fn shallow_hash(&self) -> u64 {
        hash_of(&self.row_count)
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// Set union of two inputs with the same column layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnionNode {
    pub set_operation_mode: SetOperationMode,
}

impl UnionNode {
    pub fn new(set_operation_mode: SetOperationMode) -> Self {
        UnionNode { set_operation_mode }
    }

    pub fn make(set_operation_mode: SetOperationMode, left: LqpNodeRef, right: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(set_operation_mode), Some(left), Some(right))
    }
}

impl ShallowNode for UnionNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        format!("[UnionNode] Mode: {}", self.set_operation_mode)
    }

    fn is_column_nullable(&self, node: &LqpNode, column_id: ColumnId) -> LqpResult<bool> {
        let left = required_input(node, node.left_input(), "left")?;
        let right = required_input(node, node.right_input(), "right")?;
        Ok(left.is_column_nullable(column_id)? || right.is_column_nullable(column_id)?)
    }

    fn shallow_hash(&self) -> u64 {
        hash_of(&self.set_operation_mode)
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}
