//! Expressions produced and consumed by plan nodes.
//!
//! Column references are value-based: a column is identified by the table it
//! was read from and its position there, together with the schema facts
//! (name, type, nullability) that the translation stage supplies when it
//! builds the stored-table node.

use crate::error::{LqpError, LqpResult};
use crate::types::{
    flip_predicate_condition, inverse_predicate_condition, is_between_predicate_condition,
    is_binary_predicate_condition, ColumnId, PredicateCondition,
};
use crate::value::{DataType, Value};
use std::fmt;

/// Reference to a column of a stored table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpression {
    pub table_name: String,
    pub column_id: ColumnId,
    pub column_name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

/// A condition applied to its arguments.
///
/// Argument layout by condition:
/// - binary conditions: `[left, right]` (`In`/`NotIn`: `[value, List]`)
/// - between conditions: `[value, lower, upper]`
/// - `IsNull`/`IsNotNull`: `[operand]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateExpression {
    condition: PredicateCondition,
    arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Column(ColumnExpression),
    Value(Value),
    Predicate(PredicateExpression),
    List(Vec<Expression>),
}

impl PredicateExpression {
    /// Build a predicate, checking the argument count against the condition
    pub fn new(condition: PredicateCondition, arguments: Vec<Expression>) -> LqpResult<Self> {
        let expected = expected_arity(condition);
        if arguments.len() != expected {
            return Err(LqpError::InvalidPlan(format!(
                "{condition} expects {expected} arguments, got {}",
                arguments.len()
            )));
        }
        if matches!(condition, PredicateCondition::In | PredicateCondition::NotIn)
            && !matches!(arguments[1], Expression::List(_))
        {
            return Err(LqpError::InvalidPlan(format!(
                "{condition} expects a list as its second argument"
            )));
        }
        Ok(PredicateExpression {
            condition,
            arguments,
        })
    }

    pub fn condition(&self) -> PredicateCondition {
        self.condition
    }

    /// Arguments in the layout documented on the type
    pub fn arguments(&self) -> &[Expression] {
        &self.arguments
    }

    /// Swap the operands of a binary comparison, adjusting the condition
    pub fn flipped(&self) -> LqpResult<Self> {
        let condition = flip_predicate_condition(self.condition)?;
        let mut arguments = self.arguments.clone();
        arguments.reverse();
        Ok(PredicateExpression {
            condition,
            arguments,
        })
    }

    /// Logical negation with the same operands
    pub fn inverse(&self) -> LqpResult<Self> {
        Ok(PredicateExpression {
            condition: inverse_predicate_condition(self.condition)?,
            arguments: self.arguments.clone(),
        })
    }
}

fn expected_arity(condition: PredicateCondition) -> usize {
    if is_binary_predicate_condition(condition) {
        2
    } else if is_between_predicate_condition(condition) {
        3
    } else {
        1
    }
}

impl Expression {
    pub fn column(
        table_name: &str,
        column_id: ColumnId,
        column_name: &str,
        data_type: DataType,
        nullable: bool,
    ) -> Self {
        Expression::Column(ColumnExpression {
            table_name: table_name.to_string(),
            column_id,
            column_name: column_name.to_string(),
            data_type,
            nullable,
        })
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Expression::Value(value.into())
    }

    /// `left <condition> right`
    pub fn binary(
        condition: PredicateCondition,
        left: Expression,
        right: Expression,
    ) -> LqpResult<Self> {
        PredicateExpression::new(condition, vec![left, right]).map(Expression::Predicate)
    }

    /// `value <between-condition> lower AND upper`
    pub fn between(
        condition: PredicateCondition,
        value: Expression,
        lower: Expression,
        upper: Expression,
    ) -> LqpResult<Self> {
        PredicateExpression::new(condition, vec![value, lower, upper]).map(Expression::Predicate)
    }

    /// `operand IS [NOT] NULL`
    pub fn null_check(condition: PredicateCondition, operand: Expression) -> LqpResult<Self> {
        PredicateExpression::new(condition, vec![operand]).map(Expression::Predicate)
    }

    /// `value [NOT] IN (elements)`
    pub fn in_list(
        condition: PredicateCondition,
        value: Expression,
        elements: Vec<Expression>,
    ) -> LqpResult<Self> {
        PredicateExpression::new(condition, vec![value, Expression::List(elements)])
            .map(Expression::Predicate)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Expression::Column(column) => column.data_type,
            Expression::Value(value) => value.data_type(),
            // Predicates evaluate to 0/1
            Expression::Predicate(_) => DataType::Int32,
            Expression::List(elements) => elements
                .first()
                .map_or(DataType::Null, Expression::data_type),
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            Expression::Column(column) => column.nullable,
            Expression::Value(value) => value.is_null(),
            Expression::Predicate(predicate) => match predicate.condition {
                PredicateCondition::IsNull | PredicateCondition::IsNotNull => false,
                _ => predicate.arguments.iter().any(Expression::is_nullable),
            },
            Expression::List(elements) => elements.iter().any(Expression::is_nullable),
        }
    }

    pub fn as_column(&self) -> Option<&ColumnExpression> {
        match self {
            Expression::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Expression::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_predicate(&self) -> Option<&PredicateExpression> {
        match self {
            Expression::Predicate(predicate) => Some(predicate),
            _ => None,
        }
    }

    /// All column references in this expression, in reading order
    pub fn referenced_columns(&self) -> Vec<&ColumnExpression> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, columns: &mut Vec<&'a ColumnExpression>) {
        match self {
            Expression::Column(column) => columns.push(column),
            Expression::Value(_) => {}
            Expression::Predicate(predicate) => {
                for argument in &predicate.arguments {
                    argument.collect_columns(columns);
                }
            }
            Expression::List(elements) => {
                for element in elements {
                    element.collect_columns(columns);
                }
            }
        }
    }
}

impl fmt::Display for PredicateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = &self.arguments;
        match self.condition {
            PredicateCondition::IsNull | PredicateCondition::IsNotNull => {
                write!(f, "{} {}", args[0], self.condition)
            }
            c if is_between_predicate_condition(c) => {
                write!(f, "{} {} {} AND {}", args[0], c, args[1], args[2])
            }
            c => write!(f, "{} {} {}", args[0], c, args[1]),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(column) => f.write_str(&column.column_name),
            Expression::Value(value) => write!(f, "{value}"),
            Expression::Predicate(predicate) => write!(f, "{predicate}"),
            Expression::List(elements) => {
                let parts: Vec<String> = elements.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}
