//! Plan sources.

use crate::error::LqpResult;
use crate::expression::Expression;
use crate::lqp::deep::NodeMapping;
use crate::lqp::node::{
    check_column_id, hash_of, no_output_columns, LqpNode, LqpNodeRef, ShallowNode,
    UniqueColumnCombination, UniqueColumnCombinations,
};
use crate::types::{ColumnId, DescriptionMode};
use crate::value::DataType;

/// Schema entry of a stored table, as supplied by plan translation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        ColumnDefinition {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Reads a table from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredTableNode {
    pub table_name: String,
    pub column_definitions: Vec<ColumnDefinition>,
    /// Key constraints (primary key, unique) as column positions
    pub unique_keys: Vec<UniqueColumnCombination>,
}

impl StoredTableNode {
    pub fn new(table_name: impl Into<String>, column_definitions: Vec<ColumnDefinition>) -> Self {
        StoredTableNode {
            table_name: table_name.into(),
            column_definitions,
            unique_keys: Vec::new(),
        }
    }

    pub fn with_unique_key(mut self, columns: impl IntoIterator<Item = ColumnId>) -> Self {
        self.unique_keys.push(columns.into_iter().collect());
        self
    }

    pub fn make(table_name: impl Into<String>, column_definitions: Vec<ColumnDefinition>) -> LqpNodeRef {
        LqpNode::new(Self::new(table_name, column_definitions))
    }

    /// Column expression for the column at `column_id`
    pub fn column(&self, column_id: ColumnId) -> Option<Expression> {
        let definition = self.column_definitions.get(usize::from(column_id))?;
        Some(Expression::column(
            &self.table_name,
            column_id,
            &definition.name,
            definition.data_type,
            definition.nullable,
        ))
    }
}

impl ShallowNode for StoredTableNode {
    fn description(&self, mode: DescriptionMode) -> String {
        match mode {
            DescriptionMode::Short => format!("[StoredTable] Name: '{}'", self.table_name),
            DescriptionMode::Detailed => {
                let columns: Vec<String> = self
                    .column_definitions
                    .iter()
                    .map(|c| format!("{} {}{}", c.name, c.data_type, if c.nullable { " NULL" } else { "" }))
                    .collect();
                format!(
                    "[StoredTable] Name: '{}' ({})",
                    self.table_name,
                    columns.join(", ")
                )
            }
        }
    }

    fn output_expressions(&self, _node: &LqpNode) -> Vec<Expression> {
        (0..self.column_definitions.len())
            .filter_map(|index| ColumnId::try_from(index).ok())
            .filter_map(|column_id| self.column(column_id))
            .collect()
    }

    fn is_column_nullable(&self, _node: &LqpNode, column_id: ColumnId) -> LqpResult<bool> {
        let index = check_column_id(
            || self.description(DescriptionMode::Short),
            column_id,
            self.column_definitions.len(),
        )?;
        Ok(self.column_definitions[index].nullable)
    }

    fn unique_column_combinations(&self, _node: &LqpNode) -> UniqueColumnCombinations {
        self.unique_keys
            .iter()
            .filter(|key| !key.is_empty())
            .cloned()
            .collect()
    }

    fn shallow_hash(&self) -> u64 {
        hash_of(&(&self.table_name, &self.column_definitions))
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// A relation with no columns, used where a statement needs a data source
/// but reads nothing (e.g. `SELECT 1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DummyTableNode;

impl DummyTableNode {
    pub fn make() -> LqpNodeRef {
        LqpNode::new(DummyTableNode)
    }
}

impl ShallowNode for DummyTableNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        "[DummyTable]".to_string()
    }

    fn output_expressions(&self, _node: &LqpNode) -> Vec<Expression> {
        Vec::new()
    }

    fn is_column_nullable(&self, _node: &LqpNode, _column_id: ColumnId) -> LqpResult<bool> {
        no_output_columns("DummyTable".to_string())
    }

    fn shallow_equals(&self, _rhs: &Self, _mapping: &NodeMapping) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LqpError;

    fn orders() -> StoredTableNode {
        StoredTableNode::new(
            "orders",
            vec![
                ColumnDefinition::new("id", DataType::Int64, false),
                ColumnDefinition::new("note", DataType::String, true),
            ],
        )
        .with_unique_key([0])
    }

    #[test]
    fn test_dummy_table_has_no_columns() {
        let node = DummyTableNode::make();
        assert!(node.output_expressions().is_empty());
        assert_eq!(
            node.is_column_nullable(0),
            Err(LqpError::NoOutputColumns {
                node: "DummyTable".to_string()
            })
        );
        assert!(node.unique_column_combinations().is_empty());
        assert_eq!(node.description(DescriptionMode::Short), "[DummyTable]");
    }

    #[test]
    fn test_stored_table_columns() {
        let node = LqpNode::new(orders());
        let outputs = node.output_expressions();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].to_string(), "note");
        assert_eq!(node.is_column_nullable(0), Ok(false));
        assert_eq!(node.is_column_nullable(1), Ok(true));
        assert!(matches!(
            node.is_column_nullable(2),
            Err(LqpError::ColumnOutOfRange { column_count: 2, .. })
        ));
        assert_eq!(node.find_column_id(&outputs[1]), Some(1));
    }

    #[test]
    fn test_stored_table_unique_keys() {
        let node = LqpNode::new(orders());
        let uccs = node.unique_column_combinations();
        assert_eq!(uccs.len(), 1);
        assert!(uccs.contains(&UniqueColumnCombination::from([0])));
    }

    #[test]
    fn test_stored_table_payload_equality() {
        let mapping = NodeMapping::new();
        let other_schema = StoredTableNode::new(
            "orders",
            vec![ColumnDefinition::new("id", DataType::Int32, false)],
        );
        assert!(orders().shallow_equals(&orders(), &mapping));
        assert_eq!(orders().shallow_hash(), orders().shallow_hash());
        assert!(!orders().shallow_equals(&other_schema, &mapping));
    }
}
