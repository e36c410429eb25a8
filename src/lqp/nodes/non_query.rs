//! Statement nodes: they consume inputs but produce no result table, so
//! they expose no output expressions and reject column queries.

use crate::error::LqpResult;
use crate::expression::Expression;
use crate::lqp::deep::NodeMapping;
use crate::lqp::node::{hash_of, no_output_columns, LqpNode, LqpNodeRef, ShallowNode};
use crate::types::{ColumnId, DescriptionMode, FileType};

/// Implements the column half of the contract for statement nodes
macro_rules! non_query_columns {
    () => {
        fn output_expressions(&self, _node: &LqpNode) -> Vec<Expression> {
            Vec::new()
        }

        fn is_column_nullable(&self, _node: &LqpNode, _column_id: ColumnId) -> LqpResult<bool> {
            no_output_columns(self.description(DescriptionMode::Short))
        }
    };
}

/// `CREATE TABLE [IF NOT EXISTS] name`, optionally fed by a query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreateTableNode {
    pub table_name: String,
    pub if_not_exists: bool,
}

impl CreateTableNode {
    pub fn new(table_name: impl Into<String>, if_not_exists: bool) -> Self {
        CreateTableNode {
            table_name: table_name.into(),
            if_not_exists,
        }
    }

    /// `content` is the subplan for CREATE TABLE ... AS SELECT
    pub fn make(
        table_name: impl Into<String>,
        if_not_exists: bool,
        content: Option<LqpNodeRef>,
    ) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(table_name, if_not_exists), content, None)
    }
}

impl ShallowNode for CreateTableNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        let if_not_exists = if self.if_not_exists { "IfNotExists " } else { "" };
        format!("[CreateTable] {if_not_exists}Name: '{}'", self.table_name)
    }

    non_query_columns!();

    fn shallow_hash(&self) -> u64 {
        hash_of(&(&self.table_name, self.if_not_exists))
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// `DROP TABLE [IF EXISTS] name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DropTableNode {
    pub table_name: String,
    pub if_exists: bool,
}

impl DropTableNode {
    pub fn new(table_name: impl Into<String>, if_exists: bool) -> Self {
        DropTableNode {
            table_name: table_name.into(),
            if_exists,
        }
    }

    pub fn make(table_name: impl Into<String>, if_exists: bool) -> LqpNodeRef {
        LqpNode::new(Self::new(table_name, if_exists))
    }
}

impl ShallowNode for DropTableNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        let if_exists = if self.if_exists { "IfExists " } else { "" };
        format!("[DropTable] {if_exists}Name: '{}'", self.table_name)
    }

    non_query_columns!();

    fn shallow_hash(&self) -> u64 {
        hash_of(&(&self.table_name, self.if_exists))
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// Writes its single input to a file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportNode {
    pub file_name: String,
    pub file_type: FileType,
}

impl ExportNode {
    pub fn new(file_name: impl Into<String>, file_type: FileType) -> Self {
        ExportNode {
            file_name: file_name.into(),
            file_type,
        }
    }

    pub fn make(file_name: impl Into<String>, file_type: FileType, input: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(file_name, file_type), Some(input), None)
    }
}

impl ShallowNode for ExportNode {
    fn description(&self, mode: DescriptionMode) -> String {
        match mode {
            DescriptionMode::Short => format!("[Export] to '{}'", self.file_name),
            DescriptionMode::Detailed => {
                format!("[Export] to '{}' as {}", self.file_name, self.file_type)
            }
        }
    }

    non_query_columns!();

    fn shallow_hash(&self) -> u64 {
        hash_of(&(&self.file_name, self.file_type))
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// Loads a file into a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportNode {
    pub file_name: String,
    pub table_name: String,
    pub file_type: FileType,
}

impl ImportNode {
    pub fn new(
        file_name: impl Into<String>,
        table_name: impl Into<String>,
        file_type: FileType,
    ) -> Self {
        ImportNode {
            file_name: file_name.into(),
            table_name: table_name.into(),
            file_type,
        }
    }

    pub fn make(
        file_name: impl Into<String>,
        table_name: impl Into<String>,
        file_type: FileType,
    ) -> LqpNodeRef {
        LqpNode::new(Self::new(file_name, table_name, file_type))
    }
}

impl ShallowNode for ImportNode {
    fn description(&self, mode: DescriptionMode) -> String {
        let base = format!(
            "[Import] Name: '{}' from '{}'",
            self.table_name, self.file_name
        );
        match mode {
            DescriptionMode::Short => base,
            DescriptionMode::Detailed => format!("{base} as {}", self.file_type),
        }
    }

    non_query_columns!();

    fn shallow_hash(&self) -> u64 {
        hash_of(&(&self.file_name, &self.table_name, self.file_type))
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// Appends the rows of its input to a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsertNode {
    pub table_name: String,
}

impl InsertNode {
    pub fn new(table_name: impl Into<String>) -> Self {
        InsertNode {
            table_name: table_name.into(),
        }
    }

    pub fn make(table_name: impl Into<String>, rows: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(Self::new(table_name), Some(rows), None)
    }
}

impl ShallowNode for InsertNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        format!("[Insert] Into table '{}'", self.table_name)
    }

    non_query_columns!();

    fn shallow_hash(&self) -> u64 {
        hash_of(&self.table_name)
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

/// Invalidates the rows of its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeleteNode;

impl DeleteNode {
    pub fn make(rows: LqpNodeRef) -> LqpNodeRef {
        LqpNode::with_inputs(DeleteNode, Some(rows), None)
    }
}

impl ShallowNode for DeleteNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        "[Delete]".to_string()
    }

    non_query_columns!();

    fn shallow_equals(&self, _rhs: &Self, _mapping: &NodeMapping) -> bool {
        true
    }
}

/// Update of a table, expressed as invalidation plus insertion.
///
/// Left input: rows to invalidate. Right input: rows to insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpdateNode {
    pub table_name: String,
}

impl UpdateNode {
    pub fn new(table_name: impl Into<String>) -> Self {
        UpdateNode {
            table_name: table_name.into(),
        }
    }

    pub fn make(
        table_name: impl Into<String>,
        rows_to_invalidate: LqpNodeRef,
        rows_to_insert: LqpNodeRef,
    ) -> LqpNodeRef {
        LqpNode::with_inputs(
            Self::new(table_name),
            Some(rows_to_invalidate),
            Some(rows_to_insert),
        )
    }
}

impl ShallowNode for UpdateNode {
    fn description(&self, _mode: DescriptionMode) -> String {
        format!("[Update] Table: '{}'", self.table_name)
    }

    non_query_columns!();

    fn shallow_hash(&self) -> u64 {
        hash_of(&self.table_name)
    }

    fn shallow_equals(&self, rhs: &Self, _mapping: &NodeMapping) -> bool {
        self == rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LqpError;
    use crate::lqp::nodes::DummyTableNode;

    #[test]
    fn test_create_table_description() {
        let node = CreateTableNode::make("orders", true, None);
        assert_eq!(
            node.description(DescriptionMode::Short),
            "[CreateTable] IfNotExists Name: 'orders'"
        );
        let node = CreateTableNode::make("orders", false, None);
        assert_eq!(
            node.description(DescriptionMode::Short),
            "[CreateTable] Name: 'orders'"
        );
    }

    #[test]
    fn test_create_table_hash_and_equals() {
        let mapping = NodeMapping::new();
        let a = CreateTableNode::new("orders", true);
        let b = CreateTableNode::new("orders", true);
        let c = CreateTableNode::new("orders", false);
        assert!(a.shallow_equals(&b, &mapping));
        assert_eq!(a.shallow_hash(), b.shallow_hash());
        assert!(!a.shallow_equals(&c, &mapping));
    }

    #[test]
    fn test_export_description_and_payload() {
        let node = ExportNode::make("out.tbl", FileType::Tbl, LqpNode::new(DummyTableNode));
        assert_eq!(node.description(DescriptionMode::Short), "[Export] to 'out.tbl'");
        assert_eq!(
            node.description(DescriptionMode::Detailed),
            "[Export] to 'out.tbl' as Tbl"
        );

        let mapping = NodeMapping::new();
        let csv = ExportNode::new("out.tbl", FileType::Csv);
        let tbl = ExportNode::new("out.tbl", FileType::Tbl);
        assert!(!csv.shallow_equals(&tbl, &mapping));
    }

    #[test]
    fn test_update_has_no_columns() {
        let node = UpdateNode::make(
            "orders",
            LqpNode::new(DummyTableNode),
            LqpNode::new(DummyTableNode),
        );
        assert_eq!(node.input_count(), 2);
        assert!(node.output_expressions().is_empty());
        assert!(matches!(
            node.is_column_nullable(0),
            Err(LqpError::NoOutputColumns { .. })
        ));
        assert!(node.unique_column_combinations().is_empty());
        assert_eq!(node.description(DescriptionMode::Short), "[Update] Table: 'orders'");
    }

    #[test]
    fn test_other_statement_descriptions() {
        assert_eq!(
            DropTableNode::make("orders", true).description(DescriptionMode::Short),
            "[DropTable] IfExists Name: 'orders'"
        );
        assert_eq!(
            ImportNode::make("orders.csv", "orders", FileType::Csv)
                .description(DescriptionMode::Short),
            "[Import] Name: 'orders' from 'orders.csv'"
        );
        let rows = LqpNode::new(DummyTableNode);
        assert_eq!(
            InsertNode::make("orders", rows.clone()).description(DescriptionMode::Short),
            "[Insert] Into table 'orders'"
        );
        assert_eq!(
            DeleteNode::make(rows).description(DescriptionMode::Short),
            "[Delete]"
        );
    }
}
