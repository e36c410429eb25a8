//! Node variant catalog.
//!
//! - `non_query`: statements without tabular output (DDL, import/export, DML)
//! - `leaf`: plan sources (stored tables, the empty dummy relation)
//! - `relational`: query operators over their inputs

mod leaf;
mod non_query;
mod relational;

pub use leaf::{ColumnDefinition, DummyTableNode, StoredTableNode};
pub use non_query::{
    CreateTableNode, DeleteNode, DropTableNode, ExportNode, ImportNode, InsertNode, UpdateNode,
};
pub use relational::{JoinNode, LimitNode, PredicateNode, ProjectionNode, SortNode, UnionNode};
