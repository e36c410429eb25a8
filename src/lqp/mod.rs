//! # Logical Query Plan
//!
//! A plan is a DAG of [`LqpNode`]s. Nodes own their inputs through shared
//! handles, so one sub-plan can feed several parents (a common table
//! expression, or both sides of a self-join).
//!
//! ```text
//! translation -> LqpNode DAG -> [optimizer rules] -> LqpNode DAG -> compiler
//!                                   |      ^
//!                          lqp_deep_copy   lqp_hash / lqp_deep_equals
//! ```
//!
//! - [`node`]: identity, inputs and the per-variant contract
//! - [`nodes`]: the node variants
//! - [`deep`]: hash, copy and equality over whole DAGs
//! - [`visit`]: traversal, rendering and rewiring helpers

pub mod deep;
pub mod node;
pub mod nodes;
pub mod visit;

pub use deep::{
    lqp_deep_copy, lqp_deep_copy_with_mapping, lqp_deep_equals, lqp_hash, LqpHasher, NodeMapping,
};
pub use node::{
    InputSide, LqpNode, LqpNodeKind, LqpNodeRef, LqpNodeType, NodeId, ShallowNode,
    UniqueColumnCombination, UniqueColumnCombinations,
};
pub use visit::{
    describe_plan, lqp_find_nodes_by_type, lqp_node_count, lqp_replace_input, visit_lqp,
    LqpVisitation,
};
