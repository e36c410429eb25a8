//! # PlanLayer
//!
//! Logical query plan (LQP) layer of a query engine: a DAG of typed plan
//! nodes that an optimizer rewrites and a compiler later lowers into a
//! physical plan.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! Query translation
//!     ↓
//! [lqp::nodes]          → LqpNode DAG (shared sub-plans allowed)
//!     ↓
//! [optimizer]           → rules to fixpoint (deep copy, deep hash, deep equals)
//!     ↓                   ↘ [statistics] pruning when predicates fold into scans
//! [cache]               → plan-keyed lookup of compiled artifacts
//!     ↓
//! Physical plan compiler
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use planlayer::lqp::nodes::{ColumnDefinition, PredicateNode, StoredTableNode};
//! use planlayer::lqp::{describe_plan, lqp_deep_copy, lqp_deep_equals, lqp_hash};
//! use planlayer::{DataType, DescriptionMode, Expression, PredicateCondition};
//!
//! let orders = StoredTableNode::make(
//!     "orders",
//!     vec![ColumnDefinition::new("total", DataType::Float64, false)],
//! );
//! let total = orders.output_expressions()[0].clone();
//! let plan = PredicateNode::make(
//!     Expression::binary(PredicateCondition::GreaterThan, total, Expression::value(100.0))?,
//!     orders,
//! );
//!
//! let copy = lqp_deep_copy(&plan);
//! assert!(lqp_deep_equals(&plan, &copy));
//! assert_eq!(lqp_hash(&plan), lqp_hash(&copy));
//! println!("{}", describe_plan(&plan, DescriptionMode::Short));
//! # Ok::<(), planlayer::LqpError>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `types` | Predicate condition algebra, modes, name tables |
//! | `value` | Literal values and data types |
//! | `expression` | Column, literal and predicate expressions |
//! | `lqp` | Plan nodes and deep operations |
//! | `statistics` | Attribute statistics and pruning |
//! | `optimizer` | Rule driver and predicate rules |
//! | `cache` | Plan-keyed LRU cache |
//! | `config` | Layered configuration |
//! | `logging` | Tracing subscriber setup |

pub mod cache;
pub mod config;
pub mod error;
pub mod expression;
pub mod logging;
pub mod lqp;
pub mod optimizer;
pub mod statistics;
pub mod types;
pub mod value;

pub use cache::{CacheStats, LqpCache};
pub use config::Config;
pub use error::{LqpError, LqpResult, PruningError};
pub use expression::{ColumnExpression, Expression, PredicateExpression};
pub use lqp::{LqpNode, LqpNodeRef, LqpNodeType};
pub use optimizer::{Optimizer, OptimizerRule};
pub use statistics::{AttributeStatistics, ColumnStatistics, StatisticsRegistry};
pub use types::{
    ColumnId, DescriptionMode, FileType, JoinMode, PredicateCondition, SetOperationMode,
    SortMode, TableType,
};
pub use value::{DataType, Value};
