//! Plan node core contract.
//!
//! An [`LqpNode`] is an identity (`NodeId`), an immutable variant payload
//! ([`LqpNodeKind`]) and up to two input slots. Inputs are shared `Arc`
//! handles: a sub-DAG may hang below several parents. The slots sit behind a
//! lock so that an optimizer pass, the single writer of a plan it owns, can
//! rewire edges while the payload stays untouched.
//!
//! Each variant payload implements [`ShallowNode`]; `LqpNode` dispatches
//! over the closed set of variants exhaustively.

use crate::error::{LqpError, LqpResult};
use crate::expression::Expression;
use crate::lqp::deep::NodeMapping;
use crate::lqp::nodes::{
    CreateTableNode, DeleteNode, DropTableNode, DummyTableNode, ExportNode, ImportNode,
    InsertNode, JoinNode, LimitNode, PredicateNode, ProjectionNode, SortNode, StoredTableNode,
    UnionNode, UpdateNode,
};
use crate::types::{ColumnId, DescriptionMode};
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a plan node
pub type LqpNodeRef = Arc<LqpNode>;

/// Output column positions that are unique together
pub type UniqueColumnCombination = BTreeSet<ColumnId>;

pub type UniqueColumnCombinations = HashSet<UniqueColumnCombination>;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity; keys every identity mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSide {
    Left,
    Right,
}

/// Per-variant half of the node contract.
///
/// Only `shallow_equals` is mandatory. The defaults describe a node that
/// passes its left input's columns through and carries no hashable payload.
/// The shallow operations never look at inputs; the deep-operations driver
/// handles those.
pub trait ShallowNode: Clone + fmt::Debug {
    fn description(&self, mode: DescriptionMode) -> String;

    fn output_expressions(&self, node: &LqpNode) -> Vec<Expression> {
        node.left_input()
            .map(|input| input.output_expressions())
            .unwrap_or_default()
    }

    fn is_column_nullable(&self, node: &LqpNode, column_id: ColumnId) -> LqpResult<bool> {
        match node.left_input() {
            Some(input) => input.is_column_nullable(column_id),
            None => Err(LqpError::NoOutputColumns {
                node: self.description(DescriptionMode::Short),
            }),
        }
    }

    fn unique_column_combinations(&self, _node: &LqpNode) -> UniqueColumnCombinations {
        UniqueColumnCombinations::new()
    }

    fn shallow_hash(&self) -> u64 {
        0
    }

    fn shallow_copy(&self, _mapping: &NodeMapping) -> Self {
        self.clone()
    }

    fn shallow_equals(&self, rhs: &Self, mapping: &NodeMapping) -> bool;
}

/// Hash any payload with the process-stable default hasher
pub(crate) fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

macro_rules! lqp_node_kinds {
    ($($variant:ident($payload:ty)),* $(,)?) => {
        /// Fieldless tag of a node variant, for fast dispatch
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum LqpNodeType {
            $($variant),*
        }

        /// Closed set of node variants with their payloads
        #[derive(Debug, Clone)]
        pub enum LqpNodeKind {
            $($variant($payload)),*
        }

        impl LqpNodeKind {
            pub fn node_type(&self) -> LqpNodeType {
                match self {
                    $(LqpNodeKind::$variant(_) => LqpNodeType::$variant),*
                }
            }

            fn description(&self, mode: DescriptionMode) -> String {
                match self {
                    $(LqpNodeKind::$variant(payload) => payload.description(mode)),*
                }
            }

            fn output_expressions(&self, node: &LqpNode) -> Vec<Expression> {
                match self {
                    $(LqpNodeKind::$variant(payload) => payload.output_expressions(node)),*
                }
            }

            fn is_column_nullable(&self, node: &LqpNode, column_id: ColumnId) -> LqpResult<bool> {
                match self {
                    $(LqpNodeKind::$variant(payload) => payload.is_column_nullable(node, column_id)),*
                }
            }

            fn unique_column_combinations(&self, node: &LqpNode) -> UniqueColumnCombinations {
                match self {
                    $(LqpNodeKind::$variant(payload) => payload.unique_column_combinations(node)),*
                }
            }

            fn shallow_hash(&self) -> u64 {
                match self {
                    $(LqpNodeKind::$variant(payload) => payload.shallow_hash()),*
                }
            }

            fn shallow_copy(&self, mapping: &NodeMapping) -> LqpNodeKind {
                match self {
                    $(LqpNodeKind::$variant(payload) => {
                        LqpNodeKind::$variant(payload.shallow_copy(mapping))
                    }),*
                }
            }

            fn shallow_equals(&self, rhs: &LqpNodeKind, mapping: &NodeMapping) -> bool {
                match (self, rhs) {
                    $((LqpNodeKind::$variant(lhs), LqpNodeKind::$variant(rhs)) => {
                        lhs.shallow_equals(rhs, mapping)
                    })*
                    _ => false,
                }
            }
        }

        $(
            impl From<$payload> for LqpNodeKind {
                fn from(payload: $payload) -> Self {
                    LqpNodeKind::$variant(payload)
                }
            }
        )*
    };
}

lqp_node_kinds! {
    CreateTable(CreateTableNode),
    DropTable(DropTableNode),
    Export(ExportNode),
    Import(ImportNode),
    Insert(InsertNode),
    Delete(DeleteNode),
    Update(UpdateNode),
    DummyTable(DummyTableNode),
    StoredTable(StoredTableNode),
    Predicate(PredicateNode),
    Projection(ProjectionNode),
    Join(JoinNode),
    Sort(SortNode),
    Limit(LimitNode),
    Union(UnionNode),
}

/// A node of the logical query plan DAG
pub struct LqpNode {
    id: NodeId,
    kind: LqpNodeKind,
    inputs: RwLock<[Option<LqpNodeRef>; 2]>,
}

impl LqpNode {
    /// New node without inputs
    pub fn new(kind: impl Into<LqpNodeKind>) -> LqpNodeRef {
        Self::with_inputs(kind, None, None)
    }

    pub fn with_inputs(
        kind: impl Into<LqpNodeKind>,
        left: Option<LqpNodeRef>,
        right: Option<LqpNodeRef>,
    ) -> LqpNodeRef {
        Arc::new(LqpNode {
            id: NodeId::next(),
            kind: kind.into(),
            inputs: RwLock::new([left, right]),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &LqpNodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> LqpNodeType {
        self.kind.node_type()
    }

    // Inputs

    pub fn left_input(&self) -> Option<LqpNodeRef> {
        self.inputs.read()[0].clone()
    }

    pub fn right_input(&self) -> Option<LqpNodeRef> {
        self.inputs.read()[1].clone()
    }

    pub fn input(&self, side: InputSide) -> Option<LqpNodeRef> {
        match side {
            InputSide::Left => self.left_input(),
            InputSide::Right => self.right_input(),
        }
    }

    /// Present inputs, left first
    pub fn inputs(&self) -> Vec<LqpNodeRef> {
        self.inputs.read().iter().flatten().cloned().collect()
    }

    /// Both input slots, including empty ones
    pub fn input_slots(&self) -> [Option<LqpNodeRef>; 2] {
        self.inputs.read().clone()
    }

    pub fn input_count(&self) -> usize {
        self.inputs.read().iter().flatten().count()
    }

    pub fn set_left_input(&self, input: Option<LqpNodeRef>) {
        self.set_input(InputSide::Left, input);
    }

    pub fn set_right_input(&self, input: Option<LqpNodeRef>) {
        self.set_input(InputSide::Right, input);
    }

    pub fn set_input(&self, side: InputSide, input: Option<LqpNodeRef>) {
        let slot = match side {
            InputSide::Left => 0,
            InputSide::Right => 1,
        };
        self.inputs.write()[slot] = input;
    }

    // Contract

    /// Human-readable rendering for logs and EXPLAIN; not a machine format
    pub fn description(&self, mode: DescriptionMode) -> String {
        self.kind.description(mode)
    }

    /// Columns this node produces, in order
    pub fn output_expressions(&self) -> Vec<Expression> {
        self.kind.output_expressions(self)
    }

    pub fn column_count(&self) -> usize {
        self.output_expressions().len()
    }

    /// Whether an output column may contain NULL. Errors if the node has no
    /// such column; nullability is never guessed.
    pub fn is_column_nullable(&self, column_id: ColumnId) -> LqpResult<bool> {
        self.kind.is_column_nullable(self, column_id)
    }

    pub fn unique_column_combinations(&self) -> UniqueColumnCombinations {
        self.kind.unique_column_combinations(self)
    }

    /// Position of an expression in this node's output
    pub fn find_column_id(&self, expression: &Expression) -> Option<ColumnId> {
        self.output_expressions()
            .iter()
            .position(|output| output == expression)
            .and_then(|position| ColumnId::try_from(position).ok())
    }

    /// Hash of the payload only
    pub fn shallow_hash(&self) -> u64 {
        self.kind.shallow_hash()
    }

    /// Fresh payload of the same variant; inputs are not copied
    pub fn shallow_copy(&self, mapping: &NodeMapping) -> LqpNodeKind {
        self.kind.shallow_copy(mapping)
    }

    /// Payload comparison; `false` for different variants
    pub fn shallow_equals(&self, rhs: &LqpNode, mapping: &NodeMapping) -> bool {
        self.kind.shallow_equals(&rhs.kind, mapping)
    }
}

// Inputs are printed by id only; a shared sub-DAG would otherwise be
// expanded once per path.
impl fmt::Debug for LqpNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<NodeId> = self.inputs().iter().map(|input| input.id()).collect();
        f.debug_struct("LqpNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("inputs", &inputs)
            .finish()
    }
}

/// Shared error for nodes that produce no tabular output
pub(crate) fn no_output_columns<T>(description: String) -> LqpResult<T> {
    Err(LqpError::NoOutputColumns { node: description })
}

/// Check a column id against an output width
pub(crate) fn check_column_id(
    description: impl FnOnce() -> String,
    column_id: ColumnId,
    column_count: usize,
) -> LqpResult<usize> {
    let index = usize::from(column_id);
    if index < column_count {
        Ok(index)
    } else {
        Err(LqpError::ColumnOutOfRange {
            node: description(),
            column_id,
            column_count,
        })
    }
}
