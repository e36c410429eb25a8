//! Deep operations over a plan DAG.
//!
//! Hash, copy and equality lift the per-node shallow operations across all
//! reachable nodes. Each walk keys its bookkeeping by [`NodeId`], so a node
//! reachable over several paths is handled once:
//!
//! - hashing memoizes the subtree hash per node
//! - copying registers a node's copy before descending, so later references
//!   (and re-entrant ones) resolve to the same copied instance
//! - equality records a one-to-one pairing of lhs and rhs nodes and rejects
//!   any revisit that contradicts it

use crate::lqp::node::{LqpNode, LqpNodeRef, NodeId};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity mapping from source nodes to their counterparts
#[derive(Debug, Clone, Default)]
pub struct NodeMapping {
    nodes: HashMap<NodeId, LqpNodeRef>,
}

impl NodeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&LqpNodeRef> {
        self.nodes.get(&id)
    }

    pub fn insert(&mut self, id: NodeId, node: LqpNodeRef) {
        self.nodes.insert(id, node);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// Mixed into the hash for a back edge found while its target is still
// being hashed. Plans are acyclic; this only keeps a malformed plan from
// recursing forever.
const BACK_EDGE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Memoizing deep hasher.
///
/// A hasher may be reused across roots; subtrees it has already seen are not
/// hashed again. The memo is keyed by node identity, so a hasher is only
/// valid while the graph stays unchanged: after any input is rewired, start
/// a new one.
#[derive(Debug, Default)]
pub struct LqpHasher {
    memo: HashMap<NodeId, u64>,
    in_progress: HashSet<NodeId>,
    nodes_hashed: usize,
}

impl LqpHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep hash of the DAG below `root`
    pub fn hash(&mut self, root: &LqpNode) -> u64 {
        if let Some(&hash) = self.memo.get(&root.id()) {
            return hash;
        }
        if !self.in_progress.insert(root.id()) {
            return BACK_EDGE;
        }
        self.nodes_hashed += 1;

        let mut hasher = DefaultHasher::new();
        root.node_type().hash(&mut hasher);
        root.shallow_hash().hash(&mut hasher);
        // Slot presence is part of the shape: Left(x) and Right(x) differ
        for slot in root.input_slots() {
            match slot {
                Some(input) => {
                    1u8.hash(&mut hasher);
                    self.hash(&input).hash(&mut hasher);
                }
                None => 0u8.hash(&mut hasher),
            }
        }
        let hash = hasher.finish();

        self.in_progress.remove(&root.id());
        self.memo.insert(root.id(), hash);
        hash
    }

    /// Number of distinct nodes whose hash was computed
    pub fn nodes_hashed(&self) -> usize {
        self.nodes_hashed
    }
}

/// Deep hash of a plan. Deep-equal plans hash equally.
pub fn lqp_hash(root: &LqpNode) -> u64 {
    LqpHasher::new().hash(root)
}

/// Copy a plan, preserving the sharing structure of the source
pub fn lqp_deep_copy(root: &LqpNodeRef) -> LqpNodeRef {
    let mut mapping = NodeMapping::new();
    lqp_deep_copy_with_mapping(root, &mut mapping)
}

/// Copy a plan, resolving already-copied nodes through `mapping`.
///
/// On return `mapping` holds every source node reachable from `root`,
/// keyed to its copy. Passing one mapping to several calls copies plans
/// that share nodes into results that share the same copies.
pub fn lqp_deep_copy_with_mapping(root: &LqpNodeRef, mapping: &mut NodeMapping) -> LqpNodeRef {
    if let Some(copy) = mapping.get(root.id()) {
        return Arc::clone(copy);
    }

    let copy = LqpNode::new(root.shallow_copy(mapping));
    mapping.insert(root.id(), Arc::clone(&copy));

    let [left, right] = root.input_slots();
    let left = left.map(|input| lqp_deep_copy_with_mapping(&input, mapping));
    let right = right.map(|input| lqp_deep_copy_with_mapping(&input, mapping));
    copy.set_left_input(left);
    copy.set_right_input(right);
    copy
}

/// Structural equality of two plans, including their sharing structure
pub fn lqp_deep_equals(lhs: &LqpNodeRef, rhs: &LqpNodeRef) -> bool {
    LqpComparator::default().equals(lhs, rhs)
}

#[derive(Default)]
struct LqpComparator {
    forward: NodeMapping,
    backward: HashMap<NodeId, NodeId>,
}

impl LqpComparator {
    fn equals(&mut self, lhs: &LqpNodeRef, rhs: &LqpNodeRef) -> bool {
        match (self.forward.get(lhs.id()), self.backward.get(&rhs.id())) {
            (Some(paired_rhs), Some(&paired_lhs)) => {
                return paired_rhs.id() == rhs.id() && paired_lhs == lhs.id();
            }
            (None, None) => {}
            // One side was already paired with some other node
            _ => return false,
        }

        if lhs.node_type() != rhs.node_type() || !lhs.shallow_equals(rhs, &self.forward) {
            return false;
        }

        self.forward.insert(lhs.id(), Arc::clone(rhs));
        self.backward.insert(rhs.id(), lhs.id());

        let (lhs_inputs, rhs_inputs) = (lhs.input_slots(), rhs.input_slots());
        lhs_inputs
            .iter()
            .zip(rhs_inputs.iter())
            .all(|slots| match slots {
                (Some(lhs_input), Some(rhs_input)) => self.equals(lhs_input, rhs_input),
                (None, None) => true,
                _ => false,
            })
    }
}
