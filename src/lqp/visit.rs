//! Plan traversal and small rewiring helpers.

use crate::lqp::node::{InputSide, LqpNodeRef, LqpNodeType, NodeId};
use crate::types::DescriptionMode;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LqpVisitation {
    VisitInputs,
    DoNotVisitInputs,
}

/// Depth-first pre-order walk, left input first. Each node is visited once,
/// however many parents reference it.
pub fn visit_lqp<F>(root: &LqpNodeRef, mut visitor: F)
where
    F: FnMut(&LqpNodeRef) -> LqpVisitation,
{
    let mut visited = HashSet::new();
    let mut stack = vec![Arc::clone(root)];

    while let Some(node) = stack.pop() {
        if !visited.insert(node.id()) {
            continue;
        }
        if visitor(&node) == LqpVisitation::VisitInputs {
            let [left, right] = node.input_slots();
            stack.extend(right);
            stack.extend(left);
        }
    }
}

/// Number of distinct nodes reachable from `root`
pub fn lqp_node_count(root: &LqpNodeRef) -> usize {
    let mut count = 0;
    visit_lqp(root, |_| {
        count += 1;
        LqpVisitation::VisitInputs
    });
    count
}

pub fn lqp_find_nodes_by_type(root: &LqpNodeRef, node_type: LqpNodeType) -> Vec<LqpNodeRef> {
    let mut nodes = Vec::new();
    visit_lqp(root, |node| {
        if node.node_type() == node_type {
            nodes.push(Arc::clone(node));
        }
        LqpVisitation::VisitInputs
    });
    nodes
}

/// Point every input slot of `parent` that holds `old` at `new`.
/// Returns the number of slots rewired.
pub fn lqp_replace_input(parent: &LqpNodeRef, old: &LqpNodeRef, new: &LqpNodeRef) -> usize {
    let mut replaced = 0;
    for side in [InputSide::Left, InputSide::Right] {
        if parent
            .input(side)
            .is_some_and(|input| Arc::ptr_eq(&input, old))
        {
            parent.set_input(side, Some(Arc::clone(new)));
            replaced += 1;
        }
    }
    replaced
}

/// Multi-line rendering of a plan, one node per line, inputs indented below
/// their parent.
///
/// A node with several parents is prefixed with its id the first time it is
/// printed; later occurrences print only the id.
///
/// ```text
/// [UnionNode] Mode: All
///   [Limit] 1
///     @3 [StoredTable] Name: 't'
///   [Limit] 2
///     @3
/// ```
pub fn describe_plan(root: &LqpNodeRef, mode: DescriptionMode) -> String {
    let mut references: HashMap<NodeId, usize> = HashMap::new();
    visit_lqp(root, |node| {
        for input in node.inputs() {
            *references.entry(input.id()).or_default() += 1;
        }
        LqpVisitation::VisitInputs
    });

    let mut renderer = PlanRenderer {
        mode,
        references,
        printed: HashSet::new(),
        output: String::new(),
    };
    renderer.render(root, 0);
    renderer.output
}

struct PlanRenderer {
    mode: DescriptionMode,
    references: HashMap<NodeId, usize>,
    printed: HashSet<NodeId>,
    output: String,
}

impl PlanRenderer {
    fn render(&mut self, node: &LqpNodeRef, depth: usize) {
        let indent = "  ".repeat(depth);
        let shared = self.references.get(&node.id()).copied().unwrap_or(0) > 1;

        if shared {
            if !self.printed.insert(node.id()) {
                self.output.push_str(&format!("{indent}{}\n", node.id()));
                return;
            }
            self.output
                .push_str(&format!("{indent}{} {}\n", node.id(), node.description(self.mode)));
        } else {
            self.output
                .push_str(&format!("{indent}{}\n", node.description(self.mode)));
        }

        for input in node.inputs() {
            self.render(&input, depth + 1);
        }
    }
}
