//! Control-flow graph nodes.
//!
//! The binder builds a backward flow graph: each node points at its
//! antecedents (predecessors), and the narrowing engine walks from a use
//! site back toward the function's start node. Join points are labels
//! whose antecedents are filled in as branches complete; loop labels
//! receive their back edge after the loop body is bound, which is what
//! makes the graph cyclic for loops.

use luma_ast::NodeId;
use luma_common::limits::FLOW_ANTECEDENT_INLINE;
use smallvec::SmallVec;

/// Index of a flow node in a [`FlowNodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowNodeId(pub u32);

impl FlowNodeId {
    pub const NONE: FlowNodeId = FlowNodeId(u32::MAX);

    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Flow node classification flags.
pub mod flow_flags {
    /// Code past a `return`/`throw`/`break`/`continue`, or a join with no
    /// live antecedents.
    pub const UNREACHABLE: u32 = 1 << 0;
    /// Function (or file) entry; the backward walk stops here.
    pub const START: u32 = 1 << 1;
    /// Join point of conditional branches.
    pub const BRANCH_LABEL: u32 = 1 << 2;
    /// Join point at a loop head; its back edge arrives after the body.
    pub const LOOP_LABEL: u32 = 1 << 3;
    /// An assignment or initialized declaration; `node` is the assignment.
    pub const ASSIGNMENT: u32 = 1 << 4;
    /// Condition taken as true; `node` is the condition expression.
    pub const TRUE_CONDITION: u32 = 1 << 5;
    /// Condition taken as false; `node` is the condition expression.
    pub const FALSE_CONDITION: u32 = 1 << 6;
    /// The condition is a nullish test of `node` rather than a truthiness
    /// test. Set together with `TRUE_CONDITION` (operand known non-nullish)
    /// or `FALSE_CONDITION` (operand known nullish); emitted for `??` and
    /// `?.`.
    pub const NULLISH_GUARD: u32 = 1 << 7;

    pub const LABEL: u32 = BRANCH_LABEL | LOOP_LABEL;
    pub const CONDITION: u32 = TRUE_CONDITION | FALSE_CONDITION;
}

/// One node of the backward flow graph.
#[derive(Debug, Clone)]
pub struct FlowNode {
    pub flags: u32,
    /// The syntax node this flow fact is about; `NodeId::NONE` for labels
    /// and start/unreachable nodes.
    pub node: NodeId,
    pub antecedents: SmallVec<[FlowNodeId; FLOW_ANTECEDENT_INLINE]>,
}

impl FlowNode {
    pub fn has_any_flags(&self, flags: u32) -> bool {
        self.flags & flags != 0
    }
}

/// Flat storage for a file's flow graph.
#[derive(Debug, Default)]
pub struct FlowNodeArena {
    nodes: Vec<FlowNode>,
}

impl FlowNodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node with no syntax node attached (labels, start,
    /// unreachable).
    pub fn alloc(&mut self, flags: u32) -> FlowNodeId {
        self.alloc_with_node(flags, NodeId::NONE)
    }

    pub fn alloc_with_node(&mut self, flags: u32, node: NodeId) -> FlowNodeId {
        let id = FlowNodeId(self.nodes.len() as u32);
        self.nodes.push(FlowNode {
            flags,
            node,
            antecedents: SmallVec::new(),
        });
        id
    }

    pub fn get(&self, id: FlowNodeId) -> Option<&FlowNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn add_antecedent(&mut self, label: FlowNodeId, antecedent: FlowNodeId) {
        if antecedent.is_none() {
            return;
        }
        if let Some(node) = self.nodes.get_mut(label.0 as usize)
            && !node.antecedents.contains(&antecedent)
        {
            node.antecedents.push(antecedent);
        }
    }

    pub fn antecedent_count(&self, id: FlowNodeId) -> usize {
        self.get(id).map_or(0, |node| node.antecedents.len())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
