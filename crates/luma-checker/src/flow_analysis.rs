//! Flow analysis.
//!
//! Walks the binder's backward flow graph to compute the type a symbol has
//! at a given use site. Assignments replace, conditions narrow, labels
//! union, and loop labels iterate to a fixed point with the loop entry as
//! the seed.

use luma_ast::{NodeId, NodeKind};
use luma_binder::{FlowNodeId, SymbolId, flow_flags};
use luma_common::limits::{MAX_FLOW_DEPTH, MAX_LOOP_ITERATIONS};
use luma_solver::TypeId;
use smallvec::SmallVec;

use crate::context::{CheckerState, is_assignable, with_narrower};

impl CheckerState<'_> {
    /// Type of `symbol` at `flow`, starting from its declared type.
    pub(crate) fn flow_type(
        &mut self,
        flow: FlowNodeId,
        symbol: SymbolId,
        declared: TypeId,
    ) -> TypeId {
        if let Some(&ty) = self.flow_types.get(&(flow, symbol)) {
            return ty;
        }
        if self.is_cancelled() || self.flow_depth >= MAX_FLOW_DEPTH {
            // Give up without memoizing so an aborted or unrelated deep
            // query cannot poison the cache.
            return declared;
        }
        self.flow_depth += 1;
        let ty = self.compute_flow_type(flow, symbol, declared);
        self.flow_depth -= 1;
        if self.is_cancelled() {
            // Relation queries below may have been cut short, so the
            // result is unreliable; drop any loop seed stored for this key.
            self.flow_types.remove(&(flow, symbol));
            return declared;
        }
        // Narrowing never escapes the declared type.
        let ty = if ty == declared || ty == TypeId::NEVER || is_assignable(self, ty, declared) {
            ty
        } else {
            declared
        };
        self.flow_types.insert((flow, symbol), ty);
        ty
    }

    fn compute_flow_type(
        &mut self,
        flow: FlowNodeId,
        symbol: SymbolId,
        declared: TypeId,
    ) -> TypeId {
        let Some(node) = self.binding.flow.get(flow) else {
            return declared;
        };
        let flags = node.flags;
        let node_id = node.node;
        let antecedents: SmallVec<[FlowNodeId; 4]> = node.antecedents.iter().copied().collect();

        if flags & flow_flags::UNREACHABLE != 0 {
            return TypeId::NEVER;
        }
        if flags & flow_flags::START != 0 {
            return declared;
        }
        if flags & flow_flags::ASSIGNMENT != 0 {
            return self.flow_type_of_assignment(node_id, symbol, declared, &antecedents);
        }
        if flags & flow_flags::CONDITION != 0 {
            let input = match antecedents.first() {
                Some(&antecedent) => self.flow_type(antecedent, symbol, declared),
                None => declared,
            };
            if input == TypeId::NEVER {
                return TypeId::NEVER;
            }
            let assume_true = flags & flow_flags::TRUE_CONDITION != 0;
            if flags & flow_flags::NULLISH_GUARD != 0 {
                return self.narrow_by_nullish_guard(node_id, symbol, input, assume_true);
            }
            return self.narrow_by_guard(node_id, symbol, input, assume_true);
        }
        if flags & flow_flags::LOOP_LABEL != 0 {
            return self.flow_type_of_loop(flow, symbol, declared, &antecedents);
        }
        if flags & flow_flags::BRANCH_LABEL != 0 {
            let mut results = Vec::with_capacity(antecedents.len());
            for &antecedent in &antecedents {
                let ty = self.flow_type(antecedent, symbol, declared);
                if ty != TypeId::NEVER {
                    results.push(ty);
                }
            }
            if results.is_empty() {
                return TypeId::NEVER;
            }
            return self.types.union(results);
        }
        // Unrecognized nodes are transparent.
        match antecedents.first() {
            Some(&antecedent) => self.flow_type(antecedent, symbol, declared),
            None => declared,
        }
    }

    fn flow_type_of_assignment(
        &mut self,
        node_id: NodeId,
        symbol: SymbolId,
        declared: TypeId,
        antecedents: &[FlowNodeId],
    ) -> TypeId {
        let value = self.assigned_value(node_id, symbol);
        let Some(value) = value else {
            // Assignment to some other symbol or property.
            return match antecedents.first() {
                Some(&antecedent) => self.flow_type(antecedent, symbol, declared),
                None => declared,
            };
        };
        let assigned = self.check_expression(value);
        with_narrower(self, |n| n.narrow_by_assignment(declared, assigned))
    }

    /// The assigned expression when `node_id` writes `symbol`, else `None`.
    fn assigned_value(&self, node_id: NodeId, symbol: SymbolId) -> Option<NodeId> {
        match self.arena.kind(node_id)? {
            NodeKind::VarDecl { initializer, .. } => {
                if self.binding.node_symbol.get(&node_id) == Some(&symbol)
                    && !initializer.is_none()
                {
                    Some(*initializer)
                } else {
                    None
                }
            }
            NodeKind::Assign { target, value } => {
                let mut target = *target;
                while let Some(NodeKind::Paren { expr }) = self.arena.kind(target) {
                    target = *expr;
                }
                if matches!(self.arena.kind(target), Some(NodeKind::Ident { .. }))
                    && self.binding.node_symbol.get(&target) == Some(&symbol)
                {
                    Some(*value)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Fixed-point iteration over a loop head. The entry edge seeds the
    /// cache so the back-edge walk terminates; each round unions in what
    /// the back edges produce under the current assumption, and the type
    /// only ever grows. Loops that fail to settle fall back to the
    /// declared type.
    fn flow_type_of_loop(
        &mut self,
        flow: FlowNodeId,
        symbol: SymbolId,
        declared: TypeId,
        antecedents: &[FlowNodeId],
    ) -> TypeId {
        let entry = match antecedents.first() {
            Some(&entry) => self.flow_type(entry, symbol, declared),
            None => declared,
        };
        if antecedents.len() < 2 {
            return entry;
        }
        let mut current = entry;
        for _ in 0..MAX_LOOP_ITERATIONS {
            self.flow_types.insert((flow, symbol), current);
            let mut next = current;
            for &back_edge in &antecedents[1..] {
                let ty = self.flow_type(back_edge, symbol, declared);
                if ty != TypeId::NEVER {
                    next = self.types.union2(next, ty);
                }
            }
            if next == current {
                return current;
            }
            current = next;
        }
        declared
    }
}
