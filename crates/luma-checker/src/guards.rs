//! Guard classification.
//!
//! Flow analysis hands each `TRUE_CONDITION` / `FALSE_CONDITION` node's
//! condition expression to [`CheckerState::narrow_by_guard`], which decides
//! whether the expression says anything about the symbol being tracked and,
//! if so, which narrowing operation applies. Unrecognized shapes narrow
//! nothing.

use luma_ast::{BinaryOp, LogicalOp, NodeId, NodeKind, UnaryOp};
use luma_binder::SymbolId;
use luma_solver::{TypeData, TypeId, TypeOfName};

use crate::context::{CheckerState, resolve_structural, with_narrower};

impl CheckerState<'_> {
    /// Narrow `input` for `symbol` under the assumption that `condition`
    /// evaluated to `assume_true`.
    pub(crate) fn narrow_by_guard(
        &mut self,
        condition: NodeId,
        symbol: SymbolId,
        input: TypeId,
        assume_true: bool,
    ) -> TypeId {
        let Some(kind) = self.arena.kind(condition).cloned() else {
            return input;
        };
        match kind {
            NodeKind::Paren { expr } => self.narrow_by_guard(expr, symbol, input, assume_true),
            NodeKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => self.narrow_by_guard(operand, symbol, input, !assume_true),
            NodeKind::Ident { .. } => {
                if self.refers_to(condition, symbol) {
                    with_narrower(self, |n| n.narrow_by_truthiness(input, assume_true))
                } else {
                    input
                }
            }
            NodeKind::Binary { op, left, right } if op.is_equality() => {
                self.narrow_by_equality_guard(op, left, right, symbol, input, assume_true)
            }
            NodeKind::Binary {
                op: BinaryOp::InstanceOf,
                left,
                right,
            } => self.narrow_by_instanceof(left, right, symbol, input, assume_true),
            NodeKind::Call { callee, arguments } => {
                self.narrow_by_predicate_call(callee, &arguments, symbol, input, assume_true)
            }
            NodeKind::Logical { op, left, right } => {
                self.narrow_by_logical(op, left, right, symbol, input, assume_true)
            }
            _ => input,
        }
    }

    /// Narrow for a nullish-guard condition from `??` or `?.`: `operand`
    /// is known non-nullish on the true edge and nullish on the false one.
    pub(crate) fn narrow_by_nullish_guard(
        &mut self,
        operand: NodeId,
        symbol: SymbolId,
        input: TypeId,
        non_nullish: bool,
    ) -> TypeId {
        if self.refers_to(operand, symbol) {
            with_narrower(self, |n| n.narrow_by_nullish(input, !non_nullish))
        } else {
            input
        }
    }

    fn refers_to(&self, node: NodeId, symbol: SymbolId) -> bool {
        let node = self.skip_parens(node);
        matches!(self.arena.kind(node), Some(NodeKind::Ident { .. }))
            && self.binding.node_symbol.get(&node) == Some(&symbol)
    }

    fn skip_parens(&self, mut node: NodeId) -> NodeId {
        while let Some(NodeKind::Paren { expr }) = self.arena.kind(node) {
            node = *expr;
        }
        node
    }

    // ---- Equality guards ----

    fn narrow_by_equality_guard(
        &mut self,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        symbol: SymbolId,
        input: TypeId,
        assume_true: bool,
    ) -> TypeId {
        // `x != y` under the true assumption behaves like `x == y` under
        // the false one.
        let assume = assume_true ^ op.is_negated();
        let narrowed = self.equality_guard_oriented(op, left, right, symbol, input, assume);
        if narrowed != input {
            return narrowed;
        }
        self.equality_guard_oriented(op, right, left, symbol, input, assume)
    }

    /// One orientation of an equality guard: `subject` tested against
    /// `comparand`.
    fn equality_guard_oriented(
        &mut self,
        op: BinaryOp,
        subject: NodeId,
        comparand: NodeId,
        symbol: SymbolId,
        input: TypeId,
        assume: bool,
    ) -> TypeId {
        let subject = self.skip_parens(subject);
        let comparand = self.skip_parens(comparand);

        // typeof x === "..."
        if let Some(&NodeKind::Unary {
            op: UnaryOp::TypeOf,
            operand,
        }) = self.arena.kind(subject)
            && self.refers_to(operand, symbol)
            && let Some(&NodeKind::StringLit { value }) = self.arena.kind(comparand)
        {
            let text = self.arena.interner().resolve(value);
            return match TypeOfName::parse(text.as_ref()) {
                Some(name) => with_narrower(self, |n| n.narrow_by_typeof(input, name, assume)),
                None => input,
            };
        }

        // x.kind === expr
        if let Some(&NodeKind::Member {
            object,
            property,
            optional: false,
        }) = self.arena.kind(subject)
            && self.refers_to(object, symbol)
        {
            let comparand_type = self.check_expression(comparand);
            return with_narrower(self, |n| {
                n.narrow_by_discriminant(input, property, comparand_type, assume)
            });
        }

        if !self.refers_to(subject, symbol) {
            return input;
        }

        // x == null / x === undefined
        match self.arena.kind(comparand) {
            Some(NodeKind::NullLit) if op.is_loose_equality() => {
                return with_narrower(self, |n| n.narrow_by_nullish(input, assume));
            }
            Some(NodeKind::UndefinedLit) if op.is_loose_equality() => {
                return with_narrower(self, |n| n.narrow_by_nullish(input, assume));
            }
            _ => {}
        }

        let comparand_type = self.check_expression(comparand);
        with_narrower(self, |n| n.narrow_by_equality(input, comparand_type, assume))
    }

    // ---- instanceof ----

    fn narrow_by_instanceof(
        &mut self,
        left: NodeId,
        right: NodeId,
        symbol: SymbolId,
        input: TypeId,
        assume_true: bool,
    ) -> TypeId {
        if !self.refers_to(left, symbol) {
            return input;
        }
        let ctor_type = self.check_expression(right);
        let resolved = resolve_structural(self, ctor_type);
        let Some(TypeData::Object(shape_id)) = self.types.lookup(resolved) else {
            return input;
        };
        let instance = self
            .types
            .object_shape(shape_id)
            .and_then(|shape| shape.construct_signatures.first().copied())
            .and_then(|signature| self.types.signature(signature))
            .map(|signature| signature.return_type);
        match instance {
            Some(instance) => {
                with_narrower(self, |n| n.narrow_to_candidate(input, instance, assume_true))
            }
            None => input,
        }
    }

    // ---- User-defined type guards ----

    fn narrow_by_predicate_call(
        &mut self,
        callee: NodeId,
        arguments: &[NodeId],
        symbol: SymbolId,
        input: TypeId,
        assume_true: bool,
    ) -> TypeId {
        let callee_type = self.check_expression(callee);
        let resolved = resolve_structural(self, callee_type);
        let Some(TypeData::Function(signature)) = self.types.lookup(resolved) else {
            return input;
        };
        let Some(predicate) = self
            .types
            .signature(signature)
            .and_then(|signature| signature.type_predicate)
        else {
            return input;
        };
        let tested = arguments.get(predicate.param_index as usize).copied();
        match tested {
            Some(argument) if self.refers_to(argument, symbol) => {
                with_narrower(self, |n| {
                    n.narrow_to_candidate(input, predicate.target, assume_true)
                })
            }
            _ => input,
        }
    }

    // ---- Logical composition ----

    fn narrow_by_logical(
        &mut self,
        op: LogicalOp,
        left: NodeId,
        right: NodeId,
        symbol: SymbolId,
        input: TypeId,
        assume_true: bool,
    ) -> TypeId {
        match (op, assume_true) {
            // Both operands held.
            (LogicalOp::And, true) => {
                let after_left = self.narrow_by_guard(left, symbol, input, true);
                self.narrow_by_guard(right, symbol, after_left, true)
            }
            // Either the left was false, or it was true and the right was
            // false.
            (LogicalOp::And, false) => {
                let left_false = self.narrow_by_guard(left, symbol, input, false);
                let left_true = self.narrow_by_guard(left, symbol, input, true);
                let right_false = self.narrow_by_guard(right, symbol, left_true, false);
                self.types.union2(left_false, right_false)
            }
            // Either the left was true, or it was false and the right was
            // true.
            (LogicalOp::Or, true) => {
                let left_true = self.narrow_by_guard(left, symbol, input, true);
                let left_false = self.narrow_by_guard(left, symbol, input, false);
                let right_true = self.narrow_by_guard(right, symbol, left_false, true);
                self.types.union2(left_true, right_true)
            }
            // Both operands were false.
            (LogicalOp::Or, false) => {
                let after_left = self.narrow_by_guard(left, symbol, input, false);
                self.narrow_by_guard(right, symbol, after_left, false)
            }
            // As a boolean condition `??` says nothing about its operands;
            // the nullishness of the left one flows through the dedicated
            // nullish-guard condition nodes instead.
            (LogicalOp::Coalesce, _) => input,
        }
    }
}
