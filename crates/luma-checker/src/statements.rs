//! Statement checking.

use luma_ast::{NodeId, NodeKind};
use luma_solver::TypeId;

use crate::context::CheckerState;

impl CheckerState<'_> {
    pub(crate) fn check_statement(&mut self, node: NodeId) {
        let Some(kind) = self.arena.kind(node).cloned() else {
            return;
        };
        match kind {
            NodeKind::VarDecl {
                annotation,
                initializer,
                ..
            } => self.check_var_decl(node, annotation, initializer),
            NodeKind::ExprStmt { expr } => {
                self.check_expression(expr);
            }
            NodeKind::Block { statements } => {
                for &statement in &statements {
                    self.check_statement(statement);
                }
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expression(condition);
                self.check_statement(then_branch);
                if !else_branch.is_none() {
                    self.check_statement(else_branch);
                }
            }
            NodeKind::While { condition, body } => {
                self.check_expression(condition);
                self.check_statement(body);
            }
            NodeKind::DoWhile { body, condition } => {
                self.check_statement(body);
                self.check_expression(condition);
            }
            NodeKind::For {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                if !initializer.is_none() {
                    if matches!(self.arena.kind(initializer), Some(NodeKind::VarDecl { .. })) {
                        self.check_statement(initializer);
                    } else {
                        self.check_expression(initializer);
                    }
                }
                if !condition.is_none() {
                    self.check_expression(condition);
                }
                if !incrementor.is_none() {
                    self.check_expression(incrementor);
                }
                self.check_statement(body);
            }
            NodeKind::Return { expr } => self.check_return(node, expr),
            NodeKind::Break | NodeKind::Continue => {}
            NodeKind::Throw { expr } => {
                self.check_expression(expr);
            }
            NodeKind::Try {
                block,
                catch_block,
                finally_block,
                ..
            } => {
                self.check_statement(block);
                if !catch_block.is_none() {
                    self.check_statement(catch_block);
                }
                if !finally_block.is_none() {
                    self.check_statement(finally_block);
                }
            }
            NodeKind::FuncDecl {
                return_annotation,
                predicate,
                body,
                ..
            } => {
                // Referencing the function forces its signature (and any
                // diagnostics in the annotations) before the body runs.
                if let Some(&symbol) = self.binding.node_symbol.get(&node) {
                    self.type_of_symbol(symbol);
                }
                let expected = if predicate.is_some() {
                    Some(TypeId::BOOLEAN)
                } else if return_annotation.is_none() {
                    None
                } else {
                    Some(self.lower_annotation(return_annotation))
                };
                self.return_types.push(expected);
                self.check_statement(body);
                self.return_types.pop();
            }
            NodeKind::TypeAliasDecl { .. } => {
                // Resolving the alias here surfaces circular-reference
                // diagnostics even when nothing else mentions it.
                if let Some(&symbol) = self.binding.node_symbol.get(&node) {
                    self.type_of_symbol(symbol);
                }
            }
            // Bodies were lowered during the declaration pass.
            NodeKind::InterfaceDecl { .. } | NodeKind::EnumDecl { .. } => {}
            _ => {}
        }
    }

    fn check_var_decl(&mut self, node: NodeId, annotation: NodeId, initializer: NodeId) {
        let declared = match self.binding.node_symbol.get(&node) {
            // Forces inference and the circular-initializer check.
            Some(&symbol) => self.type_of_symbol(symbol),
            None => TypeId::ERROR,
        };
        if initializer.is_none() {
            return;
        }
        let initializer_type = self.check_expression(initializer);
        // With no annotation the declared type came from this initializer;
        // checking it against itself would be vacuous.
        if !annotation.is_none() {
            self.report_assignability(initializer, initializer_type, declared);
        }
    }

    fn check_return(&mut self, node: NodeId, expr: NodeId) {
        let expr_type = if expr.is_none() {
            TypeId::VOID
        } else {
            self.check_expression(expr)
        };
        let Some(&Some(expected)) = self.return_types.last() else {
            return;
        };
        let at = if expr.is_none() { node } else { expr };
        self.report_assignability(at, expr_type, expected);
    }
}
