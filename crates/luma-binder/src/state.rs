//! Binder state: scopes, symbol tables, and flow graph construction.
//!
//! Binding is a single pass over the AST. Declarations populate the scope
//! stack (function, interface, alias, and enum names are hoisted to the top
//! of their block), identifier references are resolved to symbols, and every
//! statement and expression threads `current_flow` through the backward flow
//! graph that narrowing later walks.

use luma_ast::{LogicalOp, NodeArena, NodeId, NodeKind, VarDeclKind};
use luma_common::diagnostics::diagnostic_messages;
use luma_common::{Atom, Diagnostic};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::flow::{FlowNodeArena, FlowNodeId, flow_flags};
use crate::symbols::{Symbol, SymbolArena, SymbolId, SymbolTable, symbol_flags};

/// Everything the binder produces for one file.
pub struct BindResult {
    pub symbols: SymbolArena,
    pub flow: FlowNodeArena,
    /// Declaration and reference nodes to their symbol.
    pub node_symbol: FxHashMap<NodeId, SymbolId>,
    /// Reference nodes to the flow node in effect at that point.
    pub node_flow: FxHashMap<NodeId, FlowNodeId>,
    /// The file's top-level scope.
    pub file_scope: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct BinderState<'a> {
    arena: &'a NodeArena,
    file_name: &'a str,
    symbols: SymbolArena,
    flow: FlowNodeArena,
    scopes: Vec<SymbolTable>,
    node_symbol: FxHashMap<NodeId, SymbolId>,
    node_flow: FxHashMap<NodeId, FlowNodeId>,
    current_flow: FlowNodeId,
    unreachable_flow: FlowNodeId,
    break_targets: Vec<FlowNodeId>,
    continue_targets: Vec<FlowNodeId>,
    exception_targets: Vec<FlowNodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> BinderState<'a> {
    pub fn new(arena: &'a NodeArena, file_name: &'a str) -> Self {
        let mut flow = FlowNodeArena::new();
        let unreachable_flow = flow.alloc(flow_flags::UNREACHABLE);
        Self {
            arena,
            file_name,
            symbols: SymbolArena::new(),
            flow,
            scopes: Vec::new(),
            node_symbol: FxHashMap::default(),
            node_flow: FxHashMap::default(),
            current_flow: FlowNodeId::NONE,
            unreachable_flow,
            break_targets: Vec::new(),
            continue_targets: Vec::new(),
            exception_targets: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Bind a file's top-level statements.
    pub fn bind_source(mut self, statements: &[NodeId]) -> BindResult {
        self.scopes.push(SymbolTable::default());
        let start = self.flow.alloc(flow_flags::START);
        self.current_flow = start;
        self.bind_statements(statements);
        let file_scope = self.scopes.pop().unwrap_or_default();
        trace!(
            symbols = self.symbols.len(),
            flow_nodes = self.flow.len(),
            "bound source file"
        );
        BindResult {
            symbols: self.symbols,
            flow: self.flow,
            node_symbol: self.node_symbol,
            node_flow: self.node_flow,
            file_scope,
            diagnostics: self.diagnostics,
        }
    }

    // ---- Scopes and symbols ----

    fn declare(&mut self, name: Atom, flags: u32, declaration: NodeId) -> SymbolId {
        debug_assert!(!self.scopes.is_empty(), "declare outside any scope");
        let Some(scope) = self.scopes.last_mut() else {
            return SymbolId::NONE;
        };
        if let Some(&existing) = scope.get(&name) {
            let mergeable = self
                .symbols
                .get(existing)
                .is_some_and(|symbol| symbol.has_any_flags(symbol_flags::INTERFACE))
                && flags & symbol_flags::INTERFACE != 0;
            if mergeable {
                if let Some(symbol) = self.symbols.get_mut(existing) {
                    symbol.declarations.push(declaration);
                }
            } else {
                let span = self.arena.span(declaration);
                let text = self.arena.interner().resolve(name);
                self.diagnostics.push(Diagnostic::from_message(
                    self.file_name,
                    span.start,
                    span.len(),
                    diagnostic_messages::DUPLICATE_DECLARATION,
                    &[text.as_ref()],
                ));
            }
            self.node_symbol.entry(declaration).or_insert(existing);
            return existing;
        }
        let id = self.symbols.alloc(Symbol::new(name, flags, declaration));
        scope.insert(name, id);
        // Parameters and catch bindings share their enclosing node; keep
        // the first mapping (the declaration the node itself introduces).
        self.node_symbol.entry(declaration).or_insert(id);
        id
    }

    fn resolve(&self, name: Atom) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
    }

    /// Hoist declarations whose names are visible throughout their block.
    fn hoist_declarations(&mut self, statements: &[NodeId]) {
        for &statement in statements {
            match self.arena.kind(statement) {
                Some(NodeKind::FuncDecl { name, .. }) => {
                    self.declare(*name, symbol_flags::FUNCTION, statement);
                }
                Some(NodeKind::InterfaceDecl { name, .. }) => {
                    self.declare(*name, symbol_flags::INTERFACE, statement);
                }
                Some(NodeKind::TypeAliasDecl { name, .. }) => {
                    self.declare(*name, symbol_flags::TYPE_ALIAS, statement);
                }
                Some(NodeKind::EnumDecl { name, .. }) => {
                    self.declare(*name, symbol_flags::ENUM, statement);
                }
                _ => {}
            }
        }
    }

    // ---- Flow helpers ----

    fn create_flow_condition(
        &mut self,
        flags: u32,
        antecedent: FlowNodeId,
        condition: NodeId,
    ) -> FlowNodeId {
        let id = self.flow.alloc_with_node(flags, condition);
        self.flow.add_antecedent(id, antecedent);
        id
    }

    fn create_branch_label(&mut self) -> FlowNodeId {
        self.flow.alloc(flow_flags::BRANCH_LABEL)
    }

    fn create_loop_label(&mut self) -> FlowNodeId {
        self.flow.alloc(flow_flags::LOOP_LABEL)
    }

    /// Add an antecedent unless the incoming flow is dead.
    fn add_live_antecedent(&mut self, label: FlowNodeId, antecedent: FlowNodeId) {
        if antecedent != self.unreachable_flow {
            self.flow.add_antecedent(label, antecedent);
        }
    }

    /// A label with no live antecedents is unreachable code.
    fn finish_label(&mut self, label: FlowNodeId) -> FlowNodeId {
        if self.flow.antecedent_count(label) == 0 {
            self.unreachable_flow
        } else {
            label
        }
    }

    fn create_flow_assignment(&mut self, node: NodeId) {
        let id = self.flow.alloc_with_node(flow_flags::ASSIGNMENT, node);
        self.flow.add_antecedent(id, self.current_flow);
        self.current_flow = id;
    }

    // ---- Statements ----

    fn bind_statements(&mut self, statements: &[NodeId]) {
        self.hoist_declarations(statements);
        for &statement in statements {
            self.bind_statement(statement);
            // Any statement in a try block may throw before the next one.
            if let Some(&target) = self.exception_targets.last() {
                let current = self.current_flow;
                self.add_live_antecedent(target, current);
            }
        }
    }

    pub fn bind_statement(&mut self, node: NodeId) {
        let Some(kind) = self.arena.kind(node).cloned() else {
            return;
        };
        match kind {
            NodeKind::VarDecl {
                name,
                decl_kind,
                annotation,
                initializer,
            } => {
                self.bind_annotation(annotation);
                if !initializer.is_none() {
                    self.bind_expression(initializer);
                }
                let flags = match decl_kind {
                    VarDeclKind::Let => symbol_flags::VARIABLE,
                    VarDeclKind::Const => symbol_flags::CONST,
                };
                self.declare(name, flags, node);
                if !initializer.is_none() {
                    self.create_flow_assignment(node);
                }
            }
            NodeKind::ExprStmt { expr } => self.bind_expression(expr),
            NodeKind::Block { statements } => {
                self.scopes.push(SymbolTable::default());
                self.bind_statements(&statements);
                self.scopes.pop();
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.bind_if(condition, then_branch, else_branch),
            NodeKind::While { condition, body } => self.bind_while(condition, body),
            NodeKind::DoWhile { body, condition } => self.bind_do_while(body, condition),
            NodeKind::For {
                initializer,
                condition,
                incrementor,
                body,
            } => self.bind_for(initializer, condition, incrementor, body),
            NodeKind::Return { expr } => {
                if !expr.is_none() {
                    self.bind_expression(expr);
                }
                self.current_flow = self.unreachable_flow;
            }
            NodeKind::Break => {
                if let Some(&target) = self.break_targets.last() {
                    let current = self.current_flow;
                    self.add_live_antecedent(target, current);
                }
                self.current_flow = self.unreachable_flow;
            }
            NodeKind::Continue => {
                if let Some(&target) = self.continue_targets.last() {
                    let current = self.current_flow;
                    self.add_live_antecedent(target, current);
                }
                self.current_flow = self.unreachable_flow;
            }
            NodeKind::Throw { expr } => {
                self.bind_expression(expr);
                if let Some(&target) = self.exception_targets.last() {
                    let current = self.current_flow;
                    self.add_live_antecedent(target, current);
                }
                self.current_flow = self.unreachable_flow;
            }
            NodeKind::Try {
                block,
                catch_name,
                catch_block,
                finally_block,
            } => self.bind_try(node, block, catch_name, catch_block, finally_block),
            NodeKind::FuncDecl {
                params,
                return_annotation,
                predicate,
                body,
                ..
            } => {
                // The name was hoisted; bind the body in its own scope and
                // flow region.
                for param in &params {
                    self.bind_annotation(param.annotation);
                }
                self.bind_annotation(return_annotation);
                if let Some(predicate) = predicate {
                    self.bind_annotation(predicate.annotation);
                }
                self.bind_function_body(node, &params, body);
            }
            NodeKind::InterfaceDecl { members, .. } => {
                // The name was hoisted; member annotations still need
                // their type names resolved.
                for member in &members {
                    self.bind_annotation(member.annotation);
                }
            }
            NodeKind::TypeAliasDecl { annotation, .. } => {
                self.bind_annotation(annotation);
            }
            NodeKind::EnumDecl { .. } => {
                // Hoisted; member initializers are constant literals the
                // checker evaluates directly.
            }
            _ => {
                debug_assert!(
                    kind.is_type_annotation(),
                    "expression used in statement position: {kind:?}"
                );
            }
        }
    }

    fn bind_if(&mut self, condition: NodeId, then_branch: NodeId, else_branch: NodeId) {
        self.bind_expression(condition);
        let pre_condition_flow = self.current_flow;

        let true_flow =
            self.create_flow_condition(flow_flags::TRUE_CONDITION, pre_condition_flow, condition);
        let false_flow =
            self.create_flow_condition(flow_flags::FALSE_CONDITION, pre_condition_flow, condition);

        self.current_flow = true_flow;
        self.bind_statement(then_branch);
        let after_then = self.current_flow;

        let after_else = if else_branch.is_none() {
            false_flow
        } else {
            self.current_flow = false_flow;
            self.bind_statement(else_branch);
            self.current_flow
        };

        let merge_label = self.create_branch_label();
        self.add_live_antecedent(merge_label, after_then);
        self.add_live_antecedent(merge_label, after_else);
        self.current_flow = self.finish_label(merge_label);
    }

    fn bind_while(&mut self, condition: NodeId, body: NodeId) {
        let loop_label = self.create_loop_label();
        let entry = self.current_flow;
        self.add_live_antecedent(loop_label, entry);
        self.current_flow = loop_label;

        self.bind_expression(condition);
        let true_flow =
            self.create_flow_condition(flow_flags::TRUE_CONDITION, loop_label, condition);
        let false_flow =
            self.create_flow_condition(flow_flags::FALSE_CONDITION, loop_label, condition);

        let post_label = self.create_branch_label();
        self.break_targets.push(post_label);
        self.continue_targets.push(loop_label);
        self.current_flow = true_flow;
        self.bind_statement(body);
        self.break_targets.pop();
        self.continue_targets.pop();

        // Back edge: the loop head joins the state after the body.
        let after_body = self.current_flow;
        self.add_live_antecedent(loop_label, after_body);

        self.add_live_antecedent(post_label, false_flow);
        self.current_flow = self.finish_label(post_label);
    }

    fn bind_do_while(&mut self, body: NodeId, condition: NodeId) {
        let loop_label = self.create_loop_label();
        let entry = self.current_flow;
        self.add_live_antecedent(loop_label, entry);
        self.current_flow = loop_label;

        let post_label = self.create_branch_label();
        // `continue` jumps to the condition, not the loop head.
        let condition_label = self.create_branch_label();
        self.break_targets.push(post_label);
        self.continue_targets.push(condition_label);
        self.bind_statement(body);
        self.break_targets.pop();
        self.continue_targets.pop();

        let after_body = self.current_flow;
        self.add_live_antecedent(condition_label, after_body);
        self.current_flow = self.finish_label(condition_label);

        self.bind_expression(condition);
        let pre_condition_flow = self.current_flow;
        let true_flow =
            self.create_flow_condition(flow_flags::TRUE_CONDITION, pre_condition_flow, condition);
        let false_flow =
            self.create_flow_condition(flow_flags::FALSE_CONDITION, pre_condition_flow, condition);
        self.add_live_antecedent(loop_label, true_flow);

        self.add_live_antecedent(post_label, false_flow);
        self.current_flow = self.finish_label(post_label);
    }

    fn bind_for(
        &mut self,
        initializer: NodeId,
        condition: NodeId,
        incrementor: NodeId,
        body: NodeId,
    ) {
        // The initializer's declarations scope over the whole loop.
        self.scopes.push(SymbolTable::default());
        if !initializer.is_none() {
            if matches!(self.arena.kind(initializer), Some(NodeKind::VarDecl { .. })) {
                self.bind_statement(initializer);
            } else {
                self.bind_expression(initializer);
            }
        }

        let loop_label = self.create_loop_label();
        let entry = self.current_flow;
        self.add_live_antecedent(loop_label, entry);
        self.current_flow = loop_label;

        let post_label = self.create_branch_label();
        let body_entry = if condition.is_none() {
            self.current_flow
        } else {
            self.bind_expression(condition);
            let true_flow =
                self.create_flow_condition(flow_flags::TRUE_CONDITION, loop_label, condition);
            let false_flow =
                self.create_flow_condition(flow_flags::FALSE_CONDITION, loop_label, condition);
            self.add_live_antecedent(post_label, false_flow);
            true_flow
        };

        let continue_label = self.create_branch_label();
        self.break_targets.push(post_label);
        self.continue_targets.push(continue_label);
        self.current_flow = body_entry;
        self.bind_statement(body);
        self.break_targets.pop();
        self.continue_targets.pop();

        let after_body = self.current_flow;
        self.add_live_antecedent(continue_label, after_body);
        self.current_flow = self.finish_label(continue_label);
        if !incrementor.is_none() {
            self.bind_expression(incrementor);
        }
        let after_increment = self.current_flow;
        self.add_live_antecedent(loop_label, after_increment);

        self.current_flow = self.finish_label(post_label);
        self.scopes.pop();
    }

    fn bind_try(
        &mut self,
        node: NodeId,
        block: NodeId,
        catch_name: Atom,
        catch_block: NodeId,
        finally_block: NodeId,
    ) {
        let after_try;
        let after_catch;
        if catch_block.is_none() {
            self.bind_statement(block);
            after_try = self.current_flow;
            after_catch = self.unreachable_flow;
        } else {
            // Control can reach the catch from the try entry or from after
            // any statement inside the block.
            let catch_label = self.create_branch_label();
            let entry = self.current_flow;
            self.add_live_antecedent(catch_label, entry);
            self.exception_targets.push(catch_label);
            self.bind_statement(block);
            self.exception_targets.pop();
            after_try = self.current_flow;

            self.current_flow = self.finish_label(catch_label);
            self.scopes.push(SymbolTable::default());
            if name_is_present(catch_name) {
                self.declare(catch_name, symbol_flags::VARIABLE, node);
            }
            self.bind_statement(catch_block);
            self.scopes.pop();
            after_catch = self.current_flow;
        }

        let merge_label = self.create_branch_label();
        self.add_live_antecedent(merge_label, after_try);
        self.add_live_antecedent(merge_label, after_catch);
        self.current_flow = self.finish_label(merge_label);

        if !finally_block.is_none() {
            self.bind_statement(finally_block);
        }
    }

    fn bind_function_body(&mut self, node: NodeId, params: &[luma_ast::ParamDecl], body: NodeId) {
        let saved_flow = self.current_flow;
        let saved_breaks = std::mem::take(&mut self.break_targets);
        let saved_continues = std::mem::take(&mut self.continue_targets);
        let saved_exceptions = std::mem::take(&mut self.exception_targets);

        self.scopes.push(SymbolTable::default());
        for param in params {
            self.declare(param.name, symbol_flags::PARAMETER, node);
        }
        let start = self.flow.alloc(flow_flags::START);
        self.current_flow = start;
        self.node_flow.insert(body, start);
        self.bind_statement(body);
        self.scopes.pop();

        self.break_targets = saved_breaks;
        self.continue_targets = saved_continues;
        self.exception_targets = saved_exceptions;
        self.current_flow = saved_flow;
    }

    /// Resolve the type names inside an annotation. Unresolved names are
    /// left unmapped; the checker distinguishes intrinsic names from
    /// genuinely missing ones.
    fn bind_annotation(&mut self, node: NodeId) {
        if node.is_none() {
            return;
        }
        let Some(kind) = self.arena.kind(node).cloned() else {
            return;
        };
        match kind {
            NodeKind::TypeName { name } => {
                if let Some(symbol) = self.resolve(name) {
                    self.node_symbol.insert(node, symbol);
                }
            }
            NodeKind::TypeUnion { members } => {
                for &member in &members {
                    self.bind_annotation(member);
                }
            }
            NodeKind::TypeObject { members } => {
                for member in &members {
                    self.bind_annotation(member.annotation);
                }
            }
            NodeKind::TypeFunc {
                params,
                return_annotation,
            } => {
                for param in &params {
                    self.bind_annotation(param.annotation);
                }
                self.bind_annotation(return_annotation);
            }
            NodeKind::TypeCtor { params, instance } => {
                for param in &params {
                    self.bind_annotation(param.annotation);
                }
                self.bind_annotation(instance);
            }
            _ => {}
        }
    }

    // ---- Expressions ----

    pub fn bind_expression(&mut self, node: NodeId) {
        let Some(kind) = self.arena.kind(node).cloned() else {
            return;
        };
        match kind {
            NodeKind::Ident { name } => {
                match self.resolve(name) {
                    Some(symbol) => {
                        self.node_symbol.insert(node, symbol);
                    }
                    None => {
                        let span = self.arena.span(node);
                        let text = self.arena.interner().resolve(name);
                        self.diagnostics.push(Diagnostic::from_message(
                            self.file_name,
                            span.start,
                            span.len(),
                            diagnostic_messages::UNKNOWN_NAME,
                            &[text.as_ref()],
                        ));
                    }
                }
                self.node_flow.insert(node, self.current_flow);
            }
            NodeKind::NumberLit { .. }
            | NodeKind::StringLit { .. }
            | NodeKind::BoolLit { .. }
            | NodeKind::NullLit
            | NodeKind::UndefinedLit => {}
            NodeKind::ObjectLit { properties } => {
                for property in &properties {
                    self.bind_expression(property.value);
                }
            }
            NodeKind::Member {
                object, optional, ..
            } => {
                self.bind_expression(object);
                if optional {
                    let pre_flow = self.current_flow;
                    self.current_flow = self.create_flow_condition(
                        flow_flags::TRUE_CONDITION | flow_flags::NULLISH_GUARD,
                        pre_flow,
                        object,
                    );
                    self.node_flow.insert(node, self.current_flow);
                    self.finish_optional_chain(pre_flow, object);
                } else {
                    self.node_flow.insert(node, self.current_flow);
                }
            }
            NodeKind::Call { callee, arguments } => {
                let optional_receiver = match self.arena.kind(callee) {
                    Some(&NodeKind::Member {
                        object,
                        optional: true,
                        ..
                    }) => Some(object),
                    _ => None,
                };
                match optional_receiver {
                    Some(object) => {
                        // `a?.f(b)` short-circuits the whole call, so the
                        // arguments evaluate with the receiver known
                        // non-nullish.
                        self.bind_expression(object);
                        let pre_flow = self.current_flow;
                        self.current_flow = self.create_flow_condition(
                            flow_flags::TRUE_CONDITION | flow_flags::NULLISH_GUARD,
                            pre_flow,
                            object,
                        );
                        self.node_flow.insert(callee, self.current_flow);
                        for &argument in &arguments {
                            self.bind_expression(argument);
                        }
                        self.finish_optional_chain(pre_flow, object);
                    }
                    None => {
                        self.bind_expression(callee);
                        for &argument in &arguments {
                            self.bind_expression(argument);
                        }
                    }
                }
            }
            NodeKind::Unary { operand, .. } => self.bind_expression(operand),
            NodeKind::Binary { left, right, .. } => {
                self.bind_expression(left);
                self.bind_expression(right);
            }
            NodeKind::Logical { op, left, right } => self.bind_logical(node, op, left, right),
            NodeKind::Assign { target, value } => {
                self.bind_expression(value);
                self.bind_expression(target);
                self.create_flow_assignment(node);
            }
            NodeKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.bind_expression(condition);
                let pre_condition_flow = self.current_flow;
                let true_flow = self.create_flow_condition(
                    flow_flags::TRUE_CONDITION,
                    pre_condition_flow,
                    condition,
                );
                let false_flow = self.create_flow_condition(
                    flow_flags::FALSE_CONDITION,
                    pre_condition_flow,
                    condition,
                );
                self.current_flow = true_flow;
                self.bind_expression(when_true);
                let after_true = self.current_flow;
                self.current_flow = false_flow;
                self.bind_expression(when_false);
                let after_false = self.current_flow;
                let merge_label = self.create_branch_label();
                self.add_live_antecedent(merge_label, after_true);
                self.add_live_antecedent(merge_label, after_false);
                self.current_flow = self.finish_label(merge_label);
            }
            NodeKind::Paren { expr } => self.bind_expression(expr),
            _ => {
                debug_assert!(
                    false,
                    "statement or annotation in expression position: {kind:?}"
                );
            }
        }
    }

    /// `a && b` evaluates `b` only when `a` is true, so the right operand
    /// is bound under the corresponding condition flow. `??` guards on
    /// nullishness rather than truthiness: its right operand runs only when
    /// the left is nullish, which the nullish-guard conditions express.
    fn bind_logical(&mut self, _node: NodeId, op: LogicalOp, left: NodeId, right: NodeId) {
        self.bind_expression(left);
        let pre_flow = self.current_flow;
        let rhs_entry = match op {
            LogicalOp::And => {
                self.create_flow_condition(flow_flags::TRUE_CONDITION, pre_flow, left)
            }
            LogicalOp::Or => {
                self.create_flow_condition(flow_flags::FALSE_CONDITION, pre_flow, left)
            }
            LogicalOp::Coalesce => self.create_flow_condition(
                flow_flags::FALSE_CONDITION | flow_flags::NULLISH_GUARD,
                pre_flow,
                left,
            ),
        };
        self.current_flow = rhs_entry;
        self.bind_expression(right);
        let after_rhs = self.current_flow;

        let skip_flow = match op {
            LogicalOp::And => {
                self.create_flow_condition(flow_flags::FALSE_CONDITION, pre_flow, left)
            }
            LogicalOp::Or => {
                self.create_flow_condition(flow_flags::TRUE_CONDITION, pre_flow, left)
            }
            LogicalOp::Coalesce => self.create_flow_condition(
                flow_flags::TRUE_CONDITION | flow_flags::NULLISH_GUARD,
                pre_flow,
                left,
            ),
        };
        let merge_label = self.create_branch_label();
        self.add_live_antecedent(merge_label, after_rhs);
        self.add_live_antecedent(merge_label, skip_flow);
        self.current_flow = self.finish_label(merge_label);
    }

    /// Rejoin after an optional chain: the non-nullish continuation merges
    /// with the skip edge on which the receiver was nullish.
    fn finish_optional_chain(&mut self, pre_flow: FlowNodeId, object: NodeId) {
        let after_chain = self.current_flow;
        let skip_flow = self.create_flow_condition(
            flow_flags::FALSE_CONDITION | flow_flags::NULLISH_GUARD,
            pre_flow,
            object,
        );
        let merge_label = self.create_branch_label();
        self.add_live_antecedent(merge_label, after_chain);
        self.add_live_antecedent(merge_label, skip_flow);
        self.current_flow = self.finish_label(merge_label);
    }
}

fn name_is_present(name: Atom) -> bool {
    name != Atom::NONE
}
