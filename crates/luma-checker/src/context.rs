//! Shared checker state and relation helpers.
//!
//! One `CheckerState` checks one bound file. The type interner, definition
//! store, and relation cache are program-wide and shared by reference;
//! everything else is per file. All mutation goes through `&mut self`, so a
//! file is checked by exactly one thread and the shared tables are the only
//! cross-thread surface.

use luma_ast::{NodeArena, NodeId};
use luma_binder::{BindResult, FlowNodeId, SymbolId};
use luma_common::diagnostics::{DiagnosticMessage, diagnostic_messages};
use luma_common::{CancellationToken, Diagnostic};
use luma_solver::{
    DefId, DefinitionStore, Narrower, RelationCache, RelationChecker, RelationFailure,
    RelationKind, StoreResolver, TypeFormatter, TypeId, TypeInterner, explain_failure,
};
use rustc_hash::FxHashMap;

pub struct CheckerState<'a> {
    pub arena: &'a NodeArena,
    pub file_name: &'a str,
    pub binding: &'a BindResult,
    pub types: &'a TypeInterner,
    pub defs: &'a DefinitionStore,
    pub relation_cache: &'a RelationCache,
    pub cancel: Option<&'a CancellationToken>,
    pub diagnostics: Vec<Diagnostic>,
    /// Checked type of every visited expression node.
    pub(crate) node_types: FxHashMap<NodeId, TypeId>,
    /// Resolved symbol types; `None` marks a resolution in progress, which
    /// is how circular initializers and aliases are detected.
    pub(crate) symbol_types: FxHashMap<SymbolId, Option<TypeId>>,
    /// Definition ids for interface/enum symbols.
    pub(crate) symbol_defs: FxHashMap<SymbolId, DefId>,
    /// Memoized flow analysis results.
    pub(crate) flow_types: FxHashMap<(FlowNodeId, SymbolId), TypeId>,
    /// Expected return types of the enclosing function declarations.
    pub(crate) return_types: Vec<Option<TypeId>>,
    pub(crate) flow_depth: u32,
}

impl<'a> CheckerState<'a> {
    pub fn new(
        arena: &'a NodeArena,
        file_name: &'a str,
        binding: &'a BindResult,
        types: &'a TypeInterner,
        defs: &'a DefinitionStore,
        relation_cache: &'a RelationCache,
    ) -> Self {
        Self {
            arena,
            file_name,
            binding,
            types,
            defs,
            relation_cache,
            cancel: None,
            diagnostics: Vec::new(),
            node_types: FxHashMap::default(),
            symbol_types: FxHashMap::default(),
            symbol_defs: FxHashMap::default(),
            flow_types: FxHashMap::default(),
            return_types: Vec::new(),
            flow_depth: 0,
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Cancelled checks finish their current expression with whatever is
    /// known but stop memoizing, so no partial answer outlives the check.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|token| token.is_cancelled())
    }

    /// Check a file: declarations first so every named type has a
    /// definition, then statements.
    pub fn check_source(&mut self, statements: &[NodeId]) {
        self.declare_types(statements);
        for &statement in statements {
            self.check_statement(statement);
        }
    }

    pub fn error_at(&mut self, node: NodeId, message: DiagnosticMessage, args: &[&str]) {
        let span = self.arena.span(node);
        self.diagnostics.push(Diagnostic::from_message(
            self.file_name,
            span.start,
            span.len(),
            message,
            args,
        ));
    }

    pub fn format_type(&self, ty: TypeId) -> String {
        TypeFormatter::with_defs(self.types, self.defs).format(ty)
    }

    /// Check assignability and report a structured diagnostic on failure.
    /// Error types are silently compatible so one failure does not cascade.
    pub(crate) fn report_assignability(
        &mut self,
        node: NodeId,
        source: TypeId,
        target: TypeId,
    ) -> bool {
        if source == TypeId::ERROR || target == TypeId::ERROR {
            return true;
        }
        let outcome = query_relation(self, source, target, RelationKind::Assignable);
        if outcome.related {
            return true;
        }
        if outcome.depth_exceeded {
            let source_text = self.format_type(source);
            let target_text = self.format_type(target);
            self.error_at(
                node,
                diagnostic_messages::COMPARISON_TOO_DEEP,
                &[&source_text, &target_text],
            );
            return false;
        }

        let resolver = StoreResolver::new(self.defs);
        let failure = explain_failure(
            self.types,
            &resolver,
            Some(self.defs),
            source,
            target,
            RelationKind::Assignable,
        );
        match failure {
            Some(RelationFailure::ExcessProperty { name, target }) => {
                let property = self.arena.interner().resolve(name);
                let target_text = self.format_type(target);
                self.error_at(
                    node,
                    diagnostic_messages::EXCESS_PROPERTY,
                    &[property.as_ref(), &target_text],
                );
            }
            Some(RelationFailure::MissingProperty {
                name,
                source,
                target,
            }) => {
                let property = self.arena.interner().resolve(name);
                let source_text = self.format_type(source);
                let target_text = self.format_type(target);
                self.error_at(
                    node,
                    diagnostic_messages::PROPERTY_MISSING,
                    &[property.as_ref(), &source_text, &target_text],
                );
            }
            _ => {
                let source_text = self.format_type(source);
                let target_text = self.format_type(target);
                self.error_at(
                    node,
                    diagnostic_messages::TYPE_NOT_ASSIGNABLE,
                    &[&source_text, &target_text],
                );
            }
        }
        false
    }
}

/// Outcome of a relation query, with depth exhaustion surfaced so the
/// caller can report it once.
pub(crate) struct RelationOutcome {
    pub related: bool,
    pub depth_exceeded: bool,
}

pub(crate) fn query_relation(
    state: &CheckerState<'_>,
    source: TypeId,
    target: TypeId,
    kind: RelationKind,
) -> RelationOutcome {
    let resolver = StoreResolver::new(state.defs);
    let mut checker =
        RelationChecker::new(state.types, &resolver, state.relation_cache).with_defs(state.defs);
    if let Some(token) = state.cancel {
        checker = checker.with_cancellation(token);
    }
    let related = checker.is_related_to(source, target, kind);
    RelationOutcome {
        related,
        depth_exceeded: checker.depth_exceeded(),
    }
}

pub(crate) fn is_assignable(state: &CheckerState<'_>, source: TypeId, target: TypeId) -> bool {
    query_relation(state, source, target, RelationKind::Assignable).related
}

/// Follow lazy definition references to the structural type behind them.
pub(crate) fn resolve_structural(state: &CheckerState<'_>, ty: TypeId) -> TypeId {
    let resolver = StoreResolver::new(state.defs);
    let mut checker =
        RelationChecker::new(state.types, &resolver, state.relation_cache).with_defs(state.defs);
    checker.resolve_structural(ty)
}

/// Run a narrowing operation against the shared relation cache.
pub(crate) fn with_narrower<T>(
    state: &CheckerState<'_>,
    f: impl FnOnce(&mut Narrower<'_, '_, StoreResolver<'_>>) -> T,
) -> T {
    let resolver = StoreResolver::new(state.defs);
    let mut checker =
        RelationChecker::new(state.types, &resolver, state.relation_cache).with_defs(state.defs);
    let mut narrower = Narrower::new(state.types, &mut checker);
    f(&mut narrower)
}
