//! Program-level orchestration.
//!
//! A [`Program`] owns the shared tables (string interner, type interner,
//! definition store, relation cache) and a set of source files. Files are
//! bound one by one, then checked in parallel; the shared tables are all
//! concurrent, so checking threads only ever append to them.

use std::sync::Arc;

use luma_ast::{NodeArena, NodeId};
use luma_binder::{BindResult, BinderState, SymbolId};
use luma_common::diagnostics::diagnostic_messages;
use luma_common::interner::Interner;
use luma_common::{CancellationToken, Diagnostic};
use luma_solver::{
    DefinitionStore, RelationCache, RelationChecker, RelationFailure, RelationKind, StoreResolver,
    TypeFormatter, TypeId, TypeInterner, explain_failure,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::context::CheckerState;

/// One file's AST, ready to bind.
pub struct SourceFile {
    pub name: String,
    pub arena: NodeArena,
    pub statements: Vec<NodeId>,
}

/// Everything checking produced for one file.
pub struct CheckedFile {
    pub binding: BindResult,
    /// Checked type of every visited expression node.
    pub node_types: FxHashMap<NodeId, TypeId>,
    /// Declared type of every resolved symbol.
    pub symbol_types: FxHashMap<SymbolId, TypeId>,
    /// Binder and checker diagnostics, sorted by position then code.
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Program {
    atoms: Arc<Interner>,
    types: TypeInterner,
    defs: DefinitionStore,
    relation_cache: RelationCache,
    cancel: CancellationToken,
    files: Vec<SourceFile>,
    checked: Vec<CheckedFile>,
}

impl Program {
    pub fn new() -> Self {
        let atoms = Arc::new(Interner::new());
        Self {
            types: TypeInterner::with_interner(Arc::clone(&atoms)),
            atoms,
            defs: DefinitionStore::new(),
            relation_cache: RelationCache::default(),
            cancel: CancellationToken::new(),
            files: Vec::new(),
            checked: Vec::new(),
        }
    }

    /// The shared string interner; arenas for this program must be built
    /// with it so atoms compare equal across files and types.
    pub fn interner(&self) -> Arc<Interner> {
        Arc::clone(&self.atoms)
    }

    /// A fresh arena wired to this program's interner.
    pub fn new_arena(&self) -> NodeArena {
        NodeArena::new(self.interner())
    }

    pub fn types(&self) -> &TypeInterner {
        &self.types
    }

    pub fn defs(&self) -> &DefinitionStore {
        &self.defs
    }

    /// Token that cancels in-flight relation checks for this program.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Add a file; returns its index for later queries.
    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        arena: NodeArena,
        statements: Vec<NodeId>,
    ) -> usize {
        self.files.push(SourceFile {
            name: name.into(),
            arena,
            statements,
        });
        self.files.len() - 1
    }

    /// Bind every file, then check them. Binding is sequential and cheap;
    /// checking dominates and files are independent over the shared tables,
    /// so that phase runs in parallel.
    pub fn check(&mut self) {
        let bindings: Vec<BindResult> = self
            .files
            .iter()
            .map(|file| BinderState::new(&file.arena, &file.name).bind_source(&file.statements))
            .collect();
        let types = &self.types;
        let defs = &self.defs;
        let relation_cache = &self.relation_cache;
        let cancel = &self.cancel;
        self.checked = self
            .files
            .par_iter()
            .zip(bindings.into_par_iter())
            .map(|(file, binding)| check_file(file, binding, types, defs, relation_cache, cancel))
            .collect();
        debug!(
            files = self.files.len(),
            diagnostics = self.diagnostic_count(),
            "program checked"
        );
    }

    pub fn checked_file(&self, file: usize) -> Option<&CheckedFile> {
        self.checked.get(file)
    }

    /// All diagnostics in file order, each file's already sorted.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.checked.iter().flat_map(|file| file.diagnostics.iter())
    }

    pub fn diagnostic_count(&self) -> usize {
        self.checked.iter().map(|file| file.diagnostics.len()).sum()
    }

    /// Checked type of an expression node, if that node was visited.
    pub fn type_at(&self, file: usize, node: NodeId) -> Option<TypeId> {
        self.checked.get(file)?.node_types.get(&node).copied()
    }

    /// Symbol a declaration or reference node resolved to.
    pub fn symbol_at(&self, file: usize, node: NodeId) -> Option<SymbolId> {
        self.checked
            .get(file)?
            .binding
            .node_symbol
            .get(&node)
            .copied()
    }

    /// Declared type of a symbol, if checking resolved it.
    pub fn type_of_symbol(&self, file: usize, symbol: SymbolId) -> Option<TypeId> {
        self.checked.get(file)?.symbol_types.get(&symbol).copied()
    }

    /// Assignability query against this program's definitions and cache.
    pub fn is_assignable(&self, source: TypeId, target: TypeId) -> bool {
        let resolver = StoreResolver::new(&self.defs);
        RelationChecker::new(&self.types, &resolver, &self.relation_cache)
            .with_defs(&self.defs)
            .is_related_to(source, target, RelationKind::Assignable)
    }

    /// Assignability query that also explains a failure. The diagnostic
    /// carries no source location; callers attach their own.
    pub fn check_assignability(&self, source: TypeId, target: TypeId) -> (bool, Vec<Diagnostic>) {
        if self.is_assignable(source, target) {
            return (true, Vec::new());
        }
        let resolver = StoreResolver::new(&self.defs);
        let failure = explain_failure(
            &self.types,
            &resolver,
            Some(&self.defs),
            source,
            target,
            RelationKind::Assignable,
        );
        let diagnostic = match failure {
            Some(RelationFailure::ExcessProperty { name, target }) => Diagnostic::from_message(
                "",
                0,
                0,
                diagnostic_messages::EXCESS_PROPERTY,
                &[
                    self.atoms.resolve(name).as_ref(),
                    &self.format_type(target),
                ],
            ),
            Some(RelationFailure::MissingProperty {
                name,
                source,
                target,
            }) => Diagnostic::from_message(
                "",
                0,
                0,
                diagnostic_messages::PROPERTY_MISSING,
                &[
                    self.atoms.resolve(name).as_ref(),
                    &self.format_type(source),
                    &self.format_type(target),
                ],
            ),
            _ => Diagnostic::from_message(
                "",
                0,
                0,
                diagnostic_messages::TYPE_NOT_ASSIGNABLE,
                &[&self.format_type(source), &self.format_type(target)],
            ),
        };
        (false, vec![diagnostic])
    }

    pub fn format_type(&self, ty: TypeId) -> String {
        TypeFormatter::with_defs(&self.types, &self.defs).format(ty)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

fn check_file(
    file: &SourceFile,
    mut binding: BindResult,
    types: &TypeInterner,
    defs: &DefinitionStore,
    relation_cache: &RelationCache,
    cancel: &CancellationToken,
) -> CheckedFile {
    let mut diagnostics = std::mem::take(&mut binding.diagnostics);
    let mut state = CheckerState::new(
        &file.arena,
        &file.name,
        &binding,
        types,
        defs,
        relation_cache,
    )
    .with_cancellation(cancel);
    state.check_source(&file.statements);
    let CheckerState {
        diagnostics: checker_diagnostics,
        node_types,
        symbol_types,
        ..
    } = state;
    diagnostics.extend(checker_diagnostics);
    diagnostics.sort_by_key(|diagnostic| (diagnostic.start, diagnostic.code));
    // In-progress markers only survive an aborted resolution; drop them.
    let symbol_types = symbol_types
        .into_iter()
        .filter_map(|(symbol, ty)| ty.map(|ty| (symbol, ty)))
        .collect();
    CheckedFile {
        binding,
        node_types,
        symbol_types,
        diagnostics,
    }
}
