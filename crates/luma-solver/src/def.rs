//! Definition identifiers and storage.
//!
//! A `DefId` names a declared type (interface, type alias, enum) without
//! committing to its body. `TypeData::Lazy(DefId)` is the indirection that
//! lets recursive types exist: the body is computed on demand and may refer
//! back to the same `DefId`.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use luma_common::interner::Atom;
use tracing::trace;

use crate::types::{LiteralValue, TypeId};

/// Solver-owned definition identifier.
///
/// Unlike symbol ids, `DefId`s are allocated by the solver and can be
/// created without a binder, which keeps relation tests independent of the
/// front end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

/// Kind of type definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    /// `type Foo = ...`: transparent, always expands to its body.
    TypeAlias,
    /// `interface Point { ... }`: kept opaque until a relation or member
    /// lookup needs the body; declarations with the same name merge.
    Interface,
    /// `enum Color { ... }`: nominal, members relate only within their
    /// definition.
    Enum,
}

/// Stored definition data, retrieved by `DefId`.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    /// Name, for diagnostics and formatting.
    pub name: Atom,
    /// The structural body. `None` until computed for lazy definitions.
    pub body: Option<TypeId>,
    /// For enums: member names and values.
    pub enum_members: Vec<(Atom, LiteralValue)>,
}

impl DefinitionInfo {
    pub const fn type_alias(name: Atom, body: TypeId) -> Self {
        Self {
            kind: DefKind::TypeAlias,
            name,
            body: Some(body),
            enum_members: Vec::new(),
        }
    }

    /// Interface with a body computed on demand.
    pub const fn interface(name: Atom) -> Self {
        Self {
            kind: DefKind::Interface,
            name,
            body: None,
            enum_members: Vec::new(),
        }
    }

    pub const fn enumeration(name: Atom, members: Vec<(Atom, LiteralValue)>) -> Self {
        Self {
            kind: DefKind::Enum,
            name,
            body: None,
            enum_members: members,
        }
    }
}

/// Thread-safe storage for type definitions.
///
/// Uses `DashMap` for concurrent access from parallel checking threads.
pub struct DefinitionStore {
    definitions: DashMap<DefId, DefinitionInfo>,
    next_id: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
        }
    }

    fn allocate(&self) -> DefId {
        DefId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a new definition and return its `DefId`.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = self.allocate();
        trace!(def_id = id.0, kind = ?info.kind, "register definition");
        self.definitions.insert(id, info);
        id
    }

    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|entry| entry.clone())
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|entry| entry.kind)
    }

    pub fn get_name(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|entry| entry.name)
    }

    pub fn get_body(&self, id: DefId) -> Option<TypeId> {
        self.definitions.get(&id).and_then(|entry| entry.body)
    }

    /// Record the computed body for a lazy definition.
    pub fn set_body(&self, id: DefId, body: TypeId) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.body = Some(body);
        }
    }

    pub fn get_enum_members(&self, id: DefId) -> Option<Vec<(Atom, LiteralValue)>> {
        self.definitions
            .get(&id)
            .map(|entry| entry.enum_members.clone())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Seam for resolving `TypeData::Lazy` during relation checking.
///
/// The checker implements this with on-demand lowering; solver tests use
/// [`StoreResolver`], which only reads bodies already recorded in the store.
pub trait TypeResolver {
    /// Body of a lazy definition, or `None` when it cannot be resolved.
    fn resolve_lazy(&self, def: DefId) -> Option<TypeId>;
}

/// Resolver over bodies already present in a [`DefinitionStore`].
pub struct StoreResolver<'a> {
    store: &'a DefinitionStore,
}

impl<'a> StoreResolver<'a> {
    pub fn new(store: &'a DefinitionStore) -> Self {
        Self { store }
    }
}

impl TypeResolver for StoreResolver<'_> {
    fn resolve_lazy(&self, def: DefId) -> Option<TypeId> {
        self.store.get_body(def)
    }
}

/// Resolver that never resolves; lazy types stay opaque.
pub struct NoopResolver;

impl TypeResolver for NoopResolver {
    fn resolve_lazy(&self, _def: DefId) -> Option<TypeId> {
        None
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
