//! Symbols and symbol storage.

use luma_ast::NodeId;
use luma_common::Atom;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Index of a symbol in a [`SymbolArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Symbol classification flags.
///
/// Plain `u32` constants instead of an enum: a merged symbol carries the
/// union of its declarations' flags.
pub mod symbol_flags {
    /// `let` binding.
    pub const VARIABLE: u32 = 1 << 0;
    /// `const` binding.
    pub const CONST: u32 = 1 << 1;
    pub const PARAMETER: u32 = 1 << 2;
    pub const FUNCTION: u32 = 1 << 3;
    pub const INTERFACE: u32 = 1 << 4;
    pub const TYPE_ALIAS: u32 = 1 << 5;
    pub const ENUM: u32 = 1 << 6;

    /// Symbols that name a value.
    pub const VALUE: u32 = VARIABLE | CONST | PARAMETER | FUNCTION | ENUM;
    /// Symbols that name a type.
    pub const TYPE: u32 = INTERFACE | TYPE_ALIAS | ENUM;
}

/// A declared name.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Atom,
    pub flags: u32,
    /// Every declaration site. Interfaces accumulate one entry per merged
    /// declaration; most symbols have exactly one.
    pub declarations: SmallVec<[NodeId; 1]>,
    /// The declaration the checker reads the type from.
    pub value_declaration: NodeId,
}

impl Symbol {
    pub fn new(name: Atom, flags: u32, declaration: NodeId) -> Self {
        Self {
            name,
            flags,
            declarations: SmallVec::from_buf([declaration]),
            value_declaration: declaration,
        }
    }

    pub fn has_any_flags(&self, flags: u32) -> bool {
        self.flags & flags != 0
    }

    /// Assignments to the symbol are rejected.
    pub fn is_read_only(&self) -> bool {
        self.has_any_flags(symbol_flags::CONST | symbol_flags::FUNCTION)
    }
}

/// Flat storage for every symbol in a file.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId(index as u32), symbol))
    }
}

/// Name-to-symbol map for one scope.
pub type SymbolTable = FxHashMap<Atom, SymbolId>;
