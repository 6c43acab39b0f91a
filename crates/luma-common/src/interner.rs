//! String interning.
//!
//! Identifiers and property names occur many times across a program. Interning
//! replaces each distinct string with a small integer handle (`Atom`) so that
//! name comparisons are a single `u32` compare and hash maps keyed by names
//! stay compact.

use std::sync::Arc;
use std::sync::RwLock;

use dashmap::DashMap;

/// Handle to an interned string.
///
/// Atoms from the same [`Interner`] compare equal iff the underlying strings
/// are equal. Atoms are meaningless across interners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// Sentinel for "no name".
    pub const NONE: Atom = Atom(u32::MAX);
}

/// Thread-safe string interner.
///
/// Interning takes `&self` so the interner can be shared behind an `Arc`
/// between the AST builder, the binder, and the type interner without
/// coordination.
#[derive(Debug, Default)]
pub struct Interner {
    map: DashMap<Arc<str>, Atom>,
    strings: RwLock<Vec<Arc<str>>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its atom. Idempotent.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(existing) = self.map.get(text) {
            return *existing;
        }
        let arc: Arc<str> = Arc::from(text);
        // Entry API keeps concurrent interns of the same string from
        // allocating two atoms.
        *self.map.entry(arc.clone()).or_insert_with(|| {
            let mut strings = self
                .strings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let atom = Atom(strings.len() as u32);
            strings.push(arc);
            atom
        })
    }

    /// Resolve an atom back to its string.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self
            .strings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        let strings = self
            .strings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let interner = Interner::new();
        let a = interner.intern("kind");
        let b = interner.intern("kind");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_atoms() {
        let interner = Interner::new();
        let a = interner.intern("left");
        let b = interner.intern("right");
        assert_ne!(a, b);
        assert_eq!(&*interner.resolve(a), "left");
        assert_eq!(&*interner.resolve(b), "right");
    }

    #[test]
    fn resolve_of_unknown_atom_is_empty() {
        let interner = Interner::new();
        assert_eq!(&*interner.resolve(Atom(42)), "");
    }
}
