//! Type-level narrowing operations.
//!
//! [`Narrower`] refines a declared type by the facts a control-flow guard
//! establishes: `typeof` tests, truthiness, equality against unit types,
//! discriminant property tests, `instanceof`, and user-defined predicates.
//! The flow analysis in the checker decides *which* guard applies at a flow
//! node; the operations here decide *what* it does to a type.
//!
//! All operations are filters over union constituents and never invent
//! constituents that were not in the declared type, with two exceptions:
//! `any`/`unknown` narrow to the guarded type directly, and `boolean`
//! splits into `true`/`false` under truthiness and equality guards.

use luma_common::interner::Atom;

use crate::TypeInterner;
use crate::def::TypeResolver;
use crate::relate::RelationChecker;
use crate::types::{IntrinsicKind, LiteralValue, TypeData, TypeId};
use crate::widening::{widen_freshness, widen_literal};

/// Result category of a `typeof` test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOfName {
    String,
    Number,
    Boolean,
    Object,
    Function,
    Undefined,
}

impl TypeOfName {
    /// Parse the operand of a `typeof x === "..."` comparison.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "function" => Some(Self::Function),
            "undefined" => Some(Self::Undefined),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Function => "function",
            Self::Undefined => "undefined",
        }
    }
}

/// Runtime truthiness of a type's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Truthiness {
    AlwaysTrue,
    AlwaysFalse,
    Either,
}

/// Applies guard facts to types.
///
/// Borrows a [`RelationChecker`] because several guards are phrased in
/// terms of assignability and comparability between constituents and the
/// guarded type.
pub struct Narrower<'a, 'r, R: TypeResolver> {
    db: &'a TypeInterner,
    relations: &'r mut RelationChecker<'a, R>,
}

impl<'a, 'r, R: TypeResolver> Narrower<'a, 'r, R> {
    pub fn new(db: &'a TypeInterner, relations: &'r mut RelationChecker<'a, R>) -> Self {
        Self { db, relations }
    }

    // ---- typeof ----

    /// Narrow by `typeof x === name` (or `!==` with `assume_true` flipped).
    pub fn narrow_by_typeof(
        &mut self,
        declared: TypeId,
        name: TypeOfName,
        assume_true: bool,
    ) -> TypeId {
        if assume_true
            && (declared == TypeId::ANY || declared == TypeId::UNKNOWN)
            && let Some(narrowed) = typeof_implied_type(name)
        {
            return narrowed;
        }
        self.filter_constituents(declared, |narrower, member| {
            match narrower.typeof_of(member) {
                // Constituents with no known typeof category survive both
                // branches.
                None => true,
                Some(member_name) => (member_name == name) == assume_true,
            }
        })
    }

    /// `typeof` category of a type's values, when every value agrees.
    fn typeof_of(&mut self, ty: TypeId) -> Option<TypeOfName> {
        let ty = self.relations.resolve_structural(ty);
        match self.db.lookup(ty)? {
            TypeData::Intrinsic(kind) => match kind {
                IntrinsicKind::String => Some(TypeOfName::String),
                IntrinsicKind::Number => Some(TypeOfName::Number),
                IntrinsicKind::Boolean | IntrinsicKind::True | IntrinsicKind::False => {
                    Some(TypeOfName::Boolean)
                }
                IntrinsicKind::Null => Some(TypeOfName::Object),
                IntrinsicKind::Undefined | IntrinsicKind::Void => Some(TypeOfName::Undefined),
                _ => None,
            },
            TypeData::Literal(LiteralValue::String(_)) => Some(TypeOfName::String),
            TypeData::Literal(LiteralValue::Number(_)) => Some(TypeOfName::Number),
            TypeData::EnumMember { value, .. } => match value {
                LiteralValue::String(_) => Some(TypeOfName::String),
                LiteralValue::Number(_) => Some(TypeOfName::Number),
            },
            TypeData::Function(_) => Some(TypeOfName::Function),
            TypeData::Object(shape) => {
                let shape = self.db.object_shape(shape)?;
                if shape.call_signatures.is_empty() && shape.construct_signatures.is_empty() {
                    Some(TypeOfName::Object)
                } else {
                    Some(TypeOfName::Function)
                }
            }
            _ => None,
        }
    }

    // ---- Truthiness ----

    /// Narrow by using the value itself as a condition.
    pub fn narrow_by_truthiness(&mut self, declared: TypeId, assume_true: bool) -> TypeId {
        let members = self.db.constituents(declared);
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            match self.truthiness_of(member) {
                Truthiness::AlwaysTrue if !assume_true => {}
                Truthiness::AlwaysFalse if assume_true => {}
                _ => {
                    // boolean is the only type whose truthy and falsy
                    // subsets are expressible.
                    if member == TypeId::BOOLEAN {
                        kept.push(if assume_true { TypeId::TRUE } else { TypeId::FALSE });
                    } else {
                        kept.push(member);
                    }
                }
            }
        }
        self.db.union_preserving_literals(kept)
    }

    fn truthiness_of(&mut self, ty: TypeId) -> Truthiness {
        let ty = self.relations.resolve_structural(ty);
        match self.db.lookup(ty) {
            Some(TypeData::Intrinsic(kind)) => match kind {
                IntrinsicKind::Null
                | IntrinsicKind::Undefined
                | IntrinsicKind::Void
                | IntrinsicKind::Never
                | IntrinsicKind::False => Truthiness::AlwaysFalse,
                IntrinsicKind::True => Truthiness::AlwaysTrue,
                _ => Truthiness::Either,
            },
            Some(TypeData::Literal(value)) | Some(TypeData::EnumMember { value, .. }) => {
                let falsy = match value {
                    LiteralValue::String(atom) => self.db.resolve_atom(atom).is_empty(),
                    LiteralValue::Number(number) => number.0 == 0.0 || number.0.is_nan(),
                };
                if falsy {
                    Truthiness::AlwaysFalse
                } else {
                    Truthiness::AlwaysTrue
                }
            }
            Some(TypeData::Object(_)) | Some(TypeData::Function(_)) => Truthiness::AlwaysTrue,
            _ => Truthiness::Either,
        }
    }

    // ---- Equality ----

    /// Narrow by `x === other` / `x !== other` where `other` has a known
    /// type. Only unit-typed comparands narrow the false branch.
    pub fn narrow_by_equality(
        &mut self,
        declared: TypeId,
        other: TypeId,
        assume_true: bool,
    ) -> TypeId {
        let other = widen_freshness(self.db, other);
        if assume_true {
            if (declared == TypeId::ANY || declared == TypeId::UNKNOWN)
                && is_unit_type(self.db, other)
            {
                return other;
            }
            let members = self.db.constituents(declared);
            let mut kept = Vec::with_capacity(members.len());
            for member in members {
                if !self.relations.is_comparable_to(member, other) {
                    continue;
                }
                // `x === "a"` against `string` refines to the literal.
                if is_unit_type(self.db, other) && self.relations.is_assignable_to(other, member) {
                    kept.push(other);
                } else {
                    kept.push(member);
                }
            }
            return self.db.union_preserving_literals(kept);
        }

        if !is_unit_type(self.db, other) {
            return declared;
        }
        let members = self.db.constituents(declared);
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            if member == other {
                continue;
            }
            // `boolean` splits when the excluded value is one of its two
            // inhabitants.
            if member == TypeId::BOOLEAN && other == TypeId::TRUE {
                kept.push(TypeId::FALSE);
            } else if member == TypeId::BOOLEAN && other == TypeId::FALSE {
                kept.push(TypeId::TRUE);
            } else {
                kept.push(member);
            }
        }
        self.db.union_preserving_literals(kept)
    }

    // ---- Nullish ----

    /// Narrow by loose `x == null` / `x != null`, which covers both `null`
    /// and `undefined`.
    pub fn narrow_by_nullish(&mut self, declared: TypeId, assume_true: bool) -> TypeId {
        if assume_true {
            if declared == TypeId::ANY || declared == TypeId::UNKNOWN {
                return self.db.union2(TypeId::NULL, TypeId::UNDEFINED);
            }
            return self.filter_constituents(declared, |_, member| is_nullish(member));
        }
        self.non_nullish(declared)
    }

    /// Remove `null`, `undefined`, and `void` constituents. `any` stays
    /// `any`.
    pub fn non_nullish(&mut self, declared: TypeId) -> TypeId {
        if declared == TypeId::ANY {
            return TypeId::ANY;
        }
        self.filter_constituents(declared, |_, member| !is_nullish(member))
    }

    // ---- Discriminants ----

    /// Narrow a union by a test on a discriminant property:
    /// `x.name === other` keeps the members whose property overlaps the
    /// comparand, `!==` drops the members whose property is subsumed by it.
    pub fn narrow_by_discriminant(
        &mut self,
        declared: TypeId,
        name: Atom,
        other: TypeId,
        assume_true: bool,
    ) -> TypeId {
        let other = widen_freshness(self.db, other);
        self.filter_constituents(declared, |narrower, member| {
            let resolved = narrower.relations.resolve_structural(member);
            let Some(shape) = narrower.db.shape_of(resolved) else {
                // Not an object shape; nothing known about the property.
                return true;
            };
            let Some(prop) = shape.property(name) else {
                // A member without the discriminant cannot match it.
                return !assume_true;
            };
            let prop_type = if prop.optional {
                narrower.db.union2(prop.type_id, TypeId::UNDEFINED)
            } else {
                prop.type_id
            };
            if assume_true {
                narrower.relations.is_comparable_to(prop_type, other)
            } else {
                !narrower.relations.is_assignable_to(prop_type, other)
            }
        })
    }

    // ---- instanceof and predicates ----

    /// Narrow to (or away from) a candidate type. Shared by `instanceof`,
    /// where the candidate is the construct signature's instance type, and
    /// user-defined predicates, where it is the predicate target.
    pub fn narrow_to_candidate(
        &mut self,
        declared: TypeId,
        candidate: TypeId,
        assume_true: bool,
    ) -> TypeId {
        if assume_true {
            if declared == TypeId::ANY || declared == TypeId::UNKNOWN {
                return candidate;
            }
            let members = self.db.constituents(declared);
            let mut kept = Vec::with_capacity(members.len());
            for member in members {
                if self.relations.is_assignable_to(member, candidate) {
                    // Already at least as narrow as the candidate.
                    kept.push(member);
                } else if self.relations.is_assignable_to(candidate, member) {
                    kept.push(candidate);
                }
            }
            return self.db.union_preserving_literals(kept);
        }
        self.filter_constituents(declared, |narrower, member| {
            !narrower.relations.is_assignable_to(member, candidate)
        })
    }

    // ---- Assignment ----

    /// Narrowed type after `x = value`: the declared constituents the
    /// assigned type fits, or the declared type when none do (the
    /// assignment itself is reported as an error elsewhere).
    pub fn narrow_by_assignment(&mut self, declared: TypeId, assigned: TypeId) -> TypeId {
        let assigned = widen_freshness(self.db, assigned);
        if declared == TypeId::ANY {
            return widen_literal(self.db, assigned);
        }
        let members = self.db.constituents(declared);
        if members.len() < 2 {
            return declared;
        }
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            // The assigned type widens to the declared constituent it fits;
            // keeping the literal itself would make later assignability
            // checks against the declared type spuriously fail.
            if self.relations.is_assignable_to(assigned, member) {
                kept.push(member);
            }
        }
        if kept.is_empty() {
            declared
        } else {
            self.db.union_preserving_literals(kept)
        }
    }

    // ---- Shared ----

    fn filter_constituents(
        &mut self,
        declared: TypeId,
        mut keep: impl FnMut(&mut Self, TypeId) -> bool,
    ) -> TypeId {
        let members = self.db.constituents(declared);
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            if keep(self, member) {
                kept.push(member);
            }
        }
        self.db.union_preserving_literals(kept)
    }
}

/// Type implied for an unconstrained value by a successful `typeof` test.
/// `object` and `function` have no single implied type here.
fn typeof_implied_type(name: TypeOfName) -> Option<TypeId> {
    match name {
        TypeOfName::String => Some(TypeId::STRING),
        TypeOfName::Number => Some(TypeId::NUMBER),
        TypeOfName::Boolean => Some(TypeId::BOOLEAN),
        TypeOfName::Undefined => Some(TypeId::UNDEFINED),
        TypeOfName::Object | TypeOfName::Function => None,
    }
}

/// A type inhabited by exactly one runtime value.
pub fn is_unit_type(db: &TypeInterner, ty: TypeId) -> bool {
    matches!(
        ty,
        TypeId::NULL | TypeId::UNDEFINED | TypeId::TRUE | TypeId::FALSE
    ) || matches!(
        db.lookup(ty),
        Some(TypeData::Literal(_)) | Some(TypeData::EnumMember { .. })
    )
}

fn is_nullish(ty: TypeId) -> bool {
    matches!(ty, TypeId::NULL | TypeId::UNDEFINED | TypeId::VOID)
}

#[cfg(test)]
#[path = "../tests/narrow_tests.rs"]
mod tests;
