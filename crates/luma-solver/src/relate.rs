//! Pairwise type relations.
//!
//! [`RelationChecker`] answers "is `source` related to `target` under
//! `kind`?" for the three relations in [`RelationKind`]. Recursive types are
//! handled coinductively: a pair that is already being checked is assumed
//! related, and the assumption is committed or discarded when the outermost
//! frame of the cycle resolves.
//!
//! The shared [`RelationCache`] stores the tri-state result per pair. While
//! a cycle is unresolved its keys sit in the cache as `InProgress` and on a
//! local `maybe_keys` stack; a `True` outcome commits every assumption made
//! below that frame, a `False` outcome evicts them so they are recomputed
//! without the failed assumption.

use dashmap::DashMap;
use luma_common::CancellationToken;
use luma_common::interner::Atom;
use tracing::trace;

use crate::TypeInterner;
use crate::def::{DefinitionStore, TypeResolver};
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{
    IntrinsicKind, ObjectShape, RelationKey, RelationKind, Signature, TypeData, TypeId,
};

/// Cached state of one relation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The pair is on the active recursion stack; assume related.
    InProgress,
    True,
    False,
}

/// Shared, thread-safe relation cache.
///
/// One instance lives for the whole program; every checking thread reads
/// and writes it through its own `RelationChecker`.
#[derive(Default)]
pub struct RelationCache {
    map: DashMap<RelationKey, CacheState>,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: RelationKey) -> Option<CacheState> {
        self.map.get(&key).map(|entry| *entry)
    }

    pub fn insert(&self, key: RelationKey, state: CacheState) {
        self.map.insert(key, state);
    }

    pub fn remove(&self, key: RelationKey) {
        self.map.remove(&key);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Three-valued relation result. `Maybe` means "related assuming some
/// in-progress pair is related"; it is truthy at the outermost frame of a
/// cycle and unresolved everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ternary {
    False,
    Maybe,
    True,
}

impl From<bool> for Ternary {
    fn from(value: bool) -> Self {
        if value { Ternary::True } else { Ternary::False }
    }
}

/// Reason the first leaf comparison failed, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationFailure {
    NotRelated {
        source: TypeId,
        target: TypeId,
    },
    MissingProperty {
        name: Atom,
        source: TypeId,
        target: TypeId,
    },
    PropertyMismatch {
        name: Atom,
        source_type: TypeId,
        target_type: TypeId,
    },
    ExcessProperty {
        name: Atom,
        target: TypeId,
    },
    ParameterMismatch {
        index: usize,
        source: TypeId,
        target: TypeId,
    },
    ReturnMismatch {
        source: TypeId,
        target: TypeId,
    },
    DepthLimit {
        source: TypeId,
        target: TypeId,
    },
}

/// Structural relation checker.
///
/// Cheap to construct; checker code builds one per query batch over the
/// shared cache.
pub struct RelationChecker<'a, R: TypeResolver> {
    db: &'a TypeInterner,
    resolver: &'a R,
    cache: &'a RelationCache,
    defs: Option<&'a DefinitionStore>,
    cancel: Option<&'a CancellationToken>,
    depth: DepthCounter,
    maybe_keys: Vec<RelationKey>,
    record_failures: bool,
    suppress_failures: u32,
    first_failure: Option<RelationFailure>,
    cancelled: bool,
}

impl<'a, R: TypeResolver> RelationChecker<'a, R> {
    pub fn new(db: &'a TypeInterner, resolver: &'a R, cache: &'a RelationCache) -> Self {
        Self {
            db,
            resolver,
            cache,
            defs: None,
            cancel: None,
            depth: DepthCounter::with_profile(RecursionProfile::RelationCheck),
            maybe_keys: Vec::new(),
            record_failures: false,
            suppress_failures: 0,
            first_failure: None,
            cancelled: false,
        }
    }

    /// Attach a definition store, enabling enum-to-primitive rules and
    /// named types in failure explanations.
    pub fn with_defs(mut self, defs: &'a DefinitionStore) -> Self {
        self.defs = Some(defs);
        self
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Record the first failing leaf comparison for diagnostics.
    pub fn recording_failures(mut self) -> Self {
        self.record_failures = true;
        self
    }

    // ---- Entry points ----

    pub fn is_assignable_to(&mut self, source: TypeId, target: TypeId) -> bool {
        self.is_related_to(source, target, RelationKind::Assignable)
    }

    pub fn is_identical_to(&mut self, source: TypeId, target: TypeId) -> bool {
        self.is_related_to(source, target, RelationKind::Identical)
    }

    pub fn is_comparable_to(&mut self, source: TypeId, target: TypeId) -> bool {
        self.is_related_to(source, target, RelationKind::Comparable)
    }

    pub fn is_related_to(&mut self, source: TypeId, target: TypeId, kind: RelationKind) -> bool {
        let result = self.related(source, target, kind);
        let related = match result {
            Ternary::True => true,
            Ternary::False => false,
            // A Maybe that survives to the very top is a cycle that closed
            // consistently without contradiction: coinductively related.
            // Unless the walk was aborted, in which case nothing is known.
            Ternary::Maybe => !self.depth.is_exceeded() && !self.cancelled,
        };
        // Settle any assumptions still pending at the top.
        if related {
            for key in self.maybe_keys.drain(..) {
                self.cache.insert(key, CacheState::True);
            }
        } else {
            for key in self.maybe_keys.drain(..) {
                self.cache.remove(key);
            }
        }
        trace!(?source, ?target, ?kind, related, "relation query");
        related
    }

    /// Sticky flag: some comparison hit the structural depth limit. The
    /// checker turns this into a "possibly infinite" diagnostic once.
    pub fn depth_exceeded(&self) -> bool {
        self.depth.is_exceeded()
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn take_failure(&mut self) -> Option<RelationFailure> {
        self.first_failure.take()
    }

    // ---- Core recursion ----

    fn related(&mut self, source: TypeId, target: TypeId, kind: RelationKind) -> Ternary {
        if source == target {
            return Ternary::True;
        }
        if self.check_cancelled() {
            return Ternary::Maybe;
        }
        // Error poisons nothing: it relates to everything in both
        // directions so one failed resolution does not cascade.
        if source == TypeId::ERROR || target == TypeId::ERROR {
            return Ternary::True;
        }

        let source = self.resolve_lazy_chain(source);
        let target = self.resolve_lazy_chain(target);
        if source == target {
            return Ternary::True;
        }

        if let Some(result) = self.leaf_related(source, target, kind) {
            if !result {
                self.record(RelationFailure::NotRelated { source, target });
            }
            return result.into();
        }

        self.recursive_related(source, target, kind)
    }

    /// Compare with leaf failure recording held back, for callers that
    /// report a more specific failure (property, parameter, return) when
    /// the nested comparison comes back false.
    fn related_quietly(&mut self, source: TypeId, target: TypeId, kind: RelationKind) -> Ternary {
        self.suppress_failures += 1;
        let related = self.related(source, target, kind);
        self.suppress_failures -= 1;
        related
    }

    /// Follow `Lazy` indirections to the structural body. Unresolvable
    /// definitions stay opaque.
    pub fn resolve_structural(&mut self, ty: TypeId) -> TypeId {
        self.resolve_lazy_chain(ty)
    }

    fn resolve_lazy_chain(&mut self, ty: TypeId) -> TypeId {
        let mut current = ty;
        let mut hops = 0;
        while let Some(TypeData::Lazy(def)) = self.db.lookup(current) {
            hops += 1;
            if hops > RecursionProfile::LazyResolution.max_depth() {
                return TypeId::ERROR;
            }
            match self.resolver.resolve_lazy(def) {
                Some(body) if body != current => current = body,
                _ => break,
            }
        }
        current
    }

    /// Rules that need no recursion key: intrinsics, literals, enum leaves.
    /// Returns `None` when the pair needs structural comparison.
    fn leaf_related(&mut self, source: TypeId, target: TypeId, kind: RelationKind) -> Option<bool> {
        let source_data = self.db.lookup(source)?;
        let target_data = self.db.lookup(target)?;

        if kind == RelationKind::Identical {
            return self.leaf_identical(&source_data, &target_data);
        }

        // Top and bottom types.
        if source == TypeId::ANY {
            return Some(true);
        }
        if target == TypeId::ANY || target == TypeId::UNKNOWN {
            return Some(true);
        }
        if source == TypeId::NEVER {
            return Some(true);
        }
        if target == TypeId::NEVER {
            return Some(false);
        }
        if source == TypeId::UNKNOWN {
            // unknown is assignable only to unknown/any, but overlaps with
            // everything: it may be narrowed to any type.
            return Some(kind == RelationKind::Comparable);
        }
        if source == TypeId::UNDEFINED && target == TypeId::VOID {
            return Some(true);
        }

        match (&source_data, &target_data) {
            (TypeData::Literal(source_value), TypeData::Literal(_)) => {
                // Equal literal values share a TypeId, so these differ.
                let _ = source_value;
                Some(false)
            }
            (TypeData::Literal(value), TypeData::Intrinsic(_)) => {
                Some(value.base_type() == target)
            }
            (TypeData::Intrinsic(IntrinsicKind::True | IntrinsicKind::False), _)
                if target == TypeId::BOOLEAN =>
            {
                Some(true)
            }
            (TypeData::Intrinsic(_), TypeData::Literal(value)) => {
                Some(kind == RelationKind::Comparable && value.base_type() == source)
            }
            (TypeData::Intrinsic(IntrinsicKind::Boolean), TypeData::Intrinsic(kind_t))
                if matches!(kind_t, IntrinsicKind::True | IntrinsicKind::False) =>
            {
                Some(kind == RelationKind::Comparable)
            }
            // Enums are nominal: members relate within their own enum, and
            // across enums only under the loosest relation.
            (TypeData::EnumMember { def, .. }, TypeData::Enum(target_def)) => {
                Some(def == target_def || kind == RelationKind::Comparable)
            }
            (TypeData::EnumMember { .. }, TypeData::EnumMember { .. }) => {
                // Distinct members (ids differ) never assign to each other,
                // but they overlap for equality tests like other unit types
                // of a shared base.
                Some(kind == RelationKind::Comparable)
            }
            (TypeData::EnumMember { value, .. }, TypeData::Intrinsic(_)) => {
                Some(value.base_type() == target)
            }
            (TypeData::Enum(def), TypeData::Intrinsic(_)) => {
                Some(self.enum_base_assignable(*def, target))
            }
            (TypeData::Enum(_), TypeData::Enum(_))
            | (TypeData::Enum(_), TypeData::EnumMember { .. })
            | (TypeData::Intrinsic(_), TypeData::Enum(_))
            | (TypeData::Intrinsic(_), TypeData::EnumMember { .. }) => {
                Some(kind == RelationKind::Comparable)
            }
            (TypeData::Intrinsic(_), TypeData::Intrinsic(_)) => Some(false),
            _ => None,
        }
    }

    /// Identity leaf rules: distinct ids are identical only when structure
    /// (possibly through lazy indirection or freshness) could still match.
    fn leaf_identical(&self, source_data: &TypeData, target_data: &TypeData) -> Option<bool> {
        let structural = |data: &TypeData| {
            matches!(
                data,
                TypeData::Union(_)
                    | TypeData::Intersection(_)
                    | TypeData::Object(_)
                    | TypeData::Function(_)
            )
        };
        if structural(source_data) && structural(target_data) {
            return None;
        }
        // Everything else is canonical: distinct ids are distinct types.
        Some(false)
    }

    fn enum_base_assignable(&self, def: crate::def::DefId, target: TypeId) -> bool {
        let Some(defs) = self.defs else {
            return false;
        };
        let Some(members) = defs.get_enum_members(def) else {
            return false;
        };
        !members.is_empty()
            && members
                .iter()
                .all(|(_, value)| value.base_type() == target)
    }

    fn recursive_related(&mut self, source: TypeId, target: TypeId, kind: RelationKind) -> Ternary {
        let key = RelationKey {
            source,
            target,
            kind,
        };
        match self.cache.get(key) {
            Some(CacheState::True) => return Ternary::True,
            Some(CacheState::False) => return Ternary::False,
            Some(CacheState::InProgress) => return Ternary::Maybe,
            None => {}
        }
        if !self.depth.enter() {
            self.record(RelationFailure::DepthLimit { source, target });
            return Ternary::Maybe;
        }

        let maybe_start = self.maybe_keys.len();
        self.maybe_keys.push(key);
        self.cache.insert(key, CacheState::InProgress);

        let result = self.structural_related(source, target, kind);

        self.depth.leave();
        match result {
            Ternary::True => {
                // The whole dependent group succeeded: commit every
                // assumption made at or below this frame.
                for committed in self.maybe_keys.drain(maybe_start..) {
                    self.cache.insert(committed, CacheState::True);
                }
                Ternary::True
            }
            Ternary::False => {
                // Results below leaned on an assumption that just failed:
                // evict them so they are recomputed, and pin this pair
                // false.
                for evicted in self.maybe_keys.drain(maybe_start..) {
                    self.cache.remove(evicted);
                }
                self.cache.insert(key, CacheState::False);
                Ternary::False
            }
            Ternary::Maybe => {
                if self.depth.is_exceeded() || self.cancelled {
                    // Aborted walk: nothing is known, cache nothing.
                    for evicted in self.maybe_keys.drain(maybe_start..) {
                        self.cache.remove(evicted);
                    }
                } else if maybe_start == 0 {
                    // Outermost frame of the cycle: it closed without
                    // contradiction, so the assumption holds.
                    for committed in self.maybe_keys.drain(maybe_start..) {
                        self.cache.insert(committed, CacheState::True);
                    }
                    return Ternary::True;
                }
                // Inner frame of a cycle: leave the keys provisional for
                // the outer frame to settle.
                Ternary::Maybe
            }
        }
    }

    /// Structured comparison: union/intersection decomposition, then
    /// object and signature rules.
    fn structural_related(&mut self, source: TypeId, target: TypeId, kind: RelationKind) -> Ternary {
        let Some(source_data) = self.db.lookup(source) else {
            return Ternary::False;
        };
        let Some(target_data) = self.db.lookup(target) else {
            return Ternary::False;
        };

        // Identity does not decompose: two composites are identical only
        // when their member lists match up.
        if kind == RelationKind::Identical
            && (matches!(source_data, TypeData::Union(_) | TypeData::Intersection(_))
                || matches!(target_data, TypeData::Union(_) | TypeData::Intersection(_)))
        {
            return self.composite_identical(&source_data, &target_data);
        }

        // Union decomposition comes before everything else. Source first,
        // except the comparable relation only needs one overlapping member.
        if let TypeData::Union(list) = source_data {
            let members = self.db.type_list(list);
            return if kind == RelationKind::Comparable {
                self.some_related_to_target_from(&members, target, kind)
            } else {
                self.each_related(&members, target, kind)
            };
        }
        if let TypeData::Union(list) = target_data {
            let members = self.db.type_list(list);
            if kind != RelationKind::Comparable
                && let Some(name) = self.union_excess_property(source, &members)
            {
                self.record(RelationFailure::ExcessProperty { name, target });
                return Ternary::False;
            }
            return self.some_related_to_target(source, &members, kind);
        }
        if let TypeData::Intersection(list) = source_data {
            // An intersection is at least as narrow as each member.
            let members = self.db.type_list(list);
            return self.some_related_to_target_from(&members, target, kind);
        }
        if let TypeData::Intersection(list) = target_data {
            let members = self.db.type_list(list).to_vec();
            let mut result = Ternary::True;
            for member in members {
                let related = self.related(source, member, kind);
                if related == Ternary::False {
                    return Ternary::False;
                }
                result = result.min(related);
            }
            return result;
        }

        // A type parameter relates through its constraint.
        if let TypeData::TypeParam(info) = source_data {
            return match info.constraint {
                Some(constraint) => self.related(constraint, target, kind),
                None => {
                    if kind == RelationKind::Comparable {
                        Ternary::True
                    } else {
                        Ternary::False
                    }
                }
            };
        }
        if let TypeData::TypeParam(_) = target_data {
            return Ternary::False;
        }

        match (&source_data, &target_data) {
            (TypeData::Object(source_shape), TypeData::Object(target_shape)) => {
                let (Some(source_shape), Some(target_shape)) = (
                    self.db.object_shape(*source_shape),
                    self.db.object_shape(*target_shape),
                ) else {
                    return Ternary::False;
                };
                self.object_related(source, target, &source_shape, &target_shape, kind)
            }
            (TypeData::Function(source_sig), TypeData::Function(target_sig)) => {
                let (Some(source_sig), Some(target_sig)) = (
                    self.db.signature(*source_sig),
                    self.db.signature(*target_sig),
                ) else {
                    return Ternary::False;
                };
                self.signature_related(&source_sig, &target_sig, kind)
            }
            (TypeData::Function(source_sig), TypeData::Object(target_shape)) => {
                let (Some(source_sig), Some(target_shape)) = (
                    self.db.signature(*source_sig),
                    self.db.object_shape(*target_shape),
                ) else {
                    return Ternary::False;
                };
                self.function_to_object_related(&source_sig, source, target, &target_shape, kind)
            }
            (TypeData::Object(source_shape), TypeData::Function(target_sig)) => {
                let (Some(source_shape), Some(target_sig)) = (
                    self.db.object_shape(*source_shape),
                    self.db.signature(*target_sig),
                ) else {
                    return Ternary::False;
                };
                // Some call signature of the source must satisfy the
                // target's signature.
                let signatures = source_shape.call_signatures.clone();
                let mut best = Ternary::False;
                self.suppress_failures += 1;
                for signature in signatures {
                    if let Some(signature) = self.db.signature(signature) {
                        let related = self.signature_related(&signature, &target_sig, kind);
                        best = best.max(related);
                        if best == Ternary::True {
                            break;
                        }
                    }
                }
                self.suppress_failures -= 1;
                if best == Ternary::False {
                    self.record(RelationFailure::NotRelated { source, target });
                }
                best
            }
            _ => {
                // Non-nullish values satisfy an empty object target.
                if kind != RelationKind::Identical
                    && let Some(target_shape) = self.db.shape_of(target)
                    && target_shape.is_empty_object()
                    && !matches!(
                        source,
                        TypeId::NULL | TypeId::UNDEFINED | TypeId::VOID
                    )
                {
                    return Ternary::True;
                }
                self.record(RelationFailure::NotRelated { source, target });
                Ternary::False
            }
        }
    }

    /// Identity of unions and intersections: same arity, and each member
    /// on either side has an identical partner on the other. Members are
    /// deduplicated by id, so distinct-id partners can only arise through
    /// lazy indirection.
    fn composite_identical(&mut self, source_data: &TypeData, target_data: &TypeData) -> Ternary {
        let (source_list, target_list) = match (source_data, target_data) {
            (TypeData::Union(source_list), TypeData::Union(target_list))
            | (TypeData::Intersection(source_list), TypeData::Intersection(target_list)) => {
                (*source_list, *target_list)
            }
            _ => return Ternary::False,
        };
        let source_members = self.db.type_list(source_list);
        let target_members = self.db.type_list(target_list);
        if source_members.len() != target_members.len() {
            return Ternary::False;
        }
        let mut result = Ternary::True;
        for (members, candidates) in [
            (&source_members, &target_members),
            (&target_members, &source_members),
        ] {
            for &member in members.iter() {
                let mut best = Ternary::False;
                self.suppress_failures += 1;
                for &candidate in candidates.iter() {
                    best = best.max(self.related(member, candidate, RelationKind::Identical));
                    if best == Ternary::True {
                        break;
                    }
                }
                self.suppress_failures -= 1;
                if best == Ternary::False {
                    return Ternary::False;
                }
                result = result.min(best);
            }
        }
        result
    }

    /// Every member must relate to the target.
    fn each_related(&mut self, members: &[TypeId], target: TypeId, kind: RelationKind) -> Ternary {
        let mut result = Ternary::True;
        for &member in members {
            let related = self.related(member, target, kind);
            if related == Ternary::False {
                return Ternary::False;
            }
            result = result.min(related);
        }
        result
    }

    /// The source must relate to at least one member of a union target.
    fn some_related_to_target(
        &mut self,
        source: TypeId,
        members: &[TypeId],
        kind: RelationKind,
    ) -> Ternary {
        let mut best = Ternary::False;
        self.suppress_failures += 1;
        for &member in members {
            let related = self.related(source, member, kind);
            best = best.max(related);
            if best == Ternary::True {
                break;
            }
        }
        self.suppress_failures -= 1;
        if best == Ternary::False {
            self.record(RelationFailure::NotRelated {
                source,
                target: self.db.union_preserving_literals(members.to_vec()),
            });
        }
        best
    }

    fn some_related_to_target_from(
        &mut self,
        members: &[TypeId],
        target: TypeId,
        kind: RelationKind,
    ) -> Ternary {
        let mut best = Ternary::False;
        self.suppress_failures += 1;
        for &member in members {
            let related = self.related(member, target, kind);
            best = best.max(related);
            if best == Ternary::True {
                break;
            }
        }
        self.suppress_failures -= 1;
        best
    }

    /// Excess-property precheck for a fresh object literal against a union
    /// target: each source property must exist somewhere in the union.
    fn union_excess_property(&mut self, source: TypeId, members: &[TypeId]) -> Option<Atom> {
        let source_shape = self.db.shape_of(source)?;
        if !source_shape.is_fresh() {
            return None;
        }
        'props: for prop in &source_shape.properties {
            for &member in members {
                let member = self.resolve_lazy_chain(member);
                let Some(member_shape) = self.db.shape_of(member) else {
                    continue;
                };
                if member_shape.property(prop.name).is_some()
                    || member_shape.string_index.is_some()
                {
                    continue 'props;
                }
            }
            return Some(prop.name);
        }
        None
    }

    // ---- Object rules ----

    fn object_related(
        &mut self,
        source: TypeId,
        target: TypeId,
        source_shape: &ObjectShape,
        target_shape: &ObjectShape,
        kind: RelationKind,
    ) -> Ternary {
        if kind == RelationKind::Identical {
            return self.object_identical(source_shape, target_shape);
        }

        // Excess properties: only fresh literals are width-restricted, and
        // only outside the comparable relation.
        if kind != RelationKind::Comparable && source_shape.is_fresh() {
            for prop in &source_shape.properties {
                if target_shape.property(prop.name).is_none()
                    && target_shape.string_index.is_none()
                {
                    self.record(RelationFailure::ExcessProperty {
                        name: prop.name,
                        target,
                    });
                    return Ternary::False;
                }
            }
        }

        let mut result = Ternary::True;
        for target_prop in &target_shape.properties {
            match source_shape.property(target_prop.name) {
                Some(source_prop) => {
                    // An optional property reads as `T | undefined`.
                    let source_type = if source_prop.optional {
                        self.db.union2(source_prop.type_id, TypeId::UNDEFINED)
                    } else {
                        source_prop.type_id
                    };
                    let target_type = if target_prop.optional {
                        self.db.union2(target_prop.type_id, TypeId::UNDEFINED)
                    } else {
                        target_prop.type_id
                    };
                    let related = self.related_quietly(source_type, target_type, kind);
                    if related == Ternary::False {
                        self.record(RelationFailure::PropertyMismatch {
                            name: target_prop.name,
                            source_type: source_prop.type_id,
                            target_type: target_prop.type_id,
                        });
                        return Ternary::False;
                    }
                    result = result.min(related);
                }
                None => {
                    if target_prop.optional {
                        continue;
                    }
                    if let Some(index_type) = source_shape.string_index {
                        let related = self.related_quietly(index_type, target_prop.type_id, kind);
                        if related == Ternary::False {
                            self.record(RelationFailure::PropertyMismatch {
                                name: target_prop.name,
                                source_type: index_type,
                                target_type: target_prop.type_id,
                            });
                            return Ternary::False;
                        }
                        result = result.min(related);
                        continue;
                    }
                    self.record(RelationFailure::MissingProperty {
                        name: target_prop.name,
                        source,
                        target,
                    });
                    return Ternary::False;
                }
            }
        }

        // Target index signatures constrain every source property.
        if let Some(target_index) = target_shape.string_index {
            for prop in &source_shape.properties {
                let prop_type = if prop.optional {
                    self.db.union2(prop.type_id, TypeId::UNDEFINED)
                } else {
                    prop.type_id
                };
                let related = self.related_quietly(prop_type, target_index, kind);
                if related == Ternary::False {
                    self.record(RelationFailure::PropertyMismatch {
                        name: prop.name,
                        source_type: prop.type_id,
                        target_type: target_index,
                    });
                    return Ternary::False;
                }
                result = result.min(related);
            }
            if let Some(source_index) = source_shape.string_index {
                let related = self.related(source_index, target_index, kind);
                if related == Ternary::False {
                    return Ternary::False;
                }
                result = result.min(related);
            }
        }
        if let Some(target_index) = target_shape.number_index {
            if let Some(source_index) = source_shape.number_index.or(source_shape.string_index) {
                let related = self.related(source_index, target_index, kind);
                if related == Ternary::False {
                    return Ternary::False;
                }
                result = result.min(related);
            }
        }

        // Every target call/construct signature needs a matching source
        // signature.
        let related = self.signature_lists_related(
            &source_shape.call_signatures,
            &target_shape.call_signatures,
            kind,
        );
        if related == Ternary::False {
            self.record(RelationFailure::NotRelated { source, target });
            return Ternary::False;
        }
        result = result.min(related);
        let related = self.signature_lists_related(
            &source_shape.construct_signatures,
            &target_shape.construct_signatures,
            kind,
        );
        if related == Ternary::False {
            self.record(RelationFailure::NotRelated { source, target });
            return Ternary::False;
        }
        result.min(related)
    }

    fn object_identical(
        &mut self,
        source_shape: &ObjectShape,
        target_shape: &ObjectShape,
    ) -> Ternary {
        // Identity ignores freshness but nothing else.
        if source_shape.properties.len() != target_shape.properties.len()
            || source_shape.call_signatures.len() != target_shape.call_signatures.len()
            || source_shape.construct_signatures.len() != target_shape.construct_signatures.len()
        {
            return Ternary::False;
        }
        let mut result = Ternary::True;
        for (source_prop, target_prop) in source_shape
            .properties
            .iter()
            .zip(target_shape.properties.iter())
        {
            if source_prop.name != target_prop.name
                || source_prop.optional != target_prop.optional
                || source_prop.readonly != target_prop.readonly
            {
                return Ternary::False;
            }
            let related = self.related(
                source_prop.type_id,
                target_prop.type_id,
                RelationKind::Identical,
            );
            if related == Ternary::False {
                return Ternary::False;
            }
            result = result.min(related);
        }
        for (index_s, index_t) in [
            (source_shape.string_index, target_shape.string_index),
            (source_shape.number_index, target_shape.number_index),
        ] {
            match (index_s, index_t) {
                (None, None) => {}
                (Some(left), Some(right)) => {
                    let related = self.related(left, right, RelationKind::Identical);
                    if related == Ternary::False {
                        return Ternary::False;
                    }
                    result = result.min(related);
                }
                _ => return Ternary::False,
            }
        }
        for (source_sig, target_sig) in source_shape
            .call_signatures
            .iter()
            .chain(source_shape.construct_signatures.iter())
            .zip(
                target_shape
                    .call_signatures
                    .iter()
                    .chain(target_shape.construct_signatures.iter()),
            )
        {
            let (Some(source_sig), Some(target_sig)) = (
                self.db.signature(*source_sig),
                self.db.signature(*target_sig),
            ) else {
                return Ternary::False;
            };
            let related = self.signature_related(&source_sig, &target_sig, RelationKind::Identical);
            if related == Ternary::False {
                return Ternary::False;
            }
            result = result.min(related);
        }
        result
    }

    fn function_to_object_related(
        &mut self,
        source_sig: &Signature,
        source: TypeId,
        target: TypeId,
        target_shape: &ObjectShape,
        kind: RelationKind,
    ) -> Ternary {
        if kind == RelationKind::Identical {
            return Ternary::False;
        }
        if target_shape.is_empty_object() {
            return Ternary::True;
        }
        if !target_shape.construct_signatures.is_empty() {
            self.record(RelationFailure::NotRelated { source, target });
            return Ternary::False;
        }
        if let Some(prop) = target_shape.properties.iter().find(|prop| !prop.optional) {
            self.record(RelationFailure::MissingProperty {
                name: prop.name,
                source,
                target,
            });
            return Ternary::False;
        }
        let mut result = Ternary::True;
        for &target_sig in &target_shape.call_signatures {
            let Some(target_sig) = self.db.signature(target_sig) else {
                return Ternary::False;
            };
            let related = self.signature_related(source_sig, &target_sig, kind);
            if related == Ternary::False {
                return Ternary::False;
            }
            result = result.min(related);
        }
        result
    }

    // ---- Signature rules ----

    fn signature_lists_related(
        &mut self,
        source_sigs: &[crate::types::SignatureId],
        target_sigs: &[crate::types::SignatureId],
        kind: RelationKind,
    ) -> Ternary {
        let mut result = Ternary::True;
        for &target_sig in target_sigs {
            let Some(target_sig) = self.db.signature(target_sig) else {
                return Ternary::False;
            };
            let mut best = Ternary::False;
            self.suppress_failures += 1;
            for &source_sig in source_sigs {
                if let Some(source_sig) = self.db.signature(source_sig) {
                    let related = self.signature_related(&source_sig, &target_sig, kind);
                    best = best.max(related);
                    if best == Ternary::True {
                        break;
                    }
                }
            }
            self.suppress_failures -= 1;
            if best == Ternary::False {
                return Ternary::False;
            }
            result = result.min(best);
        }
        result
    }

    fn signature_related(
        &mut self,
        source: &Signature,
        target: &Signature,
        kind: RelationKind,
    ) -> Ternary {
        if kind == RelationKind::Identical {
            if source.params.len() != target.params.len() {
                return Ternary::False;
            }
            let mut result = Ternary::True;
            for (source_param, target_param) in source.params.iter().zip(target.params.iter()) {
                if source_param.optional != target_param.optional
                    || source_param.rest != target_param.rest
                {
                    return Ternary::False;
                }
                let related = self.related(
                    source_param.type_id,
                    target_param.type_id,
                    RelationKind::Identical,
                );
                if related == Ternary::False {
                    return Ternary::False;
                }
                result = result.min(related);
            }
            if source.type_predicate != target.type_predicate {
                // Predicate targets may still be structurally identical.
                match (source.type_predicate, target.type_predicate) {
                    (Some(source_pred), Some(target_pred))
                        if source_pred.param_index == target_pred.param_index =>
                    {
                        let related = self.related(
                            source_pred.target,
                            target_pred.target,
                            RelationKind::Identical,
                        );
                        if related == Ternary::False {
                            return Ternary::False;
                        }
                        result = result.min(related);
                    }
                    _ => return Ternary::False,
                }
            }
            let related =
                self.related(source.return_type, target.return_type, RelationKind::Identical);
            if related == Ternary::False {
                return Ternary::False;
            }
            return result.min(related);
        }

        // A source needing more required arguments than the target supplies
        // cannot stand in for it.
        let target_len = target.params.len();
        for (index, source_param) in source.params.iter().enumerate() {
            if source_param.rest {
                break;
            }
            if index >= target_len && !source_param.optional && !target.has_rest() {
                self.record(RelationFailure::ParameterMismatch {
                    index,
                    source: source_param.type_id,
                    target: TypeId::NEVER,
                });
                return Ternary::False;
            }
        }

        // Parameters are contravariant: the target's argument must be
        // acceptable to the source.
        let mut result = Ternary::True;
        let pairs = target_len.max(source.params.len());
        for index in 0..pairs {
            let Some(source_type) = param_type_at(source, index) else {
                break;
            };
            let Some(target_type) = param_type_at(target, index) else {
                break;
            };
            let related = self.related_quietly(target_type, source_type, kind);
            if related == Ternary::False {
                self.record(RelationFailure::ParameterMismatch {
                    index,
                    source: source_type,
                    target: target_type,
                });
                return Ternary::False;
            }
            result = result.min(related);
        }

        // Returns are covariant; a void-returning target accepts anything.
        if target.return_type != TypeId::VOID {
            let related = self.related_quietly(source.return_type, target.return_type, kind);
            if related == Ternary::False {
                self.record(RelationFailure::ReturnMismatch {
                    source: source.return_type,
                    target: target.return_type,
                });
                return Ternary::False;
            }
            result = result.min(related);
        }

        if let Some(target_pred) = target.type_predicate {
            match source.type_predicate {
                Some(source_pred) if source_pred.param_index == target_pred.param_index => {
                    let related = self.related_quietly(source_pred.target, target_pred.target, kind);
                    if related == Ternary::False {
                        self.record(RelationFailure::ReturnMismatch {
                            source: source_pred.target,
                            target: target_pred.target,
                        });
                        return Ternary::False;
                    }
                    result = result.min(related);
                }
                _ => {
                    self.record(RelationFailure::ReturnMismatch {
                        source: source.return_type,
                        target: target.return_type,
                    });
                    return Ternary::False;
                }
            }
        }

        result
    }

    // ---- Bookkeeping ----

    fn check_cancelled(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        if let Some(token) = self.cancel
            && token.is_cancelled()
        {
            self.cancelled = true;
            return true;
        }
        false
    }

    fn record(&mut self, failure: RelationFailure) {
        if self.record_failures && self.suppress_failures == 0 && self.first_failure.is_none() {
            self.first_failure = Some(failure);
        }
    }
}

/// Effective parameter type at argument position `index`, accounting for a
/// trailing rest parameter. `None` past the end of a non-rest list.
fn param_type_at(signature: &Signature, index: usize) -> Option<TypeId> {
    if let Some(param) = signature.params.get(index) {
        return Some(param.type_id);
    }
    signature
        .params
        .last()
        .filter(|param| param.rest)
        .map(|param| param.type_id)
}

/// Run a one-off relation query with failure recording over a private
/// cache, for diagnostics. The shared cache is bypassed so a cached
/// `False` still yields its reason.
pub fn explain_failure<R: TypeResolver>(
    db: &TypeInterner,
    resolver: &R,
    defs: Option<&DefinitionStore>,
    source: TypeId,
    target: TypeId,
    kind: RelationKind,
) -> Option<RelationFailure> {
    let cache = RelationCache::new();
    let mut checker = RelationChecker::new(db, resolver, &cache).recording_failures();
    if let Some(defs) = defs {
        checker = checker.with_defs(defs);
    }
    if checker.is_related_to(source, target, kind) {
        None
    } else {
        checker
            .take_failure()
            .or(Some(RelationFailure::NotRelated { source, target }))
    }
}

#[cfg(test)]
#[path = "../tests/relate_tests.rs"]
mod tests;
