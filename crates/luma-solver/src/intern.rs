//! Type interning.
//!
//! The [`TypeInterner`] owns every type in a program. Construction goes
//! through it so that structurally equal types always get the same
//! [`TypeId`]; union and intersection constructors normalize their member
//! lists here, which is what makes id equality a sound identity check
//! everywhere else.

use std::sync::Arc;
use std::sync::RwLock;

use dashmap::DashMap;
use luma_common::interner::{Atom, Interner};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::def::DefId;
use crate::types::{
    IntrinsicKind, LiteralValue, ObjectFlags, ObjectShape, ObjectShapeId, ParamInfo, PropertyInfo,
    Signature, SignatureId, TypeData, TypeId, TypeListId, TypeParamInfo, TypePredicate,
};

/// Thread-safe type interner.
///
/// All methods take `&self`; the interner is shared by reference between
/// parallel checking threads. Intrinsics are pre-interned at the fixed ids
/// on [`TypeId`].
pub struct TypeInterner {
    atoms: Arc<Interner>,
    types: RwLock<Vec<TypeData>>,
    type_map: DashMap<TypeData, TypeId>,
    lists: RwLock<Vec<Arc<[TypeId]>>>,
    list_map: DashMap<Vec<TypeId>, TypeListId>,
    shapes: RwLock<Vec<Arc<ObjectShape>>>,
    shape_map: DashMap<ObjectShape, ObjectShapeId>,
    signatures: RwLock<Vec<Arc<Signature>>>,
    signature_map: DashMap<Signature, SignatureId>,
}

const INTRINSICS: &[IntrinsicKind] = &[
    IntrinsicKind::Any,
    IntrinsicKind::Unknown,
    IntrinsicKind::Never,
    IntrinsicKind::Void,
    IntrinsicKind::Null,
    IntrinsicKind::Undefined,
    IntrinsicKind::String,
    IntrinsicKind::Number,
    IntrinsicKind::Boolean,
    IntrinsicKind::True,
    IntrinsicKind::False,
    IntrinsicKind::Error,
];

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        Self::with_interner(Arc::new(Interner::new()))
    }

    /// Build an interner sharing an existing atom table, so property names
    /// created by the AST builder compare equal to names created here.
    pub fn with_interner(atoms: Arc<Interner>) -> Self {
        let interner = Self {
            atoms,
            types: RwLock::new(Vec::new()),
            type_map: DashMap::new(),
            lists: RwLock::new(Vec::new()),
            list_map: DashMap::new(),
            shapes: RwLock::new(Vec::new()),
            shape_map: DashMap::new(),
            signatures: RwLock::new(Vec::new()),
            signature_map: DashMap::new(),
        };
        for &kind in INTRINSICS {
            interner.intern(TypeData::Intrinsic(kind));
        }
        debug_assert_eq!(
            interner.types.read().map(|types| types.len()).unwrap_or(0) as u32,
            TypeId::FIRST_DYNAMIC
        );
        interner
    }

    pub fn atoms(&self) -> &Arc<Interner> {
        &self.atoms
    }

    // ---- Core interning ----

    /// Intern raw type data. Prefer the typed constructors below; this does
    /// not normalize.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(existing) = self.type_map.get(&data) {
            return *existing;
        }
        *self.type_map.entry(data.clone()).or_insert_with(|| {
            let mut types = self
                .types
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let id = TypeId(types.len() as u32);
            trace!(type_id = id.0, ?data, "intern new type");
            types.push(data);
            id
        })
    }

    /// Data behind a type id. `None` only for ids from another interner.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        let types = self
            .types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        types.get(id.0 as usize).cloned()
    }

    pub fn type_count(&self) -> usize {
        let types = self
            .types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        types.len()
    }

    fn intern_list(&self, members: Vec<TypeId>) -> TypeListId {
        if let Some(existing) = self.list_map.get(members.as_slice()) {
            return *existing;
        }
        *self.list_map.entry(members.clone()).or_insert_with(|| {
            let mut lists = self
                .lists
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let id = TypeListId(lists.len() as u32);
            lists.push(Arc::from(members.as_slice()));
            id
        })
    }

    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        let lists = self
            .lists
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        lists
            .get(id.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(&[][..]))
    }

    fn intern_shape(&self, shape: ObjectShape) -> ObjectShapeId {
        if let Some(existing) = self.shape_map.get(&shape) {
            return *existing;
        }
        *self.shape_map.entry(shape.clone()).or_insert_with(|| {
            let mut shapes = self
                .shapes
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let id = ObjectShapeId(shapes.len() as u32);
            shapes.push(Arc::new(shape));
            id
        })
    }

    pub fn object_shape(&self, id: ObjectShapeId) -> Option<Arc<ObjectShape>> {
        let shapes = self
            .shapes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        shapes.get(id.0 as usize).cloned()
    }

    fn intern_signature(&self, signature: Signature) -> SignatureId {
        if let Some(existing) = self.signature_map.get(&signature) {
            return *existing;
        }
        *self
            .signature_map
            .entry(signature.clone())
            .or_insert_with(|| {
                let mut signatures = self
                    .signatures
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let id = SignatureId(signatures.len() as u32);
                signatures.push(Arc::new(signature));
                id
            })
    }

    pub fn signature(&self, id: SignatureId) -> Option<Arc<Signature>> {
        let signatures = self
            .signatures
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        signatures.get(id.0 as usize).cloned()
    }

    // ---- Strings ----

    pub fn intern_string(&self, text: &str) -> Atom {
        self.atoms.intern(text)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.atoms.resolve(atom)
    }

    // ---- Literal types ----

    pub fn literal_string(&self, text: &str) -> TypeId {
        let atom = self.intern_string(text);
        self.intern(TypeData::Literal(LiteralValue::String(atom)))
    }

    pub fn literal_string_atom(&self, atom: Atom) -> TypeId {
        self.intern(TypeData::Literal(LiteralValue::String(atom)))
    }

    pub fn literal_number(&self, value: f64) -> TypeId {
        self.intern(TypeData::Literal(LiteralValue::number(value)))
    }

    pub fn literal_boolean(&self, value: bool) -> TypeId {
        if value { TypeId::TRUE } else { TypeId::FALSE }
    }

    // ---- Unions ----

    /// Canonical union with literal subsumption: a literal alongside its
    /// base primitive is dropped.
    pub fn union(&self, members: Vec<TypeId>) -> TypeId {
        self.union_impl(members, true)
    }

    /// Canonical union keeping literals next to their base primitive.
    /// Used for declared annotation types where `"a" | string` is written
    /// deliberately, and for narrowing results.
    pub fn union_preserving_literals(&self, members: Vec<TypeId>) -> TypeId {
        self.union_impl(members, false)
    }

    pub fn union2(&self, left: TypeId, right: TypeId) -> TypeId {
        self.union(vec![left, right])
    }

    fn union_impl(&self, members: Vec<TypeId>, subsume_literals: bool) -> TypeId {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            self.flatten_union_into(member, &mut flat);
        }

        // Absorbing members, strongest first.
        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }
        if flat.contains(&TypeId::UNKNOWN) {
            return TypeId::UNKNOWN;
        }

        let mut seen = FxHashSet::default();
        flat.retain(|&member| member != TypeId::NEVER && seen.insert(member));

        if subsume_literals {
            self.subsume_union_literals(&mut flat);
        }

        flat.sort_unstable();
        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => {
                let list = self.intern_list(flat);
                self.intern(TypeData::Union(list))
            }
        }
    }

    fn flatten_union_into(&self, ty: TypeId, out: &mut Vec<TypeId>) {
        match self.lookup(ty) {
            Some(TypeData::Union(list)) => {
                for &member in self.type_list(list).iter() {
                    self.flatten_union_into(member, out);
                }
            }
            _ => out.push(ty),
        }
    }

    /// Drop members made redundant by a wider member in the same list:
    /// literals next to their base primitive, `true | false` collapsing to
    /// `boolean`, enum members next to their enum.
    fn subsume_union_literals(&self, members: &mut Vec<TypeId>) {
        if members.contains(&TypeId::TRUE) && members.contains(&TypeId::FALSE) {
            members.retain(|&member| member != TypeId::TRUE && member != TypeId::FALSE);
            if !members.contains(&TypeId::BOOLEAN) {
                members.push(TypeId::BOOLEAN);
            }
        }
        let has_string = members.contains(&TypeId::STRING);
        let has_number = members.contains(&TypeId::NUMBER);
        let has_boolean = members.contains(&TypeId::BOOLEAN);
        let enum_defs: Vec<DefId> = members
            .iter()
            .filter_map(|&member| match self.lookup(member) {
                Some(TypeData::Enum(def)) => Some(def),
                _ => None,
            })
            .collect();
        members.retain(|&member| match self.lookup(member) {
            Some(TypeData::Literal(LiteralValue::String(_))) => !has_string,
            Some(TypeData::Literal(LiteralValue::Number(_))) => !has_number,
            Some(TypeData::Intrinsic(IntrinsicKind::True | IntrinsicKind::False)) => !has_boolean,
            Some(TypeData::EnumMember { def, .. }) => !enum_defs.contains(&def),
            _ => true,
        });
    }

    // ---- Intersections ----

    /// Canonical intersection: flattened, deduplicated, sorted, with
    /// obviously uninhabited combinations collapsed to `never`.
    pub fn intersection(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            self.flatten_intersection_into(member, &mut flat);
        }

        if flat.contains(&TypeId::NEVER) {
            return TypeId::NEVER;
        }
        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }

        let mut seen = FxHashSet::default();
        flat.retain(|&member| member != TypeId::UNKNOWN && seen.insert(member));

        // A literal absorbs its base primitive.
        let literal_bases: Vec<TypeId> = flat
            .iter()
            .filter_map(|&member| match self.lookup(member) {
                Some(TypeData::Literal(value)) => Some(value.base_type()),
                Some(TypeData::Intrinsic(IntrinsicKind::True | IntrinsicKind::False)) => {
                    Some(TypeId::BOOLEAN)
                }
                _ => None,
            })
            .collect();
        flat.retain(|&member| !literal_bases.contains(&member));

        if self.intersection_is_uninhabited(&flat) {
            return TypeId::NEVER;
        }

        flat.sort_unstable();
        match flat.len() {
            0 => TypeId::UNKNOWN,
            1 => flat[0],
            _ => {
                let list = self.intern_list(flat);
                self.intern(TypeData::Intersection(list))
            }
        }
    }

    pub fn intersection2(&self, left: TypeId, right: TypeId) -> TypeId {
        self.intersection(vec![left, right])
    }

    fn flatten_intersection_into(&self, ty: TypeId, out: &mut Vec<TypeId>) {
        match self.lookup(ty) {
            Some(TypeData::Intersection(list)) => {
                for &member in self.type_list(list).iter() {
                    self.flatten_intersection_into(member, out);
                }
            }
            _ => out.push(ty),
        }
    }

    /// Detect disjoint unit domains: two different literals, or members of
    /// two different primitive domains, can have no common value.
    fn intersection_is_uninhabited(&self, members: &[TypeId]) -> bool {
        #[derive(PartialEq, Clone, Copy)]
        enum Domain {
            String,
            Number,
            Boolean,
            Null,
            Undefined,
            Void,
        }
        let mut domain: Option<Domain> = None;
        let mut literal: Option<LiteralValue> = None;
        let mut saw_true = false;
        let mut saw_false = false;
        for &member in members {
            let member_domain = match self.lookup(member) {
                Some(TypeData::Intrinsic(kind)) => match kind {
                    IntrinsicKind::String => Some(Domain::String),
                    IntrinsicKind::Number => Some(Domain::Number),
                    IntrinsicKind::Boolean => Some(Domain::Boolean),
                    IntrinsicKind::True => {
                        saw_true = true;
                        Some(Domain::Boolean)
                    }
                    IntrinsicKind::False => {
                        saw_false = true;
                        Some(Domain::Boolean)
                    }
                    IntrinsicKind::Null => Some(Domain::Null),
                    IntrinsicKind::Undefined => Some(Domain::Undefined),
                    IntrinsicKind::Void => Some(Domain::Void),
                    _ => None,
                },
                Some(TypeData::Literal(value)) => {
                    if let Some(previous) = literal {
                        if previous != value {
                            return true;
                        }
                    }
                    literal = Some(value);
                    match value {
                        LiteralValue::String(_) => Some(Domain::String),
                        LiteralValue::Number(_) => Some(Domain::Number),
                    }
                }
                _ => None,
            };
            if let Some(member_domain) = member_domain {
                if let Some(previous) = domain {
                    if previous != member_domain {
                        return true;
                    }
                }
                domain = Some(member_domain);
            }
        }
        saw_true && saw_false
    }

    // ---- Objects and functions ----

    /// Intern an object type from unsorted properties.
    pub fn object(&self, properties: Vec<PropertyInfo>) -> TypeId {
        self.object_with_flags(properties, ObjectFlags::empty())
    }

    /// Intern a fresh object literal type. Freshness is part of identity so
    /// the fresh and widened forms are distinct ids.
    pub fn fresh_object(&self, properties: Vec<PropertyInfo>) -> TypeId {
        self.object_with_flags(properties, ObjectFlags::FRESH_LITERAL)
    }

    pub fn object_with_flags(&self, mut properties: Vec<PropertyInfo>, flags: ObjectFlags) -> TypeId {
        properties.sort_by_key(|prop| prop.name);
        self.object_from_shape(ObjectShape {
            flags,
            properties,
            string_index: None,
            number_index: None,
            call_signatures: Vec::new(),
            construct_signatures: Vec::new(),
        })
    }

    /// Intern a complete shape. Properties are re-sorted so callers cannot
    /// break the binary-search invariant.
    pub fn object_from_shape(&self, mut shape: ObjectShape) -> TypeId {
        shape.properties.sort_by_key(|prop| prop.name);
        let shape_id = self.intern_shape(shape);
        self.intern(TypeData::Object(shape_id))
    }

    pub fn function(&self, params: Vec<ParamInfo>, return_type: TypeId) -> TypeId {
        let signature = self.intern_signature(Signature::new(params, return_type));
        self.intern(TypeData::Function(signature))
    }

    pub fn function_with_predicate(
        &self,
        params: Vec<ParamInfo>,
        return_type: TypeId,
        predicate: TypePredicate,
    ) -> TypeId {
        let signature = self.intern_signature(Signature {
            params,
            return_type,
            type_predicate: Some(predicate),
        });
        self.intern(TypeData::Function(signature))
    }

    /// Constructor object type: `new (params) => instance`.
    pub fn constructor(&self, params: Vec<ParamInfo>, instance: TypeId) -> TypeId {
        let signature = self.intern_signature(Signature::new(params, instance));
        self.object_from_shape(ObjectShape {
            flags: ObjectFlags::empty(),
            properties: Vec::new(),
            string_index: None,
            number_index: None,
            call_signatures: Vec::new(),
            construct_signatures: vec![signature],
        })
    }

    pub fn type_param(&self, info: TypeParamInfo) -> TypeId {
        self.intern(TypeData::TypeParam(info))
    }

    pub fn lazy(&self, def: DefId) -> TypeId {
        self.intern(TypeData::Lazy(def))
    }

    pub fn enum_type(&self, def: DefId) -> TypeId {
        self.intern(TypeData::Enum(def))
    }

    pub fn enum_member(&self, def: DefId, value: LiteralValue) -> TypeId {
        self.intern(TypeData::EnumMember { def, value })
    }

    // ---- Structured accessors ----

    /// Union members of a type, or a one-element slice for non-unions.
    pub fn constituents(&self, ty: TypeId) -> Vec<TypeId> {
        match self.lookup(ty) {
            Some(TypeData::Union(list)) => self.type_list(list).to_vec(),
            _ => vec![ty],
        }
    }

    pub fn union_members(&self, ty: TypeId) -> Option<Arc<[TypeId]>> {
        match self.lookup(ty) {
            Some(TypeData::Union(list)) => Some(self.type_list(list)),
            _ => None,
        }
    }

    /// Shape of an object type, if `ty` is one.
    pub fn shape_of(&self, ty: TypeId) -> Option<Arc<ObjectShape>> {
        match self.lookup(ty) {
            Some(TypeData::Object(shape)) => self.object_shape(shape),
            _ => None,
        }
    }

    /// Call signature of a function type, if `ty` is one.
    pub fn signature_of(&self, ty: TypeId) -> Option<Arc<Signature>> {
        match self.lookup(ty) {
            Some(TypeData::Function(signature)) => self.signature(signature),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
