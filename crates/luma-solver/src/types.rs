//! Structural type representation.
//!
//! Every type is interned: a [`TypeId`] is a handle into the
//! [`crate::TypeInterner`], and structurally equal types always share one id.
//! `TypeData` is the closed union behind a handle; consumers match on it
//! exhaustively, so adding a variant breaks every dispatch site until it is
//! handled.

use luma_common::Atom;

use crate::def::DefId;

/// Handle to an interned type.
///
/// Equal ids mean structurally identical types, which makes identity checks
/// and cache keys a single `u32` compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const ANY: TypeId = TypeId(0);
    pub const UNKNOWN: TypeId = TypeId(1);
    pub const NEVER: TypeId = TypeId(2);
    pub const VOID: TypeId = TypeId(3);
    pub const NULL: TypeId = TypeId(4);
    pub const UNDEFINED: TypeId = TypeId(5);
    pub const STRING: TypeId = TypeId(6);
    pub const NUMBER: TypeId = TypeId(7);
    pub const BOOLEAN: TypeId = TypeId(8);
    pub const TRUE: TypeId = TypeId(9);
    pub const FALSE: TypeId = TypeId(10);
    /// Poison type produced by failed resolution. Relates to everything so
    /// one failure does not cascade.
    pub const ERROR: TypeId = TypeId(11);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_DYNAMIC: u32 = 12;

    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }
}

/// Handle to an interned list of types (union or intersection members).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeListId(pub u32);

/// Handle to an interned object shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectShapeId(pub u32);

/// Handle to an interned call signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureId(pub u32);

/// `f64` wrapper with total equality so literal types can be interned.
///
/// All NaNs compare equal; `-0.0` and `0.0` are distinct bit patterns and
/// therefore distinct literal types.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            return true;
        }
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let bits = if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        };
        bits.hash(state);
    }
}

/// Value of a literal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(Atom),
    Number(OrderedFloat),
}

impl LiteralValue {
    pub fn number(value: f64) -> Self {
        LiteralValue::Number(OrderedFloat(value))
    }

    /// The base primitive a literal widens to.
    pub fn base_type(self) -> TypeId {
        match self {
            LiteralValue::String(_) => TypeId::STRING,
            LiteralValue::Number(_) => TypeId::NUMBER,
        }
    }
}

/// Intrinsic types, pre-interned at fixed [`TypeId`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Any,
    Unknown,
    Never,
    Void,
    Null,
    Undefined,
    String,
    Number,
    Boolean,
    /// The `true` literal type.
    True,
    /// The `false` literal type.
    False,
    Error,
}

bitflags::bitflags! {
    /// Flags that are part of an object type's identity.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u8 {
        /// The type of an object literal expression, before any widening.
        /// Fresh types get excess-property checking; widening clears the
        /// flag.
        const FRESH_LITERAL = 1 << 0;
    }
}

/// One named property of an object shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyInfo {
    pub name: Atom,
    pub type_id: TypeId,
    pub optional: bool,
    pub readonly: bool,
}

impl PropertyInfo {
    pub fn required(name: Atom, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            optional: false,
            readonly: false,
        }
    }

    pub fn optional(name: Atom, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            optional: true,
            readonly: false,
        }
    }
}

/// Structural shape of an object type.
///
/// Properties are sorted by atom so lookup is a binary search and two shapes
/// with the same members intern to the same id regardless of source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectShape {
    pub flags: ObjectFlags,
    /// Sorted by `PropertyInfo::name`.
    pub properties: Vec<PropertyInfo>,
    /// Value type of the string index signature, if any.
    pub string_index: Option<TypeId>,
    /// Value type of the number index signature, if any.
    pub number_index: Option<TypeId>,
    pub call_signatures: Vec<SignatureId>,
    pub construct_signatures: Vec<SignatureId>,
}

impl ObjectShape {
    /// Look up a property by name. Shapes keep properties sorted by atom.
    pub fn property(&self, name: Atom) -> Option<&PropertyInfo> {
        self.properties
            .binary_search_by(|prop| prop.name.cmp(&name))
            .ok()
            .map(|index| &self.properties[index])
    }

    pub fn is_fresh(&self) -> bool {
        self.flags.contains(ObjectFlags::FRESH_LITERAL)
    }

    /// True when any value (other than null/undefined) is acceptable: no
    /// required properties, no index signatures, no signatures.
    pub fn is_empty_object(&self) -> bool {
        self.properties.iter().all(|prop| prop.optional)
            && self.string_index.is_none()
            && self.number_index.is_none()
            && self.call_signatures.is_empty()
            && self.construct_signatures.is_empty()
    }
}

/// One parameter of a call signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: Atom,
    pub type_id: TypeId,
    pub optional: bool,
    /// Rest parameter; `type_id` is the per-argument element type.
    pub rest: bool,
}

impl ParamInfo {
    pub fn required(name: Atom, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            optional: false,
            rest: false,
        }
    }
}

/// `param is T` predicate attached to a signature's return position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypePredicate {
    /// Index of the tested parameter.
    pub param_index: u32,
    /// Type the predicate narrows to when the call returns true.
    pub target: TypeId,
}

/// A call or construct signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<ParamInfo>,
    pub return_type: TypeId,
    pub type_predicate: Option<TypePredicate>,
}

impl Signature {
    pub fn new(params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        Self {
            params,
            return_type,
            type_predicate: None,
        }
    }

    /// Minimum number of arguments a caller must pass.
    pub fn min_argument_count(&self) -> usize {
        self.params
            .iter()
            .take_while(|param| !param.optional && !param.rest)
            .count()
    }

    pub fn has_rest(&self) -> bool {
        self.params.last().is_some_and(|param| param.rest)
    }
}

/// A type parameter. Distinct declarations with the same name and bounds
/// intern to the same id, which is harmless: they are interchangeable in
/// every relation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub constraint: Option<TypeId>,
}

/// The closed union behind every [`TypeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    Literal(LiteralValue),
    /// Canonical union: flattened, deduplicated, sorted, at least two
    /// members.
    Union(TypeListId),
    /// Canonical intersection, same normalization as unions.
    Intersection(TypeListId),
    Object(ObjectShapeId),
    Function(SignatureId),
    TypeParam(TypeParamInfo),
    /// Named definition resolved on demand; the indirection that makes
    /// recursive types representable.
    Lazy(DefId),
    /// An enum type, nominally keyed by its definition.
    Enum(DefId),
    /// One member of an enum.
    EnumMember { def: DefId, value: LiteralValue },
}

/// Relations a [`crate::RelationChecker`] can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Exact structural identity.
    Identical,
    /// Source may be used where target is expected.
    Assignable,
    /// The loosest relation: the two types overlap, used for narrowing
    /// feasibility and relational operators.
    Comparable,
}

/// Key of one pairwise relation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub source: TypeId,
    pub target: TypeId,
    pub kind: RelationKind,
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
