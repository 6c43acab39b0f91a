//! Structural type solver.
//!
//! The solver owns the type model and every pure computation over it:
//!
//! - **Interning**: structurally equal types share a [`TypeId`], so type
//!   equality is an integer comparison (`types`, `intern`)
//! - **Definitions**: named types resolved lazily, with coinductive cycle
//!   handling (`def`, `recursion`)
//! - **Relations**: identity, assignability, and comparability with a
//!   shared tri-state cache (`relate`)
//! - **Narrowing**: the type-level half of control-flow narrowing
//!   (`narrow`, `widening`)
//!
//! Everything here is front-end independent; the checker drives it from
//! the syntax side.

pub mod def;
mod format;
mod intern;
pub mod narrow;
pub mod recursion;
pub mod relate;
pub mod types;
pub mod widening;

pub use def::{
    DefId, DefKind, DefinitionInfo, DefinitionStore, NoopResolver, StoreResolver, TypeResolver,
};
pub use format::TypeFormatter;
pub use intern::TypeInterner;
pub use narrow::{Narrower, TypeOfName, is_unit_type};
pub use relate::{
    CacheState, RelationCache, RelationChecker, RelationFailure, Ternary, explain_failure,
};
pub use types::{
    IntrinsicKind, LiteralValue, ObjectFlags, ObjectShape, ObjectShapeId, OrderedFloat, ParamInfo,
    PropertyInfo, RelationKey, RelationKind, Signature, SignatureId, TypeData, TypeId, TypeListId,
    TypeParamInfo, TypePredicate,
};
pub use widening::{is_fresh_object_type, widen_freshness, widen_literal};
