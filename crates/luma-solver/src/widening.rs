//! Literal widening and freshness.
//!
//! Fresh object literal types get excess-property checking; widening clears
//! freshness and, for inference positions, replaces literal types with their
//! base primitives.

use crate::TypeInterner;
use crate::types::{IntrinsicKind, ObjectFlags, TypeData, TypeId};

pub fn is_fresh_object_type(db: &TypeInterner, ty: TypeId) -> bool {
    db.shape_of(ty).is_some_and(|shape| shape.is_fresh())
}

/// Clear the fresh flag without touching property types. Applied when an
/// object literal's type escapes its original expression.
pub fn widen_freshness(db: &TypeInterner, ty: TypeId) -> TypeId {
    match db.lookup(ty) {
        Some(TypeData::Object(shape_id)) => {
            let Some(shape) = db.object_shape(shape_id) else {
                return ty;
            };
            if !shape.is_fresh() {
                return ty;
            }
            let mut widened = (*shape).clone();
            widened.flags.remove(ObjectFlags::FRESH_LITERAL);
            db.object_from_shape(widened)
        }
        Some(TypeData::Union(list)) => {
            let members = db
                .type_list(list)
                .iter()
                .map(|&member| widen_freshness(db, member))
                .collect();
            db.union_preserving_literals(members)
        }
        _ => ty,
    }
}

/// Full inference widening: literals become their base primitive, enum
/// members become their enum, fresh objects lose freshness and have their
/// property types widened recursively.
pub fn widen_literal(db: &TypeInterner, ty: TypeId) -> TypeId {
    match db.lookup(ty) {
        Some(TypeData::Literal(value)) => value.base_type(),
        Some(TypeData::Intrinsic(IntrinsicKind::True | IntrinsicKind::False)) => TypeId::BOOLEAN,
        Some(TypeData::EnumMember { def, .. }) => db.enum_type(def),
        Some(TypeData::Union(list)) => {
            let members = db
                .type_list(list)
                .iter()
                .map(|&member| widen_literal(db, member))
                .collect();
            db.union(members)
        }
        Some(TypeData::Object(shape_id)) => {
            let Some(shape) = db.object_shape(shape_id) else {
                return ty;
            };
            if !shape.is_fresh() {
                return ty;
            }
            let mut widened = (*shape).clone();
            widened.flags.remove(ObjectFlags::FRESH_LITERAL);
            for prop in &mut widened.properties {
                prop.type_id = widen_literal(db, prop.type_id);
            }
            db.object_from_shape(widened)
        }
        _ => ty,
    }
}

#[cfg(test)]
#[path = "../tests/widening_tests.rs"]
mod tests;
