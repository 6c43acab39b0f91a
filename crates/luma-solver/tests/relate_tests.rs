use super::*;
use crate::TypeInterner;
use crate::def::{DefinitionInfo, DefinitionStore, NoopResolver, StoreResolver};
use crate::types::{
    LiteralValue, ObjectFlags, ObjectShape, ParamInfo, PropertyInfo, TypeParamInfo, TypePredicate,
};
use crate::widening::widen_freshness;

fn assignable(db: &TypeInterner, source: TypeId, target: TypeId) -> bool {
    let cache = RelationCache::new();
    RelationChecker::new(db, &NoopResolver, &cache).is_assignable_to(source, target)
}

fn comparable(db: &TypeInterner, source: TypeId, target: TypeId) -> bool {
    let cache = RelationCache::new();
    RelationChecker::new(db, &NoopResolver, &cache).is_comparable_to(source, target)
}

fn identical(db: &TypeInterner, source: TypeId, target: TypeId) -> bool {
    let cache = RelationCache::new();
    RelationChecker::new(db, &NoopResolver, &cache).is_identical_to(source, target)
}

#[test]
fn test_top_and_bottom_types() {
    let db = TypeInterner::new();
    assert!(assignable(&db, TypeId::ANY, TypeId::STRING));
    assert!(assignable(&db, TypeId::STRING, TypeId::ANY));
    assert!(assignable(&db, TypeId::STRING, TypeId::UNKNOWN));
    assert!(!assignable(&db, TypeId::UNKNOWN, TypeId::STRING));
    assert!(comparable(&db, TypeId::UNKNOWN, TypeId::STRING));
    assert!(assignable(&db, TypeId::NEVER, TypeId::STRING));
    assert!(!assignable(&db, TypeId::STRING, TypeId::NEVER));
    assert!(assignable(&db, TypeId::UNDEFINED, TypeId::VOID));
    assert!(!assignable(&db, TypeId::VOID, TypeId::UNDEFINED));
}

#[test]
fn test_error_relates_both_ways() {
    let db = TypeInterner::new();
    assert!(assignable(&db, TypeId::ERROR, TypeId::STRING));
    assert!(assignable(&db, TypeId::STRING, TypeId::ERROR));
    assert!(identical(&db, TypeId::ERROR, TypeId::NUMBER));
}

#[test]
fn test_literal_rules() {
    let db = TypeInterner::new();
    let a = db.literal_string("a");
    let b = db.literal_string("b");
    assert!(assignable(&db, a, TypeId::STRING));
    assert!(!assignable(&db, TypeId::STRING, a));
    assert!(comparable(&db, TypeId::STRING, a));
    assert!(!assignable(&db, a, b));
    assert!(!comparable(&db, a, b));
    assert!(!assignable(&db, a, TypeId::NUMBER));

    assert!(assignable(&db, TypeId::TRUE, TypeId::BOOLEAN));
    assert!(!assignable(&db, TypeId::BOOLEAN, TypeId::TRUE));
    assert!(comparable(&db, TypeId::BOOLEAN, TypeId::TRUE));
    assert!(!comparable(&db, TypeId::TRUE, TypeId::FALSE));
}

#[test]
fn test_union_source_needs_all_members() {
    let db = TypeInterner::new();
    let string_or_number = db.union2(TypeId::STRING, TypeId::NUMBER);
    assert!(!assignable(&db, string_or_number, TypeId::STRING));
    assert!(assignable(&db, string_or_number, string_or_number));
    let wider = db.union(vec![TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN]);
    assert!(assignable(&db, string_or_number, wider));
    assert!(!assignable(&db, wider, string_or_number));
    // Comparable only needs overlap.
    assert!(comparable(&db, string_or_number, TypeId::STRING));
}

#[test]
fn test_union_target_needs_some_member() {
    let db = TypeInterner::new();
    let string_or_number = db.union2(TypeId::STRING, TypeId::NUMBER);
    assert!(assignable(&db, TypeId::STRING, string_or_number));
    assert!(assignable(&db, db.literal_string("a"), string_or_number));
    assert!(!assignable(&db, TypeId::BOOLEAN, string_or_number));
}

#[test]
fn test_intersection_rules() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let b = db.intern_string("b");
    let has_a = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let has_b = db.object(vec![PropertyInfo::required(b, TypeId::STRING)]);
    let both = db.intersection2(has_a, has_b);

    // An intersection is assignable to each of its members.
    assert!(assignable(&db, both, has_a));
    assert!(assignable(&db, both, has_b));
    // And assignability to an intersection needs every member.
    assert!(!assignable(&db, has_a, both));
    let ab = db.object(vec![
        PropertyInfo::required(a, TypeId::NUMBER),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    assert!(assignable(&db, ab, both));
}

#[test]
fn test_object_property_covariance() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let narrow = db.object(vec![PropertyInfo::required(a, db.literal_number(1.0))]);
    let wide = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    assert!(assignable(&db, narrow, wide));
    assert!(!assignable(&db, wide, narrow));
}

#[test]
fn test_object_width_subtyping() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let b = db.intern_string("b");
    let ab = db.object(vec![
        PropertyInfo::required(a, TypeId::NUMBER),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    let just_a = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    // Extra properties are fine for non-fresh sources; missing ones are not.
    assert!(assignable(&db, ab, just_a));
    assert!(!assignable(&db, just_a, ab));
}

#[test]
fn test_optional_property_rules() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let required = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let optional = db.object(vec![PropertyInfo::optional(a, TypeId::NUMBER)]);
    let empty = db.object(Vec::new());

    // Required satisfies optional, and absence satisfies optional.
    assert!(assignable(&db, required, optional));
    assert!(assignable(&db, empty, optional));
    // Optional does not satisfy required: the value may be undefined.
    assert!(!assignable(&db, optional, required));
}

#[test]
fn test_excess_property_check() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let b = db.intern_string("b");
    let fresh = db.fresh_object(vec![
        PropertyInfo::required(a, TypeId::NUMBER),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    let just_a = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);

    // Fresh literals are width-restricted; widening lifts the restriction.
    assert!(!assignable(&db, fresh, just_a));
    assert!(assignable(&db, widen_freshness(&db, fresh), just_a));
    // The comparable relation ignores freshness.
    assert!(comparable(&db, fresh, just_a));
}

#[test]
fn test_excess_property_check_against_union() {
    let db = TypeInterner::new();
    let kind = db.intern_string("kind");
    let extra = db.intern_string("extra");
    let variant_a = db.object(vec![PropertyInfo::required(kind, db.literal_string("a"))]);
    let variant_b = db.object(vec![PropertyInfo::required(kind, db.literal_string("b"))]);
    let union = db.union2(variant_a, variant_b);

    let fresh = db.fresh_object(vec![
        PropertyInfo::required(kind, db.literal_string("a")),
        PropertyInfo::required(extra, TypeId::NUMBER),
    ]);
    assert!(!assignable(&db, fresh, union));

    let ok = db.fresh_object(vec![PropertyInfo::required(kind, db.literal_string("a"))]);
    assert!(assignable(&db, ok, union));
}

#[test]
fn test_string_index_signature() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let dict = db.object_from_shape(ObjectShape {
        flags: ObjectFlags::empty(),
        properties: Vec::new(),
        string_index: Some(TypeId::NUMBER),
        number_index: None,
        call_signatures: Vec::new(),
        construct_signatures: Vec::new(),
    });
    let numbers = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let strings = db.object(vec![PropertyInfo::required(a, TypeId::STRING)]);

    // Every property must satisfy the target's index signature.
    assert!(assignable(&db, numbers, dict));
    assert!(!assignable(&db, strings, dict));
    // And an index signature can stand in for missing properties.
    assert!(assignable(&db, dict, numbers));
}

#[test]
fn test_primitives_satisfy_empty_object() {
    let db = TypeInterner::new();
    let empty = db.object(Vec::new());
    assert!(assignable(&db, TypeId::STRING, empty));
    assert!(assignable(&db, db.literal_number(1.0), empty));
    assert!(!assignable(&db, TypeId::NULL, empty));
    assert!(!assignable(&db, TypeId::UNDEFINED, empty));
}

#[test]
fn test_function_parameter_contravariance() {
    let db = TypeInterner::new();
    let x = db.intern_string("x");
    let takes_string = db.function(vec![ParamInfo::required(x, TypeId::STRING)], TypeId::VOID);
    let takes_string_or_number = db.function(
        vec![ParamInfo::required(
            x,
            db.union2(TypeId::STRING, TypeId::NUMBER),
        )],
        TypeId::VOID,
    );
    assert!(assignable(&db, takes_string_or_number, takes_string));
    assert!(!assignable(&db, takes_string, takes_string_or_number));
}

#[test]
fn test_function_return_covariance() {
    let db = TypeInterner::new();
    let returns_literal = db.function(Vec::new(), db.literal_string("a"));
    let returns_string = db.function(Vec::new(), TypeId::STRING);
    assert!(assignable(&db, returns_literal, returns_string));
    assert!(!assignable(&db, returns_string, returns_literal));

    // A void-returning target accepts any return type.
    let returns_void = db.function(Vec::new(), TypeId::VOID);
    assert!(assignable(&db, returns_string, returns_void));
    assert!(!assignable(&db, returns_void, returns_string));
}

#[test]
fn test_function_arity() {
    let db = TypeInterner::new();
    let x = db.intern_string("x");
    let y = db.intern_string("y");
    let unary = db.function(vec![ParamInfo::required(x, TypeId::NUMBER)], TypeId::VOID);
    let binary = db.function(
        vec![
            ParamInfo::required(x, TypeId::NUMBER),
            ParamInfo::required(y, TypeId::NUMBER),
        ],
        TypeId::VOID,
    );
    // Ignoring trailing arguments is fine; requiring extra ones is not.
    assert!(assignable(&db, unary, binary));
    assert!(!assignable(&db, binary, unary));

    let binary_optional = db.function(
        vec![
            ParamInfo::required(x, TypeId::NUMBER),
            ParamInfo {
                name: y,
                type_id: TypeId::NUMBER,
                optional: true,
                rest: false,
            },
        ],
        TypeId::VOID,
    );
    assert!(assignable(&db, binary_optional, unary));
}

#[test]
fn test_rest_parameters() {
    let db = TypeInterner::new();
    let x = db.intern_string("x");
    let args = db.intern_string("args");
    let variadic = db.function(
        vec![ParamInfo {
            name: args,
            type_id: TypeId::NUMBER,
            optional: false,
            rest: true,
        }],
        TypeId::VOID,
    );
    let binary = db.function(
        vec![
            ParamInfo::required(x, TypeId::NUMBER),
            ParamInfo::required(x, TypeId::NUMBER),
        ],
        TypeId::VOID,
    );
    assert!(assignable(&db, variadic, binary));
    assert!(assignable(&db, binary, variadic));

    let string_binary = db.function(
        vec![ParamInfo::required(x, TypeId::STRING)],
        TypeId::VOID,
    );
    assert!(!assignable(&db, variadic, string_binary));
}

#[test]
fn test_predicate_signatures() {
    let db = TypeInterner::new();
    let x = db.intern_string("x");
    let params = vec![ParamInfo::required(x, TypeId::UNKNOWN)];
    let is_string = db.function_with_predicate(
        params.clone(),
        TypeId::BOOLEAN,
        TypePredicate {
            param_index: 0,
            target: TypeId::STRING,
        },
    );
    let is_literal = db.function_with_predicate(
        params.clone(),
        TypeId::BOOLEAN,
        TypePredicate {
            param_index: 0,
            target: db.literal_string("a"),
        },
    );
    let plain = db.function(params, TypeId::BOOLEAN);

    // Predicate targets are covariant.
    assert!(assignable(&db, is_literal, is_string));
    assert!(!assignable(&db, is_string, is_literal));
    // A plain boolean function is not a predicate.
    assert!(!assignable(&db, plain, is_string));
    // But predicates still work where a boolean function is wanted.
    assert!(assignable(&db, is_string, plain));
}

#[test]
fn test_type_param_constraint() {
    let db = TypeInterner::new();
    let name = db.intern_string("T");
    let bounded = db.type_param(TypeParamInfo {
        name,
        constraint: Some(TypeId::STRING),
    });
    let unbounded = db.type_param(TypeParamInfo {
        name,
        constraint: None,
    });
    assert!(assignable(&db, bounded, TypeId::STRING));
    assert!(!assignable(&db, bounded, TypeId::NUMBER));
    assert!(!assignable(&db, unbounded, TypeId::STRING));
    assert!(assignable(&db, unbounded, TypeId::UNKNOWN));
    assert!(!assignable(&db, TypeId::STRING, bounded));
}

#[test]
fn test_enum_nominal_rules() {
    let db = TypeInterner::new();
    let defs = DefinitionStore::new();
    let color = defs.register(DefinitionInfo::enumeration(
        db.intern_string("Color"),
        vec![
            (db.intern_string("Red"), LiteralValue::number(0.0)),
            (db.intern_string("Blue"), LiteralValue::number(1.0)),
        ],
    ));
    let shade = defs.register(DefinitionInfo::enumeration(
        db.intern_string("Shade"),
        vec![(db.intern_string("Dark"), LiteralValue::number(0.0))],
    ));

    let cache = RelationCache::new();
    let mut checker = RelationChecker::new(&db, &NoopResolver, &cache).with_defs(&defs);

    let red = db.enum_member(color, LiteralValue::number(0.0));
    let blue = db.enum_member(color, LiteralValue::number(1.0));
    let dark = db.enum_member(shade, LiteralValue::number(0.0));

    assert!(checker.is_assignable_to(red, db.enum_type(color)));
    // Same value, different enum: nominal, not structural.
    assert!(!checker.is_assignable_to(dark, db.enum_type(color)));
    assert!(checker.is_comparable_to(dark, db.enum_type(color)));
    // Members never assign to each other, but equality tests between them
    // are legal, inside one enum and across enums alike.
    assert!(!checker.is_assignable_to(red, blue));
    assert!(checker.is_comparable_to(red, blue));
    assert!(checker.is_comparable_to(red, dark));

    // Members carry their value's base primitive.
    assert!(checker.is_assignable_to(red, TypeId::NUMBER));
    assert!(checker.is_assignable_to(db.enum_type(color), TypeId::NUMBER));
    assert!(!checker.is_assignable_to(TypeId::NUMBER, db.enum_type(color)));
    assert!(checker.is_comparable_to(TypeId::NUMBER, db.enum_type(color)));
}

#[test]
fn test_recursive_types_are_coinductive() {
    let db = TypeInterner::new();
    let defs = DefinitionStore::new();
    let value = db.intern_string("value");
    let next = db.intern_string("next");

    // Two structurally equal self-referential lists under different names.
    let def_a = defs.register(DefinitionInfo::interface(db.intern_string("ListA")));
    let def_b = defs.register(DefinitionInfo::interface(db.intern_string("ListB")));
    let body_a = db.object(vec![
        PropertyInfo::required(value, TypeId::NUMBER),
        PropertyInfo::required(next, db.union2(db.lazy(def_a), TypeId::UNDEFINED)),
    ]);
    let body_b = db.object(vec![
        PropertyInfo::required(value, TypeId::NUMBER),
        PropertyInfo::required(next, db.union2(db.lazy(def_b), TypeId::UNDEFINED)),
    ]);
    defs.set_body(def_a, body_a);
    defs.set_body(def_b, body_b);

    let resolver = StoreResolver::new(&defs);
    let cache = RelationCache::new();
    let mut checker = RelationChecker::new(&db, &resolver, &cache);
    assert!(checker.is_assignable_to(db.lazy(def_a), db.lazy(def_b)));
    assert!(checker.is_assignable_to(db.lazy(def_b), db.lazy(def_a)));
    assert!(checker.is_identical_to(db.lazy(def_a), db.lazy(def_b)));
    assert!(!checker.depth_exceeded());

    // The cycle's assumption was committed to the shared cache.
    assert!(cache.get(RelationKey {
        source: body_a,
        target: body_b,
        kind: RelationKind::Assignable,
    }) == Some(CacheState::True));
}

#[test]
fn test_recursive_mismatch_is_rejected() {
    let db = TypeInterner::new();
    let defs = DefinitionStore::new();
    let value = db.intern_string("value");
    let next = db.intern_string("next");

    let def_a = defs.register(DefinitionInfo::interface(db.intern_string("NumberList")));
    let def_b = defs.register(DefinitionInfo::interface(db.intern_string("StringList")));
    let body_a = db.object(vec![
        PropertyInfo::required(value, TypeId::NUMBER),
        PropertyInfo::required(next, db.union2(db.lazy(def_a), TypeId::UNDEFINED)),
    ]);
    let body_b = db.object(vec![
        PropertyInfo::required(value, TypeId::STRING),
        PropertyInfo::required(next, db.union2(db.lazy(def_b), TypeId::UNDEFINED)),
    ]);
    defs.set_body(def_a, body_a);
    defs.set_body(def_b, body_b);

    let resolver = StoreResolver::new(&defs);
    let cache = RelationCache::new();
    let mut checker = RelationChecker::new(&db, &resolver, &cache);
    assert!(!checker.is_assignable_to(db.lazy(def_a), db.lazy(def_b)));
    // The failure was pinned in the cache.
    assert_eq!(
        cache.get(RelationKey {
            source: body_a,
            target: body_b,
            kind: RelationKind::Assignable,
        }),
        Some(CacheState::False)
    );
}

#[test]
fn test_identical_ignores_freshness() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let props = vec![PropertyInfo::required(a, TypeId::NUMBER)];
    let fresh = db.fresh_object(props.clone());
    let widened = db.object(props);
    assert!(identical(&db, fresh, widened));
    assert!(identical(&db, widened, fresh));
}

#[test]
fn test_identical_is_strict() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let required = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let optional = db.object(vec![PropertyInfo::optional(a, TypeId::NUMBER)]);
    assert!(!identical(&db, required, optional));
    assert!(!identical(&db, db.literal_string("a"), TypeId::STRING));
    assert!(!identical(&db, TypeId::STRING, TypeId::NUMBER));
    assert!(identical(&db, TypeId::STRING, TypeId::STRING));
}

#[test]
fn test_explain_missing_property() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let b = db.intern_string("b");
    let source = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let target = db.object(vec![
        PropertyInfo::required(a, TypeId::NUMBER),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    let failure = explain_failure(
        &db,
        &NoopResolver,
        None,
        source,
        target,
        RelationKind::Assignable,
    );
    assert!(matches!(
        failure,
        Some(RelationFailure::MissingProperty { name, .. }) if name == b
    ));
}

#[test]
fn test_explain_excess_property() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let b = db.intern_string("b");
    let fresh = db.fresh_object(vec![
        PropertyInfo::required(a, TypeId::NUMBER),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    let target = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let failure = explain_failure(
        &db,
        &NoopResolver,
        None,
        fresh,
        target,
        RelationKind::Assignable,
    );
    assert!(matches!(
        failure,
        Some(RelationFailure::ExcessProperty { name, .. }) if name == b
    ));
}

#[test]
fn test_explain_property_mismatch() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let source = db.object(vec![PropertyInfo::required(a, TypeId::STRING)]);
    let target = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let failure = explain_failure(
        &db,
        &NoopResolver,
        None,
        source,
        target,
        RelationKind::Assignable,
    );
    assert!(matches!(
        failure,
        Some(RelationFailure::PropertyMismatch { name, source_type, target_type })
            if name == a && source_type == TypeId::STRING && target_type == TypeId::NUMBER
    ));
}

#[test]
fn test_cache_is_reused_across_checkers() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let source = db.object(vec![PropertyInfo::required(a, db.literal_number(1.0))]);
    let target = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);

    let cache = RelationCache::new();
    assert!(RelationChecker::new(&db, &NoopResolver, &cache).is_assignable_to(source, target));
    let key = RelationKey {
        source,
        target,
        kind: RelationKind::Assignable,
    };
    assert_eq!(cache.get(key), Some(CacheState::True));
    // A second checker over the same cache hits the stored result.
    assert!(RelationChecker::new(&db, &NoopResolver, &cache).is_assignable_to(source, target));
}

#[test]
fn test_assignability_is_reflexive() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let object = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    let function = db.function(vec![ParamInfo::required(a, object)], TypeId::STRING);
    let union = db.union(vec![TypeId::STRING, object, function]);
    for ty in [
        TypeId::STRING,
        TypeId::NULL,
        db.literal_number(1.0),
        object,
        function,
        union,
    ] {
        assert!(assignable(&db, ty, ty));
        assert!(identical(&db, ty, ty));
        assert!(comparable(&db, ty, ty));
    }
}

#[test]
fn test_assignability_is_transitive_over_object_chains() {
    let db = TypeInterner::new();
    let a = db.intern_string("a");
    let b = db.intern_string("b");
    // Each step widens: a literal property, then its primitive, then a
    // union, then width subtyping drops a property.
    let first = db.object(vec![
        PropertyInfo::required(a, db.literal_number(1.0)),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    let second = db.object(vec![
        PropertyInfo::required(a, TypeId::NUMBER),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    let third = db.object(vec![
        PropertyInfo::required(a, db.union2(TypeId::NUMBER, TypeId::STRING)),
        PropertyInfo::required(b, TypeId::STRING),
    ]);
    let fourth = db.object(vec![PropertyInfo::required(b, TypeId::STRING)]);

    let chain = [first, second, third, fourth];
    for window in chain.windows(2) {
        assert!(assignable(&db, window[0], window[1]));
    }
    // Every earlier link reaches every later one directly.
    for (index, &source) in chain.iter().enumerate() {
        for &target in &chain[index + 1..] {
            assert!(assignable(&db, source, target));
        }
    }
    assert!(!assignable(&db, fourth, first));
}

#[test]
fn test_cancellation_reports_unrelated() {
    let db = TypeInterner::new();
    let token = luma_common::CancellationToken::new();
    token.cancel();
    let cache = RelationCache::new();
    let mut checker =
        RelationChecker::new(&db, &NoopResolver, &cache).with_cancellation(&token);
    let a = db.intern_string("a");
    let source = db.object(vec![PropertyInfo::required(a, TypeId::NUMBER)]);
    assert!(!checker.is_assignable_to(source, db.object(Vec::new())));
    assert!(checker.was_cancelled());
    // Nothing was cached for the aborted query.
    assert!(cache.is_empty());
}
