use super::*;
use luma_common::Interner;

#[test]
fn test_intrinsic_ids_are_fixed() {
    assert!(TypeId::ANY.is_intrinsic());
    assert!(TypeId::ERROR.is_intrinsic());
    assert!(!TypeId(TypeId::FIRST_DYNAMIC).is_intrinsic());
    assert_eq!(TypeId::ERROR.0 + 1, TypeId::FIRST_DYNAMIC);
}

#[test]
fn test_ordered_float_nan_equality() {
    let nan_a = OrderedFloat(f64::NAN);
    let nan_b = OrderedFloat(0.0_f64 / 0.0_f64);
    assert_eq!(nan_a, nan_b);
    assert_ne!(OrderedFloat(0.0), OrderedFloat(-0.0));
    assert_eq!(OrderedFloat(1.5), OrderedFloat(1.5));
}

#[test]
fn test_literal_base_type() {
    let interner = Interner::new();
    let atom = interner.intern("hello");
    assert_eq!(LiteralValue::String(atom).base_type(), TypeId::STRING);
    assert_eq!(LiteralValue::number(42.0).base_type(), TypeId::NUMBER);
}

#[test]
fn test_object_shape_property_lookup() {
    let interner = Interner::new();
    let a = interner.intern("a");
    let b = interner.intern("b");
    let c = interner.intern("c");
    let mut properties = vec![
        PropertyInfo::required(a, TypeId::NUMBER),
        PropertyInfo::required(b, TypeId::STRING),
    ];
    properties.sort_by_key(|prop| prop.name);
    let shape = ObjectShape {
        flags: ObjectFlags::empty(),
        properties,
        string_index: None,
        number_index: None,
        call_signatures: Vec::new(),
        construct_signatures: Vec::new(),
    };
    assert_eq!(shape.property(a).map(|prop| prop.type_id), Some(TypeId::NUMBER));
    assert_eq!(shape.property(b).map(|prop| prop.type_id), Some(TypeId::STRING));
    assert!(shape.property(c).is_none());
}

#[test]
fn test_empty_object_shape() {
    let interner = Interner::new();
    let shape = ObjectShape {
        flags: ObjectFlags::empty(),
        properties: vec![PropertyInfo::optional(interner.intern("a"), TypeId::NUMBER)],
        string_index: None,
        number_index: None,
        call_signatures: Vec::new(),
        construct_signatures: Vec::new(),
    };
    assert!(shape.is_empty_object());

    let non_empty = ObjectShape {
        properties: vec![PropertyInfo::required(interner.intern("a"), TypeId::NUMBER)],
        ..shape
    };
    assert!(!non_empty.is_empty_object());
}

#[test]
fn test_signature_argument_counts() {
    let interner = Interner::new();
    let a = interner.intern("a");
    let b = interner.intern("b");
    let rest = interner.intern("rest");
    let signature = Signature::new(
        vec![
            ParamInfo::required(a, TypeId::NUMBER),
            ParamInfo {
                name: b,
                type_id: TypeId::STRING,
                optional: true,
                rest: false,
            },
            ParamInfo {
                name: rest,
                type_id: TypeId::ANY,
                optional: false,
                rest: true,
            },
        ],
        TypeId::VOID,
    );
    assert_eq!(signature.min_argument_count(), 1);
    assert!(signature.has_rest());

    let plain = Signature::new(vec![ParamInfo::required(a, TypeId::NUMBER)], TypeId::VOID);
    assert_eq!(plain.min_argument_count(), 1);
    assert!(!plain.has_rest());
}

#[test]
fn test_fresh_flag_is_part_of_shape_identity() {
    let fresh = ObjectShape {
        flags: ObjectFlags::FRESH_LITERAL,
        properties: Vec::new(),
        string_index: None,
        number_index: None,
        call_signatures: Vec::new(),
        construct_signatures: Vec::new(),
    };
    let widened = ObjectShape {
        flags: ObjectFlags::empty(),
        ..fresh.clone()
    };
    assert!(fresh.is_fresh());
    assert!(!widened.is_fresh());
    assert_ne!(fresh, widened);
}
