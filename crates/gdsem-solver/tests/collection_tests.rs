use super::*;
use crate::ty::Ty;
use gdsem_common::interner::ShardedInterner;

#[test]
fn test_typed_array_iteration() {
    let interner = ShardedInterner::new();
    let array_int = Ty::generic(interner.intern("Array"), vec![Ty::INT]);
    assert_eq!(iteration_element_type(&array_int, &interner), Ty::INT);
}

#[test]
fn test_dictionary_iterates_keys() {
    let interner = ShardedInterner::new();
    let dict = Ty::generic(
        interner.intern("Dictionary"),
        vec![Ty::STRING, Ty::INT],
    );
    assert_eq!(iteration_element_type(&dict, &interner), Ty::STRING);
    // Indexing yields values.
    assert_eq!(element_type(&dict, &interner), Ty::INT);
    assert_eq!(key_type(&dict, &interner), Ty::STRING);
}

#[test]
fn test_fixed_element_collections() {
    let interner = ShardedInterner::new();
    let cases = [
        ("PackedStringArray", Ty::STRING),
        ("PackedInt32Array", Ty::INT),
        ("PackedInt64Array", Ty::INT),
        ("PackedByteArray", Ty::INT),
        ("PackedFloat32Array", Ty::FLOAT),
        ("PackedFloat64Array", Ty::FLOAT),
        ("Range", Ty::INT),
    ];
    for (name, expected) in cases {
        let ty = Ty::Named(interner.intern(name));
        assert_eq!(
            iteration_element_type(&ty, &interner),
            expected,
            "iterating {name}"
        );
    }
    let vectors = Ty::Named(interner.intern("PackedVector2Array"));
    assert_eq!(
        iteration_element_type(&vectors, &interner),
        Ty::Named(interner.intern("Vector2"))
    );
}

#[test]
fn test_string_and_int_iteration() {
    let interner = ShardedInterner::new();
    assert_eq!(iteration_element_type(&Ty::STRING, &interner), Ty::STRING);
    // `for i in range(n)` is seen as iterating an int count.
    assert_eq!(iteration_element_type(&Ty::INT, &interner), Ty::INT);
}

#[test]
fn test_unknown_collection_is_variant() {
    let interner = ShardedInterner::new();
    let node = Ty::Named(interner.intern("Node"));
    assert_eq!(iteration_element_type(&node, &interner), Ty::Variant);
    assert_eq!(iteration_element_type(&Ty::Variant, &interner), Ty::Variant);
    let untyped_array = Ty::Named(interner.intern("Array"));
    assert_eq!(iteration_element_type(&untyped_array, &interner), Ty::Variant);
}

#[test]
fn test_key_types() {
    let interner = ShardedInterner::new();
    let array = Ty::Named(interner.intern("Array"));
    assert_eq!(key_type(&array, &interner), Ty::INT);
    assert_eq!(key_type(&Ty::STRING, &interner), Ty::INT);
    let packed = Ty::Named(interner.intern("PackedFloat32Array"));
    assert_eq!(key_type(&packed, &interner), Ty::INT);
}

#[test]
fn test_container_method_classification() {
    assert!(is_container_method("append"));
    assert!(is_container_method("size"));
    assert!(is_container_method("keys"));
    assert!(!is_container_method("add_child"));
    assert!(!is_container_method("play"));
}

#[test]
fn test_packed_array_classification() {
    assert!(is_packed_array("PackedStringArray"));
    assert!(is_packed_array("PackedColorArray"));
    assert!(!is_packed_array("Array"));
}
