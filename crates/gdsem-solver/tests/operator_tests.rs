use super::*;
use crate::ty::Ty;
use gdsem_ast::node::{BinaryOp, UnaryOp};
use gdsem_common::interner::ShardedInterner;

#[test]
fn test_numeric_promotion() {
    let i = ShardedInterner::new();
    assert_eq!(binary_result(BinaryOp::Add, &Ty::INT, &Ty::INT, &i), Ty::INT);
    assert_eq!(
        binary_result(BinaryOp::Add, &Ty::INT, &Ty::FLOAT, &i),
        Ty::FLOAT
    );
    assert_eq!(
        binary_result(BinaryOp::Mul, &Ty::FLOAT, &Ty::INT, &i),
        Ty::FLOAT
    );
    assert_eq!(
        binary_result(BinaryOp::Sub, &Ty::FLOAT, &Ty::FLOAT, &i),
        Ty::FLOAT
    );
}

#[test]
fn test_string_concatenation() {
    let i = ShardedInterner::new();
    assert_eq!(
        binary_result(BinaryOp::Add, &Ty::STRING, &Ty::STRING, &i),
        Ty::STRING
    );
    // Format operator.
    assert_eq!(
        binary_result(BinaryOp::Mod, &Ty::STRING, &Ty::Variant, &i),
        Ty::STRING
    );
}

#[test]
fn test_array_concatenation() {
    let i = ShardedInterner::new();
    let array = Ty::Named(i.intern("Array"));
    let array_int = Ty::generic(i.intern("Array"), vec![Ty::INT]);
    let array_str = Ty::generic(i.intern("Array"), vec![Ty::STRING]);
    let packed = Ty::Named(i.intern("PackedInt32Array"));

    assert_eq!(
        binary_result(BinaryOp::Add, &array, &array, &i),
        array
    );
    // Agreeing element types are preserved.
    assert_eq!(
        binary_result(BinaryOp::Add, &array_int, &array_int, &i),
        array_int
    );
    assert_eq!(
        binary_result(BinaryOp::Add, &packed, &packed, &i),
        packed
    );
    // Mixed array kinds widen to an untyped Array.
    assert_eq!(
        binary_result(BinaryOp::Add, &array_int, &array_str, &i),
        array
    );
    assert_eq!(
        binary_result(BinaryOp::Add, &packed, &array, &i),
        array
    );
}

#[test]
fn test_comparisons_and_tests_are_bool() {
    let i = ShardedInterner::new();
    for op in [
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Ge,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Is,
        BinaryOp::IsNot,
        BinaryOp::In,
    ] {
        assert_eq!(binary_result(op, &Ty::Variant, &Ty::Variant, &i), Ty::BOOL);
    }
}

#[test]
fn test_unknown_arithmetic_is_variant() {
    let i = ShardedInterner::new();
    assert_eq!(
        binary_result(BinaryOp::Add, &Ty::BOOL, &Ty::INT, &i),
        Ty::Variant
    );
    assert_eq!(
        binary_result(BinaryOp::Div, &Ty::Variant, &Ty::INT, &i),
        Ty::Variant
    );
    // Array on one side only is not a concatenation.
    let array = Ty::Named(i.intern("Array"));
    assert_eq!(
        binary_result(BinaryOp::Add, &array, &Ty::INT, &i),
        Ty::Variant
    );
}

#[test]
fn test_bitwise_is_int() {
    let i = ShardedInterner::new();
    assert_eq!(
        binary_result(BinaryOp::BitOr, &Ty::INT, &Ty::INT, &i),
        Ty::INT
    );
    assert_eq!(binary_result(BinaryOp::Shl, &Ty::INT, &Ty::INT, &i), Ty::INT);
}

#[test]
fn test_unary() {
    assert_eq!(unary_result(UnaryOp::Not, &Ty::Variant), Ty::BOOL);
    assert_eq!(unary_result(UnaryOp::Neg, &Ty::INT), Ty::INT);
    assert_eq!(unary_result(UnaryOp::Neg, &Ty::FLOAT), Ty::FLOAT);
    assert_eq!(unary_result(UnaryOp::Neg, &Ty::STRING), Ty::Variant);
    assert_eq!(unary_result(UnaryOp::BitNot, &Ty::INT), Ty::INT);
}
