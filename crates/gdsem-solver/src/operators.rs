//! Operator result tables.
//!
//! Binary and unary expression types are resolved through fixed tables:
//! comparisons and membership tests yield `Bool`, numeric operators follow
//! int/float promotion, `+` concatenates strings and arrays, `%` on a string
//! is the format operator.

use crate::collections::is_packed_array;
use crate::ty::{Primitive, Ty};
use gdsem_ast::node::{BinaryOp, UnaryOp};
use gdsem_common::interner::ShardedInterner;

fn numeric_promotion(lhs: &Ty, rhs: &Ty) -> Option<Ty> {
    match (lhs, rhs) {
        (Ty::Primitive(Primitive::Int), Ty::Primitive(Primitive::Int)) => Some(Ty::INT),
        (Ty::Primitive(Primitive::Int), Ty::Primitive(Primitive::Float))
        | (Ty::Primitive(Primitive::Float), Ty::Primitive(Primitive::Int))
        | (Ty::Primitive(Primitive::Float), Ty::Primitive(Primitive::Float)) => Some(Ty::FLOAT),
        _ => None,
    }
}

fn is_string(ty: &Ty) -> bool {
    matches!(
        ty,
        Ty::Primitive(Primitive::String) | Ty::Primitive(Primitive::StringName)
    )
}

fn is_array(ty: &Ty, interner: &ShardedInterner) -> bool {
    match ty {
        Ty::Generic(generic) => interner
            .resolve(generic.base)
            .is_some_and(|base| base.as_ref() == "Array"),
        Ty::Named(name) => interner
            .resolve(*name)
            .is_some_and(|text| text.as_ref() == "Array" || is_packed_array(&text)),
        _ => false,
    }
}

/// Result type of a binary expression.
#[must_use]
pub fn binary_result(op: BinaryOp, lhs: &Ty, rhs: &Ty, interner: &ShardedInterner) -> Ty {
    match op {
        // Boolean-producing operators.
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::And
        | BinaryOp::Or
        | BinaryOp::Is
        | BinaryOp::IsNot
        | BinaryOp::In => Ty::BOOL,

        BinaryOp::Add => {
            if is_string(lhs) && is_string(rhs) {
                return Ty::STRING;
            }
            if is_array(lhs, interner) && is_array(rhs, interner) {
                // Concatenation keeps the type when both sides agree;
                // mixed array kinds widen to an untyped Array.
                if lhs == rhs {
                    return lhs.clone();
                }
                return Ty::Named(interner.intern("Array"));
            }
            numeric_promotion(lhs, rhs).unwrap_or(Ty::Variant)
        }

        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            numeric_promotion(lhs, rhs).unwrap_or(Ty::Variant)
        }

        BinaryOp::Mod => {
            // String formatting: `"%s" % args` yields a string.
            if is_string(lhs) {
                return Ty::STRING;
            }
            numeric_promotion(lhs, rhs).unwrap_or(Ty::Variant)
        }

        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
            Ty::INT
        }
    }
}

/// Result type of a unary expression.
#[must_use]
pub fn unary_result(op: UnaryOp, operand: &Ty) -> Ty {
    match op {
        UnaryOp::Not => Ty::BOOL,
        UnaryOp::BitNot => Ty::INT,
        UnaryOp::Neg => match operand {
            Ty::Primitive(Primitive::Int) => Ty::INT,
            Ty::Primitive(Primitive::Float) => Ty::FLOAT,
            _ => Ty::Variant,
        },
    }
}

#[cfg(test)]
#[path = "../tests/operator_tests.rs"]
mod tests;
