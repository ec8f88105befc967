//! Type representation and type algebra for the gdsem semantic analyzer.
//!
//! This crate provides:
//! - `Ty` - the closed sum of script types (variant, null, primitives, named
//!   classes, generic containers, unions)
//! - `UnionBuilder` - canonicalizing union construction
//! - Operator result tables for binary/unary expressions
//! - Container and iterator element type tables

pub mod annotation;
pub mod collections;
pub mod operators;
pub mod ty;
pub mod union;

pub use annotation::ty_from_annotation;
pub use ty::{GenericTy, Primitive, Ty, UnionTy};
pub use union::UnionBuilder;
