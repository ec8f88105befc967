//! Conversion from type annotation nodes to types.
//!
//! Annotations accept both the keyword spellings (`int`, `float`, `bool`)
//! and the canonical runtime names (`Int`, `Float`, `Bool`).

use crate::ty::{Primitive, Ty};
use gdsem_ast::arena::AstArena;
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_common::interner::ShardedInterner;

fn primitive_from_annotation(name: &str) -> Option<Primitive> {
    match name {
        "int" | "Int" => Some(Primitive::Int),
        "float" | "Float" => Some(Primitive::Float),
        "bool" | "Bool" => Some(Primitive::Bool),
        "String" => Some(Primitive::String),
        "StringName" => Some(Primitive::StringName),
        "NodePath" => Some(Primitive::NodePath),
        _ => None,
    }
}

/// Convert a `TypeRef` node into a type. Returns `None` when the node is
/// missing or not a type annotation.
#[must_use]
pub fn ty_from_annotation(
    arena: &AstArena,
    idx: NodeIndex,
    interner: &ShardedInterner,
) -> Option<Ty> {
    let NodeKind::TypeRef(data) = arena.kind(idx)? else {
        return None;
    };
    let name = interner.resolve(data.name)?;
    if data.args.is_empty() {
        if name.as_ref() == "Variant" {
            return Some(Ty::Variant);
        }
        if let Some(primitive) = primitive_from_annotation(&name) {
            return Some(Ty::Primitive(primitive));
        }
        return Some(Ty::Named(data.name));
    }
    let args = data
        .args
        .iter()
        .map(|&arg| ty_from_annotation(arena, arg, interner).unwrap_or(Ty::Variant))
        .collect();
    Some(Ty::generic(data.name, args))
}
