//! Core type definitions for the semantic analyzer.
//!
//! `Ty` is a closed sum; consumers dispatch with exhaustive matches. Types
//! are value-like and cheap to clone: names are interned `Atom`s, and the
//! two large variants are boxed.

use gdsem_common::interner::{Atom, ShardedInterner};
use serde::Serialize;

/// The fixed catalog of primitive types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Primitive {
    Int,
    Float,
    Bool,
    String,
    StringName,
    NodePath,
}

impl Primitive {
    /// The runtime type name of this primitive.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Int => "Int",
            Primitive::Float => "Float",
            Primitive::Bool => "Bool",
            Primitive::String => "String",
            Primitive::StringName => "StringName",
            Primitive::NodePath => "NodePath",
        }
    }

    /// Parse a runtime type name into a primitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Primitive> {
        match name {
            "Int" => Some(Primitive::Int),
            "Float" => Some(Primitive::Float),
            "Bool" => Some(Primitive::Bool),
            "String" => Some(Primitive::String),
            "StringName" => Some(Primitive::StringName),
            "NodePath" => Some(Primitive::NodePath),
            _ => None,
        }
    }
}

/// A generic container instantiation such as `Array[Int]` or
/// `Dictionary[String, Node]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GenericTy {
    pub base: Atom,
    pub args: Vec<Ty>,
}

/// A finite set of non-union, non-variant types.
///
/// Invariants (enforced by `UnionBuilder`): at least two members, sorted
/// canonical order, no duplicates, no nested unions, no `Variant`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnionTy {
    pub members: Vec<Ty>,
}

/// A script type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Ty {
    /// Unknown/any; the top of the lattice.
    Variant,
    /// The singleton null type.
    Null,
    Primitive(Primitive),
    /// Any non-generic user or runtime class.
    Named(Atom),
    Generic(Box<GenericTy>),
    Union(Box<UnionTy>),
}

impl Ty {
    pub const INT: Ty = Ty::Primitive(Primitive::Int);
    pub const FLOAT: Ty = Ty::Primitive(Primitive::Float);
    pub const BOOL: Ty = Ty::Primitive(Primitive::Bool);
    pub const STRING: Ty = Ty::Primitive(Primitive::String);
    pub const STRING_NAME: Ty = Ty::Primitive(Primitive::StringName);
    pub const NODE_PATH: Ty = Ty::Primitive(Primitive::NodePath);

    #[must_use]
    pub fn named(name: Atom) -> Ty {
        Ty::Named(name)
    }

    #[must_use]
    pub fn generic(base: Atom, args: Vec<Ty>) -> Ty {
        Ty::Generic(Box::new(GenericTy { base, args }))
    }

    #[inline]
    #[must_use]
    pub const fn is_variant(&self) -> bool {
        matches!(self, Ty::Variant)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Ty::Null)
    }

    /// A concrete type is anything other than `Variant`.
    #[inline]
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        !matches!(self, Ty::Variant)
    }

    #[inline]
    #[must_use]
    pub const fn is_union(&self) -> bool {
        matches!(self, Ty::Union(_))
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Ty::Primitive(Primitive::Int) | Ty::Primitive(Primitive::Float)
        )
    }

    /// Union members, or a one-element slice view for non-union types.
    #[must_use]
    pub fn members(&self) -> &[Ty] {
        match self {
            Ty::Union(union) => &union.members,
            other => std::slice::from_ref(other),
        }
    }

    /// Whether `other` is this type or one of this union's members.
    #[must_use]
    pub fn contains(&self, other: &Ty) -> bool {
        match self {
            Ty::Union(union) => union.members.contains(other),
            this => this == other,
        }
    }

    /// The runtime type name used for provider lookups, interning primitive
    /// names on demand. `Variant`, `Null`, and unions have no single name.
    #[must_use]
    pub fn runtime_name(&self, interner: &ShardedInterner) -> Option<Atom> {
        match self {
            Ty::Variant | Ty::Null | Ty::Union(_) => None,
            Ty::Primitive(p) => Some(interner.intern(p.name())),
            Ty::Named(name) => Some(*name),
            Ty::Generic(generic) => Some(generic.base),
        }
    }

    /// Render the type for display (`Array[Int]`, `Int | Float`, ...).
    #[must_use]
    pub fn render(&self, interner: &ShardedInterner) -> String {
        match self {
            Ty::Variant => "Variant".to_string(),
            Ty::Null => "null".to_string(),
            Ty::Primitive(p) => p.name().to_string(),
            Ty::Named(name) => interner
                .resolve(*name)
                .map_or_else(|| "?".to_string(), |s| s.to_string()),
            Ty::Generic(generic) => {
                let base = interner
                    .resolve(generic.base)
                    .map_or_else(|| "?".to_string(), |s| s.to_string());
                let args: Vec<String> =
                    generic.args.iter().map(|arg| arg.render(interner)).collect();
                format!("{}[{}]", base, args.join(", "))
            }
            Ty::Union(union) => {
                let members: Vec<String> =
                    union.members.iter().map(|m| m.render(interner)).collect();
                members.join(" | ")
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/ty_tests.rs"]
mod tests;
