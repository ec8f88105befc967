//! Canonicalizing union construction.
//!
//! All union types are built through `UnionBuilder`, which maintains the
//! `UnionTy` invariants: flattened (no nested unions), `Variant` absorbs the
//! whole union, no duplicates, members in canonical order, and a union is
//! only produced for two or more distinct members.

use crate::ty::{Primitive, Ty, UnionTy};

/// Builds a canonical type from a sequence of joined types.
#[derive(Debug, Default)]
pub struct UnionBuilder {
    members: Vec<Ty>,
    saw_variant: bool,
}

impl UnionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type to the union. Nested unions are flattened; `Variant`
    /// absorbs everything.
    pub fn add(&mut self, ty: Ty) {
        if self.saw_variant {
            return;
        }
        match ty {
            Ty::Variant => {
                self.saw_variant = true;
                self.members.clear();
            }
            Ty::Union(union) => {
                for member in union.members {
                    self.add(member);
                }
            }
            other => {
                if !self.members.contains(&other) {
                    self.members.push(other);
                }
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.saw_variant && self.members.is_empty()
    }

    /// Number of distinct members accumulated so far (0 after `Variant`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Build the canonical type: `Variant` when absorbed or empty, the
    /// single member when only one, a sorted union otherwise.
    #[must_use]
    pub fn build(self) -> Ty {
        if self.saw_variant || self.members.is_empty() {
            return Ty::Variant;
        }
        let mut members = self.members;
        if members.len() == 1 {
            return members.remove(0);
        }
        members.sort();
        Ty::Union(Box::new(UnionTy { members }))
    }

    /// Build like [`build`](Self::build), but collapse mixed `Int` + `Float`
    /// evidence to `Float` first. Used for container element evidence, where
    /// a slot that has held both numeric kinds is a float slot.
    #[must_use]
    pub fn build_collapsing_numeric(mut self) -> Ty {
        let has_float = self.members.contains(&Ty::Primitive(Primitive::Float));
        if has_float {
            self.members
                .retain(|ty| *ty != Ty::Primitive(Primitive::Int));
        }
        self.build()
    }
}

/// Join two types into their union.
#[must_use]
pub fn join(a: Ty, b: Ty) -> Ty {
    let mut builder = UnionBuilder::new();
    builder.add(a);
    builder.add(b);
    builder.build()
}

/// Narrow-direction join: `Variant` contributes nothing, so a concrete
/// assertion replaces it instead of being absorbed.
#[must_use]
pub fn join_narrow(a: Ty, b: Ty) -> Ty {
    match (a, b) {
        (Ty::Variant, other) | (other, Ty::Variant) => other,
        (a, b) => join(a, b),
    }
}

#[cfg(test)]
#[path = "../tests/union_tests.rs"]
mod tests;
