//! Container and iterator element type tables.
//!
//! Generic containers carry their element types as type arguments; packed
//! arrays, strings, and ranges have fixed element types. These tables are
//! consulted by for-loop iterator typing, indexer inference, and the
//! parameter resolver's container-affinity scoring.

use crate::ty::{Primitive, Ty};
use gdsem_common::interner::ShardedInterner;

/// The packed-array type names and their fixed element types.
pub const PACKED_ARRAYS: &[(&str, Ty)] = &[
    ("PackedByteArray", Ty::INT),
    ("PackedInt32Array", Ty::INT),
    ("PackedInt64Array", Ty::INT),
    ("PackedFloat32Array", Ty::FLOAT),
    ("PackedFloat64Array", Ty::FLOAT),
    ("PackedStringArray", Ty::STRING),
];

/// Packed arrays whose element is a runtime class rather than a primitive.
pub const PACKED_CLASS_ARRAYS: &[(&str, &str)] = &[
    ("PackedVector2Array", "Vector2"),
    ("PackedVector3Array", "Vector3"),
    ("PackedColorArray", "Color"),
];

/// Methods shared by the container surface. A candidate type whose required
/// methods are mostly drawn from this set is treated as container-shaped by
/// the parameter resolver.
pub const CONTAINER_METHODS: &[&str] = &[
    "append",
    "append_array",
    "clear",
    "erase",
    "fill",
    "filter",
    "find",
    "get",
    "has",
    "insert",
    "is_empty",
    "keys",
    "map",
    "pop_back",
    "pop_front",
    "push_back",
    "push_front",
    "reduce",
    "size",
    "sort",
    "values",
];

/// Fixed element type of a packed array, by type name.
#[must_use]
pub fn packed_array_element(name: &str, interner: &ShardedInterner) -> Option<Ty> {
    for &(packed, ref element) in PACKED_ARRAYS {
        if packed == name {
            return Some(element.clone());
        }
    }
    for &(packed, class) in PACKED_CLASS_ARRAYS {
        if packed == name {
            return Some(Ty::Named(interner.intern(class)));
        }
    }
    None
}

/// Whether a type name is one of the packed-array aliases.
#[must_use]
pub fn is_packed_array(name: &str) -> bool {
    PACKED_ARRAYS.iter().any(|&(packed, _)| packed == name)
        || PACKED_CLASS_ARRAYS.iter().any(|&(packed, _)| packed == name)
}

/// Whether a method name belongs to the common container surface.
#[must_use]
pub fn is_container_method(name: &str) -> bool {
    CONTAINER_METHODS.binary_search(&name).is_ok()
}

/// The element type produced by iterating a collection (`for x in coll`).
#[must_use]
pub fn iteration_element_type(ty: &Ty, interner: &ShardedInterner) -> Ty {
    match ty {
        Ty::Generic(generic) => {
            let base = interner.resolve(generic.base);
            match base.as_deref() {
                Some("Array") => generic.args.first().cloned().unwrap_or(Ty::Variant),
                // Iterating a dictionary yields its keys.
                Some("Dictionary") => generic.args.first().cloned().unwrap_or(Ty::Variant),
                _ => Ty::Variant,
            }
        }
        // `range(...)` produces ints, whether seen as a Range value or as an
        // int count.
        Ty::Primitive(Primitive::Int) => Ty::INT,
        Ty::Primitive(Primitive::String) => Ty::STRING,
        Ty::Named(name) => match interner.resolve(*name).as_deref() {
            Some("Range") => Ty::INT,
            Some(name_str) => packed_array_element(name_str, interner).unwrap_or(Ty::Variant),
            None => Ty::Variant,
        },
        _ => Ty::Variant,
    }
}

/// The value type produced by indexing a collection (`coll[i]`).
#[must_use]
pub fn element_type(ty: &Ty, interner: &ShardedInterner) -> Ty {
    match ty {
        Ty::Generic(generic) => {
            let base = interner.resolve(generic.base);
            match base.as_deref() {
                Some("Array") => generic.args.first().cloned().unwrap_or(Ty::Variant),
                Some("Dictionary") => generic.args.get(1).cloned().unwrap_or(Ty::Variant),
                _ => Ty::Variant,
            }
        }
        Ty::Primitive(Primitive::String) => Ty::STRING,
        Ty::Named(name) => match interner.resolve(*name).as_deref() {
            Some("Range") => Ty::INT,
            Some(name_str) => packed_array_element(name_str, interner).unwrap_or(Ty::Variant),
            None => Ty::Variant,
        },
        _ => Ty::Variant,
    }
}

/// The key type accepted when indexing a collection.
#[must_use]
pub fn key_type(ty: &Ty, interner: &ShardedInterner) -> Ty {
    match ty {
        Ty::Generic(generic) => {
            let base = interner.resolve(generic.base);
            match base.as_deref() {
                Some("Array") => Ty::INT,
                Some("Dictionary") => generic.args.first().cloned().unwrap_or(Ty::Variant),
                _ => Ty::Variant,
            }
        }
        Ty::Primitive(Primitive::String) => Ty::INT,
        Ty::Named(name) => match interner.resolve(*name).as_deref() {
            Some("Array") => Ty::INT,
            Some("Dictionary") => Ty::Variant,
            Some(name_str) if is_packed_array(name_str) => Ty::INT,
            _ => Ty::Variant,
        },
        _ => Ty::Variant,
    }
}

#[cfg(test)]
#[path = "../tests/collection_tests.rs"]
mod tests;
