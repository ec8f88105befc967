//! The consumed runtime-provider interface.
//!
//! Everything here is read-only after initialization; the core shares one
//! provider across all per-file analysis units.

use gdsem_common::interner::Atom;
use gdsem_solver::Ty;
use serde::Serialize;

/// Member classification within a runtime type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MemberKind {
    Method,
    Property,
    Signal,
}

/// A method parameter as declared by the runtime database.
#[derive(Clone, Debug, Serialize)]
pub struct ParamSpec {
    pub name: Atom,
    pub ty: Ty,
    pub has_default: bool,
    pub is_varargs: bool,
}

impl ParamSpec {
    #[must_use]
    pub fn new(name: Atom, ty: Ty) -> Self {
        Self {
            name,
            ty,
            has_default: false,
            is_varargs: false,
        }
    }
}

/// A member of a runtime type: method, property, or signal.
#[derive(Clone, Debug, Serialize)]
pub struct MemberInfo {
    pub name: Atom,
    pub kind: MemberKind,
    /// Return type for methods, value type for properties, `Null` for
    /// signals.
    pub ty: Ty,
    pub params: Vec<ParamSpec>,
}

/// A runtime type: name, base edge, declared members.
#[derive(Clone, Debug, Serialize)]
pub struct TypeInfo {
    pub name: Atom,
    pub base: Option<Atom>,
    pub members: Vec<MemberInfo>,
}

impl TypeInfo {
    #[must_use]
    pub fn new(name: Atom, base: Option<Atom>) -> Self {
        Self {
            name,
            base,
            members: Vec::new(),
        }
    }

    /// Find a member declared directly on this type.
    #[must_use]
    pub fn own_member(&self, member: Atom) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name == member)
    }
}

/// Read-only database of runtime types.
///
/// Implementations must be cycle-safe: a corrupt base chain may contain a
/// loop, and every walking operation terminates regardless.
pub trait RuntimeProvider: Send + Sync {
    /// Look up a type by name.
    fn type_info(&self, name: Atom) -> Option<&TypeInfo>;

    /// Look up a member on a type, walking the base chain.
    fn member(&self, type_name: Atom, member_name: Atom) -> Option<&MemberInfo>;

    /// The direct base of a type.
    fn base_type(&self, name: Atom) -> Option<Atom>;

    /// Whether `source` is `target` or transitively derives from it.
    fn is_assignable(&self, source: Atom, target: Atom) -> bool;

    /// Whether an identifier names a built-in type or global function.
    fn is_builtin(&self, ident: Atom) -> bool;

    /// All types declaring a method with this name (reverse index).
    fn types_with_method(&self, method_name: Atom) -> Vec<Atom>;

    /// All types declaring a property with this name (reverse index).
    fn types_with_property(&self, property_name: Atom) -> Vec<Atom>;

    /// Every known type name.
    fn all_types(&self) -> Vec<Atom>;

    /// Look up a global function.
    fn global_function(&self, name: Atom) -> Option<&MemberInfo>;

    /// Whether a type is an engine singleton (`OS`, `Engine`, ...).
    /// Singletons are never inferred as parameter types.
    fn is_singleton(&self, name: Atom) -> bool;
}
