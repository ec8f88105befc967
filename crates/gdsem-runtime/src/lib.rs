//! Runtime type provider interface and catalog.
//!
//! The semantic core consumes a read-only database of runtime types: member
//! lookup, inheritance edges, assignability, and the reverse indices
//! (method name -> declaring types) that power duck-type resolution.
//!
//! `RuntimeProvider` is the consumed interface; `RuntimeCatalog` is the
//! in-memory implementation the project loader populates (and tests seed via
//! `core_catalog`).

pub mod builtins;
pub mod catalog;
pub mod provider;

pub use catalog::RuntimeCatalog;
pub use builtins::core_catalog;
pub use provider::{MemberInfo, MemberKind, ParamSpec, RuntimeProvider, TypeInfo};
