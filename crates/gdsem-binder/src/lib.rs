//! Symbol and scope binding for the gdsem semantic analyzer.
//!
//! This crate provides:
//! - `Symbol`, `SymbolArena` - symbol storage
//! - `Scope`, `ScopeId` - persistent scope tree
//! - `BinderState` - the declaration pass over one file AST

pub mod scopes;
pub mod state;
pub mod state_resolution;
pub mod symbols;

pub use scopes::{Scope, ScopeId, ScopeKind};
pub use state::BinderState;
pub use symbols::{ParamInfo, Symbol, SymbolArena, SymbolId, SymbolKind};
