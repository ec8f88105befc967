//! Arena-allocated script AST consumed by the gdsem semantic analyzer.
//!
//! The external parser produces one `FileAst` per script file. Nodes live in
//! an `AstArena` and reference each other by `NodeIndex`; parent backrefs are
//! indices too, so upward navigation (scope discovery, narrowing context
//! lookup) is a bounded lookup, never shared ownership.
//!
//! Expression and statement shapes are a closed sum (`NodeKind`), so
//! consumers dispatch with exhaustive pattern matches instead of downcasts.

pub mod arena;
pub mod builder;
pub mod node;

pub use arena::AstArena;
pub use builder::{AstBuilder, FileAst};
pub use node::{
    AssignOp, BinaryOp, LiteralValue, Node, NodeIndex, NodeKind, UnaryOp,
};
