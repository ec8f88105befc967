//! Reference records.

use gdsem_ast::node::NodeIndex;
use gdsem_binder::{ScopeId, SymbolId};
use gdsem_common::interner::Atom;
use gdsem_common::span::Span;
use gdsem_solver::Ty;
use serde::Serialize;

/// How certain the analyzer is that a reference points at its symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Confidence {
    /// The member name exists somewhere, but not provably on this receiver.
    NameMatch,
    /// Resolved by name against a plausible but not proven receiver type.
    Potential,
    /// Resolved through scope, inheritance, or a concretely-typed receiver.
    Strict,
}

/// One use of a name: an identifier, member access, call target, or a
/// reflection-style string literal.
#[derive(Clone, Debug, Serialize)]
pub struct Reference {
    /// The referencing AST node.
    pub node: NodeIndex,
    /// The referenced name.
    pub name: Atom,
    /// The resolved script symbol; `SymbolId::NONE` when the target is a
    /// runtime member or unknown.
    pub symbol: SymbolId,
    /// The scope enclosing the reference at collection time.
    pub scope: ScopeId,
    pub is_read: bool,
    pub is_write: bool,
    pub confidence: Confidence,
    /// Receiver type name for member accesses; `Atom::NONE` otherwise.
    pub caller_type: Atom,
    /// Inferred type of the referencing expression.
    pub ty: Ty,
    /// The string-literal token for reflection-style references, so rename
    /// can rewrite it.
    pub token: Option<Span>,
}

impl Reference {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.symbol.is_none()
    }
}
