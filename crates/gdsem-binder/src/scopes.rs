//! Persistent scope tree.
//!
//! Scopes are recorded during the declaration pass and queried later without
//! regard to traversal order: any node can discover its enclosing scope by
//! walking AST ancestors to the nearest scope-introducing node.

use gdsem_ast::node::NodeIndex;
use gdsem_common::interner::Atom;
use crate::symbols::SymbolId;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Identifier of a scope in the binder's scope list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    Class,
    Method,
    Lambda,
    /// One match case; holds its binding patterns.
    MatchCase,
    /// A for statement; holds its iterator variable.
    Loop,
}

/// A lexical scope: symbol table plus parent edge.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: ScopeId,
    /// The AST node introducing this scope.
    pub node: NodeIndex,
    pub kind: ScopeKind,
    pub table: FxHashMap<Atom, SymbolId>,
}

impl Scope {
    #[must_use]
    pub fn new(id: ScopeId, parent: ScopeId, node: NodeIndex, kind: ScopeKind) -> Self {
        Self {
            id,
            parent,
            node,
            kind,
            table: FxHashMap::default(),
        }
    }

    /// Declare a name in this scope. First declaration wins; a duplicate
    /// declaration of the same name leaves the original binding in place.
    pub fn declare(&mut self, name: Atom, symbol: SymbolId) {
        self.table.entry(name).or_insert(symbol);
    }

    #[must_use]
    pub fn get(&self, name: Atom) -> Option<SymbolId> {
        self.table.get(&name).copied()
    }
}
