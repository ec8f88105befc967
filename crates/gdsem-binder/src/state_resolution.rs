//! Name resolution for `BinderState`.
//!
//! Scope-walking identifier lookup: discover the enclosing scope of a node
//! by walking AST ancestors to the nearest scope-introducing node, then walk
//! the scope chain upward until the name is found.

use crate::scopes::ScopeId;
use crate::state::BinderState;
use crate::symbols::{SymbolId, SymbolKind};
use gdsem_ast::arena::AstArena;
use gdsem_ast::node::NodeIndex;
use gdsem_common::interner::Atom;
use gdsem_common::limits::MAX_SCOPE_WALK_ITERATIONS;
use tracing::trace;

impl BinderState {
    /// Find the scope enclosing a node.
    ///
    /// Falls back to the root class scope when the node is outside any
    /// scope-introducing construct.
    #[must_use]
    pub fn find_enclosing_scope(&self, arena: &AstArena, node: NodeIndex) -> ScopeId {
        if let Some(&scope) = self.node_scope_ids.get(&node.0) {
            return scope;
        }
        for ancestor in arena.ancestors(node) {
            if let Some(&scope) = self.node_scope_ids.get(&ancestor.0) {
                return scope;
            }
        }
        self.root_scope
    }

    /// Resolve a name visible at `from`, walking the scope chain upward.
    #[must_use]
    pub fn resolve_name(&self, arena: &AstArena, from: NodeIndex, name: Atom) -> Option<SymbolId> {
        let mut scope_id = self.find_enclosing_scope(arena, from);
        let mut iterations = 0usize;
        while scope_id.is_some() && iterations < MAX_SCOPE_WALK_ITERATIONS {
            iterations += 1;
            let scope = self.scope(scope_id)?;
            if let Some(symbol) = scope.get(name) {
                trace!(scope = scope_id.0, symbol = symbol.0, "resolved name");
                return Some(symbol);
            }
            scope_id = scope.parent;
        }
        None
    }

    /// Resolve a name visible at `from`, restricted to local symbols
    /// (excluding class members). Used when the member chain should be
    /// consulted separately.
    #[must_use]
    pub fn resolve_local(&self, arena: &AstArena, from: NodeIndex, name: Atom) -> Option<SymbolId> {
        let symbol = self.resolve_name(arena, from, name)?;
        if self.symbol(symbol)?.kind.is_local() {
            Some(symbol)
        } else {
            None
        }
    }

    /// Resolve a property's `get`/`set` accessor names to the methods of
    /// its declaring class.
    #[must_use]
    pub fn property_accessors(
        &self,
        property: SymbolId,
    ) -> (Option<SymbolId>, Option<SymbolId>) {
        let Some(symbol) = self.symbol(property) else {
            return (None, None);
        };
        // The declaring class scope; inner-class properties resolve their
        // accessors against the inner scope, not the root.
        let scope = self
            .node_scope_ids
            .get(&symbol.scope_node.0)
            .copied()
            .unwrap_or(self.root_scope);
        let resolve = |name: Atom| -> Option<SymbolId> {
            if name.is_none() {
                return None;
            }
            let id = self.scope(scope)?.get(name)?;
            (self.symbol(id)?.kind == SymbolKind::Method).then_some(id)
        };
        (resolve(symbol.getter), resolve(symbol.setter))
    }

    /// All symbols visible from a node, innermost scope first. Shadowed
    /// names appear once.
    #[must_use]
    pub fn visible_symbols(&self, arena: &AstArena, from: NodeIndex) -> Vec<SymbolId> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut result = Vec::new();
        let mut scope_id = self.find_enclosing_scope(arena, from);
        let mut iterations = 0usize;
        while scope_id.is_some() && iterations < MAX_SCOPE_WALK_ITERATIONS {
            iterations += 1;
            let Some(scope) = self.scope(scope_id) else {
                break;
            };
            let mut entries: Vec<(Atom, SymbolId)> =
                scope.table.iter().map(|(&k, &v)| (k, v)).collect();
            entries.sort();
            for (name, symbol) in entries {
                if seen.insert(name) {
                    result.push(symbol);
                }
            }
            scope_id = scope.parent;
        }
        result
    }
}
