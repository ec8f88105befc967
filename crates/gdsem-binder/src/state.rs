//! Binder - declaration pass over one file AST.
//!
//! Pass 1 of semantic analysis: enumerate class members (variables, methods,
//! signals, enums, constants, inner classes) and local declarations
//! (parameters, locals, iterators, match bindings), producing the symbol
//! arena and the persistent scope tree the later passes query.

use crate::scopes::{Scope, ScopeId, ScopeKind};
use crate::symbols::{ParamInfo, Symbol, SymbolArena, SymbolId, SymbolKind};
use gdsem_ast::arena::AstArena;
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_common::interner::{Atom, ShardedInterner};
use gdsem_solver::annotation::ty_from_annotation;
use gdsem_solver::Ty;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::debug;

/// Binder state for one file.
pub struct BinderState {
    pub interner: Arc<ShardedInterner>,
    /// Arena for symbol storage.
    pub symbols: SymbolArena,
    /// Persistent scopes - enables querying scope information without
    /// traversal order.
    pub scopes: Vec<Scope>,
    /// Map from AST node (that creates a scope) to its `ScopeId`.
    pub node_scope_ids: FxHashMap<u32, ScopeId>,
    /// Declaration-node-to-symbol mapping.
    pub node_symbols: FxHashMap<u32, SymbolId>,
    /// Name-to-symbols mapping, in declaration order.
    pub symbols_by_name: FxHashMap<Atom, Vec<SymbolId>>,
    /// The file-level class scope.
    pub root_scope: ScopeId,
    /// The file-level class symbol.
    pub root_class: SymbolId,
    /// Guards against double-binding when a malformed tree aliases a node
    /// under two parents.
    visited: FxHashSet<u32>,
}

impl BinderState {
    /// Run the declaration pass over a file rooted at `root` (a class
    /// declaration).
    #[must_use]
    pub fn bind_file(
        arena: &AstArena,
        root: NodeIndex,
        interner: Arc<ShardedInterner>,
    ) -> BinderState {
        let mut state = BinderState {
            interner,
            symbols: SymbolArena::new(),
            scopes: Vec::new(),
            node_scope_ids: FxHashMap::default(),
            node_symbols: FxHashMap::default(),
            symbols_by_name: FxHashMap::default(),
            root_scope: ScopeId::NONE,
            root_class: SymbolId::NONE,
            visited: FxHashSet::default(),
        };
        state.root_class = state.bind_class(arena, root, ScopeId::NONE, false);
        state.root_scope = state
            .node_scope_ids
            .get(&root.0)
            .copied()
            .unwrap_or(ScopeId::NONE);
        debug!(
            symbols = state.symbols.len(),
            scopes = state.scopes.len(),
            "bound file"
        );
        state
    }

    /// The root class name (`Atom::NONE` for anonymous file classes).
    #[must_use]
    pub fn class_name(&self) -> Atom {
        self.symbols
            .get(self.root_class)
            .map_or(Atom::NONE, |s| s.name)
    }

    pub(crate) fn new_scope(
        &mut self,
        kind: ScopeKind,
        node: NodeIndex,
        parent: ScopeId,
    ) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX - 1));
        self.scopes.push(Scope::new(id, parent, node, kind));
        self.node_scope_ids.insert(node.0, id);
        id
    }

    fn record(&mut self, decl: NodeIndex, symbol: Symbol) -> SymbolId {
        let name = symbol.name;
        let id = self.symbols.alloc(symbol);
        if decl.is_some() {
            self.node_symbols.insert(decl.0, id);
        }
        if !name.is_none() {
            self.symbols_by_name.entry(name).or_default().push(id);
        }
        id
    }

    // =========================================================================
    // Class members
    // =========================================================================

    fn bind_class(
        &mut self,
        arena: &AstArena,
        class_idx: NodeIndex,
        parent_scope: ScopeId,
        is_inner: bool,
    ) -> SymbolId {
        let Some(NodeKind::ClassDecl(data)) = arena.kind(class_idx) else {
            return SymbolId::NONE;
        };
        let data = data.clone();

        let mut class_symbol = Symbol::new(
            data.name,
            if is_inner {
                SymbolKind::InnerClass
            } else {
                SymbolKind::Class
            },
            class_idx,
            data.name_span,
        );
        class_symbol.scope_node = arena.parent(class_idx);
        let class_id = self.record(class_idx, class_symbol);

        let scope = self.new_scope(ScopeKind::Class, class_idx, parent_scope);
        if is_inner && !data.name.is_none() {
            if let Some(parent) = self.scope_mut(parent_scope) {
                parent.declare(data.name, class_id);
            }
        }

        for &member in &data.members {
            self.bind_member(arena, member, scope, class_idx, data.name);
        }
        class_id
    }

    fn bind_member(
        &mut self,
        arena: &AstArena,
        member: NodeIndex,
        class_scope: ScopeId,
        class_idx: NodeIndex,
        class_name: Atom,
    ) {
        match arena.kind(member) {
            Some(NodeKind::VarDecl(data)) => {
                let data = data.clone();
                let kind = if data.is_const {
                    SymbolKind::Constant
                } else {
                    SymbolKind::Property
                };
                let mut symbol = Symbol::new(data.name, kind, member, data.name_span);
                symbol.scope_node = class_idx;
                symbol.class_name = class_name;
                symbol.declared_ty = ty_from_annotation(arena, data.ty, &self.interner);
                symbol.getter = data.getter;
                symbol.setter = data.setter;
                let id = self.record(member, symbol);
                self.declare_in(class_scope, data.name, id);
                // Member initializers may contain lambdas that open scopes.
                if data.init.is_some() {
                    self.bind_body_node(arena, data.init, class_scope, NodeIndex::NONE);
                }
            }
            Some(NodeKind::MethodDecl(data)) => {
                let data = data.clone();
                let mut symbol = Symbol::new(data.name, SymbolKind::Method, member, data.name_span);
                symbol.scope_node = class_idx;
                symbol.class_name = class_name;
                symbol.is_static = data.is_static;
                symbol.return_ty = ty_from_annotation(arena, data.return_ty, &self.interner);
                symbol.params = self.param_infos(arena, &data.params);
                let id = self.record(member, symbol);
                self.declare_in(class_scope, data.name, id);

                let method_scope = self.new_scope(ScopeKind::Method, member, class_scope);
                for &param in &data.params {
                    self.bind_param(arena, param, method_scope, member, class_name);
                }
                for &stmt in &data.body {
                    self.bind_body_node(arena, stmt, method_scope, member);
                }
            }
            Some(NodeKind::SignalDecl(data)) => {
                let data = data.clone();
                let mut symbol = Symbol::new(data.name, SymbolKind::Signal, member, data.name_span);
                symbol.scope_node = class_idx;
                symbol.class_name = class_name;
                symbol.params = self.param_infos(arena, &data.params);
                let id = self.record(member, symbol);
                self.declare_in(class_scope, data.name, id);
            }
            Some(NodeKind::EnumDecl(data)) => {
                let data = data.clone();
                if !data.name.is_none() {
                    let mut symbol =
                        Symbol::new(data.name, SymbolKind::Enum, member, data.name_span);
                    symbol.scope_node = class_idx;
                    symbol.class_name = class_name;
                    let id = self.record(member, symbol);
                    self.declare_in(class_scope, data.name, id);
                }
                for &value in &data.values {
                    if let Some(NodeKind::EnumValue(value_data)) = arena.kind(value) {
                        let value_data = value_data.clone();
                        let mut symbol = Symbol::new(
                            value_data.name,
                            SymbolKind::EnumValue,
                            value,
                            value_data.name_span,
                        );
                        symbol.scope_node = class_idx;
                        symbol.class_name = class_name;
                        symbol.declared_ty = Some(Ty::INT);
                        let id = self.record(value, symbol);
                        self.declare_in(class_scope, value_data.name, id);
                    }
                }
            }
            Some(NodeKind::ClassDecl(_)) => {
                self.bind_class(arena, member, class_scope, true);
            }
            _ => {}
        }
    }

    fn param_infos(&self, arena: &AstArena, params: &[NodeIndex]) -> Vec<ParamInfo> {
        params
            .iter()
            .filter_map(|&param| match arena.kind(param) {
                Some(NodeKind::ParamDecl(data)) => Some(ParamInfo {
                    name: data.name,
                    declared_ty: ty_from_annotation(arena, data.ty, &self.interner),
                    has_default: data.default.is_some(),
                    decl: param,
                }),
                _ => None,
            })
            .collect()
    }

    fn bind_param(
        &mut self,
        arena: &AstArena,
        param: NodeIndex,
        scope: ScopeId,
        callable: NodeIndex,
        class_name: Atom,
    ) {
        let Some(NodeKind::ParamDecl(data)) = arena.kind(param) else {
            return;
        };
        let data = data.clone();
        let mut symbol = Symbol::new(data.name, SymbolKind::Parameter, param, data.name_span);
        symbol.scope_node = callable;
        symbol.class_name = class_name;
        symbol.declared_ty = ty_from_annotation(arena, data.ty, &self.interner);
        let id = self.record(param, symbol);
        self.declare_in(scope, data.name, id);
    }

    // =========================================================================
    // Local declarations
    // =========================================================================

    /// Walk a statement or expression subtree, collecting local declarations
    /// and opening scopes for lambdas, loops, and match cases.
    fn bind_body_node(
        &mut self,
        arena: &AstArena,
        idx: NodeIndex,
        scope: ScopeId,
        callable: NodeIndex,
    ) {
        if idx.is_none() || !self.visited.insert(idx.0) {
            return;
        }
        match arena.kind(idx) {
            Some(NodeKind::VarDecl(data)) => {
                let data = data.clone();
                let kind = if data.is_const {
                    SymbolKind::Constant
                } else {
                    SymbolKind::Variable
                };
                let mut symbol = Symbol::new(data.name, kind, idx, data.name_span);
                symbol.scope_node = callable;
                symbol.declared_ty = ty_from_annotation(arena, data.ty, &self.interner);
                let id = self.record(idx, symbol);
                self.declare_in(scope, data.name, id);
                if data.init.is_some() {
                    self.bind_body_node(arena, data.init, scope, callable);
                }
            }
            Some(NodeKind::ForStmt(data)) => {
                let data = data.clone();
                self.bind_body_node(arena, data.collection, scope, callable);
                let loop_scope = self.new_scope(ScopeKind::Loop, idx, scope);
                if let Some(NodeKind::IteratorDecl { name, name_span }) =
                    arena.kind(data.iterator)
                {
                    let (name, name_span) = (*name, *name_span);
                    let mut symbol =
                        Symbol::new(name, SymbolKind::Iterator, data.iterator, name_span);
                    symbol.scope_node = callable;
                    let id = self.record(data.iterator, symbol);
                    self.declare_in(loop_scope, name, id);
                }
                for &stmt in &data.body {
                    self.bind_body_node(arena, stmt, loop_scope, callable);
                }
            }
            Some(NodeKind::MatchStmt(data)) => {
                let data = data.clone();
                self.bind_body_node(arena, data.subject, scope, callable);
                for &case in &data.cases {
                    let Some(NodeKind::MatchCase(case_data)) = arena.kind(case) else {
                        continue;
                    };
                    let case_data = case_data.clone();
                    let case_scope = self.new_scope(ScopeKind::MatchCase, case, scope);
                    for &pattern in &case_data.patterns {
                        if let Some(NodeKind::BindingPattern { name, name_span }) =
                            arena.kind(pattern)
                        {
                            let (name, name_span) = (*name, *name_span);
                            let mut symbol =
                                Symbol::new(name, SymbolKind::MatchBinding, pattern, name_span);
                            symbol.scope_node = callable;
                            // Bindings are `Variant` until the flow analyzer
                            // narrows them.
                            symbol.declared_ty = Some(Ty::Variant);
                            let id = self.record(pattern, symbol);
                            self.declare_in(case_scope, name, id);
                        }
                    }
                    for &stmt in &case_data.body {
                        self.bind_body_node(arena, stmt, case_scope, callable);
                    }
                }
            }
            Some(NodeKind::Lambda(data)) => {
                let data = data.clone();
                let lambda_scope = self.new_scope(ScopeKind::Lambda, idx, scope);
                for &param in &data.params {
                    self.bind_param(arena, param, lambda_scope, idx, Atom::NONE);
                }
                for &stmt in &data.body {
                    self.bind_body_node(arena, stmt, lambda_scope, idx);
                }
            }
            Some(_) => {
                for child in arena.children(idx) {
                    self.bind_body_node(arena, child, scope, callable);
                }
            }
            None => {}
        }
    }

    fn declare_in(&mut self, scope: ScopeId, name: Atom, symbol: SymbolId) {
        if name.is_none() {
            return;
        }
        if let Some(scope) = self.scope_mut(scope) {
            scope.declare(name, symbol);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        if id.is_none() {
            return None;
        }
        self.scopes.get(id.0 as usize)
    }

    fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        if id.is_none() {
            return None;
        }
        self.scopes.get_mut(id.0 as usize)
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// The symbol declared by an AST node, if the node is a declaration.
    #[must_use]
    pub fn symbol_for_decl(&self, node: NodeIndex) -> Option<SymbolId> {
        self.node_symbols.get(&node.0).copied()
    }

    /// All symbols with the given name, in declaration order.
    #[must_use]
    pub fn symbols_named(&self, name: Atom) -> &[SymbolId] {
        self.symbols_by_name
            .get(&name)
            .map_or(&[], |ids| ids.as_slice())
    }

    /// All method symbols of the file, in declaration order.
    #[must_use]
    pub fn methods(&self) -> Vec<SymbolId> {
        self.symbols
            .iter()
            .filter(|(_, s)| s.kind == SymbolKind::Method)
            .map(|(id, _)| id)
            .collect()
    }

    /// Look up a member of the root class by name.
    #[must_use]
    pub fn class_member(&self, name: Atom) -> Option<SymbolId> {
        self.scope(self.root_scope)?.get(name)
    }
}
