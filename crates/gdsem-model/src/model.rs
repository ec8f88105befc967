//! Per-file semantic model.
//!
//! Construction runs the two analysis passes in order - declarations
//! (binder), then references (collector) - and drives the checker over
//! every method so the model retains owned, memoized results: node types,
//! flow states, return unions, container profiles, duck constraints, and
//! references. Queries never mutate; rebuilding the same file yields an
//! equivalent model.

use crate::collector::{CollectorOutput, LocalCallSite, RefCollector};
use crate::refs::{Confidence, Reference};
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_ast::FileAst;
use gdsem_binder::{BinderState, SymbolId, SymbolKind};
use gdsem_checker::{
    AnalysisArtifacts, CallSiteOracle, CheckerContext, ContainerUsageProfile, FlowState,
    InferredType, ParameterConstraints,
};
use gdsem_common::interner::{Atom, ShardedInterner};
use gdsem_common::options::AnalysisOptions;
use gdsem_runtime::RuntimeProvider;
use gdsem_solver::{Ty, UnionBuilder};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, span, Level};

/// Expected-versus-actual view for a node, with duck constraints.
#[derive(Clone, Debug, Default)]
pub struct TypeDiff {
    /// What the surrounding context expects.
    pub expected: Option<Ty>,
    /// What inference produced.
    pub actual: Option<Ty>,
    /// Structural constraints accumulated for the receiver variable.
    pub duck: Option<ParameterConstraints>,
    /// Symbol whose usage produced the duck constraints.
    pub duck_source: Option<SymbolId>,
}

/// Queryable semantic model of one file.
pub struct SemanticModel {
    file: FileAst,
    binder: BinderState,
    interner: Arc<ShardedInterner>,
    references: Vec<Reference>,
    refs_by_symbol: FxHashMap<SymbolId, Vec<usize>>,
    refs_by_name: FxHashMap<Atom, Vec<usize>>,
    node_confidence: FxHashMap<u32, Confidence>,
    node_symbols: FxHashMap<u32, SymbolId>,
    node_types: FxHashMap<u32, Ty>,
    node_expected: FxHashMap<u32, Ty>,
    artifacts: AnalysisArtifacts,
    param_types: FxHashMap<u32, Vec<(Atom, InferredType)>>,
    union_types: FxHashMap<SymbolId, Ty>,
    call_sites: Vec<LocalCallSite>,
}

impl SemanticModel {
    /// Build a model with no project services (file-local analysis).
    #[must_use]
    pub fn build(file: FileAst, runtime: &dyn RuntimeProvider, options: AnalysisOptions) -> Self {
        Self::build_with_oracle(file, runtime, options, None)
    }

    /// Build a model, optionally wired to the project's call-site registry.
    #[must_use]
    pub fn build_with_oracle(
        file: FileAst,
        runtime: &dyn RuntimeProvider,
        options: AnalysisOptions,
        oracle: Option<&dyn CallSiteOracle>,
    ) -> Self {
        let _span = span!(Level::DEBUG, "build_semantic_model", path = %file.path).entered();

        // Pass 1: declarations.
        let interner = Arc::clone(&file.interner);
        let binder = BinderState::bind_file(&file.arena, file.root, Arc::clone(&interner));

        let mut ctx = CheckerContext::new(&file.arena, &binder, runtime, options);
        if let Some(oracle) = oracle {
            ctx = ctx.with_oracle(oracle);
        }

        // Pass 2: references. Publishes call sites to the oracle, so the
        // analyses below already see this file's sites.
        let output = RefCollector::collect(&ctx, file.root, &file.path);

        // Drive every analysis to completion so queries read owned results.
        let mut param_types = FxHashMap::default();
        for method in binder.methods() {
            let Some(decl) = binder.symbol(method).map(|s| s.decl) else {
                continue;
            };
            let _ = ctx.method_flow(decl);
            let _ = ctx.return_union(decl);
            param_types.insert(decl.0, ctx.infer_parameter_types(decl));
        }
        for idx in file.arena.indices() {
            if matches!(file.arena.kind(idx), Some(NodeKind::Lambda(_))) {
                param_types.insert(idx.0, ctx.infer_parameter_types(idx));
            }
        }
        let mut node_types = FxHashMap::default();
        let mut node_expected = FxHashMap::default();
        for idx in file.arena.indices() {
            if file
                .arena
                .kind(idx)
                .is_some_and(NodeKind::is_expression)
            {
                node_types.insert(idx.0, ctx.infer(idx));
                if let Some(expected) = ctx.expected_type(idx) {
                    node_expected.insert(idx.0, expected);
                }
            }
        }
        for (id, symbol) in binder.symbols.iter() {
            if symbol.kind.is_local() || symbol.kind == SymbolKind::Property {
                let _ = ctx.container_profile(id);
                if symbol.declared_ty.is_none() {
                    let _ = ctx.usage_constraints(id);
                }
            }
        }
        let union_types = compute_union_types(&ctx, &binder);
        let artifacts = ctx.into_artifacts();

        let CollectorOutput {
            references,
            node_confidence,
            mut node_symbols,
            call_sites,
        } = output;

        // Declaration nodes resolve to their own symbols.
        for (&node, &symbol) in &binder.node_symbols {
            node_symbols.entry(node).or_insert(symbol);
        }

        let mut refs_by_symbol: FxHashMap<SymbolId, Vec<usize>> = FxHashMap::default();
        let mut refs_by_name: FxHashMap<Atom, Vec<usize>> = FxHashMap::default();
        for (index, reference) in references.iter().enumerate() {
            if reference.is_resolved() {
                refs_by_symbol
                    .entry(reference.symbol)
                    .or_default()
                    .push(index);
            }
            refs_by_name.entry(reference.name).or_default().push(index);
        }

        debug!(
            symbols = binder.symbols.len(),
            references = references.len(),
            "semantic model built"
        );
        SemanticModel {
            file,
            binder,
            interner,
            references,
            refs_by_symbol,
            refs_by_name,
            node_confidence,
            node_symbols,
            node_types,
            node_expected,
            artifacts,
            param_types,
            union_types,
            call_sites,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn path(&self) -> &str {
        &self.file.path
    }

    #[must_use]
    pub fn file(&self) -> &FileAst {
        &self.file
    }

    #[must_use]
    pub fn binder(&self) -> &BinderState {
        &self.binder
    }

    #[must_use]
    pub fn interner(&self) -> &Arc<ShardedInterner> {
        &self.interner
    }

    #[must_use]
    pub fn class_name(&self) -> Atom {
        self.binder.class_name()
    }

    /// The `extends` base of the file's root class.
    #[must_use]
    pub fn base_class(&self) -> Atom {
        match self.file.arena.kind(self.file.root) {
            Some(NodeKind::ClassDecl(data)) => data.base,
            _ => Atom::NONE,
        }
    }

    /// Call sites recorded in this file.
    #[must_use]
    pub fn call_sites(&self) -> &[LocalCallSite] {
        &self.call_sites
    }

    /// Inferred (or declared) return union of a method symbol.
    #[must_use]
    pub fn method_return(&self, method: SymbolId) -> Option<Ty> {
        let symbol = self.binder.symbol(method)?;
        if let Some(declared) = &symbol.return_ty {
            return Some(declared.clone());
        }
        self.artifacts.return_unions.get(&symbol.decl.0).cloned()
    }

    // =========================================================================
    // Symbol queries
    // =========================================================================

    /// The symbol at a line/column position, if any.
    #[must_use]
    pub fn symbol_at(&self, line: u32, column: u32) -> Option<SymbolId> {
        let offset = self
            .file
            .line_map
            .position_to_offset(gdsem_common::position::Position::new(line, column))?;
        let node = self.file.arena.node_at_offset(offset);
        self.symbol_for_node_or_ancestor(node)
    }

    /// The symbol an AST node declares or references.
    #[must_use]
    pub fn symbol_for_node(&self, node: NodeIndex) -> Option<SymbolId> {
        self.node_symbols.get(&node.0).copied()
    }

    fn symbol_for_node_or_ancestor(&self, node: NodeIndex) -> Option<SymbolId> {
        if let Some(symbol) = self.symbol_for_node(node) {
            return Some(symbol);
        }
        for ancestor in self.file.arena.ancestors(node) {
            if let Some(symbol) = self.symbol_for_node(ancestor) {
                return Some(symbol);
            }
        }
        None
    }

    /// The first symbol with this name, in declaration order.
    #[must_use]
    pub fn find_symbol(&self, name: &str) -> Option<SymbolId> {
        let atom = self.interner.get(name)?;
        self.binder.symbols_named(atom).first().copied()
    }

    /// All symbols with this name.
    #[must_use]
    pub fn find_symbols(&self, name: &str) -> Vec<SymbolId> {
        self.interner
            .get(name)
            .map(|atom| self.binder.symbols_named(atom).to_vec())
            .unwrap_or_default()
    }

    /// The symbol this name resolves to from the given context node.
    #[must_use]
    pub fn find_symbol_in_scope(&self, name: &str, context: NodeIndex) -> Option<SymbolId> {
        let atom = self.interner.get(name)?;
        self.binder.resolve_name(&self.file.arena, context, atom)
    }

    /// Symbols visible from a node, for completion.
    #[must_use]
    pub fn visible_symbols_at(&self, node: NodeIndex) -> Vec<SymbolId> {
        self.binder.visible_symbols(&self.file.arena, node)
    }

    // =========================================================================
    // Reference queries
    // =========================================================================

    /// All references to a symbol in this file.
    #[must_use]
    pub fn references_to(&self, symbol: SymbolId) -> Vec<&Reference> {
        self.refs_by_symbol
            .get(&symbol)
            .map(|indices| indices.iter().map(|&i| &self.references[i]).collect())
            .unwrap_or_default()
    }

    /// All references sharing a name, resolved or not.
    #[must_use]
    pub fn references_named(&self, name: Atom) -> Vec<&Reference> {
        self.refs_by_name
            .get(&name)
            .map(|indices| indices.iter().map(|&i| &self.references[i]).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn all_references(&self) -> &[Reference] {
        &self.references
    }

    /// Confidence of a member access node.
    #[must_use]
    pub fn member_access_confidence(&self, node: NodeIndex) -> Option<Confidence> {
        self.node_confidence.get(&node.0).copied()
    }

    // =========================================================================
    // Type queries
    // =========================================================================

    /// Inferred type of any expression node.
    #[must_use]
    pub fn type_for_node(&self, node: NodeIndex) -> Option<Ty> {
        self.node_types.get(&node.0).cloned()
    }

    /// Alias of [`type_for_node`](Self::type_for_node) for expression nodes.
    #[must_use]
    pub fn expression_type(&self, node: NodeIndex) -> Option<Ty> {
        self.type_for_node(node)
    }

    /// Flow type of a variable at a node (entry state of the node).
    #[must_use]
    pub fn flow_type(&self, variable: Atom, at: NodeIndex) -> Option<Ty> {
        self.flow_state_at(at)?.get_type(variable)
    }

    /// The narrowed type of a variable at a node, if a narrowing is active.
    #[must_use]
    pub fn narrowed_type(&self, variable: Atom, at: NodeIndex) -> Option<Ty> {
        let state = self.flow_state_at(at)?;
        let record = state.get(variable)?;
        record.is_narrowed().then(|| record.current.clone())
    }

    /// The best-known type of a variable at a node: active narrowing, then
    /// flow, then declaration, then the assignment-site union.
    #[must_use]
    pub fn effective_type(&self, variable: Atom, at: NodeIndex) -> Option<Ty> {
        if let Some(state) = self.flow_state_at(at) {
            if let Some(record) = state.get(variable) {
                return Some(record.current.clone());
            }
        }
        let symbol = self
            .binder
            .resolve_name(&self.file.arena, at, variable)?;
        if let Some(declared) = &self.binder.symbol(symbol)?.declared_ty {
            return Some(declared.clone());
        }
        self.union_types.get(&symbol).cloned()
    }

    fn flow_state_at(&self, node: NodeIndex) -> Option<&FlowState> {
        let method = self.enclosing_method(node)?;
        let flow = self.artifacts.method_flows.get(&method.0)?;
        flow.node_states.get(&node.0)
    }

    fn enclosing_method(&self, node: NodeIndex) -> Option<NodeIndex> {
        let arena = &self.file.arena;
        let mut found = None;
        let mut current = node;
        loop {
            let callable = arena.enclosing_callable(current);
            if callable.is_none() {
                break;
            }
            found = Some(callable);
            if matches!(arena.kind(callable), Some(NodeKind::MethodDecl(_))) {
                break;
            }
            current = callable;
        }
        found
    }

    /// Structural duck constraints accumulated for a variable.
    #[must_use]
    pub fn duck_type(&self, variable: SymbolId) -> Option<&ParameterConstraints> {
        self.artifacts.duck_types.get(&variable)
    }

    /// The union type of a variable (assignment-site union) or a method
    /// (return union).
    #[must_use]
    pub fn union_type(&self, symbol: SymbolId) -> Option<Ty> {
        if let Some(info) = self.binder.symbol(symbol) {
            if info.kind == SymbolKind::Method {
                return self.method_return(symbol);
            }
        }
        self.union_types.get(&symbol).cloned()
    }

    /// Container usage profile of a variable.
    #[must_use]
    pub fn container_profile(&self, variable: SymbolId) -> Option<&ContainerUsageProfile> {
        self.artifacts.container_profiles.get(&variable)
    }

    /// Inferred parameter types of a method symbol.
    #[must_use]
    pub fn infer_parameter_types(&self, method: SymbolId) -> Vec<(Atom, InferredType)> {
        let Some(symbol) = self.binder.symbol(method) else {
            return Vec::new();
        };
        self.param_types
            .get(&symbol.decl.0)
            .cloned()
            .unwrap_or_default()
    }

    /// Inferred parameter types of a lambda expression node.
    #[must_use]
    pub fn lambda_parameter_types(&self, lambda: NodeIndex) -> Vec<(Atom, InferredType)> {
        self.param_types.get(&lambda.0).cloned().unwrap_or_default()
    }

    /// The `get`/`set` accessor methods of a property symbol.
    #[must_use]
    pub fn property_accessors(&self, property: SymbolId) -> (Option<SymbolId>, Option<SymbolId>) {
        self.binder.property_accessors(property)
    }

    /// Expected versus actual type of a node, with duck constraints of the
    /// underlying variable when the node is an identifier.
    #[must_use]
    pub fn type_diff(&self, node: NodeIndex) -> TypeDiff {
        let actual = self.type_for_node(node);
        let expected = self.node_expected.get(&node.0).cloned();
        let (duck, duck_source) = match self.file.arena.kind(node) {
            Some(NodeKind::Ident { .. }) => {
                match self.symbol_for_node(node) {
                    Some(symbol) => (
                        self.artifacts.duck_types.get(&symbol).cloned(),
                        Some(symbol),
                    ),
                    None => (None, None),
                }
            }
            _ => (None, None),
        };
        TypeDiff {
            expected,
            actual,
            duck,
            duck_source,
        }
    }

    /// Recompute a method's return union with fresh project services. Used
    /// by the cycle scheduler's widening pass.
    #[must_use]
    pub fn compute_return_union(
        &self,
        method: SymbolId,
        runtime: &dyn RuntimeProvider,
        options: AnalysisOptions,
        oracle: &dyn CallSiteOracle,
    ) -> Option<Ty> {
        let decl = self.binder.symbol(method)?.decl;
        let ctx = CheckerContext::new(&self.file.arena, &self.binder, runtime, options)
            .with_oracle(oracle);
        Some(ctx.return_union(decl))
    }
}

/// Assignment-site union per untyped variable (the variable usage profile).
fn compute_union_types(
    ctx: &CheckerContext<'_>,
    binder: &BinderState,
) -> FxHashMap<SymbolId, Ty> {
    let mut builders: FxHashMap<SymbolId, UnionBuilder> = FxHashMap::default();

    for idx in ctx.arena.indices() {
        match ctx.arena.kind(idx) {
            Some(NodeKind::VarDecl(data)) if data.init.is_some() => {
                if let Some(symbol) = binder.symbol_for_decl(idx) {
                    let ty = ctx.infer(data.init);
                    builders.entry(symbol).or_default().add(ty);
                }
            }
            Some(NodeKind::AssignStmt(data)) => {
                if let Some(symbol) = ctx.symbol_for_ident(data.target) {
                    let ty = ctx.infer(data.value);
                    builders.entry(symbol).or_default().add(ty);
                }
            }
            _ => {}
        }
    }

    builders
        .into_iter()
        .map(|(symbol, builder)| (symbol, builder.build()))
        .collect()
}
