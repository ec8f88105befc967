//! Checker context: caches and shared handles for one file's analysis.
//!
//! The context owns the lazily-computed method flows, return-type unions,
//! container profiles, and duck-type constraints. All caches use interior
//! mutability so queries take `&self`; a context is confined to one analysis
//! unit and is not shared across threads.

use crate::containers::ContainerUsageProfile;
use crate::flow::FlowAnalyzer;
use crate::flow_state::FlowState;
use crate::narrowing::NarrowingMap;
use crate::params::ParameterConstraints;
use gdsem_ast::arena::AstArena;
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_binder::{BinderState, SymbolId};
use gdsem_common::interner::{Atom, ShardedInterner};
use gdsem_common::options::AnalysisOptions;
use gdsem_runtime::RuntimeProvider;
use gdsem_solver::Ty;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Identifies a method across files: (class name, method name).
pub type MethodKey = (Atom, Atom);

/// Cross-file services supplied by the project model.
///
/// Per-file analysis works without one; queries then stay file-local.
pub trait CallSiteOracle: Sync {
    /// Inferred argument types at every recorded call site of a method or
    /// named lambda.
    fn argument_types(&self, key: MethodKey) -> Vec<Vec<Ty>>;

    /// Return type of a method resolved in another file.
    fn method_return(&self, key: MethodKey) -> Option<Ty>;

    /// Record that `from`'s return type consulted `to`'s return type.
    fn record_return_dependency(&self, from: MethodKey, to: MethodKey);

    /// Forced return type for a method, set by cycle scheduling
    /// (`Variant` for cycle members on the first pass).
    fn forced_return(&self, key: MethodKey) -> Option<Ty>;

    /// Record a call site observed during reference collection.
    fn record_call_site(
        &self,
        key: MethodKey,
        source_file: &str,
        node: NodeIndex,
        argument_tys: Vec<Ty>,
        caller: Option<MethodKey>,
    );
}

/// Result of flow analysis over one method body.
#[derive(Clone, Debug, Default)]
pub struct MethodFlow {
    /// Entry flow state of every visited node.
    pub node_states: FxHashMap<u32, FlowState>,
    /// State after the last statement of the body.
    pub exit_state: FlowState,
    /// Outer flow snapshot captured at each lambda expression.
    pub lambda_captures: FxHashMap<u32, FlowState>,
    /// Narrowing applied at each conditional branch node.
    pub branch_narrowing: FxHashMap<u32, NarrowingMap>,
    /// False while the analyzer is still populating this flow; re-entrant
    /// queries observe a partially-built state instead of recursing.
    pub complete: bool,
}

/// Per-file checker state: inference engine plus caches.
pub struct CheckerContext<'a> {
    pub arena: &'a AstArena,
    pub binder: &'a BinderState,
    pub runtime: &'a dyn RuntimeProvider,
    pub interner: Arc<ShardedInterner>,
    pub options: AnalysisOptions,
    pub oracle: Option<&'a dyn CallSiteOracle>,

    pub(crate) method_flows: RefCell<FxHashMap<u32, Rc<RefCell<MethodFlow>>>>,
    pub(crate) infer_depth: Cell<u32>,
    pub(crate) infer_in_progress: RefCell<FxHashSet<u32>>,
    pub(crate) return_in_progress: RefCell<FxHashSet<u32>>,
    pub(crate) return_unions: RefCell<FxHashMap<u32, Ty>>,
    /// Stack of methods whose return union is being computed; used to record
    /// return-type dependency edges for cycle scheduling.
    pub(crate) return_stack: RefCell<Vec<MethodKey>>,
    pub(crate) container_profiles: RefCell<FxHashMap<SymbolId, Rc<ContainerUsageProfile>>>,
    pub(crate) duck_cache: RefCell<FxHashMap<SymbolId, Rc<ParameterConstraints>>>,
}

impl<'a> CheckerContext<'a> {
    #[must_use]
    pub fn new(
        arena: &'a AstArena,
        binder: &'a BinderState,
        runtime: &'a dyn RuntimeProvider,
        options: AnalysisOptions,
    ) -> Self {
        let interner = Arc::clone(&binder.interner);
        Self {
            arena,
            binder,
            runtime,
            interner,
            options,
            oracle: None,
            method_flows: RefCell::new(FxHashMap::default()),
            infer_depth: Cell::new(0),
            infer_in_progress: RefCell::new(FxHashSet::default()),
            return_in_progress: RefCell::new(FxHashSet::default()),
            return_unions: RefCell::new(FxHashMap::default()),
            return_stack: RefCell::new(Vec::new()),
            container_profiles: RefCell::new(FxHashMap::default()),
            duck_cache: RefCell::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: &'a dyn CallSiteOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// The class name of the file being analyzed.
    #[must_use]
    pub fn class_name(&self) -> Atom {
        self.binder.class_name()
    }

    /// The base class name of the file's root class.
    #[must_use]
    pub fn base_class(&self) -> Atom {
        match self.arena.kind(self.binder_root()) {
            Some(NodeKind::ClassDecl(data)) => data.base,
            _ => Atom::NONE,
        }
    }

    fn binder_root(&self) -> NodeIndex {
        self.binder
            .symbol(self.binder.root_class)
            .map_or(NodeIndex::NONE, |s| s.decl)
    }

    /// Key identifying a method of this file for cross-file services.
    #[must_use]
    pub fn method_key(&self, method_name: Atom) -> MethodKey {
        (self.class_name(), method_name)
    }

    // =========================================================================
    // Method flow cache
    // =========================================================================

    /// Flow analysis result for a method or lambda, computed on first use.
    ///
    /// The placeholder is cached *before* the analyzer runs so recursive
    /// queries entering the same method observe the partially-built state.
    #[must_use]
    pub fn method_flow(&self, method: NodeIndex) -> Rc<RefCell<MethodFlow>> {
        if let Some(found) = self.method_flows.borrow().get(&method.0) {
            return Rc::clone(found);
        }
        let flow = Rc::new(RefCell::new(MethodFlow::default()));
        self.method_flows
            .borrow_mut()
            .insert(method.0, Rc::clone(&flow));
        debug!(method = method.0, "running flow analysis");
        FlowAnalyzer::new(self, method, Rc::clone(&flow)).run();
        flow.borrow_mut().complete = true;
        flow
    }

    /// Entry flow state recorded at a node, if the node sits inside an
    /// analyzed method body.
    #[must_use]
    pub fn flow_state_at(&self, node: NodeIndex) -> Option<FlowState> {
        let callable = self.enclosing_method(node)?;
        let flow = self.method_flow(callable);
        let borrowed = flow.try_borrow().ok()?;
        borrowed.node_states.get(&node.0).cloned()
    }

    /// The outermost enclosing method of a node (lambda bodies are analyzed
    /// as part of their enclosing method).
    #[must_use]
    pub fn enclosing_method(&self, node: NodeIndex) -> Option<NodeIndex> {
        let mut found = None;
        let mut current = node;
        loop {
            let callable = self.arena.enclosing_callable(current);
            if callable.is_none() {
                break;
            }
            if matches!(self.arena.kind(callable), Some(NodeKind::MethodDecl(_))) {
                found = Some(callable);
                break;
            }
            found = Some(callable);
            current = callable;
        }
        found
    }

    /// Look up a symbol referenced by an identifier node.
    #[must_use]
    pub fn symbol_for_ident(&self, node: NodeIndex) -> Option<SymbolId> {
        let name = self.arena.ident_name(node)?;
        self.binder.resolve_name(self.arena, node, name)
    }

    /// The name a lambda is callable through: its own name, or the variable
    /// its declaration assigns it to. Anonymous, unassigned lambdas have no
    /// callable name and therefore no recorded call sites.
    #[must_use]
    pub fn lambda_callable_name(&self, lambda: NodeIndex) -> Option<Atom> {
        if let Some(NodeKind::Lambda(data)) = self.arena.kind(lambda) {
            if !data.name.is_none() {
                return Some(data.name);
            }
        }
        match self.arena.kind(self.arena.parent(lambda))? {
            NodeKind::VarDecl(decl) if decl.init == lambda => Some(decl.name),
            _ => None,
        }
    }

    /// Union of the argument types recorded at every call site of `key`,
    /// for one parameter position. `None` without an oracle or without
    /// concrete evidence at that position.
    #[must_use]
    pub fn call_site_argument_union(&self, key: MethodKey, position: usize) -> Option<Ty> {
        let oracle = self.oracle?;
        let mut builder = gdsem_solver::UnionBuilder::new();
        let mut saw_site = false;
        for site in oracle.argument_types(key) {
            if let Some(arg_ty) = site.get(position) {
                if arg_ty.is_concrete() {
                    saw_site = true;
                    builder.add(arg_ty.clone());
                }
            }
        }
        saw_site.then(|| builder.build())
    }

    /// Consume the context, extracting the accumulated analysis results so
    /// a model can retain them without keeping the borrows alive.
    #[must_use]
    pub fn into_artifacts(self) -> AnalysisArtifacts {
        let method_flows = self
            .method_flows
            .into_inner()
            .into_iter()
            .map(|(node, flow)| {
                let flow = Rc::try_unwrap(flow)
                    .map(RefCell::into_inner)
                    .unwrap_or_else(|shared| shared.borrow().clone());
                (node, flow)
            })
            .collect();
        let container_profiles = self
            .container_profiles
            .into_inner()
            .into_iter()
            .map(|(symbol, profile)| (symbol, (*profile).clone()))
            .collect();
        let duck_types = self
            .duck_cache
            .into_inner()
            .into_iter()
            .map(|(symbol, constraints)| (symbol, (*constraints).clone()))
            .collect();
        AnalysisArtifacts {
            method_flows,
            return_unions: self.return_unions.into_inner(),
            container_profiles,
            duck_types,
        }
    }
}

/// Owned analysis results extracted from a finished context.
#[derive(Debug, Default)]
pub struct AnalysisArtifacts {
    /// Method (or lambda) node to its flow analysis result.
    pub method_flows: FxHashMap<u32, MethodFlow>,
    /// Method node to its inferred return union.
    pub return_unions: FxHashMap<u32, Ty>,
    pub container_profiles: FxHashMap<SymbolId, ContainerUsageProfile>,
    pub duck_types: FxHashMap<SymbolId, ParameterConstraints>,
}
