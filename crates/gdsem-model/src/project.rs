//! Project semantic model.
//!
//! Federates per-file models, owns the call-site registry, routes
//! cross-file queries, and schedules cross-method return inference through
//! the cycle detector. Per-file construction is independent, so a batch of
//! files builds in parallel; the registry is the only shared mutable state
//! and is concurrent.

use crate::cycles::{CycleDetector, ScheduledMethod};
use crate::model::SemanticModel;
use crate::refs::Reference;
use crate::registry::{CallSite, CallSiteRegistry};
use dashmap::DashMap;
use gdsem_ast::FileAst;
use gdsem_binder::{SymbolId, SymbolKind};
use gdsem_checker::MethodKey;
use gdsem_common::interner::Atom;
use gdsem_common::limits::MAX_BASE_CHAIN_HOPS;
use gdsem_common::options::AnalysisOptions;
use gdsem_runtime::RuntimeProvider;
use gdsem_solver::Ty;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// A reference located in a specific file.
#[derive(Clone, Debug)]
pub struct ProjectReference {
    pub file: String,
    pub reference: Reference,
}

/// Composition of per-file models with cross-file services.
pub struct ProjectModel {
    runtime: Arc<dyn RuntimeProvider>,
    options: AnalysisOptions,
    files: DashMap<String, Arc<SemanticModel>>,
    /// Script class name to defining file.
    classes: DashMap<Atom, String>,
    registry: Arc<CallSiteRegistry>,
}

impl ProjectModel {
    #[must_use]
    pub fn new(runtime: Arc<dyn RuntimeProvider>, options: AnalysisOptions) -> Self {
        Self {
            runtime,
            options,
            files: DashMap::new(),
            classes: DashMap::new(),
            registry: Arc::new(CallSiteRegistry::new()),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &CallSiteRegistry {
        &self.registry
    }

    /// Analyze one file and register its results.
    ///
    /// Call sites are published to the registry by the collector during the
    /// build itself, so the file's own sites already inform its lambda
    /// parameter inference.
    pub fn add_file(&self, file: FileAst) -> Arc<SemanticModel> {
        let path = file.path.clone();
        self.registry.remove_file(&path);

        let model = Arc::new(SemanticModel::build_with_oracle(
            file,
            self.runtime.as_ref(),
            self.options,
            Some(self.registry.as_ref()),
        ));

        for method in model.binder().methods() {
            if let Some(symbol) = model.binder().symbol(method) {
                if let Some(ty) = model.method_return(method) {
                    self.registry
                        .set_method_return((model.class_name(), symbol.name), ty);
                }
            }
        }

        if !model.class_name().is_none() {
            self.classes.insert(model.class_name(), path.clone());
        }
        debug!(path = %path, "file added to project model");
        self.files.insert(path, Arc::clone(&model));
        model
    }

    /// Analyze a batch of files in parallel.
    pub fn add_files(&self, files: Vec<FileAst>) {
        files.into_par_iter().for_each(|file| {
            self.add_file(file);
        });
        info!(files = self.files.len(), "project model populated");
    }

    /// Drop a file's model (on reparse); its registry entries go with it.
    pub fn invalidate_file(&self, path: &str) {
        if let Some((_, model)) = self.files.remove(path) {
            let class = model.class_name();
            if !class.is_none() {
                self.classes.remove(&class);
            }
        }
        self.registry.remove_file(path);
    }

    #[must_use]
    pub fn semantic_model(&self, path: &str) -> Option<Arc<SemanticModel>> {
        self.files.get(path).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    // =========================================================================
    // Cross-file queries
    // =========================================================================

    /// All references to a symbol across the project: the defining file's
    /// resolved references plus name-and-receiver matches in other files.
    #[must_use]
    pub fn references_in_project(
        &self,
        defining_file: &str,
        symbol: SymbolId,
    ) -> Vec<ProjectReference> {
        let Some(model) = self.semantic_model(defining_file) else {
            return Vec::new();
        };
        let Some(info) = model.binder().symbol(symbol) else {
            return Vec::new();
        };
        let name = info.name;
        let class = model.class_name();

        let mut result: Vec<ProjectReference> = model
            .references_to(symbol)
            .into_iter()
            .map(|reference| ProjectReference {
                file: defining_file.to_string(),
                reference: reference.clone(),
            })
            .collect();

        for entry in self.files.iter() {
            if entry.key() == defining_file {
                continue;
            }
            for reference in entry.value().references_named(name) {
                if reference.caller_type == class {
                    result.push(ProjectReference {
                        file: entry.key().clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }
        result
    }

    /// Recorded call sites of a method.
    #[must_use]
    pub fn call_sites(&self, class: Atom, method: Atom) -> Vec<CallSite> {
        self.registry.call_sites((class, method))
    }

    /// Resolve a name from a file: local symbols first, then project class
    /// names, then members of other project classes.
    #[must_use]
    pub fn resolve_declaration(&self, name: &str, from_file: &str) -> Option<(String, SymbolId)> {
        if let Some(model) = self.semantic_model(from_file) {
            if let Some(symbol) = model.find_symbol(name) {
                return Some((from_file.to_string(), symbol));
            }
        }
        // A class_name declared by another file.
        for entry in self.classes.iter() {
            let Some(model) = self.semantic_model(entry.value()) else {
                continue;
            };
            let class_text = model.interner().resolve(*entry.key());
            if class_text.as_deref() == Some(name) {
                return Some((entry.value().clone(), model.binder().root_class));
            }
        }
        for entry in self.files.iter() {
            if entry.key() == from_file {
                continue;
            }
            if let Some(symbol) = entry.value().find_symbol(name) {
                if entry
                    .value()
                    .binder()
                    .symbol(symbol)
                    .is_some_and(|s| s.kind.is_member())
                {
                    return Some((entry.key().clone(), symbol));
                }
            }
        }
        None
    }

    /// Methods overriding `method` of `class` in derived script classes.
    #[must_use]
    pub fn find_implementations(&self, class: Atom, method: Atom) -> Vec<(String, SymbolId)> {
        // Snapshot first: inheritance_chain re-enters the file map, and
        // re-entrant access under an iteration guard must be avoided.
        let models: Vec<(String, Arc<SemanticModel>)> = self
            .files
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut result = Vec::new();
        for (path, model) in models {
            if model.class_name() == class {
                continue;
            }
            if !self.inheritance_chain(&path).contains(&class) {
                continue;
            }
            if let Some(symbol) = model.binder().class_member(method) {
                if model
                    .binder()
                    .symbol(symbol)
                    .is_some_and(|s| s.kind == SymbolKind::Method)
                {
                    result.push((path, symbol));
                }
            }
        }
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// Class names from a file's class up through its script and runtime
    /// bases. Cycle-safe against corrupt `extends` chains.
    #[must_use]
    pub fn inheritance_chain(&self, path: &str) -> Vec<Atom> {
        let mut chain = Vec::new();
        let Some(model) = self.semantic_model(path) else {
            return chain;
        };
        if !model.class_name().is_none() {
            chain.push(model.class_name());
        }
        let mut current_base = model.base_class();
        let mut hops = 0usize;
        while !current_base.is_none() && hops < MAX_BASE_CHAIN_HOPS {
            hops += 1;
            if chain.contains(&current_base) {
                break;
            }
            chain.push(current_base);
            // Script base first, then the runtime hierarchy.
            if let Some(base_file) = self.classes.get(&current_base) {
                let base_path = base_file.value().clone();
                drop(base_file);
                if let Some(base_model) = self.semantic_model(&base_path) {
                    current_base = base_model.base_class();
                    continue;
                }
            }
            current_base = self.runtime.base_type(current_base).unwrap_or(Atom::NONE);
        }
        chain
    }

    // =========================================================================
    // Inference scheduling
    // =========================================================================

    /// Run the cycle detector over the recorded return-type dependencies,
    /// install the `Variant` fallback for cycle members, and (optionally)
    /// widen cycle returns by iterating each cycle to a fixed point.
    pub fn schedule_inference(&self) -> Vec<ScheduledMethod> {
        let mut detector = CycleDetector::new();
        for (from, to) in self.registry.dependency_edges() {
            detector.add_dependency(from, to);
        }
        let schedule = detector.schedule();

        let cycle_members: Vec<MethodKey> = schedule
            .iter()
            .filter(|entry| entry.is_in_cycle)
            .map(|entry| entry.key)
            .collect();
        for &key in &cycle_members {
            self.registry.set_forced_return(key, Ty::Variant);
        }

        if self.options.widen_cycle_returns && !cycle_members.is_empty() {
            self.widen_cycle_returns(&cycle_members);
        }
        debug!(
            methods = schedule.len(),
            cyclic = cycle_members.len(),
            "inference schedule computed"
        );
        schedule
    }

    /// Iterate cycle members to a fixed point: recompute each return union
    /// against the current fallbacks, publish, repeat until stable or the
    /// iteration bound is hit.
    fn widen_cycle_returns(&self, members: &[MethodKey]) {
        for _ in 0..self.options.max_loop_iterations {
            let mut changed = false;
            for &(class, method) in members {
                let Some(path) = self.classes.get(&class).map(|e| e.value().clone()) else {
                    continue;
                };
                let Some(model) = self.semantic_model(&path) else {
                    continue;
                };
                let Some(symbol) = model.binder().class_member(method) else {
                    continue;
                };
                let previous = self.registry.method_return_published((class, method));
                // Compute against the other members' published returns.
                self.registry.clear_forced_return((class, method));
                let recomputed = model.compute_return_union(
                    symbol,
                    self.runtime.as_ref(),
                    self.options,
                    self.registry.as_ref(),
                );
                if let Some(ty) = recomputed {
                    if previous.as_ref() != Some(&ty) {
                        changed = true;
                    }
                    self.registry.set_forced_return((class, method), ty);
                }
            }
            if !changed {
                break;
            }
        }
    }
}
