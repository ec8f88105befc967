//! Project-wide call-site registry.
//!
//! Maps `(class, method)` to recorded call sites and, symmetrically, caller
//! methods to their callees. Writes are synchronized per key through the
//! concurrent map; each file merges its sites once per (re)analysis, and
//! reads happen freely afterwards.
//!
//! The registry also implements the checker's `CallSiteOracle`: cross-file
//! return types, recorded return-type dependency edges, and the forced
//! `Variant` fallback the cycle scheduler installs for cycle members.

use dashmap::DashMap;
use gdsem_ast::node::NodeIndex;
use gdsem_checker::{CallSiteOracle, MethodKey};
use gdsem_solver::Ty;
use rustc_hash::FxHashSet;

/// One recorded call of a method.
#[derive(Clone, Debug)]
pub struct CallSite {
    /// Path of the file containing the call.
    pub source_file: String,
    pub node: NodeIndex,
    pub argument_tys: Vec<Ty>,
}

/// Concurrent project-wide registry.
#[derive(Debug, Default)]
pub struct CallSiteRegistry {
    call_sites: DashMap<MethodKey, Vec<CallSite>>,
    callees: DashMap<MethodKey, Vec<MethodKey>>,
    /// Return-type dependency edges recorded during inference.
    dependencies: DashMap<MethodKey, FxHashSet<MethodKey>>,
    /// Return types of already-analyzed methods, for cross-file calls.
    method_returns: DashMap<MethodKey, Ty>,
    /// Cycle-scheduling overrides.
    forced_returns: DashMap<MethodKey, Ty>,
}

impl CallSiteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_call_site(
        &self,
        key: MethodKey,
        site: CallSite,
        caller: Option<MethodKey>,
    ) {
        self.call_sites.entry(key).or_default().push(site);
        if let Some(caller) = caller {
            let mut callees = self.callees.entry(caller).or_default();
            if !callees.contains(&key) {
                callees.push(key);
            }
        }
    }

    /// All recorded call sites of a method.
    #[must_use]
    pub fn call_sites(&self, key: MethodKey) -> Vec<CallSite> {
        self.call_sites
            .get(&key)
            .map(|sites| sites.clone())
            .unwrap_or_default()
    }

    /// Methods a caller invokes.
    #[must_use]
    pub fn callees_of(&self, caller: MethodKey) -> Vec<MethodKey> {
        self.callees
            .get(&caller)
            .map(|callees| callees.clone())
            .unwrap_or_default()
    }

    pub fn set_method_return(&self, key: MethodKey, ty: Ty) {
        self.method_returns.insert(key, ty);
    }

    /// The currently-published return type for a key, forced override
    /// first.
    #[must_use]
    pub fn method_return_published(&self, key: MethodKey) -> Option<Ty> {
        if let Some(forced) = self.forced_returns.get(&key) {
            return Some(forced.clone());
        }
        self.method_returns.get(&key).map(|ty| ty.clone())
    }

    pub fn set_forced_return(&self, key: MethodKey, ty: Ty) {
        self.forced_returns.insert(key, ty);
    }

    pub fn clear_forced_return(&self, key: MethodKey) {
        self.forced_returns.remove(&key);
    }

    /// Every recorded dependency edge, for cycle detection.
    #[must_use]
    pub fn dependency_edges(&self) -> Vec<(MethodKey, MethodKey)> {
        let mut edges = Vec::new();
        for entry in self.dependencies.iter() {
            for &to in entry.value() {
                edges.push((*entry.key(), to));
            }
        }
        edges.sort();
        edges
    }

    /// Drop everything recorded from one file (on reparse).
    pub fn remove_file(&self, path: &str) {
        for mut entry in self.call_sites.iter_mut() {
            entry.value_mut().retain(|site| site.source_file != path);
        }
        self.call_sites.retain(|_, sites| !sites.is_empty());
    }
}

impl CallSiteOracle for CallSiteRegistry {
    fn argument_types(&self, key: MethodKey) -> Vec<Vec<Ty>> {
        self.call_sites
            .get(&key)
            .map(|sites| sites.iter().map(|s| s.argument_tys.clone()).collect())
            .unwrap_or_default()
    }

    fn method_return(&self, key: MethodKey) -> Option<Ty> {
        if let Some(forced) = self.forced_returns.get(&key) {
            return Some(forced.clone());
        }
        self.method_returns.get(&key).map(|ty| ty.clone())
    }

    fn record_return_dependency(&self, from: MethodKey, to: MethodKey) {
        self.dependencies.entry(from).or_default().insert(to);
    }

    fn forced_return(&self, key: MethodKey) -> Option<Ty> {
        self.forced_returns.get(&key).map(|ty| ty.clone())
    }

    fn record_call_site(
        &self,
        key: MethodKey,
        source_file: &str,
        node: NodeIndex,
        argument_tys: Vec<Ty>,
        caller: Option<MethodKey>,
    ) {
        self.insert_call_site(
            key,
            CallSite {
                source_file: source_file.to_string(),
                node,
                argument_tys,
            },
            caller,
        );
    }
}
