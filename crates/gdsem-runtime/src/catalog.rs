//! In-memory runtime catalog.
//!
//! The project loader inserts types and global functions, then calls
//! `seal()` to build the reverse indices. After sealing the catalog is
//! immutable and shared read-only across analysis units.

use crate::provider::{MemberInfo, MemberKind, RuntimeProvider, TypeInfo};
use gdsem_common::interner::{Atom, ShardedInterner};
use gdsem_common::limits::MAX_BASE_CHAIN_HOPS;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::debug;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Concrete `RuntimeProvider` backed by hash maps and reverse indices.
///
/// Types keep insertion order so `all_types` enumerates deterministically
/// for a given load order.
pub struct RuntimeCatalog {
    interner: Arc<ShardedInterner>,
    types: FxIndexMap<Atom, TypeInfo>,
    globals: FxIndexMap<Atom, MemberInfo>,
    singletons: FxHashSet<Atom>,
    /// method name -> types declaring it (including inherited declarations).
    method_index: FxHashMap<Atom, Vec<Atom>>,
    /// property name -> types declaring it.
    property_index: FxHashMap<Atom, Vec<Atom>>,
}

impl RuntimeCatalog {
    #[must_use]
    pub fn new(interner: Arc<ShardedInterner>) -> Self {
        Self {
            interner,
            types: FxIndexMap::default(),
            globals: FxIndexMap::default(),
            singletons: FxHashSet::default(),
            method_index: FxHashMap::default(),
            property_index: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn interner(&self) -> &Arc<ShardedInterner> {
        &self.interner
    }

    /// Insert or replace a type.
    pub fn add_type(&mut self, info: TypeInfo) {
        self.types.insert(info.name, info);
    }

    /// Insert or replace a global function.
    pub fn add_global_function(&mut self, member: MemberInfo) {
        self.globals.insert(member.name, member);
    }

    /// Mark a type as an engine singleton.
    pub fn mark_singleton(&mut self, name: Atom) {
        self.singletons.insert(name);
    }

    /// Build the reverse indices. Call once after the last insertion.
    ///
    /// Indexing covers inherited members: a type declaring `size` indexes
    /// every subtype under `size` as well, so duck-type queries see the full
    /// set of types that *have* the member.
    pub fn seal(&mut self) {
        self.method_index.clear();
        self.property_index.clear();
        let type_names: Vec<Atom> = self.types.keys().copied().collect();
        for &type_name in &type_names {
            let mut visited = FxHashSet::default();
            let mut current = Some(type_name);
            let mut hops = 0usize;
            while let Some(name) = current {
                if !visited.insert(name) || hops >= MAX_BASE_CHAIN_HOPS {
                    break;
                }
                hops += 1;
                let Some(info) = self.types.get(&name) else {
                    break;
                };
                for member in &info.members {
                    let index = match member.kind {
                        MemberKind::Method => &mut self.method_index,
                        MemberKind::Property => &mut self.property_index,
                        MemberKind::Signal => continue,
                    };
                    let entry = index.entry(member.name).or_default();
                    if !entry.contains(&type_name) {
                        entry.push(type_name);
                    }
                }
                current = info.base;
            }
        }
        for types in self.method_index.values_mut() {
            types.sort();
        }
        for types in self.property_index.values_mut() {
            types.sort();
        }
        debug!(
            types = self.types.len(),
            methods = self.method_index.len(),
            properties = self.property_index.len(),
            "runtime catalog sealed"
        );
    }
}

impl RuntimeProvider for RuntimeCatalog {
    fn type_info(&self, name: Atom) -> Option<&TypeInfo> {
        self.types.get(&name)
    }

    fn member(&self, type_name: Atom, member_name: Atom) -> Option<&MemberInfo> {
        let mut visited = FxHashSet::default();
        let mut current = Some(type_name);
        let mut hops = 0usize;
        while let Some(name) = current {
            if !visited.insert(name) || hops >= MAX_BASE_CHAIN_HOPS {
                break;
            }
            hops += 1;
            let info = self.types.get(&name)?;
            if let Some(member) = info.own_member(member_name) {
                return Some(member);
            }
            current = info.base;
        }
        None
    }

    fn base_type(&self, name: Atom) -> Option<Atom> {
        self.types.get(&name).and_then(|info| info.base)
    }

    fn is_assignable(&self, source: Atom, target: Atom) -> bool {
        if source == target {
            return true;
        }
        let mut visited = FxHashSet::default();
        let mut current = Some(source);
        let mut hops = 0usize;
        while let Some(name) = current {
            if name == target {
                return true;
            }
            if !visited.insert(name) || hops >= MAX_BASE_CHAIN_HOPS {
                return false;
            }
            hops += 1;
            current = self.base_type(name);
        }
        false
    }

    fn is_builtin(&self, ident: Atom) -> bool {
        self.types.contains_key(&ident) || self.globals.contains_key(&ident)
    }

    fn types_with_method(&self, method_name: Atom) -> Vec<Atom> {
        self.method_index
            .get(&method_name)
            .cloned()
            .unwrap_or_default()
    }

    fn types_with_property(&self, property_name: Atom) -> Vec<Atom> {
        self.property_index
            .get(&property_name)
            .cloned()
            .unwrap_or_default()
    }

    fn all_types(&self) -> Vec<Atom> {
        self.types.keys().copied().collect()
    }

    fn global_function(&self, name: Atom) -> Option<&MemberInfo> {
        self.globals.get(&name)
    }

    fn is_singleton(&self, name: Atom) -> bool {
        self.singletons.contains(&name)
    }
}

#[cfg(test)]
#[path = "../tests/catalog_tests.rs"]
mod tests;
