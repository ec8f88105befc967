//! String interning for identifier deduplication.
//!
//! Identifiers, member names, and type names repeat heavily across a script
//! project. Interning maps each distinct string to a small `Atom` id so that
//! symbol tables, flow states, and reverse indices can key on a `u32` instead
//! of hashing string contents.
//!
//! Two interners are provided:
//! - `Interner` - single-threaded, used while analyzing one file
//! - `ShardedInterner` - thread-safe, shared by the project model so atoms
//!   are comparable across files analyzed in parallel

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::RwLock;

/// An interned string id.
///
/// Atoms are only meaningful relative to the interner that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Atom(pub u32);

impl Atom {
    pub const NONE: Atom = Atom(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Single-threaded string interner.
#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its atom. Repeated calls with the same
    /// string return the same atom.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(u32::try_from(self.strings.len()).unwrap_or(u32::MAX - 1));
        let shared: Arc<str> = Arc::from(text);
        self.strings.push(Arc::clone(&shared));
        self.map.insert(shared, atom);
        atom
    }

    /// Resolve an atom back to its string.
    #[must_use]
    pub fn resolve(&self, atom: Atom) -> Option<&str> {
        self.strings.get(atom.0 as usize).map(|s| s.as_ref())
    }

    /// Look up an already-interned string without inserting.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Thread-safe interner shared across per-file analysis units.
///
/// Interning takes `&self`, so the project model can hand one instance to
/// rayon workers without locking discipline at call sites.
#[derive(Debug, Default)]
pub struct ShardedInterner {
    map: DashMap<Arc<str>, Atom, rustc_hash::FxBuildHasher>,
    strings: RwLock<Vec<Arc<str>>>,
}

impl ShardedInterner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its atom.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(atom) = self.map.get(text) {
            return *atom;
        }
        // Writer section: re-check under the entry lock so two racing interns
        // of the same string agree on one atom.
        let entry = self.map.entry(Arc::from(text));
        match entry {
            dashmap::mapref::entry::Entry::Occupied(occupied) => *occupied.get(),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let mut strings = self.strings.write().unwrap_or_else(|e| e.into_inner());
                let atom = Atom(u32::try_from(strings.len()).unwrap_or(u32::MAX - 1));
                strings.push(Arc::clone(vacant.key()));
                vacant.insert(atom);
                atom
            }
        }
    }

    /// Resolve an atom back to its string.
    #[must_use]
    pub fn resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let strings = self.strings.read().unwrap_or_else(|e| e.into_inner());
        strings.get(atom.0 as usize).cloned()
    }

    /// Look up an already-interned string without inserting.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.map.get(text).map(|a| *a)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
