//! Flow state - per-program-point variable type information.
//!
//! A `FlowState` maps variable names to their type record at one point in a
//! method body. States are value-like: every branch point clones the parent
//! and merges produce a new state. Termination (return/break/continue) marks
//! a state so branch merges can drop that path's contribution.

use gdsem_common::interner::Atom;
use gdsem_solver::union::join;
use gdsem_solver::{Ty, UnionBuilder};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Why a state stopped flowing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TerminationKind {
    Return,
    Break,
    Continue,
}

/// Type record for one variable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowType {
    /// Declared type, set at declaration; `None` for untyped variables.
    pub declared: Option<Ty>,
    /// Current type after assignments and narrowings.
    pub current: Ty,
    /// The type this variable had before the active narrowing, if narrowed.
    pub narrowed_from: Option<Ty>,
    pub is_possibly_null: bool,
}

impl FlowType {
    #[must_use]
    pub fn new(declared: Option<Ty>, initial: Ty) -> Self {
        Self {
            declared,
            current: initial,
            narrowed_from: None,
            is_possibly_null: false,
        }
    }

    /// Whether an active narrowing applies.
    #[must_use]
    pub fn is_narrowed(&self) -> bool {
        self.narrowed_from.is_some()
    }
}

/// Mapping from variable name to flow type at one program point.
#[derive(Clone, Debug, Default)]
pub struct FlowState {
    vars: FxHashMap<Atom, FlowType>,
    termination: Option<TerminationKind>,
}

impl FlowState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable. Re-declaration in the same state replaces the
    /// record (a child-scope shadow).
    pub fn declare(&mut self, name: Atom, declared: Option<Ty>, initial: Ty) {
        self.vars.insert(name, FlowType::new(declared, initial));
    }

    /// Assign a new type. Clears any active narrowing.
    pub fn assign(&mut self, name: Atom, ty: Ty) {
        match self.vars.get_mut(&name) {
            Some(record) => {
                record.current = ty;
                record.narrowed_from = None;
                record.is_possibly_null = false;
            }
            None => {
                // Assignment to a name we have not seen declared (e.g. a
                // member written from a method body).
                self.vars.insert(name, FlowType::new(None, ty));
            }
        }
    }

    /// Narrow to a more specific type, remembering the origin.
    pub fn narrow(&mut self, name: Atom, ty: Ty) {
        let record = self
            .vars
            .entry(name)
            .or_insert_with(|| FlowType::new(None, Ty::Variant));
        record.narrowed_from = Some(record.current.clone());
        if !ty.is_null() {
            record.is_possibly_null = false;
        }
        record.current = ty;
    }

    pub fn mark_possibly_null(&mut self, name: Atom) {
        if let Some(record) = self.vars.get_mut(&name) {
            record.is_possibly_null = true;
        }
    }

    pub fn mark_non_null(&mut self, name: Atom) {
        if let Some(record) = self.vars.get_mut(&name) {
            record.is_possibly_null = false;
        }
    }

    pub fn mark_terminated(&mut self, kind: TerminationKind) {
        self.termination = Some(kind);
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }

    #[must_use]
    pub fn termination(&self) -> Option<TerminationKind> {
        self.termination
    }

    /// Clear a break/continue mark so the state can flow past the loop.
    pub fn clear_termination(&mut self) {
        self.termination = None;
    }

    #[must_use]
    pub fn get(&self, name: Atom) -> Option<&FlowType> {
        self.vars.get(&name)
    }

    #[must_use]
    pub fn get_type(&self, name: Atom) -> Option<Ty> {
        self.vars.get(&name).map(|record| record.current.clone())
    }

    #[must_use]
    pub fn contains(&self, name: Atom) -> bool {
        self.vars.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = Atom> + '_ {
        self.vars.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Merge branch end states into the post-branch state.
    ///
    /// Terminated states contribute nothing. For every variable present in a
    /// live state, the result's current type is the union across live
    /// states; a narrowing survives only when every live state narrowed the
    /// variable to the same type; possibly-null is the disjunction. When all
    /// contributions are terminated the result is terminated too.
    #[must_use]
    pub fn merge_all(states: &[&FlowState]) -> FlowState {
        let live: Vec<&FlowState> = states
            .iter()
            .copied()
            .filter(|s| !s.is_terminated())
            .collect();
        if live.is_empty() {
            let mut result = states.first().map_or_else(FlowState::new, |s| (*s).clone());
            if result.termination.is_none() {
                result.termination = Some(TerminationKind::Return);
            }
            return result;
        }

        let mut names: BTreeSet<Atom> = BTreeSet::new();
        for state in &live {
            names.extend(state.vars.keys().copied());
        }

        let mut result = FlowState::new();
        for name in names {
            let records: Vec<&FlowType> =
                live.iter().filter_map(|s| s.vars.get(&name)).collect();
            let mut builder = UnionBuilder::new();
            for record in &records {
                builder.add(record.current.clone());
            }
            let current = builder.build();

            let all_narrowed_same = records.len() == live.len()
                && records.iter().all(|r| r.is_narrowed())
                && records
                    .windows(2)
                    .all(|w| w[0].current == w[1].current);
            let narrowed_from = if all_narrowed_same {
                let mut builder = UnionBuilder::new();
                for record in &records {
                    if let Some(from) = &record.narrowed_from {
                        builder.add(from.clone());
                    }
                }
                Some(builder.build())
            } else {
                None
            };

            let declared = records.iter().find_map(|r| r.declared.clone());
            result.vars.insert(
                name,
                FlowType {
                    declared,
                    current,
                    narrowed_from,
                    is_possibly_null: records.iter().any(|r| r.is_possibly_null),
                },
            );
        }
        result
    }

    /// Merge two branch states (convenience over [`merge_all`](Self::merge_all)).
    #[must_use]
    pub fn merge(a: &FlowState, b: &FlowState) -> FlowState {
        FlowState::merge_all(&[a, b])
    }

    /// Monotonic upward join used during loop fixed-point iteration.
    ///
    /// Every variable in `other` is unioned into this state. Returns true
    /// iff any variable's type set grew (or a new variable appeared).
    pub fn merge_into(&mut self, other: &FlowState) -> bool {
        let mut changed = false;
        for (&name, record) in &other.vars {
            match self.vars.get_mut(&name) {
                Some(existing) => {
                    let merged = join(existing.current.clone(), record.current.clone());
                    if merged != existing.current {
                        existing.current = merged;
                        changed = true;
                    }
                    if record.is_possibly_null && !existing.is_possibly_null {
                        existing.is_possibly_null = true;
                        changed = true;
                    }
                }
                None => {
                    self.vars.insert(name, record.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Stable summary used to detect loop stabilization: variable name to
    /// the set of member types of its current type.
    #[must_use]
    pub fn snapshot(&self) -> FxHashMap<Atom, BTreeSet<Ty>> {
        self.vars
            .iter()
            .map(|(&name, record)| {
                let types: BTreeSet<Ty> = record.current.members().iter().cloned().collect();
                (name, types)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/flow_state_tests.rs"]
mod tests;
