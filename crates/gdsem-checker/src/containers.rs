//! Container usage profiles.
//!
//! Untyped containers accumulate element and key evidence from the way they
//! are written to: `a.append(1)` observes an `Int` value slot,
//! `d["k"] = v` observes a key and a value, `d.get(k)` observes a key.
//! Profiles are built once per variable and retained read-only.

use crate::context::CheckerContext;
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_binder::{SymbolId, SymbolKind};
use gdsem_solver::{Ty, UnionBuilder};
use serde::Serialize;
use std::rc::Rc;
use tracing::trace;

/// How a container slot was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UsageKind {
    IndexAssignment,
    KeyAssignment,
    Append,
    PushBack,
    PushFront,
    Insert,
    AppendArray,
    Fill,
    DictionaryGet,
}

/// One observed write or keyed read.
#[derive(Clone, Debug, Serialize)]
pub struct Observation {
    pub ty: Ty,
    pub kind: UsageKind,
    pub source: NodeIndex,
}

/// Accumulated element/key evidence for one untyped container variable.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ContainerUsageProfile {
    /// Value-slot observations (appends, index assignments, fills).
    pub values: Vec<Observation>,
    /// Key-slot observations (key assignments, keyed gets).
    pub keys: Vec<Observation>,
    /// Sites where better evidence could be derived later (a write whose
    /// type was still unknown).
    pub derivable: Vec<NodeIndex>,
}

impl ContainerUsageProfile {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.keys.is_empty()
    }

    /// Inferred element type from value evidence. Mixed int+float collapses
    /// to float; no evidence yields `Variant`.
    #[must_use]
    pub fn value_type(&self) -> Ty {
        Self::evidence_type(&self.values)
    }

    /// Inferred key type from key evidence.
    #[must_use]
    pub fn key_type(&self) -> Ty {
        Self::evidence_type(&self.keys)
    }

    fn evidence_type(observations: &[Observation]) -> Ty {
        let mut builder = UnionBuilder::new();
        for obs in observations {
            if obs.ty.is_concrete() {
                builder.add(obs.ty.clone());
            }
        }
        if builder.is_empty() {
            return Ty::Variant;
        }
        builder.build_collapsing_numeric()
    }

    fn observe_value(&mut self, ty: Ty, kind: UsageKind, source: NodeIndex) {
        if ty.is_variant() {
            self.derivable.push(source);
        }
        self.values.push(Observation { ty, kind, source });
    }

    fn observe_key(&mut self, ty: Ty, kind: UsageKind, source: NodeIndex) {
        if ty.is_variant() {
            self.derivable.push(source);
        }
        self.keys.push(Observation { ty, kind, source });
    }
}

impl<'a> CheckerContext<'a> {
    /// The container usage profile of a variable, computed on first use by
    /// scanning the variable's declaring region for container writes.
    ///
    /// Returns `None` for symbols that cannot be untyped containers
    /// (methods, signals, explicitly typed non-container variables).
    #[must_use]
    pub fn container_profile(&self, symbol: SymbolId) -> Option<Rc<ContainerUsageProfile>> {
        if let Some(cached) = self.container_profiles.borrow().get(&symbol) {
            return Some(Rc::clone(cached));
        }
        let info = self.binder.symbol(symbol)?;
        let container_candidate = match info.kind {
            SymbolKind::Variable
            | SymbolKind::Property
            | SymbolKind::Parameter
            | SymbolKind::Constant => match &info.declared_ty {
                None => true,
                Some(Ty::Variant) => true,
                Some(Ty::Named(name)) => {
                    let resolved = self.interner.resolve(*name);
                    matches!(resolved.as_deref(), Some("Array" | "Dictionary"))
                        || resolved
                            .as_deref()
                            .is_some_and(gdsem_solver::collections::is_packed_array)
                }
                Some(_) => false,
            },
            _ => false,
        };
        if !container_candidate {
            return None;
        }

        let region = if info.scope_node.is_some() {
            info.scope_node
        } else {
            // Member variable: scan the whole class.
            self.arena.enclosing_class(info.decl)
        };

        // Cache an empty profile before scanning: inference during the scan
        // can re-enter for the same variable and must see no evidence rather
        // than recurse.
        self.container_profiles
            .borrow_mut()
            .insert(symbol, Rc::new(ContainerUsageProfile::default()));

        let mut profile = ContainerUsageProfile::default();
        self.scan_container_usage(region, symbol, &mut profile);
        trace!(
            symbol = symbol.0,
            values = profile.values.len(),
            keys = profile.keys.len(),
            "container profile built"
        );
        let profile = Rc::new(profile);
        self.container_profiles
            .borrow_mut()
            .insert(symbol, Rc::clone(&profile));
        Some(profile)
    }

    fn scan_container_usage(
        &self,
        node: NodeIndex,
        target: SymbolId,
        profile: &mut ContainerUsageProfile,
    ) {
        match self.arena.kind(node) {
            None => return,
            Some(NodeKind::Call(data)) => {
                let data = data.clone();
                if let Some(NodeKind::MemberAccess(access)) = self.arena.kind(data.callee) {
                    let access = access.clone();
                    if self.symbol_for_ident(access.receiver) == Some(target) {
                        self.observe_call(&access.member, &data.args, node, profile);
                    }
                }
            }
            Some(NodeKind::AssignStmt(data)) => {
                let data = data.clone();
                if let Some(NodeKind::IndexExpr(index)) = self.arena.kind(data.target) {
                    let index = index.clone();
                    if self.symbol_for_ident(index.receiver) == Some(target) {
                        profile.observe_value(
                            self.infer(data.value),
                            UsageKind::IndexAssignment,
                            node,
                        );
                        profile.observe_key(
                            self.infer(index.index),
                            UsageKind::KeyAssignment,
                            node,
                        );
                    }
                }
            }
            Some(_) => {}
        }
        for child in self.arena.children(node) {
            self.scan_container_usage(child, target, profile);
        }
    }

    fn observe_call(
        &self,
        member: &gdsem_common::interner::Atom,
        args: &[NodeIndex],
        source: NodeIndex,
        profile: &mut ContainerUsageProfile,
    ) {
        let Some(name) = self.interner.resolve(*member) else {
            return;
        };
        match name.as_ref() {
            "append" => self.observe_arg(args, 0, UsageKind::Append, source, profile, false),
            "push_back" => self.observe_arg(args, 0, UsageKind::PushBack, source, profile, false),
            "push_front" => {
                self.observe_arg(args, 0, UsageKind::PushFront, source, profile, false);
            }
            "insert" => self.observe_arg(args, 1, UsageKind::Insert, source, profile, false),
            "fill" => self.observe_arg(args, 0, UsageKind::Fill, source, profile, false),
            "append_array" => {
                if let Some(&arg) = args.first() {
                    let array_ty = self.infer(arg);
                    let element = gdsem_solver::collections::element_type(
                        &array_ty,
                        &self.interner,
                    );
                    profile.observe_value(element, UsageKind::AppendArray, source);
                }
            }
            "get" => self.observe_arg(args, 0, UsageKind::DictionaryGet, source, profile, true),
            _ => {}
        }
    }

    fn observe_arg(
        &self,
        args: &[NodeIndex],
        position: usize,
        kind: UsageKind,
        source: NodeIndex,
        profile: &mut ContainerUsageProfile,
        is_key: bool,
    ) {
        let Some(&arg) = args.get(position) else {
            return;
        };
        let ty = self.infer(arg);
        if is_key {
            profile.observe_key(ty, kind, source);
        } else {
            profile.observe_value(ty, kind, source);
        }
    }
}

