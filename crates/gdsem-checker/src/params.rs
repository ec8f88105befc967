//! Parameter usage analysis.
//!
//! Collects the structural fingerprint of how an untyped value is used
//! within its declaring region: methods called on it, properties read,
//! iterable/indexable usage, type-test guards, observed key types, and the
//! calls it is passed to. The resolver turns this fingerprint into ranked
//! type candidates.

use crate::context::CheckerContext;
use gdsem_ast::node::{BinaryOp, NodeIndex, NodeKind};
use gdsem_binder::SymbolId;
use gdsem_common::interner::Atom;
use gdsem_solver::Ty;
use serde::Serialize;
use std::rc::Rc;
use tracing::trace;

/// One observed call on the value: method name plus inferred argument types.
#[derive(Clone, Debug, Serialize)]
pub struct CallObservation {
    pub method: Atom,
    pub arg_tys: Vec<Ty>,
}

/// One site where the value is passed as an argument.
#[derive(Clone, Debug, Serialize)]
pub struct PassedArg {
    pub callee: Atom,
    pub position: usize,
}

/// Structural constraints accumulated for one untyped value.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ParameterConstraints {
    pub required_methods: Vec<Atom>,
    pub required_properties: Vec<Atom>,
    pub required_signals: Vec<Atom>,
    pub is_iterable: bool,
    pub is_indexable: bool,
    /// Types asserted by positive `is` guards.
    pub possible_tys: Vec<Ty>,
    /// Types rejected by negative `is` guards.
    pub excluded_tys: Vec<Ty>,
    /// Element types observed when iterating the value.
    pub element_tys: Vec<Ty>,
    /// Key types observed when indexing the value or calling `.get(key)`.
    pub key_tys: Vec<Ty>,
    /// Calls observed on the value, with argument types.
    pub call_args: Vec<CallObservation>,
    /// Calls the value is passed to, for cross-method propagation.
    pub passed_to: Vec<PassedArg>,
}

impl ParameterConstraints {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required_methods.is_empty()
            && self.required_properties.is_empty()
            && self.required_signals.is_empty()
            && !self.is_iterable
            && !self.is_indexable
            && self.possible_tys.is_empty()
            && self.excluded_tys.is_empty()
    }

    fn require_method(&mut self, name: Atom) {
        if !self.required_methods.contains(&name) {
            self.required_methods.push(name);
        }
    }

    fn require_property(&mut self, name: Atom) {
        if !self.required_properties.contains(&name) {
            self.required_properties.push(name);
        }
    }

    fn require_signal(&mut self, name: Atom) {
        if !self.required_signals.contains(&name) {
            self.required_signals.push(name);
        }
    }
}

impl<'a> CheckerContext<'a> {
    /// Structural constraints for any local value (parameter or variable),
    /// computed on first use and cached. This is the duck type of the value.
    #[must_use]
    pub fn usage_constraints(&self, symbol: SymbolId) -> Rc<ParameterConstraints> {
        if let Some(cached) = self.duck_cache.borrow().get(&symbol) {
            return Rc::clone(cached);
        }
        let mut constraints = ParameterConstraints::default();
        if let Some(info) = self.binder.symbol(symbol) {
            let region = if info.scope_node.is_some() {
                info.scope_node
            } else {
                self.arena.enclosing_class(info.decl)
            };
            self.scan_usage(region, symbol, &mut constraints);
        }
        trace!(
            symbol = symbol.0,
            methods = constraints.required_methods.len(),
            properties = constraints.required_properties.len(),
            "usage fingerprint built"
        );
        let constraints = Rc::new(constraints);
        self.duck_cache
            .borrow_mut()
            .insert(symbol, Rc::clone(&constraints));
        constraints
    }

    fn scan_usage(&self, node: NodeIndex, target: SymbolId, out: &mut ParameterConstraints) {
        match self.arena.kind(node) {
            None => return,
            Some(NodeKind::Call(data)) => {
                let data = data.clone();
                self.scan_call(&data.callee, &data.args, target, out);
            }
            Some(NodeKind::MemberAccess(data)) => {
                let data = data.clone();
                // Calls are handled at the call node; a bare member access
                // on the value is a property read.
                let parent = self.arena.parent(node);
                let is_callee = matches!(
                    self.arena.kind(parent),
                    Some(NodeKind::Call(call)) if call.callee == node
                );
                if !is_callee && self.symbol_for_ident(data.receiver) == Some(target) {
                    out.require_property(data.member);
                }
            }
            Some(NodeKind::ForStmt(data)) => {
                let data = data.clone();
                if self.symbol_for_ident(data.collection) == Some(target) {
                    out.is_iterable = true;
                    // Element evidence: type tests on the loop variable.
                    if let Some(NodeKind::IteratorDecl { name, .. }) =
                        self.arena.kind(data.iterator)
                    {
                        let iterator_name = *name;
                        for &stmt in &data.body {
                            self.collect_iterator_guards(stmt, iterator_name, out);
                        }
                    }
                }
            }
            Some(NodeKind::IndexExpr(data)) => {
                let data = data.clone();
                if self.symbol_for_ident(data.receiver) == Some(target) {
                    out.is_indexable = true;
                    let key_ty = self.infer(data.index);
                    if key_ty.is_concrete() {
                        out.key_tys.push(key_ty);
                    }
                }
            }
            Some(NodeKind::Binary(data)) => {
                let data = data.clone();
                if matches!(data.op, BinaryOp::Is | BinaryOp::IsNot)
                    && self.symbol_for_ident(data.lhs) == Some(target)
                {
                    if let Some(ty) = self.type_from_type_expr(data.rhs) {
                        if data.op == BinaryOp::Is {
                            out.possible_tys.push(ty);
                        } else {
                            out.excluded_tys.push(ty);
                        }
                    }
                }
            }
            Some(_) => {}
        }
        for child in self.arena.children(node) {
            self.scan_usage(child, target, out);
        }
    }

    /// Record `iter is T` guards inside a loop body as element-type
    /// evidence for the iterated value.
    fn collect_iterator_guards(
        &self,
        node: NodeIndex,
        iterator_name: gdsem_common::interner::Atom,
        out: &mut ParameterConstraints,
    ) {
        if let Some(NodeKind::Binary(data)) = self.arena.kind(node) {
            if data.op == BinaryOp::Is
                && self.arena.ident_name(data.lhs) == Some(iterator_name)
            {
                if let Some(ty) = self.type_from_type_expr(data.rhs) {
                    out.element_tys.push(ty);
                }
            }
        }
        for child in self.arena.children(node) {
            self.collect_iterator_guards(child, iterator_name, out);
        }
    }

    fn scan_call(
        &self,
        callee: &NodeIndex,
        args: &[NodeIndex],
        target: SymbolId,
        out: &mut ParameterConstraints,
    ) {
        // Method called on the value: target.m(...)
        if let Some(NodeKind::MemberAccess(access)) = self.arena.kind(*callee) {
            let access = access.clone();
            if self.symbol_for_ident(access.receiver) == Some(target) {
                let member_text = self.interner.resolve(access.member);
                match member_text.as_deref() {
                    // Structural guards assert the named member, not the
                    // guard itself.
                    Some("has_method") => {
                        if let Some(name) =
                            args.first().and_then(|&arg| self.string_argument(arg))
                        {
                            out.require_method(name);
                            return;
                        }
                    }
                    Some("has") => {
                        if let Some(name) =
                            args.first().and_then(|&arg| self.string_argument(arg))
                        {
                            out.require_property(name);
                            return;
                        }
                    }
                    Some("has_signal") => {
                        if let Some(name) =
                            args.first().and_then(|&arg| self.string_argument(arg))
                        {
                            out.require_signal(name);
                            return;
                        }
                    }
                    _ => {}
                }
                out.require_method(access.member);
                let arg_tys: Vec<Ty> = args.iter().map(|&arg| self.infer(arg)).collect();
                if member_text.as_deref() == Some("get") {
                    if let Some(key_ty) = arg_tys.first() {
                        if key_ty.is_concrete() {
                            out.key_tys.push(key_ty.clone());
                        }
                    }
                }
                out.call_args.push(CallObservation {
                    method: access.member,
                    arg_tys,
                });
                return;
            }
        }

        // The value passed as an argument: f(target, ...)
        if let Some(callee_name) = self.arena.ident_name(*callee) {
            for (position, &arg) in args.iter().enumerate() {
                if self.symbol_for_ident(arg) == Some(target) {
                    out.passed_to.push(PassedArg {
                        callee: callee_name,
                        position,
                    });
                }
            }
        }
    }
}
