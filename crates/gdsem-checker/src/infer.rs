//! Expression type inference.
//!
//! `infer` is a recursive descent over the expression sum, with two
//! termination guards: an in-progress node set (breaks reference cycles
//! through initializers and returns) and a depth bound. Both bail out with
//! `Variant`, never an error.
//!
//! Identifier types inside method bodies come from the flow state recorded
//! at the node; everything else resolves through the symbol table, the
//! inheritance chain, and the runtime provider.

use crate::context::CheckerContext;
use crate::MethodKey;
use crate::flow_state::FlowState;
use crate::narrowing::ty_of_literal;
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_binder::{SymbolId, SymbolKind};
use gdsem_common::interner::Atom;
use gdsem_runtime::MemberKind;
use gdsem_solver::collections::element_type;
use gdsem_solver::operators::{binary_result, unary_result};
use gdsem_solver::{Ty, UnionBuilder};
use tracing::trace;

impl<'a> CheckerContext<'a> {
    /// Infer the type of an expression node.
    #[must_use]
    pub fn infer(&self, node: NodeIndex) -> Ty {
        self.infer_with_flow(node, None)
    }

    /// Infer with an explicit flow state (used by the flow analyzer while it
    /// walks). Without one, the flow state recorded at the node is used.
    #[must_use]
    pub fn infer_with_flow(&self, node: NodeIndex, flow: Option<&FlowState>) -> Ty {
        if node.is_none() {
            return Ty::Variant;
        }
        if self.infer_depth.get() >= self.options.max_infer_depth {
            return Ty::Variant;
        }
        if !self.infer_in_progress.borrow_mut().insert(node.0) {
            return Ty::Variant;
        }
        self.infer_depth.set(self.infer_depth.get() + 1);
        let result = self.infer_inner(node, flow);
        self.infer_depth.set(self.infer_depth.get() - 1);
        self.infer_in_progress.borrow_mut().remove(&node.0);
        trace!(node = node.0, "inferred expression type");
        result
    }

    fn infer_inner(&self, node: NodeIndex, flow: Option<&FlowState>) -> Ty {
        let Some(kind) = self.arena.kind(node) else {
            return Ty::Variant;
        };
        match kind {
            NodeKind::Literal(value) => ty_of_literal(value),

            NodeKind::Ident { name } => self.infer_ident(node, *name, flow),

            NodeKind::SelfExpr => self.self_type(),

            NodeKind::Binary(data) => {
                let lhs = self.infer_with_flow(data.lhs, flow);
                let rhs = self.infer_with_flow(data.rhs, flow);
                binary_result(data.op, &lhs, &rhs, &self.interner)
            }

            NodeKind::Unary(data) => {
                let operand = self.infer_with_flow(data.operand, flow);
                unary_result(data.op, &operand)
            }

            NodeKind::MemberAccess(data) => {
                let receiver = self.infer_with_flow(data.receiver, flow);
                self.member_type(&receiver, data.member)
            }

            NodeKind::Call(data) => self.infer_call(data.callee, flow),

            NodeKind::IndexExpr(data) => {
                let receiver = self.infer_with_flow(data.receiver, flow);
                let element = element_type(&receiver, &self.interner);
                if element.is_variant() {
                    // Untyped container: fall back to accumulated usage
                    // evidence.
                    if let Some(symbol) = self.symbol_for_ident(data.receiver) {
                        if let Some(profile) = self.container_profile(symbol) {
                            let evidence = profile.value_type();
                            if evidence.is_concrete() {
                                return evidence;
                            }
                        }
                    }
                }
                element
            }

            NodeKind::ArrayLit { .. } => Ty::Named(self.interner.intern("Array")),

            NodeKind::DictLit { .. } => Ty::Named(self.interner.intern("Dictionary")),

            NodeKind::Ternary(data) => {
                let mut builder = UnionBuilder::new();
                builder.add(self.infer_with_flow(data.then_value, flow));
                builder.add(self.infer_with_flow(data.else_value, flow));
                builder.build()
            }

            NodeKind::Lambda(_) => Ty::Named(self.interner.intern("Callable")),

            _ => Ty::Variant,
        }
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    fn infer_ident(&self, node: NodeIndex, name: Atom, flow: Option<&FlowState>) -> Ty {
        // Flow state first: inside a method body the per-node entry state
        // carries assignments and narrowings.
        if let Some(state) = flow {
            if let Some(record) = state.get(name) {
                return record.current.clone();
            }
        } else if let Some(state) = self.flow_state_at(node) {
            if let Some(record) = state.get(name) {
                return record.current.clone();
            }
        }

        if let Some(symbol) = self.binder.resolve_name(self.arena, node, name) {
            return self.symbol_type(symbol);
        }

        // Inherited member of the base chain.
        let base = self.base_class();
        if !base.is_none() {
            if let Some(member) = self.runtime.member(base, name) {
                return member.ty.clone();
            }
        }

        // Built-in type or global function name.
        if self.runtime.type_info(name).is_some() {
            return Ty::Named(name);
        }
        if self.runtime.global_function(name).is_some() {
            return Ty::Named(self.interner.intern("Callable"));
        }
        Ty::Variant
    }

    /// Type of the file's `self`.
    #[must_use]
    pub fn self_type(&self) -> Ty {
        let class = self.class_name();
        if !class.is_none() {
            return Ty::Named(class);
        }
        let base = self.base_class();
        if !base.is_none() {
            return Ty::Named(base);
        }
        Ty::Variant
    }

    /// Declared or inferred type of a symbol outside any flow context.
    #[must_use]
    pub fn symbol_type(&self, id: SymbolId) -> Ty {
        let Some(symbol) = self.binder.symbol(id) else {
            return Ty::Variant;
        };
        match symbol.kind {
            SymbolKind::Method => Ty::Named(self.interner.intern("Callable")),
            SymbolKind::Signal => Ty::Named(self.interner.intern("Signal")),
            SymbolKind::Class | SymbolKind::InnerClass => Ty::Named(symbol.name),
            SymbolKind::Enum => Ty::Named(self.interner.intern("Dictionary")),
            SymbolKind::EnumValue => Ty::INT,
            SymbolKind::Iterator => self.iterator_type(symbol.decl),
            _ => {
                if let Some(declared) = &symbol.declared_ty {
                    return declared.clone();
                }
                // Untyped variable or property: the initializer's type.
                if let Some(NodeKind::VarDecl(data)) = self.arena.kind(symbol.decl) {
                    if data.init.is_some() {
                        return self.infer(data.init);
                    }
                }
                Ty::Variant
            }
        }
    }

    /// Element type for a for-loop iterator declaration, honoring container
    /// profile evidence before the engine's table.
    fn iterator_type(&self, iterator_decl: NodeIndex) -> Ty {
        let for_stmt = self.arena.parent(iterator_decl);
        let Some(NodeKind::ForStmt(data)) = self.arena.kind(for_stmt) else {
            return Ty::Variant;
        };
        let collection_ty = self.infer(data.collection);
        self.iteration_element(data.collection, &collection_ty)
    }

    /// The element type produced by iterating `collection` (an expression
    /// node with its inferred type). Container profiles take precedence when
    /// the engine's answer is `Variant`.
    #[must_use]
    pub fn iteration_element(&self, collection: NodeIndex, collection_ty: &Ty) -> Ty {
        let engine =
            gdsem_solver::collections::iteration_element_type(collection_ty, &self.interner);
        if !engine.is_variant() {
            return engine;
        }
        if let Some(symbol) = self.symbol_for_ident(collection) {
            if let Some(profile) = self.container_profile(symbol) {
                let evidence = profile.value_type();
                if evidence.is_concrete() {
                    return evidence;
                }
            }
        }
        Ty::Variant
    }

    // =========================================================================
    // Member access
    // =========================================================================

    /// The type of member `name` on a receiver of type `receiver`.
    ///
    /// Union receivers yield the union of the member's type across the
    /// members that declare it; a receiver with no known declaration yields
    /// `Variant`.
    #[must_use]
    pub fn member_type(&self, receiver: &Ty, name: Atom) -> Ty {
        match receiver {
            Ty::Variant | Ty::Null => Ty::Variant,
            Ty::Union(union) => {
                let mut builder = UnionBuilder::new();
                let mut found = false;
                for member in &union.members {
                    let ty = self.member_type(member, name);
                    if ty.is_concrete() || self.member_exists(member, name) {
                        found = true;
                        builder.add(ty);
                    }
                }
                if found {
                    builder.build()
                } else {
                    Ty::Variant
                }
            }
            _ => {
                // The file's own class resolves through the binder first so
                // script members shadow runtime members.
                if let Ty::Named(class) = receiver {
                    if *class == self.class_name() {
                        if let Some(id) = self.binder.class_member(name) {
                            return self.member_symbol_type(id);
                        }
                        let base = self.base_class();
                        if !base.is_none() {
                            if let Some(member) = self.runtime.member(base, name) {
                                return member.ty.clone();
                            }
                        }
                        return Ty::Variant;
                    }
                }
                let Some(type_name) = receiver.runtime_name(&self.interner) else {
                    return Ty::Variant;
                };
                match self.runtime.member(type_name, name) {
                    Some(member) => member.ty.clone(),
                    None => Ty::Variant,
                }
            }
        }
    }

    /// Whether a member with this name is declared on the given type.
    #[must_use]
    pub fn member_exists(&self, receiver: &Ty, name: Atom) -> bool {
        if let Ty::Named(class) = receiver {
            if *class == self.class_name() && self.binder.class_member(name).is_some() {
                return true;
            }
        }
        receiver
            .runtime_name(&self.interner)
            .is_some_and(|type_name| self.runtime.member(type_name, name).is_some())
    }

    fn member_symbol_type(&self, id: SymbolId) -> Ty {
        let Some(symbol) = self.binder.symbol(id) else {
            return Ty::Variant;
        };
        match symbol.kind {
            SymbolKind::Method => self.method_return_type(id),
            _ => self.symbol_type(id),
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn infer_call(&self, callee: NodeIndex, flow: Option<&FlowState>) -> Ty {
        match self.arena.kind(callee) {
            Some(NodeKind::Ident { name }) => self.infer_free_call(callee, *name),
            Some(NodeKind::MemberAccess(data)) => {
                let receiver = self.infer_with_flow(data.receiver, flow);
                self.infer_method_call(&receiver, data.member)
            }
            // Calling any other expression (a lambda value, an indexed
            // callable) yields Variant.
            _ => Ty::Variant,
        }
    }

    fn infer_free_call(&self, callee: NodeIndex, name: Atom) -> Ty {
        // Local or inherited script method.
        if let Some(symbol) = self.binder.resolve_name(self.arena, callee, name) {
            let Some(resolved) = self.binder.symbol(symbol) else {
                return Ty::Variant;
            };
            return match resolved.kind {
                SymbolKind::Method => self.method_return_type(symbol),
                // Constructing an inner class.
                SymbolKind::Class | SymbolKind::InnerClass => Ty::Named(resolved.name),
                // Calling a variable holding a callable.
                _ => Ty::Variant,
            };
        }

        // Inherited member of the runtime base chain.
        let base = self.base_class();
        if !base.is_none() {
            if let Some(member) = self.runtime.member(base, name) {
                if member.kind == MemberKind::Method {
                    return member.ty.clone();
                }
            }
        }

        // Constructor call of a runtime type: Vector2(1, 2).
        if self.runtime.type_info(name).is_some() {
            return Ty::Named(name);
        }

        // Global function.
        if let Some(global) = self.runtime.global_function(name) {
            return global.ty.clone();
        }
        Ty::Variant
    }

    fn infer_method_call(&self, receiver: &Ty, method: Atom) -> Ty {
        match receiver {
            Ty::Variant | Ty::Null => Ty::Variant,
            Ty::Union(union) => {
                let mut builder = UnionBuilder::new();
                let mut found = false;
                for member in &union.members {
                    if self.member_exists(member, method) {
                        found = true;
                        builder.add(self.infer_method_call(member, method));
                    }
                }
                if found {
                    builder.build()
                } else {
                    Ty::Variant
                }
            }
            _ => {
                if let Ty::Named(class) = receiver {
                    if *class == self.class_name() {
                        if let Some(id) = self.binder.class_member(method) {
                            if self
                                .binder
                                .symbol(id)
                                .is_some_and(|s| s.kind == SymbolKind::Method)
                            {
                                return self.method_return_type(id);
                            }
                        }
                    }
                    // Cross-file script class: ask the project model. The
                    // dependency edge is recorded whether or not the return
                    // is known yet, so the cycle detector sees both
                    // directions of a cross-file cycle.
                    if let Some(oracle) = self.oracle {
                        if self.runtime.type_info(*class).is_none() {
                            self.record_dependency((*class, method));
                            if let Some(ty) = oracle.method_return((*class, method)) {
                                return ty;
                            }
                        }
                    }
                }
                let Some(type_name) = receiver.runtime_name(&self.interner) else {
                    return Ty::Variant;
                };
                match self.runtime.member(type_name, method) {
                    Some(member) => member.ty.clone(),
                    None => Ty::Variant,
                }
            }
        }
    }

    /// Return type of a script method: the declared annotation, a forced
    /// cycle fallback, or the inferred union of its return statements.
    #[must_use]
    pub fn method_return_type(&self, method: SymbolId) -> Ty {
        let Some(symbol) = self.binder.symbol(method) else {
            return Ty::Variant;
        };
        if let Some(declared) = &symbol.return_ty {
            return declared.clone();
        }
        let key = self.method_key(symbol.name);
        self.record_dependency(key);
        if let Some(oracle) = self.oracle {
            if let Some(forced) = oracle.forced_return(key) {
                return forced;
            }
        }
        self.return_union(symbol.decl)
    }

    fn record_dependency(&self, to: MethodKey) {
        if let Some(oracle) = self.oracle {
            if let Some(&from) = self.return_stack.borrow().last() {
                if from != to {
                    oracle.record_return_dependency(from, to);
                }
            }
        }
    }

    // =========================================================================
    // Assignability & expected types
    // =========================================================================

    /// Whether a value of `source` is acceptable where `target` is expected.
    #[must_use]
    pub fn assignable(&self, source: &Ty, target: &Ty) -> bool {
        if target.is_variant() || source.is_variant() {
            return true;
        }
        if source == target {
            return true;
        }
        match (source, target) {
            (Ty::Null, _) => true,
            // Numeric widening.
            (Ty::Primitive(p), Ty::Primitive(q)) => {
                *p == *q
                    || (*p == gdsem_solver::Primitive::Int
                        && *q == gdsem_solver::Primitive::Float)
            }
            (Ty::Union(union), _) => union.members.iter().all(|m| self.assignable(m, target)),
            (_, Ty::Union(union)) => union.members.iter().any(|m| self.assignable(source, m)),
            (Ty::Generic(a), Ty::Generic(b)) => a.base == b.base,
            (Ty::Generic(a), Ty::Named(b)) => a.base == *b,
            (Ty::Named(a), Ty::Generic(b)) => *a == b.base,
            _ => {
                let (Some(src), Some(dst)) = (
                    source.runtime_name(&self.interner),
                    target.runtime_name(&self.interner),
                ) else {
                    return false;
                };
                self.runtime.is_assignable(src, dst)
            }
        }
    }

    /// Expected type flowing *into* a node from its context (reverse
    /// inference; used for completion).
    #[must_use]
    pub fn expected_type(&self, node: NodeIndex) -> Option<Ty> {
        let parent = self.arena.parent(node);
        match self.arena.kind(parent)? {
            NodeKind::VarDecl(data) if data.init == node => {
                gdsem_solver::annotation::ty_from_annotation(self.arena, data.ty, &self.interner)
            }
            NodeKind::AssignStmt(data) if data.value == node => {
                let target_ty = self.infer(data.target);
                target_ty.is_concrete().then_some(target_ty)
            }
            NodeKind::ReturnStmt { value } if *value == node => {
                let method = self.enclosing_method(node)?;
                let symbol = self.binder.symbol_for_decl(method)?;
                self.binder.symbol(symbol)?.return_ty.clone()
            }
            NodeKind::Call(data) => {
                let position = data.args.iter().position(|&arg| arg == node)?;
                self.expected_argument_type(data.callee, position)
            }
            _ => None,
        }
    }

    fn expected_argument_type(&self, callee: NodeIndex, position: usize) -> Option<Ty> {
        match self.arena.kind(callee)? {
            NodeKind::Ident { name } => {
                if let Some(symbol) = self.binder.resolve_name(self.arena, callee, *name) {
                    let resolved = self.binder.symbol(symbol)?;
                    return resolved
                        .params
                        .get(position)
                        .and_then(|p| p.declared_ty.clone());
                }
                let global = self.runtime.global_function(*name)?;
                global.params.get(position).map(|p| p.ty.clone())
            }
            NodeKind::MemberAccess(data) => {
                let receiver = self.infer(data.receiver);
                let type_name = receiver.runtime_name(&self.interner)?;
                let member = self.runtime.member(type_name, data.member)?;
                member.params.get(position).map(|p| p.ty.clone())
            }
            _ => None,
        }
    }
}

