//! Semantic reference collection (pass 2).
//!
//! Walks every expression of a bound file, resolving identifiers through
//! scope, the inheritance chain, and built-in globals, and recording a
//! `Reference` for each use with a confidence level. Member accesses on
//! untyped receivers become duck references; calls through the reflection
//! surface (`call("name")`, `emit_signal("name")`, ...) produce Potential
//! references carrying the string token for rename.

use crate::refs::{Confidence, Reference};
use gdsem_ast::node::{AssignOp, LiteralValue, NodeIndex, NodeKind};
use gdsem_binder::{SymbolId, SymbolKind};
use gdsem_checker::{CheckerContext, MethodKey};
use gdsem_common::interner::Atom;
use gdsem_common::limits::MAX_CONSTANT_TRACE_HOPS;
use gdsem_common::span::Span;
use gdsem_solver::Ty;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// A call recorded for the project registry.
#[derive(Clone, Debug)]
pub struct LocalCallSite {
    /// Receiver class the call was made on.
    pub class: Atom,
    pub method: Atom,
    pub node: NodeIndex,
    pub argument_tys: Vec<Ty>,
    /// The method the call appears in, if any.
    pub caller: Option<MethodKey>,
}

/// Everything pass 2 produces for one file.
#[derive(Debug, Default)]
pub struct CollectorOutput {
    pub references: Vec<Reference>,
    /// Member-access node to its resolution confidence.
    pub node_confidence: FxHashMap<u32, Confidence>,
    /// Reference node to the script symbol it resolves to.
    pub node_symbols: FxHashMap<u32, SymbolId>,
    pub call_sites: Vec<LocalCallSite>,
}

/// The reflection-style callee allowlist: member name, string-argument
/// index, and the symbol kind the string names.
const REFLECTION_CALLEES: &[(&str, usize, SymbolKind)] = &[
    ("call", 0, SymbolKind::Method),
    ("call_deferred", 0, SymbolKind::Method),
    ("has_method", 0, SymbolKind::Method),
    ("emit_signal", 0, SymbolKind::Signal),
    ("has_signal", 0, SymbolKind::Signal),
    ("connect", 0, SymbolKind::Signal),
    ("get", 0, SymbolKind::Property),
    ("set", 0, SymbolKind::Property),
];

pub struct RefCollector<'c, 'a> {
    ctx: &'c CheckerContext<'a>,
    path: &'c str,
    visited: FxHashSet<u32>,
    out: CollectorOutput,
}

impl<'c, 'a> RefCollector<'c, 'a> {
    /// Run pass 2 over the file rooted at `root`.
    ///
    /// Call sites are published to the project oracle as they are found, so
    /// analyses later in the same build (lambda parameter inference in
    /// particular) already see this file's sites.
    #[must_use]
    pub fn collect(
        ctx: &'c CheckerContext<'a>,
        root: NodeIndex,
        path: &'c str,
    ) -> CollectorOutput {
        let mut collector = RefCollector {
            ctx,
            path,
            visited: FxHashSet::default(),
            out: CollectorOutput::default(),
        };
        collector.walk(root);
        debug!(
            references = collector.out.references.len(),
            call_sites = collector.out.call_sites.len(),
            "reference collection complete"
        );
        collector.out
    }

    fn walk(&mut self, node: NodeIndex) {
        if node.is_none() || !self.visited.insert(node.0) {
            return;
        }
        match self.ctx.arena.kind(node) {
            None => return,
            Some(NodeKind::Ident { name }) => self.collect_ident(node, *name),
            Some(NodeKind::MemberAccess(data)) => {
                let data = data.clone();
                self.collect_member_access(node, data.receiver, data.member, data.member_span);
            }
            Some(NodeKind::Call(data)) => {
                let data = data.clone();
                self.collect_call(node, data.callee, &data.args);
            }
            Some(_) => {}
        }
        for child in self.ctx.arena.children(node) {
            self.walk(child);
        }
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    fn collect_ident(&mut self, node: NodeIndex, name: Atom) {
        let (is_read, is_write) = self.read_write_flags(node);
        let scope = self.ctx.binder.find_enclosing_scope(self.ctx.arena, node);

        if let Some(symbol) = self.ctx.binder.resolve_name(self.ctx.arena, node, name) {
            let ty = self.ctx.infer(node);
            self.out.node_symbols.insert(node.0, symbol);
            self.out.references.push(Reference {
                node,
                name,
                symbol,
                scope,
                is_read,
                is_write,
                confidence: Confidence::Strict,
                caller_type: Atom::NONE,
                ty,
                token: None,
            });
            return;
        }

        // Inherited runtime member of the base chain.
        let base = self.ctx.base_class();
        if !base.is_none() {
            if let Some(member) = self.ctx.runtime.member(base, name) {
                let ty = member.ty.clone();
                self.out.references.push(Reference {
                    node,
                    name,
                    symbol: SymbolId::NONE,
                    scope,
                    is_read,
                    is_write,
                    confidence: Confidence::Strict,
                    caller_type: base,
                    ty,
                    token: None,
                });
            }
        }
        // Unknown identifiers produce no reference.
    }

    // =========================================================================
    // Member accesses
    // =========================================================================

    fn collect_member_access(
        &mut self,
        node: NodeIndex,
        receiver: NodeIndex,
        member: Atom,
        _member_span: Span,
    ) {
        let receiver_ty = self.ctx.infer(receiver);
        let confidence = self.member_confidence(&receiver_ty, member);
        self.out.node_confidence.insert(node.0, confidence);

        let caller_type = receiver_ty
            .runtime_name(&self.ctx.interner)
            .unwrap_or(Atom::NONE);
        let (is_read, is_write) = self.read_write_flags(node);
        let scope = self.ctx.binder.find_enclosing_scope(self.ctx.arena, node);
        let ty = self.ctx.infer(node);

        // Accessing a member of the file's own class resolves to a script
        // symbol.
        let symbol = if caller_type == self.ctx.class_name() {
            self.ctx.binder.class_member(member).unwrap_or(SymbolId::NONE)
        } else {
            SymbolId::NONE
        };
        if !symbol.is_none() {
            self.out.node_symbols.insert(node.0, symbol);
        }
        self.out.references.push(Reference {
            node,
            name: member,
            symbol,
            scope,
            is_read,
            is_write,
            confidence,
            caller_type,
            ty,
            token: None,
        });
    }

    /// The confidence policy.
    ///
    /// Union receivers take a deterministic, monotonic vote: a member
    /// declared on all union members is Strict, on at least half Potential,
    /// otherwise NameMatch.
    fn member_confidence(&self, receiver: &Ty, member: Atom) -> Confidence {
        match receiver {
            Ty::Union(union) => {
                let declaring = union
                    .members
                    .iter()
                    .filter(|m| self.ctx.member_exists(m, member))
                    .count();
                let total = union.members.len();
                if declaring == total {
                    Confidence::Strict
                } else if declaring * 2 >= total {
                    Confidence::Potential
                } else {
                    Confidence::NameMatch
                }
            }
            Ty::Variant | Ty::Null => {
                if self.member_known_anywhere(member) {
                    Confidence::Potential
                } else {
                    Confidence::NameMatch
                }
            }
            concrete => {
                if self.ctx.member_exists(concrete, member) {
                    Confidence::Strict
                } else if self.member_known_anywhere(member) {
                    Confidence::Potential
                } else {
                    Confidence::NameMatch
                }
            }
        }
    }

    fn member_known_anywhere(&self, member: Atom) -> bool {
        if self.ctx.binder.class_member(member).is_some() {
            return true;
        }
        !self.ctx.runtime.types_with_method(member).is_empty()
            || !self.ctx.runtime.types_with_property(member).is_empty()
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn collect_call(&mut self, node: NodeIndex, callee: NodeIndex, args: &[NodeIndex]) {
        let caller = self.enclosing_method_key(node);
        let argument_tys: Vec<Ty> = args.iter().map(|&arg| self.ctx.infer(arg)).collect();

        match self.ctx.arena.kind(callee) {
            Some(NodeKind::MemberAccess(data)) => {
                let data = data.clone();
                let receiver_ty = self.ctx.infer(data.receiver);
                if let Some(class) = receiver_ty.runtime_name(&self.ctx.interner) {
                    self.record_call_site(class, data.member, node, argument_tys.clone(), caller);
                }
                // `cb.call(args)` through a lambda-holding variable: the
                // arguments feed the lambda's parameter inference, keyed by
                // the variable name.
                let member_text = self.ctx.interner.resolve(data.member);
                if matches!(member_text.as_deref(), Some("call" | "call_deferred")) {
                    if let Some(lambda_name) = self.lambda_backed_name(data.receiver) {
                        self.record_call_site(
                            self.ctx.class_name(),
                            lambda_name,
                            node,
                            argument_tys.clone(),
                            caller,
                        );
                    }
                }
                self.collect_reflection_member(node, &receiver_ty, data.member, args);
            }
            Some(NodeKind::Ident { name }) => {
                let name = *name;
                // A free call to a local or inherited method is a call on
                // the file's own class; a call through a lambda-holding
                // variable is a call site of that lambda.
                if let Some(symbol) =
                    self.ctx.binder.resolve_name(self.ctx.arena, callee, name)
                {
                    let is_method = self
                        .ctx
                        .binder
                        .symbol(symbol)
                        .is_some_and(|s| s.kind == SymbolKind::Method);
                    if is_method || self.lambda_backed_name(callee).is_some() {
                        self.record_call_site(
                            self.ctx.class_name(),
                            name,
                            node,
                            argument_tys.clone(),
                            caller,
                        );
                    }
                }
                // Callable(obj, "name") binds a method by string.
                if self
                    .ctx
                    .interner
                    .resolve(name)
                    .is_some_and(|text| text.as_ref() == "Callable")
                {
                    if let Some(&arg) = args.get(1) {
                        self.collect_string_reference(arg, SymbolKind::Method);
                    }
                }
            }
            _ => {}
        }
    }

    fn record_call_site(
        &mut self,
        class: Atom,
        method: Atom,
        node: NodeIndex,
        argument_tys: Vec<Ty>,
        caller: Option<MethodKey>,
    ) {
        if let Some(oracle) = self.ctx.oracle {
            oracle.record_call_site((class, method), self.path, node, argument_tys.clone(), caller);
        }
        self.out.call_sites.push(LocalCallSite {
            class,
            method,
            node,
            argument_tys,
            caller,
        });
    }

    /// The name of a variable whose declaration initializer is a lambda, if
    /// `node` is a reference to one.
    fn lambda_backed_name(&self, node: NodeIndex) -> Option<Atom> {
        let name = self.ctx.arena.ident_name(node)?;
        let symbol = self.ctx.binder.resolve_name(self.ctx.arena, node, name)?;
        let info = self.ctx.binder.symbol(symbol)?;
        match self.ctx.arena.kind(info.decl)? {
            NodeKind::VarDecl(data)
                if matches!(self.ctx.arena.kind(data.init), Some(NodeKind::Lambda(_))) =>
            {
                Some(name)
            }
            _ => None,
        }
    }

    fn enclosing_method_key(&self, node: NodeIndex) -> Option<MethodKey> {
        let method = self.ctx.enclosing_method(node)?;
        match self.ctx.arena.kind(method) {
            Some(NodeKind::MethodDecl(data)) => Some(self.ctx.method_key(data.name)),
            _ => None,
        }
    }

    // =========================================================================
    // Reflection-style string references
    // =========================================================================

    fn collect_reflection_member(
        &mut self,
        _call: NodeIndex,
        receiver_ty: &Ty,
        member: Atom,
        args: &[NodeIndex],
    ) {
        let Some(member_text) = self.ctx.interner.resolve(member) else {
            return;
        };
        for &(callee, index, kind) in REFLECTION_CALLEES {
            if member_text.as_ref() == callee {
                if let Some(&arg) = args.get(index) {
                    self.collect_string_reference(arg, kind);
                }
                return;
            }
        }

        // Any runtime member signature declaring a StringName parameter
        // treats a literal argument at that position as a member name.
        let Some(type_name) = receiver_ty.runtime_name(&self.ctx.interner) else {
            return;
        };
        let Some(info) = self.ctx.runtime.member(type_name, member) else {
            return;
        };
        let string_name_positions: Vec<usize> = info
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.ty == Ty::STRING_NAME)
            .map(|(i, _)| i)
            .collect();
        for position in string_name_positions {
            if let Some(&arg) = args.get(position) {
                self.collect_string_reference_any_kind(arg);
            }
        }
    }

    /// Record a Potential reference to the class symbol named by a string
    /// argument of the given kind.
    fn collect_string_reference(&mut self, arg: NodeIndex, kind: SymbolKind) {
        let Some((name, token)) = self.trace_string(arg, 0) else {
            return;
        };
        let Some(symbol) = self.ctx.binder.class_member(name) else {
            return;
        };
        if self.ctx.binder.symbol(symbol).map(|s| s.kind) != Some(kind) {
            return;
        }
        self.push_string_reference(arg, name, symbol, token);
    }

    /// Like [`collect_string_reference`](Self::collect_string_reference) but
    /// accepting whichever member kind the name resolves to.
    fn collect_string_reference_any_kind(&mut self, arg: NodeIndex) {
        let Some((name, token)) = self.trace_string(arg, 0) else {
            return;
        };
        let Some(symbol) = self.ctx.binder.class_member(name) else {
            return;
        };
        if !self
            .ctx
            .binder
            .symbol(symbol)
            .is_some_and(|s| s.kind.is_member())
        {
            return;
        }
        self.push_string_reference(arg, name, symbol, token);
    }

    fn push_string_reference(
        &mut self,
        arg: NodeIndex,
        name: Atom,
        symbol: SymbolId,
        token: Span,
    ) {
        let scope = self.ctx.binder.find_enclosing_scope(self.ctx.arena, arg);
        self.out.node_symbols.entry(arg.0).or_insert(symbol);
        self.out.references.push(Reference {
            node: arg,
            name,
            symbol,
            scope,
            is_read: true,
            is_write: false,
            confidence: Confidence::Potential,
            caller_type: self.ctx.class_name(),
            ty: Ty::Variant,
            token: Some(token),
        });
    }

    /// Extract a string name from a literal, or trace a constant through
    /// class-local assignments to its literal.
    fn trace_string(&self, arg: NodeIndex, hops: usize) -> Option<(Atom, Span)> {
        if hops >= MAX_CONSTANT_TRACE_HOPS {
            return None;
        }
        match self.ctx.arena.kind(arg)? {
            NodeKind::Literal(LiteralValue::Str(text))
            | NodeKind::Literal(LiteralValue::StrName(text)) => {
                let atom = self.ctx.interner.intern(text);
                Some((atom, self.ctx.arena.span(arg)))
            }
            NodeKind::Ident { name } => {
                let symbol = self.ctx.binder.resolve_name(self.ctx.arena, arg, *name)?;
                let info = self.ctx.binder.symbol(symbol)?;
                if !matches!(info.kind, SymbolKind::Constant | SymbolKind::Variable) {
                    return None;
                }
                match self.ctx.arena.kind(info.decl)? {
                    NodeKind::VarDecl(data) if data.init.is_some() => {
                        self.trace_string(data.init, hops + 1)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    // =========================================================================
    // Read/write flags
    // =========================================================================

    fn read_write_flags(&self, node: NodeIndex) -> (bool, bool) {
        let parent = self.ctx.arena.parent(node);
        if let Some(NodeKind::AssignStmt(data)) = self.ctx.arena.kind(parent) {
            if data.target == node {
                // Compound assignments read the previous value too.
                let reads = data.op != AssignOp::Assign;
                return (reads, true);
            }
        }
        (true, false)
    }
}
