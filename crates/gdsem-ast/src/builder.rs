//! Construction API for script ASTs.
//!
//! The external parser drives `AstBuilder` to materialize a `FileAst`;
//! children are created before their parent, and the builder wires parent
//! backrefs and spans as nodes are attached.
//!
//! When no explicit span is supplied the builder synthesizes one: leaves get
//! consecutive byte ranges and parents cover their children. Synthetic spans
//! preserve containment, which is all position queries rely on.

use crate::arena::AstArena;
use crate::node::{
    AssignOp, AssignStmtData, BinaryExprData, BinaryOp, CallExprData, ClassDeclData,
    ConditionalBranchData, ElseBranchData, EnumDeclData, EnumValueData, ForStmtData, IfStmtData,
    IndexExprData, LambdaExprData, LiteralValue, MatchCaseData, MatchStmtData, MemberAccessData,
    MethodDeclData, NodeIndex, NodeKind, ParamDeclData, SignalDeclData, TernaryExprData,
    TypeRefData, UnaryExprData, UnaryOp, VarDeclData, WhileStmtData,
};
use gdsem_common::interner::{Atom, ShardedInterner};
use gdsem_common::position::LineMap;
use gdsem_common::span::Span;
use std::sync::Arc;

/// A parsed source file: arena, root class declaration, position data, and
/// the interner its atoms belong to.
#[derive(Debug)]
pub struct FileAst {
    pub path: String,
    pub arena: AstArena,
    pub root: NodeIndex,
    pub line_map: LineMap,
    pub interner: Arc<ShardedInterner>,
}

impl FileAst {
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        arena: AstArena,
        root: NodeIndex,
        interner: Arc<ShardedInterner>,
    ) -> Self {
        Self {
            path: path.into(),
            arena,
            root,
            line_map: LineMap::build(""),
            interner,
        }
    }

    #[must_use]
    pub fn with_line_map(mut self, source: &str) -> Self {
        self.line_map = LineMap::build(source);
        self
    }
}

/// Builder over an `AstArena`.
pub struct AstBuilder {
    arena: AstArena,
    interner: Arc<ShardedInterner>,
    cursor: u32,
}

impl AstBuilder {
    #[must_use]
    pub fn new(interner: Arc<ShardedInterner>) -> Self {
        Self {
            arena: AstArena::new(),
            interner,
            cursor: 0,
        }
    }

    pub fn atom(&self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    #[must_use]
    pub fn interner(&self) -> &Arc<ShardedInterner> {
        &self.interner
    }

    /// Finish building, producing a `FileAst` rooted at `root`.
    #[must_use]
    pub fn finish(self, path: impl Into<String>, root: NodeIndex) -> FileAst {
        FileAst::new(path, self.arena, root, self.interner)
    }

    #[must_use]
    pub fn arena(&self) -> &AstArena {
        &self.arena
    }

    // =========================================================================
    // Span synthesis
    // =========================================================================

    fn alloc_span(&mut self, width: u32) -> Span {
        let width = width.max(1);
        let span = Span::from_len(self.cursor, width);
        self.cursor = self.cursor.saturating_add(width + 1);
        span
    }

    fn covering_span(&mut self, children: &[NodeIndex]) -> Span {
        let mut merged: Option<Span> = None;
        for &child in children {
            let span = self.arena.span(child);
            if span.is_dummy() {
                continue;
            }
            merged = Some(match merged {
                Some(acc) => acc.merge(span),
                None => span,
            });
        }
        merged.unwrap_or_else(|| self.alloc_span(1))
    }

    fn add_leaf(&mut self, kind: NodeKind, width: u32) -> NodeIndex {
        let span = self.alloc_span(width);
        self.arena.add(kind, span)
    }

    fn add_covering(&mut self, kind: NodeKind) -> NodeIndex {
        let mut children = smallvec::SmallVec::<[NodeIndex; 8]>::new();
        kind.collect_children(&mut children);
        let span = self.covering_span(&children);
        self.arena.add(kind, span)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn ident(&mut self, name: &str) -> NodeIndex {
        let atom = self.atom(name);
        self.add_leaf(
            NodeKind::Ident { name: atom },
            u32::try_from(name.len()).unwrap_or(1),
        )
    }

    pub fn ident_at(&mut self, name: &str, span: Span) -> NodeIndex {
        let atom = self.atom(name);
        self.arena.add(NodeKind::Ident { name: atom }, span)
    }

    pub fn self_expr(&mut self) -> NodeIndex {
        self.add_leaf(NodeKind::SelfExpr, 4)
    }

    pub fn int(&mut self, value: i64) -> NodeIndex {
        self.add_leaf(NodeKind::Literal(LiteralValue::Int(value)), 1)
    }

    pub fn float(&mut self, value: f64) -> NodeIndex {
        self.add_leaf(NodeKind::Literal(LiteralValue::Float(value)), 3)
    }

    pub fn bool_lit(&mut self, value: bool) -> NodeIndex {
        self.add_leaf(NodeKind::Literal(LiteralValue::Bool(value)), 4)
    }

    pub fn str_lit(&mut self, value: &str) -> NodeIndex {
        let width = u32::try_from(value.len() + 2).unwrap_or(2);
        self.add_leaf(NodeKind::Literal(LiteralValue::Str(value.into())), width)
    }

    pub fn str_lit_at(&mut self, value: &str, span: Span) -> NodeIndex {
        self.arena
            .add(NodeKind::Literal(LiteralValue::Str(value.into())), span)
    }

    pub fn string_name(&mut self, value: &str) -> NodeIndex {
        let width = u32::try_from(value.len() + 3).unwrap_or(3);
        self.add_leaf(NodeKind::Literal(LiteralValue::StrName(value.into())), width)
    }

    pub fn node_path(&mut self, value: &str) -> NodeIndex {
        let width = u32::try_from(value.len() + 3).unwrap_or(3);
        self.add_leaf(NodeKind::Literal(LiteralValue::NodePath(value.into())), width)
    }

    pub fn null(&mut self) -> NodeIndex {
        self.add_leaf(NodeKind::Literal(LiteralValue::Null), 4)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeIndex, rhs: NodeIndex) -> NodeIndex {
        self.add_covering(NodeKind::Binary(Box::new(BinaryExprData { op, lhs, rhs })))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeIndex) -> NodeIndex {
        self.add_covering(NodeKind::Unary(Box::new(UnaryExprData { op, operand })))
    }

    pub fn call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::Call(Box::new(CallExprData { callee, args })))
    }

    /// Convenience: `name(args...)` free call.
    pub fn call_name(&mut self, name: &str, args: Vec<NodeIndex>) -> NodeIndex {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    /// Convenience: `receiver.method(args...)` call.
    pub fn call_method(
        &mut self,
        receiver: NodeIndex,
        method: &str,
        args: Vec<NodeIndex>,
    ) -> NodeIndex {
        let callee = self.member(receiver, method);
        self.call(callee, args)
    }

    pub fn member(&mut self, receiver: NodeIndex, member: &str) -> NodeIndex {
        let atom = self.atom(member);
        let member_span = self.alloc_span(u32::try_from(member.len()).unwrap_or(1));
        let kind = NodeKind::MemberAccess(Box::new(MemberAccessData {
            receiver,
            member: atom,
            member_span,
        }));
        let span = self.arena.span(receiver).merge(member_span);
        self.arena.add(kind, span)
    }

    pub fn index(&mut self, receiver: NodeIndex, index: NodeIndex) -> NodeIndex {
        self.add_covering(NodeKind::IndexExpr(Box::new(IndexExprData {
            receiver,
            index,
        })))
    }

    pub fn array_lit(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::ArrayLit { elements })
    }

    pub fn dict_lit(&mut self, entries: Vec<(NodeIndex, NodeIndex)>) -> NodeIndex {
        self.add_covering(NodeKind::DictLit { entries })
    }

    pub fn ternary(
        &mut self,
        then_value: NodeIndex,
        condition: NodeIndex,
        else_value: NodeIndex,
    ) -> NodeIndex {
        self.add_covering(NodeKind::Ternary(Box::new(TernaryExprData {
            then_value,
            condition,
            else_value,
        })))
    }

    pub fn lambda(&mut self, params: Vec<NodeIndex>, body: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::Lambda(Box::new(LambdaExprData {
            name: Atom::NONE,
            params,
            body,
        })))
    }

    // =========================================================================
    // Types & declarations
    // =========================================================================

    pub fn type_ref(&mut self, name: &str) -> NodeIndex {
        let atom = self.atom(name);
        self.add_leaf(
            NodeKind::TypeRef(Box::new(TypeRefData {
                name: atom,
                args: Vec::new(),
            })),
            u32::try_from(name.len()).unwrap_or(1),
        )
    }

    pub fn generic_type_ref(&mut self, name: &str, args: Vec<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add_covering(NodeKind::TypeRef(Box::new(TypeRefData { name: atom, args })))
    }

    pub fn param(&mut self, name: &str) -> NodeIndex {
        self.param_full(name, NodeIndex::NONE, NodeIndex::NONE)
    }

    pub fn typed_param(&mut self, name: &str, ty: NodeIndex) -> NodeIndex {
        self.param_full(name, ty, NodeIndex::NONE)
    }

    pub fn param_full(&mut self, name: &str, ty: NodeIndex, default: NodeIndex) -> NodeIndex {
        let atom = self.atom(name);
        let name_span = self.alloc_span(u32::try_from(name.len()).unwrap_or(1));
        let kind = NodeKind::ParamDecl(Box::new(ParamDeclData {
            name: atom,
            name_span,
            ty,
            default,
        }));
        let mut children = smallvec::SmallVec::<[NodeIndex; 8]>::new();
        kind.collect_children(&mut children);
        let span = self.covering_span(&children).merge(name_span);
        self.arena.add(kind, span)
    }

    pub fn var_decl(&mut self, name: &str, ty: NodeIndex, init: NodeIndex) -> NodeIndex {
        self.var_decl_full(name, ty, init, false)
    }

    pub fn const_decl(&mut self, name: &str, init: NodeIndex) -> NodeIndex {
        self.var_decl_full(name, NodeIndex::NONE, init, true)
    }

    pub fn var_decl_full(
        &mut self,
        name: &str,
        ty: NodeIndex,
        init: NodeIndex,
        is_const: bool,
    ) -> NodeIndex {
        self.var_decl_with_accessors(name, ty, init, is_const, "", "")
    }

    /// A property declared with `get`/`set` accessor methods. Empty accessor
    /// names mean the accessor is absent.
    pub fn property_decl(
        &mut self,
        name: &str,
        ty: NodeIndex,
        init: NodeIndex,
        getter: &str,
        setter: &str,
    ) -> NodeIndex {
        self.var_decl_with_accessors(name, ty, init, false, getter, setter)
    }

    fn var_decl_with_accessors(
        &mut self,
        name: &str,
        ty: NodeIndex,
        init: NodeIndex,
        is_const: bool,
        getter: &str,
        setter: &str,
    ) -> NodeIndex {
        let atom = self.atom(name);
        let getter = if getter.is_empty() {
            Atom::NONE
        } else {
            self.atom(getter)
        };
        let setter = if setter.is_empty() {
            Atom::NONE
        } else {
            self.atom(setter)
        };
        let name_span = self.alloc_span(u32::try_from(name.len()).unwrap_or(1));
        let kind = NodeKind::VarDecl(Box::new(VarDeclData {
            name: atom,
            name_span,
            ty,
            init,
            is_const,
            getter,
            setter,
        }));
        let mut children = smallvec::SmallVec::<[NodeIndex; 8]>::new();
        kind.collect_children(&mut children);
        let span = self.covering_span(&children).merge(name_span);
        self.arena.add(kind, span)
    }

    pub fn signal_decl(&mut self, name: &str, params: Vec<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        let name_span = self.alloc_span(u32::try_from(name.len()).unwrap_or(1));
        let kind = NodeKind::SignalDecl(Box::new(SignalDeclData {
            name: atom,
            name_span,
            params,
        }));
        let mut children = smallvec::SmallVec::<[NodeIndex; 8]>::new();
        kind.collect_children(&mut children);
        let span = self.covering_span(&children).merge(name_span);
        self.arena.add(kind, span)
    }

    pub fn enum_decl(&mut self, name: &str, values: &[(&str, Option<i64>)]) -> NodeIndex {
        let mut value_nodes = Vec::with_capacity(values.len());
        for &(value_name, explicit) in values {
            let value_atom = self.atom(value_name);
            let value_span = self.alloc_span(u32::try_from(value_name.len()).unwrap_or(1));
            let value_expr = match explicit {
                Some(v) => self.int(v),
                None => NodeIndex::NONE,
            };
            value_nodes.push(self.arena.add(
                NodeKind::EnumValue(Box::new(EnumValueData {
                    name: value_atom,
                    name_span: value_span,
                    value: value_expr,
                })),
                value_span,
            ));
        }
        let atom = if name.is_empty() {
            Atom::NONE
        } else {
            self.atom(name)
        };
        let name_span = self.alloc_span(u32::try_from(name.len().max(1)).unwrap_or(1));
        let kind = NodeKind::EnumDecl(Box::new(EnumDeclData {
            name: atom,
            name_span,
            values: value_nodes,
        }));
        self.add_covering(kind)
    }

    pub fn method(&mut self, name: &str, params: Vec<NodeIndex>, body: Vec<NodeIndex>) -> NodeIndex {
        self.method_full(name, params, NodeIndex::NONE, body, false)
    }

    pub fn method_full(
        &mut self,
        name: &str,
        params: Vec<NodeIndex>,
        return_ty: NodeIndex,
        body: Vec<NodeIndex>,
        is_static: bool,
    ) -> NodeIndex {
        let atom = self.atom(name);
        let name_span = self.alloc_span(u32::try_from(name.len()).unwrap_or(1));
        let kind = NodeKind::MethodDecl(Box::new(MethodDeclData {
            name: atom,
            name_span,
            params,
            return_ty,
            body,
            is_static,
        }));
        let mut children = smallvec::SmallVec::<[NodeIndex; 8]>::new();
        kind.collect_children(&mut children);
        let span = self.covering_span(&children).merge(name_span);
        self.arena.add(kind, span)
    }

    pub fn class(&mut self, name: &str, base: &str, members: Vec<NodeIndex>) -> NodeIndex {
        let atom = if name.is_empty() {
            Atom::NONE
        } else {
            self.atom(name)
        };
        let base_atom = if base.is_empty() {
            Atom::NONE
        } else {
            self.atom(base)
        };
        let name_span = self.alloc_span(u32::try_from(name.len().max(1)).unwrap_or(1));
        let kind = NodeKind::ClassDecl(Box::new(ClassDeclData {
            name: atom,
            name_span,
            base: base_atom,
            members,
        }));
        let mut children = smallvec::SmallVec::<[NodeIndex; 8]>::new();
        kind.collect_children(&mut children);
        let span = self.covering_span(&children).merge(name_span);
        self.arena.add(kind, span)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.add_covering(NodeKind::ExprStmt { expr })
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.assign_op(AssignOp::Assign, target, value)
    }

    pub fn assign_op(&mut self, op: AssignOp, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.add_covering(NodeKind::AssignStmt(Box::new(AssignStmtData {
            target,
            value,
            op,
        })))
    }

    pub fn ret(&mut self, value: NodeIndex) -> NodeIndex {
        self.add_covering(NodeKind::ReturnStmt { value })
    }

    pub fn ret_void(&mut self) -> NodeIndex {
        self.add_leaf(NodeKind::ReturnStmt { value: NodeIndex::NONE }, 6)
    }

    pub fn brk(&mut self) -> NodeIndex {
        self.add_leaf(NodeKind::BreakStmt, 5)
    }

    pub fn cont(&mut self) -> NodeIndex {
        self.add_leaf(NodeKind::ContinueStmt, 8)
    }

    pub fn pass(&mut self) -> NodeIndex {
        self.add_leaf(NodeKind::PassStmt, 4)
    }

    pub fn branch(&mut self, condition: NodeIndex, body: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::ConditionalBranch(Box::new(ConditionalBranchData {
            condition,
            body,
        })))
    }

    pub fn else_branch(&mut self, body: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::ElseBranch(Box::new(ElseBranchData { body })))
    }

    /// `if_stmt(vec![branch, ...], else_branch_or_none)`
    pub fn if_stmt(&mut self, branches: Vec<NodeIndex>, else_branch: NodeIndex) -> NodeIndex {
        self.add_covering(NodeKind::IfStmt(Box::new(IfStmtData {
            branches,
            else_branch,
        })))
    }

    /// Convenience: a single-branch `if` with no else.
    pub fn simple_if(
        &mut self,
        condition: NodeIndex,
        body: Vec<NodeIndex>,
    ) -> NodeIndex {
        let branch = self.branch(condition, body);
        self.if_stmt(vec![branch], NodeIndex::NONE)
    }

    /// Convenience: `if cond: then_body else: else_body`.
    pub fn if_else(
        &mut self,
        condition: NodeIndex,
        then_body: Vec<NodeIndex>,
        else_body: Vec<NodeIndex>,
    ) -> NodeIndex {
        let branch = self.branch(condition, then_body);
        let else_node = self.else_branch(else_body);
        self.if_stmt(vec![branch], else_node)
    }

    pub fn while_stmt(&mut self, condition: NodeIndex, body: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::WhileStmt(Box::new(WhileStmtData {
            condition,
            body,
        })))
    }

    pub fn for_stmt(
        &mut self,
        iterator_name: &str,
        collection: NodeIndex,
        body: Vec<NodeIndex>,
    ) -> NodeIndex {
        let atom = self.atom(iterator_name);
        let name_span = self.alloc_span(u32::try_from(iterator_name.len()).unwrap_or(1));
        let iterator = self.arena.add(
            NodeKind::IteratorDecl {
                name: atom,
                name_span,
            },
            name_span,
        );
        self.add_covering(NodeKind::ForStmt(Box::new(ForStmtData {
            iterator,
            collection,
            body,
        })))
    }

    pub fn match_case(&mut self, patterns: Vec<NodeIndex>, body: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::MatchCase(Box::new(MatchCaseData {
            patterns,
            body,
        })))
    }

    pub fn match_stmt(&mut self, subject: NodeIndex, cases: Vec<NodeIndex>) -> NodeIndex {
        self.add_covering(NodeKind::MatchStmt(Box::new(MatchStmtData {
            subject,
            cases,
        })))
    }

    pub fn binding_pattern(&mut self, name: &str) -> NodeIndex {
        let atom = self.atom(name);
        let name_span = self.alloc_span(u32::try_from(name.len()).unwrap_or(1));
        self.arena.add(
            NodeKind::BindingPattern {
                name: atom,
                name_span,
            },
            name_span,
        )
    }

    pub fn wildcard_pattern(&mut self) -> NodeIndex {
        self.add_leaf(NodeKind::WildcardPattern, 1)
    }
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
