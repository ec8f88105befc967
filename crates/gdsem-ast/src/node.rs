//! Node definitions for the script AST.
//!
//! Every node is a `(kind, parent, span)` triple stored in an `AstArena`.
//! Large kind payloads are boxed to keep the enum small.

use gdsem_common::interner::Atom;
use gdsem_common::span::Span;
use serde::Serialize;
use smallvec::SmallVec;

/// Unique identifier for a node in the AST arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

/// A node in the AST arena.
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: NodeIndex,
    pub span: Span,
}

// =============================================================================
// Literals & operators
// =============================================================================

/// A literal value appearing in source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Box<str>),
    /// A `&"name"` string-name literal.
    StrName(Box<str>),
    /// A `^"path"` node-path literal.
    NodePath(Box<str>),
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// `x is T` type test
    Is,
    /// `x is not T` negated type test
    IsNot,
    /// `x in container` membership test
    In,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// Arithmetic negation `-x`
    Neg,
    /// Boolean negation `not x` / `!x`
    Not,
    /// Bitwise complement `~x`
    BitNot,
}

/// Assignment operators. Compound forms read the target before writing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

// =============================================================================
// Kind payloads
// =============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct ClassDeclData {
    /// Class name; `Atom::NONE` for an anonymous file-level class.
    pub name: Atom,
    pub name_span: Span,
    /// Base type name (`extends`); `Atom::NONE` when absent.
    pub base: Atom,
    pub members: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MethodDeclData {
    pub name: Atom,
    pub name_span: Span,
    pub params: Vec<NodeIndex>,
    /// Declared return type annotation; `NodeIndex::NONE` when untyped.
    pub return_ty: NodeIndex,
    pub body: Vec<NodeIndex>,
    pub is_static: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ParamDeclData {
    pub name: Atom,
    pub name_span: Span,
    /// Type annotation; `NodeIndex::NONE` when untyped.
    pub ty: NodeIndex,
    /// Default value expression; `NodeIndex::NONE` when absent.
    pub default: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct VarDeclData {
    pub name: Atom,
    pub name_span: Span,
    pub ty: NodeIndex,
    pub init: NodeIndex,
    pub is_const: bool,
    /// Property accessor method names, when declared with `get`/`set`.
    pub getter: Atom,
    pub setter: Atom,
}

#[derive(Clone, Debug, Serialize)]
pub struct SignalDeclData {
    pub name: Atom,
    pub name_span: Span,
    pub params: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EnumDeclData {
    /// `Atom::NONE` for anonymous enums.
    pub name: Atom,
    pub name_span: Span,
    pub values: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EnumValueData {
    pub name: Atom,
    pub name_span: Span,
    /// Explicit value expression; `NodeIndex::NONE` when implicit.
    pub value: NodeIndex,
}

/// A type annotation such as `Int`, `Node`, or `Array[Int]`.
#[derive(Clone, Debug, Serialize)]
pub struct TypeRefData {
    pub name: Atom,
    pub args: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct IfStmtData {
    /// `ConditionalBranch` nodes, in source order (if, then each elif).
    pub branches: Vec<NodeIndex>,
    /// `ElseBranch` node; `NodeIndex::NONE` when absent.
    pub else_branch: NodeIndex,
}

/// One `if`/`elif` arm. Narrowing context is attached per branch node.
#[derive(Clone, Debug, Serialize)]
pub struct ConditionalBranchData {
    pub condition: NodeIndex,
    pub body: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ElseBranchData {
    pub body: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WhileStmtData {
    pub condition: NodeIndex,
    pub body: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ForStmtData {
    /// `IteratorDecl` node introducing the loop variable.
    pub iterator: NodeIndex,
    pub collection: NodeIndex,
    pub body: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchStmtData {
    pub subject: NodeIndex,
    /// `MatchCase` nodes.
    pub cases: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchCaseData {
    /// Patterns: literal expressions, `BindingPattern`, or `WildcardPattern`.
    pub patterns: Vec<NodeIndex>,
    pub body: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AssignStmtData {
    pub target: NodeIndex,
    pub value: NodeIndex,
    pub op: AssignOp,
}

#[derive(Clone, Debug, Serialize)]
pub struct BinaryExprData {
    pub op: BinaryOp,
    pub lhs: NodeIndex,
    pub rhs: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct UnaryExprData {
    pub op: UnaryOp,
    pub operand: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct CallExprData {
    /// Callee: an `Ident` (free call) or `MemberAccess` (method call).
    pub callee: NodeIndex,
    pub args: Vec<NodeIndex>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MemberAccessData {
    pub receiver: NodeIndex,
    pub member: Atom,
    pub member_span: Span,
}

#[derive(Clone, Debug, Serialize)]
pub struct IndexExprData {
    pub receiver: NodeIndex,
    pub index: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct TernaryExprData {
    /// Value when the condition holds (`a if cond else b` reads value-first).
    pub then_value: NodeIndex,
    pub condition: NodeIndex,
    pub else_value: NodeIndex,
}

#[derive(Clone, Debug, Serialize)]
pub struct LambdaExprData {
    /// Optional name; `Atom::NONE` for anonymous lambdas.
    pub name: Atom,
    pub params: Vec<NodeIndex>,
    pub body: Vec<NodeIndex>,
}

// =============================================================================
// NodeKind
// =============================================================================

/// The closed sum of node shapes.
#[derive(Clone, Debug, Serialize)]
pub enum NodeKind {
    // Declarations
    ClassDecl(Box<ClassDeclData>),
    MethodDecl(Box<MethodDeclData>),
    ParamDecl(Box<ParamDeclData>),
    VarDecl(Box<VarDeclData>),
    SignalDecl(Box<SignalDeclData>),
    EnumDecl(Box<EnumDeclData>),
    EnumValue(Box<EnumValueData>),
    /// For-loop iteration variable declaration.
    IteratorDecl { name: Atom, name_span: Span },
    TypeRef(Box<TypeRefData>),

    // Statements
    IfStmt(Box<IfStmtData>),
    ConditionalBranch(Box<ConditionalBranchData>),
    ElseBranch(Box<ElseBranchData>),
    WhileStmt(Box<WhileStmtData>),
    ForStmt(Box<ForStmtData>),
    MatchStmt(Box<MatchStmtData>),
    MatchCase(Box<MatchCaseData>),
    ReturnStmt { value: NodeIndex },
    BreakStmt,
    ContinueStmt,
    PassStmt,
    AssignStmt(Box<AssignStmtData>),
    ExprStmt { expr: NodeIndex },

    // Patterns
    BindingPattern { name: Atom, name_span: Span },
    WildcardPattern,

    // Expressions
    Ident { name: Atom },
    SelfExpr,
    Literal(LiteralValue),
    Binary(Box<BinaryExprData>),
    Unary(Box<UnaryExprData>),
    Call(Box<CallExprData>),
    MemberAccess(Box<MemberAccessData>),
    IndexExpr(Box<IndexExprData>),
    ArrayLit { elements: Vec<NodeIndex> },
    DictLit { entries: Vec<(NodeIndex, NodeIndex)> },
    Ternary(Box<TernaryExprData>),
    Lambda(Box<LambdaExprData>),
}

impl NodeKind {
    /// Collect the direct child node indices of this kind, in source order.
    pub fn collect_children(&self, out: &mut SmallVec<[NodeIndex; 8]>) {
        fn push(out: &mut SmallVec<[NodeIndex; 8]>, idx: NodeIndex) {
            if idx.is_some() {
                out.push(idx);
            }
        }
        match self {
            NodeKind::ClassDecl(data) => out.extend(data.members.iter().copied()),
            NodeKind::MethodDecl(data) => {
                out.extend(data.params.iter().copied());
                push(out, data.return_ty);
                out.extend(data.body.iter().copied());
            }
            NodeKind::ParamDecl(data) => {
                push(out, data.ty);
                push(out, data.default);
            }
            NodeKind::VarDecl(data) => {
                push(out, data.ty);
                push(out, data.init);
            }
            NodeKind::SignalDecl(data) => out.extend(data.params.iter().copied()),
            NodeKind::EnumDecl(data) => out.extend(data.values.iter().copied()),
            NodeKind::EnumValue(data) => push(out, data.value),
            NodeKind::IteratorDecl { .. } => {}
            NodeKind::TypeRef(data) => out.extend(data.args.iter().copied()),
            NodeKind::IfStmt(data) => {
                out.extend(data.branches.iter().copied());
                push(out, data.else_branch);
            }
            NodeKind::ConditionalBranch(data) => {
                push(out, data.condition);
                out.extend(data.body.iter().copied());
            }
            NodeKind::ElseBranch(data) => out.extend(data.body.iter().copied()),
            NodeKind::WhileStmt(data) => {
                push(out, data.condition);
                out.extend(data.body.iter().copied());
            }
            NodeKind::ForStmt(data) => {
                push(out, data.iterator);
                push(out, data.collection);
                out.extend(data.body.iter().copied());
            }
            NodeKind::MatchStmt(data) => {
                push(out, data.subject);
                out.extend(data.cases.iter().copied());
            }
            NodeKind::MatchCase(data) => {
                out.extend(data.patterns.iter().copied());
                out.extend(data.body.iter().copied());
            }
            NodeKind::ReturnStmt { value } => push(out, *value),
            NodeKind::BreakStmt
            | NodeKind::ContinueStmt
            | NodeKind::PassStmt
            | NodeKind::BindingPattern { .. }
            | NodeKind::WildcardPattern
            | NodeKind::Ident { .. }
            | NodeKind::SelfExpr
            | NodeKind::Literal(_) => {}
            NodeKind::AssignStmt(data) => {
                push(out, data.target);
                push(out, data.value);
            }
            NodeKind::ExprStmt { expr } => push(out, *expr),
            NodeKind::Binary(data) => {
                push(out, data.lhs);
                push(out, data.rhs);
            }
            NodeKind::Unary(data) => push(out, data.operand),
            NodeKind::Call(data) => {
                push(out, data.callee);
                out.extend(data.args.iter().copied());
            }
            NodeKind::MemberAccess(data) => push(out, data.receiver),
            NodeKind::IndexExpr(data) => {
                push(out, data.receiver);
                push(out, data.index);
            }
            NodeKind::ArrayLit { elements } => out.extend(elements.iter().copied()),
            NodeKind::DictLit { entries } => {
                for &(key, value) in entries {
                    out.push(key);
                    out.push(value);
                }
            }
            NodeKind::Ternary(data) => {
                push(out, data.then_value);
                push(out, data.condition);
                push(out, data.else_value);
            }
            NodeKind::Lambda(data) => {
                out.extend(data.params.iter().copied());
                out.extend(data.body.iter().copied());
            }
        }
    }

    /// Whether this kind is an expression shape.
    #[must_use]
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Ident { .. }
                | NodeKind::SelfExpr
                | NodeKind::Literal(_)
                | NodeKind::Binary(_)
                | NodeKind::Unary(_)
                | NodeKind::Call(_)
                | NodeKind::MemberAccess(_)
                | NodeKind::IndexExpr(_)
                | NodeKind::ArrayLit { .. }
                | NodeKind::DictLit { .. }
                | NodeKind::Ternary(_)
                | NodeKind::Lambda(_)
        )
    }

    /// Whether this kind introduces a local declaration scope (method or
    /// lambda body).
    #[must_use]
    pub fn is_callable_decl(&self) -> bool {
        matches!(self, NodeKind::MethodDecl(_) | NodeKind::Lambda(_))
    }
}
