//! Symbol storage.

use gdsem_ast::node::NodeIndex;
use gdsem_common::interner::Atom;
use gdsem_common::span::Span;
use gdsem_solver::Ty;
use serde::Serialize;

/// Unique identifier for a symbol in the symbol arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// What a symbol declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Iterator,
    MatchBinding,
    Property,
    Method,
    Signal,
    Constant,
    Enum,
    EnumValue,
    Class,
    InnerClass,
}

impl SymbolKind {
    /// Whether this symbol is a class member (as opposed to a local).
    #[must_use]
    pub const fn is_member(self) -> bool {
        matches!(
            self,
            SymbolKind::Property
                | SymbolKind::Method
                | SymbolKind::Signal
                | SymbolKind::Constant
                | SymbolKind::Enum
                | SymbolKind::EnumValue
                | SymbolKind::InnerClass
        )
    }

    /// Whether this symbol is a local binding inside a callable body.
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(
            self,
            SymbolKind::Variable
                | SymbolKind::Parameter
                | SymbolKind::Iterator
                | SymbolKind::MatchBinding
        )
    }
}

/// Parameter metadata carried by method symbols.
#[derive(Clone, Debug, Serialize)]
pub struct ParamInfo {
    pub name: Atom,
    pub declared_ty: Option<Ty>,
    pub has_default: bool,
    pub decl: NodeIndex,
}

/// A declared name: variable, member, method, signal, class, ...
#[derive(Clone, Debug, Serialize)]
pub struct Symbol {
    pub name: Atom,
    pub kind: SymbolKind,
    /// The declaration node.
    pub decl: NodeIndex,
    /// Span of the name token, for go-to-definition and rename.
    pub name_span: Span,
    /// The scope-introducing AST node this symbol belongs to (class, method,
    /// lambda, ...). Distinguishes same-named locals in different methods.
    pub scope_node: NodeIndex,
    /// Declared type annotation, when present.
    pub declared_ty: Option<Ty>,
    pub is_static: bool,
    /// Declared return type, for methods.
    pub return_ty: Option<Ty>,
    /// Parameter list, for methods and signals.
    pub params: Vec<ParamInfo>,
    /// Name of the declaring class, for members; `Atom::NONE` for locals.
    pub class_name: Atom,
    /// Accessor method names, for properties declared with `get`/`set`.
    pub getter: Atom,
    pub setter: Atom,
}

impl Symbol {
    #[must_use]
    pub fn new(name: Atom, kind: SymbolKind, decl: NodeIndex, name_span: Span) -> Self {
        Self {
            name,
            kind,
            decl,
            name_span,
            scope_node: NodeIndex::NONE,
            declared_ty: None,
            is_static: false,
            return_ty: None,
            params: Vec::new(),
            class_name: Atom::NONE,
            getter: Atom::NONE,
            setter: Atom::NONE,
        }
    }
}

/// Arena for symbol storage.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX - 1));
        self.symbols.push(symbol);
        id
    }

    #[must_use]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get_mut(id.0 as usize)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }
}
