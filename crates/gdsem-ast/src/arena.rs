//! AST arena storage and navigation.
//!
//! Nodes are appended during parsing and never removed; `NodeIndex` values
//! stay valid for the lifetime of the arena. Parent backrefs are plain
//! indices, so upward walks are bounded lookups.

use crate::node::{Node, NodeIndex, NodeKind};
use gdsem_common::interner::Atom;
use gdsem_common::limits::MAX_PARENT_HOPS;
use gdsem_common::span::Span;
use smallvec::SmallVec;

/// Arena of AST nodes for one source file.
#[derive(Debug, Default)]
pub struct AstArena {
    nodes: Vec<Node>,
}

impl AstArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, wiring the parent backref of each direct child to the
    /// new node. Children must already be in the arena.
    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        let idx = NodeIndex(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX - 1));
        let mut children: SmallVec<[NodeIndex; 8]> = SmallVec::new();
        kind.collect_children(&mut children);
        self.nodes.push(Node {
            kind,
            parent: NodeIndex::NONE,
            span,
        });
        for child in children {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = idx;
            }
        }
        idx
    }

    #[must_use]
    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    #[must_use]
    pub fn kind(&self, idx: NodeIndex) -> Option<&NodeKind> {
        self.get(idx).map(|node| &node.kind)
    }

    #[must_use]
    pub fn span(&self, idx: NodeIndex) -> Span {
        self.get(idx).map_or(Span::dummy(), |node| node.span)
    }

    #[must_use]
    pub fn parent(&self, idx: NodeIndex) -> NodeIndex {
        self.get(idx).map_or(NodeIndex::NONE, |node| node.parent)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate all node indices in creation order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len()).map(|i| NodeIndex(i as u32))
    }

    /// Direct children of a node, in source order.
    #[must_use]
    pub fn children(&self, idx: NodeIndex) -> SmallVec<[NodeIndex; 8]> {
        let mut out = SmallVec::new();
        if let Some(node) = self.get(idx) {
            node.kind.collect_children(&mut out);
        }
        out
    }

    /// Walk ancestors starting from the parent of `idx`, bounded against
    /// malformed parent cycles.
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = self.parent(idx);
        let mut hops = 0usize;
        std::iter::from_fn(move || {
            if current.is_none() || hops >= MAX_PARENT_HOPS {
                return None;
            }
            hops += 1;
            let result = current;
            current = self.parent(current);
            Some(result)
        })
    }

    /// Find the nearest ancestor (including `idx` itself) matching the
    /// predicate.
    pub fn find_ancestor_or_self(
        &self,
        idx: NodeIndex,
        mut pred: impl FnMut(&NodeKind) -> bool,
    ) -> NodeIndex {
        if self.kind(idx).is_some_and(&mut pred) {
            return idx;
        }
        for ancestor in self.ancestors(idx) {
            if self.kind(ancestor).is_some_and(&mut pred) {
                return ancestor;
            }
        }
        NodeIndex::NONE
    }

    /// The enclosing method or lambda declaration of a node, if any.
    #[must_use]
    pub fn enclosing_callable(&self, idx: NodeIndex) -> NodeIndex {
        for ancestor in self.ancestors(idx) {
            if self
                .kind(ancestor)
                .is_some_and(NodeKind::is_callable_decl)
            {
                return ancestor;
            }
        }
        NodeIndex::NONE
    }

    /// The enclosing class declaration of a node, if any.
    #[must_use]
    pub fn enclosing_class(&self, idx: NodeIndex) -> NodeIndex {
        for ancestor in self.ancestors(idx) {
            if matches!(self.kind(ancestor), Some(NodeKind::ClassDecl(_))) {
                return ancestor;
            }
        }
        NodeIndex::NONE
    }

    /// The identifier name of a node when it is an `Ident`.
    #[must_use]
    pub fn ident_name(&self, idx: NodeIndex) -> Option<Atom> {
        match self.kind(idx)? {
            NodeKind::Ident { name } => Some(*name),
            _ => None,
        }
    }

    /// Find the smallest node whose span contains the byte offset.
    ///
    /// Linear scan; per-file models layer memoized position queries on top.
    #[must_use]
    pub fn node_at_offset(&self, offset: u32) -> NodeIndex {
        let mut best = NodeIndex::NONE;
        let mut best_len = u32::MAX;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.span.is_dummy() || !node.span.contains(offset) {
                continue;
            }
            let len = node.span.len();
            if len < best_len {
                best_len = len;
                best = NodeIndex(i as u32);
            }
        }
        best
    }

    /// Depth-first preorder walk from `root`, calling `visit` for each node.
    pub fn walk(&self, root: NodeIndex, visit: &mut impl FnMut(NodeIndex)) {
        if self.get(root).is_none() {
            return;
        }
        visit(root);
        for child in self.children(root) {
            self.walk(child, visit);
        }
    }
}

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod tests;
