//! Return type collection.
//!
//! The union of a method's return-statement types, inferred with the flow
//! state at each return site. Bare `return` and a fall-through exit
//! contribute `Null`. Nested lambdas are skipped; their returns belong to
//! the lambda.

use crate::context::CheckerContext;
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_solver::{Ty, UnionBuilder};
use tracing::debug;

impl<'a> CheckerContext<'a> {
    /// The inferred return union of a method, cached per method node.
    ///
    /// Re-entrant calls (mutually recursive methods) break the cycle by
    /// returning `Variant`.
    #[must_use]
    pub fn return_union(&self, method: NodeIndex) -> Ty {
        if let Some(cached) = self.return_unions.borrow().get(&method.0) {
            return cached.clone();
        }
        if !self.return_in_progress.borrow_mut().insert(method.0) {
            return Ty::Variant;
        }

        let method_name = match self.arena.kind(method) {
            Some(NodeKind::MethodDecl(data)) => data.name,
            _ => gdsem_common::interner::Atom::NONE,
        };
        self.return_stack
            .borrow_mut()
            .push(self.method_key(method_name));

        let result = self.compute_return_union(method);

        self.return_stack.borrow_mut().pop();
        self.return_in_progress.borrow_mut().remove(&method.0);
        self.return_unions
            .borrow_mut()
            .insert(method.0, result.clone());
        debug!(method = method.0, "return union computed");
        result
    }

    fn compute_return_union(&self, method: NodeIndex) -> Ty {
        let body = match self.arena.kind(method) {
            Some(NodeKind::MethodDecl(data)) => data.body.clone(),
            Some(NodeKind::Lambda(data)) => data.body.clone(),
            _ => return Ty::Variant,
        };

        let flow = self.method_flow(method);
        let mut returns: Vec<NodeIndex> = Vec::new();
        for &stmt in &body {
            collect_returns(self, stmt, &mut returns);
        }

        let mut builder = UnionBuilder::new();
        for ret in &returns {
            let value = match self.arena.kind(*ret) {
                Some(NodeKind::ReturnStmt { value }) => *value,
                _ => continue,
            };
            if value.is_none() {
                builder.add(Ty::Null);
                continue;
            }
            let state = flow
                .try_borrow()
                .ok()
                .and_then(|f| f.node_states.get(&value.0).cloned());
            builder.add(self.infer_with_flow(value, state.as_ref()));
        }

        // A method that can fall off the end returns null on that path.
        let falls_through = flow
            .try_borrow()
            .map(|f| !f.exit_state.is_terminated())
            .unwrap_or(true);
        if falls_through || returns.is_empty() {
            builder.add(Ty::Null);
        }
        builder.build()
    }
}

/// Collect `return` statements in a subtree, stopping at lambda boundaries.
fn collect_returns(ctx: &CheckerContext<'_>, idx: NodeIndex, out: &mut Vec<NodeIndex>) {
    match ctx.arena.kind(idx) {
        None | Some(NodeKind::Lambda(_)) => {}
        Some(NodeKind::ReturnStmt { .. }) => out.push(idx),
        Some(_) => {
            for child in ctx.arena.children(idx) {
                collect_returns(ctx, child, out);
            }
        }
    }
}
