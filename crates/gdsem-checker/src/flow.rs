//! Flow analyzer - abstract interpretation of one method body.
//!
//! Walks the body statement by statement maintaining a current flow state,
//! recording the *entry* state at every visited node (so queries for "the
//! type of `x` when evaluating `x + 1`" see pre-assignment values).
//!
//! Branches clone the parent state, apply condition narrowing, and merge
//! their end states; the parent simulates the branch-not-taken path. Loops
//! iterate to a bounded fixed point. Lambda bodies are analyzed in a child
//! state whose mutations never escape.

use crate::context::{CheckerContext, MethodFlow};
use crate::flow_state::{FlowState, TerminationKind};
use gdsem_ast::node::{AssignOp, BinaryOp, NodeIndex, NodeKind};
use gdsem_solver::operators::binary_result;
use gdsem_solver::Ty;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Walks one method (or lambda) body, populating a `MethodFlow`.
pub struct FlowAnalyzer<'c, 'a> {
    ctx: &'c CheckerContext<'a>,
    root: NodeIndex,
    flow: Rc<RefCell<MethodFlow>>,
}

impl<'c, 'a> FlowAnalyzer<'c, 'a> {
    #[must_use]
    pub fn new(
        ctx: &'c CheckerContext<'a>,
        root: NodeIndex,
        flow: Rc<RefCell<MethodFlow>>,
    ) -> Self {
        Self { ctx, root, flow }
    }

    /// Analyze the whole body to completion.
    pub fn run(self) {
        let arena = self.ctx.arena;
        let (params, body) = match arena.kind(self.root) {
            Some(NodeKind::MethodDecl(data)) => (data.params.clone(), data.body.clone()),
            Some(NodeKind::Lambda(data)) => (data.params.clone(), data.body.clone()),
            _ => return,
        };

        let mut state = FlowState::new();
        for &param in &params {
            if let Some(NodeKind::ParamDecl(data)) = arena.kind(param) {
                let declared = gdsem_solver::annotation::ty_from_annotation(
                    arena,
                    data.ty,
                    &self.ctx.interner,
                );
                let initial = declared.clone().unwrap_or(Ty::Variant);
                state.declare(data.name, declared, initial);
            }
        }

        for &stmt in &body {
            self.walk_stmt(stmt, &mut state);
        }
        self.flow.borrow_mut().exit_state = state;
        trace!(root = self.root.0, "flow analysis complete");
    }

    // =========================================================================
    // Recording
    // =========================================================================

    fn record(&self, node: NodeIndex, state: &FlowState) {
        if node.is_none() {
            return;
        }
        self.flow
            .borrow_mut()
            .node_states
            .insert(node.0, state.clone());
    }

    /// Record the entry state for an expression subtree. Descent stops at
    /// lambda boundaries; the lambda interior is analyzed with its own
    /// child state.
    fn record_expr(&self, node: NodeIndex, state: &FlowState) {
        if node.is_none() || self.ctx.arena.get(node).is_none() {
            return;
        }
        self.record(node, state);
        if matches!(self.ctx.arena.kind(node), Some(NodeKind::Lambda(_))) {
            self.walk_lambda(node, state);
            return;
        }
        for child in self.ctx.arena.children(node) {
            self.record_expr(child, state);
        }
    }

    fn walk_lambda(&self, lambda: NodeIndex, outer: &FlowState) {
        // Snapshot the captured outer flow for later queries.
        self.flow
            .borrow_mut()
            .lambda_captures
            .insert(lambda.0, outer.clone());

        let Some(NodeKind::Lambda(data)) = self.ctx.arena.kind(lambda) else {
            return;
        };
        let data = data.clone();
        let site_key = self
            .ctx
            .lambda_callable_name(lambda)
            .map(|name| self.ctx.method_key(name));
        let mut inner = outer.clone();
        for (position, &param) in data.params.iter().enumerate() {
            if let Some(NodeKind::ParamDecl(pdata)) = self.ctx.arena.kind(param) {
                let declared = gdsem_solver::annotation::ty_from_annotation(
                    self.ctx.arena,
                    pdata.ty,
                    &self.ctx.interner,
                );
                // Untyped lambda parameters take the union of the argument
                // types recorded at the lambda's call sites.
                let initial = match &declared {
                    Some(ty) => ty.clone(),
                    None => site_key
                        .and_then(|key| self.ctx.call_site_argument_union(key, position))
                        .unwrap_or(Ty::Variant),
                };
                inner.declare(pdata.name, declared, initial);
                inner.mark_non_null(pdata.name);
            }
        }
        for &stmt in &data.body {
            self.walk_stmt(stmt, &mut inner);
        }
        // Lambda mutations are discarded; the outer flow is unchanged.
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn walk_stmt(&self, idx: NodeIndex, state: &mut FlowState) {
        self.record(idx, state);
        let Some(kind) = self.ctx.arena.kind(idx) else {
            return;
        };
        match kind {
            NodeKind::VarDecl(data) => {
                let data = data.clone();
                if data.init.is_some() {
                    self.record_expr(data.init, state);
                }
                let declared = gdsem_solver::annotation::ty_from_annotation(
                    self.ctx.arena,
                    data.ty,
                    &self.ctx.interner,
                );
                let initial = if data.init.is_some() {
                    self.ctx.infer_with_flow(data.init, Some(state))
                } else {
                    declared.clone().unwrap_or(Ty::Variant)
                };
                state.declare(data.name, declared, initial);
            }

            NodeKind::AssignStmt(data) => {
                let data = data.clone();
                self.record_expr(data.target, state);
                self.record_expr(data.value, state);
                let value_ty = self.ctx.infer_with_flow(data.value, Some(state));
                // Only a plain identifier target rebinds the name; indexer
                // and member targets mutate the receiver instead.
                if let Some(NodeKind::Ident { name }) = self.ctx.arena.kind(data.target) {
                    let name = *name;
                    let new_ty = match compound_op(data.op) {
                        None => value_ty,
                        Some(op) => {
                            let current =
                                state.get_type(name).unwrap_or(Ty::Variant);
                            binary_result(op, &current, &value_ty, &self.ctx.interner)
                        }
                    };
                    state.assign(name, new_ty);
                }
            }

            NodeKind::ExprStmt { expr } => {
                self.record_expr(*expr, state);
            }

            NodeKind::ReturnStmt { value } => {
                if value.is_some() {
                    self.record_expr(*value, state);
                }
                state.mark_terminated(TerminationKind::Return);
            }

            NodeKind::BreakStmt => state.mark_terminated(TerminationKind::Break),
            NodeKind::ContinueStmt => state.mark_terminated(TerminationKind::Continue),
            NodeKind::PassStmt => {}

            NodeKind::IfStmt(data) => {
                let data = data.clone();
                self.walk_if(&data.branches, data.else_branch, state);
            }

            NodeKind::WhileStmt(data) => {
                let data = data.clone();
                self.walk_while(data.condition, &data.body, state);
            }

            NodeKind::ForStmt(data) => {
                let data = data.clone();
                self.walk_for(data.iterator, data.collection, &data.body, state);
            }

            NodeKind::MatchStmt(data) => {
                let data = data.clone();
                self.walk_match(data.subject, &data.cases, state);
            }

            // A stray expression in statement position.
            _ => self.record_expr(idx, state),
        }
    }

    // =========================================================================
    // Branching
    // =========================================================================

    fn walk_if(&self, branches: &[NodeIndex], else_branch: NodeIndex, state: &mut FlowState) {
        let parent = state.clone();
        let mut ends: Vec<FlowState> = Vec::new();
        let mut sole_condition = NodeIndex::NONE;

        for &branch in branches {
            let Some(NodeKind::ConditionalBranch(data)) = self.ctx.arena.kind(branch) else {
                continue;
            };
            let data = data.clone();
            self.record(branch, &parent);
            self.record_expr(data.condition, &parent);

            // Every branch starts from the parent, not the previous
            // branch's end state.
            let mut branch_state = parent.clone();
            let map =
                self.ctx
                    .narrowing_from_condition(Some(&branch_state), data.condition, false);
            map.apply(&mut branch_state);
            self.flow
                .borrow_mut()
                .branch_narrowing
                .insert(branch.0, map);

            for &stmt in &data.body {
                self.walk_stmt(stmt, &mut branch_state);
            }
            ends.push(branch_state);
            sole_condition = if branches.len() == 1 {
                data.condition
            } else {
                NodeIndex::NONE
            };
        }

        if let Some(NodeKind::ElseBranch(data)) = self.ctx.arena.kind(else_branch) {
            let data = data.clone();
            self.record(else_branch, &parent);
            // Conservative: the else branch does not accumulate negations of
            // the preceding conditions.
            let mut else_state = parent.clone();
            for &stmt in &data.body {
                self.walk_stmt(stmt, &mut else_state);
            }
            ends.push(else_state);
        } else {
            // Branch-not-taken path. For a single-branch if, the condition's
            // negation holds here (the early-return idiom relies on this).
            let mut fallthrough = parent.clone();
            if sole_condition.is_some() {
                let map = self.ctx.narrowing_from_condition(
                    Some(&fallthrough),
                    sole_condition,
                    true,
                );
                map.apply(&mut fallthrough);
            }
            ends.push(fallthrough);
        }

        let refs: Vec<&FlowState> = ends.iter().collect();
        *state = FlowState::merge_all(&refs);
    }

    fn walk_match(&self, subject: NodeIndex, cases: &[NodeIndex], state: &mut FlowState) {
        self.record_expr(subject, state);
        let parent = state.clone();
        let mut ends: Vec<FlowState> = Vec::new();

        for &case in cases {
            let Some(NodeKind::MatchCase(data)) = self.ctx.arena.kind(case) else {
                continue;
            };
            let data = data.clone();
            self.record(case, &parent);
            let mut case_state = parent.clone();
            for &pattern in &data.patterns {
                if let Some(NodeKind::BindingPattern { name, .. }) = self.ctx.arena.kind(pattern)
                {
                    // Bindings enter as Variant until something narrows them.
                    case_state.declare(*name, Some(Ty::Variant), Ty::Variant);
                }
                self.record_expr(pattern, &case_state);
            }
            for &stmt in &data.body {
                self.walk_stmt(stmt, &mut case_state);
            }
            ends.push(case_state);
        }

        // No-case-taken path.
        ends.push(parent);
        let refs: Vec<&FlowState> = ends.iter().collect();
        *state = FlowState::merge_all(&refs);
    }

    // =========================================================================
    // Loops
    // =========================================================================

    fn walk_while(&self, condition: NodeIndex, body: &[NodeIndex], state: &mut FlowState) {
        self.record_expr(condition, state);
        let pre = state.clone();
        let mut entry = pre.clone();
        self.apply_condition(condition, &mut entry);
        *state = self.loop_fixpoint(&pre, entry, body, |analyzer, body_end| {
            let mut next = FlowState::merge(body_end, &pre);
            analyzer.apply_condition(condition, &mut next);
            next
        });
    }

    fn walk_for(
        &self,
        iterator: NodeIndex,
        collection: NodeIndex,
        body: &[NodeIndex],
        state: &mut FlowState,
    ) {
        self.record_expr(collection, state);
        self.record(iterator, state);
        let collection_ty = self.ctx.infer_with_flow(collection, Some(state));
        let element = self.ctx.iteration_element(collection, &collection_ty);
        let iter_name = match self.ctx.arena.kind(iterator) {
            Some(NodeKind::IteratorDecl { name, .. }) => Some(*name),
            _ => None,
        };

        let pre = state.clone();
        let mut entry = pre.clone();
        if let Some(name) = iter_name {
            entry.declare(name, None, element.clone());
            entry.mark_non_null(name);
        }
        *state = self.loop_fixpoint(&pre, entry, body, |_, body_end| {
            let mut next = FlowState::merge(body_end, &pre);
            if let Some(name) = iter_name {
                next.declare(name, None, element.clone());
                next.mark_non_null(name);
            }
            next
        });
    }

    /// Bounded fixed-point iteration over a loop body.
    ///
    /// Re-enters the body with `merge(body_state, pre)` until the
    /// accumulated union stops growing or the snapshot stabilizes. The final
    /// state merges with the pre-loop state because the loop may run zero
    /// times.
    fn loop_fixpoint(
        &self,
        pre: &FlowState,
        mut entry: FlowState,
        body: &[NodeIndex],
        reenter: impl Fn(&Self, &FlowState) -> FlowState,
    ) -> FlowState {
        let mut accumulated: Option<FlowState> = None;
        let mut prev_snapshot = None;

        for iteration in 0..self.ctx.options.max_loop_iterations {
            let mut body_state = entry.clone();
            for &stmt in body {
                self.walk_stmt(stmt, &mut body_state);
            }
            // break/continue flow to the loop exit and the next iteration;
            // only return leaves the method.
            if matches!(
                body_state.termination(),
                Some(TerminationKind::Break | TerminationKind::Continue)
            ) {
                body_state.clear_termination();
            }

            let changed = if body_state.is_terminated() {
                false
            } else {
                match accumulated.as_mut() {
                    None => {
                        accumulated = Some(body_state.clone());
                        true
                    }
                    Some(acc) => acc.merge_into(&body_state),
                }
            };

            let snapshot = accumulated.as_ref().map(FlowState::snapshot);
            if !changed || snapshot == prev_snapshot {
                trace!(iteration, "loop fixed point reached");
                break;
            }
            prev_snapshot = snapshot;
            entry = reenter(self, &body_state);
        }

        match accumulated {
            Some(acc) => FlowState::merge_all(&[&acc, pre]),
            None => pre.clone(),
        }
    }

    fn apply_condition(&self, condition: NodeIndex, state: &mut FlowState) {
        let map = self
            .ctx
            .narrowing_from_condition(Some(state), condition, false);
        map.apply(state);
    }
}

fn compound_op(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Assign => None,
        AssignOp::AddAssign => Some(BinaryOp::Add),
        AssignOp::SubAssign => Some(BinaryOp::Sub),
        AssignOp::MulAssign => Some(BinaryOp::Mul),
        AssignOp::DivAssign => Some(BinaryOp::Div),
        AssignOp::ModAssign => Some(BinaryOp::Mod),
    }
}
