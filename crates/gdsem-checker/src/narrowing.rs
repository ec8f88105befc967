//! Narrowing analyzer - converts a boolean condition into a narrowing map.
//!
//! Recognized guard idioms: `x is T`, nested `and` chains, null equality
//! tests, literal equality, `x in container`, bare truthiness,
//! `typeof(x) == TYPE_*`, structural guards (`has_method`, `has`,
//! `has_signal`), and `is_instance_valid`. Unrecognized conditions narrow
//! nothing, which is always sound.
//!
//! Under negation, equality and `is` tests swap polarity and structural
//! guards are dropped.

use crate::context::CheckerContext;
use crate::flow_state::FlowState;
use gdsem_ast::node::{BinaryOp, LiteralValue, NodeIndex, NodeKind, UnaryOp};
use gdsem_common::interner::Atom;
use gdsem_solver::collections::iteration_element_type;
use gdsem_solver::{Ty, UnionBuilder};
use rustc_hash::FxHashMap;

/// Narrowing effect asserted for one variable by a guard.
#[derive(Clone, Debug, Default)]
pub struct NarrowedEntry {
    /// Concrete type asserted by the guard.
    pub ty: Option<Ty>,
    pub non_null: bool,
    pub possibly_null: bool,
    /// Types excluded by a negative `is` test.
    pub excluded_tys: Vec<Ty>,
    /// Duck requirements added by structural guards.
    pub required_methods: Vec<Atom>,
    pub required_properties: Vec<Atom>,
    pub required_signals: Vec<Atom>,
}

/// Variable name to narrowing effect, for one branch entry.
#[derive(Clone, Debug, Default)]
pub struct NarrowingMap {
    pub entries: FxHashMap<Atom, NarrowedEntry>,
}

impl NarrowingMap {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: Atom) -> Option<&NarrowedEntry> {
        self.entries.get(&name)
    }

    fn entry(&mut self, name: Atom) -> &mut NarrowedEntry {
        self.entries.entry(name).or_default()
    }

    /// Apply the asserted facts to a flow state.
    pub fn apply(&self, state: &mut FlowState) {
        for (&name, entry) in &self.entries {
            if let Some(ty) = &entry.ty {
                state.narrow(name, ty.clone());
            }
            if entry.non_null {
                state.mark_non_null(name);
            }
            if entry.possibly_null {
                state.mark_possibly_null(name);
            }
        }
    }
}

/// The `typeof(x) == TYPE_*` constant mapping.
fn type_constant(name: &str) -> Option<Ty> {
    match name {
        "TYPE_NIL" => Some(Ty::Null),
        "TYPE_BOOL" => Some(Ty::BOOL),
        "TYPE_INT" => Some(Ty::INT),
        "TYPE_FLOAT" => Some(Ty::FLOAT),
        "TYPE_STRING" => Some(Ty::STRING),
        "TYPE_STRING_NAME" => Some(Ty::STRING_NAME),
        "TYPE_NODE_PATH" => Some(Ty::NODE_PATH),
        _ => None,
    }
}

fn literal_type(value: &LiteralValue) -> Ty {
    match value {
        LiteralValue::Int(_) => Ty::INT,
        LiteralValue::Float(_) => Ty::FLOAT,
        LiteralValue::Bool(_) => Ty::BOOL,
        LiteralValue::Str(_) => Ty::STRING,
        LiteralValue::StrName(_) => Ty::STRING_NAME,
        LiteralValue::NodePath(_) => Ty::NODE_PATH,
        LiteralValue::Null => Ty::Null,
    }
}

impl<'a> CheckerContext<'a> {
    /// The type named by a type-test operand (`x is T`): an identifier or
    /// type annotation naming a primitive or class.
    #[must_use]
    pub fn type_from_type_expr(&self, idx: NodeIndex) -> Option<Ty> {
        match self.arena.kind(idx)? {
            NodeKind::Ident { name } => {
                let text = self.interner.resolve(*name)?;
                if text.as_ref() == "Variant" {
                    return Some(Ty::Variant);
                }
                match text.as_ref() {
                    "int" | "Int" => Some(Ty::INT),
                    "float" | "Float" => Some(Ty::FLOAT),
                    "bool" | "Bool" => Some(Ty::BOOL),
                    "String" => Some(Ty::STRING),
                    "StringName" => Some(Ty::STRING_NAME),
                    "NodePath" => Some(Ty::NODE_PATH),
                    _ => Some(Ty::Named(*name)),
                }
            }
            NodeKind::TypeRef(_) => {
                gdsem_solver::annotation::ty_from_annotation(self.arena, idx, &self.interner)
            }
            _ => None,
        }
    }

    /// Compute the narrowing a condition asserts on the branch it guards.
    ///
    /// `negated` computes the else-direction facts (used for the implicit
    /// continuation of an early-return `if`).
    #[must_use]
    pub fn narrowing_from_condition(
        &self,
        flow: Option<&FlowState>,
        condition: NodeIndex,
        negated: bool,
    ) -> NarrowingMap {
        let mut map = NarrowingMap::default();
        self.collect_narrowing(flow, condition, negated, &mut map);
        map
    }

    fn collect_narrowing(
        &self,
        flow: Option<&FlowState>,
        condition: NodeIndex,
        negated: bool,
        map: &mut NarrowingMap,
    ) {
        let Some(kind) = self.arena.kind(condition) else {
            return;
        };
        match kind {
            // Bare identifier in boolean position: truthiness implies
            // non-null.
            NodeKind::Ident { name } => {
                if !negated {
                    map.entry(*name).non_null = true;
                }
            }

            NodeKind::Unary(data) if data.op == UnaryOp::Not => {
                self.collect_narrowing(flow, data.operand, !negated, map);
            }

            NodeKind::Binary(data) => {
                let (op, lhs, rhs) = (data.op, data.lhs, data.rhs);
                match op {
                    BinaryOp::And => {
                        // In the positive branch both operands hold. Under
                        // negation neither side is guaranteed false, so no
                        // narrowing applies.
                        if !negated {
                            self.collect_narrowing(flow, lhs, false, map);
                            self.collect_narrowing(flow, rhs, false, map);
                        }
                    }
                    BinaryOp::Or => {
                        // `not (a or b)` implies both negations hold.
                        if negated {
                            self.collect_narrowing(flow, lhs, true, map);
                            self.collect_narrowing(flow, rhs, true, map);
                        }
                    }
                    BinaryOp::Is => self.narrow_type_test(lhs, rhs, negated, map),
                    BinaryOp::IsNot => self.narrow_type_test(lhs, rhs, !negated, map),
                    BinaryOp::Eq => self.narrow_equality(lhs, rhs, negated, map),
                    BinaryOp::Ne => self.narrow_equality(lhs, rhs, !negated, map),
                    BinaryOp::In => {
                        if !negated {
                            self.narrow_membership(flow, lhs, rhs, map);
                        }
                    }
                    _ => {}
                }
            }

            NodeKind::Call(data) => {
                if !negated {
                    self.narrow_guard_call(condition, data.callee, &data.args, map);
                }
            }

            _ => {}
        }
    }

    /// `x is T` (or its negation via `is not` / `not`).
    fn narrow_type_test(
        &self,
        lhs: NodeIndex,
        rhs: NodeIndex,
        negated: bool,
        map: &mut NarrowingMap,
    ) {
        let Some(name) = self.arena.ident_name(lhs) else {
            return;
        };
        let Some(ty) = self.type_from_type_expr(rhs) else {
            return;
        };
        let entry = map.entry(name);
        if negated {
            entry.excluded_tys.push(ty);
        } else {
            entry.non_null = !ty.is_null();
            entry.ty = Some(ty);
        }
    }

    fn narrow_equality(
        &self,
        lhs: NodeIndex,
        rhs: NodeIndex,
        negated: bool,
        map: &mut NarrowingMap,
    ) {
        // typeof(x) == TYPE_* can carry the call on either side.
        if self.narrow_typeof(lhs, rhs, negated, map).is_some() {
            return;
        }
        if self.narrow_typeof(rhs, lhs, negated, map).is_some() {
            return;
        }
        // Normalize to (identifier, literal operand).
        let (ident, other) = if self.arena.ident_name(lhs).is_some() {
            (lhs, rhs)
        } else if self.arena.ident_name(rhs).is_some() {
            (rhs, lhs)
        } else {
            return;
        };
        let Some(name) = self.arena.ident_name(ident) else {
            return;
        };
        match self.arena.kind(other) {
            Some(NodeKind::Literal(LiteralValue::Null)) => {
                let entry = map.entry(name);
                if negated {
                    entry.non_null = true;
                } else {
                    entry.possibly_null = true;
                }
            }
            Some(NodeKind::Literal(value)) => {
                if !negated {
                    let ty = literal_type(value);
                    let entry = map.entry(name);
                    entry.non_null = !ty.is_null();
                    entry.ty = Some(ty);
                }
            }
            _ => {}
        }
    }

    /// `typeof(x) == TYPE_*`; returns `Some(())` when the pattern matched.
    fn narrow_typeof(
        &self,
        call: NodeIndex,
        constant: NodeIndex,
        negated: bool,
        map: &mut NarrowingMap,
    ) -> Option<()> {
        let NodeKind::Call(data) = self.arena.kind(call)? else {
            return None;
        };
        let callee = self.arena.ident_name(data.callee)?;
        if self.interner.resolve(callee)?.as_ref() != "typeof" {
            return None;
        }
        let target = self.arena.ident_name(*data.args.first()?)?;
        let constant_name = self.arena.ident_name(constant)?;
        let resolved = self.interner.resolve(constant_name)?;
        let ty = type_constant(&resolved)?;
        if !negated {
            let entry = map.entry(target);
            entry.non_null = !ty.is_null();
            entry.possibly_null = ty.is_null();
            if !ty.is_null() {
                entry.ty = Some(ty);
            }
        }
        Some(())
    }

    /// `x in container`: narrow to the container's element (or key) type,
    /// intersecting with an existing union when both sides are unions.
    fn narrow_membership(
        &self,
        flow: Option<&FlowState>,
        lhs: NodeIndex,
        rhs: NodeIndex,
        map: &mut NarrowingMap,
    ) {
        let Some(name) = self.arena.ident_name(lhs) else {
            return;
        };
        let container_ty = self.infer_with_flow(rhs, flow);
        let element = iteration_element_type(&container_ty, &self.interner);
        if element.is_variant() {
            return;
        }
        let narrowed = match flow.and_then(|f| f.get_type(name)) {
            Some(existing) if existing.is_union() && element.is_union() => {
                let mut builder = UnionBuilder::new();
                for member in element.members() {
                    if existing.contains(member) {
                        builder.add(member.clone());
                    }
                }
                if builder.is_empty() {
                    element
                } else {
                    builder.build()
                }
            }
            _ => element,
        };
        let entry = map.entry(name);
        entry.non_null = true;
        entry.ty = Some(narrowed);
    }

    /// Structural guard calls: `x.has_method("m")`, `has_method(x, "m")`,
    /// `x.has("p")`, `x.has_signal("s")`, `is_instance_valid(x)`.
    fn narrow_guard_call(
        &self,
        _condition: NodeIndex,
        callee: NodeIndex,
        args: &[NodeIndex],
        map: &mut NarrowingMap,
    ) {
        // Member form: receiver.has_method("m")
        if let Some(NodeKind::MemberAccess(access)) = self.arena.kind(callee) {
            let Some(target) = self.arena.ident_name(access.receiver) else {
                return;
            };
            let Some(guard) = self.interner.resolve(access.member) else {
                return;
            };
            let Some(member_name) = args.first().and_then(|&arg| self.string_argument(arg))
            else {
                return;
            };
            match guard.as_ref() {
                "has_method" => {
                    let entry = map.entry(target);
                    entry.required_methods.push(member_name);
                    entry.non_null = true;
                }
                "has" => {
                    let entry = map.entry(target);
                    entry.required_properties.push(member_name);
                    entry.non_null = true;
                }
                "has_signal" => {
                    let entry = map.entry(target);
                    entry.required_signals.push(member_name);
                    entry.non_null = true;
                }
                _ => {}
            }
            return;
        }

        // Free form: has_method(x, "m") / is_instance_valid(x)
        let Some(callee_name) = self.arena.ident_name(callee) else {
            return;
        };
        let Some(callee_text) = self.interner.resolve(callee_name) else {
            return;
        };
        match callee_text.as_ref() {
            "is_instance_valid" => {
                if let Some(target) = args.first().and_then(|&arg| self.arena.ident_name(arg)) {
                    map.entry(target).non_null = true;
                }
            }
            "has_method" | "has" | "has_signal" => {
                let Some(target) = args.first().and_then(|&arg| self.arena.ident_name(arg))
                else {
                    return;
                };
                let Some(member_name) =
                    args.get(1).and_then(|&arg| self.string_argument(arg))
                else {
                    return;
                };
                let entry = map.entry(target);
                entry.non_null = true;
                match callee_text.as_ref() {
                    "has_method" => entry.required_methods.push(member_name),
                    "has" => entry.required_properties.push(member_name),
                    "has_signal" => entry.required_signals.push(member_name),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    /// A string or string-name literal argument, interned.
    #[must_use]
    pub fn string_argument(&self, arg: NodeIndex) -> Option<Atom> {
        match self.arena.kind(arg)? {
            NodeKind::Literal(LiteralValue::Str(text))
            | NodeKind::Literal(LiteralValue::StrName(text)) => {
                Some(self.interner.intern(text))
            }
            _ => None,
        }
    }
}

/// Result type of a literal, exposed for the inference engine.
#[must_use]
pub fn ty_of_literal(value: &LiteralValue) -> Ty {
    literal_type(value)
}

