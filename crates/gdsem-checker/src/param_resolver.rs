//! Duck-type resolution: fingerprint to ranked type candidates.
//!
//! Candidates come from `is` guards and from intersecting the runtime's
//! reverse indices over the required members. Each candidate is scored by
//! signature compatibility with the observed call arguments, demoted when a
//! non-container type matches a container-shaped fingerprint, and filtered
//! against singletons, internal types, and excluded types. Packed-array
//! candidates redundant with `Array` are deduplicated.

use crate::context::CheckerContext;
use crate::params::ParameterConstraints;
use gdsem_ast::node::{NodeIndex, NodeKind};
use gdsem_common::interner::Atom;
use gdsem_runtime::MemberInfo;
use gdsem_solver::collections::{is_container_method, is_packed_array};
use gdsem_solver::{Primitive, Ty, UnionBuilder};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

/// Confidence of an inferred parameter type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum InferenceConfidence {
    Low,
    Medium,
    High,
}

/// An inferred type with its confidence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InferredType {
    pub ty: Ty,
    pub confidence: InferenceConfidence,
}

impl InferredType {
    #[must_use]
    pub fn new(ty: Ty, confidence: InferenceConfidence) -> Self {
        Self { ty, confidence }
    }
}

fn ty_from_type_name(name: Atom, text: &str) -> Ty {
    match Primitive::from_name(text) {
        Some(primitive) => Ty::Primitive(primitive),
        None => Ty::Named(name),
    }
}

impl<'a> CheckerContext<'a> {
    /// Resolve a usage fingerprint to a ranked candidate type.
    #[must_use]
    pub fn resolve_constraints(&self, constraints: &ParameterConstraints) -> InferredType {
        let mut candidates: Vec<(Atom, InferenceConfidence)> = Vec::new();

        // 1. Explicit `is T` guards are the strongest evidence.
        for ty in &constraints.possible_tys {
            if let Some(name) = ty.runtime_name(&self.interner) {
                candidates.push((name, InferenceConfidence::High));
            }
        }

        // 2. Reverse-index intersection over the required members.
        if !constraints.required_methods.is_empty()
            || !constraints.required_properties.is_empty()
        {
            let mut set: Option<FxHashSet<Atom>> = None;
            for &method in &constraints.required_methods {
                let declaring: FxHashSet<Atom> =
                    self.runtime.types_with_method(method).into_iter().collect();
                set = Some(match set {
                    None => declaring,
                    Some(prev) => prev.intersection(&declaring).copied().collect(),
                });
            }
            for &property in &constraints.required_properties {
                let declaring: FxHashSet<Atom> = self
                    .runtime
                    .types_with_property(property)
                    .into_iter()
                    .collect();
                set = Some(match set {
                    None => declaring,
                    Some(prev) => prev.intersection(&declaring).copied().collect(),
                });
            }
            for name in set.unwrap_or_default() {
                if candidates.iter().any(|(existing, _)| *existing == name) {
                    continue;
                }
                // 3. Signature compatibility against the observed call
                // arguments.
                let confidence = self.score_signatures(name, constraints);
                candidates.push((name, confidence));
            }
        }

        // 4. Container affinity: a non-container candidate matching a
        // container-shaped fingerprint is a coincidence of names.
        let container_required = constraints
            .required_methods
            .iter()
            .filter(|&&m| {
                self.interner
                    .resolve(m)
                    .is_some_and(|text| is_container_method(&text))
            })
            .count();
        if !constraints.required_methods.is_empty()
            && container_required * 2 >= constraints.required_methods.len()
        {
            for (name, confidence) in &mut candidates {
                if !self.is_container_type(*name) {
                    *confidence = InferenceConfidence::Low;
                }
            }
        }

        // 5. Singletons and internal types are never parameters.
        candidates.retain(|(name, _)| {
            if self.runtime.is_singleton(*name) {
                return false;
            }
            !self
                .interner
                .resolve(*name)
                .is_some_and(|text| text.starts_with('_'))
        });

        // 6. Packed arrays redundant with Array.
        self.dedup_packed_arrays(&mut candidates, constraints);

        // 7. Excluded types.
        candidates.retain(|(name, _)| {
            !constraints
                .excluded_tys
                .iter()
                .any(|ty| ty.runtime_name(&self.interner) == Some(*name))
        });

        // Deduplicate by name keeping the best confidence, then order
        // deterministically.
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        candidates.dedup_by_key(|(name, _)| *name);

        // 8. Emit.
        if candidates.is_empty() {
            if constraints.is_iterable || constraints.is_indexable {
                return InferredType::new(
                    Ty::Named(self.interner.intern("Array")),
                    InferenceConfidence::Medium,
                );
            }
            return InferredType::new(Ty::Variant, InferenceConfidence::Low);
        }

        let best = candidates
            .iter()
            .map(|&(_, confidence)| confidence)
            .max()
            .unwrap_or(InferenceConfidence::Low);
        if candidates.len() == 1 {
            let (name, confidence) = candidates[0];
            let text = self.interner.resolve(name);
            let ty = text.map_or(Ty::Named(name), |t| ty_from_type_name(name, &t));
            return InferredType::new(ty, confidence);
        }
        let mut builder = UnionBuilder::new();
        for &(name, _) in &candidates {
            let text = self.interner.resolve(name);
            builder.add(text.map_or(Ty::Named(name), |t| ty_from_type_name(name, &t)));
        }
        debug!(candidates = candidates.len(), "parameter resolved to union");
        InferredType::new(builder.build(), best)
    }

    fn score_signatures(
        &self,
        type_name: Atom,
        constraints: &ParameterConstraints,
    ) -> InferenceConfidence {
        let mut scored = 0usize;
        let mut compatible = 0usize;
        for observation in &constraints.call_args {
            let Some(member) = self.runtime.member(type_name, observation.method) else {
                continue;
            };
            scored += 1;
            if self.arguments_compatible(member, &observation.arg_tys) {
                compatible += 1;
            }
        }
        if scored == 0 {
            return InferenceConfidence::Medium;
        }
        if compatible == scored {
            InferenceConfidence::High
        } else if compatible > 0 {
            InferenceConfidence::Medium
        } else {
            InferenceConfidence::Low
        }
    }

    fn arguments_compatible(&self, member: &MemberInfo, arg_tys: &[Ty]) -> bool {
        let mut params = member.params.iter();
        for arg in arg_tys {
            match params.next() {
                Some(param) => {
                    if param.is_varargs {
                        return true;
                    }
                    if !self.assignable(arg, &param.ty) {
                        return false;
                    }
                }
                // More arguments than declared parameters.
                None => return false,
            }
        }
        // Remaining parameters must be optional.
        params.all(|p| p.has_default || p.is_varargs)
    }

    fn is_container_type(&self, name: Atom) -> bool {
        self.interner.resolve(name).is_some_and(|text| {
            matches!(text.as_ref(), "Array" | "Dictionary") || is_packed_array(&text)
        })
    }

    /// Remove packed-array candidates when `Array` already covers the
    /// required surface and two or more packed types survived.
    fn dedup_packed_arrays(
        &self,
        candidates: &mut Vec<(Atom, InferenceConfidence)>,
        constraints: &ParameterConstraints,
    ) {
        let array_atom = self.interner.get("Array");
        let Some(array_atom) = array_atom else {
            return;
        };
        if !candidates.iter().any(|&(name, _)| name == array_atom) {
            return;
        }
        let packed: Vec<Atom> = candidates
            .iter()
            .map(|&(name, _)| name)
            .filter(|&name| {
                self.interner
                    .resolve(name)
                    .is_some_and(|text| is_packed_array(&text))
            })
            .collect();
        if packed.len() < 2 {
            return;
        }
        let common = constraints.required_methods.iter().all(|&method| {
            self.runtime.member(array_atom, method).is_some()
                && packed
                    .iter()
                    .all(|&p| self.runtime.member(p, method).is_some())
        });
        if common {
            candidates.retain(|&(name, _)| !packed.contains(&name));
        }
    }

    /// Infer types for every parameter of a method or lambda: the declared
    /// annotation at High confidence, otherwise duck-type resolution of the
    /// usage fingerprint, refined by call-site argument evidence from the
    /// project registry. Lambda call sites are keyed by the name the lambda
    /// is callable through (its own name or the variable holding it).
    #[must_use]
    pub fn infer_parameter_types(&self, callable: NodeIndex) -> Vec<(Atom, InferredType)> {
        let (params, site_key) = match self.arena.kind(callable) {
            Some(NodeKind::MethodDecl(data)) => {
                (data.params.clone(), Some(self.method_key(data.name)))
            }
            Some(NodeKind::Lambda(data)) => {
                let key = self
                    .lambda_callable_name(callable)
                    .map(|name| self.method_key(name));
                (data.params.clone(), key)
            }
            _ => return Vec::new(),
        };
        let mut result = Vec::with_capacity(params.len());
        for (position, &param) in params.iter().enumerate() {
            let Some(symbol) = self.binder.symbol_for_decl(param) else {
                continue;
            };
            let Some(info) = self.binder.symbol(symbol) else {
                continue;
            };
            let name = info.name;
            if let Some(declared) = &info.declared_ty {
                result.push((
                    name,
                    InferredType::new(declared.clone(), InferenceConfidence::High),
                ));
                continue;
            }
            let constraints = self.usage_constraints(symbol);
            let mut inferred = self.resolve_constraints(&constraints);

            // Call-site evidence: the union of argument types at recorded
            // call sites becomes the expected type when usage alone was
            // inconclusive.
            if inferred.ty.is_variant() {
                if let Some(site_union) =
                    site_key.and_then(|key| self.call_site_argument_union(key, position))
                {
                    inferred = InferredType::new(site_union, InferenceConfidence::Medium);
                }
            }
            result.push((name, inferred));
        }
        result
    }
}

