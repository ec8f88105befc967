#[path = "support.rs"]
mod support;

use gdsem_ast::node::{BinaryOp, NodeIndex};
use gdsem_checker::InferenceConfidence;
use gdsem_solver::Ty;
use support::Fixture;

fn constraints_for(
    f: &Fixture,
    name: &str,
) -> std::rc::Rc<gdsem_checker::ParameterConstraints> {
    let symbol = f.binder.symbols_named(f.atom(name))[0];
    f.ctx().usage_constraints(symbol)
}

#[test]
fn test_fingerprint_collects_methods_and_properties() {
    // func f(p):
    //     p.append(0)
    //     p.size()
    //     p.name
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let r1 = b.ident("p");
        let zero = b.int(0);
        let c1 = b.call_method(r1, "append", vec![zero]);
        let s1 = b.expr_stmt(c1);
        let r2 = b.ident("p");
        let c2 = b.call_method(r2, "size", vec![]);
        let s2 = b.expr_stmt(c2);
        let r3 = b.ident("p");
        let access = b.member(r3, "name");
        let s3 = b.expr_stmt(access);
        let method = b.method("f", vec![param], vec![s1, s2, s3]);
        b.class("C", "Node", vec![method])
    });
    let constraints = constraints_for(&f, "p");
    assert!(constraints.required_methods.contains(&f.atom("append")));
    assert!(constraints.required_methods.contains(&f.atom("size")));
    assert!(constraints.required_properties.contains(&f.atom("name")));
    assert_eq!(constraints.call_args.len(), 2);
}

#[test]
fn test_fingerprint_iterable_and_indexable() {
    // for item in p: pass
    // p[0]
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let coll = b.ident("p");
        let inner = b.pass();
        let for_stmt = b.for_stmt("item", coll, vec![inner]);
        let receiver = b.ident("p");
        let zero = b.int(0);
        let index = b.index(receiver, zero);
        let stmt = b.expr_stmt(index);
        let method = b.method("f", vec![param], vec![for_stmt, stmt]);
        b.class("C", "Node", vec![method])
    });
    let constraints = constraints_for(&f, "p");
    assert!(constraints.is_iterable);
    assert!(constraints.is_indexable);
    assert_eq!(constraints.key_tys, vec![Ty::INT]);
}

#[test]
fn test_fingerprint_element_evidence_from_iterator_guard() {
    // for item in p:
    //     if item is Node: pass
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let coll = b.ident("p");
        let lhs = b.ident("item");
        let node = b.ident("Node");
        let cond = b.binary(BinaryOp::Is, lhs, node);
        let body = b.pass();
        let if_stmt = b.simple_if(cond, vec![body]);
        let for_stmt = b.for_stmt("item", coll, vec![if_stmt]);
        let method = b.method("f", vec![param], vec![for_stmt]);
        b.class("C", "Node", vec![method])
    });
    let constraints = constraints_for(&f, "p");
    assert!(constraints.is_iterable);
    assert_eq!(constraints.element_tys, vec![Ty::Named(f.atom("Node"))]);
}

#[test]
fn test_fingerprint_guards() {
    // if p is Node: pass
    // if p is not Image: pass
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let l1 = b.ident("p");
        let node = b.ident("Node");
        let c1 = b.binary(BinaryOp::Is, l1, node);
        let b1 = b.pass();
        let if1 = b.simple_if(c1, vec![b1]);
        let l2 = b.ident("p");
        let image = b.ident("Image");
        let c2 = b.binary(BinaryOp::IsNot, l2, image);
        let b2 = b.pass();
        let if2 = b.simple_if(c2, vec![b2]);
        let method = b.method("f", vec![param], vec![if1, if2]);
        b.class("C", "Node", vec![method])
    });
    let constraints = constraints_for(&f, "p");
    assert_eq!(constraints.possible_tys, vec![Ty::Named(f.atom("Node"))]);
    assert_eq!(constraints.excluded_tys, vec![Ty::Named(f.atom("Image"))]);
}

#[test]
fn test_fingerprint_records_argument_passing() {
    // helper(p) records the cross-method propagation site.
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let arg = b.ident("p");
        let call = b.call_name("helper", vec![arg]);
        let stmt = b.expr_stmt(call);
        let method = b.method("f", vec![param], vec![stmt]);
        let other = b.param("value");
        let helper = b.method("helper", vec![other], vec![]);
        b.class("C", "Node", vec![method, helper])
    });
    let constraints = constraints_for(&f, "p");
    assert_eq!(constraints.passed_to.len(), 1);
    assert_eq!(constraints.passed_to[0].callee, f.atom("helper"));
    assert_eq!(constraints.passed_to[0].position, 0);
}

#[test]
fn test_resolver_is_guard_high_confidence() {
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let lhs = b.ident("p");
        let node = b.ident("Node");
        let cond = b.binary(BinaryOp::Is, lhs, node);
        let body = b.pass();
        let if_stmt = b.simple_if(cond, vec![body]);
        let method = b.method("f", vec![param], vec![if_stmt]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let constraints = constraints_for(&f, "p");
    let inferred = ctx.resolve_constraints(&constraints);
    assert_eq!(inferred.ty, Ty::Named(f.atom("Node")));
    assert_eq!(inferred.confidence, InferenceConfidence::High);
}

#[test]
fn test_resolver_duck_types_container_surface() {
    // p.append(0); p.size() -> Array-family candidates; packed arrays
    // dedup away because Array covers the surface.
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let r1 = b.ident("p");
        let zero = b.int(0);
        let c1 = b.call_method(r1, "append", vec![zero]);
        let s1 = b.expr_stmt(c1);
        let r2 = b.ident("p");
        let c2 = b.call_method(r2, "size", vec![]);
        let s2 = b.expr_stmt(c2);
        let method = b.method("f", vec![param], vec![s1, s2]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let constraints = constraints_for(&f, "p");

    // Before dedup the reverse-index intersection contains Array and the
    // packed arrays (append + size are shared surface).
    let append_types = ctx.runtime.types_with_method(f.atom("append"));
    assert!(append_types.contains(&f.atom("Array")));
    assert!(append_types.contains(&f.atom("PackedInt32Array")));

    let inferred = ctx.resolve_constraints(&constraints);
    assert_eq!(inferred.ty, Ty::Named(f.atom("Array")));
}

#[test]
fn test_resolver_iterable_only_is_array_medium() {
    // func g(list): for item in list: pass
    let f = Fixture::new(|b| {
        let param = b.param("list");
        let coll = b.ident("list");
        let inner = b.pass();
        let for_stmt = b.for_stmt("item", coll, vec![inner]);
        let method = b.method("g", vec![param], vec![for_stmt]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let constraints = constraints_for(&f, "list");
    let inferred = ctx.resolve_constraints(&constraints);
    assert_eq!(inferred.ty, Ty::Named(f.atom("Array")));
    assert_eq!(inferred.confidence, InferenceConfidence::Medium);
}

#[test]
fn test_resolver_demotes_container_lookalikes() {
    // fill + size is container-shaped; Image declares fill but is demoted.
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let r1 = b.ident("p");
        let zero = b.int(0);
        let c1 = b.call_method(r1, "fill", vec![zero]);
        let s1 = b.expr_stmt(c1);
        let r2 = b.ident("p");
        let c2 = b.call_method(r2, "size", vec![]);
        let s2 = b.expr_stmt(c2);
        let method = b.method("f", vec![param], vec![s1, s2]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let constraints = constraints_for(&f, "p");
    let inferred = ctx.resolve_constraints(&constraints);
    // Image never wins over the container family for this fingerprint.
    assert_eq!(inferred.ty, Ty::Named(f.atom("Array")));
}

#[test]
fn test_resolver_excludes_guard_rejected_types() {
    // if p is not Array: pass -- p.append(0); p.size()
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let lhs = b.ident("p");
        let array = b.ident("Array");
        let cond = b.binary(BinaryOp::IsNot, lhs, array);
        let guard_body = b.pass();
        let if_stmt = b.simple_if(cond, vec![guard_body]);
        let r1 = b.ident("p");
        let zero = b.int(0);
        let c1 = b.call_method(r1, "append", vec![zero]);
        let s1 = b.expr_stmt(c1);
        let method = b.method("f", vec![param], vec![if_stmt, s1]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let constraints = constraints_for(&f, "p");
    let inferred = ctx.resolve_constraints(&constraints);
    match &inferred.ty {
        Ty::Named(name) => assert_ne!(*name, f.atom("Array")),
        Ty::Union(union) => {
            assert!(!union.members.contains(&Ty::Named(f.atom("Array"))));
        }
        _ => {}
    }
}

#[test]
fn test_resolver_signature_compatibility_scores() {
    // p.substr("bad") -- String.substr takes Int, so String scores Low;
    // the explicit is-String guard still wins as a High candidate.
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let lhs = b.ident("p");
        let string_ident = b.ident("String");
        let cond = b.binary(BinaryOp::Is, lhs, string_ident);
        let guard_body = b.pass();
        let if_stmt = b.simple_if(cond, vec![guard_body]);
        let receiver = b.ident("p");
        let bad = b.str_lit("bad");
        let call = b.call_method(receiver, "substr", vec![bad]);
        let stmt = b.expr_stmt(call);
        let method = b.method("f", vec![param], vec![if_stmt, stmt]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let constraints = constraints_for(&f, "p");
    let inferred = ctx.resolve_constraints(&constraints);
    assert_eq!(inferred.confidence, InferenceConfidence::High);
    assert!(inferred.ty.contains(&Ty::STRING) || inferred.ty == Ty::STRING);
}

#[test]
fn test_has_method_guard_adds_named_requirement() {
    // if p.has_method("play"): ... -> requires `play`, not `has_method`.
    let f = Fixture::new(|b| {
        let param = b.param("p");
        let receiver = b.ident("p");
        let arg = b.str_lit("play");
        let cond = b.call_method(receiver, "has_method", vec![arg]);
        let body = b.pass();
        let if_stmt = b.simple_if(cond, vec![body]);
        let method = b.method("f", vec![param], vec![if_stmt]);
        b.class("C", "Node", vec![method])
    });
    let constraints = constraints_for(&f, "p");
    assert!(constraints.required_methods.contains(&f.atom("play")));
    assert!(!constraints.required_methods.contains(&f.atom("has_method")));
}

#[test]
fn test_infer_parameter_types_mixes_declared_and_duck() {
    // func f(n: Node, p): p.append(0)
    let mut method = NodeIndex::NONE;
    let f = Fixture::new(|b| {
        let node_ty = b.type_ref("Node");
        let n = b.typed_param("n", node_ty);
        let p = b.param("p");
        let receiver = b.ident("p");
        let zero = b.int(0);
        let call = b.call_method(receiver, "append", vec![zero]);
        let stmt = b.expr_stmt(call);
        method = b.method("f", vec![n, p], vec![stmt]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let inferred = ctx.infer_parameter_types(method);
    assert_eq!(inferred.len(), 2);
    assert_eq!(inferred[0].0, f.atom("n"));
    assert_eq!(inferred[0].1.ty, Ty::Named(f.atom("Node")));
    assert_eq!(inferred[0].1.confidence, InferenceConfidence::High);
    assert_eq!(inferred[1].0, f.atom("p"));
    assert!(inferred[1].1.ty.is_concrete());
}
