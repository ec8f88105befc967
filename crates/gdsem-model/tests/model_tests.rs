#[path = "support.rs"]
mod support;

use gdsem_ast::node::{BinaryOp, NodeIndex};
use gdsem_binder::SymbolKind;
use gdsem_checker::InferenceConfidence;
use gdsem_solver::Ty;
use support::Workbench;

#[test]
fn test_symbol_at_position() {
    let w = Workbench::new();
    let mut use_site = NodeIndex::NONE;
    let model = w.model("res://a.gd", |b| {
        let one = b.int(1);
        let decl = b.var_decl("velocity", NodeIndex::NONE, one);
        use_site = b.ident("velocity");
        let stmt = b.expr_stmt(use_site);
        let method = b.method("f", vec![], vec![decl, stmt]);
        b.class("A", "Node", vec![method])
    });
    // Synthetic spans sit on line 0; query through the reference span.
    let span = model.file().arena.span(use_site);
    let symbol = model.symbol_at(0, span.start).unwrap();
    assert_eq!(
        model.binder().symbol(symbol).unwrap().kind,
        SymbolKind::Variable
    );
}

#[test]
fn test_find_symbol_queries() {
    let w = Workbench::new();
    let mut ref_in_f = NodeIndex::NONE;
    let model = w.model("res://a.gd", |b| {
        let one = b.int(1);
        let member = b.var_decl("speed", NodeIndex::NONE, one);
        let local_init = b.int(2);
        let local = b.var_decl("speed", NodeIndex::NONE, local_init);
        ref_in_f = b.ident("speed");
        let stmt = b.expr_stmt(ref_in_f);
        let method = b.method("f", vec![], vec![local, stmt]);
        b.class("A", "Node", vec![member, method])
    });
    assert_eq!(model.find_symbols("speed").len(), 2);
    assert!(model.find_symbol("speed").is_some());
    // Scope-aware lookup picks the local inside f.
    let in_scope = model.find_symbol_in_scope("speed", ref_in_f).unwrap();
    assert_eq!(
        model.binder().symbol(in_scope).unwrap().kind,
        SymbolKind::Variable
    );
    assert!(model.find_symbol("missing").is_none());
    assert!(model.find_symbols("missing").is_empty());
}

#[test]
fn test_type_queries() {
    let w = Workbench::new();
    let mut sum = NodeIndex::NONE;
    let model = w.model("res://a.gd", |b| {
        let one = b.int(1);
        let two = b.int(2);
        sum = b.binary(BinaryOp::Add, one, two);
        let stmt = b.expr_stmt(sum);
        let method = b.method("f", vec![], vec![stmt]);
        b.class("A", "Node", vec![method])
    });
    assert_eq!(model.type_for_node(sum), Some(Ty::INT));
    assert_eq!(model.expression_type(sum), Some(Ty::INT));
    // Statement nodes carry no expression type.
    assert!(model.type_for_node(model.file().root).is_none());
}

#[test]
fn test_flow_and_narrowed_type_queries() {
    let w = Workbench::new();
    let mut inside = NodeIndex::NONE;
    let mut after = NodeIndex::NONE;
    let model = w.model("res://a.gd", |b| {
        let param = b.param("x");
        let lhs = b.ident("x");
        let node = b.ident("Node");
        let cond = b.binary(BinaryOp::Is, lhs, node);
        inside = b.ident("x");
        let stmt = b.expr_stmt(inside);
        let if_stmt = b.simple_if(cond, vec![stmt]);
        after = b.ident("x");
        let after_stmt = b.expr_stmt(after);
        let method = b.method("f", vec![param], vec![if_stmt, after_stmt]);
        b.class("A", "Node", vec![method])
    });
    let x = w.atom("x");
    assert_eq!(
        model.flow_type(x, inside),
        Some(Ty::Named(w.atom("Node")))
    );
    assert_eq!(
        model.narrowed_type(x, inside),
        Some(Ty::Named(w.atom("Node")))
    );
    // After the branch no narrowing is active.
    assert!(model.narrowed_type(x, after).is_none());
    assert!(model.effective_type(x, inside).is_some());
}

#[test]
fn test_union_type_for_variable_and_method() {
    let w = Workbench::new();
    let model = w.model("res://a.gd", |b| {
        let one = b.int(1);
        let decl = b.var_decl("x", NodeIndex::NONE, one);
        let target = b.ident("x");
        let s = b.str_lit("s");
        let assign = b.assign(target, s);
        let method = b.method("f", vec![], vec![decl, assign]);

        let flag = b.ident("flag");
        let a = b.int(1);
        let ret_a = b.ret(a);
        let c = b.str_lit("c");
        let ret_c = b.ret(c);
        let if_stmt = b.if_else(flag, vec![ret_a], vec![ret_c]);
        let g = b.method("g", vec![], vec![if_stmt]);
        b.class("A", "Node", vec![method, g])
    });
    let x = model.find_symbols("x")[0];
    let union = model.union_type(x).unwrap();
    assert!(union.contains(&Ty::INT));
    assert!(union.contains(&Ty::STRING));

    let g = model.find_symbol("g").unwrap();
    let g_union = model.union_type(g).unwrap();
    assert!(g_union.contains(&Ty::INT));
    assert!(g_union.contains(&Ty::STRING));
}

#[test]
fn test_duck_type_and_container_profile_queries() {
    let w = Workbench::new();
    let model = w.model("res://a.gd", |b| {
        let param = b.param("p");
        let r1 = b.ident("p");
        let zero = b.int(0);
        let c1 = b.call_method(r1, "append", vec![zero]);
        let s1 = b.expr_stmt(c1);
        let method = b.method("f", vec![param], vec![s1]);
        b.class("A", "Node", vec![method])
    });
    let p = model.find_symbol("p").unwrap();
    let duck = model.duck_type(p).unwrap();
    assert!(duck.required_methods.contains(&w.atom("append")));
    let profile = model.container_profile(p).unwrap();
    assert_eq!(profile.value_type(), Ty::INT);
}

#[test]
fn test_infer_parameter_types_query() {
    let w = Workbench::new();
    let model = w.model("res://a.gd", |b| {
        let param = b.param("list");
        let coll = b.ident("list");
        let inner = b.pass();
        let for_stmt = b.for_stmt("item", coll, vec![inner]);
        let method = b.method("g", vec![param], vec![for_stmt]);
        b.class("A", "Node", vec![method])
    });
    let g = model.find_symbol("g").unwrap();
    let params = model.infer_parameter_types(g);
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].0, w.atom("list"));
    assert_eq!(params[0].1.ty, Ty::Named(w.atom("Array")));
    assert_eq!(params[0].1.confidence, InferenceConfidence::Medium);
}

#[test]
fn test_type_diff() {
    let w = Workbench::new();
    let mut init = NodeIndex::NONE;
    let model = w.model("res://a.gd", |b| {
        let int_ty = b.type_ref("int");
        init = b.str_lit("oops");
        let decl = b.var_decl("x", int_ty, init);
        let method = b.method("f", vec![], vec![decl]);
        b.class("A", "Node", vec![method])
    });
    let diff = model.type_diff(init);
    assert_eq!(diff.expected, Some(Ty::INT));
    assert_eq!(diff.actual, Some(Ty::STRING));
}

#[test]
fn test_visible_symbols_for_completion() {
    let w = Workbench::new();
    let mut site = NodeIndex::NONE;
    let model = w.model("res://a.gd", |b| {
        let one = b.int(1);
        let member = b.var_decl("score", NodeIndex::NONE, one);
        site = b.ident("score");
        let stmt = b.expr_stmt(site);
        let method = b.method("f", vec![], vec![stmt]);
        b.class("A", "Node", vec![member, method])
    });
    let visible = model.visible_symbols_at(site);
    assert!(!visible.is_empty());
}

#[test]
fn test_references_serialize() {
    let w = Workbench::new();
    let mut site = NodeIndex::NONE;
    let model = w.model("res://a.gd", |b| {
        let one = b.int(1);
        let decl = b.var_decl("x", NodeIndex::NONE, one);
        site = b.ident("x");
        let stmt = b.expr_stmt(site);
        let method = b.method("f", vec![], vec![decl, stmt]);
        b.class("A", "Node", vec![method])
    });
    let symbol = model.symbol_for_node(site).unwrap();
    let refs = model.references_to(symbol);
    let json = serde_json::to_value(refs[0]).unwrap();
    assert_eq!(json["confidence"], "Strict");
    assert!(json["node"].is_number());
}

#[test]
fn test_rebuild_is_idempotent() {
    let w = Workbench::new();
    let build = |b: &mut gdsem_ast::AstBuilder| {
        let one = b.int(1);
        let decl = b.var_decl("x", NodeIndex::NONE, one);
        let site = b.ident("x");
        let stmt = b.expr_stmt(site);
        let method = b.method("f", vec![], vec![decl, stmt]);
        b.class("A", "Node", vec![method])
    };
    let first = w.model("res://a.gd", build);
    let second = w.model("res://a.gd", build);

    assert_eq!(first.all_references().len(), second.all_references().len());
    assert_eq!(
        first.binder().symbols.len(),
        second.binder().symbols.len()
    );
    for (a, b) in first
        .all_references()
        .iter()
        .zip(second.all_references().iter())
    {
        assert_eq!(a.node, b.node);
        assert_eq!(a.symbol, b.symbol);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.ty, b.ty);
    }
}
