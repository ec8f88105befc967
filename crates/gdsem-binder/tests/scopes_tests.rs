use gdsem_ast::builder::AstBuilder;
use gdsem_ast::node::NodeIndex;
use gdsem_binder::{BinderState, SymbolKind};
use gdsem_common::interner::ShardedInterner;
use gdsem_solver::Ty;
use std::sync::Arc;

struct Fixture {
    file: gdsem_ast::FileAst,
    binder: BinderState,
    ref_in_a: NodeIndex,
    ref_in_b: NodeIndex,
}

/// Two methods both declaring a local `x` with different annotations.
fn two_method_fixture() -> Fixture {
    let interner = Arc::new(ShardedInterner::new());
    let mut b = AstBuilder::new(Arc::clone(&interner));

    let string_ty = b.type_ref("String");
    let init_a = b.str_lit("hi");
    let decl_a = b.var_decl("x", string_ty, init_a);
    let ref_in_a = b.ident("x");
    let use_a = b.expr_stmt(ref_in_a);
    let method_a = b.method("a", vec![], vec![decl_a, use_a]);

    let int_ty = b.type_ref("int");
    let init_b = b.int(1);
    let decl_b = b.var_decl("x", int_ty, init_b);
    let ref_in_b = b.ident("x");
    let use_b = b.expr_stmt(ref_in_b);
    let method_b = b.method("b", vec![], vec![decl_b, use_b]);

    let root = b.class("Pair", "Node", vec![method_a, method_b]);
    let file = b.finish("res://pair.gd", root);
    let binder = BinderState::bind_file(&file.arena, file.root, interner);
    Fixture {
        file,
        binder,
        ref_in_a,
        ref_in_b,
    }
}

#[test]
fn test_same_name_locals_are_distinct_symbols() {
    let f = two_method_fixture();
    let i = &f.binder.interner;
    let all = f.binder.symbols_named(i.intern("x"));
    assert_eq!(all.len(), 2);
    assert_ne!(all[0], all[1]);
}

#[test]
fn test_scope_aware_resolution() {
    let f = two_method_fixture();
    let i = &f.binder.interner;
    let x = i.intern("x");
    let in_a = f.binder.resolve_name(&f.file.arena, f.ref_in_a, x).unwrap();
    let in_b = f.binder.resolve_name(&f.file.arena, f.ref_in_b, x).unwrap();
    assert_ne!(in_a, in_b);
    assert_eq!(f.binder.symbol(in_a).unwrap().declared_ty, Some(Ty::STRING));
    assert_eq!(f.binder.symbol(in_b).unwrap().declared_ty, Some(Ty::INT));
}

#[test]
fn test_member_visible_from_method_body() {
    let interner = Arc::new(ShardedInterner::new());
    let mut b = AstBuilder::new(Arc::clone(&interner));
    let init = b.int(3);
    let member = b.var_decl("count", NodeIndex::NONE, init);
    let reference = b.ident("count");
    let stmt = b.expr_stmt(reference);
    let method = b.method("tick", vec![], vec![stmt]);
    let root = b.class("Counter", "Node", vec![member, method]);
    let file = b.finish("res://counter.gd", root);
    let binder = BinderState::bind_file(&file.arena, file.root, interner);

    let count = binder.interner.intern("count");
    let resolved = binder.resolve_name(&file.arena, reference, count).unwrap();
    assert_eq!(binder.symbol(resolved).unwrap().kind, SymbolKind::Property);
    // Restricting to locals rejects the member.
    assert!(binder.resolve_local(&file.arena, reference, count).is_none());
}

#[test]
fn test_shadowing_innermost_wins() {
    let interner = Arc::new(ShardedInterner::new());
    let mut b = AstBuilder::new(Arc::clone(&interner));
    let member_init = b.int(0);
    let member = b.var_decl("value", NodeIndex::NONE, member_init);
    let local_init = b.str_lit("local");
    let local = b.var_decl("value", NodeIndex::NONE, local_init);
    let reference = b.ident("value");
    let stmt = b.expr_stmt(reference);
    let method = b.method("run", vec![], vec![local, stmt]);
    let root = b.class("Shadow", "Node", vec![member, method]);
    let file = b.finish("res://shadow.gd", root);
    let binder = BinderState::bind_file(&file.arena, file.root, interner);

    let value = binder.interner.intern("value");
    let resolved = binder.resolve_name(&file.arena, reference, value).unwrap();
    assert_eq!(binder.symbol(resolved).unwrap().kind, SymbolKind::Variable);
}

#[test]
fn test_iterator_not_visible_outside_loop() {
    let interner = Arc::new(ShardedInterner::new());
    let mut b = AstBuilder::new(Arc::clone(&interner));
    let coll = b.array_lit(vec![]);
    let loop_body = b.pass();
    let for_stmt = b.for_stmt("item", coll, vec![loop_body]);
    let after_ref = b.ident("item");
    let after = b.expr_stmt(after_ref);
    let method = b.method("walk", vec![], vec![for_stmt, after]);
    let root = b.class("Walker", "Node", vec![method]);
    let file = b.finish("res://walker.gd", root);
    let binder = BinderState::bind_file(&file.arena, file.root, interner);

    let item = binder.interner.intern("item");
    // Inside the loop body the iterator resolves; after the loop it does not.
    assert!(binder.resolve_name(&file.arena, loop_body, item).is_some());
    assert!(binder.resolve_name(&file.arena, after_ref, item).is_none());
}

#[test]
fn test_visible_symbols_for_completion() {
    let f = two_method_fixture();
    let i = &f.binder.interner;
    let visible = f.binder.visible_symbols(&f.file.arena, f.ref_in_a);
    let names: Vec<_> = visible
        .iter()
        .filter_map(|&id| f.binder.symbol(id))
        .map(|s| i.resolve(s.name).unwrap().to_string())
        .collect();
    // The local x, plus class members a and b.
    assert!(names.contains(&"x".to_string()));
    assert!(names.contains(&"a".to_string()));
    assert!(names.contains(&"b".to_string()));
    // Only one x is visible (the shadowing local).
    assert_eq!(names.iter().filter(|n| n.as_str() == "x").count(), 1);
}
