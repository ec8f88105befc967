use gdsem_ast::builder::AstBuilder;
use gdsem_ast::node::NodeIndex;
use gdsem_binder::{BinderState, SymbolKind};
use gdsem_common::interner::ShardedInterner;
use gdsem_solver::Ty;
use std::sync::Arc;

fn binder_for(
    build: impl FnOnce(&mut AstBuilder) -> NodeIndex,
) -> (gdsem_ast::FileAst, BinderState) {
    let interner = Arc::new(ShardedInterner::new());
    let mut b = AstBuilder::new(Arc::clone(&interner));
    let root = build(&mut b);
    let file = b.finish("res://test.gd", root);
    let binder = BinderState::bind_file(&file.arena, file.root, interner);
    (file, binder)
}

#[test]
fn test_class_members_bound() {
    let (_, binder) = binder_for(|b| {
        let health_ty = b.type_ref("int");
        let init = b.int(100);
        let health = b.var_decl("health", health_ty, init);
        let sig = b.signal_decl("died", vec![]);
        let body = vec![];
        let method = b.method("respawn", vec![], body);
        b.class("Player", "Node", vec![health, sig, method])
    });
    let i = &binder.interner;

    let health = binder.class_member(i.intern("health")).unwrap();
    let health = binder.symbol(health).unwrap();
    assert_eq!(health.kind, SymbolKind::Property);
    assert_eq!(health.declared_ty, Some(Ty::INT));
    assert_eq!(i.resolve(health.class_name).as_deref(), Some("Player"));

    let died = binder.class_member(i.intern("died")).unwrap();
    assert_eq!(binder.symbol(died).unwrap().kind, SymbolKind::Signal);

    let respawn = binder.class_member(i.intern("respawn")).unwrap();
    assert_eq!(binder.symbol(respawn).unwrap().kind, SymbolKind::Method);
}

#[test]
fn test_method_params_and_return_type() {
    let (_, binder) = binder_for(|b| {
        let amount_ty = b.type_ref("float");
        let amount = b.typed_param("amount", amount_ty);
        let untyped = b.param("source");
        let ret_ty = b.type_ref("bool");
        let method = b.method_full("hurt", vec![amount, untyped], ret_ty, vec![], false);
        b.class("Enemy", "Node2D", vec![method])
    });
    let i = &binder.interner;
    let hurt = binder.class_member(i.intern("hurt")).unwrap();
    let hurt = binder.symbol(hurt).unwrap();
    assert_eq!(hurt.return_ty, Some(Ty::BOOL));
    assert_eq!(hurt.params.len(), 2);
    assert_eq!(hurt.params[0].declared_ty, Some(Ty::FLOAT));
    assert_eq!(hurt.params[1].declared_ty, None);

    let amount = binder
        .symbols_named(i.intern("amount"))
        .iter()
        .copied()
        .next()
        .unwrap();
    assert_eq!(binder.symbol(amount).unwrap().kind, SymbolKind::Parameter);
}

#[test]
fn test_property_accessors_linked() {
    // var health: int = 100:
    //     get = _get_health
    //     set = _set_health
    let (_, binder) = binder_for(|b| {
        let int_ty = b.type_ref("int");
        let hundred = b.int(100);
        let health = b.property_decl("health", int_ty, hundred, "_get_health", "_set_health");
        let ret_ty = b.type_ref("int");
        let zero = b.int(0);
        let ret = b.ret(zero);
        let getter = b.method_full("_get_health", vec![], ret_ty, vec![ret], false);
        let value_ty = b.type_ref("int");
        let value = b.typed_param("value", value_ty);
        let setter = b.method("_set_health", vec![value], vec![]);
        b.class("Player", "Node", vec![health, getter, setter])
    });
    let i = &binder.interner;
    let health = binder.class_member(i.intern("health")).unwrap();
    let symbol = binder.symbol(health).unwrap();
    assert_eq!(i.resolve(symbol.getter).as_deref(), Some("_get_health"));
    assert_eq!(i.resolve(symbol.setter).as_deref(), Some("_set_health"));

    let (getter_sym, setter_sym) = binder.property_accessors(health);
    let getter_sym = getter_sym.unwrap();
    assert_eq!(binder.symbol(getter_sym).unwrap().kind, SymbolKind::Method);
    assert_eq!(
        i.resolve(binder.symbol(getter_sym).unwrap().name).as_deref(),
        Some("_get_health")
    );
    assert!(setter_sym.is_some());
}

#[test]
fn test_property_without_accessors() {
    let (_, binder) = binder_for(|b| {
        let one = b.int(1);
        let plain = b.var_decl("score", NodeIndex::NONE, one);
        b.class("Board", "Node", vec![plain])
    });
    let score = binder.class_member(binder.interner.intern("score")).unwrap();
    let symbol = binder.symbol(score).unwrap();
    assert!(symbol.getter.is_none());
    assert!(symbol.setter.is_none());
    assert_eq!(binder.property_accessors(score), (None, None));
}

#[test]
fn test_dangling_accessor_name_resolves_to_none() {
    // The named getter does not exist in the class.
    let (_, binder) = binder_for(|b| {
        let one = b.int(1);
        let prop = b.property_decl("score", NodeIndex::NONE, one, "_missing", "");
        b.class("Board", "Node", vec![prop])
    });
    let score = binder.class_member(binder.interner.intern("score")).unwrap();
    assert_eq!(binder.property_accessors(score), (None, None));
}

#[test]
fn test_enum_and_constants() {
    let (_, binder) = binder_for(|b| {
        let speed = b.int(10);
        let max_speed = b.const_decl("MAX_SPEED", speed);
        let states = b.enum_decl("State", &[("IDLE", None), ("RUNNING", Some(2))]);
        b.class("Mover", "Node", vec![max_speed, states])
    });
    let i = &binder.interner;
    let max_speed = binder.class_member(i.intern("MAX_SPEED")).unwrap();
    assert_eq!(binder.symbol(max_speed).unwrap().kind, SymbolKind::Constant);

    let state = binder.class_member(i.intern("State")).unwrap();
    assert_eq!(binder.symbol(state).unwrap().kind, SymbolKind::Enum);
    let idle = binder.class_member(i.intern("IDLE")).unwrap();
    let idle = binder.symbol(idle).unwrap();
    assert_eq!(idle.kind, SymbolKind::EnumValue);
    assert_eq!(idle.declared_ty, Some(Ty::INT));
}

#[test]
fn test_inner_class_bound_recursively() {
    let (_, binder) = binder_for(|b| {
        let inner_method = b.method("tick", vec![], vec![]);
        let inner = b.class("Timer", "", vec![inner_method]);
        b.class("World", "Node", vec![inner])
    });
    let i = &binder.interner;
    let timer = binder.class_member(i.intern("Timer")).unwrap();
    assert_eq!(binder.symbol(timer).unwrap().kind, SymbolKind::InnerClass);
    // The inner class method is bound under the inner scope, not the root.
    assert!(binder.class_member(i.intern("tick")).is_none());
    assert_eq!(binder.symbols_named(i.intern("tick")).len(), 1);
}

#[test]
fn test_locals_iterators_and_bindings() {
    let (file, binder) = binder_for(|b| {
        let init = b.array_lit(vec![]);
        let local = b.var_decl("items", NodeIndex::NONE, init);
        let coll = b.ident("items");
        let loop_body = b.pass();
        let for_stmt = b.for_stmt("item", coll, vec![loop_body]);
        let subject = b.ident("items");
        let binding = b.binding_pattern("found");
        let case_body = b.pass();
        let case = b.match_case(vec![binding], vec![case_body]);
        let match_stmt = b.match_stmt(subject, vec![case]);
        let method = b.method("scan", vec![], vec![local, for_stmt, match_stmt]);
        b.class("Scanner", "Node", vec![method])
    });
    let i = &binder.interner;

    let items = binder.symbols_named(i.intern("items"));
    assert_eq!(items.len(), 1);
    assert_eq!(binder.symbol(items[0]).unwrap().kind, SymbolKind::Variable);

    let item = binder.symbols_named(i.intern("item"));
    assert_eq!(binder.symbol(item[0]).unwrap().kind, SymbolKind::Iterator);

    let found = binder.symbols_named(i.intern("found"));
    let found = binder.symbol(found[0]).unwrap();
    assert_eq!(found.kind, SymbolKind::MatchBinding);
    assert_eq!(found.declared_ty, Some(Ty::Variant));

    // Locals carry their declaring callable for scope isolation.
    let scan = binder.class_member(i.intern("scan")).unwrap();
    let scan_decl = binder.symbol(scan).unwrap().decl;
    assert_eq!(binder.symbol(items[0]).unwrap().scope_node, scan_decl);
    let _ = file;
}

#[test]
fn test_lambda_params_scoped_to_lambda() {
    let (_, binder) = binder_for(|b| {
        let param = b.param("value");
        let body = b.pass();
        let lambda = b.lambda(vec![param], vec![body]);
        let stmt = b.expr_stmt(lambda);
        let method = b.method("setup", vec![], vec![stmt]);
        b.class("Widget", "Node", vec![method])
    });
    let i = &binder.interner;
    let value = binder.symbols_named(i.intern("value"));
    assert_eq!(value.len(), 1);
    let value = binder.symbol(value[0]).unwrap();
    assert_eq!(value.kind, SymbolKind::Parameter);
    // The declaring callable is the lambda, not the enclosing method.
    let scan = binder.class_member(i.intern("setup")).unwrap();
    assert_ne!(value.scope_node, binder.symbol(scan).unwrap().decl);
}
