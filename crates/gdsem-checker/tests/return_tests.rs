#[path = "support.rs"]
mod support;

use gdsem_ast::node::NodeIndex;
use gdsem_solver::Ty;
use support::Fixture;

fn return_union_of(f: &Fixture, method_name: &str) -> Ty {
    let symbol = f.binder.class_member(f.atom(method_name)).unwrap();
    let decl = f.binder.symbol(symbol).unwrap().decl;
    f.ctx().return_union(decl)
}

#[test]
fn test_match_returns_union() {
    // func h(v):
    //     match v:
    //         0: return "zero"
    //         "one": return 1
    //         _: return null
    let f = Fixture::new(|b| {
        let param = b.param("v");
        let subject = b.ident("v");

        let zero_pat = b.int(0);
        let zero_val = b.str_lit("zero");
        let ret_zero = b.ret(zero_val);
        let case_zero = b.match_case(vec![zero_pat], vec![ret_zero]);

        let one_pat = b.str_lit("one");
        let one_val = b.int(1);
        let ret_one = b.ret(one_val);
        let case_one = b.match_case(vec![one_pat], vec![ret_one]);

        let wild = b.wildcard_pattern();
        let null_val = b.null();
        let ret_null = b.ret(null_val);
        let case_wild = b.match_case(vec![wild], vec![ret_null]);

        let match_stmt = b.match_stmt(subject, vec![case_zero, case_one, case_wild]);
        let method = b.method("h", vec![param], vec![match_stmt]);
        b.class("C", "Node", vec![method])
    });
    let union = return_union_of(&f, "h");
    assert!(union.contains(&Ty::STRING));
    assert!(union.contains(&Ty::INT));
    assert!(union.contains(&Ty::Null));
}

#[test]
fn test_bare_return_contributes_null() {
    let f = Fixture::new(|b| {
        let flag = b.ident("flag");
        let ret = b.ret_void();
        let if_stmt = b.simple_if(flag, vec![ret]);
        let one = b.int(1);
        let ret_one = b.ret(one);
        let method = b.method("f", vec![], vec![if_stmt, ret_one]);
        b.class("C", "Node", vec![method])
    });
    let union = return_union_of(&f, "f");
    assert!(union.contains(&Ty::Null));
    assert!(union.contains(&Ty::INT));
}

#[test]
fn test_no_returns_is_null() {
    let f = Fixture::new(|b| {
        let body = b.pass();
        let method = b.method("f", vec![], vec![body]);
        b.class("C", "Node", vec![method])
    });
    assert_eq!(return_union_of(&f, "f"), Ty::Null);
}

#[test]
fn test_all_paths_return_no_spurious_null() {
    // if flag: return 1 else: return 2 -> Int only
    let f = Fixture::new(|b| {
        let flag = b.ident("flag");
        let one = b.int(1);
        let ret_one = b.ret(one);
        let two = b.int(2);
        let ret_two = b.ret(two);
        let if_stmt = b.if_else(flag, vec![ret_one], vec![ret_two]);
        let method = b.method("f", vec![], vec![if_stmt]);
        b.class("C", "Node", vec![method])
    });
    assert_eq!(return_union_of(&f, "f"), Ty::INT);
}

#[test]
fn test_lambda_returns_not_collected() {
    // func f():
    //     var cb = func(): return "inner"
    //     return 1
    let f = Fixture::new(|b| {
        let inner_val = b.str_lit("inner");
        let inner_ret = b.ret(inner_val);
        let lambda = b.lambda(vec![], vec![inner_ret]);
        let decl = b.var_decl("cb", NodeIndex::NONE, lambda);
        let one = b.int(1);
        let ret = b.ret(one);
        let method = b.method("f", vec![], vec![decl, ret]);
        b.class("C", "Node", vec![method])
    });
    assert_eq!(return_union_of(&f, "f"), Ty::INT);
}

#[test]
fn test_narrowed_return_site() {
    // func f(x):
    //     if x is Dictionary:
    //         return x.get("k")     <- Variant (Dictionary.get)
    //     return 0
    let f = Fixture::new(|b| {
        let param = b.param("x");
        let lhs = b.ident("x");
        let dict = b.ident("Dictionary");
        let cond = b.binary(gdsem_ast::node::BinaryOp::Is, lhs, dict);
        let receiver = b.ident("x");
        let key = b.str_lit("k");
        let call = b.call_method(receiver, "get", vec![key]);
        let ret = b.ret(call);
        let if_stmt = b.simple_if(cond, vec![ret]);
        let zero = b.int(0);
        let ret_zero = b.ret(zero);
        let method = b.method("f", vec![param], vec![if_stmt, ret_zero]);
        b.class("C", "Node", vec![method])
    });
    // Dictionary.get returns Variant, which absorbs the union.
    assert!(return_union_of(&f, "f").is_variant());
}

#[test]
fn test_return_union_is_cached_and_idempotent() {
    let f = Fixture::new(|b| {
        let one = b.int(1);
        let ret = b.ret(one);
        let method = b.method("f", vec![], vec![ret]);
        b.class("C", "Node", vec![method])
    });
    let ctx = f.ctx();
    let symbol = f.binder.class_member(f.atom("f")).unwrap();
    let decl = f.binder.symbol(symbol).unwrap().decl;
    let first = ctx.return_union(decl);
    let second = ctx.return_union(decl);
    assert_eq!(first, second);
    assert_eq!(first, Ty::INT);
}
