#[path = "support.rs"]
mod support;

use gdsem_ast::node::NodeIndex;
use gdsem_solver::Ty;
use support::Workbench;

/// Two files: Player (class_name Player extends Node) with take_damage, and
/// Game which calls player.take_damage(10).
fn two_file_project(w: &Workbench) -> gdsem_model::ProjectModel {
    let project = w.project();

    let player = w.file("res://player.gd", |b| {
        let amount = b.param("amount");
        let target = b.ident("health");
        let value = b.ident("amount");
        let assign = b.assign_op(gdsem_ast::node::AssignOp::SubAssign, target, value);
        let take_damage = b.method("take_damage", vec![amount], vec![assign]);
        let hundred = b.int(100);
        let health = b.var_decl("health", NodeIndex::NONE, hundred);
        b.class("Player", "Node2D", vec![health, take_damage])
    });

    let game = w.file("res://game.gd", |b| {
        let player_ty = b.type_ref("Player");
        let param = b.typed_param("player", player_ty);
        let receiver = b.ident("player");
        let ten = b.int(10);
        let call = b.call_method(receiver, "take_damage", vec![ten]);
        let stmt = b.expr_stmt(call);
        let method = b.method("hurt_player", vec![param], vec![stmt]);
        b.class("Game", "Node", vec![method])
    });

    project.add_file(player);
    project.add_file(game);
    project
}

#[test]
fn test_cross_file_call_sites_recorded() {
    let w = Workbench::new();
    let project = two_file_project(&w);
    let sites = project.call_sites(w.atom("Player"), w.atom("take_damage"));
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].source_file, "res://game.gd");
    assert_eq!(sites[0].argument_tys, vec![Ty::INT]);
}

#[test]
fn test_references_in_project() {
    let w = Workbench::new();
    let project = two_file_project(&w);
    let player = project.semantic_model("res://player.gd").unwrap();
    let take_damage = player.find_symbol("take_damage").unwrap();
    let refs = project.references_in_project("res://player.gd", take_damage);
    assert!(refs.iter().any(|r| r.file == "res://game.gd"));
}

#[test]
fn test_resolve_declaration_across_files() {
    let w = Workbench::new();
    let project = two_file_project(&w);
    let (file, _symbol) = project
        .resolve_declaration("Player", "res://game.gd")
        .unwrap();
    assert_eq!(file, "res://player.gd");
    let (file, _symbol) = project
        .resolve_declaration("take_damage", "res://game.gd")
        .unwrap();
    assert_eq!(file, "res://player.gd");
}

#[test]
fn test_inheritance_chain() {
    let w = Workbench::new();
    let project = two_file_project(&w);
    let chain = project.inheritance_chain("res://player.gd");
    assert_eq!(chain[0], w.atom("Player"));
    assert!(chain.contains(&w.atom("Node2D")));
    assert!(chain.contains(&w.atom("Node")));
    assert!(chain.contains(&w.atom("Object")));
}

#[test]
fn test_script_base_in_inheritance_chain() {
    let w = Workbench::new();
    let project = two_file_project(&w);
    let archer = w.file("res://archer.gd", |b| {
        let shoot = b.method("shoot", vec![], vec![]);
        b.class("Archer", "Player", vec![shoot])
    });
    project.add_file(archer);
    let chain = project.inheritance_chain("res://archer.gd");
    assert_eq!(chain[0], w.atom("Archer"));
    assert!(chain.contains(&w.atom("Player")));
    assert!(chain.contains(&w.atom("Node2D")));
}

#[test]
fn test_find_implementations() {
    let w = Workbench::new();
    let project = two_file_project(&w);
    let tank = w.file("res://tank.gd", |b| {
        let amount = b.param("amount");
        let take_damage = b.method("take_damage", vec![amount], vec![]);
        b.class("Tank", "Player", vec![take_damage])
    });
    project.add_file(tank);
    let implementations =
        project.find_implementations(w.atom("Player"), w.atom("take_damage"));
    assert_eq!(implementations.len(), 1);
    assert_eq!(implementations[0].0, "res://tank.gd");
}

#[test]
fn test_invalidate_file() {
    let w = Workbench::new();
    let project = two_file_project(&w);
    assert_eq!(project.file_count(), 2);
    project.invalidate_file("res://game.gd");
    assert_eq!(project.file_count(), 1);
    assert!(project.semantic_model("res://game.gd").is_none());
    // The invalidated file's call sites are gone too.
    assert!(project
        .call_sites(w.atom("Player"), w.atom("take_damage"))
        .is_empty());
}

#[test]
fn test_parallel_construction() {
    let w = Workbench::new();
    let project = w.project();
    let mut files = Vec::new();
    for i in 0..8 {
        let path = format!("res://file_{i}.gd");
        let class = format!("Class{i}");
        files.push(w.file(&path, |b| {
            let one = b.int(1);
            let ret = b.ret(one);
            let method = b.method("value", vec![], vec![ret]);
            b.class(&class, "Node", vec![method])
        }));
    }
    project.add_files(files);
    assert_eq!(project.file_count(), 8);
    for i in 0..8 {
        let model = project
            .semantic_model(&format!("res://file_{i}.gd"))
            .unwrap();
        let value = model.find_symbol("value").unwrap();
        assert_eq!(model.method_return(value), Some(Ty::INT));
    }
}

#[test]
fn test_cross_file_return_type_flows_through_registry() {
    let w = Workbench::new();
    let project = w.project();

    // stats.gd: func power() -> int
    let stats = w.file("res://stats.gd", |b| {
        let int_ty = b.type_ref("int");
        let one = b.int(9);
        let ret = b.ret(one);
        let power = b.method_full("power", vec![], int_ty, vec![ret], false);
        b.class("Stats", "RefCounted", vec![power])
    });
    project.add_file(stats);

    // hud.gd calls stats.power(); the registry supplies the return type.
    let mut call = NodeIndex::NONE;
    let hud = w.file("res://hud.gd", |b| {
        let stats_ty = b.type_ref("Stats");
        let param = b.typed_param("stats", stats_ty);
        let receiver = b.ident("stats");
        call = b.call_method(receiver, "power", vec![]);
        let stmt = b.expr_stmt(call);
        let method = b.method("refresh", vec![param], vec![stmt]);
        b.class("Hud", "Node", vec![method])
    });
    let hud_model = project.add_file(hud);
    assert_eq!(hud_model.type_for_node(call), Some(Ty::INT));
}

#[test]
fn test_schedule_inference_marks_cycles() {
    let w = Workbench::new();
    let project = w.project();

    // a.gd: func ping() calls Pong.pong(); b.gd: func pong() calls
    // Ping.ping(). Cross-file return cycle.
    let a = w.file("res://a.gd", |b| {
        let pong_ty = b.type_ref("Pong");
        let param = b.typed_param("other", pong_ty);
        let receiver = b.ident("other");
        let call = b.call_method(receiver, "pong", vec![]);
        let ret = b.ret(call);
        let ping = b.method("ping", vec![param], vec![ret]);
        b.class("Ping", "Node", vec![ping])
    });
    let b_file = w.file("res://b.gd", |b| {
        let ping_ty = b.type_ref("Ping");
        let param = b.typed_param("other", ping_ty);
        let receiver = b.ident("other");
        let call = b.call_method(receiver, "ping", vec![]);
        let ret = b.ret(call);
        let pong = b.method("pong", vec![param], vec![ret]);
        b.class("Pong", "Node", vec![pong])
    });
    project.add_file(a);
    project.add_file(b_file);
    // Re-analyze so both directions of the dependency are observed.
    let schedule = project.schedule_inference();
    // The schedule terminates and is deterministic; cycle members (if the
    // cross-file edges were both seen) resolve to Variant.
    for entry in &schedule {
        if entry.is_in_cycle {
            assert_eq!(
                project.registry().method_return_published(entry.key),
                Some(Ty::Variant)
            );
        }
    }
}
