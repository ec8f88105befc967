//! Core runtime catalog.
//!
//! Seeds the built-in surface the analyzer depends on: the object/node
//! hierarchy, containers with their method sets, strings, engine singletons,
//! and global functions. The project loader extends this with the full
//! engine API dump and project classes; the subset here is what inference
//! rules reference by name.

use crate::catalog::RuntimeCatalog;
use crate::provider::{MemberInfo, MemberKind, ParamSpec, TypeInfo};
use gdsem_common::interner::ShardedInterner;
use gdsem_solver::Ty;
use std::sync::Arc;

fn method(
    interner: &ShardedInterner,
    name: &str,
    ret: Ty,
    params: &[(&str, Ty)],
) -> MemberInfo {
    MemberInfo {
        name: interner.intern(name),
        kind: MemberKind::Method,
        ty: ret,
        params: params
            .iter()
            .map(|(pname, pty)| ParamSpec::new(interner.intern(pname), pty.clone()))
            .collect(),
    }
}

fn method_defaults(
    interner: &ShardedInterner,
    name: &str,
    ret: Ty,
    params: &[(&str, Ty, bool)],
) -> MemberInfo {
    MemberInfo {
        name: interner.intern(name),
        kind: MemberKind::Method,
        ty: ret,
        params: params
            .iter()
            .map(|(pname, pty, has_default)| ParamSpec {
                name: interner.intern(pname),
                ty: pty.clone(),
                has_default: *has_default,
                is_varargs: false,
            })
            .collect(),
    }
}

fn vararg_method(interner: &ShardedInterner, name: &str, ret: Ty) -> MemberInfo {
    MemberInfo {
        name: interner.intern(name),
        kind: MemberKind::Method,
        ty: ret,
        params: vec![ParamSpec {
            name: interner.intern("args"),
            ty: Ty::Variant,
            has_default: true,
            is_varargs: true,
        }],
    }
}

fn property(interner: &ShardedInterner, name: &str, ty: Ty) -> MemberInfo {
    MemberInfo {
        name: interner.intern(name),
        kind: MemberKind::Property,
        ty,
        params: Vec::new(),
    }
}

fn signal(interner: &ShardedInterner, name: &str) -> MemberInfo {
    MemberInfo {
        name: interner.intern(name),
        kind: MemberKind::Signal,
        ty: Ty::Null,
        params: Vec::new(),
    }
}

fn ty_named(interner: &ShardedInterner, name: &str) -> Ty {
    Ty::Named(interner.intern(name))
}

/// Build the core catalog, sealed and ready to share.
#[must_use]
pub fn core_catalog(interner: Arc<ShardedInterner>) -> RuntimeCatalog {
    let mut catalog = RuntimeCatalog::new(Arc::clone(&interner));
    let i = interner.as_ref();

    let variant = Ty::Variant;
    let callable = ty_named(i, "Callable");

    // ----- Object hierarchy -----

    let mut object = TypeInfo::new(i.intern("Object"), None);
    object.members = vec![
        method(i, "get", variant.clone(), &[("property", Ty::STRING_NAME)]),
        method(
            i,
            "set",
            Ty::Null,
            &[("property", Ty::STRING_NAME), ("value", Ty::Variant)],
        ),
        vararg_method(i, "call", variant.clone()),
        vararg_method(i, "call_deferred", variant.clone()),
        method(i, "has_method", Ty::BOOL, &[("method", Ty::STRING_NAME)]),
        method(i, "has_signal", Ty::BOOL, &[("signal", Ty::STRING_NAME)]),
        vararg_method(i, "emit_signal", Ty::Null),
        method(
            i,
            "connect",
            Ty::INT,
            &[("signal", Ty::STRING_NAME), ("callable", callable.clone())],
        ),
        method(
            i,
            "disconnect",
            Ty::Null,
            &[("signal", Ty::STRING_NAME), ("callable", callable.clone())],
        ),
        method(i, "get_class", Ty::STRING, &[]),
        method(i, "is_class", Ty::BOOL, &[("class", Ty::STRING)]),
        method(i, "free", Ty::Null, &[]),
    ];
    catalog.add_type(object);

    let mut node = TypeInfo::new(i.intern("Node"), Some(i.intern("Object")));
    node.members = vec![
        property(i, "name", Ty::STRING_NAME),
        method(i, "add_child", Ty::Null, &[("node", ty_named(i, "Node"))]),
        method(i, "remove_child", Ty::Null, &[("node", ty_named(i, "Node"))]),
        method(i, "get_parent", ty_named(i, "Node"), &[]),
        method(i, "get_node", ty_named(i, "Node"), &[("path", Ty::NODE_PATH)]),
        method(i, "get_children", ty_named(i, "Array"), &[]),
        method(i, "get_name", Ty::STRING_NAME, &[]),
        method(i, "is_inside_tree", Ty::BOOL, &[]),
        method(i, "queue_free", Ty::Null, &[]),
        signal(i, "ready"),
        signal(i, "renamed"),
        signal(i, "tree_entered"),
        signal(i, "tree_exited"),
    ];
    catalog.add_type(node);

    let mut node2d = TypeInfo::new(i.intern("Node2D"), Some(i.intern("Node")));
    node2d.members = vec![
        property(i, "position", ty_named(i, "Vector2")),
        property(i, "rotation", Ty::FLOAT),
        property(i, "scale", ty_named(i, "Vector2")),
        method(i, "move_local_x", Ty::Null, &[("delta", Ty::FLOAT)]),
    ];
    catalog.add_type(node2d);

    catalog.add_type(TypeInfo::new(
        i.intern("RefCounted"),
        Some(i.intern("Object")),
    ));
    catalog.add_type(TypeInfo::new(
        i.intern("Resource"),
        Some(i.intern("RefCounted")),
    ));

    // ----- Value types -----

    let mut vector2 = TypeInfo::new(i.intern("Vector2"), None);
    vector2.members = vec![
        property(i, "x", Ty::FLOAT),
        property(i, "y", Ty::FLOAT),
        method(i, "length", Ty::FLOAT, &[]),
        method(i, "normalized", ty_named(i, "Vector2"), &[]),
    ];
    catalog.add_type(vector2);

    let mut vector3 = TypeInfo::new(i.intern("Vector3"), None);
    vector3.members = vec![
        property(i, "x", Ty::FLOAT),
        property(i, "y", Ty::FLOAT),
        property(i, "z", Ty::FLOAT),
        method(i, "length", Ty::FLOAT, &[]),
    ];
    catalog.add_type(vector3);

    let mut color = TypeInfo::new(i.intern("Color"), None);
    color.members = vec![
        property(i, "r", Ty::FLOAT),
        property(i, "g", Ty::FLOAT),
        property(i, "b", Ty::FLOAT),
        property(i, "a", Ty::FLOAT),
    ];
    catalog.add_type(color);

    // ----- Containers -----

    let mut array = TypeInfo::new(i.intern("Array"), None);
    array.members = vec![
        method(i, "size", Ty::INT, &[]),
        method(i, "is_empty", Ty::BOOL, &[]),
        method(i, "append", Ty::Null, &[("value", Ty::Variant)]),
        method(i, "push_back", Ty::Null, &[("value", Ty::Variant)]),
        method(i, "push_front", Ty::Null, &[("value", Ty::Variant)]),
        method(i, "pop_back", variant.clone(), &[]),
        method(i, "pop_front", variant.clone(), &[]),
        method(
            i,
            "insert",
            Ty::INT,
            &[("position", Ty::INT), ("value", Ty::Variant)],
        ),
        method(i, "has", Ty::BOOL, &[("value", Ty::Variant)]),
        method(i, "erase", Ty::Null, &[("value", Ty::Variant)]),
        method(i, "clear", Ty::Null, &[]),
        method(i, "find", Ty::INT, &[("what", Ty::Variant)]),
        method(i, "front", variant.clone(), &[]),
        method(i, "back", variant.clone(), &[]),
        method(i, "append_array", Ty::Null, &[("array", ty_named(i, "Array"))]),
        method(i, "fill", Ty::Null, &[("value", Ty::Variant)]),
        method(i, "filter", ty_named(i, "Array"), &[("method", callable.clone())]),
        method(i, "map", ty_named(i, "Array"), &[("method", callable.clone())]),
        method(
            i,
            "reduce",
            variant.clone(),
            &[("method", callable.clone()), ("accum", Ty::Variant)],
        ),
        method(i, "sort", Ty::Null, &[]),
        method(i, "duplicate", ty_named(i, "Array"), &[]),
    ];
    catalog.add_type(array);

    let mut dictionary = TypeInfo::new(i.intern("Dictionary"), None);
    dictionary.members = vec![
        method(i, "size", Ty::INT, &[]),
        method(i, "is_empty", Ty::BOOL, &[]),
        method_defaults(
            i,
            "get",
            variant.clone(),
            &[("key", Ty::Variant, false), ("default", Ty::Variant, true)],
        ),
        method(i, "has", Ty::BOOL, &[("key", Ty::Variant)]),
        method(i, "has_all", Ty::BOOL, &[("keys", ty_named(i, "Array"))]),
        method(i, "keys", ty_named(i, "Array"), &[]),
        method(i, "values", ty_named(i, "Array"), &[]),
        method(i, "erase", Ty::BOOL, &[("key", Ty::Variant)]),
        method(i, "clear", Ty::Null, &[]),
        method_defaults(
            i,
            "merge",
            Ty::Null,
            &[
                ("dictionary", ty_named(i, "Dictionary"), false),
                ("overwrite", Ty::BOOL, true),
            ],
        ),
        method(i, "duplicate", ty_named(i, "Dictionary"), &[]),
    ];
    catalog.add_type(dictionary);

    // Packed arrays share the sequential container surface; element types
    // come from the solver's fixed table.
    let packed = [
        ("PackedByteArray", Ty::INT),
        ("PackedInt32Array", Ty::INT),
        ("PackedInt64Array", Ty::INT),
        ("PackedFloat32Array", Ty::FLOAT),
        ("PackedFloat64Array", Ty::FLOAT),
        ("PackedStringArray", Ty::STRING),
        ("PackedVector2Array", ty_named(i, "Vector2")),
        ("PackedVector3Array", ty_named(i, "Vector3")),
        ("PackedColorArray", ty_named(i, "Color")),
    ];
    for (name, element) in packed {
        let mut info = TypeInfo::new(i.intern(name), None);
        info.members = vec![
            method(i, "size", Ty::INT, &[]),
            method(i, "is_empty", Ty::BOOL, &[]),
            method(i, "append", Ty::BOOL, &[("value", element.clone())]),
            method(i, "push_back", Ty::BOOL, &[("value", element.clone())]),
            method(i, "has", Ty::BOOL, &[("value", element.clone())]),
            method(
                i,
                "insert",
                Ty::INT,
                &[("at_index", Ty::INT), ("value", element.clone())],
            ),
            method(i, "clear", Ty::Null, &[]),
            method(i, "fill", Ty::Null, &[("value", element.clone())]),
            method(i, "find", Ty::INT, &[("value", element.clone())]),
            method(
                i,
                "append_array",
                Ty::Null,
                &[("array", ty_named(i, name))],
            ),
            method(i, "sort", Ty::Null, &[]),
        ];
        catalog.add_type(info);
    }

    // ----- Strings -----

    let mut string = TypeInfo::new(i.intern("String"), None);
    string.members = vec![
        method(i, "length", Ty::INT, &[]),
        method(i, "is_empty", Ty::BOOL, &[]),
        method_defaults(
            i,
            "substr",
            Ty::STRING,
            &[("from", Ty::INT, false), ("len", Ty::INT, true)],
        ),
        method(i, "split", ty_named(i, "PackedStringArray"), &[("delimiter", Ty::STRING)]),
        method(i, "begins_with", Ty::BOOL, &[("text", Ty::STRING)]),
        method(i, "ends_with", Ty::BOOL, &[("text", Ty::STRING)]),
        method(i, "contains", Ty::BOOL, &[("what", Ty::STRING)]),
        method(i, "find", Ty::INT, &[("what", Ty::STRING)]),
        method(i, "to_int", Ty::INT, &[]),
        method(i, "to_float", Ty::FLOAT, &[]),
        method(i, "to_lower", Ty::STRING, &[]),
        method(i, "to_upper", Ty::STRING, &[]),
        method(i, "strip_edges", Ty::STRING, &[]),
        method(i, "capitalize", Ty::STRING, &[]),
        method(i, "format", Ty::STRING, &[("values", Ty::Variant)]),
    ];
    catalog.add_type(string);

    catalog.add_type(TypeInfo::new(i.intern("StringName"), None));
    catalog.add_type(TypeInfo::new(i.intern("NodePath"), None));
    catalog.add_type(TypeInfo::new(i.intern("Int"), None));
    catalog.add_type(TypeInfo::new(i.intern("Float"), None));
    catalog.add_type(TypeInfo::new(i.intern("Bool"), None));
    catalog.add_type(TypeInfo::new(i.intern("Range"), None));

    let mut callable_info = TypeInfo::new(i.intern("Callable"), None);
    callable_info.members = vec![
        vararg_method(i, "call", variant.clone()),
        vararg_method(i, "bind", callable.clone()),
        method(i, "is_valid", Ty::BOOL, &[]),
        method(i, "get_method", Ty::STRING_NAME, &[]),
    ];
    catalog.add_type(callable_info);

    let mut signal_info = TypeInfo::new(i.intern("Signal"), None);
    signal_info.members = vec![
        vararg_method(i, "emit", Ty::Null),
        method(i, "connect", Ty::INT, &[("callable", callable.clone())]),
        method(i, "is_null", Ty::BOOL, &[]),
    ];
    catalog.add_type(signal_info);

    // ----- Non-container classes the resolver must tell apart -----

    let mut image = TypeInfo::new(i.intern("Image"), Some(i.intern("Resource")));
    image.members = vec![
        method(i, "fill", Ty::Null, &[("color", ty_named(i, "Color"))]),
        method(i, "get_size", ty_named(i, "Vector2"), &[]),
        method(i, "get_width", Ty::INT, &[]),
        method(i, "get_height", Ty::INT, &[]),
    ];
    catalog.add_type(image);

    let mut xml = TypeInfo::new(i.intern("XMLParser"), Some(i.intern("RefCounted")));
    xml.members = vec![
        method(i, "read", Ty::INT, &[]),
        method(i, "get_node_name", Ty::STRING, &[]),
        method(i, "has_attribute", Ty::BOOL, &[("name", Ty::STRING)]),
    ];
    catalog.add_type(xml);

    // ----- Singletons -----

    let mut os = TypeInfo::new(i.intern("OS"), Some(i.intern("Object")));
    os.members = vec![
        method(i, "get_name", Ty::STRING, &[]),
        method(i, "get_environment", Ty::STRING, &[("variable", Ty::STRING)]),
    ];
    catalog.add_type(os);
    catalog.mark_singleton(i.intern("OS"));

    let mut engine = TypeInfo::new(i.intern("Engine"), Some(i.intern("Object")));
    engine.members = vec![
        method(i, "get_version_info", ty_named(i, "Dictionary"), &[]),
        method(i, "get_frames_per_second", Ty::FLOAT, &[]),
    ];
    catalog.add_type(engine);
    catalog.mark_singleton(i.intern("Engine"));

    let mut input = TypeInfo::new(i.intern("Input"), Some(i.intern("Object")));
    input.members = vec![
        method(
            i,
            "is_action_pressed",
            Ty::BOOL,
            &[("action", Ty::STRING_NAME)],
        ),
        method(
            i,
            "get_axis",
            Ty::FLOAT,
            &[("negative", Ty::STRING_NAME), ("positive", Ty::STRING_NAME)],
        ),
    ];
    catalog.add_type(input);
    catalog.mark_singleton(i.intern("Input"));

    // ----- Global functions -----

    catalog.add_global_function(vararg_method(i, "print", Ty::Null));
    catalog.add_global_function(vararg_method(i, "printerr", Ty::Null));
    catalog.add_global_function(vararg_method(i, "push_error", Ty::Null));
    catalog.add_global_function(vararg_method(i, "push_warning", Ty::Null));
    catalog.add_global_function(method(i, "len", Ty::INT, &[("value", Ty::Variant)]));
    catalog.add_global_function(method_defaults(
        i,
        "range",
        ty_named(i, "Range"),
        &[
            ("from", Ty::INT, false),
            ("to", Ty::INT, true),
            ("step", Ty::INT, true),
        ],
    ));
    catalog.add_global_function(method(i, "typeof", Ty::INT, &[("value", Ty::Variant)]));
    catalog.add_global_function(method(i, "str", Ty::STRING, &[("value", Ty::Variant)]));
    catalog.add_global_function(method(i, "abs", variant.clone(), &[("value", Ty::Variant)]));
    catalog.add_global_function(method(i, "floor", Ty::FLOAT, &[("value", Ty::FLOAT)]));
    catalog.add_global_function(method(i, "randi", Ty::INT, &[]));
    catalog.add_global_function(method(i, "randf", Ty::FLOAT, &[]));
    catalog.add_global_function(method(
        i,
        "is_instance_valid",
        Ty::BOOL,
        &[("instance", Ty::Variant)],
    ));
    catalog.add_global_function(method(
        i,
        "load",
        ty_named(i, "Resource"),
        &[("path", Ty::STRING)],
    ));

    catalog.seal();
    catalog
}

#[cfg(test)]
#[path = "../tests/builtins_tests.rs"]
mod tests;
