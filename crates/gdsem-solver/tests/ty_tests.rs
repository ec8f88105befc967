use super::*;
use crate::union::UnionBuilder;
use gdsem_common::interner::ShardedInterner;

#[test]
fn test_render() {
    let interner = ShardedInterner::new();
    let node = Ty::Named(interner.intern("Node"));
    let array_int = Ty::generic(interner.intern("Array"), vec![Ty::INT]);
    let dict = Ty::generic(
        interner.intern("Dictionary"),
        vec![Ty::STRING, node.clone()],
    );
    assert_eq!(Ty::Variant.render(&interner), "Variant");
    assert_eq!(Ty::Null.render(&interner), "null");
    assert_eq!(node.render(&interner), "Node");
    assert_eq!(array_int.render(&interner), "Array[Int]");
    assert_eq!(dict.render(&interner), "Dictionary[String, Node]");
}

#[test]
fn test_render_union_is_canonical() {
    let interner = ShardedInterner::new();
    let mut a = UnionBuilder::new();
    a.add(Ty::STRING);
    a.add(Ty::INT);
    let mut b = UnionBuilder::new();
    b.add(Ty::INT);
    b.add(Ty::STRING);
    // Canonical member order makes rendering independent of insertion order.
    assert_eq!(a.build().render(&interner), b.build().render(&interner));
}

#[test]
fn test_members_view() {
    let mut builder = UnionBuilder::new();
    builder.add(Ty::INT);
    builder.add(Ty::Null);
    let union = builder.build();
    assert_eq!(union.members().len(), 2);
    assert_eq!(Ty::BOOL.members(), &[Ty::BOOL]);
}

#[test]
fn test_contains() {
    let mut builder = UnionBuilder::new();
    builder.add(Ty::INT);
    builder.add(Ty::STRING);
    let union = builder.build();
    assert!(union.contains(&Ty::INT));
    assert!(!union.contains(&Ty::BOOL));
    assert!(Ty::INT.contains(&Ty::INT));
}

#[test]
fn test_runtime_name() {
    let interner = ShardedInterner::new();
    let node_atom = interner.intern("Node");
    assert_eq!(Ty::Named(node_atom).runtime_name(&interner), Some(node_atom));
    let int_atom = Ty::INT.runtime_name(&interner).unwrap();
    assert_eq!(interner.resolve(int_atom).as_deref(), Some("Int"));
    assert_eq!(Ty::Variant.runtime_name(&interner), None);
    assert_eq!(Ty::Null.runtime_name(&interner), None);
    let generic = Ty::generic(interner.intern("Array"), vec![Ty::INT]);
    assert_eq!(
        generic.runtime_name(&interner),
        Some(interner.intern("Array"))
    );
}

#[test]
fn test_concreteness() {
    assert!(!Ty::Variant.is_concrete());
    assert!(Ty::Null.is_concrete());
    assert!(Ty::INT.is_concrete());
    assert!(Ty::INT.is_numeric());
    assert!(!Ty::STRING.is_numeric());
}
