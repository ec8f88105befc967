use super::*;

#[test]
fn test_span_contains() {
    let span = Span::new(10, 20);
    assert!(span.contains(10));
    assert!(span.contains(19));
    assert!(!span.contains(20));
    assert!(!span.contains(9));
}

#[test]
fn test_span_merge() {
    let a = Span::new(5, 10);
    let b = Span::new(8, 30);
    assert_eq!(a.merge(b), Span::new(5, 30));
    assert_eq!(b.merge(a), Span::new(5, 30));
}

#[test]
fn test_span_overlap_and_containment() {
    let outer = Span::new(0, 100);
    let inner = Span::new(40, 60);
    assert!(outer.contains_span(inner));
    assert!(!inner.contains_span(outer));
    assert!(outer.overlaps(inner));
    assert!(!Span::new(0, 10).overlaps(Span::new(10, 20)));
}

#[test]
fn test_dummy_span() {
    assert!(Span::dummy().is_dummy());
    assert!(!Span::new(0, 0).is_dummy());
    assert!(Span::at(7).is_empty());
    assert_eq!(Span::from_len(3, 4), Span::new(3, 7));
}
