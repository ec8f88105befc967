use super::*;

const SOURCE: &str = "extends Node\n\nfunc _ready():\n\tpass\n";

#[test]
fn test_offset_to_position() {
    let map = LineMap::build(SOURCE);
    assert_eq!(map.offset_to_position(0), Position::new(0, 0));
    assert_eq!(map.offset_to_position(8), Position::new(0, 8));
    // First byte after the blank line
    assert_eq!(map.offset_to_position(14), Position::new(2, 0));
}

#[test]
fn test_position_to_offset_round_trip() {
    let map = LineMap::build(SOURCE);
    for offset in [0u32, 5, 13, 14, 20, 30] {
        let pos = map.offset_to_position(offset);
        assert_eq!(map.position_to_offset(pos), Some(offset));
    }
}

#[test]
fn test_position_past_last_line() {
    let map = LineMap::build("one\ntwo");
    assert_eq!(map.line_count(), 2);
    assert_eq!(map.position_to_offset(Position::new(5, 0)), None);
}

#[test]
fn test_empty_source() {
    let map = LineMap::build("");
    assert_eq!(map.line_count(), 1);
    assert_eq!(map.offset_to_position(0), Position::new(0, 0));
}
