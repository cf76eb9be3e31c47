//! Tests for intersection counting on laid-out trees.

use tdiag::{CostEngine, Direction, NodeSpec, TreeBuilder};

fn node(name: &str, parent: Option<&str>, direction: Direction, length: f64, seq: usize) -> NodeSpec {
    NodeSpec::new(name, parent, direction, length, seq)
}

fn engine(specs: &[NodeSpec]) -> CostEngine {
    CostEngine::new(TreeBuilder::new().build(specs).unwrap())
}

#[test]
fn given_two_level_tree_when_counting_then_zero_intersections() {
    // Arrange: child attaches at the root tip, a touch, not a crossing
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("root"), Direction::Right, 50.0, 0),
    ];

    // Act / Assert
    assert_eq!(engine(&specs).intersections(), 0);
}

#[test]
fn given_siblings_at_distinct_offsets_when_counting_then_no_overlap() {
    // Arrange: both children turn right but attach at different heights
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("root"), Direction::Right, 50.0, 0).with_branch_at(40.0),
        node("b", Some("root"), Direction::Right, 50.0, 1).with_branch_at(80.0),
    ];

    // Act / Assert
    assert_eq!(engine(&specs).intersections(), 0);
}

#[test]
fn given_siblings_forced_onto_same_offset_when_counting_then_overlap_detected() {
    // Arrange: equal attachment points put both branches on one line
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("root"), Direction::Right, 50.0, 0).with_branch_at(60.0),
        node("b", Some("root"), Direction::Right, 50.0, 1).with_branch_at(60.0),
    ];

    // Act / Assert
    assert!(engine(&specs).intersections() > 0);
}

#[test]
fn given_branch_crossing_a_sibling_when_counting_then_crossing_detected() {
    // Arrange: "a" turns right at height 50 and runs rightwards; "b" attaches
    // further up, turns left (pointing down) and cuts straight through "a".
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("root"), Direction::Right, 50.0, 0).with_branch_at(50.0),
        node("b", Some("root"), Direction::Right, 80.0, 1).with_branch_at(90.0),
        node("b1", Some("b"), Direction::Right, 60.0, 0).with_branch_at(20.0),
    ];
    // b runs along y = -90 to the right; b1 attaches at (20, -90) and turns
    // down, spanning y -90..-30, crossing a's branch at y = -50.

    // Act / Assert
    assert_eq!(engine(&specs).intersections(), 1);
}

#[test]
fn given_permuted_deck_when_counting_then_same_total() {
    // Arrange: same tree, sibling records swapped (parent-before-child kept)
    let original = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("root"), Direction::Right, 50.0, 0).with_branch_at(40.0),
        node("b", Some("root"), Direction::Right, 50.0, 1).with_branch_at(80.0),
        node("a1", Some("a"), Direction::Left, 30.0, 0).with_branch_at(10.0),
    ];
    let permuted = vec![
        original[0].clone(),
        original[2].clone(),
        original[1].clone(),
        original[3].clone(),
    ];

    // Act / Assert
    assert_eq!(
        engine(&original).intersections(),
        engine(&permuted).intersections()
    );
}
