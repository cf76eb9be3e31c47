//! Tests for TreeBuilder structural validation

use tdiag::{Direction, LayoutError, NodeSpec, TreeBuilder};

fn node(name: &str, parent: Option<&str>, direction: Direction, length: f64, seq: usize) -> NodeSpec {
    NodeSpec::new(name, parent, direction, length, seq)
}

#[test]
fn given_valid_deck_when_building_then_creates_layout() {
    // Arrange
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("root"), Direction::Right, 50.0, 0),
        node("b", Some("root"), Direction::Left, 50.0, 1),
    ];

    // Act
    let layout = TreeBuilder::new().build(&specs).unwrap();

    // Assert
    let map = layout.geometry_map();
    assert!(map.contains_key("root"));
    assert!(map.contains_key("a"));
    assert!(map.contains_key("b"));
    assert_eq!(map["a"].parent.as_deref(), Some("root"));
}

#[test]
fn given_empty_deck_when_building_then_errors() {
    // Act
    let result = TreeBuilder::new().build(&[]);

    // Assert
    assert!(matches!(result, Err(LayoutError::EmptyInput)));
}

#[test]
fn given_duplicate_names_when_building_then_errors() {
    // Arrange
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("root"), Direction::Right, 50.0, 0),
        node("a", Some("root"), Direction::Left, 50.0, 1),
    ];

    // Act
    let result = TreeBuilder::new().build(&specs);

    // Assert
    assert!(matches!(result, Err(LayoutError::DuplicateNode(name)) if name == "a"));
}

#[test]
fn given_child_before_parent_when_building_then_errors() {
    // Arrange: "a" references "late" which only appears afterwards
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("a", Some("late"), Direction::Right, 50.0, 0),
        node("late", Some("root"), Direction::Right, 50.0, 1),
    ];

    // Act
    let result = TreeBuilder::new().build(&specs);

    // Assert
    assert!(matches!(
        result,
        Err(LayoutError::UnknownParent { node, parent }) if node == "a" && parent == "late"
    ));
}

#[test]
fn given_two_parentless_nodes_when_building_then_errors() {
    // Arrange
    let specs = vec![
        node("root", None, Direction::Straight, 100.0, 0),
        node("stray", None, Direction::Straight, 50.0, 0),
    ];

    // Act
    let result = TreeBuilder::new().build(&specs);

    // Assert
    assert!(matches!(
        result,
        Err(LayoutError::MultipleRoots { first, second }) if first == "root" && second == "stray"
    ));
}

#[test]
fn given_empty_parent_string_when_building_then_treated_as_root() {
    // Arrange
    let mut root = node("root", None, Direction::Straight, 100.0, 0);
    root.parent = Some(String::new());

    // Act
    let layout = TreeBuilder::new().build(&[root]).unwrap();

    // Assert
    assert!(layout.geometry_map()["root"].parent.is_none());
}
