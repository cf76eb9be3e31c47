//! Core entities: input node records and the orientation algebra.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Relative turn a branch takes from its parent's orientation.
///
/// Input decks use `Left` and `Right` only. `Straight` and `Reverse` appear
/// when a node list is re-derived from bend-mutated geometry: a break node's
/// canonical orientation can be collinear with, or opposite to, its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Left,
    Straight,
    Reverse,
}

impl Direction {
    /// Number of clockwise quarter turns applied to the parent orientation.
    pub fn steps(self) -> u8 {
        match self {
            Direction::Straight => 0,
            Direction::Right => 1,
            Direction::Reverse => 2,
            Direction::Left => 3,
        }
    }

    /// Recover the turn from a parent/child orientation pair.
    pub fn between(parent: Orientation, child: Orientation) -> Self {
        match (child.encode() + 4 - parent.encode()) % 4 {
            0 => Direction::Straight,
            1 => Direction::Right,
            2 => Direction::Reverse,
            _ => Direction::Left,
        }
    }
}

/// Cardinal direction a branch extends toward.
///
/// Encoded 0..3 so that clockwise rotation is `(d+1) % 4`, counterclockwise
/// `(d+3) % 4`, and parity `d % 2` splits the vertical class (`Up`/`Down`)
/// from the horizontal class (`Right`/`Left`). Cost and intersection logic
/// rely on this encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    pub fn encode(self) -> u8 {
        match self {
            Orientation::Up => 0,
            Orientation::Right => 1,
            Orientation::Down => 2,
            Orientation::Left => 3,
        }
    }

    pub fn decode(d: u8) -> Self {
        match d % 4 {
            0 => Orientation::Up,
            1 => Orientation::Right,
            2 => Orientation::Down,
            _ => Orientation::Left,
        }
    }

    /// One quarter turn clockwise.
    pub fn clockwise(self) -> Self {
        Self::decode(self.encode() + 1)
    }

    /// One quarter turn counterclockwise.
    pub fn counterclockwise(self) -> Self {
        Self::decode(self.encode() + 3)
    }

    /// Rotate by a relative turn.
    pub fn turned(self, direction: Direction) -> Self {
        Self::decode(self.encode() + direction.steps())
    }

    pub fn is_horizontal(self) -> bool {
        self.encode() % 2 == 1
    }

    /// Advance a point by `distance` along this orientation.
    ///
    /// Screen coordinates: y grows downward, so `Up` decreases y.
    pub fn advance(self, point: Point, distance: f64) -> Point {
        match self {
            Orientation::Up => Point::new(point.x, point.y - distance),
            Orientation::Down => Point::new(point.x, point.y + distance),
            Orientation::Right => Point::new(point.x + distance, point.y),
            Orientation::Left => Point::new(point.x - distance, point.y),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::Up => "up",
            Orientation::Right => "right",
            Orientation::Down => "down",
            Orientation::Left => "left",
        };
        write!(f, "{}", s)
    }
}

/// 2D point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// L1 distance, the along-branch metric for axis-aligned trees.
    pub fn manhattan(self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// One input record of a diagram tree.
///
/// Records must arrive parent-before-child: each node's parent has to appear
/// earlier in the list. The root is the single record with `parent: None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique node identifier.
    pub name: String,
    /// Parent node name, `None` for the root.
    pub parent: Option<String>,
    /// Turn relative to the parent's orientation.
    pub direction: Direction,
    /// Branch length (positive).
    pub length: f64,
    /// Ordinal among siblings; drives uniform placement when `branch_at`
    /// is absent.
    pub seq: usize,
    /// Explicit attachment distance along the parent's branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_at: Option<f64>,
    /// Opaque payload, passed through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl NodeSpec {
    /// Convenience constructor for the common case.
    pub fn new(
        name: impl Into<String>,
        parent: Option<&str>,
        direction: Direction,
        length: f64,
        seq: usize,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(|p| p.to_string()),
            direction,
            length,
            seq,
            branch_at: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_branch_at(mut self, branch_at: f64) -> Self {
        self.branch_at = Some(branch_at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_any_orientation_when_turning_clockwise_thrice_then_equals_counterclockwise() {
        for d in 0..4u8 {
            let o = Orientation::decode(d);
            let thrice = o.clockwise().clockwise().clockwise();
            assert_eq!(thrice, o.counterclockwise());
        }
    }

    #[test]
    fn given_orientation_pairs_when_recovering_direction_then_round_trips() {
        for d in 0..4u8 {
            let parent = Orientation::decode(d);
            for turn in [
                Direction::Straight,
                Direction::Right,
                Direction::Reverse,
                Direction::Left,
            ] {
                let child = parent.turned(turn);
                assert_eq!(Direction::between(parent, child), turn);
            }
        }
    }

    #[test]
    fn given_parity_when_classifying_then_right_left_are_horizontal() {
        assert!(Orientation::Right.is_horizontal());
        assert!(Orientation::Left.is_horizontal());
        assert!(!Orientation::Up.is_horizontal());
        assert!(!Orientation::Down.is_horizontal());
    }

    #[test]
    fn given_up_orientation_when_advancing_then_y_decreases() {
        let p = Orientation::Up.advance(Point::origin(), 10.0);
        assert_eq!(p, Point::new(0.0, -10.0));
    }
}
