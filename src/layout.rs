//! Absolute geometry derivation: coordinates, orientation, canvas bounds,
//! and the flattened geometry map consumed by renderers.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use generational_arena::Index;
use serde::Serialize;
use tracing::instrument;

use crate::arena::{GeometryArena, GeometryNode};
use crate::config::Margins;
use crate::errors::{LayoutError, LayoutResult};
use crate::node::{Direction, NodeSpec, Orientation, Point};

/// Suffix of the synthetic segment-end marker appended to every real node.
pub const SEGMENT_END_SUFFIX: &str = "::end";

/// Bounding box over all node coordinates, branch tips included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

/// Renderer-facing snapshot of one geometry node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryRecord {
    pub coordinates: Point,
    pub orientation: Orientation,
    pub length: f64,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub hidden: bool,
    pub branch_at: Option<f64>,
    pub properties: BTreeMap<String, String>,
}

/// Flattened geometry keyed by node name; BTreeMap keeps iteration
/// deterministic.
pub type GeometryMap = BTreeMap<String, GeometryRecord>;

/// A rooted tree with fully derived orthogonal geometry.
///
/// Construction assigns every node its absolute coordinates and appends the
/// segment-end markers. Derived queries (bounds, canvas size, geometry map)
/// are computed on first access and cached; structural mutation always goes
/// through a rebuild into a fresh `TreeLayout`, so caches never go stale.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    arena: GeometryArena,
    margins: Margins,
    bounds: OnceLock<Bounds>,
    map: OnceLock<GeometryMap>,
}

impl TreeLayout {
    /// Derive coordinates for a structurally complete arena.
    #[instrument(level = "debug", skip(arena), fields(nodes = arena.len()))]
    pub(crate) fn new(mut arena: GeometryArena, margins: Margins) -> LayoutResult<Self> {
        let root = arena
            .root()
            .ok_or_else(|| LayoutError::InternalError("tree has no root".to_string()))?;

        if let Some(node) = arena.get_node_mut(root) {
            node.coordinates = Point::origin();
        }
        assign_coordinates(&mut arena, root);

        Ok(Self {
            arena,
            margins,
            bounds: OnceLock::new(),
            map: OnceLock::new(),
        })
    }

    pub fn arena(&self) -> &GeometryArena {
        &self.arena
    }

    /// Mutable arena access for bend insertion. Callers must rebuild into a
    /// fresh `TreeLayout` (via `to_specs`) before serving derived queries.
    pub(crate) fn arena_mut(&mut self) -> &mut GeometryArena {
        &mut self.arena
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Bounding box over every node, segment-end markers included.
    pub fn bounds(&self) -> Bounds {
        *self.bounds.get_or_init(|| {
            let mut min = Point::new(f64::INFINITY, f64::INFINITY);
            let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
            for (_, node) in self.arena.iter() {
                min.x = min.x.min(node.coordinates.x);
                min.y = min.y.min(node.coordinates.y);
                max.x = max.x.max(node.coordinates.x);
                max.y = max.y.max(node.coordinates.y);
            }
            Bounds { min, max }
        })
    }

    /// Canvas width: geometry extent plus margins on both sides.
    pub fn width(&self) -> f64 {
        let b = self.bounds();
        b.max.x - b.min.x + 2.0 * self.margins.x
    }

    /// Canvas height: geometry extent plus margins on both sides.
    pub fn height(&self) -> f64 {
        let b = self.bounds();
        b.max.y - b.min.y + 2.0 * self.margins.y
    }

    /// SVG-style viewbox string: `"min-x min-y width height"`.
    pub fn view_box(&self) -> String {
        let b = self.bounds();
        format!(
            "{} {} {} {}",
            b.min.x - self.margins.x,
            b.min.y - self.margins.y,
            self.width(),
            self.height()
        )
    }

    /// Flattened name-keyed geometry, produced by a single traversal from
    /// the root.
    pub fn geometry_map(&self) -> &GeometryMap {
        self.map.get_or_init(|| {
            let mut map = GeometryMap::new();
            for (_, node) in self.arena.iter() {
                map.insert(
                    node.name.clone(),
                    GeometryRecord {
                        coordinates: node.coordinates,
                        orientation: node.orientation,
                        length: node.length,
                        parent: node
                            .parent
                            .and_then(|p| self.arena.get_node(p))
                            .map(|p| p.name.clone()),
                        children: node
                            .children
                            .iter()
                            .filter_map(|&c| self.arena.get_node(c))
                            .map(|c| c.name.clone())
                            .collect(),
                        hidden: node.hidden,
                        branch_at: node.branch_at,
                        properties: node.properties.clone(),
                    },
                );
            }
            map
        })
    }

    /// Re-derive a parent-before-child record list from the (possibly
    /// mutated) arena.
    ///
    /// Preorder traversal gives an explicit topological order. Each child's
    /// direction is recovered from the orientation delta to its parent and
    /// its seq from the sibling position; stored `branch_at` values carry
    /// over verbatim. Children without an explicit attachment re-distribute
    /// uniformly along their (possibly reshaped) parent branch on rebuild.
    #[instrument(level = "debug", skip(self))]
    pub fn to_specs(&self) -> Vec<NodeSpec> {
        let mut specs = Vec::new();
        for (idx, node) in self.arena.iter() {
            if node.hidden {
                continue;
            }
            let spec = match node.parent.and_then(|p| self.arena.get_node(p).map(|n| (p, n))) {
                None => NodeSpec {
                    name: node.name.clone(),
                    parent: None,
                    direction: Direction::Straight,
                    length: node.length,
                    seq: 0,
                    branch_at: None,
                    properties: node.properties.clone(),
                },
                Some((_, parent)) => {
                    let seq = parent
                        .children
                        .iter()
                        .filter(|&&c| self.arena.get_node(c).is_some_and(|n| !n.hidden))
                        .position(|&c| c == idx)
                        .unwrap_or(0);
                    NodeSpec {
                        name: node.name.clone(),
                        parent: Some(parent.name.clone()),
                        direction: Direction::between(parent.orientation, node.orientation),
                        length: node.length,
                        seq,
                        branch_at: node.branch_at,
                        properties: node.properties.clone(),
                    }
                }
            };
            specs.push(spec);
        }
        specs
    }

    /// ASCII rendering of the visible tree for diagnostics.
    pub fn ascii_tree(&self) -> String {
        self.arena.ascii_tree()
    }
}

/// Recursive root-first coordinate assignment.
///
/// A child's attachment point advances along the parent's branch by its
/// explicit `branch_at`, or by `(seq+1)/sibling_count` of the parent length
/// (uniform placement). After all children are placed, the node's hidden
/// segment-end marker is appended at the branch tip.
fn assign_coordinates(arena: &mut GeometryArena, idx: Index) {
    let (name, coords, orientation, length, children) = match arena.get_node(idx) {
        Some(node) => (
            node.name.clone(),
            node.coordinates,
            node.orientation,
            node.length,
            node.children.clone(),
        ),
        None => return,
    };

    let sibling_count = children.len();
    for &child_idx in &children {
        let delta = match arena.get_node(child_idx) {
            Some(child) => child
                .branch_at
                .unwrap_or((child.seq + 1) as f64 / sibling_count as f64 * length),
            None => continue,
        };
        let child_coords = orientation.advance(coords, delta);
        if let Some(child) = arena.get_node_mut(child_idx) {
            child.coordinates = child_coords;
        }
        assign_coordinates(arena, child_idx);
    }

    arena.insert_node(GeometryNode {
        name: format!("{name}{SEGMENT_END_SUFFIX}"),
        coordinates: orientation.advance(coords, length),
        orientation,
        length: 0.0,
        parent: Some(idx),
        children: Vec::new(),
        seq: sibling_count,
        hidden: true,
        branch_at: None,
        properties: BTreeMap::new(),
    });
}
