//! Cost engine: crossing counts, scalar layout cost, and bend insertion.

use std::collections::BTreeMap;

use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::arena::GeometryNode;
use crate::builder::TreeBuilder;
use crate::config::CostWeights;
use crate::errors::{LayoutError, LayoutResult};
use crate::intersect;
use crate::layout::TreeLayout;
use crate::node::Orientation;
use crate::util::search::lower_bound;

/// Node name → bend fraction in (0, 1) along that node's branch.
pub type BendMap = BTreeMap<String, f64>;

/// Additive decomposition of the layout cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Squared number of introduced bends.
    pub branches_factor: f64,
    /// Raw segment intersection count.
    pub intersection_factor: f64,
    /// `exp(ratio deviation) - 1`, zero at exact aspect-ratio match.
    pub ar_factor: f64,
    /// Weighted total; zero only at zero bends, zero crossings, exact ratio.
    pub total: f64,
}

/// Wraps a laid-out tree and evaluates candidate bend placements on it.
///
/// Bend insertion mutates the geometry store in place, then rebuilds a
/// validated parent-before-child ordering and recomputes all coordinates
/// from scratch.
#[derive(Debug, Clone)]
pub struct CostEngine {
    layout: TreeLayout,
    bends_applied: usize,
    bend_seq: u64,
}

impl CostEngine {
    pub fn new(layout: TreeLayout) -> Self {
        Self {
            layout,
            bends_applied: 0,
            bend_seq: 0,
        }
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    /// Number of bends introduced by the last `introduce_breaks` call.
    pub fn bends_applied(&self) -> usize {
        self.bends_applied
    }

    /// Total segment intersections in the current geometry.
    #[instrument(level = "debug", skip(self))]
    pub fn intersections(&self) -> usize {
        intersect::count_intersections(self.layout.arena())
    }

    /// Scalar cost of the current geometry under the given weights.
    ///
    /// Fails with `DegenerateGeometry` when either canvas dimension is zero
    /// rather than propagating non-finite ratios.
    pub fn cost(&self, weights: &CostWeights) -> LayoutResult<CostBreakdown> {
        let width = self.layout.width();
        let height = self.layout.height();
        if width <= 0.0 || height <= 0.0 {
            return Err(LayoutError::DegenerateGeometry { width, height });
        }

        let ar = width / height;
        let pref = weights.preferred_aspect_ratio;
        let ratio_gap = (ar.max(pref) / ar.min(pref) - 1.0).exp();

        let branches_factor = (self.bends_applied * self.bends_applied) as f64;
        let intersection_factor = self.intersections() as f64;
        let ar_factor = ratio_gap - 1.0;
        let total = weights.alpha * branches_factor
            + weights.beta * intersection_factor
            + ratio_gap.powf(weights.gamma)
            - 1.0;

        Ok(CostBreakdown {
            branches_factor,
            intersection_factor,
            ar_factor,
            total,
        })
    }

    /// Split branches at the given fractional positions.
    ///
    /// For each `(name, fraction)` entry the node's branch is cut at
    /// `length · fraction`: the node keeps the near piece, a fresh break
    /// node takes the far piece plus every child attached at or beyond the
    /// cut (the segment-end marker stays with the node). Break nodes always
    /// point `Right` when the split branch was horizontal, `Up` otherwise.
    /// Afterwards the whole tree is re-derived and recomputed.
    #[instrument(level = "debug", skip(self, bends), fields(bends = bends.len()))]
    pub fn introduce_breaks(&mut self, bends: &BendMap) -> LayoutResult<()> {
        for (name, &fraction) in bends {
            self.split_branch(name, fraction)?;
        }
        self.bends_applied = bends.len();

        let specs = self.layout.to_specs();
        let margins = self.layout.margins();
        self.layout = TreeBuilder::with_margins(margins).build(&specs)?;
        debug!(bends = self.bends_applied, "geometry rebuilt after bends");
        Ok(())
    }

    fn split_branch(&mut self, name: &str, fraction: f64) -> LayoutResult<()> {
        let arena = self.layout.arena_mut();

        let node_idx = arena
            .by_name(name)
            .filter(|&idx| arena.get_node(idx).is_some_and(|n| !n.hidden))
            .ok_or_else(|| LayoutError::UnknownNode(name.to_string()))?;
        if !(0.0 < fraction && fraction < 1.0) {
            return Err(LayoutError::InvalidBend {
                node: name.to_string(),
                fraction,
            });
        }

        let (coords, orientation, original_length, children) = {
            let node = arena
                .get_node(node_idx)
                .ok_or_else(|| LayoutError::InternalError(format!("missing node {name}")))?;
            (
                node.coordinates,
                node.orientation,
                node.length,
                node.children.clone(),
            )
        };
        let cut = original_length * fraction;

        // Real children sorted by attachment distance; the Manhattan distance
        // to the parent coordinate is exact for axis-aligned attachment.
        let real: Vec<(Index, f64)> = children
            .iter()
            .filter_map(|&c| arena.get_node(c).map(|n| (c, n)))
            .filter(|(_, n)| !n.hidden)
            .map(|(c, n)| (c, coords.manhattan(n.coordinates)))
            .collect();
        let split = lower_bound(real.len(), |i| real[i].1 < cut);
        let moved: Vec<Index> = real[split..].iter().map(|&(c, _)| c).collect();

        // Shrink the original branch and detach the moved children.
        if let Some(node) = arena.get_node_mut(node_idx) {
            node.length = cut;
            node.children.retain(|c| !moved.contains(c));
        }

        let bend_orientation = if orientation.is_horizontal() {
            Orientation::Right
        } else {
            Orientation::Up
        };
        let bend_name = format!("bend-{}", self.bend_seq);
        self.bend_seq += 1;

        let bend_idx = arena.insert_child_at(
            GeometryNode {
                name: bend_name,
                coordinates: orientation.advance(coords, cut),
                orientation: bend_orientation,
                length: original_length - cut,
                parent: Some(node_idx),
                children: Vec::new(),
                seq: split,
                hidden: false,
                branch_at: Some(cut),
                properties: BTreeMap::new(),
            },
            split,
        );

        for &(child_idx, dist) in &real[split..] {
            if let Some(child) = arena.get_node_mut(child_idx) {
                child.parent = Some(bend_idx);
                // Explicit offsets are rebased onto the break node; children
                // placed by ordinal re-distribute along it on rebuild.
                if child.branch_at.is_some() {
                    child.branch_at = Some(dist - cut);
                }
            }
            if let Some(bend) = arena.get_node_mut(bend_idx) {
                bend.children.push(child_idx);
            }
        }

        Ok(())
    }
}
