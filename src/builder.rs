//! Tree builder: folds a parent-before-child node list into diagram geometry.

use tracing::instrument;

use crate::arena::{GeometryArena, GeometryNode};
use crate::config::Margins;
use crate::errors::{LayoutError, LayoutResult};
use crate::layout::TreeLayout;
use crate::node::{NodeSpec, Orientation, Point};

/// Constructs a laid-out tree from flat input records.
///
/// The input list must be ordered parent-before-child; each record's parent
/// has to appear earlier in the list. Violations fail fast instead of
/// leaving unlinked nodes behind.
pub struct TreeBuilder {
    margins: Margins,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            margins: Margins::default(),
        }
    }

    pub fn with_margins(margins: Margins) -> Self {
        Self { margins }
    }

    /// Fold the record list into a tree and derive its geometry.
    #[instrument(level = "debug", skip(self, specs), fields(nodes = specs.len()))]
    pub fn build(&self, specs: &[NodeSpec]) -> LayoutResult<TreeLayout> {
        if specs.is_empty() {
            return Err(LayoutError::EmptyInput);
        }

        let mut arena = GeometryArena::new();
        let mut root_name: Option<String> = None;

        for spec in specs {
            if arena.contains_name(&spec.name) {
                return Err(LayoutError::DuplicateNode(spec.name.clone()));
            }

            // An empty parent string marks the root, same as a missing one.
            let parent_name = spec.parent.as_deref().filter(|p| !p.is_empty());

            let (parent_idx, orientation) = match parent_name {
                None => {
                    if let Some(first) = &root_name {
                        return Err(LayoutError::MultipleRoots {
                            first: first.clone(),
                            second: spec.name.clone(),
                        });
                    }
                    root_name = Some(spec.name.clone());
                    (None, Orientation::Up)
                }
                Some(parent) => {
                    let idx =
                        arena
                            .by_name(parent)
                            .ok_or_else(|| LayoutError::UnknownParent {
                                node: spec.name.clone(),
                                parent: parent.to_string(),
                            })?;
                    let parent_orientation = arena
                        .get_node(idx)
                        .ok_or_else(|| {
                            LayoutError::InternalError(format!("missing parent node {parent}"))
                        })?
                        .orientation;
                    (Some(idx), parent_orientation.turned(spec.direction))
                }
            };

            arena.insert_node(GeometryNode {
                name: spec.name.clone(),
                coordinates: Point::origin(),
                orientation,
                length: spec.length,
                parent: parent_idx,
                children: Vec::new(),
                seq: spec.seq,
                hidden: false,
                branch_at: spec.branch_at,
                properties: spec.properties.clone(),
            });
        }

        TreeLayout::new(arena, self.margins)
    }
}
