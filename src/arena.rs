use std::collections::{BTreeMap, HashMap};
use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;

use crate::node::{Orientation, Point};

/// One node of the laid-out diagram.
///
/// Real nodes carry a branch; every real node additionally owns one hidden,
/// zero-length "segment end" child marking the tip of its branch, so each
/// branch is an explicit drawable segment from the node's coordinate to the
/// end child's coordinate.
#[derive(Debug, Clone)]
pub struct GeometryNode {
    /// Unique node name; break nodes get synthesized names.
    pub name: String,
    /// Absolute canvas position of the branch origin.
    pub coordinates: Point,
    /// Cardinal direction the branch extends toward.
    pub orientation: Orientation,
    /// Branch length; zero for segment-end markers.
    pub length: f64,
    /// Parent node in the arena, None for the root.
    pub parent: Option<Index>,
    /// Ordered child nodes; the segment-end marker is always last.
    pub children: Vec<Index>,
    /// Input ordinal among siblings; drives uniform attachment placement
    /// when `branch_at` is absent.
    pub seq: usize,
    /// Segment-end markers are hidden from layout consumers.
    pub hidden: bool,
    /// Attachment distance along the parent's branch, when explicit.
    pub branch_at: Option<f64>,
    /// Opaque payload, passed through untouched.
    pub properties: BTreeMap<String, String>,
}

impl fmt::Display for GeometryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.1},{:.1}) {} len={:.1}",
            self.name, self.coordinates.x, self.coordinates.y, self.orientation, self.length
        )
    }
}

/// Arena-based store for diagram geometry.
///
/// Uses a generational arena for stable node indices and O(1) lookups, plus
/// a name index because nodes are identified by name across rebuilds, not by
/// object identity.
#[derive(Debug, Clone, Default)]
pub struct GeometryArena {
    arena: Arena<GeometryNode>,
    names: HashMap<String, Index>,
    root: Option<Index>,
}

impl GeometryArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            names: HashMap::new(),
            root: None,
        }
    }

    /// Insert a node and attach it to its parent's child sequence.
    ///
    /// The first parentless node becomes the root.
    #[instrument(level = "trace", skip(self, node), fields(name = %node.name))]
    pub fn insert_node(&mut self, node: GeometryNode) -> Index {
        let parent = node.parent;
        let name = node.name.clone();
        let node_idx = self.arena.insert(node);
        self.names.insert(name, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    /// Insert a node as a child at a specific position in the parent's
    /// child sequence. Used by bend insertion, which must place break nodes
    /// before the moved children and the segment-end marker.
    #[instrument(level = "trace", skip(self, node), fields(name = %node.name))]
    pub fn insert_child_at(&mut self, node: GeometryNode, position: usize) -> Index {
        let parent = node.parent;
        let name = node.name.clone();
        let node_idx = self.arena.insert(node);
        self.names.insert(name, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                let at = position.min(parent.children.len());
                parent.children.insert(at, node_idx);
            }
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&GeometryNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut GeometryNode> {
        self.arena.get_mut(idx)
    }

    pub fn by_name(&self, name: &str) -> Option<Index> {
        self.names.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Number of nodes, hidden segment-end markers included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Depth-first preorder traversal; parents always precede children, so
    /// the iteration order doubles as a topological order.
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    /// Names of all visible (non-hidden) nodes in preorder.
    #[instrument(level = "debug", skip(self))]
    pub fn visible_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, n)| !n.hidden)
            .map(|(_, n)| n.name.clone())
            .collect()
    }

    /// ASCII rendering of the visible tree for diagnostics.
    pub fn ascii_tree(&self) -> String {
        match self.root {
            Some(root) => self.subtree_display(root).to_string(),
            None => String::new(),
        }
    }

    fn subtree_display(&self, idx: Index) -> Tree<String> {
        let Some(node) = self.arena.get(idx) else {
            return Tree::new(String::new());
        };
        let leaves: Vec<_> = node
            .children
            .iter()
            .filter(|&&c| self.arena.get(c).is_some_and(|n| !n.hidden))
            .map(|&c| self.subtree_display(c))
            .collect();
        Tree::new(node.to_string()).with_leaves(leaves)
    }
}

pub struct PreOrderIter<'a> {
    arena: &'a GeometryArena,
    stack: Vec<Index>,
}

impl<'a> PreOrderIter<'a> {
    fn new(arena: &'a GeometryArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (Index, &'a GeometryNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
