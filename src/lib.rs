//! Orthogonal T-diagram tree layout with population-based bend optimization.
//!
//! A rooted tree, described by flat parent-before-child records, is laid out
//! with strictly axis-aligned branches: every child turns left or right off
//! its parent's branch. The optimizer then searches for extra bend points
//! that minimize a weighted cost of segment crossings, bend count, and
//! aspect-ratio deviation.
//!
//! Typical flow:
//!
//! ```ignore
//! let layout = TreeBuilder::new().build(&nodes)?;
//! let mut optimizer = Optimizer::new(layout, weights, settings)?;
//! optimizer.learn(50, |_, _| true, &mut NoopObserver)?;
//! let geometry = optimizer.best().unwrap().engine.layout().geometry_map();
//! ```

pub mod arena;
pub mod builder;
pub mod config;
pub mod cost;
pub mod errors;
pub mod intersect;
pub mod layout;
pub mod node;
pub mod optimize;
pub mod util;

pub use builder::TreeBuilder;
pub use config::{CostWeights, Margins, OptimizerSettings, Settings};
pub use cost::{BendMap, CostBreakdown, CostEngine};
pub use errors::{LayoutError, LayoutResult};
pub use layout::{Bounds, GeometryMap, GeometryRecord, TreeLayout};
pub use node::{Direction, NodeSpec, Orientation, Point};
pub use optimize::{NoopObserver, Optimizer, PhaseObserver, Specimen};
