use thiserror::Error;

/// Errors raised by tree building, geometry derivation, and optimization.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("empty node list")]
    EmptyInput,

    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    #[error("node {node} references unknown parent {parent} (parents must precede children)")]
    UnknownParent { node: String, parent: String },

    #[error("multiple roots: {first} and {second}")]
    MultipleRoots { first: String, second: String },

    #[error("unknown node in bend map: {0}")]
    UnknownNode(String),

    #[error("invalid bend fraction {fraction} for node {node}: must lie in (0, 1)")]
    InvalidBend { node: String, fraction: f64 },

    #[error("degenerate geometry: canvas is {width}x{height}")]
    DegenerateGeometry { width: f64, height: f64 },

    #[error("invalid optimizer settings: {0}")]
    InvalidSettings(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("internal layout operation failed: {0}")]
    InternalError(String),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
