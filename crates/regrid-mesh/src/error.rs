//! Error types for mesh construction and editing.

use std::error::Error;
use std::fmt;

use regrid_arena::ArenaError;
use regrid_core::Node;
use regrid_store::StoreError;

use crate::halfedge::RegridState;
use crate::valid::ValidityReport;

/// Errors arising from mesh construction, editing and traversal.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
    /// The manifold/embedding dimensions are out of range or unsupported.
    Dimensions {
        /// Topological dimension requested.
        manifold: u8,
        /// Ambient dimension requested.
        embedding: u8,
        /// What is wrong with the pair.
        reason: &'static str,
    },
    /// A remesh parameter is out of range.
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
    /// A directed edge is used by more than one triangle.
    NonManifold {
        /// Input index of the edge's first vertex.
        from: usize,
        /// Input index of the edge's second vertex.
        to: usize,
    },
    /// A boundary vertex joins two separate fans of triangles.
    NonManifoldVertex {
        /// Input index of the vertex.
        vertex: usize,
    },
    /// A triangle refers to a vertex out of range, or repeats one.
    BadIndex {
        /// Index of the triangle in the input.
        triangle: usize,
        /// The offending vertex index.
        index: usize,
    },
    /// An input vertex is used by no triangle.
    IsolatedVertex {
        /// Input index of the vertex.
        vertex: usize,
    },
    /// A face or collapse commit was requested on a half-edge that carries
    /// no matching pending edit.
    NotPending {
        /// The half-edge.
        hedge: Node,
        /// Its actual state.
        state: RegridState,
    },
    /// A face edit was requested on a boundary half-edge.
    Boundary {
        /// The half-edge.
        hedge: Node,
    },
    /// A face was re-triangulated before the other side of one of its
    /// split edges was split.
    UnpairedSplit {
        /// The split half-edge whose twin still spans the whole edge.
        hedge: Node,
    },
    /// An edit was requested on a half-edge already claimed by another edit.
    Busy {
        /// The half-edge.
        hedge: Node,
        /// Its actual state.
        state: RegridState,
    },
    /// A vertex or half-edge handle is not live.
    Stale {
        /// The dead handle.
        node: Node,
    },
    /// A ring or face walk did not close within its step guard.
    TraversalOverrun {
        /// Where the walk started.
        start: Node,
        /// The step guard that was exceeded.
        limit: usize,
    },
    /// The mesh failed its validity check.
    Invalid(ValidityReport),
    /// The underlying storage refused a request.
    Store(StoreError),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimensions {
                manifold,
                embedding,
                reason,
            } => write!(
                f,
                "unsupported dimensions (manifold {manifold}, embedding {embedding}): {reason}"
            ),
            Self::InvalidConfig { reason } => write!(f, "invalid remesh config: {reason}"),
            Self::NonManifold { from, to } => {
                write!(f, "directed edge {from} -> {to} is used by more than one triangle")
            }
            Self::NonManifoldVertex { vertex } => {
                write!(f, "boundary vertex {vertex} joins more than one fan")
            }
            Self::BadIndex { triangle, index } => {
                write!(f, "triangle {triangle}: bad vertex index {index}")
            }
            Self::IsolatedVertex { vertex } => write!(f, "vertex {vertex} is used by no triangle"),
            Self::NotPending { hedge, state } => {
                write!(f, "half-edge {hedge} has no matching pending edit (state {state:?})")
            }
            Self::Boundary { hedge } => write!(f, "half-edge {hedge} has no face"),
            Self::UnpairedSplit { hedge } => {
                write!(f, "half-edge {hedge} is split but its twin is not")
            }
            Self::Busy { hedge, state } => {
                write!(f, "half-edge {hedge} is already claimed (state {state:?})")
            }
            Self::Stale { node } => write!(f, "handle {node} is not live"),
            Self::TraversalOverrun { start, limit } => {
                write!(f, "walk from {start} did not close within {limit} steps")
            }
            Self::Invalid(report) => write!(f, "mesh failed validation: {report}"),
            Self::Store(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl Error for MeshError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for MeshError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotLive { node } => Self::Stale { node },
            other => Self::Store(other),
        }
    }
}

impl From<ArenaError> for MeshError {
    fn from(e: ArenaError) -> Self {
        Self::Store(StoreError::Arena(e))
    }
}
