//! Half-edge surface meshes with local remeshing.
//!
//! A [`HalfEdgeMesh`] stores an oriented triangle surface, closed or with
//! boundary, in two cell sets (vertices and half-edges) drawn from one
//! [`ChunkAllocator`](regrid_arena::ChunkAllocator). Every half-edge is a
//! [`HalfEdge`] record addressed by its [`Node`](regrid_core::Node).
//!
//! # Remeshing
//!
//! [`HalfEdgeMesh::remesh`] alternates three passes until nothing changes:
//!
//! - [`split`](HalfEdgeMesh::split): long or badly shaped edges get a
//!   midpoint, then every touched face is re-triangulated.
//! - [`collapse`](HalfEdgeMesh::collapse): short edges are merged into
//!   their midpoint, in rounds of request then commit. Edges touching
//!   the boundary are kept.
//! - [`smooth`](HalfEdgeMesh::smooth): vertices move toward the mean of
//!   their neighbours within their tangent plane; boundary vertices only
//!   slide along the boundary.
//!
//! Edits coordinate through each half-edge's [`RegridState`]: an edit
//! marks the half-edges it will touch, and a later request that finds a
//! mark is abandoned instead of interleaving with it.
//!
//! [`HalfEdgeMesh::valid`] checks every topological invariant and returns a
//! [`ValidityReport`] that is empty for a valid mesh.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collapse;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod halfedge;
pub mod mesh;
pub mod remesh;
pub mod smooth;
pub mod split;
pub mod traverse;
pub mod valid;

pub use collapse::{AbandonReason, CollapseReport, CollapseVerdict};
pub use config::{MeshDims, RemeshConfig};
pub use error::MeshError;
pub use halfedge::{HalfEdge, RegridState};
pub use mesh::HalfEdgeMesh;
pub use remesh::RemeshReport;
pub use traverse::Walk;
pub use valid::ValidityReport;
