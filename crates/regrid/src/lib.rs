//! Regrid: arena-backed half-edge surface meshes with local remeshing.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the regrid sub-crates. For most users, adding `regrid` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use regrid::prelude::*;
//!
//! let positions = [
//!     [1.0, 0.0, 0.0],
//!     [-1.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [0.0, -1.0, 0.0],
//!     [0.0, 0.0, 1.0],
//!     [0.0, 0.0, -1.0],
//! ];
//! let triangles = [
//!     [0, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
//!     [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
//! ];
//! let config = RemeshConfig::new(0.3, 0.9);
//! let mut mesh = HalfEdgeMesh::from_triangles(&positions, &triangles, config).unwrap();
//! let report = mesh.remesh().unwrap();
//! assert!(report.split > 0);
//! assert!(mesh.valid().is_valid());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `regrid-core` | Node handles, dimensions, limits, the error log |
//! | [`arena`] | `regrid-arena` | Buddy chunk allocator |
//! | [`store`] | `regrid-store` | Index stacks, attribute stores, cell sets |
//! | [`mesh`] | `regrid-mesh` | Half-edge mesh, remeshing passes, validity |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core handles, limits and diagnostics (`regrid-core`).
pub use regrid_core as types;

/// Buddy-system chunk allocation (`regrid-arena`).
///
/// Every mesh owns one [`arena::ChunkAllocator`]; build it yourself with
/// [`mesh::HalfEdgeMesh::from_parts`] to change its budget.
pub use regrid_arena as arena;

/// Block-structured storage (`regrid-store`).
///
/// [`store::CellSet`] hands out generation-checked nodes;
/// [`store::AttributeStore`] keeps one typed value per node.
pub use regrid_store as store;

/// Half-edge meshes and remeshing (`regrid-mesh`).
pub use regrid_mesh as mesh;

/// Common imports for typical regrid usage.
///
/// ```rust
/// use regrid::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use regrid_core::{Dimension, ErrorLog, Node};

    // Allocation and storage
    pub use regrid_arena::{ArenaConfig, ChunkAllocator};
    pub use regrid_store::{AttributeStore, CellSet, Element};

    // Errors
    pub use regrid_arena::ArenaError;
    pub use regrid_mesh::MeshError;
    pub use regrid_store::StoreError;

    // Mesh
    pub use regrid_mesh::{
        CollapseReport, CollapseVerdict, HalfEdgeMesh, MeshDims, RemeshConfig, RemeshReport,
        ValidityReport,
    };
}
