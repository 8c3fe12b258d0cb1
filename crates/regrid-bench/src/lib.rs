//! Benchmark profiles for the regrid mesh workspace.
//!
//! Provides pre-built surfaces for benchmarking and examples:
//!
//! - [`reference_profile`]: stretched level-2 icosphere (320 faces) that
//!   needs both splitting and collapsing
//! - [`stress_profile`]: level-4 icosphere (5120 faces) refined to half
//!   its edge length

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use regrid_mesh::{HalfEdgeMesh, MeshError, RemeshConfig};
use regrid_test_utils::Surface;

/// Edge bounds for the reference profile.
pub fn reference_config() -> RemeshConfig {
    RemeshConfig::new(0.12, 0.3)
}

/// Build the reference profile: a level-2 icosphere stretched to 2:1:1.
///
/// Edges along the long axis exceed `amax` and those along the short
/// axes sit near `amin`, so one remesh exercises every pass.
pub fn reference_profile() -> Result<HalfEdgeMesh, MeshError> {
    Surface::icosphere(2)
        .scaled([2.0, 1.0, 1.0])
        .build(reference_config())
}

/// Build the stress profile: a level-4 icosphere with `amax` at about
/// half its edge length.
pub fn stress_profile() -> Result<HalfEdgeMesh, MeshError> {
    Surface::icosphere(4).build(RemeshConfig::new(0.02, 0.04).with_remesh_iterations(2))
}
