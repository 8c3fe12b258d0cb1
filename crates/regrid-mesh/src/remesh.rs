//! The split/collapse/smooth driver.

use crate::error::MeshError;
use crate::mesh::HalfEdgeMesh;

/// Summary of one [`HalfEdgeMesh::remesh`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemeshReport {
    /// Iterations run.
    pub iterations: usize,
    /// Edges split across all iterations.
    pub split: usize,
    /// Edges collapsed across all iterations.
    pub collapsed: usize,
    /// Short edges left abandoned by the last collapse pass.
    pub abandoned: usize,
    /// Smoothing passes run.
    pub smoothed: usize,
}

impl RemeshReport {
    /// Whether the mesh was left untouched.
    pub fn is_noop(&self) -> bool {
        self.split == 0 && self.collapsed == 0 && self.smoothed == 0
    }
}

impl HalfEdgeMesh {
    /// Bring edge lengths into `[amin, amax]`.
    ///
    /// Each iteration splits, then collapses; when neither changed
    /// anything the loop stops, otherwise the mesh is smoothed and the
    /// next iteration starts. In debug builds the result is asserted
    /// valid.
    pub fn remesh(&mut self) -> Result<RemeshReport, MeshError> {
        let mut report = RemeshReport::default();
        for _ in 0..self.config().remesh_iterations {
            report.iterations += 1;
            let split = self.split()?;
            let collapse = self.collapse()?;
            report.split += split;
            report.collapsed += collapse.collapsed;
            report.abandoned = collapse.abandoned;
            if split == 0 && collapse.collapsed == 0 {
                break;
            }
            self.smooth()?;
            report.smoothed += 1;
        }
        self.recompute_normals()?;
        debug_assert!(
            self.valid().is_valid(),
            "remesh left an invalid mesh: {}",
            self.valid()
        );
        log::debug!(
            "remesh: {report:?}, {} vertices, {} faces",
            self.vertex_count(),
            self.face_count()
        );
        Ok(report)
    }
}
