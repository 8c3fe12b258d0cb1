//! Bounded walks around faces and vertex rings.
//!
//! A [`Walk`] yields half-edges until it returns to its start. If it has
//! not closed after its step guard it yields one
//! [`MeshError::TraversalOverrun`] and stops, so a corrupted link can
//! never turn a walk into an endless loop. Calling [`HalfEdgeMesh::ring`]
//! or [`HalfEdgeMesh::face`] again restarts from scratch.

use regrid_core::limits::RING_GUARD;
use regrid_core::Node;

use crate::error::MeshError;
use crate::mesh::HalfEdgeMesh;

/// Step guard for a face walk once every face is a triangle.
pub const FACE_GUARD: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// `flip(prev(h))`: the next half-edge leaving the same vertex.
    Ring,
    /// `next(h)`.
    Face,
}

/// Iterator over the half-edges of one face or one vertex ring.
#[derive(Debug)]
pub struct Walk<'m> {
    mesh: &'m HalfEdgeMesh,
    step: Step,
    start: Node,
    current: Option<Node>,
    yielded: usize,
    limit: usize,
}

impl Iterator for Walk<'_> {
    type Item = Result<Node, MeshError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        if self.yielded == self.limit {
            return Some(Err(MeshError::TraversalOverrun {
                start: self.start,
                limit: self.limit,
            }));
        }
        self.yielded += 1;
        let following = match self.step {
            Step::Face => self.mesh.hedge(current).map(|r| r.next),
            Step::Ring => self
                .mesh
                .hedge(current)
                .and_then(|r| self.mesh.hedge(r.prev))
                .map(|r| r.flip),
        };
        match following {
            Ok(h) => {
                if h != self.start {
                    self.current = Some(h);
                }
                Some(Ok(current))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl HalfEdgeMesh {
    /// Half-edges leaving the pivot of `h`, starting with `h`.
    ///
    /// A boundary vertex's ring includes its one boundary half-edge.
    pub fn ring(&self, h: Node) -> Walk<'_> {
        self.walk(Step::Ring, h, RING_GUARD)
    }

    /// Half-edges of the face containing `h`, starting with `h`.
    ///
    /// From a boundary half-edge this walks the boundary loop and
    /// overruns unless the loop is a triangle.
    pub fn face(&self, h: Node) -> Walk<'_> {
        self.walk(Step::Face, h, FACE_GUARD)
    }

    /// Face walk with a custom guard, for faces mid-split.
    pub(crate) fn face_with_limit(&self, h: Node, limit: usize) -> Walk<'_> {
        self.walk(Step::Face, h, limit)
    }

    /// Vertices adjacent to the pivot of `h`, in ring order.
    pub fn neighbours(&self, h: Node) -> Result<Vec<Node>, MeshError> {
        self.ring(h)
            .map(|o| {
                let record = self.hedge(o?)?;
                Ok(self.hedge(record.next)?.pivot)
            })
            .collect()
    }

    /// Whether the pivot of `h` lies on the boundary.
    pub fn on_boundary(&self, h: Node) -> Result<bool, MeshError> {
        for o in self.ring(h) {
            if self.hedge(o?)?.boundary {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether vertex `v` lies on the boundary.
    pub fn is_boundary_vertex(&self, v: Node) -> Result<bool, MeshError> {
        self.on_boundary(self.anchor(v)?)
    }

    fn walk(&self, step: Step, start: Node, limit: usize) -> Walk<'_> {
        Walk {
            mesh: self,
            step,
            start,
            current: Some(start),
            yielded: 0,
            limit,
        }
    }
}
