//! Tangential Laplacian smoothing.

use indexmap::IndexMap;
use regrid_core::Node;

use crate::error::MeshError;
use crate::geometry::{self, Vec3};
use crate::mesh::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Move every vertex toward the mean of its one-ring neighbours,
    /// keeping it on its tangent plane.
    ///
    /// The displacement's component along the cached vertex normal is
    /// removed before the move. A boundary vertex instead moves toward the
    /// mean of its two boundary neighbours, keeping only the component
    /// along the chord between them, so the rim slides along itself. All
    /// targets are computed from the old positions before any vertex
    /// moves. Returns the number of vertices visited.
    pub fn smooth(&mut self) -> Result<usize, MeshError> {
        let mut sums: IndexMap<Node, (Vec3, u32)> = IndexMap::new();
        let mut rims: IndexMap<Node, (Vec3, Vec3)> = IndexMap::new();
        for h in self.half_edges()? {
            let record = self.hedge(h)?;
            let neighbour = self.position(self.hedge(record.next)?.pivot)?;
            let (sum, count) = sums.entry(record.pivot).or_insert(([0.0; 3], 0));
            *sum = geometry::add(*sum, neighbour);
            *count += 1;
            if record.boundary {
                let behind = self.position(self.hedge(record.prev)?.pivot)?;
                rims.insert(record.pivot, (behind, neighbour));
            }
        }

        let mut targets = Vec::with_capacity(sums.len());
        for (&v, &(sum, count)) in &sums {
            let p = self.position(v)?;
            let step = match rims.get(&v) {
                Some(&(behind, ahead)) => {
                    let mean = geometry::scale(geometry::add(behind, ahead), 0.5);
                    match geometry::normalize(geometry::sub(ahead, behind)) {
                        Some(t) => geometry::scale(t, geometry::dot(geometry::sub(mean, p), t)),
                        None => [0.0; 3],
                    }
                }
                None => {
                    let n = self.normal(v)?;
                    let mean = geometry::scale(sum, 1.0 / f64::from(count));
                    let step = geometry::sub(mean, p);
                    geometry::sub(step, geometry::scale(n, geometry::dot(step, n)))
                }
            };
            targets.push((v, geometry::add(p, step)));
        }
        for &(v, p) in &targets {
            self.set_position(v, p)?;
        }
        log::debug!("smoothed {} vertices", targets.len());
        Ok(targets.len())
    }
}
