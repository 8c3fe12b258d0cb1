//! Test surfaces and assertions for regrid development.
//!
//! [`Surface`] is a plain position/triangle list for the closed and open
//! surfaces the mesh tests start from. Build a [`HalfEdgeMesh`] from one with
//! [`Surface::build`], then check it with [`assert_valid`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use indexmap::IndexMap;
use regrid_mesh::geometry::{self, Vec3};
use regrid_mesh::{HalfEdgeMesh, MeshError, RemeshConfig};

/// A triangle surface as flat lists.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[usize; 3]>,
}

impl Surface {
    /// Regular tetrahedron with vertices on the cube corners `(±1, ±1, ±1)`.
    pub fn tetrahedron() -> Self {
        Self {
            positions: vec![
                [1.0, 1.0, 1.0],
                [1.0, -1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, -1.0, 1.0],
            ],
            triangles: vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
        }
    }

    /// Unit octahedron. Every vertex has valence 4.
    pub fn octahedron() -> Self {
        Self {
            positions: vec![
                [1.0, 0.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, -1.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, -1.0],
            ],
            triangles: vec![
                [0, 2, 4],
                [2, 1, 4],
                [1, 3, 4],
                [3, 0, 4],
                [2, 0, 5],
                [1, 2, 5],
                [3, 1, 5],
                [0, 3, 5],
            ],
        }
    }

    /// Unit icosahedron, subdivided `subdivisions` times with every new
    /// vertex pushed out to the sphere.
    ///
    /// Level 0 has 12 vertices and 20 faces; each level quadruples the
    /// face count.
    pub fn icosphere(subdivisions: u32) -> Self {
        let t = (1.0 + 5f64.sqrt()) / 2.0;
        let corners = [
            [-1.0, t, 0.0],
            [1.0, t, 0.0],
            [-1.0, -t, 0.0],
            [1.0, -t, 0.0],
            [0.0, -1.0, t],
            [0.0, 1.0, t],
            [0.0, -1.0, -t],
            [0.0, 1.0, -t],
            [t, 0.0, -1.0],
            [t, 0.0, 1.0],
            [-t, 0.0, -1.0],
            [-t, 0.0, 1.0],
        ];
        let mut surface = Self {
            positions: corners.iter().map(|&p| unit(p)).collect(),
            triangles: vec![
                [0, 11, 5],
                [0, 5, 1],
                [0, 1, 7],
                [0, 7, 10],
                [0, 10, 11],
                [1, 5, 9],
                [5, 11, 4],
                [11, 10, 2],
                [10, 7, 6],
                [7, 1, 8],
                [3, 9, 4],
                [3, 4, 2],
                [3, 2, 6],
                [3, 6, 8],
                [3, 8, 9],
                [4, 9, 5],
                [2, 4, 11],
                [6, 2, 10],
                [8, 6, 7],
                [9, 8, 1],
            ],
        };
        surface.orient_outward();
        for _ in 0..subdivisions {
            surface.subdivide();
        }
        surface
    }

    /// Flat hexagonal disc of unit radius in the `z = 0` plane, cut into
    /// `rings` rings of equilateral triangles.
    ///
    /// It has `1 + 3 rings (rings + 1)` vertices and `6 rings²` faces.
    /// Interior vertices have valence 6, rim corners 3 and the rest of
    /// the rim 4. `rings` must be at least 1.
    pub fn disc(rings: usize) -> Self {
        let n = rings as i64;
        let mut index: IndexMap<(i64, i64), usize> = IndexMap::new();
        let mut positions = Vec::new();
        for r in -n..=n {
            for q in -n..=n {
                if (q + r).abs() <= n {
                    index.insert((q, r), positions.len());
                    let (x, y, span) = (q as f64, r as f64, n as f64);
                    positions.push([
                        (x + y / 2.0) / span,
                        y * 3f64.sqrt() / 2.0 / span,
                        0.0,
                    ]);
                }
            }
        }
        let mut triangles = Vec::new();
        for r in -n - 1..=n {
            for q in -n - 1..=n {
                let up = [(q, r), (q + 1, r), (q, r + 1)];
                let down = [(q + 1, r), (q + 1, r + 1), (q, r + 1)];
                for corners in [up, down] {
                    if let [Some(&a), Some(&b), Some(&c)] = corners.map(|k| index.get(&k)) {
                        triangles.push([a, b, c]);
                    }
                }
            }
        }
        Self {
            positions,
            triangles,
        }
    }

    /// Move every vertex by `lift[i % len]` along z.
    ///
    /// An empty slice leaves the surface unchanged.
    pub fn lifted(mut self, lift: &[f64]) -> Self {
        if lift.is_empty() {
            return self;
        }
        for (i, p) in self.positions.iter_mut().enumerate() {
            p[2] += lift[i % lift.len()];
        }
        self
    }

    /// Scale every position per axis.
    pub fn scaled(mut self, factors: Vec3) -> Self {
        for p in &mut self.positions {
            for (c, f) in p.iter_mut().zip(factors) {
                *c *= f;
            }
        }
        self
    }

    /// Scale each vertex's distance from the origin by `radii[i % len]`.
    ///
    /// An empty slice leaves the surface unchanged.
    pub fn with_radii(mut self, radii: &[f64]) -> Self {
        if radii.is_empty() {
            return self;
        }
        for (i, p) in self.positions.iter_mut().enumerate() {
            *p = geometry::scale(*p, radii[i % radii.len()]);
        }
        self
    }

    /// Build a mesh over this surface.
    pub fn build(&self, config: RemeshConfig) -> Result<HalfEdgeMesh, MeshError> {
        HalfEdgeMesh::from_triangles(&self.positions, &self.triangles, config)
    }

    fn subdivide(&mut self) {
        let mut midpoints: IndexMap<(usize, usize), usize> = IndexMap::new();
        let mut triangles = Vec::with_capacity(self.triangles.len() * 4);
        for [a, b, c] in std::mem::take(&mut self.triangles) {
            let ab = self.midpoint(&mut midpoints, a, b);
            let bc = self.midpoint(&mut midpoints, b, c);
            let ca = self.midpoint(&mut midpoints, c, a);
            triangles.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        self.triangles = triangles;
    }

    fn midpoint(
        &mut self,
        cache: &mut IndexMap<(usize, usize), usize>,
        a: usize,
        b: usize,
    ) -> usize {
        let key = (a.min(b), a.max(b));
        if let Some(&m) = cache.get(&key) {
            return m;
        }
        let p = unit(geometry::add(self.positions[a], self.positions[b]));
        self.positions.push(p);
        let m = self.positions.len() - 1;
        cache.insert(key, m);
        m
    }

    /// Flip any triangle whose normal points toward the origin.
    fn orient_outward(&mut self) {
        for tri in &mut self.triangles {
            let [a, b, c] = tri.map(|i| self.positions[i]);
            let centroid = geometry::scale(geometry::add(geometry::add(a, b), c), 1.0 / 3.0);
            if geometry::dot(geometry::face_normal(a, b, c), centroid) < 0.0 {
                tri.swap(1, 2);
            }
        }
    }
}

fn unit(p: Vec3) -> Vec3 {
    geometry::normalize(p).unwrap_or(p)
}

/// Panic with the failed checks unless `mesh` is valid.
#[track_caller]
pub fn assert_valid(mesh: &HalfEdgeMesh) {
    let report = mesh.valid();
    assert!(report.is_valid(), "mesh is invalid: {report}");
}

/// `V - E + F`; 2 for every closed genus-0 surface, 1 for a disc.
pub fn euler_characteristic(mesh: &HalfEdgeMesh) -> i64 {
    let v = mesh.vertex_count() as i64;
    let e = (mesh.half_edge_count() / 2) as i64;
    let f = mesh.face_count() as i64;
    v - e + f
}

/// Length of every full edge, once each.
pub fn edge_lengths(mesh: &HalfEdgeMesh) -> Result<Vec<f64>, MeshError> {
    let mut out = Vec::with_capacity(mesh.half_edge_count() / 2);
    for h in mesh.half_edges()? {
        if mesh.hedge(h)?.edge_side == 0 {
            out.push(mesh.edge_length(h)?);
        }
    }
    Ok(out)
}
