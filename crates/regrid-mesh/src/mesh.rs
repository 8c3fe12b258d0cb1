//! The half-edge mesh container: construction, record access, accessors.

use indexmap::IndexMap;
use regrid_arena::{ArenaConfig, ChunkAllocator};
use regrid_core::{Dimension, ErrorLog, Node};
use regrid_store::{AttributeStore, CellSet};

use crate::config::{MeshDims, RemeshConfig};
use crate::error::MeshError;
use crate::geometry::{self, Vec3};
use crate::halfedge::{HalfEdge, RegridState, NIL};

const COMPONENT: &str = "mesh";

/// An oriented triangle surface stored as half-edges.
///
/// The surface may be closed or open. Each unpaired triangle edge gets a
/// boundary half-edge as its twin, and those are linked into boundary
/// loops, so `flip` is an involution everywhere and every vertex ring
/// closes.
///
/// The mesh owns its [`ChunkAllocator`]. Vertices and half-edges are
/// nodes of two [`CellSet`]s; positions, normals, one outgoing half-edge
/// per vertex, and the half-edge records are attribute stores kept
/// accommodated to those sets.
///
/// # Examples
///
/// ```
/// use regrid_mesh::{HalfEdgeMesh, RemeshConfig};
///
/// let positions = [
///     [1.0, 1.0, 1.0],
///     [1.0, -1.0, -1.0],
///     [-1.0, 1.0, -1.0],
///     [-1.0, -1.0, 1.0],
/// ];
/// let triangles = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
/// let mesh = HalfEdgeMesh::from_triangles(&positions, &triangles, RemeshConfig::new(0.5, 4.0))
///     .unwrap();
/// assert_eq!(mesh.face_count(), 4);
/// assert!(mesh.valid().is_valid());
/// ```
pub struct HalfEdgeMesh {
    dims: MeshDims,
    config: RemeshConfig,
    pub(crate) alloc: ChunkAllocator,
    pub(crate) points: CellSet,
    pub(crate) hedges: CellSet,
    positions: AttributeStore<Vec3>,
    normals: AttributeStore<Vec3>,
    anchors: AttributeStore<Node>,
    records: AttributeStore<HalfEdge>,
    boundary: usize,
}

impl HalfEdgeMesh {
    /// Build a surface mesh on a fresh default allocator.
    ///
    /// `triangles` index into `positions` and must be consistently
    /// oriented. Every directed edge may appear once. An edge used by a
    /// single triangle lies on the boundary, and each boundary vertex must
    /// sit on exactly one boundary loop.
    pub fn from_triangles(
        positions: &[Vec3],
        triangles: &[[usize; 3]],
        config: RemeshConfig,
    ) -> Result<Self, MeshError> {
        let alloc = ChunkAllocator::new(ArenaConfig::new())?;
        Self::from_parts(alloc, MeshDims::SURFACE, positions, triangles, config)
    }

    /// Build a mesh on a caller-supplied allocator with explicit dimensions.
    ///
    /// Runs [`valid`](Self::valid) as a post-condition and returns
    /// [`MeshError::Invalid`] if any invariant fails.
    pub fn from_parts(
        alloc: ChunkAllocator,
        dims: MeshDims,
        positions: &[Vec3],
        triangles: &[[usize; 3]],
        config: RemeshConfig,
    ) -> Result<Self, MeshError> {
        dims.require_surface()?;
        config.validate()?;

        let mut mesh = Self {
            dims,
            config,
            alloc,
            points: CellSet::create(Dimension::Points)?,
            hedges: CellSet::create(Dimension::Edges)?,
            positions: AttributeStore::create("position")?,
            normals: AttributeStore::create("normal")?,
            anchors: AttributeStore::create("anchor")?,
            records: AttributeStore::create("hedge")?,
            boundary: 0,
        };

        let mut used = vec![false; positions.len()];
        for (t, tri) in triangles.iter().enumerate() {
            for (i, &v) in tri.iter().enumerate() {
                if v >= positions.len() || tri[..i].contains(&v) {
                    return Err(MeshError::BadIndex {
                        triangle: t,
                        index: v,
                    });
                }
                used[v] = true;
            }
        }
        if let Some(vertex) = used.iter().position(|u| !u) {
            return Err(MeshError::IsolatedVertex { vertex });
        }

        let mut vertices = Vec::with_capacity(positions.len());
        for &p in positions {
            vertices.push(mesh.new_vertex(p, [0.0; 3])?);
        }

        let mut directed: IndexMap<(usize, usize), Node> = IndexMap::new();
        for tri in triangles {
            let mut face = [NIL; 3];
            for (i, slot) in face.iter_mut().enumerate() {
                let mut record = HalfEdge::detached(vertices[tri[i]]);
                record.face_order = i as u8;
                *slot = mesh.new_hedge(record)?;
            }
            for i in 0..3 {
                let mut record = mesh.hedge(face[i])?;
                record.next = face[(i + 1) % 3];
                record.prev = face[(i + 2) % 3];
                mesh.put(face[i], record)?;

                let edge = (tri[i], tri[(i + 1) % 3]);
                if directed.insert(edge, face[i]).is_some() {
                    return Err(MeshError::NonManifold {
                        from: edge.0,
                        to: edge.1,
                    });
                }
            }
        }

        // boundary half-edge leaving each boundary vertex, and where it ends
        let mut loose: IndexMap<usize, (Node, usize)> = IndexMap::new();
        for (index, (&(from, to), &h)) in directed.iter().enumerate() {
            let mut record = mesh.hedge(h)?;
            match directed.get_index_of(&(to, from)) {
                Some(twin_index) => {
                    record.flip = directed[twin_index];
                    record.edge_side = u8::from(index > twin_index);
                }
                None => {
                    let mut outer = HalfEdge::detached(vertices[to]);
                    outer.flip = h;
                    outer.edge_side = 1;
                    outer.boundary = true;
                    let g = mesh.new_hedge(outer)?;
                    if loose.insert(to, (g, from)).is_some() {
                        return Err(MeshError::NonManifoldVertex { vertex: to });
                    }
                    record.flip = g;
                    record.edge_side = 0;
                }
            }
            mesh.put(h, record)?;
        }
        for &(g, reaches) in loose.values() {
            let Some(&(after, _)) = loose.get(&reaches) else {
                return Err(MeshError::NonManifoldVertex { vertex: reaches });
            };
            mesh.update(g, |r| r.next = after)?;
            mesh.update(after, |r| r.prev = g)?;
        }

        mesh.refresh_valences()?;
        mesh.recompute_normals()?;
        let report = mesh.valid();
        if !report.is_valid() {
            return Err(MeshError::Invalid(report));
        }
        log::debug!(
            "mesh built: {} vertices, {} faces, {} boundary edges",
            mesh.vertex_count(),
            mesh.face_count(),
            mesh.boundary
        );
        Ok(mesh)
    }

    /// Mesh dimensions.
    pub fn dims(&self) -> MeshDims {
        self.dims
    }

    /// Remeshing parameters.
    pub fn config(&self) -> &RemeshConfig {
        &self.config
    }

    /// Replace the remeshing parameters.
    pub fn set_config(&mut self, config: RemeshConfig) -> Result<(), MeshError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Number of live half-edges.
    pub fn half_edge_count(&self) -> usize {
        self.hedges.len()
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        (self.hedges.len() - self.boundary) / 3
    }

    /// Number of boundary half-edges, which is the number of edges on the
    /// boundary. Zero for a closed surface.
    pub fn boundary_edge_count(&self) -> usize {
        self.boundary
    }

    /// Whether the surface has no boundary.
    pub fn is_closed(&self) -> bool {
        self.boundary == 0
    }

    /// The allocator backing every store of this mesh.
    pub fn alloc(&self) -> &ChunkAllocator {
        &self.alloc
    }

    /// Diagnostic log shared by the allocator and every store.
    pub fn log(&self) -> &ErrorLog {
        self.alloc.log()
    }

    /// The vertex set, for reading user scalars.
    pub fn points(&self) -> &CellSet {
        &self.points
    }

    /// The vertex set together with the allocator it draws from, for
    /// registering and writing user scalars on vertices.
    pub fn points_mut(&mut self) -> (&mut CellSet, &mut ChunkAllocator) {
        (&mut self.points, &mut self.alloc)
    }

    /// Every live vertex.
    pub fn vertices(&self) -> Result<Vec<Node>, MeshError> {
        Ok(self.points.nodes(&self.alloc)?)
    }

    /// Every live half-edge.
    pub fn half_edges(&self) -> Result<Vec<Node>, MeshError> {
        Ok(self.hedges.nodes(&self.alloc)?)
    }

    /// Every triangle as its three vertices in orientation order.
    pub fn triangles(&self) -> Result<Vec<[Node; 3]>, MeshError> {
        let mut out = Vec::with_capacity(self.face_count());
        for h in self.half_edges()? {
            let record = self.hedge(h)?;
            if record.boundary || record.face_order != 0 {
                continue;
            }
            let next = self.hedge(record.next)?;
            let last = self.hedge(next.next)?;
            out.push([record.pivot, next.pivot, last.pivot]);
        }
        Ok(out)
    }

    /// Position of vertex `v`.
    pub fn position(&self, v: Node) -> Result<Vec3, MeshError> {
        self.points.check_live(&self.alloc, v)?;
        Ok(self.positions.get(&self.alloc, v)?)
    }

    /// Move vertex `v`. Cached normals are not refreshed.
    pub fn set_position(&mut self, v: Node, p: Vec3) -> Result<(), MeshError> {
        self.points.check_live(&self.alloc, v)?;
        Ok(self.positions.set(&mut self.alloc, v, p)?)
    }

    /// Cached unit normal of vertex `v`.
    pub fn normal(&self, v: Node) -> Result<Vec3, MeshError> {
        self.points.check_live(&self.alloc, v)?;
        Ok(self.normals.get(&self.alloc, v)?)
    }

    /// Cached valence of vertex `v`.
    pub fn valence(&self, v: Node) -> Result<u8, MeshError> {
        Ok(self.hedge(self.anchor(v)?)?.valence)
    }

    /// One half-edge leaving vertex `v`.
    pub fn anchor(&self, v: Node) -> Result<Node, MeshError> {
        self.points.check_live(&self.alloc, v)?;
        Ok(self.anchors.get(&self.alloc, v)?)
    }

    /// Length of the full edge containing `h`.
    pub fn edge_length(&self, h: Node) -> Result<f64, MeshError> {
        let record = self.hedge(h)?;
        let next = self.hedge(record.next)?;
        Ok(geometry::distance(
            self.position(record.pivot)?,
            self.position(next.pivot)?,
        ))
    }

    /// The record of half-edge `h`.
    pub fn hedge(&self, h: Node) -> Result<HalfEdge, MeshError> {
        self.hedges.check_live(&self.alloc, h)?;
        Ok(self.records.get(&self.alloc, h)?)
    }

    pub(crate) fn put(&mut self, h: Node, record: HalfEdge) -> Result<(), MeshError> {
        self.hedges.check_live(&self.alloc, h)?;
        Ok(self.records.set(&mut self.alloc, h, record)?)
    }

    /// Read-modify-write one half-edge record.
    pub(crate) fn update(
        &mut self,
        h: Node,
        edit: impl FnOnce(&mut HalfEdge),
    ) -> Result<(), MeshError> {
        let mut record = self.hedge(h)?;
        edit(&mut record);
        self.put(h, record)
    }

    pub(crate) fn set_regrid(&mut self, h: Node, state: RegridState) -> Result<(), MeshError> {
        self.update(h, |r| r.regrid = state)
    }

    pub(crate) fn set_normal(&mut self, v: Node, n: Vec3) -> Result<(), MeshError> {
        Ok(self.normals.set(&mut self.alloc, v, n)?)
    }

    pub(crate) fn set_anchor(&mut self, v: Node, h: Node) -> Result<(), MeshError> {
        Ok(self.anchors.set(&mut self.alloc, v, h)?)
    }

    pub(crate) fn new_vertex(&mut self, p: Vec3, n: Vec3) -> Result<Node, MeshError> {
        let v = self.points.node_new(&mut self.alloc)?;
        let blocks = self.points.blocks();
        self.positions.accommodate(&mut self.alloc, blocks)?;
        self.normals.accommodate(&mut self.alloc, blocks)?;
        self.anchors.accommodate(&mut self.alloc, blocks)?;
        self.positions.set(&mut self.alloc, v, p)?;
        self.normals.set(&mut self.alloc, v, n)?;
        self.anchors.set(&mut self.alloc, v, NIL)?;
        Ok(v)
    }

    pub(crate) fn new_hedge(&mut self, record: HalfEdge) -> Result<Node, MeshError> {
        let h = self.hedges.node_new(&mut self.alloc)?;
        self.records.accommodate(&mut self.alloc, self.hedges.blocks())?;
        self.records.set(&mut self.alloc, h, record)?;
        self.boundary += usize::from(record.boundary);
        Ok(h)
    }

    pub(crate) fn remove_hedge(&mut self, h: Node) -> Result<(), MeshError> {
        let outer = self.hedge(h)?.boundary;
        self.hedges.node_remove(&mut self.alloc, h)?;
        self.boundary -= usize::from(outer);
        Ok(())
    }

    pub(crate) fn remove_vertex(&mut self, v: Node) -> Result<(), MeshError> {
        Ok(self.points.node_remove(&mut self.alloc, v)?)
    }

    /// Recompute every cached valence and vertex anchor from scratch.
    pub fn refresh_valences(&mut self) -> Result<(), MeshError> {
        let hedges = self.half_edges()?;
        let mut counts: IndexMap<Node, u8> = IndexMap::new();
        for &h in &hedges {
            let pivot = self.hedge(h)?.pivot;
            let count = counts.entry(pivot).or_default();
            *count = count.saturating_add(1);
            self.set_anchor(pivot, h)?;
        }
        for &h in &hedges {
            self.update(h, |r| r.valence = counts.get(&r.pivot).copied().unwrap_or(0))?;
        }
        Ok(())
    }

    /// Recount the valence of the vertex `h` leaves by walking its ring,
    /// and make `h` its anchor.
    pub(crate) fn refresh_vertex(&mut self, h: Node) -> Result<(), MeshError> {
        let ring = self.ring(h).collect::<Result<Vec<_>, _>>()?;
        let valence = u8::try_from(ring.len()).unwrap_or(u8::MAX);
        for &o in &ring {
            self.update(o, |r| r.valence = valence)?;
        }
        let pivot = self.hedge(h)?.pivot;
        self.set_anchor(pivot, h)
    }

    /// Recompute area-weighted unit normals for every vertex.
    pub fn recompute_normals(&mut self) -> Result<(), MeshError> {
        let mut sums: IndexMap<Node, Vec3> = IndexMap::new();
        for [a, b, c] in self.triangles()? {
            let n = geometry::face_normal(self.position(a)?, self.position(b)?, self.position(c)?);
            for v in [a, b, c] {
                let sum = sums.entry(v).or_insert([0.0; 3]);
                *sum = geometry::add(*sum, n);
            }
        }
        for (v, sum) in sums {
            let n = geometry::normalize(sum).unwrap_or([0.0; 3]);
            self.set_normal(v, n)?;
        }
        Ok(())
    }

    /// Record a rejected request in the shared log and return it.
    pub(crate) fn reject<T>(&self, err: MeshError) -> Result<T, MeshError> {
        self.alloc.log().record(COMPONENT, &err);
        Err(err)
    }

    /// Release every store and cell set, then every arena.
    pub fn destroy(self) -> Result<(), MeshError> {
        let Self {
            mut alloc,
            points,
            hedges,
            positions,
            normals,
            anchors,
            records,
            ..
        } = self;
        records.destroy(&mut alloc)?;
        anchors.destroy(&mut alloc)?;
        normals.destroy(&mut alloc)?;
        positions.destroy(&mut alloc)?;
        hedges.destroy(&mut alloc)?;
        points.destroy(&mut alloc)?;
        debug_assert_eq!(alloc.live_chunks(), 0);
        alloc.destroy_all();
        Ok(())
    }
}

impl std::fmt::Debug for HalfEdgeMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HalfEdgeMesh")
            .field("dims", &self.dims)
            .field("vertices", &self.points.len())
            .field("half_edges", &self.hedges.len())
            .field("boundary", &self.boundary)
            .field("config", &self.config)
            .finish()
    }
}
