//! Edge splitting and face re-triangulation.
//!
//! A split runs in two phases. [`HalfEdgeMesh::hedge_split`] gives one
//! half-edge a midpoint and marks it `SplitPending`; the face it bounds
//! temporarily becomes a polygon. [`HalfEdgeMesh::hface_split`] then cuts
//! that polygon back into triangles, one more than it has pending edges.
//!
//! A boundary half-edge is split like any other but has no face to
//! re-triangulate, so it returns to `None` as soon as both halves of its
//! edge share a midpoint.

use indexmap::IndexMap;
use regrid_core::limits::MAX_VALENCE;
use regrid_core::Node;
use smallvec::SmallVec;

use crate::error::MeshError;
use crate::geometry;
use crate::halfedge::{HalfEdge, RegridState, NIL};
use crate::mesh::HalfEdgeMesh;

/// Longest face loop while splits are pending: three edges, each halved.
const PENDING_FACE_GUARD: usize = 6;

impl HalfEdgeMesh {
    /// Give the full edge containing `h` a midpoint on `h`'s side.
    ///
    /// A new half-edge from the midpoint is inserted after `h`, copying
    /// its flip and labels, and `h` becomes `SplitPending`. If `flip(h)`
    /// already has a midpoint it is reused and the four half-edges are
    /// paired. Returns the new half-edge.
    ///
    /// Valences are not touched here; the midpoint's ring only closes once
    /// both halves are split, and [`hface_split`](Self::hface_split)
    /// recounts every vertex it rewires.
    pub fn hedge_split(&mut self, h: Node) -> Result<Node, MeshError> {
        let mut record = self.hedge(h)?;
        if record.is_busy() {
            return self.reject(MeshError::Busy {
                hedge: h,
                state: record.regrid,
            });
        }
        let f = record.flip;
        let twin = self.hedge(f)?;
        let twin_split = twin.regrid == RegridState::SplitPending;

        let mid = if twin_split {
            self.hedge(twin.next)?.pivot
        } else {
            let (a, b) = (record.pivot, twin.pivot);
            let (pa, na) = (self.position(a)?, self.normal(a)?);
            let (pb, nb) = (self.position(b)?, self.normal(b)?);
            let p = geometry::hermite_midpoint(pa, na, pb, nb);
            let n = geometry::normalize(geometry::add(na, nb)).unwrap_or(na);
            self.new_vertex(p, n)?
        };

        let old_next = record.next;
        let n = self.new_hedge(HalfEdge {
            next: old_next,
            prev: h,
            flip: f,
            pivot: mid,
            valence: 0,
            face_order: record.face_order,
            edge_side: record.edge_side,
            regrid: RegridState::None,
            boundary: record.boundary,
        })?;
        self.update(old_next, |r| r.prev = n)?;

        record.next = n;
        record.regrid = if record.boundary && twin_split {
            RegridState::None
        } else {
            RegridState::SplitPending
        };
        if twin_split {
            let twin_next = twin.next;
            record.flip = twin_next;
            self.update(twin_next, |r| r.flip = h)?;
            self.update(f, |r| {
                r.flip = n;
                if r.boundary {
                    r.regrid = RegridState::None;
                }
            })?;
        }
        self.put(h, record)?;
        if !twin_split {
            self.set_anchor(mid, n)?;
        }
        log::trace!("hedge_split {h}: midpoint {mid}, new half-edge {n}");
        Ok(n)
    }

    /// Split both halves of the full edge containing `h`.
    ///
    /// Returns the midpoint vertex. Faces are left pending.
    pub fn split_edge(&mut self, h: Node) -> Result<Node, MeshError> {
        let f = self.hedge(h)?.flip;
        let n = self.hedge_split(h)?;
        self.hedge_split(f)?;
        Ok(self.hedge(n)?.pivot)
    }

    /// Re-triangulate the face of pending half-edge `h`.
    ///
    /// With `k` of the face's three original edges pending the face
    /// becomes `k + 1` triangles: the three corners plus the midpoint
    /// triangle for `k = 3`, a cut from the longer edge's midpoint first
    /// for `k = 2`, and a cut to the opposite vertex for `k = 1`. Every
    /// resulting half-edge is relabelled and returned to `None`, and the
    /// valence of every vertex of the new triangles is recounted.
    ///
    /// Every pending edge of the face must already be split on both
    /// sides. Returns one half-edge of each new triangle.
    pub fn hface_split(&mut self, h: Node) -> Result<SmallVec<[Node; 4]>, MeshError> {
        let record = self.hedge(h)?;
        if record.boundary {
            return self.reject(MeshError::Boundary { hedge: h });
        }
        if record.regrid != RegridState::SplitPending {
            return self.reject(MeshError::NotPending {
                hedge: h,
                state: record.regrid,
            });
        }

        let mut originals = [NIL; 3];
        let mut pending = [false; 3];
        let mut current = h;
        for i in 0..3 {
            let r = self.hedge(current)?;
            originals[i] = current;
            pending[i] = r.regrid == RegridState::SplitPending;
            current = if pending[i] {
                self.hedge(r.next)?.next
            } else {
                r.next
            };
        }
        if current != h {
            return Err(MeshError::TraversalOverrun {
                start: h,
                limit: PENDING_FACE_GUARD,
            });
        }

        let mid = |mesh: &Self, i: usize| mesh.hedge(originals[i]).map(|r| r.next);
        for i in (0..3).filter(|&i| pending[i]) {
            let across = self.hedge(self.hedge(originals[i])?.flip)?.pivot;
            if across != self.hedge(mid(self, i)?)?.pivot {
                return self.reject(MeshError::UnpairedSplit {
                    hedge: originals[i],
                });
            }
        }
        let k = pending.iter().filter(|&&p| p).count();
        let mut faces: SmallVec<[Node; 4]> = SmallVec::new();
        match k {
            3 => {
                let m = [mid(self, 0)?, mid(self, 1)?, mid(self, 2)?];
                let (_, inner) = self.cut(m[0], m[1])?;
                self.cut(m[1], m[2])?;
                self.cut(m[2], inner)?;
                faces.extend([m[0], m[1], m[2], inner]);
            }
            2 => {
                let r = pending.iter().position(|&p| !p).unwrap_or(0);
                let (pi, qi) = ((r + 1) % 3, (r + 2) % 3);
                let (mp, mq) = (mid(self, pi)?, mid(self, qi)?);
                if self.second_is_longer(originals[pi], originals[qi])? {
                    let (_, rest) = self.cut(mq, originals[pi])?;
                    self.cut(mp, rest)?;
                    faces.extend([mq, mp, rest]);
                } else {
                    self.cut(mp, originals[r])?;
                    self.cut(mq, mp)?;
                    faces.extend([originals[r], mq, mp]);
                }
            }
            _ => {
                let p = pending.iter().position(|&p| p).unwrap_or(0);
                let mp = mid(self, p)?;
                let opposite = originals[(p + 2) % 3];
                self.cut(mp, opposite)?;
                faces.extend([mp, opposite]);
            }
        }
        let mut rewired: IndexMap<Node, Node> = IndexMap::new();
        for &face in &faces {
            for e in self.seal(face)? {
                rewired.entry(self.hedge(e)?.pivot).or_insert(e);
            }
        }
        for &e in rewired.values() {
            self.refresh_vertex(e)?;
        }
        log::trace!("hface_split {h}: {k} pending, {} triangles", faces.len());
        Ok(faces)
    }

    /// Whole-mesh split pass.
    ///
    /// Refreshes normals, flags every full edge longer than `amax` or with
    /// a poor opposite angle, splits them and re-triangulates every
    /// touched face. Returns the number of edges split.
    pub fn split(&mut self) -> Result<usize, MeshError> {
        self.recompute_normals()?;

        let mut growth: IndexMap<Node, u8> = IndexMap::new();
        let mut flagged = Vec::new();
        for h in self.half_edges()? {
            let record = self.hedge(h)?;
            if record.edge_side != 0 || !self.wants_split(h)? {
                continue;
            }
            let mut opposite: SmallVec<[HalfEdge; 2]> = SmallVec::new();
            for side in [record, self.hedge(record.flip)?] {
                if !side.boundary {
                    opposite.push(self.hedge(side.prev)?);
                }
            }
            let room = opposite.iter().all(|o| {
                let grown = growth.get(&o.pivot).copied().unwrap_or(0);
                o.valence.saturating_add(grown) < MAX_VALENCE
            });
            if !room {
                log::trace!("split of {h} skipped: opposite vertex at valence limit");
                continue;
            }
            for o in opposite {
                *growth.entry(o.pivot).or_default() += 1;
            }
            flagged.push(h);
        }

        for &h in &flagged {
            self.split_edge(h)?;
        }
        for h in self.half_edges()? {
            if self.hedge(h)?.regrid == RegridState::SplitPending {
                self.hface_split(h)?;
            }
        }
        log::debug!("split pass: {} edges split", flagged.len());
        Ok(flagged.len())
    }

    /// Whether the full edge of `h` is too long or sees a poor opposite angle.
    fn wants_split(&self, h: Node) -> Result<bool, MeshError> {
        let config = self.config();
        let record = self.hedge(h)?;
        let twin = self.hedge(record.flip)?;
        let a = self.position(record.pivot)?;
        let b = self.position(twin.pivot)?;
        if geometry::distance(a, b) > config.amax {
            return Ok(true);
        }
        let half_min = config.amin / 2.0;
        for side in [record, twin] {
            if side.boundary {
                continue;
            }
            let apex = self.position(self.hedge(side.prev)?.pivot)?;
            let sides_long =
                geometry::distance(apex, a) > half_min && geometry::distance(apex, b) > half_min;
            if sides_long && geometry::corner_quality(apex, a, b) < config.quality_threshold {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether the original edge of pending `q` is strictly longer than
    /// that of pending `p`, with equal lengths going to the lower face order.
    fn second_is_longer(&self, p: Node, q: Node) -> Result<bool, MeshError> {
        let (rp, rq) = (self.hedge(p)?, self.hedge(q)?);
        let (lp, lq) = (self.original_length(p)?, self.original_length(q)?);
        Ok(lq > lp || (lq == lp && rq.face_order < rp.face_order))
    }

    /// Length of a pending half-edge's edge before it was halved.
    fn original_length(&self, h: Node) -> Result<f64, MeshError> {
        let record = self.hedge(h)?;
        let end = self.hedge(self.hedge(record.next)?.next)?.pivot;
        Ok(geometry::distance(
            self.position(record.pivot)?,
            self.position(end)?,
        ))
    }

    /// Cut the polygon holding `a` and `b` along the diagonal between
    /// their pivots.
    ///
    /// The loop from `a` up to `b` is closed by a new half-edge leaving
    /// `b`'s pivot; the loop from `b` up to `a` by its flip leaving `a`'s
    /// pivot. Returns `(closing half-edge of a's loop, of b's loop)`.
    fn cut(&mut self, a: Node, b: Node) -> Result<(Node, Node), MeshError> {
        let (ra, rb) = (self.hedge(a)?, self.hedge(b)?);
        let mut first = HalfEdge::detached(rb.pivot);
        first.next = a;
        first.prev = rb.prev;
        let d1 = self.new_hedge(first)?;
        let mut second = HalfEdge::detached(ra.pivot);
        second.next = b;
        second.prev = ra.prev;
        second.flip = d1;
        second.edge_side = 1;
        let d2 = self.new_hedge(second)?;
        self.update(d1, |r| r.flip = d2)?;

        self.update(rb.prev, |r| r.next = d1)?;
        self.update(a, |r| r.prev = d1)?;
        self.update(ra.prev, |r| r.next = d2)?;
        self.update(b, |r| r.prev = d2)?;
        Ok((d1, d2))
    }

    /// Label the triangle holding `h` `0, 1, 2` from `h` and clear its
    /// states. Returns its three half-edges.
    fn seal(&mut self, h: Node) -> Result<SmallVec<[Node; 3]>, MeshError> {
        let face = self
            .face_with_limit(h, 3)
            .collect::<Result<SmallVec<[Node; 3]>, _>>()?;
        for (order, &e) in face.iter().enumerate() {
            self.update(e, |r| {
                r.face_order = order as u8;
                r.regrid = RegridState::None;
            })?;
        }
        Ok(face)
    }
}
