//! Whole-mesh invariant checking.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use regrid_core::limits::{MAX_VALENCE, MIN_VALENCE};
use regrid_core::Node;

use crate::geometry;
use crate::halfedge::{HalfEdge, RegridState};
use crate::mesh::HalfEdgeMesh;

/// Set of invariant violations found by [`HalfEdgeMesh::valid`].
///
/// Empty means the mesh is valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ValidityReport(u16);

impl ValidityReport {
    /// A link is dead or stale, or `next`/`prev` disagree.
    pub const INCOMPLETE: Self = Self(1);
    /// A half-edge's pivot disagrees with its ring or its flip.
    pub const PIVOT_MISMATCH: Self = Self(2);
    /// A cached valence differs from the counted one.
    pub const VALENCE_MISMATCH: Self = Self(4);
    /// A valence lies outside `MIN_VALENCE..=MAX_VALENCE`.
    ///
    /// The upper bound is inclusive: 10 is accepted, one past the
    /// half-open `[3, 10)` a fresh surface is expected to hold, because the
    /// collapse gate admits merges up to exactly `MAX_VALENCE`.
    pub const VALENCE_RANGE: Self = Self(8);
    /// A face does not close after three steps.
    pub const FACE_NOT_TRIANGLE: Self = Self(16);
    /// Face-order labels are not `0, 1, 2` along `next`.
    pub const FACE_ORDER: Self = Self(32);
    /// `flip(flip(h)) != h`.
    pub const FLIP_NOT_INVOLUTION: Self = Self(64);
    /// An edge has zero length.
    pub const ZERO_LENGTH_EDGE: Self = Self(128);
    /// A half-edge carries an unfinished edit.
    pub const PENDING_STATE: Self = Self(256);
    /// The two sides of a full edge are not `0` and `1`.
    pub const EDGE_SIDE: Self = Self(512);
    /// A boundary loop links to a face half-edge, or both halves of an
    /// edge lie on the boundary.
    pub const BOUNDARY: Self = Self(1024);

    const NAMES: [(Self, &'static str); 11] = [
        (Self::INCOMPLETE, "INCOMPLETE"),
        (Self::PIVOT_MISMATCH, "PIVOT_MISMATCH"),
        (Self::VALENCE_MISMATCH, "VALENCE_MISMATCH"),
        (Self::VALENCE_RANGE, "VALENCE_RANGE"),
        (Self::FACE_NOT_TRIANGLE, "FACE_NOT_TRIANGLE"),
        (Self::FACE_ORDER, "FACE_ORDER"),
        (Self::FLIP_NOT_INVOLUTION, "FLIP_NOT_INVOLUTION"),
        (Self::ZERO_LENGTH_EDGE, "ZERO_LENGTH_EDGE"),
        (Self::PENDING_STATE, "PENDING_STATE"),
        (Self::EDGE_SIDE, "EDGE_SIDE"),
        (Self::BOUNDARY, "BOUNDARY"),
    ];

    /// The raw bitmask.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Whether no violation was found.
    pub fn is_valid(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ValidityReport {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ValidityReport {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ValidityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("valid");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl HalfEdgeMesh {
    /// Check every topological invariant of the mesh.
    ///
    /// Valences are accepted in `MIN_VALENCE..=MAX_VALENCE`. Boundary
    /// half-edges are held to the link, flip and ring rules but not to the
    /// triangle rules. Broken links are reported rather than followed, so
    /// this never fails.
    pub fn valid(&self) -> ValidityReport {
        let mut report = ValidityReport::default();
        let Ok(hedges) = self.half_edges() else {
            return ValidityReport::INCOMPLETE;
        };
        for h in hedges {
            report |= self.check_hedge(h);
        }
        match self.vertices() {
            Ok(vertices) => {
                for v in vertices {
                    let anchored = self
                        .anchor(v)
                        .and_then(|a| self.hedge(a))
                        .is_ok_and(|r| r.pivot == v);
                    if !anchored {
                        report |= ValidityReport::INCOMPLETE;
                    }
                }
            }
            Err(_) => report |= ValidityReport::INCOMPLETE,
        }
        report
    }

    fn check_hedge(&self, h: Node) -> ValidityReport {
        let mut report = ValidityReport::default();
        let Some((record, next, prev, flip)) = self.linked(h) else {
            return ValidityReport::INCOMPLETE;
        };
        if next.prev != h || prev.next != h {
            report |= ValidityReport::INCOMPLETE;
        }
        if next.boundary != record.boundary
            || prev.boundary != record.boundary
            || (record.boundary && flip.boundary)
        {
            report |= ValidityReport::BOUNDARY;
        }
        if !record.boundary {
            if self.hedge(next.next).map(|r| r.next) != Ok(h) {
                report |= ValidityReport::FACE_NOT_TRIANGLE;
            }
            if record.face_order > 2 || next.face_order != (record.face_order + 1) % 3 {
                report |= ValidityReport::FACE_ORDER;
            }
        }
        if flip.flip != h || record.flip == h {
            report |= ValidityReport::FLIP_NOT_INVOLUTION;
        }
        if flip.pivot != next.pivot {
            report |= ValidityReport::PIVOT_MISMATCH;
        }
        if !matches!((record.edge_side, flip.edge_side), (0, 1) | (1, 0)) {
            report |= ValidityReport::EDGE_SIDE;
        }
        if record.regrid != RegridState::None {
            report |= ValidityReport::PENDING_STATE;
        }
        if !(MIN_VALENCE..=MAX_VALENCE).contains(&record.valence) {
            report |= ValidityReport::VALENCE_RANGE;
        }
        match (self.position(record.pivot), self.position(next.pivot)) {
            (Ok(a), Ok(b)) => {
                if geometry::distance(a, b) == 0.0 {
                    report |= ValidityReport::ZERO_LENGTH_EDGE;
                }
            }
            _ => report |= ValidityReport::INCOMPLETE,
        }

        let mut counted = 0usize;
        for o in self.ring(h) {
            let Ok(other) = o.and_then(|o| self.hedge(o)) else {
                report |= ValidityReport::INCOMPLETE;
                break;
            };
            counted += 1;
            if other.pivot != record.pivot {
                report |= ValidityReport::PIVOT_MISMATCH;
            }
            if other.valence != record.valence {
                report |= ValidityReport::VALENCE_MISMATCH;
            }
        }
        if counted != record.valence as usize {
            report |= ValidityReport::VALENCE_MISMATCH;
        }
        report
    }

    /// A record and its three neighbours, if every link is live.
    fn linked(&self, h: Node) -> Option<(HalfEdge, HalfEdge, HalfEdge, HalfEdge)> {
        let record = self.hedge(h).ok()?;
        self.points.check_live(&self.alloc, record.pivot).ok()?;
        let next = self.hedge(record.next).ok()?;
        let prev = self.hedge(record.prev).ok()?;
        let flip = self.hedge(record.flip).ok()?;
        Some((record, next, prev, flip))
    }
}
