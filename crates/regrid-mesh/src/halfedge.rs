//! The per-half-edge record.

use regrid_core::Node;
use regrid_store::Element;

/// Progress of an in-flight topology edit on one half-edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RegridState {
    /// No edit touches this half-edge.
    #[default]
    None = 0,
    /// The half-edge has a midpoint; its face is not yet re-triangulated.
    SplitPending = 1,
    /// The half-edge's full edge has an accepted collapse request.
    CollapsePending = 2,
    /// The half-edge lies in the neighbourhood of an accepted collapse.
    Locked = 3,
}

impl RegridState {
    fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::SplitPending,
            2 => Self::CollapsePending,
            3 => Self::Locked,
            _ => Self::None,
        }
    }
}

/// Handle that is never live: slot 0 of every block is a list sentinel.
pub const NIL: Node = Node::new(0, 0, 0);

/// One directed edge of one triangle, or of a boundary loop.
///
/// `pivot` is the vertex the half-edge leaves. `valence` caches the
/// valence of that vertex, so every half-edge around a vertex carries
/// the same value. `face_order` numbers the three half-edges of a face
/// `0, 1, 2` along `next`. Of the two half-edges of a full edge exactly
/// one has `edge_side == 0`, which picks a representative per edge.
///
/// On an open surface every unpaired triangle edge gets a `boundary`
/// twin. Boundary half-edges belong to no face: `next` and `prev` walk
/// the boundary loop, which runs against the orientation of the
/// triangles beside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HalfEdge {
    /// Next half-edge around the face.
    pub next: Node,
    /// Previous half-edge around the face.
    pub prev: Node,
    /// Opposite half-edge of the same full edge.
    pub flip: Node,
    /// Vertex this half-edge leaves.
    pub pivot: Node,
    /// Cached valence of `pivot`.
    pub valence: u8,
    /// Position within the face, `0..3`.
    pub face_order: u8,
    /// Which side of the full edge this is, `0` or `1`.
    pub edge_side: u8,
    /// In-flight edit state.
    pub regrid: RegridState,
    /// Whether this half-edge lies outside the surface.
    pub boundary: bool,
}

impl HalfEdge {
    /// A record with every link unset.
    pub fn detached(pivot: Node) -> Self {
        Self {
            next: NIL,
            prev: NIL,
            flip: NIL,
            pivot,
            valence: 0,
            face_order: 0,
            edge_side: 0,
            regrid: RegridState::None,
            boundary: false,
        }
    }

    /// Whether an edit has claimed this half-edge.
    pub fn is_busy(&self) -> bool {
        self.regrid != RegridState::None
    }
}

impl Element for HalfEdge {
    const SIZE: usize = 4 * Node::SIZE + 5;

    fn read(bytes: &[u8]) -> Self {
        let node = |i: usize| Node::read(&bytes[i * Node::SIZE..(i + 1) * Node::SIZE]);
        let tail = 4 * Node::SIZE;
        Self {
            next: node(0),
            prev: node(1),
            flip: node(2),
            pivot: node(3),
            valence: bytes[tail],
            face_order: bytes[tail + 1],
            edge_side: bytes[tail + 2],
            regrid: RegridState::from_byte(bytes[tail + 3]),
            boundary: bytes[tail + 4] != 0,
        }
    }

    fn write(&self, bytes: &mut [u8]) {
        for (i, node) in [self.next, self.prev, self.flip, self.pivot].iter().enumerate() {
            node.write(&mut bytes[i * Node::SIZE..(i + 1) * Node::SIZE]);
        }
        let tail = 4 * Node::SIZE;
        bytes[tail] = self.valence;
        bytes[tail + 1] = self.face_order;
        bytes[tail + 2] = self.edge_side;
        bytes[tail + 3] = self.regrid as u8;
        bytes[tail + 4] = u8::from(self.boundary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regrid_core::limits::MAX_ELEMENT_SIZE;

    #[test]
    fn record_fits_a_block_slot() {
        assert_eq!(HalfEdge::SIZE, 37);
        assert!(HalfEdge::SIZE <= MAX_ELEMENT_SIZE);
    }

    #[test]
    fn record_encoding_keeps_every_field() {
        let record = HalfEdge {
            next: Node::new(1, 2, 3),
            prev: Node::new(4, 5, 6),
            flip: Node::new(7, 8, 9),
            pivot: Node::new(0, 10, 11),
            valence: 6,
            face_order: 2,
            edge_side: 1,
            regrid: RegridState::Locked,
            boundary: true,
        };
        let mut buf = [0u8; HalfEdge::SIZE];
        record.write(&mut buf);
        assert_eq!(HalfEdge::read(&buf), record);
    }

    #[test]
    fn zeroed_bytes_decode_as_idle_detached() {
        let record = HalfEdge::read(&[0u8; HalfEdge::SIZE]);
        assert_eq!(record, HalfEdge::detached(NIL));
        assert!(!record.is_busy());
    }
}
