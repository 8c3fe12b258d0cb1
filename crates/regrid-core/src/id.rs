//! Strongly-typed identifiers for cell-set nodes.

use std::fmt;

/// Identity of a node allocated from a cell set.
///
/// A node is the pair `(block, slot)` into the owning cell set, plus the
/// generation the slot carried when it was handed out. The generation is
/// bumped on every allocation of the slot, so a handle kept past
/// `node_remove` is detected as stale instead of silently aliasing the
/// slot's next occupant.
///
/// The derived ordering (block, slot, generation) is the stable
/// precedence used when two vertices are merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    /// Index of the block within the cell set.
    pub block: u16,
    /// Slot within the block.
    pub slot: u16,
    /// Generation of the slot when this handle was issued.
    pub generation: u32,
}

impl Node {
    /// Build a node handle from its parts.
    pub const fn new(block: u16, slot: u16, generation: u32) -> Self {
        Self {
            block,
            slot,
            generation,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.block, self.slot, self.generation)
    }
}

/// The kind of mesh element a cell set stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// 0-cells.
    Points,
    /// 1-cells (edges or half-edges).
    Edges,
    /// 2-cells.
    Faces,
    /// 3-cells.
    Volumes,
}

impl Dimension {
    /// Topological dimension of the element kind.
    pub fn rank(self) -> u8 {
        match self {
            Self::Points => 0,
            Self::Edges => 1,
            Self::Faces => 2,
            Self::Volumes => 3,
        }
    }

    /// Element kind for a topological dimension, if it is in `0..=3`.
    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Self::Points),
            1 => Some(Self::Edges),
            2 => Some(Self::Faces),
            3 => Some(Self::Volumes),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Points => "points",
            Self::Edges => "edges",
            Self::Faces => "faces",
            Self::Volumes => "volumes",
        };
        f.write_str(name)
    }
}
