//! Arena reservations and their buddy-tree state arrays.

use regrid_core::limits::{ROOT_CHUNK_SIZE, TREE_NODES};

/// Out-of-band state of one buddy-tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkState {
    /// Covered by an ancestor that is free or allocated whole.
    Spare,
    /// On the free list of its depth.
    Free,
    /// Handed out to a caller.
    Used,
    /// Split into two children.
    Split,
}

/// One reserved region, carved into `trees` buddy trees.
///
/// The backing memory is zero-filled on reservation. It is never
/// reallocated, so byte offsets stay valid for the arena's lifetime.
pub(crate) struct Arena {
    bytes: Vec<u8>,
    states: Vec<ChunkState>,
}

impl Arena {
    /// Try to reserve `size` bytes. Returns `None` if the request is refused.
    pub(crate) fn reserve(size: usize) -> Option<Self> {
        debug_assert_eq!(size % ROOT_CHUNK_SIZE, 0);
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size).ok()?;
        bytes.resize(size, 0);
        let trees = size / ROOT_CHUNK_SIZE;
        let mut states = vec![ChunkState::Spare; trees * TREE_NODES];
        for tree in 0..trees {
            states[tree * TREE_NODES] = ChunkState::Free;
        }
        Some(Self { bytes, states })
    }

    pub(crate) fn trees(&self) -> usize {
        self.bytes.len() / ROOT_CHUNK_SIZE
    }

    pub(crate) fn size(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn state(&self, node: usize) -> ChunkState {
        self.states[node]
    }

    pub(crate) fn set_state(&mut self, node: usize, state: ChunkState) {
        self.states[node] = state;
    }

    pub(crate) fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }

    pub(crate) fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.bytes[offset..offset + len]
    }
}
