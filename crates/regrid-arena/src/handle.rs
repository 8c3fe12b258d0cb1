//! Chunk identifiers and address descriptors.
//!
//! A [`ChunkId`] packs the arena index and the chunk's node index within
//! that arena's row of buddy trees. Everything else about the chunk (its
//! depth, size and byte offset) is derived arithmetically, so resolving
//! an id to memory needs no table lookup.

use std::fmt;

use regrid_core::limits::{MAX_DEPTH, PAGE_SIZE, ROOT_CHUNK_SIZE, TREE_NODES};

/// Bits of the node index field.
const NODE_BITS: u32 = 28;
const NODE_MASK: u32 = (1 << NODE_BITS) - 1;

/// Identity of a live chunk allocation.
///
/// Layout: `arena (4 bits) | node (28 bits)`, where `node` is
/// `tree * 15 + heap` and `heap` is the index of the chunk in its tree's
/// implicit binary heap (root 0, children `2h+1` and `2h+2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct ChunkId(u32);

impl ChunkId {
    pub(crate) fn new(arena: usize, node: usize) -> Self {
        debug_assert!(arena < 16);
        debug_assert!(node <= NODE_MASK as usize);
        Self(((arena as u32) << NODE_BITS) | node as u32)
    }

    pub(crate) fn root(arena: usize, tree: usize) -> Self {
        Self::new(arena, tree * TREE_NODES)
    }

    /// Reconstruct an id from [`raw`](Self::raw).
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The packed representation.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Index of the arena holding this chunk.
    pub fn arena(self) -> usize {
        (self.0 >> NODE_BITS) as usize
    }

    /// Node index within the arena (`tree * 15 + heap`).
    pub fn node(self) -> usize {
        (self.0 & NODE_MASK) as usize
    }

    /// Which buddy tree of the arena the chunk lives in.
    pub fn tree(self) -> usize {
        self.node() / TREE_NODES
    }

    /// Heap index within the tree.
    pub fn heap(self) -> usize {
        self.node() % TREE_NODES
    }

    /// Depth class: 0 for a root chunk, [`MAX_DEPTH`] for a single page.
    pub fn depth(self) -> u8 {
        heap_depth(self.heap())
    }

    /// Size of the chunk in bytes.
    pub fn size(self) -> usize {
        depth_size(self.depth())
    }

    /// Byte offset of the chunk within its arena.
    pub fn offset(self) -> usize {
        let heap = self.heap();
        let depth = heap_depth(heap);
        let position = heap + 1 - (1 << depth);
        self.tree() * ROOT_CHUNK_SIZE + position * depth_size(depth)
    }

    pub(crate) fn with_heap(self, heap: usize) -> Self {
        Self::new(self.arena(), self.tree() * TREE_NODES + heap)
    }

    /// The other half of this chunk's parent. Must not be called on a root.
    pub(crate) fn buddy(self) -> Self {
        let heap = self.heap();
        debug_assert!(heap > 0);
        let sibling = if heap % 2 == 1 { heap + 1 } else { heap - 1 };
        self.with_heap(sibling)
    }

    pub(crate) fn parent(self) -> Self {
        debug_assert!(self.heap() > 0);
        self.with_heap((self.heap() - 1) / 2)
    }

    pub(crate) fn left(self) -> Self {
        self.with_heap(2 * self.heap() + 1)
    }

    pub(crate) fn right(self) -> Self {
        self.with_heap(2 * self.heap() + 2)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChunkId(arena={}, tree={}, heap={}, depth={})",
            self.arena(),
            self.tree(),
            self.heap(),
            self.depth()
        )
    }
}

/// Resolved location of a chunk: arena, byte offset and length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkAddress {
    /// Arena index.
    pub arena: usize,
    /// Byte offset within the arena.
    pub offset: usize,
    /// Chunk length in bytes.
    pub len: usize,
}

/// Depth of a heap index: `floor(log2(heap + 1))`.
pub(crate) fn heap_depth(heap: usize) -> u8 {
    (usize::BITS - 1 - (heap + 1).leading_zeros()) as u8
}

/// Size in bytes of a chunk at `depth`.
pub fn depth_size(depth: u8) -> usize {
    PAGE_SIZE << (MAX_DEPTH - depth)
}

/// Shallowest depth whose chunks can hold `size` bytes, if any can.
pub fn depth_for_size(size: usize) -> Option<u8> {
    if size == 0 || size > ROOT_CHUNK_SIZE {
        return None;
    }
    let pages = size.div_ceil(PAGE_SIZE).next_power_of_two();
    Some(MAX_DEPTH - pages.trailing_zeros() as u8)
}
