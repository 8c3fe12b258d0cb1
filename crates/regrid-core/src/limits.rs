//! Hard limits enforced at the storage boundary.
//!
//! These are fixed by the encoding of [`Node`](crate::Node) and of the
//! chunk identifiers, not tunables. Tunables live in the per-crate config
//! types.

/// Size of the smallest chunk class in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Maximum depth of a buddy tree. Depth 0 is the root chunk.
pub const MAX_DEPTH: u8 = 3;

/// Number of chunk size classes (`1×` to `8×` a page).
pub const DEPTH_CLASSES: usize = MAX_DEPTH as usize + 1;

/// Size of a buddy-tree root chunk in bytes.
pub const ROOT_CHUNK_SIZE: usize = PAGE_SIZE << MAX_DEPTH;

/// Number of nodes in one buddy tree (`2^(MAX_DEPTH+1) - 1`).
pub const TREE_NODES: usize = (1 << (MAX_DEPTH + 1)) - 1;

/// Default size of an arena reservation in bytes.
pub const ARENA_TARGET_BYTES: usize = 8 * 1024 * 1024;

/// Smallest arena the allocator will fall back to.
pub const ARENA_MIN_BYTES: usize = 2 * ROOT_CHUNK_SIZE;

/// Maximum number of arenas one allocator may map.
pub const MAX_ARENAS: usize = 16;

/// Number of slots in every store block.
pub const BLOCK_CAPACITY: usize = 512;

/// Largest element a store block can hold (one block fills a root chunk).
pub const MAX_ELEMENT_SIZE: usize = ROOT_CHUNK_SIZE / BLOCK_CAPACITY;

/// Maximum number of blocks per store (16-bit slot indices).
pub const MAX_BLOCKS: usize = u16::MAX as usize;

/// Maximum byte length of an attribute name.
pub const MAX_NAME_LEN: usize = 31;

/// Maximum number of scalar attributes registered on one cell set.
pub const MAX_SCALARS: usize = 64;

/// Smallest vertex valence a valid surface mesh may carry.
pub const MIN_VALENCE: u8 = 3;

/// Largest vertex valence a valid surface mesh may carry.
pub const MAX_VALENCE: u8 = 10;

/// Step guard for walks around a vertex's one-ring.
pub const RING_GUARD: usize = 64;
