//! The buddy-system chunk allocator.
//!
//! [`ChunkAllocator`] hands out power-of-two chunks from 4 KiB to 32 KiB.
//! Allocation pops the smallest free chunk at or above the requested size
//! and splits it down, pushing each unused buddy half onto the free list
//! of its depth. Deallocation merges a chunk with its buddy for as long as
//! the buddy is free, then pushes the result.
//!
//! The allocator is an explicit context: every store and cell set that
//! needs memory is handed `&mut ChunkAllocator`, so independent meshes
//! never share allocation state.

use indexmap::IndexSet;
use regrid_core::limits::{ARENA_MIN_BYTES, DEPTH_CLASSES, MAX_DEPTH, ROOT_CHUNK_SIZE};
use regrid_core::ErrorLog;

use crate::arena::{Arena, ChunkState};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{depth_for_size, ChunkAddress, ChunkId};

const COMPONENT: &str = "arena";

/// Buddy allocator over a growable list of arenas.
pub struct ChunkAllocator {
    config: ArenaConfig,
    arenas: Vec<Arena>,
    /// Free chunks per depth. Out of band: freed chunk memory is never read.
    free: [IndexSet<ChunkId>; DEPTH_CLASSES],
    live: usize,
    log: ErrorLog,
}

impl ChunkAllocator {
    /// Create an allocator with its own diagnostic log.
    ///
    /// No memory is reserved until the first allocation.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_log(config, ErrorLog::new())
    }

    /// Create an allocator that records rejected requests into `log`.
    pub fn with_log(config: ArenaConfig, log: ErrorLog) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            config,
            arenas: Vec::new(),
            free: std::array::from_fn(|_| IndexSet::new()),
            live: 0,
            log,
        })
    }

    /// Allocate a chunk of `PAGE_SIZE << (MAX_DEPTH - depth)` bytes.
    ///
    /// Maps a new arena when no free chunk at or above `depth` exists.
    pub fn allocate(&mut self, depth: u8) -> Result<ChunkId, ArenaError> {
        if depth > MAX_DEPTH {
            return self.reject(ArenaError::InvalidDepth { depth });
        }
        loop {
            for level in (0..=depth).rev() {
                if let Some(id) = self.free[level as usize].pop() {
                    return Ok(self.split_down(id, depth));
                }
            }
            self.map_arena()?;
        }
    }

    /// Allocate the smallest chunk that holds `size` bytes.
    pub fn allocate_general(&mut self, size: usize) -> Result<ChunkId, ArenaError> {
        match depth_for_size(size) {
            Some(depth) => self.allocate(depth),
            None => self.reject(ArenaError::InvalidSize { size }),
        }
    }

    /// Allocate a single page.
    pub fn allocate_page(&mut self) -> Result<ChunkId, ArenaError> {
        self.allocate(MAX_DEPTH)
    }

    /// Resolve a live chunk to its arena, offset and length.
    pub fn address(&self, id: ChunkId) -> Result<ChunkAddress, ArenaError> {
        if let Err(e) = self.check_live(id) {
            return self.reject(e);
        }
        Ok(ChunkAddress {
            arena: id.arena(),
            offset: id.offset(),
            len: id.size(),
        })
    }

    /// Shared view of a live chunk's bytes.
    pub fn chunk(&self, id: ChunkId) -> Result<&[u8], ArenaError> {
        self.check_live(id)?;
        Ok(self.arenas[id.arena()].bytes(id.offset(), id.size()))
    }

    /// Mutable view of a live chunk's bytes.
    pub fn chunk_mut(&mut self, id: ChunkId) -> Result<&mut [u8], ArenaError> {
        self.check_live(id)?;
        Ok(self.arenas[id.arena()].bytes_mut(id.offset(), id.size()))
    }

    /// Return a chunk, coalescing it with free buddies.
    ///
    /// Rejects ids that are not currently allocated without touching any
    /// state.
    pub fn deallocate(&mut self, id: ChunkId) -> Result<(), ArenaError> {
        if let Err(e) = self.check_live(id) {
            return self.reject(e);
        }
        let arena = &mut self.arenas[id.arena()];
        let mut current = id;
        let mut depth = id.depth();
        while depth > 0 {
            let buddy = current.buddy();
            if arena.state(buddy.node()) != ChunkState::Free {
                break;
            }
            self.free[depth as usize].swap_remove(&buddy);
            arena.set_state(buddy.node(), ChunkState::Spare);
            arena.set_state(current.node(), ChunkState::Spare);
            current = current.parent();
            depth -= 1;
        }
        arena.set_state(current.node(), ChunkState::Free);
        self.free[depth as usize].insert(current);
        self.live -= 1;
        Ok(())
    }

    /// Release every arena. All outstanding ids become invalid.
    pub fn destroy_all(&mut self) {
        log::debug!(
            "releasing {} arenas ({} live chunks)",
            self.arenas.len(),
            self.live
        );
        self.arenas.clear();
        for list in &mut self.free {
            list.clear();
        }
        self.live = 0;
    }

    /// Whether `id` currently names an allocated chunk.
    pub fn is_live(&self, id: ChunkId) -> bool {
        self.check_live(id).is_ok()
    }

    /// Number of arenas reserved so far.
    pub fn arena_count(&self) -> usize {
        self.arenas.len()
    }

    /// Number of chunks currently handed out.
    pub fn live_chunks(&self) -> usize {
        self.live
    }

    /// Total bytes reserved across all arenas.
    pub fn reserved_bytes(&self) -> usize {
        self.arenas.iter().map(Arena::size).sum()
    }

    /// Number of free chunks at each depth, root first.
    pub fn free_depth_histogram(&self) -> [usize; DEPTH_CLASSES] {
        std::array::from_fn(|depth| self.free[depth].len())
    }

    /// The diagnostic log this allocator records into.
    pub fn log(&self) -> &ErrorLog {
        &self.log
    }

    /// The configuration the allocator was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Mark `id` (popped from depth `id.depth()`) and split it down to `depth`.
    fn split_down(&mut self, id: ChunkId, depth: u8) -> ChunkId {
        let arena = &mut self.arenas[id.arena()];
        let mut current = id;
        for level in id.depth()..depth {
            arena.set_state(current.node(), ChunkState::Split);
            let spare = current.right();
            arena.set_state(spare.node(), ChunkState::Free);
            self.free[level as usize + 1].insert(spare);
            current = current.left();
        }
        arena.set_state(current.node(), ChunkState::Used);
        self.live += 1;
        current
    }

    fn map_arena(&mut self) -> Result<(), ArenaError> {
        if self.arenas.len() >= self.config.max_arenas {
            return self.reject(ArenaError::ArenaLimit {
                arenas: self.arenas.len(),
            });
        }
        let mut size = self.config.arena_bytes;
        loop {
            if self.within_budget(size) {
                if let Some(arena) = Arena::reserve(size) {
                    let index = self.arenas.len();
                    log::debug!("mapped arena {index}: {size} bytes, {} trees", arena.trees());
                    // Reverse order so tree 0 is popped first.
                    for tree in (0..arena.trees()).rev() {
                        self.free[0].insert(ChunkId::root(index, tree));
                    }
                    self.arenas.push(arena);
                    return Ok(());
                }
            }
            let halved = (size / 2) / ROOT_CHUNK_SIZE * ROOT_CHUNK_SIZE;
            if halved < ARENA_MIN_BYTES {
                return self.reject(ArenaError::OutOfMemory { attempted: size });
            }
            log::debug!("arena reservation of {size} bytes refused, retrying with {halved}");
            size = halved;
        }
    }

    fn within_budget(&self, size: usize) -> bool {
        self.config
            .budget_bytes
            .is_none_or(|budget| self.reserved_bytes() + size <= budget)
    }

    fn check_live(&self, id: ChunkId) -> Result<(), ArenaError> {
        let arena = self
            .arenas
            .get(id.arena())
            .ok_or(ArenaError::InvalidChunk { id })?;
        if id.node() >= arena.node_count() {
            return Err(ArenaError::InvalidChunk { id });
        }
        match arena.state(id.node()) {
            ChunkState::Used => Ok(()),
            ChunkState::Split => Err(ArenaError::InvalidChunk { id }),
            ChunkState::Free | ChunkState::Spare => Err(ArenaError::DoubleFree { id }),
        }
    }

    fn reject<T>(&self, err: ArenaError) -> Result<T, ArenaError> {
        self.log.record(COMPONENT, &err);
        Err(err)
    }
}

impl std::fmt::Debug for ChunkAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkAllocator")
            .field("arenas", &self.arenas.len())
            .field("live", &self.live)
            .field("free", &self.free_depth_histogram())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regrid_core::limits::PAGE_SIZE;

    fn small() -> ChunkAllocator {
        ChunkAllocator::new(ArenaConfig::new().with_arena_bytes(ARENA_MIN_BYTES)).unwrap()
    }

    #[test]
    fn first_allocation_maps_an_arena() {
        let mut alloc = small();
        assert_eq!(alloc.arena_count(), 0);
        let id = alloc.allocate_page().unwrap();
        assert_eq!(alloc.arena_count(), 1);
        assert_eq!(id.depth(), MAX_DEPTH);
        assert_eq!(id.size(), PAGE_SIZE);
        // Root of tree 0 split down to a page leaves one free buddy per level,
        // plus the untouched root of tree 1.
        assert_eq!(alloc.free_depth_histogram(), [1, 1, 1, 1]);
    }

    #[test]
    fn split_chunks_do_not_overlap() {
        let mut alloc = small();
        let a = alloc.allocate(3).unwrap();
        let b = alloc.allocate(3).unwrap();
        let c = alloc.allocate(2).unwrap();
        let ranges: Vec<_> = [a, b, c]
            .iter()
            .map(|&id| {
                let addr = alloc.address(id).unwrap();
                (addr.arena, addr.offset, addr.offset + addr.len)
            })
            .collect();
        for (i, x) in ranges.iter().enumerate() {
            for y in &ranges[i + 1..] {
                assert!(x.0 != y.0 || x.2 <= y.1 || y.2 <= x.1, "{x:?} overlaps {y:?}");
            }
        }
    }

    #[test]
    fn freeing_buddies_coalesces_to_root() {
        let mut alloc = small();
        let before_first = alloc.allocate(0).unwrap();
        alloc.deallocate(before_first).unwrap();
        let baseline = alloc.free_depth_histogram();
        assert_eq!(baseline, [2, 0, 0, 0]);

        let a = alloc.allocate(3).unwrap();
        let b = alloc.allocate(3).unwrap();
        alloc.deallocate(a).unwrap();
        alloc.deallocate(b).unwrap();
        assert_eq!(alloc.free_depth_histogram(), baseline);
        assert_eq!(alloc.live_chunks(), 0);
    }

    #[test]
    fn freed_chunk_is_reused() {
        let mut alloc = ChunkAllocator::new(ArenaConfig::new()).unwrap();
        let _d3 = alloc.allocate(3).unwrap();
        let _d2 = alloc.allocate(2).unwrap();
        let d1 = alloc.allocate(1).unwrap();
        let _d0 = alloc.allocate(0).unwrap();
        alloc.deallocate(d1).unwrap();
        let again = alloc.allocate(1).unwrap();
        assert_eq!(again, d1);
        assert_eq!(alloc.arena_count(), 1);
    }

    #[test]
    fn double_free_is_rejected_and_logged() {
        let mut alloc = small();
        let id = alloc.allocate(2).unwrap();
        alloc.deallocate(id).unwrap();
        let histogram = alloc.free_depth_histogram();
        assert_eq!(alloc.deallocate(id), Err(ArenaError::DoubleFree { id }));
        assert_eq!(alloc.free_depth_histogram(), histogram);
        let lines = alloc.log().drain();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("arena: "));
    }

    #[test]
    fn unknown_arena_is_invalid() {
        let mut alloc = small();
        let id = ChunkId::root(7, 0);
        assert_eq!(alloc.deallocate(id), Err(ArenaError::InvalidChunk { id }));
    }

    #[test]
    fn split_node_is_not_a_chunk() {
        let mut alloc = small();
        let leaf = alloc.allocate(3).unwrap();
        let root = leaf.parent().parent().parent();
        assert_eq!(alloc.address(root), Err(ArenaError::InvalidChunk { id: root }));
    }

    #[test]
    fn invalid_depth_and_size() {
        let mut alloc = small();
        assert_eq!(alloc.allocate(4), Err(ArenaError::InvalidDepth { depth: 4 }));
        assert_eq!(
            alloc.allocate_general(0),
            Err(ArenaError::InvalidSize { size: 0 })
        );
        assert_eq!(
            alloc.allocate_general(ROOT_CHUNK_SIZE + 1),
            Err(ArenaError::InvalidSize {
                size: ROOT_CHUNK_SIZE + 1
            })
        );
        assert_eq!(alloc.arena_count(), 0);
    }

    #[test]
    fn allocate_general_rounds_up() {
        let mut alloc = small();
        let id = alloc.allocate_general(3 * PAGE_SIZE).unwrap();
        assert_eq!(id.size(), 4 * PAGE_SIZE);
        let id = alloc.allocate_general(PAGE_SIZE + 1).unwrap();
        assert_eq!(id.size(), 2 * PAGE_SIZE);
    }

    #[test]
    fn arena_limit_is_reported() {
        let config = ArenaConfig::new()
            .with_arena_bytes(ARENA_MIN_BYTES)
            .with_max_arenas(1);
        let mut alloc = ChunkAllocator::new(config).unwrap();
        alloc.allocate(0).unwrap();
        alloc.allocate(0).unwrap();
        assert_eq!(
            alloc.allocate(0),
            Err(ArenaError::ArenaLimit { arenas: 1 })
        );
        assert_eq!(alloc.live_chunks(), 2);
    }

    #[test]
    fn budget_failure_halves_reservation() {
        let config = ArenaConfig::new()
            .with_arena_bytes(8 * ROOT_CHUNK_SIZE)
            .with_budget(3 * ROOT_CHUNK_SIZE);
        let mut alloc = ChunkAllocator::new(config).unwrap();
        alloc.allocate(0).unwrap();
        // 8 roots refused, 4 refused, 2 accepted.
        assert_eq!(alloc.reserved_bytes(), 2 * ROOT_CHUNK_SIZE);
        alloc.allocate(0).unwrap();
        assert!(matches!(
            alloc.allocate(0),
            Err(ArenaError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn chunk_bytes_are_writable() {
        let mut alloc = small();
        let id = alloc.allocate_page().unwrap();
        alloc.chunk_mut(id).unwrap()[10] = 42;
        assert_eq!(alloc.chunk(id).unwrap()[10], 42);
        assert_eq!(alloc.chunk(id).unwrap().len(), PAGE_SIZE);
    }

    #[test]
    fn destroy_all_invalidates_ids() {
        let mut alloc = small();
        let id = alloc.allocate_page().unwrap();
        alloc.destroy_all();
        assert!(!alloc.is_live(id));
        assert_eq!(alloc.arena_count(), 0);
        assert_eq!(alloc.free_depth_histogram(), [0; DEPTH_CLASSES]);
    }
}
