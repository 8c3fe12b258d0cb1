//! Node allocation for one kind of mesh element.
//!
//! A [`CellSet`] hands out [`Node`] identities. Each block of
//! `BLOCK_CAPACITY` slots threads two circular doubly-linked lists through
//! a link record per slot:
//!
//! ```text
//! slot 0            free-list sentinel
//! slots 1..=510     live nodes, each on exactly one of the two lists
//! slot 511          used-list sentinel
//! ```
//!
//! The link records live in the cell set's own block store, so the node
//! store and every scalar attribute attached to it share one block
//! numbering. Scalars are accommodated whenever a node block is added.

use indexmap::IndexMap;
use regrid_arena::ChunkAllocator;
use regrid_core::limits::{BLOCK_CAPACITY, MAX_BLOCKS, MAX_SCALARS};
use regrid_core::{Dimension, Node};

use crate::attribute::{validate_name, AttributeStore};
use crate::element::{read_u16, read_u32, write_u16, write_u32, Element};
use crate::error::StoreError;
use crate::index_stack::IndexStack;

const COMPONENT: &str = "cells";

/// Free-list sentinel slot.
const FREE_HEAD: u16 = 0;
/// Used-list sentinel slot.
const USED_HEAD: u16 = (BLOCK_CAPACITY - 1) as u16;

/// Live nodes one block can hold.
pub const NODES_PER_BLOCK: usize = BLOCK_CAPACITY - 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Free,
    Used,
    Sentinel,
}

/// Per-slot list threading and generation.
#[derive(Clone, Copy, Debug)]
struct Link {
    prev: u16,
    next: u16,
    generation: u32,
    state: SlotState,
}

impl Element for Link {
    const SIZE: usize = 9;

    fn read(bytes: &[u8]) -> Self {
        let state = match bytes[8] {
            1 => SlotState::Used,
            2 => SlotState::Sentinel,
            _ => SlotState::Free,
        };
        Self {
            prev: read_u16(bytes, 0),
            next: read_u16(bytes, 2),
            generation: read_u32(bytes, 4),
            state,
        }
    }

    fn write(&self, bytes: &mut [u8]) {
        write_u16(bytes, 0, self.prev);
        write_u16(bytes, 2, self.next);
        write_u32(bytes, 4, self.generation);
        bytes[8] = match self.state {
            SlotState::Free => 0,
            SlotState::Used => 1,
            SlotState::Sentinel => 2,
        };
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct BlockCounts {
    used: u16,
    free: u16,
}

/// Node allocator and scalar-attribute registry for one element kind.
pub struct CellSet {
    dimension: Dimension,
    links: AttributeStore<Link>,
    counts: Vec<BlockCounts>,
    /// Block tried first by `node_new`.
    current: usize,
    scalars: IndexMap<String, AttributeStore<f64>>,
    len: usize,
}

impl CellSet {
    /// Create an empty cell set. No memory is taken until the first node.
    pub fn create(dimension: Dimension) -> Result<Self, StoreError> {
        Ok(Self {
            dimension,
            links: AttributeStore::create(&format!("{dimension}_links"))?,
            counts: Vec::new(),
            current: 0,
            scalars: IndexMap::new(),
            len: 0,
        })
    }

    /// The element kind stored.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of node blocks allocated.
    pub fn block_count(&self) -> usize {
        self.counts.len()
    }

    /// Occupied node blocks, the reference for accommodating attribute stores.
    pub fn blocks(&self) -> &IndexStack {
        self.links.occupied()
    }

    /// Allocate a node, adding a block if every existing block is full.
    pub fn node_new(&mut self, alloc: &mut ChunkAllocator) -> Result<Node, StoreError> {
        let block = match self.block_with_space() {
            Some(block) => block,
            None => self.add_block(alloc)?,
        };
        self.current = block;
        let b = block as u16;

        let slot = self.link(alloc, b, FREE_HEAD)?.next;
        debug_assert_ne!(slot, FREE_HEAD, "free count out of sync with free list");
        self.unlink(alloc, b, slot)?;
        let tail = self.link(alloc, b, USED_HEAD)?.prev;
        self.insert_after(alloc, b, tail, slot)?;

        let mut link = self.link(alloc, b, slot)?;
        link.generation = link.generation.wrapping_add(1);
        link.state = SlotState::Used;
        self.links.write(alloc, b, slot, link)?;

        let counts = &mut self.counts[block];
        counts.free -= 1;
        counts.used += 1;
        self.len += 1;
        Ok(Node::new(b, slot, link.generation))
    }

    /// Return a live node to its block's free list.
    ///
    /// Removing a node that is not live (double free or stale handle) is
    /// rejected without mutation.
    pub fn node_remove(&mut self, alloc: &mut ChunkAllocator, node: Node) -> Result<(), StoreError> {
        if let Err(e) = self.check_live(alloc, node) {
            return reject(alloc, e);
        }
        self.unlink(alloc, node.block, node.slot)?;
        self.insert_after(alloc, node.block, FREE_HEAD, node.slot)?;
        let mut link = self.link(alloc, node.block, node.slot)?;
        link.state = SlotState::Free;
        self.links.write(alloc, node.block, node.slot, link)?;

        let counts = &mut self.counts[node.block as usize];
        counts.used -= 1;
        counts.free += 1;
        self.len -= 1;
        Ok(())
    }

    /// Whether `node` is live in this set.
    pub fn contains(&self, alloc: &ChunkAllocator, node: Node) -> bool {
        self.check_live(alloc, node).is_ok()
    }

    /// Check that `node` is live, returning `NotLive` or `SlotOutOfRange`.
    pub fn check_live(&self, alloc: &ChunkAllocator, node: Node) -> Result<(), StoreError> {
        if node.block as usize >= self.counts.len() {
            return Err(StoreError::NotLive { node });
        }
        if node.slot == FREE_HEAD || node.slot >= USED_HEAD {
            return Err(StoreError::SlotOutOfRange {
                block: node.block,
                slot: node.slot,
            });
        }
        let link = self.link(alloc, node.block, node.slot)?;
        if link.state != SlotState::Used || link.generation != node.generation {
            return Err(StoreError::NotLive { node });
        }
        Ok(())
    }

    /// Every live node, block by block in allocation order.
    pub fn nodes(&self, alloc: &ChunkAllocator) -> Result<Vec<Node>, StoreError> {
        let mut out = Vec::with_capacity(self.len);
        for block in 0..self.counts.len() {
            let b = block as u16;
            let mut slot = self.link(alloc, b, USED_HEAD)?.next;
            let mut steps = 0;
            while slot != USED_HEAD {
                let link = self.link(alloc, b, slot)?;
                out.push(Node::new(b, slot, link.generation));
                slot = link.next;
                steps += 1;
                if steps > NODES_PER_BLOCK {
                    return Err(StoreError::SlotOutOfRange { block: b, slot });
                }
            }
        }
        Ok(out)
    }

    /// Live nodes in `block`.
    pub fn used_in_block(&self, block: usize) -> usize {
        self.counts.get(block).map_or(0, |c| c.used as usize)
    }

    /// Register a new `f64` attribute, sized to the current blocks.
    pub fn add_scalar(&mut self, alloc: &mut ChunkAllocator, name: &str) -> Result<(), StoreError> {
        if self.scalars.len() >= MAX_SCALARS {
            return reject(alloc, StoreError::ScalarLimit { max: MAX_SCALARS });
        }
        if let Err(e) = validate_name(name) {
            return reject(alloc, e);
        }
        if self.scalars.contains_key(name) {
            return reject(
                alloc,
                StoreError::DuplicateName {
                    name: name.to_owned(),
                },
            );
        }
        let mut store = AttributeStore::create(name)?;
        store.accommodate(alloc, self.links.occupied())?;
        self.scalars.insert(name.to_owned(), store);
        Ok(())
    }

    /// Unregister a scalar attribute and free its blocks.
    pub fn remove_scalar(
        &mut self,
        alloc: &mut ChunkAllocator,
        name: &str,
    ) -> Result<(), StoreError> {
        match self.scalars.shift_remove(name) {
            Some(store) => store.destroy(alloc),
            None => reject(
                alloc,
                StoreError::UnknownName {
                    name: name.to_owned(),
                },
            ),
        }
    }

    /// Registered scalar names, in registration order.
    pub fn scalar_names(&self) -> impl Iterator<Item = &str> {
        self.scalars.keys().map(String::as_str)
    }

    /// The store behind a registered scalar.
    pub fn scalar_store(&self, name: &str) -> Option<&AttributeStore<f64>> {
        self.scalars.get(name)
    }

    /// Value of scalar `name` at `node`.
    pub fn scalar(&self, alloc: &ChunkAllocator, name: &str, node: Node) -> Result<f64, StoreError> {
        self.check_live(alloc, node)?;
        self.scalar_ref(name)?.get(alloc, node)
    }

    /// Set scalar `name` at `node`.
    pub fn set_scalar(
        &self,
        alloc: &mut ChunkAllocator,
        name: &str,
        node: Node,
        value: f64,
    ) -> Result<(), StoreError> {
        self.check_live(alloc, node)?;
        self.scalar_ref(name)?.set(alloc, node, value)
    }

    /// Free every scalar store, then the node blocks.
    pub fn destroy(self, alloc: &mut ChunkAllocator) -> Result<(), StoreError> {
        for (_, store) in self.scalars {
            store.destroy(alloc)?;
        }
        self.links.destroy(alloc)
    }

    fn scalar_ref(&self, name: &str) -> Result<&AttributeStore<f64>, StoreError> {
        self.scalars.get(name).ok_or_else(|| StoreError::UnknownName {
            name: name.to_owned(),
        })
    }

    fn block_with_space(&self) -> Option<usize> {
        if self.counts.get(self.current).is_some_and(|c| c.free > 0) {
            return Some(self.current);
        }
        self.counts.iter().position(|c| c.free > 0)
    }

    fn add_block(&mut self, alloc: &mut ChunkAllocator) -> Result<usize, StoreError> {
        let block = self.counts.len();
        if block >= MAX_BLOCKS {
            return reject(alloc, StoreError::BlockLimit { slot: block });
        }
        self.links.add_block(alloc, block)?;
        let bytes = self.links.block_mut(alloc, block as u16)?;
        let last = USED_HEAD - 1;
        for slot in 0..BLOCK_CAPACITY as u16 {
            let link = match slot {
                FREE_HEAD => Link {
                    prev: last,
                    next: 1,
                    generation: 0,
                    state: SlotState::Sentinel,
                },
                USED_HEAD => Link {
                    prev: USED_HEAD,
                    next: USED_HEAD,
                    generation: 0,
                    state: SlotState::Sentinel,
                },
                _ => Link {
                    prev: slot - 1,
                    next: if slot == last { FREE_HEAD } else { slot + 1 },
                    generation: 0,
                    state: SlotState::Free,
                },
            };
            let at = slot as usize * Link::SIZE;
            link.write(&mut bytes[at..at + Link::SIZE]);
        }
        self.counts.push(BlockCounts {
            used: 0,
            free: NODES_PER_BLOCK as u16,
        });
        for store in self.scalars.values_mut() {
            store.accommodate(alloc, self.links.occupied())?;
        }
        log::trace!("{} cell set: added block {block}", self.dimension);
        Ok(block)
    }

    fn link(&self, alloc: &ChunkAllocator, block: u16, slot: u16) -> Result<Link, StoreError> {
        self.links.read(alloc, block, slot)
    }

    fn unlink(&self, alloc: &mut ChunkAllocator, block: u16, slot: u16) -> Result<(), StoreError> {
        let link = self.link(alloc, block, slot)?;
        let mut prev = self.link(alloc, block, link.prev)?;
        prev.next = link.next;
        self.links.write(alloc, block, link.prev, prev)?;
        let mut next = self.link(alloc, block, link.next)?;
        next.prev = link.prev;
        self.links.write(alloc, block, link.next, next)
    }

    fn insert_after(
        &self,
        alloc: &mut ChunkAllocator,
        block: u16,
        at: u16,
        slot: u16,
    ) -> Result<(), StoreError> {
        let mut anchor = self.link(alloc, block, at)?;
        let after = anchor.next;
        anchor.next = slot;
        self.links.write(alloc, block, at, anchor)?;
        let mut following = self.link(alloc, block, after)?;
        following.prev = slot;
        self.links.write(alloc, block, after, following)?;
        let mut link = self.link(alloc, block, slot)?;
        link.prev = at;
        link.next = after;
        self.links.write(alloc, block, slot, link)
    }
}

impl std::fmt::Debug for CellSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellSet")
            .field("dimension", &self.dimension)
            .field("len", &self.len)
            .field("blocks", &self.counts.len())
            .field("scalars", &self.scalars.len())
            .finish()
    }
}

fn reject<T>(alloc: &ChunkAllocator, err: StoreError) -> Result<T, StoreError> {
    alloc.log().record(COMPONENT, &err);
    Err(err)
}
