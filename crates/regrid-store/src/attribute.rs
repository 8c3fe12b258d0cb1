//! Named, growable tables of fixed-capacity blocks.
//!
//! An [`AttributeStore`] maps block slots to chunks. Block slot `b` of a
//! store holds the values for block `b` of the cell set it is attached
//! to, so the value of node `(b, s)` lives at byte `s * T::SIZE` of that
//! chunk. [`accommodate`](AttributeStore::accommodate) brings a store's
//! occupied slots up to those of a reference store.

use std::marker::PhantomData;

use regrid_arena::{ChunkAllocator, ChunkId};
use regrid_core::limits::{BLOCK_CAPACITY, MAX_BLOCKS, MAX_ELEMENT_SIZE, MAX_NAME_LEN};
use regrid_core::Node;

use crate::element::Element;
use crate::error::StoreError;
use crate::index_stack::IndexStack;

const COMPONENT: &str = "store";

/// A named collection of blocks, each holding `BLOCK_CAPACITY` values of `T`.
pub struct AttributeStore<T: Element> {
    name: String,
    blocks: Vec<Option<ChunkId>>,
    occupied: IndexStack,
    _element: PhantomData<T>,
}

impl<T: Element> AttributeStore<T> {
    /// Create an empty store.
    ///
    /// The name must be a non-empty identifier of at most 31 bytes.
    pub fn create(name: &str) -> Result<Self, StoreError> {
        validate_name(name)?;
        if T::SIZE == 0 || T::SIZE > MAX_ELEMENT_SIZE {
            return Err(StoreError::ElementSize { size: T::SIZE });
        }
        Ok(Self {
            name: name.to_owned(),
            blocks: Vec::new(),
            occupied: IndexStack::default(),
            _element: PhantomData,
        })
    }

    /// The store's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes occupied by one block of this store.
    pub fn block_bytes() -> usize {
        T::SIZE * BLOCK_CAPACITY
    }

    /// Which block slots hold a block.
    pub fn occupied(&self) -> &IndexStack {
        &self.occupied
    }

    /// Number of blocks held.
    pub fn block_count(&self) -> usize {
        self.occupied.len()
    }

    /// Whether `slot` holds a block.
    pub fn has_block(&self, slot: usize) -> bool {
        self.occupied.is_used(slot)
    }

    /// Allocate a zeroed block at `slot`, growing the table if needed.
    pub fn add_block(
        &mut self,
        alloc: &mut ChunkAllocator,
        slot: usize,
    ) -> Result<ChunkId, StoreError> {
        if slot >= MAX_BLOCKS {
            return reject(alloc, StoreError::BlockLimit { slot });
        }
        if self.occupied.is_used(slot) {
            return reject(
                alloc,
                StoreError::BlockOccupied {
                    store: self.name.clone(),
                    slot,
                },
            );
        }
        if slot >= self.blocks.len() {
            let len = (slot + 1).max(self.blocks.len() * 2).min(MAX_BLOCKS);
            self.blocks.resize(len, None);
            self.occupied.grow(len);
        }
        let id = alloc.allocate_general(Self::block_bytes())?;
        alloc.chunk_mut(id)?.fill(0);
        self.blocks[slot] = Some(id);
        self.occupied.claim(slot);
        Ok(id)
    }

    /// Return the block at `slot` to the allocator.
    pub fn remove_block(
        &mut self,
        alloc: &mut ChunkAllocator,
        slot: usize,
    ) -> Result<(), StoreError> {
        let Some(id) = self.blocks.get(slot).copied().flatten() else {
            return reject(
                alloc,
                StoreError::BlockMissing {
                    store: self.name.clone(),
                    slot,
                },
            );
        };
        alloc.deallocate(id)?;
        self.blocks[slot] = None;
        self.occupied.release(slot);
        Ok(())
    }

    /// Add a block for every slot occupied in `reference` but not here.
    ///
    /// Returns the number of blocks added.
    pub fn accommodate(
        &mut self,
        alloc: &mut ChunkAllocator,
        reference: &IndexStack,
    ) -> Result<usize, StoreError> {
        let missing: Vec<usize> = reference
            .iter_used()
            .filter(|&slot| !self.occupied.is_used(slot))
            .collect();
        for &slot in &missing {
            self.add_block(alloc, slot)?;
        }
        Ok(missing.len())
    }

    /// Remove every block and drop the store.
    pub fn destroy(mut self, alloc: &mut ChunkAllocator) -> Result<(), StoreError> {
        let slots: Vec<usize> = self.occupied.iter_used().collect();
        for slot in slots {
            self.remove_block(alloc, slot)?;
        }
        Ok(())
    }

    /// Decode the value at `(block, slot)`.
    pub fn read(&self, alloc: &ChunkAllocator, block: u16, slot: u16) -> Result<T, StoreError> {
        let id = self.chunk_of(block, slot)?;
        let at = slot as usize * T::SIZE;
        Ok(T::read(&alloc.chunk(id)?[at..at + T::SIZE]))
    }

    /// Encode `value` at `(block, slot)`.
    pub fn write(
        &self,
        alloc: &mut ChunkAllocator,
        block: u16,
        slot: u16,
        value: T,
    ) -> Result<(), StoreError> {
        let id = self.chunk_of(block, slot)?;
        let at = slot as usize * T::SIZE;
        value.write(&mut alloc.chunk_mut(id)?[at..at + T::SIZE]);
        Ok(())
    }

    /// Value stored for `node`. Liveness is the cell set's concern.
    pub fn get(&self, alloc: &ChunkAllocator, node: Node) -> Result<T, StoreError> {
        self.read(alloc, node.block, node.slot)
    }

    /// Store `value` for `node`.
    pub fn set(&self, alloc: &mut ChunkAllocator, node: Node, value: T) -> Result<(), StoreError> {
        self.write(alloc, node.block, node.slot, value)
    }

    /// Raw bytes of a whole block, for bulk initialisation.
    pub fn block_mut<'a>(
        &self,
        alloc: &'a mut ChunkAllocator,
        block: u16,
    ) -> Result<&'a mut [u8], StoreError> {
        let id = self.chunk_of(block, 0)?;
        Ok(&mut alloc.chunk_mut(id)?[..Self::block_bytes()])
    }

    fn chunk_of(&self, block: u16, slot: u16) -> Result<ChunkId, StoreError> {
        if slot as usize >= BLOCK_CAPACITY {
            return Err(StoreError::SlotOutOfRange { block, slot });
        }
        self.blocks
            .get(block as usize)
            .copied()
            .flatten()
            .ok_or_else(|| StoreError::BlockMissing {
                store: self.name.clone(),
                slot: block as usize,
            })
    }
}

impl<T: Element> std::fmt::Debug for AttributeStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("name", &self.name)
            .field("element_size", &T::SIZE)
            .field("blocks", &self.occupied.len())
            .finish()
    }
}

/// Check that `name` is a non-empty identifier of at most 31 bytes.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = |reason| {
        Err(StoreError::InvalidName {
            name: name.to_owned(),
            reason,
        })
    };
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return invalid("empty");
    };
    if name.len() > MAX_NAME_LEN {
        return invalid("longer than 31 bytes");
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return invalid("must start with a letter or underscore");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return invalid("must contain only letters, digits and underscores");
    }
    Ok(())
}

fn reject<T>(alloc: &ChunkAllocator, err: StoreError) -> Result<T, StoreError> {
    alloc.log().record(COMPONENT, &err);
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regrid_arena::ArenaConfig;
    use regrid_core::limits::PAGE_SIZE;

    fn alloc() -> ChunkAllocator {
        ChunkAllocator::new(ArenaConfig::new()).unwrap()
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("density").is_ok());
        assert!(validate_name("_x1").is_ok());
        assert!(validate_name(&"a".repeat(31)).is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(32)).is_err());
        assert!(validate_name("1abc").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("dash-ed").is_err());
    }

    #[test]
    fn scalar_block_is_one_page() {
        assert_eq!(AttributeStore::<f64>::block_bytes(), PAGE_SIZE);
        let mut alloc = alloc();
        let mut store = AttributeStore::<f64>::create("phi").unwrap();
        let id = store.add_block(&mut alloc, 0).unwrap();
        assert_eq!(id.size(), PAGE_SIZE);
    }

    #[test]
    fn add_block_grows_table_to_slot() {
        let mut alloc = alloc();
        let mut store = AttributeStore::<f64>::create("phi").unwrap();
        store.add_block(&mut alloc, 5).unwrap();
        assert!(store.has_block(5));
        assert!(!store.has_block(4));
        assert_eq!(store.block_count(), 1);
        assert!(store.occupied().capacity() >= 6);
    }

    #[test]
    fn re_adding_occupied_slot_is_rejected() {
        let mut alloc = alloc();
        let mut store = AttributeStore::<f64>::create("phi").unwrap();
        store.add_block(&mut alloc, 0).unwrap();
        let live = alloc.live_chunks();
        assert!(matches!(
            store.add_block(&mut alloc, 0),
            Err(StoreError::BlockOccupied { slot: 0, .. })
        ));
        assert_eq!(alloc.live_chunks(), live);
        assert_eq!(alloc.log().drain().len(), 1);
    }

    #[test]
    fn remove_unoccupied_slot_is_rejected() {
        let mut alloc = alloc();
        let mut store = AttributeStore::<f64>::create("phi").unwrap();
        assert!(matches!(
            store.remove_block(&mut alloc, 3),
            Err(StoreError::BlockMissing { slot: 3, .. })
        ));
        store.add_block(&mut alloc, 3).unwrap();
        store.remove_block(&mut alloc, 3).unwrap();
        assert!(!store.has_block(3));
        assert_eq!(alloc.live_chunks(), 0);
    }

    #[test]
    fn slot_limit_is_enforced() {
        let mut alloc = alloc();
        let mut store = AttributeStore::<u32>::create("tag").unwrap();
        assert_eq!(
            store.add_block(&mut alloc, MAX_BLOCKS),
            Err(StoreError::BlockLimit { slot: MAX_BLOCKS })
        );
    }

    #[test]
    fn values_round_trip_through_chunks() {
        let mut alloc = alloc();
        let mut store = AttributeStore::<[f64; 3]>::create("position").unwrap();
        store.add_block(&mut alloc, 0).unwrap();
        store.write(&mut alloc, 0, 17, [1.0, 2.0, 3.0]).unwrap();
        assert_eq!(store.read(&alloc, 0, 17).unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(store.read(&alloc, 0, 18).unwrap(), [0.0; 3]);
        assert!(matches!(
            store.read(&alloc, 1, 0),
            Err(StoreError::BlockMissing { slot: 1, .. })
        ));
        assert!(matches!(
            store.read(&alloc, 0, BLOCK_CAPACITY as u16),
            Err(StoreError::SlotOutOfRange { .. })
        ));
    }

    #[test]
    fn reused_chunk_is_zeroed() {
        let mut alloc = alloc();
        let mut store = AttributeStore::<f64>::create("phi").unwrap();
        store.add_block(&mut alloc, 0).unwrap();
        store.write(&mut alloc, 0, 1, 9.5).unwrap();
        store.remove_block(&mut alloc, 0).unwrap();
        store.add_block(&mut alloc, 0).unwrap();
        assert_eq!(store.read(&alloc, 0, 1).unwrap(), 0.0);
    }

    #[test]
    fn accommodate_mirrors_reference() {
        let mut alloc = alloc();
        let mut reference = AttributeStore::<u32>::create("links").unwrap();
        for slot in [0, 2, 3] {
            reference.add_block(&mut alloc, slot).unwrap();
        }
        let mut store = AttributeStore::<f64>::create("phi").unwrap();
        store.add_block(&mut alloc, 2).unwrap();
        let added = store.accommodate(&mut alloc, reference.occupied()).unwrap();
        assert_eq!(added, 2);
        assert_eq!(
            store.occupied().iter_used().collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
        assert_eq!(store.accommodate(&mut alloc, reference.occupied()).unwrap(), 0);
    }

    #[test]
    fn destroy_frees_every_chunk() {
        let mut alloc = alloc();
        let mut store = AttributeStore::<f64>::create("phi").unwrap();
        for slot in 0..4 {
            store.add_block(&mut alloc, slot).unwrap();
        }
        store.destroy(&mut alloc).unwrap();
        assert_eq!(alloc.live_chunks(), 0);
    }
}
