//! Free-list index allocator over a dense range.
//!
//! [`IndexStack`] hands out indices from `[0, capacity)` and takes them
//! back. Besides plain allocation it can [`claim`](IndexStack::claim) a
//! specific index, which is how a store marks "block slot `n` now holds a
//! block" when the slot number is dictated by the owning cell set.
//!
//! Claimed indices are not searched out of the free stack; they are
//! skipped lazily when popped. An index is only ever returned when its
//! `used` flag is clear, so every index handed out is unique among the
//! in-use set.

/// Allocator of unique indices in `[0, capacity)`.
#[derive(Clone, Debug, Default)]
pub struct IndexStack {
    /// Candidate free indices. May contain stale (now used) entries.
    free: Vec<u32>,
    used: Vec<bool>,
    in_use: usize,
}

impl IndexStack {
    /// Create a stack over `[0, capacity)` with every index free.
    pub fn new(capacity: usize) -> Self {
        let mut stack = Self::default();
        stack.grow(capacity);
        stack
    }

    /// Size of the index range.
    pub fn capacity(&self) -> usize {
        self.used.len()
    }

    /// Number of indices currently in use.
    pub fn len(&self) -> usize {
        self.in_use
    }

    /// Whether no index is in use.
    pub fn is_empty(&self) -> bool {
        self.in_use == 0
    }

    /// Whether `index` is currently in use.
    pub fn is_used(&self, index: usize) -> bool {
        self.used.get(index).copied().unwrap_or(false)
    }

    /// Extend the range to `[0, capacity)`. Shrinking is a no-op.
    ///
    /// New indices are handed out after every previously free index,
    /// lowest first.
    pub fn grow(&mut self, capacity: usize) {
        let old = self.used.len();
        if capacity <= old {
            return;
        }
        self.used.resize(capacity, false);
        self.free.splice(0..0, (old as u32..capacity as u32).rev());
    }

    /// Take a free index, or `None` when the range is exhausted.
    pub fn allocate(&mut self) -> Option<usize> {
        while let Some(index) = self.free.pop() {
            let index = index as usize;
            if !self.used[index] {
                self.used[index] = true;
                self.in_use += 1;
                return Some(index);
            }
        }
        None
    }

    /// Mark a specific index in use. Returns `false` if it is out of range
    /// or already in use.
    pub fn claim(&mut self, index: usize) -> bool {
        match self.used.get_mut(index) {
            Some(flag) if !*flag => {
                *flag = true;
                self.in_use += 1;
                true
            }
            _ => false,
        }
    }

    /// Return an index to the free list. Returns `false` if it was not in use.
    pub fn release(&mut self, index: usize) -> bool {
        match self.used.get_mut(index) {
            Some(flag) if *flag => {
                *flag = false;
                self.in_use -= 1;
                self.free.push(index as u32);
                true
            }
            _ => false,
        }
    }

    /// In-use indices in ascending order.
    pub fn iter_used(&self) -> impl Iterator<Item = usize> + '_ {
        self.used
            .iter()
            .enumerate()
            .filter_map(|(i, &used)| used.then_some(i))
    }
}
