//! Error types for store and cell-set operations.

use std::error::Error;
use std::fmt;

use regrid_arena::ArenaError;
use regrid_core::Node;

/// Errors arising from attribute stores and cell sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// An attribute name is empty, too long, or not an identifier.
    InvalidName {
        /// The rejected name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A scalar with this name is already registered.
    DuplicateName {
        /// The duplicated name.
        name: String,
    },
    /// No scalar with this name is registered.
    UnknownName {
        /// The missing name.
        name: String,
    },
    /// The cell set already holds the maximum number of scalars.
    ScalarLimit {
        /// The limit that was hit.
        max: usize,
    },
    /// The element type does not fit a store block.
    ElementSize {
        /// Size of the element in bytes.
        size: usize,
    },
    /// A block slot index beyond the 16-bit range.
    BlockLimit {
        /// The rejected slot.
        slot: usize,
    },
    /// `add_block` on a slot that already holds a block.
    BlockOccupied {
        /// Store name.
        store: String,
        /// The occupied slot.
        slot: usize,
    },
    /// Access to, or removal of, a slot that holds no block.
    BlockMissing {
        /// Store name.
        store: String,
        /// The empty slot.
        slot: usize,
    },
    /// A slot index outside the block, or a reserved sentinel slot.
    SlotOutOfRange {
        /// Block index.
        block: u16,
        /// Slot index.
        slot: u16,
    },
    /// The node is not live: never allocated, already removed, or stale.
    NotLive {
        /// The offending node.
        node: Node,
    },
    /// The chunk allocator refused a request.
    Arena(ArenaError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName { name, reason } => {
                write!(f, "invalid attribute name '{name}': {reason}")
            }
            Self::DuplicateName { name } => write!(f, "attribute '{name}' already exists"),
            Self::UnknownName { name } => write!(f, "no attribute named '{name}'"),
            Self::ScalarLimit { max } => write!(f, "scalar limit of {max} reached"),
            Self::ElementSize { size } => {
                write!(f, "element of {size} bytes does not fit a store block")
            }
            Self::BlockLimit { slot } => write!(f, "block slot {slot} exceeds the 16-bit range"),
            Self::BlockOccupied { store, slot } => {
                write!(f, "store '{store}': block slot {slot} already occupied")
            }
            Self::BlockMissing { store, slot } => {
                write!(f, "store '{store}': block slot {slot} is not occupied")
            }
            Self::SlotOutOfRange { block, slot } => {
                write!(f, "slot {slot} of block {block} is out of range")
            }
            Self::NotLive { node } => write!(f, "node {node} is not live"),
            Self::Arena(e) => write!(f, "allocation failed: {e}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for StoreError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
