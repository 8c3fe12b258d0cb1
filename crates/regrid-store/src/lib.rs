//! Index-addressed storage for regrid meshes.
//!
//! Everything here is laid out in fixed-capacity blocks of
//! [`BLOCK_CAPACITY`](regrid_core::limits::BLOCK_CAPACITY) slots, each block
//! one chunk from the [`ChunkAllocator`](regrid_arena::ChunkAllocator):
//!
//! - [`IndexStack`]: free-list allocator over a dense index range; tracks
//!   which block slots of a store are occupied.
//! - [`AttributeStore`]: a named, growable table of blocks holding one
//!   fixed-size [`Element`] per slot.
//! - [`CellSet`]: node identity allocation for one element kind, with
//!   per-block used/free lists and a registry of scalar attributes kept in
//!   lock-step with the node blocks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attribute;
pub mod cellset;
pub mod element;
pub mod error;
pub mod index_stack;

pub use attribute::AttributeStore;
pub use cellset::CellSet;
pub use element::Element;
pub use error::StoreError;
pub use index_stack::IndexStack;
