//! Buddy-system chunk allocation for regrid meshes.
//!
//! Every block of node and attribute storage in the workspace is a chunk
//! carved out of an arena by the [`ChunkAllocator`]. Chunks are never
//! moved once handed out, so a [`ChunkId`] resolves to the same bytes for
//! its whole lifetime.
//!
//! # Architecture
//!
//! ```text
//! ChunkAllocator (explicit context, one per mesh)
//! ├── Arena × ≤16 (lazily reserved, 8 MiB target, halved on failure)
//! │   ├── bytes: Vec<u8>
//! │   └── states: [ChunkState; trees × 15] (out-of-band buddy flags)
//! └── free lists: IndexSet<ChunkId> × 4 depth classes
//! ```
//!
//! Each arena is a row of fixed-depth buddy trees. A tree's root is eight
//! pages (32 KiB); its leaves are single 4 KiB pages. All bookkeeping lives
//! in the state array and the free-list sets, never in freed user memory.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod arena;
pub mod buddy;
pub mod config;
pub mod error;
pub mod handle;

pub use arena::ChunkState;
pub use buddy::ChunkAllocator;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::{ChunkAddress, ChunkId};
