//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use crate::handle::ChunkId;

/// Errors that can occur during chunk allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// Requested depth is beyond the deepest size class.
    InvalidDepth {
        /// The rejected depth.
        depth: u8,
    },
    /// Requested object size is zero or larger than the root chunk.
    InvalidSize {
        /// The rejected size in bytes.
        size: usize,
    },
    /// The id does not name a chunk of any mapped arena.
    InvalidChunk {
        /// The offending id.
        id: ChunkId,
    },
    /// The id names a chunk that is not currently allocated.
    DoubleFree {
        /// The offending id.
        id: ChunkId,
    },
    /// No reservation succeeded, not even at the minimum arena size.
    OutOfMemory {
        /// Smallest reservation that was attempted, in bytes.
        attempted: usize,
    },
    /// The allocator already holds its maximum number of arenas.
    ArenaLimit {
        /// Number of arenas mapped.
        arenas: usize,
    },
    /// An [`ArenaConfig`](crate::ArenaConfig) parameter is out of range.
    InvalidConfig {
        /// Which parameter and why.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDepth { depth } => write!(f, "invalid chunk depth {depth}"),
            Self::InvalidSize { size } => write!(f, "invalid chunk size: {size} bytes"),
            Self::InvalidChunk { id } => write!(f, "invalid chunk id {id}"),
            Self::DoubleFree { id } => write!(f, "chunk {id} is not allocated"),
            Self::OutOfMemory { attempted } => {
                write!(f, "out of memory: reservation of {attempted} bytes failed")
            }
            Self::ArenaLimit { arenas } => {
                write!(f, "arena limit reached: {arenas} arenas mapped")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}
