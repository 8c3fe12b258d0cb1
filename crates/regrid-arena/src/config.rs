//! Arena configuration parameters.

use regrid_core::limits::{ARENA_MIN_BYTES, ARENA_TARGET_BYTES, MAX_ARENAS, ROOT_CHUNK_SIZE};

use crate::error::ArenaError;

/// Configuration for the chunk allocator.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of each arena reservation in bytes.
    ///
    /// Default: 8 MiB. Must be a multiple of the root chunk size and at
    /// least [`ARENA_MIN_BYTES`]. When a reservation fails the allocator
    /// halves the request, never going below the minimum.
    pub arena_bytes: usize,

    /// Maximum number of arenas the allocator may reserve.
    ///
    /// Default: 16, which is also the hard ceiling of the chunk id format.
    pub max_arenas: usize,

    /// Optional cap on the total bytes reserved across all arenas.
    ///
    /// A reservation that would exceed the budget is treated like an
    /// operating-system refusal: the request is halved and retried.
    pub budget_bytes: Option<usize>,
}

impl ArenaConfig {
    /// Default arena size: 8 MiB.
    pub const DEFAULT_ARENA_BYTES: usize = ARENA_TARGET_BYTES;

    /// Default maximum arena count.
    pub const DEFAULT_MAX_ARENAS: usize = MAX_ARENAS;

    /// Largest arena whose tree nodes still fit the 28-bit node field of a
    /// chunk id.
    pub const MAX_ARENA_BYTES: usize = 1 << 30;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            arena_bytes: Self::DEFAULT_ARENA_BYTES,
            max_arenas: Self::DEFAULT_MAX_ARENAS,
            budget_bytes: None,
        }
    }

    /// Builder-style override of the arena size.
    pub fn with_arena_bytes(mut self, bytes: usize) -> Self {
        self.arena_bytes = bytes;
        self
    }

    /// Builder-style override of the arena count limit.
    pub fn with_max_arenas(mut self, max: usize) -> Self {
        self.max_arenas = max;
        self
    }

    /// Builder-style override of the reservation budget.
    pub fn with_budget(mut self, bytes: usize) -> Self {
        self.budget_bytes = Some(bytes);
        self
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.arena_bytes < ARENA_MIN_BYTES
            || self.arena_bytes > Self::MAX_ARENA_BYTES
            || self.arena_bytes % ROOT_CHUNK_SIZE != 0
        {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "arena_bytes {} must be a multiple of {ROOT_CHUNK_SIZE} in [{ARENA_MIN_BYTES}, {}]",
                    self.arena_bytes,
                    Self::MAX_ARENA_BYTES
                ),
            });
        }
        if self.max_arenas == 0 || self.max_arenas > MAX_ARENAS {
            return Err(ArenaError::InvalidConfig {
                reason: format!("max_arenas {} must be in [1, {MAX_ARENAS}]", self.max_arenas),
            });
        }
        Ok(())
    }

    /// Number of buddy trees in a full-size arena.
    pub fn trees_per_arena(&self) -> usize {
        self.arena_bytes / ROOT_CHUNK_SIZE
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arena_is_8mb() {
        let config = ArenaConfig::new();
        assert_eq!(config.arena_bytes, 8 * 1024 * 1024);
        assert_eq!(config.trees_per_arena(), 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_arena_below_minimum() {
        let config = ArenaConfig::new().with_arena_bytes(ROOT_CHUNK_SIZE);
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_unaligned_arena() {
        let config = ArenaConfig::new().with_arena_bytes(ARENA_MIN_BYTES + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_too_many_arenas() {
        assert!(ArenaConfig::new().with_max_arenas(17).validate().is_err());
        assert!(ArenaConfig::new().with_max_arenas(0).validate().is_err());
        assert!(ArenaConfig::new().with_max_arenas(16).validate().is_ok());
    }
}
