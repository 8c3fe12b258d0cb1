//! Remeshing parameters and mesh dimensions.

use crate::error::MeshError;

/// Default opposite-angle quality below which an edge is split.
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.8;

/// Default number of request/commit rounds in one collapse pass.
pub const DEFAULT_COLLAPSE_ROUNDS: usize = 5;

/// Default number of split/collapse/smooth iterations in one remesh.
pub const DEFAULT_REMESH_ITERATIONS: usize = 6;

/// Edge-length targets and pass budgets for remeshing.
///
/// Edges longer than `amax` are split and edges shorter than `amin` are
/// collapsed.
///
/// # Examples
///
/// ```
/// use regrid_mesh::RemeshConfig;
///
/// let config = RemeshConfig::new(0.1, 0.3).with_collapse_rounds(3);
/// assert!(config.validate().is_ok());
/// assert!(RemeshConfig::new(0.3, 0.1).validate().is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RemeshConfig {
    /// Edges shorter than this are collapsed.
    pub amin: f64,
    /// Edges longer than this are split.
    pub amax: f64,
    /// Opposite-angle quality `1 + min(0, cos θ)` below which an edge is split.
    pub quality_threshold: f64,
    /// Request/commit rounds per collapse pass.
    pub collapse_rounds: usize,
    /// Split/collapse/smooth iterations per remesh.
    pub remesh_iterations: usize,
}

impl RemeshConfig {
    /// Config with the given length bounds and default budgets.
    pub fn new(amin: f64, amax: f64) -> Self {
        Self {
            amin,
            amax,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            collapse_rounds: DEFAULT_COLLAPSE_ROUNDS,
            remesh_iterations: DEFAULT_REMESH_ITERATIONS,
        }
    }

    /// Set the split quality threshold.
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Set the collapse round budget.
    pub fn with_collapse_rounds(mut self, rounds: usize) -> Self {
        self.collapse_rounds = rounds;
        self
    }

    /// Set the remesh iteration budget.
    pub fn with_remesh_iterations(mut self, iterations: usize) -> Self {
        self.remesh_iterations = iterations;
        self
    }

    /// Check that `0 < amin < amax`, all finite, and a threshold in `[0, 1]`.
    pub fn validate(&self) -> Result<(), MeshError> {
        let invalid = |reason: String| Err(MeshError::InvalidConfig { reason });
        if !self.amin.is_finite() || !self.amax.is_finite() {
            return invalid(format!(
                "edge bounds must be finite (amin {}, amax {})",
                self.amin, self.amax
            ));
        }
        if self.amin <= 0.0 {
            return invalid(format!("amin must be positive, got {}", self.amin));
        }
        if self.amin >= self.amax {
            return invalid(format!(
                "amin {} must be below amax {}",
                self.amin, self.amax
            ));
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return invalid(format!(
                "quality threshold must be in [0, 1], got {}",
                self.quality_threshold
            ));
        }
        Ok(())
    }
}

/// Topological and ambient dimension of a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshDims {
    /// Dimension of the cells (2 for a surface).
    pub manifold: u8,
    /// Dimension of the space the vertices live in.
    pub embedding: u8,
}

impl MeshDims {
    /// A triangulated surface in 3-space, the only layout the half-edge
    /// mesh supports.
    pub const SURFACE: Self = Self {
        manifold: 2,
        embedding: 3,
    };

    /// Build a dimension pair, checking `manifold ≤ 3`, `embedding` in
    /// `2..=3` and `manifold ≤ embedding`.
    pub fn new(manifold: u8, embedding: u8) -> Result<Self, MeshError> {
        let reject = |reason| {
            Err(MeshError::Dimensions {
                manifold,
                embedding,
                reason,
            })
        };
        if manifold > 3 {
            return reject("manifold dimension must be at most 3");
        }
        if !(2..=3).contains(&embedding) {
            return reject("embedding dimension must be 2 or 3");
        }
        if manifold > embedding {
            return reject("manifold dimension exceeds embedding dimension");
        }
        Ok(Self {
            manifold,
            embedding,
        })
    }

    /// Check that these dimensions describe a surface in 3-space.
    pub fn require_surface(self) -> Result<(), MeshError> {
        Self::new(self.manifold, self.embedding)?;
        if self != Self::SURFACE {
            return Err(MeshError::Dimensions {
                manifold: self.manifold,
                embedding: self.embedding,
                reason: "half-edge meshes are triangulated surfaces in 3-space",
            });
        }
        Ok(())
    }
}

impl Default for MeshDims {
    fn default() -> Self {
        Self::SURFACE
    }
}
