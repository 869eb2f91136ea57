//! Persistent homology port.

use anyhow::Result;

/// Trait for persistent homology backends.
///
/// A backend consumes a point cloud and returns, per homology dimension
/// `0..=max_dimension`, the birth/death pairs of the persistence diagram.
/// The computation is a pure function of the point set; point order carries
/// no meaning. Essential classes are reported with `death = f64::INFINITY`.
pub trait HomologyBackend: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Compute birth/death pairs for dimensions `0..=max_dimension`.
    ///
    /// The outer vector is indexed by dimension. May fail on degenerate
    /// input (e.g. an empty point cloud) or an unsupported dimension.
    fn compute(&self, points: &[Vec<f32>], max_dimension: usize) -> Result<Vec<Vec<(f64, f64)>>>;
}
