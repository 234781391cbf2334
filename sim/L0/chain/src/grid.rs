//! Padded particle grid.
//!
//! Particles live in one flat buffer indexed by `(rank, depth)`: rank is
//! the chain, depth the position along it. Both extents are padded up to a
//! multiple of [`sway_simd::LANE_WIDTH`] so the grid is always rectangular
//! and every row fills whole lane groups.
//!
//! ```text
//! index = depth * padded_ranks + rank
//! ```
//!
//! [`GridShape::transposed`] swaps the meaning of the two axes. Builders
//! written for the depth axis run unchanged on the transposed view and
//! produce rank-axis topology once their indices are mapped back.

use sway_simd::padded_len;

/// Actual and padded extents of a particle grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    /// Number of real chains.
    pub actual_ranks: usize,
    /// Length of the longest real chain.
    pub actual_depths: usize,
    /// Chain count rounded up to the lane width.
    pub padded_ranks: usize,
    /// Chain length rounded up to the lane width.
    pub padded_depths: usize,
}

impl GridShape {
    /// Shape holding `actual_ranks` chains of up to `actual_depths` particles.
    #[must_use]
    pub const fn new(actual_ranks: usize, actual_depths: usize) -> Self {
        Self {
            actual_ranks,
            actual_depths,
            padded_ranks: padded_len(actual_ranks),
            padded_depths: padded_len(actual_depths),
        }
    }

    /// Total particle count, dummies included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.padded_ranks * self.padded_depths
    }

    /// Whether the grid holds no particles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of `(rank, depth)`.
    #[must_use]
    #[inline]
    pub const fn index(&self, rank: usize, depth: usize) -> usize {
        depth * self.padded_ranks + rank
    }

    /// `(rank, depth)` of a flat index.
    #[must_use]
    #[inline]
    pub const fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.padded_ranks, index / self.padded_ranks)
    }

    /// The same grid seen with ranks and depths swapped.
    #[must_use]
    pub const fn transposed(&self) -> Self {
        Self {
            actual_ranks: self.actual_depths,
            actual_depths: self.actual_ranks,
            padded_ranks: self.padded_depths,
            padded_depths: self.padded_ranks,
        }
    }

    /// Where `index` of this grid lands in [`Self::transposed`].
    ///
    /// Applying the transposed shape's `transpose_index` maps it back.
    #[must_use]
    #[inline]
    pub const fn transpose_index(&self, index: usize) -> usize {
        let (rank, depth) = self.coords(index);
        rank * self.padded_depths + depth
    }

    /// Reorder a per-particle buffer into the transposed layout.
    #[must_use]
    pub fn transpose<T: Clone>(&self, values: &[T]) -> Vec<T> {
        let transposed = self.transposed();
        (0..values.len())
            .map(|t| values[transposed.transpose_index(t)].clone())
            .collect()
    }
}
