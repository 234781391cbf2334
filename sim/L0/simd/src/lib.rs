//! Four-wide batch math for particle-chain solvers.
//!
//! Particle grids in the chain solver are padded so that every row holds a
//! multiple of four particles. That lets the per-particle passes (force
//! injection, Verlet integration, fixed-pin blending) walk the flat buffers
//! one lane group at a time:
//!
//! - [`Vec3x4`] - 4 `Vector3<f64>` values in `SoA` layout
//! - [`Lanes`] - 4 `f64` coefficients (masks, damping, friction)
//!
//! # Example
//!
//! ```
//! use sway_simd::{Lanes, Vec3x4};
//! use nalgebra::Vector3;
//!
//! let mut positions = vec![Vector3::new(0.0, 0.0, 1.0); 4];
//! let dummy_mask = Lanes([0.0, 0.0, 0.0, 1.0]);
//!
//! // Move every lane by +X, except dummy lanes.
//! let step = Vec3x4::splat(Vector3::x()).scale_lanes(&dummy_mask.one_minus());
//! Vec3x4::from_slice(&positions).add(&step).write_to_slice(&mut positions);
//!
//! assert_eq!(positions[0].x, 1.0);
//! assert_eq!(positions[3].x, 0.0);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]
// Lane code intentionally uses indexed loops for auto-vectorization patterns
#![allow(clippy::needless_range_loop)]
// Suboptimal mul_add is intentional for auto-vectorization patterns
#![allow(clippy::suboptimal_flops)]
// Some functions use non-const methods internally
#![allow(clippy::missing_const_for_fn)]

/// Number of lanes in a batch.
pub const LANE_WIDTH: usize = 4;

mod lanes;
mod vec3x4;

pub use lanes::*;
pub use vec3x4::*;

/// Round `n` up to the next multiple of [`LANE_WIDTH`].
///
/// ```
/// assert_eq!(sway_simd::padded_len(5), 8);
/// assert_eq!(sway_simd::padded_len(8), 8);
/// assert_eq!(sway_simd::padded_len(0), 0);
/// ```
#[must_use]
#[inline]
pub const fn padded_len(n: usize) -> usize {
    n.div_ceil(LANE_WIDTH) * LANE_WIDTH
}
