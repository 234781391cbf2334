//! XPBD distance constraints and the grid topologies built from them.
//!
//! Every link of the grid (structural, bend, shear) is a
//! [`DistanceConstraint`]. They only resist stretching:
//!
//! ```text
//! C  = max(0, |x_a - x_b| - L)
//! α̃  = α / h²
//! Δλ = (C - α̃ λ) / (w_a + w_b + α̃)
//! x_a -= n · Δλ · k_a · w_a
//! x_b += n · Δλ · k_b · w_b
//! ```
//!
//! with `n` the unit vector from `b` to `a` and `k` the end coefficient
//! `(1 - fixed[self]) · (1 - dummy[other])`. A pinned end never moves; an end
//! linked to padding is left alone so padding cannot pull on real particles.
//!
//! The λ of every constraint is reset once per frame, before the solver
//! iterations.

use nalgebra::Vector3;
use sway_types::safe_normal;

use crate::grid::GridShape;
use crate::particles::ParticleWeights;

/// Compliance at stiffness 0.
pub const FAT_COMPLIANCE: f64 = 1000.0;

/// Compliance at stiffness 1.
pub const CONCRETE_COMPLIANCE: f64 = 2.5e10;

/// Map a stiffness in [0, 1] to an XPBD compliance.
///
/// ```
/// use sway_chain::convert_stiffness_to_compliance;
///
/// assert_eq!(convert_stiffness_to_compliance(0.0), 1.0 / 1000.0);
/// assert_eq!(convert_stiffness_to_compliance(1.0), 1.0 / 2.5e10);
/// ```
#[must_use]
pub fn convert_stiffness_to_compliance(stiffness: f64) -> f64 {
    let s = stiffness.clamp(0.0, 1.0);
    1.0 / (FAT_COMPLIANCE + (CONCRETE_COMPLIANCE - FAT_COMPLIANCE) * s)
}

/// Stretch-only distance constraint between two particles.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceConstraint {
    /// Index of the first particle (toward the root).
    pub first: usize,
    /// Index of the second particle.
    pub second: usize,
    /// Rest length.
    pub rest_length: f64,
    /// Compliance (inverse stiffness).
    pub compliance: f64,
    /// Accumulated Lagrange multiplier.
    lambda: f64,
}

impl DistanceConstraint {
    /// Create a new distance constraint.
    #[must_use]
    pub const fn new(first: usize, second: usize, rest_length: f64, compliance: f64) -> Self {
        Self {
            first,
            second,
            rest_length,
            compliance,
            lambda: 0.0,
        }
    }

    /// Create a distance constraint whose rest length is the current distance.
    #[must_use]
    pub fn from_positions(
        first: usize,
        second: usize,
        positions: &[Vector3<f64>],
        compliance: f64,
    ) -> Self {
        let rest_length = (positions[first] - positions[second]).norm();
        Self::new(first, second, rest_length, compliance)
    }

    /// Reset the Lagrange multiplier (call once per frame).
    pub fn reset(&mut self) {
        self.lambda = 0.0;
    }

    /// Accumulated Lagrange multiplier.
    #[must_use]
    pub const fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Current length minus rest length.
    #[must_use]
    pub fn evaluate(&self, positions: &[Vector3<f64>]) -> f64 {
        (positions[self.first] - positions[self.second]).norm() - self.rest_length
    }

    /// One XPBD step. Returns the stretch that was corrected.
    pub fn solve(
        &mut self,
        positions: &mut [Vector3<f64>],
        weights: &ParticleWeights<'_>,
        dt: f64,
    ) -> f64 {
        let (a, b) = (self.first, self.second);
        let coef_a = (1.0 - weights.fixed_blend[a]) * (1.0 - weights.dummy_mask[b]);
        let coef_b = (1.0 - weights.fixed_blend[b]) * (1.0 - weights.dummy_mask[a]);
        if coef_a <= 0.0 && coef_b <= 0.0 {
            return 0.0;
        }

        let to_first = positions[a] - positions[b];
        let n = safe_normal(&to_first);
        let c = (to_first.norm() - self.rest_length).max(0.0);

        let w_a = weights.inv_mass[a];
        let w_b = weights.inv_mass[b];
        let alpha_tilde = self.compliance / (dt * dt);

        let delta_lambda = alpha_tilde.mul_add(-self.lambda, c) / (w_a + w_b + alpha_tilde);

        positions[a] -= n * (delta_lambda * coef_a * w_a);
        positions[b] += n * (delta_lambda * coef_b * w_b);

        self.lambda += delta_lambda;

        c
    }

    /// Snap the second particle back to the rest length.
    ///
    /// Works in both directions and never moves the first particle. Pinned
    /// seconds and links touching padding are left alone.
    pub fn solve_rigid(&self, positions: &mut [Vector3<f64>], weights: &ParticleWeights<'_>) {
        if weights.fixed_blend[self.second] > 0.0
            || weights.dummy_mask[self.first] > 0.0
            || weights.dummy_mask[self.second] > 0.0
        {
            return;
        }
        let to_first = positions[self.first] - positions[self.second];
        let error = to_first.norm() - self.rest_length;
        positions[self.second] += safe_normal(&to_first) * error;
    }
}

/// Links `(d, d + step)` along the depth axis for every padded rank.
///
/// Constraints are ordered depth-major: row `d` holds one link per rank, so
/// with `step == 1` the link above `links[i]` is `links[i - padded_ranks]`.
fn depth_links(
    shape: &GridShape,
    positions: &[Vector3<f64>],
    step: usize,
    compliance: f64,
) -> Vec<DistanceConstraint> {
    let rows = shape.padded_depths.saturating_sub(step);
    let mut links = Vec::with_capacity(rows * shape.padded_ranks);
    for depth in 0..rows {
        for rank in 0..shape.padded_ranks {
            links.push(DistanceConstraint::from_positions(
                shape.index(rank, depth),
                shape.index(rank, depth + step),
                positions,
                compliance,
            ));
        }
    }
    links
}

/// The same links built on the transposed grid, mapped back to `shape`.
fn rank_links(
    shape: &GridShape,
    positions: &[Vector3<f64>],
    step: usize,
    compliance: f64,
) -> Vec<DistanceConstraint> {
    let transposed = shape.transposed();
    let transposed_positions = shape.transpose(positions);
    depth_links(&transposed, &transposed_positions, step, compliance)
        .into_iter()
        .map(|mut link| {
            link.first = transposed.transpose_index(link.first);
            link.second = transposed.transpose_index(link.second);
            link
        })
        .collect()
}

/// Structural links between neighbours along each chain.
#[must_use]
pub fn vertical_structures(
    shape: &GridShape,
    positions: &[Vector3<f64>],
    compliance: f64,
) -> Vec<DistanceConstraint> {
    depth_links(shape, positions, 1, compliance)
}

/// Structural links between neighbouring chains.
///
/// With `looped`, the last real chain is also linked back to the first one.
#[must_use]
pub fn horizontal_structures(
    shape: &GridShape,
    positions: &[Vector3<f64>],
    compliance: f64,
    looped: bool,
) -> Vec<DistanceConstraint> {
    let mut links = rank_links(shape, positions, 1, compliance);
    if looped && shape.actual_ranks >= 2 {
        let last = shape.actual_ranks - 1;
        for depth in 0..shape.padded_depths {
            links.push(DistanceConstraint::from_positions(
                shape.index(last, depth),
                shape.index(0, depth),
                positions,
                compliance,
            ));
        }
    }
    links
}

/// Links skipping one particle along each chain.
#[must_use]
pub fn vertical_bends(
    shape: &GridShape,
    positions: &[Vector3<f64>],
    compliance: f64,
) -> Vec<DistanceConstraint> {
    depth_links(shape, positions, 2, compliance)
}

/// Links skipping one chain.
#[must_use]
pub fn horizontal_bends(
    shape: &GridShape,
    positions: &[Vector3<f64>],
    compliance: f64,
) -> Vec<DistanceConstraint> {
    rank_links(shape, positions, 2, compliance)
}

/// Diagonal links across each cell between neighbouring chains.
///
/// The cell right of the last real chain only exists when `looped`.
#[must_use]
pub fn shears(
    shape: &GridShape,
    positions: &[Vector3<f64>],
    compliance: f64,
    looped: bool,
) -> Vec<DistanceConstraint> {
    let mut links = Vec::new();
    for depth in 0..shape.padded_depths.saturating_sub(1) {
        for rank in 0..shape.actual_ranks {
            let next = if rank + 1 < shape.actual_ranks {
                rank + 1
            } else if looped && shape.actual_ranks >= 2 {
                0
            } else {
                continue;
            };
            links.push(DistanceConstraint::from_positions(
                shape.index(rank, depth),
                shape.index(next, depth + 1),
                positions,
                compliance,
            ));
            links.push(DistanceConstraint::from_positions(
                shape.index(next, depth),
                shape.index(rank, depth + 1),
                positions,
                compliance,
            ));
        }
    }
    links
}
