//! Four positions at a time.
//!
//! A particle buffer is a flat `[Vector3<f64>]` whose length is a multiple of
//! [`crate::LANE_WIDTH`]. [`Vec3x4`] loads one lane group of it into three
//! component arrays, runs the per-particle arithmetic lane by lane and stores
//! the result back.

use nalgebra::Vector3;

use crate::Lanes;

/// Four `Vector3<f64>` split by component.
///
/// ```text
/// xs: [x0, x1, x2, x3]
/// ys: [y0, y1, y2, y3]
/// zs: [z0, z1, z2, z3]
/// ```
///
/// One damped Verlet step over a lane group, with the last lane pinned:
///
/// ```
/// use sway_simd::{Lanes, Vec3x4};
/// use nalgebra::Vector3;
///
/// let mut positions = [Vector3::new(0.0, 0.0, -1.0); 4];
/// let prev = [Vector3::zeros(); 4];
/// let pinned = Lanes([0.0, 0.0, 0.0, 1.0]);
///
/// let p = Vec3x4::from_slice(&positions);
/// let velocity = p.sub(&Vec3x4::from_slice(&prev));
/// p.add_scaled(&velocity, &pinned.one_minus().scale(0.5))
///     .write_to_slice(&mut positions);
///
/// assert_eq!(positions[0].z, -1.5);
/// assert_eq!(positions[3].z, -1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(32))]
pub struct Vec3x4 {
    /// X of each lane.
    pub xs: [f64; 4],
    /// Y of each lane.
    pub ys: [f64; 4],
    /// Z of each lane.
    pub zs: [f64; 4],
}

impl Default for Vec3x4 {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Vec3x4 {
    /// All lanes zero.
    #[must_use]
    #[inline]
    pub const fn zeros() -> Self {
        Self {
            xs: [0.0; 4],
            ys: [0.0; 4],
            zs: [0.0; 4],
        }
    }

    /// The same vector in every lane.
    #[must_use]
    #[inline]
    pub fn splat(v: Vector3<f64>) -> Self {
        Self {
            xs: [v.x; 4],
            ys: [v.y; 4],
            zs: [v.z; 4],
        }
    }

    /// Load up to four vectors; lanes past the end of `vectors` stay zero.
    #[must_use]
    #[inline]
    pub fn from_slice(vectors: &[Vector3<f64>]) -> Self {
        let mut lanes = Self::zeros();
        for (lane, v) in vectors.iter().take(4).enumerate() {
            lanes.xs[lane] = v.x;
            lanes.ys[lane] = v.y;
            lanes.zs[lane] = v.z;
        }
        lanes
    }

    /// Store into the first four entries of `out`. Lanes past its end are
    /// dropped.
    #[inline]
    pub fn write_to_slice(&self, out: &mut [Vector3<f64>]) {
        for (lane, v) in out.iter_mut().take(4).enumerate() {
            *v = self.get(lane);
        }
    }

    /// Vector in `lane`.
    #[must_use]
    #[inline]
    pub fn get(&self, lane: usize) -> Vector3<f64> {
        debug_assert!(lane < 4);
        Vector3::new(self.xs[lane], self.ys[lane], self.zs[lane])
    }

    /// All four lanes as vectors.
    #[must_use]
    #[inline]
    pub fn to_vectors(&self) -> [Vector3<f64>; 4] {
        std::array::from_fn(|lane| self.get(lane))
    }

    /// Lane-wise dot product.
    #[must_use]
    #[inline]
    pub fn dot_pairwise(&self, other: &Self) -> Lanes {
        let mut dots = [0.0; 4];
        for i in 0..4 {
            dots[i] = self.xs[i] * other.xs[i] + self.ys[i] * other.ys[i] + self.zs[i] * other.zs[i];
        }
        Lanes(dots)
    }

    /// Squared length of every lane.
    #[must_use]
    #[inline]
    pub fn norm_squared(&self) -> Lanes {
        self.dot_pairwise(self)
    }

    /// Length of every lane.
    #[must_use]
    #[inline]
    pub fn norm(&self) -> Lanes {
        Lanes(self.norm_squared().0.map(f64::sqrt))
    }

    /// Lane-wise sum.
    #[must_use]
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        self.add_scaled(other, &Lanes::ONE)
    }

    /// Lane-wise difference.
    #[must_use]
    #[inline]
    pub fn sub(&self, other: &Self) -> Self {
        self.add_scaled(other, &Lanes::splat(-1.0))
    }

    /// Multiply every lane by `scalar`.
    #[must_use]
    #[inline]
    pub fn scale(&self, scalar: f64) -> Self {
        self.scale_lanes(&Lanes::splat(scalar))
    }

    /// Multiply each lane by its own factor. A zero factor masks the lane out.
    #[must_use]
    #[inline]
    pub fn scale_lanes(&self, factors: &Lanes) -> Self {
        let mut scaled = *self;
        for i in 0..4 {
            let f = factors.0[i];
            scaled.xs[i] *= f;
            scaled.ys[i] *= f;
            scaled.zs[i] *= f;
        }
        scaled
    }

    /// Per-lane `self + (target - self) * t`.
    #[must_use]
    #[inline]
    pub fn lerp_lanes(&self, target: &Self, t: &Lanes) -> Self {
        self.add(&target.sub(self).scale_lanes(t))
    }

    /// Per-lane `self + step * factor`.
    #[must_use]
    #[inline]
    pub fn add_scaled(&self, step: &Self, factor: &Lanes) -> Self {
        let mut sum = *self;
        for i in 0..4 {
            let f = factor.0[i];
            sum.xs[i] = step.xs[i].mul_add(f, sum.xs[i]);
            sum.ys[i] = step.ys[i].mul_add(f, sum.ys[i]);
            sum.zs[i] = step.zs[i].mul_add(f, sum.zs[i]);
        }
        sum
    }
}
