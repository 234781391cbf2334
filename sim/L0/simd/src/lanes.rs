//! Four-wide scalar lanes.
//!
//! [`Lanes`] is the scalar companion of [`crate::Vec3x4`]: per-particle
//! coefficients (masks, damping, friction) loaded four at a time.

/// Four `f64` lanes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C, align(32))]
pub struct Lanes(pub [f64; 4]);

impl Lanes {
    /// All lanes zero.
    pub const ZERO: Self = Self([0.0; 4]);

    /// All lanes one.
    pub const ONE: Self = Self([1.0; 4]);

    /// Broadcast a scalar to all 4 lanes.
    #[must_use]
    #[inline]
    pub const fn splat(value: f64) -> Self {
        Self([value; 4])
    }

    /// Load the first 4 values of a slice, zero-filling missing lanes.
    #[must_use]
    #[inline]
    pub fn from_slice(values: &[f64]) -> Self {
        let mut lanes = [0.0; 4];
        for (lane, v) in lanes.iter_mut().zip(values) {
            *lane = *v;
        }
        Self(lanes)
    }

    /// `1 - x` for every lane.
    ///
    /// Turns a mask or a damping coefficient into a pass-through factor.
    #[must_use]
    #[inline]
    pub fn one_minus(&self) -> Self {
        let mut result = self.0;
        for v in &mut result {
            *v = 1.0 - *v;
        }
        Self(result)
    }

    /// Lane-wise product.
    #[must_use]
    #[inline]
    pub fn mul(&self, other: &Self) -> Self {
        let mut result = self.0;
        for i in 0..4 {
            result[i] *= other.0[i];
        }
        Self(result)
    }

    /// Multiply every lane by a scalar.
    #[must_use]
    #[inline]
    pub fn scale(&self, scalar: f64) -> Self {
        self.mul(&Self::splat(scalar))
    }

    /// Pick `if_positive` in lanes where `mask > 0`, `otherwise` elsewhere.
    #[must_use]
    #[inline]
    pub fn select_positive(mask: &Self, if_positive: &Self, otherwise: &Self) -> Self {
        let mut result = otherwise.0;
        for i in 0..4 {
            if mask.0[i] > 0.0 {
                result[i] = if_positive.0[i];
            }
        }
        Self(result)
    }
}

impl std::ops::Mul for Lanes {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::mul(&self, &rhs)
    }
}

impl From<[f64; 4]> for Lanes {
    fn from(values: [f64; 4]) -> Self {
        Self(values)
    }
}
