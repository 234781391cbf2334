//! Per-bone profile curves.
//!
//! A chain tunable is a base value multiplied by a curve sampled at the
//! bone's normalized position along the chain (`0.0` at the root, `1.0` at
//! the tip). This is how hair gets a thin, light tip and a stiff root
//! without configuring every bone.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One key of a [`ProfileCurve`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurveKey {
    /// Normalized chain position in `[0, 1]`.
    pub t: f64,
    /// Multiplier at `t`.
    pub value: f64,
}

/// Piecewise-linear multiplier curve over normalized chain length.
///
/// An empty curve evaluates to `1.0` everywhere. Outside the key range the
/// first or last key's value is held.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileCurve {
    keys: Vec<CurveKey>,
}

impl ProfileCurve {
    /// The constant-one curve.
    #[must_use]
    pub const fn constant() -> Self {
        Self { keys: Vec::new() }
    }

    /// Build from `(t, value)` pairs. Keys are sorted by `t`.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut keys: Vec<CurveKey> = keys
            .into_iter()
            .map(|(t, value)| CurveKey { t, value })
            .collect();
        keys.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { keys }
    }

    /// Linear ramp from `start` at the root to `end` at the tip.
    #[must_use]
    pub fn linear(start: f64, end: f64) -> Self {
        Self::from_keys([(0.0, start), (1.0, end)])
    }

    /// The curve keys, sorted by `t`.
    #[must_use]
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Whether the curve has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sample the curve at `t`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };
        if t <= first.t {
            return first.value;
        }
        if t >= last.t {
            return last.value;
        }

        let upper = self.keys.partition_point(|k| k.t <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.t - a.t;
        if span <= f64::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * ((t - a.t) / span)
    }
}

/// A base value scaled per bone by a [`ProfileCurve`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScaledParameter {
    /// Base value.
    pub value: f64,
    /// Multiplier over normalized chain length.
    pub curve: ProfileCurve,
}

impl ScaledParameter {
    /// Constant parameter (empty curve).
    #[must_use]
    pub const fn constant(value: f64) -> Self {
        Self {
            value,
            curve: ProfileCurve::constant(),
        }
    }

    /// Parameter with a multiplier curve.
    #[must_use]
    pub const fn with_curve(value: f64, curve: ProfileCurve) -> Self {
        Self { value, curve }
    }

    /// Value for a bone at normalized chain position `t`.
    #[must_use]
    #[inline]
    pub fn sample(&self, t: f64) -> f64 {
        self.value * self.curve.evaluate(t)
    }
}
