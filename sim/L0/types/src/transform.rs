//! Bone transforms and small vector helpers.
//!
//! Transforms follow the scale → rotate → translate convention used by
//! skeletal animation: a point `p` in bone space maps to
//! `rotation * (scale ∘ p) + translation` in the parent space.

use nalgebra::{Unit, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Squared length below which a vector is treated as zero.
pub const SMALL_NUMBER_SQUARED: f64 = 1e-8;

/// Normalize `v`, or return zero when it is too short to have a direction.
#[must_use]
#[inline]
pub fn safe_normal(v: &Vector3<f64>) -> Vector3<f64> {
    let len_sq = v.norm_squared();
    if len_sq > SMALL_NUMBER_SQUARED {
        v / len_sq.sqrt()
    } else {
        Vector3::zeros()
    }
}

/// Shortest-arc rotation taking direction `from` onto direction `to`.
///
/// Zero-length inputs give the identity. Opposite directions rotate half a
/// turn about an arbitrary axis perpendicular to `from`.
#[must_use]
pub fn find_between(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    if from.norm_squared() <= SMALL_NUMBER_SQUARED || to.norm_squared() <= SMALL_NUMBER_SQUARED {
        return UnitQuaternion::identity();
    }

    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        let perpendicular = if from.x.abs() > from.z.abs() {
            Vector3::new(-from.y, from.x, 0.0)
        } else {
            Vector3::new(0.0, -from.z, from.y)
        };
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(perpendicular), std::f64::consts::PI)
    })
}

/// A local bone axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// Local X.
    #[default]
    X,
    /// Local Y.
    Y,
    /// Local Z.
    Z,
}

impl Axis {
    /// The unit vector along this axis.
    #[must_use]
    pub fn unit(self) -> Vector3<f64> {
        match self {
            Self::X => Vector3::x(),
            Self::Y => Vector3::y(),
            Self::Z => Vector3::z(),
        }
    }
}

/// Translation, rotation and non-uniform scale of a bone.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneTransform {
    /// Translation.
    pub translation: Vector3<f64>,
    /// Rotation.
    pub rotation: UnitQuaternion<f64>,
    /// Per-axis scale.
    pub scale: Vector3<f64>,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl BoneTransform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Unit-scale transform from a rotation and translation.
    #[must_use]
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            translation,
            rotation,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Set the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vector3<f64>) -> Self {
        self.scale = scale;
        self
    }

    /// Map a point from this transform's local space into its parent space.
    #[must_use]
    #[inline]
    pub fn transform_position(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p.component_mul(&self.scale) + self.translation
    }

    /// Map a direction from local space into parent space (no translation).
    #[must_use]
    #[inline]
    pub fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * v.component_mul(&self.scale)
    }

    /// Map a point from parent space back into local space.
    #[must_use]
    #[inline]
    pub fn inverse_transform_position(&self, p: &Vector3<f64>) -> Vector3<f64> {
        (self.rotation.inverse() * (p - self.translation)).component_mul(&self.safe_inverse_scale())
    }

    /// Map a direction from parent space back into local space.
    #[must_use]
    #[inline]
    pub fn inverse_transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        (self.rotation.inverse() * v).component_mul(&self.safe_inverse_scale())
    }

    /// Express a parent-space rotation relative to this transform.
    #[must_use]
    #[inline]
    pub fn inverse_transform_rotation(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.rotation.inverse() * q
    }

    /// This transform's local `axis`, expressed in parent space.
    #[must_use]
    #[inline]
    pub fn unit_axis(&self, axis: Axis) -> Vector3<f64> {
        self.rotation * axis.unit()
    }

    /// Compose with a parent: the result maps this transform's local space
    /// straight into the parent's parent space.
    #[must_use]
    pub fn then(&self, parent: &Self) -> Self {
        Self {
            translation: parent.transform_position(&self.translation),
            rotation: parent.rotation * self.rotation,
            scale: self.scale.component_mul(&parent.scale),
        }
    }

    /// Blend toward `other` by `alpha` (0 keeps `self`, 1 gives `other`).
    ///
    /// Translation and scale are interpolated linearly, rotation by
    /// normalized lerp along the shorter arc.
    #[must_use]
    pub fn blend(&self, other: &Self, alpha: f64) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        let a = self.rotation.into_inner();
        let mut b = other.rotation.into_inner();
        if a.dot(&b) < 0.0 {
            b = -b;
        }
        Self {
            translation: self.translation.lerp(&other.translation, alpha),
            rotation: UnitQuaternion::new_normalize(a.lerp(&b, alpha)),
            scale: self.scale.lerp(&other.scale, alpha),
        }
    }

    fn safe_inverse_scale(&self) -> Vector3<f64> {
        self.scale.map(|s| if s.abs() > f64::EPSILON { 1.0 / s } else { 0.0 })
    }
}
