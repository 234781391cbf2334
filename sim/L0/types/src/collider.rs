//! Collider descriptions in bone-local space.
//!
//! These are the raw primitives a host extracts from its body description
//! (physics asset, ragdoll, hand-authored volumes). The solver resolves them
//! against the pose every frame.

use nalgebra::{UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sphere attached to a driver bone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphereShape {
    /// Driver bone name.
    pub driver_bone: String,
    /// Center in the driver bone's local space.
    pub center: Vector3<f64>,
    /// Radius.
    pub radius: f64,
}

/// Capsule attached to a driver bone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CapsuleShape {
    /// Driver bone name.
    pub driver_bone: String,
    /// First axis endpoint in the driver bone's local space.
    pub start: Vector3<f64>,
    /// Second axis endpoint in the driver bone's local space.
    pub end: Vector3<f64>,
    /// Radius.
    pub radius: f64,
}

/// The body collider set: spheres and capsules bound to bones.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyColliderSettings {
    /// Spheres.
    pub spheres: Vec<SphereShape>,
    /// Capsules.
    pub capsules: Vec<CapsuleShape>,
}

impl BodyColliderSettings {
    /// Add a sphere.
    #[must_use]
    pub fn sphere(mut self, driver_bone: impl Into<String>, center: Vector3<f64>, radius: f64) -> Self {
        self.spheres.push(SphereShape {
            driver_bone: driver_bone.into(),
            center,
            radius,
        });
        self
    }

    /// Add a capsule.
    #[must_use]
    pub fn capsule(
        mut self,
        driver_bone: impl Into<String>,
        start: Vector3<f64>,
        end: Vector3<f64>,
        radius: f64,
    ) -> Self {
        self.capsules.push(CapsuleShape {
            driver_bone: driver_bone.into(),
            start,
            end,
            radius,
        });
        self
    }

    /// Whether there is nothing to collide with.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.capsules.is_empty()
    }
}

/// An infinite plane, optionally following a bone.
///
/// The plane's normal is the +Z axis of its resolved rotation; particles are
/// kept on the positive side.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneColliderSettings {
    /// Driver bone name, `None` for a plane fixed in component space.
    pub driver_bone: Option<String>,
    /// Origin offset (bone-local when driven).
    pub location: Vector3<f64>,
    /// Orientation offset (bone-local when driven).
    pub rotation: UnitQuaternion<f64>,
}

impl Default for PlaneColliderSettings {
    fn default() -> Self {
        Self::ground()
    }
}

impl PlaneColliderSettings {
    /// The `z = 0` ground plane facing +Z.
    #[must_use]
    pub fn ground() -> Self {
        Self {
            driver_bone: None,
            location: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Fixed plane through `location` facing `normal`.
    #[must_use]
    pub fn facing(location: Vector3<f64>, normal: &Vector3<f64>) -> Self {
        Self {
            driver_bone: None,
            location,
            rotation: crate::find_between(&Vector3::z(), normal),
        }
    }

    /// Attach the plane to a bone.
    #[must_use]
    pub fn driven_by(mut self, bone: impl Into<String>) -> Self {
        self.driver_bone = Some(bone.into());
        self
    }
}
