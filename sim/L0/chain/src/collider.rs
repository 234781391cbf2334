//! Colliders bound to bones.
//!
//! Collider shapes are authored in bone space and re-resolved against the
//! pose every frame. A shape whose driver bone is missing from the pose is
//! disabled for that frame. Body colliders keep the previous frame's
//! resolved shapes for swept tests.

use nalgebra::{UnitQuaternion, Vector3};
use sway_types::{
    BodyColliderSettings, BoneIndex, BoneTransform, PlaneColliderSettings, Pose, Skeleton,
};
use tracing::{trace, warn};

use crate::collision::{Capsule, Sphere};

/// Body collider shapes resolved for one frame. `None` marks a disabled shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColliderSnapshot {
    /// Spheres in settings order.
    pub spheres: Vec<Option<Sphere>>,
    /// Capsules in settings order.
    pub capsules: Vec<Option<Capsule>>,
}

/// Spheres and capsules following the skeleton.
#[derive(Debug, Clone, Default)]
pub struct BodyCollider {
    settings: BodyColliderSettings,
    sphere_drivers: Vec<Option<BoneIndex>>,
    capsule_drivers: Vec<Option<BoneIndex>>,
    current: ColliderSnapshot,
    previous: ColliderSnapshot,
    has_previous: bool,
}

fn resolve_driver<S: Skeleton + ?Sized>(skeleton: &S, name: &str) -> Option<BoneIndex> {
    let bone = skeleton.find_bone(name);
    if bone.is_none() {
        warn!(bone = name, "collider driver bone not found, collider disabled");
    }
    bone
}

fn driver_transform<P: Pose + ?Sized>(pose: &P, driver: Option<BoneIndex>) -> Option<BoneTransform> {
    let transform = driver.and_then(|bone| pose.component_transform(bone));
    if transform.is_none() {
        trace!(?driver, "collider driver not evaluated this frame");
    }
    transform
}

impl BodyCollider {
    /// Bind `settings` to the bones of `skeleton`.
    #[must_use]
    pub fn new<S: Skeleton + ?Sized>(skeleton: &S, settings: BodyColliderSettings) -> Self {
        let sphere_drivers = settings
            .spheres
            .iter()
            .map(|s| resolve_driver(skeleton, &s.driver_bone))
            .collect();
        let capsule_drivers = settings
            .capsules
            .iter()
            .map(|c| resolve_driver(skeleton, &c.driver_bone))
            .collect();
        Self {
            settings,
            sphere_drivers,
            capsule_drivers,
            current: ColliderSnapshot::default(),
            previous: ColliderSnapshot::default(),
            has_previous: false,
        }
    }

    /// Re-resolve every shape against `pose`.
    ///
    /// The previous snapshot becomes the last resolved one; on the first
    /// update (or after [`Self::reset`]) both snapshots are equal.
    pub fn update<P: Pose + ?Sized>(&mut self, pose: &P) {
        let spheres = self
            .settings
            .spheres
            .iter()
            .zip(&self.sphere_drivers)
            .map(|(shape, &driver)| {
                driver_transform(pose, driver).map(|bone| {
                    Sphere::new(bone.transform_position(&shape.center), shape.radius)
                })
            })
            .collect();
        let capsules = self
            .settings
            .capsules
            .iter()
            .zip(&self.capsule_drivers)
            .map(|(shape, &driver)| {
                driver_transform(pose, driver).map(|bone| {
                    Capsule::new(
                        bone.transform_position(&shape.start),
                        bone.transform_position(&shape.end),
                        shape.radius,
                    )
                })
            })
            .collect();

        let resolved = ColliderSnapshot { spheres, capsules };
        let previous = std::mem::replace(&mut self.current, resolved);
        self.previous = if self.has_previous {
            // A shape that just came back has no motion to sweep.
            merge_previous(previous, &self.current)
        } else {
            self.current.clone()
        };
        self.has_previous = true;
    }

    /// Forget the previous frame (after a teleport or re-initialization).
    pub fn reset(&mut self) {
        self.has_previous = false;
    }

    /// Shapes of this frame.
    #[must_use]
    pub fn current(&self) -> &ColliderSnapshot {
        &self.current
    }

    /// Shapes of the previous frame.
    #[must_use]
    pub fn previous(&self) -> &ColliderSnapshot {
        &self.previous
    }

    /// Whether there are no shapes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

fn merge_previous(previous: ColliderSnapshot, current: &ColliderSnapshot) -> ColliderSnapshot {
    fn merge<T: Copy>(prev: Vec<Option<T>>, cur: &[Option<T>]) -> Vec<Option<T>> {
        prev.into_iter().zip(cur).map(|(p, c)| p.or(*c)).collect()
    }
    ColliderSnapshot {
        spheres: merge(previous.spheres, &current.spheres),
        capsules: merge(previous.capsules, &current.capsules),
    }
}

/// A plane resolved for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPlane {
    /// A point on the plane.
    pub origin: Vector3<f64>,
    /// Plane orientation; the normal is its +Z axis.
    pub rotation: UnitQuaternion<f64>,
    /// Unit normal.
    pub normal: Vector3<f64>,
}

/// An infinite plane, fixed or following a bone.
#[derive(Debug, Clone)]
pub struct PlaneCollider {
    settings: PlaneColliderSettings,
    driver: Option<BoneIndex>,
    current: Option<ResolvedPlane>,
}

impl PlaneCollider {
    /// Bind `settings` to `skeleton`.
    #[must_use]
    pub fn new<S: Skeleton + ?Sized>(skeleton: &S, settings: PlaneColliderSettings) -> Self {
        let driver = settings
            .driver_bone
            .as_deref()
            .and_then(|name| resolve_driver(skeleton, name));
        let current = if settings.driver_bone.is_none() {
            Some(Self::resolve(&settings, &BoneTransform::identity()))
        } else {
            None
        };
        Self {
            settings,
            driver,
            current,
        }
    }

    fn resolve(settings: &PlaneColliderSettings, bone: &BoneTransform) -> ResolvedPlane {
        let offset = BoneTransform::new(settings.rotation, settings.location);
        let world = offset.then(bone);
        ResolvedPlane {
            origin: world.translation,
            rotation: world.rotation,
            normal: world.rotation * Vector3::z(),
        }
    }

    /// Re-resolve against `pose`. Fixed planes never change.
    pub fn update<P: Pose + ?Sized>(&mut self, pose: &P) {
        if self.settings.driver_bone.is_none() {
            return;
        }
        self.current =
            driver_transform(pose, self.driver).map(|bone| Self::resolve(&self.settings, &bone));
    }

    /// The plane this frame, `None` while its driver is missing.
    #[must_use]
    pub fn current(&self) -> Option<&ResolvedPlane> {
        self.current.as_ref()
    }
}
