//! Debug visualization hook.
//!
//! The solver never draws on its own. A host implements [`DebugDraw`] for
//! its renderer and asks the solver (and colliders) to visit what the
//! [`DebugDrawFlags`] select. Every method has a no-op default so a backend
//! only implements the primitives it can show.

use nalgebra::Vector3;

use crate::collider::{BodyCollider, PlaneCollider};

bitflags::bitflags! {
    /// What to visit when drawing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DebugDrawFlags: u32 {
        /// Real particles as spheres of their collision radius.
        const PARTICLES = 0b0000_0001;
        /// Vertical and horizontal structural links.
        const STRUCTURES = 0b0000_0010;
        /// Bend and shear links.
        const BENDS_AND_SHEARS = 0b0000_0100;
        /// Animated chain shape.
        const ANIM_POSE = 0b0000_1000;
        /// Contacts of the last solver iteration.
        const CONTACTS = 0b0001_0000;
        /// Body collider spheres and capsules.
        const BODY_COLLIDERS = 0b0010_0000;
        /// Plane colliders.
        const PLANES = 0b0100_0000;
    }
}

/// Debug rendering backend.
pub trait DebugDraw {
    /// A sphere.
    fn sphere(&mut self, _center: &Vector3<f64>, _radius: f64, _category: DebugDrawFlags) {}

    /// A line segment.
    fn segment(&mut self, _start: &Vector3<f64>, _end: &Vector3<f64>, _category: DebugDrawFlags) {}

    /// An infinite plane through `origin`.
    fn plane(&mut self, _origin: &Vector3<f64>, _normal: &Vector3<f64>, _category: DebugDrawFlags) {}

    /// A capsule, drawn as its axis and two end spheres.
    fn capsule(
        &mut self,
        start: &Vector3<f64>,
        end: &Vector3<f64>,
        radius: f64,
        category: DebugDrawFlags,
    ) {
        self.segment(start, end, category);
        self.sphere(start, radius, category);
        self.sphere(end, radius, category);
    }
}

/// A recorded sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugSphere {
    /// Center.
    pub center: Vector3<f64>,
    /// Radius.
    pub radius: f64,
    /// Flag that produced it.
    pub category: DebugDrawFlags,
}

/// A recorded segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugSegment {
    /// Start point.
    pub start: Vector3<f64>,
    /// End point.
    pub end: Vector3<f64>,
    /// Flag that produced it.
    pub category: DebugDrawFlags,
}

/// A recorded plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugPlane {
    /// A point on the plane.
    pub origin: Vector3<f64>,
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Flag that produced it.
    pub category: DebugDrawFlags,
}

/// Collected debug geometry for a frame.
#[derive(Debug, Clone, Default)]
pub struct DebugDrawData {
    /// Spheres.
    pub spheres: Vec<DebugSphere>,
    /// Segments.
    pub segments: Vec<DebugSegment>,
    /// Planes.
    pub planes: Vec<DebugPlane>,
}

impl DebugDrawData {
    /// Drop everything recorded.
    pub fn clear(&mut self) {
        self.spheres.clear();
        self.segments.clear();
        self.planes.clear();
    }

    /// Number of recorded primitives of `category`.
    #[must_use]
    pub fn count(&self, category: DebugDrawFlags) -> usize {
        self.spheres.iter().filter(|s| s.category == category).count()
            + self.segments.iter().filter(|s| s.category == category).count()
            + self.planes.iter().filter(|p| p.category == category).count()
    }
}

impl DebugDraw for DebugDrawData {
    fn sphere(&mut self, center: &Vector3<f64>, radius: f64, category: DebugDrawFlags) {
        self.spheres.push(DebugSphere {
            center: *center,
            radius,
            category,
        });
    }

    fn segment(&mut self, start: &Vector3<f64>, end: &Vector3<f64>, category: DebugDrawFlags) {
        self.segments.push(DebugSegment {
            start: *start,
            end: *end,
            category,
        });
    }

    fn plane(&mut self, origin: &Vector3<f64>, normal: &Vector3<f64>, category: DebugDrawFlags) {
        self.planes.push(DebugPlane {
            origin: *origin,
            normal: *normal,
            category,
        });
    }
}

/// Visit the shapes of `body` resolved this frame.
pub fn draw_body_collider(body: &BodyCollider, flags: DebugDrawFlags, draw: &mut dyn DebugDraw) {
    if !flags.contains(DebugDrawFlags::BODY_COLLIDERS) {
        return;
    }
    let current = body.current();
    for sphere in current.spheres.iter().flatten() {
        draw.sphere(&sphere.center, sphere.radius, DebugDrawFlags::BODY_COLLIDERS);
    }
    for capsule in current.capsules.iter().flatten() {
        draw.capsule(
            &capsule.start,
            &capsule.end,
            capsule.radius,
            DebugDrawFlags::BODY_COLLIDERS,
        );
    }
}

/// Visit every plane resolved this frame.
pub fn draw_plane_colliders(planes: &[PlaneCollider], flags: DebugDrawFlags, draw: &mut dyn DebugDraw) {
    if !flags.contains(DebugDrawFlags::PLANES) {
        return;
    }
    for plane in planes.iter().filter_map(PlaneCollider::current) {
        draw.plane(&plane.origin, &plane.normal, DebugDrawFlags::PLANES);
    }
}
