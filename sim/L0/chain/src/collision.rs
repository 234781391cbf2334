//! Collision geometry.
//!
//! Closest-point queries and intersection tests between particles (spheres),
//! structural edges (segments) and colliders (spheres, capsules, planes).
//! Every hit is reported as a [`SeparatingPlane`]: a unit normal and the plane
//! constant the particle must reach along it to be separated.
//!
//! Sphere and capsule tests run both a static overlap check and a swept check
//! over the last frame's motion. The swept check only reports crossings that
//! start outside the collider; when both hit, the swept result is used.

use nalgebra::Vector3;
use sway_types::safe_normal;

/// Length substitution threshold for degenerate segments.
pub const SMALL_NUMBER: f64 = 1e-8;

/// A sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center.
    pub center: Vector3<f64>,
    /// Radius.
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere.
    #[must_use]
    pub const fn new(center: Vector3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// A capsule: every point within `radius` of the segment `start..end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    /// Segment start.
    pub start: Vector3<f64>,
    /// Segment end.
    pub end: Vector3<f64>,
    /// Radius.
    pub radius: f64,
}

impl Capsule {
    /// Create a capsule.
    #[must_use]
    pub const fn new(start: Vector3<f64>, end: Vector3<f64>, radius: f64) -> Self {
        Self { start, end, radius }
    }

    /// Midpoint of the axis.
    #[must_use]
    pub fn center(&self) -> Vector3<f64> {
        (self.start + self.end) * 0.5
    }

    fn inflated(&self, by: f64) -> Self {
        Self::new(self.start, self.end, self.radius + by)
    }
}

/// Direction and plane constant that separate a particle from a collider.
///
/// A particle at `p` is separated once `p · normal >= offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeparatingPlane {
    /// Unit separating direction.
    pub normal: Vector3<f64>,
    /// Plane constant along `normal`.
    pub offset: f64,
}

/// Closest point on a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPoint {
    /// Parameter along the segment in [0, 1].
    pub t: f64,
    /// The point.
    pub point: Vector3<f64>,
    /// Squared distance to the query point.
    pub distance_squared: f64,
}

/// Closest point on segment `a..b` to `p`.
#[must_use]
pub fn closest_point_on_segment(
    p: &Vector3<f64>,
    a: &Vector3<f64>,
    b: &Vector3<f64>,
) -> SegmentPoint {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    let safe_len_sq = if len_sq <= 0.0 { 1.0 } else { len_sq };
    let t = ((p - a).dot(&ab) / safe_len_sq).clamp(0.0, 1.0);
    let point = a + ab * t;
    SegmentPoint {
        t,
        point,
        distance_squared: (point - p).norm_squared(),
    }
}

/// Closest points between two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPair {
    /// Parameter along the first segment.
    pub s: f64,
    /// Parameter along the second segment.
    pub t: f64,
    /// Point on the first segment.
    pub first: Vector3<f64>,
    /// Point on the second segment.
    pub second: Vector3<f64>,
    /// Squared distance between the points.
    pub distance_squared: f64,
}

/// Closest points between segments `p1..q1` and `p2..q2` (Ericson).
#[must_use]
pub fn closest_points_between_segments(
    p1: &Vector3<f64>,
    q1: &Vector3<f64>,
    p2: &Vector3<f64>,
    q2: &Vector3<f64>,
) -> SegmentPair {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);
    let safe_a = if a <= SMALL_NUMBER { 1.0 } else { a };
    let safe_e = if e <= SMALL_NUMBER { 1.0 } else { e };

    let (s, t) = if a <= SMALL_NUMBER && e <= SMALL_NUMBER {
        (0.0, 0.0)
    } else if a <= SMALL_NUMBER {
        (0.0, (f / safe_e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= SMALL_NUMBER {
            ((-c / safe_a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            // Parallel segments: pick s = 0 and let t follow.
            let mut s = if denom > SMALL_NUMBER {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let first = p1 + d1 * s;
    let second = p2 + d2 * t;
    SegmentPair {
        s,
        t,
        first,
        second,
        distance_squared: (first - second).norm_squared(),
    }
}

/// First point where segment `start..end` enters `sphere`.
///
/// Returns the distance travelled from `start` and the entry point. A start
/// inside the sphere reports `start` itself.
#[must_use]
pub fn intersect_segment_sphere(
    start: &Vector3<f64>,
    end: &Vector3<f64>,
    sphere: &Sphere,
) -> Option<(f64, Vector3<f64>)> {
    let segment = end - start;
    let length = segment.norm();
    let d = safe_normal(&segment);
    let m = start - sphere.center;
    let b = m.dot(&d);
    let c = m.norm_squared() - sphere.radius * sphere.radius;

    // Outside and pointing away.
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()).max(0.0);
    if t > length {
        return None;
    }
    Some((t, start + d * t))
}

/// First point where segment `start..end` enters `capsule`.
///
/// The capsule is treated as a cylinder capped by two spheres. The segment's
/// slab along the capsule axis is rejected early, then the cylinder is solved
/// exactly and the caps are handed to [`intersect_segment_sphere`].
#[must_use]
pub fn intersect_segment_capsule(
    start: &Vector3<f64>,
    end: &Vector3<f64>,
    capsule: &Capsule,
) -> Option<Vector3<f64>> {
    let start_cap = Sphere::new(capsule.start, capsule.radius);
    let end_cap = Sphere::new(capsule.end, capsule.radius);
    let n = end - start;
    let r = capsule.radius;

    // Slab test against the capsule's bounding cylinder.
    let axis = safe_normal(&(capsule.end - capsule.start));
    let p = capsule.start - axis * r;
    let q = capsule.end + axis * r;
    let d = q - p;
    let md = (start - p).dot(&d);
    let nd = n.dot(&d);
    let dd = d.norm_squared();
    let within_near = md >= 0.0 || md + nd >= 0.0;
    let within_far = md <= dd || md + nd <= dd;
    if !(within_near && within_far) {
        return None;
    }

    let d = capsule.end - capsule.start;
    let m = start - capsule.start;
    let md = m.dot(&d);
    let nd = n.dot(&d);
    let dd = d.norm_squared();
    let nn = n.norm_squared();
    let mn = m.dot(&n);
    let a = dd * nn - nd * nd;
    let k = m.norm_squared() - r * r;
    let c = dd * k - md * md;

    if a < SMALL_NUMBER {
        // Segment runs parallel to the axis.
        if c > 0.0 {
            return None;
        }
        return if md < 0.0 {
            intersect_segment_sphere(start, end, &start_cap).map(|(_, point)| point)
        } else if md > dd {
            intersect_segment_sphere(start, end, &end_cap).map(|(_, point)| point)
        } else {
            Some(*start)
        };
    }

    let b = dd * mn - nd * md;
    let discriminant = b * b - a * c;
    if discriminant <= 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (a + SMALL_NUMBER);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    let along = md + t * nd;
    if along < 0.0 {
        intersect_segment_sphere(start, end, &start_cap).map(|(_, point)| point)
    } else if along > dd {
        intersect_segment_sphere(start, end, &end_cap).map(|(_, point)| point)
    } else {
        Some(start + n * t)
    }
}

/// Overlap between a sphere and a capsule at rest.
#[must_use]
pub fn static_sphere_capsule(sphere: &Sphere, capsule: &Capsule) -> Option<SeparatingPlane> {
    let closest = closest_point_on_segment(&sphere.center, &capsule.start, &capsule.end);
    let sum = sphere.radius + capsule.radius;
    if closest.distance_squared >= sum * sum {
        return None;
    }
    let normal = safe_normal(&(sphere.center - closest.point));
    let separated = closest.point + normal * sum;
    Some(SeparatingPlane {
        normal,
        offset: normal.dot(&separated),
    })
}

/// Sweep `sphere` by `sphere_velocity` against `capsule` moving by
/// `capsule_velocity`.
///
/// A sphere already touching the capsule at the start of the sweep is left
/// to [`static_sphere_capsule`].
#[must_use]
pub fn dynamic_sphere_capsule(
    sphere: &Sphere,
    sphere_velocity: &Vector3<f64>,
    capsule: &Capsule,
    capsule_velocity: &Vector3<f64>,
) -> Option<SeparatingPlane> {
    let inflated = capsule.inflated(sphere.radius);
    let start = closest_point_on_segment(&sphere.center, &capsule.start, &capsule.end);
    if start.distance_squared <= inflated.radius * inflated.radius {
        return None;
    }
    let relative = sphere_velocity - capsule_velocity;
    let hit = intersect_segment_capsule(&sphere.center, &(sphere.center + relative), &inflated)?;

    let axis_point = closest_point_on_segment(&hit, &capsule.start, &capsule.end).point;
    let normal = safe_normal(&(sphere.center - axis_point));
    Some(SeparatingPlane {
        normal,
        offset: hit.dot(&normal),
    })
}

/// Sphere against capsule, static and swept over the last frame.
#[must_use]
pub fn sphere_capsule(
    sphere: &Sphere,
    prev_sphere: &Sphere,
    capsule: &Capsule,
    prev_capsule: &Capsule,
) -> Option<SeparatingPlane> {
    let sphere_velocity = sphere.center - prev_sphere.center;
    let capsule_velocity = capsule.center() - prev_capsule.center();
    dynamic_sphere_capsule(prev_sphere, &sphere_velocity, prev_capsule, &capsule_velocity)
        .or_else(|| static_sphere_capsule(sphere, capsule))
}

/// Overlap between two spheres at rest, separating `a` from `b`.
#[must_use]
pub fn static_sphere_sphere(a: &Sphere, b: &Sphere) -> Option<SeparatingPlane> {
    let between = a.center - b.center;
    let sum = a.radius + b.radius;
    if between.norm_squared() >= sum * sum {
        return None;
    }
    let normal = safe_normal(&between);
    let separated = b.center + normal * sum;
    Some(SeparatingPlane {
        normal,
        offset: separated.dot(&normal),
    })
}

/// Sweep sphere `a` by `velocity_a` against `b` moving by `velocity_b`.
///
/// Spheres already touching at the start of the sweep are left to
/// [`static_sphere_sphere`].
#[must_use]
pub fn dynamic_sphere_sphere(
    a: &Sphere,
    velocity_a: &Vector3<f64>,
    b: &Sphere,
    velocity_b: &Vector3<f64>,
) -> Option<SeparatingPlane> {
    let inflated = Sphere::new(b.center, b.radius + a.radius);
    if (a.center - b.center).norm_squared() <= inflated.radius * inflated.radius {
        return None;
    }
    let relative = velocity_a - velocity_b;
    let (_, hit) = intersect_segment_sphere(&a.center, &(a.center + relative), &inflated)?;
    let normal = safe_normal(&(a.center - b.center));
    Some(SeparatingPlane {
        normal,
        offset: hit.dot(&normal),
    })
}

/// Sphere against sphere, static and swept over the last frame.
#[must_use]
pub fn sphere_sphere(
    a: &Sphere,
    prev_a: &Sphere,
    b: &Sphere,
    prev_b: &Sphere,
) -> Option<SeparatingPlane> {
    let velocity_a = a.center - prev_a.center;
    let velocity_b = b.center - prev_b.center;
    dynamic_sphere_sphere(prev_a, &velocity_a, prev_b, &velocity_b)
        .or_else(|| static_sphere_sphere(a, b))
}

/// Edge `start..end` against a sphere.
///
/// Both endpoints share the returned plane, computed at the point of the
/// edge closest to the sphere.
#[must_use]
pub fn edge_sphere(
    start: &Vector3<f64>,
    end: &Vector3<f64>,
    sphere: &Sphere,
) -> Option<SeparatingPlane> {
    let closest = closest_point_on_segment(&sphere.center, start, end);
    if closest.distance_squared >= sphere.radius * sphere.radius {
        return None;
    }
    let normal = safe_normal(&(closest.point - sphere.center));
    let separated = sphere.center + normal * sphere.radius;
    Some(SeparatingPlane {
        normal,
        offset: separated.dot(&normal),
    })
}

/// Edge `start..end` against a capsule. Both endpoints share the plane.
#[must_use]
pub fn edge_capsule(
    start: &Vector3<f64>,
    end: &Vector3<f64>,
    capsule: &Capsule,
) -> Option<SeparatingPlane> {
    let pair = closest_points_between_segments(start, end, &capsule.start, &capsule.end);
    if pair.distance_squared >= capsule.radius * capsule.radius {
        return None;
    }
    let normal = safe_normal(&(pair.first - pair.second));
    let separated = pair.second + normal * capsule.radius;
    Some(SeparatingPlane {
        normal,
        offset: separated.dot(&normal),
    })
}

/// Sphere against the plane through `origin` facing `normal`.
///
/// The separating plane keeps the sphere's center exactly one radius above
/// the collider plane.
#[must_use]
pub fn plane_sphere(
    origin: &Vector3<f64>,
    normal: &Vector3<f64>,
    sphere: &Sphere,
) -> Option<SeparatingPlane> {
    let plane_offset = normal.dot(origin) + sphere.radius;
    if plane_offset - normal.dot(&sphere.center) <= 0.0 {
        return None;
    }
    Some(SeparatingPlane {
        normal: *normal,
        offset: plane_offset,
    })
}
