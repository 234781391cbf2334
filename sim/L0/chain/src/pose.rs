//! Constraints toward the animated pose.
//!
//! These run once per frame, before the solver iterations, and pull the
//! simulation back toward what the animation asked for. Angle limits are in
//! degrees; a correction is only applied when it exceeds
//! [`POSE_CORRECTION_EPSILON`].

use nalgebra::{Unit, UnitQuaternion, Vector3};
use sway_simd::{LANE_WIDTH, Lanes, Vec3x4};
use sway_types::safe_normal;

use crate::constraints::DistanceConstraint;
use crate::particles::Particles;

/// Smallest correction (world units or degrees) worth applying.
pub const POSE_CORRECTION_EPSILON: f64 = 0.1;

/// Blend current and previous positions toward the animation by each
/// particle's fixed blend.
pub fn apply_fixed_blend(particles: &mut Particles) {
    for start in (0..particles.len()).step_by(LANE_WIDTH) {
        let range = start..start + LANE_WIDTH;
        let blend = Lanes::from_slice(&particles.fixed_blend[range.clone()]);
        let anim = Vec3x4::from_slice(&particles.anim_positions[range.clone()]);

        Vec3x4::from_slice(&particles.positions[range.clone()])
            .lerp_lanes(&anim, &blend)
            .write_to_slice(&mut particles.positions[range.clone()]);
        Vec3x4::from_slice(&particles.prev_positions[range.clone()])
            .lerp_lanes(&anim, &blend)
            .write_to_slice(&mut particles.prev_positions[range]);
    }
}

/// Keep every particle within its movable radius of the animated position.
pub fn movable_radius(particles: &mut Particles) {
    for i in 0..particles.len() {
        let to_anim = particles.anim_positions[i] - particles.positions[i];
        let excess = (to_anim.norm() - particles.movable_radius[i])
            * (1.0 - particles.movable_radius_damping[i]);
        if excess > POSE_CORRECTION_EPSILON {
            particles.positions[i] += safe_normal(&to_anim) * excess;
        }
    }
}

/// Rotate `direction` back toward `reference` by the angle it exceeds
/// `limit` (damped). Returns `None` when no correction is due.
fn limit_direction(
    reference: &Vector3<f64>,
    direction: &Vector3<f64>,
    limit: f64,
    damping: f64,
) -> Option<Vector3<f64>> {
    let axis = reference.cross(direction);
    let axis_normal = safe_normal(&axis);
    if axis_normal == Vector3::zeros() {
        return None;
    }

    let angle = axis.norm().atan2(reference.dot(direction)).to_degrees();
    let over = (angle - limit) * (1.0 - damping);
    if over <= POSE_CORRECTION_EPSILON {
        return None;
    }

    let back = UnitQuaternion::from_axis_angle(
        &Unit::new_unchecked(axis_normal),
        -over.to_radians(),
    );
    Some(back * direction)
}

/// Bound the angle between each link and its animated direction.
pub fn limit_angle(particles: &mut Particles, structures: &[DistanceConstraint]) {
    for link in structures {
        let (a, b) = (link.first, link.second);
        let anim_dir = particles.anim_positions[b] - particles.anim_positions[a];
        let current = particles.positions[b] - particles.positions[a];
        let length = current.norm();

        if let Some(dir) = limit_direction(
            &anim_dir,
            &safe_normal(&current),
            particles.limit_angle[a],
            particles.limit_angle_damping[a],
        ) {
            particles.positions[b] = particles.positions[a] + dir * length;
        }
    }
}

/// Bound the angle between each link and the link above it.
///
/// Links of the first row are measured against their animated direction.
/// Rows are processed top-down so corrections reach the tip in one pass;
/// `structures` must be ordered depth-major with `padded_ranks` links per row.
pub fn relative_limit_angle(
    particles: &mut Particles,
    structures: &[DistanceConstraint],
    padded_ranks: usize,
) {
    for (i, link) in structures.iter().enumerate() {
        let (a, b) = (link.first, link.second);
        let reference = if i < padded_ranks {
            particles.anim_positions[b] - particles.anim_positions[a]
        } else {
            let parent = &structures[i - padded_ranks];
            particles.positions[parent.second] - particles.positions[parent.first]
        };
        let current = particles.positions[b] - particles.positions[a];
        let length = current.norm();

        if let Some(dir) = limit_direction(
            &reference,
            &safe_normal(&current),
            particles.relative_limit_angle[a],
            particles.relative_limit_angle_damping[a],
        ) {
            particles.positions[b] = particles.positions[a] + safe_normal(&dir) * length;
        }
    }
}

/// Project the second particle of each link onto the plane through its
/// animated position, normal to the chain's planar axis in bone space.
pub fn planar(particles: &mut Particles, structures: &[DistanceConstraint]) {
    let shape = particles.shape;
    for link in structures {
        let b = link.second;
        let (rank, _) = shape.coords(b);
        let Some(axis) = particles.planar_axes[rank] else {
            continue;
        };

        let rotation = if particles.is_live(b) {
            particles.anim_rotations[b]
        } else {
            UnitQuaternion::identity()
        };
        let normal = rotation * axis.unit();
        let origin = particles.anim_positions[b];
        let distance = (particles.positions[b] - origin).dot(&normal);
        particles.positions[b] -= normal * distance;
    }
}
