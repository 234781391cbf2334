//! Per-frame physics context, external forces and Verlet integration.
//!
//! [`PhysicsContext`] carries what changes from frame to frame outside the
//! particles: timestep, the component's world transform, the simulation root
//! transform and gravity. [`apply_forces`] and [`verlet_integrate`] walk the
//! particle buffers one lane group at a time.
//!
//! # Timestep
//!
//! A non-positive timestep falls back to `1 / fixed_rate`. When the timestep
//! jumps up by 20% or more (a hitch), the previous one is reused so the
//! Verlet velocity does not explode. Every velocity term is scaled by
//! `dt / prev_dt` to stay consistent under variable frame time.

use nalgebra::{UnitQuaternion, Vector3};
use sway_simd::{LANE_WIDTH, Lanes, Vec3x4};
use sway_types::{BoneTransform, DampingSettings};
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::particles::Particles;

/// Largest accepted growth of the timestep between two frames.
pub const MAX_DELTA_TIME_RATIO: f64 = 1.2;

/// Host input for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameInput {
    /// Seconds since the last evaluation.
    pub delta_time: f64,
    /// World transform of the skinned component.
    pub component_transform: BoneTransform,
    /// Blend of the simulation over the animation, clamped to [0, 1].
    pub alpha: f64,
}

impl FrameInput {
    /// Fully simulated frame.
    #[must_use]
    pub fn new(delta_time: f64, component_transform: BoneTransform) -> Self {
        Self {
            delta_time,
            component_transform,
            alpha: 1.0,
        }
    }

    /// Set the blend over the animation.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Frame-to-frame state shared by every particle.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsContext {
    /// Timestep of this frame.
    pub delta_time: f64,
    /// Timestep of the previous frame.
    pub prev_delta_time: f64,
    /// Component world transform this frame.
    pub component_transform: BoneTransform,
    /// Component world transform last frame.
    pub prev_component_transform: BoneTransform,
    /// Simulation root in component space this frame.
    pub simulation_root: Option<BoneTransform>,
    /// Simulation root in component space last frame.
    pub prev_simulation_root: Option<BoneTransform>,
    /// Gravity acceleration in component space.
    pub gravity: Vector3<f64>,
    /// Blend of the simulation over the animation.
    pub alpha: f64,
    /// Set until the first frame has been output.
    pub first_update: bool,
}

impl Default for PhysicsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsContext {
    /// Context before the first frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delta_time: 1.0 / 60.0,
            prev_delta_time: 1.0 / 60.0,
            component_transform: BoneTransform::identity(),
            prev_component_transform: BoneTransform::identity(),
            simulation_root: None,
            prev_simulation_root: None,
            gravity: Vector3::zeros(),
            alpha: 1.0,
            first_update: true,
        }
    }

    /// Advance the timestep.
    pub fn update_delta_time(&mut self, delta_time: f64, fixed_rate: f64) {
        self.prev_delta_time = self.delta_time;
        self.delta_time = if delta_time > 0.0 {
            delta_time
        } else {
            trace!(delta_time, "non-positive timestep, using fixed rate");
            1.0 / fixed_rate
        };
        if self.first_update {
            self.prev_delta_time = self.delta_time;
        }
        if self.delta_time / self.prev_delta_time >= MAX_DELTA_TIME_RATIO {
            trace!(
                delta_time = self.delta_time,
                prev_delta_time = self.prev_delta_time,
                "timestep hitch clamped"
            );
            self.delta_time = self.prev_delta_time;
        }
    }

    /// `dt / prev_dt`.
    #[must_use]
    pub fn delta_time_ratio(&self) -> f64 {
        self.delta_time / self.prev_delta_time
    }

    /// Advance the component's world transform.
    pub fn update_component_transform(&mut self, transform: BoneTransform) {
        self.prev_component_transform = if self.first_update {
            transform
        } else {
            self.component_transform
        };
        self.component_transform = transform;
    }

    /// Advance the simulation root. `None` (root not evaluated) holds it still.
    pub fn update_simulation_root(&mut self, transform: Option<BoneTransform>) {
        let next = transform.or(self.simulation_root);
        self.prev_simulation_root = if self.first_update {
            next
        } else {
            self.simulation_root.or(next)
        };
        self.simulation_root = next;
    }

    /// Carry positions along with the simulation root's motion.
    pub fn follow_simulation_root(&self, positions: &mut [Vector3<f64>]) {
        let (Some(current), Some(prev)) = (&self.simulation_root, &self.prev_simulation_root)
        else {
            return;
        };
        for p in positions {
            *p = current.transform_position(&prev.inverse_transform_position(p));
        }
    }

    /// Linear and angular motion to inject this frame.
    #[must_use]
    pub fn motion(&self, damping: &DampingSettings) -> FrameMotion {
        let world = guarded_motion(
            &self.component_transform,
            &self.prev_component_transform,
            damping.world_velocity_threshold,
            damping.world_angular_velocity_threshold,
        );
        let simulation = match (&self.simulation_root, &self.prev_simulation_root) {
            (Some(current), Some(prev)) => Some(guarded_motion(
                current,
                prev,
                damping.simulation_velocity_threshold,
                damping.simulation_angular_velocity_threshold,
            )),
            _ => None,
        };
        FrameMotion { world, simulation }
    }
}

/// Translation and rotation of a frame of reference since the last frame,
/// expressed in its current space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Where the previous origin lies in the current frame.
    pub velocity: Vector3<f64>,
    /// Previous orientation relative to the current one.
    pub rotation: UnitQuaternion<f64>,
}

/// Whole-body and simulation-root motion of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMotion {
    /// Component motion.
    pub world: Motion,
    /// Simulation root motion, when one is configured.
    pub simulation: Option<Motion>,
}

/// Motion between two transforms, zeroed past the teleport thresholds.
fn guarded_motion(
    current: &BoneTransform,
    prev: &BoneTransform,
    velocity_threshold: f64,
    angular_threshold_deg: f64,
) -> Motion {
    let mut velocity = current.inverse_transform_position(&prev.translation);
    if velocity.norm_squared() > velocity_threshold * velocity_threshold {
        trace!(speed = velocity.norm(), "teleport guard: velocity ignored");
        velocity = Vector3::zeros();
    }
    let mut rotation = current.inverse_transform_rotation(&prev.rotation);
    if rotation.angle().to_degrees() > angular_threshold_deg {
        trace!(
            degrees = rotation.angle().to_degrees(),
            "teleport guard: rotation ignored"
        );
        rotation = UnitQuaternion::identity();
    }
    Motion { velocity, rotation }
}

/// `rotation * p - p` for each lane.
fn linearized_rotation(rotation: &UnitQuaternion<f64>, prev: &Vec3x4) -> Vec3x4 {
    let mut out = Vec3x4::zeros();
    for (i, p) in prev.to_vectors().iter().enumerate() {
        let v = rotation * p - p;
        out.xs[i] = v.x;
        out.ys[i] = v.y;
        out.zs[i] = v.z;
    }
    out
}

/// Add gravity and the inertia of whole-body and simulation-root motion.
///
/// Pinned and padding particles are untouched. Motion terms are scaled by
/// `1 - friction` using the friction of the previous frame.
pub fn apply_forces(particles: &mut Particles, context: &PhysicsContext, motion: &FrameMotion) {
    let dt = context.delta_time;
    let ratio = context.delta_time_ratio();
    let gravity_step = Vec3x4::splat(context.gravity * (dt * dt * ratio));
    let world_velocity = Vec3x4::splat(motion.world.velocity);
    let simulation_velocity = motion.simulation.map(|m| Vec3x4::splat(m.velocity));

    for start in (0..particles.len()).step_by(LANE_WIDTH) {
        let range = start..start + LANE_WIDTH;
        let lane = |column: &[f64]| Lanes::from_slice(&column[range.clone()]);
        let free = lane(&particles.dummy_mask)
            .one_minus()
            .mul(&lane(&particles.fixed_blend).one_minus());
        let prev = Vec3x4::from_slice(&particles.prev_positions[range.clone()]);

        let mut velocity = world_velocity
            .scale_lanes(&lane(&particles.world_velocity_damping).one_minus())
            .add(
                &linearized_rotation(&motion.world.rotation, &prev)
                    .scale_lanes(&lane(&particles.world_angular_velocity_damping).one_minus()),
            );
        if let (Some(sim), Some(sim_velocity)) = (&motion.simulation, &simulation_velocity) {
            velocity = velocity
                .add(&sim_velocity.scale_lanes(&lane(&particles.simulation_velocity_damping).one_minus()))
                .add(
                    &linearized_rotation(&sim.rotation, &prev).scale_lanes(
                        &lane(&particles.simulation_angular_velocity_damping).one_minus(),
                    ),
                );
        }
        let inertia = free
            .mul(&lane(&particles.friction).one_minus())
            .scale(ratio);

        Vec3x4::from_slice(&particles.positions[range.clone()])
            .add_scaled(&gravity_step, &free)
            .add_scaled(&velocity, &inertia)
            .write_to_slice(&mut particles.positions[range]);
    }
}

/// Verlet step: `next = p + (p - prev) · ratio · (1 - friction) · (1 - master)`.
///
/// Pinned and padding particles keep their position; every particle's
/// previous position becomes its current one.
pub fn verlet_integrate(particles: &mut Particles, context: &PhysicsContext) {
    let ratio = context.delta_time_ratio();
    for start in (0..particles.len()).step_by(LANE_WIDTH) {
        let range = start..start + LANE_WIDTH;
        let lane = |column: &[f64]| Lanes::from_slice(&column[range.clone()]);
        let position = Vec3x4::from_slice(&particles.positions[range.clone()]);
        let velocity = position
            .sub(&Vec3x4::from_slice(&particles.prev_positions[range.clone()]))
            .scale(ratio);
        let factor = lane(&particles.friction)
            .one_minus()
            .mul(&lane(&particles.master_damping).one_minus())
            .mul(&lane(&particles.fixed_blend).one_minus())
            .mul(&lane(&particles.dummy_mask).one_minus());

        position
            .add_scaled(&velocity, &factor)
            .write_to_slice(&mut particles.positions[range.clone()]);
        position.write_to_slice(&mut particles.prev_positions[range]);
    }
}
