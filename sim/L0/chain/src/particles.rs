//! Particle storage.
//!
//! All per-particle state is kept structure-of-arrays over the padded grid
//! so the lane passes can load four neighbours of a row at once.

use nalgebra::{UnitQuaternion, Vector3};
use sway_types::{Axis, BoneIndex};

use crate::chain::{BoneParams, GatheredChain};
use crate::grid::GridShape;

/// Sideways step between padding chains.
const DUMMY_CHAIN_SPACING: f64 = 5.0;

/// Read-only per-particle weights consumed by constraint solves.
#[derive(Debug, Clone, Copy)]
pub struct ParticleWeights<'a> {
    /// Inverse masses.
    pub inv_mass: &'a [f64],
    /// Pin blend toward the animation, 1 for pinned particles.
    pub fixed_blend: &'a [f64],
    /// 1 for padding particles, 0 for real ones.
    pub dummy_mask: &'a [f64],
}

/// Particle buffers of a solver.
#[derive(Debug, Clone)]
pub struct Particles {
    /// Grid extents.
    pub shape: GridShape,
    /// Bone of each particle, `None` for padding.
    pub bones: Vec<Option<BoneIndex>>,
    /// Whether the bone was present in this frame's pose.
    pub evaluable: Vec<bool>,
    /// Current positions.
    pub positions: Vec<Vector3<f64>>,
    /// Positions at the start of the frame.
    pub prev_positions: Vec<Vector3<f64>>,
    /// Animated positions of this frame.
    pub anim_positions: Vec<Vector3<f64>>,
    /// Animated rotations of this frame.
    pub anim_rotations: Vec<UnitQuaternion<f64>>,
    /// Bind-pose positions.
    pub reference_positions: Vec<Vector3<f64>>,
    /// 1 for padding particles.
    pub dummy_mask: Vec<f64>,
    /// Pin blend toward the animation.
    pub fixed_blend: Vec<f64>,
    /// Inverse masses.
    pub inv_mass: Vec<f64>,
    /// Collision radius.
    pub sphere_radius: Vec<f64>,
    /// Configured friction.
    pub base_friction: Vec<f64>,
    /// Friction in effect, refreshed from contacts every frame.
    pub friction: Vec<f64>,
    /// Damping of whole-body translation.
    pub world_velocity_damping: Vec<f64>,
    /// Damping of whole-body rotation.
    pub world_angular_velocity_damping: Vec<f64>,
    /// Damping of simulation-root translation.
    pub simulation_velocity_damping: Vec<f64>,
    /// Damping of simulation-root rotation.
    pub simulation_angular_velocity_damping: Vec<f64>,
    /// Damping of the integrated velocity.
    pub master_damping: Vec<f64>,
    /// Movable-radius limit.
    pub movable_radius: Vec<f64>,
    /// Movable-radius damping.
    pub movable_radius_damping: Vec<f64>,
    /// Limit angle in degrees.
    pub limit_angle: Vec<f64>,
    /// Limit-angle damping.
    pub limit_angle_damping: Vec<f64>,
    /// Relative limit angle in degrees.
    pub relative_limit_angle: Vec<f64>,
    /// Relative-limit-angle damping.
    pub relative_limit_angle_damping: Vec<f64>,
    /// Planar constraint axis per rank.
    pub planar_axes: Vec<Option<Axis>>,
}

impl Particles {
    /// Lay `chains` out on a padded grid.
    ///
    /// Short chains are extended along their last segment; missing ranks are
    /// filled with copies of the last chain shifted along +Y.
    #[must_use]
    pub fn from_chains(chains: &[GatheredChain]) -> Self {
        let depths = chains.iter().map(GatheredChain::len).max().unwrap_or(0);
        let shape = GridShape::new(chains.len(), depths);
        let len = shape.len();

        let mut bones = vec![None; len];
        let mut positions = vec![Vector3::zeros(); len];
        let mut params = vec![BoneParams::dummy(); len];
        let mut dummy_mask = vec![1.0; len];
        let mut fixed_blend = vec![0.0; len];
        let mut planar_axes = vec![None; shape.padded_ranks];

        for (rank, chain) in chains.iter().enumerate() {
            planar_axes[rank] = chain.planar_axis;
            for depth in 0..shape.padded_depths {
                let index = shape.index(rank, depth);
                if depth < chain.len() {
                    bones[index] = Some(chain.bones[depth]);
                    positions[index] = chain.positions[depth];
                    params[index] = chain.params[depth];
                    dummy_mask[index] = 0.0;
                    if depth == 0 && chain.pin_root {
                        fixed_blend[index] = 1.0;
                    }
                } else {
                    positions[index] = extend_chain(&chain.positions, depth);
                }
            }
        }

        if let Some(last_rank) = chains.len().checked_sub(1) {
            for rank in chains.len()..shape.padded_ranks {
                #[allow(clippy::cast_precision_loss)]
                let shift = Vector3::y() * DUMMY_CHAIN_SPACING * (rank - last_rank) as f64;
                for depth in 0..shape.padded_depths {
                    positions[shape.index(rank, depth)] =
                        positions[shape.index(last_rank, depth)] + shift;
                }
            }
        }

        let column = |f: fn(&BoneParams) -> f64| params.iter().map(f).collect::<Vec<_>>();
        let base_friction = column(|p| p.friction);

        Self {
            shape,
            bones,
            evaluable: vec![false; len],
            prev_positions: positions.clone(),
            anim_positions: positions.clone(),
            anim_rotations: vec![UnitQuaternion::identity(); len],
            reference_positions: positions.clone(),
            positions,
            dummy_mask,
            fixed_blend,
            inv_mass: column(|p| p.inv_mass),
            sphere_radius: column(|p| p.sphere_radius),
            friction: base_friction.clone(),
            base_friction,
            world_velocity_damping: column(|p| p.world_velocity_damping),
            world_angular_velocity_damping: column(|p| p.world_angular_velocity_damping),
            simulation_velocity_damping: column(|p| p.simulation_velocity_damping),
            simulation_angular_velocity_damping: column(|p| p.simulation_angular_velocity_damping),
            master_damping: column(|p| p.master_damping),
            movable_radius: column(|p| p.movable_radius),
            movable_radius_damping: column(|p| p.movable_radius_damping),
            limit_angle: column(|p| p.limit_angle),
            limit_angle_damping: column(|p| p.limit_angle_damping),
            relative_limit_angle: column(|p| p.relative_limit_angle),
            relative_limit_angle_damping: column(|p| p.relative_limit_angle_damping),
            planar_axes,
        }
    }

    /// Number of particles, padding included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether `index` is a padding particle.
    #[must_use]
    #[inline]
    pub fn is_dummy(&self, index: usize) -> bool {
        self.dummy_mask[index] > 0.0
    }

    /// Whether `index` is a real bone present in this frame's pose.
    #[must_use]
    #[inline]
    pub fn is_live(&self, index: usize) -> bool {
        !self.is_dummy(index) && self.evaluable[index]
    }

    /// Mutable positions alongside the weights that gate their corrections.
    pub fn split_for_solve(&mut self) -> (&mut [Vector3<f64>], ParticleWeights<'_>) {
        (
            &mut self.positions,
            ParticleWeights {
                inv_mass: &self.inv_mass,
                fixed_blend: &self.fixed_blend,
                dummy_mask: &self.dummy_mask,
            },
        )
    }
}

/// Position of padding particle `depth` past the end of `chain`.
fn extend_chain(chain: &[Vector3<f64>], depth: usize) -> Vector3<f64> {
    let n = chain.len();
    let last = chain[n - 1];
    let step = if n >= 2 { last - chain[n - 2] } else { Vector3::zeros() };
    #[allow(clippy::cast_precision_loss)]
    let k = (depth + 1 - n) as f64;
    last + step * k
}
