//! Chain gathering.
//!
//! A chain is every bone reachable from its root, visited depth-first with
//! children in skeleton order. Excluded bones cut their whole subtree.
//! Per-bone tunables are sampled along the gathered list at
//! `t = i / (n - 1)`.

use nalgebra::Vector3;
use smallvec::SmallVec;
use sway_types::{
    Axis, BoneIndex, ChainError, ChainSetting, DampedLimit, MIN_MASS, PhysicsSettings, Result,
    ScaledParameter, Skeleton,
};

/// Tunables of a single particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneParams {
    /// Collision sphere radius.
    pub sphere_radius: f64,
    /// Friction applied while in contact.
    pub friction: f64,
    /// Inverse mass.
    pub inv_mass: f64,
    /// Damping of whole-body translation.
    pub world_velocity_damping: f64,
    /// Damping of whole-body rotation.
    pub world_angular_velocity_damping: f64,
    /// Damping of simulation-root translation.
    pub simulation_velocity_damping: f64,
    /// Damping of simulation-root rotation.
    pub simulation_angular_velocity_damping: f64,
    /// Damping of the integrated velocity.
    pub master_damping: f64,
    /// Allowed distance from the animated position.
    pub movable_radius: f64,
    /// Damping of the movable-radius correction.
    pub movable_radius_damping: f64,
    /// Allowed angle (degrees) from the animated edge direction.
    pub limit_angle: f64,
    /// Damping of the limit-angle correction.
    pub limit_angle_damping: f64,
    /// Allowed angle (degrees) from the parent edge.
    pub relative_limit_angle: f64,
    /// Damping of the relative-limit-angle correction.
    pub relative_limit_angle_damping: f64,
}

impl BoneParams {
    /// Parameters of a padding particle: inert apart from unit inverse mass.
    #[must_use]
    pub const fn dummy() -> Self {
        Self {
            sphere_radius: 0.0,
            friction: 0.0,
            inv_mass: 1.0,
            world_velocity_damping: 0.0,
            world_angular_velocity_damping: 0.0,
            simulation_velocity_damping: 0.0,
            simulation_angular_velocity_damping: 0.0,
            master_damping: 0.0,
            movable_radius: 0.0,
            movable_radius_damping: 0.0,
            limit_angle: 0.0,
            limit_angle_damping: 0.0,
            relative_limit_angle: 0.0,
            relative_limit_angle_damping: 0.0,
        }
    }

    /// Sample every tunable at normalized chain position `t`.
    #[must_use]
    pub fn sample(settings: &PhysicsSettings, chain: &ChainSetting, t: f64) -> Self {
        let o = &chain.overrides;
        let d = &settings.damping;
        let pick = |over: &Option<ScaledParameter>, base: &ScaledParameter| {
            over.as_ref().unwrap_or(base).sample(t)
        };
        let limit = |over: &Option<DampedLimit>, base: &DampedLimit| {
            let l = over.as_ref().unwrap_or(base);
            (l.limit.sample(t), l.damping.sample(t))
        };

        let mass = pick(&o.mass, &settings.mass);
        let (movable_radius, movable_radius_damping) =
            limit(&o.movable_radius, &settings.anim_pose.movable_radius);
        let (limit_angle, limit_angle_damping) =
            limit(&o.limit_angle, &settings.anim_pose.limit_angle);
        let (relative_limit_angle, relative_limit_angle_damping) =
            limit(&o.relative_limit_angle, &settings.relative_limit_angle.limit);

        Self {
            sphere_radius: pick(&o.sphere_radius, &settings.collision.sphere_radius),
            friction: pick(&o.friction, &settings.friction),
            inv_mass: 1.0 / mass.max(MIN_MASS),
            world_velocity_damping: pick(&o.world_velocity_damping, &d.world_velocity),
            world_angular_velocity_damping: pick(
                &o.world_angular_velocity_damping,
                &d.world_angular_velocity,
            ),
            simulation_velocity_damping: pick(
                &o.simulation_velocity_damping,
                &d.simulation_velocity,
            ),
            simulation_angular_velocity_damping: pick(
                &o.simulation_angular_velocity_damping,
                &d.simulation_angular_velocity,
            ),
            master_damping: pick(&o.master_damping, &d.master),
            movable_radius,
            movable_radius_damping,
            limit_angle,
            limit_angle_damping,
            relative_limit_angle,
            relative_limit_angle_damping,
        }
    }
}

/// A chain resolved against a skeleton.
#[derive(Debug, Clone)]
pub struct GatheredChain {
    /// Root bone name, for diagnostics.
    pub root: String,
    /// Bones in gathering order.
    pub bones: Vec<BoneIndex>,
    /// Bind-pose positions in component space.
    pub positions: Vec<Vector3<f64>>,
    /// Per-bone tunables.
    pub params: Vec<BoneParams>,
    /// Pin the first bone to the animation.
    pub pin_root: bool,
    /// Planar constraint axis.
    pub planar_axis: Option<Axis>,
}

impl GatheredChain {
    /// Number of bones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether no bones were gathered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// Resolve `chain` against `skeleton` and sample its tunables.
///
/// # Errors
///
/// [`ChainError::UnresolvedBone`] when the root or an excluded bone is not
/// in the skeleton, [`ChainError::ChainTooShort`] when fewer than two bones
/// are gathered.
pub fn gather_chain<S: Skeleton + ?Sized>(
    skeleton: &S,
    chain: &ChainSetting,
    settings: &PhysicsSettings,
) -> Result<GatheredChain> {
    let root = skeleton
        .find_bone(&chain.root_bone)
        .ok_or_else(|| ChainError::unresolved_bone(&chain.root_bone, "chain root"))?;

    let excluded = chain
        .exclude_bones
        .iter()
        .map(|name| {
            skeleton
                .find_bone(name)
                .ok_or_else(|| ChainError::unresolved_bone(name, "excluded bone"))
        })
        .collect::<Result<SmallVec<[BoneIndex; 8]>>>()?;

    let mut bones = Vec::new();
    let mut stack: SmallVec<[BoneIndex; 16]> = SmallVec::new();
    if !excluded.contains(&root) {
        stack.push(root);
    }
    while let Some(bone) = stack.pop() {
        bones.push(bone);
        // Reverse so the first child is visited first.
        for child in skeleton.children(bone).into_iter().rev() {
            if !excluded.contains(&child) {
                stack.push(child);
            }
        }
    }

    if bones.len() < 2 {
        return Err(ChainError::chain_too_short(&chain.root_bone, bones.len()));
    }

    let positions = bones
        .iter()
        .map(|&bone| {
            skeleton
                .reference_transform(bone)
                .map(|t| t.translation)
                .ok_or_else(|| {
                    ChainError::unresolved_bone(
                        skeleton.bone_name(bone).unwrap_or(&chain.root_bone),
                        "reference pose",
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;

    #[allow(clippy::cast_precision_loss)]
    let last = (bones.len() - 1) as f64;
    #[allow(clippy::cast_precision_loss)]
    let params = (0..bones.len())
        .map(|i| BoneParams::sample(settings, chain, i as f64 / last))
        .collect();

    Ok(GatheredChain {
        root: chain.root_bone.clone(),
        bones,
        positions,
        params,
        pin_root: chain.pin_root,
        planar_axis: chain.planar_axis,
    })
}
