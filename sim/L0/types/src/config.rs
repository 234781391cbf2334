//! Solver configuration.
//!
//! [`PhysicsSettings`] holds the global tunables shared by every chain of a
//! solver; [`ChainSetting`] describes one chain and may override any
//! per-bone tunable. Every per-bone tunable is a [`ScaledParameter`]: a base
//! value times a curve over normalized chain length.

use crate::{Axis, ChainError, ProfileCurve, ScaledParameter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A limit (radius or angle) with its own per-bone damping.
///
/// Damping `0.0` snaps straight back to the limit; values toward `1.0`
/// return more slowly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DampedLimit {
    /// Limit value (length units or degrees).
    pub limit: ScaledParameter,
    /// Return damping in `[0, 1]`.
    pub damping: ScaledParameter,
}

impl Default for DampedLimit {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl DampedLimit {
    /// Constant limit and damping.
    #[must_use]
    pub const fn new(limit: f64, damping: f64) -> Self {
        Self {
            limit: ScaledParameter::constant(limit),
            damping: ScaledParameter::constant(damping),
        }
    }

    fn validate(&self, name: &str) -> crate::Result<()> {
        if self.limit.value < 0.0 {
            return Err(ChainError::invalid_config(format!("{name} limit must be >= 0")));
        }
        check_unit(&format!("{name} damping"), self.damping.value)
    }
}

/// Stretch-resisting constraint families and their stiffnesses.
///
/// Stiffness is in `[0, 1]` and maps onto XPBD compliance at initialization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StructureSettings {
    /// Stiffness of vertical and horizontal structural links.
    pub stiffness: f64,
    /// Clamp vertical links to their rest length instead of solving them
    /// compliantly. Disables vertical bend.
    pub rigid_vertical: bool,
    /// Link neighbouring chains at equal depth.
    pub horizontal: bool,
    /// Close the horizontal links into a ring (skirts, sleeves).
    pub loop_horizontal: bool,
    /// Link bones two steps apart along a chain.
    pub vertical_bend: bool,
    /// Vertical bend stiffness.
    pub vertical_bend_stiffness: f64,
    /// Link chains two steps apart at equal depth.
    pub horizontal_bend: bool,
    /// Horizontal bend stiffness.
    pub horizontal_bend_stiffness: f64,
    /// Diagonal links between neighbouring chains.
    pub shear: bool,
    /// Shear stiffness.
    pub shear_stiffness: f64,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            stiffness: 0.004,
            rigid_vertical: false,
            horizontal: false,
            loop_horizontal: false,
            vertical_bend: false,
            vertical_bend_stiffness: 0.004,
            horizontal_bend: false,
            horizontal_bend_stiffness: 0.004,
            shear: false,
            shear_stiffness: 0.004,
        }
    }
}

/// Constraints that pull the simulation back toward the animated pose.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimPoseSettings {
    /// Master switch for the three constraints below.
    pub enabled: bool,
    /// Keep each bone within a radius of its animated position.
    pub use_movable_radius: bool,
    /// Movable radius and its damping.
    pub movable_radius: DampedLimit,
    /// Bound the angle between simulated and animated bone directions.
    pub use_limit_angle: bool,
    /// Limit angle (degrees) and its damping.
    pub limit_angle: DampedLimit,
    /// Project bones onto a plane through the animated pose (see
    /// [`ChainSetting::planar_axis`]).
    pub use_planar: bool,
}

/// Bound the angle between a bone and its parent's simulated direction.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelativeLimitAngleSettings {
    /// Whether the constraint runs.
    pub enabled: bool,
    /// Angle (degrees) and damping.
    pub limit: DampedLimit,
}

/// Collision response tunables.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionSettings {
    /// Radius of the sphere around every simulated bone.
    pub sphere_radius: ScaledParameter,
    /// Fraction of the penetration resolved per iteration, `[0, 1]`.
    pub collision_blend: f64,
    /// Penetration depth tolerated before pushing out.
    pub penetration_depth: f64,
    /// Collide structural links along each chain, not only bone spheres.
    pub edge_collider: bool,
    /// Collide horizontal links too. Needs horizontal structure and
    /// `edge_collider`.
    pub horizontal_edge_collider: bool,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            sphere_radius: ScaledParameter::constant(2.0),
            collision_blend: 0.8,
            penetration_depth: 0.5,
            edge_collider: false,
            horizontal_edge_collider: false,
        }
    }
}

/// Velocity transfer from actor and simulation-root motion.
///
/// Damping `1.0` ignores the motion completely; `0.0` transfers all of it.
/// Motion above a threshold within one frame is treated as a teleport and
/// ignored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DampingSettings {
    /// Damping of actor translation.
    pub world_velocity: ScaledParameter,
    /// Per-frame actor translation above which it is ignored.
    pub world_velocity_threshold: f64,
    /// Damping of actor rotation.
    pub world_angular_velocity: ScaledParameter,
    /// Per-frame actor rotation (degrees) above which it is ignored.
    pub world_angular_velocity_threshold: f64,
    /// Damping of simulation-root translation.
    pub simulation_velocity: ScaledParameter,
    /// Per-frame simulation-root translation above which it is ignored.
    pub simulation_velocity_threshold: f64,
    /// Damping of simulation-root rotation.
    pub simulation_angular_velocity: ScaledParameter,
    /// Per-frame simulation-root rotation (degrees) above which it is ignored.
    pub simulation_angular_velocity_threshold: f64,
    /// Overall velocity damping applied during integration.
    pub master: ScaledParameter,
}

impl Default for DampingSettings {
    fn default() -> Self {
        Self {
            world_velocity: ScaledParameter::constant(0.6),
            world_velocity_threshold: 100.0,
            world_angular_velocity: ScaledParameter::constant(0.65),
            world_angular_velocity_threshold: 20.0,
            simulation_velocity: ScaledParameter::constant(1.0),
            simulation_velocity_threshold: 100.0,
            simulation_angular_velocity: ScaledParameter::constant(1.0),
            simulation_angular_velocity_threshold: 20.0,
            master: ScaledParameter::constant(0.0),
        }
    }
}

/// Gravity driven by a bone's local axis.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneSpaceGravity {
    /// Driving bone name.
    pub bone: String,
    /// Local axis of the driving bone gravity points along.
    pub axis: Axis,
}

/// Gravity settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GravitySettings {
    /// Acceleration in meters per second squared.
    pub gravity: f64,
    /// World units per meter (100 for centimeter worlds).
    pub units_per_meter: f64,
    /// Drive gravity from a bone axis instead of world down.
    pub bone_space: Option<BoneSpaceGravity>,
}

impl Default for GravitySettings {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            units_per_meter: 100.0,
            bone_space: None,
        }
    }
}

impl GravitySettings {
    /// Gravity acceleration in world units.
    #[must_use]
    pub fn acceleration(&self) -> f64 {
        self.gravity * self.units_per_meter
    }
}

/// Global settings shared by all chains of one solver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhysicsSettings {
    /// Structural, bend and shear constraints.
    pub structure: StructureSettings,
    /// Animation-pose constraints.
    pub anim_pose: AnimPoseSettings,
    /// Relative limit angle constraint.
    pub relative_limit_angle: RelativeLimitAngleSettings,
    /// Collision response.
    pub collision: CollisionSettings,
    /// Friction applied to bones in contact, `[0, 1]`.
    pub friction: ScaledParameter,
    /// Bone mass; heavier bones yield less to constraints.
    pub mass: ScaledParameter,
    /// Velocity transfer and damping.
    pub damping: DampingSettings,
    /// Bone whose motion is removed from the simulation frame and re-added
    /// as a damped velocity.
    pub simulation_root_bone: Option<String>,
    /// Gravity.
    pub gravity: GravitySettings,
    /// Constraint iterations per frame.
    pub solver_iterations: usize,
    /// Frame rate assumed when the host reports a non-positive delta time.
    pub fixed_rate: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            structure: StructureSettings::default(),
            anim_pose: AnimPoseSettings::default(),
            relative_limit_angle: RelativeLimitAngleSettings::default(),
            collision: CollisionSettings::default(),
            friction: ScaledParameter::constant(0.15),
            mass: ScaledParameter::constant(1.0),
            damping: DampingSettings::default(),
            simulation_root_bone: None,
            gravity: GravitySettings::default(),
            solver_iterations: 8,
            fixed_rate: 60.0,
        }
    }
}

/// Lowest mass a bone may have.
pub const MIN_MASS: f64 = 0.1;

impl PhysicsSettings {
    /// Long hair: light tips, soft bend, limited swing.
    #[must_use]
    pub fn hair() -> Self {
        let mut settings = Self::default();
        settings.structure.vertical_bend = true;
        settings.structure.vertical_bend_stiffness = 0.002;
        settings.mass = ScaledParameter::with_curve(1.0, ProfileCurve::linear(1.0, 0.5));
        settings.relative_limit_angle = RelativeLimitAngleSettings {
            enabled: true,
            limit: DampedLimit::new(45.0, 0.5),
        };
        settings
    }

    /// Cloth panel: chains linked sideways with shear.
    #[must_use]
    pub fn cloth() -> Self {
        let mut settings = Self::default();
        settings.structure.horizontal = true;
        settings.structure.shear = true;
        settings.collision.edge_collider = true;
        settings.friction = ScaledParameter::constant(0.3);
        settings
    }

    /// Skirt: looped cloth, pulled back toward the animation.
    #[must_use]
    pub fn skirt() -> Self {
        let mut settings = Self::cloth();
        settings.structure.loop_horizontal = true;
        settings.anim_pose.enabled = true;
        settings.anim_pose.use_movable_radius = true;
        settings.anim_pose.movable_radius = DampedLimit::new(10.0, 0.3);
        settings
    }

    /// Tail: heavy, stiff and rigid along the chain.
    #[must_use]
    pub fn tail() -> Self {
        let mut settings = Self::default();
        settings.structure.rigid_vertical = true;
        settings.mass = ScaledParameter::constant(2.0);
        settings.damping.master = ScaledParameter::constant(0.05);
        settings.anim_pose.enabled = true;
        settings.anim_pose.use_limit_angle = true;
        settings.anim_pose.limit_angle = DampedLimit::new(30.0, 0.2);
        settings
    }

    /// Set the number of solver iterations.
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.solver_iterations = iterations;
        self
    }

    /// Set the structural stiffness.
    #[must_use]
    pub fn structure_stiffness(mut self, stiffness: f64) -> Self {
        self.structure.stiffness = stiffness;
        self
    }

    /// Set gravity in meters per second squared.
    #[must_use]
    pub fn gravity(mut self, gravity: f64) -> Self {
        self.gravity.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(self) -> Self {
        self.gravity(0.0)
    }

    /// Set the master damping.
    #[must_use]
    pub fn master_damping(mut self, damping: f64) -> Self {
        self.damping.master = ScaledParameter::constant(damping);
        self
    }

    /// Set the simulation root bone.
    #[must_use]
    pub fn simulation_root(mut self, bone: impl Into<String>) -> Self {
        self.simulation_root_bone = Some(bone.into());
        self
    }

    /// Drive gravity from a bone axis.
    #[must_use]
    pub fn bone_space_gravity(mut self, bone: impl Into<String>, axis: Axis) -> Self {
        self.gravity.bone_space = Some(BoneSpaceGravity {
            bone: bone.into(),
            axis,
        });
        self
    }

    /// Whether vertical bend actually runs (rigid vertical links disable it).
    #[must_use]
    pub fn vertical_bend_active(&self) -> bool {
        self.structure.vertical_bend && !self.structure.rigid_vertical
    }

    /// Validate the settings.
    pub fn validate(&self) -> crate::Result<()> {
        let s = &self.structure;
        check_unit("structure stiffness", s.stiffness)?;
        check_unit("vertical bend stiffness", s.vertical_bend_stiffness)?;
        check_unit("horizontal bend stiffness", s.horizontal_bend_stiffness)?;
        check_unit("shear stiffness", s.shear_stiffness)?;

        self.anim_pose.movable_radius.validate("movable radius")?;
        self.anim_pose.limit_angle.validate("limit angle")?;
        self.relative_limit_angle.limit.validate("relative limit angle")?;

        let c = &self.collision;
        if c.sphere_radius.value < 0.0 {
            return Err(ChainError::invalid_config("sphere radius must be >= 0"));
        }
        check_unit("collision blend", c.collision_blend)?;
        if c.penetration_depth < 0.0 {
            return Err(ChainError::invalid_config("penetration depth must be >= 0"));
        }

        check_unit("friction", self.friction.value)?;
        if self.mass.value < MIN_MASS {
            return Err(ChainError::invalid_config(format!("mass must be >= {MIN_MASS}")));
        }

        let d = &self.damping;
        check_unit("world velocity damping", d.world_velocity.value)?;
        check_unit("world angular velocity damping", d.world_angular_velocity.value)?;
        check_unit("simulation velocity damping", d.simulation_velocity.value)?;
        check_unit("simulation angular velocity damping", d.simulation_angular_velocity.value)?;
        check_unit("master damping", d.master.value)?;
        for (name, threshold) in [
            ("world velocity threshold", d.world_velocity_threshold),
            ("world angular velocity threshold", d.world_angular_velocity_threshold),
            ("simulation velocity threshold", d.simulation_velocity_threshold),
            ("simulation angular velocity threshold", d.simulation_angular_velocity_threshold),
        ] {
            if threshold < 0.0 {
                return Err(ChainError::invalid_config(format!("{name} must be >= 0")));
            }
        }

        if !self.gravity.gravity.is_finite() || !self.gravity.units_per_meter.is_finite() {
            return Err(ChainError::invalid_config("gravity must be finite"));
        }
        if self.solver_iterations == 0 {
            return Err(ChainError::invalid_config("solver_iterations must be >= 1"));
        }
        if !self.fixed_rate.is_finite() || self.fixed_rate <= 0.0 {
            return Err(ChainError::invalid_config("fixed_rate must be > 0"));
        }

        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> crate::Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ChainError::invalid_config(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

/// Per-chain overrides of the global per-bone tunables.
///
/// `None` falls back to the value in [`PhysicsSettings`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainOverrides {
    /// Bone sphere collider radius.
    pub sphere_radius: Option<ScaledParameter>,
    /// Friction.
    pub friction: Option<ScaledParameter>,
    /// Mass.
    pub mass: Option<ScaledParameter>,
    /// World velocity damping.
    pub world_velocity_damping: Option<ScaledParameter>,
    /// World angular velocity damping.
    pub world_angular_velocity_damping: Option<ScaledParameter>,
    /// Simulation-root velocity damping.
    pub simulation_velocity_damping: Option<ScaledParameter>,
    /// Simulation-root angular velocity damping.
    pub simulation_angular_velocity_damping: Option<ScaledParameter>,
    /// Master damping.
    pub master_damping: Option<ScaledParameter>,
    /// Movable radius.
    pub movable_radius: Option<DampedLimit>,
    /// Animation-pose limit angle.
    pub limit_angle: Option<DampedLimit>,
    /// Relative limit angle.
    pub relative_limit_angle: Option<DampedLimit>,
}

/// One simulated chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainSetting {
    /// Name of the first bone of the chain.
    pub root_bone: String,
    /// Bones at which gathering stops (the bone and its subtree are left out).
    pub exclude_bones: Vec<String>,
    /// Pin the root bone to its animated position.
    pub pin_root: bool,
    /// Axis of the planar constraint, `None` to skip it for this chain.
    pub planar_axis: Option<Axis>,
    /// Per-chain overrides.
    pub overrides: ChainOverrides,
}

impl ChainSetting {
    /// Chain rooted at `root_bone` with default settings.
    #[must_use]
    pub fn new(root_bone: impl Into<String>) -> Self {
        Self {
            root_bone: root_bone.into(),
            exclude_bones: Vec::new(),
            pin_root: true,
            planar_axis: None,
            overrides: ChainOverrides::default(),
        }
    }

    /// Stop gathering at `bone`.
    #[must_use]
    pub fn exclude(mut self, bone: impl Into<String>) -> Self {
        self.exclude_bones.push(bone.into());
        self
    }

    /// Leave the root bone free.
    #[must_use]
    pub fn unpinned(mut self) -> Self {
        self.pin_root = false;
        self
    }

    /// Enable the planar constraint along `axis`.
    #[must_use]
    pub fn planar(mut self, axis: Axis) -> Self {
        self.planar_axis = Some(axis);
        self
    }

    /// Replace the overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ChainOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}
