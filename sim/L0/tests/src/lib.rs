//! Fixtures shared by the sway integration tests.
//!
//! [`Rig`] bundles a skeleton, a solver and its colliders and runs the
//! per-frame calls in the order a host would.

#![allow(clippy::missing_panics_doc, clippy::cast_precision_loss)]

use nalgebra::Vector3;
use sway_chain::{BodyCollider, ChainSolver, FrameInput, PlaneCollider};
use sway_types::{
    BodyColliderSettings, BoneIndex, BoneTransform, ChainSetting, PhysicsSettings,
    PlaneColliderSettings, PoseData, Result, SkeletonData,
};

/// Frame time used by the tests.
pub const DT: f64 = 1.0 / 60.0;

/// Distance between neighbouring bones of the test chains.
pub const SPACING: f64 = 10.0;

/// Append `count` bones named `{prefix}_{i}` below `origin`, `SPACING` apart
/// along -Z, the first one parented to `parent`.
pub fn add_hanging_chain(
    skeleton: &mut SkeletonData,
    prefix: &str,
    parent: Option<BoneIndex>,
    origin: Vector3<f64>,
    count: usize,
) -> Vec<BoneIndex> {
    let mut bones = Vec::with_capacity(count);
    let mut parent = parent;
    for i in 0..count {
        let position = origin - Vector3::z() * (SPACING * i as f64);
        let bone = skeleton.add_bone(
            format!("{prefix}_{i}"),
            parent,
            BoneTransform::from_translation(position),
        );
        bones.push(bone);
        parent = Some(bone);
    }
    bones
}

/// A single chain `joint_0..joint_{count-1}` hanging from the origin.
#[must_use]
pub fn hanging_chain(count: usize) -> SkeletonData {
    let mut skeleton = SkeletonData::new();
    add_hanging_chain(&mut skeleton, "joint", None, Vector3::zeros(), count);
    skeleton
}

/// A solver wired to its skeleton, pose and colliders.
#[derive(Debug, Clone)]
pub struct Rig {
    /// Bone hierarchy.
    pub skeleton: SkeletonData,
    /// The solver under test.
    pub solver: ChainSolver,
    /// Animated pose fed every frame (bind pose unless changed).
    pub pose: PoseData,
    /// Body collider, updated every frame.
    pub body: BodyCollider,
    /// Plane colliders, updated every frame.
    pub planes: Vec<PlaneCollider>,
    /// Component world transform fed every frame.
    pub component: BoneTransform,
    /// Activation alpha fed every frame.
    pub alpha: f64,
}

impl Rig {
    /// Initialize a solver for `chains`.
    pub fn new(
        skeleton: SkeletonData,
        chains: &[ChainSetting],
        settings: &PhysicsSettings,
    ) -> Result<Self> {
        let mut solver = ChainSolver::new();
        solver.initialize(&skeleton, chains, settings)?;
        Ok(Self {
            pose: skeleton.reference_pose(),
            body: BodyCollider::default(),
            planes: Vec::new(),
            skeleton,
            solver,
            component: BoneTransform::identity(),
            alpha: 1.0,
        })
    }

    /// Replace the body collider.
    #[must_use]
    pub fn with_body(mut self, settings: BodyColliderSettings) -> Self {
        self.body = BodyCollider::new(&self.skeleton, settings);
        self
    }

    /// Add a plane collider.
    #[must_use]
    pub fn with_plane(mut self, settings: PlaneColliderSettings) -> Self {
        self.planes.push(PlaneCollider::new(&self.skeleton, settings));
        self
    }

    /// Run one frame of `dt` seconds and return the solver output.
    pub fn step(&mut self, dt: f64) -> Vec<(BoneIndex, BoneTransform)> {
        self.body.update(&self.pose);
        for plane in &mut self.planes {
            plane.update(&self.pose);
        }
        let input = FrameInput::new(dt, self.component).with_alpha(self.alpha);
        self.solver.pre_simulate(&input, &self.pose);
        self.solver.simulate(&self.body, &self.planes);
        self.solver.output_result(&self.pose)
    }

    /// Run `frames` frames of [`DT`].
    pub fn run(&mut self, frames: usize) {
        for _ in 0..frames {
            self.step(DT);
        }
    }

    /// Simulated position of `bone`.
    #[must_use]
    pub fn position(&self, bone: BoneIndex) -> Option<Vector3<f64>> {
        self.solver
            .bone_positions()
            .ok()?
            .into_iter()
            .find_map(|(b, p)| (b == bone).then_some(p))
    }

    /// Simulated position of the bone called `name`.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<Vector3<f64>> {
        use sway_types::Skeleton;
        self.position(self.skeleton.find_bone(name)?)
    }
}
