//! The chain solver: Initialize → PreSimulate → Simulate → OutputResult.
//!
//! # Frame
//!
//! ```text
//! pre_simulate:
//!   1. Advance timestep, component and simulation-root transforms
//!   2. Carry particles along with the simulation root
//!   3. Sample the animated pose
//! simulate:
//!   1. Gravity and inertia, Verlet step, pin blend
//!   2. Relative limit angle, anim-pose constraints
//!   3. Reset Lagrange multipliers
//!   4. For each iteration:
//!      a. Detect contacts (body, edges, planes)
//!      b. Solve links (structural, horizontal, bends, shear)
//!      c. Resolve contacts
//!      d. First iteration only: refresh friction
//! output_result:
//!   rotate each bone so its animated link direction matches the simulated one
//! ```
//!
//! Every per-frame call is a no-op until [`ChainSolver::initialize`]
//! succeeds. Body and plane colliders belong to the caller, who updates them
//! against the pose before [`ChainSolver::simulate`].

use nalgebra::{UnitQuaternion, Vector3};
use sway_types::{
    Axis, BoneIndex, BoneTransform, ChainError, ChainSetting, PhysicsSettings, Pose, Result,
    Skeleton, find_between,
};
use tracing::{debug, trace, warn};

use crate::chain::gather_chain;
use crate::collider::{BodyCollider, PlaneCollider};
use crate::constraints::{
    DistanceConstraint, convert_stiffness_to_compliance, horizontal_bends, horizontal_structures,
    shears, vertical_bends, vertical_structures,
};
use crate::contact::{
    Contact, ContactResponse, detect_body_contacts, detect_edge_contacts, detect_plane_contacts,
    resolve_contacts, update_friction,
};
use crate::debug::{DebugDraw, DebugDrawFlags};
use crate::particles::{ParticleWeights, Particles};
use crate::physics::{FrameInput, PhysicsContext, apply_forces, verlet_integrate};
use crate::pose::{apply_fixed_blend, limit_angle, movable_radius, planar, relative_limit_angle};

/// Every link list of a solver.
#[derive(Debug, Clone, Default)]
struct Links {
    vertical: Vec<DistanceConstraint>,
    horizontal: Vec<DistanceConstraint>,
    vertical_bends: Vec<DistanceConstraint>,
    horizontal_bends: Vec<DistanceConstraint>,
    shears: Vec<DistanceConstraint>,
}

impl Links {
    fn build(particles: &Particles, settings: &PhysicsSettings) -> Self {
        let s = &settings.structure;
        let shape = &particles.shape;
        let positions = &particles.positions;

        let mut links = Self {
            vertical: vertical_structures(
                shape,
                positions,
                convert_stiffness_to_compliance(s.stiffness),
            ),
            ..Self::default()
        };
        if s.horizontal {
            links.horizontal = horizontal_structures(
                shape,
                positions,
                convert_stiffness_to_compliance(s.stiffness),
                s.loop_horizontal,
            );
        }
        if settings.vertical_bend_active() {
            links.vertical_bends = vertical_bends(
                shape,
                positions,
                convert_stiffness_to_compliance(s.vertical_bend_stiffness),
            );
        }
        if s.horizontal_bend {
            links.horizontal_bends = horizontal_bends(
                shape,
                positions,
                convert_stiffness_to_compliance(s.horizontal_bend_stiffness),
            );
        }
        if s.shear {
            links.shears = shears(
                shape,
                positions,
                convert_stiffness_to_compliance(s.shear_stiffness),
                s.loop_horizontal,
            );
        }
        links
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut DistanceConstraint> {
        self.vertical
            .iter_mut()
            .chain(&mut self.horizontal)
            .chain(&mut self.vertical_bends)
            .chain(&mut self.horizontal_bends)
            .chain(&mut self.shears)
    }

    fn reset_lambdas(&mut self) {
        self.iter_mut().for_each(DistanceConstraint::reset);
    }

    fn count(&self) -> usize {
        self.vertical.len()
            + self.horizontal.len()
            + self.vertical_bends.len()
            + self.horizontal_bends.len()
            + self.shears.len()
    }
}

fn solve_all(
    links: &mut [DistanceConstraint],
    positions: &mut [Vector3<f64>],
    weights: &ParticleWeights<'_>,
    dt: f64,
) {
    for link in links {
        link.solve(positions, weights, dt);
    }
}

/// State built by a successful initialization.
#[derive(Debug, Clone)]
struct Simulation {
    settings: PhysicsSettings,
    particles: Particles,
    links: Links,
    simulation_root: Option<BoneIndex>,
    gravity_driver: Option<(BoneIndex, Axis)>,
    /// Last output rotation per rank.
    rank_rotations: Vec<UnitQuaternion<f64>>,
}

impl Simulation {
    fn build<S: Skeleton + ?Sized>(
        skeleton: &S,
        chains: &[ChainSetting],
        settings: &PhysicsSettings,
    ) -> Result<Self> {
        settings.validate()?;
        if chains.is_empty() {
            return Err(ChainError::NoChains);
        }

        let simulation_root = settings
            .simulation_root_bone
            .as_deref()
            .map(|name| {
                skeleton
                    .find_bone(name)
                    .ok_or_else(|| ChainError::unresolved_bone(name, "simulation root"))
            })
            .transpose()?;
        let gravity_driver = settings
            .gravity
            .bone_space
            .as_ref()
            .map(|driver| {
                skeleton
                    .find_bone(&driver.bone)
                    .map(|bone| (bone, driver.axis))
                    .ok_or_else(|| ChainError::unresolved_bone(&driver.bone, "gravity driver"))
            })
            .transpose()?;

        let gathered = chains
            .iter()
            .map(|chain| gather_chain(skeleton, chain, settings))
            .collect::<Result<Vec<_>>>()?;
        let particles = Particles::from_chains(&gathered);
        let links = Links::build(&particles, settings);

        Ok(Self {
            settings: settings.clone(),
            rank_rotations: vec![UnitQuaternion::identity(); particles.shape.padded_ranks],
            particles,
            links,
            simulation_root,
            gravity_driver,
        })
    }
}

/// Lifecycle of a [`ChainSolver`].
#[derive(Debug, Clone, Default)]
enum SolverState {
    #[default]
    Uninitialized,
    Initialized(Box<Simulation>),
}

/// Secondary-motion solver for one set of chains.
///
/// # Example
///
/// ```
/// use sway_chain::{BodyCollider, ChainSolver, FrameInput};
/// use sway_types::{BoneTransform, ChainSetting, PhysicsSettings, SkeletonData, Vector3};
///
/// let mut skeleton = SkeletonData::new();
/// let mut parent = None;
/// for i in 0..4 {
///     let offset = Vector3::new(0.0, 0.0, -10.0 * f64::from(i));
///     parent = Some(skeleton.add_bone(
///         &format!("tail_{i}"),
///         parent,
///         BoneTransform::from_translation(offset),
///     ));
/// }
///
/// let mut solver = ChainSolver::new();
/// solver
///     .initialize(&skeleton, &[ChainSetting::new("tail_0")], &PhysicsSettings::tail())
///     .unwrap();
///
/// let pose = skeleton.reference_pose();
/// let body = BodyCollider::default();
/// solver.pre_simulate(&FrameInput::new(1.0 / 60.0, BoneTransform::identity()), &pose);
/// solver.simulate(&body, &[]);
/// let bones = solver.output_result(&pose);
/// assert_eq!(bones.len(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChainSolver {
    state: SolverState,
    context: PhysicsContext,
    contacts: Vec<Contact>,
}

impl ChainSolver {
    /// An uninitialized solver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `chains` against `skeleton` and build the particle grid and
    /// every enabled link list.
    ///
    /// Any previous state is discarded first; on error the solver stays
    /// uninitialized.
    ///
    /// # Errors
    ///
    /// Invalid settings, no chains, or a chain root, excluded bone,
    /// simulation root or gravity driver that cannot be resolved, or a chain
    /// shorter than two bones.
    pub fn initialize<S: Skeleton + ?Sized>(
        &mut self,
        skeleton: &S,
        chains: &[ChainSetting],
        settings: &PhysicsSettings,
    ) -> Result<()> {
        self.state = SolverState::Uninitialized;
        self.context = PhysicsContext::new();
        self.contacts.clear();

        let simulation = Simulation::build(skeleton, chains, settings).map_err(|err| {
            warn!(%err, "chain solver initialization failed");
            err
        })?;

        let shape = simulation.particles.shape;
        debug!(
            ranks = shape.actual_ranks,
            depths = shape.actual_depths,
            padded_ranks = shape.padded_ranks,
            padded_depths = shape.padded_depths,
            links = simulation.links.count(),
            "chain solver initialized"
        );
        self.state = SolverState::Initialized(Box::new(simulation));
        Ok(())
    }

    /// Whether the last initialization succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, SolverState::Initialized(_))
    }

    fn simulation(&self) -> Option<&Simulation> {
        match &self.state {
            SolverState::Initialized(simulation) => Some(simulation),
            SolverState::Uninitialized => None,
        }
    }

    /// Particle buffers, once initialized.
    #[must_use]
    pub fn particles(&self) -> Option<&Particles> {
        self.simulation().map(|s| &s.particles)
    }

    /// Frame-to-frame context.
    #[must_use]
    pub fn context(&self) -> &PhysicsContext {
        &self.context
    }

    /// Contacts found in the last solver iteration.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Settings the solver was initialized with.
    #[must_use]
    pub fn settings(&self) -> Option<&PhysicsSettings> {
        self.simulation().map(|s| &s.settings)
    }

    /// Simulated position of every real bone, in grid order.
    ///
    /// # Errors
    ///
    /// [`ChainError::NotInitialized`] before a successful initialization.
    pub fn bone_positions(&self) -> Result<Vec<(BoneIndex, Vector3<f64>)>> {
        let particles = self.particles().ok_or(ChainError::NotInitialized)?;
        Ok(particles
            .bones
            .iter()
            .zip(&particles.positions)
            .filter_map(|(bone, p)| bone.map(|b| (b, *p)))
            .collect())
    }

    /// Advance the frame context and sample the animated pose.
    pub fn pre_simulate<P: Pose + ?Sized>(&mut self, input: &FrameInput, pose: &P) {
        let SolverState::Initialized(simulation) = &mut self.state else {
            return;
        };
        let Simulation {
            settings,
            particles,
            simulation_root,
            gravity_driver,
            ..
        } = simulation.as_mut();
        let context = &mut self.context;

        context.update_delta_time(input.delta_time, settings.fixed_rate);
        context.alpha = input.alpha.clamp(0.0, 1.0);
        context.update_component_transform(input.component_transform);

        if let Some(root) = *simulation_root {
            let transform = pose.component_transform(root);
            if transform.is_none() {
                trace!(bone = %root, "simulation root not evaluated this frame");
            }
            context.update_simulation_root(transform);
            context.follow_simulation_root(&mut particles.positions);
            context.follow_simulation_root(&mut particles.prev_positions);
        }

        let acceleration = settings.gravity.acceleration();
        let driven = (*gravity_driver).and_then(|(bone, axis)| {
            let transform = pose.component_transform(bone);
            if transform.is_none() {
                trace!(%bone, "gravity driver not evaluated this frame, using world gravity");
            }
            transform.map(|t| t.unit_axis(axis) * acceleration)
        });
        context.gravity = driven.unwrap_or_else(|| {
            input
                .component_transform
                .inverse_transform_vector(&(-Vector3::z() * acceleration))
        });

        for i in 0..particles.len() {
            let Some(bone) = particles.bones[i] else {
                continue;
            };
            match pose.component_transform(bone) {
                Some(transform) => {
                    particles.anim_positions[i] = transform.translation;
                    particles.anim_rotations[i] = transform.rotation;
                    particles.evaluable[i] = true;
                }
                None => particles.evaluable[i] = false,
            }
        }
    }

    /// Run one frame of the simulation.
    ///
    /// `body` and `planes` must already be updated against this frame's pose.
    pub fn simulate(&mut self, body: &BodyCollider, planes: &[PlaneCollider]) {
        let SolverState::Initialized(simulation) = &mut self.state else {
            return;
        };
        let Simulation {
            settings,
            particles,
            links,
            ..
        } = simulation.as_mut();
        let context = &self.context;

        let motion = context.motion(&settings.damping);
        apply_forces(particles, context, &motion);
        verlet_integrate(particles, context);
        apply_fixed_blend(particles);

        if settings.relative_limit_angle.enabled {
            let padded_ranks = particles.shape.padded_ranks;
            relative_limit_angle(particles, &links.vertical, padded_ranks);
        }
        let anim_pose = &settings.anim_pose;
        if anim_pose.enabled {
            if anim_pose.use_movable_radius {
                movable_radius(particles);
            }
            if anim_pose.use_limit_angle {
                limit_angle(particles, &links.vertical);
            }
            if anim_pose.use_planar {
                planar(particles, &links.vertical);
            }
        }

        links.reset_lambdas();

        let collision = &settings.collision;
        let response = ContactResponse {
            blend: collision.collision_blend,
            penetration_depth: collision.penetration_depth,
        };
        let dt = context.delta_time;
        let contacts = &mut self.contacts;

        for iteration in 0..settings.solver_iterations {
            contacts.clear();
            detect_body_contacts(particles, body, contacts);
            if collision.edge_collider {
                detect_edge_contacts(particles, &links.vertical, body, contacts);
                if collision.horizontal_edge_collider && !links.horizontal.is_empty() {
                    detect_edge_contacts(particles, &links.horizontal, body, contacts);
                }
            }
            detect_plane_contacts(particles, planes, contacts);

            let (positions, weights) = particles.split_for_solve();
            if settings.structure.rigid_vertical {
                for link in &links.vertical {
                    link.solve_rigid(positions, &weights);
                }
            } else {
                solve_all(&mut links.vertical, positions, &weights, dt);
            }
            solve_all(&mut links.horizontal, positions, &weights, dt);
            solve_all(&mut links.vertical_bends, positions, &weights, dt);
            solve_all(&mut links.horizontal_bends, positions, &weights, dt);
            solve_all(&mut links.shears, positions, &weights, dt);

            resolve_contacts(contacts, positions, &weights, response);

            if iteration == 0 {
                update_friction(particles, contacts);
            }
        }
    }

    /// Bone transforms in component space, sorted by bone index.
    ///
    /// Each bone is rotated so its animated direction toward the next bone
    /// matches the simulated one, placed at its simulated position and
    /// blended toward the animation by `1 - alpha`. Padding and bones missing
    /// from `pose` are left out.
    pub fn output_result<P: Pose + ?Sized>(&mut self, pose: &P) -> Vec<(BoneIndex, BoneTransform)> {
        let SolverState::Initialized(simulation) = &mut self.state else {
            return Vec::new();
        };
        let Simulation {
            particles,
            links,
            rank_rotations,
            ..
        } = simulation.as_mut();
        let alpha = self.context.alpha;
        let shape = particles.shape;

        let place = |rotation: UnitQuaternion<f64>, position: Vector3<f64>, anim: &BoneTransform| {
            let simulated = BoneTransform::new(rotation, position).with_scale(anim.scale);
            if alpha < 1.0 {
                anim.blend(&simulated, alpha)
            } else {
                simulated
            }
        };

        let mut out = Vec::with_capacity(shape.actual_ranks * shape.actual_depths);
        for link in &links.vertical {
            let (a, b) = (link.first, link.second);
            if !particles.is_live(a) {
                continue;
            }
            let Some(bone) = particles.bones[a] else {
                continue;
            };
            let Some(anim) = pose.component_transform(bone) else {
                continue;
            };
            let (rank, _) = shape.coords(a);

            let transform = if particles.is_live(b) {
                let anim_dir = particles.anim_positions[b] - particles.anim_positions[a];
                let sim_dir = particles.positions[b] - particles.positions[a];
                let rotation = find_between(&anim_dir, &sim_dir) * particles.anim_rotations[a];
                rank_rotations[rank] = rotation;
                place(rotation, particles.positions[a], &anim)
            } else {
                place(rank_rotations[rank], particles.positions[a], &anim)
            };
            out.push((bone, transform));
        }

        // The tip row is never the first end of a link.
        if let Some(tip) = shape.padded_depths.checked_sub(1) {
            for rank in 0..shape.actual_ranks {
                let i = shape.index(rank, tip);
                if !particles.is_live(i) {
                    continue;
                }
                let Some(bone) = particles.bones[i] else {
                    continue;
                };
                if let Some(anim) = pose.component_transform(bone) {
                    let transform = place(rank_rotations[rank], particles.positions[i], &anim);
                    out.push((bone, transform));
                }
            }
        }

        out.sort_by_key(|(bone, _)| *bone);
        self.context.first_update = false;
        out
    }

    /// Visit what `flags` select. Colliders are drawn separately with
    /// [`crate::draw_body_collider`] and [`crate::draw_plane_colliders`].
    pub fn debug_draw(&self, flags: DebugDrawFlags, draw: &mut dyn DebugDraw) {
        let Some(simulation) = self.simulation() else {
            return;
        };
        let particles = &simulation.particles;
        let links = &simulation.links;
        let real_link = |link: &&DistanceConstraint| {
            !particles.is_dummy(link.first) && !particles.is_dummy(link.second)
        };

        if flags.contains(DebugDrawFlags::PARTICLES) {
            for i in (0..particles.len()).filter(|&i| !particles.is_dummy(i)) {
                draw.sphere(
                    &particles.positions[i],
                    particles.sphere_radius[i],
                    DebugDrawFlags::PARTICLES,
                );
            }
        }
        if flags.contains(DebugDrawFlags::STRUCTURES) {
            for link in links.vertical.iter().chain(&links.horizontal).filter(real_link) {
                draw.segment(
                    &particles.positions[link.first],
                    &particles.positions[link.second],
                    DebugDrawFlags::STRUCTURES,
                );
            }
        }
        if flags.contains(DebugDrawFlags::BENDS_AND_SHEARS) {
            let bends_and_shears = links
                .vertical_bends
                .iter()
                .chain(&links.horizontal_bends)
                .chain(&links.shears);
            for link in bends_and_shears.filter(real_link) {
                draw.segment(
                    &particles.positions[link.first],
                    &particles.positions[link.second],
                    DebugDrawFlags::BENDS_AND_SHEARS,
                );
            }
        }
        if flags.contains(DebugDrawFlags::ANIM_POSE) {
            for link in links.vertical.iter().filter(real_link) {
                draw.segment(
                    &particles.anim_positions[link.first],
                    &particles.anim_positions[link.second],
                    DebugDrawFlags::ANIM_POSE,
                );
            }
        }
        if flags.contains(DebugDrawFlags::CONTACTS) {
            for contact in &self.contacts {
                let p = particles.positions[contact.index];
                draw.segment(&p, &(p + contact.normal), DebugDrawFlags::CONTACTS);
            }
        }
    }
}
