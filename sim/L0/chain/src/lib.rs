//! XPBD secondary-motion solver for skeletal joint chains.
//!
//! Chains of bones (hair strands, cloth strips, tails) are laid out as a
//! padded particle grid, one column per chain, and driven by stretch-only
//! XPBD distance constraints, gravity, inertia of the moving character and
//! collisions against bone-bound spheres, capsules and planes. The result is
//! written back as bone transforms blended over the animation.
//!
//! # Layout
//!
//! - [`GridShape`] - padded `(rank, depth)` index space, transposable
//! - [`Particles`] - structure-of-arrays particle buffers
//! - [`DistanceConstraint`] - the shared XPBD link and its topologies
//! - [`collision`] - closest-point, intersection and swept tests
//! - [`BodyCollider`] / [`PlaneCollider`] - colliders following the skeleton
//! - [`PhysicsContext`] - timestep and transform history, forces, Verlet
//! - [`ChainSolver`] - Initialize → PreSimulate → Simulate → OutputResult
//! - [`DebugDraw`] - optional visualization hook
//!
//! # Padding
//!
//! Both grid axes are padded to a multiple of the lane width with dummy
//! particles. Dummies are never integrated, never pull on real particles,
//! never collide and never appear in the output.
//!
//! # Example
//!
//! ```
//! use sway_chain::{BodyCollider, ChainSolver, FrameInput, PlaneCollider};
//! use sway_types::{
//!     BodyColliderSettings, BoneTransform, ChainSetting, PhysicsSettings,
//!     PlaneColliderSettings, SkeletonData, Vector3,
//! };
//!
//! let mut skeleton = SkeletonData::new();
//! let spine = skeleton.add_bone("spine", None, BoneTransform::identity());
//! let mut parent = spine;
//! for i in 0..5 {
//!     let offset = Vector3::new(-5.0, 0.0, -8.0 * f64::from(i));
//!     parent = skeleton.add_bone(
//!         format!("hair_{i}"),
//!         Some(parent),
//!         BoneTransform::from_translation(offset),
//!     );
//! }
//!
//! let mut solver = ChainSolver::new();
//! solver
//!     .initialize(&skeleton, &[ChainSetting::new("hair_0")], &PhysicsSettings::hair())
//!     .unwrap();
//!
//! let mut body = BodyCollider::new(
//!     &skeleton,
//!     BodyColliderSettings::default().sphere("spine", Vector3::zeros(), 4.0),
//! );
//! let floor = PlaneCollider::new(
//!     &skeleton,
//!     PlaneColliderSettings::facing(Vector3::new(0.0, 0.0, -100.0), &Vector3::z()),
//! );
//!
//! let pose = skeleton.reference_pose();
//! for _ in 0..10 {
//!     body.update(&pose);
//!     solver.pre_simulate(&FrameInput::new(1.0 / 60.0, BoneTransform::identity()), &pose);
//!     solver.simulate(&body, std::slice::from_ref(&floor));
//!     let bones = solver.output_result(&pose);
//!     assert_eq!(bones.len(), 5);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/sway-chain/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::module_name_repetitions,
    clippy::similar_names,             // first/second, prev/previous pairs
)]

mod chain;
mod collider;
pub mod collision;
mod constraints;
mod contact;
mod debug;
mod grid;
mod particles;
mod physics;
mod pose;
mod solver;

pub use chain::{BoneParams, GatheredChain, gather_chain};
pub use collider::{BodyCollider, ColliderSnapshot, PlaneCollider, ResolvedPlane};
pub use collision::{Capsule, SeparatingPlane, Sphere};
pub use constraints::{
    CONCRETE_COMPLIANCE, DistanceConstraint, FAT_COMPLIANCE, convert_stiffness_to_compliance,
    horizontal_bends, horizontal_structures, shears, vertical_bends, vertical_structures,
};
pub use contact::{
    Contact, ContactResponse, detect_body_contacts, detect_edge_contacts, detect_plane_contacts,
    resolve_contacts, update_friction,
};
pub use debug::{
    DebugDraw, DebugDrawData, DebugDrawFlags, DebugPlane, DebugSegment, DebugSphere,
    draw_body_collider, draw_plane_colliders,
};
pub use grid::GridShape;
pub use particles::{ParticleWeights, Particles};
pub use physics::{
    FrameInput, FrameMotion, MAX_DELTA_TIME_RATIO, Motion, PhysicsContext, apply_forces,
    verlet_integrate,
};
pub use pose::{
    POSE_CORRECTION_EPSILON, apply_fixed_blend, limit_angle, movable_radius, planar,
    relative_limit_angle,
};
pub use solver::ChainSolver;

// Re-export the lane layer and shared types for convenience
pub use sway_simd::{LANE_WIDTH, Lanes, Vec3x4};
pub use sway_types::{BoneIndex, BoneTransform, ChainError, Result};
