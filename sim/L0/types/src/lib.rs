//! Shared types for the sway chain solver.
//!
//! This crate holds everything the solver consumes but does not compute:
//!
//! - [`PhysicsSettings`] / [`ChainSetting`] - tunables, presets and per-chain overrides
//! - [`ProfileCurve`] / [`ScaledParameter`] - per-bone values along a chain
//! - [`BoneTransform`] - bone translation, rotation and scale
//! - [`Skeleton`] / [`Pose`] - the host's bone hierarchy and current pose
//! - [`BodyColliderSettings`] / [`PlaneColliderSettings`] - bone-local colliders
//! - [`ChainError`] - setup errors
//!
//! # Coordinate System
//!
//! - X: forward
//! - Y: right
//! - Z: up
//! - Right-handed, lengths in world units (centimeters by default)
//!
//! # Example
//!
//! ```
//! use sway_types::{BoneTransform, ChainSetting, PhysicsSettings, Skeleton, SkeletonData};
//! use nalgebra::Vector3;
//!
//! let mut skeleton = SkeletonData::new();
//! let root = skeleton.add_bone("tail_0", None, BoneTransform::identity());
//! skeleton.add_bone(
//!     "tail_1",
//!     Some(root),
//!     BoneTransform::from_translation(Vector3::new(0.0, 0.0, -10.0)),
//! );
//!
//! let settings = PhysicsSettings::tail();
//! assert!(settings.validate().is_ok());
//! assert_eq!(skeleton.find_bone("tail_1").map(|b| b.raw()), Some(1));
//! let _chain = ChainSetting::new("tail_0");
//! ```

#![doc(html_root_url = "https://docs.rs/sway-types/0.3.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod collider;
mod config;
mod curve;
mod error;
mod skeleton;
mod transform;

pub use collider::{BodyColliderSettings, CapsuleShape, PlaneColliderSettings, SphereShape};
pub use config::{
    AnimPoseSettings, BoneSpaceGravity, ChainOverrides, ChainSetting, CollisionSettings,
    DampedLimit, DampingSettings, GravitySettings, MIN_MASS, PhysicsSettings,
    RelativeLimitAngleSettings, StructureSettings,
};
pub use curve::{CurveKey, ProfileCurve, ScaledParameter};
pub use error::{ChainError, Result};
pub use skeleton::{BoneData, BoneIndex, Pose, PoseData, Skeleton, SkeletonData};
pub use transform::{Axis, BoneTransform, SMALL_NUMBER_SQUARED, find_between, safe_normal};

// Re-export nalgebra types for convenience
pub use nalgebra::{UnitQuaternion, Vector3};
