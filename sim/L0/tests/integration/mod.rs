//! Integration tests for the sway chain solver.
//!
//! These tests drive [`sway_chain::ChainSolver`] through whole frames the way
//! a host does and check observable behaviour:
//! - Hanging chains keep their length and settle under gravity
//! - Rigid chains hold the bind pose without external forces
//! - Plane and body colliders keep particles out
//! - Pose constraints bound the chain against the animation
//! - Lifecycle: initialization errors, padding isolation, output blending

pub mod body_collision;
pub mod lifecycle;
pub mod pendulum;
pub mod plane_collision;
pub mod pose_constraints;
pub mod structure;
