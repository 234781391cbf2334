//! Body colliders: spheres and capsules bound to bones.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use sway_chain::collision::{static_sphere_capsule, static_sphere_sphere};
use sway_chain::{Capsule, Sphere};
use sway_conformance::{DT, Rig, add_hanging_chain};
use sway_types::{
    BodyColliderSettings, BoneIndex, BoneTransform, ChainSetting, PhysicsSettings, SkeletonData,
};

const PARTICLE_RADIUS: f64 = 2.0;

/// A `spine` bone at the origin followed by a free-standing four-joint chain.
fn spine_and_chain() -> (SkeletonData, BoneIndex) {
    let mut skeleton = SkeletonData::new();
    let spine = skeleton.add_bone("spine", None, BoneTransform::identity());
    add_hanging_chain(&mut skeleton, "joint", None, Vector3::zeros(), 4);
    (skeleton, spine)
}

fn build_rig(settings: &PhysicsSettings, body: BodyColliderSettings) -> (Rig, BoneIndex) {
    let (skeleton, spine) = spine_and_chain();
    let rig = Rig::new(skeleton, &[ChainSetting::new("joint_0")], settings)
        .unwrap()
        .with_body(body);
    (rig, spine)
}

#[test]
fn overlapping_spheres_separate_along_centers() {
    let particle = Sphere::new(Vector3::new(1.5, 0.0, 0.0), 1.0);
    let collider = Sphere::new(Vector3::zeros(), 1.0);
    let plane = static_sphere_sphere(&particle, &collider).unwrap();
    assert_relative_eq!(plane.normal, Vector3::x());
    assert_relative_eq!(plane.offset, 2.0);
    // Half a unit of overlap to push out.
    assert_relative_eq!(plane.offset - particle.center.dot(&plane.normal), 0.5);

    let apart = Sphere::new(Vector3::new(2.0, 0.0, 0.0), 1.0);
    assert!(static_sphere_sphere(&apart, &collider).is_none());
}

#[test]
fn sphere_collider_pushes_tip_aside() {
    let body = BodyColliderSettings::default().sphere("spine", Vector3::new(4.0, 0.0, -30.0), 3.0);
    let center = Vector3::new(4.0, 0.0, -30.0);
    let (mut rig, _) = build_rig(&PhysicsSettings::default(), body);

    rig.step(DT);
    let tip = rig.position_of("joint_3").unwrap();
    assert!(tip.x < -0.1, "tip not pushed: {tip}");

    for _ in 0..120 {
        rig.step(DT);
        let tip = rig.position_of("joint_3").unwrap();
        let distance = (tip - center).norm();
        assert!(
            distance >= 3.0 + PARTICLE_RADIUS - 1.0,
            "tip sank to {distance} from the collider"
        );
    }
}

#[test]
fn disabled_driver_removes_collider() {
    let body = BodyColliderSettings::default().sphere("spine", Vector3::new(4.0, 0.0, -30.0), 3.0);
    let (mut rig, spine) = build_rig(&PhysicsSettings::default().zero_gravity(), body);
    rig.pose.clear(spine);

    rig.run(30);
    assert!(rig.body.current().spheres[0].is_none());
    let tip = rig.position_of("joint_3").unwrap();
    assert!(tip.x.abs() < 1e-9, "tip moved without a collider: {tip}");
}

#[test]
fn capsule_collider_pushes_tip_aside() {
    // Horizontal capsule just right of the tip.
    let body = BodyColliderSettings::default().capsule(
        "spine",
        Vector3::new(3.0, -10.0, -30.0),
        Vector3::new(3.0, 10.0, -30.0),
        2.0,
    );
    let mut settings = PhysicsSettings::default();
    settings.collision.collision_blend = 1.0;
    settings.collision.penetration_depth = 0.0;
    let (mut rig, _) = build_rig(&settings, body);

    for _ in 0..60 {
        rig.step(DT);
        let tip = rig.position_of("joint_3").unwrap();
        let axis_distance = Vector3::new(tip.x - 3.0, 0.0, tip.z + 30.0).norm();
        assert!(tip.x < 0.0, "tip not pushed: {tip}");
        assert!(axis_distance >= 2.0 + PARTICLE_RADIUS - 0.5, "tip at {axis_distance} from the axis");
    }

    // The capsule's own overlap test agrees with where the tip was pushed to.
    let capsule = Capsule::new(Vector3::new(3.0, -10.0, -30.0), Vector3::new(3.0, 10.0, -30.0), 2.0);
    let resting = Sphere::new(Vector3::new(-1.0, 0.0, -30.0), PARTICLE_RADIUS);
    assert!(static_sphere_capsule(&resting, &capsule).is_none());
}

#[test]
fn edge_collider_catches_collider_between_joints() {
    // Overlaps the link joint_1..joint_2 but neither joint's sphere.
    let body = BodyColliderSettings::default().sphere("spine", Vector3::new(2.0, 0.0, -15.0), 3.0);

    let mut settings = PhysicsSettings::default();
    settings.collision.edge_collider = true;
    let (mut rig, _) = build_rig(&settings, body.clone());
    rig.step(DT);
    for name in ["joint_1", "joint_2"] {
        let p = rig.position_of(name).unwrap();
        assert!(p.x < 0.0, "{name} not pushed by the edge: {p}");
    }

    settings.collision.edge_collider = false;
    let (mut rig, _) = build_rig(&settings, body);
    rig.step(DT);
    for name in ["joint_1", "joint_2"] {
        let p = rig.position_of(name).unwrap();
        assert!(p.x.abs() < 1e-12, "{name} moved without edge collision: {p}");
    }
}

/// Two chains side by side, 20 apart, joined by horizontal links.
fn paired_chains(settings: &PhysicsSettings, body: BodyColliderSettings) -> Rig {
    let mut skeleton = SkeletonData::new();
    skeleton.add_bone("spine", None, BoneTransform::identity());
    add_hanging_chain(&mut skeleton, "a", None, Vector3::zeros(), 4);
    add_hanging_chain(&mut skeleton, "b", None, Vector3::new(20.0, 0.0, 0.0), 4);
    Rig::new(skeleton, &[ChainSetting::new("a_0"), ChainSetting::new("b_0")], settings)
        .unwrap()
        .with_body(body)
}

#[test]
fn horizontal_edges_need_edge_collider() {
    // Sits on the tip-to-tip horizontal link, clear of both tip spheres.
    let body = BodyColliderSettings::default().sphere("spine", Vector3::new(10.0, 1.0, -30.0), 3.0);
    let bind = Vector3::new(0.0, 0.0, -30.0);

    let mut settings = PhysicsSettings::default().zero_gravity();
    settings.structure.horizontal = true;
    settings.collision.edge_collider = false;
    settings.collision.horizontal_edge_collider = true;
    let mut rig = paired_chains(&settings, body.clone());
    rig.run(5);
    let tip = rig.position_of("a_3").unwrap();
    assert_relative_eq!(tip, bind, epsilon = 1e-9);

    settings.collision.edge_collider = true;
    let mut rig = paired_chains(&settings, body);
    rig.run(5);
    let tip = rig.position_of("a_3").unwrap();
    assert!((tip - bind).norm() > 0.1, "horizontal edge ignored: {tip}");
}
