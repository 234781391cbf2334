//! Plane colliders.
//!
//! A particle closer than its radius to a plane must end exactly one radius
//! away once contacts are resolved with full blend and no tolerance.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use sway_chain::{
    BoneParams, ContactResponse, GatheredChain, Particles, PlaneCollider, detect_plane_contacts,
    resolve_contacts,
};
use sway_conformance::{Rig, SPACING, add_hanging_chain, hanging_chain};
use sway_types::{
    BoneIndex, BoneTransform, ChainSetting, PhysicsSettings, PlaneColliderSettings, SkeletonData,
};

const RADIUS: f64 = 2.0;

const EXACT: ContactResponse = ContactResponse {
    blend: 1.0,
    penetration_depth: 0.0,
};

/// Pinned particle far above, free particle at `free`.
fn two_particles(free: Vector3<f64>) -> Particles {
    Particles::from_chains(&[GatheredChain {
        root: "root".into(),
        bones: vec![BoneIndex::new(0), BoneIndex::new(1)],
        positions: vec![Vector3::new(0.0, 0.0, 50.0), free],
        params: vec![
            BoneParams {
                sphere_radius: RADIUS,
                inv_mass: 1.0,
                ..BoneParams::dummy()
            };
            2
        ],
        pin_root: true,
        planar_axis: None,
    }])
}

fn resolve_once(particles: &mut Particles, planes: &[PlaneCollider]) -> usize {
    let mut contacts = Vec::new();
    detect_plane_contacts(particles, planes, &mut contacts);
    let (positions, weights) = particles.split_for_solve();
    resolve_contacts(&contacts, positions, &weights, EXACT);
    contacts.len()
}

#[test]
fn penetrating_particle_ends_one_radius_above_ground() {
    let planes = [PlaneCollider::new(&SkeletonData::new(), PlaneColliderSettings::ground())];
    let mut particles = two_particles(Vector3::new(3.0, -1.0, 0.5));
    let free = particles.shape.index(0, 1);

    assert_eq!(resolve_once(&mut particles, &planes), 1);
    assert_relative_eq!(particles.positions[free], Vector3::new(3.0, -1.0, RADIUS));

    // Touching: nothing left to resolve.
    assert_eq!(resolve_once(&mut particles, &planes), 0);
}

#[test]
fn particle_below_tilted_plane_is_lifted_along_normal() {
    let normal = Vector3::new(0.0, 1.0, 1.0).normalize();
    let origin = Vector3::new(1.0, 2.0, 3.0);
    let planes = [PlaneCollider::new(
        &SkeletonData::new(),
        PlaneColliderSettings::facing(origin, &normal),
    )];

    // Half a unit below the plane.
    let start = origin + Vector3::x() * 4.0 - normal * 0.5;
    let mut particles = two_particles(start);
    let free = particles.shape.index(0, 1);
    resolve_once(&mut particles, &planes);

    let p = particles.positions[free];
    assert_relative_eq!((p - origin).dot(&normal), RADIUS, epsilon = 1e-12);
    // Moved only along the normal.
    assert_relative_eq!((p - start).cross(&normal).norm(), 0.0, epsilon = 1e-12);
}

#[test]
fn particle_clear_of_plane_is_untouched() {
    let planes = [PlaneCollider::new(&SkeletonData::new(), PlaneColliderSettings::ground())];
    let mut particles = two_particles(Vector3::new(0.0, 0.0, RADIUS + 0.1));
    assert_eq!(resolve_once(&mut particles, &planes), 0);
}

#[test]
fn floor_holds_hanging_chain() {
    let mut settings = PhysicsSettings::default();
    settings.collision.collision_blend = 1.0;
    settings.collision.penetration_depth = 0.0;
    let floor_height = -3.0 * SPACING - 1.0;
    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings)
        .unwrap()
        .with_plane(PlaneColliderSettings::facing(
            Vector3::new(0.0, 0.0, floor_height),
            &Vector3::z(),
        ));

    for _ in 0..120 {
        rig.step(sway_conformance::DT);
        let tip = rig.position_of("joint_3").unwrap();
        assert!(tip.z >= floor_height + RADIUS - 1e-9, "tip sank to {tip}");
    }
}

#[test]
fn driven_plane_follows_its_bone() {
    let mut skeleton = SkeletonData::new();
    let floor = skeleton.add_bone(
        "floor",
        None,
        BoneTransform::from_translation(Vector3::new(0.0, 0.0, -60.0)),
    );
    add_hanging_chain(&mut skeleton, "joint", None, Vector3::zeros(), 4);

    let mut settings = PhysicsSettings::default();
    settings.collision.collision_blend = 1.0;
    settings.collision.penetration_depth = 0.0;
    let mut rig = Rig::new(skeleton, &[ChainSetting::new("joint_0")], &settings)
        .unwrap()
        .with_plane(PlaneColliderSettings::ground().driven_by("floor"));

    rig.run(30);
    let hanging = rig.position_of("joint_3").unwrap();
    assert!(hanging.z < -29.9);

    // Raise the floor bone until it cuts into the tip's sphere.
    let floor_height = -31.5;
    rig.pose.set(
        floor,
        BoneTransform::from_translation(Vector3::new(0.0, 0.0, floor_height)),
    );
    for _ in 0..30 {
        rig.step(sway_conformance::DT);
        let tip = rig.position_of("joint_3").unwrap();
        assert!(tip.z >= floor_height + RADIUS - 1e-9, "tip at {tip}");
    }

    // Without its driver the plane is off for the frame.
    rig.pose.clear(floor);
    rig.step(sway_conformance::DT);
    assert!(rig.planes[0].current().is_none());
}
