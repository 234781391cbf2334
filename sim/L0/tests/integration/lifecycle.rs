//! Solver lifecycle and frame bookkeeping.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use sway_chain::{ChainError, ChainSolver, FrameInput};
use sway_conformance::{DT, Rig, SPACING, add_hanging_chain, hanging_chain};
use sway_types::{
    BoneIndex, BoneTransform, ChainSetting, PhysicsSettings, Pose, ScaledParameter, SkeletonData,
};

/// Two chains side by side: `left_*` with 3 bones, `right_*` with 5.
fn uneven_pair() -> SkeletonData {
    let mut skeleton = SkeletonData::new();
    add_hanging_chain(&mut skeleton, "left", None, Vector3::zeros(), 3);
    add_hanging_chain(&mut skeleton, "right", None, Vector3::new(0.0, 8.0, 0.0), 5);
    skeleton
}

fn uneven_chains() -> [ChainSetting; 2] {
    [ChainSetting::new("left_0"), ChainSetting::new("right_0")]
}

/// Swing the rig sideways for a few frames so output rotations are not
/// trivial.
fn swing(rig: &mut Rig) {
    rig.step(DT);
    for frame in 1..=10_u32 {
        rig.component = BoneTransform::from_translation(Vector3::x() * (2.0 * f64::from(frame)));
        rig.step(DT);
    }
}

#[test]
fn reinitialize_replaces_chains() {
    let skeleton = uneven_pair();
    let mut solver = ChainSolver::new();
    solver
        .initialize(&skeleton, &[ChainSetting::new("left_0")], &PhysicsSettings::default())
        .unwrap();
    assert_eq!(solver.bone_positions().unwrap().len(), 3);

    solver
        .initialize(&skeleton, &uneven_chains(), &PhysicsSettings::default())
        .unwrap();
    assert_eq!(solver.bone_positions().unwrap().len(), 8);

    let err = solver
        .initialize(&skeleton, &[ChainSetting::new("missing")], &PhysicsSettings::default())
        .unwrap_err();
    assert!(matches!(err, ChainError::UnresolvedBone { role: "chain root", .. }));
    assert!(!solver.is_initialized());
    assert_eq!(solver.bone_positions().unwrap_err(), ChainError::NotInitialized);

    // Cutting the chain after its root leaves a single bone.
    let err = solver
        .initialize(
            &skeleton,
            &[ChainSetting::new("left_0").exclude("left_1")],
            &PhysicsSettings::default(),
        )
        .unwrap_err();
    assert_eq!(err, ChainError::chain_too_short("left_0", 1));
}

#[test]
fn output_is_sorted_and_covers_every_real_bone() {
    let mut rig = Rig::new(uneven_pair(), &uneven_chains(), &PhysicsSettings::default()).unwrap();
    swing(&mut rig);
    let out = rig.step(DT);

    let bones: Vec<BoneIndex> = out.iter().map(|(bone, _)| *bone).collect();
    assert_eq!(bones, (0..8).map(BoneIndex::new).collect::<Vec<_>>());
    for (bone, transform) in &out {
        let simulated = rig.position(*bone).unwrap();
        assert_relative_eq!(transform.translation, simulated, epsilon = 1e-12);
    }

    // The short chain's last bone has no partner and copies its parent's
    // rotation.
    let rotation = |i: usize| out[i].1.rotation;
    assert!(rotation(1).angle() > 1e-3, "swing left the chain straight");
    assert_eq!(rotation(2), rotation(1));
}

#[test]
fn alpha_blends_output_toward_animation() {
    let skeleton = uneven_pair();
    let reference = skeleton.reference_pose();

    let mut rig = Rig::new(skeleton, &uneven_chains(), &PhysicsSettings::default()).unwrap();
    swing(&mut rig);

    rig.alpha = 0.0;
    for (bone, transform) in rig.step(DT) {
        let anim = reference.component_transform(bone).unwrap();
        assert_relative_eq!(transform.translation, anim.translation, epsilon = 1e-12);
        assert!(transform.rotation.angle_to(&anim.rotation) < 1e-9);
    }

    // Half way: translations sit between animation and simulation.
    rig.alpha = 0.5;
    for (bone, transform) in rig.step(DT) {
        let anim = reference.component_transform(bone).unwrap().translation;
        let simulated = rig.position(bone).unwrap();
        assert_relative_eq!(transform.translation, (anim + simulated) * 0.5, epsilon = 1e-12);
    }

    // Out-of-range alpha is clamped.
    rig.alpha = 3.0;
    rig.step(DT);
    assert_relative_eq!(rig.solver.context().alpha, 1.0);
}

/// A `pelvis` with a four-joint chain under it.
fn pelvis_rig(settings: &PhysicsSettings) -> Rig {
    let mut skeleton = SkeletonData::new();
    let pelvis = skeleton.add_bone("pelvis", None, BoneTransform::identity());
    add_hanging_chain(&mut skeleton, "joint", Some(pelvis), Vector3::zeros(), 4);
    Rig::new(skeleton, &[ChainSetting::new("joint_0")], settings).unwrap()
}

fn shift_pose(rig: &mut Rig, by: Vector3<f64>) {
    for transform in rig.pose.transforms.iter_mut().flatten() {
        transform.translation += by;
    }
}

#[test]
fn particles_ride_along_with_simulation_root() {
    let settings = PhysicsSettings::default().zero_gravity().simulation_root("pelvis");
    let mut rig = pelvis_rig(&settings);
    rig.step(DT);

    shift_pose(&mut rig, Vector3::new(5.0, 0.0, 0.0));
    rig.step(DT);
    for i in 0..4_u32 {
        let p = rig.position_of(&format!("joint_{i}")).unwrap();
        let expected = Vector3::new(5.0, 0.0, -SPACING * f64::from(i));
        assert!((p - expected).norm() < 1e-9, "joint_{i} at {p}");
    }

    // Without a simulation root the chain trails behind its pinned root.
    let mut rig = pelvis_rig(&PhysicsSettings::default().zero_gravity());
    rig.step(DT);
    shift_pose(&mut rig, Vector3::new(5.0, 0.0, 0.0));
    rig.step(DT);
    assert_relative_eq!(rig.position_of("joint_0").unwrap().x, 5.0);
    assert!(rig.position_of("joint_2").unwrap().x < 4.0);
}

#[test]
fn teleport_is_ignored() {
    let mut settings = PhysicsSettings::default().zero_gravity();
    settings.damping.world_velocity = ScaledParameter::constant(0.0);
    let bind = |i: u32| Vector3::new(0.0, 0.0, -SPACING * f64::from(i));

    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    rig.step(DT);
    rig.component = BoneTransform::from_translation(Vector3::new(500.0, 0.0, 0.0));
    rig.step(DT);
    for i in 0..4 {
        let p = rig.position_of(&format!("joint_{i}")).unwrap();
        assert!((p - bind(i)).norm() < 1e-9, "joint_{i} reacted to a teleport: {p}");
    }

    // A move under the threshold is felt.
    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    rig.step(DT);
    rig.component = BoneTransform::from_translation(Vector3::new(50.0, 0.0, 0.0));
    rig.step(DT);
    assert!(rig.position_of("joint_3").unwrap().x < -1.0);
}

#[test]
fn timestep_hitch_and_fallback() {
    let mut rig = Rig::new(hanging_chain(3), &[ChainSetting::new("joint_0")], &PhysicsSettings::default())
        .unwrap();
    rig.step(DT);
    assert_relative_eq!(rig.solver.context().delta_time, DT);

    // A stalled frame is clamped to the previous step.
    rig.step(DT * 2.0);
    assert_relative_eq!(rig.solver.context().delta_time, DT);

    // A mild slowdown is accepted.
    rig.step(DT * 1.1);
    assert_relative_eq!(rig.solver.context().delta_time, DT * 1.1);

    let mut settings = PhysicsSettings::default();
    settings.fixed_rate = 30.0;
    let mut solver = ChainSolver::new();
    let skeleton = hanging_chain(3);
    solver
        .initialize(&skeleton, &[ChainSetting::new("joint_0")], &settings)
        .unwrap();
    solver.pre_simulate(
        &FrameInput::new(0.0, BoneTransform::identity()),
        &skeleton.reference_pose(),
    );
    assert_relative_eq!(solver.context().delta_time, 1.0 / 30.0);
}
