//! Constraints toward the animated pose.
//!
//! A hanging chain is dragged sideways by moving the component; each
//! constraint must keep the simulated chain bounded against the (still)
//! animated pose, and the same drag without the constraint must leave it.

use nalgebra::Vector3;
use sway_conformance::{DT, Rig, SPACING, hanging_chain};
use sway_types::{
    Axis, BoneTransform, ChainSetting, DampedLimit, PhysicsSettings, ScaledParameter,
};

/// Step the rig while dragging the component by `step` per frame for
/// `frames` frames, calling `check` after each one.
fn drag(rig: &mut Rig, step: Vector3<f64>, frames: u32, mut check: impl FnMut(&Rig)) {
    rig.step(DT);
    for frame in 1..=frames {
        rig.component = BoneTransform::from_translation(step * f64::from(frame));
        rig.step(DT);
        check(rig);
    }
}

fn anim_position(i: usize) -> Vector3<f64> {
    #[allow(clippy::cast_precision_loss)]
    let depth = i as f64;
    Vector3::new(0.0, 0.0, -SPACING * depth)
}

#[test]
fn planar_chain_stays_in_its_plane() {
    let mut settings = PhysicsSettings::default();
    settings.anim_pose.enabled = true;
    settings.anim_pose.use_planar = true;
    let kick = Vector3::new(3.0, 4.0, 0.0);

    let chain = ChainSetting::new("joint_0").planar(Axis::Y);
    let mut rig = Rig::new(hanging_chain(4), &[chain], &settings).unwrap();
    let mut max_x = 0.0_f64;
    drag(&mut rig, kick, 20, |rig| {
        for i in 0..4 {
            let p = rig.position_of(&format!("joint_{i}")).unwrap();
            assert!(p.y.abs() < 1e-9, "joint_{i} left the plane: {p}");
        }
        max_x = max_x.max(rig.position_of("joint_3").unwrap().x.abs());
    });
    // Motion within the plane is still simulated.
    assert!(max_x > 0.1, "drag never moved the chain within its plane");

    // Same drag, no planar axis on the chain.
    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    let mut max_y = 0.0_f64;
    drag(&mut rig, kick, 20, |rig| {
        max_y = max_y.max(rig.position_of("joint_3").unwrap().y.abs());
    });
    assert!(max_y > 0.1, "drag never moved the free chain sideways");
}

fn first_link_angle(rig: &Rig) -> f64 {
    let root = rig.position_of("joint_0").unwrap();
    let next = rig.position_of("joint_1").unwrap();
    (next - root).angle(&-Vector3::z()).to_degrees()
}

#[test]
fn limit_angle_bounds_rigid_tail() {
    let mut settings = PhysicsSettings::tail();
    settings.anim_pose.limit_angle = DampedLimit::new(30.0, 0.0);
    let kick = Vector3::new(20.0, 0.0, 0.0);

    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    let mut max_angle = 0.0_f64;
    drag(&mut rig, kick, 15, |rig| {
        max_angle = max_angle.max(first_link_angle(rig));
    });
    assert!(max_angle <= 30.1 + 1e-6, "swung to {max_angle} degrees");
    assert!(max_angle > 20.0, "drag too weak to test the limit: {max_angle}");

    settings.anim_pose.use_limit_angle = false;
    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    let mut free_angle = 0.0_f64;
    drag(&mut rig, kick, 15, |rig| {
        free_angle = free_angle.max(first_link_angle(rig));
    });
    assert!(free_angle > 35.0, "unconstrained tail only swung {free_angle} degrees");
}

#[test]
fn movable_radius_keeps_chain_near_animation() {
    let mut settings = PhysicsSettings::default().zero_gravity();
    settings.damping.world_velocity = ScaledParameter::constant(0.0);
    settings.anim_pose.enabled = true;
    settings.anim_pose.use_movable_radius = true;
    settings.anim_pose.movable_radius = DampedLimit::new(2.0, 0.0);
    let kick = Vector3::new(20.0, 0.0, 0.0);

    let max_deviation = |rig: &Rig| {
        (1..4)
            .map(|i| (rig.position_of(&format!("joint_{i}")).unwrap() - anim_position(i)).norm())
            .fold(0.0_f64, f64::max)
    };

    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    let mut bounded = 0.0_f64;
    drag(&mut rig, kick, 10, |rig| bounded = bounded.max(max_deviation(rig)));
    assert!(bounded < 4.0, "strayed {bounded} from the animation");

    settings.anim_pose.use_movable_radius = false;
    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    let mut free = 0.0_f64;
    drag(&mut rig, kick, 10, |rig| free = free.max(max_deviation(rig)));
    assert!(free > 8.0, "unconstrained chain only strayed {free}");
}
