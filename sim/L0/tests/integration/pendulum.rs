//! Hanging chain under gravity.
//!
//! A four-joint chain, joints `SPACING` apart and pinned at the root, is
//! nudged sideways once and left to swing for five seconds.

use nalgebra::Vector3;
use sway_conformance::{DT, Rig, SPACING, hanging_chain};
use sway_types::{BoneTransform, ChainSetting, PhysicsSettings};

fn tip_distance(rig: &Rig) -> f64 {
    let root = rig.position_of("joint_0").unwrap();
    let tip = rig.position_of("joint_3").unwrap();
    (tip - root).norm()
}

#[test]
fn hanging_chain_keeps_length_and_settles() {
    let settings = PhysicsSettings::default().iterations(8).master_damping(0.02);
    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    let length = 3.0 * SPACING;

    rig.step(DT);
    // One-unit step of the whole body, then hold still.
    rig.component = BoneTransform::from_translation(Vector3::new(1.0, 0.0, 0.0));

    let mut sway = Vec::with_capacity(300);
    for frame in 0..300 {
        rig.step(DT);
        let distance = tip_distance(&rig);
        assert!(
            (distance - length).abs() <= 0.01 * length,
            "frame {frame}: tip distance {distance}"
        );
        sway.push(rig.position_of("joint_3").unwrap().x);
    }

    let amplitude = |xs: &[f64]| xs.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    let early = amplitude(&sway[..60]);
    let late = amplitude(&sway[240..]);
    assert!(early > 0.1, "chain never swung: {early}");
    assert!(late < 0.5 * early, "oscillation did not decay: {early} -> {late}");

    let crossings = sway.windows(2).filter(|w| w[0] * w[1] < 0.0).count();
    assert!(crossings >= 4, "expected a pendulum swing, got {crossings} crossings");
}

#[test]
fn chain_at_rest_stays_at_rest() {
    let settings = PhysicsSettings::default().zero_gravity();
    let mut rig = Rig::new(hanging_chain(4), &[ChainSetting::new("joint_0")], &settings).unwrap();
    rig.run(120);

    for i in 0..4 {
        let p = rig.position_of(&format!("joint_{i}")).unwrap();
        assert!(
            (p - Vector3::new(0.0, 0.0, -SPACING * f64::from(i))).norm() < 1e-9,
            "joint_{i} drifted to {p}"
        );
    }
}

#[test]
fn gravity_sag_is_bounded_by_links() {
    let mut rig = Rig::new(
        hanging_chain(4),
        &[ChainSetting::new("joint_0")],
        &PhysicsSettings::default(),
    )
    .unwrap();
    rig.run(240);

    // Hanging straight down, stretched by less than a percent.
    let tip = rig.position_of("joint_3").unwrap();
    assert!(tip.x.abs() < 1e-9 && tip.y.abs() < 1e-9);
    assert!(tip.z <= -3.0 * SPACING + 1e-9);
    assert!(tip.z >= -3.0 * SPACING * 1.01);
}
