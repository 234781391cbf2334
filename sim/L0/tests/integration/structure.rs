//! Link topology and the XPBD distance solve.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use sway_chain::{
    DebugDrawData, DebugDrawFlags, DistanceConstraint, ParticleWeights,
    convert_stiffness_to_compliance,
};
use sway_conformance::{DT, Rig, SPACING};
use sway_types::{BoneTransform, ChainSetting, PhysicsSettings, SkeletonData};

const FREE: ParticleWeights<'static> = ParticleWeights {
    inv_mass: &[1.0, 1.0],
    fixed_blend: &[0.0, 0.0],
    dummy_mask: &[0.0, 0.0],
};

fn stretched_pair() -> Vec<Vector3<f64>> {
    vec![Vector3::zeros(), Vector3::new(0.0, 0.0, -12.0)]
}

#[test]
fn stiff_link_converges_between_free_particles() {
    for stiffness in [0.5, 0.75, 1.0] {
        let mut positions = stretched_pair();
        let mut link = DistanceConstraint::new(0, 1, 10.0, convert_stiffness_to_compliance(stiffness));
        for _ in 0..8 {
            link.solve(&mut positions, &FREE, DT);
        }
        let stretch = link.evaluate(&positions);
        assert!(stretch.abs() < 0.01 * 10.0, "stiffness {stiffness}: stretch {stretch}");
        // Equal masses meet in the middle.
        assert_relative_eq!((positions[0] + positions[1]) * 0.5, Vector3::new(0.0, 0.0, -6.0), epsilon = 1e-9);
    }
}

#[test]
fn pinned_end_and_compression_are_left_alone() {
    let pinned = ParticleWeights {
        fixed_blend: &[1.0, 0.0],
        ..FREE
    };
    let mut positions = stretched_pair();
    let mut link = DistanceConstraint::new(0, 1, 10.0, convert_stiffness_to_compliance(1.0));
    link.solve(&mut positions, &pinned, DT);
    assert_eq!(positions[0], Vector3::zeros());
    assert!(positions[1].z > -12.0);

    // Shorter than rest: nothing to do.
    let mut positions = vec![Vector3::zeros(), Vector3::new(0.0, 0.0, -8.0)];
    let mut link = DistanceConstraint::new(0, 1, 10.0, convert_stiffness_to_compliance(1.0));
    assert_relative_eq!(link.solve(&mut positions, &FREE, DT), 0.0);
    assert_eq!(positions[1], Vector3::new(0.0, 0.0, -8.0));
    assert_relative_eq!(link.lambda(), 0.0);
}

const RING_RANKS: usize = 6;
const RING_DEPTHS: usize = 4;
const RING_RADIUS: f64 = 12.0;

/// Six chains hanging in a ring around a pelvis. With six chains the
/// neighbour distance equals the ring radius.
fn skirt_ring() -> (SkeletonData, Vec<ChainSetting>) {
    let mut skeleton = SkeletonData::new();
    let pelvis = skeleton.add_bone("pelvis", None, BoneTransform::identity());
    let mut chains = Vec::with_capacity(RING_RANKS);
    for rank in 0..RING_RANKS {
        #[allow(clippy::cast_precision_loss)]
        let angle = std::f64::consts::TAU * rank as f64 / RING_RANKS as f64;
        let out = Vector3::new(angle.cos(), angle.sin(), 0.0) * RING_RADIUS;
        let mut parent = pelvis;
        for depth in 0..RING_DEPTHS {
            #[allow(clippy::cast_precision_loss)]
            let position = out - Vector3::z() * (SPACING * depth as f64);
            parent = skeleton.add_bone(
                format!("skirt_{rank}_{depth}"),
                Some(parent),
                BoneTransform::from_translation(position),
            );
        }
        chains.push(ChainSetting::new(format!("skirt_{rank}_0")));
    }
    (skeleton, chains)
}

#[test]
fn looped_ring_links_every_neighbour() {
    let (skeleton, chains) = skirt_ring();
    let mut settings = PhysicsSettings::cloth();
    settings.structure.loop_horizontal = true;
    let rig = Rig::new(skeleton, &chains, &settings).unwrap();

    let mut data = DebugDrawData::default();
    rig.solver
        .debug_draw(DebugDrawFlags::STRUCTURES | DebugDrawFlags::BENDS_AND_SHEARS, &mut data);
    let vertical = RING_RANKS * (RING_DEPTHS - 1);
    // Neighbours plus the closing link, at every depth.
    let horizontal = RING_RANKS * RING_DEPTHS;
    assert_eq!(data.count(DebugDrawFlags::STRUCTURES), vertical + horizontal);
    assert_eq!(
        data.count(DebugDrawFlags::BENDS_AND_SHEARS),
        2 * RING_RANKS * (RING_DEPTHS - 1)
    );
}

#[test]
fn looped_ring_holds_its_shape_under_gravity() {
    let (skeleton, chains) = skirt_ring();
    let mut settings = PhysicsSettings::cloth();
    settings.structure.loop_horizontal = true;
    let mut rig = Rig::new(skeleton, &chains, &settings).unwrap();
    rig.run(120);

    let mut data = DebugDrawData::default();
    rig.solver.debug_draw(DebugDrawFlags::STRUCTURES, &mut data);
    assert!(!data.segments.is_empty());
    for segment in &data.segments {
        let length = (segment.end - segment.start).norm();
        let rest = if (segment.end.z - segment.start.z).abs() > SPACING * 0.5 {
            SPACING
        } else {
            RING_RADIUS
        };
        assert!(
            (length - rest).abs() < 0.01 * rest,
            "link {:?} -> {:?} is {length} long, rest {rest}",
            segment.start,
            segment.end
        );
    }
}
