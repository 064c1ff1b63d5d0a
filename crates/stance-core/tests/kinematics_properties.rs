//! Property checks on the closed-form leg kinematics, sampled with a
//! seeded RNG over the interior of the workspace.
//!
//! 1. Inverse kinematics undoes forward kinematics
//! 2. The analytical Jacobian matches central finite differences
//! 3. Foot/joint velocity maps are mutually inverse off singularities

use std::path::Path;

use nalgebra::{Matrix3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stance_core::prelude::*;

const SAMPLES: usize = 500;
const FD_STEP: f64 = 1e-6;

fn a1() -> RobotConfiguration {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs").join("a1.toml");
    RobotConfiguration::from_file(path).unwrap()
}

/// Joint angles strictly inside the knee-backward, foot-below-hip branch.
fn sample_leg_angles(rng: &mut ChaCha8Rng) -> Vector3<f64> {
    Vector3::new(
        rng.gen_range(-0.6..0.6),
        rng.gen_range(0.0..1.2),
        rng.gen_range(-2.4..-0.6),
    )
}

fn sample_joint_angles(rng: &mut ChaCha8Rng) -> Vector12 {
    let mut q = Vector12::zeros();
    for leg in Leg::ALL {
        q.fixed_rows_mut::<3>(leg.first_motor())
            .copy_from(&sample_leg_angles(rng));
    }
    q
}

#[test]
fn inverse_kinematics_round_trips_forward_kinematics() {
    let cfg = a1();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..SAMPLES {
        let q = sample_joint_angles(&mut rng);
        let feet = cfg.joint_angles_to_foot_position_in_base_frame(&q);
        for leg in Leg::ALL {
            let foot = feet.column(leg.index()).into_owned();
            let solved = cfg.foot_position_to_joint_angles(&foot, leg);
            let expected = q.fixed_rows::<3>(leg.first_motor()).into_owned();
            assert!(
                (solved - expected).amax() < 1e-8,
                "leg {leg}: expected {expected:?}, got {solved:?}"
            );
        }
    }
}

#[test]
fn analytical_jacobian_matches_finite_differences() {
    let cfg = a1();
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for _ in 0..SAMPLES {
        let q = sample_joint_angles(&mut rng);
        for leg in Leg::ALL {
            let mut numeric = Matrix3::zeros();
            for j in 0..3 {
                let motor = leg.first_motor() + j;
                let mut plus = q;
                let mut minus = q;
                plus[motor] += FD_STEP;
                minus[motor] -= FD_STEP;
                let diff = cfg.joint_angles_to_foot_position_in_base_frame(&plus)
                    - cfg.joint_angles_to_foot_position_in_base_frame(&minus);
                numeric.set_column(j, &(diff.column(leg.index()) / (2.0 * FD_STEP)));
            }

            let leg_q = q.fixed_rows::<3>(leg.first_motor()).into_owned();
            let analytic = cfg.analytical_leg_jacobian(&leg_q, leg);
            assert!(
                (analytic - numeric).amax() < 1e-7,
                "leg {leg}: analytic {analytic} numeric {numeric}"
            );
        }
    }
}

#[test]
fn velocity_maps_invert_each_other() {
    let cfg = a1();
    let mut rng = ChaCha8Rng::seed_from_u64(23);

    for _ in 0..SAMPLES {
        let q = sample_leg_angles(&mut rng);
        let qd = Vector3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
        );
        for leg in Leg::ALL {
            let v = cfg.joint_velocity_to_foot_velocity(&q, &qd, leg);
            let back = cfg.foot_velocity_to_joint_velocity(&q, &v, leg);
            assert!((back - qd).amax() < 1e-6, "leg {leg}: {back:?} vs {qd:?}");
        }
    }
}

#[test]
fn unreachable_targets_saturate_on_the_boundary() {
    let cfg = a1();
    let links = cfg.link_lengths();
    let mut rng = ChaCha8Rng::seed_from_u64(31);

    for _ in 0..SAMPLES {
        let direction = Vector3::new(
            rng.gen_range(-0.8..0.8),
            rng.gen_range(-0.3..0.3),
            -1.0,
        )
        .normalize();
        let target = direction * rng.gen_range(0.5..2.0);
        for leg in Leg::ALL {
            let sol = cfg.foot_position_in_hip_frame_to_joint_angles(&target, leg);
            assert!(sol.saturated);
            assert!(sol.angles.iter().all(|a| a.is_finite()));
            let reached = cfg.joint_angles_to_foot_position_in_hip_frame(&sol.angles, leg);

            // Leg-plane coordinates (x, depth below the abduction axis).
            let depth = |p: &Vector3<f64>| (p.y * p.y + p.z * p.z - links.hip * links.hip).sqrt();
            let (xt, dt) = (target.x, depth(&target));
            let (xr, dr) = (reached.x, depth(&reached));
            assert!(
                (xr * dt - dr * xt).abs() < 1e-9,
                "leg {leg}: reached ({xr}, {dr}) off the ray to ({xt}, {dt})"
            );
            assert!(xr * xt >= 0.0 && dr > 0.0);
            assert!((xr.hypot(dr) - links.max_reach()).abs() < 1e-9);
            // Same abduction plane as the target.
            assert!((reached.y * target.z - reached.z * target.y).abs() < 1e-9);
        }
    }
}
