//! Floating-base kinematics of a foot contact point.
//!
//! Generalized velocity layout (18 entries):
//!
//! ```text
//! nu = [omega_base(3), v_base(3), qdot(12)]
//! ```
//!
//! with base angular and linear velocity in the world frame. A contact
//! snapshot stacks the spatial Jacobian rows as `[angular(3); linear(3)]`,
//! matching the `[tau; f]` ordering of the contact wrench.

use nalgebra::{DMatrix, DVector, Matrix3, UnitQuaternion, Vector3};
use stance_core::Vector12;
use stance_core::config::RobotConfiguration;
use stance_core::kinematics::{leg_angles, leg_angular_jacobian};
use stance_core::leg::{DOF_PER_LEG, Leg, NUM_MOTORS};

/// Floating-base degrees of freedom.
pub const BASE_DOF: usize = 6;
/// Length of the generalized velocity vector.
pub const NUM_QDOT: usize = BASE_DOF + NUM_MOTORS;
/// Rows of a spatial Jacobian.
pub const SPATIAL_DIM: usize = 6;

/// Step used for the directional derivative of the leg Jacobian.
const JDOT_STEP: f64 = 1e-6;

/// Base orientation and world-frame angular velocity.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseState {
    pub orientation: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
}

impl Default for BaseState {
    fn default() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

/// Spatial Jacobian and drift acceleration of one contact frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactKinematics {
    /// `6 x n_qdot`, angular rows first.
    pub jacobian: DMatrix<f64>,
    /// `J_dot * nu`, angular entries first.
    pub jdot_qdot: DVector<f64>,
}

impl ContactKinematics {
    #[must_use]
    pub fn zeros(n_qdot: usize) -> Self {
        Self {
            jacobian: DMatrix::zeros(SPATIAL_DIM, n_qdot),
            jdot_qdot: DVector::zeros(SPATIAL_DIM),
        }
    }

    /// Number of generalized velocities.
    #[must_use]
    pub fn n_qdot(&self) -> usize {
        self.jacobian.ncols()
    }
}

/// Contact kinematics of `leg`'s foot.
///
/// `q` and `qdot` are the 12 joint angles and rates.
#[must_use]
pub fn foot_contact_kinematics(
    config: &RobotConfiguration,
    base: &BaseState,
    q: &Vector12,
    qdot: &Vector12,
    leg: Leg,
) -> ContactKinematics {
    let rot = base.orientation.to_rotation_matrix().into_inner();
    let omega = base.angular_velocity;
    let q_leg = leg_angles(q, leg);
    let qd_leg = leg_angles(qdot, leg);
    let col = BASE_DOF + leg.first_motor();

    let foot_body =
        config.hip_offset(leg) + config.joint_angles_to_foot_position_in_hip_frame(&q_leg, leg);
    let r = rot * foot_body;
    let j_lin = rot * config.analytical_leg_jacobian(&q_leg, leg);
    let j_ang = rot * leg_angular_jacobian(&q_leg);

    let mut kin = ContactKinematics::zeros(NUM_QDOT);
    {
        let j = &mut kin.jacobian;
        j.fixed_view_mut::<3, 3>(0, 0).copy_from(&Matrix3::identity());
        j.fixed_view_mut::<3, DOF_PER_LEG>(0, col).copy_from(&j_ang);
        j.fixed_view_mut::<3, 3>(3, 0).copy_from(&(-r.cross_matrix()));
        j.fixed_view_mut::<3, 3>(3, 3).copy_from(&Matrix3::identity());
        j.fixed_view_mut::<3, DOF_PER_LEG>(3, col).copy_from(&j_lin);
    }

    // Directional derivative of the leg Jacobian along qd_leg.
    let plus = q_leg + qd_leg * JDOT_STEP;
    let minus = q_leg - qd_leg * JDOT_STEP;
    let jdot_qd = (config.analytical_leg_jacobian(&plus, leg)
        - config.analytical_leg_jacobian(&minus, leg))
        * qd_leg
        / (2.0 * JDOT_STEP);

    let (s, c) = q_leg.x.sin_cos();
    let jdot_ang_qd = Vector3::new(0.0, -s, c) * (qd_leg.x * (qd_leg.y + qd_leg.z));

    let v_rel = j_lin * qd_leg;
    let w_rel = j_ang * qd_leg;
    let angular = omega.cross(&w_rel) + rot * jdot_ang_qd;
    let linear = omega.cross(&omega.cross(&r)) + 2.0 * omega.cross(&v_rel) + rot * jdot_qd;
    kin.jdot_qdot.fixed_rows_mut::<3>(0).copy_from(&angular);
    kin.jdot_qdot.fixed_rows_mut::<3>(3).copy_from(&linear);
    kin
}

/// Joint torques that hold a contact force on the ground.
///
/// `force` is the reaction the ground exerts on the robot, expressed in the
/// same rows as `jc` (the linear or full spatial contact Jacobian, with
/// joint columns after the first [`BASE_DOF`]). In static equilibrium the
/// actuators supply `tau = -J_joints^T * force`.
///
/// # Panics
///
/// Panics if `jc` does not have [`NUM_QDOT`] columns or `force` does not
/// match its row count.
#[must_use]
pub fn joint_torques_from_contact_force(jc: &DMatrix<f64>, force: &DVector<f64>) -> Vector12 {
    assert_eq!(jc.ncols(), NUM_QDOT, "contact Jacobian must span {NUM_QDOT} velocities");
    assert_eq!(jc.nrows(), force.len(), "force must match contact dimension");
    let joints = jc.columns(BASE_DOF, NUM_MOTORS);
    let tau = -(joints.transpose() * force);
    Vector12::from_column_slice(tau.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn a1() -> RobotConfiguration {
        RobotConfiguration::from_toml_str(include_str!("../../stance-core/configs/a1.toml"))
            .unwrap()
    }

    fn standing_q() -> Vector12 {
        Vector12::from_fn(|i, _| match i % 3 {
            0 => 0.0,
            1 => 0.7,
            _ => -1.4,
        })
    }

    #[test]
    fn identity_base_linear_rows_match_leg_jacobian() {
        let cfg = a1();
        let q = standing_q();
        let kin =
            foot_contact_kinematics(&cfg, &BaseState::default(), &q, &Vector12::zeros(), Leg::RearLeft);
        assert_eq!(kin.jacobian.shape(), (SPATIAL_DIM, NUM_QDOT));

        let expected = cfg.analytical_leg_jacobian(&leg_angles(&q, Leg::RearLeft), Leg::RearLeft);
        let block = kin.jacobian.fixed_view::<3, 3>(3, BASE_DOF + 9).into_owned();
        assert_relative_eq!(block, expected, epsilon = 1e-12);

        // Other legs' joints do not move this foot.
        assert!(kin.jacobian.columns(BASE_DOF, 9).iter().all(|&v| v == 0.0));
        // At rest the drift term vanishes.
        assert!(kin.jdot_qdot.iter().all(|&v| v.abs() < 1e-12));
    }

    #[test]
    fn base_translation_moves_foot_one_to_one() {
        let cfg = a1();
        let kin = foot_contact_kinematics(
            &cfg,
            &BaseState::default(),
            &standing_q(),
            &Vector12::zeros(),
            Leg::FrontRight,
        );
        let block = kin.jacobian.fixed_view::<3, 3>(3, 3).into_owned();
        assert_relative_eq!(block, Matrix3::identity());
        let angular_base = kin.jacobian.fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(angular_base, Matrix3::identity());
    }

    #[test]
    fn straight_leg_vertical_force_needs_no_hip_pitch_torque() {
        let cfg = a1();
        let kin = foot_contact_kinematics(
            &cfg,
            &BaseState::default(),
            &Vector12::zeros(),
            &Vector12::zeros(),
            Leg::FrontRight,
        );
        let jc = kin.jacobian.rows(3, 3).into_owned();
        let tau = joint_torques_from_contact_force(&jc, &DVector::from_vec(vec![0.0, 0.0, 30.0]));
        assert_relative_eq!(tau[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(tau[2], 0.0, epsilon = 1e-12);
        // The lateral hip offset still loads the abduction joint.
        assert!(tau[0].abs() > 1.0);
        assert!(tau.iter().skip(3).all(|&t| t == 0.0));
    }

    #[test]
    fn bent_leg_vertical_force_loads_knee() {
        let cfg = a1();
        let kin = foot_contact_kinematics(
            &cfg,
            &BaseState::default(),
            &standing_q(),
            &Vector12::zeros(),
            Leg::FrontLeft,
        );
        let jc = kin.jacobian.rows(3, 3).into_owned();
        let force = DVector::from_vec(vec![0.0, 0.0, 30.0]);
        let tau = joint_torques_from_contact_force(&jc, &force);
        let j_leg = cfg.analytical_leg_jacobian(&Vector3::new(0.0, 0.7, -1.4), Leg::FrontLeft);
        let expected = -(j_leg.transpose() * Vector3::new(0.0, 0.0, 30.0));
        assert_relative_eq!(tau.fixed_rows::<3>(3).into_owned(), expected, epsilon = 1e-12);
        assert!(tau[5].abs() > 1.0, "knee torque should be nonzero");
    }
}
