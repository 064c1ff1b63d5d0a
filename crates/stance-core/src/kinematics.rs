//! Closed-form leg kinematics.
//!
//! Each leg is an abduction joint about the body x axis followed by a
//! two-link sagittal chain (hip pitch, knee pitch). The hip frame sits at
//! the abduction axis with the body's orientation. At zero angles the leg
//! hangs straight down with the foot at `(0, -hip_sign * l_hip, -(l_up + l_low))`.
//!
//! ```text
//!   x0 = -(l_up sin(h) + l_low sin(h + k))
//!   z0 = -(l_up cos(h) + l_low cos(h + k))
//!   p  = Rx(a) * (x0, -hip_sign * l_hip, z0)
//! ```
//!
//! Inverse kinematics picks the knee-backward branch (`k <= 0`) with the
//! foot below the hip, and saturates unreachable targets at the workspace
//! boundary.

use nalgebra::{DMatrix, DVector, Matrix3, Matrix3x4, Vector3};
use tracing::debug;

use crate::Vector12;
use crate::config::{LinkLengths, RobotConfiguration};
use crate::leg::{DOF_PER_LEG, Leg};
use crate::math::{pseudo_inverse, square};

/// Singular values of a leg Jacobian below this are dropped when mapping
/// foot velocity to joint velocity.
pub const JACOBIAN_SIGMA_THRESHOLD: f64 = 1e-6;

/// Forward offset (m) of a swing foothold ahead of its nominal hip position.
///
/// Used by [`RobotConfiguration::swing_foothold`].
pub const FOOT_HOLD_OFFSET: f64 = 0.1;

/// Joint angles from inverse kinematics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IkSolution {
    /// (abduction, hip, knee) in radians.
    pub angles: Vector3<f64>,
    /// True when the target was outside the workspace and the solution was
    /// clamped to the boundary.
    pub saturated: bool,
}

/// The three joint angles of `leg` inside a 12-vector.
#[must_use]
pub fn leg_angles(q: &Vector12, leg: Leg) -> Vector3<f64> {
    q.fixed_rows::<DOF_PER_LEG>(leg.first_motor()).into_owned()
}

/// Joint axes of a leg expressed in its hip frame, one column per joint.
///
/// This is the angular part of the leg Jacobian: foot-link angular
/// velocity relative to the body equals `leg_angular_jacobian(q) * qdot`.
#[must_use]
pub fn leg_angular_jacobian(q: &Vector3<f64>) -> Matrix3<f64> {
    let (s, c) = q.x.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, c, c, //
        0.0, s, s,
    )
}

impl RobotConfiguration {
    /// Signed lateral offset of the thigh plane from the abduction axis.
    fn lateral_offset(&self, leg: Leg) -> f64 {
        -leg.hip_sign() * self.links.hip
    }

    /// Foot position in the hip frame of `leg`.
    #[must_use]
    pub fn joint_angles_to_foot_position_in_hip_frame(
        &self,
        q: &Vector3<f64>,
        leg: Leg,
    ) -> Vector3<f64> {
        let LinkLengths { upper, lower, .. } = self.links;
        let (ab, hip, knee) = (q.x, q.y, q.z);
        let y0 = self.lateral_offset(leg);

        let x0 = -(upper * hip.sin() + lower * (hip + knee).sin());
        let z0 = -(upper * hip.cos() + lower * (hip + knee).cos());

        let (s, c) = ab.sin_cos();
        Vector3::new(x0, c * y0 - s * z0, s * y0 + c * z0)
    }

    /// Forward kinematics of all four legs.
    ///
    /// Returns foot positions in the body frame, one column per leg.
    #[must_use]
    pub fn joint_angles_to_foot_position_in_base_frame(&self, q: &Vector12) -> Matrix3x4<f64> {
        let mut feet = self.hip_offsets();
        for leg in Leg::ALL {
            let p = self.joint_angles_to_foot_position_in_hip_frame(&leg_angles(q, leg), leg);
            let mut col = feet.column_mut(leg.index());
            col += p;
        }
        feet
    }

    /// Jacobian of the hip-frame foot position with respect to the leg's
    /// joint angles.
    ///
    /// Not guarded against singular configurations (fully stretched or
    /// folded leg); invert it through [`pseudo_inverse`].
    #[must_use]
    pub fn analytical_leg_jacobian(&self, q: &Vector3<f64>, leg: Leg) -> Matrix3<f64> {
        let LinkLengths { upper, lower, .. } = self.links;
        let (ab, hip, knee) = (q.x, q.y, q.z);
        let y0 = self.lateral_offset(leg);

        let (s_hk, c_hk) = (hip + knee).sin_cos();
        let x0 = -(upper * hip.sin() + lower * s_hk);
        let z0 = -(upper * hip.cos() + lower * c_hk);
        let (s, c) = ab.sin_cos();

        Matrix3::new(
            0.0,
            z0,
            -lower * c_hk,
            -s * y0 - c * z0,
            s * x0,
            -s * lower * s_hk,
            c * y0 - s * z0,
            -c * x0,
            c * lower * s_hk,
        )
    }

    /// Closed-form inverse kinematics in the hip frame.
    #[must_use]
    pub fn foot_position_in_hip_frame_to_joint_angles(
        &self,
        p: &Vector3<f64>,
        leg: Leg,
    ) -> IkSolution {
        let LinkLengths { upper, lower, .. } = self.links;
        let y0 = self.lateral_offset(leg);
        let mut saturated = false;

        // Knee from the hip-to-foot distance in the sagittal plane.
        let sagittal_sq = p.norm_squared() - square(y0);
        let cos_knee = (sagittal_sq - square(upper) - square(lower)) / (2.0 * upper * lower);
        if !(-1.0..=1.0).contains(&cos_knee) {
            saturated = true;
        }
        let knee = -cos_knee.clamp(-1.0, 1.0).acos();

        // Hip pitch: (x0, z0) = leg_len * (-sin, -cos)(hip + beta), aimed at
        // the target's sagittal point (x, -depth).
        let (s_k, c_k) = knee.sin_cos();
        let beta = (lower * s_k).atan2(upper + lower * c_k);
        let leg_len = (square(upper) + square(lower) + 2.0 * upper * lower * c_k)
            .max(0.0)
            .sqrt();
        let lateral_sq = square(p.y) + square(p.z);
        if lateral_sq < square(y0) {
            saturated = true;
        }
        let depth = (lateral_sq - square(y0)).max(0.0).sqrt();
        let swing = (-p.x).atan2(depth);
        let hip = swing - beta;

        // Abduction rotates (y0, z0) onto the target's (y, z) direction.
        let z0 = -leg_len * swing.cos();
        let ab = (y0 * p.z - z0 * p.y).atan2(y0 * p.y + z0 * p.z);

        if saturated {
            debug!(%leg, x = p.x, y = p.y, z = p.z, "foot target outside workspace, saturating");
        }

        IkSolution {
            angles: Vector3::new(ab, hip, knee),
            saturated,
        }
    }

    /// Inverse kinematics for a foot position given in the body frame.
    #[must_use]
    pub fn foot_position_to_joint_angles(&self, position: &Vector3<f64>, leg: Leg) -> Vector3<f64> {
        let in_hip = position - self.hip_offset(leg);
        self.foot_position_in_hip_frame_to_joint_angles(&in_hip, leg)
            .angles
    }

    /// Nominal touchdown point of a swing foot in the body frame: the
    /// default hip position moved forward by [`FOOT_HOLD_OFFSET`], at
    /// standing height.
    #[must_use]
    pub fn swing_foothold(&self, leg: Leg) -> Vector3<f64> {
        let hip = self.hip_positions_in_base_frame().column(leg.index()).into_owned();
        hip + Vector3::new(FOOT_HOLD_OFFSET, 0.0, -self.body_height)
    }

    /// Joint rates producing a desired foot velocity.
    ///
    /// Directions the leg cannot move in at a singular pose get zero rate.
    #[must_use]
    pub fn foot_velocity_to_joint_velocity(
        &self,
        q: &Vector3<f64>,
        v: &Vector3<f64>,
        leg: Leg,
    ) -> Vector3<f64> {
        let jacobian = self.analytical_leg_jacobian(q, leg);
        let jacobian = DMatrix::from_column_slice(3, 3, jacobian.as_slice());
        let pinv = pseudo_inverse(&jacobian, JACOBIAN_SIGMA_THRESHOLD);
        let qd = pinv * DVector::from_column_slice(v.as_slice());
        Vector3::new(qd[0], qd[1], qd[2])
    }

    /// Foot velocity in the hip frame produced by joint rates `qd`.
    #[must_use]
    pub fn joint_velocity_to_foot_velocity(
        &self,
        q: &Vector3<f64>,
        qd: &Vector3<f64>,
        leg: Leg,
    ) -> Vector3<f64> {
        self.analytical_leg_jacobian(q, leg) * qd
    }
}
