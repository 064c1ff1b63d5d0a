//! Per-actuator command tuple.

use serde::{Deserialize, Serialize};

use crate::leg::NUM_MOTORS;

/// Impedance command for one actuator.
///
/// The actuator tracks `kp (position - q) + kd (velocity - qd) + torque`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorCommand {
    /// Target joint angle (rad).
    pub position: f64,
    /// Position gain (Nm/rad).
    pub kp: f64,
    /// Target joint velocity (rad/s).
    pub velocity: f64,
    /// Velocity gain (Nm/(rad/s)).
    pub kd: f64,
    /// Feed-forward torque (Nm).
    pub torque: f64,
}

/// One command per actuator, leg-major.
pub type MotorCommandBatch = [MotorCommand; NUM_MOTORS];

impl MotorCommand {
    #[must_use]
    pub const fn new(position: f64, kp: f64, velocity: f64, kd: f64, torque: f64) -> Self {
        Self {
            position,
            kp,
            velocity,
            kd,
            torque,
        }
    }

    /// Pure feed-forward torque with zero gains and targets.
    #[must_use]
    pub const fn torque_only(torque: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, torque)
    }

    /// Joint torque this command produces at measured angle `q` and rate `qd`.
    #[must_use]
    pub fn output_torque(&self, q: f64, qd: f64) -> f64 {
        self.kd.mul_add(
            self.velocity - qd,
            self.kp.mul_add(self.position - q, self.torque),
        )
    }

    /// Whether every field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.position, self.kp, self.velocity, self.kd, self.torque]
            .iter()
            .all(|v| v.is_finite())
    }
}
