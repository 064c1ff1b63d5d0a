//! Kinematic core of a quadruped whole-body controller.
//!
//! - [`config`]: validated physical description loaded from TOML
//! - [`kinematics`]: closed-form forward/inverse kinematics and leg Jacobians
//! - [`math`]: near-equality predicates and a truncated pseudo-inverse
//! - [`robot`]: the aggregate that turns solver output into 12 motor commands
//!
//! # Example
//!
//! ```no_run
//! use stance_core::prelude::*;
//!
//! let mut robot = Robot::from_file("configs/a1.toml").unwrap();
//! let q = robot
//!     .config()
//!     .foot_position_to_joint_angles(&nalgebra::Vector3::new(0.18, -0.13, -0.3), Leg::FrontRight);
//! # let _ = q;
//! robot.set_angle_cmd(&Vector12::zeros());
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod kinematics;
pub mod leg;
pub mod math;
pub mod mode;
pub mod robot;

/// One value per actuator.
pub type Vector12 = nalgebra::SVector<f64, { leg::NUM_MOTORS }>;

/// Per-actuator (q, kp, qd, kd, tau) columns.
pub type HybridCommandMatrix = nalgebra::SMatrix<f64, { robot::HYBRID_ROWS }, { leg::NUM_MOTORS }>;

pub mod prelude {
    pub use crate::command::{MotorCommand, MotorCommandBatch};
    pub use crate::config::{LinkLengths, RobotConfiguration};
    pub use crate::error::{CommandError, ConfigError, StanceError};
    pub use crate::kinematics::IkSolution;
    pub use crate::leg::{DOF_PER_LEG, Leg, NUM_LEGS, NUM_MOTORS};
    pub use crate::mode::{LocomotionMode, MotorMode};
    pub use crate::robot::Robot;
    pub use crate::{HybridCommandMatrix, Vector12};
}
