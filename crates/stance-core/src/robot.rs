//! Robot aggregate: owns the configuration and the actuator commands.
//!
//! The whole-body controller hands its output to [`Robot::set_cmd`] tagged
//! with a [`MotorMode`]; the hardware or simulation transport reads the
//! resulting [`MotorCommandBatch`] once per tick through [`Robot::cmd`].

use std::path::Path;

use nalgebra::DMatrix;
use tracing::debug;

use crate::command::{MotorCommand, MotorCommandBatch};
use crate::config::RobotConfiguration;
use crate::error::{CommandError, ConfigError};
use crate::leg::NUM_MOTORS;
use crate::mode::MotorMode;
use crate::{HybridCommandMatrix, Vector12};

/// Rows of a hybrid command matrix: (q, kp, qd, kd, tau).
pub const HYBRID_ROWS: usize = 5;

/// The robot-level aggregate.
#[derive(Debug, Clone)]
pub struct Robot {
    config: RobotConfiguration,
    cmds: MotorCommandBatch,
}

impl Robot {
    /// Take ownership of a loaded configuration. Commands start zeroed.
    #[must_use]
    pub fn new(config: RobotConfiguration) -> Self {
        Self {
            config,
            cmds: [MotorCommand::default(); NUM_MOTORS],
        }
    }

    /// Load the configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        RobotConfiguration::from_file(path).map(Self::new)
    }

    /// Reload the configuration in place. On error the current one is kept.
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.config.load(path)
    }

    #[must_use]
    pub const fn config(&self) -> &RobotConfiguration {
        &self.config
    }

    pub fn set_yaw_offset(&mut self, yaw_offset: f64) {
        self.config.set_yaw_offset(yaw_offset);
    }

    /// Current command snapshot.
    #[must_use]
    pub const fn cmd(&self) -> MotorCommandBatch {
        self.cmds
    }

    /// Overwrite all commands with a pre-assembled batch.
    ///
    /// Commands are left unchanged if any field of the batch is not finite.
    pub fn set_cmd_batch(&mut self, cmds: MotorCommandBatch) -> Result<(), CommandError> {
        if let Some(motor) = cmds.iter().position(|c| !c.is_finite()) {
            return Err(CommandError::NonFinite { motor });
        }
        self.cmds = cmds;
        Ok(())
    }

    /// Interpret `values` according to `mode` and overwrite all commands.
    ///
    /// `Position` and `Torque` take 12 values (a 12x1 or 1x12 matrix);
    /// `Hybrid` takes a 5x12 matrix whose rows are (q, kp, qd, kd, tau).
    /// Commands are left unchanged when validation fails.
    pub fn set_cmd(&mut self, values: &DMatrix<f64>, mode: MotorMode) -> Result<(), CommandError> {
        let (rows, cols) = values.shape();
        let shape_ok = match mode {
            MotorMode::Position | MotorMode::Torque => {
                (rows, cols) == (NUM_MOTORS, 1) || (rows, cols) == (1, NUM_MOTORS)
            }
            MotorMode::Hybrid => (rows, cols) == (HYBRID_ROWS, NUM_MOTORS),
        };
        if !shape_ok {
            let (expected_rows, expected_cols) = match mode {
                MotorMode::Position | MotorMode::Torque => (NUM_MOTORS, 1),
                MotorMode::Hybrid => (HYBRID_ROWS, NUM_MOTORS),
            };
            return Err(CommandError::ShapeMismatch {
                mode,
                expected_rows,
                expected_cols,
                rows,
                cols,
            });
        }

        // Column-major element order equals motor order for every accepted shape.
        let motor_of = |i: usize| if mode == MotorMode::Hybrid { i / HYBRID_ROWS } else { i };
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(CommandError::NonFinite { motor: motor_of(i) });
        }

        debug!(%mode, "applying actuator command batch");
        match mode {
            MotorMode::Position => {
                self.set_angle_cmd(&Vector12::from_iterator(values.iter().copied()));
            }
            MotorMode::Torque => {
                self.set_torque_cmd(&Vector12::from_iterator(values.iter().copied()));
            }
            MotorMode::Hybrid => {
                self.set_hybrid_cmd(&HybridCommandMatrix::from_iterator(values.iter().copied()));
            }
        }
        Ok(())
    }

    /// Position targets with the configured gains and no feed-forward torque.
    pub fn set_angle_cmd(&mut self, q: &Vector12) {
        let kps = self.config.kps();
        let kds = self.config.kds();
        for (i, cmd) in self.cmds.iter_mut().enumerate() {
            *cmd = MotorCommand::new(q[i], kps[i], 0.0, kds[i], 0.0);
        }
    }

    /// Feed-forward torques with zero gains and targets.
    pub fn set_torque_cmd(&mut self, tau: &Vector12) {
        for (cmd, &t) in self.cmds.iter_mut().zip(tau.iter()) {
            *cmd = MotorCommand::torque_only(t);
        }
    }

    /// Copy each column of a (q, kp, qd, kd, tau) matrix into its motor.
    pub fn set_hybrid_cmd(&mut self, values: &HybridCommandMatrix) {
        for (cmd, col) in self.cmds.iter_mut().zip(values.column_iter()) {
            *cmd = MotorCommand::new(col[0], col[1], col[2], col[3], col[4]);
        }
    }
}
