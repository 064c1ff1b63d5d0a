//! Robot configuration: the physical description of the quadruped.
//!
//! [`RobotConfigFile`] is the serde view of the TOML document.
//! [`RobotConfiguration`] is the validated runtime form consumed by the
//! kinematics and the command aggregator.

use std::path::Path;

use nalgebra::{Matrix3, Matrix3x4, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Vector12;
use crate::error::ConfigError;
use crate::leg::{Leg, NUM_MOTORS};
use crate::math::wrap_to_pi;
use crate::mode::LocomotionMode;

/// Largest asymmetry tolerated between off-diagonal inertia entries.
const INERTIA_SYMMETRY_TOL: f64 = 1e-9;

// ---------------------------------------------------------------------------
// RobotConfigFile
// ---------------------------------------------------------------------------

/// Link lengths table of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkLengthsConfig {
    pub hip: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

/// Raw configuration document.
///
/// Required fields are `Option` so a missing key is reported by name
/// instead of as a generic parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotConfigFile {
    pub body_mass: Option<f64>,
    pub body_height: Option<f64>,
    /// Integer code of the [`LocomotionMode`].
    #[serde(default)]
    pub control_mode: i64,
    #[serde(default)]
    pub is_sim: bool,
    #[serde(default)]
    pub com_offset: [f64; 3],
    /// 9 values (row-major) or 6 values `[ixx, iyy, izz, ixy, ixz, iyz]`.
    pub body_inertia: Option<Vec<f64>>,
    /// Hip joint position relative to the body origin, one row per leg.
    pub hip_offset: Option<[[f64; 3]; 4]>,
    /// Nominal foothold under each hip in the body frame, one row per leg.
    pub default_hip_position: Option<[[f64; 3]; 4]>,
    pub motor_kps: Option<Vec<f64>>,
    pub motor_kds: Option<Vec<f64>>,
    pub links: Option<LinkLengthsConfig>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingField(field.into()))
}

fn positive(value: f64, field: &str) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn finite(values: &[f64], field: &str) -> Result<(), ConfigError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "contains a non-finite value"))
    }
}

fn parse_inertia(values: &[f64]) -> Result<Matrix3<f64>, ConfigError> {
    const FIELD: &str = "body_inertia";
    finite(values, FIELD)?;
    let inertia = match *values {
        [ixx, iyy, izz, ixy, ixz, iyz] => {
            Matrix3::new(ixx, ixy, ixz, ixy, iyy, iyz, ixz, iyz, izz)
        }
        _ if values.len() == 9 => Matrix3::from_row_slice(values),
        _ => {
            return Err(ConfigError::invalid(
                FIELD,
                format!("expected 6 or 9 values, got {}", values.len()),
            ));
        }
    };
    if (inertia - inertia.transpose()).amax() > INERTIA_SYMMETRY_TOL {
        return Err(ConfigError::invalid(FIELD, "tensor is not symmetric"));
    }
    if (0..3).any(|i| inertia[(i, i)] <= 0.0) {
        return Err(ConfigError::invalid(FIELD, "diagonal entries must be positive"));
    }
    Ok(inertia)
}

fn parse_gains(values: &[f64], field: &str) -> Result<Vector12, ConfigError> {
    if values.len() != NUM_MOTORS {
        return Err(ConfigError::invalid(
            field,
            format!("expected {NUM_MOTORS} values, got {}", values.len()),
        ));
    }
    finite(values, field)?;
    if values.iter().any(|&g| g < 0.0) {
        return Err(ConfigError::invalid(field, "gains must be non-negative"));
    }
    Ok(Vector12::from_column_slice(values))
}

fn per_leg(rows: &[[f64; 3]; 4], field: &str) -> Result<Matrix3x4<f64>, ConfigError> {
    finite(rows.as_flattened(), field)?;
    Ok(Matrix3x4::from_fn(|r, c| rows[c][r]))
}

// ---------------------------------------------------------------------------
// LinkLengths
// ---------------------------------------------------------------------------

/// Leg link lengths in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkLengths {
    /// Lateral offset from the abduction axis to the thigh plane.
    pub hip: f64,
    /// Thigh length, hip pitch joint to knee.
    pub upper: f64,
    /// Shank length, knee to foot.
    pub lower: f64,
}

impl LinkLengths {
    /// Longest reachable hip-to-foot distance in the sagittal plane.
    #[must_use]
    pub fn max_reach(&self) -> f64 {
        self.upper + self.lower
    }

    /// Shortest hip-to-foot distance in the sagittal plane.
    #[must_use]
    pub fn min_reach(&self) -> f64 {
        (self.upper - self.lower).abs()
    }
}

// ---------------------------------------------------------------------------
// RobotConfiguration
// ---------------------------------------------------------------------------

/// Validated physical description of the robot.
///
/// Immutable after loading apart from the yaw offset and the active
/// locomotion mode.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotConfiguration {
    pub(crate) body_mass: f64,
    pub(crate) body_height: f64,
    pub(crate) links: LinkLengths,
    pub(crate) com_offset: Vector3<f64>,
    pub(crate) hip_offset: Matrix3x4<f64>,
    pub(crate) default_hip_position: Matrix3x4<f64>,
    pub(crate) body_inertia: Matrix3<f64>,
    pub(crate) motor_kps: Vector12,
    pub(crate) motor_kds: Vector12,
    pub(crate) control_mode: LocomotionMode,
    pub(crate) is_sim: bool,
    pub(crate) yaw_offset: f64,
}

impl TryFrom<RobotConfigFile> for RobotConfiguration {
    type Error = ConfigError;

    fn try_from(doc: RobotConfigFile) -> Result<Self, Self::Error> {
        let links = required(doc.links, "links")?;
        let links = LinkLengths {
            hip: required(links.hip, "links.hip")?,
            upper: positive(required(links.upper, "links.upper")?, "links.upper")?,
            lower: positive(required(links.lower, "links.lower")?, "links.lower")?,
        };
        if !links.hip.is_finite() || links.hip < 0.0 {
            return Err(ConfigError::invalid("links.hip", "must be non-negative"));
        }

        let body_height = required(doc.body_height, "body_height")?;
        if !body_height.is_finite() {
            return Err(ConfigError::invalid("body_height", "must be finite"));
        }

        finite(&doc.com_offset, "com_offset")?;

        let control_mode = LocomotionMode::from_code(doc.control_mode).ok_or_else(|| {
            ConfigError::invalid(
                "control_mode",
                format!("unknown mode code {}", doc.control_mode),
            )
        })?;

        Ok(Self {
            body_mass: positive(required(doc.body_mass, "body_mass")?, "body_mass")?,
            body_height,
            links,
            com_offset: Vector3::from(doc.com_offset),
            hip_offset: per_leg(&required(doc.hip_offset, "hip_offset")?, "hip_offset")?,
            default_hip_position: per_leg(
                &required(doc.default_hip_position, "default_hip_position")?,
                "default_hip_position",
            )?,
            body_inertia: parse_inertia(&required(doc.body_inertia, "body_inertia")?)?,
            motor_kps: parse_gains(&required(doc.motor_kps, "motor_kps")?, "motor_kps")?,
            motor_kds: parse_gains(&required(doc.motor_kds, "motor_kds")?, "motor_kds")?,
            control_mode,
            is_sim: doc.is_sim,
            yaw_offset: 0.0,
        })
    }
}

impl RobotConfiguration {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let doc: RobotConfigFile = toml::from_str(content)?;
        Self::try_from(doc)
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            mass = config.body_mass,
            mode = %config.control_mode,
            sim = config.is_sim,
            "loaded robot configuration"
        );
        Ok(config)
    }

    /// Replace every loaded field with the contents of `path`.
    ///
    /// On error `self` is left untouched. The yaw offset is a runtime
    /// calibration and survives the reload.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let mut loaded = Self::from_file(path)?;
        loaded.yaw_offset = self.yaw_offset;
        *self = loaded;
        Ok(())
    }

    /// Nominal foothold under each hip in the body frame (one column per leg).
    #[must_use]
    pub const fn hip_positions_in_base_frame(&self) -> Matrix3x4<f64> {
        self.default_hip_position
    }

    /// Hip joint positions relative to the body origin (one column per leg).
    #[must_use]
    pub const fn hip_offsets(&self) -> Matrix3x4<f64> {
        self.hip_offset
    }

    #[must_use]
    pub fn hip_offset(&self, leg: Leg) -> Vector3<f64> {
        self.hip_offset.column(leg.index()).into_owned()
    }

    /// Per-motor position gains (Nm/rad).
    #[must_use]
    pub const fn kps(&self) -> Vector12 {
        self.motor_kps
    }

    /// Per-motor velocity gains (Nm/(rad/s)).
    #[must_use]
    pub const fn kds(&self) -> Vector12 {
        self.motor_kds
    }

    #[must_use]
    pub const fn body_inertia(&self) -> Matrix3<f64> {
        self.body_inertia
    }

    #[must_use]
    pub const fn body_mass(&self) -> f64 {
        self.body_mass
    }

    #[must_use]
    pub const fn body_height(&self) -> f64 {
        self.body_height
    }

    #[must_use]
    pub const fn link_lengths(&self) -> LinkLengths {
        self.links
    }

    #[must_use]
    pub const fn com_offset(&self) -> Vector3<f64> {
        self.com_offset
    }

    #[must_use]
    pub const fn control_mode(&self) -> LocomotionMode {
        self.control_mode
    }

    pub fn set_control_mode(&mut self, mode: LocomotionMode) {
        if mode != self.control_mode {
            debug!(from = %self.control_mode, to = %mode, "locomotion mode changed");
        }
        self.control_mode = mode;
    }

    /// Whether this configuration drives a simulated robot.
    #[must_use]
    pub const fn is_sim(&self) -> bool {
        self.is_sim
    }

    #[must_use]
    pub const fn yaw_offset(&self) -> f64 {
        self.yaw_offset
    }

    /// Set the heading bias subtracted by [`heading`](Self::heading).
    pub fn set_yaw_offset(&mut self, yaw_offset: f64) {
        self.yaw_offset = yaw_offset;
    }

    /// Measured yaw corrected by the yaw offset, wrapped to `(-pi, pi]`.
    #[must_use]
    pub fn heading(&self, measured_yaw: f64) -> f64 {
        wrap_to_pi(measured_yaw - self.yaw_offset)
    }
}
