//! Control-mode enumerations and their labels.

use std::fmt;

// ---------------------------------------------------------------------------
// LocomotionMode
// ---------------------------------------------------------------------------

/// High-level locomotion mode selected by the configuration document.
///
/// Encoded as an integer `control_mode` in the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LocomotionMode {
    /// Track a commanded body velocity.
    #[default]
    Velocity,
    /// Track a commanded body position.
    Position,
    /// Statically stable walking gait.
    Walk,
    /// Trot with whole-body force control.
    AdvancedTrot,
}

impl LocomotionMode {
    /// All modes, ordered by their integer code.
    pub const ALL: [Self; 4] = [Self::Velocity, Self::Position, Self::Walk, Self::AdvancedTrot];

    /// Look up a mode from its document code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Integer code used in the configuration document.
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Velocity => "velocity",
            Self::Position => "position",
            Self::Walk => "walk",
            Self::AdvancedTrot => "advanced_trot",
        }
    }
}

impl fmt::Display for LocomotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// MotorMode
// ---------------------------------------------------------------------------

/// How a batch of values handed to the command aggregator is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotorMode {
    /// 12 joint angle targets, gains from the configuration.
    Position,
    /// 12 feed-forward torques, zero gains.
    Torque,
    /// A 5x12 matrix of per-motor (q, kp, qd, kd, tau).
    Hybrid,
}

impl MotorMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Torque => "torque",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MotorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
