//! Leg indexing and left/right mirroring.

use std::fmt;

/// Number of legs.
pub const NUM_LEGS: usize = 4;
/// Actuated joints per leg: abduction, hip, knee.
pub const DOF_PER_LEG: usize = 3;
/// Total number of actuators.
pub const NUM_MOTORS: usize = NUM_LEGS * DOF_PER_LEG;

/// One of the four legs, in leg-major actuator order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Leg {
    FrontRight = 0,
    FrontLeft = 1,
    RearRight = 2,
    RearLeft = 3,
}

impl Leg {
    pub const ALL: [Self; NUM_LEGS] = [
        Self::FrontRight,
        Self::FrontLeft,
        Self::RearRight,
        Self::RearLeft,
    ];

    /// Leg for a raw index in `0..4`.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// `+1` for right-side legs, `-1` for left-side legs.
    #[must_use]
    pub const fn hip_sign(self) -> f64 {
        match self {
            Self::FrontRight | Self::RearRight => 1.0,
            Self::FrontLeft | Self::RearLeft => -1.0,
        }
    }

    /// Index of this leg's first actuator (abduction).
    #[must_use]
    pub const fn first_motor(self) -> usize {
        self.index() * DOF_PER_LEG
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FrontRight => "FR",
            Self::FrontLeft => "FL",
            Self::RearRight => "RR",
            Self::RearLeft => "RL",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
