//! Latest-value velocity setpoint buffer.
//!
//! [`VelocityParamReceiver`] and its [`VelocityCallback`] share one
//! mutex-guarded [`VelocitySetpoint`]. A message replaces all six scalars in
//! one assignment under the lock, so a reader sees either the previous
//! message or the new one, never a mix. The lock is held only for a copy.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Channel name used when the deployment does not configure one.
pub const DEFAULT_TOPIC: &str = "/velocity_param";

// ---------------------------------------------------------------------------
// Twist
// ---------------------------------------------------------------------------

/// Wire message: body linear (m/s) and angular (rad/s) velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear: [f64; 3],
    pub angular: [f64; 3],
}

impl Twist {
    #[must_use]
    pub const fn new(linear: [f64; 3], angular: [f64; 3]) -> Self {
        Self { linear, angular }
    }
}

// ---------------------------------------------------------------------------
// VelocitySetpoint
// ---------------------------------------------------------------------------

/// Most recent body velocity command. Zero until the first message.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocitySetpoint {
    pub linear: Vector3<f64>,
    pub angular: Vector3<f64>,
}

impl From<&Twist> for VelocitySetpoint {
    fn from(msg: &Twist) -> Self {
        Self {
            linear: Vector3::from(msg.linear),
            angular: Vector3::from(msg.angular),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    setpoint: VelocitySetpoint,
    messages: u64,
}

type SharedState = Arc<Mutex<Shared>>;

// Every write is a single assignment of Copy data, so a poisoned lock still
// guards a complete value.
fn lock(state: &SharedState) -> MutexGuard<'_, Shared> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// VelocityCallback
// ---------------------------------------------------------------------------

/// Writer half handed to the transport's delivery context.
#[derive(Clone, Debug)]
pub struct VelocityCallback {
    state: SharedState,
}

impl VelocityCallback {
    /// Replace the stored setpoint with `msg`.
    pub fn on_message(&self, msg: &Twist) {
        let setpoint = VelocitySetpoint::from(msg);
        let mut shared = lock(&self.state);
        shared.setpoint = setpoint;
        shared.messages += 1;
    }
}

// ---------------------------------------------------------------------------
// VelocityParamReceiver
// ---------------------------------------------------------------------------

/// Reader half owned by the control loop.
#[derive(Debug)]
pub struct VelocityParamReceiver {
    topic: String,
    state: SharedState,
}

impl Default for VelocityParamReceiver {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC)
    }
}

impl VelocityParamReceiver {
    /// Subscribe to `topic`. The setpoint reads zero until a message arrives.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        info!(%topic, "subscribed to velocity commands");
        Self {
            topic,
            state: SharedState::default(),
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// A writer bound to this receiver. Clones share the same setpoint.
    #[must_use]
    pub fn callback(&self) -> VelocityCallback {
        VelocityCallback {
            state: Arc::clone(&self.state),
        }
    }

    /// Both vectors from the same message.
    #[must_use]
    pub fn setpoint(&self) -> VelocitySetpoint {
        lock(&self.state).setpoint
    }

    #[must_use]
    pub fn linear_velocity(&self) -> Vector3<f64> {
        self.setpoint().linear
    }

    #[must_use]
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.setpoint().angular
    }

    /// One component of the angular velocity.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= 3`.
    #[must_use]
    pub fn angular_velocity_axis(&self, axis: usize) -> f64 {
        assert!(axis < 3, "angular velocity axis must be 0, 1 or 2, got {axis}");
        self.angular_velocity()[axis]
    }

    /// Messages received since construction.
    #[must_use]
    pub fn message_count(&self) -> u64 {
        lock(&self.state).messages
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_before_first_message() {
        let rx = VelocityParamReceiver::default();
        assert_eq!(rx.topic(), DEFAULT_TOPIC);
        assert_eq!(rx.setpoint(), VelocitySetpoint::default());
        assert_eq!(rx.message_count(), 0);
        assert_relative_eq!(rx.angular_velocity_axis(2), 0.0);
    }

    #[test]
    fn latest_message_wins() {
        let rx = VelocityParamReceiver::new("/cmd");
        let cb = rx.callback();
        cb.on_message(&Twist::new([1.0, 0.0, 0.0], [0.0, 0.0, 0.5]));
        cb.on_message(&Twist::new([0.0, -0.3, 0.0], [0.1, 0.0, 0.0]));

        assert_relative_eq!(rx.linear_velocity(), Vector3::new(0.0, -0.3, 0.0));
        assert_relative_eq!(rx.angular_velocity(), Vector3::new(0.1, 0.0, 0.0));
        assert_relative_eq!(rx.angular_velocity_axis(0), 0.1);
        assert_eq!(rx.message_count(), 2);
    }

    #[test]
    fn cloned_callbacks_share_state() {
        let rx = VelocityParamReceiver::new("/cmd");
        let a = rx.callback();
        let b = a.clone();
        a.on_message(&Twist::new([1.0; 3], [0.0; 3]));
        b.on_message(&Twist::new([2.0; 3], [0.0; 3]));
        assert_relative_eq!(rx.linear_velocity(), Vector3::repeat(2.0));
        assert_eq!(rx.message_count(), 2);
    }

    #[test]
    #[should_panic(expected = "axis must be")]
    fn axis_out_of_range_panics() {
        let _ = VelocityParamReceiver::new("/cmd").angular_velocity_axis(3);
    }

    #[test]
    fn twist_from_toml() {
        let msg: Twist = toml::from_str("linear = [0.5, 0.0, 0.0]\nangular = [0.0, 0.0, -0.2]").unwrap();
        assert_eq!(msg, Twist::new([0.5, 0.0, 0.0], [0.0, 0.0, -0.2]));
    }
}
