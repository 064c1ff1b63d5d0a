//! Body velocity setpoints from an external command channel.
//!
//! The transport (a message bus, a gamepad bridge, a network socket) owns
//! the delivery thread and calls [`VelocityCallback::on_message`] for every
//! inbound [`Twist`]. The control loop reads the latest value through
//! [`VelocityParamReceiver`] once per tick.
//!
//! # Example
//!
//! ```
//! use stance_teleop::prelude::*;
//!
//! let receiver = VelocityParamReceiver::new(DEFAULT_TOPIC);
//! let callback = receiver.callback();
//! std::thread::spawn(move || {
//!     callback.on_message(&Twist::new([0.4, 0.0, 0.0], [0.0, 0.0, 0.2]));
//! })
//! .join()
//! .unwrap();
//!
//! assert!((receiver.linear_velocity().x - 0.4).abs() < 1e-12);
//! ```

pub mod receiver;

pub use receiver::{
    DEFAULT_TOPIC, Twist, VelocityCallback, VelocityParamReceiver, VelocitySetpoint,
};

pub mod prelude {
    pub use crate::receiver::{
        DEFAULT_TOPIC, Twist, VelocityCallback, VelocityParamReceiver, VelocitySetpoint,
    };
}
