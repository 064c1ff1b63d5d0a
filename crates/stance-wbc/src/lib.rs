//! Contact-constraint layer of a quadruped whole-body controller.
//!
//! 1. [`kinematics`] builds the floating-base Jacobian and drift term of a
//!    foot from joint state and base orientation.
//! 2. [`contact`] turns that snapshot into the per-contact matrices
//!    (`Jc`, `JcDotQdot`, `Uf`, `ieq_vec`) a QP-based controller consumes.
//!
//! The solver itself lives outside this crate; it reads the matrices through
//! [`ContactSpec`] accessors and returns joint torques, which map back to
//! actuators through [`stance_core::robot::Robot::set_cmd`].

pub mod contact;
pub mod kinematics;

pub use contact::{
    AnisotropicContact, ContactKind, ContactModel, ContactSpec, PointContact, SurfaceContact,
};
pub use kinematics::{
    BASE_DOF, BaseState, ContactKinematics, NUM_QDOT, SPATIAL_DIM, foot_contact_kinematics,
    joint_torques_from_contact_force,
};
