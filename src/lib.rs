//! Numerical inverse kinematics for serial chains, including redundant ones (more than six joints).
//!
//! The solver iterates on the end link pose error using a weighted singularity-robust
//! (damped least squares) inverse of the Jacobian. It stays well-behaved near kinematic
//! singularities and keeps joints away from their limits. On redundant chains the spare
//! degrees of freedom are used for secondary objectives that do not disturb the end link.
//!
//! # Features
//!
//! - Weighted SR-inverse with damping driven by manipulability.
//! - Joint limit avoidance by weighting (Chang and Dubey) and by a nullspace objective.
//! - Optional reference posture tracking in the nullspace.
//! - Joint velocity limits respected by scaling the whole step, so the direction is kept.
//! - Fixed-threshold or best-effort convergence; on failure the chain is restored as it was.
//! - Joint limit tables, where the limits of one joint depend on the angle of another.
//! - Any robot model implementing [`kinematic_traits::ForwardKinematics`] can be used,
//!   [`serial_arm::SerialArm`] is provided for chains of revolute joints.
//! - Solver configuration can be read from YAML (feature `allow_filesystem`).
//!
//! The solver logs through `tracing`. Per-iteration details can also be collected with an
//! [`observer::SolveObserver`].

pub mod kinematic_traits;
pub mod jacobian;
pub mod serial_arm;

pub mod joint;
pub mod kinematic_chain;
pub mod joint_limit_table;

pub mod rotation_log;
pub mod sr_inverse;
pub mod limit_weighting;
pub mod manipulability;
pub mod nullspace;
pub mod velocity_limits;

pub mod ik_config;
pub mod ik_error;
pub mod observer;
pub mod solver;

pub mod utils;

#[cfg(feature = "allow_filesystem")]
pub mod ik_config_from_file;
#[cfg(feature = "allow_filesystem")]
pub mod parameter_error;
