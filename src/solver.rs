//! Iterative inverse kinematics for (possibly redundant) serial chains.
//!
//! Every iteration evaluates the pose error of the end link, and if it is not yet small
//! enough, computes the joint step
//!
//! dq = J# [dp; w] + N u_avoid + N u_ref
//!
//! where J# is the weighted singularity-robust inverse (weights keep joints away from
//! their limits, damping grows near singularities), N = I - J# J is the nullspace
//! projector, and u_avoid, u_ref are the optional secondary objectives. The step is
//! scaled to respect the joint velocity limits, applied with the step gain and clamped
//! to the joint position limits.
//!
//! A solve either converges, leaving the chain at the solution, or fails, leaving the
//! chain exactly as it was before the call.
//! ```
//! use std::sync::Arc;
//! use nalgebra::Vector3;
//! use rs_jointpath_ik::joint::Joint;
//! use rs_jointpath_ik::kinematic_chain::KinematicChain;
//! use rs_jointpath_ik::nullspace::Objectives;
//! use rs_jointpath_ik::serial_arm::SerialArm;
//! use rs_jointpath_ik::solver::IkSolver;
//!
//! let joints = (0..7)
//!     .map(|i| Joint::new(&format!("joint_{}", i + 1), i, -2.9, 2.9))
//!     .collect();
//! let mut chain = KinematicChain::new(Arc::new(SerialArm::seven_axis()), joints).unwrap();
//! chain.set_angles(&[0.0, 0.4, 0.0, -1.2, 0.0, 0.8, 0.0]).unwrap();
//!
//! // Move the end link 5 cm along X, keeping the orientation
//! let target_position = chain.end_pose().translation.vector + Vector3::new(0.05, 0.0, 0.0);
//! let target_rotation = *chain.end_pose().rotation.to_rotation_matrix().matrix();
//!
//! let solver = IkSolver::default();
//! let report = solver.solve(&mut chain, &target_position, &target_rotation, &Objectives::avoiding_limits(0.001));
//! assert!(report.is_ok());
//! ```

use nalgebra::{DVector, Matrix3, Vector3};
use tracing::{debug, info, warn};

use crate::ik_config::{Convergence, IkConfig};
use crate::ik_error::IkError;
use crate::jacobian::Jacobian;
use crate::kinematic_chain::KinematicChain;
use crate::kinematic_traits::Pose;
use crate::limit_weighting::update_weights;
use crate::manipulability::ManipulabilityDamper;
use crate::nullspace::{compose, Objectives};
use crate::observer::{IterationTrace, LimitViolation, SolveObserver};
use crate::rotation_log::omega_from_rotation;
use crate::velocity_limits::saturate;

/// Outcome of a successful solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkReport {
    /// Number of joint steps taken before the convergence criterion was met.
    pub iterations: usize,

    /// Squared norm of the remaining position error.
    pub position_error: f64,

    /// Squared norm of the remaining rotation error.
    pub rotation_error: f64,
}

#[derive(Debug, Clone, Default)]
pub struct IkSolver {
    config: IkConfig,
}

impl IkSolver {
    pub fn new(config: IkConfig) -> Self {
        IkSolver { config }
    }

    pub fn config(&self) -> &IkConfig {
        &self.config
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    /// Converge when the position error is below `position` and rotation error below `rotation`.
    pub fn set_convergence_thresholds(&mut self, position: f64, rotation: f64) {
        self.config.convergence = Convergence::Threshold { position, rotation };
    }

    /// Converge when the error stops improving by more than `tolerance` (squared).
    /// Replaces the position and rotation thresholds.
    pub fn set_best_effort_threshold(&mut self, tolerance: f64) {
        self.config.convergence = Convergence::BestEffort { tolerance };
    }

    pub fn set_sr_gain(&mut self, sr_gain: f64) {
        self.config.sr_gain = sr_gain;
    }

    pub fn set_manipulability_limit(&mut self, limit: f64) {
        self.config.manipulability_limit = limit;
    }

    pub fn set_manipulability_gain(&mut self, gain: f64) {
        self.config.manipulability_gain = gain;
    }

    /// Moves the end link of the chain to the target position and rotation (world frame).
    pub fn solve(
        &self,
        chain: &mut KinematicChain,
        target_position: &Vector3<f64>,
        target_rotation: &Matrix3<f64>,
        objectives: &Objectives,
    ) -> Result<IkReport, IkError> {
        self.solve_observed(chain, target_position, target_rotation, objectives, &mut ())
    }

    /// Same as [`IkSolver::solve`], with the target given as a pose.
    pub fn solve_pose(&self, chain: &mut KinematicChain, target: &Pose, objectives: &Objectives) -> Result<IkReport, IkError> {
        let rotation = *target.rotation.to_rotation_matrix().matrix();
        self.solve(chain, &target.translation.vector, &rotation, objectives)
    }

    /// Same as [`IkSolver::solve`], reporting every iteration and every joint limit
    /// violation to the observer.
    pub fn solve_observed(
        &self,
        chain: &mut KinematicChain,
        target_position: &Vector3<f64>,
        target_rotation: &Matrix3<f64>,
        objectives: &Objectives,
        observer: &mut dyn SolveObserver,
    ) -> Result<IkReport, IkError> {
        self.config.validate()?;
        if chain.joint_count() == 0 {
            return Err(IkError::DegenerateChain);
        }
        if let Some(reference) = objectives.tracks_reference() {
            let expected = chain.joints().iter().map(|j| j.id + 1).max().unwrap_or(0);
            if reference.len() < expected {
                return Err(IkError::DimensionMismatch { expected, found: reference.len() });
            }
        }

        let initial: Vec<(f64, f64)> = chain.joints().iter().map(|j| (j.angle, j.avoidance_cost())).collect();
        chain.reset_avoidance_costs();

        let result = self.iterate(chain, target_position, target_rotation, objectives, observer);
        if result.is_err() {
            for (joint, (q, cost)) in chain.joints_mut().iter_mut().zip(initial) {
                joint.angle = q;
                joint.avoidance_cost = cost;
            }
            chain.forward_kinematics();
        }
        result
    }

    fn iterate(
        &self,
        chain: &mut KinematicChain,
        target_position: &Vector3<f64>,
        target_rotation: &Matrix3<f64>,
        objectives: &Objectives,
        observer: &mut dyn SolveObserver,
    ) -> Result<IkReport, IkError> {
        let mut previous_error = None;

        for iteration in 0..self.config.max_iterations {
            let (dp, omega) = pose_error(chain.end_pose(), target_position, target_rotation);
            let dp = clip(dp, self.config.max_position_step);
            let omega = clip(omega, self.config.max_rotation_step);
            let (position_error, rotation_error) = (dp.dot(&dp), omega.dot(&omega));

            debug!(iteration, position_error, rotation_error, "ik iteration");
            let mut trace = IterationTrace::new(iteration, dp, omega);

            if self.converged(position_error, rotation_error, &mut previous_error) {
                observer.iteration(&trace);
                return Ok(IkReport { iterations: iteration, position_error, rotation_error });
            }

            let step = self.step(chain, &dp, &omega, objectives, iteration, &mut trace, observer);
            observer.iteration(&trace);
            step?;
        }

        let (dp, omega) = pose_error(chain.end_pose(), target_position, target_rotation);
        let (position_error, rotation_error) = (dp.dot(&dp), omega.dot(&omega));
        info!(iterations = self.config.max_iterations, position_error, rotation_error, "ik not converged");
        Err(IkError::NotConverged { iterations: self.config.max_iterations, position_error, rotation_error })
    }

    fn converged(&self, position_error: f64, rotation_error: f64, previous_error: &mut Option<f64>) -> bool {
        match self.config.convergence {
            Convergence::Threshold { position, rotation } => {
                position_error < position * position && rotation_error < rotation * rotation
            }
            Convergence::BestEffort { tolerance } => {
                // The first iteration has nothing to compare with and never converges here.
                let error = position_error + rotation_error;
                let stagnated = previous_error.is_some_and(|previous| (error - previous).abs() < tolerance * tolerance);
                *previous_error = Some(error);
                stagnated
            }
        }
    }

    /// Computes and applies one joint step, then refreshes the end link pose.
    #[allow(clippy::too_many_arguments)]
    fn step(
        &self,
        chain: &mut KinematicChain,
        dp: &Vector3<f64>,
        omega: &Vector3<f64>,
        objectives: &Objectives,
        iteration: usize,
        trace: &mut IterationTrace,
        observer: &mut dyn SolveObserver,
    ) -> Result<(), IkError> {
        let numerical_failure = IkError::NumericalFailure { iteration };

        let weights = update_weights(chain.joints_mut());
        let matrix = chain.jacobian();
        let damper = ManipulabilityDamper::new(self.config.manipulability_limit, self.config.manipulability_gain);
        let (manipulability, damping) = damper.evaluate(&matrix);
        let damping = self.config.sr_gain * damping;
        debug!(manipulability, damping, "sr-inverse");
        trace.manipulability = Some(manipulability);
        trace.damping = Some(damping);
        trace.weights = Some(weights.clone());

        let jacobian = Jacobian::new(matrix, &weights, damping).map_err(|e| {
            warn!(iteration, damping, "{}", e);
            numerical_failure.clone()
        })?;

        let v = DVector::from_iterator(6, dp.iter().chain(omega.iter()).copied());
        let mut dq = jacobian.velocities_from_vector(&v);
        compose(&mut dq, &jacobian, chain.joints(), objectives);

        let speed_ratio = saturate(&mut dq, chain.joints(), self.config.control_cycle);
        trace.speed_ratio = speed_ratio;
        trace.step = Some(dq.clone());
        if speed_ratio.is_none() {
            warn!(iteration, "NaN or infinity in the joint step");
            return Err(numerical_failure);
        }

        let gain = self.config.step_gain;
        for (joint, dq_j) in chain.joints_mut().iter_mut().zip(dq.iter()) {
            let requested = joint.angle + gain * dq_j;
            let (angle, upper) = if requested > joint.upper_limit {
                (joint.upper_limit, true)
            } else if requested < joint.lower_limit {
                (joint.lower_limit, false)
            } else {
                joint.angle = requested;
                continue;
            };
            warn!(joint = %joint.name, requested, limit = angle, upper, "joint limit, clamped");
            observer.limit_violation(&LimitViolation {
                iteration,
                joint: joint.name.clone(),
                requested,
                clamped_to: angle,
                upper,
            });
            joint.angle = angle;
        }

        chain.forward_kinematics();
        Ok(())
    }
}

/// Position error and rotation error (world frame rotation vector) from the current
/// end link pose to the target.
pub fn pose_error(current: &Pose, target_position: &Vector3<f64>, target_rotation: &Matrix3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let r = current.rotation.to_rotation_matrix();
    let dp = target_position - current.translation.vector;
    let omega = r * omega_from_rotation(&(r.matrix().transpose() * target_rotation));
    (dp, omega)
}

/// Scales the vector down to the given norm if it is longer.
fn clip(v: Vector3<f64>, max_norm: f64) -> Vector3<f64> {
    let norm = v.norm();
    if norm > max_norm { v * (max_norm / norm) } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Rotation3, Translation3, UnitQuaternion};

    #[test]
    fn test_clip() {
        let v = clip(Vector3::new(3.0, 4.0, 0.0), 0.5);
        assert!((v - Vector3::new(0.3, 0.4, 0.0)).norm() < 1e-12);
        let v = clip(Vector3::new(0.03, 0.04, 0.0), 0.5);
        assert_eq!(v, Vector3::new(0.03, 0.04, 0.0));
    }

    #[test]
    fn test_pose_error_is_world_frame() {
        // End link rotated 90 degrees about Z, target rotated further 30 degrees about world X
        let current_rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let current = Isometry3::from_parts(Translation3::new(1.0, 2.0, 3.0), current_rotation);
        let extra = Rotation3::from_axis_angle(&Vector3::x_axis(), 0.5);
        let target_rotation = extra.matrix() * current_rotation.to_rotation_matrix().matrix();

        let (dp, omega) = pose_error(&current, &Vector3::new(1.5, 2.0, 2.0), &target_rotation);
        assert!((dp - Vector3::new(0.5, 0.0, -1.0)).norm() < 1e-12);
        assert!((omega - Vector3::new(0.5, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_best_effort_never_converges_on_first_iteration() {
        let mut solver = IkSolver::default();
        solver.set_best_effort_threshold(1.0);
        let mut previous = None;
        assert!(!solver.converged(0.0, 0.0, &mut previous));
        assert!(solver.converged(0.0, 0.0, &mut previous));
    }

    #[test]
    fn test_threshold_convergence() {
        let mut solver = IkSolver::default();
        solver.set_convergence_thresholds(0.01, 0.1);
        let mut previous = None;
        assert!(solver.converged(0.99e-4, 0.99e-2, &mut previous));
        assert!(!solver.converged(1.01e-4, 0.0, &mut previous));
        assert!(!solver.converged(0.0, 1.01e-2, &mut previous));
    }

    #[test]
    fn test_setters() {
        let mut solver = IkSolver::default();
        solver.set_max_iterations(7);
        solver.set_sr_gain(2.0);
        solver.set_manipulability_limit(0.3);
        solver.set_manipulability_gain(0.01);
        let config = solver.config();
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.sr_gain, 2.0);
        assert_eq!(config.manipulability_limit, 0.3);
        assert_eq!(config.manipulability_gain, 0.01);
    }
}
