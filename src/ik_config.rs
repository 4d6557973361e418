//! Defines the solver configuration

use crate::ik_error::IkError;

/// When the iteration stops with success.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
    /// Converged when the position error is below `position` (meters) and the
    /// rotation error is below `rotation` (radians).
    Threshold { position: f64, rotation: f64 },

    /// Converged when the total squared error changes less than `tolerance` squared
    /// between two iterations. For targets that may be out of reach.
    BestEffort { tolerance: f64 },
}

/// Parameters of the iterative solver. The same configuration can be reused for any
/// number of solves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkConfig {
    /// Maximal number of iterations (error evaluations) before giving up.
    pub max_iterations: usize,

    /// Exit criterion.
    pub convergence: Convergence,

    /// Fraction of the computed step applied each iteration, in (0, 1].
    pub step_gain: f64,

    /// The position error fed into a single step is clipped to this norm, meters.
    pub max_position_step: f64,

    /// The rotation error fed into a single step is clipped to this norm, radians.
    pub max_rotation_step: f64,

    /// Control cycle, seconds. Joint velocity limits times this bound a single step.
    pub control_cycle: f64,

    /// Below this manipulability the SR-inverse gets damped.
    pub manipulability_limit: f64,

    /// Damping at zero manipulability.
    pub manipulability_gain: f64,

    /// Multiplier of the damping computed from manipulability.
    pub sr_gain: f64,
}

impl Default for IkConfig {
    fn default() -> Self {
        IkConfig {
            max_iterations: 50,
            convergence: Convergence::Threshold { position: 1.0e-4, rotation: 1.0e-3 },
            step_gain: 0.9,
            max_position_step: 0.1,
            max_rotation_step: 0.5,
            control_cycle: 0.002,
            manipulability_limit: 0.1,
            manipulability_gain: 0.001,
            sr_gain: 1.0,
        }
    }
}

impl IkConfig {
    /// Checks that the values make sense.
    pub fn validate(&self) -> Result<(), IkError> {
        let invalid = |msg: String| Err(IkError::InvalidConfiguration(msg));

        if !(self.step_gain > 0.0 && self.step_gain <= 1.0) {
            return invalid(format!("step_gain must be in (0, 1], got {}", self.step_gain));
        }
        if !(self.control_cycle > 0.0) {
            return invalid(format!("control_cycle must be positive, got {}", self.control_cycle));
        }
        for (name, value) in [
            ("max_position_step", self.max_position_step),
            ("max_rotation_step", self.max_rotation_step),
        ] {
            if !(value > 0.0) {
                return invalid(format!("{} must be positive, got {}", name, value));
            }
        }
        for (name, value) in [
            ("manipulability_limit", self.manipulability_limit),
            ("manipulability_gain", self.manipulability_gain),
            ("sr_gain", self.sr_gain),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return invalid(format!("{} must be finite and non-negative, got {}", name, value));
            }
        }
        match self.convergence {
            Convergence::Threshold { position, rotation } if !(position >= 0.0 && rotation >= 0.0) =>
                invalid(format!("convergence thresholds must be non-negative, got {}, {}", position, rotation)),
            Convergence::BestEffort { tolerance } if !(tolerance >= 0.0) =>
                invalid(format!("best effort tolerance must be non-negative, got {}", tolerance)),
            _ => Ok(()),
        }
    }

    /// Convert to string yaml representation (quick viewing, etc).
    pub fn to_yaml(&self) -> String {
        let convergence = match self.convergence {
            Convergence::Threshold { position, rotation } =>
                format!("  position_tolerance: {:e}\n  rotation_tolerance: {:e}\n", position, rotation),
            Convergence::BestEffort { tolerance } =>
                format!("  best_effort_tolerance: {:e}\n", tolerance),
        };
        format!(
            "ik_solver:\n  \
              max_iterations: {}\n\
              {}  \
              step_gain: {}\n  \
              max_position_step: {}\n  \
              max_rotation_step: {}\n  \
              control_cycle: {}\n  \
              manipulability_limit: {}\n  \
              manipulability_gain: {}\n  \
              sr_gain: {}\n",
            self.max_iterations,
            convergence,
            self.step_gain,
            self.max_position_step,
            self.max_rotation_step,
            self.control_cycle,
            self.manipulability_limit,
            self.manipulability_gain,
            self.sr_gain,
        )
    }
}
