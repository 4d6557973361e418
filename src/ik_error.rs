//! Errors reported by the inverse kinematics solver. Every error leaves the chain
//! at the joint angles it had before the solve.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum IkError {
    /// The chain has no joints to move.
    DegenerateChain,

    /// The computed joint step contained NaN or infinity.
    NumericalFailure { iteration: usize },

    /// The iteration budget ran out before the convergence criterion was met.
    /// Errors are squared norms of the final, unclipped position and rotation error.
    NotConverged { iterations: usize, position_error: f64, rotation_error: f64 },

    /// Some per-joint input does not match the chain.
    DimensionMismatch { expected: usize, found: usize },

    /// J W J^T + k I could not be inverted.
    SingularInnerMatrix,

    /// The solver configuration is not usable.
    InvalidConfiguration(String),
}

impl fmt::Display for IkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IkError::DegenerateChain =>
                write!(f, "Degenerate chain: no joints between base and end link"),
            IkError::NumericalFailure { iteration } =>
                write!(f, "NaN or infinity in the joint step at iteration {}", iteration),
            IkError::NotConverged { iterations, position_error, rotation_error } =>
                write!(f, "Not converged after {} iterations, squared errors: position {:e}, rotation {:e}",
                       iterations, position_error, rotation_error),
            IkError::DimensionMismatch { expected, found } =>
                write!(f, "Dimension mismatch: expected {}, found {}", expected, found),
            IkError::SingularInnerMatrix =>
                write!(f, "Singular matrix in the SR-inverse, damping required"),
            IkError::InvalidConfiguration(ref msg) =>
                write!(f, "Invalid solver configuration: {}", msg),
        }
    }
}

impl Error for IkError {}
