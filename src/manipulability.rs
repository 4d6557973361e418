//! Damping of the SR-inverse derived from the manipulability of the chain.

use nalgebra::DMatrix;

/// Yoshikawa manipulability sqrt(det(J J^T)). Zero at kinematic singularities.
pub fn manipulability(jacobian: &DMatrix<f64>) -> f64 {
    let jjt = jacobian * jacobian.transpose();
    jjt.determinant().max(0.0).sqrt()
}

/// Turns manipulability into damping: zero while the chain is well conditioned,
/// growing quadratically as it approaches a singular configuration.
#[derive(Debug, Clone, Copy)]
pub struct ManipulabilityDamper {
    /// Below this manipulability the damping is switched on.
    pub limit: f64,

    /// Damping at zero manipulability.
    pub gain: f64,
}

impl ManipulabilityDamper {
    pub fn new(limit: f64, gain: f64) -> Self {
        Self { limit, gain }
    }

    /// Damping for the given manipulability.
    pub fn damping(&self, manipulability: f64) -> f64 {
        if manipulability >= self.limit {
            0.0
        } else {
            self.gain * (1.0 - manipulability / self.limit).powi(2)
        }
    }

    /// Manipulability of the Jacobian and the damping it asks for.
    pub fn evaluate(&self, jacobian: &DMatrix<f64>) -> (f64, f64) {
        let m = manipulability(jacobian);
        (m, self.damping(m))
    }
}
