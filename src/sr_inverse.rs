//! Weighted singularity-robust inverse of the Jacobian.
//!
//! J# = W J^T (J W J^T + k I)^-1
//!
//! Y. Nakamura and H. Hanafusa: "Inverse Kinematic Solutions With Singularity Robustness
//! for Robot Manipulator Control", J. Dyn. Sys., Meas., Control 1986, vol 108, pp. 163-172.

use nalgebra::DMatrix;

use crate::ik_error::IkError;

/// Computes the weighted, damped pseudoinverse of `a` (m x n, m = 6 for a full pose task).
///
/// With `damping` 0 and a full rank `a` this is the weighted Moore-Penrose pseudoinverse.
/// Positive damping trades exactness for stability near singular configurations.
/// If `weights` is missing or has the wrong shape, identity is used.
///
/// The inner m x m matrix is only singular if the damping is zero and `a` is rank
/// deficient; this is reported as [`IkError::SingularInnerMatrix`] and should not
/// happen with the damping the solver supplies.
pub fn sr_inverse(a: &DMatrix<f64>, damping: f64, weights: Option<&DMatrix<f64>>) -> Result<DMatrix<f64>, IkError> {
    let (m, n) = a.shape();
    let identity;
    let w = match weights {
        Some(w) if w.shape() == (n, n) => w,
        _ => {
            identity = DMatrix::identity(n, n);
            &identity
        }
    };

    let wat = w * a.transpose();
    let inner = a * &wat + DMatrix::identity(m, m) * damping;
    let inner_inverse = inner.try_inverse().ok_or(IkError::SingularInnerMatrix)?;
    Ok(wat * inner_inverse)
}
