//! Scaling of the joint step so that no joint exceeds its velocity limit within one
//! control cycle. The whole step is scaled by the same factor, so the direction of
//! the commanded motion is preserved.

use nalgebra::DVector;

use crate::joint::Joint;
use crate::utils::is_valid;

/// Largest factor in [0, 1] that brings every component of `dq` within
/// [lower_velocity_limit * dt, upper_velocity_limit * dt].
pub fn speed_ratio(dq: &DVector<f64>, joints: &[Joint], dt: f64) -> f64 {
    let mut min_speed_ratio: f64 = 1.0;
    for (dq_j, joint) in dq.iter().zip(joints) {
        let lower = joint.lower_velocity_limit * dt;
        let upper = joint.upper_velocity_limit * dt;
        let ratio = if *dq_j < lower {
            (lower / dq_j).abs()
        } else if *dq_j > upper {
            (upper / dq_j).abs()
        } else {
            1.0
        };
        min_speed_ratio = min_speed_ratio.min(ratio).max(0.0);
    }
    min_speed_ratio
}

/// Scales `dq` in place so it respects the velocity limits and returns the factor applied.
/// Returns `None` if the result contains NaN or infinity.
pub fn saturate(dq: &mut DVector<f64>, joints: &[Joint], dt: f64) -> Option<f64> {
    let ratio = speed_ratio(dq, joints, dt);
    if ratio < 1.0 {
        *dq *= ratio;
    }
    if is_valid(dq.as_slice()) { Some(ratio) } else { None }
}
