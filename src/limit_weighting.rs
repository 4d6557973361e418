//! Joint weights for the weighted least-norm solution that keeps joints away from their limits.
//!
//! w_i = 1 / (1 + |dH/dq|)  if |dH/dq| is growing
//!     = 1                  otherwise
//!
//! dH/dq = (q_max - q_min)^2 (2q - q_max - q_min) / 4 (q_max - q)^2 (q - q_min)^2
//!
//! T. F. Chang and R.-V. Dubey: "A weighted least-norm solution based scheme for avoiding
//! joint limits for redundant manipulators", IEEE Trans. on Robotics and Automation,
//! 11(2):286-292, April 1995.

use nalgebra::DVector;

use crate::joint::Joint;

/// Angles closer than this to a limit are moved away from it before computing the cost.
const LIMIT_MARGIN: f64 = std::f64::consts::PI / 180.0;

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() <= LIMIT_MARGIN
}

/// Magnitude of the Chang-Dubey potential gradient for the joint at its current angle.
/// Joints without usable range get `f64::MAX`.
pub fn avoidance_cost(joint: &Joint) -> f64 {
    let upper = joint.upper_limit;
    let lower = joint.lower_limit;

    if near(joint.angle, upper) && near(joint.angle, lower) {
        return f64::MAX;
    }

    let angle = if near(joint.angle, upper) {
        upper - LIMIT_MARGIN
    } else if near(joint.angle, lower) {
        lower + LIMIT_MARGIN
    } else {
        joint.angle
    };

    let r = ((upper - lower).powi(2) * (2.0 * angle - upper - lower)
        / (4.0 * (upper - angle).powi(2) * (angle - lower).powi(2)))
        .abs();
    if r.is_nan() { 0.0 } else { r }
}

/// Computes the diagonal of the joint weight matrix and stores the new cost of each joint
/// for the next iteration.
///
/// A joint whose cost grows (it approaches a limit) is down-weighted so the redundancy
/// absorbs the motion; a joint retreating from its limit gets its full optional weight back.
pub fn update_weights(joints: &mut [Joint]) -> DVector<f64> {
    DVector::from_iterator(
        joints.len(),
        joints.iter_mut().map(|joint| {
            let r = avoidance_cost(joint);
            let w = if r >= joint.avoidance_cost {
                joint.optional_weight / (1.0 + r)
            } else {
                joint.optional_weight
            };
            joint.avoidance_cost = r;
            w
        }),
    )
}
