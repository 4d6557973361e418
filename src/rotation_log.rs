//! Logarithmic map of a rotation matrix to the angular velocity (axis times angle)
//! that rotates identity into it in unit time.

use nalgebra::{Matrix3, Vector3};

/// Below this distance of (trace - 1) / 2 from 1 the rotation is treated as identity.
const ZERO_ROTATION: f64 = 1.0e-12;

/// Converts the rotation matrix into the rotation vector (axis scaled by angle).
///
/// Unlike naive axis-angle extraction, the result stays meaningful for rotations by
/// exactly (or numerically) 180 degrees, where the skew-symmetric part of the matrix
/// vanishes. The axis is then recovered from the diagonal, with signs taken from the
/// symmetric off-diagonal terms relative to the dominant component.
pub fn omega_from_rotation(r: &Matrix3<f64>) -> Vector3<f64> {
    let alpha = ((r.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);

    if (alpha - 1.0).abs() < ZERO_ROTATION {
        return Vector3::zeros();
    }

    let theta = alpha.acos();
    let s = theta.sin();

    if s < f64::EPSILON {
        return half_turn_axis(r) * theta;
    }

    let k = -0.5 * theta / s;
    Vector3::new(
        (r[(1, 2)] - r[(2, 1)]) * k,
        (r[(2, 0)] - r[(0, 2)]) * k,
        (r[(0, 1)] - r[(1, 0)]) * k,
    )
}

/// Unit axis of a rotation by pi. For such rotation R = 2 a a^T - I, so the diagonal gives
/// the magnitudes and R[i,j] + R[j,i] = 4 a_i a_j gives the relative signs.
fn half_turn_axis(r: &Matrix3<f64>) -> Vector3<f64> {
    let magnitudes = Vector3::new(
        ((r[(0, 0)] + 1.0) * 0.5).max(0.0).sqrt(),
        ((r[(1, 1)] + 1.0) * 0.5).max(0.0).sqrt(),
        ((r[(2, 2)] + 1.0) * 0.5).max(0.0).sqrt(),
    );
    let dominant = magnitudes.imax();

    let mut axis = magnitudes;
    for i in 0..3 {
        if i != dominant && r[(dominant, i)] + r[(i, dominant)] < 0.0 {
            axis[i] = -axis[i];
        }
    }
    axis
}
