//! Secondary objectives pursued with the redundant degrees of freedom. Both are joint
//! velocity suggestions projected through the nullspace of the current Jacobian, so
//! they do not disturb the end link.

use nalgebra::DVector;

use crate::jacobian::Jacobian;
use crate::joint::Joint;

/// Gains of the secondary objectives and the reference posture.
#[derive(Debug, Clone, Copy, Default)]
pub struct Objectives<'a> {
    /// Pull towards the middle of the joint range. Zero disables.
    pub avoid_gain: f64,

    /// Pull towards the reference posture. Zero disables.
    pub reference_gain: f64,

    /// Reference angles indexed by the stable joint id (not by position in the chain).
    pub reference: Option<&'a [f64]>,
}

impl<'a> Objectives<'a> {
    /// Primary task only.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn avoiding_limits(avoid_gain: f64) -> Self {
        Self { avoid_gain, ..Self::default() }
    }

    pub fn tracking(reference_gain: f64, reference: &'a [f64]) -> Self {
        Self { reference_gain, reference: Some(reference), ..Self::default() }
    }

    pub fn with_avoid_gain(mut self, avoid_gain: f64) -> Self {
        self.avoid_gain = avoid_gain;
        self
    }

    pub(crate) fn avoids_limits(&self) -> bool {
        self.avoid_gain > 0.0
    }

    pub(crate) fn tracks_reference(&self) -> Option<&'a [f64]> {
        if self.reference_gain > 0.0 { self.reference } else { None }
    }
}

/// Joint velocity suggestion pushing every joint towards the middle of its range,
/// proportional to the signed square of its normalized distance from the middle.
/// Locked joints (no range) get no suggestion.
pub fn limit_avoidance(joints: &[Joint], avoid_gain: f64) -> DVector<f64> {
    DVector::from_iterator(
        joints.len(),
        joints.iter().map(|joint| {
            if joint.half_range() == 0.0 {
                return 0.0;
            }
            let r = (joint.mid_range() - joint.angle) / joint.half_range();
            joint.optional_weight * avoid_gain * r * r.abs()
        }),
    )
}

/// Joint velocity suggestion pulling every joint towards its reference angle.
/// The caller ensures the reference covers every joint id.
pub fn reference_tracking(joints: &[Joint], reference_gain: f64, reference: &[f64]) -> DVector<f64> {
    DVector::from_iterator(
        joints.len(),
        joints.iter().map(|joint| {
            joint.optional_weight * reference_gain * (reference[joint.id] - joint.angle)
        }),
    )
}

/// Adds the enabled secondary objectives, projected through the nullspace of `jacobian`,
/// to the primary joint velocity `dq`.
pub fn compose(dq: &mut DVector<f64>, jacobian: &Jacobian, joints: &[Joint], objectives: &Objectives) {
    if objectives.avoids_limits() {
        *dq += jacobian.project(&limit_avoidance(joints, objectives.avoid_gain));
    }
    if let Some(reference) = objectives.tracks_reference() {
        *dq += jacobian.project(&reference_tracking(joints, objectives.reference_gain, reference));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn joints() -> Vec<Joint> {
        vec![
            Joint::new("a", 0, -1.0, 1.0).with_angle(0.5),
            Joint::new("b", 1, 0.0, 2.0).with_angle(0.5),
            Joint::new("c", 2, -2.0, 2.0).with_angle(0.0),
        ]
    }

    #[test]
    fn test_limit_avoidance_points_to_mid_range() {
        let u = limit_avoidance(&joints(), 2.0);
        // (0 - 0.5) / 1 = -0.5 -> -0.25 * 2
        assert!((u[0] + 0.5).abs() < 1e-12);
        // (1 - 0.5) / 1 = 0.5 -> 0.25 * 2
        assert!((u[1] - 0.5).abs() < 1e-12);
        assert_eq!(u[2], 0.0);
    }

    #[test]
    fn test_optional_weight_scales_suggestion() {
        let mut joints = joints();
        joints[1].optional_weight = 0.5;
        let u = limit_avoidance(&joints, 2.0);
        assert!((u[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_locked_joint_gets_no_suggestion() {
        let joints = vec![
            Joint::new("locked", 0, 0.4, 0.4).with_angle(0.4),
            Joint::new("free", 1, -1.0, 1.0).with_angle(0.5),
        ];
        let u = limit_avoidance(&joints, 1.0);
        assert_eq!(u[0], 0.0);
        assert!((u[1] + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_reference_is_indexed_by_joint_id() {
        let mut joints = joints();
        joints[0].id = 2;
        joints[2].id = 0;
        let reference = [1.0, 0.0, 0.0];
        let u = reference_tracking(&joints, 1.0, &reference);
        assert!((u[0] + 0.5).abs() < 1e-12); // reference[2] - 0.5
        assert!((u[2] - 1.0).abs() < 1e-12); // reference[0] - 0.0
    }

    #[test]
    fn test_compose_keeps_primary_task() {
        // Only the first joint moves the task
        let mut matrix = DMatrix::zeros(6, 3);
        matrix[(0, 0)] = 1.0;
        let jacobian = Jacobian::new(matrix, &DVector::from_element(3, 1.0), 1e-9).unwrap();

        let reference = [0.0, 1.5, 1.0];
        let objectives = Objectives::tracking(1.0, &reference).with_avoid_gain(1.0);
        let mut dq = DVector::from_vec(vec![0.1, 0.0, 0.0]);
        compose(&mut dq, &jacobian, &joints(), &objectives);

        // Joint 0 drives the task and is left alone by the nullspace terms
        assert!((dq[0] - 0.1).abs() < 1e-6);
        // Joint 1: avoidance 0.25 + reference 1.0
        assert!((dq[1] - 1.25).abs() < 1e-6);
        // Joint 2: avoidance 0 + reference 1.0
        assert!((dq[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_objectives_leave_dq() {
        let jacobian = Jacobian::new(DMatrix::zeros(6, 3), &DVector::from_element(3, 1.0), 1e-3).unwrap();
        let reference = [0.0, 0.0, 0.0];
        let objectives = Objectives { avoid_gain: 0.0, reference_gain: 0.0, reference: Some(&reference) };
        let mut dq = DVector::from_vec(vec![0.1, 0.2, 0.3]);
        compose(&mut dq, &jacobian, &joints(), &objectives);
        assert_eq!(dq, DVector::from_vec(vec![0.1, 0.2, 0.3]));
    }
}
