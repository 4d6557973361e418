extern crate nalgebra as na;

use na::{DMatrix, DVector};

use crate::ik_error::IkError;
use crate::kinematic_traits::ForwardKinematics;
use crate::sr_inverse::sr_inverse;

/// Joint disturbance used for numeric differentiation, radians.
pub const JACOBIAN_EPSILON: f64 = 1e-6;

/// Jacobian of the chain together with its singularity-robust weighted inverse and
/// the nullspace projector built from them. Recomputed every iteration.
pub struct Jacobian {
    /// A 6 x n matrix mapping the joint velocities to the end link velocities.
    /// Each column corresponds to a joint; the rows are linear velocity followed
    /// by angular velocity, both in the world frame.
    matrix: DMatrix<f64>,

    /// The n x 6 weighted SR-inverse of `matrix`.
    inverse: DMatrix<f64>,

    /// The n x n projector I - J# J. Joint velocities in its image do not move the end link
    /// (exactly so only when the damping is zero).
    nullspace: DMatrix<f64>,
}

impl Jacobian {
    /// Builds the triple from the Jacobian matrix, the diagonal joint weights and the damping.
    ///
    /// # Arguments
    ///
    /// * `matrix` - the 6 x n task Jacobian
    /// * `weights` - diagonal of the joint weight matrix, n values
    /// * `damping` - non-negative damping of the inner 6 x 6 matrix
    ///
    /// # Returns
    ///
    /// The triple, or an error if the damped inner matrix still could not be inverted.
    pub fn new(matrix: DMatrix<f64>, weights: &DVector<f64>, damping: f64) -> Result<Self, IkError> {
        let n = matrix.ncols();
        let w = DMatrix::from_diagonal(weights);
        let inverse = sr_inverse(&matrix, damping, Some(&w))?;
        let nullspace = DMatrix::identity(n, n) - &inverse * &matrix;
        Ok(Self { matrix, inverse, nullspace })
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn inverse(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    pub fn nullspace(&self) -> &DMatrix<f64> {
        &self.nullspace
    }

    /// Maps the desired end link velocity (linear, then angular) into joint velocities.
    pub fn velocities_from_vector(&self, desired_end_link_velocity: &DVector<f64>) -> DVector<f64> {
        &self.inverse * desired_end_link_velocity
    }

    /// Projects the joint velocity through the nullspace, removing the part
    /// that would move the end link.
    pub fn project(&self, joint_velocity: &DVector<f64>) -> DVector<f64> {
        &self.nullspace * joint_velocity
    }
}

/// Computes the Jacobian matrix of the model at the given joint configuration by
/// forward differences.
///
/// # Arguments
///
/// * `robot` - the forward kinematics of the chain
/// * `joints` - the joint configuration, `robot.dof()` values
/// * `epsilon` - a small value used for numerical differentiation
///
/// # Returns
///
/// A 6 x n matrix. Each column corresponds to a joint, each row to a degree of freedom
/// of the end link (linear and angular velocities in the world frame).
pub fn compute_jacobian<R: ForwardKinematics + ?Sized>(robot: &R, joints: &[f64], epsilon: f64) -> DMatrix<f64> {
    let n = joints.len();
    let mut jacobian = DMatrix::zeros(6, n);
    let current_pose = robot.forward(joints);
    let current_position = current_pose.translation.vector;
    let current_orientation = current_pose.rotation;

    let mut perturbed_qs = joints.to_vec();
    for i in 0..n {
        perturbed_qs[i] += epsilon;
        let perturbed_pose = robot.forward(&perturbed_qs);
        perturbed_qs[i] = joints[i];

        let delta_position = (perturbed_pose.translation.vector - current_position) / epsilon;
        let delta_orientation =
            (perturbed_pose.rotation * current_orientation.inverse()).scaled_axis() / epsilon;

        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&delta_position);
        jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&delta_orientation);
    }

    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::Pose;
    use na::{Isometry3, Translation3, UnitQuaternion};

    const EPSILON: f64 = 1e-6;

    /// Single rotary joint about Z with a link of length 1 along X.
    /// When the joint rotates, it affects the Y-position and the Z-orientation of the end link.
    pub struct SingleRotaryJointRobot;

    impl ForwardKinematics for SingleRotaryJointRobot {
        fn dof(&self) -> usize {
            1
        }

        fn forward(&self, qs: &[f64]) -> Pose {
            let angle = qs[0];
            let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, angle);
            let translation = Translation3::new(angle.cos(), angle.sin(), 0.0);
            Isometry3::from_parts(translation, rotation)
        }
    }

    fn assert_matrix_approx_eq(left: &DMatrix<f64>, right: &DMatrix<f64>, epsilon: f64) {
        assert_eq!(left.shape(), right.shape());
        for i in 0..left.nrows() {
            for j in 0..left.ncols() {
                assert!((left[(i, j)] - right[(i, j)]).abs() < epsilon,
                        "left[{0},{1}] = {2} is not approximately equal to right[{0},{1}] = {3}",
                        i, j, left[(i, j)], right[(i, j)]);
            }
        }
    }

    #[test]
    fn test_compute_jacobian() {
        let robot = SingleRotaryJointRobot;
        let jacobian = compute_jacobian(&robot, &[0.0], EPSILON);
        let mut expected = DMatrix::zeros(6, 1);
        expected[(1, 0)] = 1.0; // Y position is affected by the joint
        expected[(5, 0)] = 1.0; // Z orientation is affected by the joint
        assert_matrix_approx_eq(&jacobian, &expected, 1e-5);
    }

    #[test]
    fn test_default_trait_jacobian_is_numeric() {
        let robot = SingleRotaryJointRobot;
        let qs = [std::f64::consts::FRAC_PI_2];
        assert_matrix_approx_eq(&robot.jacobian(&qs), &compute_jacobian(&robot, &qs, JACOBIAN_EPSILON), 1e-12);
        // At 90 degrees the tip moves along -X
        assert!((robot.jacobian(&qs)[(0, 0)] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_nullspace_annihilated_by_jacobian() {
        // Arbitrary full rank 6 x 8 matrix, two redundant joints
        let mut matrix = DMatrix::zeros(6, 8);
        for j in 0..8 {
            for i in 0..6 {
                matrix[(i, j)] = ((i * 8 + j) as f64 * 0.37).sin();
            }
        }
        let weights = DVector::from_element(8, 1.0);
        let triple = Jacobian::new(matrix.clone(), &weights, 0.0).unwrap();
        let product = &matrix * triple.nullspace();
        assert_matrix_approx_eq(&product, &DMatrix::zeros(6, 8), 1e-9);

        let u = DVector::from_fn(8, |i, _| i as f64 - 3.5);
        let projected = triple.project(&u);
        let task_motion = &matrix * projected;
        assert!(task_motion.norm() < 1e-9);
    }
}
