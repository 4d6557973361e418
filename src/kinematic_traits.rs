extern crate nalgebra as na;

use na::{DMatrix, Isometry3};

use crate::jacobian::{compute_jacobian, JACOBIAN_EPSILON};

/// Pose is used as a pose of the end link. It contains both Cartesian position and rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.0);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Forward kinematics of the link tree between the base link and the end link of a chain.
/// This is the only thing the inverse kinematics solver needs to know about the robot:
/// given the angles of the chain joints (in chain order), where is the end link.
pub trait ForwardKinematics {
    /// Number of joints this model expects.
    fn dof(&self) -> usize;

    /// Pose of the end link in the world frame for the given joint angles.
    fn forward(&self, qs: &[f64]) -> Pose;

    /// The 6 x n task Jacobian (linear velocity rows first, then angular velocity rows,
    /// both in the world frame). The default implementation differentiates `forward`
    /// numerically, models that know their geometry should override this.
    fn jacobian(&self, qs: &[f64]) -> DMatrix<f64> {
        compute_jacobian(self, qs, JACOBIAN_EPSILON)
    }
}
