//! Kinematic chain: the ordered joints from the base link to the end link, their state,
//! and the forward kinematics that turns this state into the end link pose.

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::ik_error::IkError;
use crate::joint::Joint;
use crate::joint_limit_table::JointLimitTable;
use crate::kinematic_traits::{ForwardKinematics, Pose};

/// The chain owns its joints. A solve mutates the joint angles in place, so the same
/// chain must not be solved concurrently; independent chains can be solved in parallel.
#[derive(Clone)]
pub struct KinematicChain {
    joints: Vec<Joint>,

    /// Forward kinematics of the link tree between base and end link.
    model: Arc<dyn ForwardKinematics>,

    /// End link pose for the current joint angles.
    end_pose: Pose,
}

impl KinematicChain {
    /// Builds the chain and evaluates the end link pose for the initial joint angles.
    /// The number of joints must match the model.
    pub fn new(model: Arc<dyn ForwardKinematics>, joints: Vec<Joint>) -> Result<Self, IkError> {
        if joints.len() != model.dof() {
            return Err(IkError::DimensionMismatch { expected: model.dof(), found: joints.len() });
        }
        let mut chain = KinematicChain { joints, model, end_pose: Pose::identity() };
        chain.forward_kinematics();
        Ok(chain)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn joint(&self, i: usize) -> &Joint {
        &self.joints[i]
    }

    /// Mutable access for tuning (limits, weights). Call [`Self::forward_kinematics`]
    /// after changing the angle directly.
    pub fn joint_mut(&mut self, i: usize) -> &mut Joint {
        &mut self.joints[i]
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub(crate) fn joints_mut(&mut self) -> &mut [Joint] {
        &mut self.joints
    }

    /// Current joint angles in chain order.
    pub fn angles(&self) -> Vec<f64> {
        self.joints.iter().map(|j| j.angle).collect()
    }

    /// Sets all joint angles (chain order) and refreshes the end link pose.
    pub fn set_angles(&mut self, qs: &[f64]) -> Result<(), IkError> {
        if qs.len() != self.joints.len() {
            return Err(IkError::DimensionMismatch { expected: self.joints.len(), found: qs.len() });
        }
        for (joint, &q) in self.joints.iter_mut().zip(qs) {
            joint.angle = q;
        }
        self.forward_kinematics();
        Ok(())
    }

    /// Sets the optional weight of every joint (chain order).
    pub fn set_optional_weights(&mut self, weights: &[f64]) -> Result<(), IkError> {
        if weights.len() != self.joints.len() {
            return Err(IkError::DimensionMismatch { expected: self.joints.len(), found: weights.len() });
        }
        for (joint, &w) in self.joints.iter_mut().zip(weights) {
            joint.optional_weight = w;
        }
        Ok(())
    }

    /// Recomputes the end link pose from the current joint angles.
    pub fn forward_kinematics(&mut self) {
        let qs = self.angles();
        self.end_pose = self.model.forward(&qs);
    }

    /// End link pose as of the last [`Self::forward_kinematics`].
    pub fn end_pose(&self) -> &Pose {
        &self.end_pose
    }

    /// The 6 x n task Jacobian at the current joint angles.
    pub fn jacobian(&self) -> DMatrix<f64> {
        self.model.jacobian(&self.angles())
    }

    pub(crate) fn reset_avoidance_costs(&mut self) {
        self.joints.iter_mut().for_each(Joint::reset_avoidance_cost);
    }

    /// Effective (lower, upper) limits of the joint the table describes, given the current
    /// angle of the table's driving joint. `None` if the driving joint is not in this chain.
    pub fn coupled_limits(&self, table: &JointLimitTable) -> Option<(f64, f64)> {
        let driving = self.joints.iter().find(|j| j.id == table.target_joint_id())?;
        Some((
            table.interpolated_limit(driving.angle, true),
            table.interpolated_limit(driving.angle, false),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial_arm::SerialArm;
    use nalgebra::Vector3;

    fn chain() -> KinematicChain {
        let joints = (0..6).map(|i| Joint::new(&format!("j{}", i + 1), i, -3.0, 3.0)).collect();
        KinematicChain::new(Arc::new(SerialArm::six_axis()), joints).unwrap()
    }

    #[test]
    fn test_new_evaluates_pose() {
        let chain = chain();
        assert!((chain.end_pose().translation.vector - Vector3::new(0.0, 0.0, 1.3)).norm() < 1e-9);
    }

    #[test]
    fn test_joint_count_must_match_model() {
        let joints = vec![Joint::new("only", 0, -1.0, 1.0)];
        let result = KinematicChain::new(Arc::new(SerialArm::six_axis()), joints);
        assert!(matches!(result, Err(IkError::DimensionMismatch { expected: 6, found: 1 })));
    }

    #[test]
    fn test_set_angles_refreshes_pose() {
        let mut chain = chain();
        chain.set_angles(&[0.0, std::f64::consts::FRAC_PI_2, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!((chain.end_pose().translation.vector - Vector3::new(1.0, 0.0, 0.3)).norm() < 1e-9);
        assert!(chain.set_angles(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_optional_weights() {
        let mut chain = chain();
        chain.set_optional_weights(&[1.0, 0.5, 1.0, 1.0, 0.1, 1.0]).unwrap();
        assert_eq!(chain.joint(1).optional_weight, 0.5);
        assert_eq!(chain.joint(4).optional_weight, 0.1);
        assert!(chain.set_optional_weights(&[1.0]).is_err());
    }

    #[test]
    fn test_coupled_limits() {
        let mut chain = chain();
        // Limits of some ankle joint depend on joint id 4, from -2 to 2 degrees
        let table = JointLimitTable::new(4, -2, 2,
                                         vec![-10.0, -20.0, -30.0, -20.0, -10.0],
                                         vec![10.0, 20.0, 30.0, 20.0, 10.0]).unwrap();
        chain.joint_mut(4).angle = 0.5_f64.to_radians();
        let (lower, upper) = chain.coupled_limits(&table).unwrap();
        assert!((lower.to_degrees() + 25.0).abs() < 1e-9);
        assert!((upper.to_degrees() - 25.0).abs() < 1e-9);

        let foreign = JointLimitTable::new(42, 0, 0, vec![0.0], vec![0.0]).unwrap();
        assert!(chain.coupled_limits(&foreign).is_none());
    }
}
