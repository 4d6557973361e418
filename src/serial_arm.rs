//! Forward kinematics of a serial arm of revolute joints, described by the fixed
//! transform to each joint frame and the joint axis in that frame.
//!
//! This is the simplest possible [`ForwardKinematics`] collaborator. Robots described
//! elsewhere (URDF, DH tables, analytic models) only need to implement the trait.
//! ```
//! use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
//! use rs_jointpath_ik::kinematic_traits::ForwardKinematics;
//! use rs_jointpath_ik::serial_arm::{ArmJoint, SerialArm};
//!
//! // Two joints about Z, links of 1 meter along X
//! let arm = SerialArm::new(vec![
//!     ArmJoint::revolute(Isometry3::identity(), Vector3::z()),
//!     ArmJoint::revolute(Isometry3::translation(1.0, 0.0, 0.0), Vector3::z()),
//! ], Isometry3::translation(1.0, 0.0, 0.0));
//!
//! let pose = arm.forward(&[std::f64::consts::FRAC_PI_2, 0.0]);
//! assert!((pose.translation.vector - Vector3::new(0.0, 2.0, 0.0)).norm() < 1e-12);
//! ```

extern crate nalgebra as na;

use na::{DMatrix, Isometry3, Translation3, Unit, UnitQuaternion, Vector3};

use crate::kinematic_traits::{ForwardKinematics, Pose};

/// Revolute joint of the serial arm.
#[derive(Debug, Clone)]
pub struct ArmJoint {
    /// Fixed transform from the previous joint frame (or the world for the first joint)
    /// to this joint frame.
    pub origin: Isometry3<f64>,

    /// Rotation axis in this joint frame.
    pub axis: Unit<Vector3<f64>>,
}

impl ArmJoint {
    pub fn revolute(origin: Isometry3<f64>, axis: Vector3<f64>) -> Self {
        ArmJoint { origin, axis: Unit::new_normalize(axis) }
    }

    fn motion(&self, angle: f64) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::identity(), UnitQuaternion::from_axis_angle(&self.axis, angle))
    }
}

#[derive(Debug, Clone)]
pub struct SerialArm {
    joints: Vec<ArmJoint>,

    /// Transform from the last joint frame to the end link.
    tool: Isometry3<f64>,
}

impl SerialArm {
    pub fn new(joints: Vec<ArmJoint>, tool: Isometry3<f64>) -> Self {
        SerialArm { joints, tool }
    }

    /// Poses of every link (the frame after each joint's motion), followed by the end link pose.
    pub fn forward_with_joint_poses(&self, qs: &[f64]) -> Vec<Pose> {
        let mut transform = Isometry3::identity();
        let mut poses = Vec::with_capacity(self.joints.len() + 1);
        for (joint, &angle) in self.joints.iter().zip(qs) {
            transform *= joint.origin * joint.motion(angle);
            poses.push(transform);
        }
        poses.push(transform * self.tool);
        poses
    }

    /// Joint origins and axes in the world frame, and the end link pose.
    fn joint_frames(&self, qs: &[f64]) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>, Pose) {
        let mut transform = Isometry3::identity();
        let mut origins = Vec::with_capacity(self.joints.len());
        let mut axes = Vec::with_capacity(self.joints.len());

        for (joint, &angle) in self.joints.iter().zip(qs) {
            transform *= joint.origin;
            origins.push(transform.translation.vector);
            axes.push(transform.rotation * joint.axis.into_inner());
            transform *= joint.motion(angle);
        }

        (origins, axes, transform * self.tool)
    }

    /// Six joints: waist, shoulder, elbow and a roll-pitch-roll wrist.
    /// Straight up when all joints are at zero.
    pub fn six_axis() -> Self {
        SerialArm::new(vec![
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.3), Vector3::z()),
            ArmJoint::revolute(Isometry3::identity(), Vector3::y()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.4), Vector3::y()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.2), Vector3::z()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.2), Vector3::y()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.1), Vector3::z()),
        ], Isometry3::translation(0.0, 0.0, 0.1))
    }

    /// Seven joints with alternating roll and pitch axes, one degree of redundancy.
    /// Straight up when all joints are at zero.
    pub fn seven_axis() -> Self {
        SerialArm::new(vec![
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.34), Vector3::z()),
            ArmJoint::revolute(Isometry3::identity(), Vector3::y()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.2), Vector3::z()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.2), Vector3::y()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.2), Vector3::z()),
            ArmJoint::revolute(Isometry3::translation(0.0, 0.0, 0.2), Vector3::y()),
            ArmJoint::revolute(Isometry3::identity(), Vector3::z()),
        ], Isometry3::translation(0.0, 0.0, 0.126))
    }
}

impl ForwardKinematics for SerialArm {
    fn dof(&self) -> usize {
        self.joints.len()
    }

    fn forward(&self, qs: &[f64]) -> Pose {
        let mut transform = Isometry3::identity();
        for (joint, &angle) in self.joints.iter().zip(qs) {
            transform *= joint.origin * joint.motion(angle);
        }
        transform * self.tool
    }

    /// Geometric Jacobian: for every revolute joint, the column is
    /// (axis x (end - origin), axis).
    fn jacobian(&self, qs: &[f64]) -> DMatrix<f64> {
        let (origins, axes, end) = self.joint_frames(qs);
        let end_position = end.translation.vector;
        let mut jacobian = DMatrix::zeros(6, self.joints.len());
        for (i, (origin, axis)) in origins.iter().zip(axes.iter()).enumerate() {
            let linear = axis.cross(&(end_position - origin));
            jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&linear);
            jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(axis);
        }
        jacobian
    }
}
