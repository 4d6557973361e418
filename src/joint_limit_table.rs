//! Joint limits that depend on the angle of another joint, such as the coupled limits
//! of the two joints of an ankle linkage.
//!
//! The table is sampled on an integer-degree grid of the driving (target) joint angle,
//! from `target_lower_angle` to `target_upper_angle` inclusive. Values are stored in degrees.

use crate::ik_error::IkError;

#[derive(Debug, Clone, PartialEq)]
pub struct JointLimitTable {
    /// Stable id of the joint whose angle selects the limits.
    target_joint_id: usize,

    /// First grid point, degrees.
    target_lower_angle: i32,

    /// Last grid point, degrees.
    target_upper_angle: i32,

    /// Lower limit of the coupled joint at every grid point, degrees.
    lower_limit_table: Vec<f64>,

    /// Upper limit of the coupled joint at every grid point, degrees.
    upper_limit_table: Vec<f64>,
}

impl JointLimitTable {
    /// Creates the table. Both tables must have one value for every integer degree
    /// from `target_lower_angle` to `target_upper_angle`.
    pub fn new(
        target_joint_id: usize,
        target_lower_angle: i32,
        target_upper_angle: i32,
        lower_limit_table: Vec<f64>,
        upper_limit_table: Vec<f64>,
    ) -> Result<Self, IkError> {
        if target_upper_angle < target_lower_angle {
            return Err(IkError::InvalidConfiguration(format!(
                "joint limit table range [{}, {}] is empty",
                target_lower_angle, target_upper_angle
            )));
        }
        let expected = (target_upper_angle - target_lower_angle) as usize + 1;
        for table in [&lower_limit_table, &upper_limit_table] {
            if table.len() != expected {
                return Err(IkError::DimensionMismatch { expected, found: table.len() });
            }
        }
        Ok(JointLimitTable {
            target_joint_id,
            target_lower_angle,
            target_upper_angle,
            lower_limit_table,
            upper_limit_table,
        })
    }

    pub fn target_joint_id(&self) -> usize {
        self.target_joint_id
    }

    /// Limit of the coupled joint (radians) for the given driving joint angle (radians),
    /// linearly interpolated between the two bracketing grid points. Angles outside the
    /// grid get the value at the nearest end. A non-finite angle gives NaN.
    pub fn interpolated_limit(&self, target_joint_angle: f64, lower: bool) -> f64 {
        if !target_joint_angle.is_finite() {
            return f64::NAN;
        }
        let table = if lower { &self.lower_limit_table } else { &self.upper_limit_table };
        let target_angle = target_joint_angle.to_degrees();
        let floor = target_angle.floor();

        let value_at = |grid: f64| {
            let clamped = grid.clamp(self.target_lower_angle as f64, self.target_upper_angle as f64);
            table[(clamped as i64 - self.target_lower_angle as i64) as usize]
        };

        let ratio = target_angle - floor;
        (value_at(floor) * (1.0 - ratio) + value_at(floor + 1.0) * ratio).to_radians()
    }

    pub fn lower_limit(&self, target_joint_angle: f64) -> f64 {
        self.interpolated_limit(target_joint_angle, true)
    }

    pub fn upper_limit(&self, target_joint_angle: f64) -> f64 {
        self.interpolated_limit(target_joint_angle, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> JointLimitTable {
        // Driving joint from 10 to 12 degrees
        JointLimitTable::new(3, 10, 12, vec![5.0, 7.0, 8.0], vec![20.0, 18.0, 15.0]).unwrap()
    }

    fn deg(x: f64) -> f64 {
        x.to_radians()
    }

    #[test]
    fn test_midpoint_interpolation() {
        let table = table();
        assert!((table.lower_limit(deg(10.5)).to_degrees() - 6.0).abs() < 1e-9);
        assert!((table.upper_limit(deg(11.5)).to_degrees() - 16.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_angle() {
        let table = table();
        assert!(table.lower_limit(f64::NAN).is_nan());
        assert!(table.upper_limit(f64::INFINITY).is_nan());
        assert!(table.lower_limit(f64::NEG_INFINITY).is_nan());
    }

    #[test]
    fn test_grid_points() {
        let table = table();
        assert!((table.lower_limit(deg(11.0)).to_degrees() - 7.0).abs() < 1e-9);
        assert!((table.upper_limit(deg(12.0)).to_degrees() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamps_outside_grid() {
        let table = table();
        assert!((table.lower_limit(deg(-40.0)).to_degrees() - 5.0).abs() < 1e-9);
        assert!((table.lower_limit(deg(9.3)).to_degrees() - 5.0).abs() < 1e-9);
        assert!((table.lower_limit(deg(90.0)).to_degrees() - 8.0).abs() < 1e-9);
        assert!((table.upper_limit(deg(12.7)).to_degrees() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_must_match_range() {
        let result = JointLimitTable::new(0, 10, 12, vec![5.0, 7.0], vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(IkError::DimensionMismatch { expected: 3, found: 2 })));
        let result = JointLimitTable::new(0, 12, 10, vec![], vec![]);
        assert!(matches!(result, Err(IkError::InvalidConfiguration(_))));
    }
}
