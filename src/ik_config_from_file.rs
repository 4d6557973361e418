//! Supports reading the solver configuration from YAML file (optional)

use std::path::Path;

use yaml_rust2::{Yaml, YamlLoader};

use crate::ik_config::{Convergence, IkConfig};
use crate::parameter_error::ParameterError;

const ROOT: &str = "ik_solver";

impl IkConfig {
    /// Read the solver configuration from YAML file. YAML file like this is supported:
    /// ```yaml
    /// ik_solver:
    ///   max_iterations: 100
    ///   position_tolerance: 1.0e-4
    ///   rotation_tolerance: 1.0e-3
    ///   step_gain: 0.9
    ///   max_position_step: 0.1
    ///   max_rotation_step: 0.5
    ///   control_cycle: 0.002
    ///   manipulability_limit: 0.1
    ///   manipulability_gain: 0.001
    ///   sr_gain: 1.0
    /// ```
    /// Every field is optional and defaults to [`IkConfig::default`]. Giving
    /// `best_effort_tolerance` selects the best effort convergence mode; it cannot be
    /// combined with the position and rotation tolerances.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Same as [`IkConfig::from_yaml_file`], from a string.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let docs = YamlLoader::load_from_str(contents)
            .map_err(|e| ParameterError::ParseError(format!("{}", e)))?;
        let doc = docs.first()
            .ok_or_else(|| ParameterError::ParseError("empty document".to_string()))?;
        let params = &doc[ROOT];
        if params.is_badvalue() {
            return Err(ParameterError::MissingField(ROOT.to_string()));
        }

        let defaults = IkConfig::default();
        let (default_position, default_rotation) = match defaults.convergence {
            Convergence::Threshold { position, rotation } => (position, rotation),
            Convergence::BestEffort { .. } => (0.0, 0.0),
        };

        let position = optional_f64(params, "position_tolerance")?;
        let rotation = optional_f64(params, "rotation_tolerance")?;
        let best_effort = optional_f64(params, "best_effort_tolerance")?;

        let convergence = match (best_effort, position, rotation) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(ParameterError::InvalidValue(
                    "best_effort_tolerance cannot be combined with position or rotation tolerance".to_string(),
                ));
            }
            (Some(tolerance), None, None) => Convergence::BestEffort { tolerance },
            (None, position, rotation) => Convergence::Threshold {
                position: position.unwrap_or(default_position),
                rotation: rotation.unwrap_or(default_rotation),
            },
        };

        let max_iterations = match &params["max_iterations"] {
            Yaml::BadValue => defaults.max_iterations,
            value => value.as_i64()
                .filter(|&n| n > 0)
                .map(|n| n as usize)
                .ok_or_else(|| ParameterError::WrongType {
                    field: "max_iterations".to_string(),
                    expected: "a positive integer",
                })?,
        };

        let config = IkConfig {
            max_iterations,
            convergence,
            step_gain: optional_f64(params, "step_gain")?.unwrap_or(defaults.step_gain),
            max_position_step: optional_f64(params, "max_position_step")?.unwrap_or(defaults.max_position_step),
            max_rotation_step: optional_f64(params, "max_rotation_step")?.unwrap_or(defaults.max_rotation_step),
            control_cycle: optional_f64(params, "control_cycle")?.unwrap_or(defaults.control_cycle),
            manipulability_limit: optional_f64(params, "manipulability_limit")?
                .unwrap_or(defaults.manipulability_limit),
            manipulability_gain: optional_f64(params, "manipulability_gain")?
                .unwrap_or(defaults.manipulability_gain),
            sr_gain: optional_f64(params, "sr_gain")?.unwrap_or(defaults.sr_gain),
        };

        config.validate().map_err(|e| ParameterError::InvalidValue(e.to_string()))?;
        Ok(config)
    }
}

/// Numeric field that may be written either as integer or as real.
fn optional_f64(params: &Yaml, field: &str) -> Result<Option<f64>, ParameterError> {
    match &params[field] {
        Yaml::BadValue => Ok(None),
        Yaml::Integer(value) => Ok(Some(*value as f64)),
        value => value.as_f64().map(Some).ok_or_else(|| ParameterError::WrongType {
            field: field.to_string(),
            expected: "a number",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_file() {
        let yaml = "
ik_solver:
  max_iterations: 100
  position_tolerance: 1.0e-5
  rotation_tolerance: 2.0e-4
  step_gain: 0.5
  max_position_step: 0.05
  max_rotation_step: 0.25
  control_cycle: 0.004
  manipulability_limit: 0.2
  manipulability_gain: 0.01
  sr_gain: 2
";
        let config = IkConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.convergence, Convergence::Threshold { position: 1.0e-5, rotation: 2.0e-4 });
        assert_eq!(config.step_gain, 0.5);
        assert_eq!(config.max_position_step, 0.05);
        assert_eq!(config.max_rotation_step, 0.25);
        assert_eq!(config.control_cycle, 0.004);
        assert_eq!(config.manipulability_limit, 0.2);
        assert_eq!(config.manipulability_gain, 0.01);
        assert_eq!(config.sr_gain, 2.0);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let config = IkConfig::from_yaml_str("ik_solver:\n  step_gain: 0.7\n").unwrap();
        assert_eq!(config, IkConfig { step_gain: 0.7, ..IkConfig::default() });
    }

    #[test]
    fn test_best_effort() {
        let config = IkConfig::from_yaml_str("ik_solver:\n  best_effort_tolerance: 1.0e-6\n").unwrap();
        assert_eq!(config.convergence, Convergence::BestEffort { tolerance: 1.0e-6 });

        let mixed = "ik_solver:\n  best_effort_tolerance: 1.0e-6\n  position_tolerance: 1.0e-4\n";
        assert!(matches!(IkConfig::from_yaml_str(mixed), Err(ParameterError::InvalidValue(_))));
    }

    #[test]
    fn test_round_trip_through_to_yaml() {
        let config = IkConfig {
            max_iterations: 77,
            convergence: Convergence::BestEffort { tolerance: 1e-7 },
            sr_gain: 0.5,
            ..IkConfig::default()
        };
        assert_eq!(IkConfig::from_yaml_str(&config.to_yaml()).unwrap(), config);
        let config = IkConfig::default();
        assert_eq!(IkConfig::from_yaml_str(&config.to_yaml()).unwrap(), config);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(IkConfig::from_yaml_str("other: 1\n"), Err(ParameterError::MissingField(_))));
        assert!(matches!(IkConfig::from_yaml_str("ik_solver:\n  step_gain: fast\n"),
                         Err(ParameterError::WrongType { .. })));
        assert!(matches!(IkConfig::from_yaml_str("ik_solver:\n  max_iterations: -3\n"),
                         Err(ParameterError::WrongType { .. })));
        assert!(matches!(IkConfig::from_yaml_str("ik_solver:\n  step_gain: 3.0\n"),
                         Err(ParameterError::InvalidValue(_))));
        assert!(matches!(IkConfig::from_yaml_str("ik_solver: [unclosed\n"),
                         Err(ParameterError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = IkConfig::from_yaml_file("/nonexistent/ik_solver.yaml");
        assert!(matches!(result, Err(ParameterError::IoError(_))));
    }
}
