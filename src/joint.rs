//! Joint of the kinematic chain, with the state the solver mutates.

/// The avoidance cost every joint starts a solve with. Large enough that the first
/// iteration always sees the joint as "retreating" from its limit.
pub const AVOIDANCE_COST_RESET: f64 = 1.0e20;

#[derive(Debug, Clone)]
pub struct Joint {
    /// Human readable name, used in limit violation reports.
    pub name: String,

    /// Stable robot-wide identifier. Reference postures are indexed by this id.
    pub id: usize,

    /// Current angle, radians.
    pub angle: f64,

    /// Lower position limit, radians.
    pub lower_limit: f64,

    /// Upper position limit, radians.
    pub upper_limit: f64,

    /// Lower velocity limit, radians per second (normally negative).
    pub lower_velocity_limit: f64,

    /// Upper velocity limit, radians per second.
    pub upper_velocity_limit: f64,

    /// External tuning knob scaling this joint's share of the motion, 1.0 by default.
    pub optional_weight: f64,

    /// Chang-Dubey cost from the previous iteration, kept to implement
    /// hysteresis in the limit avoidance weighting.
    pub(crate) avoidance_cost: f64,
}

impl Joint {
    /// Joint with the given position limits, no velocity limits and zero angle.
    pub fn new(name: &str, id: usize, lower_limit: f64, upper_limit: f64) -> Self {
        Joint {
            name: name.to_string(),
            id,
            angle: 0.0,
            lower_limit,
            upper_limit,
            lower_velocity_limit: f64::NEG_INFINITY,
            upper_velocity_limit: f64::INFINITY,
            optional_weight: 1.0,
            avoidance_cost: AVOIDANCE_COST_RESET,
        }
    }

    /// Builder style setter for symmetric or asymmetric velocity limits.
    pub fn with_velocity_limits(mut self, lower: f64, upper: f64) -> Self {
        self.lower_velocity_limit = lower;
        self.upper_velocity_limit = upper;
        self
    }

    /// Builder style setter for the initial angle.
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Avoidance cost carried over from the previous iteration of the current solve.
    pub fn avoidance_cost(&self) -> f64 {
        self.avoidance_cost
    }

    pub(crate) fn reset_avoidance_cost(&mut self) {
        self.avoidance_cost = AVOIDANCE_COST_RESET;
    }

    /// Midpoint of the position range.
    pub fn mid_range(&self) -> f64 {
        (self.upper_limit + self.lower_limit) / 2.0
    }

    /// Half of the position range.
    pub fn half_range(&self) -> f64 {
        (self.upper_limit - self.lower_limit) / 2.0
    }
}
