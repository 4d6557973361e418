//! Observability hook of the solver. The solver always logs through `tracing`; an observer
//! additionally receives the same information as data, which is handy for tests and tuning.

use nalgebra::{DVector, Vector3};

/// What happened in one iteration of the solve.
#[derive(Debug, Clone)]
pub struct IterationTrace {
    pub iteration: usize,

    /// Clipped position error.
    pub position_error: Vector3<f64>,

    /// Clipped rotation error (world frame rotation vector).
    pub rotation_error: Vector3<f64>,

    /// Manipulability of the Jacobian, `None` if the iteration converged before computing it.
    pub manipulability: Option<f64>,

    /// Damping used for the SR-inverse.
    pub damping: Option<f64>,

    /// Joint weights used for the SR-inverse.
    pub weights: Option<DVector<f64>>,

    /// Ratio the joint step was scaled by to respect velocity limits.
    pub speed_ratio: Option<f64>,

    /// The joint step before the step gain was applied.
    pub step: Option<DVector<f64>>,
}

impl IterationTrace {
    pub(crate) fn new(iteration: usize, position_error: Vector3<f64>, rotation_error: Vector3<f64>) -> Self {
        IterationTrace {
            iteration,
            position_error,
            rotation_error,
            manipulability: None,
            damping: None,
            weights: None,
            speed_ratio: None,
            step: None,
        }
    }
}

/// A joint was driven past its position limit and clamped back.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitViolation {
    pub iteration: usize,
    pub joint: String,

    /// The angle the step asked for.
    pub requested: f64,

    /// The limit the joint was clamped to.
    pub clamped_to: f64,

    /// True for the upper limit.
    pub upper: bool,
}

pub trait SolveObserver {
    fn iteration(&mut self, _trace: &IterationTrace) {}

    fn limit_violation(&mut self, _violation: &LimitViolation) {}
}

/// No observer.
impl SolveObserver for () {}

/// Collects everything it observes.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    pub iterations: Vec<IterationTrace>,
    pub violations: Vec<LimitViolation>,
}

impl SolveObserver for TraceRecorder {
    fn iteration(&mut self, trace: &IterationTrace) {
        self.iterations.push(trace.clone());
    }

    fn limit_violation(&mut self, violation: &LimitViolation) {
        self.violations.push(violation.clone());
    }
}
