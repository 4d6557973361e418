use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nalgebra::{Rotation3, Vector3};
use tracing_subscriber::EnvFilter;

use rs_jointpath_ik::ik_config::IkConfig;
use rs_jointpath_ik::joint::Joint;
use rs_jointpath_ik::kinematic_chain::KinematicChain;
use rs_jointpath_ik::nullspace::Objectives;
use rs_jointpath_ik::observer::TraceRecorder;
use rs_jointpath_ik::serial_arm::SerialArm;
use rs_jointpath_ik::solver::IkSolver;
use rs_jointpath_ik::utils::{as_radians, format_joints};

/// Moves the end link of a 7 axis arm by the given offset and prints how the solver got there.
/// Set RUST_LOG=rs_jointpath_ik=debug to see every iteration.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Solver configuration (YAML with the ik_solver mapping). Defaults are used if not given.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Offset of the target along X, meters.
    #[arg(long, default_value_t = 0.1, allow_hyphen_values = true)]
    dx: f64,

    /// Offset of the target along Y, meters.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    dy: f64,

    /// Offset of the target along Z, meters.
    #[arg(long, default_value_t = -0.05, allow_hyphen_values = true)]
    dz: f64,

    /// Additional rotation of the target about the world Z axis, degrees.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    yaw: f64,

    /// Gain of the nullspace joint limit avoidance.
    #[arg(long, default_value_t = 0.001)]
    avoid_gain: f64,

    /// Gain pulling the arm towards its starting posture.
    #[arg(long, default_value_t = 0.0)]
    reference_gain: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rs_jointpath_ik=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => IkConfig::from_yaml_file(path)
            .with_context(|| format!("reading solver configuration from {}", path.display()))?,
        None => IkConfig::default(),
    };
    println!("Solver configuration:\n{}", config.to_yaml());

    let limits = [170, 120, 170, 120, 170, 120, 175];
    let joints = limits
        .iter()
        .enumerate()
        .map(|(i, &limit)| {
            let limit = (limit as f64).to_radians();
            Joint::new(&format!("joint_{}", i + 1), i, -limit, limit)
        })
        .collect();
    let mut chain = KinematicChain::new(Arc::new(SerialArm::seven_axis()), joints)?;
    let start = as_radians(&[0, 30, 0, -70, 0, 40, 0]);
    chain.set_angles(&start)?;
    println!("Start:  [{}]", format_joints(&chain.angles()));

    let pose = *chain.end_pose();
    let target_position = pose.translation.vector + Vector3::new(args.dx, args.dy, args.dz);
    let target_rotation =
        Rotation3::from_axis_angle(&Vector3::z_axis(), args.yaw.to_radians()) * pose.rotation.to_rotation_matrix();

    let objectives = Objectives::tracking(args.reference_gain, &start).with_avoid_gain(args.avoid_gain);
    let solver = IkSolver::new(config);
    let mut recorder = TraceRecorder::default();
    let result = solver.solve_observed(
        &mut chain,
        &target_position,
        target_rotation.matrix(),
        &objectives,
        &mut recorder,
    );

    for trace in &recorder.iterations {
        println!(
            "{:3}: |dp| {:.6} |w| {:.6} m {} ratio {}",
            trace.iteration,
            trace.position_error.norm(),
            trace.rotation_error.norm(),
            trace.manipulability.map_or("-".to_string(), |m| format!("{:.4}", m)),
            trace.speed_ratio.map_or("-".to_string(), |r| format!("{:.3}", r)),
        );
    }
    for violation in &recorder.violations {
        println!(
            "Iteration {}: {} clamped from {:.2} to {:.2} degrees",
            violation.iteration,
            violation.joint,
            violation.requested.to_degrees(),
            violation.clamped_to.to_degrees()
        );
    }

    let report = result.context("solving inverse kinematics")?;
    println!(
        "Converged after {} iterations, position error {:e}, rotation error {:e}",
        report.iterations, report.position_error, report.rotation_error
    );
    println!("Result: [{}]", format_joints(&chain.angles()));
    Ok(())
}
