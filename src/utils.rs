//! Helper functions

/// Checks if all elements in the slice are finite
pub fn is_valid(qs: &[f64]) -> bool {
    qs.iter().all(|&q| q.is_finite())
}

/// Print joint values, converting radians to degrees.
#[allow(dead_code)]
pub fn dump_joints(joints: &[f64]) {
    println!("[{}]", format_joints(joints));
}

/// Joint values in degrees, as a single line.
pub fn format_joints(joints: &[f64]) -> String {
    let mut row_str = String::new();
    for computed in joints {
        row_str.push_str(&format!("{:5.2} ", computed.to_degrees()));
    }
    row_str.trim_end().to_string()
}

/// Allows to specify joint values in degrees (converts to radians)
#[allow(dead_code)]
pub fn as_radians(degrees: &[i32]) -> Vec<f64> {
    degrees.iter().map(|d| (*d as f64).to_radians()).collect()
}
