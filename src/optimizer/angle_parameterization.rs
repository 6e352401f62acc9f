//! Heading angle as a manifold-valued parameter
//!
//! Pose graph solvers update a yaw angle with `theta ⊞ delta`, which has to
//! stay in `[-π, π)` for the residuals to remain continuous.

use std::f64::consts::PI;

/// Wrap an angle into `[-π, π)`
pub fn normalize_angle(angle_radians: f64) -> f64 {
    let two_pi = 2.0 * PI;
    angle_radians - two_pi * ((angle_radians + PI) / two_pi).floor()
}

/// Local parameterization of a single angle
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleLocalParameterization;

impl AngleLocalParameterization {
    pub const GLOBAL_SIZE: usize = 1;
    pub const LOCAL_SIZE: usize = 1;

    /// `theta ⊞ delta`
    pub fn plus(&self, theta_radians: f64, delta_theta_radians: f64) -> f64 {
        normalize_angle(theta_radians + delta_theta_radians)
    }
}
