//! Parameterizations shared with the pose graph backend

pub mod angle_parameterization;

pub use angle_parameterization::{normalize_angle, AngleLocalParameterization};
