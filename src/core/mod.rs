//! Core geometric types for RustSubmap

pub mod pose;
pub mod bounding_box;
pub mod time;

pub use pose::SE3;
pub use bounding_box::{transform_corners, BoundingBox, BoxCornerMatrix};
pub use time::Timestamp;
