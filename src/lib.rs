//! RustSubmap - submap bookkeeping for volumetric SLAM
//!
//! A submap owns a TSDF fragment of the map together with its pose, its pose
//! history and the data derived from its field: ESDF, registration point
//! samplers and bounding boxes.
//!
//! ## Quick Start
//!
//! ```rust
//! use glam::Vec3;
//! use rustsubmap::{RegistrationPointType, Submap, SE3};
//! use rustsubmap::test_data::generate_sphere;
//!
//! let layer = generate_sphere(0.1, 8, Vec3::splat(0.8), 0.4, 0.3);
//! let mut submap = Submap::from_tsdf_layer(SE3::identity(), 0, layer).unwrap();
//! submap.finish().unwrap();
//!
//! let points = submap.registration_points(RegistrationPointType::Voxels).unwrap();
//! assert!(!points.is_empty());
//! ```

// Re-export core types
pub use crate::core::{BoundingBox, BoxCornerMatrix, Timestamp, SE3};
pub use crate::config::{ConfigError, EsdfConfig, RegistrationFilterConfig, SubmapConfig};
pub use crate::fusion::{EsdfLayer, Mesh, TsdfLayer, TsdfVoxel, VolumetricField};
pub use crate::sampling::WeightedSampler;
pub use crate::submap::{
    FinishStats, RegistrationPoint, RegistrationPointType, Submap, SubmapError, SubmapId,
    SubmapObserver, SubmapSummary,
};

// Modules
pub mod core;
pub mod sampling;
pub mod fusion;
pub mod submap;
pub mod optimizer;
pub mod config;
pub mod test_data;
