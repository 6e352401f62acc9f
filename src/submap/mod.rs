//! Submap module
//!
//! A submap is a TSDF map fragment with its own pose, used as the unit of
//! registration in submap-based SLAM. It includes:
//! - tsdf_submap.rs: the submap itself, finalization and rigid transformation
//! - registration.rs: registration point extraction
//! - geometry.rs: submap-frame bounding boxes
//! - observer.rs: finalization reports
//! - summary.rs: serializable report

pub mod error;
pub mod geometry;
pub mod observer;
pub mod registration;
pub mod summary;
pub mod tsdf_submap;

pub use error::SubmapError;
pub use observer::{FinishStats, LogObserver, RecordingObserver, SubmapObserver};
pub use registration::{RegistrationPoint, RegistrationPointType, ISOSURFACE_DISTANCE_TOLERANCE};
pub use summary::SubmapSummary;
pub use tsdf_submap::{Submap, SubmapId};
