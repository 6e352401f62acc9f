//! Serializable submap report

use serde::Serialize;

use crate::core::{BoundingBox, Timestamp};
use crate::submap::observer::FinishStats;
use crate::submap::SubmapId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmapSummary {
    pub id: SubmapId,
    pub finished: bool,
    pub creation_time: Timestamp,
    pub num_poses: usize,
    pub relevant_voxels: usize,
    pub isosurface_vertices: usize,
    /// `None` while the submap has no relevant voxels
    pub world_surface_aabb: Option<BoundingBox>,
    /// `None` while no block is allocated
    pub world_submap_aabb: Option<BoundingBox>,
    pub last_finish: Option<FinishStats>,
}

impl SubmapSummary {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_summary_json() {
        let summary = SubmapSummary {
            id: 7,
            finished: true,
            creation_time: Timestamp::from_nanos(1_500_000_000),
            num_poses: 2,
            relevant_voxels: 10,
            isosurface_vertices: 4,
            world_surface_aabb: Some(BoundingBox::new(Vec3::ZERO, Vec3::ONE)),
            world_submap_aabb: None,
            last_finish: Some(FinishStats::default()),
        };

        let json = summary.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["finished"], true);
        assert_eq!(value["num_poses"], 2);
        assert!(value["world_submap_aabb"].is_null());
        assert_eq!(value["last_finish"]["inconsistent_vertices"], 0);
    }
}
