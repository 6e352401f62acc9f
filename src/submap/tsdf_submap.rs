//! TSDF submap: a spatially bounded map fragment with its own frame
//!
//! A submap owns its volumetric field and derives from it:
//! - an ESDF
//! - two registration point samplers (relevant voxels, isosurface vertices)
//! - two submap-frame bounding boxes (around the surface, around every block)
//!
//! While the submap is being built, poses are appended to its history and
//! the field is integrated through [`Submap::tsdf_mut`]. [`Submap::finish`]
//! computes all derived data. [`Submap::transform`] moves the field into a
//! new frame and finishes the submap again, so the derived data is never
//! observed half-updated.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use log::{debug, warn};

use crate::config::{ConfigError, RegistrationFilterConfig, SubmapConfig};
use crate::core::{transform_corners, BoundingBox, BoxCornerMatrix, Timestamp, SE3};
use crate::fusion::{EsdfLayer, TsdfLayer, VolumetricField};
use crate::sampling::WeightedSampler;
use crate::submap::geometry::{measure_submap_obb, measure_surface_obb};
use crate::submap::observer::{FinishStats, LogObserver, SubmapObserver};
use crate::submap::registration::{
    find_isosurface_vertices, find_relevant_voxels, RegistrationPoint, RegistrationPointType,
};
use crate::submap::summary::SubmapSummary;
use crate::submap::SubmapError;

pub type SubmapId = u64;

pub struct Submap<F: VolumetricField = TsdfLayer> {
    id: SubmapId,
    /// T_world_submap
    pose: SE3,
    config: SubmapConfig,
    tsdf: F,
    esdf: Option<EsdfLayer>,
    /// T_submap_robot keyed by capture time
    pose_history: BTreeMap<Timestamp, SE3>,
    finished: bool,
    /// Measured on first access, reset when the field or the filter changes
    surface_obb: OnceLock<BoundingBox>,
    submap_obb: OnceLock<BoundingBox>,
    relevant_voxels: WeightedSampler<RegistrationPoint>,
    isosurface_vertices: WeightedSampler<RegistrationPoint>,
    last_finish_stats: Option<FinishStats>,
    observer: Arc<dyn SubmapObserver>,
}

impl Submap<TsdfLayer> {
    /// Create an empty submap. Fails if `config` does not validate.
    pub fn new(pose: SE3, id: SubmapId, config: SubmapConfig) -> Result<Self, ConfigError> {
        let tsdf = TsdfLayer::new(config.voxel_size, config.voxels_per_side);
        Self::with_field(pose, id, config, tsdf)
    }

    /// Create a submap around an existing TSDF layer, adopting its resolution
    pub fn from_tsdf_layer(pose: SE3, id: SubmapId, tsdf: TsdfLayer) -> Result<Self, ConfigError> {
        let config = SubmapConfig {
            voxel_size: tsdf.voxel_size(),
            voxels_per_side: tsdf.voxels_per_side(),
            ..SubmapConfig::default()
        };
        Self::with_field(pose, id, config, tsdf)
    }
}

impl<F: VolumetricField> Submap<F> {
    /// Fails if `config` does not validate
    pub fn with_field(pose: SE3, id: SubmapId, config: SubmapConfig, tsdf: F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id,
            pose,
            config,
            tsdf,
            esdf: None,
            pose_history: BTreeMap::new(),
            finished: false,
            surface_obb: OnceLock::new(),
            submap_obb: OnceLock::new(),
            relevant_voxels: WeightedSampler::new(),
            isosurface_vertices: WeightedSampler::new(),
            last_finish_stats: None,
            observer: Arc::new(LogObserver),
        })
    }

    /// Replace the observer receiving finalization reports
    pub fn with_observer(mut self, observer: Arc<dyn SubmapObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn id(&self) -> SubmapId {
        self.id
    }

    /// T_world_submap
    pub fn pose(&self) -> SE3 {
        self.pose
    }

    pub fn set_pose(&mut self, pose: SE3) {
        self.pose = pose;
    }

    pub fn config(&self) -> &SubmapConfig {
        &self.config
    }

    /// Changing the filter drops the cached surface box; samplers are only
    /// rebuilt by the next [`Submap::finish`].
    pub fn set_registration_filter_config(&mut self, filter: RegistrationFilterConfig) {
        self.config.registration_filter = filter;
        self.surface_obb.take();
    }

    pub fn tsdf(&self) -> &F {
        &self.tsdf
    }

    /// Mutable field access for integration. Drops the cached bounding boxes.
    pub fn tsdf_mut(&mut self) -> &mut F {
        self.surface_obb.take();
        self.submap_obb.take();
        &mut self.tsdf
    }

    /// ESDF from the last finalization
    pub fn esdf(&self) -> Option<&EsdfLayer> {
        self.esdf.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn last_finish_stats(&self) -> Option<FinishStats> {
        self.last_finish_stats
    }

    pub fn pose_history(&self) -> &BTreeMap<Timestamp, SE3> {
        &self.pose_history
    }

    /// Record a robot pose given in world frame, stored in submap frame.
    /// An existing entry at the same timestamp is kept.
    pub fn add_pose_to_history(&mut self, timestamp: Timestamp, t_world_robot: &SE3) -> Result<(), SubmapError> {
        if self.pose_history.contains_key(&timestamp) {
            warn!("submap {}: duplicate pose at {}", self.id, timestamp);
            return Err(SubmapError::DuplicatePoseTimestamp(timestamp));
        }

        let t_submap_robot = self.pose.inverse() * *t_world_robot;
        self.pose_history.insert(timestamp, t_submap_robot);
        Ok(())
    }

    /// Earliest pose timestamp, `Timestamp::ZERO` without history
    pub fn creation_time(&self) -> Timestamp {
        self.pose_history
            .keys()
            .next()
            .copied()
            .unwrap_or(Timestamp::ZERO)
    }

    /// Compute the ESDF, the bounding boxes and both registration point pools.
    ///
    /// Calling it again recomputes everything from the current field. If the
    /// extraction fails the submap is left unfinished, without ESDF or
    /// registration points.
    pub fn finish(&mut self) -> Result<FinishStats, SubmapError> {
        self.finished = false;
        self.esdf = None;
        self.last_finish_stats = None;

        let esdf = self.tsdf.generate_esdf(&self.config.esdf);
        self.update_bounding_boxes();

        let filter = self.config.registration_filter;
        let relevant_voxels = match find_relevant_voxels(&self.tsdf, &esdf, &filter, &mut self.relevant_voxels) {
            Ok(count) => count,
            Err(err) => {
                warn!("submap {}: finish aborted: {}", self.id, err);
                self.relevant_voxels.clear();
                self.isosurface_vertices.clear();
                return Err(err);
            }
        };
        self.esdf = Some(esdf);

        let (id, observer) = (self.id, Arc::clone(&self.observer));
        let counts = find_isosurface_vertices(&self.tsdf, &filter, &mut self.isosurface_vertices, |position, distance| {
            observer.on_isosurface_inconsistency(id, position, distance)
        });

        let stats = FinishStats {
            relevant_voxels,
            isosurface_vertices: counts.admitted,
            skipped_vertices: counts.skipped,
            inconsistent_vertices: counts.inconsistent,
        };
        self.observer.on_submap_finished(self.id, &stats);

        self.last_finish_stats = Some(stats);
        self.finished = true;
        Ok(stats)
    }

    /// Move the submap content by `t_new_old` and regenerate all derived data.
    ///
    /// The field is resampled, every history entry becomes `t_new_old * entry`
    /// and the submap pose becomes `pose * t_new_old^-1`, so world-frame
    /// geometry stays where it was.
    pub fn transform(&mut self, t_new_old: &SE3) -> Result<FinishStats, SubmapError> {
        debug!("submap {}: transforming content", self.id);
        self.tsdf = self.tsdf.resample(t_new_old);
        self.surface_obb.take();
        self.submap_obb.take();

        for t_submap_robot in self.pose_history.values_mut() {
            *t_submap_robot = *t_new_old * *t_submap_robot;
        }
        self.pose = self.pose * t_new_old.inverse();

        self.finish()
    }

    /// Cached registration points; only available once finished
    pub fn registration_points(
        &self,
        registration_point_type: RegistrationPointType,
    ) -> Result<&WeightedSampler<RegistrationPoint>, SubmapError> {
        if !self.finished {
            return Err(SubmapError::NotFinished { id: self.id });
        }
        Ok(match registration_point_type {
            RegistrationPointType::Voxels => &self.relevant_voxels,
            RegistrationPointType::IsosurfacePoints => &self.isosurface_vertices,
        })
    }

    /// Measure and cache any bounding box that is not cached yet
    pub fn update_bounding_boxes(&self) {
        self.submap_frame_surface_obb();
        self.submap_frame_submap_obb();
    }

    /// Cached surface box, `None` until measured
    pub fn cached_surface_obb(&self) -> Option<BoundingBox> {
        self.surface_obb.get().copied()
    }

    pub fn cached_submap_obb(&self) -> Option<BoundingBox> {
        self.submap_obb.get().copied()
    }

    /// Submap-frame box around all relevant voxels.
    /// The first call after a change scans the field, later calls are O(1).
    pub fn submap_frame_surface_obb(&self) -> BoundingBox {
        *self
            .surface_obb
            .get_or_init(|| measure_surface_obb(&self.tsdf, &self.config.registration_filter))
    }

    /// Submap-frame box around all allocated blocks, measured once per change
    pub fn submap_frame_submap_obb(&self) -> BoundingBox {
        *self.submap_obb.get_or_init(|| measure_submap_obb(&self.tsdf))
    }

    pub fn world_frame_surface_obb_corners(&self) -> BoxCornerMatrix {
        transform_corners(&self.submap_frame_surface_obb().corner_coordinates(), &self.pose)
    }

    pub fn world_frame_submap_obb_corners(&self) -> BoxCornerMatrix {
        transform_corners(&self.submap_frame_submap_obb().corner_coordinates(), &self.pose)
    }

    pub fn world_frame_surface_aabb(&self) -> BoundingBox {
        BoundingBox::aabb_from_obb_and_pose(&self.submap_frame_surface_obb(), &self.pose)
    }

    pub fn world_frame_submap_aabb(&self) -> BoundingBox {
        BoundingBox::aabb_from_obb_and_pose(&self.submap_frame_submap_obb(), &self.pose)
    }

    pub fn world_frame_surface_aabb_corners(&self) -> BoxCornerMatrix {
        self.world_frame_surface_aabb().corner_coordinates()
    }

    pub fn world_frame_submap_aabb_corners(&self) -> BoxCornerMatrix {
        self.world_frame_submap_aabb().corner_coordinates()
    }

    /// World-frame surface AABBs intersect. Measures either surface box on
    /// first use, so repeated tests against the same submaps are O(1).
    // TODO: test the oriented boxes instead of their AABBs to cut false positives for rotated submaps
    pub fn overlaps_with<G: VolumetricField>(&self, other: &Submap<G>) -> bool {
        self.world_frame_surface_aabb()
            .intersects(&other.world_frame_surface_aabb())
    }

    pub fn summary(&self) -> SubmapSummary {
        let valid = |bbox: BoundingBox| bbox.is_valid().then_some(bbox);
        SubmapSummary {
            id: self.id,
            finished: self.finished,
            creation_time: self.creation_time(),
            num_poses: self.pose_history.len(),
            relevant_voxels: self.relevant_voxels.size(),
            isosurface_vertices: self.isosurface_vertices.size(),
            world_surface_aabb: valid(self.world_frame_surface_aabb()),
            world_submap_aabb: valid(self.world_frame_submap_aabb()),
            last_finish: self.last_finish_stats,
        }
    }
}
