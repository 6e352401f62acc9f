//! Volumetric field module
//!
//! Everything the submap needs from the volumetric map:
//! - layer.rs: block-hashed voxel storage
//! - tsdf_volume.rs: TSDF voxels, interpolation and rigid resampling
//! - esdf.rs: ESDF generation from a TSDF layer
//! - marching_cubes.rs: isosurface extraction
//! - mesh_extractor.rs: connected mesh extraction for registration
//!
//! The submap only talks to its field through [`VolumetricField`], so a
//! different fusion backend can be plugged in without touching the submap.

pub mod layer;
pub mod tsdf_volume;
pub mod esdf;
pub mod marching_cubes;
pub mod mesh_extractor;

pub use layer::{Block, BlockIndex, GlobalVoxelIndex, Layer};
pub use tsdf_volume::{TsdfLayer, TsdfVoxel, MIN_OBSERVED_WEIGHT};
pub use esdf::{generate_esdf, EsdfLayer, EsdfVoxel};
pub use marching_cubes::{extract_mesh_from_tsdf, Mesh, MeshTriangle};
pub use mesh_extractor::{extract_connected_mesh, MeshExtractionConfig};

use glam::Vec3;

use crate::config::EsdfConfig;
use crate::core::SE3;

/// Narrow interface to a TSDF-backed volumetric map
pub trait VolumetricField {
    fn voxel_size(&self) -> f32;

    fn voxels_per_side(&self) -> usize;

    fn block_size(&self) -> f32 {
        self.voxel_size() * self.voxels_per_side() as f32
    }

    /// All allocated blocks, in a deterministic order
    fn allocated_block_indices(&self) -> Vec<BlockIndex>;

    fn tsdf_block(&self, index: &BlockIndex) -> Option<&Block<TsdfVoxel>>;

    /// Distance and weight at an arbitrary point; `None` outside known space
    fn interpolate(&self, point: Vec3) -> Option<TsdfVoxel>;

    /// Apply the rigid transform `t_new_old` to the field
    fn resample(&self, t_new_old: &SE3) -> Self
    where
        Self: Sized;

    /// Connected isosurface mesh built from voxels with weight above `min_weight`
    fn extract_mesh(&self, config: &MeshExtractionConfig) -> Mesh;

    fn generate_esdf(&self, config: &EsdfConfig) -> EsdfLayer;
}

impl VolumetricField for TsdfLayer {
    fn voxel_size(&self) -> f32 {
        Layer::voxel_size(self)
    }

    fn voxels_per_side(&self) -> usize {
        Layer::voxels_per_side(self)
    }

    fn allocated_block_indices(&self) -> Vec<BlockIndex> {
        Layer::allocated_block_indices(self)
    }

    fn tsdf_block(&self, index: &BlockIndex) -> Option<&Block<TsdfVoxel>> {
        self.block(index)
    }

    fn interpolate(&self, point: Vec3) -> Option<TsdfVoxel> {
        Layer::interpolate(self, point)
    }

    fn resample(&self, t_new_old: &SE3) -> Self {
        Layer::resample(self, t_new_old)
    }

    fn extract_mesh(&self, config: &MeshExtractionConfig) -> Mesh {
        extract_connected_mesh(self, config)
    }

    fn generate_esdf(&self, config: &EsdfConfig) -> EsdfLayer {
        generate_esdf(self, config)
    }
}
