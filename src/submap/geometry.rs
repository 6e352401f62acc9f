//! Bounding box measurement in submap frame

use glam::Vec3;

use crate::config::RegistrationFilterConfig;
use crate::core::BoundingBox;
use crate::fusion::VolumetricField;
use crate::submap::registration::is_relevant_voxel;

/// Box around the volumes of all relevant voxels
pub fn measure_surface_obb<F: VolumetricField>(field: &F, filter: &RegistrationFilterConfig) -> BoundingBox {
    let half_voxel = Vec3::splat(0.5 * field.voxel_size());
    let mut obb = BoundingBox::unset();

    for block_index in field.allocated_block_indices() {
        let Some(block) = field.tsdf_block(&block_index) else {
            continue;
        };
        for (linear_index, voxel) in block.voxels().iter().enumerate() {
            if is_relevant_voxel(voxel, filter) {
                obb.grow(block.coordinates_from_linear_index(linear_index), half_voxel);
            }
        }
    }
    obb
}

/// Box around every allocated block
pub fn measure_submap_obb<F: VolumetricField>(field: &F) -> BoundingBox {
    let half_block = Vec3::splat(0.5 * field.block_size());
    let mut obb = BoundingBox::unset();

    for block_index in field.allocated_block_indices() {
        let center = (block_index.as_vec3() + Vec3::splat(0.5)) * field.block_size();
        obb.grow(center, half_block);
    }
    obb
}
