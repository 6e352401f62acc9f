//! # Test Data Generator
//!
//! Synthetic TSDF fields for tests and benchmarks. Distances are exact
//! signed distances to the shape, truncated to `±truncation`; every written
//! voxel gets the same weight.

use glam::{IVec3, Vec3};

use crate::fusion::{TsdfLayer, TsdfVoxel};

/// Fill every voxel in `[min, max)` with `sdf(voxel center)`
pub fn tsdf_from_fn<F>(
    voxel_size: f32,
    voxels_per_side: usize,
    min: IVec3,
    max: IVec3,
    weight: f32,
    sdf: F,
) -> TsdfLayer
where
    F: Fn(Vec3) -> f32,
{
    let mut layer = TsdfLayer::new(voxel_size, voxels_per_side);
    for z in min.z..max.z {
        for y in min.y..max.y {
            for x in min.x..max.x {
                let index = IVec3::new(x, y, z);
                let distance = sdf(layer.voxel_center(index));
                *layer.allocate_voxel(index) = TsdfVoxel::new(distance, weight);
            }
        }
    }
    layer
}

/// Horizontal plane `z = height` over an `extent` voxel grid starting at the origin
pub fn generate_plane(
    voxel_size: f32,
    voxels_per_side: usize,
    extent: IVec3,
    height: f32,
    truncation: f32,
) -> TsdfLayer {
    tsdf_from_fn(voxel_size, voxels_per_side, IVec3::ZERO, extent, 1.0, |p| {
        (p.z - height).clamp(-truncation, truncation)
    })
}

/// Sphere surrounded by a margin of `truncation` plus two voxels
pub fn generate_sphere(
    voxel_size: f32,
    voxels_per_side: usize,
    center: Vec3,
    radius: f32,
    truncation: f32,
) -> TsdfLayer {
    let reach = Vec3::splat(radius + truncation + 2.0 * voxel_size);
    let min = ((center - reach) / voxel_size).floor().as_ivec3();
    let max = ((center + reach) / voxel_size).ceil().as_ivec3();

    tsdf_from_fn(voxel_size, voxels_per_side, min, max, 1.0, |p| {
        (p.distance(center) - radius).clamp(-truncation, truncation)
    })
}

/// A field holding exactly one observed voxel
pub fn generate_single_voxel(
    voxel_size: f32,
    voxels_per_side: usize,
    index: IVec3,
    voxel: TsdfVoxel,
) -> TsdfLayer {
    let mut layer = TsdfLayer::new(voxel_size, voxels_per_side);
    *layer.allocate_voxel(index) = voxel;
    layer
}
