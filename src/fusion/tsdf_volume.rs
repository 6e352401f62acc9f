//! TSDF voxels and the queries the submap needs from them
//!
//! Point interpolation follows the usual trilinear scheme over the 8 voxel
//! centers surrounding a point. It only succeeds when all 8 voxels exist and
//! have been observed, so callers can tell known space from unknown space.

use std::collections::HashSet;

use glam::{IVec3, Vec3};

use crate::core::{BoundingBox, SE3};
use crate::fusion::layer::{Block, BlockIndex, Layer};

/// Voxels with a weight below this are treated as never observed
pub const MIN_OBSERVED_WEIGHT: f32 = 1e-6;

/// A voxel of the truncated signed distance field
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TsdfVoxel {
    /// Signed distance to the surface, negative behind it
    pub distance: f32,
    /// Accumulated integration weight
    pub weight: f32,
}

impl TsdfVoxel {
    pub fn new(distance: f32, weight: f32) -> Self {
        Self { distance, weight }
    }

    pub fn is_observed(&self) -> bool {
        self.weight >= MIN_OBSERVED_WEIGHT
    }
}

pub type TsdfLayer = Layer<TsdfVoxel>;

impl Layer<TsdfVoxel> {
    /// Trilinearly interpolate distance and weight at `point`
    pub fn interpolate(&self, point: Vec3) -> Option<TsdfVoxel> {
        // Offset by half a voxel so the grid lattice sits on voxel centers
        let scaled = point / self.voxel_size() - Vec3::splat(0.5);
        let base = scaled.floor();
        let fraction = scaled - base;
        let base = base.as_ivec3();

        let mut distance = 0.0;
        let mut weight = 0.0;
        for corner in 0..8 {
            let offset = IVec3::new(corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
            let voxel = self.voxel(base + offset)?;
            if !voxel.is_observed() {
                return None;
            }

            let coefficient = (0..3)
                .map(|axis| {
                    if offset[axis] == 1 {
                        fraction[axis]
                    } else {
                        1.0 - fraction[axis]
                    }
                })
                .product::<f32>();
            distance += coefficient * voxel.distance;
            weight += coefficient * voxel.weight;
        }

        Some(TsdfVoxel { distance, weight })
    }

    /// The observed voxel containing `point`, if any
    pub fn nearest_observed_voxel(&self, point: Vec3) -> Option<TsdfVoxel> {
        self.voxel(self.global_index_from_point(point))
            .filter(|voxel| voxel.is_observed())
            .copied()
    }

    /// Resample the layer under the rigid transform `t_new_old`.
    ///
    /// Every target voxel looks up the source field at its center mapped back
    /// into the source frame, trilinearly where possible and otherwise from
    /// the nearest observed voxel. Target blocks that receive no data are not
    /// kept.
    pub fn resample(&self, t_new_old: &SE3) -> TsdfLayer {
        let t_old_new = t_new_old.inverse();
        let half_block = Vec3::splat(0.5 * self.block_size());

        let mut target_indices: HashSet<BlockIndex> = HashSet::new();
        for block in self.blocks() {
            let source_box = BoundingBox::new(block.center() - half_block, block.center() + half_block);
            let target_box = BoundingBox::aabb_from_obb_and_pose(&source_box, t_new_old);
            let lo = self.block_index_from_point(target_box.min);
            let hi = self.block_index_from_point(target_box.max);
            for x in lo.x..=hi.x {
                for y in lo.y..=hi.y {
                    for z in lo.z..=hi.z {
                        target_indices.insert(IVec3::new(x, y, z));
                    }
                }
            }
        }

        let mut resampled = TsdfLayer::new(self.voxel_size(), self.voxels_per_side());
        for index in target_indices {
            let mut block = Block::new(index, self.voxels_per_side(), self.voxel_size());
            let mut received_data = false;

            for linear_index in 0..block.num_voxels() {
                let source_point = t_old_new.transform_point(block.coordinates_from_linear_index(linear_index));
                let sampled = self
                    .interpolate(source_point)
                    .or_else(|| self.nearest_observed_voxel(source_point));

                if let (Some(voxel), Some(target)) = (sampled, block.voxel_by_linear_index_mut(linear_index)) {
                    *target = voxel;
                    received_data = true;
                }
            }

            if received_data {
                resampled.insert_block(block);
            }
        }

        resampled
    }

    /// Number of voxels with a non-negligible weight
    pub fn num_observed_voxels(&self) -> usize {
        self.blocks()
            .map(|block| block.voxels().iter().filter(|v| v.is_observed()).count())
            .sum()
    }
}
