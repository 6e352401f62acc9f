//! Euclidean signed distance field generated from a TSDF layer
//!
//! Voxels close to the surface are copied from the TSDF and kept fixed.
//! Their distances are then propagated outward over 6-connected neighbours,
//! one voxel length per step, up to `max_distance`. The sign of a voxel comes
//! from its own TSDF observation, or from the voxel it was reached from when
//! it was never observed.

use std::collections::VecDeque;

use glam::IVec3;

use crate::config::EsdfConfig;
use crate::fusion::layer::{GlobalVoxelIndex, Layer};
use crate::fusion::tsdf_volume::TsdfLayer;

const NEIGHBOR_OFFSETS: [IVec3; 6] = [
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EsdfVoxel {
    pub distance: f32,
    /// The corresponding TSDF voxel was observed
    pub observed: bool,
    /// Seeded directly from the TSDF, never updated by propagation
    pub fixed: bool,
}

pub type EsdfLayer = Layer<EsdfVoxel>;

/// Build an ESDF covering exactly the blocks allocated in `tsdf`
pub fn generate_esdf(tsdf: &TsdfLayer, config: &EsdfConfig) -> EsdfLayer {
    let mut esdf = EsdfLayer::new(tsdf.voxel_size(), tsdf.voxels_per_side());
    let mut open: VecDeque<GlobalVoxelIndex> = VecDeque::new();

    for block in tsdf.blocks() {
        let esdf_block = esdf.allocate_block(block.index());
        for (linear_index, tsdf_voxel) in block.voxels().iter().enumerate() {
            let observed = tsdf_voxel.weight > config.min_weight;
            let fixed = observed && tsdf_voxel.distance.abs() < config.fixed_band_distance;
            let distance = if fixed {
                tsdf_voxel.distance
            } else if observed {
                config.max_distance.copysign(tsdf_voxel.distance)
            } else {
                config.max_distance
            };

            if let Some(esdf_voxel) = esdf_block.voxel_by_linear_index_mut(linear_index) {
                *esdf_voxel = EsdfVoxel {
                    distance,
                    observed,
                    fixed,
                };
            }
            if fixed {
                open.push_back(block.global_index_from_linear_index(linear_index));
            }
        }
    }

    let step = tsdf.voxel_size();
    while let Some(index) = open.pop_front() {
        let Some(current) = esdf.voxel(index).copied() else {
            continue;
        };
        let candidate = current.distance.abs() + step;
        if candidate > config.max_distance {
            continue;
        }

        for offset in NEIGHBOR_OFFSETS {
            let neighbor_index = index + offset;
            let Some(neighbor) = esdf.voxel_mut(neighbor_index) else {
                continue;
            };
            if neighbor.fixed || candidate >= neighbor.distance.abs() {
                continue;
            }

            let sign_source = if neighbor.observed {
                neighbor.distance
            } else {
                current.distance
            };
            neighbor.distance = candidate.copysign(sign_source);
            open.push_back(neighbor_index);
        }
    }

    esdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::tsdf_volume::TsdfVoxel;

    fn config() -> EsdfConfig {
        EsdfConfig {
            max_distance: 1.0,
            min_weight: 1e-6,
            fixed_band_distance: 0.15,
        }
    }

    #[test]
    fn test_esdf_matches_tsdf_blocks() {
        let mut tsdf = TsdfLayer::new(0.1, 4);
        *tsdf.allocate_voxel(IVec3::new(0, 0, 0)) = TsdfVoxel::new(0.05, 1.0);
        *tsdf.allocate_voxel(IVec3::new(9, 0, 0)) = TsdfVoxel::new(0.05, 1.0);

        let esdf = generate_esdf(&tsdf, &config());
        assert_eq!(esdf.allocated_block_indices(), tsdf.allocated_block_indices());
    }

    #[test]
    fn test_distances_propagate_from_fixed_voxels() {
        let mut tsdf = TsdfLayer::new(0.1, 8);
        // Observed, positive everywhere along the x row; surface voxel at x = 0
        for x in 0..8 {
            *tsdf.allocate_voxel(IVec3::new(x, 0, 0)) = TsdfVoxel::new(0.05 + 0.1 * x as f32, 1.0);
        }

        let esdf = generate_esdf(&tsdf, &config());
        let seed = esdf.voxel(IVec3::new(0, 0, 0)).unwrap();
        assert!(seed.fixed);
        assert!((seed.distance - 0.05).abs() < 1e-6);

        let third = esdf.voxel(IVec3::new(3, 0, 0)).unwrap();
        assert!(!third.fixed);
        assert!((third.distance - 0.35).abs() < 1e-5);

        // Unobserved voxels are reached too and inherit the sign of their source
        let above = esdf.voxel(IVec3::new(0, 1, 0)).unwrap();
        assert!(!above.observed);
        assert!((above.distance - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_negative_side_keeps_sign() {
        let mut tsdf = TsdfLayer::new(0.1, 8);
        *tsdf.allocate_voxel(IVec3::new(0, 0, 0)) = TsdfVoxel::new(-0.05, 1.0);
        *tsdf.allocate_voxel(IVec3::new(1, 0, 0)) = TsdfVoxel::new(-0.5, 1.0);

        let esdf = generate_esdf(&tsdf, &config());
        let neighbor = esdf.voxel(IVec3::new(1, 0, 0)).unwrap();
        assert!((neighbor.distance + 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_propagation_is_capped() {
        let mut tsdf = TsdfLayer::new(0.1, 16);
        *tsdf.allocate_voxel(IVec3::new(0, 0, 0)) = TsdfVoxel::new(0.0, 1.0);

        let esdf = generate_esdf(&tsdf, &config());
        let far = esdf.voxel(IVec3::new(15, 15, 15)).unwrap();
        assert!((far.distance - 1.0).abs() < 1e-6);
    }
}
