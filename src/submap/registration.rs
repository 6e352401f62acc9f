//! Registration point extraction
//!
//! Two independent pools of weighted registration candidates are built from
//! a submap's fields:
//! - relevant voxels: observed TSDF voxels inside the truncation band
//! - isosurface vertices: vertices of the reconstructed surface mesh, with
//!   distance and weight interpolated from the TSDF
//!
//! Both pools are cleared and rebuilt from scratch on every call.

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::RegistrationFilterConfig;
use crate::fusion::{EsdfLayer, MeshExtractionConfig, TsdfVoxel, VolumetricField};
use crate::sampling::WeightedSampler;
use crate::submap::SubmapError;

/// Isosurface vertices must interpolate to within this many voxel sizes of zero
pub const ISOSURFACE_DISTANCE_TOLERANCE: f32 = 1e-2;

/// A weighted sample used to align submaps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPoint {
    /// Position in submap frame
    pub position: Vec3,
    pub distance: f32,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationPointType {
    /// Relevant TSDF voxels
    Voxels,
    /// Vertices of the reconstructed isosurface
    IsosurfacePoints,
}

/// Observed voxel inside the truncation band
pub fn is_relevant_voxel(voxel: &TsdfVoxel, filter: &RegistrationFilterConfig) -> bool {
    voxel.weight > filter.min_voxel_weight && voxel.distance.abs() < filter.max_voxel_distance
}

/// Fill `sampler` with every relevant voxel of `field`, weighted by its TSDF weight.
///
/// With `use_esdf_distance` set, the stored distance comes from the ESDF voxel
/// at the same index; a missing ESDF block or voxel aborts the extraction.
pub fn find_relevant_voxels<F: VolumetricField>(
    field: &F,
    esdf: &EsdfLayer,
    filter: &RegistrationFilterConfig,
    sampler: &mut WeightedSampler<RegistrationPoint>,
) -> Result<usize, SubmapError> {
    sampler.clear();

    for block_index in field.allocated_block_indices() {
        let Some(tsdf_block) = field.tsdf_block(&block_index) else {
            continue;
        };
        let esdf_block = if filter.use_esdf_distance {
            let block = esdf
                .block(&block_index)
                .ok_or(SubmapError::MissingEsdfBlock { block: block_index })?;
            Some(block)
        } else {
            None
        };

        for (linear_index, tsdf_voxel) in tsdf_block.voxels().iter().enumerate() {
            if !is_relevant_voxel(tsdf_voxel, filter) {
                continue;
            }

            let distance = match esdf_block {
                Some(esdf_block) => {
                    esdf_block
                        .voxel_by_linear_index(linear_index)
                        .ok_or(SubmapError::InvalidEsdfIndex {
                            block: block_index,
                            linear_index,
                        })?
                        .distance
                }
                None => tsdf_voxel.distance,
            };

            let point = RegistrationPoint {
                position: tsdf_block.coordinates_from_linear_index(linear_index),
                distance,
                weight: tsdf_voxel.weight,
            };
            sampler.add_item(point, tsdf_voxel.weight as f64);
        }
    }

    debug!("found {} relevant voxels", sampler.size());
    Ok(sampler.size())
}

/// Outcome of an isosurface vertex extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsosurfaceCounts {
    pub admitted: usize,
    /// Vertices whose position could not be interpolated
    pub skipped: usize,
    /// Vertices whose interpolated distance was far from zero
    pub inconsistent: usize,
}

/// Fill `sampler` with the vertices of the connected isosurface mesh of `field`.
///
/// `on_inconsistent` is called for every vertex whose interpolated distance
/// exceeds the isosurface tolerance; such vertices are not admitted.
pub fn find_isosurface_vertices<F, C>(
    field: &F,
    filter: &RegistrationFilterConfig,
    sampler: &mut WeightedSampler<RegistrationPoint>,
    mut on_inconsistent: C,
) -> IsosurfaceCounts
where
    F: VolumetricField,
    C: FnMut(Vec3, f32),
{
    sampler.clear();

    let mesh_config = MeshExtractionConfig {
        min_weight: filter.min_voxel_weight,
        merge_tolerance: 0.5 * field.voxel_size(),
    };
    let mesh = field.extract_mesh(&mesh_config);
    let tolerance = ISOSURFACE_DISTANCE_TOLERANCE * field.voxel_size();

    let mut counts = IsosurfaceCounts::default();
    for &vertex in &mesh.vertices {
        let Some(voxel) = field.interpolate(vertex) else {
            counts.skipped += 1;
            continue;
        };

        if voxel.distance.abs() > tolerance {
            counts.inconsistent += 1;
            on_inconsistent(vertex, voxel.distance);
            continue;
        }

        let point = RegistrationPoint {
            position: vertex,
            distance: voxel.distance,
            weight: voxel.weight,
        };
        sampler.add_item(point, voxel.weight as f64);
        counts.admitted += 1;
    }

    debug!(
        "isosurface: {} mesh vertices, {} admitted, {} skipped, {} inconsistent",
        mesh.num_vertices(),
        counts.admitted,
        counts.skipped,
        counts.inconsistent
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EsdfConfig;
    use crate::fusion::{generate_esdf, TsdfLayer};
    use glam::IVec3;

    fn filter(use_esdf_distance: bool) -> RegistrationFilterConfig {
        RegistrationFilterConfig {
            min_voxel_weight: 0.5,
            max_voxel_distance: 0.3,
            use_esdf_distance,
        }
    }

    #[test]
    fn test_relevant_voxel_predicate() {
        let filter = filter(false);
        assert!(is_relevant_voxel(&TsdfVoxel::new(0.1, 1.0), &filter));
        assert!(is_relevant_voxel(&TsdfVoxel::new(-0.29, 0.6), &filter));
        assert!(!is_relevant_voxel(&TsdfVoxel::new(0.1, 0.5), &filter));
        assert!(!is_relevant_voxel(&TsdfVoxel::new(0.3, 1.0), &filter));
        assert!(!is_relevant_voxel(&TsdfVoxel::new(-0.4, 1.0), &filter));
    }

    #[test]
    fn test_single_relevant_voxel() {
        let mut layer = TsdfLayer::new(0.1, 4);
        let index = IVec3::new(2, -3, 5);
        *layer.allocate_voxel(index) = TsdfVoxel::new(0.05, 2.0);
        // Fails the weight bound
        *layer.allocate_voxel(IVec3::new(2, -3, 6)) = TsdfVoxel::new(0.05, 0.4);
        // Fails the distance bound
        *layer.allocate_voxel(IVec3::new(1, -3, 5)) = TsdfVoxel::new(0.5, 3.0);

        let esdf = generate_esdf(&layer, &EsdfConfig::default());
        let mut sampler = WeightedSampler::new();
        let count = find_relevant_voxels(&layer, &esdf, &filter(false), &mut sampler).unwrap();

        assert_eq!(count, 1);
        let point = sampler.get(0).unwrap();
        assert!(point.position.abs_diff_eq(layer.voxel_center(index), 1e-6));
        assert!((point.distance - 0.05).abs() < 1e-6);
        assert!((point.weight - 2.0).abs() < 1e-6);
        assert_eq!(sampler.weight(0), Some(2.0));
    }

    #[test]
    fn test_esdf_distance_is_used_when_configured() {
        let mut layer = TsdfLayer::new(0.1, 4);
        *layer.allocate_voxel(IVec3::ZERO) = TsdfVoxel::new(0.05, 1.0);

        let mut esdf = generate_esdf(&layer, &EsdfConfig::default());
        esdf.voxel_mut(IVec3::ZERO).unwrap().distance = 0.07;

        let mut sampler = WeightedSampler::new();
        find_relevant_voxels(&layer, &esdf, &filter(true), &mut sampler).unwrap();
        assert!((sampler.get(0).unwrap().distance - 0.07).abs() < 1e-6);
    }

    #[test]
    fn test_missing_esdf_block_aborts() {
        let mut layer = TsdfLayer::new(0.1, 4);
        *layer.allocate_voxel(IVec3::ZERO) = TsdfVoxel::new(0.05, 1.0);
        let esdf = EsdfLayer::new(0.1, 4);

        let mut sampler = WeightedSampler::new();
        let result = find_relevant_voxels(&layer, &esdf, &filter(true), &mut sampler);
        assert_eq!(result, Err(SubmapError::MissingEsdfBlock { block: IVec3::ZERO }));

        // Without ESDF lookups the same field extracts fine
        assert_eq!(find_relevant_voxels(&layer, &esdf, &filter(false), &mut sampler), Ok(1));
    }

    #[test]
    fn test_isosurface_vertices_lie_on_surface() {
        let mut layer = TsdfLayer::new(0.1, 4);
        for x in 0..8 {
            for y in 0..4 {
                for z in 0..4 {
                    let index = IVec3::new(x, y, z);
                    let center = layer.voxel_center(index);
                    *layer.allocate_voxel(index) = TsdfVoxel::new(center.x - 0.42, 1.5);
                }
            }
        }

        let mut sampler = WeightedSampler::new();
        let mut reported = 0;
        let counts = find_isosurface_vertices(&layer, &filter(false), &mut sampler, |_, _| reported += 1);

        assert_eq!(counts.admitted + counts.skipped, 16);
        assert_eq!(counts.inconsistent, 0);
        assert_eq!(reported, 0);
        assert_eq!(sampler.size(), counts.admitted);
        assert!(counts.admitted > 0);
        for point in sampler.iter() {
            assert!(point.distance.abs() < 1e-3);
            assert!((point.weight - 1.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_isosurface_of_empty_field() {
        let layer = TsdfLayer::new(0.1, 4);
        let mut sampler = WeightedSampler::new();
        sampler.add_item(
            RegistrationPoint {
                position: Vec3::ZERO,
                distance: 0.0,
                weight: 1.0,
            },
            1.0,
        );

        let counts = find_isosurface_vertices(&layer, &filter(false), &mut sampler, |_, _| {});
        assert_eq!(counts, IsosurfaceCounts::default());
        assert!(sampler.is_empty());
    }
}
