//! Mesh extraction for registration
//!
//! Runs Marching Cubes over a TSDF layer and merges the resulting triangle
//! soup into one connected mesh, welding vertices closer than a tolerance.

use std::collections::HashMap;

use glam::Vec3;

pub use crate::fusion::marching_cubes::{extract_mesh_from_tsdf, Mesh, MeshTriangle};
use crate::fusion::tsdf_volume::TsdfLayer;

/// Mesh extraction configuration
#[derive(Debug, Clone, Copy)]
pub struct MeshExtractionConfig {
    /// Corner voxels must have a weight strictly above this
    pub min_weight: f32,
    /// Vertices within this distance are welded; non-positive disables welding
    pub merge_tolerance: f32,
}

impl MeshExtractionConfig {
    /// Weld at half a voxel, the spacing below which two edge crossings cannot be told apart
    pub fn for_layer(layer: &TsdfLayer, min_weight: f32) -> Self {
        Self {
            min_weight,
            merge_tolerance: 0.5 * layer.voxel_size(),
        }
    }
}

impl Mesh {
    /// Weld vertices that fall into the same `tolerance`-sized cell.
    ///
    /// The first vertex seen in a cell is kept as is; triangles that collapse
    /// onto fewer than three distinct vertices are dropped.
    pub fn connected(&self, tolerance: f32) -> Mesh {
        if tolerance <= 0.0 {
            return self.clone();
        }

        let inv_tolerance = 1.0 / tolerance;
        let cell_of = |p: Vec3| {
            let scaled = (p * inv_tolerance).round();
            (scaled.x as i64, scaled.y as i64, scaled.z as i64)
        };

        let mut welded = Mesh::new();
        let mut cell_to_vertex: HashMap<(i64, i64, i64), usize> = HashMap::new();

        for triangle in &self.triangles {
            let indices = triangle.indices.map(|old| {
                let position = self.vertices[old];
                *cell_to_vertex.entry(cell_of(position)).or_insert_with(|| {
                    welded.vertices.push(position);
                    welded.vertices.len() - 1
                })
            });

            let [a, b, c] = indices;
            if a != b && b != c && a != c {
                welded.triangles.push(MeshTriangle { indices });
            }
        }

        welded
    }
}

/// Extract the isosurface of `layer` and weld it into one connected mesh
pub fn extract_connected_mesh(layer: &TsdfLayer, config: &MeshExtractionConfig) -> Mesh {
    extract_mesh_from_tsdf(layer, config.min_weight).connected(config.merge_tolerance)
}
