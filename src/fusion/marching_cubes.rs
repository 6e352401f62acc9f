//! Marching Cubes isosurface extraction
//!
//! Cubes are spanned by 8 neighbouring voxel centers. Instead of the classic
//! 256-case triangle table, the zero crossings on the cube edges are linked
//! face by face into closed loops, which are then fan-triangulated. Ambiguous
//! faces (4 crossings) are resolved with the sign of the face center value,
//! so neighbouring cubes agree on the shared face.
//!
//! Vertices always lie on cube edges at the linear zero crossing, which means
//! trilinear interpolation of the same field at a vertex gives zero distance.

use glam::{IVec3, Vec3};

use crate::fusion::tsdf_volume::TsdfLayer;

/// Corner pairs of the 12 cube edges; corner `c` sits at offset (c & 1, c >> 1 & 1, c >> 2 & 1)
const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7),
    (0, 2), (1, 3), (4, 6), (5, 7),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// Cube faces as cyclic corner sequences
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 1, 3, 2],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 2, 6, 4],
    [1, 3, 7, 5],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshTriangle {
    pub indices: [usize; 3],
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<MeshTriangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append a triangle with three new vertices
    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let base = self.vertices.len();
        self.vertices.extend([a, b, c]);
        self.triangles.push(MeshTriangle {
            indices: [base, base + 1, base + 2],
        });
    }
}

fn edge_between(a: usize, b: usize) -> usize {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    CUBE_EDGES
        .iter()
        .position(|&edge| edge == (lo, hi))
        .unwrap_or_default()
}

fn corner_offset(corner: usize) -> IVec3 {
    IVec3::new((corner & 1) as i32, ((corner >> 1) & 1) as i32, ((corner >> 2) & 1) as i32)
}

/// Closed loops of crossed edges for one cube
fn cube_polygons(sdf: &[f32; 8]) -> Vec<Vec<usize>> {
    let inside: [bool; 8] = sdf.map(|value| value < 0.0);
    let mut neighbors = [[usize::MAX; 2]; 12];
    let mut degree = [0usize; 12];

    let mut link = |a: usize, b: usize, neighbors: &mut [[usize; 2]; 12]| {
        for (from, to) in [(a, b), (b, a)] {
            if degree[from] < 2 {
                neighbors[from][degree[from]] = to;
                degree[from] += 1;
            }
        }
    };

    for face in CUBE_FACES {
        let edges: [usize; 4] = std::array::from_fn(|k| edge_between(face[k], face[(k + 1) % 4]));
        let crossed: Vec<usize> = (0..4)
            .filter(|&k| inside[face[k]] != inside[face[(k + 1) % 4]])
            .collect();

        match crossed.len() {
            2 => link(edges[crossed[0]], edges[crossed[1]], &mut neighbors),
            4 => {
                let center: f32 = face.iter().map(|&c| sdf[c]).sum::<f32>() * 0.25;
                let center_inside = center < 0.0;
                // Cut off the two corners whose state differs from the face center
                for k in 0..4 {
                    if inside[face[k]] != center_inside {
                        link(edges[(k + 3) % 4], edges[k], &mut neighbors);
                    }
                }
            }
            _ => {}
        }
    }

    let mut polygons = Vec::new();
    let mut visited = [false; 12];
    for start in 0..12 {
        if visited[start] || degree[start] != 2 {
            continue;
        }

        let mut polygon = vec![start];
        visited[start] = true;
        let mut previous = start;
        let mut current = neighbors[start][0];
        while current != start && !visited[current] && degree[current] == 2 {
            visited[current] = true;
            polygon.push(current);
            let next = if neighbors[current][0] != previous {
                neighbors[current][0]
            } else {
                neighbors[current][1]
            };
            previous = current;
            current = next;
        }

        if polygon.len() >= 3 {
            polygons.push(polygon);
        }
    }
    polygons
}

/// Extract the zero isosurface of `layer` as a triangle soup.
///
/// A cube is only meshed when all 8 corner voxels exist and have a weight
/// strictly above `min_weight`. Every triangle gets its own three vertices;
/// `Mesh::connected` merges them.
pub fn extract_mesh_from_tsdf(layer: &TsdfLayer, min_weight: f32) -> Mesh {
    let mut mesh = Mesh::new();

    for block_index in layer.allocated_block_indices() {
        let Some(block) = layer.block(&block_index) else {
            continue;
        };

        'cubes: for linear_index in 0..block.num_voxels() {
            let origin = block.global_index_from_linear_index(linear_index);
            let mut sdf = [0.0f32; 8];
            let mut positions = [Vec3::ZERO; 8];

            for corner in 0..8 {
                let index = origin + corner_offset(corner);
                match layer.voxel(index) {
                    Some(voxel) if voxel.weight > min_weight => {
                        sdf[corner] = voxel.distance;
                        positions[corner] = layer.voxel_center(index);
                    }
                    _ => continue 'cubes,
                }
            }

            let first_inside = sdf[0] < 0.0;
            if sdf.iter().all(|&value| (value < 0.0) == first_inside) {
                continue;
            }

            let vertex_on_edge = |edge: usize| {
                let (a, b) = CUBE_EDGES[edge];
                let t = sdf[a] / (sdf[a] - sdf[b]);
                positions[a] + t * (positions[b] - positions[a])
            };

            for polygon in cube_polygons(&sdf) {
                let anchor = vertex_on_edge(polygon[0]);
                for pair in polygon[1..].windows(2) {
                    mesh.push_triangle(anchor, vertex_on_edge(pair[0]), vertex_on_edge(pair[1]));
                }
            }
        }
    }

    mesh
}
