//! Axis-aligned bounding box primitive
//!
//! A box is stored as its `min` and `max` corners. The default box is the
//! "unset" box (`min = +inf`, `max = -inf`), which fails [`BoundingBox::is_valid`]
//! until it has been grown around at least one point.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::SE3;

/// The 8 corners of a box as the columns of a 3x8 matrix.
pub type BoxCornerMatrix = [Vec3; 8];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The unset box
    pub fn unset() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Every coefficient of `min` is smaller than or equal to its `max` counterpart
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Grow the box to contain the cube of half-extent `half_size` around `center`
    pub fn grow(&mut self, center: Vec3, half_size: Vec3) {
        self.min = self.min.min(center - half_size);
        self.max = self.max.max(center + half_size);
    }

    /// Grow the box to contain a point
    pub fn include_point(&mut self, point: Vec3) {
        self.grow(point, Vec3::ZERO);
    }

    /// Corners ordered by bit pattern: bit 0 selects x, bit 1 y, bit 2 z (0 = min, 1 = max)
    pub fn corner_coordinates(&self) -> BoxCornerMatrix {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Axis-aligned box in the pose's target frame enclosing the transformed corners of `obb`
    pub fn aabb_from_obb_and_pose(obb: &BoundingBox, pose: &SE3) -> BoundingBox {
        if !obb.is_valid() {
            return BoundingBox::unset();
        }

        let mut aabb = BoundingBox::unset();
        for corner in obb.corner_coordinates() {
            aabb.include_point(pose.transform_point(corner));
        }
        aabb
    }

    /// Separating axis test over the three principal axes
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        for axis in 0..3 {
            if self.max[axis] < other.min[axis] || self.min[axis] > other.max[axis] {
                return false;
            }
        }
        true
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn abs_diff_eq(&self, other: &BoundingBox, epsilon: f32) -> bool {
        self.min.abs_diff_eq(other.min, epsilon) && self.max.abs_diff_eq(other.max, epsilon)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::unset()
    }
}

/// Apply a pose as a homogeneous transform to every column of a corner matrix
pub fn transform_corners(corners: &BoxCornerMatrix, pose: &SE3) -> BoxCornerMatrix {
    let matrix = pose.to_matrix();
    corners.map(|corner| matrix.transform_point3(corner))
}
