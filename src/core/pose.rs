//! SE3 Pose representation using glam
//!
//! Rigid transforms between the world, submap and robot frames.
//! A pose `T_a_b` maps points expressed in frame `b` into frame `a`.

use std::ops::Mul;

use glam::{Mat3, Mat4, Quat, Vec3};

/// SE3 pose: rotation + translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3 {
    /// Rotation as quaternion
    rotation: Quat,
    /// Translation vector
    translation: Vec3,
}

impl SE3 {
    /// Create a new SE3 from quaternion and translation
    pub fn new(rotation: Quat, translation: Vec3) -> Self {
        Self {
            rotation: rotation.normalize(),
            translation,
        }
    }

    /// Create from axis-angle and translation
    pub fn from_axis_angle(axis_angle: Vec3, translation: Vec3) -> Self {
        let angle = axis_angle.length();
        let rotation = if angle > 1e-10 {
            Quat::from_axis_angle(axis_angle / angle, angle)
        } else {
            Quat::IDENTITY
        };

        Self { rotation, translation }
    }

    /// Pure translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation,
        }
    }

    /// Create identity pose
    pub fn identity() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
        }
    }

    /// Create from a rigid 4x4 homogeneous matrix
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        Self::new(rotation, translation)
    }

    /// Convert to 4x4 transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Compose two poses: self * other
    pub fn compose(&self, other: &SE3) -> SE3 {
        let rotation = (self.rotation * other.rotation).normalize();
        let translation = self.translation + self.rotation * other.translation;
        SE3 { rotation, translation }
    }

    /// Inverse of the pose
    pub fn inverse(&self) -> SE3 {
        let rotation = self.rotation.inverse();
        let translation = -(rotation * self.translation);
        SE3 { rotation, translation }
    }

    /// Transform a 3D point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Transform a 3D vector (direction)
    pub fn transform_vector(&self, vec: Vec3) -> Vec3 {
        self.rotation * vec
    }

    /// Rotation as a 3x3 matrix
    pub fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_quat(self.rotation)
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Compare two poses by rotation angle and translation distance
    pub fn abs_diff_eq(&self, other: &SE3, epsilon: f32) -> bool {
        let delta = self.inverse().compose(other);
        // atan2 keeps precision for small angles, acos of the dot product does not
        let angle = 2.0 * delta.rotation.xyz().length().atan2(delta.rotation.w.abs());
        angle <= epsilon && delta.translation.length() <= epsilon
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for SE3 {
    type Output = SE3;

    fn mul(self, rhs: SE3) -> SE3 {
        self.compose(&rhs)
    }
}

impl Mul<&SE3> for &SE3 {
    type Output = SE3;

    fn mul(self, rhs: &SE3) -> SE3 {
        self.compose(rhs)
    }
}
