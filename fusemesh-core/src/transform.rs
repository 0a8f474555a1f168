//! 3D transformation utilities

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A 4x4 homogeneous transformation.
///
/// Used both for camera extrinsics handed to the fusion engine and for
/// model matrices of renderable objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a rotation transformation from a quaternion
    pub fn rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    /// Create a scaling transformation
    pub fn scaling(scale: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&scale),
        }
    }

    /// Build from nested arrays where `rows[r][c]` is row `r`, column `c`.
    pub fn from_row_major(rows: &[[f32; 4]; 4]) -> Self {
        let mut matrix = Matrix4::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                matrix[(r, c)] = *value;
            }
        }
        Self { matrix }
    }

    /// Build from nested arrays where `cols[c][r]` is column `c`, row `r`.
    ///
    /// This is the storage order of GLSL-style matrix types.
    pub fn from_column_major(cols: &[[f32; 4]; 4]) -> Self {
        let mut matrix = Matrix4::zeros();
        for (c, col) in cols.iter().enumerate() {
            for (r, value) in col.iter().enumerate() {
                matrix[(r, c)] = *value;
            }
        }
        Self { matrix }
    }

    /// Copy out as column-major nested arrays
    pub fn to_column_major(&self) -> [[f32; 4]; 4] {
        self.matrix.into()
    }

    /// Element at row `r`, column `c`
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.matrix[(r, c)]
    }

    /// Set element at row `r`, column `c`
    pub fn set(&mut self, r: usize, c: usize, value: f32) {
        self.matrix[(r, c)] = value;
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Compose this transformation with another
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix
            .try_inverse()
            .map(|inv_matrix| Self { matrix: inv_matrix })
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        let identity = Matrix4::identity();
        (self.matrix - identity).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

/// Position, orientation and scale of a drawable object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl ObjectTransform {
    /// Model matrix: translation · rotation · scale
    pub fn matrix(&self) -> Transform3D {
        Transform3D::translation(self.position)
            * Transform3D::rotation(self.rotation)
            * Transform3D::scaling(self.scale)
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_rows() -> [[f32; 4]; 4] {
        [
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]
    }

    #[test]
    fn test_row_major_copy_is_element_wise() {
        let t = Transform3D::from_row_major(&sample_rows());
        assert_eq!(t.get(0, 3), 4.0);
        assert_eq!(t.get(3, 0), 13.0);
        assert_eq!(t.get(2, 1), 10.0);
    }

    #[test]
    fn test_column_major_is_transpose_of_row_major() {
        let rows = sample_rows();
        let a = Transform3D::from_row_major(&rows);
        let b = Transform3D::from_column_major(&rows);
        assert_eq!(a.matrix.transpose(), b.matrix);
        assert_eq!(b.to_column_major(), rows);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Transform3D::translation(Vector3::new(1.0, -2.0, 3.0));
        let inv = t.inverse().unwrap();
        assert!((t * inv).is_identity(1e-6));
    }

    #[test]
    fn test_object_transform_order() {
        let object = ObjectTransform {
            position: Vector3::new(10.0, 0.0, 0.0),
            rotation: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        // Scale first, then rotate x onto y, then translate.
        let p = object.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(10.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_default_object_transform_is_identity() {
        assert!(ObjectTransform::default().matrix().is_identity(1e-6));
    }
}
