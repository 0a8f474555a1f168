//! Point types and flat coordinate buffer helpers

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Iterate the complete xyz triplets of a flat coordinate buffer.
///
/// A trailing partial triplet is not yielded.
pub fn points_from_flat(coords: &[f32]) -> impl Iterator<Item = Point3f> + '_ {
    coords
        .chunks_exact(3)
        .map(|c| Point3f::new(c[0], c[1], c[2]))
}

/// Number of coordinates left over after the last complete triplet
pub fn flat_remainder(coords: &[f32]) -> usize {
    coords.len() % 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_from_flat_drops_partial_triplet() {
        let coords = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let points: Vec<_> = points_from_flat(&coords).collect();
        assert_eq!(points, vec![Point3f::new(1.0, 2.0, 3.0), Point3f::new(4.0, 5.0, 6.0)]);
        assert_eq!(flat_remainder(&coords), 1);
    }

    #[test]
    fn test_points_from_flat_empty() {
        assert_eq!(points_from_flat(&[]).count(), 0);
        assert_eq!(flat_remainder(&[]), 0);
    }
}
