//! Point cloud container fed to the fusion engine

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A generic point cloud container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with 3D points
pub type PointCloud3f = PointCloud<Point3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }

    /// Clear all points from the cloud
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl PointCloud<Point3f> {
    /// Replace the contents with the complete triplets of `coords`.
    ///
    /// Returns the number of points now held.
    pub fn replace_from_flat(&mut self, coords: &[f32]) -> usize {
        self.points.clear();
        self.points.reserve(coords.len() / 3);
        self.points.extend(points_from_flat(coords));
        self.points.len()
    }

    /// Flatten back to xyz triplets
    pub fn to_flat(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_from_flat_clears_previous_frame() {
        let mut cloud = PointCloud3f::new();
        cloud.replace_from_flat(&[0.0; 12]);
        assert_eq!(cloud.len(), 4);

        let count = cloud.replace_from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(count, 2);
        assert_eq!(cloud[0], Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(cloud[1], Point3f::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_replace_from_flat_preserves_order() {
        let coords: Vec<f32> = (0..30).map(|i| i as f32).collect();
        let mut cloud = PointCloud3f::new();
        cloud.replace_from_flat(&coords);
        assert_eq!(cloud.len(), 10);
        assert_eq!(cloud.to_flat(), coords);
    }
}
