//! Per-chunk meshes as produced by the fusion engine

use crate::point::*;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Integer coordinates of a chunk in the chunk grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkId {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// World-space center of this chunk for a given chunk edge length
    pub fn centroid(&self, chunk_extent: Vector3<f32>) -> Vector3f {
        Vector3::new(
            (self.x as f32 + 0.5) * chunk_extent.x,
            (self.y as f32 + 0.5) * chunk_extent.y,
            (self.z as f32 + 0.5) * chunk_extent.z,
        )
    }
}

/// Indexed triangle-list mesh of a single chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMesh {
    pub vertices: Vec<Point3f>,
    /// Either empty or one normal per vertex
    pub normals: Vec<Vector3f>,
    pub indices: Vec<usize>,
}

impl ChunkMesh {
    /// Create a mesh from vertices and a flat index list
    pub fn new(vertices: Vec<Point3f>, indices: Vec<usize>) -> Self {
        Self {
            vertices,
            normals: Vec::new(),
            indices,
        }
    }

    /// Attach per-vertex normals; ignored when the count does not match
    pub fn with_normals(mut self, normals: Vec<Vector3f>) -> Self {
        if normals.len() == self.vertices.len() {
            self.normals = normals;
        }
        self
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// True when it carries one normal per vertex
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    /// First index that does not reference a vertex, if any
    pub fn first_invalid_index(&self) -> Option<usize> {
        self.indices
            .iter()
            .copied()
            .find(|&i| i >= self.vertices.len())
    }
}

/// Snapshot of all chunk meshes keyed by chunk
pub type MeshMap = BTreeMap<ChunkId, Arc<ChunkMesh>>;

/// Total number of source indices across a mesh map
pub fn total_index_count(map: &MeshMap) -> usize {
    map.values().map(|m| m.indices.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> ChunkMesh {
        ChunkMesh::new(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_with_normals_requires_matching_count() {
        let mesh = triangle().with_normals(vec![Vector3f::z(); 2]);
        assert!(!mesh.has_normals());

        let mesh = triangle().with_normals(vec![Vector3f::z(); 3]);
        assert!(mesh.has_normals());
    }

    #[test]
    fn test_first_invalid_index() {
        let mut mesh = triangle();
        assert_eq!(mesh.first_invalid_index(), None);
        mesh.indices.push(7);
        assert_eq!(mesh.first_invalid_index(), Some(7));
    }

    #[test]
    fn test_chunk_centroid() {
        let id = ChunkId::new(1, -1, 0);
        let c = id.centroid(Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(c, Vector3f::new(3.0, -1.0, 1.0));
    }

    #[test]
    fn test_total_index_count() {
        let mut map = MeshMap::new();
        map.insert(ChunkId::new(0, 0, 0), Arc::new(triangle()));
        map.insert(ChunkId::new(1, 0, 0), Arc::new(triangle()));
        assert_eq!(total_index_count(&map), 6);
    }
}
