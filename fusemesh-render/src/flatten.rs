//! Flattening a chunked mesh map into one draw buffer

use fusemesh_core::{ChunkMesh, FlattenMode, MeshMap};
use tracing::{info, warn};

/// Largest emitted index; 0xFFFF is the strip restart value for u16 indices
const MAX_INDEX: usize = u16::MAX as usize - 1;

fn to_index(i: usize) -> Option<u16> {
    if i <= MAX_INDEX {
        u16::try_from(i).ok()
    } else {
        None
    }
}

/// Single-draw geometry: xyz vertex triplets, optional normals, u16 indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatGeometry {
    pub vertices: Vec<f32>,
    /// Empty, or the same length as `vertices`
    pub normals: Vec<f32>,
    /// Empty for non-indexed geometry
    pub indices: Vec<u16>,
}

impl FlatGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    fn push_vertex(&mut self, mesh: &ChunkMesh, index: usize, with_normals: bool) {
        let v = mesh.vertices[index];
        self.vertices.extend_from_slice(&[v.x, v.y, v.z]);
        if with_normals {
            let n = mesh.normals[index];
            self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }
}

/// Flatten every chunk mesh of `map` into a single buffer.
///
/// Chunks with out-of-range indices are skipped. When the chosen indexed
/// layout cannot be addressed with u16 indices the result falls back to
/// [`FlattenMode::Expanded`]. Normals are carried only if every contributing
/// chunk has per-vertex normals.
pub fn flatten_mesh_map(map: &MeshMap, mode: FlattenMode) -> FlatGeometry {
    let chunks: Vec<&ChunkMesh> = map
        .iter()
        .filter(|(_, mesh)| !mesh.indices.is_empty())
        .filter_map(|(id, mesh)| match mesh.first_invalid_index() {
            Some(index) => {
                warn!(
                    ?id,
                    index,
                    vertices = mesh.vertices.len(),
                    "skipping chunk mesh with out-of-range index"
                );
                None
            }
            None => Some(mesh.as_ref()),
        })
        .collect();

    let with_normals = !chunks.is_empty() && chunks.iter().all(|m| m.has_normals());

    let geometry = match mode {
        FlattenMode::Compacted => compacted(&chunks, with_normals),
        FlattenMode::Legacy => {
            if !chunks.is_empty() {
                warn!("legacy flattening: index buffer does not address the vertex buffer layout");
            }
            legacy(&chunks, with_normals)
        }
        FlattenMode::Expanded => Some(expanded(&chunks, with_normals)),
    };

    let geometry = geometry.unwrap_or_else(|| {
        warn!(?mode, "indices exceed u16 range, falling back to non-indexed geometry");
        expanded(&chunks, with_normals)
    });

    info!(
        chunks = map.len(),
        vertices = geometry.vertex_count(),
        indices = geometry.indices.len(),
        "flattened mesh map"
    );
    geometry
}

fn compacted(chunks: &[&ChunkMesh], with_normals: bool) -> Option<FlatGeometry> {
    let mut geometry = FlatGeometry::default();

    for mesh in chunks {
        let mut remap: Vec<Option<u16>> = vec![None; mesh.vertices.len()];
        for &index in &mesh.indices {
            let new_index = match remap[index] {
                Some(i) => i,
                None => {
                    let i = to_index(geometry.vertex_count())?;
                    geometry.push_vertex(mesh, index, with_normals);
                    remap[index] = Some(i);
                    i
                }
            };
            geometry.indices.push(new_index);
        }
    }

    Some(geometry)
}

fn legacy(chunks: &[&ChunkMesh], with_normals: bool) -> Option<FlatGeometry> {
    let mut geometry = FlatGeometry::default();

    for mesh in chunks {
        for &index in &mesh.indices {
            geometry.push_vertex(mesh, index, with_normals);
            let base = index.checked_mul(3)?;
            for offset in 0..3 {
                geometry.indices.push(to_index(base + offset)?);
            }
        }
    }

    Some(geometry)
}

fn expanded(chunks: &[&ChunkMesh], with_normals: bool) -> FlatGeometry {
    let mut geometry = FlatGeometry::default();

    for mesh in chunks {
        for &index in &mesh.indices {
            geometry.push_vertex(mesh, index, with_normals);
        }
    }

    geometry
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusemesh_core::{total_index_count, ChunkId, Point3f, Vector3f};
    use std::sync::Arc;

    fn quad(offset: f32) -> ChunkMesh {
        ChunkMesh::new(
            vec![
                Point3f::new(offset, 0.0, 0.0),
                Point3f::new(offset + 1.0, 0.0, 0.0),
                Point3f::new(offset + 1.0, 1.0, 0.0),
                Point3f::new(offset, 1.0, 0.0),
            ],
            vec![0, 1, 2, 2, 3, 0],
        )
    }

    fn with_up_normals(mesh: ChunkMesh) -> ChunkMesh {
        let n = mesh.vertices.len();
        mesh.with_normals(vec![Vector3f::z(); n])
    }

    fn map_of(meshes: Vec<ChunkMesh>) -> MeshMap {
        meshes
            .into_iter()
            .enumerate()
            .map(|(i, m)| (ChunkId::new(i as i32, 0, 0), Arc::new(m)))
            .collect()
    }

    #[test]
    fn test_empty_map_yields_empty_geometry() {
        for mode in [FlattenMode::Compacted, FlattenMode::Legacy, FlattenMode::Expanded] {
            let geometry = flatten_mesh_map(&MeshMap::new(), mode);
            assert!(geometry.is_empty());
            assert!(geometry.indices.is_empty());
            assert!(geometry.normals.is_empty());
        }
    }

    #[test]
    fn test_compacted_shares_vertices_and_offsets_chunks() {
        let map = map_of(vec![quad(0.0), quad(5.0)]);
        let geometry = flatten_mesh_map(&map, FlattenMode::Compacted);

        assert_eq!(geometry.vertex_count(), 8);
        assert_eq!(geometry.indices.len(), total_index_count(&map));
        assert_eq!(
            geometry.indices,
            vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]
        );
        assert_eq!(&geometry.vertices[12..15], &[5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_compacted_indices_address_emitted_vertices() {
        let map = map_of(vec![quad(0.0), quad(2.0), quad(4.0)]);
        let geometry = flatten_mesh_map(&map, FlattenMode::Compacted);
        let count = geometry.vertex_count() as u16;
        assert!(geometry.indices.iter().all(|&i| i < count));
        assert_eq!(geometry.vertices.len() % 3, 0);
        assert_eq!(geometry.indices.len() % 3, 0);
    }

    #[test]
    fn test_compacted_drops_unreferenced_vertices() {
        let mut mesh = quad(0.0);
        mesh.vertices.push(Point3f::new(9.0, 9.0, 9.0));
        let geometry = flatten_mesh_map(&map_of(vec![mesh]), FlattenMode::Compacted);
        assert_eq!(geometry.vertex_count(), 4);
    }

    #[test]
    fn test_legacy_triples_indices() {
        let map = map_of(vec![quad(0.0), quad(3.0)]);
        let geometry = flatten_mesh_map(&map, FlattenMode::Legacy);

        assert_eq!(geometry.indices.len(), 3 * total_index_count(&map));
        assert_eq!(geometry.vertex_count(), total_index_count(&map));
        // source index 2 of the first quad
        assert_eq!(&geometry.indices[6..9], &[6, 7, 8]);
        assert_eq!(&geometry.vertices[6..9], &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_expanded_has_no_indices() {
        let map = map_of(vec![quad(0.0)]);
        let geometry = flatten_mesh_map(&map, FlattenMode::Expanded);
        assert!(!geometry.is_indexed());
        assert_eq!(geometry.vertex_count(), 6);
    }

    #[test]
    fn test_invalid_chunk_is_skipped() {
        let mut broken = quad(10.0);
        broken.indices.push(42);
        let map = map_of(vec![quad(0.0), broken]);
        let geometry = flatten_mesh_map(&map, FlattenMode::Compacted);
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.indices.len(), 6);
    }

    #[test]
    fn test_normals_follow_vertices() {
        let map = map_of(vec![with_up_normals(quad(0.0)), with_up_normals(quad(1.0))]);
        let geometry = flatten_mesh_map(&map, FlattenMode::Compacted);
        assert!(geometry.has_normals());
        assert_eq!(&geometry.normals[0..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_normals_dropped_when_any_chunk_lacks_them() {
        let map = map_of(vec![with_up_normals(quad(0.0)), quad(1.0)]);
        let geometry = flatten_mesh_map(&map, FlattenMode::Compacted);
        assert!(geometry.normals.is_empty());
    }

    #[test]
    fn test_u16_overflow_falls_back_to_expanded() {
        let n = 65_538;
        let vertices: Vec<Point3f> = (0..n).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect();
        let mesh = ChunkMesh::new(vertices, (0..n).collect());
        let map = map_of(vec![mesh]);

        let geometry = flatten_mesh_map(&map, FlattenMode::Compacted);
        assert!(!geometry.is_indexed());
        assert_eq!(geometry.vertex_count(), n);

        let geometry = flatten_mesh_map(&map, FlattenMode::Legacy);
        assert!(!geometry.is_indexed());
        assert_eq!(geometry.vertex_count(), n);
    }

    fn line_of(n: usize) -> MeshMap {
        let vertices: Vec<Point3f> = (0..n).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect();
        map_of(vec![ChunkMesh::new(vertices, (0..n).collect())])
    }

    #[test]
    fn test_compacted_never_emits_restart_index() {
        let geometry = flatten_mesh_map(&line_of(65_535), FlattenMode::Compacted);
        assert!(geometry.is_indexed());
        assert_eq!(geometry.indices.iter().max(), Some(&(u16::MAX - 1)));

        let geometry = flatten_mesh_map(&line_of(65_536), FlattenMode::Compacted);
        assert!(!geometry.is_indexed());
        assert_eq!(geometry.vertex_count(), 65_536);
    }

    #[test]
    fn test_legacy_never_emits_restart_index() {
        let geometry = flatten_mesh_map(&line_of(21_845), FlattenMode::Legacy);
        assert!(geometry.is_indexed());
        assert_eq!(geometry.indices.iter().max(), Some(&(u16::MAX - 1)));

        let geometry = flatten_mesh_map(&line_of(21_846), FlattenMode::Legacy);
        assert!(!geometry.is_indexed());
    }
}
