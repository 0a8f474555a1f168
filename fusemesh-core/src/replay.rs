//! In-memory engine that replays precomputed chunk meshes
//!
//! `ReplayEngine` implements [`FusionEngine`] without computing any signed
//! distances. Integrated frames are recorded; chunk meshes are staged by the
//! caller and published on the next [`MeshSource::update_meshes`], the same
//! dirty-then-remesh cycle a real engine goes through. Useful for tests,
//! headless demos and for playing back meshes captured elsewhere.

use crate::{
    config::FusionConfig,
    error::{Error, Result},
    integrator::ProjectionIntegrator,
    mesh::{ChunkId, ChunkMesh, MeshMap},
    point::Vector3f,
    point_cloud::PointCloud3f,
    traits::{FusionEngine, IntegrablePointCloudSink, MeshSource},
    transform::Transform3D,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// What the engine saw for one integrated frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub point_count: usize,
    /// Points within `far_clipping` of the camera origin
    pub points_in_range: usize,
    pub extrinsic: Transform3D,
    pub ray_truncation: f32,
    pub far_clipping: f32,
    pub carving: bool,
}

#[derive(Debug, Clone)]
pub struct ReplayEngine {
    chunk_extent: nalgebra::Vector3<f32>,
    meshes: MeshMap,
    staged: BTreeMap<ChunkId, Option<Arc<ChunkMesh>>>,
    frames: Vec<FrameRecord>,
}

impl ReplayEngine {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            chunk_extent: config.chunk_extent(),
            meshes: MeshMap::new(),
            staged: BTreeMap::new(),
            frames: Vec::new(),
        }
    }

    /// Queue a mesh for `id`; visible after the next `update_meshes`
    pub fn stage_chunk_mesh(&mut self, id: ChunkId, mesh: ChunkMesh) {
        self.staged.insert(id, Some(Arc::new(mesh)));
    }

    /// Queue removal of `id`; applied on the next `update_meshes`
    pub fn stage_chunk_removal(&mut self, id: ChunkId) {
        self.staged.insert(id, None);
    }

    /// Chunks with pending changes
    pub fn dirty_chunks(&self) -> usize {
        self.staged.len()
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }
}

impl IntegrablePointCloudSink for ReplayEngine {
    fn integrate_point_cloud(
        &mut self,
        integrator: &ProjectionIntegrator,
        cloud: &PointCloud3f,
        extrinsic: &Transform3D,
        ray_truncation: f32,
        far_clipping: f32,
    ) -> Result<()> {
        if cloud.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidData("point cloud contains non-finite coordinates".into()));
        }

        let origin = extrinsic.transform_point(&nalgebra::Point3::origin());
        let points_in_range = cloud
            .iter()
            .filter(|p| (extrinsic.transform_point(p) - origin).norm() <= far_clipping)
            .count();

        debug!(
            points = cloud.len(),
            points_in_range,
            "recorded frame {}",
            self.frames.len()
        );

        self.frames.push(FrameRecord {
            point_count: cloud.len(),
            points_in_range,
            extrinsic: *extrinsic,
            ray_truncation,
            far_clipping,
            carving: integrator.enable_carving,
        });
        Ok(())
    }
}

impl MeshSource for ReplayEngine {
    fn update_meshes(&mut self) {
        for (id, mesh) in std::mem::take(&mut self.staged) {
            match mesh {
                Some(mesh) => {
                    self.meshes.insert(id, mesh);
                }
                None => {
                    self.meshes.remove(&id);
                }
            }
        }
    }

    fn all_meshes(&self) -> MeshMap {
        self.meshes.clone()
    }
}

impl FusionEngine for ReplayEngine {
    fn chunk_centroids(&self) -> Vec<Vector3f> {
        self.meshes
            .keys()
            .chain(self.staged.keys())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .map(|id| id.centroid(self.chunk_extent))
            .collect()
    }
}
