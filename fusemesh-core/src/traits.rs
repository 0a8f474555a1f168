//! Seams between the orchestration code and the fusion engine

use crate::{
    error::Result, integrator::ProjectionIntegrator, mesh::MeshMap, point::Vector3f,
    point_cloud::PointCloud3f, transform::Transform3D,
};

/// Anything that can fuse a posed point cloud into a volume
pub trait IntegrablePointCloudSink {
    /// Integrate `cloud`, captured at camera pose `extrinsic`.
    ///
    /// Samples beyond `far_clipping` are ignored; `ray_truncation` bounds
    /// how far along each ray the update reaches.
    fn integrate_point_cloud(
        &mut self,
        integrator: &ProjectionIntegrator,
        cloud: &PointCloud3f,
        extrinsic: &Transform3D,
        ray_truncation: f32,
        far_clipping: f32,
    ) -> Result<()>;
}

/// Anything that produces per-chunk meshes
pub trait MeshSource {
    /// Re-mesh every chunk touched since the last call
    fn update_meshes(&mut self);

    /// Snapshot of all current chunk meshes
    fn all_meshes(&self) -> MeshMap;
}

/// A chunked volumetric fusion engine
pub trait FusionEngine: IntegrablePointCloudSink + MeshSource {
    /// Centers of all allocated chunks, in world space
    fn chunk_centroids(&self) -> Vec<Vector3f>;
}
