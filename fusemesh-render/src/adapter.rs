//! Feeding flat coordinate frames into a fusion engine

use fusemesh_core::{
    flat_remainder, FusionConfig, IntegrablePointCloudSink, PointCloud3f, ProjectionIntegrator,
    Transform3D,
};
use tracing::{debug, error, warn};

/// Owns the per-frame point cloud and the integration parameters.
#[derive(Debug, Clone)]
pub struct PointCloudAdapter {
    cloud: PointCloud3f,
    integrator: ProjectionIntegrator,
    ray_truncation: f32,
    far_clipping: f32,
}

impl PointCloudAdapter {
    pub fn new(integrator: ProjectionIntegrator, ray_truncation: f32, far_clipping: f32) -> Self {
        Self {
            cloud: PointCloud3f::new(),
            integrator,
            ray_truncation,
            far_clipping,
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(
            ProjectionIntegrator::from_config(config),
            config.ray_truncation,
            config.far_clipping,
        )
    }

    /// Replace the held cloud with `points` and integrate it into `sink`.
    ///
    /// `points` holds xyz triplets; a trailing partial triplet is dropped.
    /// `pose` is the camera-to-world transform at capture time. Integration
    /// failures are logged, not returned.
    pub fn add_points<S>(&mut self, sink: &mut S, points: &[f32], pose: &Transform3D)
    where
        S: IntegrablePointCloudSink + ?Sized,
    {
        let count = self.cloud.replace_from_flat(points);
        let leftover = flat_remainder(points);
        if leftover != 0 {
            warn!(leftover, "point buffer length is not a multiple of 3, dropping trailing values");
        }
        debug!(points = count, "received point cloud frame");

        let mut extrinsic = Transform3D::identity();
        for r in 0..4 {
            for c in 0..4 {
                extrinsic.set(r, c, pose.get(r, c));
            }
        }

        if let Err(e) = sink.integrate_point_cloud(
            &self.integrator,
            &self.cloud,
            &extrinsic,
            self.ray_truncation,
            self.far_clipping,
        ) {
            error!("point cloud integration failed: {}", e);
        }
    }

    /// The most recently ingested frame
    pub fn cloud(&self) -> &PointCloud3f {
        &self.cloud
    }

    pub fn integrator(&self) -> &ProjectionIntegrator {
        &self.integrator
    }

    pub fn integrator_mut(&mut self) -> &mut ProjectionIntegrator {
        &mut self.integrator
    }

    pub fn ray_truncation(&self) -> f32 {
        self.ray_truncation
    }

    pub fn far_clipping(&self) -> f32 {
        self.far_clipping
    }
}
