//! Integration parameters handed to the fusion engine on every frame

use crate::config::FusionConfig;
use crate::point::Vector3f;
use serde::{Deserialize, Serialize};

/// Truncation distance that does not depend on depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantTruncator {
    pub scale: f32,
}

impl ConstantTruncator {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    pub fn truncation_distance(&self, _depth: f32) -> f32 {
        self.scale
    }
}

/// Integration weight that does not depend on the signed distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantWeighter {
    pub weight: f32,
}

impl ConstantWeighter {
    pub fn new(weight: f32) -> Self {
        Self { weight }
    }

    pub fn weight(&self, _signed_distance: f32) -> f32 {
        self.weight
    }
}

/// Projection integrator settings plus the engine's chunk centroid table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionIntegrator {
    pub truncator: ConstantTruncator,
    pub weighter: ConstantWeighter,
    pub carving_distance: f32,
    pub enable_carving: bool,
    centroids: Vec<Vector3f>,
}

impl ProjectionIntegrator {
    pub fn new(
        truncator: ConstantTruncator,
        weighter: ConstantWeighter,
        carving_distance: f32,
        enable_carving: bool,
    ) -> Self {
        Self {
            truncator,
            weighter,
            carving_distance,
            enable_carving,
            centroids: Vec::new(),
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self::new(
            ConstantTruncator::new(config.truncation_dist_scale),
            ConstantWeighter::new(config.weighting),
            config.carving_distance,
            config.enable_carving,
        )
    }

    /// Link to the engine's current chunk centroids
    pub fn set_centroids(&mut self, centroids: Vec<Vector3f>) {
        self.centroids = centroids;
    }

    pub fn centroids(&self) -> &[Vector3f] {
        &self.centroids
    }
}
