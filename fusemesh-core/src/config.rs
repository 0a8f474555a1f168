//! Fusion and flattening configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How chunk meshes are flattened into a single draw buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenMode {
    /// One vertex per unique referenced index, indices remapped
    #[default]
    Compacted,
    /// One vertex per source index, three indices `i*3..i*3+2` per source
    /// index. Kept for output compatibility with older consumers; the index
    /// buffer does not describe the vertex buffer.
    Legacy,
    /// One vertex per source index and no index buffer
    Expanded,
}

/// Parameters of the fusion engine, its integrator and the flattener.
///
/// Every field has a default so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Voxels per chunk edge
    pub chunk_size: [i32; 3],
    /// Edge length of a voxel in meters
    pub chunk_resolution: f32,
    /// Constant truncation distance scale
    pub truncation_dist_scale: f32,
    /// Constant integration weight
    pub weighting: f32,
    pub enable_carving: bool,
    pub carving_distance: f32,
    /// Points farther than this from the camera are ignored
    pub far_clipping: f32,
    /// Ray truncation distance passed to integration
    pub ray_truncation: f32,
    pub flatten_mode: FlattenMode,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            chunk_size: [16, 16, 16],
            chunk_resolution: 0.06,
            truncation_dist_scale: 8.0,
            weighting: 1.0,
            enable_carving: true,
            carving_distance: 0.5,
            far_clipping: 2.0,
            ray_truncation: 0.5,
            flatten_mode: FlattenMode::Compacted,
        }
    }
}

impl FusionConfig {
    /// Parse a JSON document and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file and validate it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// World-space edge lengths of a chunk
    pub fn chunk_extent(&self) -> nalgebra::Vector3<f32> {
        nalgebra::Vector3::new(
            self.chunk_size[0] as f32 * self.chunk_resolution,
            self.chunk_size[1] as f32 * self.chunk_resolution,
            self.chunk_size[2] as f32 * self.chunk_resolution,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size.iter().any(|&s| s <= 0) {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be positive, got {:?}",
                self.chunk_size
            )));
        }
        positive("chunk_resolution", self.chunk_resolution)?;
        positive("truncation_dist_scale", self.truncation_dist_scale)?;
        positive("weighting", self.weighting)?;
        positive("far_clipping", self.far_clipping)?;
        non_negative("carving_distance", self.carving_distance)?;
        non_negative("ray_truncation", self.ray_truncation)?;
        Ok(())
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{} must be positive, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{} must not be negative, got {}", name, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_values() {
        let config = FusionConfig::default();
        assert_eq!(config.chunk_size, [16, 16, 16]);
        assert_eq!(config.truncation_dist_scale, 8.0);
        assert_eq!(config.weighting, 1.0);
        assert!(config.enable_carving);
        assert_eq!(config.carving_distance, 0.5);
        assert_eq!(config.chunk_resolution, 0.06);
        assert_eq!(config.far_clipping, 2.0);
        assert_eq!(config.ray_truncation, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FusionConfig::from_json_str(
            r#"{ "chunk_resolution": 0.03, "flatten_mode": "legacy" }"#,
        )
        .unwrap();
        assert_eq!(config.chunk_resolution, 0.03);
        assert_eq!(config.flatten_mode, FlattenMode::Legacy);
        assert_eq!(config.chunk_size, [16, 16, 16]);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = FusionConfig::from_json_str(r#"{ "use_color": true, "far_clipping": 3.0 }"#).unwrap();
        assert_eq!(config.far_clipping, 3.0);
        assert_eq!(
            serde_json::to_value(&config).unwrap().get("use_color"),
            None
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = FusionConfig {
            chunk_resolution: 0.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidConfig(_))));

        let bad = FusionConfig {
            chunk_size: [16, 0, 16],
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = FusionConfig {
            ray_truncation: f32::NAN,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            FusionConfig::from_json_str("{ chunk_size: }"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            FusionConfig::from_json_file("/nonexistent/fusemesh.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_chunk_extent() {
        let config = FusionConfig::default();
        let extent = config.chunk_extent();
        assert!((extent.x - 0.96).abs() < 1e-6);
    }
}
