//! Core data structures and traits for fusemesh
//!
//! This crate provides the types shared between the frame loop, the
//! volumetric fusion engine and the renderer: point clouds, poses, chunk
//! meshes, bounding boxes, configuration and the engine-facing traits.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod bounding_box;
pub mod config;
pub mod integrator;
pub mod traits;
pub mod transform;
pub mod replay;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use bounding_box::*;
pub use config::*;
pub use integrator::*;
pub use traits::*;
pub use transform::*;
pub use replay::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Point3, UnitQuaternion, Vector3};
