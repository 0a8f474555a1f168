//! # fusemesh render
//!
//! Turns a stream of depth frames into a drawable mesh. Frames are handed to
//! a fusion engine through [`PointCloudAdapter`], the engine's chunk meshes
//! are flattened into draw buffers, and [`FusedMesh`] issues the draw calls
//! against any [`GpuDrawTarget`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fusemesh_core::{FusionConfig, ReplayEngine, Transform3D};
//! use fusemesh_render::{FusedMesh, RecordingDrawTarget};
//! use nalgebra::Matrix4;
//!
//! fn example() -> fusemesh_core::Result<()> {
//!     let config = FusionConfig::default();
//!     let engine = ReplayEngine::new(&config);
//!     let mut mesh = FusedMesh::new(config, engine)?;
//!     let mut target = RecordingDrawTarget::new();
//!
//!     mesh.set_shader(&mut target);
//!     mesh.add_points(&[0.0, 0.0, 1.0], &Transform3D::identity());
//!     mesh.update_vertices();
//!     mesh.render(&mut target, &Matrix4::identity(), &Matrix4::identity());
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod backend;
pub mod draw;
pub mod flatten;
pub mod fused_mesh;
pub mod shaders;

// Re-export commonly used items
pub use adapter::PointCloudAdapter;
pub use backend::*;
pub use draw::{GpuDrawTarget, Location, PrimitiveMode, ProgramHandle, ShaderKind};
pub use flatten::{flatten_mesh_map, FlatGeometry};
pub use fused_mesh::{FusedMesh, DEFAULT_LIGHT_DIRECTION};
