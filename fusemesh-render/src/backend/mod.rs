//! Draw target implementations

pub mod recording;
#[cfg(feature = "wgpu")]
pub mod device;
#[cfg(feature = "wgpu")]
pub mod offscreen;

pub use recording::{DrawCommand, RecordingDrawTarget};
#[cfg(feature = "wgpu")]
pub use device::GpuContext;
#[cfg(feature = "wgpu")]
pub use offscreen::{MeshUniforms, WgpuDrawTarget};
