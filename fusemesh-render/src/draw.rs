//! The narrow graphics seam used by renderable objects
//!
//! `GpuDrawTarget` mirrors the handful of immediate-mode calls a forward
//! renderer needs for one draw: bind a program, upload uniforms, bind vertex
//! attributes, draw, unbind. Backends translate these into their own API.

use fusemesh_core::Result;
use nalgebra::{Matrix4, Vector3};

/// Opaque handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Resolved uniform or attribute location inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(pub u32);

/// The shader programs a renderable can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Flat color, position attribute only
    Basic,
    /// Directional diffuse lighting, position and normal attributes
    Shaded,
}

/// Primitive assembly for a draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

pub trait GpuDrawTarget {
    /// Compile and link a program
    fn create_program(&mut self, kind: ShaderKind) -> Result<ProgramHandle>;

    /// Location of a named uniform, `None` if the program has no such uniform
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<Location>;

    /// Location of a named vertex attribute
    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<Location>;

    /// Bind `program` for subsequent calls, `None` unbinds
    fn use_program(&mut self, program: Option<ProgramHandle>);

    fn set_uniform_mat4(&mut self, location: Location, value: &Matrix4<f32>);

    fn set_uniform_vec3(&mut self, location: Location, value: &Vector3<f32>);

    fn set_uniform_vec4(&mut self, location: Location, value: [f32; 4]);

    /// Enable a tightly packed float attribute with `components` per vertex
    fn enable_vertex_attrib(&mut self, location: Location, data: &[f32], components: usize);

    fn disable_vertex_attrib(&mut self, location: Location);

    /// Indexed draw over the enabled attributes
    fn draw_elements(&mut self, mode: PrimitiveMode, indices: &[u16]);

    /// Non-indexed draw of `count` vertices starting at `first`
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize);
}
