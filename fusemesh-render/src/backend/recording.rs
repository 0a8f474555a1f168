//! A draw target that records every call instead of touching a GPU

use crate::draw::{GpuDrawTarget, Location, PrimitiveMode, ProgramHandle, ShaderKind};
use crate::shaders::{attrib_slot, uniform_slot};
use fusemesh_core::{Error, Result};
use nalgebra::{Matrix4, Vector3};
use std::collections::BTreeMap;

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    UseProgram(Option<ProgramHandle>),
    UniformMat4(Location, Matrix4<f32>),
    UniformVec3(Location, Vector3<f32>),
    UniformVec4(Location, [f32; 4]),
    EnableAttrib {
        location: Location,
        components: usize,
        len: usize,
    },
    DisableAttrib(Location),
    DrawElements {
        mode: PrimitiveMode,
        count: usize,
        attribs: Vec<Location>,
    },
    DrawArrays {
        mode: PrimitiveMode,
        first: usize,
        count: usize,
        attribs: Vec<Location>,
    },
}

impl DrawCommand {
    pub fn is_draw(&self) -> bool {
        matches!(self, DrawCommand::DrawElements { .. } | DrawCommand::DrawArrays { .. })
    }
}

/// Records the command stream; programs resolve the built-in slot layout.
#[derive(Debug, Default)]
pub struct RecordingDrawTarget {
    programs: Vec<ShaderKind>,
    commands: Vec<DrawCommand>,
    enabled: BTreeMap<Location, Vec<f32>>,
    bound: Option<ProgramHandle>,
    reject_programs: bool,
}

impl RecordingDrawTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// A target on which every program fails to link
    pub fn rejecting_programs() -> Self {
        Self {
            reject_programs: true,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Draw calls only
    pub fn draws(&self) -> Vec<&DrawCommand> {
        self.commands.iter().filter(|c| c.is_draw()).collect()
    }

    /// Currently bound program
    pub fn bound_program(&self) -> Option<ProgramHandle> {
        self.bound
    }

    /// Attributes still enabled
    pub fn enabled_attribs(&self) -> Vec<Location> {
        self.enabled.keys().copied().collect()
    }

    pub fn program_kind(&self, program: ProgramHandle) -> Option<ShaderKind> {
        self.programs.get(program.0 as usize).copied()
    }

    /// Values of the attribute at `location`, if enabled
    pub fn attrib_data(&self, location: Location) -> Option<&[f32]> {
        self.enabled.get(&location).map(|d| d.as_slice())
    }
}

impl GpuDrawTarget for RecordingDrawTarget {
    fn create_program(&mut self, kind: ShaderKind) -> Result<ProgramHandle> {
        if self.reject_programs {
            return Err(Error::Gpu(format!("{:?} program failed to link", kind)));
        }
        self.programs.push(kind);
        Ok(ProgramHandle((self.programs.len() - 1) as u32))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<Location> {
        self.program_kind(program).and_then(|kind| uniform_slot(kind, name))
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<Location> {
        self.program_kind(program).and_then(|kind| attrib_slot(kind, name))
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.bound = program;
        self.commands.push(DrawCommand::UseProgram(program));
    }

    fn set_uniform_mat4(&mut self, location: Location, value: &Matrix4<f32>) {
        self.commands.push(DrawCommand::UniformMat4(location, *value));
    }

    fn set_uniform_vec3(&mut self, location: Location, value: &Vector3<f32>) {
        self.commands.push(DrawCommand::UniformVec3(location, *value));
    }

    fn set_uniform_vec4(&mut self, location: Location, value: [f32; 4]) {
        self.commands.push(DrawCommand::UniformVec4(location, value));
    }

    fn enable_vertex_attrib(&mut self, location: Location, data: &[f32], components: usize) {
        self.enabled.insert(location, data.to_vec());
        self.commands.push(DrawCommand::EnableAttrib {
            location,
            components,
            len: data.len(),
        });
    }

    fn disable_vertex_attrib(&mut self, location: Location) {
        self.enabled.remove(&location);
        self.commands.push(DrawCommand::DisableAttrib(location));
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, indices: &[u16]) {
        let attribs = self.enabled_attribs();
        self.commands.push(DrawCommand::DrawElements {
            mode,
            count: indices.len(),
            attribs,
        });
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize) {
        let attribs = self.enabled_attribs();
        self.commands.push(DrawCommand::DrawArrays {
            mode,
            first,
            count,
            attribs,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{ATTRIB_NORMAL, ATTRIB_VERTEX, UNIFORM_MV};

    #[test]
    fn test_programs_resolve_by_kind() {
        let mut target = RecordingDrawTarget::new();
        let basic = target.create_program(ShaderKind::Basic).unwrap();
        let shaded = target.create_program(ShaderKind::Shaded).unwrap();
        assert_ne!(basic, shaded);
        assert!(target.uniform_location(basic, UNIFORM_MV).is_none());
        assert!(target.uniform_location(shaded, UNIFORM_MV).is_some());
        assert!(target.attrib_location(shaded, ATTRIB_NORMAL).is_some());
        assert!(target.attrib_location(ProgramHandle(9), ATTRIB_VERTEX).is_none());
    }

    #[test]
    fn test_rejecting_target_fails_links() {
        let mut target = RecordingDrawTarget::rejecting_programs();
        assert!(matches!(target.create_program(ShaderKind::Basic), Err(Error::Gpu(_))));
    }

    #[test]
    fn test_draw_snapshots_enabled_attribs() {
        let mut target = RecordingDrawTarget::new();
        target.enable_vertex_attrib(Location(0), &[0.0; 9], 3);
        target.draw_arrays(PrimitiveMode::Triangles, 0, 3);
        target.disable_vertex_attrib(Location(0));

        assert!(target.enabled_attribs().is_empty());
        assert_eq!(
            target.draws()[0],
            &DrawCommand::DrawArrays {
                mode: PrimitiveMode::Triangles,
                first: 0,
                count: 3,
                attribs: vec![Location(0)],
            }
        );
    }
}
