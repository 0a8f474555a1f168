//! Offscreen wgpu implementation of the draw seam

use super::device::GpuContext;
use crate::draw::{GpuDrawTarget, Location, PrimitiveMode, ProgramHandle, ShaderKind};
use crate::shaders::{attrib_slot, uniform_slot, BASIC_WGSL, SHADED_WGSL};
use bytemuck::{Pod, Zeroable};
use fusemesh_core::{Error, Result};
use nalgebra::{Matrix4, Vector3};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 0,
    format: wgpu::VertexFormat::Float32x3,
}];

const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 1,
    format: wgpu::VertexFormat::Float32x3,
}];

const ALL_MODES: [PrimitiveMode; 5] = [
    PrimitiveMode::Points,
    PrimitiveMode::Lines,
    PrimitiveMode::LineStrip,
    PrimitiveMode::Triangles,
    PrimitiveMode::TriangleStrip,
];

/// Uniform block shared by both built-in programs, in slot order
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshUniforms {
    pub mvp: [[f32; 4]; 4],
    pub mv: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub light_vec: [f32; 4],
}

impl Default for MeshUniforms {
    fn default() -> Self {
        Self {
            mvp: Matrix4::identity().into(),
            mv: Matrix4::identity().into(),
            color: [1.0, 1.0, 1.0, 1.0],
            light_vec: [0.0, 0.0, -1.0, 0.0],
        }
    }
}

fn topology(mode: PrimitiveMode) -> wgpu::PrimitiveTopology {
    match mode {
        PrimitiveMode::Points => wgpu::PrimitiveTopology::PointList,
        PrimitiveMode::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

struct Program {
    kind: ShaderKind,
    pipelines: HashMap<PrimitiveMode, wgpu::RenderPipeline>,
}

/// Renders into an offscreen color + depth target.
///
/// Every draw call is encoded and submitted on its own; the first draw after
/// [`WgpuDrawTarget::clear`] clears the target.
pub struct WgpuDrawTarget {
    gpu: GpuContext,
    width: u32,
    height: u32,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline_layout: wgpu::PipelineLayout,
    programs: Vec<Program>,
    bound: Option<ProgramHandle>,
    uniforms: MeshUniforms,
    attribs: BTreeMap<Location, Vec<f32>>,
    pending_clear: Option<wgpu::Color>,
    draw_count: usize,
}

impl WgpuDrawTarget {
    /// Create a target of `width` x `height` pixels on a new device
    pub async fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Gpu(format!("invalid target size {}x{}", width, height)));
        }
        let gpu = GpuContext::new().await?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color_texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = MeshUniforms::default();
        let uniform_buffer = gpu.create_buffer_init(
            "Mesh Uniform Buffer",
            &[uniforms],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("mesh_bind_group_layout"),
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("mesh_bind_group"),
        });

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        Ok(Self {
            gpu,
            width,
            height,
            color_texture,
            color_view,
            depth_view,
            uniform_buffer,
            bind_group,
            pipeline_layout,
            programs: Vec::new(),
            bound: None,
            uniforms,
            attribs: BTreeMap::new(),
            pending_clear: Some(wgpu::Color::BLACK),
            draw_count: 0,
        })
    }

    /// Blocking constructor for synchronous frame loops
    pub fn new_blocking(width: u32, height: u32) -> Result<Self> {
        pollster::block_on(Self::new(width, height))
    }

    /// Clear color and depth before the next draw
    pub fn clear(&mut self, color: [f64; 4]) {
        self.pending_clear = Some(wgpu::Color {
            r: color[0],
            g: color[1],
            b: color[2],
            a: color[3],
        });
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The color attachment, for presenting or copying out
    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color_texture
    }

    /// Draw calls submitted so far
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    fn create_pipeline(&self, kind: ShaderKind, shader: &wgpu::ShaderModule, mode: PrimitiveMode) -> wgpu::RenderPipeline {
        let position = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        };
        let normal = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRIBUTES,
        };
        let buffers = match kind {
            ShaderKind::Basic => vec![position],
            ShaderKind::Shaded => vec![position, normal],
        };
        let strip_index_format = match mode {
            PrimitiveMode::LineStrip | PrimitiveMode::TriangleStrip => Some(wgpu::IndexFormat::Uint16),
            _ => None,
        };

        self.gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{:?} {:?} Mesh Render Pipeline", kind, mode)),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: topology(mode),
                strip_index_format,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
    }

    fn submit_draw(&mut self, mode: PrimitiveMode, indices: Option<&[u16]>, first: usize, count: usize) {
        let Some(handle) = self.bound else {
            warn!("draw issued with no program bound");
            return;
        };
        let Some(program) = self.programs.get(handle.0 as usize) else {
            warn!(?handle, "draw issued with unknown program");
            return;
        };
        let Some(pipeline) = program.pipelines.get(&mode) else {
            warn!(?mode, "no pipeline for primitive mode");
            return;
        };
        let positions = match self.attribs.get(&Location(0)) {
            Some(p) if !p.is_empty() => p,
            _ => {
                debug!("draw skipped, no vertex data bound");
                return;
            }
        };

        let vertex_buffer = self.gpu.create_buffer_init("Mesh Vertex Buffer", positions, wgpu::BufferUsages::VERTEX);
        let normal_buffer = match program.kind {
            ShaderKind::Basic => None,
            ShaderKind::Shaded => {
                let zeros;
                let normals = match self.attribs.get(&Location(1)) {
                    Some(n) if n.len() == positions.len() => n.as_slice(),
                    _ => {
                        zeros = vec![0.0f32; positions.len()];
                        zeros.as_slice()
                    }
                };
                Some(self.gpu.create_buffer_init("Mesh Normal Buffer", normals, wgpu::BufferUsages::VERTEX))
            }
        };
        let index_buffer = indices
            .map(|i| self.gpu.create_buffer_init("Mesh Index Buffer", i, wgpu::BufferUsages::INDEX));

        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Mesh Render Encoder"),
        });

        let (color_load, depth_load) = match self.pending_clear.take() {
            Some(color) => (wgpu::LoadOp::Clear(color), wgpu::LoadOp::Clear(1.0)),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            if let Some(normal_buffer) = &normal_buffer {
                render_pass.set_vertex_buffer(1, normal_buffer.slice(..));
            }
            match (&index_buffer, indices) {
                (Some(index_buffer), Some(indices)) => {
                    render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                    render_pass.draw_indexed(0..indices.len() as u32, 0, 0..1);
                }
                _ => {
                    render_pass.draw(first as u32..(first + count) as u32, 0..1);
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.draw_count += 1;
    }
}

impl GpuDrawTarget for WgpuDrawTarget {
    fn create_program(&mut self, kind: ShaderKind) -> Result<ProgramHandle> {
        let (label, source) = match kind {
            ShaderKind::Basic => ("Basic Mesh Shader", BASIC_WGSL),
            ShaderKind::Shaded => ("Shaded Mesh Shader", SHADED_WGSL),
        };

        let pipelines = self.gpu.validated(|_| {
            let shader = self.gpu.create_shader_module(label, source);
            ALL_MODES
                .iter()
                .map(|&mode| (mode, self.create_pipeline(kind, &shader, mode)))
                .collect::<HashMap<_, _>>()
        })?;

        self.programs.push(Program { kind, pipelines });
        Ok(ProgramHandle((self.programs.len() - 1) as u32))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<Location> {
        let program = self.programs.get(program.0 as usize)?;
        uniform_slot(program.kind, name)
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<Location> {
        let program = self.programs.get(program.0 as usize)?;
        attrib_slot(program.kind, name)
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.bound = program;
    }

    fn set_uniform_mat4(&mut self, location: Location, value: &Matrix4<f32>) {
        match location {
            Location(0) => self.uniforms.mvp = (*value).into(),
            Location(1) => self.uniforms.mv = (*value).into(),
            other => warn!(?other, "no mat4 uniform at location"),
        }
    }

    fn set_uniform_vec3(&mut self, location: Location, value: &Vector3<f32>) {
        match location {
            Location(3) => self.uniforms.light_vec = [value.x, value.y, value.z, 0.0],
            other => warn!(?other, "no vec3 uniform at location"),
        }
    }

    fn set_uniform_vec4(&mut self, location: Location, value: [f32; 4]) {
        match location {
            Location(2) => self.uniforms.color = value,
            other => warn!(?other, "no vec4 uniform at location"),
        }
    }

    fn enable_vertex_attrib(&mut self, location: Location, data: &[f32], components: usize) {
        if components != 3 {
            warn!(components, "only 3-component attributes are supported");
            return;
        }
        self.attribs.insert(location, data.to_vec());
    }

    fn disable_vertex_attrib(&mut self, location: Location) {
        self.attribs.remove(&location);
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, indices: &[u16]) {
        self.submit_draw(mode, Some(indices), 0, indices.len());
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize) {
        self.submit_draw(mode, None, first, count);
    }
}
