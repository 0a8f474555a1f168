//! The renderable reconstruction: ingest frames, extract meshes, draw them

use crate::adapter::PointCloudAdapter;
use crate::draw::{GpuDrawTarget, Location, PrimitiveMode, ProgramHandle, ShaderKind};
use crate::flatten::{flatten_mesh_map, FlatGeometry};
use crate::shaders::{
    ATTRIB_NORMAL, ATTRIB_VERTEX, UNIFORM_COLOR, UNIFORM_LIGHT_VEC, UNIFORM_MV, UNIFORM_MVP,
};
use fusemesh_core::{
    BoundingBox, FusionConfig, FusionEngine, ObjectTransform, PointCloud3f, Result, Segment,
    Transform3D, UnitQuaternion, Vector3f,
};
use nalgebra::{Matrix4, Vector3};
use tracing::{error, info, warn};

/// Direction of the default directional light before normalization
pub const DEFAULT_LIGHT_DIRECTION: [f32; 3] = [-1.0, -3.0, -1.0];

/// Program handle plus every location the render path may touch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ShaderBindings {
    program: Option<ProgramHandle>,
    mvp: Option<Location>,
    mv: Option<Location>,
    light_vec: Option<Location>,
    color: Option<Location>,
    vertex: Option<Location>,
    normal: Option<Location>,
}

impl ShaderBindings {
    fn resolve<T: GpuDrawTarget + ?Sized>(target: &mut T, kind: ShaderKind) -> Result<Self> {
        let program = target.create_program(kind)?;
        let mut bindings = Self {
            program: Some(program),
            mvp: target.uniform_location(program, UNIFORM_MVP),
            color: target.uniform_location(program, UNIFORM_COLOR),
            vertex: target.attrib_location(program, ATTRIB_VERTEX),
            ..Self::default()
        };
        if kind == ShaderKind::Shaded {
            bindings.mv = target.uniform_location(program, UNIFORM_MV);
            bindings.light_vec = target.uniform_location(program, UNIFORM_LIGHT_VEC);
            bindings.normal = target.attrib_location(program, ATTRIB_NORMAL);
        }
        Ok(bindings)
    }
}

/// A mesh reconstructed by a fusion engine and drawn as one object.
///
/// Frames go in through [`FusedMesh::add_points`], the draw buffers are
/// rebuilt by [`FusedMesh::update_vertices`], and [`FusedMesh::render`]
/// draws whatever was last extracted.
pub struct FusedMesh<E> {
    config: FusionConfig,
    engine: E,
    adapter: PointCloudAdapter,
    geometry: FlatGeometry,
    bindings: ShaderBindings,
    is_lighting_on: bool,
    bounding_box: Option<BoundingBox>,
    light_direction: Vector3f,
    color: [f32; 4],
    transform: ObjectTransform,
    render_mode: PrimitiveMode,
}

impl<E: FusionEngine> FusedMesh<E> {
    /// Bind `engine` to an integrator built from `config`
    pub fn new(config: FusionConfig, engine: E) -> Result<Self> {
        Self::with_render_mode(config, engine, PrimitiveMode::Triangles)
    }

    pub fn with_render_mode(config: FusionConfig, engine: E, render_mode: PrimitiveMode) -> Result<Self> {
        config.validate()?;

        let mut adapter = PointCloudAdapter::from_config(&config);
        adapter.integrator_mut().set_centroids(engine.chunk_centroids());
        info!(
            chunk_size = ?config.chunk_size,
            resolution = config.chunk_resolution,
            "fusion container created"
        );

        Ok(Self {
            config,
            engine,
            adapter,
            geometry: FlatGeometry::default(),
            bindings: ShaderBindings::default(),
            is_lighting_on: false,
            bounding_box: None,
            light_direction: default_light_direction(),
            color: [1.0, 1.0, 1.0, 1.0],
            transform: ObjectTransform::default(),
            render_mode,
        })
    }

    /// Integrate one frame of xyz triplets captured at `pose`
    pub fn add_points(&mut self, points: &[f32], pose: &Transform3D) {
        self.adapter
            .integrator_mut()
            .set_centroids(self.engine.chunk_centroids());
        self.adapter.add_points(&mut self.engine, points, pose);
    }

    /// Re-mesh dirty chunks and rebuild the draw buffers from scratch
    pub fn update_vertices(&mut self) {
        self.engine.update_meshes();
        let meshes = self.engine.all_meshes();
        info!("generating mesh from map with {} chunks", meshes.len());

        let geometry = flatten_mesh_map(&meshes, self.config.flatten_mode);
        info!("got {} vertices", geometry.vertex_count());
        self.set_geometry(geometry);
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E> FusedMesh<E> {
    /// Unlit program; clears lighting and the bounding box
    pub fn set_shader<T: GpuDrawTarget + ?Sized>(&mut self, target: &mut T) {
        self.bindings = match ShaderBindings::resolve(target, ShaderKind::Basic) {
            Ok(bindings) => bindings,
            Err(e) => {
                error!("could not create program: {}", e);
                ShaderBindings::default()
            }
        };
        self.is_lighting_on = false;
        self.bounding_box = None;
    }

    /// Lit program when `is_lighting_on`, otherwise [`FusedMesh::set_shader`]
    pub fn set_shader_lighting<T: GpuDrawTarget + ?Sized>(&mut self, target: &mut T, is_lighting_on: bool) {
        if !is_lighting_on {
            self.set_shader(target);
            return;
        }

        self.bindings = match ShaderBindings::resolve(target, ShaderKind::Shaded) {
            Ok(bindings) => bindings,
            Err(e) => {
                error!("could not create program: {}", e);
                ShaderBindings::default()
            }
        };
        self.is_lighting_on = true;
        self.light_direction = default_light_direction();
    }

    /// Axis-aligned box over the current vertices; call after setting them
    pub fn set_bounding_box(&mut self) {
        if self.geometry.vertices.is_empty() {
            error!("set_bounding_box called before any vertices were set");
            return;
        }
        self.bounding_box = BoundingBox::from_flat(&self.geometry.vertices);
        if self.bounding_box.is_none() {
            error!(
                values = self.geometry.vertices.len(),
                "set_bounding_box: vertex buffer holds no complete vertex"
            );
        }
    }

    /// Set the directional light; the direction is normalized
    pub fn set_light_direction(&mut self, direction: Vector3f) {
        let normalized = if direction.iter().all(|c| c.is_finite()) {
            direction.try_normalize(f32::EPSILON)
        } else {
            None
        };
        match normalized {
            Some(d) => self.light_direction = d,
            None => warn!(?direction, "ignoring degenerate light direction"),
        }
    }

    /// Segment test against the bounding box in object space
    pub fn is_intersecting(&self, segment: &Segment) -> bool {
        match &self.bounding_box {
            Some(bounding_box) => bounding_box.is_intersecting(segment, &self.transformation_matrix()),
            None => {
                error!("is_intersecting: bounding box is not available");
                false
            }
        }
    }

    /// Draw the current geometry with the caller's camera matrices
    pub fn render<T: GpuDrawTarget + ?Sized>(
        &self,
        target: &mut T,
        projection: &Matrix4<f32>,
        view: &Matrix4<f32>,
    ) {
        let b = &self.bindings;
        let Some(program) = b.program else {
            error!("render: no shader program, call set_shader first");
            return;
        };

        target.use_program(Some(program));
        let model = self.transformation_matrix().matrix;
        let mv = view * model;
        let mvp = projection * mv;
        if let Some(loc) = b.mvp {
            target.set_uniform_mat4(loc, &mvp);
        }
        if let Some(loc) = b.color {
            target.set_uniform_vec4(loc, self.color);
        }

        let mut normals_bound = None;
        if self.is_lighting_on {
            if let Some(loc) = b.mv {
                target.set_uniform_mat4(loc, &mv);
            }
            match b.normal {
                Some(loc) if self.geometry.has_normals() => {
                    target.enable_vertex_attrib(loc, &self.geometry.normals, 3);
                    normals_bound = Some(loc);
                }
                Some(_) => warn!(
                    normals = self.geometry.normals.len(),
                    vertices = self.geometry.vertices.len(),
                    "normal buffer does not match vertices, drawing without normals"
                ),
                None => {}
            }
            let light_direction: Vector3<f32> = view.fixed_view::<3, 3>(0, 0) * self.light_direction;
            if let Some(loc) = b.light_vec {
                target.set_uniform_vec3(loc, &light_direction);
            }
        }

        if let Some(loc) = b.vertex {
            target.enable_vertex_attrib(loc, &self.geometry.vertices, 3);
        }

        if self.geometry.is_indexed() {
            target.draw_elements(self.render_mode, &self.geometry.indices);
        } else {
            target.draw_arrays(self.render_mode, 0, self.geometry.vertices.len() / 3);
        }

        if let Some(loc) = b.vertex {
            target.disable_vertex_attrib(loc);
        }
        if let Some(loc) = normals_bound {
            target.disable_vertex_attrib(loc);
        }
        target.use_program(None);
    }

    /// Replace the draw buffers
    pub fn set_geometry(&mut self, geometry: FlatGeometry) {
        self.geometry = geometry;
    }

    pub fn set_vertices(&mut self, vertices: Vec<f32>, indices: Vec<u16>) {
        self.geometry = FlatGeometry {
            vertices,
            normals: Vec::new(),
            indices,
        };
    }

    pub fn set_vertices_with_normals(&mut self, vertices: Vec<f32>, indices: Vec<u16>, normals: Vec<f32>) {
        self.geometry = FlatGeometry {
            vertices,
            normals,
            indices,
        };
    }

    pub fn geometry(&self) -> &FlatGeometry {
        &self.geometry
    }

    pub fn vertices(&self) -> &[f32] {
        &self.geometry.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.geometry.indices
    }

    pub fn normals(&self) -> &[f32] {
        &self.geometry.normals
    }

    /// The most recently integrated frame
    pub fn point_cloud(&self) -> &PointCloud3f {
        self.adapter.cloud()
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn is_lighting_on(&self) -> bool {
        self.is_lighting_on
    }

    pub fn is_bounding_box_on(&self) -> bool {
        self.bounding_box.is_some()
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bounding_box.as_ref()
    }

    pub fn light_direction(&self) -> Vector3f {
        self.light_direction
    }

    pub fn set_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.color = [red, green, blue, alpha];
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn render_mode(&self) -> PrimitiveMode {
        self.render_mode
    }

    pub fn set_position(&mut self, position: Vector3f) {
        self.transform.position = position;
    }

    pub fn set_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.transform.rotation = rotation;
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.transform.rotation
    }

    pub fn set_scale(&mut self, scale: Vector3f) {
        self.transform.scale = scale;
    }

    /// Model matrix of this object
    pub fn transformation_matrix(&self) -> Transform3D {
        self.transform.matrix()
    }
}

fn default_light_direction() -> Vector3f {
    Vector3f::from(DEFAULT_LIGHT_DIRECTION).normalize()
}
