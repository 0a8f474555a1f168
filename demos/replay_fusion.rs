//! Replay fusion demo
//!
//! Feeds synthetic depth frames of a tilted plane through a `FusedMesh`
//! backed by the in-memory replay engine, publishes a chunked mesh of the
//! same plane, and renders it. Without the `gpu` feature the draw calls are
//! recorded and summarized; with it they are submitted to an offscreen
//! wgpu target.
//!
//! ```text
//! cargo run -p fusemesh-demos --bin replay_fusion -- --frames 20 --lighting
//! RUST_LOG=debug cargo run -p fusemesh-demos --bin replay_fusion
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fusemesh_core::{ChunkId, ChunkMesh, FlattenMode, FusionConfig, Point3f, ReplayEngine, Segment, Transform3D};
use fusemesh_render::{FusedMesh, RecordingDrawTarget};
use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "replay_fusion", about = "Replay synthetic frames through a fused mesh")]
struct Args {
    /// JSON fusion configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of synthetic frames to integrate
    #[arg(short, long, default_value_t = 10)]
    frames: usize,

    /// Points per frame edge (a frame holds `grid * grid` points)
    #[arg(short, long, default_value_t = 32)]
    grid: usize,

    /// Chunks along each horizontal axis of the published mesh
    #[arg(long, default_value_t = 4)]
    chunks: i32,

    /// Use the lit program
    #[arg(long)]
    lighting: bool,

    /// Override the configured flatten mode
    #[arg(long, value_enum)]
    flatten_mode: Option<FlattenArg>,

    /// Render offscreen through wgpu instead of recording draw calls
    #[cfg(feature = "gpu")]
    #[arg(long)]
    gpu: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FlattenArg {
    Compacted,
    Legacy,
    Expanded,
}

impl From<FlattenArg> for FlattenMode {
    fn from(arg: FlattenArg) -> Self {
        match arg {
            FlattenArg::Compacted => FlattenMode::Compacted,
            FlattenArg::Legacy => FlattenMode::Legacy,
            FlattenArg::Expanded => FlattenMode::Expanded,
        }
    }
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wgpu=warn,naga=warn"));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// A `grid` x `grid` patch of the plane `z = 1 + 0.2 x` in camera space
fn synthetic_frame(grid: usize) -> Vec<f32> {
    let step = 1.0 / grid.max(1) as f32;
    let mut points = Vec::with_capacity(grid * grid * 3);
    for i in 0..grid {
        for j in 0..grid {
            let x = i as f32 * step - 0.5;
            let y = j as f32 * step - 0.5;
            points.extend_from_slice(&[x, y, 1.0 + 0.2 * x]);
        }
    }
    points
}

/// The camera orbits the origin a little further every frame
fn frame_pose(frame: usize) -> Transform3D {
    let angle = frame as f32 * 0.05;
    Transform3D::translation(Vector3::new(0.0, 0.0, -0.5))
        * Transform3D::rotation(UnitQuaternion::from_euler_angles(0.0, angle, 0.0))
}

/// Two triangles per cell covering one chunk footprint at height 0
fn chunk_patch(id: ChunkId, extent: Vector3<f32>, cells: usize) -> ChunkMesh {
    let origin = Vector3::new(id.x as f32 * extent.x, id.y as f32 * extent.y, 0.0);
    let side = cells + 1;
    let mut vertices: Vec<Point3f> = Vec::with_capacity(side * side);
    for i in 0..side {
        for j in 0..side {
            let u = i as f32 / cells as f32;
            let v = j as f32 / cells as f32;
            vertices.push(Point3::from(origin + Vector3::new(u * extent.x, v * extent.y, 0.0)));
        }
    }

    let mut indices = Vec::with_capacity(cells * cells * 6);
    for i in 0..cells {
        for j in 0..cells {
            let a = i * side + j;
            let b = a + side;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    ChunkMesh::new(vertices, indices).with_normals(vec![Vector3::z(); side * side])
}

fn load_config(args: &Args) -> Result<FusionConfig> {
    let mut config = match &args.config {
        Some(path) => FusionConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FusionConfig::default(),
    };
    if let Some(mode) = args.flatten_mode {
        config.flatten_mode = mode.into();
    }
    Ok(config)
}

fn build_mesh(args: &Args, config: FusionConfig) -> Result<FusedMesh<ReplayEngine>> {
    let engine = ReplayEngine::new(&config);
    let extent = config.chunk_extent();
    let mut mesh = FusedMesh::new(config, engine).context("failed to create fused mesh")?;

    let frame = synthetic_frame(args.grid);
    for i in 0..args.frames {
        mesh.add_points(&frame, &frame_pose(i));
    }

    for x in 0..args.chunks {
        for y in 0..args.chunks {
            let id = ChunkId::new(x, y, 0);
            mesh.engine_mut().stage_chunk_mesh(id, chunk_patch(id, extent, 4));
        }
    }
    mesh.update_vertices();
    mesh.set_position(Vector3::new(0.0, 0.0, -2.0));

    let frames = mesh.engine().frames();
    let in_range: usize = frames.iter().map(|f| f.points_in_range).sum();
    info!(
        frames = frames.len(),
        points_in_range = in_range,
        vertices = mesh.geometry().vertex_count(),
        indices = mesh.indices().len(),
        "replayed frames"
    );
    Ok(mesh)
}

fn camera() -> (Matrix4<f32>, Matrix4<f32>) {
    let projection = Matrix4::new_perspective(4.0 / 3.0, std::f32::consts::FRAC_PI_3, 0.1, 100.0);
    let view = Matrix4::look_at_rh(
        &Point3::new(0.0, -1.5, 1.0),
        &Point3::new(0.0, 0.0, -2.0),
        &Vector3::y(),
    );
    (projection, view)
}

fn pick(mesh: &FusedMesh<ReplayEngine>) {
    let ray = Segment::new(Point3::new(0.1, 0.1, 10.0), Point3::new(0.1, 0.1, -10.0));
    info!(hit = mesh.is_intersecting(&ray), "picking ray through mesh");
}

fn run_recording(args: &Args, mut mesh: FusedMesh<ReplayEngine>) {
    let mut target = RecordingDrawTarget::new();
    mesh.set_shader_lighting(&mut target, args.lighting);
    mesh.set_bounding_box();
    pick(&mesh);

    let (projection, view) = camera();
    mesh.render(&mut target, &projection, &view);
    info!(
        commands = target.commands().len(),
        draws = target.draws().len(),
        "recorded frame"
    );
    for draw in target.draws() {
        info!(?draw, "draw call");
    }
}

#[cfg(feature = "gpu")]
fn run_gpu(args: &Args, mut mesh: FusedMesh<ReplayEngine>) -> Result<()> {
    use fusemesh_render::WgpuDrawTarget;

    let mut target = WgpuDrawTarget::new_blocking(800, 600).context("failed to create offscreen target")?;
    mesh.set_shader_lighting(&mut target, args.lighting);
    mesh.set_bounding_box();
    pick(&mesh);

    let (projection, view) = camera();
    target.clear([0.1, 0.1, 0.12, 1.0]);
    mesh.render(&mut target, &projection, &view);
    let (width, height) = target.size();
    info!(width, height, draws = target.draw_count(), "rendered offscreen frame");
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = load_config(&args)?;
    info!(?config, "using fusion config");
    let mesh = build_mesh(&args, config)?;

    #[cfg(feature = "gpu")]
    if args.gpu {
        return run_gpu(&args, mesh);
    }

    run_recording(&args, mesh);
    Ok(())
}
