//! Integration tests for fusemesh-core
//!
//! Exercise the engine seams generically and the configuration round trip
//! through the file system.

use fusemesh_core::*;
use nalgebra::Point3;

fn drive<E: FusionEngine>(engine: &mut E, cloud: &PointCloud3f, integrator: &ProjectionIntegrator) -> MeshMap {
    engine
        .integrate_point_cloud(integrator, cloud, &Transform3D::identity(), 0.5, 2.0)
        .unwrap();
    engine.update_meshes();
    engine.all_meshes()
}

#[test]
fn test_engine_through_generic_seam() {
    let config = FusionConfig::default();
    let mut engine = ReplayEngine::new(&config);
    let integrator = ProjectionIntegrator::from_config(&config);
    let cloud = PointCloud3f::from_points(vec![Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 5.0)]);

    engine.stage_chunk_mesh(
        ChunkId::new(0, 0, 1),
        ChunkMesh::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        ),
    );
    let meshes = drive(&mut engine, &cloud, &integrator);

    assert_eq!(meshes.len(), 1);
    assert_eq!(total_index_count(&meshes), 3);
    let frame = engine.last_frame().unwrap();
    assert_eq!(frame.point_count, 2);
    assert_eq!(frame.points_in_range, 1);
    assert!(frame.carving);
    assert_eq!(engine.dirty_chunks(), 0);
}

#[test]
fn test_config_file_round_trip() {
    let config = FusionConfig {
        chunk_size: [8, 8, 8],
        flatten_mode: FlattenMode::Legacy,
        ..FusionConfig::default()
    };
    let path = std::env::temp_dir().join(format!("fusemesh-config-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = FusionConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let result = FusionConfig::from_json_file("/nonexistent/fusemesh/config.json");
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_picking_a_scaled_rotated_object() {
    let bbox = BoundingBox::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
    let object = ObjectTransform {
        position: Vector3::new(0.0, 0.0, -4.0),
        rotation: UnitQuaternion::from_euler_angles(0.0, std::f32::consts::FRAC_PI_4, 0.0),
        scale: Vector3::new(2.0, 2.0, 2.0),
    };
    let model = object.matrix();

    let hit = Segment::new(Point3::origin(), Point3::new(0.0, 0.0, -10.0));
    let miss = Segment::new(Point3::new(3.0, 0.0, 0.0), Point3::new(3.0, 0.0, -10.0));
    let short = Segment::new(Point3::origin(), Point3::new(0.0, 0.0, -1.0));
    assert!(bbox.is_intersecting(&hit, &model));
    assert!(!bbox.is_intersecting(&miss, &model));
    assert!(!bbox.is_intersecting(&short, &model));
}
