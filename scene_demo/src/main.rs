//! Display list demo
//!
//! Builds a small scene (a floor, a shadow-casting light, a level-of-detail
//! crate and a collision test point), renders it from a camera orbiting the
//! origin and logs what the traversal emits.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use thiserror::Error;
use tiler_engine::config::ConfigError;
use tiler_engine::foundation::logging;
use tiler_engine::prelude::*;

const FRAMES: usize = 4;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Display list error: {0}")]
    Scene(#[from] SceneError),
}

/// Names the demo keeps to modify the list between frames
struct DemoScene {
    builder: SceneBuilder,
    camera: Name,
    orbit: Name,
}

fn load_config() -> Result<EngineConfig, DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {path}");
            EngineConfig::load_from_file(&path)?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn build_scene(config: EngineConfig) -> Result<DemoScene, DemoError> {
    let mut builder = SceneBuilder::new(config)?;

    // The camera sits in its own list so its placement does not move the scene
    let orbit = builder.create_list(true, true, false)?;
    builder.translate(Vec3::new(0.0, 2.0, 12.0))?;
    let camera = builder.add_camera(CameraNode::new(50.0, 0.5, 200.0))?;
    builder.modify_list(None, false)?;

    builder.add_light(LightNode::ambient(Color::new(0.15, 0.15, 0.2)))?;
    builder.add_light(LightNode::parallel(Vec3::new(-0.3, -1.0, -0.4), Color::new(0.9, 0.85, 0.7)).with_shadow())?;
    builder.add_shadow_limit_plane(-Vec3::y(), Point3::new(0.0, -1.0, 0.0))?;

    // Floor slab
    builder.create_list(false, true, false)?;
    builder.add_material(MaterialNode::diffuse(Color::new(0.4, 0.5, 0.4)))?;
    builder.add_convex(slab())?;
    builder.modify_list(None, false)?;

    // Crate with a detailed and a plain version
    let detailed = builder.create_list(true, true, true)?;
    builder.add_material(MaterialNode::diffuse(Color::new(0.7, 0.5, 0.3)).with_specular(Color::new(0.3, 0.3, 0.3), 20.0))?;
    builder.add_convex(Convex::cube(Point3::origin(), 1.0))?;
    builder.add_convex(Convex::cube(Point3::new(0.0, 1.25, 0.0), 0.25))?;
    let plain = builder.create_list(true, true, true)?;
    builder.add_convex(Convex::cube(Point3::origin(), 1.0))?;
    builder.modify_list(None, false)?;
    builder.add_level_of_detail(
        LodNode::new(Point3::origin(), 2.0)
            .with_level(30.0, detailed)
            .with_level(4.0, plain),
    )?;

    // A test point inside the crate
    builder.add_point(Point3::new(0.0, 0.5, 0.0), None)?;
    builder.add_convex(Convex::cube(Point3::origin(), 1.0).with_kind(ConvexKind::Hidden))?;

    Ok(DemoScene { builder, camera, orbit })
}

fn slab() -> Convex {
    let half = Vec3::new(8.0, 0.5, 8.0);
    let center = Point3::new(0.0, -1.5, 0.0);
    let axes = [Vec3::x(), Vec3::y(), Vec3::z()];
    let planes = axes
        .iter()
        .enumerate()
        .flat_map(|(axis, normal)| {
            [
                Plane::new(*normal, center + normal * half[axis]),
                Plane::new(-normal, center - normal * half[axis]),
            ]
        })
        .collect();
    Convex::new(planes).with_bbox(BoundingBox::new(center, half))
}

/// Move the camera around the origin by rebuilding its list
fn place_camera(scene: &mut DemoScene, frame: usize) -> Result<(), DemoError> {
    let angle = frame as f32 * std::f32::consts::FRAC_PI_4;
    let builder = &mut scene.builder;
    builder.modify_list(Some(scene.orbit), true)?;
    builder.rotate(Vec3::y(), angle)?;
    builder.translate(Vec3::new(0.0, 2.0, 12.0 + frame as f32 * 20.0))?;
    scene.camera = builder.add_camera(CameraNode::new(50.0, 0.5, 200.0))?;
    builder.modify_list(None, false)?;
    Ok(())
}

fn log_frame(frame: usize, queue: &PrimitiveQueue, report: &TraversalReport) {
    log::info!(
        "Frame {frame}: {} primitives, {} surfaces, {} shadow volumes, {} culled",
        queue.len(),
        report.surfaces,
        report.shadow_volumes,
        report.culled
    );
    for primitive in queue.primitives() {
        match primitive {
            Primitive::Surface(surface) => log::debug!(
                "  surface {} planes={} tiles={} clip={}",
                surface.convex,
                surface.planes.len(),
                surface.region.tile_count(),
                surface.needs_clipping
            ),
            Primitive::ShadowVolume { slot, volume } => {
                log::debug!("  shadow {} slot={slot} planes={}", volume.convex, volume.planes.len());
            }
            Primitive::LightVolume(volume) => log::debug!("  light volume {}", volume.convex),
        }
    }
    for hit in &report.collisions {
        log::info!("  point {} inside convex {}", hit.point, hit.convex);
    }
    if let Some(error) = report.first_error() {
        log::warn!("  first error: {error}");
    }
}

fn main() -> Result<(), DemoError> {
    logging::init();
    log::info!("Starting display list demo");

    let config = load_config()?;
    let mut scene = build_scene(config)?;

    let mut dump = String::new();
    let root = scene.builder.default_list();
    scene.builder.dump_list(root, &mut dump, DumpFlags::DESCEND_INSTANCES)?;
    log::info!("Display list:\n{dump}");

    let mut queue = PrimitiveQueue::new();
    for frame in 0..FRAMES {
        if frame > 0 {
            place_camera(&mut scene, frame)?;
        }
        let report = traverse_display_list(scene.builder.scene(), None, scene.camera, &mut queue)?;
        log_frame(frame, &queue, &report);
    }

    log::info!("Rendered {} frames", queue.frames());
    Ok(())
}
