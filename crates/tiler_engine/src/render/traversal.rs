//! Render traversal
//!
//! Walks a display list once per frame. Lists, instances and level-of-detail
//! nodes recurse; every other node either changes the inherited render state
//! or, for convex nodes, produces output. Errors are recorded and the walk
//! carries on with the next node.

use std::collections::HashSet;

use crate::convex::{
    classify, shadow_volume, transform_planes, Convex, ConvexKind, LocalLight, LocalLightCache, Plane,
    TransformedPlane,
};
use crate::error::{FirstError, Result, SceneError};
use crate::foundation::collections::NodeKey;
use crate::foundation::math::Point3;
use crate::lighting::LightEntry;
use crate::math::Transform;
use crate::render::camera::{CameraView, TileRegion};
use crate::render::output::{Primitive, RenderSink, Surface, Volume};
use crate::scene::{Name, NameTable, Node, NodeKind, NodeType, Scene};
use crate::shading::{flat_shade, ShadeInput, SmoothShading};
use crate::state::{ActivePoint, CollisionHit, MaterialFlags, QualityFlags, RenderStacks, StateFrame};

/// Summary of one traversal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraversalReport {
    /// Camera the frame was rendered from
    pub camera: Option<Name>,
    /// Nodes visited
    pub nodes: usize,
    /// Lists descended into
    pub lists: usize,
    /// Deepest list nesting reached
    pub max_depth: usize,
    /// Surfaces emitted
    pub surfaces: usize,
    /// Shadow volumes emitted
    pub shadow_volumes: usize,
    /// Light volumes emitted
    pub light_volumes: usize,
    /// Convex primitives found to be offscreen
    pub culled: usize,
    /// Points found inside convex primitives
    pub collisions: Vec<CollisionHit>,
    errors: FirstError,
}

impl TraversalReport {
    /// First error met during the walk
    pub fn first_error(&self) -> Option<&SceneError> {
        self.errors.first()
    }

    /// Number of errors met during the walk
    pub fn error_count(&self) -> usize {
        self.errors.count()
    }

    /// `Err` with the first error, if there was one
    pub fn to_result(&self) -> Result<()> {
        self.errors.to_result()
    }
}

/// Render `scene` from `camera`, starting at `root` or, without one, at the
/// outermost list containing the camera
pub fn traverse_display_list<N, S>(
    scene: &Scene<N>,
    root: Option<Name>,
    camera: Name,
    sink: &mut S,
) -> Result<TraversalReport>
where
    N: NameTable,
    S: RenderSink + ?Sized,
{
    let camera_key = scene.resolve(camera, NodeType::Camera)?;
    let path = scene.store().path_from_root(camera_key);
    let root = match root {
        Some(name) => scene.resolve(name, NodeType::List)?,
        None => *path.first().ok_or(SceneError::StaleNode)?,
    };
    let view = camera_view(scene, &path)?;

    let mut traversal = Traversal::new(scene, view, sink);
    traversal.report.camera = Some(camera);
    Ok(traversal.run(root))
}

/// World placement of the camera at the end of `path`: the transform nodes
/// preceding each step of the path, in list order
fn camera_view<N: NameTable>(scene: &Scene<N>, path: &[NodeKey]) -> Result<CameraView> {
    let store = scene.store();
    let camera_key = *path.last().ok_or(SceneError::StaleNode)?;
    let NodeKind::Camera(camera) = &store.get(camera_key).ok_or(SceneError::StaleNode)?.kind else {
        return Err(SceneError::StaleNode);
    };

    let mut camera_to_world = Transform::identity();
    for step in path.windows(2) {
        let (list, target) = (step[0], step[1]);
        for child in store.children(list).take_while(|child| *child != target) {
            if let Some(NodeKind::Transform(transform)) = store.get(child).map(|node| &node.kind) {
                camera_to_world = camera_to_world.compose(transform);
            }
        }
    }
    Ok(CameraView::new(camera, &camera_to_world, &scene.config().viewport))
}

/// Context of one walk over a display list
pub struct Traversal<'a, N: NameTable, S: RenderSink + ?Sized> {
    scene: &'a Scene<N>,
    view: CameraView,
    sink: &'a mut S,
    stacks: RenderStacks,
    report: TraversalReport,
    local_lights: LocalLightCache,
    shadow_limit: Option<Plane>,
    invalidated_points: HashSet<NodeKey>,
}

impl<'a, N: NameTable, S: RenderSink + ?Sized> Traversal<'a, N, S> {
    /// Walk context with fresh state stacks
    pub fn new(scene: &'a Scene<N>, view: CameraView, sink: &'a mut S) -> Self {
        Self {
            scene,
            view,
            sink,
            stacks: RenderStacks::new(scene.config()),
            report: TraversalReport::default(),
            local_lights: LocalLightCache::default(),
            shadow_limit: None,
            invalidated_points: HashSet::new(),
        }
    }

    /// Walk the list `root` and hand back the report
    pub fn run(mut self, root: NodeKey) -> TraversalReport {
        self.sink.begin_frame();
        let mut frame = self.stacks.root_frame();
        self.walk_list(root, &mut frame, 1);
        self.sink.end_frame();

        let report = self.report;
        log::info!(
            "Traversed {} nodes in {} lists: {} surfaces, {} shadow volumes, {} culled, {} errors",
            report.nodes,
            report.lists,
            report.surfaces,
            report.shadow_volumes,
            report.culled,
            report.errors.count()
        );
        report
    }

    fn record(&mut self, error: SceneError) {
        self.report.errors.record(error);
    }

    /// Descend into a list at nesting `depth`
    fn walk_list(&mut self, list: NodeKey, frame: &mut StateFrame, depth: usize) {
        let scene = self.scene;
        let Some(list_node) = scene.store().list(list) else {
            log::debug!("Skipping a child that is not a list");
            return;
        };
        if !list_node.is_processed() {
            return;
        }
        let limit = scene.config().traversal.max_depth;
        if depth > limit {
            log::debug!("Skipping list nested deeper than {limit}");
            self.record(SceneError::TooDeep { limit });
            return;
        }
        self.report.lists += 1;
        self.report.max_depth = self.report.max_depth.max(depth);

        if list_node.preserves_state() {
            let marks = self.stacks.mark();
            let invalidated = self.invalidated_points.len();
            let mut child = frame.child();
            self.walk_children(list, &mut child, depth);
            self.stacks.release(marks);
            if self.invalidated_points.len() != invalidated {
                let errors = &mut self.report.errors;
                self.stacks
                    .collision_mut(frame, errors)
                    .compact(&self.invalidated_points);
            }
        } else {
            self.walk_children(list, frame, depth);
        }
    }

    fn walk_children(&mut self, list: NodeKey, frame: &mut StateFrame, depth: usize) {
        let scene = self.scene;
        for key in scene.store().children(list) {
            if let Some(node) = scene.store().get(key) {
                self.visit(key, node, frame, depth);
            }
        }
    }

    /// Resolve a list name through the substitutions in effect and descend
    fn walk_named(&mut self, name: Name, frame: &mut StateFrame, depth: usize) {
        let resolved = self.stacks.substitution(frame).resolve(name);
        match self.scene.resolve(resolved, NodeType::List) {
            Ok(list) => self.walk_list(list, frame, depth + 1),
            Err(error) => log::debug!("Skipping unresolved list {resolved}: {error}"),
        }
    }

    fn visit(&mut self, key: NodeKey, node: &Node, frame: &mut StateFrame, depth: usize) {
        self.report.nodes += 1;
        log::trace!("Visiting {:?} node {}", node.node_type(), node.name);

        match &node.kind {
            NodeKind::List(_) => self.walk_list(key, frame, depth + 1),
            NodeKind::Instance(instance) => self.walk_named(instance.list, frame, depth),
            NodeKind::LevelOfDetail(lod) => {
                let to_camera = *self
                    .stacks
                    .transform_cache(frame)
                    .to_camera(&self.view.world_to_camera);
                match lod.select(&to_camera, &self.view) {
                    Some(list) => self.walk_named(list, frame, depth),
                    None => log::trace!("Level of detail {} too small to draw", node.name),
                }
            }
            NodeKind::InstanceSubstitution(substitution) => {
                self.stacks
                    .substitution_mut(frame, &mut self.report.errors)
                    .merge(&substitution.pairs);
            }
            NodeKind::Transform(transform) => {
                self.stacks
                    .transform_mut(frame, &mut self.report.errors)
                    .apply(transform);
            }
            NodeKind::Material(material) => {
                self.stacks
                    .material_mut(frame, &mut self.report.errors)
                    .merge(material);
            }
            NodeKind::Light(light) => {
                let world = self.stacks.transform(frame).world;
                let entry = LightEntry::new(
                    node.name,
                    light,
                    world.transform_vector(&light.direction),
                    world.transform_point(&light.position),
                );
                let added = self.stacks.lights_mut(frame, &mut self.report.errors).add(entry);
                if let Err(error) = added {
                    self.record(error);
                }
            }
            NodeKind::LightSwitch(switches) => {
                let lights = self.stacks.lights_mut(frame, &mut self.report.errors);
                for (light, switch) in &switches.switches {
                    if !lights.switch(*light, *switch) {
                        log::debug!("Light {light} is not in the current lights");
                    }
                }
            }
            NodeKind::LightPosition(moved) => {
                let world = self.stacks.transform(frame).world;
                let position = world.transform_point(&moved.position);
                let direction = world.transform_vector(&moved.direction);
                let lights = self.stacks.lights_mut(frame, &mut self.report.errors);
                if !lights.set_position(moved.light, position, direction) {
                    log::debug!("Light {} is not in the current lights", moved.light);
                }
            }
            NodeKind::MultiShadow(multi) => {
                self.stacks
                    .lights_mut(frame, &mut self.report.errors)
                    .set_multi_shadow(multi.enabled);
            }
            NodeKind::Point(point) => {
                let local = match point.position_node {
                    Some(position_node) => match self.point_position(position_node) {
                        Ok(position) => position,
                        Err(error) => {
                            self.record(error);
                            return;
                        }
                    },
                    None => point.position,
                };
                let active = ActivePoint {
                    node: key,
                    name: node.name,
                    position: self.stacks.transform(frame).world.transform_point(&local),
                    enabled: true,
                };
                let added = self.stacks.collision_mut(frame, &mut self.report.errors).add(active);
                if let Err(error) = added {
                    self.record(error);
                }
            }
            NodeKind::PointSwitch(switches) => {
                let points = self.stacks.collision_mut(frame, &mut self.report.errors);
                for (point, enabled) in &switches.switches {
                    if !points.switch(*point, *enabled) {
                        log::debug!("Point {point} is not active here");
                    }
                }
            }
            NodeKind::Quality(quality) => {
                let flags = self.stacks.quality_mut(frame, &mut self.report.errors);
                *flags = quality.apply(*flags);
            }
            NodeKind::ShadowLimitPlane(limit) => {
                let world = self.stacks.transform(frame).world;
                self.shadow_limit = Some(Plane::new(
                    world.transform_normal(&limit.normal),
                    world.transform_point(&limit.point),
                ));
            }
            NodeKind::Convex(convex) => {
                if let Err(error) = self.process_convex(node.name, convex, frame) {
                    self.record(error);
                }
            }
            NodeKind::Camera(_) | NodeKind::PointPosition(_) | NodeKind::Deleted => {}
        }
    }

    fn point_position(&self, name: Name) -> Result<Point3> {
        let key = self.scene.resolve(name, NodeType::PointPosition)?;
        match self.scene.store().get(key).map(|node| &node.kind) {
            Some(NodeKind::PointPosition(position)) => Ok(position.position),
            _ => Err(SceneError::StaleNode),
        }
    }

    /// Classify, shade and emit one convex, then build its shadows and test
    /// the active points against it
    fn process_convex(&mut self, name: Name, convex: &Convex, frame: &StateFrame) -> Result<()> {
        let quality = self.stacks.quality(frame);
        let world = self.stacks.transform(frame).world;
        let mut world_planes = None;

        if convex.is_drawn() {
            let to_camera = *self
                .stacks
                .transform_cache(frame)
                .to_camera(&self.view.world_to_camera);
            let visibility = classify(convex, &to_camera, &self.view.frustum)?;
            if visibility.offscreen {
                self.report.culled += 1;
                log::trace!("Convex {name} is offscreen");
            } else {
                let region = match visibility.camera_box {
                    Some((center, half)) => self.view.tile_region(&center, &half),
                    None => TileRegion::full(&self.view.viewport),
                };
                let planes = transform_planes(&convex.planes, &world, &self.view.eye)?;
                let primitive = match convex.kind {
                    ConvexKind::LightVolume => {
                        self.report.light_volumes += 1;
                        Primitive::LightVolume(Volume {
                            convex: name,
                            planes: planes.clone(),
                            region,
                        })
                    }
                    ConvexKind::ShadowVolume => {
                        self.report.shadow_volumes += 1;
                        Primitive::ShadowVolume {
                            slot: 0,
                            volume: Volume {
                                convex: name,
                                planes: planes.clone(),
                                region,
                            },
                        }
                    }
                    ConvexKind::Standard | ConvexKind::Hidden => {
                        let mut surface = self.shade_surface(name, convex, &world, planes.clone(), frame)?;
                        surface.region = region;
                        surface.needs_clipping = visibility.needs_clipping;
                        self.report.surfaces += 1;
                        Primitive::Surface(surface)
                    }
                };
                self.sink.submit(primitive)?;
                world_planes = Some(planes);
            }
        }

        let casts_shadow = matches!(convex.kind, ConvexKind::Standard | ConvexKind::Hidden);
        if casts_shadow && quality.contains(QualityFlags::SHADOWS) && self.stacks.lights(frame).has_shadows() {
            self.emit_shadows(name, convex, &world, frame)?;
        }

        if quality.contains(QualityFlags::COLLISION) && self.stacks.collision(frame).has_enabled() {
            self.test_points(name, convex, &world, world_planes.as_deref(), frame);
        }
        Ok(())
    }

    /// Shade world-space planes with the current material and lights
    fn shade_surface(
        &self,
        name: Name,
        convex: &Convex,
        world: &Transform,
        planes: Vec<TransformedPlane>,
        frame: &StateFrame,
    ) -> Result<Surface> {
        let quality = self.stacks.quality(frame);
        let material = self.stacks.material(frame);
        let lights = self.stacks.lights(frame);
        let input = ShadeInput {
            lights,
            scale_kind: world.scale_kind(),
            rescale: world.rescale(),
            reversed: material.flags.contains(MaterialFlags::TWO_SIDED),
            eye: self.view.eye,
            epsilon: self.scene.config().lighting.shade_epsilon,
        };
        let colors = flat_shade(&input, &planes, material, &convex.materials)?;
        let textured = quality.contains(QualityFlags::TEXTURES) && material.flags.contains(MaterialFlags::TEXTURED);
        let translucent = material.flags.contains(MaterialFlags::TRANSLUCENT);
        Ok(Surface {
            convex: name,
            planes,
            colors,
            region: TileRegion::full(&self.view.viewport),
            needs_clipping: true,
            flip_winding: world.is_reflected(),
            transparency: if translucent { material.transparency } else { 0.0 },
            texture: material.texture.filter(|_| textured),
            smooth: quality
                .contains(QualityFlags::SMOOTH_SHADING)
                .then(|| SmoothShading::precompute(lights)),
            quality,
        })
    }

    /// Shadow volume of the convex for every shadow-casting light
    fn emit_shadows(&mut self, name: Name, convex: &Convex, world: &Transform, frame: &StateFrame) -> Result<()> {
        let Some(adjacency) = &convex.adjacency else {
            log::debug!("Convex {name} has no adjacency and casts no shadow");
            return Ok(());
        };
        let stamp = self.stacks.light_space_stamp(frame);
        let lights = self.stacks.lights(frame);
        let local: Vec<(u8, LocalLight)> = self
            .local_lights
            .get_or_update(stamp, lights.on_lights().iter(), world)
            .to_vec();
        let limit = self.shadow_limit.map(|plane| plane_to_local(&plane, world));

        for (slot, light) in local {
            let volume = shadow_volume(&convex.planes, adjacency, &light, limit.as_ref())?;
            if volume.is_empty() {
                log::trace!("Light of slot {slot} is inside convex {name}");
                continue;
            }
            let planes = transform_planes(&volume, world, &self.view.eye)?;
            self.sink.submit(Primitive::ShadowVolume {
                slot,
                volume: Volume {
                    convex: name,
                    planes,
                    region: TileRegion::full(&self.view.viewport),
                },
            })?;
            self.report.shadow_volumes += 1;
        }
        Ok(())
    }

    /// Test every enabled point against the convex, in world space when the
    /// planes are already there and in local space otherwise
    fn test_points(
        &mut self,
        name: Name,
        convex: &Convex,
        world: &Transform,
        world_planes: Option<&[TransformedPlane]>,
        frame: &StateFrame,
    ) {
        let epsilon = self.scene.config().traversal.plane_epsilon;
        let first_only = self.stacks.quality(frame).contains(QualityFlags::COLLIDE_FIRST_ONLY);
        let to_local = world.inverted();
        let points: Vec<ActivePoint> = self.stacks.collision(frame).enabled().copied().collect();

        for point in points {
            if self.invalidated_points.contains(&point.node) {
                continue;
            }
            let inside = match world_planes {
                Some(planes) => planes
                    .iter()
                    .all(|plane| plane.signed_distance(&point.position) <= epsilon),
                None => convex.contains_point(&to_local.transform_point(&point.position), epsilon),
            };
            if !inside {
                continue;
            }
            log::debug!("Point {} collides with convex {name}", point.name);
            self.report.collisions.push(CollisionHit {
                point: point.name,
                convex: name,
                position: point.position,
            });
            if first_only {
                self.invalidated_points.insert(point.node);
            }
        }
    }
}

/// A world-space plane in the space of `object_to_world`
fn plane_to_local(plane: &Plane, object_to_world: &Transform) -> Plane {
    Plane::new(
        object_to_world.forward().linear.transpose() * plane.normal,
        object_to_world.inverse().transform_point(&plane.point),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::foundation::math::{utils, Color, Vec3};
    use crate::lighting::{LightNode, LightSwitch};
    use crate::render::camera::CameraNode;
    use crate::render::lod::LodNode;
    use crate::render::output::PrimitiveQueue;
    use crate::scene::SceneBuilder;
    use crate::state::{MaterialNode, QualityNode};
    use approx::assert_relative_eq;

    fn builder_with_camera() -> (SceneBuilder, Name) {
        let mut builder = SceneBuilder::new(EngineConfig::default()).unwrap();
        let camera = builder.add_camera(CameraNode::default()).unwrap();
        (builder, camera)
    }

    fn render(builder: &SceneBuilder, camera: Name) -> (PrimitiveQueue, TraversalReport) {
        let mut queue = PrimitiveQueue::new();
        let report = traverse_display_list(builder.scene(), None, camera, &mut queue).unwrap();
        (queue, report)
    }

    fn cube() -> Convex {
        Convex::cube(Point3::origin(), 1.0)
    }

    #[test]
    fn test_lit_cube_in_front_of_camera() {
        let (mut builder, camera) = builder_with_camera();
        builder.add_light(LightNode::ambient(utils::grey(0.2))).unwrap();
        builder
            .add_light(LightNode::parallel(-Vec3::z(), utils::grey(0.5)))
            .unwrap();
        builder.add_material(MaterialNode::diffuse(utils::grey(0.5))).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        let convex = builder.add_convex(cube()).unwrap();

        let (queue, report) = render(&builder, camera);
        assert!(report.first_error().is_none());
        assert_eq!(report.surfaces, 1);
        let surface = queue.surfaces().next().unwrap();
        assert_eq!(surface.convex, convex);
        assert!(!surface.needs_clipping);
        assert!(!surface.flip_winding);
        assert!(surface.region.tile_count() < TileRegion::full(&EngineConfig::default().viewport).tile_count());

        // The +z face looks straight at the light: 0.2 * 0.5 + 0.5 * 0.5
        let front: Vec<Color> = surface.lit_colors().collect();
        assert_relative_eq!(front[4], utils::grey(0.35), epsilon = 1e-5);
        // The -z face only gets ambient
        assert_relative_eq!(front[5], utils::grey(0.1), epsilon = 1e-5);
        assert_relative_eq!(surface.planes[4].point, Point3::new(0.0, 0.0, -9.0), epsilon = 1e-5);
    }

    #[test]
    fn test_preserved_list_keeps_changes_inside() {
        let (mut builder, camera) = builder_with_camera();
        builder.add_light(LightNode::ambient(utils::grey(0.5))).unwrap();
        builder.create_list(false, true, false).unwrap();
        builder.add_material(MaterialNode::diffuse(Color::new(1.0, 0.0, 0.0))).unwrap();
        builder.translate(Vec3::new(100.0, 0.0, 0.0)).unwrap();
        builder.modify_list(None, false).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (queue, _) = render(&builder, camera);
        let surface = queue.surfaces().next().unwrap();
        assert_relative_eq!(surface.lit_colors().next().unwrap(), utils::grey(0.5), epsilon = 1e-5);
        assert_relative_eq!(surface.planes[0].point.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_shared_list_changes_leak_to_siblings() {
        let (mut builder, camera) = builder_with_camera();
        builder.add_light(LightNode::ambient(utils::grey(0.5))).unwrap();
        builder.create_list(false, false, false).unwrap();
        builder.add_material(MaterialNode::diffuse(Color::new(1.0, 0.0, 0.0))).unwrap();
        builder.modify_list(None, false).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (queue, _) = render(&builder, camera);
        let surface = queue.surfaces().next().unwrap();
        assert_relative_eq!(surface.lit_colors().next().unwrap(), Color::new(0.5, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_depth_exceeded_skips_subtree_only() {
        let (mut builder, camera) = builder_with_camera();
        let recursive = builder.create_list(true, true, true).unwrap();
        builder.use_instance(recursive).unwrap();
        builder.modify_list(None, false).unwrap();
        builder.use_instance(recursive).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (queue, report) = render(&builder, camera);
        assert_eq!(report.first_error(), Some(&SceneError::TooDeep { limit: 40 }));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.max_depth, 40);
        assert_eq!(queue.surfaces().count(), 1);
    }

    #[test]
    fn test_camera_placement_and_culling() {
        let (mut builder, _) = builder_with_camera();
        builder.create_list(false, true, false).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, 20.0)).unwrap();
        let camera = builder.add_camera(CameraNode::default()).unwrap();
        builder.modify_list(None, false).unwrap();
        builder.add_convex(cube()).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, 40.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (_, report) = render(&builder, camera);
        assert_eq!(report.surfaces, 1);
        assert_eq!(report.culled, 1);
    }

    #[test]
    fn test_unknown_camera_is_rejected() {
        let (builder, _) = builder_with_camera();
        let mut queue = PrimitiveQueue::new();
        let missing = Name::new(4242);
        assert_eq!(
            traverse_display_list(builder.scene(), None, missing, &mut queue),
            Err(SceneError::BadName(missing))
        );
    }

    #[test]
    fn test_shadow_volumes_per_slot() {
        let (mut builder, camera) = builder_with_camera();
        builder
            .add_light(LightNode::parallel(-Vec3::y(), utils::grey(0.5)).with_shadow())
            .unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder
            .add_shadow_limit_plane(-Vec3::y(), Point3::new(0.0, -5.0, 0.0))
            .unwrap();
        builder.add_convex(cube()).unwrap();
        builder.add_convex(cube().with_kind(ConvexKind::Hidden)).unwrap();

        let (queue, report) = render(&builder, camera);
        assert_eq!(report.surfaces, 1);
        assert_eq!(report.shadow_volumes, 2);
        let (slot, volume) = queue.shadow_volumes().next().unwrap();
        assert_eq!(slot, 1);
        // Top cap, four sides, the limit plane
        assert_eq!(volume.planes.len(), 6);
        let inside = Point3::new(0.0, -3.0, -10.0);
        assert!(volume.planes.iter().all(|plane| plane.signed_distance(&inside) <= 1e-4));
        let below_limit = Point3::new(0.0, -7.0, -10.0);
        assert!(volume.planes.iter().any(|plane| plane.signed_distance(&below_limit) > 0.0));
    }

    #[test]
    fn test_no_shadows_without_quality_flag() {
        let (mut builder, camera) = builder_with_camera();
        builder
            .add_light(LightNode::parallel(-Vec3::y(), utils::grey(0.5)).with_shadow())
            .unwrap();
        builder
            .add_quality(QualityNode {
                set: QualityFlags::empty(),
                clear: QualityFlags::SHADOWS,
            })
            .unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (_, report) = render(&builder, camera);
        assert_eq!(report.shadow_volumes, 0);
    }

    #[test]
    fn test_substitution_redirects_instances() {
        let (mut builder, camera) = builder_with_camera();
        let single = builder.create_list(true, false, true).unwrap();
        builder.add_convex(cube()).unwrap();
        let double = builder.create_list(true, false, true).unwrap();
        builder.add_convex(cube()).unwrap();
        builder.add_convex(cube()).unwrap();
        builder.modify_list(None, false).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.use_instance(single).unwrap();
        builder.instance_substitutions(&[(single, double)]).unwrap();
        builder.use_instance(single).unwrap();

        let (_, report) = render(&builder, camera);
        assert_eq!(report.surfaces, 3);
    }

    #[test]
    fn test_level_of_detail_picks_coarse_list() {
        let (mut builder, camera) = builder_with_camera();
        let fine = builder.create_list(true, false, true).unwrap();
        builder.add_convex(cube()).unwrap();
        builder.add_convex(cube()).unwrap();
        let coarse = builder.create_list(true, false, true).unwrap();
        builder.add_convex(cube()).unwrap();
        builder.modify_list(None, false).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder
            .add_level_of_detail(LodNode::new(Point3::origin(), 2.0).with_level(100.0, fine).with_level(10.0, coarse))
            .unwrap();

        let (_, report) = render(&builder, camera);
        assert_eq!(report.surfaces, 1);
    }

    #[test]
    fn test_collisions_and_first_only() {
        let (mut builder, camera) = builder_with_camera();
        let point = builder.add_point(Point3::new(0.0, 0.0, -10.0), None).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        let first = builder.add_convex(cube()).unwrap();
        builder.add_convex(cube().with_kind(ConvexKind::Hidden)).unwrap();

        let (_, report) = render(&builder, camera);
        assert_eq!(report.collisions.len(), 2);
        assert_eq!(report.collisions[0].point, point);
        assert_eq!(report.collisions[0].convex, first);

        builder.modify_list(None, true).unwrap();
        let camera = builder.add_camera(CameraNode::default()).unwrap();
        builder
            .add_quality(QualityNode {
                set: QualityFlags::COLLIDE_FIRST_ONLY,
                clear: QualityFlags::empty(),
            })
            .unwrap();
        let position = builder.add_point_position(Point3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_point(Point3::origin(), Some(position)).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();
        builder.add_convex(cube()).unwrap();

        let (_, report) = render(&builder, camera);
        assert_eq!(report.collisions.len(), 1);
    }

    #[test]
    fn test_switched_off_point_is_not_tested() {
        let (mut builder, camera) = builder_with_camera();
        let point = builder.add_point(Point3::new(0.0, 0.0, -10.0), None).unwrap();
        builder.switch_points(&[(point, false)]).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (_, report) = render(&builder, camera);
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn test_light_position_node_redirects_light() {
        let (mut builder, camera) = builder_with_camera();
        let light = builder
            .add_light(LightNode::parallel(Vec3::z(), utils::grey(0.5)))
            .unwrap();
        builder.add_material(MaterialNode::diffuse(utils::grey(0.5))).unwrap();
        builder.position_light(light, Point3::origin(), -Vec3::z()).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (queue, report) = render(&builder, camera);
        assert!(report.first_error().is_none());
        let colors: Vec<Color> = queue.surfaces().next().unwrap().lit_colors().collect();
        assert_relative_eq!(colors[4], utils::grey(0.25), epsilon = 1e-5);
        assert_relative_eq!(colors[5], Color::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_light_switch_node_turns_light_off() {
        let (mut builder, camera) = builder_with_camera();
        builder.add_light(LightNode::ambient(utils::grey(0.2))).unwrap();
        let light = builder
            .add_light(LightNode::parallel(-Vec3::z(), utils::grey(0.5)).with_shadow())
            .unwrap();
        builder.add_material(MaterialNode::diffuse(utils::grey(0.5))).unwrap();
        builder.switch_lights(&[(light, LightSwitch::off())]).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (queue, report) = render(&builder, camera);
        assert_eq!(report.shadow_volumes, 0);
        let colors: Vec<Color> = queue.surfaces().next().unwrap().lit_colors().collect();
        assert_relative_eq!(colors[4], utils::grey(0.1), epsilon = 1e-5);
    }

    #[test]
    fn test_multi_shadow_node_groups_later_lights() {
        let (mut builder, camera) = builder_with_camera();
        builder
            .add_light(LightNode::parallel(-Vec3::y(), utils::grey(0.3)).with_shadow())
            .unwrap();
        builder.set_multi_shadow(true).unwrap();
        builder
            .add_light(LightNode::parallel(Vec3::new(0.2, -1.0, 0.0), utils::grey(0.3)).with_shadow())
            .unwrap();
        builder
            .add_light(LightNode::parallel(Vec3::new(-0.2, -1.0, 0.0), utils::grey(0.3)).with_shadow())
            .unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (queue, report) = render(&builder, camera);
        assert_eq!(report.shadow_volumes, 3);
        let mut slots: Vec<u8> = queue.shadow_volumes().map(|(slot, _)| slot).collect();
        slots.sort_unstable();
        assert_eq!(slots, vec![1, 2, 2]);
    }

    #[test]
    fn test_stack_overflow_is_recorded_and_rendering_continues() {
        let mut config = EngineConfig::default();
        config.stacks.material = 2;
        let mut builder = SceneBuilder::new(config).unwrap();
        let camera = builder.add_camera(CameraNode::default()).unwrap();
        builder.add_material(MaterialNode::diffuse(utils::grey(0.5))).unwrap();
        builder.create_list(false, true, false).unwrap();
        builder.add_material(MaterialNode::diffuse(Color::new(1.0, 0.0, 0.0))).unwrap();
        builder.modify_list(None, false).unwrap();
        builder.translate(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        builder.add_convex(cube()).unwrap();

        let (_, report) = render(&builder, camera);
        assert_eq!(report.first_error(), Some(&SceneError::StackOverflow { stack: "material" }));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.surfaces, 1);
    }
}
