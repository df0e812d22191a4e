//! Display-list construction
//!
//! [`SceneBuilder`] is the explicit construction context: it owns the
//! [`Scene`] and remembers the current list and the current transform node.
//! Every call returns a `Result` and also leaves its outcome in
//! [`SceneBuilder::last_error`].

use super::names::{HandleTable, NameTable};
use super::node::{
    InstanceNode, LightPositionNode, LightSwitchNode, ListFlags, ListNode, MultiShadowNode, Name, Node,
    NodeKind, NodeType, PointNode, PointPositionNode, PointSwitchNode, ShadowLimitNode, SubstitutionNode,
};
use super::store::NodeStore;
use crate::config::EngineConfig;
use crate::convex::Convex;
use crate::error::{Result, SceneError};
use crate::foundation::collections::NodeKey;
use crate::foundation::math::{Mat3x4, Point3, Vec3};
use crate::lighting::{LightNode, LightSwitch};
use crate::math::Transform;
use crate::render::{CameraNode, LodNode};
use crate::state::{MaterialNode, QualityNode};

/// The display list: node store, name table and configuration
#[derive(Debug, Clone)]
pub struct Scene<N: NameTable = HandleTable> {
    store: NodeStore,
    names: N,
    config: EngineConfig,
    default_list: NodeKey,
}

impl<N: NameTable> Scene<N> {
    /// Node store
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Name table
    pub fn names(&self) -> &N {
        &self.names
    }

    /// Configuration the scene was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Key of the default list
    pub fn default_list(&self) -> NodeKey {
        self.default_list
    }

    /// Node registered under `name`
    pub fn node(&self, name: Name) -> Option<&Node> {
        self.names.lookup(name).and_then(|key| self.store.get(key))
    }

    /// Key of the node named `name`, checked against the expected type
    pub fn resolve(&self, name: Name, expected: NodeType) -> Result<NodeKey> {
        let (key, found) = self.names.lookup_with_type(name).ok_or(SceneError::BadName(name))?;
        if found != expected {
            return Err(SceneError::WrongType { name, expected, found });
        }
        if self.store.get(key).is_none() {
            return Err(SceneError::StaleNode);
        }
        Ok(key)
    }
}

/// Construction context of a display list
#[derive(Debug, Clone)]
pub struct SceneBuilder<N: NameTable = HandleTable> {
    scene: Scene<N>,
    current_list: NodeKey,
    current_transform: Option<NodeKey>,
    last_error: Option<SceneError>,
}

impl SceneBuilder<HandleTable> {
    /// Builder over an in-memory name table sized from the configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        let names = HandleTable::new(config.traversal.max_names);
        Self::with_names(config, names)
    }
}

impl<N: NameTable> SceneBuilder<N> {
    /// Builder over a caller-supplied name table
    pub fn with_names(config: EngineConfig, mut names: N) -> Result<Self> {
        let mut store = NodeStore::new(config.traversal.max_nodes);
        let flags = ListFlags::PROCESS | ListFlags::PRESERVE_STATE;
        let default_list = store.alloc(Node::new(Name::UNNAMED, NodeKind::List(ListNode::new(flags))))?;
        let name = names.add(default_list, NodeType::List)?;
        if let Some(node) = store.get_mut(default_list) {
            node.name = name;
        }
        log::debug!("Created display list with default list {name}");
        Ok(Self {
            scene: Scene {
                store,
                names,
                config,
                default_list,
            },
            current_list: default_list,
            current_transform: None,
            last_error: None,
        })
    }

    /// The display list built so far
    pub fn scene(&self) -> &Scene<N> {
        &self.scene
    }

    /// Error left by the last call, if it failed
    pub fn last_error(&self) -> Option<&SceneError> {
        self.last_error.as_ref()
    }

    /// Name of the default list
    pub fn default_list(&self) -> Name {
        self.name_of(self.scene.default_list)
    }

    /// Name of the list new nodes are added to
    pub fn current_list(&self) -> Name {
        self.name_of(self.current_list)
    }

    fn name_of(&self, key: NodeKey) -> Name {
        self.scene.store.get(key).map_or(Name::UNNAMED, |node| node.name)
    }

    pub(super) fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        self.last_error = result.as_ref().err().cloned();
        if let Some(error) = &self.last_error {
            log::debug!("Display list call failed: {error}");
        }
        result
    }

    fn list_key(&self, name: Option<Name>) -> Result<NodeKey> {
        match name {
            None => Ok(self.scene.default_list),
            Some(name) => self.scene.resolve(name, NodeType::List),
        }
    }

    /// Allocate a named node and append it to the current list
    fn add_node(&mut self, kind: NodeKind) -> Result<(Name, NodeKey)> {
        let node_type = kind.node_type();
        let key = self.scene.store.alloc(Node::new(Name::UNNAMED, kind))?;
        let name = match self.scene.names.add(key, node_type) {
            Ok(name) => name,
            Err(error) => {
                self.scene.store.free(key);
                return Err(error);
            }
        };
        if let Some(node) = self.scene.store.get_mut(key) {
            node.name = name;
        }
        if let Err(error) = self.scene.store.append_child(self.current_list, key) {
            self.scene.names.remove(name);
            self.scene.store.free(key);
            return Err(error);
        }
        log::trace!("Added {node_type:?} node {name}");
        Ok((name, key))
    }

    fn add(&mut self, kind: NodeKind) -> Result<Name> {
        let result = self.add_node(kind).map(|(name, _)| name);
        self.finish(result)
    }

    /// Create a list and make it current.
    ///
    /// A list created with `separate` stays free-standing; otherwise it is
    /// appended to the current list. Without `generate_name` the list can
    /// only be reached through its parent.
    pub fn create_list(&mut self, generate_name: bool, preserve_state: bool, separate: bool) -> Result<Name> {
        let result = self.create_list_inner(generate_name, preserve_state, separate);
        self.finish(result)
    }

    fn create_list_inner(&mut self, generate_name: bool, preserve_state: bool, separate: bool) -> Result<Name> {
        let mut flags = ListFlags::PROCESS;
        if preserve_state {
            flags |= ListFlags::PRESERVE_STATE;
        }
        let key = self
            .scene
            .store
            .alloc(Node::new(Name::UNNAMED, NodeKind::List(ListNode::new(flags))))?;
        let name = if generate_name {
            match self.scene.names.add(key, NodeType::List) {
                Ok(name) => name,
                Err(error) => {
                    self.scene.store.free(key);
                    return Err(error);
                }
            }
        } else {
            Name::UNNAMED
        };
        if let Some(node) = self.scene.store.get_mut(key) {
            node.name = name;
        }
        if !separate {
            if let Err(error) = self.scene.store.append_child(self.current_list, key) {
                if !name.is_unnamed() {
                    self.scene.names.remove(name);
                }
                self.scene.store.free(key);
                return Err(error);
            }
        }
        self.current_list = key;
        self.current_transform = None;
        Ok(name)
    }

    /// Make a list current (the default list for `None`), optionally deleting
    /// its contents first
    pub fn modify_list(&mut self, name: Option<Name>, clear: bool) -> Result<()> {
        let result = self.list_key(name).map(|key| {
            if clear {
                for child in self.scene.store.take_children(key) {
                    self.free_subtree(child);
                }
            }
            self.current_list = key;
            self.current_transform = None;
        });
        self.finish(result)
    }

    /// Enable or disable traversal of a list
    pub fn set_list_processed(&mut self, name: Name, process: bool) -> Result<()> {
        let result = self.scene.resolve(name, NodeType::List).map(|key| {
            if let Some(list) = self.scene.store.get_mut(key).and_then(Node::as_list_mut) {
                list.flags.set(ListFlags::PROCESS, process);
            }
        });
        self.finish(result)
    }

    /// Delete a list and everything it owns
    pub fn delete_list(&mut self, name: Name) -> Result<()> {
        let result = self.delete_list_inner(name);
        self.finish(result)
    }

    fn delete_list_inner(&mut self, name: Name) -> Result<()> {
        let key = self.scene.resolve(name, NodeType::List)?;
        if key == self.scene.default_list {
            return Err(SceneError::DefaultList);
        }
        if self.scene.names.usage(name) > 0 {
            log::debug!("Deleting list {name} while {} instances refer to it", self.scene.names.usage(name));
        }
        self.scene.store.unlink(key);
        self.free_subtree(key);
        if self.scene.store.get(self.current_list).is_none() {
            self.current_list = self.scene.default_list;
        }
        if self.current_transform.is_some_and(|key| self.scene.store.get(key).is_none()) {
            self.current_transform = None;
        }
        Ok(())
    }

    /// Remove a list from its parent; it keeps its contents
    pub fn detach_list(&mut self, name: Name) -> Result<()> {
        let result = self.scene.resolve(name, NodeType::List).and_then(|key| {
            if key == self.scene.default_list {
                return Err(SceneError::DefaultList);
            }
            self.scene.store.unlink(key);
            Ok(())
        });
        self.finish(result)
    }

    /// Append a free-standing list to the current list.
    ///
    /// Rejected without any change when the list already has a parent or
    /// when it is the current list or one of its ancestors.
    pub fn attach_list(&mut self, name: Name) -> Result<()> {
        let result = self.attach_list_inner(name);
        self.finish(result)
    }

    fn attach_list_inner(&mut self, name: Name) -> Result<()> {
        let key = self.scene.resolve(name, NodeType::List)?;
        if key == self.scene.default_list {
            return Err(SceneError::DefaultList);
        }
        if self.scene.store.owner(key).is_some() {
            return Err(SceneError::AlreadyAttached(name));
        }
        if self.scene.store.is_ancestor_or_self(key, self.current_list) {
            return Err(SceneError::CyclicAttachment { list: name });
        }
        self.scene.store.append_child(self.current_list, key)
    }

    /// Add an instance of a named list
    pub fn use_instance(&mut self, list: Name) -> Result<Name> {
        let result = self
            .scene
            .resolve(list, NodeType::List)
            .and_then(|_| self.add_node(NodeKind::Instance(InstanceNode { list })))
            .map(|(name, _)| {
                self.scene.names.inc_usage(list);
                name
            });
        self.finish(result)
    }

    /// Add a batch of list substitutions.
    ///
    /// Pairs naming anything but lists are skipped; the node keeps the valid
    /// pairs and the first bad name is reported afterwards.
    pub fn instance_substitutions(&mut self, pairs: &[(Name, Name)]) -> Result<Name> {
        let mut valid = Vec::with_capacity(pairs.len());
        let mut first_bad = None;
        for &(original, replacement) in pairs {
            let checked = self
                .scene
                .resolve(original, NodeType::List)
                .and_then(|_| self.scene.resolve(replacement, NodeType::List));
            match checked {
                Ok(_) => valid.push((original, replacement)),
                Err(error) => {
                    first_bad.get_or_insert(error);
                }
            }
        }
        let added = self.add_node(NodeKind::InstanceSubstitution(SubstitutionNode { pairs: valid.clone() }));
        if added.is_ok() {
            for (_, replacement) in &valid {
                self.scene.names.inc_usage(*replacement);
            }
        }
        self.finish_batch(added, first_bad)
    }

    /// Add a transform node and make it current
    pub fn create_transform(&mut self, matrix: &Mat3x4) -> Result<Name> {
        let result = Transform::from_matrix(matrix).and_then(|transform| self.push_transform(transform));
        self.finish(result)
    }

    fn push_transform(&mut self, transform: Transform) -> Result<Name> {
        let (name, key) = self.add_node(NodeKind::Transform(transform))?;
        self.current_transform = Some(key);
        Ok(name)
    }

    /// Compose into the current transform node while it is the last node of
    /// the current list, otherwise add a new one
    fn compose(&mut self, local: Result<Transform>) -> Result<Name> {
        let local = local?;
        let tail = self.scene.store.list(self.current_list).and_then(|list| list.last);
        if let Some(key) = self.current_transform.filter(|key| tail == Some(*key)) {
            if let Some(node) = self.scene.store.get_mut(key) {
                if let NodeKind::Transform(transform) = &mut node.kind {
                    *transform = transform.compose(&local);
                    return Ok(node.name);
                }
            }
        }
        self.push_transform(local)
    }

    /// Translate
    pub fn translate(&mut self, offset: Vec3) -> Result<Name> {
        let result = self.compose(Ok(Transform::translation(offset)));
        self.finish(result)
    }

    /// Scale along each axis
    pub fn scale(&mut self, factors: Vec3) -> Result<Name> {
        let result = self.compose(Transform::scaling(factors));
        self.finish(result)
    }

    /// Rotate by `angle` radians about `axis`
    pub fn rotate(&mut self, axis: Vec3, angle: f32) -> Result<Name> {
        let result = self.compose(Transform::rotation(axis, angle));
        self.finish(result)
    }

    /// Add a convex; its adjacency is built now when the hull allows it
    pub fn add_convex(&mut self, mut convex: Convex) -> Result<Name> {
        if convex.adjacency.is_none() {
            if let Err(error) = convex.ensure_adjacency(self.scene.config.traversal.plane_epsilon) {
                log::debug!("Convex casts no shadows: {error}");
            }
        }
        self.add(NodeKind::Convex(Box::new(convex)))
    }

    /// Add a material change
    pub fn add_material(&mut self, material: MaterialNode) -> Result<Name> {
        self.add(NodeKind::Material(material))
    }

    /// Add a light
    pub fn add_light(&mut self, light: LightNode) -> Result<Name> {
        self.add(NodeKind::Light(light))
    }

    /// Add a batch of light switches; unknown lights are skipped and reported
    pub fn switch_lights(&mut self, switches: &[(Name, LightSwitch)]) -> Result<Name> {
        let (valid, first_bad) = self.checked(switches, NodeType::Light);
        let result = self.add_node(NodeKind::LightSwitch(LightSwitchNode { switches: valid }));
        self.finish_batch(result, first_bad)
    }

    /// Move a light
    pub fn position_light(&mut self, light: Name, position: Point3, direction: Vec3) -> Result<Name> {
        let result = self.scene.resolve(light, NodeType::Light).and_then(|_| {
            self.add_node(NodeKind::LightPosition(LightPositionNode {
                light,
                position,
                direction,
            }))
            .map(|(name, _)| name)
        });
        self.finish(result)
    }

    /// Enter or leave multi-shadow mode for the lights switched on after it
    pub fn set_multi_shadow(&mut self, enabled: bool) -> Result<Name> {
        self.add(NodeKind::MultiShadow(MultiShadowNode { enabled }))
    }

    /// Add a level-of-detail selector
    pub fn add_level_of_detail(&mut self, lod: LodNode) -> Result<Name> {
        let levels: Vec<Name> = lod.levels.iter().map(|level| level.list).collect();
        let result = levels
            .iter()
            .try_for_each(|list| self.scene.resolve(*list, NodeType::List).map(|_| ()))
            .and_then(|()| self.add_node(NodeKind::LevelOfDetail(lod)))
            .map(|(name, _)| {
                for list in &levels {
                    self.scene.names.inc_usage(*list);
                }
                name
            });
        self.finish(result)
    }

    /// Add a collision point, optionally positioned by a point-position node
    pub fn add_point(&mut self, position: Point3, position_node: Option<Name>) -> Result<Name> {
        let checked = match position_node {
            Some(node) => self.scene.resolve(node, NodeType::PointPosition).map(|_| ()),
            None => Ok(()),
        };
        let result = checked.and_then(|()| {
            self.add_node(NodeKind::Point(PointNode {
                position,
                position_node,
            }))
            .map(|(name, _)| name)
        });
        self.finish(result)
    }

    /// Add a shared point position
    pub fn add_point_position(&mut self, position: Point3) -> Result<Name> {
        self.add(NodeKind::PointPosition(PointPositionNode { position }))
    }

    /// Add a batch of point switches; unknown points are skipped and reported
    pub fn switch_points(&mut self, switches: &[(Name, bool)]) -> Result<Name> {
        let (valid, first_bad) = self.checked(switches, NodeType::Point);
        let result = self.add_node(NodeKind::PointSwitch(PointSwitchNode { switches: valid }));
        self.finish_batch(result, first_bad)
    }

    /// Add a camera
    pub fn add_camera(&mut self, camera: CameraNode) -> Result<Name> {
        self.add(NodeKind::Camera(camera))
    }

    /// Add a quality change
    pub fn add_quality(&mut self, quality: QualityNode) -> Result<Name> {
        self.add(NodeKind::Quality(quality))
    }

    /// Add a plane past which shadow volumes stop
    pub fn add_shadow_limit_plane(&mut self, normal: Vec3, point: Point3) -> Result<Name> {
        self.add(NodeKind::ShadowLimitPlane(ShadowLimitNode { normal, point }))
    }

    /// Turn a node into a tombstone; lists are deleted with their contents
    pub fn delete_node(&mut self, name: Name) -> Result<()> {
        let result = self.delete_node_inner(name);
        self.finish(result)
    }

    fn delete_node_inner(&mut self, name: Name) -> Result<()> {
        let (key, node_type) = self.scene.names.lookup_with_type(name).ok_or(SceneError::BadName(name))?;
        if node_type == NodeType::List {
            return self.delete_list_inner(name);
        }
        let node = self.scene.store.get_mut(key).ok_or(SceneError::StaleNode)?;
        let kind = std::mem::replace(&mut node.kind, NodeKind::Deleted);
        self.release_references(&kind);
        self.scene.names.retag(name, NodeType::Deleted);
        if self.current_transform == Some(key) {
            self.current_transform = None;
        }
        Ok(())
    }

    fn checked<T: Copy>(&self, batch: &[(Name, T)], expected: NodeType) -> (Vec<(Name, T)>, Option<SceneError>) {
        let mut valid = Vec::with_capacity(batch.len());
        let mut first_bad = None;
        for &(name, value) in batch {
            match self.scene.resolve(name, expected) {
                Ok(_) => valid.push((name, value)),
                Err(error) => {
                    first_bad.get_or_insert(error);
                }
            }
        }
        (valid, first_bad)
    }

    fn finish_batch(&mut self, added: Result<(Name, NodeKey)>, first_bad: Option<SceneError>) -> Result<Name> {
        let result = match (added, first_bad) {
            (Err(error), _) | (Ok(_), Some(error)) => Err(error),
            (Ok((name, _)), None) => Ok(name),
        };
        self.finish(result)
    }

    /// Usage counts held by a node payload
    fn release_references(&mut self, kind: &NodeKind) {
        match kind {
            NodeKind::Instance(instance) => self.scene.names.dec_usage(instance.list),
            NodeKind::InstanceSubstitution(substitution) => {
                for (_, replacement) in &substitution.pairs {
                    self.scene.names.dec_usage(*replacement);
                }
            }
            NodeKind::LevelOfDetail(lod) => {
                for level in &lod.levels {
                    self.scene.names.dec_usage(level.list);
                }
            }
            _ => {}
        }
    }

    /// Free an unlinked node and everything it owns
    fn free_subtree(&mut self, root: NodeKey) {
        let mut pending = vec![root];
        while let Some(key) = pending.pop() {
            if self.scene.store.list(key).is_some() {
                pending.extend(self.scene.store.take_children(key));
            }
            let Some(node) = self.scene.store.free(key) else {
                continue;
            };
            self.release_references(&node.kind);
            if !node.name.is_unnamed() {
                self.scene.names.remove(node.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::utils;

    fn builder() -> SceneBuilder {
        SceneBuilder::new(EngineConfig::default()).unwrap()
    }

    fn children<N: NameTable>(builder: &SceneBuilder<N>, list: Name) -> Vec<Name> {
        let key = builder.scene().resolve(list, NodeType::List).unwrap();
        builder
            .scene()
            .store()
            .children(key)
            .filter_map(|child| builder.scene().store().get(child).map(|node| node.name))
            .collect()
    }

    #[test]
    fn test_create_list_appends_and_becomes_current() {
        let mut builder = builder();
        let root = builder.default_list();
        let list = builder.create_list(true, false, false).unwrap();
        assert_eq!(builder.current_list(), list);
        assert_eq!(children(&builder, root), vec![list]);

        let separate = builder.create_list(true, true, true).unwrap();
        assert_eq!(children(&builder, list), Vec::<Name>::new());
        let key = builder.scene().resolve(separate, NodeType::List).unwrap();
        assert!(builder.scene().store().owner(key).is_none());
        assert!(builder.scene().store().list(key).unwrap().preserves_state());
    }

    #[test]
    fn test_attach_detach_scenario() {
        let mut builder = builder();
        let root = builder.default_list();
        let a = builder.create_list(true, true, false).unwrap();
        let b = builder.create_list(true, true, true).unwrap();
        builder.add_material(MaterialNode::diffuse(utils::grey(0.5))).unwrap();

        builder.modify_list(Some(a), false).unwrap();
        builder.attach_list(b).unwrap();
        assert_eq!(children(&builder, a), vec![b]);

        // A second parent is refused
        builder.modify_list(None, false).unwrap();
        assert_eq!(builder.attach_list(b), Err(SceneError::AlreadyAttached(b)));
        assert_eq!(builder.last_error(), Some(&SceneError::AlreadyAttached(b)));

        builder.detach_list(b).unwrap();
        assert!(builder.last_error().is_none());
        assert!(children(&builder, a).is_empty());
        assert_eq!(children(&builder, b).len(), 1);

        builder.attach_list(b).unwrap();
        assert_eq!(children(&builder, root), vec![a, b]);
    }

    #[test]
    fn test_cycle_rejected_without_link_changes() {
        let mut builder = builder();
        let outer = builder.create_list(true, false, false).unwrap();
        let inner = builder.create_list(true, false, false).unwrap();
        builder.detach_list(outer).unwrap();

        builder.modify_list(Some(inner), false).unwrap();
        let before_outer = children(&builder, outer);
        let before_inner = children(&builder, inner);
        assert_eq!(
            builder.attach_list(outer),
            Err(SceneError::CyclicAttachment { list: outer })
        );
        assert_eq!(children(&builder, outer), before_outer);
        assert_eq!(children(&builder, inner), before_inner);

        // A list cannot contain itself either
        builder.modify_list(Some(outer), false).unwrap();
        builder.detach_list(inner).unwrap();
        builder.modify_list(Some(inner), false).unwrap();
        assert!(matches!(
            builder.attach_list(inner),
            Err(SceneError::CyclicAttachment { .. })
        ));
    }

    #[test]
    fn test_default_list_is_protected() {
        let mut builder = builder();
        let root = builder.default_list();
        assert_eq!(builder.delete_list(root), Err(SceneError::DefaultList));
        assert_eq!(builder.detach_list(root), Err(SceneError::DefaultList));
    }

    #[test]
    fn test_transforms_compose_while_tail() {
        let mut builder = builder();
        let first = builder.translate(Vec3::x()).unwrap();
        let same = builder.rotate(Vec3::z(), 0.5).unwrap();
        assert_eq!(first, same);

        builder.add_material(MaterialNode::default()).unwrap();
        let second = builder.scale(Vec3::new(2.0, 2.0, 2.0)).unwrap();
        assert_ne!(first, second);
        assert_eq!(children(&builder, builder.default_list()).len(), 3);

        let singular = builder.scale(Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(singular, Err(SceneError::SingularTransform));
        assert_eq!(builder.last_error(), Some(&SceneError::SingularTransform));
    }

    #[test]
    fn test_instance_usage_and_delete() {
        let mut builder = builder();
        let shared = builder.create_list(true, false, true).unwrap();
        builder.add_convex(Convex::cube(Point3::origin(), 1.0)).unwrap();
        builder.modify_list(None, false).unwrap();
        let instance = builder.use_instance(shared).unwrap();
        builder.use_instance(shared).unwrap();
        assert_eq!(builder.scene().names().usage(shared), 2);

        builder.delete_node(instance).unwrap();
        assert_eq!(builder.scene().names().usage(shared), 1);
        assert_eq!(builder.scene().node(instance).unwrap().node_type(), NodeType::Deleted);

        let nodes = builder.scene().store().len();
        builder.delete_list(shared).unwrap();
        assert_eq!(builder.scene().store().len(), nodes - 2);
        assert_eq!(builder.use_instance(shared), Err(SceneError::BadName(shared)));
    }

    #[test]
    fn test_substitutions_keep_valid_pairs() {
        let mut builder = builder();
        let a = builder.create_list(true, false, true).unwrap();
        let b = builder.create_list(true, false, true).unwrap();
        builder.modify_list(None, false).unwrap();
        let light = builder.add_light(LightNode::ambient(utils::grey(0.1))).unwrap();

        let result = builder.instance_substitutions(&[(a, b), (a, light)]);
        assert!(matches!(result, Err(SceneError::WrongType { .. })));
        let root = builder.default_list();
        let last = *children(&builder, root).last().unwrap();
        match &builder.scene().node(last).unwrap().kind {
            NodeKind::InstanceSubstitution(node) => assert_eq!(node.pairs, vec![(a, b)]),
            other => panic!("unexpected node {other:?}"),
        }
        assert_eq!(builder.scene().names().usage(b), 1);
    }

    #[test]
    fn test_delete_current_list_falls_back_to_default() {
        let mut builder = builder();
        let list = builder.create_list(true, false, false).unwrap();
        builder.create_list(true, false, false).unwrap();
        builder.delete_list(list).unwrap();
        assert_eq!(builder.current_list(), builder.default_list());
        assert_eq!(builder.scene().store().len(), 1);
    }

    #[test]
    fn test_modify_with_clear_frees_children() {
        let mut builder = builder();
        let list = builder.create_list(true, false, false).unwrap();
        let light = builder.add_light(LightNode::ambient(utils::grey(0.2))).unwrap();
        builder.modify_list(Some(list), true).unwrap();
        assert!(children(&builder, list).is_empty());
        assert!(builder.scene().node(light).is_none());
    }

    #[test]
    fn test_bad_switches_reported_after_storing() {
        let mut builder = builder();
        let light = builder.add_light(LightNode::ambient(utils::grey(0.2))).unwrap();
        let result = builder.switch_lights(&[(light, LightSwitch::off()), (Name::new(999), LightSwitch::on())]);
        assert_eq!(result, Err(SceneError::BadName(Name::new(999))));
        assert_eq!(children(&builder, builder.default_list()).len(), 2);
    }
}
