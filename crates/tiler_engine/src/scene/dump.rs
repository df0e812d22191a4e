//! Text dump of a display list

use std::fmt::{self, Write};

use bitflags::bitflags;

use super::builder::{Scene, SceneBuilder};
use super::names::NameTable;
use super::node::{Node, NodeKind, NodeType};
use super::Name;
use crate::error::Result;
use crate::foundation::collections::NodeKey;

bitflags! {
    /// Options of [`Scene::dump_list`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DumpFlags: u8 {
        /// Print the lists referenced by instances below the instance
        const DESCEND_INSTANCES = 1 << 0;
        /// Print every plane of convex nodes
        const PLANES = 1 << 1;
    }
}

impl<N: NameTable> Scene<N> {
    /// Write the list `name` and everything below it, one node per line
    pub fn dump_list(&self, name: Name, sink: &mut impl Write, flags: DumpFlags) -> Result<()> {
        let key = self.resolve(name, NodeType::List)?;
        let mut dumper = Dumper {
            scene: self,
            sink,
            flags,
            limit: self.config().traversal.max_dump_depth,
        };
        dumper.list(key, 0)?;
        Ok(())
    }
}

impl<N: NameTable> SceneBuilder<N> {
    /// [`Scene::dump_list`], recorded as the last call
    pub fn dump_list(&mut self, name: Name, sink: &mut impl Write, flags: DumpFlags) -> Result<()> {
        let result = self.scene().dump_list(name, sink, flags);
        self.finish(result)
    }
}

struct Dumper<'a, N: NameTable, W: Write> {
    scene: &'a Scene<N>,
    sink: &'a mut W,
    flags: DumpFlags,
    limit: usize,
}

impl<N: NameTable, W: Write> Dumper<'_, N, W> {
    fn indent(&mut self, depth: usize) -> fmt::Result {
        write!(self.sink, "{:width$}", "", width = depth * 2)
    }

    fn list(&mut self, key: NodeKey, depth: usize) -> fmt::Result {
        let scene = self.scene;
        let Some(node) = scene.store().get(key) else {
            return Ok(());
        };
        self.node(node, depth)?;
        if depth >= self.limit {
            self.indent(depth + 1)?;
            return writeln!(self.sink, "...");
        }
        for child in scene.store().children(key) {
            let Some(child_node) = scene.store().get(child) else {
                continue;
            };
            match &child_node.kind {
                NodeKind::List(_) => self.list(child, depth + 1)?,
                NodeKind::Instance(instance) if self.flags.contains(DumpFlags::DESCEND_INSTANCES) => {
                    self.node(child_node, depth + 1)?;
                    match scene.resolve(instance.list, NodeType::List) {
                        Ok(list) => self.list(list, depth + 2)?,
                        Err(_) => {
                            self.indent(depth + 2)?;
                            writeln!(self.sink, "<missing list {}>", instance.list)?;
                        }
                    }
                }
                _ => self.node(child_node, depth + 1)?,
            }
        }
        Ok(())
    }

    fn node(&mut self, node: &Node, depth: usize) -> fmt::Result {
        self.indent(depth)?;
        write!(self.sink, "{:?} {}", node.node_type(), node.name)?;
        match &node.kind {
            NodeKind::List(list) => write!(self.sink, " {:?}", list.flags)?,
            NodeKind::Transform(transform) => write!(
                self.sink,
                " {:?} scale {:.3}{}",
                transform.scale_kind(),
                transform.scale(),
                if transform.is_reflected() { " reflected" } else { "" }
            )?,
            NodeKind::Convex(convex) => {
                write!(self.sink, " {:?} {} planes", convex.kind, convex.planes.len())?;
                if convex.adjacency.is_none() {
                    write!(self.sink, " (no adjacency)")?;
                }
                if self.flags.contains(DumpFlags::PLANES) {
                    for plane in &convex.planes {
                        writeln!(self.sink)?;
                        self.indent(depth + 1)?;
                        write!(
                            self.sink,
                            "n ({:.3}, {:.3}, {:.3}) p ({:.3}, {:.3}, {:.3})",
                            plane.normal.x, plane.normal.y, plane.normal.z, plane.point.x, plane.point.y, plane.point.z
                        )?;
                    }
                }
            }
            NodeKind::Light(light) => write!(
                self.sink,
                " {:?}{}{}",
                light.kind,
                if light.on { "" } else { " off" },
                if light.shadow { " shadow" } else { "" }
            )?,
            NodeKind::Instance(instance) => write!(self.sink, " -> {}", instance.list)?,
            NodeKind::InstanceSubstitution(substitution) => {
                for (original, replacement) in &substitution.pairs {
                    write!(self.sink, " {original}->{replacement}")?;
                }
            }
            NodeKind::LevelOfDetail(lod) => {
                for level in &lod.levels {
                    write!(self.sink, " {}px:{}", level.min_pixels, level.list)?;
                }
            }
            NodeKind::Quality(quality) => write!(self.sink, " +{:?} -{:?}", quality.set, quality.clear)?,
            NodeKind::Camera(camera) => write!(
                self.sink,
                " fov {:.1} near {} far {}",
                camera.fov_y.to_degrees(),
                camera.near,
                camera.far
            )?,
            _ => {}
        }
        writeln!(self.sink)
    }
}
