//! Display-list nodes
//!
//! Every entity of the display list is a [`Node`]: a name, a next-sibling link
//! and a [`NodeKind`] payload. The kinds form a closed set so traversal
//! dispatches with a single `match`.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::convex::Convex;
use crate::foundation::collections::NodeKey;
use crate::foundation::math::{Point3, Vec3};
use crate::lighting::{LightNode, LightSwitch};
use crate::render::{CameraNode, LodNode};
use crate::state::{MaterialNode, QualityNode};

/// Integer handle of a named node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name(u32);

impl Name {
    /// Sentinel carried by nodes that were created without a name
    pub const UNNAMED: Self = Self(0);

    /// Wrap a raw handle
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True for the unnamed sentinel
    pub const fn is_unnamed(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unnamed() {
            write!(f, "<unnamed>")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Type tag of a node, as stored in the name table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Ordered list of child nodes
    List,
    /// Affine transform
    Transform,
    /// Convex solid
    Convex,
    /// Material change
    Material,
    /// Light definition
    Light,
    /// Batch of light on/off changes
    LightSwitch,
    /// Light repositioning
    LightPosition,
    /// Multi-shadow mode change
    MultiShadow,
    /// Level-of-detail selector
    LevelOfDetail,
    /// Collision/query point
    Point,
    /// Position indirection for points
    PointPosition,
    /// Batch of point enable/disable changes
    PointSwitch,
    /// Reference to another list
    Instance,
    /// Batch of instance substitutions
    InstanceSubstitution,
    /// Viewpoint
    Camera,
    /// Render-quality change
    Quality,
    /// Plane bounding shadow volumes
    ShadowLimitPlane,
    /// Tombstone left by a deleted node
    Deleted,
}

bitflags! {
    /// Flags of a list node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ListFlags: u8 {
        /// Take part in traversal
        const PROCESS = 1 << 0;
        /// State changes made by the children do not leak to later siblings
        const PRESERVE_STATE = 1 << 1;
    }
}

/// Ordered, singly linked list of children
#[derive(Debug, Clone, PartialEq)]
pub struct ListNode {
    /// First child
    pub first: Option<NodeKey>,
    /// Last child, for constant-time append
    pub last: Option<NodeKey>,
    /// Process / preserve-state flags
    pub flags: ListFlags,
}

impl ListNode {
    /// Empty list with the given flags
    pub fn new(flags: ListFlags) -> Self {
        Self {
            first: None,
            last: None,
            flags,
        }
    }

    /// True when the traversal should descend into this list
    pub fn is_processed(&self) -> bool {
        self.flags.contains(ListFlags::PROCESS)
    }

    /// True when the list gets its own state frame
    pub fn preserves_state(&self) -> bool {
        self.flags.contains(ListFlags::PRESERVE_STATE)
    }
}

/// Instance reference to a named list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceNode {
    /// Referenced list
    pub list: Name,
}

/// Batch of `(original, replacement)` list names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubstitutionNode {
    /// Pairs in application order
    pub pairs: Vec<(Name, Name)>,
}

/// Batch of light switches
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightSwitchNode {
    /// Light name and requested change
    pub switches: Vec<(Name, LightSwitch)>,
}

/// New local position or direction for a light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPositionNode {
    /// Light to move
    pub light: Name,
    /// Position for point lights
    pub position: Point3,
    /// Direction for parallel lights and spot axes
    pub direction: Vec3,
}

/// Multi-shadow mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiShadowNode {
    /// Enable or disable shared shadow slots
    pub enabled: bool,
}

/// Collision/query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointNode {
    /// Local position, used when no position node is given
    pub position: Point3,
    /// Point-position node whose position overrides `position`
    pub position_node: Option<Name>,
}

/// Position shared by points through indirection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPositionNode {
    /// Local position
    pub position: Point3,
}

/// Batch of point enable/disable changes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PointSwitchNode {
    /// Point name and whether it should be tested
    pub switches: Vec<(Name, bool)>,
}

/// Plane past which shadow volumes are not extended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowLimitNode {
    /// Outward normal (shadows are kept on the side it points away from)
    pub normal: Vec3,
    /// Point on the plane
    pub point: Point3,
}

/// Payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Child list
    List(ListNode),
    /// Affine transform
    Transform(crate::math::Transform),
    /// Convex solid
    Convex(Box<Convex>),
    /// Material change
    Material(MaterialNode),
    /// Light definition
    Light(LightNode),
    /// Light switches
    LightSwitch(LightSwitchNode),
    /// Light repositioning
    LightPosition(LightPositionNode),
    /// Multi-shadow mode
    MultiShadow(MultiShadowNode),
    /// Level-of-detail selector
    LevelOfDetail(LodNode),
    /// Collision point
    Point(PointNode),
    /// Point position indirection
    PointPosition(PointPositionNode),
    /// Point switches
    PointSwitch(PointSwitchNode),
    /// Instance reference
    Instance(InstanceNode),
    /// Instance substitutions
    InstanceSubstitution(SubstitutionNode),
    /// Viewpoint
    Camera(CameraNode),
    /// Render-quality change
    Quality(QualityNode),
    /// Shadow limit plane
    ShadowLimitPlane(ShadowLimitNode),
    /// Tombstone
    Deleted,
}

impl NodeKind {
    /// Type tag of this payload
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::List(_) => NodeType::List,
            Self::Transform(_) => NodeType::Transform,
            Self::Convex(_) => NodeType::Convex,
            Self::Material(_) => NodeType::Material,
            Self::Light(_) => NodeType::Light,
            Self::LightSwitch(_) => NodeType::LightSwitch,
            Self::LightPosition(_) => NodeType::LightPosition,
            Self::MultiShadow(_) => NodeType::MultiShadow,
            Self::LevelOfDetail(_) => NodeType::LevelOfDetail,
            Self::Point(_) => NodeType::Point,
            Self::PointPosition(_) => NodeType::PointPosition,
            Self::PointSwitch(_) => NodeType::PointSwitch,
            Self::Instance(_) => NodeType::Instance,
            Self::InstanceSubstitution(_) => NodeType::InstanceSubstitution,
            Self::Camera(_) => NodeType::Camera,
            Self::Quality(_) => NodeType::Quality,
            Self::ShadowLimitPlane(_) => NodeType::ShadowLimitPlane,
            Self::Deleted => NodeType::Deleted,
        }
    }
}

/// A display-list node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Handle, or [`Name::UNNAMED`]
    pub name: Name,
    /// Next sibling in the containing list
    pub next: Option<NodeKey>,
    /// Containing list (the parent back-reference); `None` while free-standing
    pub owner: Option<NodeKey>,
    /// Payload
    pub kind: NodeKind,
}

impl Node {
    /// Free-standing node
    pub fn new(name: Name, kind: NodeKind) -> Self {
        Self {
            name,
            next: None,
            owner: None,
            kind,
        }
    }

    /// Type tag
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// List payload, if this is a list
    pub fn as_list(&self) -> Option<&ListNode> {
        match &self.kind {
            NodeKind::List(list) => Some(list),
            _ => None,
        }
    }

    /// Mutable list payload, if this is a list
    pub fn as_list_mut(&mut self) -> Option<&mut ListNode> {
        match &mut self.kind {
            NodeKind::List(list) => Some(list),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_display() {
        assert_eq!(Name::UNNAMED.to_string(), "<unnamed>");
        assert_eq!(Name::new(12).to_string(), "#12");
    }

    #[test]
    fn test_list_flags() {
        let list = ListNode::new(ListFlags::PROCESS);
        assert!(list.is_processed());
        assert!(!list.preserves_state());
    }
}
