//! Display list
//!
//! Nodes live in a [`NodeStore`] arena and are reached from client code by
//! [`Name`] through a [`NameTable`]. [`SceneBuilder`] is the construction
//! context; traversal only ever borrows the finished [`Scene`].

pub mod builder;
pub mod dump;
pub mod names;
pub mod node;
pub mod store;

pub use builder::{Scene, SceneBuilder};
pub use dump::DumpFlags;
pub use names::{HandleTable, NameTable};
pub use node::{
    InstanceNode, LightPositionNode, LightSwitchNode, ListFlags, ListNode, MultiShadowNode, Name, Node, NodeKind,
    NodeType, PointNode, PointPositionNode, PointSwitchNode, ShadowLimitNode, SubstitutionNode,
};
pub use store::{Children, NodeStore};
