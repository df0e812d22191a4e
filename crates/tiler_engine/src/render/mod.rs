//! Rendering
//!
//! Camera and view frustum, level-of-detail selection, the output boundary
//! towards the tiler and the traversal that drives them.

pub mod camera;
pub mod lod;
pub mod output;
pub mod traversal;

pub use camera::{BoxTest, CameraNode, CameraView, ClipPlane, Frustum, TileRegion};
pub use lod::{LodLevel, LodNode};
pub use output::{Primitive, PrimitiveQueue, RenderSink, Surface, Volume};
pub use traversal::{traverse_display_list, Traversal, TraversalReport};
