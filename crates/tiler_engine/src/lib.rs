//! # Tiler Engine
//!
//! Retained-mode display list and per-frame traversal for a tile-based
//! deferred renderer.
//!
//! ## Features
//!
//! - **Display list**: named, typed nodes in hierarchical lists with instancing
//! - **State stacks**: copy-on-write material, transform, lights, quality,
//!   collision and substitution state
//! - **Convex primitives**: plane transformation, frustum classification,
//!   adjacency and shadow volumes
//! - **Shading**: per-plane flat shading into shadow slots
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiler_engine::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut builder = SceneBuilder::new(EngineConfig::default())?;
//!     let camera = builder.add_camera(CameraNode::default())?;
//!     builder.add_light(LightNode::parallel(-Vec3::z(), Color::new(1.0, 1.0, 1.0)))?;
//!     builder.translate(Vec3::new(0.0, 0.0, -10.0))?;
//!     builder.add_convex(Convex::cube(Point3::origin(), 1.0))?;
//!
//!     let mut queue = PrimitiveQueue::new();
//!     let report = traverse_display_list(builder.scene(), None, camera, &mut queue)?;
//!     assert_eq!(report.surfaces, 1);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod convex;
pub mod error;
pub mod foundation;
pub mod lighting;
pub mod math;
pub mod render;
pub mod scene;
pub mod shading;
pub mod state;

pub use config::{Config, EngineConfig};
pub use error::{ErrorKind, Result, SceneError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig},
        convex::{BoundingBox, Convex, ConvexKind, Plane},
        error::{ErrorKind, SceneError},
        foundation::math::{Color, Mat3x4, Point3, Vec3},
        lighting::{LightNode, LightSwitch},
        math::Transform,
        render::{
            traverse_display_list, CameraNode, LodNode, Primitive, PrimitiveQueue, RenderSink, TraversalReport,
        },
        scene::{DumpFlags, Name, NameTable, SceneBuilder},
        state::{MaterialFlags, MaterialNode, QualityFlags, QualityNode},
    };
}
