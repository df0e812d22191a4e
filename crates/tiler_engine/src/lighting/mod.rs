//! Lighting
//!
//! Light nodes, their world-space entries and the partitioned lights state.

pub mod light;
pub mod state;

pub use light::{LightEntry, LightKind, LightNode, LightSwitch};
pub use state::{LightsState, SlotColor};

/// Shadow slots available besides slot 0 (the unshadowed bucket)
pub const MAX_SHADOW_SLOTS: usize = 4;
